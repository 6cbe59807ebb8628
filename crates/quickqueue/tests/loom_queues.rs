#![cfg(loom)]

use loom::thread;
use quickqueue::{Offered, SpscQueue};

// A published `put` must carry the slot write with it: whatever the
// interleaving, the consumer sees the items in order and never a hole.
#[test]
fn loom_spsc_publication() {
    loom::model(|| {
        let (p, c) = SpscQueue::<usize>::with_capacity(2).unwrap();

        let producer = thread::spawn(move || {
            for value in [10, 20] {
                let mut item = value;
                while let Offered::Full(back) = p.offer(item).unwrap() {
                    item = back;
                    thread::yield_now();
                }
            }
        });

        let mut received = Vec::new();
        while received.len() < 2 {
            match c.poll() {
                Some(v) => received.push(v),
                None => thread::yield_now(),
            }
        }
        producer.join().unwrap();
        assert_eq!(received, vec![10, 20]);
        assert!(c.is_empty());
    });
}

#[test]
fn loom_spsc_full_then_drain() {
    loom::model(|| {
        let (p, c) = SpscQueue::<usize>::with_capacity(3).unwrap();
        assert!(p.offer(1).unwrap().is_accepted());
        assert!(p.offer(2).unwrap().is_accepted());

        let consumer = thread::spawn(move || {
            let first = c.poll();
            assert_eq!(first, Some(1));
            c
        });

        // Either still full or already drained by one; never anything else.
        match p.offer(3).unwrap() {
            Offered::Accepted => {}
            Offered::Full(item) => assert_eq!(item, 3),
        }
        let c = consumer.join().unwrap();
        assert_eq!(c.poll(), Some(2));
        assert!(c.size() <= 1);
    });
}
