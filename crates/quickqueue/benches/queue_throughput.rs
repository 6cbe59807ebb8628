use criterion::{criterion_group, criterion_main, Bencher, BenchmarkId, Criterion, Throughput};
use crossbeam_queue::ArrayQueue;
use parking_lot::Mutex;
use quickqueue::{MpmcQueue, Offered, SpscQueue};
use std::collections::VecDeque;
use std::hint::black_box;
use std::sync::Arc;
use std::thread;

const CAPACITY: usize = 1024;

/// Baseline: a plain locked ring, the thing both queues are meant to beat.
struct LockedQueue<T> {
    inner: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T> LockedQueue<T> {
    fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn offer(&self, item: T) -> Result<(), T> {
        let mut q = self.inner.lock();
        if q.len() + 1 >= self.capacity {
            return Err(item);
        }
        q.push_back(item);
        Ok(())
    }

    fn poll(&self) -> Option<T> {
        self.inner.lock().pop_front()
    }
}

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("offer_poll_single_thread");
    for &n in &[100usize, 1_000] {
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("spsc", n), &n, |b: &mut Bencher, &n| {
            let (p, q) = SpscQueue::<usize>::with_capacity(CAPACITY).unwrap();
            b.iter(|| {
                for i in 0..n {
                    let _ = p.offer(i).unwrap();
                    black_box(q.poll());
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("mpmc", n), &n, |b: &mut Bencher, &n| {
            let q = MpmcQueue::<usize>::with_capacity(CAPACITY).unwrap();
            b.iter(|| {
                for i in 0..n {
                    let _ = q.offer(i).unwrap();
                    black_box(q.poll());
                }
            })
        });

        group.bench_with_input(
            BenchmarkId::new("crossbeam_array_queue", n),
            &n,
            |b: &mut Bencher, &n| {
                let q = ArrayQueue::<usize>::new(CAPACITY - 1);
                b.iter(|| {
                    for i in 0..n {
                        let _ = q.push(i);
                        black_box(q.pop());
                    }
                })
            },
        );

        group.bench_with_input(BenchmarkId::new("mutex_vecdeque", n), &n, |b: &mut Bencher, &n| {
            let q = LockedQueue::<usize>::new(CAPACITY);
            b.iter(|| {
                for i in 0..n {
                    let _ = q.offer(i);
                    black_box(q.poll());
                }
            })
        });
    }
    group.finish();
}

fn transfer_spsc(items: usize) {
    let (p, c) = SpscQueue::<usize>::with_capacity(CAPACITY).unwrap();
    let producer = thread::spawn(move || {
        for i in 0..items {
            let mut item = i;
            while let Offered::Full(back) = p.offer(item).unwrap() {
                item = back;
                std::hint::spin_loop();
            }
        }
    });
    let mut received = 0;
    while received < items {
        if black_box(c.poll()).is_some() {
            received += 1;
        }
    }
    producer.join().unwrap();
}

fn transfer_mpmc(items: usize, producers: usize, consumers: usize) {
    let q = Arc::new(MpmcQueue::<usize>::with_capacity(CAPACITY).unwrap());
    let per_producer = items / producers;
    let per_consumer = per_producer * producers / consumers;
    let mut handles = Vec::new();
    for _ in 0..producers {
        let q = Arc::clone(&q);
        handles.push(thread::spawn(move || {
            for i in 0..per_producer {
                let mut item = i;
                while let Offered::Full(back) = q.offer(item).unwrap() {
                    item = back;
                    std::hint::spin_loop();
                }
            }
        }));
    }
    for _ in 0..consumers {
        let q = Arc::clone(&q);
        handles.push(thread::spawn(move || {
            let mut received = 0;
            while received < per_consumer {
                if black_box(q.poll()).is_some() {
                    received += 1;
                }
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
}

fn transfer_crossbeam(items: usize, producers: usize, consumers: usize) {
    let q = Arc::new(ArrayQueue::<usize>::new(CAPACITY - 1));
    let per_producer = items / producers;
    let per_consumer = per_producer * producers / consumers;
    let mut handles = Vec::new();
    for _ in 0..producers {
        let q = Arc::clone(&q);
        handles.push(thread::spawn(move || {
            for i in 0..per_producer {
                let mut item = i;
                while let Err(back) = q.push(item) {
                    item = back;
                    std::hint::spin_loop();
                }
            }
        }));
    }
    for _ in 0..consumers {
        let q = Arc::clone(&q);
        handles.push(thread::spawn(move || {
            let mut received = 0;
            while received < per_consumer {
                if black_box(q.pop()).is_some() {
                    received += 1;
                }
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
}

fn bench_cross_thread(c: &mut Criterion) {
    const ITEMS: usize = 100_000;
    let mut group = c.benchmark_group("cross_thread_transfer");
    group.sample_size(20);
    group.throughput(Throughput::Elements(ITEMS as u64));

    group.bench_function("spsc_1p1c", |b| b.iter(|| transfer_spsc(ITEMS)));
    for &(p, c) in &[(1usize, 1usize), (2, 2), (4, 4)] {
        let label = format!("{p}p{c}c");
        group.bench_with_input(BenchmarkId::new("mpmc", &label), &(p, c), |b, &(p, c)| {
            b.iter(|| transfer_mpmc(ITEMS, p, c))
        });
        group.bench_with_input(
            BenchmarkId::new("crossbeam_array_queue", &label),
            &(p, c),
            |b, &(p, c)| b.iter(|| transfer_crossbeam(ITEMS, p, c)),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_single_thread, bench_cross_thread);
criterion_main!(benches);
