use crate::error::{QueueError, Result};
use crate::mpmc::MpmcQueue;
use crate::spsc::{Consumer, Producer, SpscQueue};
use anyhow::Context;
use config as cfg;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    Spsc,
    #[default]
    Mpmc,
}

impl QueueKind {
    pub fn description(&self) -> &str {
        match self {
            Self::Spsc => "One producer thread, one consumer thread, no CAS",
            Self::Mpmc => "Any number of producers and consumers, CAS with helping",
        }
    }
}

/// Settings for building a queue from files or the environment.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct QueueConfig {
    #[serde(default)]
    pub kind: QueueKind,

    /// Slot count; one slot is always kept free, so `capacity - 1` items fit.
    #[serde(default = "QueueConfig::default_capacity")]
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            kind: QueueKind::default(),
            capacity: Self::default_capacity(),
        }
    }
}

/// A queue built from a [`QueueConfig`].
pub enum ConfiguredQueue<T> {
    Spsc(Producer<T>, Consumer<T>),
    Mpmc(MpmcQueue<T>),
}

impl QueueConfig {
    fn default_capacity() -> usize {
        1024
    }

    pub fn new(kind: QueueKind, capacity: usize) -> Self {
        Self { kind, capacity }
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity < 2 {
            return Err(QueueError::InvalidCapacity {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| QueueError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Layered load, later sources win:
    /// 1. `default.toml` in `config_dir`
    /// 2. `local.toml` in `config_dir`
    /// 3. Environment variables (`QUICKQUEUE__*` prefix)
    pub fn load_from_sources(config_dir: &Path) -> Result<Self> {
        let config = Self::build_sources(config_dir)
            .map_err(|e| QueueError::Config(format!("{e:#}")))?;
        config.validate()?;
        info!(kind = ?config.kind, capacity = config.capacity, "loaded queue configuration");
        Ok(config)
    }

    fn build_sources(config_dir: &Path) -> anyhow::Result<Self> {
        let config: Self = cfg::Config::builder()
            .add_source(cfg::File::from(config_dir.join("default.toml")).required(false))
            .add_source(cfg::File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                cfg::Environment::with_prefix("QUICKQUEUE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("building queue configuration")?
            .try_deserialize()
            .context("deserializing queue configuration")?;
        Ok(config)
    }

    pub fn build<T>(&self) -> Result<ConfiguredQueue<T>> {
        match self.kind {
            QueueKind::Spsc => {
                let (producer, consumer) = self.build_spsc()?;
                Ok(ConfiguredQueue::Spsc(producer, consumer))
            }
            QueueKind::Mpmc => Ok(ConfiguredQueue::Mpmc(self.build_mpmc()?)),
        }
    }

    /// Builds an SPSC queue with this capacity, regardless of `kind`.
    pub fn build_spsc<T>(&self) -> Result<(Producer<T>, Consumer<T>)> {
        self.validate()?;
        SpscQueue::with_capacity(self.capacity)
    }

    /// Builds an MPMC queue with this capacity, regardless of `kind`.
    pub fn build_mpmc<T>(&self) -> Result<MpmcQueue<T>> {
        self.validate()?;
        MpmcQueue::with_capacity(self.capacity)
    }
}
