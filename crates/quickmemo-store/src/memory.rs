//! In-memory config store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use quickmemo_core::{Config, ConfigStore, Error, PartialConfig, Result};

use crate::{decode_record, merge_partial};

/// Config store backed by a raw JSON object in memory.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    record: Mutex<Map<String, Value>>,
    writes: Mutex<usize>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing raw record (current or legacy layout).
    pub fn with_record(record: Value) -> Result<Self> {
        match record {
            Value::Object(map) => Ok(Self {
                record: Mutex::new(map),
                writes: Mutex::new(0),
            }),
            other => Err(Error::Store(format!("record must be an object, got {other}"))),
        }
    }

    /// Start from a typed record.
    pub fn with_config(config: &Config) -> Result<Self> {
        Self::with_record(serde_json::to_value(config)?)
    }

    /// Raw record as currently stored.
    pub async fn snapshot(&self) -> Map<String, Value> {
        self.record.lock().await.clone()
    }

    /// Number of `write` calls so far.
    pub async fn write_count(&self) -> usize {
        *self.writes.lock().await
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn read(&self) -> Result<Config> {
        let map = self.record.lock().await.clone();
        decode_record(map)
    }

    async fn write(&self, partial: PartialConfig) -> Result<()> {
        let mut record = self.record.lock().await;
        crate::migrate_legacy(&mut record);
        merge_partial(&mut record, &partial)?;
        *self.writes.lock().await += 1;
        Ok(())
    }
}
