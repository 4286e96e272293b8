//! # quickmemo-store
//!
//! [`ConfigStore`](quickmemo_core::ConfigStore) implementations.
//!
//! - [`FileConfigStore`]: one JSON document on disk, replaced atomically on
//!   every write. Survives process teardown; this is what the CLI uses.
//! - [`MemoryConfigStore`]: same merge semantics without a file, for tests and
//!   embedding.
//!
//! Both keep the record as a raw JSON object so keys this version does not
//! know about survive a write, and both read older record layouts through
//! [`migration::migrate_legacy`].

pub mod file;
pub mod memory;
pub mod migration;

pub use file::FileConfigStore;
pub use memory::MemoryConfigStore;
pub use migration::migrate_legacy;

use quickmemo_core::{Config, Error, PartialConfig, Result};
use serde_json::{Map, Value};

/// Decode a raw record, applying legacy migration in memory.
pub(crate) fn decode_record(mut map: Map<String, Value>) -> Result<Config> {
    migrate_legacy(&mut map);
    serde_json::from_value(Value::Object(map))
        .map_err(|e| Error::Store(format!("Failed to decode config record: {}", e)))
}

/// Shallow-merge `partial` into a raw record.
pub(crate) fn merge_partial(map: &mut Map<String, Value>, partial: &PartialConfig) -> Result<()> {
    for (key, value) in partial.to_json_map()? {
        map.insert(key, value);
    }
    Ok(())
}
