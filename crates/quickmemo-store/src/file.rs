//! JSON file config store.
//!
//! The whole record lives in one file. Each write loads the record, merges
//! the partial update, writes a sibling temp file and renames it over the
//! target, so a crash mid-write leaves either the old or the new record.
//! Temp names are unique per process and per write, so concurrent writers
//! never rename each other's files.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use quickmemo_core::{defaults, Config, ConfigStore, Error, PartialConfig, Result};

use crate::migration::{has_legacy_keys, migrate_legacy};
use crate::{decode_record, merge_partial};

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Config store persisted as a JSON file.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the default record path.
    ///
    /// Returns: ~/.config/quickmemo/config.json
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        path.push(defaults::CONFIG_DIR_NAME);
        path.push(defaults::CONFIG_FILE_NAME);
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite a legacy-layout file in the current layout.
    ///
    /// Returns true if the file was rewritten.
    pub async fn migrate(&self) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.load_map().await?;
        if !has_legacy_keys(&map) {
            return Ok(false);
        }
        migrate_legacy(&mut map);
        self.save_map(&map).await?;
        info!(path = %self.path.display(), "Migrated legacy config file");
        Ok(true)
    }

    async fn load_map(&self) -> Result<Map<String, Value>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Config file missing, using defaults");
                return Ok(Map::new());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(Error::Store(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(Error::Store(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn save_map(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_vec_pretty(map)?;
        let tmp = self.tmp_path(std::process::id(), TMP_SEQ.fetch_add(1, Ordering::Relaxed));
        fs::write(&tmp, content).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn tmp_path(&self, pid: u32, seq: u64) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| defaults::CONFIG_FILE_NAME.into());
        name.push(format!(".{}.{}.tmp", pid, seq));
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn read(&self) -> Result<Config> {
        decode_record(self.load_map().await?)
    }

    async fn write(&self, partial: PartialConfig) -> Result<()> {
        if partial.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        let mut map = self.load_map().await?;
        migrate_legacy(&mut map);
        merge_partial(&mut map, &partial)?;
        self.save_map(&map).await?;

        debug!(
            path = %self.path.display(),
            fields = partial.to_json_map()?.len(),
            "Config written"
        );
        Ok(())
    }
}
