//! Local snapshot persistence for the anonymous mode.
//!
//! A single JSON file holds the whole data model, read once at startup and
//! rewritten on every mutation. An unreadable snapshot degrades to an empty
//! dataset instead of refusing to start, matching how the app has always
//! treated corrupted local data.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::warn;

use super::traits::SnapshotStore;
use crate::domain::store::FinanceState;

/// File name of the snapshot inside the data directory.
pub const SNAPSHOT_FILE: &str = "finance_data.json";

pub struct FileSnapshotStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSnapshotStore {
    /// Create a snapshot store writing to `<data_dir>/finance_data.json`.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir).with_context(|| {
            format!("failed to create data directory {}", data_dir.display())
        })?;
        Ok(Self {
            path: data_dir.join(SNAPSHOT_FILE),
            lock: Mutex::new(()),
        })
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<FinanceState>> {
        let _guard = self.lock.lock().unwrap();
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read snapshot {}", self.path.display()))?;
        match serde_json::from_str(&contents) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!(
                    "snapshot {} is unreadable, starting empty: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    fn save(&self, state: &FinanceState) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let tmp_path = self.path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(state)?;
        fs::write(&tmp_path, contents)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
