use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::KeyValueStore;

/// Store file name in the data directory
const STORE_FILE: &str = "storage.json";

/// A JSON object on disk. Every batch rewrites the whole file through a
/// temporary sibling and a rename, so the file is always a complete snapshot.
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store in `data_dir`, creating the directory if needed.
    /// A missing file is an empty store; an unreadable one is logged and
    /// treated as empty rather than blocking startup.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
        let path = data_dir.join(STORE_FILE);

        let entries = match Self::load(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable store file");
                BTreeMap::new()
            }
        };
        debug!(path = %path.display(), keys = entries.len(), "Store opened");

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(path).context("Failed to read store file")?;
        serde_json::from_str(&contents).context("Failed to parse store file")
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let contents = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).context("Failed to write store file")?;
        std::fs::rename(&tmp, &self.path).context("Failed to replace store file")?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        let mut next = self.entries.clone();
        for (key, value) in entries {
            next.insert((*key).to_string(), (*value).to_string());
        }
        // Memory only changes once the disk write went through.
        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }

    fn remove_many(&mut self, keys: &[&str]) -> Result<()> {
        let mut next = self.entries.clone();
        for key in keys {
            next.remove(*key);
        }
        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }
}
