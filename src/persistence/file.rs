//! File-backed store: one JSON document per partition key
//!
//! Layout: `<data_dir>/<table_name>/<encoded key>.json`. Writes go to a
//! temporary file first and are renamed into place so a reader never sees a
//! half-written record.

use super::PersistenceAdapter;
use crate::attributes::PersistentAttributes;
use crate::{Result, SkillError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// On-disk shape of a record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub partition_key: String,
    pub attributes: PersistentAttributes,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store records for `table_name` under `data_dir`
    pub fn new(data_dir: impl AsRef<Path>, table_name: &str) -> Self {
        Self {
            dir: data_dir.as_ref().join(encode_key(table_name)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }

    /// Read the full record, including its metadata
    pub fn load_record(&self, key: &str) -> Result<Option<StoredRecord>> {
        let path = self.record_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SkillError::PersistenceError(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let record: StoredRecord = serde_json::from_str(&content).map_err(|e| {
            SkillError::PersistenceError(format!("Corrupt record {}: {}", path.display(), e))
        })?;
        Ok(Some(record))
    }
}

impl PersistenceAdapter for FileStore {
    fn load(&self, key: &str) -> Result<Option<PersistentAttributes>> {
        Ok(self.load_record(key)?.map(|r| r.attributes))
    }

    fn save(&self, key: &str, attributes: &PersistentAttributes) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            SkillError::PersistenceError(format!(
                "Failed to create {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let record = StoredRecord {
            partition_key: key.to_string(),
            attributes: attributes.clone(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&record)?;

        let path = self.record_path(key);
        let tmp = self.dir.join(format!(".{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| {
                let _ = fs::remove_file(&tmp);
                SkillError::PersistenceError(format!("Failed to write {}: {}", path.display(), e))
            })?;

        debug!("Saved record {}", path.display());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.record_path(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Deleted record {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SkillError::PersistenceError(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Make a key safe to use as a single file name component
///
/// ASCII letters, digits, `-` and `_` pass through; every other byte becomes `%XX`.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}
