//! Skill configuration
//!
//! Values are layered: defaults, then an optional TOML file, then the
//! environment. The binary applies its command line flags last.

use crate::persistence::{FileStore, MemoryStore, PartitionKeyStrategy, PersistenceAdapter};
use crate::{Result, SkillError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const ENV_REGION: &str = "DYNAMODB_PERSISTENCE_REGION";
pub const ENV_TABLE_NAME: &str = "DYNAMODB_PERSISTENCE_TABLE_NAME";
pub const ENV_LANGUAGES_DIR: &str = "NAME_KEEPER_LANGUAGES_DIR";
pub const ENV_DATA_DIR: &str = "NAME_KEEPER_DATA_DIR";
pub const ENV_BACKEND: &str = "NAME_KEEPER_BACKEND";
pub const ENV_PARTITION_KEY: &str = "NAME_KEEPER_PARTITION_KEY";

/// Where persistent attributes live
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceBackend {
    /// One JSON file per partition under the data directory
    #[default]
    File,
    /// Process memory; everything is lost on exit
    Memory,
}

impl std::str::FromStr for PersistenceBackend {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(PersistenceBackend::File),
            "memory" => Ok(PersistenceBackend::Memory),
            other => Err(SkillError::ConfigError(format!(
                "Unknown persistence backend: {}",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Region of the managed store, reported in logs
    pub region: Option<String>,

    /// Table holding one record per partition
    pub table_name: String,

    /// Root directory for the file backend
    pub data_dir: PathBuf,

    pub backend: PersistenceBackend,

    /// Envelope identity used as the partition key
    pub partition_key: PartitionKeyStrategy,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            region: None,
            table_name: "name-keeper".to_string(),
            data_dir: default_data_dir(),
            backend: PersistenceBackend::File,
            partition_key: PartitionKeyStrategy::UserId,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("name-keeper")
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillConfig {
    /// Directory containing `<locale>.json` prompt tables
    pub languages_dir: PathBuf,

    pub persistence: PersistenceConfig,
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            languages_dir: PathBuf::from("languages"),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl SkillConfig {
    /// Load a TOML file; keys it leaves out keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SkillError::ConfigError(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            SkillError::ConfigError(format!("Failed to parse config '{}': {}", path.display(), e))
        })
    }

    /// Override fields from environment variables supplied by `lookup`
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(region) = get(ENV_REGION) {
            self.persistence.region = Some(region);
        }
        if let Some(table) = get(ENV_TABLE_NAME) {
            self.persistence.table_name = table;
        }
        if let Some(dir) = get(ENV_LANGUAGES_DIR) {
            self.languages_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get(ENV_DATA_DIR) {
            self.persistence.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = get(ENV_BACKEND) {
            self.persistence.backend = backend.parse()?;
        }
        if let Some(strategy) = get(ENV_PARTITION_KEY) {
            self.persistence.partition_key = strategy.parse()?;
        }
        Ok(self)
    }

    pub fn with_languages_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.languages_dir = dir.into();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persistence.data_dir = dir.into();
        self
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.persistence.table_name = table_name.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.persistence.region = Some(region.into());
        self
    }

    pub fn with_backend(mut self, backend: PersistenceBackend) -> Self {
        self.persistence.backend = backend;
        self
    }

    pub fn with_partition_key(mut self, strategy: PartitionKeyStrategy) -> Self {
        self.persistence.partition_key = strategy;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.persistence.table_name.trim().is_empty() {
            return Err(SkillError::ConfigError(
                "Persistence table name must not be empty".to_string(),
            ));
        }
        if !self.languages_dir.is_dir() {
            return Err(SkillError::ConfigError(format!(
                "Languages directory not found: {}",
                self.languages_dir.display()
            )));
        }
        Ok(())
    }

    /// Instantiate the configured persistence adapter
    pub fn build_adapter(&self) -> Arc<dyn PersistenceAdapter> {
        match self.persistence.backend {
            PersistenceBackend::File => Arc::new(FileStore::new(
                &self.persistence.data_dir,
                &self.persistence.table_name,
            )),
            PersistenceBackend::Memory => Arc::new(MemoryStore::new()),
        }
    }
}
