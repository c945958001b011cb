//! Persistence gateway
//!
//! The skill never talks to a storage service directly. Everything goes
//! through [`PersistenceAdapter`], keyed by a partition key derived from the
//! request envelope. Last write wins; there is no versioning.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::attributes::PersistentAttributes;
use crate::envelope::RequestEnvelope;
use crate::utils::short_type_name;
use crate::{Result, SkillError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Key-value access to per-identity attribute records
pub trait PersistenceAdapter: Send + Sync {
    /// Fetch the record for `key`, `None` when nothing was ever stored
    fn load(&self, key: &str) -> Result<Option<PersistentAttributes>>;

    /// Create or overwrite the record for `key`
    fn save(&self, key: &str, attributes: &PersistentAttributes) -> Result<()>;

    /// Remove the record for `key`; removing a missing record succeeds
    fn delete(&self, key: &str) -> Result<()>;

    /// Returns a stable name for logging
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Which envelope identity partitions the persistent store
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKeyStrategy {
    /// One record per account
    #[default]
    UserId,
    /// One record per device
    DeviceId,
}

impl PartitionKeyStrategy {
    pub fn key_for(&self, envelope: &RequestEnvelope) -> Option<String> {
        match self {
            PartitionKeyStrategy::UserId => envelope.user_id(),
            PartitionKeyStrategy::DeviceId => envelope.device_id(),
        }
        .map(str::to_string)
    }
}

impl FromStr for PartitionKeyStrategy {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "user_id" | "user" => Ok(PartitionKeyStrategy::UserId),
            "device_id" | "device" => Ok(PartitionKeyStrategy::DeviceId),
            other => Err(SkillError::ConfigError(format!(
                "Unknown partition key strategy: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for PartitionKeyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionKeyStrategy::UserId => write!(f, "user_id"),
            PartitionKeyStrategy::DeviceId => write!(f, "device_id"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Request;

    #[test]
    fn test_partition_key_strategies() {
        let env = RequestEnvelope::new(Request::launch("en-US"))
            .with_user("user-1")
            .with_device("device-1");
        assert_eq!(
            PartitionKeyStrategy::UserId.key_for(&env).as_deref(),
            Some("user-1")
        );
        assert_eq!(
            PartitionKeyStrategy::DeviceId.key_for(&env).as_deref(),
            Some("device-1")
        );

        let anonymous = RequestEnvelope::new(Request::launch("en-US"));
        assert_eq!(PartitionKeyStrategy::UserId.key_for(&anonymous), None);
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!(
            "user_id".parse::<PartitionKeyStrategy>().unwrap(),
            PartitionKeyStrategy::UserId
        );
        assert_eq!(
            "Device-Id".parse::<PartitionKeyStrategy>().unwrap(),
            PartitionKeyStrategy::DeviceId
        );
        assert!("session".parse::<PartitionKeyStrategy>().is_err());
    }

    #[test]
    fn test_adapter_name() {
        let store = MemoryStore::new();
        assert_eq!(store.name(), "MemoryStore");
    }
}
