use super::PersistenceAdapter;
use crate::attributes::PersistentAttributes;
use crate::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// In-process store, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, PersistentAttributes>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly
    pub fn insert(&self, key: impl Into<String>, attributes: PersistentAttributes) {
        self.records.write().insert(key.into(), attributes);
    }

    pub fn get(&self, key: &str) -> Option<PersistentAttributes> {
        self.records.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl PersistenceAdapter for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<PersistentAttributes>> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, attributes: &PersistentAttributes) -> Result<()> {
        self.insert(key, attributes.clone());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.records.write().remove(key);
        Ok(())
    }
}
