//! Attribute records and the per-invocation attributes manager
//!
//! Three scopes exist:
//! - **Persistent**: per user identity, survives sessions, lives in the store
//! - **Session**: per conversation, travels inside the envelopes
//! - **Request**: per invocation, filled by request interceptors

use crate::i18n::PromptTable;
use crate::persistence::PersistenceAdapter;
use crate::{Result, SkillError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Attributes stored per user identity
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl PersistentAttributes {
    pub fn with_user_name(name: impl Into<String>) -> Self {
        Self {
            user_name: Some(name.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_name.is_none()
    }
}

/// Attributes carried from one turn of a conversation to the next
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAttributes {
    /// Speech of the last response, markup wrapper removed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_speech_output: Option<String>,
    /// Reprompt of the last response, or its speech when it had none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_reprompt: Option<String>,
}

impl SessionAttributes {
    pub fn is_empty(&self) -> bool {
        self.repeat_speech_output.is_none() && self.repeat_reprompt.is_none()
    }
}

/// Attributes that only live for a single invocation
#[derive(Clone, Debug, Default)]
pub struct RequestAttributes {
    /// Prompt table resolved for the request locale
    pub prompts: Option<Arc<PromptTable>>,
    /// Locale the prompt table was actually loaded for
    pub resolved_locale: Option<String>,
}

/// Gives handlers access to all three attribute scopes
///
/// Persistent attributes are loaded lazily on first access and cached for the
/// rest of the invocation; nothing is written back unless a handler asks for it.
pub struct AttributesManager {
    adapter: Option<Arc<dyn PersistenceAdapter>>,
    partition_key: Option<String>,
    persistent: Option<PersistentAttributes>,
    pub session: SessionAttributes,
    pub request: RequestAttributes,
}

impl AttributesManager {
    pub fn new(
        adapter: Option<Arc<dyn PersistenceAdapter>>,
        partition_key: Option<String>,
        session: SessionAttributes,
    ) -> Self {
        Self {
            adapter,
            partition_key,
            persistent: None,
            session,
            request: RequestAttributes::default(),
        }
    }

    fn backend(&self) -> Result<(&dyn PersistenceAdapter, &str)> {
        let adapter = self.adapter.as_deref().ok_or_else(|| {
            SkillError::PersistenceError("No persistence adapter configured".to_string())
        })?;
        let key = self.partition_key.as_deref().ok_or_else(|| {
            SkillError::MissingIdentity("Request carries no partition identity".to_string())
        })?;
        Ok((adapter, key))
    }

    /// Persistent attributes for the requesting identity, empty if none were stored
    pub fn persistent_attributes(&mut self) -> Result<&PersistentAttributes> {
        Ok(self.persistent_attributes_mut()?)
    }

    pub fn persistent_attributes_mut(&mut self) -> Result<&mut PersistentAttributes> {
        if self.persistent.is_none() {
            let (adapter, key) = self.backend()?;
            let loaded = adapter.load(key)?;
            debug!("Loaded persistent attributes for {}: {:?}", key, loaded);
            self.persistent = Some(loaded.unwrap_or_default());
        }
        Ok(self.persistent.get_or_insert_with(PersistentAttributes::default))
    }

    /// Write the cached persistent attributes to the store
    pub fn save_persistent_attributes(&mut self) -> Result<()> {
        let Some(attributes) = self.persistent.as_ref() else {
            debug!("No persistent attributes loaded, nothing to save");
            return Ok(());
        };
        let (adapter, key) = self.backend()?;
        adapter.save(key, attributes)
    }

    /// Erase every persistent attribute for the requesting identity
    pub fn delete_persistent_attributes(&mut self) -> Result<()> {
        let (adapter, key) = self.backend()?;
        adapter.delete(key)?;
        self.persistent = Some(PersistentAttributes::default());
        Ok(())
    }
}

impl std::fmt::Debug for AttributesManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributesManager")
            .field("partition_key", &self.partition_key)
            .field("persistent", &self.persistent)
            .field("session", &self.session)
            .field("resolved_locale", &self.request.resolved_locale)
            .finish()
    }
}
