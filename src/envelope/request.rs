//! Inbound request envelope

use crate::attributes::SessionAttributes;
use crate::{Result, SkillError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Kind of request carried by an envelope
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    /// Skill opened by its invocation name alone
    LaunchRequest,
    /// User said something that was classified as an intent
    IntentRequest,
    /// Session closed by the platform or the user
    SessionEndedRequest,
    /// Any request type this skill does not model
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestType::LaunchRequest => write!(f, "LaunchRequest"),
            RequestType::IntentRequest => write!(f, "IntentRequest"),
            RequestType::SessionEndedRequest => write!(f, "SessionEndedRequest"),
            RequestType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A named parameter extracted from the utterance
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slots: HashMap<String, Slot>,
}

/// Error details attached to a `SessionEndedRequest`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEndedError {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(rename = "type")]
    pub request_type: RequestType,
    #[serde(default = "generate_request_id")]
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionEndedError>,
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn generate_request_id() -> String {
    format!("local.{}", Uuid::new_v4())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "new", default)]
    pub is_new: bool,
    #[serde(default)]
    pub session_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: SessionAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    #[serde(rename = "System", default)]
    pub system: SystemState,
}

/// The complete inbound document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    pub request: Request,
}

fn default_version() -> String {
    super::ENVELOPE_VERSION.to_string()
}

impl RequestEnvelope {
    /// Parse an envelope from its JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| SkillError::EnvelopeError(format!("Invalid request envelope: {}", e)))
    }

    /// Build a minimal envelope around a request, mostly useful for tests and tooling
    pub fn new(request: Request) -> Self {
        Self {
            version: default_version(),
            session: None,
            context: None,
            request,
        }
    }

    /// Attach a session owned by `user_id`
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        let session = self.session.get_or_insert_with(Session::default);
        session.user = Some(User {
            user_id: user_id.into(),
        });
        self
    }

    /// Attach a device identity to the system context
    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        let context = self.context.get_or_insert_with(Context::default);
        context.system.device = Some(Device {
            device_id: device_id.into(),
        });
        self
    }

    /// Replace the inbound session attributes
    pub fn with_session_attributes(mut self, attributes: SessionAttributes) -> Self {
        self.session.get_or_insert_with(Session::default).attributes = attributes;
        self
    }

    pub fn request_type(&self) -> RequestType {
        self.request.request_type
    }

    pub fn request_id(&self) -> &str {
        &self.request.request_id
    }

    pub fn locale(&self) -> Option<&str> {
        self.request.locale.as_deref()
    }

    /// Name of the intent, for intent requests only
    pub fn intent_name(&self) -> Option<&str> {
        match self.request.request_type {
            RequestType::IntentRequest => self.request.intent.as_ref().map(|i| i.name.as_str()),
            _ => None,
        }
    }

    /// Value of a slot, ignoring slots the platform sent without a usable value
    pub fn slot_value(&self, slot: &str) -> Option<&str> {
        self.request
            .intent
            .as_ref()
            .and_then(|i| i.slots.get(slot))
            .and_then(|s| s.value.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// User identity: the session user, else the system context user
    pub fn user_id(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|s| s.user.as_ref())
            .or_else(|| self.context.as_ref().and_then(|c| c.system.user.as_ref()))
            .map(|u| u.user_id.as_str())
    }

    pub fn device_id(&self) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|c| c.system.device.as_ref())
            .map(|d| d.device_id.as_str())
    }

    /// Session attributes as they arrived, empty outside a session
    pub fn session_attributes(&self) -> SessionAttributes {
        self.session
            .as_ref()
            .map(|s| s.attributes.clone())
            .unwrap_or_default()
    }
}

impl Request {
    fn bare(request_type: RequestType, locale: &str) -> Self {
        Self {
            request_type,
            request_id: generate_request_id(),
            timestamp: Some(Utc::now()),
            locale: Some(locale.to_string()),
            intent: None,
            reason: None,
            error: None,
        }
    }

    pub fn launch(locale: &str) -> Self {
        Self::bare(RequestType::LaunchRequest, locale)
    }

    pub fn intent(locale: &str, name: &str) -> Self {
        let mut request = Self::bare(RequestType::IntentRequest, locale);
        request.intent = Some(Intent {
            name: name.to_string(),
            slots: HashMap::new(),
        });
        request
    }

    pub fn session_ended(locale: &str, reason: &str) -> Self {
        let mut request = Self::bare(RequestType::SessionEndedRequest, locale);
        request.reason = Some(reason.to_string());
        request
    }

    /// Add a filled slot to an intent request
    pub fn with_slot(mut self, name: &str, value: &str) -> Self {
        if let Some(intent) = self.intent.as_mut() {
            intent.slots.insert(
                name.to_string(),
                Slot {
                    name: name.to_string(),
                    value: Some(value.to_string()),
                },
            );
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTENT_JSON: &str = r#"{
        "version": "1.0",
        "session": {
            "new": false,
            "sessionId": "amzn1.echo-api.session.1",
            "attributes": { "repeat_speech_output": "Hello there" },
            "user": { "userId": "amzn1.ask.account.ADA" }
        },
        "context": {
            "System": {
                "device": { "deviceId": "amzn1.ask.device.KITCHEN" },
                "user": { "userId": "amzn1.ask.account.CONTEXT" }
            }
        },
        "request": {
            "type": "IntentRequest",
            "requestId": "amzn1.echo-api.request.1",
            "timestamp": "2020-05-01T12:00:00Z",
            "locale": "en-US",
            "intent": {
                "name": "MyNameIsIntent",
                "confirmationStatus": "NONE",
                "slots": {
                    "UserNameSlot": { "name": "UserNameSlot", "value": " Ada " }
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_intent_envelope() {
        let env = RequestEnvelope::from_json(INTENT_JSON).unwrap();
        assert_eq!(env.request_type(), RequestType::IntentRequest);
        assert_eq!(env.intent_name(), Some("MyNameIsIntent"));
        assert_eq!(env.slot_value("UserNameSlot"), Some("Ada"));
        assert_eq!(env.locale(), Some("en-US"));
        assert_eq!(env.request_id(), "amzn1.echo-api.request.1");
        assert_eq!(env.user_id(), Some("amzn1.ask.account.ADA"));
        assert_eq!(env.device_id(), Some("amzn1.ask.device.KITCHEN"));
        assert_eq!(
            env.session_attributes().repeat_speech_output.as_deref(),
            Some("Hello there")
        );
    }

    #[test]
    fn test_user_falls_back_to_context() {
        let json = r#"{
            "context": { "System": { "user": { "userId": "ctx-user" } } },
            "request": { "type": "LaunchRequest", "locale": "en-GB" }
        }"#;
        let env = RequestEnvelope::from_json(json).unwrap();
        assert_eq!(env.user_id(), Some("ctx-user"));
        assert_eq!(env.intent_name(), None);
        assert!(env.request_id().starts_with("local."));
        assert!(env.session_attributes().is_empty());
    }

    #[test]
    fn test_null_attributes_and_slots() {
        let json = r#"{
            "session": {
                "new": true,
                "sessionId": "amzn1.echo-api.session.2",
                "attributes": null,
                "user": { "userId": "amzn1.ask.account.ADA" }
            },
            "request": {
                "type": "IntentRequest",
                "locale": "en-US",
                "intent": { "name": "WhatsMyNameIntent", "slots": null }
            }
        }"#;
        let env = RequestEnvelope::from_json(json).unwrap();
        assert!(env.session_attributes().is_empty());
        assert_eq!(env.intent_name(), Some("WhatsMyNameIntent"));
        assert_eq!(env.slot_value("UserNameSlot"), None);
    }

    #[test]
    fn test_unknown_request_type() {
        let json = r#"{ "request": { "type": "CanFulfillIntentRequest", "locale": "en-US" } }"#;
        let env = RequestEnvelope::from_json(json).unwrap();
        assert_eq!(env.request_type(), RequestType::Unknown);
    }

    #[test]
    fn test_empty_slot_value_is_absent() {
        let env = RequestEnvelope::new(
            Request::intent("en-US", "MyNameIsIntent").with_slot("UserNameSlot", "   "),
        );
        assert_eq!(env.slot_value("UserNameSlot"), None);
        assert_eq!(env.slot_value("OtherSlot"), None);
    }

    #[test]
    fn test_malformed_envelope() {
        let err = RequestEnvelope::from_json("{ \"request\": {} }").unwrap_err();
        assert!(matches!(err, SkillError::EnvelopeError(_)));
    }

    #[test]
    fn test_builders() {
        let env = RequestEnvelope::new(Request::launch("de-DE"))
            .with_user("u-1")
            .with_device("d-1");
        assert_eq!(env.user_id(), Some("u-1"));
        assert_eq!(env.device_id(), Some("d-1"));
        assert_eq!(env.request_type(), RequestType::LaunchRequest);
    }
}
