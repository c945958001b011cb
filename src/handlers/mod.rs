//! Request and exception handlers
//!
//! A handler declares which requests it accepts through `can_handle` and
//! turns an accepted request into a response. The skill asks handlers in
//! registration order and the first one that accepts wins.

mod builtin;
mod exception;
mod launch;
mod name;

pub use builtin::{
    CancelOrStopIntentHandler, FallbackIntentHandler, HelpIntentHandler, RepeatIntentHandler,
    SessionEndedRequestHandler,
};
pub use exception::CatchAllExceptionHandler;
pub use launch::LaunchRequestHandler;
pub use name::{
    DeleteNameIntentHandler, MyNameIsIntentHandler, UpdateNameIntentHandler,
    WhatsMyNameIntentHandler,
};

use crate::attributes::AttributesManager;
use crate::envelope::{RequestEnvelope, RequestType, ResponseBuilder};
use crate::i18n::PromptTable;
use crate::utils::short_type_name;
use crate::{Response, Result, SkillError};
use std::sync::Arc;
use tracing::warn;

pub const MY_NAME_IS_INTENT: &str = "MyNameIsIntent";
pub const WHATS_MY_NAME_INTENT: &str = "WhatsMyNameIntent";
pub const UPDATE_NAME_INTENT: &str = "UpdateNameIntent";
pub const DELETE_NAME_INTENT: &str = "DeleteNameIntent";
pub const REPEAT_INTENT: &str = "AMAZON.RepeatIntent";
pub const CANCEL_INTENT: &str = "AMAZON.CancelIntent";
pub const STOP_INTENT: &str = "AMAZON.StopIntent";
pub const HELP_INTENT: &str = "AMAZON.HelpIntent";
pub const FALLBACK_INTENT: &str = "AMAZON.FallbackIntent";

pub const USER_NAME_SLOT: &str = "UserNameSlot";
pub const NEW_NAME_SLOT: &str = "NewNameSlot";

/// Everything a handler can see or touch while serving one request
#[derive(Debug)]
pub struct HandlerInput<'a> {
    pub envelope: &'a RequestEnvelope,
    pub attributes: AttributesManager,
}

impl<'a> HandlerInput<'a> {
    pub fn new(envelope: &'a RequestEnvelope, attributes: AttributesManager) -> Self {
        Self {
            envelope,
            attributes,
        }
    }

    pub fn request_type(&self) -> RequestType {
        self.envelope.request_type()
    }

    pub fn intent_name(&self) -> Option<&str> {
        self.envelope.intent_name()
    }

    /// Prompt table resolved for this request by the localization interceptor
    pub fn prompts(&self) -> Result<Arc<PromptTable>> {
        self.attributes.request.prompts.clone().ok_or_else(|| {
            SkillError::MissingPrompt("No prompt table loaded for this request".to_string())
        })
    }

    /// Value of a required slot
    pub fn slot_value(&self, slot: &str) -> Result<String> {
        self.envelope
            .slot_value(slot)
            .map(str::to_string)
            .ok_or_else(|| SkillError::MissingSlot(slot.to_string()))
    }

    pub fn response_builder(&self) -> ResponseBuilder {
        ResponseBuilder::new()
    }
}

pub fn is_request_type(input: &HandlerInput<'_>, request_type: RequestType) -> bool {
    input.request_type() == request_type
}

pub fn is_intent_name(input: &HandlerInput<'_>, name: &str) -> bool {
    input.intent_name() == Some(name)
}

/// Saved user name, absorbing storage failures as "no name"
fn stored_user_name(input: &mut HandlerInput<'_>) -> Option<String> {
    match input.attributes.persistent_attributes() {
        Ok(attributes) => attributes.user_name.clone(),
        Err(e) => {
            warn!("Could not read persistent attributes: {}", e);
            None
        }
    }
}

pub trait RequestHandler: Send + Sync {
    /// Decide if this handler serves the request
    fn can_handle(&self, input: &HandlerInput<'_>) -> bool;

    /// Produce the response, mutating attributes as needed
    fn handle(&self, input: &mut HandlerInput<'_>) -> Result<Response>;

    /// Returns a stable name for logging
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Turns a failure raised anywhere in the pipeline into a response
pub trait ExceptionHandler: Send + Sync {
    fn can_handle(&self, input: &HandlerInput<'_>, error: &SkillError) -> bool;

    fn handle(&self, input: &mut HandlerInput<'_>, error: &SkillError) -> Result<Response>;

    /// Returns a stable name for logging
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::envelope::Request;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_predicates() {
        let store = MemoryStore::new();
        let env = RequestEnvelope::new(Request::intent("en-US", HELP_INTENT)).with_user(USER);
        let input = input(&env, &store);
        assert!(is_request_type(&input, RequestType::IntentRequest));
        assert!(is_intent_name(&input, HELP_INTENT));
        assert!(!is_intent_name(&input, STOP_INTENT));
    }

    #[test]
    fn test_launch_has_no_intent_name() {
        let store = MemoryStore::new();
        let env = RequestEnvelope::new(Request::launch("en-US"));
        let input = input(&env, &store);
        assert!(is_request_type(&input, RequestType::LaunchRequest));
        assert_eq!(input.intent_name(), None);
    }

    #[test]
    fn test_missing_slot() {
        let store = MemoryStore::new();
        let env = RequestEnvelope::new(Request::intent("en-US", MY_NAME_IS_INTENT));
        let input = input(&env, &store);
        assert!(matches!(
            input.slot_value(USER_NAME_SLOT),
            Err(SkillError::MissingSlot(ref s)) if s == USER_NAME_SLOT
        ));
    }

    #[test]
    fn test_prompts_absent_before_localization() {
        let env = RequestEnvelope::new(Request::launch("en-US"));
        let input = HandlerInput::new(
            &env,
            AttributesManager::new(None, None, Default::default()),
        );
        assert!(matches!(input.prompts(), Err(SkillError::MissingPrompt(_))));
    }

    #[test]
    fn test_handler_name() {
        assert_eq!(LaunchRequestHandler.name(), "LaunchRequestHandler");
        assert_eq!(CatchAllExceptionHandler.name(), "CatchAllExceptionHandler");
    }
}
