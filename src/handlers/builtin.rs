//! Handlers for the platform's built-in intents and the session end request

use super::{
    is_intent_name, is_request_type, HandlerInput, RequestHandler, CANCEL_INTENT,
    FALLBACK_INTENT, HELP_INTENT, REPEAT_INTENT, STOP_INTENT,
};
use crate::envelope::RequestType;
use crate::i18n::PromptKey;
use crate::{Response, Result};
use tracing::{debug, info, warn};

/// Replays the speech captured from the previous response
pub struct RepeatIntentHandler;

impl RequestHandler for RepeatIntentHandler {
    fn can_handle(&self, input: &HandlerInput<'_>) -> bool {
        is_intent_name(input, REPEAT_INTENT)
    }

    fn handle(&self, input: &mut HandlerInput<'_>) -> Result<Response> {
        let prompts = input.prompts()?;
        let session = &input.attributes.session;

        let Some(speech) = session.repeat_speech_output.clone() else {
            debug!("Repeat requested before anything was said");
            let speech = prompts.pick(PromptKey::NothingToRepeat)?;
            let reprompt = prompts.pick(PromptKey::HelpReprompt)?;
            return Ok(input.response_builder().speak(speech).ask(reprompt).build());
        };
        let reprompt = session
            .repeat_reprompt
            .clone()
            .unwrap_or_else(|| speech.clone());

        // Captured text is already markup, so it is not escaped again
        let speech = prompts.render(PromptKey::Repeat, &speech)?;
        let reprompt = prompts.render(PromptKey::RepeatReprompt, &reprompt)?;
        Ok(input.response_builder().speak(speech).ask(reprompt).build())
    }
}

pub struct CancelOrStopIntentHandler;

impl RequestHandler for CancelOrStopIntentHandler {
    fn can_handle(&self, input: &HandlerInput<'_>) -> bool {
        is_intent_name(input, CANCEL_INTENT) || is_intent_name(input, STOP_INTENT)
    }

    fn handle(&self, input: &mut HandlerInput<'_>) -> Result<Response> {
        let prompts = input.prompts()?;
        let speech = prompts.pick(PromptKey::CancelStopResponse)?;
        Ok(input
            .response_builder()
            .speak(speech)
            .set_should_end_session(true)
            .build())
    }
}

pub struct HelpIntentHandler;

impl RequestHandler for HelpIntentHandler {
    fn can_handle(&self, input: &HandlerInput<'_>) -> bool {
        is_intent_name(input, HELP_INTENT)
    }

    fn handle(&self, input: &mut HandlerInput<'_>) -> Result<Response> {
        let prompts = input.prompts()?;
        let speech = prompts.pick(PromptKey::Help)?;
        let reprompt = prompts.pick(PromptKey::HelpReprompt)?;
        Ok(input.response_builder().speak(speech).ask(reprompt).build())
    }
}

/// Utterances the interaction model could not map to any other intent
pub struct FallbackIntentHandler;

impl RequestHandler for FallbackIntentHandler {
    fn can_handle(&self, input: &HandlerInput<'_>) -> bool {
        is_intent_name(input, FALLBACK_INTENT)
    }

    fn handle(&self, input: &mut HandlerInput<'_>) -> Result<Response> {
        let prompts = input.prompts()?;
        let speech = prompts.pick(PromptKey::Fallback)?;
        let reprompt = prompts.pick(PromptKey::FallbackReprompt)?;
        Ok(input.response_builder().speak(speech).ask(reprompt).build())
    }
}

pub struct SessionEndedRequestHandler;

impl RequestHandler for SessionEndedRequestHandler {
    fn can_handle(&self, input: &HandlerInput<'_>) -> bool {
        is_request_type(input, RequestType::SessionEndedRequest)
    }

    fn handle(&self, input: &mut HandlerInput<'_>) -> Result<Response> {
        let request = &input.envelope.request;
        info!(
            "Session ended with the reason: {}",
            request.reason.as_deref().unwrap_or("UNKNOWN")
        );
        if let Some(error) = &request.error {
            warn!("Session ended with error {}: {}", error.kind, error.message);
        }
        Ok(input.response_builder().build())
    }
}
