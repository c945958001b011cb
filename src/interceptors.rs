//! Global interceptors
//!
//! Request interceptors run, in registration order, before routing. Response
//! interceptors run after the handler has produced its response and before
//! the envelope leaves the skill.

use crate::handlers::HandlerInput;
use crate::i18n::LanguageLoader;
use crate::utils::short_type_name;
use crate::{Response, Result, SkillError};
use std::sync::Arc;
use tracing::{debug, info};

pub trait RequestInterceptor: Send + Sync {
    fn process(&self, input: &mut HandlerInput<'_>) -> Result<()>;

    /// Returns a stable name for logging
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

pub trait ResponseInterceptor: Send + Sync {
    fn process(&self, input: &mut HandlerInput<'_>, response: &Response) -> Result<()>;

    /// Returns a stable name for logging
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Resolves the request locale to a prompt table and attaches it to the
/// request attributes for the handlers
pub struct LocalizationInterceptor {
    loader: LanguageLoader,
}

impl LocalizationInterceptor {
    pub fn new(loader: LanguageLoader) -> Self {
        Self { loader }
    }
}

impl RequestInterceptor for LocalizationInterceptor {
    fn process(&self, input: &mut HandlerInput<'_>) -> Result<()> {
        let locale = input
            .envelope
            .locale()
            .ok_or_else(|| SkillError::LocaleNotFound("Request carries no locale".to_string()))?;
        info!("Locale is {}", locale);

        let (resolved, table) = self.loader.load(locale)?;
        if resolved != locale {
            debug!("Using '{}' prompts for locale '{}'", resolved, locale);
        }

        input.attributes.request.prompts = Some(Arc::new(table));
        input.attributes.request.resolved_locale = Some(resolved);
        Ok(())
    }
}

/// Logs every inbound request at debug level
pub struct RequestLogger;

impl RequestInterceptor for RequestLogger {
    fn process(&self, input: &mut HandlerInput<'_>) -> Result<()> {
        debug!("Request: {:?}", input.envelope.request);
        Ok(())
    }
}

/// Logs every outbound response at debug level
pub struct ResponseLogger;

impl ResponseInterceptor for ResponseLogger {
    fn process(&self, _input: &mut HandlerInput<'_>, response: &Response) -> Result<()> {
        debug!("Response: {:?}", response);
        Ok(())
    }
}

/// Captures the speech of each response into the session so the repeat
/// intent can replay it on the next turn
pub struct RepeatInterceptor;

impl ResponseInterceptor for RepeatInterceptor {
    fn process(&self, input: &mut HandlerInput<'_>, response: &Response) -> Result<()> {
        let Some(speech) = response.speech_text() else {
            debug!("Response has no speech, nothing to capture");
            return Ok(());
        };
        let reprompt = response.reprompt_text().unwrap_or_else(|| speech.clone());

        let session = &mut input.attributes.session;
        session.repeat_speech_output = Some(speech);
        session.repeat_reprompt = Some(reprompt);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributesManager, SessionAttributes};
    use crate::envelope::{Request, RequestEnvelope, ResponseBuilder};
    use crate::i18n::PromptKey;
    use std::fs;

    fn bare_input(env: &RequestEnvelope) -> HandlerInput<'_> {
        HandlerInput::new(
            env,
            AttributesManager::new(None, None, env.session_attributes()),
        )
    }

    #[test]
    fn test_localization_attaches_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("en.json"), r#"{ "HELP": ["Ask away."] }"#).unwrap();

        let interceptor = LocalizationInterceptor::new(LanguageLoader::new(dir.path()));
        let env = RequestEnvelope::new(Request::launch("en-IN"));
        let mut input = bare_input(&env);
        interceptor.process(&mut input).unwrap();

        assert_eq!(input.attributes.request.resolved_locale.as_deref(), Some("en"));
        assert_eq!(
            input.prompts().unwrap().pick(PromptKey::Help).unwrap(),
            "Ask away."
        );
    }

    #[test]
    fn test_localization_without_locale_fails() {
        let dir = tempfile::tempdir().unwrap();
        let interceptor = LocalizationInterceptor::new(LanguageLoader::new(dir.path()));
        let mut request = Request::launch("en-US");
        request.locale = None;
        let env = RequestEnvelope::new(request);
        let mut input = bare_input(&env);

        let err = interceptor.process(&mut input).unwrap_err();
        assert!(matches!(err, SkillError::LocaleNotFound(_)));
    }

    #[test]
    fn test_repeat_capture_strips_markup() {
        let env = RequestEnvelope::new(Request::launch("en-US"));
        let mut input = bare_input(&env);
        let response = ResponseBuilder::new()
            .speak("Hello <break time=\"1s\"/> Ada")
            .ask("Still there?")
            .build();

        RepeatInterceptor.process(&mut input, &response).unwrap();
        assert_eq!(
            input.attributes.session,
            SessionAttributes {
                repeat_speech_output: Some("Hello <break time=\"1s\"/> Ada".to_string()),
                repeat_reprompt: Some("Still there?".to_string()),
            }
        );
    }

    #[test]
    fn test_repeat_capture_reuses_speech_as_reprompt() {
        let env = RequestEnvelope::new(Request::launch("en-US"));
        let mut input = bare_input(&env);
        let response = ResponseBuilder::new()
            .speak("Goodbye")
            .set_should_end_session(true)
            .build();

        RepeatInterceptor.process(&mut input, &response).unwrap();
        assert_eq!(input.attributes.session.repeat_reprompt.as_deref(), Some("Goodbye"));
    }

    #[test]
    fn test_repeat_capture_ignores_empty_response() {
        let previous = SessionAttributes {
            repeat_speech_output: Some("Earlier".to_string()),
            repeat_reprompt: None,
        };
        let env = RequestEnvelope::new(Request::session_ended("en-US", "EXCEEDED_MAX_REPROMPTS"))
            .with_session_attributes(previous.clone());
        let mut input = bare_input(&env);

        RepeatInterceptor
            .process(&mut input, &ResponseBuilder::new().build())
            .unwrap();
        assert_eq!(input.attributes.session, previous);
    }

    #[test]
    fn test_interceptor_names() {
        assert_eq!(RepeatInterceptor.name(), "RepeatInterceptor");
        assert_eq!(RequestLogger.name(), "RequestLogger");
    }
}
