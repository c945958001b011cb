//! Skill assembly and request dispatch
//!
//! # Architecture
//!
//! ```text
//! envelope -> request interceptors -> first matching handler
//!          -> response interceptors -> response envelope
//! ```
//!
//! Any failure along the way, including a panic, is handed to the first
//! matching exception handler. If that fails as well, a built-in apology is
//! returned, so `invoke` always produces a response envelope.

use crate::attributes::AttributesManager;
use crate::handlers::{
    CancelOrStopIntentHandler, CatchAllExceptionHandler, DeleteNameIntentHandler,
    ExceptionHandler, FallbackIntentHandler, HandlerInput, HelpIntentHandler,
    LaunchRequestHandler, MyNameIsIntentHandler, RepeatIntentHandler, RequestHandler,
    SessionEndedRequestHandler, UpdateNameIntentHandler, WhatsMyNameIntentHandler,
};
use crate::i18n::LanguageLoader;
use crate::interceptors::{
    LocalizationInterceptor, RepeatInterceptor, RequestInterceptor, RequestLogger,
    ResponseInterceptor, ResponseLogger,
};
use crate::persistence::{PartitionKeyStrategy, PersistenceAdapter};
use crate::utils::Stopwatch;
use crate::{
    RequestEnvelope, Response, ResponseBuilder, ResponseEnvelope, Result, SkillConfig, SkillError,
};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Spoken when even the exception handlers cannot produce a response
pub const FALLBACK_ERROR_SPEECH: &str =
    "Sorry, I had trouble doing what you asked. Please try again.";

fn fallback_response() -> Response {
    ResponseBuilder::new()
        .speak(FALLBACK_ERROR_SPEECH)
        .ask(FALLBACK_ERROR_SPEECH)
        .build()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// A fully assembled skill
///
/// Holds no per-request state and can be shared between threads.
pub struct Skill {
    request_handlers: Vec<Box<dyn RequestHandler>>,
    exception_handlers: Vec<Box<dyn ExceptionHandler>>,
    request_interceptors: Vec<Box<dyn RequestInterceptor>>,
    response_interceptors: Vec<Box<dyn ResponseInterceptor>>,
    persistence: Option<Arc<dyn PersistenceAdapter>>,
    partition_key: PartitionKeyStrategy,
}

impl Skill {
    pub fn builder() -> SkillBuilder {
        SkillBuilder::new()
    }

    /// Serve one request; never fails
    pub fn invoke(&self, envelope: &RequestEnvelope) -> ResponseEnvelope {
        let mut timer = Stopwatch::start();
        let attributes = AttributesManager::new(
            self.persistence.clone(),
            self.partition_key.key_for(envelope),
            envelope.session_attributes(),
        );
        let mut input = HandlerInput::new(envelope, attributes);

        let outcome = catch_unwind(AssertUnwindSafe(|| self.dispatch(&mut input, &mut timer)))
            .unwrap_or_else(|payload| {
                Err(SkillError::HandlerPanicked(panic_message(payload.as_ref())))
            });

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                let response = self.handle_exception(&mut input, &e);
                timer.split("exception_handler");
                response
            }
        };

        debug!(
            "Request {} served in {}ms ({})",
            envelope.request_id(),
            timer.elapsed_ms(),
            timer.summary()
        );
        ResponseEnvelope::new(response, input.attributes.session)
    }

    /// Parse an envelope, serve it, and serialize the response
    ///
    /// An unparseable envelope still gets the built-in apology.
    pub fn invoke_json(&self, json: &str) -> Result<String> {
        self.invoke_raw(json).to_json()
    }

    /// Same as [`Skill::invoke_json`] with indented output
    pub fn invoke_json_pretty(&self, json: &str) -> Result<String> {
        self.invoke_raw(json).to_json_pretty()
    }

    fn invoke_raw(&self, json: &str) -> ResponseEnvelope {
        match RequestEnvelope::from_json(json) {
            Ok(envelope) => self.invoke(&envelope),
            Err(e) => {
                error!("Rejected request envelope: {}", e);
                ResponseEnvelope::new(fallback_response(), Default::default())
            }
        }
    }

    fn dispatch(&self, input: &mut HandlerInput<'_>, timer: &mut Stopwatch) -> Result<Response> {
        for interceptor in &self.request_interceptors {
            interceptor.process(input)?;
        }
        timer.split("request_interceptors");

        let handler = self
            .request_handlers
            .iter()
            .find(|h| h.can_handle(input))
            .ok_or_else(|| {
                SkillError::NoHandler(match input.intent_name() {
                    Some(intent) => format!("{} {}", input.request_type(), intent),
                    None => input.request_type().to_string(),
                })
            })?;

        debug!("Dispatching to {}", handler.name());
        let response = handler.handle(input)?;
        timer.split("handler");

        for interceptor in &self.response_interceptors {
            interceptor.process(input, &response)?;
        }
        timer.split("response_interceptors");

        Ok(response)
    }

    /// Logs the failure once, then turns it into a response
    fn handle_exception(&self, input: &mut HandlerInput<'_>, err: &SkillError) -> Response {
        error!(
            request_id = %input.envelope.request_id(),
            request_type = %input.request_type(),
            intent = input.intent_name().unwrap_or("-"),
            recoverable = err.is_recoverable(),
            "Request failed: {:?}",
            err
        );

        let Some(handler) = self
            .exception_handlers
            .iter()
            .find(|h| h.can_handle(input, err))
        else {
            warn!("No exception handler for {}, using built-in apology", err);
            return fallback_response();
        };

        match catch_unwind(AssertUnwindSafe(|| handler.handle(input, err))) {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(
                    "Exception handler {} failed with {}, using built-in apology",
                    handler.name(),
                    e
                );
                fallback_response()
            }
            Err(payload) => {
                warn!(
                    "Exception handler {} panicked: {}",
                    handler.name(),
                    panic_message(payload.as_ref())
                );
                fallback_response()
            }
        }
    }
}

/// Collects handlers, interceptors, and persistence into a [`Skill`]
#[derive(Default)]
pub struct SkillBuilder {
    request_handlers: Vec<Box<dyn RequestHandler>>,
    exception_handlers: Vec<Box<dyn ExceptionHandler>>,
    request_interceptors: Vec<Box<dyn RequestInterceptor>>,
    response_interceptors: Vec<Box<dyn ResponseInterceptor>>,
    persistence: Option<Arc<dyn PersistenceAdapter>>,
    partition_key: PartitionKeyStrategy,
}

impl SkillBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handlers are consulted in the order they are added
    pub fn add_request_handler(mut self, handler: impl RequestHandler + 'static) -> Self {
        self.request_handlers.push(Box::new(handler));
        self
    }

    pub fn add_exception_handler(mut self, handler: impl ExceptionHandler + 'static) -> Self {
        self.exception_handlers.push(Box::new(handler));
        self
    }

    pub fn add_global_request_interceptor(
        mut self,
        interceptor: impl RequestInterceptor + 'static,
    ) -> Self {
        self.request_interceptors.push(Box::new(interceptor));
        self
    }

    pub fn add_global_response_interceptor(
        mut self,
        interceptor: impl ResponseInterceptor + 'static,
    ) -> Self {
        self.response_interceptors.push(Box::new(interceptor));
        self
    }

    pub fn persistence_adapter(mut self, adapter: Arc<dyn PersistenceAdapter>) -> Self {
        self.persistence = Some(adapter);
        self
    }

    pub fn partition_key(mut self, strategy: PartitionKeyStrategy) -> Self {
        self.partition_key = strategy;
        self
    }

    pub fn build(self) -> Skill {
        Skill {
            request_handlers: self.request_handlers,
            exception_handlers: self.exception_handlers,
            request_interceptors: self.request_interceptors,
            response_interceptors: self.response_interceptors,
            persistence: self.persistence,
            partition_key: self.partition_key,
        }
    }
}

/// Builder with the name skill's handlers and interceptors registered, but
/// no persistence adapter
pub fn standard_builder(languages_dir: impl AsRef<Path>) -> SkillBuilder {
    SkillBuilder::new()
        .add_request_handler(LaunchRequestHandler)
        .add_request_handler(MyNameIsIntentHandler)
        .add_request_handler(WhatsMyNameIntentHandler)
        .add_request_handler(UpdateNameIntentHandler)
        .add_request_handler(DeleteNameIntentHandler)
        .add_request_handler(RepeatIntentHandler)
        .add_request_handler(CancelOrStopIntentHandler)
        .add_request_handler(HelpIntentHandler)
        .add_request_handler(FallbackIntentHandler)
        .add_request_handler(SessionEndedRequestHandler)
        .add_exception_handler(CatchAllExceptionHandler)
        .add_global_request_interceptor(LocalizationInterceptor::new(LanguageLoader::new(
            languages_dir.as_ref(),
        )))
        .add_global_request_interceptor(RequestLogger)
        .add_global_response_interceptor(RepeatInterceptor)
        .add_global_response_interceptor(ResponseLogger)
}

/// The name skill wired to the configured persistence backend
pub fn standard_skill(config: &SkillConfig) -> Skill {
    let adapter = config.build_adapter();
    info!(
        "Persistence: {} table '{}' (region {}, partitioned by {})",
        adapter.name(),
        config.persistence.table_name,
        config.persistence.region.as_deref().unwrap_or("unset"),
        config.persistence.partition_key
    );

    standard_builder(&config.languages_dir)
        .persistence_adapter(adapter)
        .partition_key(config.persistence.partition_key)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Request, RequestType};
    use crate::handlers::is_request_type;

    struct Always(&'static str);

    impl RequestHandler for Always {
        fn can_handle(&self, _input: &HandlerInput<'_>) -> bool {
            true
        }

        fn handle(&self, input: &mut HandlerInput<'_>) -> Result<Response> {
            Ok(input.response_builder().speak(self.0).build())
        }
    }

    struct LaunchOnly;

    impl RequestHandler for LaunchOnly {
        fn can_handle(&self, input: &HandlerInput<'_>) -> bool {
            is_request_type(input, RequestType::LaunchRequest)
        }

        fn handle(&self, input: &mut HandlerInput<'_>) -> Result<Response> {
            Ok(input.response_builder().speak("launch").build())
        }
    }

    struct Panics;

    impl RequestHandler for Panics {
        fn can_handle(&self, _input: &HandlerInput<'_>) -> bool {
            true
        }

        fn handle(&self, _input: &mut HandlerInput<'_>) -> Result<Response> {
            panic!("handler exploded")
        }
    }

    struct Spoken;

    impl ExceptionHandler for Spoken {
        fn can_handle(&self, _input: &HandlerInput<'_>, _error: &SkillError) -> bool {
            true
        }

        fn handle(&self, input: &mut HandlerInput<'_>, error: &SkillError) -> Result<Response> {
            Ok(input
                .response_builder()
                .speak(format!("handled {}", error))
                .ask("again?")
                .build())
        }
    }

    fn speech(envelope: &ResponseEnvelope) -> String {
        envelope.response.speech_text().unwrap_or_default()
    }

    #[test]
    fn test_first_match_wins() {
        let skill = Skill::builder()
            .add_request_handler(LaunchOnly)
            .add_request_handler(Always("first"))
            .add_request_handler(Always("second"))
            .build();

        let launch = RequestEnvelope::new(Request::launch("en-US"));
        assert_eq!(speech(&skill.invoke(&launch)), "launch");

        let intent = RequestEnvelope::new(Request::intent("en-US", "AnyIntent"));
        assert_eq!(speech(&skill.invoke(&intent)), "first");
    }

    #[test]
    fn test_no_handler_goes_to_exception_handler() {
        let skill = Skill::builder()
            .add_request_handler(LaunchOnly)
            .add_exception_handler(Spoken)
            .build();

        let intent = RequestEnvelope::new(Request::intent("en-US", "AnyIntent"));
        let out = skill.invoke(&intent);
        assert!(speech(&out).starts_with("handled No handler for request: IntentRequest AnyIntent"));
        assert!(!out.response.ends_session());
    }

    #[test]
    fn test_panic_is_contained() {
        let skill = Skill::builder()
            .add_request_handler(Panics)
            .add_exception_handler(Spoken)
            .build();

        let out = skill.invoke(&RequestEnvelope::new(Request::launch("en-US")));
        assert_eq!(speech(&out), "handled Handler panicked: handler exploded");
    }

    #[test]
    fn test_without_exception_handlers_uses_builtin_apology() {
        let skill = Skill::builder().build();
        let out = skill.invoke(&RequestEnvelope::new(Request::launch("en-US")));
        assert_eq!(speech(&out), FALLBACK_ERROR_SPEECH);
        assert!(!out.response.ends_session());
    }

    #[test]
    fn test_failing_exception_handler_uses_builtin_apology() {
        // No localization interceptor, so the catch-all has no prompts
        let skill = Skill::builder()
            .add_exception_handler(CatchAllExceptionHandler)
            .build();
        let out = skill.invoke(&RequestEnvelope::new(Request::launch("en-US")));
        assert_eq!(speech(&out), FALLBACK_ERROR_SPEECH);
    }

    #[test]
    fn test_response_interceptors_see_response() {
        let skill = Skill::builder()
            .add_request_handler(Always("remember me"))
            .add_global_response_interceptor(RepeatInterceptor)
            .build();

        let out = skill.invoke(&RequestEnvelope::new(Request::launch("en-US")));
        assert_eq!(
            out.session_attributes.repeat_speech_output.as_deref(),
            Some("remember me")
        );
    }

    #[test]
    fn test_invoke_json_rejects_garbage_gracefully() {
        let skill = Skill::builder().build();
        let out = skill.invoke_json("not json").unwrap();
        let envelope: ResponseEnvelope = serde_json::from_str(&out).unwrap();
        assert_eq!(speech(&envelope), FALLBACK_ERROR_SPEECH);
    }

    #[test]
    fn test_invoke_json_pretty_is_indented() {
        let skill = Skill::builder().add_request_handler(Always("hi")).build();
        let request = r#"{"request": {"type": "LaunchRequest", "locale": "en-US"}}"#;

        let pretty = skill.invoke_json_pretty(request).unwrap();
        assert!(pretty.contains("\n  \"response\""));

        let compact: serde_json::Value =
            serde_json::from_str(&skill.invoke_json(request).unwrap()).unwrap();
        let indented: serde_json::Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(compact, indented);
    }

    #[test]
    fn test_skill_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Skill>();
    }
}
