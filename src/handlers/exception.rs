use super::{ExceptionHandler, HandlerInput};
use crate::i18n::PromptKey;
use crate::{Response, Result, SkillError};
use tracing::debug;

/// Handles every failure with the localized apology
///
/// Routing failures land here too: an unmatched intent usually means the
/// interaction model names an intent no handler was registered for. The
/// skill has already logged the failure by the time this runs.
pub struct CatchAllExceptionHandler;

impl ExceptionHandler for CatchAllExceptionHandler {
    fn can_handle(&self, _input: &HandlerInput<'_>, _error: &SkillError) -> bool {
        true
    }

    fn handle(&self, input: &mut HandlerInput<'_>, error: &SkillError) -> Result<Response> {
        debug!("Apologizing for: {}", error);

        let prompts = input.prompts()?;
        let speech = prompts.pick(PromptKey::Error)?;
        let reprompt = prompts.pick(PromptKey::ErrorReprompt)?;
        Ok(input.response_builder().speak(speech).ask(reprompt).build())
    }
}
