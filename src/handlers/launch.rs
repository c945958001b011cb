use super::{is_request_type, stored_user_name, HandlerInput, RequestHandler};
use crate::envelope::{escape_ssml, RequestType};
use crate::i18n::PromptKey;
use crate::{Response, Result};
use tracing::debug;

/// Skill opened by its invocation name alone
///
/// Returning users are greeted by name; everyone else gets the first-time
/// introduction.
pub struct LaunchRequestHandler;

impl RequestHandler for LaunchRequestHandler {
    fn can_handle(&self, input: &HandlerInput<'_>) -> bool {
        is_request_type(input, RequestType::LaunchRequest)
    }

    fn handle(&self, input: &mut HandlerInput<'_>) -> Result<Response> {
        let prompts = input.prompts()?;

        let (speech, reprompt) = match stored_user_name(input) {
            Some(name) => {
                debug!("Returning user '{}'", name);
                (
                    prompts.render(PromptKey::RepeatUserGreeting, &escape_ssml(&name))?,
                    prompts.pick(PromptKey::RepeatUserGreetingReprompt)?,
                )
            }
            None => {
                let skill_name = prompts.pick(PromptKey::SkillName)?;
                (
                    prompts.render(PromptKey::FirstTimeUser, skill_name)?,
                    prompts.pick(PromptKey::FirstTimeUserReprompt)?,
                )
            }
        };

        Ok(input.response_builder().speak(speech).ask(reprompt).build())
    }
}
