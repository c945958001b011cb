use super::{
    is_intent_name, stored_user_name, HandlerInput, RequestHandler, DELETE_NAME_INTENT,
    MY_NAME_IS_INTENT, NEW_NAME_SLOT, UPDATE_NAME_INTENT, USER_NAME_SLOT, WHATS_MY_NAME_INTENT,
};
use crate::envelope::escape_ssml;
use crate::i18n::PromptKey;
use crate::{Response, Result};
use tracing::info;

fn save_user_name(input: &mut HandlerInput<'_>, name: &str) -> Result<()> {
    input.attributes.persistent_attributes_mut()?.user_name = Some(name.to_string());
    input.attributes.save_persistent_attributes()
}

/// "My name is ..."
pub struct MyNameIsIntentHandler;

impl RequestHandler for MyNameIsIntentHandler {
    fn can_handle(&self, input: &HandlerInput<'_>) -> bool {
        is_intent_name(input, MY_NAME_IS_INTENT)
    }

    fn handle(&self, input: &mut HandlerInput<'_>) -> Result<Response> {
        let prompts = input.prompts()?;
        let user_name = input.slot_value(USER_NAME_SLOT)?;

        save_user_name(input, &user_name)?;
        info!("Saved user name");

        let speech = prompts.render(PromptKey::NameSaved, &escape_ssml(&user_name))?;
        let reprompt = prompts.pick(PromptKey::NameSavedReprompt)?;
        Ok(input.response_builder().speak(speech).ask(reprompt).build())
    }
}

/// "What's my name?"
pub struct WhatsMyNameIntentHandler;

impl RequestHandler for WhatsMyNameIntentHandler {
    fn can_handle(&self, input: &HandlerInput<'_>) -> bool {
        is_intent_name(input, WHATS_MY_NAME_INTENT)
    }

    fn handle(&self, input: &mut HandlerInput<'_>) -> Result<Response> {
        let prompts = input.prompts()?;

        let (speech, reprompt) = match stored_user_name(input) {
            Some(name) => (
                prompts.render(PromptKey::TellName, &escape_ssml(&name))?,
                prompts.pick(PromptKey::TellNameReprompt)?,
            ),
            None => (
                prompts.pick(PromptKey::NoName)?.to_string(),
                prompts.pick(PromptKey::NoNameReprompt)?,
            ),
        };

        Ok(input.response_builder().speak(speech).ask(reprompt).build())
    }
}

/// "Change my name to ..."
pub struct UpdateNameIntentHandler;

impl RequestHandler for UpdateNameIntentHandler {
    fn can_handle(&self, input: &HandlerInput<'_>) -> bool {
        is_intent_name(input, UPDATE_NAME_INTENT)
    }

    fn handle(&self, input: &mut HandlerInput<'_>) -> Result<Response> {
        let prompts = input.prompts()?;
        let user_name = input.slot_value(NEW_NAME_SLOT)?;

        save_user_name(input, &user_name)?;
        info!("Updated user name");

        let speech = prompts.render(PromptKey::NameUpdated, &escape_ssml(&user_name))?;
        let reprompt = prompts.pick(PromptKey::NameUpdatedReprompt)?;
        Ok(input.response_builder().speak(speech).ask(reprompt).build())
    }
}

/// "Forget my name"
pub struct DeleteNameIntentHandler;

impl RequestHandler for DeleteNameIntentHandler {
    fn can_handle(&self, input: &HandlerInput<'_>) -> bool {
        is_intent_name(input, DELETE_NAME_INTENT)
    }

    fn handle(&self, input: &mut HandlerInput<'_>) -> Result<Response> {
        let prompts = input.prompts()?;

        input.attributes.delete_persistent_attributes()?;
        info!("Deleted persistent attributes");

        let speech = prompts.pick(PromptKey::NameDeleted)?;
        let reprompt = prompts.pick(PromptKey::NameDeletedReprompt)?;
        Ok(input.response_builder().speak(speech).ask(reprompt).build())
    }
}
