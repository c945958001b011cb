//! Outbound response envelope and SSML helpers

use crate::attributes::SessionAttributes;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Opening tag of the speech markup wrapper
pub const SPEAK_OPEN: &str = "<speak>";

/// Closing tag of the speech markup wrapper
pub const SPEAK_CLOSE: &str = "</speak>";

/// Wrap plain speech in the markup wrapper
pub fn wrap_ssml(text: &str) -> String {
    format!("{}{}{}", SPEAK_OPEN, text, SPEAK_CLOSE)
}

/// Remove every wrapper tag, leaving the inner markup untouched
pub fn strip_ssml(ssml: &str) -> String {
    ssml.replace(SPEAK_OPEN, "").replace(SPEAK_CLOSE, "")
}

/// Escape characters that would break the markup when a user-supplied value
/// is formatted into a template
pub fn escape_ssml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutputSpeech {
    #[serde(rename = "SSML")]
    Ssml { ssml: String },
    #[serde(rename = "PlainText")]
    PlainText { text: String },
}

impl OutputSpeech {
    /// Speech content without the markup wrapper
    pub fn plain_text(&self) -> String {
        match self {
            OutputSpeech::Ssml { ssml } => strip_ssml(ssml),
            OutputSpeech::PlainText { text } => text.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_end_session: Option<bool>,
}

impl Response {
    /// Primary speech without the markup wrapper
    pub fn speech_text(&self) -> Option<String> {
        self.output_speech.as_ref().map(OutputSpeech::plain_text)
    }

    /// Reprompt speech without the markup wrapper
    pub fn reprompt_text(&self) -> Option<String> {
        self.reprompt
            .as_ref()
            .map(|r| r.output_speech.plain_text())
    }

    pub fn ends_session(&self) -> bool {
        self.should_end_session.unwrap_or(false)
    }

    /// True for the bare response returned when a session ends
    pub fn is_empty(&self) -> bool {
        self.output_speech.is_none() && self.reprompt.is_none() && self.should_end_session.is_none()
    }
}

/// Builder for handler responses
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the primary speech
    pub fn speak(mut self, speech: impl AsRef<str>) -> Self {
        self.response.output_speech = Some(OutputSpeech::Ssml {
            ssml: wrap_ssml(speech.as_ref()),
        });
        self
    }

    /// Set the reprompt and keep the session open for the answer
    pub fn ask(mut self, reprompt: impl AsRef<str>) -> Self {
        self.response.reprompt = Some(Reprompt {
            output_speech: OutputSpeech::Ssml {
                ssml: wrap_ssml(reprompt.as_ref()),
            },
        });
        self.response.should_end_session = Some(false);
        self
    }

    pub fn set_should_end_session(mut self, end: bool) -> Self {
        self.response.should_end_session = Some(end);
        self
    }

    pub fn build(self) -> Response {
        self.response
    }
}

/// The complete outbound document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub version: String,
    #[serde(default, skip_serializing_if = "SessionAttributes::is_empty")]
    pub session_attributes: SessionAttributes,
    pub response: Response,
}

impl ResponseEnvelope {
    pub fn new(response: Response, session_attributes: SessionAttributes) -> Self {
        Self {
            version: super::ENVELOPE_VERSION.to_string(),
            session_attributes,
            response,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
