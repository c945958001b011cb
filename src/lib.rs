//! Name Keeper - a voice skill backend that remembers the user's name
//!
//! Requests arrive as platform envelopes, pass through the request
//! interceptors, are routed to the first matching handler, and leave as a
//! response envelope after the response interceptors have run.

pub mod attributes;
pub mod config;
pub mod envelope;
pub mod handlers;
pub mod i18n;
pub mod interceptors;
pub mod persistence;
pub mod skill;
pub mod utils;

pub use config::SkillConfig;
pub use envelope::{RequestEnvelope, Response, ResponseBuilder, ResponseEnvelope};
pub use skill::{standard_skill, Skill, SkillBuilder};

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SkillError {
    #[error("Locale not found: {0}")]
    LocaleNotFound(String),

    #[error("Missing prompt: {0}")]
    MissingPrompt(String),

    #[error("No handler for request: {0}")]
    NoHandler(String),

    #[error("Missing slot value: {0}")]
    MissingSlot(String),

    #[error("Missing identity: {0}")]
    MissingIdentity(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Envelope error: {0}")]
    EnvelopeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Handler panicked: {0}")]
    HandlerPanicked(String),
}

impl From<std::io::Error> for SkillError {
    fn from(e: std::io::Error) -> Self {
        SkillError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for SkillError {
    fn from(e: serde_json::Error) -> Self {
        SkillError::EnvelopeError(e.to_string())
    }
}

impl SkillError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Deployment problems: files or settings are wrong
            SkillError::LocaleNotFound(_) => false,
            SkillError::MissingPrompt(_) => false,
            SkillError::ConfigError(_) => false,
            // The user can simply try again
            SkillError::NoHandler(_) => true,
            SkillError::MissingSlot(_) => true,
            SkillError::MissingIdentity(_) => false,
            SkillError::PersistenceError(_) => true,
            SkillError::EnvelopeError(_) => false,
            SkillError::IOError(_) => true,
            SkillError::HandlerPanicked(_) => true,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            SkillError::LocaleNotFound(_) => {
                "This language is not supported yet.".to_string()
            }
            SkillError::MissingPrompt(_) => {
                "The skill is missing some of its phrases.".to_string()
            }
            SkillError::NoHandler(_) => {
                "I don't know how to help with that yet.".to_string()
            }
            SkillError::MissingSlot(_) => {
                "I didn't catch that name. Please try again.".to_string()
            }
            SkillError::MissingIdentity(_) => {
                "I couldn't tell who is speaking.".to_string()
            }
            SkillError::PersistenceError(_) => {
                "I couldn't reach my memory. Please try again.".to_string()
            }
            SkillError::EnvelopeError(_) => "The request was malformed.".to_string(),
            SkillError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            SkillError::IOError(_) => "File system error occurred.".to_string(),
            SkillError::HandlerPanicked(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SkillError>;
