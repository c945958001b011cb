//! Localized prompts
//!
//! Each supported locale ships a JSON table mapping a symbolic key to one or
//! more candidate phrasings. A handler asks for a key and gets one candidate
//! picked at random so repeated visits do not sound scripted.
//!
//! - **loader**: resolves a locale to a table with base-language fallback
//! - **prompts**: the table itself, the key set, and template rendering

pub mod loader;
pub mod prompts;

pub use loader::LanguageLoader;
pub use prompts::{format_template, PromptKey, PromptTable};
