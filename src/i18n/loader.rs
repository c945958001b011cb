use super::PromptTable;
use crate::{Result, SkillError};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Resolves locale identifiers to prompt tables stored as `<dir>/<locale>.json`
#[derive(Clone, Debug)]
pub struct LanguageLoader {
    dir: PathBuf,
}

impl LanguageLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load the table for `locale`, falling back to its two-letter base language
    ///
    /// Returns the name of the table that was actually loaded alongside it.
    pub fn load(&self, locale: &str) -> Result<(String, PromptTable)> {
        let specific_err = match self.load_file(locale) {
            Ok(table) => return Ok((locale.to_string(), table)),
            Err(e) => e,
        };

        let Some(base) = base_language(locale).filter(|b| *b != locale) else {
            return Err(SkillError::LocaleNotFound(format!(
                "{} ({})",
                locale, specific_err
            )));
        };

        debug!(
            "No prompts for locale '{}' ({}), trying base language '{}'",
            locale, specific_err, base
        );

        match self.load_file(base) {
            Ok(table) => Ok((base.to_string(), table)),
            Err(e) => Err(SkillError::LocaleNotFound(format!(
                "{} (fallback '{}': {})",
                locale, base, e
            ))),
        }
    }

    fn load_file(&self, name: &str) -> Result<PromptTable> {
        if !is_valid_locale_name(name) {
            return Err(SkillError::LocaleNotFound(format!(
                "Invalid locale identifier '{}'",
                name
            )));
        }

        let path = self.dir.join(format!("{}.json", name));
        let content = fs::read_to_string(&path)?;
        let table = PromptTable::from_json(&content)?;

        let missing = table.missing_keys();
        if !missing.is_empty() {
            warn!(
                "Prompt table {} is missing keys: {}",
                path.display(),
                missing
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Ok(table)
    }
}

/// Two-letter language prefix of a locale such as `en-US`
fn base_language(locale: &str) -> Option<&str> {
    locale
        .get(..2)
        .filter(|prefix| prefix.chars().all(|c| c.is_ascii_alphabetic()))
}

fn is_valid_locale_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
