use crate::{Result, SkillError};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;

/// Symbolic prompt keys used by the handlers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PromptKey {
    SkillName,
    FirstTimeUser,
    FirstTimeUserReprompt,
    RepeatUserGreeting,
    RepeatUserGreetingReprompt,
    NameSaved,
    NameSavedReprompt,
    TellName,
    TellNameReprompt,
    NoName,
    NoNameReprompt,
    NameUpdated,
    NameUpdatedReprompt,
    NameDeleted,
    NameDeletedReprompt,
    Repeat,
    RepeatReprompt,
    NothingToRepeat,
    CancelStopResponse,
    Help,
    HelpReprompt,
    Fallback,
    FallbackReprompt,
    Error,
    ErrorReprompt,
}

impl PromptKey {
    pub const ALL: [PromptKey; 25] = [
        PromptKey::SkillName,
        PromptKey::FirstTimeUser,
        PromptKey::FirstTimeUserReprompt,
        PromptKey::RepeatUserGreeting,
        PromptKey::RepeatUserGreetingReprompt,
        PromptKey::NameSaved,
        PromptKey::NameSavedReprompt,
        PromptKey::TellName,
        PromptKey::TellNameReprompt,
        PromptKey::NoName,
        PromptKey::NoNameReprompt,
        PromptKey::NameUpdated,
        PromptKey::NameUpdatedReprompt,
        PromptKey::NameDeleted,
        PromptKey::NameDeletedReprompt,
        PromptKey::Repeat,
        PromptKey::RepeatReprompt,
        PromptKey::NothingToRepeat,
        PromptKey::CancelStopResponse,
        PromptKey::Help,
        PromptKey::HelpReprompt,
        PromptKey::Fallback,
        PromptKey::FallbackReprompt,
        PromptKey::Error,
        PromptKey::ErrorReprompt,
    ];

    /// Key as written in the language files
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKey::SkillName => "SKILL_NAME",
            PromptKey::FirstTimeUser => "FIRST_TIME_USER",
            PromptKey::FirstTimeUserReprompt => "FIRST_TIME_USER_REPROMPT",
            PromptKey::RepeatUserGreeting => "REPEAT_USER_GREETING",
            PromptKey::RepeatUserGreetingReprompt => "REPEAT_USER_GREETING_REPROMPT",
            PromptKey::NameSaved => "NAME_SAVED",
            PromptKey::NameSavedReprompt => "NAME_SAVED_REPROMPT",
            PromptKey::TellName => "TELL_NAME",
            PromptKey::TellNameReprompt => "TELL_NAME_REPROMPT",
            PromptKey::NoName => "NO_NAME",
            PromptKey::NoNameReprompt => "NO_NAME_REPROMPT",
            PromptKey::NameUpdated => "NAME_UPDATED",
            PromptKey::NameUpdatedReprompt => "NAME_UPDATED_REPROMPT",
            PromptKey::NameDeleted => "NAME_DELETED",
            PromptKey::NameDeletedReprompt => "NAME_DELETED_REPROMPT",
            PromptKey::Repeat => "REPEAT",
            PromptKey::RepeatReprompt => "REPEAT_REPROMPT",
            PromptKey::NothingToRepeat => "NOTHING_TO_REPEAT",
            PromptKey::CancelStopResponse => "CANCEL_STOP_RESPONSE",
            PromptKey::Help => "HELP",
            PromptKey::HelpReprompt => "HELP_REPROMPT",
            PromptKey::Fallback => "FALLBACK",
            PromptKey::FallbackReprompt => "FALLBACK_REPROMPT",
            PromptKey::Error => "ERROR",
            PromptKey::ErrorReprompt => "ERROR_REPROMPT",
        }
    }
}

impl std::fmt::Display for PromptKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A language file entry: a single phrase or a list of alternatives
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    One(String),
    Many(Vec<String>),
}

type RawTable = HashMap<String, RawEntry>;

/// Prompt candidates for one locale, read-only once loaded
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "RawTable")]
pub struct PromptTable {
    entries: HashMap<String, Vec<String>>,
}

impl From<RawTable> for PromptTable {
    fn from(raw: RawTable) -> Self {
        let entries = raw
            .into_iter()
            .map(|(key, entry)| {
                let candidates = match entry {
                    RawEntry::One(s) => vec![s],
                    RawEntry::Many(v) => v,
                };
                (key, candidates)
            })
            .collect();
        Self { entries }
    }
}

impl PromptTable {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| SkillError::ConfigError(format!("Invalid prompt table: {}", e)))
    }

    /// Build a table from `(key, candidates)` pairs
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (PromptKey, &'a [&'a str])>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.as_str().to_string(), v.iter().map(|s| s.to_string()).collect()))
                .collect(),
        }
    }

    pub fn contains(&self, key: PromptKey) -> bool {
        self.entries
            .get(key.as_str())
            .is_some_and(|c| !c.is_empty())
    }

    /// Keys the handlers use that this table does not provide
    pub fn missing_keys(&self) -> Vec<PromptKey> {
        PromptKey::ALL
            .into_iter()
            .filter(|k| !self.contains(*k))
            .collect()
    }

    /// All candidates for `key`
    pub fn candidates(&self, key: PromptKey) -> Result<&[String]> {
        match self.entries.get(key.as_str()) {
            Some(c) if !c.is_empty() => Ok(c),
            _ => Err(SkillError::MissingPrompt(key.as_str().to_string())),
        }
    }

    /// One candidate chosen uniformly at random
    pub fn pick(&self, key: PromptKey) -> Result<&str> {
        self.pick_with(key, &mut rand::thread_rng())
    }

    pub fn pick_with<R: Rng + ?Sized>(&self, key: PromptKey, rng: &mut R) -> Result<&str> {
        self.candidates(key)?
            .choose(rng)
            .map(String::as_str)
            .ok_or_else(|| SkillError::MissingPrompt(key.as_str().to_string()))
    }

    /// One random candidate with its placeholder filled by `value`
    pub fn render(&self, key: PromptKey, value: &str) -> Result<String> {
        Ok(format_template(self.pick(key)?, value))
    }
}

/// Replace every `{}` or `{0}` placeholder in `template` with `value`
pub fn format_template(template: &str, value: &str) -> String {
    let mut out = String::with_capacity(template.len() + value.len());
    let mut rest = template;
    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("{}") {
            out.push_str(value);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{0}") {
            out.push_str(value);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
