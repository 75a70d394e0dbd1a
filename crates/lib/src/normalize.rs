//! Message text normalization: address-trigger detection and stripping.
//!
//! In group chats the bot only answers messages that mention it by a trigger word
//! (short form "ez" or long form "ezsolver" by default). Matching is plain
//! case-insensitive substring/prefix matching with no word-boundary checks, so a
//! query such as "ezx+1" is read as trigger "ez" followed by "x+1".

use crate::config::AnswersConfig;

/// Trigger words and the fallback query used by [`normalize`].
#[derive(Debug, Clone)]
pub struct Triggers {
    short: String,
    long: String,
    default_query: String,
}

impl Triggers {
    pub fn new(
        short: impl Into<String>,
        long: impl Into<String>,
        default_query: impl Into<String>,
    ) -> Self {
        Self {
            short: short.into().to_lowercase(),
            long: long.into().to_lowercase(),
            default_query: default_query.into(),
        }
    }

    pub fn from_config(answers: &AnswersConfig) -> Self {
        Self::new(
            answers.short_trigger.trim(),
            answers.long_trigger.trim(),
            answers.default_query.trim(),
        )
    }

    pub fn short(&self) -> &str {
        &self.short
    }

    pub fn long(&self) -> &str {
        &self.long
    }

    pub fn default_query(&self) -> &str {
        &self.default_query
    }
}

impl Default for Triggers {
    fn default() -> Self {
        Self::from_config(&AnswersConfig::default())
    }
}

/// True if either trigger form appears anywhere in the text (case-insensitive).
pub fn is_addressed(text: &str, triggers: &Triggers) -> bool {
    let lower = text.to_lowercase();
    [triggers.long(), triggers.short()]
        .iter()
        .any(|t| !t.is_empty() && lower.contains(t))
}

/// Strip a leading trigger (long form first, then short form) and surrounding whitespace.
/// Falls back to the default query when nothing is left.
pub fn normalize(text: &str, triggers: &Triggers) -> String {
    let trimmed = text.trim();
    let rest = [triggers.long(), triggers.short()]
        .iter()
        .filter(|t| !t.is_empty())
        .find_map(|t| strip_prefix_ignore_case(trimmed, t))
        .unwrap_or(trimmed)
        .trim();
    if rest.is_empty() {
        triggers.default_query().to_string()
    } else {
        rest.to_string()
    }
}

/// True if the normalized text is the help command.
pub fn is_help_command(normalized: &str) -> bool {
    normalized.trim().eq_ignore_ascii_case("help")
}

/// `prefix` must already be lowercase.
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.char_indices();
    for expected in prefix.chars() {
        let (_, c) = chars.next()?;
        if !c.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    let end = chars.next().map(|(i, _)| i).unwrap_or(text.len());
    Some(&text[end..])
}
