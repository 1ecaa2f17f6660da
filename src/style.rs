use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Casing style enforced on the description segment of a branch name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DescriptionStyle {
    #[default]
    #[serde(rename = "kebab-case")]
    KebabCase,
    #[serde(rename = "snake_case")]
    SnakeCase,
    #[serde(rename = "PascalCase")]
    PascalCase,
    #[serde(rename = "camelCase")]
    CamelCase,
}

impl DescriptionStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptionStyle::KebabCase => "kebab-case",
            DescriptionStyle::SnakeCase => "snake_case",
            DescriptionStyle::PascalCase => "PascalCase",
            DescriptionStyle::CamelCase => "camelCase",
        }
    }

    fn regex(&self) -> &'static Regex {
        static KEBAB: OnceLock<Regex> = OnceLock::new();
        static SNAKE: OnceLock<Regex> = OnceLock::new();
        static PASCAL: OnceLock<Regex> = OnceLock::new();
        static CAMEL: OnceLock<Regex> = OnceLock::new();

        let (cell, pattern) = match self {
            DescriptionStyle::KebabCase => (&KEBAB, r"^[a-z0-9]+(-[a-z0-9]+)*$"),
            DescriptionStyle::SnakeCase => (&SNAKE, r"^[a-z0-9]+(_[a-z0-9]+)*$"),
            DescriptionStyle::PascalCase => (&PASCAL, r"^[A-Z][A-Za-z0-9]*$"),
            DescriptionStyle::CamelCase => (&CAMEL, r"^[a-z][A-Za-z0-9]*$"),
        };
        cell.get_or_init(|| Regex::new(pattern).expect("style pattern is valid"))
    }
}

impl fmt::Display for DescriptionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DescriptionStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kebab-case" => Ok(DescriptionStyle::KebabCase),
            "snake_case" => Ok(DescriptionStyle::SnakeCase),
            "PascalCase" => Ok(DescriptionStyle::PascalCase),
            "camelCase" => Ok(DescriptionStyle::CamelCase),
            _ => Err(format!("unknown description style: '{}'", s)),
        }
    }
}

/// Check whether `value` already satisfies `style`.
pub fn is_description_style_valid(value: &str, style: DescriptionStyle) -> bool {
    style.regex().is_match(value)
}

/// Break free-form text into words on separators and case boundaries.
///
/// `"fixLogin_bug"` and `"fix-login bug"` both yield `["fix", "Login", "bug"]`-style
/// tokens; anything that isn't ASCII alphanumeric is dropped from each word.
pub fn split_into_words(raw: &str) -> Vec<String> {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    static LOWER_UPPER: OnceLock<Regex> = OnceLock::new();
    static ACRONYM: OnceLock<Regex> = OnceLock::new();

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[_-]+").expect("valid"));
    let lower_upper = LOWER_UPPER.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid"));
    let acronym = ACRONYM.get_or_init(|| Regex::new(r"([A-Z])([A-Z][a-z])").expect("valid"));

    let spaced = separators.replace_all(trimmed, " ");
    let spaced = lower_upper.replace_all(&spaced, "$1 $2");
    let spaced = acronym.replace_all(&spaced, "$1 $2");

    spaced
        .split_whitespace()
        .map(|word| word.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect()
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Rewrite `raw` into `style`. Already-valid input is returned trimmed but otherwise untouched.
pub fn apply_description_style(raw: &str, style: DescriptionStyle) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if is_description_style_valid(trimmed, style) {
        return trimmed.to_string();
    }

    let words = split_into_words(trimmed);
    if words.is_empty() {
        return String::new();
    }

    match style {
        DescriptionStyle::KebabCase => words
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("-"),
        DescriptionStyle::SnakeCase => words
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("_"),
        DescriptionStyle::PascalCase => words.iter().map(|w| capitalize(w)).collect(),
        DescriptionStyle::CamelCase => words
            .iter()
            .enumerate()
            .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
            .collect(),
    }
}
