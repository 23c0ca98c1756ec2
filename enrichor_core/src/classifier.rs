//! Eligibility policy: which records are plausible enrichment candidates.
//!
//! The policy is a pure function of the display name, driven entirely by
//! [`ClassifierConfig`] so it can be tuned per data set without code changes.

use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::name::normalize_name;
use crate::record::Record;

/// Eligibility configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Regexes matched against the normalized name; any match rejects it.
    #[serde(default = "ClassifierConfig::default_patterns")]
    pub eligibility_patterns: Vec<String>,

    /// Words that on their own never identify a person. A name made only of
    /// these words is rejected. Compared case-insensitively.
    #[serde(default = "ClassifierConfig::default_placeholder_words")]
    pub placeholder_words: Vec<String>,

    /// A name whose longest token is shorter than this is rejected.
    #[serde(default = "ClassifierConfig::default_min_token_length")]
    pub min_token_length: usize,

    /// Require at least two tokens (a given name and a family name).
    #[serde(default = "ClassifierConfig::default_require_full_name")]
    pub require_full_name: bool,
}

impl ClassifierConfig {
    fn default_patterns() -> Vec<String> {
        [
            // no letters at all: "???", "123", "--"
            r"^[^\p{L}]*$",
            r"(?i)^(john|jane|richard|baby)\s+doe\b",
            r"(?i)^(unknown|unidentified|unnamed|anonymous|redacted)\b",
            r"(?i)redacted|\[[^\]]*\]",
            // role descriptions: "Victim 3", "Pilot", "Staff #2"
            r"(?i)^(the\s+)?(victim|witness|employee|staff|assistant|pilot|driver|attorney|agent|officer|detective|housekeeper|butler|masseuse|model)(\s*#?\d+)?$",
            // a title and a single word: "Mr. Smith"
            r"(?i)^(mr|mrs|ms|miss|dr|prof|sir|lady|lord)\.?\s+\S+$",
            r"(?i)\b(inc|llc|ltd|corp|corporation|foundation|company|group|trust|bank)\b\.?$",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn default_placeholder_words() -> Vec<String> {
        [
            "unknown",
            "n/a",
            "na",
            "none",
            "null",
            "tbd",
            "various",
            "others",
            "someone",
            "person",
            "individual",
            "female",
            "male",
            "woman",
            "man",
            "girl",
            "boy",
            "friend",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    const fn default_min_token_length() -> usize {
        2
    }

    const fn default_require_full_name() -> bool {
        true
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            eligibility_patterns: Self::default_patterns(),
            placeholder_words: Self::default_placeholder_words(),
            min_token_length: Self::default_min_token_length(),
            require_full_name: Self::default_require_full_name(),
        }
    }
}

/// Why a name was judged ineligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    Pattern(String),
    Placeholder,
    TooShort,
    NotFullName,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty name"),
            Self::Pattern(p) => write!(f, "matches pattern {p}"),
            Self::Placeholder => write!(f, "placeholder name"),
            Self::TooShort => write!(f, "name too short"),
            Self::NotFullName => write!(f, "not a full name"),
        }
    }
}

/// Compiled eligibility policy.
#[derive(Debug, Clone)]
pub struct Classifier {
    patterns: RegexSet,
    placeholder_words: Vec<String>,
    min_token_length: usize,
    require_full_name: bool,
}

impl Classifier {
    /// Compile `config`. Invalid regexes are configuration errors.
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let patterns = RegexSet::new(&config.eligibility_patterns)
            .map_err(|e| Error::config(format!("invalid eligibility pattern: {e}")))?;

        Ok(Self {
            patterns,
            placeholder_words: config
                .placeholder_words
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
            min_token_length: config.min_token_length,
            require_full_name: config.require_full_name,
        })
    }

    #[must_use]
    pub fn is_eligible(&self, record: &Record) -> bool {
        self.rejection(&record.name).is_none()
    }

    /// The first rule that rejects `name`, or `None` if it is eligible.
    #[must_use]
    pub fn rejection(&self, name: &str) -> Option<Rejection> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Some(Rejection::Empty);
        }

        if let Some(idx) = self.patterns.matches(&name).iter().next() {
            return Some(Rejection::Pattern(self.patterns.patterns()[idx].clone()));
        }

        let lowered = name.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter(|t| !t.is_empty())
            .collect();

        if self.placeholder_words.iter().any(|w| *w == lowered)
            || tokens
                .iter()
                .all(|t| self.placeholder_words.iter().any(|w| w == t))
        {
            return Some(Rejection::Placeholder);
        }

        let longest = tokens
            .iter()
            .map(|t| t.chars().filter(|c| c.is_alphabetic()).count())
            .max()
            .unwrap_or(0);
        if longest < self.min_token_length {
            return Some(Rejection::TooShort);
        }

        if self.require_full_name && tokens.len() < 2 {
            return Some(Rejection::NotFullName);
        }

        None
    }
}
