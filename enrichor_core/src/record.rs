//! Records and per-record outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a checked record was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Found,
    NotFound,
    Skipped,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found => write!(f, "found"),
            Self::NotFound => write!(f, "not_found"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Outcome of processing one record during a run.
///
/// `Deferred` is a transient failure that exhausted its retries: it counts as
/// not found for the run but leaves the record unchecked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Found,
    NotFound,
    Skipped,
    Deferred,
}

impl From<SourceKind> for Outcome {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Found => Self::Found,
            SourceKind::NotFound => Self::NotFound,
            SourceKind::Skipped => Self::Skipped,
        }
    }
}

/// One entity to be enriched.
///
/// The identifier is the key of the record in the store file, so it is not
/// serialized with the fields. Fields this crate does not know about are kept
/// in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(skip)]
    pub id: String,

    #[serde(alias = "display_name")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enriched_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,

    #[serde(default)]
    pub checked: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_kind: Option<SourceKind>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    /// A fresh, unchecked record.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enriched_text: None,
            source_label: None,
            checked: false,
            checked_at: None,
            source_kind: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn mark_found(&mut self, text: String, source_label: String, at: DateTime<Utc>) {
        self.enriched_text = Some(text);
        self.source_label = Some(source_label);
        self.mark(SourceKind::Found, at);
    }

    pub fn mark_not_found(&mut self, at: DateTime<Utc>) {
        self.mark(SourceKind::NotFound, at);
    }

    pub fn mark_skipped(&mut self, at: DateTime<Utc>) {
        self.mark(SourceKind::Skipped, at);
    }

    fn mark(&mut self, kind: SourceKind, at: DateTime<Utc>) {
        self.source_kind = Some(kind);
        self.checked = true;
        self.checked_at = Some(at);
    }

    /// The outcome a checked record already carries.
    ///
    /// Older stores may mark records checked without a `source_kind`; those
    /// count as found when they hold enrichment text.
    #[must_use]
    pub fn recorded_outcome(&self) -> Option<Outcome> {
        if !self.checked {
            return None;
        }
        Some(self.source_kind.map_or_else(
            || {
                if self.enriched_text.is_some() {
                    Outcome::Found
                } else {
                    Outcome::NotFound
                }
            },
            Outcome::from,
        ))
    }
}
