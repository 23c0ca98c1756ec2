//! Lookup results and failures.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupHit {
    pub text: String,
    /// Which upstream article or record the text came from.
    pub source_label: String,
}

/// Why a lookup produced no usable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    NoMatch,
    Ambiguous,
    /// A match existed but its text was shorter than the quality threshold.
    QualityReject { length: usize, min_length: usize },
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch => write!(f, "no match"),
            Self::Ambiguous => write!(f, "ambiguous"),
            Self::QualityReject { length, min_length } => {
                write!(f, "content too short ({length} < {min_length})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(LookupHit),
    NotFound(NotFoundReason),
}

impl LookupOutcome {
    #[must_use]
    pub fn found(text: impl Into<String>, source_label: impl Into<String>) -> Self {
        Self::Found(LookupHit {
            text: text.into(),
            source_label: source_label.into(),
        })
    }

    /// Apply the minimum content length, turning short hits into rejects.
    #[must_use]
    pub fn with_quality_gate(self, min_length: usize) -> Self {
        match self {
            Self::Found(hit) => {
                let length = hit.text.chars().count();
                if length < min_length {
                    Self::NotFound(NotFoundReason::QualityReject { length, min_length })
                } else {
                    Self::Found(hit)
                }
            }
            not_found @ Self::NotFound(_) => not_found,
        }
    }
}

/// Failures worth retrying.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("Transient upstream failure: {0}")]
    Transient(String),

    #[error("Lookup timed out after {0:?}")]
    Timeout(Duration),
}
