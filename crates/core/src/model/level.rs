use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind} value: {raw}")]
pub struct ParseLevelError {
    kind: &'static str,
    raw: String,
}

/// Difficulty of a subject, topic, or quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `ParseLevelError` for unknown values.
    pub fn parse(raw: &str) -> Result<Self, ParseLevelError> {
        match raw {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseLevelError {
                kind: "difficulty",
                raw: raw.to_string(),
            }),
        }
    }
}

/// Three-step scale shared by subject priority, focus, fatigue and study intensity.
///
/// Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `ParseLevelError` for unknown values.
    pub fn parse(raw: &str) -> Result<Self, ParseLevelError> {
        match raw {
            "low" => Ok(Level::Low),
            "medium" => Ok(Level::Medium),
            "high" => Ok(Level::High),
            _ => Err(ParseLevelError {
                kind: "level",
                raw: raw.to_string(),
            }),
        }
    }
}

/// How deep an AI explanation should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationDepth {
    Easy,
    Medium,
    Advanced,
}

impl ExplanationDepth {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExplanationDepth::Easy => "easy",
            ExplanationDepth::Medium => "medium",
            ExplanationDepth::Advanced => "advanced",
        }
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `ParseLevelError` for unknown values.
    pub fn parse(raw: &str) -> Result<Self, ParseLevelError> {
        match raw {
            "easy" => Ok(ExplanationDepth::Easy),
            "medium" => Ok(ExplanationDepth::Medium),
            "advanced" => Ok(ExplanationDepth::Advanced),
            _ => Err(ParseLevelError {
                kind: "explanation depth",
                raw: raw.to_string(),
            }),
        }
    }
}
