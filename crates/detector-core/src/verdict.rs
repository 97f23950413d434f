//! Analysis verdicts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

/// The four possible outcomes of an analysis. Closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// No generation or manipulation detected.
    Real,
    /// The image was produced by a generative model.
    AiGenerated,
    /// The image was altered after capture (editing, face swap, screenshot).
    Manipulated,
    /// The detectors disagree; manual review recommended.
    Inconclusive,
}

impl Verdict {
    /// Stable string form used in the database and wire payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::AiGenerated => "ai_generated",
            Self::Manipulated => "manipulated",
            Self::Inconclusive => "inconclusive",
        }
    }
}

impl FromStr for Verdict {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "real" => Ok(Self::Real),
            "ai_generated" => Ok(Self::AiGenerated),
            "manipulated" => Ok(Self::Manipulated),
            "inconclusive" => Ok(Self::Inconclusive),
            other => Err(ScenarioError::UnknownVerdict(other.to_string())),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verdict together with its confidence and a short explanation.
///
/// Confidence is always in `[0, 1]`. The reason is deterministic for a given
/// signal bundle so repeated fusions of the same input are byte-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictCall {
    pub verdict: Verdict,
    pub confidence: f64,
    pub reason: String,
}

impl VerdictCall {
    pub fn new(verdict: Verdict, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            verdict,
            confidence,
            reason: reason.into(),
        }
    }
}
