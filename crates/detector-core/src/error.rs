//! Error types for core domain parsing.

use thiserror::Error;

/// Errors raised when decoding domain enums from stored or wire strings.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// A scenario tag outside the closed enum.
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    /// A verdict tag outside the closed enum.
    #[error("unknown verdict: {0}")]
    UnknownVerdict(String),
}
