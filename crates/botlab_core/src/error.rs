//! Error types for the player core

use std::fmt;

/// Failure reported by an injected spell-cast predicate
///
/// The session treats any error as "not allowed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateError {
    /// The predicate's backing state is not available yet
    Unavailable,
    /// The predicate failed with a message
    Failed(String),
}

impl fmt::Display for PredicateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateError::Unavailable => write!(f, "Spell predicate state unavailable"),
            PredicateError::Failed(msg) => write!(f, "Spell predicate failed: {}", msg),
        }
    }
}

impl std::error::Error for PredicateError {}
