//! # Core Type Definitions
//!
//! Shared value containers and error types for the Assemblage model:
//! - Dynamic payload values (`Value`, `MemberMap`)
//! - Relationship traversal direction (`Direction`)
//! - Error types (`ConstructionError`, `ModelError`)
//!
//! ## Determinism
//!
//! Every keyed container in the model is a `BTreeMap`, so iteration and
//! serialization order never depend on insertion history or hashing.

use std::collections::BTreeMap;
use thiserror::Error;

// =============================================================================
// DYNAMIC VALUES
// =============================================================================

/// Dynamically-typed payload value stored in attributes, events and
/// passthrough members.
///
/// A tagged variant (null, bool, number, string, array, object). Cloning a
/// `Value` copies the whole tree, so stored values never alias caller data.
pub type Value = serde_json::Value;

/// Passthrough member bag copied from an external object.
pub type MemberMap = BTreeMap<String, Value>;

// =============================================================================
// DIRECTION
// =============================================================================

/// Which end of a relationship a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// From the given entity (as source) to its targets.
    Outgoing,
    /// From the given entity (as target) back to its sources.
    Incoming,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Reasons a relationship cannot be constructed.
///
/// Construction is all-or-nothing: when one of these is returned, no
/// relationship value exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// No source entity was supplied.
    #[error("Relationship source is missing")]
    MissingSource,

    /// No target entity was supplied.
    #[error("Relationship target is missing")]
    MissingTarget,

    /// The relationship type is empty or whitespace only.
    #[error("Relationship type must not be empty or blank")]
    BlankType,
}

/// Errors that can occur in the Assemblage model.
///
/// - No silent failures
/// - Lookup misses and duplicate inserts are NOT errors (they return
///   `None`/empty or `false`)
#[derive(Debug, Error)]
pub enum ModelError {
    /// A relationship could not be built.
    #[error("Construction error: {0}")]
    Construction(#[from] ConstructionError),

    /// An object crossing the integration boundary does not carry a usable
    /// identity, or tried to write the identity key.
    #[error("Identity error: {0}")]
    Identity(String),

    /// A value could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A document could not be deserialized.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// A configuration document is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An I/O error occurred while reading configuration.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_error_converts_into_model_error() {
        let err: ModelError = ConstructionError::BlankType.into();
        assert!(matches!(
            err,
            ModelError::Construction(ConstructionError::BlankType)
        ));
    }

    #[test]
    fn error_messages_are_descriptive() {
        assert_eq!(
            ConstructionError::MissingSource.to_string(),
            "Relationship source is missing"
        );
        let err = ModelError::from(ConstructionError::MissingTarget);
        assert_eq!(
            err.to_string(),
            "Construction error: Relationship target is missing"
        );
    }
}
