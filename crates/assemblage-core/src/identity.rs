//! # Identity
//!
//! Opaque entity identifiers.
//!
//! An [`EntityId`] names one logical entity lineage. It is either freshly
//! generated (UUID v4) or adopted verbatim from a prior instance; no code
//! path derives an id from an entity's content.

use crate::ModelError;
use std::fmt;
use uuid::Uuid;

/// Opaque, immutable identifier of an entity lineage.
///
/// Equality, ordering and hashing of entities delegate to this value only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(String);

impl EntityId {
    /// Generate a fresh, collision-resistant identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Adopt an existing identifier unchanged.
    #[must_use]
    pub fn adopt(existing: &EntityId) -> Self {
        existing.clone()
    }

    /// The single branch point for every duplication path:
    /// adopt when `preserve_identity`, otherwise generate.
    #[must_use]
    pub fn assign(existing: &EntityId, preserve_identity: bool) -> Self {
        if preserve_identity {
            Self::adopt(existing)
        } else {
            Self::generate()
        }
    }

    /// Accept an identifier coming from outside the model.
    ///
    /// The value is taken as-is (ids are opaque), but an empty or blank
    /// string cannot name a lineage and is rejected.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        if raw.trim().is_empty() {
            return Err(ModelError::Identity(
                "entityId must not be empty or blank".to_string(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
