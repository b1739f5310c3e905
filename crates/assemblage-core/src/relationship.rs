//! # Relationship
//!
//! A typed, directed edge between two entities.
//!
//! A relationship has no identifier of its own: it is identified by
//! `(source id, target id, type)`. Two relationships built over different
//! entity objects are equal as long as those objects share ids.

use crate::duplicate::{CloneContext, Duplicate};
use crate::entity::EntityHandle;
use crate::identity::EntityId;
use crate::types::ConstructionError;
use std::hash::{Hash, Hasher};

/// Structural identity of a relationship.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationshipKey {
    pub source: EntityId,
    pub target: EntityId,
    pub kind: String,
}

/// A directed edge `source -[kind]-> target`.
///
/// Endpoints are shared references: `Clone` copies the edge but keeps
/// pointing at the same entity objects. Use [`Relationship::clone_deep`] for
/// an edge over independent endpoint copies.
#[derive(Debug, Clone)]
pub struct Relationship {
    source: EntityHandle,
    target: EntityHandle,
    kind: String,
}

impl Relationship {
    /// Create a relationship.
    ///
    /// Returns `ConstructionError::BlankType` if `kind` is empty or blank.
    pub fn new(
        source: EntityHandle,
        target: EntityHandle,
        kind: impl Into<String>,
    ) -> Result<Self, ConstructionError> {
        Self::try_from_parts(Some(source), Some(target), kind)
    }

    /// Create a relationship from endpoints that may be missing.
    ///
    /// This is the entry point for integration layers that receive optional
    /// inputs. Either the whole edge is built, or an error is returned.
    pub fn try_from_parts(
        source: Option<EntityHandle>,
        target: Option<EntityHandle>,
        kind: impl Into<String>,
    ) -> Result<Self, ConstructionError> {
        let source = source.ok_or(ConstructionError::MissingSource)?;
        let target = target.ok_or(ConstructionError::MissingTarget)?;
        let kind = kind.into();
        if kind.trim().is_empty() {
            return Err(ConstructionError::BlankType);
        }
        Ok(Self {
            source,
            target,
            kind,
        })
    }

    #[must_use]
    pub fn source(&self) -> &EntityHandle {
        &self.source
    }

    #[must_use]
    pub fn target(&self) -> &EntityHandle {
        &self.target
    }

    /// The relationship's `type` tag.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Structural identity of this relationship.
    #[must_use]
    pub fn key(&self) -> RelationshipKey {
        RelationshipKey {
            source: self.source.id().clone(),
            target: self.target.id().clone(),
            kind: self.kind.clone(),
        }
    }

    /// Whether `id` is the source or the target.
    #[must_use]
    pub fn touches(&self, id: &EntityId) -> bool {
        self.source.id() == id || self.target.id() == id
    }

    /// Edge over identity-preserving copies of both endpoints.
    #[must_use]
    pub fn clone_deep(&self) -> Self {
        self.duplicate(true)
    }
}

impl Duplicate for Relationship {
    fn duplicate_with(&self, ctx: &mut CloneContext) -> Self {
        Self {
            source: ctx.copy_handle(&self.source),
            target: ctx.copy_handle(&self.target),
            kind: self.kind.clone(),
        }
    }
}

impl PartialEq for Relationship {
    fn eq(&self, other: &Self) -> bool {
        self.source.id() == other.source.id()
            && self.target.id() == other.target.id()
            && self.kind == other.kind
    }
}

impl Eq for Relationship {}

impl Hash for Relationship {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.id().hash(state);
        self.target.id().hash(state);
        self.kind.hash(state);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Entity;

    fn handle(name: &str) -> EntityHandle {
        EntityHandle::new(Entity::with_descriptor(name, "element"))
    }

    #[test]
    fn blank_type_rejected() {
        let a = handle("A");
        let b = handle("B");
        assert_eq!(
            Relationship::new(a.clone(), b.clone(), "").err(),
            Some(ConstructionError::BlankType)
        );
        assert_eq!(
            Relationship::new(a, b, " \t").err(),
            Some(ConstructionError::BlankType)
        );
    }

    #[test]
    fn missing_endpoints_rejected() {
        let a = handle("A");
        assert_eq!(
            Relationship::try_from_parts(None, Some(a.clone()), "x").err(),
            Some(ConstructionError::MissingSource)
        );
        assert_eq!(
            Relationship::try_from_parts(Some(a), None, "x").err(),
            Some(ConstructionError::MissingTarget)
        );
        assert_eq!(
            Relationship::try_from_parts(None, None, "").err(),
            Some(ConstructionError::MissingSource)
        );
    }

    #[test]
    fn equality_is_structural() {
        let a = Entity::new();
        let b = Entity::new();
        let a2 = a.duplicate(true);
        let b2 = b.duplicate(true);

        let r1 = Relationship::new(a.into(), b.into(), "x").expect("r1");
        let r2 = Relationship::new(a2.into(), b2.into(), "x").expect("r2");

        assert!(!r1.source().ptr_eq(r2.source()));
        assert_eq!(r1, r2);
        assert_eq!(r1.key(), r2.key());
    }

    #[test]
    fn type_and_direction_matter() {
        let a = handle("A");
        let b = handle("B");
        let ab_x = Relationship::new(a.clone(), b.clone(), "x").expect("ab");
        let ab_y = Relationship::new(a.clone(), b.clone(), "y").expect("ab");
        let ba_x = Relationship::new(b, a, "x").expect("ba");

        assert_ne!(ab_x, ab_y);
        assert_ne!(ab_x, ba_x);
    }

    #[test]
    fn clone_deep_copies_endpoints_keeping_ids() {
        let a = handle("A");
        let b = handle("B");
        let rel = Relationship::new(a.clone(), b.clone(), "hosts").expect("rel");

        let deep = rel.clone_deep();

        assert_eq!(deep, rel);
        assert!(!deep.source().ptr_eq(&a));
        assert!(!deep.target().ptr_eq(&b));
        assert_eq!(deep.source().read().name(), Some("A"));
    }

    #[test]
    fn shallow_clone_shares_endpoints() {
        let rel = Relationship::new(handle("A"), handle("B"), "x").expect("rel");
        let shallow = rel.clone();
        assert!(shallow.source().ptr_eq(rel.source()));
    }

    #[test]
    fn fresh_duplicate_keeps_self_loops() {
        let a = handle("A");
        let rel = Relationship::new(a.clone(), a.clone(), "contains").expect("rel");

        let copy = rel.duplicate(false);

        assert_ne!(copy.source().id(), a.id());
        assert!(copy.source().ptr_eq(copy.target()));
        assert_ne!(copy, rel);
    }

    #[test]
    fn touches_either_end() {
        let a = handle("A");
        let b = handle("B");
        let rel = Relationship::new(a.clone(), b.clone(), "x").expect("rel");
        assert!(rel.touches(a.id()));
        assert!(rel.touches(b.id()));
        assert!(!rel.touches(&EntityId::generate()));
    }
}
