//! # Assembly
//!
//! An entity that also owns a set of relationships.
//!
//! The member entities of an assembly are never stored. They are derived on
//! every call from the relationship set (the id-deduplicated union of all
//! sources and targets, in first-seen order), so there is no second list
//! that could drift out of sync. An assembly grows only through
//! [`Assembly::add_relationship`], which is idempotent.
//!
//! An assembly never counts itself as one of its members: an assembly with
//! no relationships has no entities.

use crate::duplicate::{CloneContext, Duplicate};
use crate::entity::{Entity, EntityHandle};
use crate::identity::EntityId;
use crate::relationship::{Relationship, RelationshipKey};
use crate::types::Direction;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

/// A coherent sub-graph handled as one unit.
#[derive(Debug)]
pub struct Assembly {
    entity: Entity,
    relationships: Vec<Relationship>,
    /// Structural keys of `relationships`, for duplicate detection.
    keys: BTreeSet<RelationshipKey>,
}

impl Assembly {
    /// Create an empty assembly with a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self::from_entity(Entity::new())
    }

    /// Create an empty assembly whose own fields come from `entity`.
    ///
    /// The entity is duplicated; with `preserve_identity` the assembly
    /// carries the same id as `entity`.
    #[must_use]
    pub fn wrap(entity: &Entity, preserve_identity: bool) -> Self {
        Self::from_entity(entity.duplicate(preserve_identity))
    }

    pub(crate) fn from_entity(entity: Entity) -> Self {
        Self {
            entity,
            relationships: Vec::new(),
            keys: BTreeSet::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Own entity fields
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn entity_id(&self) -> &EntityId {
        self.entity.entity_id()
    }

    /// The assembly's own entity fields.
    #[must_use]
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Mutable access to the assembly's own entity fields.
    pub fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Add a relationship unless a structurally equal one is present.
    ///
    /// Returns `true` if inserted. On `false` the assembly is unchanged.
    pub fn add_relationship(&mut self, relationship: Relationship) -> bool {
        if !self.keys.insert(relationship.key()) {
            tracing::trace!(
                assembly = %self.entity_id(),
                source = %relationship.source().id(),
                target = %relationship.target().id(),
                kind = relationship.kind(),
                "relationship already present"
            );
            return false;
        }
        tracing::debug!(
            assembly = %self.entity_id(),
            source = %relationship.source().id(),
            target = %relationship.target().id(),
            kind = relationship.kind(),
            "relationship added"
        );
        self.relationships.push(relationship);
        true
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Relationships in insertion order.
    #[must_use]
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Whether a structurally equal relationship is present.
    #[must_use]
    pub fn contains_relationship(&self, relationship: &Relationship) -> bool {
        self.keys.contains(&relationship.key())
    }

    /// First endpoint whose id is `id`.
    #[must_use]
    pub fn get_entity(&self, id: &EntityId) -> Option<EntityHandle> {
        self.endpoints().find(|handle| handle.id() == id).cloned()
    }

    /// Distinct endpoints, optionally restricted to `filter`.
    ///
    /// Ids in `filter` that are not members are ignored.
    #[must_use]
    pub fn get_entities(&self, filter: Option<&BTreeSet<EntityId>>) -> Vec<EntityHandle> {
        let mut seen = BTreeSet::new();
        self.endpoints()
            .filter(|handle| filter.is_none_or(|ids| ids.contains(handle.id())))
            .filter(|handle| seen.insert(handle.id()))
            .cloned()
            .collect()
    }

    /// Ids of all member entities, in first-seen order.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.get_entities(None)
            .into_iter()
            .map(|handle| handle.id().clone())
            .collect()
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.endpoints()
            .map(EntityHandle::id)
            .collect::<BTreeSet<_>>()
            .len()
    }

    #[must_use]
    pub fn contains_entity(&self, id: &EntityId) -> bool {
        self.endpoints().any(|handle| handle.id() == id)
    }

    /// Relationships with `id` at either end.
    #[must_use]
    pub fn relationships_of(&self, id: &EntityId) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|relationship| relationship.touches(id))
            .collect()
    }

    /// Entities one `kind` hop away from `id`.
    ///
    /// `Outgoing` yields targets of relationships whose source is `id`;
    /// `Incoming` yields sources of relationships whose target is `id`.
    #[must_use]
    pub fn relatives(&self, id: &EntityId, kind: &str, direction: Direction) -> Vec<EntityHandle> {
        let mut seen = BTreeSet::new();
        self.relationships
            .iter()
            .filter(|relationship| relationship.kind() == kind)
            .filter_map(|relationship| match direction {
                Direction::Outgoing if relationship.source().id() == id => {
                    Some(relationship.target())
                }
                Direction::Incoming if relationship.target().id() == id => {
                    Some(relationship.source())
                }
                _ => None,
            })
            .filter(|handle| seen.insert(handle.id()))
            .cloned()
            .collect()
    }

    /// Identity-preserving deep clone.
    ///
    /// The clone shares no object with `self`: every reachable entity has
    /// the same id and equal content, but is a distinct object.
    #[must_use]
    pub fn clone_deep(&self) -> Self {
        self.duplicate(true)
    }

    fn endpoints(&self) -> impl Iterator<Item = &EntityHandle> {
        self.relationships
            .iter()
            .flat_map(|relationship| [relationship.source(), relationship.target()])
    }
}

impl Default for Assembly {
    fn default() -> Self {
        Self::new()
    }
}

impl Duplicate for Assembly {
    fn duplicate_with(&self, ctx: &mut CloneContext) -> Self {
        let mut duplicate = Self::from_entity(self.entity.duplicate_with(ctx));
        for relationship in &self.relationships {
            duplicate.add_relationship(relationship.duplicate_with(ctx));
        }
        tracing::debug!(
            source = %self.entity_id(),
            duplicate = %duplicate.entity_id(),
            preserve_identity = ctx.preserves_identity(),
            relationships = duplicate.relationship_count(),
            entities = ctx.copied_count(),
            "assembly duplicated"
        );
        duplicate
    }
}

impl AsRef<Entity> for Assembly {
    fn as_ref(&self) -> &Entity {
        &self.entity
    }
}

impl PartialEq for Assembly {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity
    }
}

impl Eq for Assembly {}

impl Hash for Assembly {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity.hash(state);
    }
}

// =============================================================================
// TESTS
// =============================================================================
