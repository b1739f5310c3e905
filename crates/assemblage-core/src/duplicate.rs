//! # Clone Engine
//!
//! One duplication primitive shared by [`Entity`](crate::Entity),
//! [`Relationship`](crate::Relationship) and [`Assembly`](crate::Assembly).
//!
//! Every duplication runs inside a [`CloneContext`] that carries the
//! preserve-identity flag and a memo of the entities already copied during
//! this pass. The memo keeps the copied graph shaped like the source: an
//! entity referenced by several relationships is copied once and the copy is
//! shared by all of them, whether its identity is preserved or regenerated.
//! Ids are remapped through a second memo, so an id reached both as an
//! assembly's own entity and as an endpoint gets one new id per pass.

use crate::entity::EntityHandle;
use crate::identity::EntityId;
use std::collections::BTreeMap;

/// State for a single duplication pass.
#[derive(Debug)]
pub struct CloneContext {
    preserve_identity: bool,
    ids: BTreeMap<EntityId, EntityId>,
    copies: BTreeMap<EntityId, EntityHandle>,
}

impl CloneContext {
    /// Start a duplication pass.
    #[must_use]
    pub fn new(preserve_identity: bool) -> Self {
        Self {
            preserve_identity,
            ids: BTreeMap::new(),
            copies: BTreeMap::new(),
        }
    }

    /// Whether this pass keeps entity ids.
    #[must_use]
    pub fn preserves_identity(&self) -> bool {
        self.preserve_identity
    }

    /// Identity for the copy of an entity whose id is `existing`.
    ///
    /// Within one pass the same `existing` id always maps to the same
    /// result.
    pub fn remap(&mut self, existing: &EntityId) -> EntityId {
        if self.preserve_identity {
            return EntityId::adopt(existing);
        }
        self.ids
            .entry(existing.clone())
            .or_insert_with(|| EntityId::assign(existing, false))
            .clone()
    }

    /// Copy the entity behind `handle` into a new, unshared handle.
    ///
    /// Handles are memoized by source id, so two references to the same
    /// lineage resolve to the same copy within one pass.
    pub fn copy_handle(&mut self, handle: &EntityHandle) -> EntityHandle {
        if let Some(copy) = self.copies.get(handle.id()) {
            return copy.clone();
        }
        let copy = EntityHandle::new(handle.read().duplicate_with(self));
        tracing::trace!(
            source = %handle.id(),
            copy = %copy.id(),
            "copied relationship endpoint"
        );
        self.copies.insert(handle.id().clone(), copy.clone());
        copy
    }

    /// Number of distinct entities copied so far in this pass.
    #[must_use]
    pub fn copied_count(&self) -> usize {
        self.copies.len()
    }
}

/// Identity-aware duplication.
///
/// `duplicate(true)` is a clone (same id, distinct object);
/// `duplicate(false)` is a copy (fresh id). Either way nothing mutable is
/// shared with the original afterwards.
pub trait Duplicate: Sized {
    /// Duplicate within an existing pass.
    fn duplicate_with(&self, ctx: &mut CloneContext) -> Self;

    /// Duplicate in a fresh pass.
    fn duplicate(&self, preserve_identity: bool) -> Self {
        self.duplicate_with(&mut CloneContext::new(preserve_identity))
    }
}
