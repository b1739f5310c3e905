//! # Entity
//!
//! Identity-bearing record: descriptive metadata, three guarded value
//! containers and an open passthrough member bag.
//!
//! Two entities are equal iff their ids match, whatever their content.
//! Containers only grow through guarded inserts: adding an existing key
//! returns `false` and leaves the stored value untouched, so updating a key
//! is an explicit remove-then-add.

use crate::duplicate::{CloneContext, Duplicate};
use crate::identity::EntityId;
use crate::primitives::IDENTITY_KEY;
use crate::types::{MemberMap, ModelError, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// =============================================================================
// ENTITY
// =============================================================================

/// A node of the model.
#[derive(Debug)]
pub struct Entity {
    pub(crate) entity_id: EntityId,
    pub(crate) name: Option<String>,
    pub(crate) kind: Option<String>,
    pub(crate) attributes: BTreeMap<String, Value>,
    pub(crate) measurements: BTreeMap<String, Option<f64>>,
    pub(crate) events: BTreeMap<String, Value>,
    pub(crate) members: MemberMap,
}

impl Entity {
    /// Create an empty entity with a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self::restore(EntityId::generate())
    }

    /// Create an entity with a fresh identity and descriptive fields.
    #[must_use]
    pub fn with_descriptor(name: impl Into<String>, kind: impl Into<String>) -> Self {
        let mut entity = Self::new();
        entity.name = Some(name.into());
        entity.kind = Some(kind.into());
        entity
    }

    /// Empty entity carrying an id that was already assigned elsewhere.
    pub(crate) fn restore(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            name: None,
            kind: None,
            attributes: BTreeMap::new(),
            measurements: BTreeMap::new(),
            events: BTreeMap::new(),
            members: MemberMap::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Descriptors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The entity's `type` tag.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn set_kind(&mut self, kind: Option<String>) {
        self.kind = kind;
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    /// Insert an attribute if `key` is absent.
    ///
    /// The value is owned by the entity from here on; the caller keeps no
    /// handle into it.
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        guarded_insert(&mut self.attributes, key.into(), value.into())
    }

    /// Insert a snapshot of an arbitrary serializable value if `key` is absent.
    ///
    /// The value is serialized at insertion time, so later changes to the
    /// caller's object never reach the stored attribute.
    pub fn add_attribute_from<T>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<bool, ModelError>
    where
        T: Serialize + ?Sized,
    {
        let key = key.into();
        if self.attributes.contains_key(&key) {
            return Ok(false);
        }
        let snapshot = crate::export::snapshot(value)?;
        Ok(guarded_insert(&mut self.attributes, key, snapshot))
    }

    pub fn remove_attribute(&mut self, key: &str) -> bool {
        self.attributes.remove(key).is_some()
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    // -------------------------------------------------------------------------
    // Measurements
    // -------------------------------------------------------------------------

    /// Insert a measurement if `key` is absent.
    ///
    /// `None` records "measured, no value". Non-finite numbers are refused
    /// because the export format cannot carry them.
    pub fn add_measurement(&mut self, key: impl Into<String>, value: Option<f64>) -> bool {
        let key = key.into();
        if value.is_some_and(|v| !v.is_finite()) {
            tracing::warn!(entity = %self.entity_id, key = %key, "rejected non-finite measurement");
            return false;
        }
        guarded_insert(&mut self.measurements, key, value)
    }

    pub fn remove_measurement(&mut self, key: &str) -> bool {
        self.measurements.remove(key).is_some()
    }

    /// Look up a measurement.
    ///
    /// `None` means the key is absent; `Some(None)` means it is present
    /// without a numeric value.
    #[must_use]
    pub fn measurement(&self, key: &str) -> Option<Option<f64>> {
        self.measurements.get(key).copied()
    }

    #[must_use]
    pub fn measurements(&self) -> &BTreeMap<String, Option<f64>> {
        &self.measurements
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Insert an event if `key` is absent.
    pub fn add_event(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        guarded_insert(&mut self.events, key.into(), value.into())
    }

    pub fn remove_event(&mut self, key: &str) -> bool {
        self.events.remove(key).is_some()
    }

    #[must_use]
    pub fn event(&self, key: &str) -> Option<&Value> {
        self.events.get(key)
    }

    #[must_use]
    pub fn events(&self) -> &BTreeMap<String, Value> {
        &self.events
    }

    // -------------------------------------------------------------------------
    // Passthrough members
    // -------------------------------------------------------------------------

    /// Write a passthrough member, returning the previous value.
    ///
    /// Members are an open bag and may be overwritten, but the identity key
    /// can never be written through this path.
    pub fn insert_member(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, ModelError> {
        let key = key.into();
        if key == IDENTITY_KEY {
            return Err(ModelError::Identity(format!(
                "`{IDENTITY_KEY}` cannot be stored as a passthrough member"
            )));
        }
        Ok(self.members.insert(key, value.into()))
    }

    pub fn remove_member(&mut self, key: &str) -> Option<Value> {
        self.members.remove(key)
    }

    #[must_use]
    pub fn member(&self, key: &str) -> Option<&Value> {
        self.members.get(key)
    }

    #[must_use]
    pub fn members(&self) -> &MemberMap {
        &self.members
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl Duplicate for Entity {
    fn duplicate_with(&self, ctx: &mut CloneContext) -> Self {
        Self {
            entity_id: ctx.remap(&self.entity_id),
            name: self.name.clone(),
            kind: self.kind.clone(),
            attributes: self.attributes.clone(),
            measurements: self.measurements.clone(),
            events: self.events.clone(),
            members: self.members.clone(),
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.entity_id == other.entity_id
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity_id.hash(state);
    }
}

fn guarded_insert<V>(map: &mut BTreeMap<String, V>, key: String, value: V) -> bool {
    match map.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(value);
            true
        }
        Entry::Occupied(_) => false,
    }
}

// =============================================================================
// ENTITY HANDLE
// =============================================================================

/// Shared reference to an entity, as held by relationships.
///
/// Cloning a handle clones the reference, not the entity: every clone sees
/// the same object. Use [`Duplicate`] on the entity to get an independent
/// copy. The id is cached next to the lock because it never changes.
#[derive(Debug, Clone)]
pub struct EntityHandle {
    id: EntityId,
    inner: Arc<RwLock<Entity>>,
}

impl EntityHandle {
    /// Wrap an entity into a new shared handle.
    #[must_use]
    pub fn new(entity: Entity) -> Self {
        Self {
            id: entity.entity_id.clone(),
            inner: Arc::new(RwLock::new(entity)),
        }
    }

    #[must_use]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Read access to the entity.
    pub fn read(&self) -> RwLockReadGuard<'_, Entity> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the entity.
    pub fn write(&self) -> RwLockWriteGuard<'_, Entity> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles point at the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &EntityHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Independent, identity-preserving copy of the current entity state.
    #[must_use]
    pub fn snapshot(&self) -> Entity {
        self.read().duplicate(true)
    }
}

impl From<Entity> for EntityHandle {
    fn from(entity: Entity) -> Self {
        Self::new(entity)
    }
}

impl PartialEq for EntityHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityHandle {}

impl Hash for EntityHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// =============================================================================
// TESTS
// =============================================================================
