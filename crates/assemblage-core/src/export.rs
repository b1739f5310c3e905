//! # Export Module
//!
//! Structural JSON round trip for entities, relationships and assemblies.
//!
//! ## Cycle Handling
//!
//! Relationships reference entities that may in turn be reached again
//! through other relationships (`A -> B` and `B -> A`). The writer walks the
//! relationships in order with a visited set: the first occurrence of an
//! entity is written inline, every later occurrence is written as
//! `{"$ref": "<entityId>"}`. The reader rebuilds one shared handle per id, so
//! `deserialize(serialize(x)) == x` and endpoints shared in the source stay
//! shared in the result.
//!
//! ## Deep Copy
//!
//! [`snapshot`] and [`deep_copy`] route values through the same serializer,
//! which is how attribute values are detached from caller-owned objects.

use crate::assembly::Assembly;
use crate::entity::{Entity, EntityHandle};
use crate::identity::EntityId;
use crate::primitives::{FORMAT_MARKER, FORMAT_VERSION, IDENTITY_KEY, REFERENCE_KEY};
use crate::relationship::Relationship;
use crate::types::{MemberMap, ModelError, Value};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// OPTIONS
// =============================================================================

/// Output options, loaded from the `[export]` table of
/// [`crate::config::ModelConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportOptions {
    /// Indent JSON output.
    pub pretty: bool,
}

// =============================================================================
// RECORDS
// =============================================================================

/// An entity as written to a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    /// Optional on input so that a missing id surfaces as an identity error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,

    #[serde(default)]
    pub measurements: BTreeMap<String, Option<f64>>,

    #[serde(default)]
    pub events: BTreeMap<String, Value>,

    #[serde(default)]
    pub members: MemberMap,
}

impl From<&Entity> for EntityRecord {
    fn from(entity: &Entity) -> Self {
        Self {
            entity_id: Some(entity.entity_id().to_string()),
            name: entity.name.clone(),
            kind: entity.kind.clone(),
            attributes: entity.attributes.clone(),
            measurements: entity.measurements.clone(),
            events: entity.events.clone(),
            members: entity.members.clone(),
        }
    }
}

impl TryFrom<EntityRecord> for Entity {
    type Error = ModelError;

    fn try_from(record: EntityRecord) -> Result<Self, Self::Error> {
        let raw = record.entity_id.ok_or_else(|| {
            ModelError::Identity(format!("document has no `{IDENTITY_KEY}`"))
        })?;
        if record.members.contains_key(IDENTITY_KEY) {
            return Err(ModelError::Identity(format!(
                "`{IDENTITY_KEY}` cannot appear among passthrough members"
            )));
        }
        let mut entity = Entity::restore(EntityId::parse(&raw)?);
        entity.name = record.name;
        entity.kind = record.kind;
        entity.attributes = record.attributes;
        entity.measurements = record.measurements;
        entity.events = record.events;
        entity.members = record.members;
        Ok(entity)
    }
}

/// A relationship endpoint: inline on first sight, a reference afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EndpointRecord {
    Reference(ReferenceRecord),
    Inline(EntityRecord),
}

impl<'de> Deserialize<'de> for EndpointRecord {
    /// An object carrying `$ref` is a reference, anything else is inline.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let is_reference = value
            .as_object()
            .is_some_and(|map| map.contains_key(REFERENCE_KEY));
        if is_reference {
            ReferenceRecord::deserialize(value)
                .map(Self::Reference)
                .map_err(D::Error::custom)
        } else {
            EntityRecord::deserialize(value)
                .map(Self::Inline)
                .map_err(D::Error::custom)
        }
    }
}

/// Elided endpoint pointing at an entity written earlier in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceRecord {
    #[serde(rename = "$ref")]
    pub reference: String,
}

/// A relationship as written to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub source: EndpointRecord,
    pub target: EndpointRecord,
    #[serde(rename = "type")]
    pub kind: String,
}

/// An assembly document: header, own entity fields, relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyDocument {
    pub format: String,
    pub version: u8,
    pub assembly: EntityRecord,
    #[serde(default)]
    pub relationships: Vec<RelationshipRecord>,
}

impl AssemblyDocument {
    /// Validate the header.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format != FORMAT_MARKER {
            return Err(ModelError::DeserializationError(format!(
                "Unknown document format: {}",
                self.format
            )));
        }
        if self.version != FORMAT_VERSION {
            return Err(ModelError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }
}

// =============================================================================
// GRAPH WRITER / READER
// =============================================================================

/// Visited-set traversal that elides entities already written.
#[derive(Default)]
struct GraphWriter {
    visited: BTreeSet<EntityId>,
}

impl GraphWriter {
    fn endpoint(&mut self, handle: &EntityHandle) -> EndpointRecord {
        if self.visited.insert(handle.id().clone()) {
            EndpointRecord::Inline(EntityRecord::from(&*handle.read()))
        } else {
            EndpointRecord::Reference(ReferenceRecord {
                reference: handle.id().to_string(),
            })
        }
    }

    fn relationship(&mut self, relationship: &Relationship) -> RelationshipRecord {
        RelationshipRecord {
            source: self.endpoint(relationship.source()),
            target: self.endpoint(relationship.target()),
            kind: relationship.kind().to_string(),
        }
    }
}

/// Rebuilds one shared handle per entity id.
#[derive(Default)]
struct GraphReader {
    resolved: BTreeMap<String, EntityHandle>,
}

impl GraphReader {
    fn endpoint(&mut self, record: EndpointRecord) -> Result<EntityHandle, ModelError> {
        match record {
            EndpointRecord::Reference(reference) => self
                .resolved
                .get(&reference.reference)
                .cloned()
                .ok_or_else(|| {
                    ModelError::DeserializationError(format!(
                        "Dangling reference: {}",
                        reference.reference
                    ))
                }),
            EndpointRecord::Inline(record) => {
                let entity = Entity::try_from(record)?;
                if let Some(existing) = self.resolved.get(entity.entity_id().as_str()) {
                    tracing::trace!(entity = %entity.entity_id(), "repeated inline entity, keeping first");
                    return Ok(existing.clone());
                }
                let handle = EntityHandle::new(entity);
                self.resolved.insert(handle.id().to_string(), handle.clone());
                Ok(handle)
            }
        }
    }

    fn relationship(&mut self, record: RelationshipRecord) -> Result<Relationship, ModelError> {
        let source = self.endpoint(record.source)?;
        let target = self.endpoint(record.target)?;
        Ok(Relationship::new(source, target, record.kind)?)
    }
}

impl From<&Relationship> for RelationshipRecord {
    fn from(relationship: &Relationship) -> Self {
        GraphWriter::default().relationship(relationship)
    }
}

impl TryFrom<RelationshipRecord> for Relationship {
    type Error = ModelError;

    fn try_from(record: RelationshipRecord) -> Result<Self, Self::Error> {
        GraphReader::default().relationship(record)
    }
}

impl From<&Assembly> for AssemblyDocument {
    fn from(assembly: &Assembly) -> Self {
        let mut writer = GraphWriter::default();
        Self {
            format: FORMAT_MARKER.to_string(),
            version: FORMAT_VERSION,
            assembly: EntityRecord::from(assembly.entity()),
            relationships: assembly
                .relationships()
                .iter()
                .map(|relationship| writer.relationship(relationship))
                .collect(),
        }
    }
}

impl TryFrom<AssemblyDocument> for Assembly {
    type Error = ModelError;

    fn try_from(document: AssemblyDocument) -> Result<Self, Self::Error> {
        document.validate()?;
        let mut assembly = Assembly::from_entity(Entity::try_from(document.assembly)?);
        let mut reader = GraphReader::default();
        for record in document.relationships {
            assembly.add_relationship(reader.relationship(record)?);
        }
        Ok(assembly)
    }
}

// =============================================================================
// SERDE IMPLEMENTATIONS
// =============================================================================

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EntityRecord::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = EntityRecord::deserialize(deserializer)?;
        Entity::try_from(record).map_err(D::Error::custom)
    }
}

impl Serialize for Relationship {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RelationshipRecord::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Relationship {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = RelationshipRecord::deserialize(deserializer)?;
        Relationship::try_from(record).map_err(D::Error::custom)
    }
}

impl Serialize for Assembly {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        AssemblyDocument::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Assembly {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let document = AssemblyDocument::deserialize(deserializer)?;
        Assembly::try_from(document).map_err(D::Error::custom)
    }
}

// =============================================================================
// EXPORT FUNCTIONS
// =============================================================================

/// Serialize any value into a detached [`Value`] tree.
pub fn snapshot<T: Serialize + ?Sized>(value: &T) -> Result<Value, ModelError> {
    serde_json::to_value(value).map_err(|e| ModelError::SerializationError(e.to_string()))
}

/// Deep copy through a serialize/deserialize round trip.
pub fn deep_copy<T: Serialize + DeserializeOwned>(value: &T) -> Result<T, ModelError> {
    let tree = snapshot(value)?;
    serde_json::from_value(tree).map_err(|e| ModelError::DeserializationError(e.to_string()))
}

pub fn entity_to_value(entity: &Entity) -> Result<Value, ModelError> {
    snapshot(&EntityRecord::from(entity))
}

/// Rebuild an entity, keeping the `entityId` found in the document.
///
/// Returns `ModelError::Identity` when the document carries no usable id.
pub fn entity_from_value(value: Value) -> Result<Entity, ModelError> {
    let record: EntityRecord = serde_json::from_value(value)
        .map_err(|e| ModelError::DeserializationError(e.to_string()))?;
    Entity::try_from(record)
}

pub fn entity_to_json(entity: &Entity) -> Result<String, ModelError> {
    to_json(&EntityRecord::from(entity), ExportOptions::default())
}

pub fn entity_from_json(json: &str) -> Result<Entity, ModelError> {
    entity_from_value(parse(json)?)
}

pub fn relationship_to_value(relationship: &Relationship) -> Result<Value, ModelError> {
    snapshot(&RelationshipRecord::from(relationship))
}

pub fn relationship_from_value(value: Value) -> Result<Relationship, ModelError> {
    let record: RelationshipRecord = serde_json::from_value(value)
        .map_err(|e| ModelError::DeserializationError(e.to_string()))?;
    Relationship::try_from(record)
}

pub fn relationship_to_json(relationship: &Relationship) -> Result<String, ModelError> {
    to_json(&RelationshipRecord::from(relationship), ExportOptions::default())
}

pub fn relationship_from_json(json: &str) -> Result<Relationship, ModelError> {
    relationship_from_value(parse(json)?)
}

pub fn assembly_to_value(assembly: &Assembly) -> Result<Value, ModelError> {
    snapshot(&AssemblyDocument::from(assembly))
}

pub fn assembly_from_value(value: Value) -> Result<Assembly, ModelError> {
    let document: AssemblyDocument = serde_json::from_value(value)
        .map_err(|e| ModelError::DeserializationError(e.to_string()))?;
    Assembly::try_from(document)
}

pub fn assembly_to_json(assembly: &Assembly) -> Result<String, ModelError> {
    assembly_to_json_with(assembly, ExportOptions::default())
}

pub fn assembly_to_json_with(
    assembly: &Assembly,
    options: ExportOptions,
) -> Result<String, ModelError> {
    let document = AssemblyDocument::from(assembly);
    tracing::debug!(
        assembly = %assembly.entity_id(),
        relationships = document.relationships.len(),
        "exporting assembly"
    );
    to_json(&document, options)
}

pub fn assembly_from_json(json: &str) -> Result<Assembly, ModelError> {
    assembly_from_value(parse(json)?)
}

fn to_json<T: Serialize>(value: &T, options: ExportOptions) -> Result<String, ModelError> {
    let result = if options.pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    result.map_err(|e| ModelError::SerializationError(e.to_string()))
}

fn parse(json: &str) -> Result<Value, ModelError> {
    serde_json::from_str(json).map_err(|e| ModelError::DeserializationError(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
