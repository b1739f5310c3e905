//! # Ingestor Module
//!
//! Wraps external objects into fresh entities.
//!
//! - Every member of the external object is copied into passthrough storage
//! - The identity key is never copied, so foreign data cannot impersonate an
//!   existing lineage or inherit an id
//! - The new entity always receives a fresh identity

use crate::entity::Entity;
use crate::primitives::{IDENTITY_KEY, NAME_KEY, TYPE_KEY};
use crate::types::{ModelError, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// =============================================================================
// MEMBER SOURCE
// =============================================================================

/// An external object exposing a dynamically-typed member map.
pub trait MemberSource {
    /// Iterate over `(key, value)` members.
    fn members(&self) -> Box<dyn Iterator<Item = (&str, &Value)> + '_>;
}

impl MemberSource for serde_json::Map<String, Value> {
    fn members(&self) -> Box<dyn Iterator<Item = (&str, &Value)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

impl MemberSource for BTreeMap<String, Value> {
    fn members(&self) -> Box<dyn Iterator<Item = (&str, &Value)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

impl<S: std::hash::BuildHasher> MemberSource for HashMap<String, Value, S> {
    fn members(&self) -> Box<dyn Iterator<Item = (&str, &Value)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

// =============================================================================
// INGEST POLICY
// =============================================================================

/// Rules applied while copying external members.
///
/// Loaded from the `[ingest]` table of [`crate::config::ModelConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestPolicy {
    /// Extra member keys that are never copied through.
    /// The identity key is always excluded, listed here or not.
    pub reserved_keys: BTreeSet<String>,

    /// Lift string `name`/`type` members into the entity's descriptive
    /// fields instead of passthrough storage.
    pub lift_descriptors: bool,
}

impl IngestPolicy {
    /// Whether `key` must not be copied into passthrough storage.
    #[must_use]
    pub fn is_reserved(&self, key: &str) -> bool {
        key == IDENTITY_KEY || self.reserved_keys.contains(key)
    }
}

// =============================================================================
// INGESTOR
// =============================================================================

/// The Ingestor turns external objects into entities.
pub struct Ingestor;

impl Ingestor {
    /// Copy every member of `source` into a fresh entity.
    pub fn ingest<S: MemberSource + ?Sized>(source: &S, policy: &IngestPolicy) -> Entity {
        let mut entity = Entity::new();
        for (key, value) in source.members() {
            if key == IDENTITY_KEY {
                tracing::warn!(
                    entity = %entity.entity_id(),
                    "dropped identity member from external object"
                );
                continue;
            }
            if policy.is_reserved(key) {
                tracing::debug!(entity = %entity.entity_id(), key, "skipped reserved member");
                continue;
            }
            if policy.lift_descriptors && Self::lift(&mut entity, key, value) {
                continue;
            }
            entity.members.insert(key.to_string(), value.clone());
        }
        tracing::trace!(
            entity = %entity.entity_id(),
            members = entity.members.len(),
            "ingested external object"
        );
        entity
    }

    /// Serialize `value` and ingest it as an external object.
    ///
    /// Returns `ModelError::Identity` if `value` does not serialize to an
    /// object, since only a member map can back an entity.
    pub fn from_serializable<T: Serialize + ?Sized>(
        value: &T,
        policy: &IngestPolicy,
    ) -> Result<Entity, ModelError> {
        match crate::export::snapshot(value)? {
            Value::Object(map) => Ok(Self::ingest(&map, policy)),
            other => Err(ModelError::Identity(format!(
                "external value is not an object with members (found {})",
                value_kind(&other)
            ))),
        }
    }

    fn lift(entity: &mut Entity, key: &str, value: &Value) -> bool {
        let Value::String(text) = value else {
            return false;
        };
        match key {
            NAME_KEY => entity.name = Some(text.clone()),
            TYPE_KEY => entity.kind = Some(text.clone()),
            _ => return false,
        }
        true
    }
}

impl Entity {
    /// Wrap an external object with the default ingest policy.
    ///
    /// See [`Ingestor::ingest`].
    #[must_use]
    pub fn from_external<S: MemberSource + ?Sized>(source: &S) -> Self {
        Ingestor::ingest(source, &IngestPolicy::default())
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn external() -> serde_json::Map<String, Value> {
        json!({
            "entityId": "foreign-id",
            "name": "Door 12",
            "type": "element",
            "width": 0.9,
            "hardware": {"lock": true}
        })
        .as_object()
        .cloned()
        .expect("object literal")
    }

    #[test]
    fn identity_member_is_never_copied() {
        let entity = Entity::from_external(&external());

        assert_ne!(entity.entity_id().as_str(), "foreign-id");
        assert!(entity.member(IDENTITY_KEY).is_none());
        assert_eq!(entity.member("width"), Some(&json!(0.9)));
        assert_eq!(entity.member("hardware"), Some(&json!({"lock": true})));
    }

    #[test]
    fn default_policy_keeps_descriptors_as_members() {
        let entity = Entity::from_external(&external());
        assert_eq!(entity.member("name"), Some(&json!("Door 12")));
        assert!(entity.name().is_none());
    }

    #[test]
    fn lift_descriptors_populates_name_and_type() {
        let policy = IngestPolicy {
            lift_descriptors: true,
            ..IngestPolicy::default()
        };
        let entity = Ingestor::ingest(&external(), &policy);

        assert_eq!(entity.name(), Some("Door 12"));
        assert_eq!(entity.kind(), Some("element"));
        assert!(entity.member("name").is_none());
        assert!(entity.member("type").is_none());
    }

    #[test]
    fn lift_leaves_non_string_descriptors_alone() {
        let policy = IngestPolicy {
            lift_descriptors: true,
            ..IngestPolicy::default()
        };
        let mut source = BTreeMap::new();
        source.insert("name".to_string(), json!(42));
        let entity = Ingestor::ingest(&source, &policy);

        assert!(entity.name().is_none());
        assert_eq!(entity.member("name"), Some(&json!(42)));
    }

    #[test]
    fn reserved_keys_are_skipped() {
        let policy = IngestPolicy {
            reserved_keys: ["hardware".to_string()].into_iter().collect(),
            lift_descriptors: false,
        };
        let entity = Ingestor::ingest(&external(), &policy);

        assert!(entity.member("hardware").is_none());
        assert!(policy.is_reserved(IDENTITY_KEY));
        assert!(policy.is_reserved("hardware"));
        assert!(!policy.is_reserved("width"));
    }

    #[test]
    fn each_ingest_gets_fresh_identity() {
        let source = external();
        let a = Entity::from_external(&source);
        let b = Entity::from_external(&source);
        assert_ne!(a, b);
    }

    #[test]
    fn hash_map_sources_are_accepted() {
        let mut source: HashMap<String, Value> = HashMap::new();
        source.insert("level".to_string(), json!("L2"));
        let entity = Entity::from_external(&source);
        assert_eq!(entity.member("level"), Some(&json!("L2")));
    }

    #[test]
    fn from_serializable_requires_an_object() {
        #[derive(Serialize)]
        struct Window {
            sill: f64,
            glazing: &'static str,
        }

        let entity = Ingestor::from_serializable(
            &Window {
                sill: 0.8,
                glazing: "double",
            },
            &IngestPolicy::default(),
        )
        .expect("object");
        assert_eq!(entity.member("glazing"), Some(&json!("double")));

        let result = Ingestor::from_serializable(&[1, 2, 3], &IngestPolicy::default());
        assert!(matches!(result, Err(ModelError::Identity(_))));
    }
}
