//! # assemblage-core
//!
//! In-memory entity-relationship model for describing real-world things
//! (building elements, spaces, documents) and the typed relationships
//! between them, handled as coherent sub-graphs called assemblies.
//!
//! ## Identity Discipline
//!
//! - An [`Entity`] is equal to another iff their [`EntityId`]s match
//! - A [`Relationship`] is identified by `(source id, target id, type)`
//! - An [`Assembly`] derives its member entities from its relationships;
//!   there is no stored entity list
//! - Every duplication goes through one [`Duplicate`] primitive with an
//!   explicit preserve-identity flag
//!
//! ## Architectural Constraints
//!
//! - NO async, NO network, NO persistence (pure Rust)
//! - Host integration lives outside this crate and talks to it through
//!   [`Ingestor`] and the [`export`] functions

// =============================================================================
// MODULES
// =============================================================================

pub mod assembly;
pub mod config;
pub mod duplicate;
pub mod entity;
pub mod export;
pub mod identity;
pub mod ingestor;
pub mod primitives;
pub mod relationship;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{ConstructionError, Direction, MemberMap, ModelError, Value};

// =============================================================================
// RE-EXPORTS: Model
// =============================================================================

pub use assembly::Assembly;
pub use duplicate::{CloneContext, Duplicate};
pub use entity::{Entity, EntityHandle};
pub use identity::EntityId;
pub use relationship::{Relationship, RelationshipKey};

// =============================================================================
// RE-EXPORTS: Boundaries
// =============================================================================

pub use config::ModelConfig;
pub use export::{
    AssemblyDocument, ExportOptions, assembly_from_json, assembly_from_value, assembly_to_json,
    assembly_to_json_with, assembly_to_value, deep_copy, entity_from_json, entity_from_value,
    entity_to_json, entity_to_value, relationship_from_json, relationship_from_value,
    relationship_to_json, relationship_to_value,
};
pub use ingestor::{IngestPolicy, Ingestor, MemberSource};
