//! # Model Primitives
//!
//! Hardcoded constants shared by the model, the ingestor and the export format.
//!
//! These values are compiled into the crate and are immutable at runtime.
//! Anything a host may legitimately tune lives in [`crate::config`] instead.

/// Member key that carries an entity's identity.
///
/// - Ingestion never copies a member with this key into passthrough storage.
/// - Passthrough writes with this key are rejected.
/// - The export format stores the identity under this key.
pub const IDENTITY_KEY: &str = "entityId";

/// Key used by the export format to elide an already-emitted entity.
///
/// The first occurrence of an entity is written inline; every later
/// occurrence is written as `{"$ref": "<entityId>"}`.
pub const REFERENCE_KEY: &str = "$ref";

/// Format marker written into every exported assembly document.
pub const FORMAT_MARKER: &str = "assemblage/assembly";

/// Current export format version.
///
/// Increment this when making breaking changes to the document layout.
pub const FORMAT_VERSION: u8 = 1;

/// Member keys lifted into an entity's descriptive fields when
/// `lift_descriptors` is enabled on the ingest policy.
pub const NAME_KEY: &str = "name";

/// See [`NAME_KEY`].
pub const TYPE_KEY: &str = "type";
