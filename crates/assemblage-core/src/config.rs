//! # Configuration
//!
//! Host-tunable policy for the model, read from TOML.
//!
//! ```toml
//! [ingest]
//! reserved_keys = ["id", "applicationId"]
//! lift_descriptors = true
//!
//! [export]
//! pretty = true
//! ```
//!
//! Every field has a default, so an empty document is a valid config.
//! Unknown tables or keys are rejected rather than ignored.

use crate::export::ExportOptions;
use crate::ingestor::IngestPolicy;
use crate::types::ModelError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level model configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Rules for wrapping external objects.
    pub ingest: IngestPolicy,
    /// Output options for exported documents.
    pub export: ExportOptions,
}

impl ModelConfig {
    /// Parse a configuration document.
    pub fn from_toml_str(source: &str) -> Result<Self, ModelError> {
        let config: Self =
            toml::from_str(source).map_err(|e| ModelError::ConfigError(e.to_string()))?;
        tracing::debug!(
            reserved_keys = config.ingest.reserved_keys.len(),
            lift_descriptors = config.ingest.lift_descriptors,
            pretty = config.export.pretty,
            "loaded model config"
        );
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ModelError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    #[must_use]
    pub fn ingest_policy(&self) -> &IngestPolicy {
        &self.ingest
    }

    #[must_use]
    pub fn export_options(&self) -> ExportOptions {
        self.export
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = ModelConfig::from_toml_str("").expect("parse");
        assert_eq!(config, ModelConfig::default());
        assert!(!config.export_options().pretty);
        assert!(config.ingest_policy().reserved_keys.is_empty());
    }

    #[test]
    fn full_document_is_parsed() {
        let config = ModelConfig::from_toml_str(
            r#"
            [ingest]
            reserved_keys = ["id", "applicationId"]
            lift_descriptors = true

            [export]
            pretty = true
            "#,
        )
        .expect("parse");

        assert!(config.ingest_policy().is_reserved("applicationId"));
        assert!(config.ingest_policy().lift_descriptors);
        assert!(config.export_options().pretty);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = ModelConfig::from_toml_str("[ingest]\nreserved = []\n");
        assert!(matches!(result, Err(ModelError::ConfigError(_))));

        let result = ModelConfig::from_toml_str("[persistence]\npath = \"x\"\n");
        assert!(matches!(result, Err(ModelError::ConfigError(_))));
    }

    #[test]
    fn config_file_is_loaded() {
        use tempfile::tempdir;

        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("assemblage.toml");
        std::fs::write(
            &path,
            "[ingest]\nreserved_keys = [\"guid\"]\n\n[export]\npretty = true\n",
        )
        .expect("write config");

        let config = ModelConfig::from_file(&path).expect("load");

        assert!(config.ingest_policy().is_reserved("guid"));
        assert!(!config.ingest_policy().lift_descriptors);
        assert!(config.export_options().pretty);
    }

    #[test]
    fn invalid_config_file_is_a_config_error() {
        use tempfile::tempdir;

        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("broken.toml");
        std::fs::write(&path, "[export]\npretty = \"yes\"\n").expect("write config");

        let result = ModelConfig::from_file(&path);
        assert!(matches!(result, Err(ModelError::ConfigError(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = ModelConfig::from_file("/nonexistent/assemblage.toml");
        assert!(matches!(result, Err(ModelError::IoError(_))));
    }
}
