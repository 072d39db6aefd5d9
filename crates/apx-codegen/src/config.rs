use crate::error::{CodegenError, CodegenResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How type references are printed in APX text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceStyle {
    /// `T[0]`
    #[default]
    Index,
    /// `T["Mode_T"]`
    Name,
}

/// Settings shared by the node generator and the context aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Version written in the `APX/<version>` header line
    #[serde(default = "default_apx_version")]
    pub apx_version: String,

    #[serde(default)]
    pub reference_style: ReferenceStyle,

    /// Prefix of generated file names and C symbols
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// File name of the combined context artifact
    #[serde(default = "default_context_file")]
    pub context_file: String,

    /// Headers included by every generated header, before per-call includes
    #[serde(default)]
    pub includes: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            apx_version: default_apx_version(),
            reference_style: ReferenceStyle::default(),
            file_prefix: default_file_prefix(),
            context_file: default_context_file(),
            includes: vec![],
        }
    }
}

pub fn default_apx_version() -> String {
    "1.2".to_string()
}

pub fn default_file_prefix() -> String {
    "ApxNode_".to_string()
}

pub fn default_context_file() -> String {
    "context.apx".to_string()
}

impl GeneratorConfig {
    pub fn from_toml_str(content: &str) -> CodegenResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads a configuration file. Keys that are not present keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> CodegenResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| CodegenError::io(path, err))?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("loaded generator configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(GeneratorConfig::from_toml_str("").unwrap(), GeneratorConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = GeneratorConfig::from_toml_str(
            r#"
            reference_style = "name"
            includes = ["Rte_Type.h"]
            "#,
        )
        .unwrap();
        assert_eq!(config.reference_style, ReferenceStyle::Name);
        assert_eq!(config.includes, vec!["Rte_Type.h"]);
        assert_eq!(config.file_prefix, "ApxNode_");
        assert_eq!(config.apx_version, "1.2");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            GeneratorConfig::from_toml_str(r#"reference_style = "pointer""#),
            Err(CodegenError::Config(_))
        ));
        assert!(matches!(
            GeneratorConfig::from_toml_str("unknown_key = 1"),
            Err(CodegenError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            GeneratorConfig::load(dir.path().join("apx.toml")),
            Err(CodegenError::Io { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("apx.toml");
        std::fs::write(&path, "file_prefix = \"Apx_\"\ncontext_file = \"all.apx\"\n").unwrap();
        let config = GeneratorConfig::load(&path).unwrap();
        assert_eq!(config.file_prefix, "Apx_");
        assert_eq!(config.context_file, "all.apx");
    }
}
