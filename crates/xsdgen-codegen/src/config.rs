//! Generator configuration
//!
//! One [`GeneratorConfig`] value is threaded into [`crate::generate`]; nothing is
//! read from global state. The struct doubles as the `xsdgen.toml` format.

use serde::{Deserialize, Serialize};

use crate::CodegenError;

/// Configuration for one generation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory generated packages are written to
    pub base_code_path: String,
    /// Rust path prefix of generated packages, used for imports of other namespaces
    pub base_path: String,
    /// Resolve default values while parsing (consumed by the parser)
    pub force_parse_for_defaults: bool,
    /// Name prefixes the pluralizer treats specially (consumed by the parser)
    pub pluralize_special_prefixes: Vec<String>,
    /// Generate `walk()` methods and the walker dispatch declarations
    pub add_walkers: bool,
    /// Rust path of the built-in scalar type library
    pub types_crate: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_code_path: "generated".to_string(),
            base_path: "crate".to_string(),
            force_parse_for_defaults: false,
            pluralize_special_prefixes: vec!["Library".to_string(), "Instance".to_string()],
            add_walkers: true,
            types_crate: "xsd_types".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Parse an `xsdgen.toml` document. Missing keys keep their defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, CodegenError> {
        Ok(toml::from_str(toml)?)
    }

    pub fn with_walkers(mut self, add_walkers: bool) -> Self {
        self.add_walkers = add_walkers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_keeps_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let config = GeneratorConfig::from_toml_str("")?;
        assert_eq!(config, GeneratorConfig::default());
        assert!(config.add_walkers);
        assert_eq!(config.pluralize_special_prefixes, vec!["Library", "Instance"]);
        Ok(())
    }

    #[test]
    fn test_partial_toml() -> Result<(), Box<dyn std::error::Error>> {
        let config = GeneratorConfig::from_toml_str(
            r#"
            add_walkers = false
            base_path = "my_schemas"
            "#,
        )?;
        assert!(!config.add_walkers);
        assert_eq!(config.base_path, "my_schemas");
        assert_eq!(config.types_crate, "xsd_types");
        Ok(())
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = GeneratorConfig::from_toml_str("add_walkers = \"maybe\"");
        assert!(matches!(err, Err(CodegenError::Config(_))));
    }
}
