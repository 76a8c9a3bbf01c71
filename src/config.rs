//! YAML Configuration File Support for dirmatch
//!
//! Loads the collation matching rule configuration of a directory server from
//! a single YAML file.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "example directory"
//! owner: "collation-matching-rules"
//!
//! collation:
//!   enabled: true
//!   substring_length: 6
//!   matching_rule_types: [less_than, less_or_equal, equality, greater_or_equal, greater_than, substring]
//!   collations:
//!     - "en-US:1.3.6.1.4.1.42.2.27.9.4.34.1"
//!     - "fr:1.3.6.1.4.1.42.2.27.9.4.76.1"
//!     - "sv-SE:1.3.6.1.4.1.42.2.27.9.4.148.1"
//! ```
//!
//! Collations that do not parse or name an unsupported locale do not fail the
//! load. They are reported as diagnostics when the configuration is applied.

use std::fs;
use std::path::Path;

use matcher::CollationConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DirmatchConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    /// Owner name the rules are registered under in the schema directory
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Collation matching rule configuration
    #[serde(default)]
    pub collation: CollationConfig,
}

impl DirmatchConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: DirmatchConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to YAML
    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        if self.owner.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "owner must not be empty".to_string(),
            ));
        }
        self.collation
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("collation: {err}")))
    }

    /// Same configuration with a different collation list
    pub fn with_collations<I, S>(mut self, collations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collation.collations = collations.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for DirmatchConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            owner: default_owner(),
            collation: CollationConfig::default(),
        }
    }
}

fn default_owner() -> String {
    "collation-matching-rules".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use index::DEFAULT_SUBSTRING_LENGTH;
    use matcher::RuleKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "test config"
collation:
  substring_length: 4
  matching_rule_types: [equality, substring]
  collations:
    - "en-US:1.3.6.1.4.1.42.2.27.9.4.34.1"
"#;

        let config = DirmatchConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.name, Some("test config".to_string()));
        assert_eq!(config.owner, "collation-matching-rules");
        assert!(config.collation.enabled);
        assert_eq!(config.collation.substring_length, 4);
        assert_eq!(
            config.collation.matching_rule_types,
            vec![RuleKind::Equality, RuleKind::Substring]
        );
        assert_eq!(config.collation.collations.len(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1"
collation:
  collations: ["de:1.3.6.1.4.1.42.2.27.9.4.28.1"]
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = DirmatchConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.version, "1");
        assert_eq!(config.collation.substring_length, DEFAULT_SUBSTRING_LENGTH);
        assert_eq!(config.collation.matching_rule_types, RuleKind::ALL.to_vec());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DirmatchConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileRead(_)));
    }

    #[test]
    fn test_default_config() {
        let config = DirmatchConfig::default();
        assert_eq!(config.version, "1.0");
        assert!(config.name.is_none());
        assert!(config.collation.collations.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_version_validation() {
        let result = DirmatchConfig::from_yaml("version: \"2.0\"\n");
        assert!(matches!(result, Err(ConfigLoadError::UnsupportedVersion(v)) if v == "2.0"));
    }

    #[test]
    fn test_substring_length_validation() {
        let yaml = r#"
version: "1.0"
collation:
  substring_length: 0
"#;

        let result = DirmatchConfig::from_yaml(yaml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("substring_length"));
    }

    #[test]
    fn test_unknown_rule_type_is_a_parse_error() {
        let yaml = r#"
version: "1.0"
collation:
  matching_rule_types: [approximate]
"#;

        assert!(matches!(
            DirmatchConfig::from_yaml(yaml),
            Err(ConfigLoadError::YamlParse(_))
        ));
    }

    #[test]
    fn test_bad_collations_still_load() {
        let config = DirmatchConfig::default().with_collations(["nonsense", "xx:1.2"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_yaml_roundtrip() {
        let config = DirmatchConfig {
            name: Some("production".to_string()),
            ..DirmatchConfig::default()
        }
        .with_collations(["en:1.1", "tr-TR:1.2"]);

        let yaml = config.to_yaml().unwrap();
        let parsed = DirmatchConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}
