//! Conversion options
//!
//! Options can be built in code or loaded from a YAML file so a project can
//! pin its defaults next to the API document.

use crate::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Knobs shared by every generator
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Server used for the agent bundle's curl examples
    pub server_index: usize,
    /// Reference depth for human-readable (shallow) resolution
    pub inline_depth: usize,
    /// Reference depth for machine-consumable (deep) resolution
    pub resolve_depth: usize,
    /// Base URL used when the document declares no servers
    pub fallback_base_url: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            server_index: 0,
            inline_depth: 3,
            resolve_depth: 10,
            fallback_base_url: "https://api.example.com".to_string(),
        }
    }
}

impl ConvertOptions {
    /// Load options from a YAML file; absent keys keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            IngestError::Config(format!(
                "Failed to read options file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content).map_err(|e| match e {
            IngestError::Config(msg) => {
                IngestError::Config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Parse options from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| IngestError::Config(format!("Failed to parse options YAML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::default();
        assert_eq!(options.server_index, 0);
        assert_eq!(options.inline_depth, 3);
        assert_eq!(options.resolve_depth, 10);
        assert_eq!(options.fallback_base_url, "https://api.example.com");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let options = ConvertOptions::from_yaml("server_index: 2\n").unwrap();
        assert_eq!(options.server_index, 2);
        assert_eq!(options.resolve_depth, 10);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            ConvertOptions::from_yaml("").unwrap(),
            ConvertOptions::default()
        );
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = ConvertOptions::from_yaml("server_index: [not a number").unwrap_err();
        assert!(matches!(err, IngestError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fallback_base_url: http://localhost:8080").unwrap();
        writeln!(file, "inline_depth: 1").unwrap();

        let options = ConvertOptions::load(file.path()).unwrap();
        assert_eq!(options.fallback_base_url, "http://localhost:8080");
        assert_eq!(options.inline_depth, 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConvertOptions::load("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("not/here.yaml"));
    }
}
