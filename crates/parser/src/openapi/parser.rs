//! OpenAPI document loading
//!
//! YAML and JSON documents are both normalized into one order-preserving
//! `serde_json::Value`, so every later stage sees identical input no matter
//! which syntax the document was written in.

use super::types::{decode, Info, PathItem, SecurityRequirement, SecurityScheme, Server};
use apiingest_common::{IngestError, LoadError, Result};
use serde_json::{Map, Number, Value};
use std::fs;
use std::path::Path;

/// Source syntax of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.yaml` / `.yml` select YAML; everything else is read as JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }
}

/// A loaded OpenAPI document
///
/// Immutable once built; generators borrow it and build their own resolver
/// per call.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocument {
    root: Value,
}

impl SpecDocument {
    /// Load a document from a file path
    ///
    /// # Example
    /// ```rust,ignore
    /// let document = SpecDocument::from_file("petstore.yaml")?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|e| IngestError::load(&origin, e))?;

        Self::decode(&content, DocumentFormat::from_path(path), &origin)
    }

    /// Parse a document held in memory
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self> {
        Self::decode(content, format, "<memory>")
    }

    /// Wrap an already parsed JSON value
    pub fn from_value(root: Value) -> Result<Self> {
        Self::checked(root, "<value>")
    }

    fn decode(content: &str, format: DocumentFormat, origin: &str) -> Result<Self> {
        let root = match format {
            DocumentFormat::Json => {
                serde_json::from_str(content).map_err(|e| IngestError::load(origin, e))?
            }
            DocumentFormat::Yaml => {
                let yaml: serde_yaml::Value =
                    serde_yaml::from_str(content).map_err(|e| IngestError::load(origin, e))?;
                yaml_to_json(yaml)
            }
        };

        Self::checked(root, origin)
    }

    fn checked(root: Value, origin: &str) -> Result<Self> {
        let kind = match &root {
            Value::Object(_) => return Ok(Self { root }),
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
        };
        Err(IngestError::load(origin, LoadError::NotAMapping(kind)))
    }

    /// The raw document
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// `info` block
    pub fn info(&self) -> Info {
        self.root.get("info").map(decode).unwrap_or_default()
    }

    /// API title, `API Documentation` when absent
    pub fn title(&self) -> String {
        self.info()
            .title
            .unwrap_or_else(|| "API Documentation".to_string())
    }

    /// API version, `1.0.0` when absent
    pub fn version(&self) -> String {
        self.info().version.unwrap_or_else(|| "1.0.0".to_string())
    }

    /// Declared servers in document order
    pub fn servers(&self) -> Vec<Server> {
        self.root.get("servers").map(decode).unwrap_or_default()
    }

    /// URL of the first server, if any
    pub fn first_server_url(&self) -> Option<String> {
        self.servers().into_iter().next().and_then(|server| server.url)
    }

    /// Path items in document order
    pub fn path_items(&self) -> Vec<(String, PathItem)> {
        self.root
            .get("paths")
            .and_then(Value::as_object)
            .map(|paths| {
                paths
                    .iter()
                    .map(|(path, item)| (path.clone(), decode(item)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `components.schemas`, if present
    pub fn schemas(&self) -> Option<&Map<String, Value>> {
        self.component("schemas")
    }

    /// `components.securitySchemes` in document order
    pub fn security_schemes(&self) -> Vec<(String, SecurityScheme)> {
        self.component("securitySchemes")
            .map(|schemes| {
                schemes
                    .iter()
                    .map(|(name, scheme)| (name.clone(), decode(scheme)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Look up one security scheme by name
    pub fn security_scheme(&self, name: &str) -> Option<SecurityScheme> {
        self.component("securitySchemes")
            .and_then(|schemes| schemes.get(name))
            .map(decode)
    }

    /// Document-level security requirements
    pub fn global_security(&self) -> Vec<SecurityRequirement> {
        self.root.get("security").map(decode).unwrap_or_default()
    }

    fn component(&self, kind: &str) -> Option<&Map<String, Value>> {
        self.root
            .get("components")
            .and_then(|components| components.get(kind))
            .and_then(Value::as_object)
    }
}

/// Convert a YAML tree into JSON, stringifying non-string mapping keys
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(flag) => Value::Bool(flag),
        Yaml::Number(number) => {
            if let Some(n) = number.as_u64() {
                Value::Number(n.into())
            } else if let Some(n) = number.as_i64() {
                Value::Number(n.into())
            } else {
                number
                    .as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(text) => Value::String(text),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => {
            let mut object = Map::new();
            for (key, value) in mapping {
                object.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(object)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(text) => text,
        Yaml::Number(number) => number.to_string(),
        Yaml::Bool(flag) => flag.to_string(),
        Yaml::Null => "null".to_string(),
        other => match yaml_to_json(other) {
            Value::String(text) => text,
            json => json.to_string(),
        },
    }
}
