//! Function-calling tool schemas

use apiingest_common::OperationRecord;
use apiingest_parser::text::truncate_chars;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// One tool descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
}

/// JSON-Schema object describing a tool's arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl ToolParameters {
    fn push_required(&mut self, name: &str) {
        if !self.required.iter().any(|existing| existing == name) {
            self.required.push(name.to_string());
        }
    }
}

/// Guess a type for a body property that declares none
fn inferred_type(schema: &Value) -> &'static str {
    if schema.get("properties").is_some() {
        "object"
    } else if schema.get("items").is_some() {
        "array"
    } else {
        "string"
    }
}

impl ToolSchema {
    pub fn from_record(record: &OperationRecord) -> Self {
        let description = record
            .summary
            .clone()
            .or_else(|| record.description.clone())
            .unwrap_or_else(|| format!("{} {}", record.method.as_upper(), record.path));

        let mut parameters = ToolParameters {
            kind: "object".to_string(),
            properties: IndexMap::new(),
            required: Vec::new(),
        };

        for param in &record.parameters {
            let mut property = Map::new();
            property.insert("type".to_string(), json!(param.schema_type()));
            for key in ["enum", "format"] {
                if let Some(value) = param.schema.get(key) {
                    property.insert(key.to_string(), value.clone());
                }
            }
            if !param.description.is_empty() {
                property.insert("description".to_string(), json!(param.description));
            }
            parameters
                .properties
                .insert(param.name.clone(), Value::Object(property));
            if param.required {
                parameters.push_required(&param.name);
            }
        }

        // Only top-level properties of the declared body schema become arguments
        if let Some(body) = record.request_body.as_ref().and_then(|body| body.declared_schema()) {
            let body_required: Vec<&str> = body
                .get("required")
                .and_then(Value::as_array)
                .map(|names| names.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();

            if let Some(props) = body.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    if parameters.properties.contains_key(name) {
                        continue;
                    }
                    let mut property = match prop {
                        Value::Object(map) => map.clone(),
                        _ => Map::new(),
                    };
                    if !property.contains_key("type") {
                        property.insert("type".to_string(), json!(inferred_type(prop)));
                    }
                    parameters
                        .properties
                        .insert(name.clone(), Value::Object(property));
                }
                for name in body_required {
                    if props.contains_key(name) {
                        parameters.push_required(name);
                    }
                }
            }
        }

        Self {
            name: record.operation_id.clone(),
            description: truncate_chars(&description, 200).to_string(),
            parameters,
        }
    }
}

/// Tool schemas for every record, in record order
pub fn tool_schemas(records: &[OperationRecord]) -> Vec<ToolSchema> {
    records.iter().map(ToolSchema::from_record).collect()
}
