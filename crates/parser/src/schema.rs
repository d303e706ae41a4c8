//! Schema normalization
//!
//! `allOf` flattening plus the compact one-line and inline renderings used by
//! the markdown views.

use crate::resolver::Resolver;
use crate::text::{plain, truncate_with};
use serde_json::{Map, Value};

/// Merge `allOf` members into one schema
///
/// Members are resolved first. Their `properties` merge with later members
/// winning, `required` lists concatenate, and any other keyword is copied
/// member by member. Keywords of the outer node (except `allOf`) fill only
/// the keys still unset.
pub fn flatten_allof(schema: &Value, resolver: &mut Resolver<'_>) -> Value {
    let Some(members) = schema.get("allOf").and_then(Value::as_array) else {
        return schema.clone();
    };

    let mut merged = Map::new();
    for member in members {
        let member = resolver.resolve(member);
        let Value::Object(member) = member else {
            continue;
        };

        for (key, value) in member {
            if key == "properties" {
                if let Value::Object(props) = value {
                    let target = merged
                        .entry("properties")
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Value::Object(target) = target {
                        target.extend(props);
                    }
                }
            } else if key == "required" {
                if let Value::Array(names) = value {
                    let target = merged
                        .entry("required")
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if let Value::Array(target) = target {
                        target.extend(names);
                    }
                }
            } else if key != "allOf" {
                merged.insert(key, value);
            }
        }
    }

    if let Value::Object(outer) = schema {
        for (key, value) in outer {
            if key != "allOf" && !merged.contains_key(key) {
                merged.insert(key.clone(), value.clone());
            }
        }
    }

    Value::Object(merged)
}

/// Declared type, `object` when absent
///
/// A type list (`["string", "null"]`) reports its first non-null entry.
pub fn schema_type(schema: &Value) -> &str {
    match schema.get("type") {
        Some(Value::String(kind)) => kind,
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .find(|kind| *kind != "null")
            .unwrap_or("object"),
        _ => "object",
    }
}

fn is_empty_schema(schema: &Value) -> bool {
    match schema {
        Value::Object(map) => map.is_empty(),
        _ => true,
    }
}

fn non_empty<'v>(schema: &'v Value, key: &str) -> Option<&'v Value> {
    schema.get(key).filter(|value| match value {
        Value::Null => false,
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    })
}

/// One-line description of a schema's type
///
/// # Examples
/// - `{}` → `any`
/// - `{"type": "string", "enum": ["a", "b"]}` → `string (enum: a, b)`
/// - `{"type": "integer", "format": "int64"}` → `integer (int64)`
/// - `{"type": "array", "items": {"type": "string"}}` → `array<string>`
/// - object with 3 properties → `object (3 fields)`
pub fn normalize_type(schema: &Value) -> String {
    if is_empty_schema(schema) {
        return "any".to_string();
    }

    let kind = schema_type(schema);

    if let Some(Value::Array(values)) = non_empty(schema, "enum") {
        let shown: Vec<String> = values.iter().take(5).map(plain).collect();
        let more = if values.len() > 5 { "..." } else { "" };
        return format!("{} (enum: {}{})", kind, shown.join(", "), more);
    }
    if let Some(format) = non_empty(schema, "format") {
        return format!("{} ({})", kind, plain(format));
    }

    match kind {
        "array" => {
            let item = match non_empty(schema, "items") {
                Some(items) => normalize_type(items),
                None => "any".to_string(),
            };
            format!("array<{}>", item)
        }
        "object" => match non_empty(schema, "properties").and_then(Value::as_object) {
            Some(props) => format!("object ({} fields)", props.len()),
            None => "object".to_string(),
        },
        other => other.to_string(),
    }
}

/// Multi-line rendering of a schema's fields
///
/// Objects yield one line per property in source order:
/// `- name: type (required|optional) — description`. Descriptions longer than
/// 60 characters are cut and suffixed with `...`.
pub fn format_schema_inline(schema: &Value, indent: usize) -> String {
    let prefix = "  ".repeat(indent);
    if is_empty_schema(schema) {
        return format!("{}none", prefix);
    }

    let mut lines = Vec::new();
    match schema_type(schema) {
        "object" => {
            let required: Vec<&str> = schema
                .get("required")
                .and_then(Value::as_array)
                .map(|names| names.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();

            if let Some(props) = schema.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    let marker = if required.contains(&name.as_str()) {
                        "required"
                    } else {
                        "optional"
                    };
                    let description = prop
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or("");
                    let suffix = if description.is_empty() {
                        String::new()
                    } else {
                        format!(" — {}", truncate_with(description, 60, "..."))
                    };
                    lines.push(format!(
                        "{}- {}: {} ({}){}",
                        prefix,
                        name,
                        normalize_type(prop),
                        marker,
                        suffix
                    ));
                }
            }
        }
        "array" => {
            let items = schema.get("items").cloned().unwrap_or(Value::Null);
            lines.push(format!("{}array<{}>", prefix, normalize_type(&items)));
        }
        _ => lines.push(format!("{}{}", prefix, normalize_type(schema))),
    }

    if lines.is_empty() {
        format!("{}(empty)", prefix)
    } else {
        lines.join("\n")
    }
}
