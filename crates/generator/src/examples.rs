//! Example synthesis
//!
//! Placeholder values and curl commands for documentation. Nothing here
//! talks to a real API; values only need to look plausible.

use apiingest_common::{AuthDescriptor, HttpMethod, OperationRecord, ParamLocation};
use apiingest_parser::text::plain;
use serde_json::{json, Map, Value};

const CONTINUATION: &str = " \\\n  ";

/// Placeholder for a value described by `schema`
///
/// Declared `example`, `default`, and the first `enum` value win in that
/// order. Otherwise the type decides, and untyped strings are guessed from
/// the name (`id`, `name`, `email`).
pub fn synthesize_value(schema: &Value, name: &str) -> Value {
    if let Some(example) = schema.get("example") {
        return example.clone();
    }
    if let Some(default) = schema.get("default") {
        return default.clone();
    }
    if let Some(first) = schema
        .get("enum")
        .and_then(Value::as_array)
        .and_then(|values| values.first())
    {
        return first.clone();
    }

    match schema.get("type").and_then(Value::as_str).unwrap_or("string") {
        "integer" => json!(1),
        "number" => json!(1.0),
        "boolean" => json!(true),
        "array" => json!([]),
        "object" => json!({}),
        _ => {
            let lower = name.to_lowercase();
            if lower.contains("id") {
                json!("123")
            } else if lower.contains("name") {
                json!("example")
            } else if lower.contains("email") {
                json!("user@example.com")
            } else {
                json!("value")
            }
        }
    }
}

/// Placeholder document for a response schema, filled two levels deep
pub fn synthesize_response(schema: &Value) -> Value {
    synthesize_nested(schema, "", 0)
}

fn synthesize_nested(schema: &Value, name: &str, depth: usize) -> Value {
    if depth >= 2 || schema.get("example").is_some() {
        return synthesize_value(schema, name);
    }
    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        let filled: Map<String, Value> = props
            .iter()
            .map(|(prop, prop_schema)| (prop.clone(), synthesize_nested(prop_schema, prop, depth + 1)))
            .collect();
        return Value::Object(filled);
    }
    if let (Some("array"), Some(items)) = (
        schema.get("type").and_then(Value::as_str),
        schema.get("items"),
    ) {
        return Value::Array(vec![synthesize_nested(items, name, depth + 1)]);
    }
    if schema.get("type").and_then(Value::as_str) == Some("null") {
        return Value::Null;
    }
    synthesize_value(schema, name)
}

/// Request body placeholder: required properties filled in, or a generic
/// key/value pair when nothing is required
pub fn body_placeholder(schema: &Value) -> String {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let props = schema.get("properties").and_then(Value::as_object);

    let mut body = Map::new();
    if let Some(props) = props {
        for name in required {
            if let Some(prop) = props.get(name) {
                body.insert(name.to_string(), synthesize_value(prop, name));
            }
        }
    }

    if body.is_empty() {
        r#"{"key": "value"}"#.to_string()
    } else {
        Value::Object(body).to_string()
    }
}

/// Curl command shown in markdown endpoint blocks
pub fn markdown_curl(record: &OperationRecord, base_url: &str) -> String {
    let mut url = format!("{}{}", base_url, record.path);
    let mut query = Vec::new();
    let mut headers = Vec::new();

    for param in &record.parameters {
        let example = param.example.as_ref().map(plain);
        match param.location {
            ParamLocation::Path => {
                let value = example.unwrap_or_else(|| "123".to_string());
                url = url.replace(&format!("{{{}}}", param.name), &value);
            }
            ParamLocation::Query => {
                let value = example.unwrap_or_else(|| "example".to_string());
                query.push(format!("{}={}", param.name, value));
            }
            ParamLocation::Header => {
                let value = example.unwrap_or_else(|| "value".to_string());
                headers.push(format!("-H \"{}: {}\"", param.name, value));
            }
            ParamLocation::Cookie | ParamLocation::Other(_) => {}
        }
    }

    for auth in &record.auth {
        match auth {
            AuthDescriptor::ApiKey { location, name } if location == "query" => {
                query.push(format!("{}=$API_KEY", name));
            }
            AuthDescriptor::ApiKey { name, .. } => {
                headers.push(format!("-H \"{}: $API_KEY\"", name));
            }
            AuthDescriptor::Http { scheme } if scheme.eq_ignore_ascii_case("bearer") => {
                headers.push("-H \"Authorization: Bearer $TOKEN\"".to_string());
            }
            AuthDescriptor::Http { scheme } if scheme.eq_ignore_ascii_case("basic") => {
                headers.push("-H \"Authorization: Basic $CREDENTIALS\"".to_string());
            }
            _ => {}
        }
    }

    if !query.is_empty() {
        url = format!("{}?{}", url, query.join("&"));
    }

    let mut parts = vec![
        format!("curl -X {}", record.method.as_upper()),
        format!("\"{}\"", url),
    ];

    if let Some(body) = &record.request_body {
        if let Some(media) = body
            .content
            .iter()
            .find(|media| media.media_type == "application/json")
        {
            headers.push("-H \"Content-Type: application/json\"".to_string());
            let payload = match &media.example {
                Some(Value::String(text)) => text.clone(),
                Some(example) => example.to_string(),
                None if body.content_type == media.media_type => body_placeholder(&body.schema),
                None => body_placeholder(&media.schema),
            };
            parts.push(format!("-d '{}'", payload));
        }
    }

    parts.extend(headers);
    parts.join(CONTINUATION)
}

/// One argument of a bundle curl command
pub struct CurlArg<'a> {
    pub name: &'a str,
    /// `path`, `query`, `header`, or `body`
    pub location: &'a str,
    pub schema: &'a Value,
}

/// Minimal curl command for an agent-bundle tool
///
/// At most two query pairs and three headers are shown.
pub fn bundle_curl(
    base_url: &str,
    method: HttpMethod,
    path: &str,
    args: &[CurlArg<'_>],
    auth_header: Option<String>,
) -> String {
    let mut url = format!("{}{}", base_url, path);
    let mut query = Vec::new();
    let mut headers = Vec::new();

    for arg in args {
        let value = plain(&synthesize_value(arg.schema, arg.name));
        match arg.location {
            "path" => url = url.replace(&format!("{{{}}}", arg.name), &value),
            "query" => query.push(format!("{}={}", arg.name, value)),
            "header" => headers.push(format!("-H \"{}: {}\"", arg.name, value)),
            _ => {}
        }
    }

    if !query.is_empty() {
        let shown: Vec<String> = query.into_iter().take(2).collect();
        url = format!("{}?{}", url, shown.join("&"));
    }
    headers.extend(auth_header);

    let mut curl = format!("curl -X {} '{}'", method.as_upper(), url);
    if !headers.is_empty() {
        let shown: Vec<String> = headers.into_iter().take(3).collect();
        curl.push_str(CONTINUATION);
        curl.push_str(&shown.join(CONTINUATION));
    }
    curl
}
