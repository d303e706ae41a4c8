//! Integration tests for unusual documents

use apiingest_common::ConvertOptions;
use apiingest_generator::Converter;
use apiingest_parser::SpecDocument;
use serde_json::{json, Value};

fn converter(value: Value) -> Converter {
    Converter::new(
        SpecDocument::from_value(value).unwrap(),
        ConvertOptions::default(),
    )
    .unwrap()
}

#[test]
fn test_fallback_operation_id() {
    let converter = converter(json!({
        "paths": {"/pets": {"get": {"summary": "List pets"}}}
    }));

    let markdown = converter.convert();
    assert!(!markdown.contains("OPERATION_ID:"));
    assert!(converter.convert_chunked().endpoints.contains_key("GET_pets"));
    assert_eq!(converter.generate_tool_schemas()[0].name, "GET_pets");
}

#[test]
fn test_circular_schemas_terminate() {
    let converter = converter(json!({
        "components": {"schemas": {
            "A": {"type": "object", "properties": {"b": {"$ref": "#/components/schemas/B"}}},
            "B": {"type": "object", "properties": {"a": {"$ref": "#/components/schemas/A"}}}
        }},
        "paths": {"/a": {"post": {"requestBody": {"content": {"application/json": {
            "schema": {"$ref": "#/components/schemas/A"}
        }}}}}}
    }));

    let markdown = converter.convert();
    assert!(markdown.contains("### A\n"));
    assert!(markdown.contains("### B\n"));

    let tools = converter.generate_tool_schemas();
    let b = &tools[0].parameters.properties["b"];
    assert_eq!(b["properties"]["a"]["type"], "object");
    assert!(b.to_string().contains("(circular: #/components/schemas/A)"));

    let bundle = converter.generate_bundle().unwrap();
    assert_eq!(bundle.api.components.schemas.len(), 2);
}

#[test]
fn test_nested_refs_fully_resolved() {
    let converter = converter(json!({
        "components": {"schemas": {
            "Order": {"type": "object", "properties": {
                "id": {"type": "string"},
                "customer": {"$ref": "#/components/schemas/Customer"}
            }},
            "Customer": {"type": "object", "properties": {"email": {"type": "string"}}}
        }},
        "paths": {"/orders": {"post": {
            "requestBody": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Order"}}}},
            "responses": {"201": {"description": "Created", "content": {"application/json": {
                "schema": {"$ref": "#/components/schemas/Order"}
            }}}}
        }}}
    }));

    let tools = serde_json::to_string(&converter.generate_tool_schemas()).unwrap();
    assert!(!tools.contains("$ref"));
    assert!(tools.contains("email"));

    let chunked = serde_json::to_string(&converter.convert_chunked()).unwrap();
    assert!(!chunked.contains("$ref"));
    assert!(!converter.convert().contains("$ref"));
}

#[test]
fn test_path_and_body_name_collision() {
    let converter = converter(json!({
        "paths": {"/users/{id}": {"put": {
            "parameters": [{"name": "id", "in": "path", "schema": {"type": "integer"}}],
            "requestBody": {"content": {"application/json": {"schema": {
                "type": "object",
                "required": ["id"],
                "properties": {"id": {"type": "string"}, "name": {"type": "string"}}
            }}}}
        }}}
    }));
    let tool = &converter.generate_tool_schemas()[0];
    assert_eq!(tool.parameters.properties["id"]["type"], "integer");
    assert_eq!(
        tool.parameters
            .required
            .iter()
            .filter(|name| *name == "id")
            .count(),
        1
    );
    assert!(tool.parameters.properties.contains_key("name"));
}

#[test]
fn test_pure_allof_body_has_no_body_properties() {
    let converter = converter(json!({
        "components": {"schemas": {"Base": {"type": "object", "properties": {"x": {"type": "string"}}}}},
        "paths": {"/things": {"post": {"requestBody": {"content": {"application/json": {"schema": {
            "allOf": [{"$ref": "#/components/schemas/Base"}]
        }}}}}}}
    }));
    let tool = &converter.generate_tool_schemas()[0];
    assert!(tool.parameters.properties.is_empty());

    let markdown = converter.convert();
    assert!(markdown.contains("  Body:\n  Content-Type: application/json\n    - x: string (optional)"));
}

#[test]
fn test_ref_parameters() {
    let converter = converter(json!({
        "components": {"parameters": {
            "PageSize": {"name": "page_size", "in": "query", "required": true,
                         "description": "Items per page", "schema": {"type": "integer"}}
        }},
        "paths": {"/items": {"get": {"parameters": [{"$ref": "#/components/parameters/PageSize"}]}}}
    }));
    let tool = &converter.generate_tool_schemas()[0];
    assert_eq!(
        tool.parameters.properties["page_size"],
        json!({"type": "integer", "description": "Items per page"})
    );
    assert_eq!(tool.parameters.required, vec!["page_size"]);
    assert!(converter
        .convert()
        .contains("  - page_size (integer, required)"));
}

#[test]
fn test_operation_without_inputs() {
    let converter = converter(json!({"paths": {"/health": {"get": {}}}}));
    let value = serde_json::to_value(&converter.generate_tool_schemas()).unwrap();
    assert_eq!(value[0]["parameters"], json!({"type": "object", "properties": {}}));
    assert_eq!(value[0]["description"], "GET /health");

    let markdown = converter.convert();
    assert!(markdown.contains("REQUEST\n  none\n"));
    assert!(markdown.contains("SUMMARY: No description"));
    assert!(markdown.contains("### Tag: Untagged\n"));
}

#[test]
fn test_empty_security_override() {
    let converter = converter(json!({
        "security": [{"key": []}],
        "components": {"securitySchemes": {"key": {"type": "apiKey", "in": "header", "name": "X-Key"}}},
        "paths": {
            "/public": {"get": {"operationId": "publicInfo", "security": []}},
            "/private": {"get": {"operationId": "privateInfo"}}
        }
    }));
    let chunked = converter.convert_chunked();
    assert!(chunked.endpoints["publicInfo"].contains("AUTH: None\n"));
    assert!(!chunked.endpoints["publicInfo"].contains("$API_KEY"));
    assert!(chunked.endpoints["privateInfo"].contains("AUTH: apiKey (header: X-Key)\n"));
    assert!(chunked.endpoints["privateInfo"].contains("-H \"X-Key: $API_KEY\""));
}

#[test]
fn test_array_request_body() {
    let converter = converter(json!({
        "paths": {"/batch": {"post": {
            "operationId": "batch",
            "requestBody": {"required": true, "content": {"application/json": {"schema": {
                "type": "array", "items": {"type": "string"}
            }}}}
        }}}
    }));
    let tool = &converter.generate_tool_schemas()[0];
    assert_eq!(tool.name, "batch");
    assert!(tool.parameters.properties.is_empty());
    assert!(converter.convert().contains("  Body:\n  Content-Type: application/json\n    array<string>"));

    let bundle = converter.generate_bundle().unwrap();
    let binding = &bundle.api.tools[0].http;
    assert!(binding.arg_mapping.is_empty());
    assert_eq!(binding.request_body.as_ref().unwrap().schema["type"], "array");
}

#[test]
fn test_tags_with_spaces_and_slashes() {
    let converter = converter(json!({
        "paths": {
            "/users": {"get": {"operationId": "listUsers", "tags": ["User Management"]}},
            "/beta/things": {"get": {"operationId": "listThings", "tags": ["v2/beta"]}}
        }
    }));
    let markdown = converter.convert();
    assert!(markdown.contains("### Tag: User Management\n"));
    assert!(markdown.contains("### Tag: v2/beta\n"));
    assert!(markdown.contains("TAGS: User Management\n"));

    let chunked = converter.convert_chunked();
    assert!(chunked.tags.contains_key("User Management"));
    assert!(chunked.tags.contains_key("v2/beta"));

    let bundle = converter.generate_bundle().unwrap();
    assert!(bundle.docs.contains("### User Management"));
    assert!(bundle.chunks.contains("\"tag\":\"v2/beta\""));
}

#[test]
fn test_description_truncation_boundary() {
    let exact = "a".repeat(200);
    let over = "b".repeat(201);
    let converter = converter(json!({
        "paths": {
            "/exact": {"get": {"summary": "Exact", "description": exact}},
            "/over": {"get": {"summary": "Over", "description": over}}
        }
    }));
    let markdown = converter.convert();
    assert!(markdown.contains(&format!("DESCRIPTION: {}\n", exact)));
    assert!(markdown.contains(&format!(
        "DESCRIPTION: {}... (see full docs)\n",
        "b".repeat(200)
    )));
}

#[test]
fn test_unicode_preserved() {
    let summary = "Erstelle einen neuen Benutzer — 用户";
    let converter = converter(json!({
        "info": {"title": "Benutzer-API 用户"},
        "paths": {"/benutzer": {"post": {"operationId": "createUser", "summary": summary}}}
    }));
    let markdown = converter.convert();
    assert!(markdown.starts_with("# Benutzer-API 用户\n"));
    assert!(markdown.contains(&format!("SUMMARY: {}\n", summary)));
    assert_eq!(converter.generate_tool_schemas()[0].description, summary);

    let bundle = converter.generate_bundle().unwrap();
    let chunk: Value = serde_json::from_str(&bundle.chunks).unwrap();
    assert!(chunk["text"].as_str().unwrap().starts_with(summary));
}

#[test]
fn test_missing_info_defaults() {
    let converter = converter(json!({"paths": {}}));
    let markdown = converter.convert();
    assert!(markdown.starts_with("# API Documentation\n**Version:** 1.0.0\n"));
    assert!(markdown.contains("## Base URLs\n  - (not specified)\n"));

    let bundle = converter.generate_bundle().unwrap();
    assert_eq!(bundle.api.api_name, "API");
    assert!(bundle.docs.contains("- None required"));
}

#[test]
fn test_colliding_operation_ids_stay_consistent() {
    let converter = converter(json!({
        "paths": {
            "/a": {"get": {"operationId": "dup"}},
            "/b": {"get": {"operationId": "dup"}}
        }
    }));

    let chunked = converter.convert_chunked();
    let keys: Vec<&str> = chunked.endpoints.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["dup", "dup_2"]);

    let markdown = converter.convert();
    for (key, block) in &chunked.endpoints {
        let line = format!("\nOPERATION_ID: {}\n", key);
        assert!(block.contains(&line), "block for {} has no matching id line", key);
        assert!(markdown.contains(&line));
    }

    let names: Vec<String> = converter
        .generate_tool_schemas()
        .into_iter()
        .map(|tool| tool.name)
        .collect();
    assert_eq!(names, vec!["dup", "dup_2"]);
}

#[test]
fn test_repeated_tags_keep_counts_aligned() {
    let converter = converter(json!({
        "paths": {"/t": {"get": {"operationId": "onlyOne", "tags": ["t", "t"]}}}
    }));

    let markdown = converter.convert();
    assert_eq!(markdown.matches("ENDPOINT: [").count(), 1);
    assert_eq!(converter.convert_chunked().endpoints.len(), 1);
    assert_eq!(converter.generate_tool_schemas().len(), 1);
    assert_eq!(
        converter.convert_chunked().tags["t"].matches("(onlyOne)").count(),
        1
    );
}
