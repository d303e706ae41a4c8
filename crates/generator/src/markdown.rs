//! Monolithic markdown rendering
//!
//! The block format here is shared with the chunked view, which serves the
//! same header, endpoint blocks, and schema entries one key at a time.

use crate::examples::markdown_curl;
use apiingest_common::{OperationRecord, ParamLocation};
use apiingest_parser::schema::{flatten_allof, format_schema_inline, normalize_type, schema_type};
use apiingest_parser::text::{truncate_chars, truncate_with};
use apiingest_parser::{ResolveMode, Resolver, SpecDocument};
use serde_json::Value;
use std::collections::BTreeMap;

/// Group used for operations without tags
pub const UNTAGGED: &str = "Untagged";

fn rule() -> String {
    "=".repeat(80)
}

/// Tags an operation is listed under, repeats dropped
pub fn listing_tags(record: &OperationRecord) -> Vec<&str> {
    let mut tags: Vec<&str> = Vec::with_capacity(record.tags.len());
    for tag in &record.tags {
        if !tags.contains(&tag.as_str()) {
            tags.push(tag);
        }
    }
    if tags.is_empty() {
        tags.push(UNTAGGED);
    }
    tags
}

/// Tag whose details section owns the operation's block
pub fn section_tag(record: &OperationRecord) -> &str {
    record.primary_tag().unwrap_or(UNTAGGED)
}

fn sort_key(record: &OperationRecord) -> (&'static str, &str) {
    (record.method.as_str(), record.path.as_str())
}

/// Operations listed under every tag they carry, tags sorted, each group
/// sorted by (method, path)
pub fn endpoints_by_tag(records: &[OperationRecord]) -> BTreeMap<&str, Vec<&OperationRecord>> {
    let mut groups: BTreeMap<&str, Vec<&OperationRecord>> = BTreeMap::new();
    for record in records {
        for tag in listing_tags(record) {
            groups.entry(tag).or_default().push(record);
        }
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    }
    groups
}

/// Title, version, description, base URLs, and authentication schemes
pub fn render_header(document: &SpecDocument) -> String {
    let mut lines = vec![
        format!("# {}", document.title()),
        format!("**Version:** {}", document.version()),
        String::new(),
    ];

    if let Some(description) = document.info().description.filter(|text| !text.is_empty()) {
        lines.push(truncate_with(&description, 500, "..."));
        lines.push(String::new());
    }

    lines.push("## Base URLs".to_string());
    let servers = document.servers();
    if servers.is_empty() {
        lines.push("  - (not specified)".to_string());
    }
    for server in servers {
        let url = server.url.unwrap_or_default();
        match server.description.filter(|text| !text.is_empty()) {
            Some(description) => lines.push(format!("  - {} — {}", url, description)),
            None => lines.push(format!("  - {}", url)),
        }
    }
    lines.push(String::new());

    let schemes = document.security_schemes();
    if !schemes.is_empty() {
        lines.push("## Authentication".to_string());
        for (name, scheme) in schemes {
            let line = match scheme.scheme_type.as_deref() {
                Some("apiKey") => format!(
                    "  - {}: API Key ({}: {})",
                    name,
                    scheme.location.as_deref().unwrap_or("header"),
                    scheme.name.as_deref().unwrap_or("")
                ),
                Some("http") => format!(
                    "  - {}: HTTP {}",
                    name,
                    scheme.scheme.as_deref().unwrap_or("bearer").to_uppercase()
                ),
                Some("oauth2") => {
                    let flows: Vec<&str> = scheme.flows.keys().map(String::as_str).collect();
                    format!("  - {}: OAuth2 ({})", name, flows.join(", "))
                }
                Some(other) => format!("  - {}: {}", name, other),
                None => format!("  - {}: unknown", name),
            };
            lines.push(line);
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// `## Endpoints by Tag` listing
pub fn render_toc(groups: &BTreeMap<&str, Vec<&OperationRecord>>) -> String {
    let mut lines = vec!["## Endpoints by Tag".to_string(), String::new()];

    for (tag, records) in groups {
        lines.push(format!("### {}", tag));
        for record in records {
            let summary = record
                .summary
                .as_deref()
                .or(record.description.as_deref())
                .unwrap_or("");
            lines.push(format!(
                "- **{}** `{}` — {}",
                record.method.as_upper(),
                record.path,
                truncate_with(summary, 60, "...")
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn param_lines(record: &OperationRecord, location: &ParamLocation) -> Vec<String> {
    record
        .parameters_in(location)
        .map(|param| {
            format!(
                "  - {} ({}, {})",
                param.name,
                normalize_type(&param.schema),
                if param.required { "required" } else { "optional" }
            )
        })
        .collect()
}

/// One `=`-delimited endpoint block, self-contained
pub fn render_endpoint(record: &OperationRecord, base_url: &str) -> String {
    let summary = match (&record.summary, &record.description) {
        (Some(summary), _) => summary.clone(),
        (None, Some(description)) => truncate_chars(description, 80).to_string(),
        (None, None) => "No description".to_string(),
    };
    let description = record
        .description
        .as_deref()
        .map(|text| truncate_with(text, 200, "... (see full docs)"))
        .unwrap_or_default();

    let mut lines = vec![rule(), format!("ENDPOINT: [{}] {}", record.method.as_upper(), record.path)];
    // Same id as the chunk key and tool name
    if record.declared_id.is_some() {
        lines.push(format!("OPERATION_ID: {}", record.operation_id));
    }
    lines.push(format!("BASE_URL: {}", base_url));
    lines.push(format!(
        "TAGS: {}",
        if record.tags.is_empty() {
            "none".to_string()
        } else {
            record.tags.join(", ")
        }
    ));
    lines.push(format!("SUMMARY: {}", summary));
    if !description.is_empty() && description != summary {
        lines.push(format!("DESCRIPTION: {}", description));
    }
    lines.push(format!("AUTH: {}", record.auth_summary()));
    lines.push(String::new());

    lines.push("REQUEST".to_string());
    let mut any_request = false;
    for (heading, location) in [
        ("  Path params:", ParamLocation::Path),
        ("  Query params:", ParamLocation::Query),
        ("  Header params:", ParamLocation::Header),
    ] {
        let params = param_lines(record, &location);
        if !params.is_empty() {
            any_request = true;
            lines.push(heading.to_string());
            lines.extend(params);
        }
    }

    let other: Vec<String> = record
        .parameters
        .iter()
        .filter(|param| {
            matches!(param.location, ParamLocation::Cookie | ParamLocation::Other(_))
        })
        .map(|param| {
            format!(
                "  - {} ({}, {}, in: {})",
                param.name,
                normalize_type(&param.schema),
                if param.required { "required" } else { "optional" },
                param.location.as_str()
            )
        })
        .collect();
    if !other.is_empty() {
        any_request = true;
        lines.push("  Other params:".to_string());
        lines.extend(other);
    }

    if let Some(body) = record.request_body.as_ref().filter(|body| !body.content.is_empty()) {
        any_request = true;
        lines.push("  Body:".to_string());
        for media in &body.content {
            let schema = if media.media_type == body.content_type {
                &body.schema
            } else {
                &media.schema
            };
            lines.push(format!("  Content-Type: {}", media.media_type));
            lines.push(format_schema_inline(schema, 2));
        }
    }
    if !any_request {
        lines.push("  none".to_string());
    }
    lines.push(String::new());

    lines.push("RESPONSES".to_string());
    if record.responses.is_empty() {
        lines.push("  none".to_string());
    }
    for response in &record.responses {
        if response.content.is_empty() {
            lines.push(format!("  - {}: {}", response.status, response.description));
        }
        for media in &response.content {
            lines.push(format!(
                "  - {} ({}): {}",
                response.status, media.media_type, response.description
            ));
            lines.push(format_schema_inline(&media.schema, 4));
        }
    }
    lines.push(String::new());

    lines.push("EXAMPLE (curl)".to_string());
    lines.push(markdown_curl(record, base_url));
    lines.push(rule());
    lines.push(String::new());

    lines.join("\n")
}

/// Every document schema dereferenced and flattened, sorted by name
pub fn resolved_schemas(document: &SpecDocument, max_depth: usize) -> Vec<(String, Value)> {
    let Some(schemas) = document.schemas() else {
        return Vec::new();
    };
    let mut resolver = Resolver::new(document, ResolveMode::Deep { max_depth });

    let mut names: Vec<&String> = schemas.keys().collect();
    names.sort();
    names
        .into_iter()
        .map(|name| {
            let resolved = resolver.resolve(&schemas[name]);
            let flat = flatten_allof(&resolved, &mut resolver);
            (name.clone(), flat)
        })
        .collect()
}

/// Appendix entry for one schema
pub fn render_schema(name: &str, schema: &Value) -> String {
    let mut lines = vec![
        format!("### {}", name),
        format!("Type: {}", schema_type(schema)),
    ];
    if let Some(description) = schema
        .get("description")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
    {
        lines.push(format!("Description: {}", truncate_with(description, 200, "...")));
    }
    lines.push(String::new());
    lines.push(format_schema_inline(schema, 0));
    lines.push(String::new());
    lines.join("\n")
}

fn render_appendix(schemas: &[(String, Value)]) -> String {
    let mut lines = vec![
        String::new(),
        rule(),
        "## COMPONENTS APPENDIX".to_string(),
        rule(),
        String::new(),
        "Shared schemas referenced throughout the API:".to_string(),
        String::new(),
    ];
    for (name, schema) in schemas {
        lines.push(render_schema(name, schema));
    }
    lines.join("\n")
}

/// Full monolithic document
pub fn render_markdown(
    document: &SpecDocument,
    records: &[OperationRecord],
    base_url: &str,
    schema_depth: usize,
) -> String {
    let header = render_header(document);
    let groups = endpoints_by_tag(records);
    let toc = render_toc(&groups);

    let mut details = String::from("\n## Endpoint Details\n");
    for (tag, group) in &groups {
        let owned: Vec<&&OperationRecord> = group
            .iter()
            .filter(|record| section_tag(record) == *tag)
            .collect();
        if owned.is_empty() {
            continue;
        }
        details.push_str(&format!("\n### Tag: {}\n", tag));
        for record in owned {
            details.push_str(&render_endpoint(record, base_url));
        }
    }

    let mut markdown = format!("{}\n{}\n{}", header, toc, details);
    let schemas = resolved_schemas(document, schema_depth);
    if !schemas.is_empty() {
        markdown.push('\n');
        markdown.push_str(&render_appendix(&schemas));
    }
    markdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiingest_common::{HttpMethod, ParameterInfo, SuccessResponse};
    use serde_json::json;

    fn record(method: HttpMethod, path: &str, tags: &[&str]) -> OperationRecord {
        OperationRecord {
            operation_id: format!("{}_{}", method.as_upper(), path),
            declared_id: None,
            method,
            path: path.to_string(),
            summary: None,
            description: None,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            parameters: vec![],
            request_body: None,
            success: SuccessResponse::default(),
            responses: vec![],
            errors: vec![],
            auth: vec![],
            auth_required: false,
            pagination: None,
        }
    }

    #[test]
    fn test_header_defaults() {
        let document = SpecDocument::from_value(json!({})).unwrap();
        assert_eq!(
            render_header(&document),
            "# API Documentation\n**Version:** 1.0.0\n\n## Base URLs\n  - (not specified)\n"
        );
    }

    #[test]
    fn test_header_servers_and_auth() {
        let document = SpecDocument::from_value(json!({
            "info": {"title": "Shop", "version": "2.0", "description": "d".repeat(501)},
            "servers": [
                {"url": "https://a.io", "description": "Production"},
                {"url": "https://b.io"}
            ],
            "components": {"securitySchemes": {
                "key": {"type": "apiKey", "in": "query", "name": "api_key"},
                "jwt": {"type": "http", "scheme": "bearer"},
                "oauth": {"type": "oauth2", "flows": {"clientCredentials": {}, "implicit": {}}},
                "odd": {}
            }}
        }))
        .unwrap();
        let header = render_header(&document);
        assert!(header.contains(&format!("{}...\n", "d".repeat(500))));
        assert!(header.contains("  - https://a.io — Production\n  - https://b.io\n"));
        assert!(header.contains("  - key: API Key (query: api_key)"));
        assert!(header.contains("  - jwt: HTTP BEARER"));
        assert!(header.contains("  - oauth: OAuth2 (clientCredentials, implicit)"));
        assert!(header.contains("  - odd: unknown"));
    }

    #[test]
    fn test_groups_list_every_tag_sorted() {
        let records = vec![
            record(HttpMethod::Post, "/b", &["zoo", "alpha"]),
            record(HttpMethod::Get, "/b", &["alpha"]),
            record(HttpMethod::Get, "/a", &[]),
        ];
        let groups = endpoints_by_tag(&records);
        let tags: Vec<&str> = groups.keys().copied().collect();
        assert_eq!(tags, vec!["Untagged", "alpha", "zoo"]);
        let alpha: Vec<HttpMethod> = groups["alpha"].iter().map(|r| r.method).collect();
        assert_eq!(alpha, vec![HttpMethod::Get, HttpMethod::Post]);
    }

    #[test]
    fn test_repeated_tags_listed_once() {
        let records = vec![record(HttpMethod::Get, "/t", &["t", "u", "t"])];
        assert_eq!(listing_tags(&records[0]), vec!["t", "u"]);
        assert_eq!(endpoints_by_tag(&records)["t"].len(), 1);

        let document = SpecDocument::from_value(json!({})).unwrap();
        let markdown = render_markdown(&document, &records, "https://api.example.com", 10);
        assert_eq!(markdown.matches("ENDPOINT: [GET] /t").count(), 1);
        assert_eq!(markdown.matches("- **GET** `/t`").count(), 2);
    }

    #[test]
    fn test_operation_id_line_uses_unique_id() {
        let mut rec = record(HttpMethod::Get, "/dup", &[]);
        rec.operation_id = "dup_2".to_string();
        rec.declared_id = Some("dup".to_string());
        let block = render_endpoint(&rec, "https://api.example.com");
        assert!(block.contains("\nOPERATION_ID: dup_2\n"));
    }

    #[test]
    fn test_endpoint_block_layout() {
        let mut rec = record(HttpMethod::Get, "/pets/{petId}", &["pets"]);
        rec.operation_id = "showPetById".to_string();
        rec.declared_id = Some("showPetById".to_string());
        rec.summary = Some("Info for a pet".to_string());
        rec.parameters.push(ParameterInfo {
            name: "petId".to_string(),
            location: ParamLocation::Path,
            required: true,
            description: String::new(),
            schema: json!({"type": "string"}),
            example: None,
            style: None,
            explode: None,
        });

        let block = render_endpoint(&rec, "https://api.petstore.io/v1");
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[0], "=".repeat(80));
        assert_eq!(lines[1], "ENDPOINT: [GET] /pets/{petId}");
        assert_eq!(lines[2], "OPERATION_ID: showPetById");
        assert_eq!(lines[3], "BASE_URL: https://api.petstore.io/v1");
        assert_eq!(lines[4], "TAGS: pets");
        assert_eq!(lines[5], "SUMMARY: Info for a pet");
        assert_eq!(lines[6], "AUTH: None");
        assert!(block.contains("REQUEST\n  Path params:\n  - petId (string, required)\n"));
        assert!(block.contains("RESPONSES\n  none\n"));
        assert!(block.contains("curl -X GET \\\n  \"https://api.petstore.io/v1/pets/123\""));
        assert!(block.ends_with(&format!("{}\n", "=".repeat(80))));
    }

    #[test]
    fn test_summary_and_description_rules() {
        let mut rec = record(HttpMethod::Get, "/x", &[]);
        rec.description = Some("Short text".to_string());
        let block = render_endpoint(&rec, "https://api.example.com");
        assert!(block.contains("SUMMARY: Short text\n"));
        assert!(!block.contains("DESCRIPTION:"));
        assert!(block.contains("TAGS: none\n"));

        rec.summary = Some("Sum".to_string());
        rec.description = Some("y".repeat(201));
        let block = render_endpoint(&rec, "https://api.example.com");
        assert!(block.contains(&format!("DESCRIPTION: {}... (see full docs)\n", "y".repeat(200))));

        rec.summary = None;
        rec.description = None;
        let block = render_endpoint(&rec, "https://api.example.com");
        assert!(block.contains("SUMMARY: No description\n"));
    }

    #[test]
    fn test_details_use_first_tag_only() {
        let document = SpecDocument::from_value(json!({})).unwrap();
        let records = vec![record(HttpMethod::Get, "/shared", &["b", "a"])];
        let markdown = render_markdown(&document, &records, "https://api.example.com", 10);
        assert_eq!(markdown.matches("ENDPOINT: [GET] /shared").count(), 1);
        assert!(markdown.contains("### Tag: b\n"));
        assert!(!markdown.contains("### Tag: a\n"));
        assert!(markdown.contains("### a\n- **GET** `/shared` — "));
        assert!(!markdown.contains("COMPONENTS APPENDIX"));
    }

    #[test]
    fn test_schema_entry() {
        let schema = json!({
            "type": "object",
            "description": "A pet",
            "required": ["id"],
            "properties": {"id": {"type": "integer"}}
        });
        assert_eq!(
            render_schema("Pet", &schema),
            "### Pet\nType: object\nDescription: A pet\n\n- id: integer (required)\n"
        );
    }

    #[test]
    fn test_resolved_schemas_sorted_and_dereferenced() {
        let document = SpecDocument::from_value(json!({
            "components": {"schemas": {
                "Order": {"type": "object", "properties": {"customer": {"$ref": "#/components/schemas/Customer"}}},
                "Customer": {"type": "object", "properties": {"name": {"type": "string"}}}
            }}
        }))
        .unwrap();
        let schemas = resolved_schemas(&document, 10);
        assert_eq!(schemas[0].0, "Customer");
        assert_eq!(schemas[1].0, "Order");
        assert!(!schemas[1].1.to_string().contains("$ref"));
        assert_eq!(schemas[1].1["properties"]["customer"]["properties"]["name"]["type"], "string");
    }
}
