//! Progressive-disclosure view
//!
//! A small manifest up front; tag listings, endpoint blocks, and schemas
//! fetched by key afterwards.

use crate::markdown::{endpoints_by_tag, render_endpoint, render_header, render_schema};
use apiingest_common::OperationRecord;
use apiingest_parser::text::truncate_with;
use apiingest_parser::SpecDocument;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The four-key chunked document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkedDocs {
    /// Header plus a compact tag index
    pub manifest: String,
    /// Tag → endpoint listing with operation ids
    pub tags: IndexMap<String, String>,
    /// Operation id → endpoint block, in traversal order
    pub endpoints: IndexMap<String, String>,
    /// Schema name → rendered schema, sorted by name
    pub schemas: IndexMap<String, String>,
}

impl ChunkedDocs {
    pub fn build(
        document: &SpecDocument,
        records: &[OperationRecord],
        base_url: &str,
        schemas: &[(String, Value)],
    ) -> Self {
        let groups = endpoints_by_tag(records);

        let mut manifest = render_header(document);
        manifest.push_str("\n## Tags\n\n");
        if groups.is_empty() {
            manifest.push_str("- (no endpoints)\n");
        }
        for (tag, group) in &groups {
            let noun = if group.len() == 1 { "endpoint" } else { "endpoints" };
            manifest.push_str(&format!("- {} ({} {})\n", tag, group.len(), noun));
        }
        if !schemas.is_empty() {
            manifest.push_str(&format!("\nShared schemas: {}\n", schemas.len()));
        }

        let tags = groups
            .iter()
            .map(|(tag, group)| {
                let mut listing = format!("## {}\n\n", tag);
                for record in group {
                    let summary = record
                        .summary
                        .as_deref()
                        .or(record.description.as_deref())
                        .unwrap_or("");
                    listing.push_str(&format!(
                        "- **{}** `{}` ({}) — {}\n",
                        record.method.as_upper(),
                        record.path,
                        record.operation_id,
                        truncate_with(summary, 60, "...")
                    ));
                }
                (tag.to_string(), listing)
            })
            .collect();

        let endpoints = records
            .iter()
            .map(|record| (record.operation_id.clone(), render_endpoint(record, base_url)))
            .collect();

        let schemas = schemas
            .iter()
            .map(|(name, schema)| (name.clone(), render_schema(name, schema)))
            .collect();

        Self {
            manifest,
            tags,
            endpoints,
            schemas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiingest_common::{HttpMethod, SuccessResponse};
    use serde_json::json;

    fn record(id: &str, path: &str, tags: &[&str]) -> OperationRecord {
        OperationRecord {
            operation_id: id.to_string(),
            declared_id: Some(id.to_string()),
            method: HttpMethod::Get,
            path: path.to_string(),
            summary: Some(format!("Summary of {}", id)),
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
    fn test_build_keys_and_listings() {
        let document = SpecDocument::from_value(json!({"info": {"title": "Zoo"}})).unwrap();
        let records = vec![
            record("listAnimals", "/animals", &["animals"]),
            record("getKeeper", "/keepers/{id}", &["keepers", "animals"]),
        ];
        let docs = ChunkedDocs::build(&document, &records, "https://zoo.io", &[]);

        assert!(docs.manifest.starts_with("# Zoo\n"));
        assert!(docs.manifest.contains("- animals (2 endpoints)\n"));
        assert!(docs.manifest.contains("- keepers (1 endpoint)\n"));

        assert!(docs.tags["animals"].contains("(listAnimals)"));
        assert!(docs.tags["animals"].contains("(getKeeper)"));

        let keys: Vec<&String> = docs.endpoints.keys().collect();
        assert_eq!(keys, vec!["listAnimals", "getKeeper"]);
        assert!(docs.endpoints["getKeeper"].contains("BASE_URL: https://zoo.io"));
        assert!(docs.schemas.is_empty());
    }

    #[test]
    fn test_serializes_to_four_keys() {
        let document = SpecDocument::from_value(json!({})).unwrap();
        let schemas = vec![("Pet".to_string(), json!({"type": "object"}))];
        let docs = ChunkedDocs::build(&document, &[], "https://api.example.com", &schemas);

        let value = serde_json::to_value(&docs).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["manifest", "tags", "endpoints", "schemas"]);
        assert!(docs.manifest.contains("- (no endpoints)"));
        assert!(docs.schemas["Pet"].starts_with("### Pet\nType: object\n"));
    }
}
