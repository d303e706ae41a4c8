//! Converts an OpenAPI document into operation records

use super::parser::SpecDocument;
use super::types::{decode, MediaType, Operation, Parameter, RefOr, RequestBody, Response};
use crate::naming::{NamingStyle, OperationNamer};
use crate::pagination::detect_pagination;
use crate::resolver::{ResolveMode, Resolver};
use crate::schema::flatten_allof;
use crate::security::{describe_requirements, effective_security};
use crate::text::truncate_chars;
use apiingest_common::{
    ConvertOptions, ErrorResponse, HttpMethod, MediaContent, OperationRecord, ParamLocation,
    ParameterInfo, RequestBodyInfo, ResponseInfo, SuccessResponse,
};
use serde_json::{Map, Value};

const PREFERRED_BODY_TYPES: [&str; 3] = [
    "application/json",
    "multipart/form-data",
    "application/x-www-form-urlencoded",
];
const SUCCESS_CODES: [&str; 4] = ["200", "201", "202", "204"];

/// How a family of views extracts operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub mode: ResolveMode,
    pub naming: NamingStyle,
    /// Visit paths in lexicographic order instead of document order
    pub sort_paths: bool,
}

impl ExtractOptions {
    /// Human-readable views: shallow references, verbatim ids, document order
    pub fn documentation(options: &ConvertOptions) -> Self {
        Self {
            mode: ResolveMode::Shallow {
                max_depth: options.inline_depth,
            },
            naming: NamingStyle::Verbatim,
            sort_paths: false,
        }
    }

    /// Tool schemas: deep references, verbatim ids, document order
    pub fn tool_schemas(options: &ConvertOptions) -> Self {
        Self {
            mode: ResolveMode::Deep {
                max_depth: options.resolve_depth,
            },
            naming: NamingStyle::Verbatim,
            sort_paths: false,
        }
    }

    /// Agent bundle: deep references, sanitized ids, sorted paths
    pub fn bundle(options: &ConvertOptions) -> Self {
        Self {
            mode: ResolveMode::Deep {
                max_depth: options.resolve_depth,
            },
            naming: NamingStyle::Sanitized,
            sort_paths: true,
        }
    }
}

/// Drives the resolver over every operation of a document
pub struct OperationExtractor<'a> {
    document: &'a SpecDocument,
    resolver: Resolver<'a>,
    namer: OperationNamer,
    sort_paths: bool,
}

impl<'a> OperationExtractor<'a> {
    pub fn new(document: &'a SpecDocument, options: ExtractOptions) -> Self {
        Self {
            document,
            resolver: Resolver::new(document, options.mode),
            namer: OperationNamer::new(options.naming),
            sort_paths: options.sort_paths,
        }
    }

    /// Resolver used for extraction, with its caches and used-schema set
    pub fn resolver(&mut self) -> &mut Resolver<'a> {
        &mut self.resolver
    }

    pub fn into_resolver(self) -> Resolver<'a> {
        self.resolver
    }

    /// Extract one record per (path, method)
    pub fn extract_all(&mut self) -> Vec<OperationRecord> {
        let mut path_items = self.document.path_items();
        if self.sort_paths {
            path_items.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let mut records = Vec::new();
        for (path, item) in &path_items {
            for method in HttpMethod::ALL {
                if let Some(operation) = item.operation(method) {
                    records.push(self.extract_operation(path, method, &item.parameters, operation));
                }
            }
        }

        tracing::debug!("Extracted {} operations", records.len());
        records
    }

    fn extract_operation(
        &mut self,
        path: &str,
        method: HttpMethod,
        shared_params: &[RefOr<Parameter>],
        operation: &Operation,
    ) -> OperationRecord {
        let operation_id = self.namer.assign(
            operation.operation_id.as_deref(),
            method,
            path,
            &operation.tags,
        );

        let parameters = self.merge_parameters(shared_params, &operation.parameters);
        let request_body = operation
            .request_body
            .as_ref()
            .and_then(|slot| self.request_body(slot));
        let responses = self.responses(&operation.responses);
        let success = self.success_response(&responses);
        let errors = error_responses(&responses);

        let requirements = effective_security(self.document, operation);
        let auth = describe_requirements(self.document, &requirements);
        let pagination = detect_pagination(&parameters, &success.schema);

        OperationRecord {
            operation_id,
            declared_id: operation.operation_id.clone().filter(|id| !id.is_empty()),
            method,
            path: path.to_string(),
            summary: operation.summary.clone().filter(|text| !text.is_empty()),
            description: operation.description.clone().filter(|text| !text.is_empty()),
            tags: operation.tags.clone(),
            parameters,
            request_body,
            success,
            responses,
            errors,
            auth,
            auth_required: !requirements.is_empty(),
            pagination,
        }
    }

    /// Path-level parameters first; an operation-level parameter replaces a
    /// path-level one of the same name in place
    fn merge_parameters(
        &mut self,
        shared: &[RefOr<Parameter>],
        own: &[RefOr<Parameter>],
    ) -> Vec<ParameterInfo> {
        let mut merged: Vec<(ParameterInfo, bool)> = Vec::new();

        for (slot, from_operation) in shared
            .iter()
            .map(|slot| (slot, false))
            .chain(own.iter().map(|slot| (slot, true)))
        {
            let Some(param) = self.parameter(slot) else {
                continue;
            };

            match merged.iter().position(|(existing, _)| existing.name == param.name) {
                Some(index) if from_operation && !merged[index].1 => {
                    merged[index] = (param, true);
                }
                Some(_) => {}
                None => merged.push((param, from_operation)),
            }
        }

        merged.into_iter().map(|(param, _)| param).collect()
    }

    fn parameter(&mut self, slot: &RefOr<Parameter>) -> Option<ParameterInfo> {
        let param: Parameter = self.resolver.resolve_ref_or(slot);
        let Some(name) = param.name.filter(|name| !name.is_empty()) else {
            tracing::debug!("Skipping parameter without a name");
            return None;
        };

        let location = ParamLocation::parse(param.location.as_deref());
        let schema = match &param.schema {
            Some(schema) => self.resolver.resolve(schema),
            None => Value::Object(Map::new()),
        };
        let example = param.example.or_else(|| schema.get("example").cloned());

        Some(ParameterInfo {
            name,
            required: param.required.unwrap_or(false) || location == ParamLocation::Path,
            location,
            description: param.description.unwrap_or_default(),
            schema,
            example,
            style: param.style,
            explode: param.explode,
        })
    }

    fn request_body(&mut self, slot: &RefOr<RequestBody>) -> Option<RequestBodyInfo> {
        let body: RequestBody = self.resolver.resolve_ref_or(slot);
        let content = self.media_entries(&body.content);

        let content_type = PREFERRED_BODY_TYPES
            .iter()
            .find(|preferred| content.iter().any(|media| media.media_type == **preferred))
            .map(|preferred| preferred.to_string())
            .or_else(|| content.first().map(|media| media.media_type.clone()))?;

        let declared = content
            .iter()
            .find(|media| media.media_type == content_type)
            .map(|media| media.schema.clone())
            .unwrap_or_default();
        let schema = flatten_allof(&declared, &mut self.resolver);

        Some(RequestBodyInfo {
            required: body.required.unwrap_or(false),
            description: body.description.unwrap_or_default(),
            content,
            content_type,
            schema,
        })
    }

    fn responses(&mut self, responses: &Map<String, Value>) -> Vec<ResponseInfo> {
        responses
            .iter()
            .map(|(status, node)| {
                let slot: Option<RefOr<Response>> = decode(node);
                let response = slot
                    .map(|slot| self.resolver.resolve_ref_or(&slot))
                    .unwrap_or_default();
                ResponseInfo {
                    status: status.clone(),
                    description: response.description.unwrap_or_default(),
                    content: self.media_entries(&response.content),
                }
            })
            .collect()
    }

    fn success_response(&mut self, responses: &[ResponseInfo]) -> SuccessResponse {
        let Some((code, response)) = SUCCESS_CODES.iter().find_map(|code| {
            responses
                .iter()
                .find(|response| response.status == *code)
                .map(|response| (*code, response))
        }) else {
            return SuccessResponse::default();
        };

        let status = code.parse().unwrap_or(200);
        let chosen = response
            .content
            .iter()
            .find(|media| media.media_type == "application/json")
            .or_else(|| response.content.first());

        match chosen {
            Some(media) if status != 204 => SuccessResponse {
                status,
                media_type: media.media_type.clone(),
                media_types: response
                    .content
                    .iter()
                    .map(|media| media.media_type.clone())
                    .collect(),
                schema: flatten_allof(&media.schema, &mut self.resolver),
            },
            _ => SuccessResponse {
                status,
                ..SuccessResponse::default()
            },
        }
    }

    fn media_entries(&mut self, content: &Map<String, Value>) -> Vec<MediaContent> {
        content
            .iter()
            .map(|(media_type, node)| {
                let media: MediaType = decode(node);
                let schema = match &media.schema {
                    Some(schema) => self.resolver.resolve(schema),
                    None => Value::Object(Map::new()),
                };
                MediaContent {
                    media_type: media_type.clone(),
                    schema,
                    example: media.example,
                }
            })
            .collect()
    }
}

/// 4xx/5xx responses named by the first sentence of their description
fn error_responses(responses: &[ResponseInfo]) -> Vec<ErrorResponse> {
    responses
        .iter()
        .filter(|response| response.status.starts_with('4') || response.status.starts_with('5'))
        .map(|response| {
            let name = if response.description.is_empty() {
                format!("Error {}", response.status)
            } else {
                response
                    .description
                    .split('.')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            };
            ErrorResponse {
                status: response.status.clone(),
                name: truncate_chars(&name, 80).to_string(),
            }
        })
        .collect()
}

/// Extract every operation of `document` with a fresh resolver
pub fn extract_operations(document: &SpecDocument, options: ExtractOptions) -> Vec<OperationRecord> {
    OperationExtractor::new(document, options).extract_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiingest_common::{AuthDescriptor, Pagination};
    use serde_json::json;

    fn extract(value: Value) -> Vec<OperationRecord> {
        let document = SpecDocument::from_value(value).unwrap();
        extract_operations(
            &document,
            ExtractOptions::tool_schemas(&ConvertOptions::default()),
        )
    }

    #[test]
    fn test_path_param_required_without_flag() {
        let records = extract(json!({
            "paths": {"/pets/{petId}": {"get": {
                "parameters": [{"name": "petId", "in": "path", "schema": {"type": "string"}}]
            }}}
        }));
        assert!(records[0].parameters[0].required);
        assert_eq!(records[0].operation_id, "GET_pets_petId");
        assert!(records[0].declared_id.is_none());
    }

    #[test]
    fn test_operation_params_override_path_params() {
        let records = extract(json!({
            "paths": {"/items/{id}": {
                "parameters": [
                    {"name": "id", "in": "path", "description": "shared"},
                    {"name": "verbose", "in": "query"}
                ],
                "get": {"parameters": [
                    {"name": "id", "in": "path", "description": "own"},
                    {"name": "id", "in": "query", "description": "duplicate"}
                ]}
            }}
        }));
        let params = &records[0].parameters;
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "id");
        assert_eq!(params[0].description, "own");
        assert_eq!(params[1].name, "verbose");
    }

    #[test]
    fn test_ref_parameters_resolved() {
        let records = extract(json!({
            "components": {"parameters": {"Limit": {
                "name": "limit", "in": "query", "required": true,
                "description": "Max items", "schema": {"type": "integer"}
            }}},
            "paths": {"/items": {"get": {"parameters": [{"$ref": "#/components/parameters/Limit"}]}}}
        }));
        let param = &records[0].parameters[0];
        assert_eq!(param.name, "limit");
        assert!(param.required);
        assert_eq!(param.schema_type(), "integer");
        assert_eq!(param.description, "Max items");
    }

    #[test]
    fn test_request_body_prefers_json() {
        let records = extract(json!({
            "paths": {"/upload": {"post": {"requestBody": {
                "required": true,
                "content": {
                    "text/plain": {"schema": {"type": "string"}},
                    "multipart/form-data": {"schema": {"type": "object"}},
                    "application/json": {"schema": {"type": "object", "properties": {"a": {"type": "string"}}}}
                }
            }}}}
        }));
        let body = records[0].request_body.as_ref().unwrap();
        assert_eq!(body.content_type, "application/json");
        assert!(body.required);
        assert_eq!(
            body.content_types(),
            vec!["text/plain", "multipart/form-data", "application/json"]
        );
    }

    #[test]
    fn test_request_body_falls_back_to_first() {
        let records = extract(json!({
            "paths": {"/upload": {"put": {"requestBody": {
                "content": {"application/octet-stream": {}, "text/plain": {}}
            }}}}
        }));
        let body = records[0].request_body.as_ref().unwrap();
        assert_eq!(body.content_type, "application/octet-stream");
        assert_eq!(body.schema, json!({}));
    }

    #[test]
    fn test_allof_body_flattened_but_declared_kept() {
        let records = extract(json!({
            "components": {"schemas": {"Base": {"type": "object", "properties": {"id": {"type": "string"}}}}},
            "paths": {"/items": {"post": {"requestBody": {"content": {"application/json": {"schema": {
                "allOf": [{"$ref": "#/components/schemas/Base"}, {"properties": {"extra": {"type": "string"}}}]
            }}}}}}}
        }));
        let body = records[0].request_body.as_ref().unwrap();
        assert!(body.schema["properties"]["extra"].is_object());
        assert!(body.declared_schema().unwrap().get("properties").is_none());
    }

    #[test]
    fn test_success_response_selection() {
        let records = extract(json!({
            "paths": {
                "/a": {"post": {"responses": {
                    "400": {"description": "Bad request. Check input."},
                    "201": {"description": "Created", "content": {"application/xml": {"schema": {"type": "string"}}}}
                }}},
                "/b": {"delete": {"responses": {"204": {"description": "Gone"}}}},
                "/c": {"get": {"responses": {"default": {"description": "whatever"}}}}
            }
        }));

        assert_eq!(records[0].success.status, 201);
        assert_eq!(records[0].success.media_type, "application/xml");
        assert_eq!(records[0].success.schema, json!({"type": "string"}));
        assert_eq!(records[0].errors[0].name, "Bad request");

        assert_eq!(records[1].success.status, 204);
        assert_eq!(records[1].success.schema, json!({"type": "null"}));
        assert!(records[1].success.media_types.is_empty());

        assert_eq!(records[2].success, SuccessResponse::default());
    }

    #[test]
    fn test_error_names() {
        let long = "x".repeat(100);
        let records = extract(json!({
            "paths": {"/a": {"get": {"responses": {
                "404": {"description": ""},
                "500": {"description": long},
                "4XX": {"description": "Client error"}
            }}}}
        }));
        let errors = &records[0].errors;
        assert_eq!(errors[0].name, "Error 404");
        assert_eq!(errors[1].name.chars().count(), 80);
        assert_eq!(errors[2].status, "4XX");
    }

    #[test]
    fn test_response_refs_resolved() {
        let records = extract(json!({
            "components": {"responses": {"NotFound": {"description": "Not found. Sorry."}}},
            "paths": {"/a": {"get": {"responses": {"404": {"$ref": "#/components/responses/NotFound"}}}}}
        }));
        assert_eq!(records[0].errors[0].name, "Not found");
        assert_eq!(records[0].responses[0].description, "Not found. Sorry.");
    }

    #[test]
    fn test_security_override_and_inheritance() {
        let records = extract(json!({
            "security": [{"bearerAuth": []}],
            "components": {"securitySchemes": {"bearerAuth": {"type": "http", "scheme": "bearer"}}},
            "paths": {
                "/public": {"get": {"security": []}},
                "/private": {"get": {}}
            }
        }));
        assert!(records[0].auth.is_empty());
        assert!(!records[0].auth_required);
        assert_eq!(records[0].auth_summary(), "None");

        assert!(records[1].auth_required);
        assert_eq!(
            records[1].auth,
            vec![AuthDescriptor::Http {
                scheme: "bearer".to_string()
            }]
        );
    }

    #[test]
    fn test_pagination_attached() {
        let records = extract(json!({
            "paths": {"/items": {"get": {"parameters": [
                {"name": "offset", "in": "query"}
            ]}}}
        }));
        assert!(matches!(
            records[0].pagination,
            Some(Pagination::LimitOffset { .. })
        ));
    }

    #[test]
    fn test_bundle_sorts_paths_and_sanitizes() {
        let document = SpecDocument::from_value(json!({
            "paths": {
                "/zebras": {"get": {"operationId": "List-Zebras"}},
                "/apes": {"get": {"tags": ["Apes"]}}
            }
        }))
        .unwrap();
        let records = extract_operations(
            &document,
            ExtractOptions::bundle(&ConvertOptions::default()),
        );
        let ids: Vec<&str> = records.iter().map(|r| r.operation_id.as_str()).collect();
        assert_eq!(ids, vec!["apes_get_apes", "list_zebras"]);
    }

    #[test]
    fn test_method_order_within_path() {
        let records = extract(json!({
            "paths": {"/x": {"delete": {}, "get": {}, "post": {}}}
        }));
        let methods: Vec<HttpMethod> = records.iter().map(|r| r.method).collect();
        assert_eq!(
            methods,
            vec![HttpMethod::Get, HttpMethod::Post, HttpMethod::Delete]
        );
    }
}
