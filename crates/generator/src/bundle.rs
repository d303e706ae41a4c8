//! Three-artifact agent bundle
//!
//! - `tools.json`: machine schema with HTTP binding metadata
//! - `docs.md`: the same data as prose, rendered from a template
//! - `chunks.jsonl`: one retrieval chunk per operation

use crate::examples::{bundle_curl, synthesize_response, CurlArg};
use crate::sink::ArtifactSink;
use apiingest_common::{
    ConvertOptions, ErrorResponse, IngestError, OperationRecord, Pagination, Result,
};
use apiingest_parser::schema::schema_type;
use apiingest_parser::text::truncate_chars;
use apiingest_parser::{Resolver, SpecDocument};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};
use tera::{Context, Tera};

pub const TOOLS_FILE: &str = "tools.json";
pub const DOCS_FILE: &str = "docs.md";
pub const CHUNKS_FILE: &str = "chunks.jsonl";

const JSON_SCHEMA_DRAFT: &str = "http://json-schema.org/draft-07/schema#";
const CONSTRAINT_KEYS: [&str; 7] = [
    "minimum",
    "maximum",
    "minLength",
    "maxLength",
    "pattern",
    "enum",
    "default",
];
const CHUNK_LIMIT: usize = 800;

static UNTYPED: Value = Value::Null;

/// API-level authentication, taken from the first usable security scheme
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ApiAuth {
    #[serde(rename = "apiKey")]
    ApiKey {
        #[serde(rename = "in")]
        location: String,
        name: String,
        format: String,
    },
    #[serde(rename = "bearer")]
    Bearer { header: String, format: String },
    #[serde(rename = "basic")]
    Basic { header: String, format: String },
    #[serde(rename = "oauth2")]
    OAuth2 {
        flows: Vec<String>,
        oauth2_scopes: Vec<String>,
    },
    #[serde(rename = "none")]
    None,
}

impl ApiAuth {
    pub fn from_document(document: &SpecDocument) -> Self {
        for (_, scheme) in document.security_schemes() {
            match scheme.scheme_type.as_deref() {
                Some("apiKey") => {
                    return ApiAuth::ApiKey {
                        location: scheme.location.unwrap_or_else(|| "header".to_string()),
                        name: scheme.name.unwrap_or_else(|| "X-API-Key".to_string()),
                        format: "${API_KEY}".to_string(),
                    }
                }
                Some("http") => {
                    let http = scheme
                        .scheme
                        .as_deref()
                        .unwrap_or("bearer")
                        .to_lowercase();
                    match http.as_str() {
                        "bearer" => {
                            return ApiAuth::Bearer {
                                header: "Authorization".to_string(),
                                format: "Bearer ${TOKEN}".to_string(),
                            }
                        }
                        "basic" => {
                            return ApiAuth::Basic {
                                header: "Authorization".to_string(),
                                format: "Basic ${CREDENTIALS}".to_string(),
                            }
                        }
                        _ => {}
                    }
                }
                Some("oauth2") => {
                    return ApiAuth::OAuth2 {
                        flows: scheme.flows.keys().cloned().collect(),
                        oauth2_scopes: scheme.flow_scopes().into_iter().take(10).collect(),
                    }
                }
                _ => {}
            }
        }
        ApiAuth::None
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiAuth::ApiKey { .. } => "apiKey",
            ApiAuth::Bearer { .. } => "bearer",
            ApiAuth::Basic { .. } => "basic",
            ApiAuth::OAuth2 { .. } => "oauth2",
            ApiAuth::None => "none",
        }
    }

    /// Header line for curl examples; only bearer and header API keys have one
    pub fn curl_header(&self) -> Option<String> {
        match self {
            ApiAuth::Bearer { header, .. } => Some(format!("-H \"{}: Bearer $TOKEN\"", header)),
            ApiAuth::ApiKey { location, name, .. } if location == "header" => {
                Some(format!("-H \"{}: $API_KEY\"", name))
            }
            _ => None,
        }
    }
}

/// Draft-07 schema of a tool's parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSchema {
    #[serde(rename = "$schema")]
    pub dialect: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// Where one argument goes in the HTTP request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgBinding {
    #[serde(rename = "in")]
    pub location: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBodyBinding {
    pub content_type: String,
    pub required: bool,
    pub schema: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentTypes {
    pub request: Vec<String>,
    pub response: Vec<String>,
}

/// The `x-http` block of a tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpBinding {
    pub method: String,
    pub path_template: String,
    pub arg_mapping: IndexMap<String, ArgBinding>,
    pub request_body: Option<RequestBodyBinding>,
    pub success_code: u16,
    pub response_pointer: String,
    pub auth_required: bool,
    pub content_types: ContentTypes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolExamples {
    pub curl: String,
    pub response_excerpt: String,
}

/// One tool of `tools.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentTool {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
    pub returns: Value,
    #[serde(rename = "x-http")]
    pub http: HttpBinding,
    pub errors: Vec<ErrorResponse>,
    pub examples: ToolExamples,
    /// Grouping label for docs and chunks
    #[serde(skip)]
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimits {
    pub headers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Components {
    pub schemas: IndexMap<String, Value>,
}

/// Root of `tools.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentApi {
    pub api_name: String,
    pub version: String,
    pub servers: Vec<String>,
    pub auth: ApiAuth,
    pub common_headers: Vec<String>,
    pub rate_limits: RateLimits,
    pub tools: Vec<AgentTool>,
    pub components: Components,
}

/// One line of `chunks.jsonl`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub id: String,
    pub tag: String,
    pub method: String,
    pub path: String,
    pub text: String,
    pub meta: ChunkMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkMeta {
    pub required: Vec<String>,
    pub auth: bool,
}

/// The generated bundle, ready to write
#[derive(Debug, Clone, PartialEq)]
pub struct AgentBundle {
    pub api: AgentApi,
    pub docs: String,
    pub chunks: String,
}

impl AgentBundle {
    /// Pretty-printed `tools.json`
    pub fn tools_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.api)?)
    }

    /// Chunk lines as written to `chunks.jsonl`
    pub fn chunk_lines(&self) -> impl Iterator<Item = &str> {
        self.chunks.lines().filter(|line| !line.is_empty())
    }

    /// Hand all three artifacts to `sink`
    pub fn write_to(&self, sink: &mut dyn ArtifactSink) -> Result<()> {
        sink.write_artifact(TOOLS_FILE, self.tools_json()?.as_bytes())?;
        sink.write_artifact(DOCS_FILE, self.docs.as_bytes())?;
        sink.write_artifact(CHUNKS_FILE, self.chunks.as_bytes())?;
        tracing::info!(
            "Wrote {}, {}, {} ({} tools)",
            TOOLS_FILE,
            DOCS_FILE,
            CHUNKS_FILE,
            self.api.tools.len()
        );
        Ok(())
    }
}

fn server_urls(document: &SpecDocument, options: &ConvertOptions) -> Vec<String> {
    let urls: Vec<String> = document
        .servers()
        .into_iter()
        .filter_map(|server| server.url)
        .filter(|url| !url.is_empty())
        .collect();
    if urls.is_empty() {
        vec![options.fallback_base_url.clone()]
    } else {
        urls
    }
}

fn tool_description(record: &OperationRecord) -> String {
    let text = record
        .summary
        .clone()
        .or_else(|| {
            record
                .description
                .as_deref()
                .and_then(|text| text.split('.').next())
                .map(|sentence| sentence.trim().to_string())
                .filter(|sentence| !sentence.is_empty())
        })
        .unwrap_or_else(|| format!("{} {}", record.method.as_upper(), record.path));
    truncate_chars(&text, 160).to_string()
}

fn parameter_schema(record: &OperationRecord) -> ParameterSchema {
    let mut properties = IndexMap::new();
    let mut required = Vec::new();

    for param in &record.parameters {
        let description = if param.description.is_empty() {
            format!("{} parameter", param.name)
        } else {
            truncate_chars(&param.description, 200).to_string()
        };
        let mut property = serde_json::Map::new();
        property.insert("type".to_string(), json!(param.schema_type()));
        property.insert("description".to_string(), json!(description));
        for key in CONSTRAINT_KEYS {
            if let Some(value) = param.schema.get(key) {
                property.insert(key.to_string(), value.clone());
            }
        }
        properties.insert(param.name.clone(), Value::Object(property));
        if param.required && !required.contains(&param.name) {
            required.push(param.name.clone());
        }
    }

    ParameterSchema {
        dialect: JSON_SCHEMA_DRAFT.to_string(),
        kind: "object".to_string(),
        properties,
        required,
    }
}

fn http_binding(record: &OperationRecord) -> HttpBinding {
    let mut arg_mapping: IndexMap<String, ArgBinding> = record
        .parameters
        .iter()
        .map(|param| {
            (
                param.name.clone(),
                ArgBinding {
                    location: param.location.as_str().to_string(),
                    name: param.name.clone(),
                    style: param.style.clone(),
                    explode: param.explode,
                },
            )
        })
        .collect();

    let request_body = record.request_body.as_ref().map(|body| {
        if schema_type(&body.schema) == "object" {
            if let Some(props) = body.schema.get("properties").and_then(Value::as_object) {
                for name in props.keys() {
                    arg_mapping.entry(name.clone()).or_insert_with(|| ArgBinding {
                        location: "body".to_string(),
                        name: name.clone(),
                        style: None,
                        explode: None,
                    });
                }
            }
        }
        RequestBodyBinding {
            content_type: body.content_type.clone(),
            required: body.required,
            schema: body.schema.clone(),
        }
    });

    HttpBinding {
        method: record.method.as_upper().to_string(),
        path_template: record.path.clone(),
        arg_mapping,
        request_body,
        success_code: record.success.status,
        response_pointer: record.success.media_type.clone(),
        auth_required: record.auth_required,
        content_types: ContentTypes {
            request: record
                .request_body
                .as_ref()
                .map(|body| body.content_types())
                .unwrap_or_default(),
            response: record.success.media_types.clone(),
        },
        pagination: record.pagination.clone(),
    }
}

fn agent_tool(record: &OperationRecord, base_url: &str, auth: &ApiAuth) -> AgentTool {
    let parameters = parameter_schema(record);
    let http = http_binding(record);

    let args: Vec<CurlArg<'_>> = http
        .arg_mapping
        .iter()
        .map(|(name, binding)| CurlArg {
            name,
            location: &binding.location,
            schema: parameters.properties.get(name).unwrap_or(&UNTYPED),
        })
        .collect();
    let auth_header = if record.auth_required {
        auth.curl_header()
    } else {
        None
    };
    let curl = bundle_curl(base_url, record.method, &record.path, &args, auth_header);

    AgentTool {
        name: record.operation_id.clone(),
        description: tool_description(record),
        returns: record.success.schema.clone(),
        errors: record.errors.clone(),
        examples: ToolExamples {
            curl,
            response_excerpt: synthesize_response(&record.success.schema).to_string(),
        },
        tag: record.primary_tag().unwrap_or("api").to_string(),
        parameters,
        http,
    }
}

/// Build `tools.json` content from extracted records
///
/// `resolver` must be the one used for extraction, so that its used-schema
/// set covers every reference the tools reached.
pub fn build_api(
    document: &SpecDocument,
    options: &ConvertOptions,
    records: &[OperationRecord],
    resolver: &mut Resolver<'_>,
) -> AgentApi {
    let servers = server_urls(document, options);
    let base_url = servers
        .get(options.server_index)
        .or_else(|| servers.first())
        .cloned()
        .unwrap_or_else(|| options.fallback_base_url.clone());
    let auth = ApiAuth::from_document(document);

    let tools = records
        .iter()
        .map(|record| agent_tool(record, &base_url, &auth))
        .collect();

    let mut schemas = IndexMap::new();
    let used: Vec<String> = resolver.used_schemas().iter().cloned().collect();
    if let Some(declared) = document.schemas() {
        for name in used {
            if let Some(schema) = declared.get(&name) {
                schemas.insert(name, resolver.resolve(schema));
            }
        }
    }

    AgentApi {
        api_name: document
            .info()
            .title
            .unwrap_or_else(|| "API".to_string()),
        version: document.version(),
        servers,
        auth,
        common_headers: Vec::new(),
        rate_limits: RateLimits {
            headers: vec!["X-RateLimit-Remaining".to_string(), "Retry-After".to_string()],
        },
        tools,
        components: Components { schemas },
    }
}

#[derive(Serialize)]
struct DocsAuth {
    kind: &'static str,
    header: String,
    format: String,
    location: String,
    name: String,
    flows: Vec<String>,
}

impl DocsAuth {
    fn new(auth: &ApiAuth) -> Self {
        let mut docs = DocsAuth {
            kind: auth.kind(),
            header: String::new(),
            format: String::new(),
            location: String::new(),
            name: String::new(),
            flows: Vec::new(),
        };
        match auth {
            ApiAuth::ApiKey {
                location, name, ..
            } => {
                docs.location = location.clone();
                docs.name = name.clone();
            }
            ApiAuth::Bearer { header, format } | ApiAuth::Basic { header, format } => {
                docs.header = header.clone();
                docs.format = format.clone();
            }
            ApiAuth::OAuth2 { flows, .. } => docs.flows = flows.clone(),
            ApiAuth::None => {}
        }
        docs
    }
}

#[derive(Serialize)]
struct DocsParam {
    name: String,
    kind: String,
    description: String,
}

#[derive(Serialize)]
struct DocsError {
    status: String,
    name: String,
}

#[derive(Serialize)]
struct DocsTool {
    name: String,
    method: String,
    path: String,
    description: String,
    required: Vec<DocsParam>,
    auth_required: bool,
    pagination: Option<&'static str>,
    curl: String,
    errors: Vec<DocsError>,
}

#[derive(Serialize)]
struct DocsSection {
    tag: String,
    tools: Vec<DocsTool>,
}

fn property_text<'v>(tool: &'v AgentTool, name: &str, key: &str, default: &'v str) -> &'v str {
    tool.parameters
        .properties
        .get(name)
        .and_then(|property| property.get(key))
        .and_then(Value::as_str)
        .unwrap_or(default)
}

fn docs_tool(tool: &AgentTool) -> DocsTool {
    DocsTool {
        name: tool.name.clone(),
        method: tool.http.method.clone(),
        path: tool.http.path_template.clone(),
        description: tool.description.clone(),
        required: tool
            .parameters
            .required
            .iter()
            .map(|name| DocsParam {
                name: name.clone(),
                kind: property_text(tool, name, "type", "string").to_string(),
                description: property_text(tool, name, "description", "").to_string(),
            })
            .collect(),
        auth_required: tool.http.auth_required,
        pagination: tool.http.pagination.as_ref().map(Pagination::style),
        curl: tool.examples.curl.clone(),
        errors: tool
            .errors
            .iter()
            .take(3)
            .map(|error| DocsError {
                status: error.status.clone(),
                name: error.name.clone(),
            })
            .collect(),
    }
}

/// Render `docs.md` with the bundle template
pub fn render_docs(api: &AgentApi, tera: &Tera) -> Result<String> {
    let mut by_tag: IndexMap<&str, Vec<DocsTool>> = IndexMap::new();
    for tool in &api.tools {
        by_tag.entry(tool.tag.as_str()).or_default().push(docs_tool(tool));
    }
    by_tag.sort_keys();
    let sections: Vec<DocsSection> = by_tag
        .into_iter()
        .map(|(tag, tools)| DocsSection {
            tag: tag.to_string(),
            tools,
        })
        .collect();

    let mut context = Context::new();
    context.insert("api_name", &api.api_name);
    context.insert("version", &api.version);
    context.insert("servers", &api.servers);
    context.insert("auth", &DocsAuth::new(&api.auth));
    context.insert("rate_limit_headers", &api.rate_limits.headers);
    context.insert("sections", &sections);

    tera.render(DOCS_FILE, &context)
        .map_err(|e| IngestError::Generation(format!("Failed to render {}: {:?}", DOCS_FILE, e)))
}

fn chunk_text(tool: &AgentTool) -> String {
    let mut parts = vec![tool.description.clone()];

    if !tool.parameters.required.is_empty() {
        let shown: Vec<String> = tool
            .parameters
            .required
            .iter()
            .take(5)
            .map(|name| format!("{} ({})", name, property_text(tool, name, "type", "string")))
            .collect();
        parts.push(format!("Required params: {}.", shown.join(", ")));
    }

    let returns = match tool.returns.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        _ => schema_type(&tool.returns).to_string(),
    };
    parts.push(format!("Returns {}.", returns));

    if let Some(pagination) = &tool.http.pagination {
        parts.push(format!("Pagination: {}.", pagination.style()));
    }

    let text = parts.join(" ");
    if text.chars().count() > CHUNK_LIMIT {
        format!("{}...", truncate_chars(&text, CHUNK_LIMIT - 3))
    } else {
        text
    }
}

/// Render `chunks.jsonl`, one compact JSON object per line
pub fn render_chunks(api: &AgentApi) -> Result<String> {
    let mut lines = Vec::with_capacity(api.tools.len());
    for tool in &api.tools {
        let chunk = Chunk {
            id: tool.name.clone(),
            tag: tool.tag.clone(),
            method: tool.http.method.clone(),
            path: tool.http.path_template.clone(),
            text: chunk_text(tool),
            meta: ChunkMeta {
                required: tool.parameters.required.clone(),
                auth: tool.http.auth_required,
            },
        };
        lines.push(serde_json::to_string(&chunk)?);
    }
    Ok(lines.join("\n"))
}
