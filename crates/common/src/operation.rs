//! Operation intermediate representation
//!
//! One [`OperationRecord`] is derived per (path, method) pair of an OpenAPI
//! document. Every generator renders its own view from these records, which
//! keeps operation identity and endpoint counts aligned across artifacts.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// HTTP method of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Methods in the order they are visited inside a path item
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    /// Lower-case key used in path items (`get`, `post`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
        }
    }

    /// Upper-case form used in rendered output
    pub fn as_upper(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_upper())
    }
}

/// Where a parameter travels in the request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
    /// Any other `in` value, passed through untouched
    Other(String),
}

impl ParamLocation {
    /// Classify an `in` value; a missing value means query
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("query") => ParamLocation::Query,
            Some("path") => ParamLocation::Path,
            Some("header") => ParamLocation::Header,
            Some("cookie") => ParamLocation::Cookie,
            Some(other) => ParamLocation::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
            ParamLocation::Other(raw) => raw,
        }
    }
}

/// A resolved operation parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: String,
    /// Parameter location
    pub location: ParamLocation,
    /// Explicit `required`, or implied by a path location
    pub required: bool,
    /// Description, empty when absent
    pub description: String,
    /// Resolved parameter schema (empty object when absent)
    pub schema: Value,
    /// Parameter-level example, falling back to the schema example
    pub example: Option<Value>,
    /// Serialization style
    pub style: Option<String>,
    /// Serialization explode flag
    pub explode: Option<bool>,
}

impl ParameterInfo {
    /// JSON type of the parameter schema, `string` when absent
    pub fn schema_type(&self) -> &str {
        self.schema
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("string")
    }
}

/// One media type entry of a request body or response
#[derive(Debug, Clone, PartialEq)]
pub struct MediaContent {
    /// Media type, e.g. `application/json`
    pub media_type: String,
    /// Resolved schema (empty object when absent)
    pub schema: Value,
    /// Media-level example
    pub example: Option<Value>,
}

/// Request body of an operation
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBodyInfo {
    /// Whether the body is required
    pub required: bool,
    /// Body description, empty when absent
    pub description: String,
    /// Every declared media type, in document order
    pub content: Vec<MediaContent>,
    /// Preferred media type
    pub content_type: String,
    /// Schema of the preferred media type with `allOf` flattened
    pub schema: Value,
}

impl RequestBodyInfo {
    /// Media entry for the preferred content type
    pub fn preferred(&self) -> Option<&MediaContent> {
        self.content
            .iter()
            .find(|media| media.media_type == self.content_type)
    }

    /// Schema of the preferred media type as declared (before flattening)
    pub fn declared_schema(&self) -> Option<&Value> {
        self.preferred().map(|media| &media.schema)
    }

    /// Declared media types
    pub fn content_types(&self) -> Vec<String> {
        self.content
            .iter()
            .map(|media| media.media_type.clone())
            .collect()
    }
}

/// The response an operation returns on success
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessResponse {
    /// Status code (200, 201, 202, or 204)
    pub status: u16,
    /// Chosen media type
    pub media_type: String,
    /// Every media type of the chosen response
    pub media_types: Vec<String>,
    /// Flattened schema, `{"type": "null"}` when there is no content
    pub schema: Value,
}

impl Default for SuccessResponse {
    fn default() -> Self {
        Self {
            status: 200,
            media_type: "application/json".to_string(),
            media_types: Vec::new(),
            schema: serde_json::json!({ "type": "null" }),
        }
    }
}

/// Any declared response, kept for documentation views
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseInfo {
    /// Status key as written (`200`, `4XX`, `default`)
    pub status: String,
    /// Response description
    pub description: String,
    /// Media types with their resolved schemas
    pub content: Vec<MediaContent>,
}

/// A 4xx/5xx response reduced to a short name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// Status key; numeric keys serialize as numbers
    #[serde(serialize_with = "serialize_status")]
    pub status: String,
    /// First sentence of the description, at most 80 characters
    pub name: String,
}

fn serialize_status<S: Serializer>(status: &str, serializer: S) -> Result<S::Ok, S::Error> {
    match status.parse::<u16>() {
        Ok(code) => serializer.serialize_u16(code),
        Err(_) => serializer.serialize_str(status),
    }
}

/// Authentication required by an operation, one per security scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum AuthDescriptor {
    #[serde(rename = "apiKey")]
    ApiKey {
        #[serde(rename = "in")]
        location: String,
        name: String,
    },
    #[serde(rename = "http")]
    Http { scheme: String },
    #[serde(rename = "oauth2")]
    OAuth2 { scopes: Vec<String> },
    #[serde(rename = "openIdConnect")]
    OpenIdConnect,
    /// Unknown scheme type or a scheme missing from the components
    #[serde(rename = "other")]
    Other { name: String },
}

impl fmt::Display for AuthDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthDescriptor::ApiKey { location, name } => write!(f, "apiKey ({}: {})", location, name),
            AuthDescriptor::Http { scheme } => write!(f, "{} token", scheme.to_uppercase()),
            AuthDescriptor::OAuth2 { scopes } if scopes.is_empty() => f.write_str("OAuth2"),
            AuthDescriptor::OAuth2 { scopes } => {
                let shown: Vec<&str> = scopes.iter().take(3).map(String::as_str).collect();
                write!(f, "OAuth2 (scopes: {})", shown.join(", "))
            }
            AuthDescriptor::OpenIdConnect => f.write_str("OpenID Connect"),
            AuthDescriptor::Other { name } => f.write_str(name),
        }
    }
}

/// Detected pagination pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "style", rename_all = "kebab-case")]
pub enum Pagination {
    LimitOffset {
        limit_param: Option<String>,
        offset_param: Option<String>,
        items_path: String,
        next_offset_path: String,
    },
    PageBased {
        page_param: Option<String>,
        per_page_param: Option<String>,
        items_path: String,
        next_page_path: String,
    },
    Cursor {
        cursor_param: String,
        items_path: String,
        next_cursor_path: String,
    },
}

impl Pagination {
    /// Style label (`limit-offset`, `page-based`, `cursor`)
    pub fn style(&self) -> &'static str {
        match self {
            Pagination::LimitOffset { .. } => "limit-offset",
            Pagination::PageBased { .. } => "page-based",
            Pagination::Cursor { .. } => "cursor",
        }
    }
}

/// Everything the generators need to know about one operation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    /// Unique identifier within one conversion run
    pub operation_id: String,
    /// `operationId` exactly as declared, if any
    pub declared_id: Option<String>,
    pub method: HttpMethod,
    pub path: String,
    /// Non-empty summary
    pub summary: Option<String>,
    /// Non-empty description
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Merged path-level and operation-level parameters
    pub parameters: Vec<ParameterInfo>,
    pub request_body: Option<RequestBodyInfo>,
    pub success: SuccessResponse,
    /// All declared responses in document order
    pub responses: Vec<ResponseInfo>,
    pub errors: Vec<ErrorResponse>,
    /// Effective security, empty when the operation is public
    pub auth: Vec<AuthDescriptor>,
    pub auth_required: bool,
    pub pagination: Option<Pagination>,
}

impl OperationRecord {
    /// First tag, used wherever a single grouping is needed
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    /// Parameters declared at the given location
    pub fn parameters_in<'a>(
        &'a self,
        location: &'a ParamLocation,
    ) -> impl Iterator<Item = &'a ParameterInfo> + 'a {
        self.parameters
            .iter()
            .filter(move |param| &param.location == location)
    }

    /// Names of the required parameters, in declaration order
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|param| param.required)
            .map(|param| param.name.as_str())
            .collect()
    }

    /// Auth descriptors joined for display, `None` when public
    pub fn auth_summary(&self) -> String {
        if self.auth.is_empty() {
            return "None".to_string();
        }
        self.auth
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
