//! OpenAPI 3.x node views
//!
//! Only the constructs around schemas are typed. Schemas stay
//! `serde_json::Value` because they are emitted verbatim into tool schemas.
//! Every field decodes leniently: an ill-typed value becomes the field's
//! default instead of failing the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// A slot that may hold either a `$ref` pointer or an inline item
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// `{"$ref": "#/components/..."}`
    Reference {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    /// Inline definition
    Item(T),
}

/// Decode a node, falling back to the default on mismatch
pub fn decode<T: DeserializeOwned + Default>(value: &Value) -> T {
    T::deserialize(value).unwrap_or_else(|e| {
        tracing::debug!("Ignoring malformed node: {}", e);
        T::default()
    })
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decode(&value))
}

/// Sequence where malformed entries are skipped
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| T::deserialize(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Scalar rendered as text; numbers and booleans are stringified
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    })
}

/// API metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    /// API title
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,

    /// API version
    #[serde(default, deserialize_with = "lenient_text")]
    pub version: Option<String>,

    /// API description
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
}

/// Server information
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Server {
    /// Server URL
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,

    /// Server description
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
}

/// Security requirement: scheme name to scopes
pub type SecurityRequirement = Map<String, Value>;

/// Path item (operations for a path)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    #[serde(default, deserialize_with = "lenient")]
    pub get: Option<Operation>,

    #[serde(default, deserialize_with = "lenient")]
    pub post: Option<Operation>,

    #[serde(default, deserialize_with = "lenient")]
    pub put: Option<Operation>,

    #[serde(default, deserialize_with = "lenient")]
    pub patch: Option<Operation>,

    #[serde(default, deserialize_with = "lenient")]
    pub delete: Option<Operation>,

    #[serde(default, deserialize_with = "lenient")]
    pub head: Option<Operation>,

    #[serde(default, deserialize_with = "lenient")]
    pub options: Option<Operation>,

    /// Parameters shared by every operation of the path
    #[serde(default, deserialize_with = "lenient_seq")]
    pub parameters: Vec<RefOr<Parameter>>,
}

impl PathItem {
    /// Operation declared for the given method
    pub fn operation(&self, method: apiingest_common::HttpMethod) -> Option<&Operation> {
        use apiingest_common::HttpMethod;

        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
        }
    }
}

/// HTTP operation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    /// Operation ID (unique identifier)
    #[serde(rename = "operationId", default, deserialize_with = "lenient_text")]
    pub operation_id: Option<String>,

    /// Summary
    #[serde(default, deserialize_with = "lenient_text")]
    pub summary: Option<String>,

    /// Description
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,

    /// Tags
    #[serde(default, deserialize_with = "lenient_seq")]
    pub tags: Vec<String>,

    /// Parameters
    #[serde(default, deserialize_with = "lenient_seq")]
    pub parameters: Vec<RefOr<Parameter>>,

    /// Request body
    #[serde(rename = "requestBody", default, deserialize_with = "lenient")]
    pub request_body: Option<RefOr<RequestBody>>,

    /// Responses keyed by status, each a response or a reference
    #[serde(default, deserialize_with = "lenient")]
    pub responses: Map<String, Value>,

    /// Operation-level security; `Some(vec![])` makes the operation public
    #[serde(default, deserialize_with = "lenient")]
    pub security: Option<Vec<SecurityRequirement>>,
}

/// Operation parameter
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Parameter {
    /// Parameter name
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,

    /// Location (`path`, `query`, `header`, `cookie`)
    #[serde(rename = "in", default, deserialize_with = "lenient_text")]
    pub location: Option<String>,

    /// Whether the parameter is required
    #[serde(default, deserialize_with = "lenient")]
    pub required: Option<bool>,

    /// Description
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,

    /// Parameter schema
    #[serde(default)]
    pub schema: Option<Value>,

    /// Example value
    #[serde(default)]
    pub example: Option<Value>,

    /// Serialization style
    #[serde(default, deserialize_with = "lenient_text")]
    pub style: Option<String>,

    /// Serialization explode flag
    #[serde(default, deserialize_with = "lenient")]
    pub explode: Option<bool>,
}

/// Request body
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequestBody {
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub required: Option<bool>,

    /// Media type name to media type object
    #[serde(default, deserialize_with = "lenient")]
    pub content: Map<String, Value>,
}

/// Response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Response {
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,

    /// Media type name to media type object
    #[serde(default, deserialize_with = "lenient")]
    pub content: Map<String, Value>,
}

/// Media type object
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Option<Value>,

    #[serde(default)]
    pub example: Option<Value>,
}

/// Security scheme from `components.securitySchemes`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SecurityScheme {
    /// Scheme type (`apiKey`, `http`, `oauth2`, `openIdConnect`)
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub scheme_type: Option<String>,

    /// API key location
    #[serde(rename = "in", default, deserialize_with = "lenient_text")]
    pub location: Option<String>,

    /// API key name
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,

    /// HTTP auth scheme (`bearer`, `basic`)
    #[serde(default, deserialize_with = "lenient_text")]
    pub scheme: Option<String>,

    /// OAuth2 flows keyed by flow type
    #[serde(default, deserialize_with = "lenient")]
    pub flows: Map<String, Value>,
}

impl SecurityScheme {
    /// Scopes declared across all OAuth2 flows, in document order
    pub fn flow_scopes(&self) -> Vec<String> {
        self.flows
            .values()
            .filter_map(|flow| flow.get("scopes").and_then(Value::as_object))
            .flat_map(|scopes| scopes.keys().cloned())
            .collect()
    }
}
