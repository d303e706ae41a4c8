//! Security requirement handling

use crate::openapi::{Operation, SecurityRequirement, SpecDocument};
use apiingest_common::AuthDescriptor;
use serde_json::Value;

/// Requirements that apply to an operation
///
/// Operation-level `security` wins whenever present, including an empty list
/// which marks the operation public. Otherwise the document-level list
/// applies.
pub fn effective_security(
    document: &SpecDocument,
    operation: &Operation,
) -> Vec<SecurityRequirement> {
    match &operation.security {
        Some(requirements) => requirements.clone(),
        None => document.global_security(),
    }
}

/// Describe each scheme named by the requirements
pub fn describe_requirements(
    document: &SpecDocument,
    requirements: &[SecurityRequirement],
) -> Vec<AuthDescriptor> {
    requirements
        .iter()
        .flat_map(|requirement| requirement.iter())
        .map(|(name, scopes)| describe_scheme(document, name, scopes))
        .collect()
}

fn describe_scheme(document: &SpecDocument, name: &str, scopes: &Value) -> AuthDescriptor {
    let Some(scheme) = document.security_scheme(name) else {
        return AuthDescriptor::Other {
            name: name.to_string(),
        };
    };

    match scheme.scheme_type.as_deref() {
        Some("apiKey") => AuthDescriptor::ApiKey {
            location: scheme.location.unwrap_or_else(|| "header".to_string()),
            name: scheme.name.unwrap_or_else(|| "X-API-Key".to_string()),
        },
        Some("http") => AuthDescriptor::Http {
            scheme: scheme.scheme.unwrap_or_else(|| "bearer".to_string()),
        },
        Some("oauth2") => AuthDescriptor::OAuth2 {
            scopes: scopes
                .as_array()
                .map(|list| {
                    list.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        },
        Some("openIdConnect") => AuthDescriptor::OpenIdConnect,
        _ => AuthDescriptor::Other {
            name: name.to_string(),
        },
    }
}
