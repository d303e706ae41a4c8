//! Operation naming
//!
//! Assigns every operation an identifier that is unique within one
//! conversion run. Two styles exist: the documentation views keep declared
//! `operationId`s verbatim, the agent bundle sanitizes them into snake-ish
//! identifiers.

use apiingest_common::HttpMethod;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

type Pattern = LazyLock<Result<Regex, regex::Error>>;

static NON_ALNUM: Pattern = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+"));
static NON_IDENT: Pattern = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+"));
static UNDERSCORES: Pattern = LazyLock::new(|| Regex::new(r"_+"));

fn replace_all(pattern: &Pattern, text: &str, with: &str) -> String {
    let Ok(re) = pattern.as_ref() else {
        tracing::debug!("Identifier pattern unavailable, keeping {:?} unchanged", text);
        return text.to_string();
    };
    re.replace_all(text, with).into_owned()
}

/// How identifiers are derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingStyle {
    /// `operationId` as declared, else `METHOD_path`
    Verbatim,
    /// Sanitized lower-case `operationId`, else `<tag>_<method>_<path>[_by_id]`
    Sanitized,
}

/// Fallback identifier for an operation without `operationId`
///
/// # Examples
/// ```
/// use apiingest_common::HttpMethod;
/// use apiingest_parser::fallback_operation_id;
///
/// assert_eq!(fallback_operation_id(HttpMethod::Get, "/pets"), "GET_pets");
/// assert_eq!(fallback_operation_id(HttpMethod::Get, "/pets/{petId}"), "GET_pets_petId");
/// assert_eq!(fallback_operation_id(HttpMethod::Delete, "/"), "DELETE_root");
/// ```
pub fn fallback_operation_id(method: HttpMethod, path: &str) -> String {
    let slug = replace_all(&NON_ALNUM, path, "_");
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        format!("{}_root", method.as_upper())
    } else {
        format!("{}_{}", method.as_upper(), slug)
    }
}

/// Reduce text to `[A-Za-z0-9_]`, collapsing and trimming underscores
///
/// # Examples
/// ```
/// use apiingest_parser::sanitize_identifier;
///
/// assert_eq!(sanitize_identifier("pets.list-all"), "pets_list_all");
/// assert_eq!(sanitize_identifier("__a__b__"), "a_b");
/// ```
pub fn sanitize_identifier(raw: &str) -> String {
    let replaced = replace_all(&NON_IDENT, raw, "_");
    let collapsed = replace_all(&UNDERSCORES, &replaced, "_");
    collapsed.trim_matches('_').to_string()
}

/// Bundle-style identifier derived from tag, method, and path
///
/// # Examples
/// ```
/// use apiingest_common::HttpMethod;
/// use apiingest_parser::derived_operation_name;
///
/// assert_eq!(
///     derived_operation_name(Some("Pets"), HttpMethod::Get, "/pets/{petId}"),
///     "pets_get_pets_by_id"
/// );
/// assert_eq!(
///     derived_operation_name(None, HttpMethod::Post, "/"),
///     "api_post_root"
/// );
/// ```
pub fn derived_operation_name(tag: Option<&str>, method: HttpMethod, path: &str) -> String {
    let tag = replace_all(&NON_ALNUM, tag.unwrap_or("api"), "_").to_lowercase();

    let literal: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty() && !segment.starts_with('{'))
        .collect();
    let path_part = if literal.is_empty() {
        "root".to_string()
    } else {
        literal.iter().take(2).copied().collect::<Vec<_>>().join("_")
    };

    let last = path.rsplit('/').next().unwrap_or("");
    let suffix = if path.contains("{id}") || last.contains('{') {
        "_by_id"
    } else {
        ""
    };

    sanitize_identifier(&format!(
        "{}_{}_{}{}",
        tag,
        method.as_str(),
        path_part,
        suffix
    ))
}

/// Hands out unique operation identifiers in traversal order
pub struct OperationNamer {
    style: NamingStyle,
    taken: HashSet<String>,
}

impl OperationNamer {
    pub fn new(style: NamingStyle) -> Self {
        Self {
            style,
            taken: HashSet::new(),
        }
    }

    /// Name one operation; collisions get `_2`, `_3`, ... suffixes
    pub fn assign(
        &mut self,
        declared: Option<&str>,
        method: HttpMethod,
        path: &str,
        tags: &[String],
    ) -> String {
        let base = self.base_name(declared, method, path, tags);

        let mut name = base.clone();
        let mut counter = 2;
        while self.taken.contains(&name) {
            name = format!("{}_{}", base, counter);
            counter += 1;
        }
        self.taken.insert(name.clone());
        name
    }

    fn base_name(
        &self,
        declared: Option<&str>,
        method: HttpMethod,
        path: &str,
        tags: &[String],
    ) -> String {
        let declared = declared.filter(|id| !id.is_empty());
        match self.style {
            NamingStyle::Verbatim => declared
                .map(str::to_string)
                .unwrap_or_else(|| fallback_operation_id(method, path)),
            NamingStyle::Sanitized => declared
                .map(|id| sanitize_identifier(id).to_lowercase())
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| {
                    derived_operation_name(tags.first().map(String::as_str), method, path)
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncompiled_pattern_keeps_text() {
        static BROKEN: Pattern = LazyLock::new(|| Regex::new(r"(unclosed"));
        assert!(BROKEN.is_err());
        assert_eq!(replace_all(&BROKEN, "pets.list-all", "_"), "pets.list-all");
        assert_eq!(replace_all(&NON_IDENT, "pets.list-all", "_"), "pets_list_all");
    }

    #[test]
    fn test_verbatim_keeps_declared_id() {
        let mut namer = OperationNamer::new(NamingStyle::Verbatim);
        assert_eq!(
            namer.assign(Some("listPets"), HttpMethod::Get, "/pets", &[]),
            "listPets"
        );
    }

    #[test]
    fn test_verbatim_fallback() {
        let mut namer = OperationNamer::new(NamingStyle::Verbatim);
        assert_eq!(namer.assign(None, HttpMethod::Get, "/pets", &[]), "GET_pets");
        assert_eq!(
            namer.assign(Some(""), HttpMethod::Post, "/v1/user-profiles", &[]),
            "POST_v1_user_profiles"
        );
    }

    #[test]
    fn test_collisions_get_suffixes() {
        let mut namer = OperationNamer::new(NamingStyle::Verbatim);
        assert_eq!(namer.assign(Some("dup"), HttpMethod::Get, "/a", &[]), "dup");
        assert_eq!(namer.assign(Some("dup"), HttpMethod::Get, "/b", &[]), "dup_2");
        assert_eq!(namer.assign(Some("dup"), HttpMethod::Get, "/c", &[]), "dup_3");
    }

    #[test]
    fn test_sanitized_declared_id() {
        let mut namer = OperationNamer::new(NamingStyle::Sanitized);
        assert_eq!(
            namer.assign(Some("Pets.List-All"), HttpMethod::Get, "/pets", &[]),
            "pets_list_all"
        );
    }

    #[test]
    fn test_sanitized_derived_name() {
        let mut namer = OperationNamer::new(NamingStyle::Sanitized);
        let tags = vec!["User Management".to_string()];
        assert_eq!(
            namer.assign(None, HttpMethod::Get, "/users/{userId}/roles", &tags),
            "user_management_get_users_roles"
        );
        assert_eq!(
            namer.assign(None, HttpMethod::Delete, "/users/{id}", &tags),
            "user_management_delete_users_by_id"
        );
    }

    #[test]
    fn test_sanitized_id_of_only_symbols_falls_back() {
        let mut namer = OperationNamer::new(NamingStyle::Sanitized);
        assert_eq!(
            namer.assign(Some("!!!"), HttpMethod::Get, "/health", &[]),
            "api_get_health"
        );
    }
}
