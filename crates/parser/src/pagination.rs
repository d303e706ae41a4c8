//! Pagination detection
//!
//! An ordered table of rules; the first rule that matches decides the style.
//! Parameter names compare case-insensitively.

use apiingest_common::{Pagination, ParameterInfo};
use serde_json::Value;
use std::collections::HashSet;

/// What the rules look at
struct Signals<'a> {
    params: HashSet<String>,
    schema: &'a Value,
}

impl Signals<'_> {
    fn has(&self, name: &str) -> bool {
        self.params.contains(name)
    }

    fn present(&self, name: &str) -> Option<String> {
        self.has(name).then(|| name.to_string())
    }
}

type Rule = fn(&Signals<'_>) -> Option<Pagination>;

const RULES: [Rule; 4] = [limit_offset, page_based, cursor_parameter, cursor_response];

/// Classify an operation's pagination from its parameters and success schema
pub fn detect_pagination(parameters: &[ParameterInfo], success_schema: &Value) -> Option<Pagination> {
    let signals = Signals {
        params: parameters
            .iter()
            .map(|param| param.name.to_lowercase())
            .collect(),
        schema: success_schema,
    };

    RULES.iter().find_map(|rule| rule(&signals))
}

fn limit_offset(signals: &Signals<'_>) -> Option<Pagination> {
    if !(signals.has("limit") || signals.has("offset")) {
        return None;
    }
    Some(Pagination::LimitOffset {
        limit_param: signals.present("limit"),
        offset_param: signals.present("offset"),
        items_path: "$".to_string(),
        next_offset_path: "$.next_offset".to_string(),
    })
}

fn page_based(signals: &Signals<'_>) -> Option<Pagination> {
    if !(signals.has("page") || signals.has("per_page")) {
        return None;
    }
    Some(Pagination::PageBased {
        page_param: signals.present("page"),
        per_page_param: signals.present("per_page"),
        items_path: "$".to_string(),
        next_page_path: "$.next_page".to_string(),
    })
}

fn cursor_parameter(signals: &Signals<'_>) -> Option<Pagination> {
    let cursor_param = if signals.has("cursor") {
        "cursor"
    } else if signals.has("page_token") {
        "page_token"
    } else {
        return None;
    };
    Some(Pagination::Cursor {
        cursor_param: cursor_param.to_string(),
        items_path: "$.items".to_string(),
        next_cursor_path: "$.next_cursor".to_string(),
    })
}

fn cursor_response(signals: &Signals<'_>) -> Option<Pagination> {
    if signals.schema.get("type").and_then(Value::as_str) != Some("object") {
        return None;
    }
    let props = signals.schema.get("properties").and_then(Value::as_object)?;
    if !["next_cursor", "next", "next_page"]
        .iter()
        .any(|key| props.contains_key(*key))
    {
        return None;
    }

    let next_cursor_path = if props.contains_key("next_cursor") {
        "$.next_cursor"
    } else {
        "$.next"
    };
    Some(Pagination::Cursor {
        cursor_param: "cursor".to_string(),
        items_path: "$.items".to_string(),
        next_cursor_path: next_cursor_path.to_string(),
    })
}
