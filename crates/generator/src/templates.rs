//! Template loading and management

use apiingest_common::{IngestError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("inline_code", inline_code_filter);

    tera.add_raw_template("docs.md", include_str!("../templates/docs.md.tera"))
        .map_err(|e| {
            IngestError::Generation(format!("Failed to load docs.md template: {}", e))
        })?;

    Ok(tera)
}

/// Wrap a string in backticks, widening the fence when it contains some
fn inline_code_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("inline_code filter expects a string"))?;

    let fence = if text.contains('`') { "``" } else { "`" };
    let pad = if text.contains('`') { " " } else { "" };
    Ok(Value::String(format!("{fence}{pad}{text}{pad}{fence}")))
}
