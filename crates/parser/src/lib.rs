//! OpenAPI ingestion for apiingest
//!
//! This crate loads OpenAPI 3.x documents (YAML or JSON) and turns them into
//! per-operation records (`OperationRecord`) that the generators render.
//!
//! ## Pipeline
//!
//! - `openapi::SpecDocument` loads and normalizes the document
//! - `Resolver` replaces `$ref` pointers (shallow or deep, cycle-safe)
//! - `schema` flattens `allOf` and renders compact type descriptions
//! - `OperationExtractor` merges parameters, picks bodies and success
//!   responses, names operations, and detects pagination
//!
//! ```rust,ignore
//! use apiingest_common::ConvertOptions;
//! use apiingest_parser::{extract_operations, ExtractOptions, SpecDocument};
//!
//! let document = SpecDocument::from_file("petstore.yaml")?;
//! let records = extract_operations(&document, ExtractOptions::tool_schemas(&ConvertOptions::default()));
//! ```

mod naming;
pub mod openapi;
mod pagination;
mod resolver;
pub mod schema;
mod security;
pub mod text;

pub use naming::{
    derived_operation_name, fallback_operation_id, sanitize_identifier, NamingStyle,
    OperationNamer,
};
pub use openapi::{
    extract_operations, DocumentFormat, ExtractOptions, OperationExtractor, SpecDocument,
};
pub use pagination::detect_pagination;
pub use resolver::{ResolveMode, Resolver};
pub use security::{describe_requirements, effective_security};
