//! OpenAPI 3.x document model
//!
//! Loads OpenAPI documents (YAML or JSON) and exposes typed, lenient views
//! over the constructs that surround schemas.
//!
//! ## Usage
//! ```rust,ignore
//! use apiingest_parser::openapi::SpecDocument;
//!
//! let document = SpecDocument::from_file("petstore.yaml")?;
//! for (path, item) in document.path_items() {
//!     println!("{path}: {:?}", item.get.map(|op| op.operation_id));
//! }
//! ```

mod converter;
mod parser;
mod types;

pub use converter::{extract_operations, ExtractOptions, OperationExtractor};
pub use parser::{DocumentFormat, SpecDocument};
pub use types::*;
