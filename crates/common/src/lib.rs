//! Common types and utilities for apiingest
//!
//! This crate contains the shared error types, conversion options, and the
//! per-operation intermediate representation used across the parser,
//! generator, and CLI components.

mod operation;
mod options;

pub use operation::{
    AuthDescriptor, ErrorResponse, HttpMethod, MediaContent, OperationRecord, Pagination,
    ParamLocation, ParameterInfo, RequestBodyInfo, ResponseInfo, SuccessResponse,
};
pub use options::ConvertOptions;

use thiserror::Error;

/// Errors that can occur while ingesting an OpenAPI document
#[derive(Error, Debug)]
pub enum IngestError {
    /// The document could not be read or decoded
    #[error("Failed to load {origin}: {source}")]
    Load {
        /// File path or `<memory>` for in-memory input
        origin: String,
        #[source]
        source: LoadError,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Underlying cause of a document load failure
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("document root must be a mapping, found {0}")]
    NotAMapping(&'static str),
}

impl IngestError {
    /// Build a load error for the given origin
    pub fn load(origin: impl Into<String>, source: impl Into<LoadError>) -> Self {
        IngestError::Load {
            origin: origin.into(),
            source: source.into(),
        }
    }
}

/// Result type for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;
