//! Artifact generation for apiingest
//!
//! This crate turns a loaded OpenAPI document into LLM-oriented artifacts:
//! - monolithic markdown reference
//! - chunked progressive-disclosure view
//! - function-calling tool schemas
//! - agent bundle (tools.json, docs.md, chunks.jsonl)

mod bundle;
mod chunked;
pub mod examples;
mod markdown;
mod sink;
mod templates;
mod tools;

pub use bundle::{
    AgentApi, AgentBundle, AgentTool, ApiAuth, ArgBinding, Chunk, ChunkMeta, Components,
    ContentTypes, HttpBinding, ParameterSchema, RateLimits, RequestBodyBinding, ToolExamples,
    CHUNKS_FILE, DOCS_FILE, TOOLS_FILE,
};
pub use chunked::ChunkedDocs;
pub use sink::{ArtifactSink, DirectorySink};
pub use tools::{ToolParameters, ToolSchema};

use apiingest_common::{ConvertOptions, OperationRecord, Result};
use apiingest_parser::{extract_operations, ExtractOptions, OperationExtractor, SpecDocument};
use std::path::Path;
use tera::Tera;

/// Converts one OpenAPI document into every artifact kind
///
/// Each entry point extracts with its own resolver, so calls are
/// independent and repeatable.
pub struct Converter {
    document: SpecDocument,
    options: ConvertOptions,
    tera: Tera,
}

impl Converter {
    /// Create a converter for an already loaded document
    pub fn new(document: SpecDocument, options: ConvertOptions) -> Result<Self> {
        let tera = templates::load_templates()?;
        Ok(Self {
            document,
            options,
            tera,
        })
    }

    /// Load a YAML or JSON document from disk
    pub fn from_path<P: AsRef<Path>>(path: P, options: ConvertOptions) -> Result<Self> {
        let document = SpecDocument::from_file(path)?;
        Self::new(document, options)
    }

    pub fn document(&self) -> &SpecDocument {
        &self.document
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Operation records for one extraction family
    pub fn operations(&self, extract: ExtractOptions) -> Vec<OperationRecord> {
        extract_operations(&self.document, extract)
    }

    /// Base URL of the documentation views: first server or the fallback
    pub fn base_url(&self) -> String {
        self.document
            .first_server_url()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.options.fallback_base_url.clone())
    }

    /// Monolithic markdown reference
    pub fn convert(&self) -> String {
        let records = self.operations(ExtractOptions::documentation(&self.options));
        let markdown = markdown::render_markdown(
            &self.document,
            &records,
            &self.base_url(),
            self.options.resolve_depth,
        );
        tracing::info!(
            "Rendered markdown for {} endpoints ({} chars)",
            records.len(),
            markdown.chars().count()
        );
        markdown
    }

    /// Manifest, tag listings, endpoint blocks, and schemas keyed separately
    pub fn convert_chunked(&self) -> ChunkedDocs {
        let records = self.operations(ExtractOptions::documentation(&self.options));
        let schemas = markdown::resolved_schemas(&self.document, self.options.resolve_depth);
        let docs = ChunkedDocs::build(&self.document, &records, &self.base_url(), &schemas);
        tracing::info!(
            "Chunked {} endpoints, {} tags, {} schemas",
            docs.endpoints.len(),
            docs.tags.len(),
            docs.schemas.len()
        );
        docs
    }

    /// One function-calling schema per operation
    pub fn generate_tool_schemas(&self) -> Vec<ToolSchema> {
        let records = self.operations(ExtractOptions::tool_schemas(&self.options));
        let tools = tools::tool_schemas(&records);
        tracing::info!("Generated {} tool schemas", tools.len());
        tools
    }

    /// tools.json, docs.md, and chunks.jsonl
    pub fn generate_bundle(&self) -> Result<AgentBundle> {
        let mut extractor =
            OperationExtractor::new(&self.document, ExtractOptions::bundle(&self.options));
        let records = extractor.extract_all();
        let mut resolver = extractor.into_resolver();

        let api = bundle::build_api(&self.document, &self.options, &records, &mut resolver);
        let docs = bundle::render_docs(&api, &self.tera)?;
        let chunks = bundle::render_chunks(&api)?;

        tracing::info!(
            "Built agent bundle: {} tools, {} shared schemas",
            api.tools.len(),
            api.components.schemas.len()
        );
        Ok(AgentBundle { api, docs, chunks })
    }
}
