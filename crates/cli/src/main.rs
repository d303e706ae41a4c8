//! apiingest CLI
//!
//! Command-line interface for turning OpenAPI documents into LLM-ready
//! markdown, chunked docs, tool schemas, and agent bundles.

use anyhow::{Context, Result};
use apiingest_common::ConvertOptions;
use apiingest_generator::{Converter, DirectorySink};
use apiingest_parser::{DocumentFormat, ExtractOptions, SpecDocument};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apiingest")]
#[command(version, about = "Turn OpenAPI documents into LLM-ready docs and tool schemas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Conversion options file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a document and list the operations it describes
    Inspect {
        /// Path to the OpenAPI document
        #[arg(short, long)]
        spec: PathBuf,

        /// Input format (from the file extension if not specified)
        #[arg(short, long)]
        format: Option<InputFormat>,
    },

    /// Write the monolithic markdown reference
    #[command(after_help = "EXAMPLES:\n  \
        # Writes petstore.md next to the input\n  \
        apiingest markdown --spec petstore.yaml\n\n  \
        # Explicit output path\n  \
        apiingest markdown --spec petstore.yaml --output docs/petstore.md")]
    Markdown {
        /// Path to the OpenAPI document
        #[arg(short, long)]
        spec: PathBuf,

        /// Output file (defaults to the input path with a .md extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Input format (from the file extension if not specified)
        #[arg(short, long)]
        format: Option<InputFormat>,
    },

    /// Write the chunked view as JSON
    Chunked {
        /// Path to the OpenAPI document
        #[arg(short, long)]
        spec: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Input format (from the file extension if not specified)
        #[arg(short, long)]
        format: Option<InputFormat>,
    },

    /// Write function-calling tool schemas as a JSON array
    Tools {
        /// Path to the OpenAPI document
        #[arg(short, long)]
        spec: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Input format (from the file extension if not specified)
        #[arg(short, long)]
        format: Option<InputFormat>,
    },

    /// Write tools.json, docs.md, and chunks.jsonl
    #[command(after_help = "EXAMPLES:\n  \
        # Writes ./specs/output/{tools.json,docs.md,chunks.jsonl}\n  \
        apiingest bundle --spec specs/petstore.yaml\n\n  \
        # Use the second declared server in curl examples\n  \
        apiingest bundle --spec petstore.yaml --output ./bundle --server-index 1")]
    Bundle {
        /// Path to the OpenAPI document
        #[arg(short, long)]
        spec: PathBuf,

        /// Output directory (defaults to `output` next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Index into `servers` used for curl examples
        #[arg(long)]
        server_index: Option<usize>,

        /// Input format (from the file extension if not specified)
        #[arg(short, long)]
        format: Option<InputFormat>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Json,
    Yaml,
}

impl From<InputFormat> for DocumentFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Json => DocumentFormat::Json,
            InputFormat::Yaml => DocumentFormat::Yaml,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        eprintln!("{} Verbose mode enabled", "→".cyan());
    }

    let options = load_options(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect { spec, format } => inspect_command(&spec, format, options)?,
        Commands::Markdown {
            spec,
            output,
            format,
        } => {
            let output = output.unwrap_or_else(|| default_markdown_path(&spec));
            markdown_command(&spec, format, &output, options)?;
        }
        Commands::Chunked {
            spec,
            output,
            format,
        } => chunked_command(&spec, format, output.as_deref(), options, &mut io::stdout())?,
        Commands::Tools {
            spec,
            output,
            format,
        } => tools_command(&spec, format, output.as_deref(), options, &mut io::stdout())?,
        Commands::Bundle {
            spec,
            output,
            server_index,
            format,
        } => {
            let output = output.unwrap_or_else(|| default_bundle_dir(&spec));
            let options = ConvertOptions {
                server_index: server_index.unwrap_or(options.server_index),
                ..options
            };
            bundle_command(&spec, format, &output, options)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("apiingest=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("apiingest=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_options(config: Option<&Path>) -> Result<ConvertOptions> {
    match config {
        Some(path) => ConvertOptions::load(path)
            .with_context(|| format!("Failed to load options from {}", path.display())),
        None => Ok(ConvertOptions::default()),
    }
}

fn load_converter(
    spec_path: &Path,
    format: Option<InputFormat>,
    options: ConvertOptions,
) -> Result<Converter> {
    eprintln!("{} Loading document: {}", "→".cyan(), spec_path.display());

    let document = match format {
        Some(format) => {
            let content = fs::read_to_string(spec_path)
                .with_context(|| format!("Failed to read {}", spec_path.display()))?;
            SpecDocument::parse(&content, format.into())
        }
        None => SpecDocument::from_file(spec_path),
    }
    .context("Failed to load OpenAPI document")?;

    Converter::new(document, options).context("Failed to create converter")
}

fn default_markdown_path(spec_path: &Path) -> PathBuf {
    spec_path.with_extension("md")
}

fn default_bundle_dir(spec_path: &Path) -> PathBuf {
    spec_path
        .parent()
        .map(|parent| parent.join("output"))
        .unwrap_or_else(|| PathBuf::from("output"))
}

/// Write `content` to `output`, or to `stdout` when no path is given
///
/// Progress lines go to stderr so that piped stdout stays parseable.
fn write_or_print(output: Option<&Path>, content: &str, stdout: &mut dyn Write) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} Wrote {}", "✓".green(), path.display());
        }
        None => writeln!(stdout, "{}", content).context("Failed to write to stdout")?,
    }
    Ok(())
}

fn inspect_command(
    spec_path: &Path,
    format: Option<InputFormat>,
    options: ConvertOptions,
) -> Result<()> {
    let converter = load_converter(spec_path, format, options)?;
    let document = converter.document();
    let records = converter.operations(ExtractOptions::documentation(converter.options()));

    println!("\n{}", "✓ Load successful!".green().bold());
    println!("  Title: {}", document.title().yellow());
    println!("  Version: {}", document.version().yellow());
    println!("  Base URL: {}", converter.base_url());
    println!("  Operations: {}", records.len());
    println!(
        "  Schemas: {}",
        document.schemas().map(|schemas| schemas.len()).unwrap_or(0)
    );

    println!("\n{}", "Operations:".bold());
    for record in &records {
        let pagination = record
            .pagination
            .as_ref()
            .map(|pagination| format!(", paginated: {}", pagination.style()))
            .unwrap_or_default();
        println!(
            "  • {} {} {} (auth: {}{})",
            record.operation_id.cyan(),
            record.method.as_upper(),
            record.path,
            record.auth_summary(),
            pagination
        );
    }

    Ok(())
}

fn markdown_command(
    spec_path: &Path,
    format: Option<InputFormat>,
    output: &Path,
    options: ConvertOptions,
) -> Result<()> {
    let converter = load_converter(spec_path, format, options)?;

    eprintln!("{} Rendering markdown...", "→".cyan());
    let markdown = converter.convert();
    write_or_print(Some(output), &markdown, &mut io::stdout())?;
    eprintln!("  {} characters", markdown.chars().count());

    Ok(())
}

fn chunked_command(
    spec_path: &Path,
    format: Option<InputFormat>,
    output: Option<&Path>,
    options: ConvertOptions,
    stdout: &mut dyn Write,
) -> Result<()> {
    let converter = load_converter(spec_path, format, options)?;

    let chunked = converter.convert_chunked();
    let json = serde_json::to_string_pretty(&chunked).context("Failed to serialize chunks")?;
    write_or_print(output, &json, stdout)
}

fn tools_command(
    spec_path: &Path,
    format: Option<InputFormat>,
    output: Option<&Path>,
    options: ConvertOptions,
    stdout: &mut dyn Write,
) -> Result<()> {
    let converter = load_converter(spec_path, format, options)?;

    let tools = converter.generate_tool_schemas();
    let json = serde_json::to_string_pretty(&tools).context("Failed to serialize tools")?;
    write_or_print(output, &json, stdout)
}

fn bundle_command(
    spec_path: &Path,
    format: Option<InputFormat>,
    output: &Path,
    options: ConvertOptions,
) -> Result<()> {
    let converter = load_converter(spec_path, format, options)?;

    eprintln!("{} Building agent bundle...", "→".cyan());
    let bundle = converter
        .generate_bundle()
        .context("Failed to generate bundle")?;

    let mut sink = DirectorySink::new(output).context("Failed to prepare output directory")?;
    bundle
        .write_to(&mut sink)
        .context("Failed to write bundle")?;

    println!("\n{}", "✓ Bundle complete!".green().bold());
    println!("\n{}", "Generated files:".bold());
    for name in [
        apiingest_generator::TOOLS_FILE,
        apiingest_generator::DOCS_FILE,
        apiingest_generator::CHUNKS_FILE,
    ] {
        println!("  📄 {}", output.join(name).display());
    }
    println!("  {} tools", bundle.api.tools.len());

    Ok(())
}
