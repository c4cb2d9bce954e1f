//! ArtifactGraph inspection CLI
//!
//! Runs the derive phase over one file and prints what would be stored.
//! Nothing is persisted and no deferred relationship is resolved.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin artifactgraph-inspect -- service.wsdl
//! cargo run --bin artifactgraph-inspect -- WEB-INF/web.xml --kind ext/WebXmlDocument --format json
//! RUST_LOG=artifactgraph_builder=debug cargo run --bin artifactgraph-inspect -- schema.xsd
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use artifactgraph_builder::pipeline::upload::{kind_hint_for, primary_for};
use artifactgraph_builder::{BuilderConfig, MetadataPrinter, RawContent, UploadPipeline};
use artifactgraph_storage::Artifact;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "artifactgraph-inspect")]
#[command(about = "Derive metadata records from an artifact without storing them", long_about = None)]
struct Cli {
    /// Artifact file
    file: PathBuf,

    /// Kind hint (e.g. WsdlDocument, xsd/XsdDocument, ext/WebXmlDocument); guessed from the extension by default
    #[arg(short, long)]
    kind: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn run(cli: Cli) -> artifactgraph_builder::Result<()> {
    let config = match &cli.config {
        Some(path) => BuilderConfig::from_yaml_file(path)?,
        None => BuilderConfig::default(),
    }
    .with_env_overrides()?;

    let kind = cli.kind.as_deref().unwrap_or_else(|| kind_hint_for(&cli.file));
    let content = RawContent::from_path(&cli.file)?;
    let primary = primary_for(&cli.file, kind, content.media_type());

    let pipeline = UploadPipeline::new(config);
    let (primary, derived) = pipeline.derive_records(primary, content)?;

    let artifacts: Vec<Artifact> = std::iter::once(Artifact::from(primary))
        .chain(derived.into_iter().map(Artifact::from))
        .collect();

    match cli.format {
        Format::Text => {
            let mut printer = MetadataPrinter::new();
            artifactgraph_builder::features::visitor::walk_all(&mut printer, &artifacts);
            print!("{}", printer.finish());
        }
        Format::Json => {
            let json = serde_json::to_string_pretty(&artifacts)
                .map_err(|e| artifactgraph_builder::BuilderError::parse(format!("cannot render JSON: {}", e)))?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}
