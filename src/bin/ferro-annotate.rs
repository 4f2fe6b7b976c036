// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-annotate CLI
//!
//! Command-line interface for multi-source VCF annotation.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use ferro_annotate::config::{AdapterSpec, EngineConfig};
use ferro_annotate::engine::AnnotationEngine;
use ferro_annotate::error::AnnotateError;
use ferro_annotate::report::{write_records, OutputFormat};
use ferro_annotate::source::{AnnotationSource, FileSource, HttpSource};
use ferro_annotate::vcf::read_vcf;

#[derive(Parser)]
#[command(name = "ferro-annotate")]
#[command(author, version, about = "Multi-source variant annotator")]
#[command(
    long_about = "Annotate variants from a VCF file using the sources listed in a \
TOML configuration file.

Examples:
  ferro-annotate -c sources.toml -i variants.vcf
  ferro-annotate -c sources.toml -i variants.vcf.gz -o annotated.jsonl
  ferro-annotate -c sources.toml -i variants.vcf -f tsv -o summary.tsv"
)]
struct Cli {
    /// Source configuration file (TOML)
    #[arg(short, long)]
    config: PathBuf,

    /// Input VCF file (plain or gzip-compressed)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: jsonl or tsv
    #[arg(short, long, default_value = "jsonl")]
    format: String,

    /// Log level (e.g. warn, info, debug)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_new(level).map_err(|e| format!("Invalid log level '{}': {}", level, e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    Ok(())
}

/// Build one adapter per configured source from its `adapter` table
fn build_adapters(config: &EngineConfig) -> Result<Vec<Arc<dyn AnnotationSource>>, AnnotateError> {
    let mut adapters: Vec<Arc<dyn AnnotationSource>> = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        let spec = source.adapter.as_ref().ok_or_else(|| {
            AnnotateError::config(format!(
                "source '{}' has no adapter section",
                source.id
            ))
        })?;
        let adapter: Arc<dyn AnnotationSource> = match spec {
            AdapterSpec::File { path } => Arc::new(FileSource::load(source.id.as_str(), path)?),
            AdapterSpec::Http { endpoint, api_key } => Arc::new(HttpSource::new(
                source.id.as_str(),
                endpoint.as_str(),
                api_key.clone(),
            )?),
        };
        adapters.push(adapter);
    }
    Ok(adapters)
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let format: OutputFormat = cli.format.parse()?;

    let config = EngineConfig::load(&cli.config)?;
    config.validate()?;

    let adapters = build_adapters(&config)?;
    let engine = AnnotationEngine::new(config, adapters)?;

    let records = read_vcf(&cli.input)?;
    info!(records = records.len(), "read input VCF");

    let annotated = engine.annotate(records).await?;

    let stats = engine.cache_stats();
    info!(
        hits = stats.hits,
        misses = stats.misses,
        "annotation complete"
    );

    match &cli.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_records(&mut writer, &annotated, format)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write_records(&mut writer, &annotated, format)?;
            writer.flush()?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli.log_level) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
