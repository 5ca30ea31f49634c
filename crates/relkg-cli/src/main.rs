//! relkg CLI - Command-line interface
//!
//! Usage:
//!   relkg extract [--mode long_text] [--format json] [--output FILE] <INPUT|->
//!   relkg segment --tokens <N> [--window <L>]
//!   relkg parse <DECODED>

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use relkg_backends::{CachedResolver, HfTokenizer, HttpGenerator, WikipediaResolver};
use relkg_core::{AppConfig, Triplet};
use relkg_extractor::{Extraction, ExtractionMode, Extractor, SpanSegmenter, TripletParser};
use relkg_graph::{GraphView, RenderFormat};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "relkg")]
#[command(about = "Build knowledge graphs from text with a relation extraction model")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a knowledge graph from text
    Extract {
        /// Input file, or `-` for stdin
        input: String,

        /// short_text, long_text or wikipedia
        #[arg(short, long, default_value = "long_text")]
        mode: ExtractionMode,

        /// json, dot or html
        #[arg(short, long, default_value = "json")]
        format: RenderFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the token windows for an input length
    Segment {
        /// Number of input tokens
        #[arg(long)]
        tokens: usize,

        /// Window length; defaults to the configured one
        #[arg(long)]
        window: Option<usize>,
    },
    /// Parse one decoded generator output
    Parse {
        /// Decoded text including marker tokens
        decoded: String,
    },
}

/// JSON document written by `extract --format json`
#[derive(Serialize)]
struct ExtractionReport<'a> {
    mode: ExtractionMode,
    triplets: &'a [Triplet],
    entities: Vec<&'a relkg_core::Entity>,
    windows: &'a [relkg_core::Span],
    stats: &'a relkg_extractor::ExtractionStats,
}

impl<'a> From<&'a Extraction> for ExtractionReport<'a> {
    fn from(extraction: &'a Extraction) -> Self {
        Self {
            mode: extraction.mode,
            triplets: extraction.knowledge_base.triplets(),
            entities: extraction.knowledge_base.entities().values().collect(),
            windows: &extraction.windows,
            stats: &extraction.stats,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract {
            input,
            mode,
            format,
            output,
        } => {
            let text = read_input(&input)?;
            let extractor = build_extractor(&config, mode)?;
            let extraction = extractor.extract(&text, mode).await?;
            tracing::info!(
                triplets = extraction.knowledge_base.len(),
                dropped = extraction.stats.dropped,
                "Extraction finished"
            );

            let rendered = render(&extraction, format)?;
            write_output(output.as_deref(), &rendered)?;
        }
        Commands::Segment { tokens, window } => {
            let window = window.unwrap_or(config.extraction.window_length);
            print!("{}", segment_report(tokens, window)?);
        }
        Commands::Parse { decoded } => {
            let parser = TripletParser::with_markers(config.extraction.markers.clone());
            for triplet in parser.parse(&decoded) {
                println!("{triplet}");
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

/// Assemble backends; the Wikipedia resolver is only built when needed
fn build_extractor(config: &AppConfig, mode: ExtractionMode) -> anyhow::Result<Extractor> {
    let generator = HttpGenerator::from_config(&config.generator)?;
    let tokenizer = HfTokenizer::from_file(&config.generator.tokenizer_path)?;
    let extractor = Extractor::new(
        Arc::new(generator),
        Arc::new(tokenizer),
        config.extraction.clone(),
    )?;

    if !mode.canonicalizes() {
        return Ok(extractor);
    }
    let resolver = CachedResolver::new(
        WikipediaResolver::from_config(&config.resolver)?,
        config.resolver.cache_capacity,
    );
    Ok(extractor.with_resolver(Arc::new(resolver)))
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
}

fn render(extraction: &Extraction, format: RenderFormat) -> anyhow::Result<String> {
    if format == RenderFormat::Json {
        let report = ExtractionReport::from(extraction);
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    let kb = &extraction.knowledge_base;
    let view = GraphView::from_triplets(kb.triplets()).with_entities(kb.entities());
    Ok(format.renderer().render(&view)?.body)
}

fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

fn segment_report(tokens: usize, window: usize) -> anyhow::Result<String> {
    let segmenter = SpanSegmenter::new(window)?;
    let mut report = format!(
        "tokens={tokens} window={window} windows={} overlap={}\n",
        segmenter.num_windows(tokens),
        segmenter.overlap(tokens)
    );
    for span in segmenter.segment(tokens) {
        report.push_str(&format!("{span}\n"));
    }
    Ok(report)
}
