//! histmap CLI - Command-line driver for the extraction pipeline
//!
//! Usage:
//!   histmap build-index --cities data/cities.tsv
//!   histmap process --cities data/cities.tsv --output corpus.json book1.txt book2.txt
//!   histmap classify --data corpus.json --location Aachen --start-year 1100 --end-year 1300
//!   histmap search --data corpus.json --query rom
//!   histmap stats --data corpus.json

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use histmap_core::{
    AppConfig, Book, BookStore, DocumentInput, InMemoryStore, Location, LocationStore, Mention,
    MentionStore,
};
use histmap_extract::{gutenberg, BatchRunner, DocumentOutcome, ExtractionPipeline};
use histmap_gazetteer::{
    parse_cities_tsv, parse_linked_places, parse_overrides_toml, GazetteerBuilder, GazetteerIndex,
};
use histmap_query::{classify, corpus_statistics, search_locations, QueryRange};

#[derive(Parser)]
#[command(name = "histmap")]
#[command(about = "Historical place-mention extraction and tiering")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Bulk cities table (TSV)
    #[arg(long)]
    cities: Option<PathBuf>,

    /// Historical supplement (Linked Places JSON)
    #[arg(long)]
    linked_places: Option<PathBuf>,

    /// Regional override table (TOML)
    #[arg(long)]
    overrides: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the gazetteer index and report its shape
    BuildIndex {
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// Extract place mentions from document files
    Process {
        #[command(flatten)]
        sources: SourceArgs,

        /// Where to write the extracted corpus (JSON)
        #[arg(long, default_value = "corpus.json")]
        output: PathBuf,

        /// Document text files to process
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Tier a location's mentions against a year range
    Classify {
        /// Corpus file produced by `process`
        #[arg(long, default_value = "corpus.json")]
        data: PathBuf,

        /// Location name to look up
        #[arg(long)]
        location: String,

        #[arg(long)]
        start_year: i32,

        #[arg(long)]
        end_year: i32,
    },
    /// Search stored locations by name
    Search {
        #[arg(long, default_value = "corpus.json")]
        data: PathBuf,

        #[arg(long)]
        query: String,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Corpus statistics
    Stats {
        #[arg(long, default_value = "corpus.json")]
        data: PathBuf,
    },
}

/// Everything `process` extracted, in one portable file
#[derive(Serialize, Deserialize)]
struct CorpusDump {
    books: Vec<Book>,
    locations: Vec<Location>,
    mentions: Vec<Mention>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    match cli.command {
        Commands::BuildIndex { sources } => {
            let index = build_index(&config, &sources)?;
            println!("index entries: {}", index.len());
        }
        Commands::Process {
            sources,
            output,
            files,
        } => {
            run_process(&config, &sources, &output, &files).await?;
        }
        Commands::Classify {
            data,
            location,
            start_year,
            end_year,
        } => {
            run_classify(&data, &location, start_year, end_year)?;
        }
        Commands::Search { data, query, limit } => {
            let dump = load_dump(&data)?;
            let hits = search_locations(&dump.locations, &query, limit);
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        Commands::Stats { data } => {
            let dump = load_dump(&data)?;
            let stats = corpus_statistics(&dump.books, &dump.locations, &dump.mentions);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn build_index(config: &AppConfig, sources: &SourceArgs) -> anyhow::Result<GazetteerIndex> {
    let mut builder = GazetteerBuilder::new();

    let cities = sources
        .cities
        .clone()
        .or_else(|| config.gazetteer.cities_path.clone());
    let linked_places = sources
        .linked_places
        .clone()
        .or_else(|| config.gazetteer.linked_places_path.clone());
    let overrides = sources
        .overrides
        .clone()
        .or_else(|| config.gazetteer.overrides_path.clone());

    if let Some(path) = cities {
        builder = builder.add_source(parse_cities_tsv(&path)?);
    }
    if let Some(path) = linked_places {
        builder = builder.add_source(parse_linked_places(&path)?);
    }
    if let Some(path) = overrides {
        builder = builder.add_source(parse_overrides_toml(&path)?);
    }

    builder.build().context("building gazetteer index")
}

fn load_documents(files: &[PathBuf]) -> anyhow::Result<Vec<DocumentInput>> {
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        // An unreadable file abandons that document; the batch goes on
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable document");
                continue;
            }
        };

        let title = gutenberg::extract_title(&raw).unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Unknown Book".to_string())
        });
        let release_date = gutenberg::extract_release_date(&raw);
        let body = gutenberg::strip_boilerplate(&raw).to_string();

        let mut input = DocumentInput::new(title, format!("file://{}", path.display()), body);
        input.release_date = release_date;
        documents.push(input);
    }

    if documents.is_empty() && !files.is_empty() {
        anyhow::bail!("none of the {} document files could be read", files.len());
    }
    Ok(documents)
}

async fn run_process(
    config: &AppConfig,
    sources: &SourceArgs,
    output: &Path,
    files: &[PathBuf],
) -> anyhow::Result<()> {
    let index = Arc::new(build_index(config, sources)?);
    info!(entries = index.len(), "gazetteer ready");

    let pipeline = Arc::new(ExtractionPipeline::new(config, index)?);
    let documents = load_documents(files)?;

    let runner = BatchRunner::new(Arc::clone(&pipeline), config.batch.clone());
    let (outcomes, stats) = runner.run(documents).await;

    // Hand results to the store: locations first, then each document's
    // complete set
    let store = InMemoryStore::new();
    for location in pipeline.registry().locations() {
        store.insert_location(location).await?;
    }
    for outcome in outcomes {
        match outcome {
            DocumentOutcome::Processed(report) => {
                let book_id = store.upsert_book(report.book).await?;
                store.store_mentions(book_id, report.mentions).await?;
            }
            DocumentOutcome::Skipped { title, reason } => {
                println!("skipped: {title} ({reason})");
            }
        }
    }

    let dump = CorpusDump {
        books: store.books().await?,
        locations: store.locations().await?,
        mentions: store.mentions().await?,
    };
    std::fs::write(output, serde_json::to_string_pretty(&dump)?)
        .with_context(|| format!("writing corpus to {}", output.display()))?;

    println!(
        "processed {} documents ({} skipped): {} mentions of {} locations, {} spans unresolved",
        stats.documents_processed,
        stats.documents_skipped,
        stats.mentions,
        dump.locations.len(),
        stats.unresolved_spans,
    );
    println!("corpus written to {}", output.display());

    Ok(())
}

fn run_classify(data: &Path, location: &str, start_year: i32, end_year: i32) -> anyhow::Result<()> {
    let dump = load_dump(data)?;

    let Some(target) = dump
        .locations
        .iter()
        .find(|candidate| candidate.name.eq_ignore_ascii_case(location))
    else {
        anyhow::bail!("location not found: {location}");
    };

    let mentions: Vec<Mention> = dump
        .mentions
        .iter()
        .filter(|mention| mention.location_id == target.id)
        .cloned()
        .collect();

    let tiers = classify(&mentions, &dump.books, QueryRange::new(start_year, end_year));
    println!(
        "{} primary, {} secondary",
        tiers.primary_count(),
        tiers.secondary_count()
    );
    println!("{}", serde_json::to_string_pretty(&tiers)?);

    Ok(())
}

fn load_dump(path: &Path) -> anyhow::Result<CorpusDump> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading corpus {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing corpus {}", path.display()))
}
