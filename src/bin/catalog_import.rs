//! ISA data importer CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Download from the ISA feed (default)
//! catalog_import
//!
//! # Import from a local file
//! catalog_import sample_isa_data.json
//!
//! # Test without saving
//! catalog_import --dry-run
//!
//! # Overwrite existing records
//! catalog_import --update
//! ```
//!
//! Exit code is non-zero only when the payload itself cannot be fetched
//! or parsed; individual bad records are logged, counted, and skipped.

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use terras_catalog::config::ISA_DATA_URL;
use terras_catalog::importer::{extract_records, fetch_payload, ImportOptions, Reconciler};
use terras_catalog::{database, AppConfig};

#[derive(Parser)]
#[command(name = "catalog_import")]
#[command(about = "Load ISA (Instituto Socioambiental) indigenous lands data from JSON file or URL")]
struct Cli {
    /// Path or URL of the JSON payload (defaults to the ISA feed)
    source: Option<String>,

    /// Run without saving to the database
    #[arg(long)]
    dry_run: bool,

    /// Update existing records instead of skipping them
    #[arg(long)]
    update: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "terras_catalog=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let source = cli.source.as_deref().unwrap_or(ISA_DATA_URL);
    println!("Loading data from: {source}");

    // Fetch and parse before touching the database: a bad payload must
    // abort with no writes.
    let payload = fetch_payload(source).await?;
    let records = extract_records(&payload)?;
    println!("Found {} land records to process", records.len());

    let pool = database::connect(&config.database_url).await?;
    let reconciler = Reconciler::new(pool, config.community_delimiter.clone());

    let options = ImportOptions {
        dry_run: cli.dry_run,
        update_existing: cli.update,
    };
    let stats = reconciler.run(records, options).await?;

    if cli.dry_run {
        println!("\n{}", "=== DRY RUN - No changes saved ===".yellow());
    }

    println!("\n{}", "=".repeat(50));
    println!("{}", "Import completed!".green().bold());
    println!("Lands created: {}", stats.lands_created);
    println!("Lands updated: {}", stats.lands_updated);
    println!("Lands skipped: {}", stats.lands_skipped);
    println!("Records failed: {}", stats.records_failed);
    println!("Municipalities created: {}", stats.municipalities_created);
    println!("Communities created: {}", stats.communities_created);

    Ok(())
}
