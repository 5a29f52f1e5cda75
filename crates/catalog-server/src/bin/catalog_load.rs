//! catalog-load - replace the catalog from the bulk source files

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use catalog_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use catalog_common::EntityKind;
use clap::Parser;
use tracing::{error, info, warn};

use catalog_server::config::{Config, StoreBackend};
use catalog_server::ingest::{BulkLoader, LoadReport};
use catalog_server::storage;

#[derive(Parser, Debug)]
#[command(
    name = "catalog-load",
    version,
    about = "Reset the catalog and load it from the pfam, protein and sequence sources"
)]
struct Args {
    /// Pfam descriptions source [domain_id, domain_description]
    #[arg(long, value_name = "PATH")]
    pfams: Option<PathBuf>,

    /// Composite protein/domain assignment source
    #[arg(long, value_name = "PATH")]
    proteins: Option<PathBuf>,

    /// Protein sequences source [protein_id, sequence]
    #[arg(long, value_name = "PATH")]
    sequences: Option<PathBuf>,

    /// Directory holding the default source files
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Rows per insert statement
    #[arg(long, value_name = "ROWS")]
    batch_size: Option<usize>,

    /// Load into a throwaway in-memory store, useful to validate files
    #[arg(long)]
    memory: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = if args.verbose { LogLevel::Debug } else { LogLevel::Info };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("catalog-load")
        .filter_directives("catalog_server=debug,sqlx=warn")
        .build();
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            None
        },
    };

    match run(args).await {
        Ok(report) => print_summary(&report),
        Err(e) => {
            error!(error = %e, "Load failed");
            eprintln!("Error: {:#}", e);
            process::exit(1);
        },
    }
}

async fn run(args: Args) -> Result<LoadReport> {
    let mut config = Config::load()?;
    if args.memory {
        config.store = StoreBackend::Memory;
    }

    let loader_config = &mut config.loader;
    if let Some(dir) = args.data_dir {
        loader_config.data_dir = dir;
    }
    loader_config.pfams_file = args.pfams.or(loader_config.pfams_file.take());
    loader_config.proteins_file = args.proteins.or(loader_config.proteins_file.take());
    loader_config.sequences_file = args.sequences.or(loader_config.sequences_file.take());
    if let Some(batch_size) = args.batch_size {
        loader_config.batch_size = batch_size;
    }
    config.validate()?;

    let paths = config.loader.source_paths();
    info!(
        pfams = %paths.pfams.display(),
        proteins = %paths.proteins.display(),
        sequences = %paths.sequences.display(),
        store = ?config.store,
        "Starting catalog load"
    );

    let store = storage::init(&config).await?;
    let loader = BulkLoader::with_batch_size(store, config.loader.batch_size);
    Ok(loader.load(&paths).await?)
}

fn print_summary(report: &LoadReport) {
    for skipped in &report.skipped_rows {
        warn!(role = %skipped.role, line = skipped.line, reason = %skipped.reason, "Skipped row");
    }

    let elapsed = report.finished_at - report.started_at;
    println!("Catalog loaded in {} ms", elapsed.num_milliseconds());
    for kind in EntityKind::INSERT_ORDER {
        println!("  {:<15} {}", kind.as_str(), report.inserted(kind));
    }
    println!("  skipped rows    {}", report.skipped_rows.len());
    println!("  dropped seqs    {}", report.dropped_sequences);
    println!("  unsequenced     {}", report.unsequenced_proteins);
}
