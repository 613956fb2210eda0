// src/bin/geocode_backfill.rs
//
// Backfills coordinates for the records of each input file and writes the
// file back out under the same name, without grouping or dedup.

use anyhow::{Context, Result};
use clap::Parser;
use dedupe_lib::geocoding::{Geocoder, GeocoderConfig, NominatimClient};
use dedupe_lib::ingest::{discover_input_files, load_file};
use dedupe_lib::models::GeocodeSummaryCounts;
use dedupe_lib::output::writer::{write_failed_geocodes, write_locations_file};
use dedupe_lib::utils::env::load_env;
use dedupe_lib::utils::progress_bars::logging::log_geocode_summary;
use dedupe_lib::utils::progress_bars::progress_config::{add_bar, ProgressConfig, MAIN_BAR_TEMPLATE};
use dedupe_lib::utils::source_filter::SourceFilterConfig;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about = "Geocode records that are missing coordinates", long_about = None)]
struct Args {
    /// Directory of input JSON files (repeatable)
    #[arg(long = "input", required = true)]
    inputs: Vec<PathBuf>,

    /// Where rewritten files and failed_geocodes.json go
    #[arg(long, default_value = "geocoded")]
    output_dir: PathBuf,

    /// Only process files whose name starts with this prefix
    #[arg(long = "prefix")]
    prefixes: Vec<String>,

    /// Also re-geocode coordinates outside the North American envelope
    #[arg(long)]
    suspicious: bool,

    /// Geocode but write nothing
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();
    load_env();

    info!("🛰️ Starting geocode backfill");
    let start = Instant::now();

    let filter = SourceFilterConfig::from_env().with_cli_prefixes(&args.prefixes);
    filter.log_config();
    let config = GeocoderConfig::from_env();
    config.log_config();
    let client = NominatimClient::new(&config).context("Failed to initialise geocoder")?;
    let geocoder = Geocoder::new(client, config);

    let files = discover_input_files(&args.inputs, &filter).context("Failed to discover input files")?;
    let progress_config = ProgressConfig::from_env();
    let multi_progress = progress_config.create_multi_progress();
    let file_pb = add_bar(
        multi_progress.as_ref(),
        files.len() as u64,
        MAIN_BAR_TEMPLATE,
        "Geocoding files...",
    );

    let mut totals = GeocodeSummaryCounts::default();
    let mut failed = Vec::new();
    let mut files_skipped = 0;

    for path in &files {
        let loaded = match load_file(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("⚠️  Skipping malformed input file: {}", e);
                files_skipped += 1;
                if let Some(pb) = &file_pb {
                    pb.inc(1);
                }
                continue;
            }
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input.json".to_string());
        if let Some(pb) = &file_pb {
            pb.set_message(progress_config.decorate_message(&name));
        }

        let report = geocoder
            .backfill_records(loaded.records, args.suspicious, &name, None)
            .await;
        totals.absorb(&report.summary);
        failed.extend(report.failed);

        if !args.dry_run {
            write_locations_file(&args.output_dir.join(&name), &report.records)
                .with_context(|| format!("Failed to write geocoded copy of {}", name))?;
        }
        if let Some(pb) = &file_pb {
            pb.inc(1);
        }
    }

    if let Some(pb) = &file_pb {
        pb.finish_with_message(format!("{} files processed", files.len()));
    }
    if !args.dry_run {
        write_failed_geocodes(&args.output_dir, &failed).context("Failed to write failed_geocodes.json")?;
    }

    log_geocode_summary(&totals);
    info!(
        "✅ Backfill finished in {:.2?} ({} files, {} skipped)",
        start.elapsed(),
        files.len(),
        files_skipped
    );
    Ok(())
}
