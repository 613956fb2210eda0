use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use dedupe_lib::geocoding::{Geocoder, GeocoderConfig, NominatimClient};
use dedupe_lib::ingest::{discover_input_files, load_records, LoadReport};
use dedupe_lib::matching::{run_dedup_pipeline, DedupConfig};
use dedupe_lib::models::PipelineStats;
use dedupe_lib::output::writer::{write_failed_geocodes, write_index, write_region_file};
use dedupe_lib::output::{group_by_region, IndexFile, RegionFile};
use dedupe_lib::utils::env::load_env;
use dedupe_lib::utils::progress_bars::logging::{
    log_geocode_summary, log_pipeline_completion, log_pipeline_phase, log_pipeline_start,
    log_region_completed,
};
use dedupe_lib::utils::progress_bars::progress_config::{
    add_bar, ProgressConfig, MAIN_BAR_TEMPLATE, SUB_BAR_TEMPLATE,
};
use dedupe_lib::utils::source_filter::SourceFilterConfig;
use log::info;
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

/// Deduplicate scraped and vendor location records into per-region files.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory of `{ "locations": [...] }` JSON files (repeatable)
    #[arg(long = "input", required = true)]
    inputs: Vec<PathBuf>,

    /// Where region files, index.json and failed_geocodes.json are written
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Only load files whose name starts with this prefix (repeatable, comma lists allowed)
    #[arg(long = "prefix")]
    prefixes: Vec<String>,

    /// Backfill missing coordinates through the geocoder before dedup
    #[arg(long)]
    geocode: bool,

    /// Also re-geocode coordinates outside the North American envelope (implies --geocode)
    #[arg(long)]
    geocode_suspicious: bool,

    /// Run everything but write no files
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();
    info!("Starting location dedup pipeline");
    load_env();

    let source_filter = SourceFilterConfig::from_env().with_cli_prefixes(&cli.prefixes);
    source_filter.log_config();
    let dedup_config = DedupConfig::from_env();
    dedup_config.log_config();
    let progress_config = ProgressConfig::from_env();
    info!(
        "Progress tracking: enabled={}, detailed={}",
        progress_config.enabled, progress_config.detailed
    );

    let run_id = Uuid::new_v4().to_string();
    let run_timestamp = Utc::now();
    let mut stats = PipelineStats::new(run_id.clone(), run_timestamp.naive_utc());
    let pipeline_start = Instant::now();
    let geocode_enabled = cli.geocode || cli.geocode_suspicious;
    log_pipeline_start(&run_id, &cli.inputs, geocode_enabled, cli.dry_run);

    log_pipeline_phase("Loading", Some("scanning input directories"));
    let load_start = Instant::now();
    let files = discover_input_files(&cli.inputs, &source_filter).context("Failed to discover input files")?;
    let LoadReport {
        records,
        skipped_files,
        rows_skipped,
        ..
    } = load_records(&files);
    stats.total_input_records = records.len();
    stats.rows_skipped = rows_skipped;
    stats.files_skipped = skipped_files.len();
    stats.load_time = load_start.elapsed().as_secs_f64();

    let geocoder = if geocode_enabled {
        let config = GeocoderConfig::from_env();
        config.log_config();
        let client = NominatimClient::new(&config).context("Failed to initialise geocoder")?;
        Some(Geocoder::new(client, config))
    } else {
        None
    };

    let regions = group_by_region(records);
    log_pipeline_phase(
        "Regions",
        Some(&format!("{} regions to process", regions.len())),
    );

    let multi_progress = progress_config.create_multi_progress();
    let region_pb = add_bar(
        multi_progress.as_ref(),
        regions.len() as u64,
        MAIN_BAR_TEMPLATE,
        "Processing regions...",
    );
    let geocode_pb = if geocoder.is_some() && progress_config.should_show_detailed() {
        add_bar(multi_progress.as_ref(), 0, SUB_BAR_TEMPLATE, "Geocoding...")
    } else {
        None
    };

    let mut summaries = Vec::with_capacity(regions.len());
    let mut failed_geocodes = Vec::new();

    for (code, records) in regions {
        let region_start = Instant::now();
        let records_in = records.len();
        if let Some(pb) = &region_pb {
            pb.set_message(progress_config.decorate_message(&format!("Region {} ({} records)", code, records_in)));
        }

        let records = match &geocoder {
            Some(geocoder) => {
                let geocode_start = Instant::now();
                let report = geocoder
                    .backfill_records(records, cli.geocode_suspicious, &code, geocode_pb.as_ref())
                    .await;
                stats.geocoding.absorb(&report.summary);
                failed_geocodes.extend(report.failed);
                stats.geocoding_time += geocode_start.elapsed().as_secs_f64();
                report.records
            }
            None => records,
        };

        let dedup_start = Instant::now();
        let result = run_dedup_pipeline(records, &dedup_config, &code);
        stats.dedup_time += dedup_start.elapsed().as_secs_f64();
        stats.dedup = stats.dedup.combine(&result.stats);
        stats.total_output_records += result.records.len();

        let region = RegionFile::new(&code, result.records, &result.stats, Utc::now());
        if !cli.dry_run {
            write_region_file(&cli.output_dir, &region)
                .with_context(|| format!("Failed to write region file for {}", code))?;
        }
        log_region_completed(
            &code,
            &region.state_name,
            records_in,
            region.location_count,
            region_start.elapsed(),
        );
        summaries.push(region.summary());

        if let Some(pb) = &region_pb {
            pb.inc(1);
        }
    }

    if let Some(pb) = &geocode_pb {
        pb.finish_with_message(format!(
            "Geocoding: {} ok, {} failed",
            stats.geocoding.succeeded, stats.geocoding.failed
        ));
    }
    if let Some(pb) = &region_pb {
        pb.finish_with_message(format!("{} regions written", summaries.len()));
    }
    stats.total_regions = summaries.len();

    log_pipeline_phase("Index", Some("writing run summary"));
    let index = IndexFile {
        run_id: run_id.clone(),
        last_updated: Utc::now(),
        total_input_records: stats.total_input_records,
        total_locations: stats.total_output_records,
        total_duplicates_removed: stats.dedup.duplicate_count,
        duplicate_reasons: stats.dedup.breakdown,
        regions: summaries,
        skipped_files,
        rows_skipped: stats.rows_skipped,
        geocoding: stats.geocoding,
    };
    if cli.dry_run {
        info!("Dry run: skipping index.json and failed_geocodes.json");
    } else {
        write_index(&cli.output_dir, &index).context("Failed to write index.json")?;
        if geocode_enabled {
            write_failed_geocodes(&cli.output_dir, &failed_geocodes)
                .context("Failed to write failed_geocodes.json")?;
        }
    }
    log_geocode_summary(&stats.geocoding);

    stats.total_processing_time = pipeline_start.elapsed().as_secs_f64();
    log_pipeline_completion(&stats);
    Ok(())
}
