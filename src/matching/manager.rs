// src/matching/manager.rs
//
// Drives the six dedup phases over one region's working set.

use log::{info, warn};
use std::env;
use std::time::Instant;

use crate::matching::phases::{run_phase, PHASES};
use crate::models::{DedupStats, LocationRecord, PhaseStats};
use crate::utils::progress_bars::logging::PhaseLogger;

const DEFAULT_MAX_ROUNDS: usize = 16;

#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Upper bound on full six-phase rounds. Rounds repeat until one performs
    /// no merge, which is what makes a second run over the output a no-op.
    pub max_rounds: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

impl DedupConfig {
    pub fn from_env() -> Self {
        let max_rounds = env::var("DEDUP_MAX_ROUNDS")
            .unwrap_or_else(|_| DEFAULT_MAX_ROUNDS.to_string())
            .parse::<usize>()
            .unwrap_or(DEFAULT_MAX_ROUNDS)
            .max(1);
        Self { max_rounds }
    }

    pub fn log_config(&self) {
        info!("🔁 Dedup: up to {} six-phase rounds per region", self.max_rounds);
    }
}

#[derive(Debug, Clone)]
pub struct DedupResult {
    pub records: Vec<LocationRecord>,
    pub stats: DedupStats,
    pub phase_stats: Vec<PhaseStats>,
    pub rounds: usize,
    /// False when `max_rounds` ran out while merges were still happening.
    pub converged: bool,
}

/// Runs the six phases in order, repeating whole rounds until a round merges
/// nothing. Phases within a round always run strictly in sequence over the same
/// working set.
pub fn run_dedup_pipeline(records: Vec<LocationRecord>, config: &DedupConfig, scope: &str) -> DedupResult {
    let loggers: Vec<PhaseLogger> = PHASES.iter().map(|spec| PhaseLogger::for_phase(spec.phase)).collect();
    if let Some(first) = loggers.first() {
        first.log_debug(&format!("Dedup start for {} ({} records)", scope, records.len()));
    }

    let mut working = records;
    let mut stats = DedupStats::default();
    let mut phase_stats = Vec::new();
    let mut rounds = 0;
    let mut converged = false;

    while rounds < config.max_rounds {
        rounds += 1;
        let merges_before_round = stats.duplicate_count;

        for (spec, logger) in PHASES.iter().zip(loggers.iter()) {
            let started = Instant::now();
            let records_in = working.len();
            let merges_before = stats.duplicate_count;

            let (next, next_stats) = run_phase(working, spec, stats);
            working = next;
            stats = next_stats;

            let merges = stats.duplicate_count - merges_before;
            logger.log_pass_result(rounds, records_in, working.len(), merges);
            phase_stats.push(PhaseStats {
                phase: spec.phase,
                round: rounds,
                records_in,
                records_out: working.len(),
                merges,
                duration: started.elapsed(),
            });
        }

        if stats.duplicate_count == merges_before_round {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            "⚠️  {}: dedup still merging after {} rounds, output may not be a fixpoint",
            scope, rounds
        );
    }

    DedupResult {
        records: working,
        stats,
        phase_stats,
        rounds,
        converged,
    }
}
