//! End-to-end reconstruction: profile, filter, graph, contigs, merge,
//! extend, and enforce the exact target length.
//!
//! The stages run strictly in order and never mutate an earlier stage's
//! output. Only input validation is surfaced as an error; every noisy-input
//! condition becomes flags and counters on the outcome record.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::data_structures::Spectrum;
use crate::reconstruction::contig::extract_contigs;
use crate::reconstruction::extender::{ExtensionBudget, PathExtender};
use crate::reconstruction::merger::merge_contigs;
use crate::reconstruction::overlap_graph::OverlapGraph;
use crate::reconstruction::profiler::{profile_spectrum, Mode, ModeParams};
use crate::reconstruction::reliability::filter_reliable;

/// Caller-tunable knobs. Everything has a default; `candidate_size` and
/// `max_iterations` default to mode- and length-derived values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructOptions {
    /// Override the mode-chosen jump candidate count.
    pub candidate_size: Option<usize>,
    /// Coverage gap beyond which the profiled mode is downgraded one step.
    pub error_threshold: f64,
    /// Hard cap on extension steps; defaults to 4 times the target length.
    pub max_iterations: Option<usize>,
    pub max_backtracks: usize,
    pub wall_time_ms: u64,
    /// Seed for the desperate strategy's RNG.
    pub seed: u64,
    /// Skip profiling and use this mode directly.
    pub force_mode: Option<Mode>,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            candidate_size: None,
            error_threshold: 0.15,
            max_iterations: None,
            max_backtracks: 10,
            wall_time_ms: 30_000,
            seed: 0,
            force_mode: None,
        }
    }
}

/// The reconstruction plus everything a caller needs to judge it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructionOutcome {
    /// Always exactly the requested length.
    pub sequence: String,
    pub mode: Mode,
    pub iterations: usize,
    pub backtracks: usize,
    pub desperate_jumps: usize,
    /// True when any budget ran out and the tail had to be padded, or the
    /// input was too degenerate to assemble.
    pub incomplete: bool,
    pub elapsed_ms: u64,
}

/// Reconstruct a string of length `n` whose k-mer multiset approximates the
/// given spectrum. See the module docs for the stage pipeline.
pub fn reconstruct(
    spectrum_kmers: &[String],
    n: usize,
    k: usize,
    options: &ReconstructOptions,
) -> crate::Result<ReconstructionOutcome> {
    let started = Instant::now();
    let spectrum = Spectrum::new(spectrum_kmers, n, k)?;

    let profile = profile_spectrum(&spectrum, options.error_threshold);
    let selected_mode = options.force_mode.unwrap_or(profile.mode);
    info!(
        size = profile.size,
        unique = profile.unique_count,
        coverage = profile.coverage_ratio,
        entropy = profile.entropy,
        mode = %selected_mode,
        forced = options.force_mode.is_some(),
        "spectrum profiled"
    );

    let (reliable, mode) = filter_reliable(&spectrum, selected_mode);

    if reliable.is_empty() {
        // Unassemblable input: emit the smallest k-mer cycled out to length.
        let smallest = spectrum
            .unique_sorted()
            .first()
            .expect("validated spectrum is non-empty")
            .sequence()
            .to_string();
        let sequence: String = smallest.chars().cycle().take(n).collect();
        return Ok(ReconstructionOutcome {
            sequence,
            mode,
            iterations: 0,
            backtracks: 0,
            desperate_jumps: 0,
            incomplete: true,
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
    }

    let graph = OverlapGraph::build(&reliable, k);
    let contigs = extract_contigs(&graph);
    let backbones = merge_contigs(contigs, k);

    let seed_sequence = match backbones.first() {
        Some(backbone) if backbone.len() >= k => backbone.sequence.clone(),
        _ => reliable
            .smallest()
            .expect("reliable set is non-empty")
            .sequence()
            .to_string(),
    };
    debug!(backbone = seed_sequence.len(), "extension seed chosen");

    // A backbone that already covers the target needs no extension.
    if seed_sequence.len() >= n {
        let mut sequence = seed_sequence;
        sequence.truncate(n);
        return Ok(ReconstructionOutcome {
            sequence,
            mode,
            iterations: 0,
            backtracks: 0,
            desperate_jumps: 0,
            incomplete: false,
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
    }

    let mut params = ModeParams::for_mode(mode);
    if let Some(candidate_size) = options.candidate_size {
        params.candidate_size = candidate_size;
    }

    let mut budget = ExtensionBudget::for_target(n, k);
    if let Some(max_iterations) = options.max_iterations {
        budget.max_iterations = max_iterations;
    }
    budget.max_backtracks = options.max_backtracks;
    budget.wall_time = Duration::from_millis(options.wall_time_ms);

    let extender = PathExtender::new(
        &spectrum,
        &reliable,
        &graph,
        &params,
        seed_sequence,
        options.seed,
    );
    let report = extender.run(&budget);

    let elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        length = report.sequence.len(),
        iterations = report.iterations,
        backtracks = report.backtracks,
        incomplete = report.incomplete,
        elapsed_ms,
        "reconstruction finished"
    );

    Ok(ReconstructionOutcome {
        sequence: report.sequence,
        mode,
        iterations: report.iterations,
        backtracks: report.backtracks,
        desperate_jumps: report.desperate_jumps,
        incomplete: report.incomplete,
        elapsed_ms,
    })
}
