//! Reliability filtering: extract the subset of k-mers trusted enough to
//! anchor the overlap graph.
//!
//! How strict the filter is depends on the mode chosen by the profiler.
//! Filtering never fails the call: a result that keeps too little of the
//! spectrum relaxes the predicate, fewer than two survivors downgrade the
//! mode and re-run, and as a last resort the full unique spectrum stands in.

use ahash::{AHashMap, AHashSet};
use tracing::debug;

use crate::core::data_structures::{
    distinct_bases, max_homopolymer_run, shannon_entropy, Kmer, Spectrum,
};
use crate::reconstruction::profiler::{Mode, ModeParams};

/// The trusted subset of unique k-mers. Membership is final once built;
/// iteration order is lexicographic so downstream selection is deterministic.
#[derive(Debug, Clone)]
pub struct ReliableSet {
    kmers: Vec<Kmer>,
    index: AHashSet<String>,
}

impl ReliableSet {
    fn from_sorted(kmers: Vec<Kmer>) -> Self {
        let index = kmers.iter().map(|k| k.sequence().to_string()).collect();
        Self { kmers, index }
    }

    /// Build a set directly from arbitrary k-mers, deduplicating and sorting.
    /// Used when the filter is bypassed and the full spectrum stands in.
    pub fn from_kmers(mut kmers: Vec<Kmer>) -> Self {
        kmers.sort_unstable();
        kmers.dedup();
        Self::from_sorted(kmers)
    }

    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }

    pub fn contains(&self, sequence: &str) -> bool {
        self.index.contains(sequence)
    }

    /// K-mers in lexicographic order.
    pub fn kmers(&self) -> &[Kmer] {
        &self.kmers
    }

    /// Lexicographically smallest member, the fallback seed for extension.
    pub fn smallest(&self) -> Option<&Kmer> {
        self.kmers.first()
    }
}

/// Adjacency evidence shared by the per-mode predicates: for each unique
/// k-mer, whether some *other* spectrum occurrence overlaps it by k-1 at
/// either end.
struct NeighborIndex {
    prefixes: AHashMap<String, u32>,
    suffixes: AHashMap<String, u32>,
}

impl NeighborIndex {
    fn build(spectrum: &Spectrum) -> Self {
        let mut prefixes: AHashMap<String, u32> = AHashMap::new();
        let mut suffixes: AHashMap<String, u32> = AHashMap::new();
        for kmer in spectrum.kmers() {
            *prefixes.entry(kmer.prefix().to_string()).or_insert(0) += 1;
            *suffixes.entry(kmer.suffix().to_string()).or_insert(0) += 1;
        }
        Self { prefixes, suffixes }
    }

    /// True when at least one other spectrum k-mer extends `kmer` by a full
    /// (k-1)-overlap on either side. A k-mer's own suffix matching its own
    /// prefix only counts when the spectrum holds more than one copy of it.
    fn has_neighbor(&self, kmer: &Kmer, multiplicity: u32) -> bool {
        let self_chains = kmer.suffix() == kmer.prefix();

        let outgoing = self.prefixes.get(kmer.suffix()).copied().unwrap_or(0);
        let outgoing_others = if self_chains { outgoing.saturating_sub(1) } else { outgoing };
        if outgoing_others > 0 || (self_chains && multiplicity > 1) {
            return true;
        }

        let incoming = self.suffixes.get(kmer.prefix()).copied().unwrap_or(0);
        let incoming_others = if self_chains { incoming.saturating_sub(1) } else { incoming };
        incoming_others > 0
    }
}

fn is_reliable(
    kmer: &Kmer,
    mode: Mode,
    params: &ModeParams,
    neighbors: &NeighborIndex,
    multiplicity: u32,
    k: usize,
) -> bool {
    if mode == Mode::Rescue {
        return neighbors.has_neighbor(kmer, multiplicity);
    }

    let informative = distinct_bases(kmer.sequence()) >= 3
        || shannon_entropy(kmer.sequence()) >= params.entropy_floor;
    if !informative {
        return false;
    }

    let max_run = k.div_ceil(2);
    if max_homopolymer_run(kmer.sequence()) > max_run {
        return false;
    }

    match mode {
        Mode::Conservative => true,
        _ => neighbors.has_neighbor(kmer, multiplicity),
    }
}

fn run_filter(spectrum: &Spectrum, mode: Mode, neighbors: &NeighborIndex) -> Vec<Kmer> {
    let params = ModeParams::for_mode(mode);
    let k = spectrum.k();
    spectrum
        .unique_sorted()
        .into_iter()
        .filter(|kmer| {
            is_reliable(
                kmer,
                mode,
                &params,
                neighbors,
                spectrum.count(kmer.sequence()),
                k,
            )
        })
        .collect()
}

/// Select the reliable subset for the given mode.
///
/// Returns the set together with the (possibly downgraded) mode actually
/// used. Three safety valves apply in order: a filter that keeps under a
/// quarter of the unique spectrum is re-run with the rescue predicate (the
/// mode itself stays put), fewer than two survivors downgrade the mode to
/// rescue and re-run, and if that still leaves fewer than two the full
/// unique spectrum stands in. Downgrades are one-way.
pub fn filter_reliable(spectrum: &Spectrum, mode: Mode) -> (ReliableSet, Mode) {
    let neighbors = NeighborIndex::build(spectrum);

    let mut selected = run_filter(spectrum, mode, &neighbors);
    let mut effective_mode = mode;

    // Rejecting most of the spectrum starves the graph: low-complexity
    // regions of the target lose their only anchors and can never be
    // reassembled. Relax the predicate, not the mode.
    if mode != Mode::Rescue && selected.len() * 4 < spectrum.unique_count() {
        let relaxed = run_filter(spectrum, Mode::Rescue, &neighbors);
        if relaxed.len() > selected.len() {
            debug!(
                kept = selected.len(),
                relaxed = relaxed.len(),
                unique = spectrum.unique_count(),
                "filter kept under a quarter of the spectrum, relaxing predicate"
            );
            selected = relaxed;
        }
    }

    if selected.len() < 2 && mode != Mode::Rescue {
        effective_mode = Mode::Rescue;
        debug!(
            survivors = selected.len(),
            "reliability filter too strict, downgrading to rescue and re-running"
        );
        selected = run_filter(spectrum, Mode::Rescue, &neighbors);
    }

    if selected.len() < 2 {
        debug!("fewer than two k-mers survived, falling back to the full unique spectrum");
        selected = spectrum.unique_sorted();
    }

    debug!(
        reliable = selected.len(),
        unique = spectrum.unique_count(),
        mode = %effective_mode,
        "reliability filter complete"
    );

    (ReliableSet::from_sorted(selected), effective_mode)
}
