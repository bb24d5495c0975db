//! Adaptive path extension: grow the backbone one base at a time until the
//! target length is reached.
//!
//! Four graded strategies are tried in an escalation ladder:
//! - standard: follow a full-overlap edge to an unconsumed reliable k-mer
//! - aggressive jump: commit to a high-connectivity k-mer at reduced overlap
//! - conservative jump: nearest unconsumed k-mer by tail Hamming distance
//! - desperate jump: seeded-random unconsumed k-mer behind a pad base
//!
//! A successful step resets the ladder; running out of strategies spends one
//! of a bounded number of backtracks. All selection is deterministic given
//! the seed: candidates are ranked over lexicographic node order, and the
//! only randomness is the desperate draw from an explicitly seeded RNG.

use std::time::{Duration, Instant};

use ahash::{AHashMap, AHashSet};
use tracing::{debug, trace};

use crate::core::data_structures::{suffix_prefix_overlap, Spectrum, ALPHABET};
use crate::reconstruction::overlap_graph::OverlapGraph;
use crate::reconstruction::profiler::ModeParams;
use crate::reconstruction::reliability::ReliableSet;

/// Hard limits for one extension run.
#[derive(Debug, Clone)]
pub struct ExtensionBudget {
    pub max_iterations: usize,
    pub max_backtracks: usize,
    pub wall_time: Duration,
    pub max_desperation: usize,
}

impl ExtensionBudget {
    /// Defaults scaled to the target length.
    pub fn for_target(n: usize, k: usize) -> Self {
        Self {
            max_iterations: 4 * n,
            max_backtracks: 10,
            wall_time: Duration::from_millis(30_000),
            max_desperation: n.div_ceil(k),
        }
    }
}

/// What one extension run did.
#[derive(Debug, Clone)]
pub struct ExtensionReport {
    pub sequence: String,
    pub iterations: usize,
    pub backtracks: usize,
    pub desperate_jumps: usize,
    pub incomplete: bool,
}

/// Ladder rungs, escalated on repeated failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Standard,
    Aggressive,
    Conservative,
    Desperate,
}

/// Consecutive standard failures before escalating to aggressive.
const STANDARD_PATIENCE: usize = 3;
/// Consecutive aggressive failures before escalating to conservative.
const AGGRESSIVE_PATIENCE: usize = 2;

pub struct PathExtender<'a> {
    spectrum: &'a Spectrum,
    reliable: &'a ReliableSet,
    graph: &'a OverlapGraph,
    params: &'a ModeParams,
    n: usize,
    k: usize,
    rng: fastrand::Rng,

    sequence: String,
    /// Window counts of the current sequence: the consumed multiset.
    used: AHashMap<String, u32>,
    /// (tail, base) pairs ruled out by backtracking.
    dead: AHashSet<(String, u8)>,

    iterations: usize,
    backtracks: usize,
    desperate_jumps: usize,
}

impl<'a> PathExtender<'a> {
    pub fn new(
        spectrum: &'a Spectrum,
        reliable: &'a ReliableSet,
        graph: &'a OverlapGraph,
        params: &'a ModeParams,
        seed_sequence: String,
        seed: u64,
    ) -> Self {
        let n = spectrum.n();
        let k = spectrum.k();

        let mut used: AHashMap<String, u32> = AHashMap::new();
        if seed_sequence.len() >= k {
            for i in 0..=seed_sequence.len() - k {
                *used.entry(seed_sequence[i..i + k].to_string()).or_insert(0) += 1;
            }
        }

        Self {
            spectrum,
            reliable,
            graph,
            params,
            n,
            k,
            rng: fastrand::Rng::with_seed(seed),
            sequence: seed_sequence,
            used,
            dead: AHashSet::new(),
            iterations: 0,
            backtracks: 0,
            desperate_jumps: 0,
        }
    }

    /// Run the escalation ladder until the target length or a budget limit.
    pub fn run(mut self, budget: &ExtensionBudget) -> ExtensionReport {
        let started = Instant::now();
        let mut strategy = Strategy::Standard;
        let mut standard_failures = 0usize;
        let mut aggressive_failures = 0usize;
        let mut incomplete = false;

        while self.sequence.len() < self.n {
            if started.elapsed() >= budget.wall_time {
                debug!("wall-time budget exhausted");
                incomplete = true;
                break;
            }
            if self.iterations >= budget.max_iterations {
                debug!("iteration budget exhausted");
                incomplete = true;
                break;
            }
            self.iterations += 1;

            let stepped = match strategy {
                Strategy::Standard => self.try_standard(),
                Strategy::Aggressive => self.try_aggressive(),
                Strategy::Conservative => self.try_conservative(),
                Strategy::Desperate => self.try_desperate(budget.max_desperation),
            };

            if stepped {
                strategy = Strategy::Standard;
                standard_failures = 0;
                aggressive_failures = 0;
                continue;
            }

            match strategy {
                Strategy::Standard => {
                    standard_failures += 1;
                    if standard_failures >= STANDARD_PATIENCE {
                        standard_failures = 0;
                        strategy = Strategy::Aggressive;
                    }
                }
                Strategy::Aggressive => {
                    aggressive_failures += 1;
                    if aggressive_failures >= AGGRESSIVE_PATIENCE {
                        aggressive_failures = 0;
                        strategy = Strategy::Conservative;
                    }
                }
                Strategy::Conservative => {
                    strategy = Strategy::Desperate;
                }
                Strategy::Desperate => {
                    // Every rung failed: spend a backtrack or give up.
                    if self.backtracks < budget.max_backtracks && self.backtrack() {
                        strategy = Strategy::Standard;
                    } else {
                        debug!("strategies and backtracks exhausted");
                        incomplete = true;
                        break;
                    }
                }
            }
        }

        if self.sequence.len() < self.n {
            incomplete = true;
            let missing = self.n - self.sequence.len();
            self.sequence.push_str(&"A".repeat(missing));
        }
        self.sequence.truncate(self.n);

        debug!(
            length = self.sequence.len(),
            iterations = self.iterations,
            backtracks = self.backtracks,
            desperate_jumps = self.desperate_jumps,
            incomplete,
            "extension finished"
        );

        ExtensionReport {
            sequence: self.sequence,
            iterations: self.iterations,
            backtracks: self.backtracks,
            desperate_jumps: self.desperate_jumps,
            incomplete,
        }
    }

    fn tail(&self) -> &str {
        &self.sequence[self.sequence.len() - (self.k - 1)..]
    }

    /// Multiset copies of a k-mer not yet consumed by the sequence.
    fn remaining(&self, kmer: &str) -> u32 {
        let consumed = self.used.get(kmer).copied().unwrap_or(0);
        self.spectrum.count(kmer).saturating_sub(consumed)
    }

    /// Append one base and account for the window it completes.
    fn push_base(&mut self, base: u8) {
        self.sequence.push(base as char);
        let window = self.sequence[self.sequence.len() - self.k..].to_string();
        *self.used.entry(window).or_insert(0) += 1;
    }

    /// Append the suffix of a jump target, stopping at the target length.
    fn push_jump(&mut self, body: &str) -> bool {
        let mut appended = false;
        for &base in body.as_bytes() {
            if self.sequence.len() >= self.n {
                break;
            }
            self.push_base(base);
            appended = true;
        }
        appended
    }

    /// Follow a full-overlap edge out of the current tail. Candidates are
    /// ranked by out-degree, then remaining multiplicity, then base order.
    fn try_standard(&mut self) -> bool {
        let tail = self.tail().to_string();
        let mut best: Option<(usize, u32, u8)> = None;

        for &base in &ALPHABET {
            if self.dead.contains(&(tail.clone(), base)) {
                continue;
            }
            let mut candidate = tail.clone();
            candidate.push(base as char);

            if !self.reliable.contains(&candidate) {
                continue;
            }
            let remaining = self.remaining(&candidate);
            if remaining == 0 {
                continue;
            }

            let out_degree = self
                .graph
                .node_id(&candidate)
                .map(|id| self.graph.out_degree(id))
                .unwrap_or(0);

            let better = match best {
                None => true,
                Some((best_out, best_rem, _)) => {
                    (out_degree, remaining) > (best_out, best_rem)
                }
            };
            if better {
                best = Some((out_degree, remaining, base));
            }
        }

        match best {
            Some((_, _, base)) => {
                self.push_base(base);
                true
            }
            None => false,
        }
    }

    /// Jump to one of the best-connected unconsumed reliable k-mers,
    /// preferring the largest realizable overlap with the sequence end.
    fn try_aggressive(&mut self) -> bool {
        let min_overlap = self.params.min_jump_overlap(self.k);

        // Unconsumed nodes in id (lexicographic) order, ranked by out-degree.
        let mut candidates: Vec<(usize, usize)> = (0..self.graph.node_count())
            .filter(|&id| self.remaining(self.graph.node(id).sequence()) > 0)
            .map(|id| (id, self.graph.out_degree(id)))
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        candidates.truncate(self.params.candidate_size);

        let mut best: Option<(usize, usize, usize)> = None; // (overlap, out, id)
        for &(id, out_degree) in &candidates {
            let target = self.graph.node(id).sequence();
            let overlap = suffix_prefix_overlap(&self.sequence, target, self.k - 1);
            if overlap < min_overlap {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_overlap, best_out, _)) => {
                    (overlap, out_degree) > (best_overlap, best_out)
                }
            };
            if better {
                best = Some((overlap, out_degree, id));
            }
        }

        match best {
            Some((overlap, _, id)) => {
                let body = self.graph.node(id).sequence()[overlap..].to_string();
                trace!(jump_to = %self.graph.node(id), overlap, "aggressive jump");
                self.push_jump(&body)
            }
            None => false,
        }
    }

    /// Jump to the unconsumed k-mer overlapping the tail by at least k-2,
    /// nearest to the tail by Hamming distance over the leading k-1 bases.
    fn try_conservative(&mut self) -> bool {
        let tail = self.tail().to_string();
        let floor = self.k.saturating_sub(2).max(1);

        let mut best: Option<(usize, usize, usize)> = None; // (hamming, id, overlap)
        for id in 0..self.graph.node_count() {
            let target = self.graph.node(id).sequence();
            if self.remaining(target) == 0 {
                continue;
            }
            let overlap = suffix_prefix_overlap(&tail, target, self.k - 1);
            if overlap < floor {
                continue;
            }
            let distance = hamming(tail.as_bytes(), &target.as_bytes()[..self.k - 1]);
            let better = match best {
                None => true,
                Some((best_distance, _, _)) => distance < best_distance,
            };
            if better {
                best = Some((distance, id, overlap));
            }
        }

        match best {
            Some((distance, id, overlap)) => {
                let body = self.graph.node(id).sequence()[overlap..].to_string();
                trace!(jump_to = %self.graph.node(id), distance, "conservative jump");
                self.push_jump(&body)
            }
            None => false,
        }
    }

    /// Last resort: a uniformly random unconsumed spectrum k-mer, appended
    /// whole behind the smallest pad base that opens an unseen window.
    fn try_desperate(&mut self, max_desperation: usize) -> bool {
        if self.desperate_jumps >= max_desperation {
            return false;
        }

        let available: Vec<String> = self
            .spectrum
            .unique_sorted()
            .into_iter()
            .filter(|kmer| self.remaining(kmer.sequence()) > 0)
            .map(|kmer| kmer.sequence().to_string())
            .collect();
        if available.is_empty() {
            return false;
        }

        let target = available[self.rng.usize(0..available.len())].clone();

        let tail = self.tail().to_string();
        let pad = ALPHABET
            .iter()
            .copied()
            .find(|&base| {
                let mut window = tail.clone();
                window.push(base as char);
                !self.used.contains_key(&window)
            })
            .unwrap_or(b'A');

        trace!(jump_to = %target, pad = %(pad as char), "desperate jump");
        self.desperate_jumps += 1;
        let mut body = String::with_capacity(target.len() + 1);
        body.push(pad as char);
        body.push_str(&target);
        self.push_jump(&body)
    }

    /// Undo the last appended base and blacklist the (tail, base) pair so
    /// standard steps cannot immediately repeat it.
    fn backtrack(&mut self) -> bool {
        if self.sequence.len() <= self.k {
            return false;
        }

        let window = self.sequence[self.sequence.len() - self.k..].to_string();
        if let Some(count) = self.used.get_mut(&window) {
            *count -= 1;
            if *count == 0 {
                self.used.remove(&window);
            }
        }

        let base = self.sequence.pop().expect("sequence is non-empty") as u8;
        let tail = self.tail().to_string();
        self.dead.insert((tail, base));
        self.backtracks += 1;
        trace!(length = self.sequence.len(), "backtracked one base");
        true
    }
}

fn hamming(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).filter(|(x, y)| x != y).count()
}
