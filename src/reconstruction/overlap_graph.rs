//! Compact overlap graph over the reliable k-mer set.
//!
//! Nodes are the reliable k-mers, ordered lexicographically so node ids are
//! stable across runs. Edges u -> v carry the maximal suffix/prefix overlap
//! between u and v; only overlaps down to k-3 are ever consulted, so shorter
//! ones are never materialized. Built from per-length prefix indices in
//! O(|R|) hash operations rather than through a general graph library.

use ahash::{AHashMap, AHashSet};
use tracing::debug;

use crate::core::data_structures::Kmer;
use crate::reconstruction::reliability::ReliableSet;

/// Smallest overlap the extender may consult, relative to k.
const MAX_OVERLAP_SLACK: usize = 2;

#[derive(Debug, Clone)]
pub struct OverlapGraph {
    k: usize,
    nodes: Vec<Kmer>,
    node_ids: AHashMap<String, usize>,
    /// Outgoing (target, weight), sorted weight-descending then target
    /// ascending. Node ids are lexicographic, so target order is too.
    succ: Vec<Vec<(usize, usize)>>,
    pred: Vec<Vec<(usize, usize)>>,
    /// Degrees restricted to the full (k-1)-overlap subgraph.
    in_deg: Vec<usize>,
    out_deg: Vec<usize>,
}

impl OverlapGraph {
    pub fn build(reliable: &ReliableSet, k: usize) -> Self {
        let nodes: Vec<Kmer> = reliable.kmers().to_vec();
        let node_ids: AHashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(id, kmer)| (kmer.sequence().to_string(), id))
            .collect();

        let full = k - 1;
        let shortest = full.saturating_sub(MAX_OVERLAP_SLACK).max(1);

        let mut succ: Vec<Vec<(usize, usize)>> = vec![Vec::new(); nodes.len()];
        let mut pred: Vec<Vec<(usize, usize)>> = vec![Vec::new(); nodes.len()];
        let mut seen: AHashSet<(usize, usize)> = AHashSet::new();

        // Longest overlaps first: the first edge recorded for a pair is the
        // maximal one, shorter rediscoveries are skipped.
        for w in (shortest..=full).rev() {
            let mut by_prefix: AHashMap<&str, Vec<usize>> = AHashMap::new();
            for (id, kmer) in nodes.iter().enumerate() {
                by_prefix.entry(&kmer.sequence()[..w]).or_default().push(id);
            }

            for (u, kmer) in nodes.iter().enumerate() {
                let tail = &kmer.sequence()[k - w..];
                if let Some(targets) = by_prefix.get(tail) {
                    for &v in targets {
                        if seen.insert((u, v)) {
                            succ[u].push((v, w));
                            pred[v].push((u, w));
                        }
                    }
                }
            }
        }

        for adjacency in succ.iter_mut().chain(pred.iter_mut()) {
            adjacency.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        }

        let mut in_deg = vec![0usize; nodes.len()];
        let mut out_deg = vec![0usize; nodes.len()];
        for (u, adjacency) in succ.iter().enumerate() {
            for &(v, w) in adjacency {
                if w == full {
                    out_deg[u] += 1;
                    in_deg[v] += 1;
                }
            }
        }

        let edge_count: usize = succ.iter().map(|a| a.len()).sum();
        debug!(nodes = nodes.len(), edges = edge_count, "overlap graph built");

        Self {
            k,
            nodes,
            node_ids,
            succ,
            pred,
            in_deg,
            out_deg,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: usize) -> &Kmer {
        &self.nodes[id]
    }

    pub fn node_id(&self, sequence: &str) -> Option<usize> {
        self.node_ids.get(sequence).copied()
    }

    /// Outgoing edges with weight >= min_overlap, sorted by weight descending
    /// then target ascending.
    pub fn successors(&self, u: usize, min_overlap: usize) -> Vec<(usize, usize)> {
        self.succ[u]
            .iter()
            .copied()
            .filter(|&(_, w)| w >= min_overlap)
            .collect()
    }

    pub fn predecessors(&self, v: usize, min_overlap: usize) -> Vec<(usize, usize)> {
        self.pred[v]
            .iter()
            .copied()
            .filter(|&(_, w)| w >= min_overlap)
            .collect()
    }

    /// In-degree in the (k-1)-overlap subgraph.
    pub fn in_degree(&self, v: usize) -> usize {
        self.in_deg[v]
    }

    /// Out-degree in the (k-1)-overlap subgraph.
    pub fn out_degree(&self, u: usize) -> usize {
        self.out_deg[u]
    }

    /// The single full-overlap successor of a non-branching node.
    pub fn sole_successor(&self, u: usize) -> Option<usize> {
        if self.out_deg[u] != 1 {
            return None;
        }
        self.succ[u]
            .iter()
            .find(|&&(_, w)| w == self.k - 1)
            .map(|&(v, _)| v)
    }

    /// The single full-overlap predecessor of a non-converging node.
    pub fn sole_predecessor(&self, v: usize) -> Option<usize> {
        if self.in_deg[v] != 1 {
            return None;
        }
        self.pred[v]
            .iter()
            .find(|&&(_, w)| w == self.k - 1)
            .map(|&(u, _)| u)
    }
}
