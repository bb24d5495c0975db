//! Unitig extraction: maximal non-branching paths in the full-overlap
//! subgraph become contigs, the anchors for merging and extension.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reconstruction::overlap_graph::OverlapGraph;

/// A contiguous stretch spelled by a non-branching node path. Keeps the node
/// ids it was built from for traceability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contig {
    pub sequence: String,
    pub nodes: Vec<usize>,
    pub circular: bool,
}

impl Contig {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Spell the sequence of a path: first k-mer in full, then one base per
/// following node (consecutive nodes overlap by k-1).
fn spell_path(graph: &OverlapGraph, path: &[usize]) -> String {
    let mut sequence = String::with_capacity(graph.k() + path.len() - 1);
    sequence.push_str(graph.node(path[0]).sequence());
    for &node in &path[1..] {
        let seq = graph.node(node).sequence();
        sequence.push(seq.as_bytes()[seq.len() - 1] as char);
    }
    sequence
}

/// True when `node` opens a unitig: its in-degree differs from one, or its
/// single predecessor branches and cannot absorb it.
fn starts_contig(graph: &OverlapGraph, node: usize) -> bool {
    match graph.sole_predecessor(node) {
        None => true,
        Some(pred) => graph.out_degree(pred) != 1,
    }
}

/// Extract every unitig. Each node lands in exactly one contig: linear
/// stretches in the first pass, leftover pure cycles in the second, opened at
/// their lexicographically smallest node. Output is sorted longest-first,
/// ties broken lexicographically.
pub fn extract_contigs(graph: &OverlapGraph) -> Vec<Contig> {
    let mut visited = vec![false; graph.node_count()];
    let mut contigs = Vec::new();

    for start in 0..graph.node_count() {
        if visited[start] || !starts_contig(graph, start) {
            continue;
        }

        let mut path = vec![start];
        visited[start] = true;
        let mut current = start;
        while let Some(next) = graph.sole_successor(current) {
            if visited[next] || graph.in_degree(next) != 1 {
                break;
            }
            path.push(next);
            visited[next] = true;
            current = next;
        }

        contigs.push(Contig {
            sequence: spell_path(graph, &path),
            nodes: path,
            circular: false,
        });
    }

    // Whatever remains sits on cycles where every node has in- and
    // out-degree one. Node ids are lexicographic, so the smallest unvisited
    // id on each cycle is its opening point.
    for start in 0..graph.node_count() {
        if visited[start] {
            continue;
        }

        let mut path = vec![start];
        visited[start] = true;
        let mut current = start;
        while let Some(next) = graph.sole_successor(current) {
            if next == start || visited[next] {
                break;
            }
            path.push(next);
            visited[next] = true;
            current = next;
        }

        contigs.push(Contig {
            sequence: spell_path(graph, &path),
            nodes: path,
            circular: true,
        });
    }

    contigs.sort_unstable_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| a.sequence.cmp(&b.sequence))
    });

    debug!(contigs = contigs.len(), "unitig extraction complete");
    contigs
}
