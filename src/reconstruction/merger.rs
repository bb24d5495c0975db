//! Greedy contig merging: repeatedly stitch the pair of contigs with the
//! longest suffix/prefix overlap until no pair overlaps by at least k-1.
//! The survivors are the backbones extension starts from.

use tracing::debug;

use crate::core::data_structures::suffix_prefix_overlap;
use crate::reconstruction::contig::Contig;

/// Best merge candidate of one round.
struct Merge {
    overlap: usize,
    left: usize,
    right: usize,
}

fn best_merge(contigs: &[Contig], k: usize) -> Option<Merge> {
    let mut best: Option<Merge> = None;

    for (i, a) in contigs.iter().enumerate() {
        for (j, b) in contigs.iter().enumerate() {
            if i == j {
                continue;
            }
            // Proper overlap only: neither contig may be swallowed whole.
            let cap = a.len().min(b.len()) - 1;
            let overlap = suffix_prefix_overlap(&a.sequence, &b.sequence, cap);
            if overlap < k - 1 {
                continue;
            }

            let better = match &best {
                None => true,
                Some(current) => {
                    let cur_a = &contigs[current.left].sequence;
                    let cur_b = &contigs[current.right].sequence;
                    overlap > current.overlap
                        || (overlap == current.overlap
                            && (a.sequence.as_str(), b.sequence.as_str())
                                < (cur_a.as_str(), cur_b.as_str()))
                }
            };
            if better {
                best = Some(Merge {
                    overlap,
                    left: i,
                    right: j,
                });
            }
        }
    }

    best
}

/// Run the greedy merger to fixpoint and return the backbones, longest first
/// with lexicographic tie-breaking.
pub fn merge_contigs(mut contigs: Vec<Contig>, k: usize) -> Vec<Contig> {
    let initial = contigs.len();

    while let Some(merge) = best_merge(&contigs, k) {
        // Remove the higher index first so the lower one stays valid.
        let (first, second) = if merge.left > merge.right {
            (merge.left, merge.right)
        } else {
            (merge.right, merge.left)
        };
        let one = contigs.swap_remove(first);
        let other = contigs.swap_remove(second);
        let (a, b) = if first == merge.left { (one, other) } else { (other, one) };

        let mut sequence = a.sequence;
        sequence.push_str(&b.sequence[merge.overlap..]);
        let mut nodes = a.nodes;
        nodes.extend(b.nodes);

        contigs.push(Contig {
            sequence,
            nodes,
            circular: false,
        });
    }

    contigs.sort_unstable_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| a.sequence.cmp(&b.sequence))
    });

    debug!(
        initial,
        backbones = contigs.len(),
        longest = contigs.first().map(|c| c.len()).unwrap_or(0),
        "contig merging complete"
    );
    contigs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contig(sequence: &str) -> Contig {
        Contig {
            sequence: sequence.to_string(),
            nodes: Vec::new(),
            circular: false,
        }
    }

    #[test]
    fn test_merges_longest_overlap_first() {
        // "ACGTAC" overlaps "GTACGG" by 4 and "TACGTT" by 3 (k-1 = 3).
        let contigs = vec![contig("ACGTAC"), contig("GTACGG"), contig("TACGTT")];
        let backbones = merge_contigs(contigs, 4);

        // First merge takes the overlap-4 pair, producing ACGTACGG, whose
        // suffix no longer reaches TACGTT.
        assert_eq!(backbones[0].sequence, "ACGTACGG");
        assert!(backbones.iter().any(|c| c.sequence == "TACGTT"));
    }

    #[test]
    fn test_chain_merges_to_single_backbone() {
        let contigs = vec![contig("TTACG"), contig("ACGTA"), contig("GTACC")];
        let backbones = merge_contigs(contigs, 4);

        assert_eq!(backbones.len(), 1);
        assert_eq!(backbones[0].sequence, "TTACGTACC");
    }

    #[test]
    fn test_overlap_below_threshold_is_ignored() {
        let contigs = vec![contig("ACGTT"), contig("TTGCA")];
        // Overlap is 2 < k-1 = 3: nothing merges.
        let backbones = merge_contigs(contigs, 4);
        assert_eq!(backbones.len(), 2);
    }

    #[test]
    fn test_tie_breaks_lexicographically() {
        // Both CCCTA and GGGTA overlap TAAAG by 2 (k-1 = 2 at k = 3).
        let contigs = vec![contig("GGGTA"), contig("CCCTA"), contig("TAAAG")];
        let backbones = merge_contigs(contigs, 3);

        // CCCTA < GGGTA, so the lexicographically smaller left side wins.
        assert!(backbones.iter().any(|c| c.sequence == "CCCTAAAG"));
        assert!(backbones.iter().any(|c| c.sequence == "GGGTA"));
    }

    #[test]
    fn test_no_self_merge() {
        let contigs = vec![contig("ATATA")];
        let backbones = merge_contigs(contigs, 3);
        assert_eq!(backbones.len(), 1);
        assert_eq!(backbones[0].sequence, "ATATA");
    }

    #[test]
    fn test_sorted_longest_first() {
        let contigs = vec![contig("ACGT"), contig("GGGGGG"), contig("TTTT")];
        let backbones = merge_contigs(contigs, 4);
        assert_eq!(backbones[0].sequence, "GGGGGG");
    }
}
