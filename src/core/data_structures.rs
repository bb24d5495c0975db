use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core data structures for spectrum reconstruction.
/// Implements validated k-mer handling, the spectrum multiset, and the
/// suffix/prefix overlap primitives every downstream stage builds on.

/// The DNA alphabet, in the lexicographic order used for all tie-breaking.
pub const ALPHABET: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Smallest supported oligonucleotide length.
pub const MIN_K: usize = 2;
/// Largest supported oligonucleotide length.
pub const MAX_K: usize = 64;

/// Input rejections surfaced to the caller as a distinct failure class.
/// Everything else that can go wrong during reconstruction is reported as
/// flags and counters on the outcome record instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("spectrum is empty")]
    EmptySpectrum,
    #[error("target length {n} is shorter than k-mer length {k}")]
    TargetShorterThanK { n: usize, k: usize },
    #[error("k-mer length {0} is out of the supported range [{MIN_K}, {MAX_K}]")]
    KOutOfRange(usize),
    #[error("k-mer {0:?} has length {1}, expected {2}")]
    LengthMismatch(String, usize, usize),
    #[error("invalid DNA character {0:?} at position {1} of {2:?}")]
    InvalidCharacter(char, usize, String),
}

/// An immutable oligonucleotide of fixed length over {A,C,G,T}.
///
/// Equality and ordering are plain string comparison; hashing depends only on
/// the sequence content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Kmer {
    sequence: String,
}

impl Kmer {
    /// Validate and wrap a k-mer. The alphabet is strict: ambiguity codes and
    /// lowercase input are rejected at the call boundary.
    pub fn new(sequence: &str) -> Result<Self, ValidationError> {
        validate_dna_sequence(sequence)?;
        Ok(Self {
            sequence: sequence.to_string(),
        })
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Length-(k-1) prefix, the incoming overlap handle.
    pub fn prefix(&self) -> &str {
        &self.sequence[..self.sequence.len() - 1]
    }

    /// Length-(k-1) suffix, the outgoing overlap handle.
    pub fn suffix(&self) -> &str {
        &self.sequence[1..]
    }
}

impl std::fmt::Display for Kmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sequence)
    }
}

/// The input multiset of k-mers together with the reconstruction parameters
/// it was hybridized under. Immutable once built.
#[derive(Debug, Clone)]
pub struct Spectrum {
    kmers: Vec<Kmer>,
    counts: AHashMap<String, u32>,
    n: usize,
    k: usize,
}

impl Spectrum {
    /// Validate the raw input and freeze it into a spectrum.
    pub fn new(kmers: &[String], n: usize, k: usize) -> Result<Self, ValidationError> {
        if !(MIN_K..=MAX_K).contains(&k) {
            return Err(ValidationError::KOutOfRange(k));
        }
        if n < k {
            return Err(ValidationError::TargetShorterThanK { n, k });
        }
        if kmers.is_empty() {
            return Err(ValidationError::EmptySpectrum);
        }

        let mut validated = Vec::with_capacity(kmers.len());
        let mut counts: AHashMap<String, u32> = AHashMap::with_capacity(kmers.len());
        for raw in kmers {
            if raw.len() != k {
                return Err(ValidationError::LengthMismatch(raw.clone(), raw.len(), k));
            }
            let kmer = Kmer::new(raw)?;
            *counts.entry(raw.clone()).or_insert(0) += 1;
            validated.push(kmer);
        }

        Ok(Self {
            kmers: validated,
            counts,
            n,
            k,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of k-mers a perfect error-free spectrum would contain.
    pub fn expected_count(&self) -> usize {
        self.n - self.k + 1
    }

    /// Multiset size, duplicates included.
    pub fn size(&self) -> usize {
        self.kmers.len()
    }

    pub fn unique_count(&self) -> usize {
        self.counts.len()
    }

    /// Multiplicity of a k-mer in the spectrum (0 if absent).
    pub fn count(&self, sequence: &str) -> u32 {
        self.counts.get(sequence).copied().unwrap_or(0)
    }

    pub fn contains(&self, sequence: &str) -> bool {
        self.counts.contains_key(sequence)
    }

    /// All k-mers in input order, duplicates included.
    pub fn kmers(&self) -> &[Kmer] {
        &self.kmers
    }

    /// Unique k-mers in lexicographic order. Selection logic downstream
    /// iterates this instead of the hash map so results never depend on
    /// hash-seed iteration order.
    pub fn unique_sorted(&self) -> Vec<Kmer> {
        let mut unique: Vec<Kmer> = self
            .counts
            .keys()
            .map(|s| Kmer {
                sequence: s.clone(),
            })
            .collect();
        unique.sort_unstable();
        unique
    }
}

/// Reject anything outside the strict {A,C,G,T} alphabet.
pub fn validate_dna_sequence(sequence: &str) -> Result<(), ValidationError> {
    for (i, c) in sequence.chars().enumerate() {
        if !matches!(c, 'A' | 'C' | 'G' | 'T') {
            return Err(ValidationError::InvalidCharacter(c, i, sequence.to_string()));
        }
    }
    Ok(())
}

/// Longest w <= max_overlap such that the last w characters of `left` equal
/// the first w characters of `right`.
///
/// Computed with a KMP prefix function over `right # left`, so a single call
/// is linear in the combined length rather than quadratic in the overlap cap.
pub fn suffix_prefix_overlap(left: &str, right: &str, max_overlap: usize) -> usize {
    if left.is_empty() || right.is_empty() || max_overlap == 0 {
        return 0;
    }

    // '#' cannot occur in validated DNA, so matches never cross the seam.
    let mut combined = Vec::with_capacity(right.len() + 1 + left.len());
    combined.extend_from_slice(right.as_bytes());
    combined.push(b'#');
    combined.extend_from_slice(left.as_bytes());

    let pi = prefix_function(&combined);
    let mut w = pi[combined.len() - 1];
    while w > max_overlap {
        w = pi[w - 1];
    }
    w
}

/// Classic KMP failure table: pi[i] is the longest proper prefix of s[..=i]
/// that is also a suffix of it.
fn prefix_function(s: &[u8]) -> Vec<usize> {
    let mut pi = vec![0usize; s.len()];
    for i in 1..s.len() {
        let mut j = pi[i - 1];
        while j > 0 && s[i] != s[j] {
            j = pi[j - 1];
        }
        if s[i] == s[j] {
            j += 1;
        }
        pi[i] = j;
    }
    pi
}

/// Shannon entropy (base 2) of the base composition, in bits: 0.0 for a
/// homopolymer, 2.0 for a perfectly balanced sequence.
pub fn shannon_entropy(sequence: &str) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }

    let mut counts = [0u64; 4];
    for byte in sequence.bytes() {
        match byte {
            b'A' => counts[0] += 1,
            b'C' => counts[1] += 1,
            b'G' => counts[2] += 1,
            b'T' => counts[3] += 1,
            _ => {}
        }
    }

    let total = counts.iter().sum::<u64>() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Number of distinct bases occurring in the sequence.
pub fn distinct_bases(sequence: &str) -> usize {
    let mut seen = [false; 4];
    for byte in sequence.bytes() {
        match byte {
            b'A' => seen[0] = true,
            b'C' => seen[1] = true,
            b'G' => seen[2] = true,
            b'T' => seen[3] = true,
            _ => {}
        }
    }
    seen.iter().filter(|&&s| s).count()
}

/// Length of the longest run of one repeated base.
pub fn max_homopolymer_run(sequence: &str) -> usize {
    let bytes = sequence.as_bytes();
    let mut longest = 0;
    let mut current = 0;
    let mut prev = 0u8;
    for &b in bytes {
        if b == prev {
            current += 1;
        } else {
            current = 1;
            prev = b;
        }
        longest = longest.max(current);
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kmer_validation() {
        assert!(Kmer::new("ACGT").is_ok());
        assert!(matches!(
            Kmer::new("ACGN"),
            Err(ValidationError::InvalidCharacter('N', 3, _))
        ));
        assert!(Kmer::new("acgt").is_err()); // strict alphabet, no lowercase
    }

    #[test]
    fn test_kmer_affixes() {
        let kmer = Kmer::new("ACGT").unwrap();
        assert_eq!(kmer.prefix(), "ACG");
        assert_eq!(kmer.suffix(), "CGT");
    }

    #[test]
    fn test_spectrum_construction() {
        let kmers = vec!["ACG".to_string(), "CGT".to_string(), "ACG".to_string()];
        let spectrum = Spectrum::new(&kmers, 10, 3).unwrap();

        assert_eq!(spectrum.size(), 3);
        assert_eq!(spectrum.unique_count(), 2);
        assert_eq!(spectrum.count("ACG"), 2);
        assert_eq!(spectrum.count("CGT"), 1);
        assert_eq!(spectrum.count("GTA"), 0);
        assert_eq!(spectrum.expected_count(), 8);
    }

    #[test]
    fn test_spectrum_rejects_bad_input() {
        assert_eq!(
            Spectrum::new(&[], 10, 4).unwrap_err(),
            ValidationError::EmptySpectrum
        );
        assert_eq!(
            Spectrum::new(&["ACGT".to_string()], 3, 4).unwrap_err(),
            ValidationError::TargetShorterThanK { n: 3, k: 4 }
        );
        assert_eq!(
            Spectrum::new(&["A".to_string()], 10, 1).unwrap_err(),
            ValidationError::KOutOfRange(1)
        );
        assert!(matches!(
            Spectrum::new(&["ACG".to_string()], 10, 4).unwrap_err(),
            ValidationError::LengthMismatch(_, 3, 4)
        ));
    }

    #[test]
    fn test_unique_sorted_is_lexicographic() {
        let kmers = vec!["TTT".to_string(), "AAA".to_string(), "CCC".to_string()];
        let spectrum = Spectrum::new(&kmers, 10, 3).unwrap();
        let unique: Vec<String> = spectrum
            .unique_sorted()
            .iter()
            .map(|k| k.sequence().to_string())
            .collect();
        assert_eq!(unique, vec!["AAA", "CCC", "TTT"]);
    }

    #[test]
    fn test_suffix_prefix_overlap() {
        assert_eq!(suffix_prefix_overlap("ACGT", "CGTA", 3), 3);
        assert_eq!(suffix_prefix_overlap("ACGT", "GTAC", 3), 2);
        assert_eq!(suffix_prefix_overlap("ACGT", "TACG", 3), 1);
        assert_eq!(suffix_prefix_overlap("AAAA", "CCCC", 3), 0);
        // Cap forces acceptance of a shorter match even when a longer exists.
        assert_eq!(suffix_prefix_overlap("AAAA", "AAAA", 2), 2);
        assert_eq!(suffix_prefix_overlap("", "ACGT", 3), 0);
    }

    #[test]
    fn test_overlap_is_maximal_below_cap() {
        // Suffix "ATAT" matches prefix "ATAT"; with cap 3 the next match down
        // is "AT" of length 2, not 3.
        assert_eq!(suffix_prefix_overlap("GGATAT", "ATATCC", 5), 4);
        assert_eq!(suffix_prefix_overlap("GGATAT", "ATATCC", 3), 2);
    }

    #[test]
    fn test_shannon_entropy() {
        assert_eq!(shannon_entropy("AAAA"), 0.0);
        assert!((shannon_entropy("ACGT") - 2.0).abs() < 1e-9);
        let mid = shannon_entropy("AACC");
        assert!((mid - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_homopolymer_and_distinct() {
        assert_eq!(max_homopolymer_run("AAACGT"), 3);
        assert_eq!(max_homopolymer_run("ACGT"), 1);
        assert_eq!(max_homopolymer_run(""), 0);
        assert_eq!(distinct_bases("AAAA"), 1);
        assert_eq!(distinct_bases("ACGT"), 4);
    }
}
