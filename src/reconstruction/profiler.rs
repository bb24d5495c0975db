//! Spectrum quality profiling and reconstruction mode selection.
//!
//! Summary statistics over the input multiset decide how much the rest of the
//! pipeline is allowed to trust it: clean spectra get the tightest thresholds,
//! noisy spectra fall back to rescue behavior earlier.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::data_structures::{shannon_entropy, Spectrum};

/// Reconstruction mode. Every downstream threshold is parameterized by this
/// single tag; downgrades are one-way (conservative -> aggressive -> rescue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Conservative,
    Aggressive,
    Rescue,
}

impl Mode {
    /// One step down the trust ladder. Rescue is terminal.
    pub fn downgrade(self) -> Mode {
        match self {
            Mode::Conservative => Mode::Aggressive,
            Mode::Aggressive => Mode::Rescue,
            Mode::Rescue => Mode::Rescue,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Conservative => "conservative",
            Mode::Aggressive => "aggressive",
            Mode::Rescue => "rescue",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds a mode implies for the filter and the extender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeParams {
    /// How many jump candidates the extender ranks per attempt.
    pub candidate_size: usize,
    /// How far below k-1 a jump overlap may fall (0, 1 or 2).
    pub jump_overlap_slack: usize,
    /// Shannon-entropy floor a k-mer must clear to count as informative.
    pub entropy_floor: f64,
}

impl ModeParams {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Conservative => Self {
                candidate_size: 8,
                jump_overlap_slack: 0,
                entropy_floor: 1.4,
            },
            Mode::Aggressive => Self {
                candidate_size: 20,
                jump_overlap_slack: 1,
                entropy_floor: 1.2,
            },
            Mode::Rescue => Self {
                candidate_size: 30,
                jump_overlap_slack: 2,
                entropy_floor: 1.2,
            },
        }
    }

    /// Minimum suffix/prefix overlap a jump must realize, never below 1.
    pub fn min_jump_overlap(&self, k: usize) -> usize {
        (k - 1).saturating_sub(self.jump_overlap_slack).max(1)
    }
}

/// Summary statistics of a spectrum plus the mode they select.
/// Produced once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Multiset size, duplicates included.
    pub size: usize,
    pub unique_count: usize,
    /// 1 - unique/size: how much of the multiset is repeats.
    pub duplication_ratio: f64,
    /// size / (n - k + 1). Above 1 suggests positive errors, below 1 negative.
    pub coverage_ratio: f64,
    /// Shannon entropy of base frequencies over all k-mers, in [0, 2].
    pub entropy: f64,
    pub mode: Mode,
}

/// Coverage-ratio bound above which positive errors are suspected.
pub const OVERSUBSCRIBED: f64 = 1.05;
/// Coverage-ratio bound below which negative errors are suspected.
pub const UNDERSUBSCRIBED: f64 = 0.80;

impl Profile {
    /// More k-mers than an error-free spectrum would hold.
    pub fn is_oversubscribed(&self) -> bool {
        self.coverage_ratio >= OVERSUBSCRIBED
    }

    /// Fewer k-mers than an error-free spectrum would hold.
    pub fn is_undersubscribed(&self) -> bool {
        self.coverage_ratio < UNDERSUBSCRIBED
    }
}

/// Classify a spectrum and select the reconstruction mode.
///
/// `error_threshold` is the coverage gap beyond which the selected mode is
/// downgraded one step before being returned.
pub fn profile_spectrum(spectrum: &Spectrum, error_threshold: f64) -> Profile {
    let size = spectrum.size();
    let unique_count = spectrum.unique_count();
    let duplication_ratio = 1.0 - unique_count as f64 / size as f64;
    let coverage_ratio = size as f64 / spectrum.expected_count() as f64;

    let mut concatenated = String::with_capacity(size * spectrum.k());
    for kmer in spectrum.kmers() {
        concatenated.push_str(kmer.sequence());
    }
    let entropy = shannon_entropy(&concatenated);

    // First matching rule wins.
    let mut mode = if (0.95..=1.05).contains(&coverage_ratio)
        && duplication_ratio < 0.05
        && entropy > 1.9
    {
        Mode::Conservative
    } else if (0.80..=1.20).contains(&coverage_ratio) && entropy > 1.7 {
        Mode::Aggressive
    } else {
        Mode::Rescue
    };

    let coverage_gap = (coverage_ratio - 1.0).abs();
    if coverage_gap > error_threshold {
        let downgraded = mode.downgrade();
        debug!(
            coverage_gap,
            from = %mode,
            to = %downgraded,
            "coverage gap exceeds error threshold, downgrading mode"
        );
        mode = downgraded;
    }

    debug!(
        size,
        unique_count, duplication_ratio, coverage_ratio, entropy, %mode,
        "spectrum profiled"
    );

    Profile {
        size,
        unique_count,
        duplication_ratio,
        coverage_ratio,
        entropy,
        mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_structures::Spectrum;

    fn windows(dna: &str, k: usize) -> Vec<String> {
        (0..=dna.len() - k).map(|i| dna[i..i + k].to_string()).collect()
    }

    #[test]
    fn test_clean_balanced_spectrum_is_conservative() {
        // 57 windows of a non-repetitive balanced sequence: full coverage,
        // no duplicates, entropy near 2.
        let dna = "ACGTAGCTTGCACATGGTACCGATCGGATATCCGCAAGTGTTGACTCAGCATCGACTGGAACGT";
        let k = 8;
        let spectrum = Spectrum::new(&windows(dna, k), dna.len(), k).unwrap();
        let profile = profile_spectrum(&spectrum, 0.15);

        assert!((profile.coverage_ratio - 1.0).abs() < 1e-9);
        assert!(profile.duplication_ratio < 0.05);
        assert!(profile.entropy > 1.9);
        assert_eq!(profile.mode, Mode::Conservative);
    }

    #[test]
    fn test_degenerate_spectrum_is_rescue() {
        let kmers = vec!["AAAAA".to_string(); 46];
        let spectrum = Spectrum::new(&kmers, 50, 5).unwrap();
        let profile = profile_spectrum(&spectrum, 0.15);

        assert_eq!(profile.mode, Mode::Rescue);
        assert_eq!(profile.entropy, 0.0);
        assert!(profile.duplication_ratio > 0.9);
    }

    #[test]
    fn test_oversubscribed_spectrum_is_not_conservative() {
        let dna = "ACGTAGCTTGCACATGGTACCGATCGGATATCCGCAAGTG";
        let k = 6;
        let mut kmers = windows(dna, k);
        // Inject positive errors until coverage leaves the conservative band.
        kmers.push("TTGCAC".to_string());
        kmers.push("GGTACC".to_string());
        kmers.push("ATCGGA".to_string());
        let spectrum = Spectrum::new(&kmers, dna.len(), k).unwrap();
        let profile = profile_spectrum(&spectrum, 0.15);

        assert!(profile.is_oversubscribed());
        assert!(!profile.is_undersubscribed());
        assert_eq!(profile.mode, Mode::Aggressive);
    }

    #[test]
    fn test_error_threshold_downgrades_one_step() {
        let dna = "ACGTAGCTTGCACATGGTACCGATCGGATATCCGCAAGTG";
        let k = 6;
        let kmers: Vec<String> = windows(dna, k).into_iter().take(29).collect();
        let spectrum = Spectrum::new(&kmers, dna.len(), k).unwrap();

        // Coverage 29/35 ~ 0.83: aggressive by the band rules, but the gap
        // of 0.17 exceeds a 0.15 threshold and forces one downgrade.
        let profile = profile_spectrum(&spectrum, 0.15);
        assert_eq!(profile.mode, Mode::Rescue);

        let lenient = profile_spectrum(&spectrum, 0.30);
        assert_eq!(lenient.mode, Mode::Aggressive);
    }

    #[test]
    fn test_profile_is_idempotent() {
        let dna = "ACGTAGCTTGCACATGGTACCGATCGGATATCCGCAAGTG";
        let kmers = windows(dna, 7);
        let spectrum = Spectrum::new(&kmers, dna.len(), 7).unwrap();

        let first = profile_spectrum(&spectrum, 0.15);
        let second = profile_spectrum(&spectrum, 0.15);
        assert_eq!(first, second);
    }

    #[test]
    fn test_mode_downgrade_is_one_way() {
        assert_eq!(Mode::Conservative.downgrade(), Mode::Aggressive);
        assert_eq!(Mode::Aggressive.downgrade(), Mode::Rescue);
        assert_eq!(Mode::Rescue.downgrade(), Mode::Rescue);
    }

    #[test]
    fn test_mode_params_presets() {
        assert_eq!(ModeParams::for_mode(Mode::Conservative).candidate_size, 8);
        assert_eq!(ModeParams::for_mode(Mode::Aggressive).candidate_size, 20);
        assert_eq!(ModeParams::for_mode(Mode::Rescue).candidate_size, 30);

        let rescue = ModeParams::for_mode(Mode::Rescue);
        assert_eq!(rescue.min_jump_overlap(8), 5);
        // Floor: the minimum jump overlap never drops below one base.
        assert_eq!(rescue.min_jump_overlap(2), 1);
    }
}
