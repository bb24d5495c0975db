use anyhow::{anyhow, Result};

use crate::core::data_structures::ALPHABET;

/// Produces hybridization spectra from a DNA string, optionally corrupted
/// with negative errors (dropped k-mers) and positive errors (spurious
/// random k-mers).
pub struct SpectrumGenerator {
    rng: fastrand::Rng,
}

impl SpectrumGenerator {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// All contiguous k-mers of `dna`, then `floor(size * neg_error_rate)`
    /// random removals, then `floor(size * pos_error_rate)` random k-mers
    /// appended (the positive count is taken after removals).
    pub fn generate(
        &mut self,
        dna: &str,
        k: usize,
        neg_error_rate: f64,
        pos_error_rate: f64,
    ) -> Result<Vec<String>> {
        if k < 1 || k > dna.len() {
            return Err(anyhow!(
                "k-mer length {} invalid for a sequence of length {}",
                k,
                dna.len()
            ));
        }
        if !(0.0..=1.0).contains(&neg_error_rate) || !(0.0..=1.0).contains(&pos_error_rate) {
            return Err(anyhow!("error rates must be within [0, 1]"));
        }

        let mut spectrum: Vec<String> =
            (0..=dna.len() - k).map(|i| dna[i..i + k].to_string()).collect();

        let removals = (spectrum.len() as f64 * neg_error_rate) as usize;
        for _ in 0..removals {
            if spectrum.is_empty() {
                break;
            }
            let idx = self.rng.usize(0..spectrum.len());
            spectrum.remove(idx);
        }

        let insertions = (spectrum.len() as f64 * pos_error_rate) as usize;
        for _ in 0..insertions {
            let random_kmer: String = (0..k)
                .map(|_| ALPHABET[self.rng.usize(0..ALPHABET.len())] as char)
                .collect();
            spectrum.push(random_kmer);
        }

        Ok(spectrum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Long enough that percentage-based error counts stay whole.
    const SAMPLE: &str = "ACGTAGCTTGCACATGGTACCGATCGGATATCCGCAAGTGTTGACTCAGCATCGACTGGAACGT";

    #[test]
    fn test_error_free_spectrum_is_complete() {
        let mut generator = SpectrumGenerator::with_seed(0);
        let spectrum = generator.generate("ACGTACGTAC", 3, 0.0, 0.0).unwrap();

        assert_eq!(spectrum.len(), 8);
        assert_eq!(spectrum[0], "ACG");
        assert_eq!(spectrum[7], "TAC");
    }

    #[test]
    fn test_negative_errors_shrink_spectrum() {
        let mut generator = SpectrumGenerator::with_seed(3);
        let dna = SAMPLE;
        let spectrum = generator.generate(dna, 5, 0.1, 0.0).unwrap();

        let full = dna.len() - 5 + 1;
        assert_eq!(spectrum.len(), full - full / 10);
    }

    #[test]
    fn test_positive_errors_grow_spectrum() {
        let mut generator = SpectrumGenerator::with_seed(3);
        let dna = SAMPLE;
        let spectrum = generator.generate(dna, 5, 0.0, 0.1).unwrap();

        let full = dna.len() - 5 + 1;
        assert_eq!(spectrum.len(), full + full / 10);
        assert!(spectrum.iter().all(|kmer| kmer.len() == 5));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let mut generator = SpectrumGenerator::with_seed(0);
        assert!(generator.generate("ACGT", 5, 0.0, 0.0).is_err());
        assert!(generator.generate("ACGT", 0, 0.0, 0.0).is_err());
        assert!(generator.generate("ACGT", 2, 1.5, 0.0).is_err());
        assert!(generator.generate("ACGT", 2, 0.0, -0.1).is_err());
    }

    #[test]
    fn test_same_seed_same_corruption() {
        let dna = SAMPLE;
        let first = SpectrumGenerator::with_seed(11).generate(dna, 6, 0.05, 0.05).unwrap();
        let second = SpectrumGenerator::with_seed(11).generate(dna, 6, 0.05, 0.05).unwrap();
        assert_eq!(first, second);
    }
}
