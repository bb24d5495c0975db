//! # SBH-Forge - Spectrum Reconstruction Engine
//!
//! Reconstructs DNA sequences from (possibly corrupted) hybridization spectra.
//! Implements spectrum quality profiling, reliability filtering, overlap-graph
//! contig assembly, and an adaptive bounded-backtracking path extender.

pub mod core;
pub mod generators;
pub mod reconstruction;
pub mod utils;

// Re-export commonly used types at crate level
pub use crate::core::data_structures::{Kmer, Spectrum, ValidationError};
pub use crate::reconstruction::orchestrator::{
    reconstruct, ReconstructOptions, ReconstructionOutcome,
};
pub use crate::reconstruction::profiler::{Mode, Profile};

/// Result type used throughout the crate
pub type Result<T> = anyhow::Result<T>;

/// Error type used throughout the crate
pub type Error = anyhow::Error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_result_type() -> Result<()> {
        let success: Result<i32> = Ok(42);
        assert_eq!(success?, 42);

        let error: Result<i32> = Err(anyhow::anyhow!("test error"));
        assert!(error.is_err());
        assert!(error.unwrap_err().to_string().contains("test error"));
        Ok(())
    }

    #[test]
    fn test_module_exports() {
        let kmer = Kmer::new("ACGT").expect("valid k-mer");
        assert_eq!(kmer.sequence(), "ACGT");

        let options = ReconstructOptions::default();
        assert_eq!(options.max_backtracks, 10);
        assert_eq!(options.wall_time_ms, 30_000);
    }

    #[test]
    fn test_validation_error_downcast() {
        // Validation failures must stay distinguishable from ordinary errors.
        let err = reconstruct(&[], 10, 4, &ReconstructOptions::default()).unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());
    }
}
