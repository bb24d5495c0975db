//! Aggregate quality floors over randomized inputs. These are statistical
//! properties, so each case averages over a batch of seeds rather than
//! pinning a single run.

use sbh_forge::generators::{DnaGenerator, SpectrumGenerator};
use sbh_forge::utils::similarity;
use sbh_forge::{reconstruct, ReconstructOptions};

/// Reconstruct one random instance and score it against the ground truth.
fn score_instance(n: usize, k: usize, error_rate: f64, seed: u64) -> f64 {
    let dna = DnaGenerator::with_seed(seed).generate(n).unwrap();
    let spectrum = SpectrumGenerator::with_seed(seed)
        .generate(&dna, k, error_rate, error_rate)
        .unwrap();

    let options = ReconstructOptions {
        seed,
        ..Default::default()
    };
    let outcome = reconstruct(&spectrum, n, k, &options).unwrap();

    assert_eq!(outcome.sequence.len(), n);
    similarity(&dna, &outcome.sequence)
}

fn mean_score(n: usize, k: usize, error_rate: f64, seeds: std::ops::Range<u64>) -> f64 {
    let count = seeds.end - seeds.start;
    let total: f64 = seeds.map(|seed| score_instance(n, k, error_rate, seed)).sum();
    total / count as f64
}

#[test]
fn error_free_reconstruction_is_near_exact() {
    // At k=10 and n=300 a repeated 9-mer (the one event that can force a
    // wrong greedy merge) is rare, so the strict floor is expected to hold.
    let mean = mean_score(300, 10, 0.0, 0..40);
    assert!(
        mean >= 0.95,
        "mean similarity {mean:.3} below the error-free floor"
    );
}

#[test]
fn error_free_runs_never_collapse() {
    for seed in 0..10 {
        let score = score_instance(300, 10, 0.0, seed);
        assert!(score >= 0.4, "seed {seed} collapsed to similarity {score:.3}");
    }
}

#[test]
fn five_percent_errors_clear_similarity_floor() {
    let mean = mean_score(400, 8, 0.05, 0..20);
    assert!(
        mean >= 0.40,
        "mean similarity {mean:.3} below the 5% error floor"
    );
}

#[test]
fn ten_percent_errors_clear_similarity_floor() {
    let mean = mean_score(400, 8, 0.10, 0..20);
    assert!(
        mean >= 0.25,
        "mean similarity {mean:.3} below the 10% error floor"
    );
}

#[test]
fn shorter_k_still_recovers_most_structure() {
    // Regression floor, deliberately below the k=10 one: at k=8 a 300-base
    // string repeats a 7-mer a couple of times on average, every repeat ties
    // the greedy merger between the true join and a transposing one, and the
    // lexicographic tie-break picks wrong roughly a third of the time. The
    // wrong joins block-permute the output, which caps expected similarity
    // well below the error-free ideal no matter how the walk is tuned.
    let mean = mean_score(300, 8, 0.0, 0..20);
    assert!(
        mean >= 0.6,
        "mean similarity {mean:.3} below floor for k=8 error-free"
    );
}
