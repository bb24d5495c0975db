use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::time::Instant;

use sbh_forge::generators::{DnaGenerator, SpectrumGenerator};
use sbh_forge::utils::{covers_spectrum, levenshtein, similarity, spectrum_coverage};
use sbh_forge::{reconstruct, Mode, ReconstructOptions};

#[derive(Parser)]
#[command(
    name = "sbh-forge",
    version,
    about = "Reconstruct DNA sequences from hybridization spectra"
)]
struct Cli {
    /// Enable debug-level logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random sequence, corrupt its spectrum, and reconstruct it
    Reconstruct {
        /// Length of the ground-truth sequence
        #[arg(long, default_value_t = 400)]
        length: usize,
        /// Oligonucleotide length
        #[arg(long, default_value_t = 8)]
        k: usize,
        /// Positive error rate (spurious k-mers added)
        #[arg(long, default_value_t = 0.0)]
        pos_error: f64,
        /// Negative error rate (true k-mers dropped)
        #[arg(long, default_value_t = 0.0)]
        neg_error: f64,
        /// Override the mode-chosen jump candidate count
        #[arg(long)]
        candidates: Option<usize>,
        /// Force a reconstruction mode: conservative, aggressive or rescue
        #[arg(long)]
        force_mode: Option<String>,
        /// Seed for generation and the desperate strategy
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Print the outcome record as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Run repeated reconstructions and emit one CSV row per run
    Benchmark {
        #[arg(long, default_value_t = 400)]
        length: usize,
        #[arg(long, default_value_t = 8)]
        k: usize,
        /// Symmetric error rate (applied as both positive and negative);
        /// repeat the flag to sweep several rates
        #[arg(long = "error", default_value = "0.0")]
        errors: Vec<f64>,
        #[arg(long)]
        candidates: Option<usize>,
        /// Reconstructions per generated instance
        #[arg(long, default_value_t = 1)]
        repetitions: usize,
        /// Independently generated instances per error rate
        #[arg(long, default_value_t = 5)]
        trials: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn parse_mode(raw: &str) -> Result<Mode> {
    match raw {
        "conservative" => Ok(Mode::Conservative),
        "aggressive" => Ok(Mode::Aggressive),
        "rescue" => Ok(Mode::Rescue),
        other => Err(anyhow!("unknown mode {other:?}")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_level))
        .init();

    match cli.command {
        Commands::Reconstruct {
            length,
            k,
            pos_error,
            neg_error,
            candidates,
            force_mode,
            seed,
            json,
        } => {
            let dna = DnaGenerator::with_seed(seed).generate(length)?;
            let spectrum =
                SpectrumGenerator::with_seed(seed).generate(&dna, k, neg_error, pos_error)?;

            let options = ReconstructOptions {
                candidate_size: candidates,
                seed,
                force_mode: force_mode.as_deref().map(parse_mode).transpose()?,
                ..Default::default()
            };
            let outcome = reconstruct(&spectrum, length, k, &options)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("=== Spectrum Reconstruction ===");
                println!("Target length: {length}, k: {k}");
                println!(
                    "Spectrum: {} k-mers ({:.0}% added, {:.0}% dropped)",
                    spectrum.len(),
                    pos_error * 100.0,
                    neg_error * 100.0
                );
                println!("Mode: {}", outcome.mode);
                println!(
                    "Similarity to original: {:.2}%",
                    similarity(&dna, &outcome.sequence) * 100.0
                );
                println!(
                    "Edit distance: {}",
                    levenshtein(&dna, &outcome.sequence)
                );
                println!(
                    "Iterations: {}, backtracks: {}, desperate jumps: {}",
                    outcome.iterations, outcome.backtracks, outcome.desperate_jumps
                );
                println!(
                    "Completed in {} ms{}",
                    outcome.elapsed_ms,
                    if outcome.incomplete {
                        " (incomplete, padded)"
                    } else {
                        ""
                    }
                );
            }
        }
        Commands::Benchmark {
            length,
            k,
            errors,
            candidates,
            repetitions,
            trials,
            seed,
        } => {
            println!(
                "k,n,seq_length,error_rate,original_length,reconstructed_length,\
                 coverage,accuracy,edit_distance,runtime,is_valid,success,repeat"
            );

            for &error_rate in &errors {
                for trial in 0..trials {
                    let trial_seed = seed.wrapping_add(trial as u64);
                    let dna = DnaGenerator::with_seed(trial_seed).generate(length)?;
                    let spectrum = SpectrumGenerator::with_seed(trial_seed)
                        .generate(&dna, k, error_rate, error_rate)?;

                    let options = ReconstructOptions {
                        candidate_size: candidates,
                        seed: trial_seed,
                        ..Default::default()
                    };

                    for repeat in 0..repetitions {
                        let started = Instant::now();
                        let outcome = reconstruct(&spectrum, length, k, &options)?;
                        let runtime = started.elapsed().as_secs_f64();

                        let coverage =
                            spectrum_coverage(&outcome.sequence, &spectrum, k) * 100.0;
                        let accuracy = similarity(&dna, &outcome.sequence) * 100.0;
                        let edit_distance = levenshtein(&dna, &outcome.sequence);
                        let is_valid = covers_spectrum(&outcome.sequence, &spectrum, k);

                        println!(
                            "{k},{n},{length},{error_rate},{orig},{rec},{coverage:.2},\
                             {accuracy:.2},{edit_distance},{runtime:.4},{is_valid},{success},{repeat}",
                            n = spectrum.len(),
                            orig = dna.len(),
                            rec = outcome.sequence.len(),
                            success = !outcome.incomplete,
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
