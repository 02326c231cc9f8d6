use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tonegpu::{Engine, PipelineConfig, RunReport};

#[derive(Parser)]
#[command(name = "tonegpu", version, about = "GPU tone synthesis and mixing of 16-bit mono WAV")]
struct Cli {
    /// JSON configuration file. Flags given on the command line override it.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Engine: gpu, cpu or cpu-threaded
    #[arg(short = 'e', long = "engine", global = true)]
    engine: Option<Engine>,

    /// Worker threads for the cpu-threaded engine
    #[arg(short = 't', long = "threads", global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Synthesize a sine tone and write it as a WAV file
    Generate {
        /// Samples per second
        #[arg(long = "sample-rate")]
        sample_rate: Option<u32>,

        /// Tone frequency in Hz (must divide the sample rate)
        #[arg(short = 'f', long = "frequency")]
        frequency: Option<u32>,

        /// Duration in whole seconds
        #[arg(short = 'd', long = "duration")]
        duration: Option<u32>,

        /// Peak sample value (1..=32767)
        #[arg(short = 'a', long = "amplitude")]
        amplitude: Option<u16>,

        /// Output WAV path
        #[arg(short = 'o', long = "output", default_value = "GPUoutput.wav")]
        output: PathBuf,
    },
    /// Average two equal-length WAV files sample by sample
    Mix {
        /// First input WAV
        first: PathBuf,

        /// Second input WAV
        second: PathBuf,

        /// Sample rate both inputs must carry
        #[arg(long = "sample-rate")]
        sample_rate: Option<u32>,

        /// Output WAV path
        #[arg(short = 'o', long = "output", default_value = "output3.wav")]
        output: PathBuf,
    },
    /// Print the GPU adapter the gpu engine would use
    Info,
}

fn main() {
    // Set RUST_LOG=debug for dispatch geometry and buffer sizes
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => tonegpu::load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(engine) = cli.engine {
        config.engine = engine;
    }
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }

    match cli.command {
        Command::Generate {
            sample_rate,
            frequency,
            duration,
            amplitude,
            output,
        } => {
            if let Some(v) = sample_rate {
                config.tone.sample_rate = v;
            }
            if let Some(v) = frequency {
                config.tone.frequency = v;
            }
            if let Some(v) = duration {
                config.tone.duration_secs = v;
            }
            if let Some(v) = amplitude {
                config.tone.amplitude = v;
            }

            let report = tonegpu::generate_tone_file(&output, &config)
                .with_context(|| format!("Failed to generate {}", output.display()))?;
            print_report(&report);
            println!("Wrote {}", output.display());
        }
        Command::Mix {
            first,
            second,
            sample_rate,
            output,
        } => {
            if let Some(v) = sample_rate {
                config.tone.sample_rate = v;
            }

            let report = tonegpu::mix_wav_files(&first, &second, &output, &config)
                .with_context(|| {
                    format!(
                        "Failed to mix {} and {}",
                        first.display(),
                        second.display()
                    )
                })?;
            print_report(&report);
            println!("Wrote {}", output.display());
        }
        Command::Info => {
            let summary = tonegpu::adapter_summary().context("No usable GPU adapter")?;
            println!("{}", summary);
        }
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!(
        "{} samples at {} Hz on {}{}",
        report.num_samples,
        report.sample_rate,
        report.engine,
        report
            .adapter
            .as_deref()
            .map(|name| format!(" ({})", name))
            .unwrap_or_default()
    );
    println!("Elapsed time: {} ms", report.elapsed.as_millis());
}
