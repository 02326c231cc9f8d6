//! End-to-end runs: build the stage, dispatch, capture, write the WAV.
//!
//! Every run is a one-shot batch job. Configuration, input format and
//! device failures all surface before the dispatch; once a dispatch is
//! submitted it runs to completion.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::audio::{self, load_wav, AudioError, SampleBuffer, WavOutput};
use crate::config::{ConfigError, Engine, PipelineConfig};
use crate::gpu::{ComputeError, GpuContext, GpuError, GpuMixer, GpuToneSynth};

pub use crate::config::{load_config, ToneConfig};

/// Errors that can occur during pipeline execution.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("Compute error: {0}")]
    Compute(#[from] ComputeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub engine: Engine,
    pub num_samples: usize,
    pub sample_rate: u32,
    /// Time spent in the per-sample work: dispatch through readback on the
    /// GPU, the generate/mix call on the CPU engines.
    pub elapsed: Duration,
    /// Adapter name when the GPU engine ran.
    pub adapter: Option<String>,
}

impl RunReport {
    fn new(engine: Engine, buffer: &SampleBuffer, elapsed: Duration, adapter: Option<String>) -> Self {
        Self {
            engine,
            num_samples: buffer.len(),
            sample_rate: buffer.sample_rate(),
            elapsed,
            adapter,
        }
    }
}

/// Generate a tone in memory on the configured engine.
pub fn generate(config: &PipelineConfig) -> Result<(SampleBuffer, RunReport), PipelineError> {
    config.validate()?;
    log::info!(
        "Generating {} Hz tone: {} s at {} Hz ({} samples) on {}",
        config.tone.frequency,
        config.tone.duration_secs,
        config.tone.sample_rate,
        config.tone.num_samples(),
        config.engine
    );

    let (buffer, elapsed, adapter) = match config.engine {
        Engine::Gpu => {
            let ctx = GpuContext::new_blocking()?;
            let synth = GpuToneSynth::new(ctx.device.clone(), ctx.queue.clone())?;
            let start = Instant::now();
            let buffer = synth.generate(&config.tone)?;
            (buffer, start.elapsed(), Some(ctx.adapter_info().name))
        }
        Engine::Cpu => {
            let start = Instant::now();
            let buffer = audio::generate_tone(&config.tone)?;
            (buffer, start.elapsed(), None)
        }
        Engine::CpuThreaded => {
            let start = Instant::now();
            let buffer = audio::generate_tone_threaded(&config.tone, config.threads)?;
            (buffer, start.elapsed(), None)
        }
    };

    log::info!("Elapsed time: {} ms", elapsed.as_millis());
    let report = RunReport::new(config.engine, &buffer, elapsed, adapter);
    Ok((buffer, report))
}

/// Preconditions shared by every mixing engine.
fn check_mix_inputs(
    a: &SampleBuffer,
    b: &SampleBuffer,
    config: &PipelineConfig,
) -> Result<(), PipelineError> {
    if config.threads == 0 {
        return Err(ConfigError::Zero("threads").into());
    }
    if a.sample_rate() != b.sample_rate() {
        return Err(AudioError::SampleRateMismatch {
            expected: a.sample_rate(),
            got: b.sample_rate(),
        }
        .into());
    }
    if a.len() != b.len() {
        return Err(AudioError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        }
        .into());
    }
    if a.is_empty() {
        return Err(AudioError::EmptyInput.into());
    }
    Ok(())
}

/// Mix two in-memory buffers on the configured engine.
pub fn mix(
    a: &SampleBuffer,
    b: &SampleBuffer,
    config: &PipelineConfig,
) -> Result<(SampleBuffer, RunReport), PipelineError> {
    check_mix_inputs(a, b, config)?;
    log::info!("Mixing {} samples on {}", a.len(), config.engine);

    let (buffer, elapsed, adapter) = match config.engine {
        Engine::Gpu => {
            let ctx = GpuContext::new_blocking()?;
            let mixer = GpuMixer::new(ctx.device.clone(), ctx.queue.clone())?;
            let start = Instant::now();
            let buffer = mixer.mix(a, b)?;
            (buffer, start.elapsed(), Some(ctx.adapter_info().name))
        }
        Engine::Cpu => {
            let start = Instant::now();
            let buffer = audio::mix_buffers(a, b)?;
            (buffer, start.elapsed(), None)
        }
        Engine::CpuThreaded => {
            let start = Instant::now();
            let buffer = audio::mix_buffers_threaded(a, b, config.threads)?;
            (buffer, start.elapsed(), None)
        }
    };

    log::info!("Elapsed time: {} ms", elapsed.as_millis());
    let report = RunReport::new(config.engine, &buffer, elapsed, adapter);
    Ok((buffer, report))
}

/// Generate a tone and write it to `output_path`.
///
/// The configuration and the output path are both checked before any
/// device is requested.
pub fn generate_tone_file<P: AsRef<Path>>(
    output_path: P,
    config: &PipelineConfig,
) -> Result<RunReport, PipelineError> {
    config.validate()?;
    let output = WavOutput::create(output_path.as_ref())?;
    let (buffer, report) = generate(config)?;
    output.commit(&buffer)?;
    Ok(report)
}

/// Mix two WAV files and write the result to `output_path`.
///
/// Both inputs must be mono 16-bit PCM at `config.tone.sample_rate` and of
/// equal length. Inputs and the output path are validated before the
/// device is touched.
pub fn mix_wav_files<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
    first_path: P,
    second_path: Q,
    output_path: R,
    config: &PipelineConfig,
) -> Result<RunReport, PipelineError> {
    let rate = Some(config.tone.sample_rate);
    let first = load_wav(first_path.as_ref(), rate)?;
    let second = load_wav(second_path.as_ref(), rate)?;
    check_mix_inputs(&first, &second, config)?;

    let output = WavOutput::create(output_path.as_ref())?;
    let (buffer, report) = mix(&first, &second, config)?;
    output.commit(&buffer)?;
    Ok(report)
}

/// Describe the adapter the GPU engine would use.
pub fn adapter_summary() -> Result<String, PipelineError> {
    let ctx = GpuContext::new_blocking()?;
    let info = ctx.adapter_info();
    let limits = ctx.limits();
    Ok(format!(
        "{} ({:?}, vendor 0x{:04x}, driver {} {})\nmax buffer: {} bytes, max storage binding: {} bytes, max workgroups/dim: {}",
        info.name,
        info.backend,
        info.vendor,
        info.driver,
        info.driver_info,
        limits.max_buffer_size,
        limits.max_storage_buffer_binding_size,
        limits.max_compute_workgroups_per_dimension
    ))
}
