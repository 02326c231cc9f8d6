//! tonegpu core
//!
//! GPU sine-tone synthesis and two-stream mixing of 16-bit mono PCM.
//!
//! # Features
//!
//! - Two samples packed per 32-bit lane, one compute invocation per lane
//! - Tone synthesis and floor-average mixing via wgpu compute shaders
//! - Single-threaded and threaded CPU reference engines
//! - WAV loading via Symphonia, atomic WAV writing via hound
//! - JSON configuration with CLI overrides (`tonegpu` binary)

pub mod audio;
pub mod config;
pub mod gpu;
pub mod pipeline;

// Re-export commonly used types
pub use audio::{load_wav, write_wav, AudioError, SampleBuffer};
pub use config::{load_config, ConfigError, Engine, PipelineConfig, ToneConfig};
pub use gpu::{ComputeError, GpuContext, GpuError, GpuMixer, GpuToneSynth};
pub use pipeline::{
    adapter_summary, generate, generate_tone_file, mix, mix_wav_files, PipelineError, RunReport,
};
