//! GPU compute stages for packed 16-bit audio.
//!
//! Every invocation handles one lane holding two samples; see
//! [`crate::audio::codec`] for the layout.

mod buffers;
mod params;
mod pipelines;

pub mod mix;
pub mod synth;

pub use buffers::CaptureBuffers;
pub use mix::GpuMixer;
pub use pipelines::{DispatchGeometry, StageProgram, WORKGROUP_SIZE};
pub use synth::GpuToneSynth;

/// Errors that can occur while building or running a compute stage.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    #[error("Shader build failed: {0}")]
    ShaderBuild(String),
    #[error("Buffer of {requested} bytes exceeds the device limit of {limit} bytes")]
    BufferTooLarge { requested: u64, limit: u64 },
    #[error("{0} lanes exceed the dispatch grid of this device")]
    TooManyInvocations(usize),
    #[error("No input stream bound at slot {0}")]
    MissingInput(usize),
    #[error("Input streams differ in length: {left} vs {right} samples")]
    LengthMismatch { left: usize, right: usize },
    #[error("Input streams differ in sample rate: {left} Hz vs {right} Hz")]
    SampleRateMismatch { left: u32, right: u32 },
    #[error("Nothing to process: input is empty")]
    EmptyInput,
    #[error("Invalid tone configuration: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("GPU buffer mapping failed: {0}")]
    BufferMapFailed(String),
}
