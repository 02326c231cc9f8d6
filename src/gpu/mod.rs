//! GPU compute using wgpu.
//!
//! Provides headless device acquisition and the compute stages that
//! synthesize and mix packed 16-bit sample pairs.

pub mod compute;
pub mod context;

pub use compute::{ComputeError, GpuMixer, GpuToneSynth};
pub use context::{GpuContext, GpuError};
