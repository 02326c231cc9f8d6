//! Audio buffers, WAV I/O and CPU reference engines.
//!
//! This module provides:
//! - The sample-pair codec shared with the compute shaders
//! - Even-length mono 16-bit sample buffers
//! - WAV loading via Symphonia and atomic WAV writing via hound
//! - Single-threaded and threaded CPU tone generation and mixing

pub mod buffer;
pub mod codec;
pub mod loader;
pub mod synth;
pub mod writer;

// Re-export commonly used types
pub use buffer::SampleBuffer;
pub use codec::{mix_lanes, pack, pack_samples, unpack_high, unpack_lanes, unpack_low};
pub use loader::{load_wav, AudioError};
pub use synth::{
    generate_tone, generate_tone_threaded, mix_buffers, mix_buffers_threaded, tone_lane,
    tone_sample,
};
pub use writer::{write_wav, WavOutput};
