//! Owned mono 16-bit sample buffers.

use super::codec;
use super::loader::AudioError;

/// Mono signed 16-bit PCM samples with an even length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Wrap samples, rejecting odd lengths since every lane holds a pair.
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Result<Self, AudioError> {
        if samples.len() % 2 != 0 {
            return Err(AudioError::OddSampleCount(samples.len()));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub(crate) fn from_even(samples: Vec<i16>, sample_rate: u32) -> Self {
        debug_assert!(samples.len() % 2 == 0);
        Self {
            samples,
            sample_rate,
        }
    }

    /// Rebuild a buffer from packed lanes read back from a capture buffer.
    pub fn from_lanes(lanes: &[i32], sample_rate: u32) -> Self {
        Self {
            samples: codec::unpack_lanes(lanes),
            sample_rate,
        }
    }

    /// Pack the samples into lanes for upload.
    pub fn to_lanes(&self) -> Vec<i32> {
        codec::pack_samples(&self.samples)
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of packed lanes (sample pairs).
    pub fn lane_count(&self) -> usize {
        self.samples.len() / 2
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
