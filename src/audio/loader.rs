//! WAV loading using Symphonia.
//!
//! Only mono 16-bit PCM is accepted: the samples are uploaded to the GPU
//! as packed pairs without any conversion.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer as DecodeBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_PCM_S16LE};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use thiserror::Error;

use super::buffer::SampleBuffer;

/// Errors that can occur while reading, validating or writing audio.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to access audio file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to probe audio format: {0}")]
    ProbeError(#[from] symphonia::core::errors::Error),

    #[error("Failed to write WAV file: {0}")]
    WriteError(#[from] hound::Error),

    #[error("No audio track found in file")]
    NoAudioTrack,

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Sample rate mismatch: expected {expected} Hz, got {got} Hz")]
    SampleRateMismatch { expected: u32, got: u32 },

    #[error("Sample count must be even, got {0}")]
    OddSampleCount(usize),

    #[error("Input streams differ in length: {left} vs {right} samples")]
    LengthMismatch { left: usize, right: usize },

    #[error("Nothing to mix: inputs are empty")]
    EmptyInput,

    #[error("Invalid tone configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Load a mono 16-bit PCM WAV file.
///
/// When `expected_rate` is set, files at any other sample rate are rejected.
/// The check happens here, before any GPU work is scheduled.
///
/// # Example
///
/// ```no_run
/// use tonegpu::audio::loader::load_wav;
/// use std::path::Path;
///
/// let buffer = load_wav(Path::new("tone.wav"), Some(22050)).unwrap();
/// println!("{} samples, {:.2}s", buffer.len(), buffer.duration());
/// ```
pub fn load_wav(path: &Path, expected_rate: Option<u32>) -> Result<SampleBuffer, AudioError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("wav");

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .first()
        .ok_or(AudioError::NoAudioTrack)?;

    let params = &track.codec_params;
    if params.codec != CODEC_TYPE_PCM_S16LE {
        return Err(AudioError::UnsupportedFormat(
            "only 16-bit signed PCM is supported".to_string(),
        ));
    }
    let channels = params.channels.map(|c| c.count()).unwrap_or(0);
    if channels != 1 {
        return Err(AudioError::UnsupportedFormat(format!(
            "expected mono audio, got {} channels",
            channels
        )));
    }
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| AudioError::UnsupportedFormat("unknown sample rate".to_string()))?;
    if let Some(expected) = expected_rate {
        if expected != sample_rate {
            return Err(AudioError::SampleRateMismatch {
                expected,
                got: sample_rate,
            });
        }
    }

    let track_id = track.id;
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<i16> = Vec::new();
    if let Some(frames) = track.codec_params.n_frames {
        samples.reserve(frames as usize);
    }
    let mut decode_buf: Option<DecodeBuffer<i16>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet)?;

        if decode_buf.is_none() {
            let spec = *decoded.spec();
            let capacity = decoded.capacity() as u64;
            decode_buf = Some(DecodeBuffer::new(capacity, spec));
        }

        if let Some(buf) = &mut decode_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    log::debug!(
        "Loaded {} samples at {} Hz from {}",
        samples.len(),
        sample_rate,
        path.display()
    );

    SampleBuffer::new(samples, sample_rate)
}
