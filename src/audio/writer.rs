//! WAV writing.
//!
//! Output is the canonical 44-byte PCM header followed by little-endian
//! 16-bit samples. The file is assembled in a temporary file next to the
//! destination and renamed into place once complete, so a failed run never
//! leaves a truncated WAV behind.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::buffer::SampleBuffer;
use super::loader::AudioError;

/// Size of the RIFF/WAVE header preceding the sample payload.
pub const WAV_HEADER_LEN: usize = 44;

/// A WAV destination opened before the samples exist.
///
/// Creating it claims a temporary file in the destination directory, so an
/// unwritable path fails here rather than after the compute work. Dropping
/// it without [`WavOutput::commit`] removes the temporary file and leaves
/// the destination untouched.
pub struct WavOutput {
    path: PathBuf,
    temp_file: NamedTempFile,
}

impl WavOutput {
    pub fn create(path: &Path) -> Result<Self, AudioError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp_file = tempfile::Builder::new()
            .prefix(".tonegpu_")
            .suffix(".wav")
            .tempfile_in(dir)?;

        Ok(Self {
            path: path.to_path_buf(),
            temp_file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `buffer` and rename the finished file onto the destination.
    pub fn commit(mut self, buffer: &SampleBuffer) -> Result<(), AudioError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: buffer.sample_rate(),
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        {
            let mut writer =
                hound::WavWriter::new(BufWriter::new(self.temp_file.as_file_mut()), spec)?;
            let mut samples = writer.get_i16_writer(buffer.len() as u32);
            for &sample in buffer.samples() {
                samples.write_sample(sample);
            }
            samples.flush()?;
            writer.finalize()?;
        }

        self.temp_file.persist(&self.path).map_err(|e| e.error)?;

        log::info!(
            "Wrote {} samples ({:.2}s at {} Hz) to {}",
            buffer.len(),
            buffer.duration(),
            buffer.sample_rate(),
            self.path.display()
        );
        Ok(())
    }
}

/// Write a mono 16-bit PCM WAV file.
pub fn write_wav(path: &Path, buffer: &SampleBuffer) -> Result<(), AudioError> {
    WavOutput::create(path)?.commit(buffer)
}
