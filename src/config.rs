//! Run configuration.
//!
//! Defaults can be overridden by a JSON file and then by command-line flags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Largest amplitude ceiling a 16-bit sample can carry.
pub const MAX_AMPLITUDE: u16 = i16::MAX as u16;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("Amplitude ceiling must be in 1..=32767, got {0}")]
    InvalidAmplitude(u16),
    #[error("Frequency {frequency} Hz is above the Nyquist limit of {nyquist} Hz")]
    AboveNyquist { frequency: u32, nyquist: u32 },
    #[error(
        "Sample rate {sample_rate} is not a whole multiple of frequency {frequency}; \
         the wave would not wrap on a cycle boundary"
    )]
    FractionalPeriod { sample_rate: u32, frequency: u32 },
    #[error("Period of {0} samples is too long; twice the period must fit in 32 bits")]
    PeriodTooLong(u32),
    #[error("Sample count must be even, got {0}")]
    OddSampleCount(u64),
    #[error("Sample count {0} exceeds the addressable invocation range")]
    TooManySamples(u64),
    #[error("Unknown engine '{0}' (expected gpu, cpu or cpu-threaded)")]
    UnknownEngine(String),
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tone synthesis parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    /// Samples per second.
    pub sample_rate: u32,
    /// Tone frequency in Hz. Must divide `sample_rate`.
    pub frequency: u32,
    /// Length of the tone in whole seconds.
    pub duration_secs: u32,
    /// Peak sample value, kept under full scale to avoid clipping.
    pub amplitude: u16,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            frequency: 210,
            duration_secs: 10,
            amplitude: 32760,
        }
    }
}

impl ToneConfig {
    /// Total number of samples in the generated buffer.
    pub fn num_samples(&self) -> u64 {
        u64::from(self.sample_rate) * u64::from(self.duration_secs)
    }

    /// Number of packed lanes, one per invocation.
    pub fn lane_count(&self) -> u64 {
        self.num_samples() / 2
    }

    /// Samples in one wave cycle. Invocation indices wrap modulo this value.
    pub fn period(&self) -> u32 {
        self.sample_rate / self.frequency
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::Zero("sample_rate"));
        }
        if self.frequency == 0 {
            return Err(ConfigError::Zero("frequency"));
        }
        if self.duration_secs == 0 {
            return Err(ConfigError::Zero("duration_secs"));
        }
        if self.amplitude == 0 || self.amplitude > MAX_AMPLITUDE {
            return Err(ConfigError::InvalidAmplitude(self.amplitude));
        }
        let nyquist = self.sample_rate / 2;
        if self.frequency > nyquist {
            return Err(ConfigError::AboveNyquist {
                frequency: self.frequency,
                nyquist,
            });
        }
        if self.sample_rate % self.frequency != 0 {
            return Err(ConfigError::FractionalPeriod {
                sample_rate: self.sample_rate,
                frequency: self.frequency,
            });
        }
        // Shaders double the wrapped index in u32 arithmetic.
        if self.period() > u32::MAX / 2 {
            return Err(ConfigError::PeriodTooLong(self.period()));
        }
        let num_samples = self.num_samples();
        if num_samples % 2 != 0 {
            return Err(ConfigError::OddSampleCount(num_samples));
        }
        if self.lane_count() > u64::from(u32::MAX) {
            return Err(ConfigError::TooManySamples(num_samples));
        }
        Ok(())
    }
}

/// Where the per-sample arithmetic runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Engine {
    /// wgpu compute shaders, one invocation per packed lane.
    #[default]
    Gpu,
    /// Single-threaded CPU reference.
    Cpu,
    /// CPU reference split into contiguous slices across a thread pool.
    CpuThreaded,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Engine::Gpu => "gpu",
            Engine::Cpu => "cpu",
            Engine::CpuThreaded => "cpu-threaded",
        };
        f.write_str(name)
    }
}

impl FromStr for Engine {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gpu" => Ok(Engine::Gpu),
            "cpu" => Ok(Engine::Cpu),
            "cpu-threaded" | "threaded" => Ok(Engine::CpuThreaded),
            other => Err(ConfigError::UnknownEngine(other.to_string())),
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tone: ToneConfig,
    pub engine: Engine,
    /// Worker count for the threaded CPU engine.
    pub threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tone: ToneConfig::default(),
            engine: Engine::Gpu,
            threads: 8,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::Zero("threads"));
        }
        self.tone.validate()
    }
}

/// Load a pipeline configuration from a JSON file. Missing fields keep their defaults.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let config = serde_json::from_str(&text)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(sample_rate: u32, frequency: u32, duration_secs: u32) -> ToneConfig {
        ToneConfig {
            sample_rate,
            frequency,
            duration_secs,
            amplitude: 32760,
        }
    }

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tone.period(), 105);
        assert_eq!(config.tone.num_samples(), 220_500);
        assert_eq!(config.tone.lane_count(), 110_250);
    }

    #[test]
    fn test_fractional_period_rejected() {
        let result = tone(22050, 200, 1).validate();
        assert!(matches!(
            result,
            Err(ConfigError::FractionalPeriod {
                sample_rate: 22050,
                frequency: 200
            })
        ));
    }

    #[test]
    fn test_odd_sample_count_rejected() {
        // 9 samples/s for 1 s
        let result = tone(9, 3, 1).validate();
        assert!(matches!(result, Err(ConfigError::OddSampleCount(9))));
        assert!(tone(9, 3, 2).validate().is_ok());
    }

    #[test]
    fn test_nyquist_and_zero_checks() {
        assert!(matches!(
            tone(8, 5, 1).validate(),
            Err(ConfigError::AboveNyquist { .. })
        ));
        assert!(matches!(
            tone(0, 1, 1).validate(),
            Err(ConfigError::Zero("sample_rate"))
        ));
        assert!(matches!(
            tone(8, 1, 0).validate(),
            Err(ConfigError::Zero("duration_secs"))
        ));
        let mut loud = tone(8, 1, 1);
        loud.amplitude = 40000;
        assert!(matches!(
            loud.validate(),
            Err(ConfigError::InvalidAmplitude(40000))
        ));
    }

    #[test]
    fn test_period_must_double_within_u32() {
        let result = tone(4_000_000_000, 1, 2).validate();
        assert!(matches!(
            result,
            Err(ConfigError::PeriodTooLong(4_000_000_000))
        ));

        // period = u32::MAX / 2 is the longest accepted
        assert!(tone(4_294_967_294, 2, 1).validate().is_ok());
    }

    #[test]
    fn test_engine_parse_and_display() {
        for engine in [Engine::Gpu, Engine::Cpu, Engine::CpuThreaded] {
            assert_eq!(engine.to_string().parse::<Engine>().unwrap(), engine);
        }
        assert!("opengl".parse::<Engine>().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "engine": "cpu-threaded", "tone": { "frequency": 441 } }"#)
                .unwrap();
        assert_eq!(config.engine, Engine::CpuThreaded);
        assert_eq!(config.tone.frequency, 441);
        assert_eq!(config.tone.sample_rate, 22050);
        assert_eq!(config.threads, 8);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = PipelineConfig {
            threads: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Zero("threads"))));
    }
}
