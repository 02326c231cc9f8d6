//! GPU tone synthesis.

use std::sync::Arc;
use wgpu::{Device, Queue};

use super::buffers::CaptureBuffers;
use super::params::SynthParams;
use super::pipelines::{DispatchGeometry, StageProgram};
use super::ComputeError;
use crate::audio::SampleBuffer;
use crate::config::ToneConfig;

const SYNTH_SHADER: &str = concat!(
    include_str!("../shaders/codec.wgsl"),
    "\n",
    include_str!("../shaders/synth.wgsl")
);

/// Generates sine tones with one compute invocation per packed sample pair.
pub struct GpuToneSynth {
    device: Arc<Device>,
    queue: Arc<Queue>,
    program: StageProgram,
}

impl GpuToneSynth {
    /// Build the synthesis program.
    pub fn new(device: Arc<Device>, queue: Arc<Queue>) -> Result<Self, ComputeError> {
        let program = StageProgram::new(&device, "synthesize", SYNTH_SHADER, "synthesize", 0)?;
        Ok(Self {
            device,
            queue,
            program,
        })
    }

    /// Generate the full tone described by `tone`.
    ///
    /// Invocation `k` writes samples `2k` and `2k + 1`. The invocation index
    /// is reduced modulo the period before it becomes a time value, so the
    /// sine argument stays small no matter how long the tone runs.
    pub fn generate(&self, tone: &ToneConfig) -> Result<SampleBuffer, ComputeError> {
        tone.validate()?;

        let lane_count = tone.lane_count() as u32;
        let limits = self.device.limits();
        let geometry =
            DispatchGeometry::for_lanes(lane_count, limits.max_compute_workgroups_per_dimension)?;
        let buffers = CaptureBuffers::new(
            &self.device,
            &self.program,
            lane_count as usize,
            std::mem::size_of::<SynthParams>() as u64,
        )?;
        buffers.write_params(&self.queue, &SynthParams::new(tone, lane_count, &geometry));

        log::debug!(
            "Synthesizing {} lanes (period {}) with {}x{} workgroups",
            lane_count,
            tone.period(),
            geometry.x,
            geometry.y
        );

        let bind_group = buffers.bind_group(&self.device, &self.program);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("synthesize_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("synthesize_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(self.program.pipeline());
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(geometry.x, geometry.y, 1);
        }
        buffers.encode_capture(&mut encoder);
        self.queue.submit(Some(encoder.finish()));

        let lanes = buffers.read_capture(&self.device)?;
        Ok(SampleBuffer::from_lanes(&lanes, tone.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_context() -> Option<(Arc<Device>, Arc<Queue>)> {
        let ctx = crate::gpu::GpuContext::new_blocking().ok()?;
        Some((ctx.device, ctx.queue))
    }

    #[test]
    fn test_creation() {
        if let Some((device, queue)) = create_test_context() {
            assert!(GpuToneSynth::new(device, queue).is_ok());
        }
    }

    #[test]
    fn test_invalid_tone_rejected_before_dispatch() {
        if let Some((device, queue)) = create_test_context() {
            let synth = GpuToneSynth::new(device, queue).unwrap();
            let tone = ToneConfig {
                sample_rate: 22050,
                frequency: 200,
                duration_secs: 1,
                amplitude: 32760,
            };
            assert!(matches!(
                synth.generate(&tone),
                Err(ComputeError::Config(_))
            ));
        }
    }
}
