//! GPU mixing of two packed streams.

use std::sync::Arc;
use wgpu::{Device, Queue};

use super::buffers::CaptureBuffers;
use super::params::MixParams;
use super::pipelines::{DispatchGeometry, StageProgram};
use super::ComputeError;
use crate::audio::SampleBuffer;

const MIX_SHADER: &str = concat!(
    include_str!("../shaders/codec.wgsl"),
    "\n",
    include_str!("../shaders/mix.wgsl")
);

/// Averages two equal-length streams, one packed lane per invocation.
///
/// Each half of a lane becomes `(a + b) >> 1`: a floor average, so
/// `mix([1], [0]) == [0]` and `mix([-1], [0]) == [-1]`. The operation is
/// commutative but not associative; mixing three streams pairwise depends
/// on the order.
pub struct GpuMixer {
    device: Arc<Device>,
    queue: Arc<Queue>,
    program: StageProgram,
}

impl GpuMixer {
    /// Build the mixing program.
    pub fn new(device: Arc<Device>, queue: Arc<Queue>) -> Result<Self, ComputeError> {
        let program = StageProgram::new(&device, "mix_lanes", MIX_SHADER, "mix_lanes", 2)?;
        Ok(Self {
            device,
            queue,
            program,
        })
    }

    /// Mix `a` and `b`. Both must share length and sample rate; this is
    /// checked before anything is allocated on the device.
    pub fn mix(&self, a: &SampleBuffer, b: &SampleBuffer) -> Result<SampleBuffer, ComputeError> {
        if a.sample_rate() != b.sample_rate() {
            return Err(ComputeError::SampleRateMismatch {
                left: a.sample_rate(),
                right: b.sample_rate(),
            });
        }
        if a.len() != b.len() {
            return Err(ComputeError::LengthMismatch {
                left: a.len(),
                right: b.len(),
            });
        }
        if a.is_empty() {
            return Err(ComputeError::EmptyInput);
        }

        let lane_count = u32::try_from(a.lane_count())
            .map_err(|_| ComputeError::TooManyInvocations(a.lane_count()))?;
        let limits = self.device.limits();
        let geometry =
            DispatchGeometry::for_lanes(lane_count, limits.max_compute_workgroups_per_dimension)?;
        let buffers = CaptureBuffers::new(
            &self.device,
            &self.program,
            a.lane_count(),
            std::mem::size_of::<MixParams>() as u64,
        )?;
        buffers.upload(&self.queue, 0, &a.to_lanes())?;
        buffers.upload(&self.queue, 1, &b.to_lanes())?;
        buffers.write_params(&self.queue, &MixParams::new(lane_count, &geometry));

        log::debug!(
            "Mixing {} lanes with {}x{} workgroups",
            lane_count,
            geometry.x,
            geometry.y
        );

        let bind_group = buffers.bind_group(&self.device, &self.program);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("mix_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("mix_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(self.program.pipeline());
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(geometry.x, geometry.y, 1);
        }
        buffers.encode_capture(&mut encoder);
        self.queue.submit(Some(encoder.finish()));

        let lanes = buffers.read_capture(&self.device)?;
        Ok(SampleBuffer::from_lanes(&lanes, a.sample_rate()))
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
    fn test_length_mismatch_rejected() {
        if let Some((device, queue)) = create_test_context() {
            let mixer = GpuMixer::new(device, queue).unwrap();
            let a = SampleBuffer::new(vec![0; 8], 8).unwrap();
            let b = SampleBuffer::new(vec![0; 10], 8).unwrap();
            assert!(matches!(
                mixer.mix(&a, &b),
                Err(ComputeError::LengthMismatch { left: 8, right: 10 })
            ));
        }
    }

    #[test]
    fn test_empty_rejected() {
        if let Some((device, queue)) = create_test_context() {
            let mixer = GpuMixer::new(device, queue).unwrap();
            let a = SampleBuffer::new(vec![], 8).unwrap();
            assert!(matches!(mixer.mix(&a, &a), Err(ComputeError::EmptyInput)));
        }
    }
}
