//! GPU buffer management for packed sample streams.
//!
//! One `CaptureBuffers` value owns every device allocation of a single run:
//! the packed input streams, the capture target the shader writes, a
//! mappable staging copy of it, and the uniform parameter block. Dropping it
//! destroys all of them; nothing is pooled across runs.

use wgpu::{Buffer, BufferUsages, Device, Queue};

use super::pipelines::StageProgram;
use super::ComputeError;

const LANE_BYTES: u64 = std::mem::size_of::<i32>() as u64;

/// Device buffers for one synthesis or mixing dispatch.
pub struct CaptureBuffers {
    inputs: Vec<Buffer>,
    capture: Buffer,
    staging: Buffer,
    params: Buffer,
    lane_count: usize,
}

impl CaptureBuffers {
    /// Allocate one input stream per input of `program` and the capture
    /// target, each holding exactly `lane_count` packed lanes.
    pub fn new(
        device: &Device,
        program: &StageProgram,
        lane_count: usize,
        params_size: u64,
    ) -> Result<Self, ComputeError> {
        let size = Self::checked_size(device, lane_count)?;
        let input_count = program.input_count();

        let inputs = (0..input_count)
            .map(|i| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("wave_input_{}", i)),
                    size,
                    usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();

        let capture = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("wave_capture"),
            size,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("wave_staging"),
            size,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("wave_params"),
            size: params_size,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::debug!(
            "Allocated {} input(s) + capture of {} lanes ({} bytes each)",
            input_count,
            lane_count,
            size
        );

        Ok(Self {
            inputs,
            capture,
            staging,
            params,
            lane_count,
        })
    }

    /// Byte size of a lane buffer, rejected up front if the device cannot hold it.
    fn checked_size(device: &Device, lane_count: usize) -> Result<u64, ComputeError> {
        if lane_count == 0 {
            return Err(ComputeError::EmptyInput);
        }
        let requested = lane_count as u64 * LANE_BYTES;
        let limits = device.limits();
        let limit = limits
            .max_buffer_size
            .min(u64::from(limits.max_storage_buffer_binding_size));
        if requested > limit {
            return Err(ComputeError::BufferTooLarge { requested, limit });
        }
        Ok(requested)
    }

    /// Upload one packed input stream.
    pub fn upload(&self, queue: &Queue, slot: usize, lanes: &[i32]) -> Result<(), ComputeError> {
        let buffer = self
            .inputs
            .get(slot)
            .ok_or(ComputeError::MissingInput(slot))?;
        if lanes.len() != self.lane_count {
            return Err(ComputeError::LengthMismatch {
                left: self.lane_count * 2,
                right: lanes.len() * 2,
            });
        }
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(lanes));
        Ok(())
    }

    /// Write the uniform parameter block.
    pub fn write_params<T: bytemuck::Pod>(&self, queue: &Queue, params: &T) {
        queue.write_buffer(&self.params, 0, bytemuck::bytes_of(params));
    }

    /// Bind inputs, capture target and parameters in the program's binding order.
    pub fn bind_group(&self, device: &Device, program: &StageProgram) -> wgpu::BindGroup {
        let mut entries: Vec<wgpu::BindGroupEntry> = self
            .inputs
            .iter()
            .enumerate()
            .map(|(i, buffer)| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        let capture_binding = self.inputs.len() as u32;
        entries.push(wgpu::BindGroupEntry {
            binding: capture_binding,
            resource: self.capture.as_entire_binding(),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: capture_binding + 1,
            resource: self.params.as_entire_binding(),
        });

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{}_bind_group", program.label())),
            layout: program.layout(),
            entries: &entries,
        })
    }

    /// Record the capture → staging copy after the dispatch.
    pub fn encode_capture(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_buffer_to_buffer(
            &self.capture,
            0,
            &self.staging,
            0,
            self.lane_count as u64 * LANE_BYTES,
        );
    }

    /// Block until all submitted work has drained, then read the whole
    /// capture buffer back.
    pub fn read_capture(&self, device: &Device) -> Result<Vec<i32>, ComputeError> {
        let slice = self.staging.slice(..);

        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| ComputeError::BufferMapFailed(e.to_string()))?;

        rx.recv()
            .map_err(|e| ComputeError::BufferMapFailed(e.to_string()))?
            .map_err(|e| ComputeError::BufferMapFailed(format!("{:?}", e)))?;

        let data = slice.get_mapped_range();
        let lanes: Vec<i32> = bytemuck::pod_collect_to_vec(&data);
        drop(data);
        self.staging.unmap();

        Ok(lanes)
    }
}

impl Drop for CaptureBuffers {
    fn drop(&mut self) {
        for buffer in &self.inputs {
            buffer.destroy();
        }
        self.capture.destroy();
        self.staging.destroy();
        self.params.destroy();
    }
}
