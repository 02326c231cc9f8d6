//! Uniform parameter structs for the synthesis and mixing shaders.
//!
//! These structs must match the WGSL shader definitions exactly,
//! including alignment requirements.

use crate::config::ToneConfig;

use super::pipelines::DispatchGeometry;

/// Synthesis parameters.
/// WGSL: struct SynthParams { lane_count, period, row_stride, _pad0: u32, amplitude: f32, 3 x f32 pad }
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SynthParams {
    pub lane_count: u32,
    pub period: u32,
    pub row_stride: u32,
    pub _pad0: u32,
    pub amplitude: f32,
    pub _pad1: f32,
    pub _pad2: f32,
    pub _pad3: f32,
}

impl SynthParams {
    pub fn new(tone: &ToneConfig, lane_count: u32, geometry: &DispatchGeometry) -> Self {
        Self {
            lane_count,
            period: tone.period(),
            row_stride: geometry.row_stride,
            _pad0: 0,
            amplitude: f32::from(tone.amplitude),
            _pad1: 0.0,
            _pad2: 0.0,
            _pad3: 0.0,
        }
    }
}

/// Mixing parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MixParams {
    pub lane_count: u32,
    pub row_stride: u32,
    pub _padding: [u32; 2],
}

impl MixParams {
    pub fn new(lane_count: u32, geometry: &DispatchGeometry) -> Self {
        Self {
            lane_count,
            row_stride: geometry.row_stride,
            _padding: [0; 2],
        }
    }
}
