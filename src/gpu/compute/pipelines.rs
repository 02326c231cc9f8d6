//! Compute program creation: shader build, bind group layout, pipeline, and
//! dispatch geometry.

use wgpu::{BindGroupLayout, ComputePipeline, Device, ShaderModule};

use super::ComputeError;

/// Invocations per workgroup. Must match `@workgroup_size` in the shaders.
pub const WORKGROUP_SIZE: u32 = 256;

/// A compiled stage: `input_count` read-only storage inputs, one read-write
/// capture buffer, then a uniform parameter block, bound in that order.
pub struct StageProgram {
    label: &'static str,
    input_count: u32,
    layout: BindGroupLayout,
    pipeline: ComputePipeline,
}

impl StageProgram {
    /// Compile `source` and build the pipeline for `entry_point`.
    ///
    /// Validation errors from the module, layout or pipeline are captured
    /// and returned as [`ComputeError::ShaderBuild`].
    pub fn new(
        device: &Device,
        label: &'static str,
        source: &str,
        entry_point: &str,
        input_count: u32,
    ) -> Result<Self, ComputeError> {
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = build_shader(device, label, source)?;
        let layout = create_stage_layout(device, label, input_count);
        let pipeline = create_pipeline(device, &shader, &layout, entry_point);
        if let Some(error) = pollster::block_on(scope.pop()) {
            return Err(ComputeError::ShaderBuild(format!("{}: {}", label, error)));
        }

        Ok(Self {
            label,
            input_count,
            layout,
            pipeline,
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn input_count(&self) -> u32 {
        self.input_count
    }

    pub fn layout(&self) -> &BindGroupLayout {
        &self.layout
    }

    pub fn pipeline(&self) -> &ComputePipeline {
        &self.pipeline
    }
}

/// Compile WGSL source, failing on any compiler error message.
fn build_shader(device: &Device, label: &str, source: &str) -> Result<ShaderModule, ComputeError> {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let info = pollster::block_on(shader.get_compilation_info());
    let errors: Vec<String> = info
        .messages
        .iter()
        .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
        .map(|m| m.message.clone())
        .collect();
    if !errors.is_empty() {
        return Err(ComputeError::ShaderBuild(format!(
            "{}: {}",
            label,
            errors.join("; ")
        )));
    }

    Ok(shader)
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_stage_layout(device: &Device, name: &str, input_count: u32) -> BindGroupLayout {
    let mut entries: Vec<wgpu::BindGroupLayoutEntry> =
        (0..input_count).map(|b| storage_entry(b, true)).collect();
    entries.push(storage_entry(input_count, false));
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: input_count + 1,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    });

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{}_layout", name)),
        entries: &entries,
    })
}

fn create_pipeline(
    device: &Device,
    shader: &ShaderModule,
    layout: &BindGroupLayout,
    entry_point: &str,
) -> ComputePipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{}_pipeline_layout", entry_point)),
        bind_group_layouts: &[layout],
        immediate_size: 0,
    });

    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(&format!("{}_pipeline", entry_point)),
        layout: Some(&pipeline_layout),
        module: shader,
        entry_point: Some(entry_point),
        compilation_options: Default::default(),
        cache: None,
    })
}

/// Workgroup grid for one lane per invocation.
///
/// A single dimension is capped by `max_compute_workgroups_per_dimension`,
/// so large runs spill into rows. The shaders linearize
/// `gid.y * row_stride + gid.x` and skip indices past the lane count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchGeometry {
    pub x: u32,
    pub y: u32,
    /// Invocations per row (`x * WORKGROUP_SIZE`).
    pub row_stride: u32,
}

impl DispatchGeometry {
    pub fn for_lanes(lane_count: u32, max_per_dimension: u32) -> Result<Self, ComputeError> {
        let groups = lane_count.div_ceil(WORKGROUP_SIZE).max(1);
        let x = groups
            .min(max_per_dimension.max(1))
            .min(u32::MAX / WORKGROUP_SIZE);
        let y = groups.div_ceil(x);
        let geometry = Self {
            x,
            y,
            row_stride: x * WORKGROUP_SIZE,
        };
        // Linear indices are u32 in the shaders and must not wrap.
        if y > max_per_dimension || geometry.invocations() > u64::from(u32::MAX) + 1 {
            return Err(ComputeError::TooManyInvocations(lane_count as usize));
        }
        Ok(geometry)
    }

    /// Total invocations launched, including the idle tail.
    pub fn invocations(&self) -> u64 {
        u64::from(self.x) * u64::from(self.y) * u64::from(WORKGROUP_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COPY_SHADER: &str = r#"
        @group(0) @binding(0) var<storage, read> input: array<i32>;
        @group(0) @binding(1) var<storage, read_write> capture: array<i32>;
        @group(0) @binding(2) var<uniform> params: vec4<u32>;

        @compute @workgroup_size(256)
        fn copy(@builtin(global_invocation_id) gid: vec3<u32>) {
            if (gid.x < params.x) {
                capture[gid.x] = input[gid.x];
            }
        }
    "#;

    fn create_test_device() -> Option<Device> {
        let ctx = crate::gpu::GpuContext::new_blocking().ok()?;
        Some((*ctx.device).clone())
    }

    #[test]
    fn test_stage_program_matches_shader_bindings() {
        if let Some(device) = create_test_device() {
            let program = StageProgram::new(&device, "copy", COPY_SHADER, "copy", 1).unwrap();
            assert_eq!(program.input_count(), 1);
            assert_eq!(program.label(), "copy");
        }
    }

    #[test]
    fn test_binding_mismatch_is_build_error() {
        if let Some(device) = create_test_device() {
            // Layout with no inputs puts the uniform where the shader expects capture.
            let result = StageProgram::new(&device, "copy", COPY_SHADER, "copy", 0);
            assert!(matches!(result, Err(ComputeError::ShaderBuild(_))));
        }
    }

    #[test]
    fn test_invalid_wgsl_is_build_error() {
        if let Some(device) = create_test_device() {
            let result = StageProgram::new(&device, "broken", "fn copy( {", "copy", 0);
            assert!(matches!(result, Err(ComputeError::ShaderBuild(_))));
        }
    }

    #[test]
    fn test_small_dispatch_is_one_row() {
        let g = DispatchGeometry::for_lanes(4, 65535).unwrap();
        assert_eq!(g, DispatchGeometry { x: 1, y: 1, row_stride: 256 });
    }

    #[test]
    fn test_exact_multiple() {
        let g = DispatchGeometry::for_lanes(512, 65535).unwrap();
        assert_eq!((g.x, g.y), (2, 1));
    }

    #[test]
    fn test_large_dispatch_spills_into_rows() {
        // 195,804,000 samples as packed pairs
        let lanes = 97_902_000;
        let g = DispatchGeometry::for_lanes(lanes, 65535).unwrap();
        assert_eq!(g.x, 65535);
        assert_eq!(g.y, 6);
        assert!(g.invocations() >= u64::from(lanes));
        assert!(g.invocations() - u64::from(lanes) < u64::from(g.row_stride));
    }

    #[test]
    fn test_too_many_invocations() {
        let result = DispatchGeometry::for_lanes(u32::MAX, 4);
        assert!(matches!(result, Err(ComputeError::TooManyInvocations(_))));

        // Fits the grid, but the idle tail would push indices past u32::MAX.
        let result = DispatchGeometry::for_lanes(u32::MAX, 65535);
        assert!(matches!(result, Err(ComputeError::TooManyInvocations(_))));
    }
}
