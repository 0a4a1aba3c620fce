//! wgpu compute implementation of the aspect kernel
//!
//! The pipeline is built once per evaluator. Buffers are created per call and
//! dropped before returning, so nothing is cached between grids.
//!
//! # Shader Files
//!
//! - `shaders/aspect.wgsl` - Horn gradient and compass mapping at `f32`

use super::context::GpuContext;
use crate::error::{AspectError, Result};
use crate::grid::Grid;
use bytemuck::{Pod, Zeroable};
use tracing::debug;
use wgpu::util::DeviceExt;

/// Workgroup edge length, must match `@workgroup_size` in the shader
const WORKGROUP_SIZE: u32 = 16;

/// Shader parameters (must match WGSL struct layout)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct AspectParams {
    rows: u32,
    cols: u32,
    _pad0: u32,
    _pad1: u32,
}

/// Compiled aspect pipeline bound to one GPU device
pub struct GpuAspectKernel {
    context: GpuContext,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl GpuAspectKernel {
    /// Compile the shader and create the compute pipeline
    #[must_use]
    pub fn new(context: GpuContext) -> Self {
        let device = context.device();

        let shader = device.create_shader_module(wgpu::include_wgsl!("shaders/aspect.wgsl"));

        let storage_entry = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Aspect Bind Group Layout"),
            entries: &[
                // elevation (binding 0)
                storage_entry(0, true),
                // aspect (binding 1)
                storage_entry(1, false),
                // params (binding 2)
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Aspect Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Aspect Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        Self {
            context,
            pipeline,
            bind_group_layout,
        }
    }

    /// Adapter the kernel runs on
    #[must_use]
    pub fn adapter_name(&self) -> &str {
        self.context.adapter_name()
    }

    /// Upload `grid`, launch one invocation per cell and block until the
    /// result is read back
    ///
    /// # Errors
    ///
    /// Returns [`AspectError::DeviceUnavailable`] if the grid does not fit the
    /// device limits and [`AspectError::Device`] if readback fails.
    pub fn run(&self, grid: &Grid) -> Result<Grid> {
        let (rows, cols) = grid.shape();
        if !grid.has_interior() {
            return Ok(Grid::missing(rows, cols));
        }
        if !self.context.can_allocate(rows, cols) {
            return Err(AspectError::DeviceUnavailable(format!(
                "{rows}x{cols} grid exceeds limits of '{}'",
                self.adapter_name()
            )));
        }

        let device = self.context.device();
        let queue = self.context.queue();

        let elevation: Vec<f32> = grid.as_slice().iter().map(|&v| v as f32).collect();
        let missing: Vec<f32> = vec![f32::NAN; rows * cols];
        let buffer_size = (rows * cols * std::mem::size_of::<f32>()) as u64;

        let elevation_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Elevation"),
            contents: bytemuck::cast_slice(&elevation),
            usage: wgpu::BufferUsages::STORAGE,
        });

        // Pre-filled so cells the shader skips read back as missing
        let aspect_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Aspect"),
            contents: bytemuck::cast_slice(&missing),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        });

        let params = AspectParams {
            rows: rows as u32,
            cols: cols as u32,
            _pad0: 0,
            _pad1: 0,
        };
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Aspect Params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Aspect Staging"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Aspect Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: elevation_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: aspect_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Aspect Encoder"),
        });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Aspect Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);

            // x walks columns, y walks rows
            let groups_x = params.cols.div_ceil(WORKGROUP_SIZE);
            let groups_y = params.rows.div_ceil(WORKGROUP_SIZE);
            debug!(
                "Dispatching aspect kernel: {}x{} workgroups for {}x{} grid",
                groups_x, groups_y, rows, cols
            );
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }

        encoder.copy_buffer_to_buffer(&aspect_buffer, 0, &staging_buffer, 0, buffer_size);
        queue.submit(Some(encoder.finish()));

        // Map buffer and read data (blocking)
        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            sender.send(result).ok();
        });

        let _ = device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|e| AspectError::Device(format!("readback channel closed: {e}")))?
            .map_err(|e| AspectError::Device(format!("failed to map aspect buffer: {e}")))?;

        let data = buffer_slice.get_mapped_range();
        let values: Vec<f64> = bytemuck::cast_slice::<u8, f32>(&data)
            .iter()
            .map(|&v| f64::from(v))
            .collect();
        drop(data);
        staging_buffer.unmap();

        Grid::from_vec(rows, cols, values)
    }
}
