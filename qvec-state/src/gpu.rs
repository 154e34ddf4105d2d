//! wgpu-backed accelerator context
//!
//! Implements [`AcceleratorContext`] over a compute device. Amplitudes are
//! stored on the device as pairs of f32, the widest type the portable
//! shader model offers, so resident execution trades precision for
//! bandwidth; keep long high-accuracy runs on the host kernels.

use crate::accel::{AccelHandle, AcceleratorContext};
use num_complex::Complex64;
use parking_lot::Mutex;
use qvec_core::{EngineError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use wgpu::util::DeviceExt;

const WORKGROUP_SIZE: u32 = 64;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Params {
    target_stride: u32,
    control_mask: u32,
    control2_mask: u32,
    _pad: u32,
    // m00, m01, m10, m11 as (re, im); diagonal kernels read m00/m11.
    matrix: [[f32; 2]; 4],
}

struct DeviceBuffer {
    storage: wgpu::Buffer,
    len: usize,
}

struct Pipelines {
    matrix2: wgpu::ComputePipeline,
    diagonal: wgpu::ComputePipeline,
    cnot: wgpu::ComputePipeline,
    toffoli: wgpu::ComputePipeline,
}

/// Process-lifetime GPU context
pub struct GpuAccelerator {
    device: wgpu::Device,
    queue: wgpu::Queue,
    bind_layout: wgpu::BindGroupLayout,
    pipelines: Pipelines,
    buffers: Mutex<HashMap<AccelHandle, DeviceBuffer>>,
    next_handle: AtomicU64,
}

impl GpuAccelerator {
    /// Initialize the first available compute adapter
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(EngineError::AcceleratorUnavailable)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("qvec-gpu"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        ))
        .map_err(|_| EngineError::AcceleratorUnavailable)?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("qvec-gate-kernels"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/gate_kernels.wgsl").into()),
        });

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("qvec-gate-bindings"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
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
            label: Some("qvec-gate-pipeline"),
            bind_group_layouts: &[&bind_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |entry: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: entry,
            })
        };

        let pipelines = Pipelines {
            matrix2: make_pipeline("matrix2"),
            diagonal: make_pipeline("diagonal"),
            cnot: make_pipeline("cnot"),
            toffoli: make_pipeline("toffoli"),
        };

        Ok(Self {
            device,
            queue,
            bind_layout,
            pipelines,
            buffers: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        })
    }

    fn dispatch(&self, handle: AccelHandle, pipeline: &wgpu::ComputePipeline, params: Params) -> Result<()> {
        let buffers = self.buffers.lock();
        let buffer = buffers
            .get(&handle)
            .ok_or_else(|| EngineError::Internal(format!("unknown device buffer {}", handle)))?;

        let params_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("qvec-gate-params"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("qvec-gate-bind"),
            layout: &self.bind_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.storage.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("qvec-gate-encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("qvec-gate-pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            let workgroups = (buffer.len as u32).div_ceil(WORKGROUP_SIZE);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}

fn matrix_params(matrix: &[[Complex64; 2]; 2], target: usize) -> Params {
    Params {
        target_stride: (1u32) << target,
        control_mask: 0,
        control2_mask: 0,
        _pad: 0,
        matrix: [
            [matrix[0][0].re as f32, matrix[0][0].im as f32],
            [matrix[0][1].re as f32, matrix[0][1].im as f32],
            [matrix[1][0].re as f32, matrix[1][0].im as f32],
            [matrix[1][1].re as f32, matrix[1][1].im as f32],
        ],
    }
}

impl AcceleratorContext for GpuAccelerator {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn upload(&self, amplitudes: &[Complex64]) -> Result<AccelHandle> {
        let staged: Vec<[f32; 2]> = amplitudes
            .iter()
            .map(|a| [a.re as f32, a.im as f32])
            .collect();
        let storage = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("qvec-state"),
                contents: bytemuck::cast_slice(&staged),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
            });

        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.buffers.lock().insert(
            handle,
            DeviceBuffer {
                storage,
                len: amplitudes.len(),
            },
        );
        Ok(handle)
    }

    fn download(&self, handle: AccelHandle, out: &mut [Complex64]) -> Result<()> {
        let buffers = self.buffers.lock();
        let buffer = buffers
            .get(&handle)
            .ok_or_else(|| EngineError::Internal(format!("unknown device buffer {}", handle)))?;
        if buffer.len != out.len() {
            return Err(EngineError::Internal(format!(
                "device buffer length {} does not match host buffer {}",
                buffer.len,
                out.len()
            )));
        }

        let byte_len = (buffer.len * 8) as wgpu::BufferAddress;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("qvec-readback"),
            size: byte_len,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("qvec-readback-encoder"),
            });
        encoder.copy_buffer_to_buffer(&buffer.storage, 0, &staging, 0, byte_len);
        self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| EngineError::Internal("device readback channel closed".into()))?
            .map_err(|e| EngineError::Internal(format!("device readback failed: {:?}", e)))?;

        {
            let mapped = slice.get_mapped_range();
            let values: &[[f32; 2]] = bytemuck::cast_slice(&mapped);
            for (dst, src) in out.iter_mut().zip(values.iter()) {
                *dst = Complex64::new(src[0] as f64, src[1] as f64);
            }
        }
        staging.unmap();
        Ok(())
    }

    fn release(&self, handle: AccelHandle) {
        self.buffers.lock().remove(&handle);
    }

    fn apply_matrix2(
        &self,
        handle: AccelHandle,
        matrix: &[[Complex64; 2]; 2],
        target: usize,
    ) -> Result<()> {
        self.dispatch(handle, &self.pipelines.matrix2, matrix_params(matrix, target))
    }

    fn apply_diagonal(
        &self,
        handle: AccelHandle,
        diag: [Complex64; 2],
        target: usize,
    ) -> Result<()> {
        let matrix = [
            [diag[0], Complex64::new(0.0, 0.0)],
            [Complex64::new(0.0, 0.0), diag[1]],
        ];
        self.dispatch(handle, &self.pipelines.diagonal, matrix_params(&matrix, target))
    }

    fn apply_cnot(&self, handle: AccelHandle, control: usize, target: usize) -> Result<()> {
        let mut params = matrix_params(&identity2(), target);
        params.control_mask = 1u32 << control;
        self.dispatch(handle, &self.pipelines.cnot, params)
    }

    fn apply_toffoli(
        &self,
        handle: AccelHandle,
        control1: usize,
        control2: usize,
        target: usize,
    ) -> Result<()> {
        let mut params = matrix_params(&identity2(), target);
        params.control_mask = 1u32 << control1;
        params.control2_mask = 1u32 << control2;
        self.dispatch(handle, &self.pipelines.toffoli, params)
    }
}

fn identity2() -> [[Complex64; 2]; 2] {
    [
        [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
        [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
    ]
}
