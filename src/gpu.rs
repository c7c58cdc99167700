// --- File: gpu.rs ---
use crate::buffer::Slot;
use crate::constants::WORKGROUP_SIZE;
use crate::device::{ComputeDevice, DispatchMode};
use crate::error::{SimError, SimResult};
use crate::grid::{Cell, Grid};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

// --- GPU Data Structures ---

// Must match `Params` in the kernel.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct KernelParams {
    resolution: u32,
    running: u32,
    _padding: [u32; 2],
}

/// Kernel bundled with the binary: Conway's rules on the alive channel.
pub const LIFE_KERNEL: &str = include_str!("shaders/life.wgsl");

/// Compute device backed by two wgpu storage buffers.
///
/// The kernel source must declare `@compute fn main` with
/// `@group(0) @binding(0) var<uniform> params: Params`,
/// `@binding(1) var<storage, read> source_cells: array<Cell>` and
/// `@binding(2) var<storage, read_write> target_cells: array<Cell>`.
pub struct GpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    cell_buffers: [wgpu::Buffer; 2],
    staging_buffer: wgpu::Buffer,
    params_buffer: wgpu::Buffer,
    // Indexed by the source slot: [front -> back, back -> front]
    bind_groups: [wgpu::BindGroup; 2],
    resolution: u32,
    adapter_info: wgpu::AdapterInfo,
}

impl GpuDevice {
    pub fn new(resolution: u32, kernel_source: &str) -> SimResult<Self> {
        pollster::block_on(Self::new_async(resolution, kernel_source))
    }

    pub async fn new_async(resolution: u32, kernel_source: &str) -> SimResult<Self> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(SimError::AdapterNotFound)?;
        let adapter_info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", adapter_info.name, adapter_info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Gridstep Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let cell_count = (resolution as usize) * (resolution as usize);
        let buffer_size = (cell_count * std::mem::size_of::<Cell>()) as wgpu::BufferAddress;
        check_limits(&device.limits(), cell_count, buffer_size)?;

        // Kernel and resource errors are collected here rather than
        // reaching wgpu's default handler, which panics.
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Transition Kernel Module"),
            source: wgpu::ShaderSource::Wgsl(kernel_source.into()),
        });

        // --- Create Buffers ---

        let make_cell_buffer = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: buffer_size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        };
        let cell_buffers = [
            make_cell_buffer("Front Cell Buffer"),
            make_cell_buffer("Back Cell Buffer"),
        ];

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cell Readback Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params = KernelParams {
            resolution,
            running: 0,
            _padding: [0; 2],
        };
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Kernel Params Buffer"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // --- Bind Groups ---

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
            label: Some("Kernel Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1, true),
                storage_entry(2, false),
            ],
        });

        let make_bind_group = |label: &str, source: &wgpu::Buffer, target: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: source.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: target.as_entire_binding(),
                    },
                ],
            })
        };
        let bind_groups = [
            make_bind_group("Front->Back Bind Group", &cell_buffers[0], &cell_buffers[1]),
            make_bind_group("Back->Front Bind Group", &cell_buffers[1], &cell_buffers[0]),
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Kernel Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Transition Kernel Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        let setup = pop_error_scope(&device, "kernel setup").await;
        let allocation = pop_error_scope(&device, "buffer allocation").await;
        setup?;
        allocation?;

        Ok(Self {
            device,
            queue,
            pipeline,
            cell_buffers,
            staging_buffer,
            params_buffer,
            bind_groups,
            resolution,
            adapter_info,
        })
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    fn cell_count(&self) -> usize {
        (self.resolution as usize) * (self.resolution as usize)
    }

    fn check_len(&self, actual: usize) -> SimResult<()> {
        if actual != self.cell_count() {
            return Err(SimError::SizeMismatch {
                expected: self.cell_count(),
                actual,
            });
        }
        Ok(())
    }
}

fn check_limits(
    limits: &wgpu::Limits,
    cell_count: usize,
    buffer_size: wgpu::BufferAddress,
) -> SimResult<()> {
    let workgroups = (cell_count as u64).div_ceil(WORKGROUP_SIZE as u64);
    if workgroups > limits.max_compute_workgroups_per_dimension as u64 {
        return Err(SimError::Device(format!(
            "{} cells need {} workgroups, device allows {}",
            cell_count, workgroups, limits.max_compute_workgroups_per_dimension
        )));
    }
    let max_binding = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
    if buffer_size > max_binding {
        return Err(SimError::Device(format!(
            "cell buffer of {} bytes exceeds the device limit of {} bytes",
            buffer_size, max_binding
        )));
    }
    Ok(())
}

async fn pop_error_scope(device: &wgpu::Device, stage: &str) -> SimResult<()> {
    match device.pop_error_scope().await {
        Some(err) => Err(SimError::Device(format!("{}: {}", stage, err))),
        None => Ok(()),
    }
}

impl ComputeDevice for GpuDevice {
    fn upload(&mut self, slot: Slot, grid: &Grid) -> SimResult<()> {
        self.check_len(grid.len())?;
        self.queue.write_buffer(
            &self.cell_buffers[slot.index()],
            0,
            bytemuck::cast_slice(grid.cells()),
        );
        Ok(())
    }

    fn dispatch(&mut self, source: Slot, target: Slot, mode: DispatchMode) -> SimResult<()> {
        if source == target {
            return Err(SimError::Device(
                "dispatch source and target must differ".into(),
            ));
        }
        let params = KernelParams {
            resolution: self.resolution,
            running: mode.is_running() as u32,
            _padding: [0; 2],
        };
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Kernel Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Kernel Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_groups[source.index()], &[]);
            let workgroups = (self.cell_count() as u32).div_ceil(WORKGROUP_SIZE);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
        // Submitted, not awaited. The next fetch waits for it.
        self.queue.submit(Some(encoder.finish()));
        pollster::block_on(pop_error_scope(&self.device, "dispatch"))?;
        log::debug!("gpu dispatch {:?} {:?} -> {:?}", mode, source, target);
        Ok(())
    }

    fn fetch(&mut self, slot: Slot, out: &mut Grid) -> SimResult<()> {
        self.check_len(out.len())?;
        let size = self.staging_buffer.size();
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(
            &self.cell_buffers[slot.index()],
            0,
            &self.staging_buffer,
            0,
            size,
        );
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = self.staging_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| SimError::Device("readback callback dropped".into()))??;

        let copied = {
            let data = buffer_slice.get_mapped_range();
            out.copy_from(bytemuck::cast_slice(&data[..]))
        };
        self.staging_buffer.unmap();
        copied?;
        log::debug!("gpu fetch {:?}", slot);
        Ok(())
    }

    fn commit(&mut self, slot: Slot, index: usize, cell: Cell) -> SimResult<()> {
        if index >= self.cell_count() {
            let n = self.resolution as usize;
            return Err(SimError::OutOfBounds {
                x: (index / n) as u32,
                y: (index % n) as u32,
                resolution: self.resolution,
            });
        }
        let offset = (index * std::mem::size_of::<Cell>()) as wgpu::BufferAddress;
        self.queue.write_buffer(
            &self.cell_buffers[slot.index()],
            offset,
            bytemuck::bytes_of(&cell),
        );
        Ok(())
    }
}


// --- End of File: gpu.rs ---
