//! wgpu backend.
//!
//! The host owns device, queue and surface; this backend owns one pipeline
//! per blend/stencil combination, a viewport uniform, and a small ring of
//! vertex buffers (one per frame in flight) that only ever grow.

mod pipeline;

use std::collections::HashMap;

use crate::coords::{Rect, Vec2};
use crate::error::{VgError, VgResult};
use crate::path::Subpath;
use crate::style::{FillStyle, StencilState, StrokeStyle};

use super::{Backend, BackendKind, FrameGeometry, FrameInfo, FrameTarget, Vertex};
pub use pipeline::STENCIL_FORMAT;

use pipeline::{
    check_draw_ranges, clip_to_scissor, create_pipeline, grown_capacity, pass_order,
    viewport_ubo_min_binding_size, PipelineKey, PipelineParams, ViewportUniform,
};

/// Resources and configuration supplied by the host.
#[derive(Debug, Clone)]
pub struct WgpuBackendDesc {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Format of the color view passed in each [`FrameTarget`].
    pub color_format: wgpu::TextureFormat,
    /// Vertex buffer slot the stroke vertices are bound to.
    pub vertex_binding: u32,
    pub frames_in_flight: u32,
    pub sample_count: u32,
    /// Frames carry a `Stencil8` view and stencil styles are honored.
    pub stencil_attachment: bool,
}

impl WgpuBackendDesc {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, color_format: wgpu::TextureFormat) -> Self {
        Self {
            device,
            queue,
            color_format,
            vertex_binding: 0,
            frames_in_flight: 2,
            sample_count: 1,
            stencil_attachment: false,
        }
    }
}

struct VertexSlot {
    buffer: Option<wgpu::Buffer>,
    capacity_bytes: u64,
}

pub struct WgpuBackend {
    desc: WgpuBackendDesc,

    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    bind_group: wgpu::BindGroup,
    viewport_ubo: wgpu::Buffer,

    vertex_slots: Vec<VertexSlot>,
    frame_counter: u64,

    geometry: FrameGeometry,
    frame: Option<FrameInfo>,
    target: Option<FrameTarget>,
    stencil_clear_pending: bool,
}

impl WgpuBackend {
    pub fn new(desc: WgpuBackendDesc) -> VgResult<Self> {
        if desc.frames_in_flight == 0 {
            return Err(VgError::invalid("frames_in_flight must be at least 1"));
        }
        if !matches!(desc.sample_count, 1 | 2 | 4 | 8 | 16) {
            return Err(VgError::invalid(format!("unsupported sample count {}", desc.sample_count)));
        }
        let max_buffers = desc.device.limits().max_vertex_buffers;
        if desc.vertex_binding >= max_buffers {
            return Err(VgError::invalid(format!(
                "vertex binding {} exceeds device limit {max_buffers}",
                desc.vertex_binding
            )));
        }

        let device = &desc.device;
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("glowline stroke shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/stroke.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("glowline viewport bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(viewport_ubo_min_binding_size()),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glowline pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let viewport_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glowline viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glowline viewport bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        let vertex_slots = (0..desc.frames_in_flight)
            .map(|_| VertexSlot { buffer: None, capacity_bytes: 0 })
            .collect();

        log::debug!(
            "wgpu backend: format {:?}, {} sample(s), {} frame(s) in flight, stencil {}",
            desc.color_format,
            desc.sample_count,
            desc.frames_in_flight,
            desc.stencil_attachment
        );

        Ok(Self {
            desc,
            shader,
            pipeline_layout,
            pipelines: HashMap::new(),
            bind_group,
            viewport_ubo,
            vertex_slots,
            frame_counter: 0,
            geometry: FrameGeometry::new(),
            frame: None,
            target: None,
            stencil_clear_pending: false,
        })
    }

    fn check_stencil(&self, stencil: Option<StencilState>) -> VgResult<()> {
        if stencil.is_some() && !self.desc.stencil_attachment {
            return Err(VgError::unsupported("stencil state requires a backend created with a stencil attachment"));
        }
        Ok(())
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let params = PipelineParams {
            device: &self.desc.device,
            shader: &self.shader,
            layout: &self.pipeline_layout,
            color_format: self.desc.color_format,
            sample_count: self.desc.sample_count,
            vertex_binding: self.desc.vertex_binding,
            stencil_attachment: self.desc.stencil_attachment,
        };
        let pipeline = create_pipeline(&params, key);
        self.pipelines.insert(key, pipeline);
    }

    /// Makes sure the vertex buffer for `slot` holds `required` bytes.
    ///
    /// Growth waits for the device to go idle first: the old buffer may
    /// still be referenced by in-flight submissions.
    fn ensure_vertex_capacity(&mut self, slot: usize, required: u64) -> VgResult<()> {
        let current = &self.vertex_slots[slot];
        let capacity = if current.buffer.is_some() { current.capacity_bytes } else { 0 };
        let Some(new_cap) = grown_capacity(capacity, required) else {
            return Ok(());
        };

        if current.buffer.is_some() {
            self.desc
                .device
                .poll(wgpu::PollType::wait_indefinitely())
                .map_err(|e| VgError::backend(format!("device wait before vertex buffer growth failed: {e}")))?;
        }

        log::debug!("wgpu backend: vertex buffer slot {slot} grows to {new_cap} bytes");

        let buffer = self.desc.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glowline vertex buffer"),
            size: new_cap,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.vertex_slots[slot] = VertexSlot { buffer: Some(buffer), capacity_bytes: new_cap };
        Ok(())
    }

    fn flush(&mut self, frame: FrameInfo, target: Option<FrameTarget>) -> VgResult<()> {
        let commands = self.geometry.commands();
        if commands.is_empty() {
            return Ok(());
        }
        let target = target.ok_or_else(|| VgError::backend("frame has draws but no render target"))?;
        let stencil_view = match (&target.stencil_view, self.desc.stencil_attachment) {
            (Some(view), true) => Some(view),
            (None, true) => return Err(VgError::backend("stencil attachment configured but frame target has no stencil view")),
            (_, false) => None,
        };

        let keys: Vec<PipelineKey> = commands
            .iter()
            .map(|c| PipelineKey { blend: c.style.blend, stencil: c.style.stencil.map(|s| s.mode) })
            .collect();
        for key in keys {
            self.ensure_pipeline(key);
        }

        let vertices: &[Vertex] = self.geometry.vertices();
        let uploaded = vertices.len() as u32;
        let bytes = std::mem::size_of_val(vertices) as u64;
        let slot = (self.frame_counter % self.vertex_slots.len() as u64) as usize;
        self.ensure_vertex_capacity(slot, bytes)?;

        let Some(vertex_buffer) = self.vertex_slots[slot].buffer.as_ref() else {
            return Err(VgError::backend("vertex buffer missing after allocation"));
        };
        let queue = &self.desc.queue;
        queue.write_buffer(vertex_buffer, 0, bytemuck::cast_slice(self.geometry.vertices()));
        let u = ViewportUniform {
            viewport: [frame.width.max(1) as f32, frame.height.max(1) as f32],
            _pad: [0.0; 2],
        };
        queue.write_buffer(&self.viewport_ubo, 0, bytemuck::bytes_of(&u));

        let commands = self.geometry.commands();
        check_draw_ranges(commands, uploaded)?;

        let mut encoder = self.desc.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("glowline frame encoder"),
        });

        {
            let stencil_load = if self.stencil_clear_pending { wgpu::LoadOp::Clear(0) } else { wgpu::LoadOp::Load };
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("glowline stroke pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: target.resolve_view.as_ref(),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: stencil_view.map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: None,
                    stencil_ops: Some(wgpu::Operations {
                        load: stencil_load,
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_bind_group(0, &self.bind_group, &[]);
            for binding in 0..=self.desc.vertex_binding {
                rpass.set_vertex_buffer(binding, vertex_buffer.slice(..bytes));
            }

            // Alpha first, then additive, so glow always lands on top.
            let mut bound: Option<PipelineKey> = None;
            for cmd in pass_order(commands).into_iter().map(|i| &commands[i]) {
                let Some((sx, sy, sw, sh)) = clip_to_scissor(cmd.style.clip, frame.width, frame.height) else {
                    continue;
                };
                let key = PipelineKey { blend: cmd.style.blend, stencil: cmd.style.stencil.map(|s| s.mode) };
                if bound != Some(key) {
                    let Some(pipeline) = self.pipelines.get(&key) else {
                        return Err(VgError::backend(format!("pipeline for {key:?} was not created")));
                    };
                    rpass.set_pipeline(pipeline);
                    bound = Some(key);
                }
                if let Some(stencil) = cmd.style.stencil {
                    rpass.set_stencil_reference(stencil.reference as u32);
                }
                rpass.set_scissor_rect(sx, sy, sw, sh);
                rpass.draw(cmd.first_vertex..cmd.end_vertex(), 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        self.stencil_clear_pending = false;

        log::trace!(
            "wgpu frame {}x{}: {} draws, {} vertices",
            frame.width,
            frame.height,
            commands.len(),
            uploaded
        );
        Ok(())
    }
}

impl Backend for WgpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Wgpu
    }

    fn begin_frame(&mut self, frame: &FrameInfo, target: Option<FrameTarget>) -> VgResult<()> {
        self.geometry.reset();
        self.frame = Some(*frame);
        self.target = target;
        Ok(())
    }

    fn end_frame(&mut self) -> VgResult<()> {
        let frame = self
            .frame
            .take()
            .ok_or_else(|| VgError::backend("end_frame without begin_frame"))?;
        let target = self.target.take();
        let result = self.flush(frame, target);
        self.frame_counter = self.frame_counter.wrapping_add(1);
        result
    }

    fn draw_polyline(
        &mut self,
        points: &[Vec2],
        closed: bool,
        style: &StrokeStyle,
        clip: Option<Rect>,
    ) -> VgResult<()> {
        self.check_stencil(style.stencil)?;
        self.geometry.push_stroke(&[(points, closed)], style, clip)
    }

    fn draw_path_stroke(
        &mut self,
        subpaths: &[Subpath],
        style: &StrokeStyle,
        clip: Option<Rect>,
    ) -> VgResult<()> {
        self.check_stencil(style.stencil)?;
        self.geometry.push_subpaths(subpaths, style, clip)
    }

    fn fill_convex(&mut self, points: &[Vec2], style: &FillStyle, clip: Option<Rect>) -> VgResult<()> {
        self.check_stencil(style.stencil)?;
        self.geometry.push_fill(points, style, clip)
    }

    fn clear_stencil(&mut self) -> VgResult<()> {
        if !self.desc.stencil_attachment {
            return Err(VgError::unsupported("backend was created without a stencil attachment"));
        }
        self.stencil_clear_pending = true;
        Ok(())
    }

    fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }
}
