//! Pipeline construction for the wgpu backend.

use bytemuck::{Pod, Zeroable};

use crate::backend::Vertex;
use crate::batch::DrawCommand;
use crate::coords::Rect;
use crate::error::{VgError, VgResult};
use crate::style::{BlendMode, StencilMode};

pub const STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Stencil8;

/// Smallest vertex buffer ever allocated, in bytes.
pub(super) const MIN_VERTEX_BUFFER_BYTES: u64 = 64 * 1024;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct ViewportUniform {
    pub viewport: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
}

pub(super) fn viewport_ubo_min_binding_size() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<ViewportUniform>() as u64)
        .expect("ViewportUniform has non-zero size by construction")
}

/// Pipelines differ only in blend and stencil behavior.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(super) struct PipelineKey {
    pub blend: BlendMode,
    pub stencil: Option<StencilMode>,
}

/// Straight-alpha "over".
fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// `dst + src*a`; the render target saturates at 1.
fn additive_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

fn stencil_face(mode: Option<StencilMode>) -> (wgpu::StencilFaceState, u32) {
    let (compare, pass_op, write_mask) = match mode {
        None => (wgpu::CompareFunction::Always, wgpu::StencilOperation::Keep, 0x00),
        Some(StencilMode::Write) => (wgpu::CompareFunction::Always, wgpu::StencilOperation::Replace, 0xff),
        Some(StencilMode::TestEqual) => (wgpu::CompareFunction::Equal, wgpu::StencilOperation::Keep, 0x00),
        Some(StencilMode::TestNotEqual) => (wgpu::CompareFunction::NotEqual, wgpu::StencilOperation::Keep, 0x00),
    };
    let face = wgpu::StencilFaceState {
        compare,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op,
    };
    (face, write_mask)
}

pub(super) struct PipelineParams<'a> {
    pub device: &'a wgpu::Device,
    pub shader: &'a wgpu::ShaderModule,
    pub layout: &'a wgpu::PipelineLayout,
    pub color_format: wgpu::TextureFormat,
    pub sample_count: u32,
    pub vertex_binding: u32,
    pub stencil_attachment: bool,
}

pub(super) fn create_pipeline(params: &PipelineParams<'_>, key: PipelineKey) -> wgpu::RenderPipeline {
    // Slots below the configured binding carry no attributes; the vertex
    // buffer is bound to all of them so every declared slot is populated.
    let mut buffers: Vec<wgpu::VertexBufferLayout<'static>> = (0..params.vertex_binding)
        .map(|_| wgpu::VertexBufferLayout {
            array_stride: 0,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[],
        })
        .collect();
    buffers.push(Vertex::layout());

    let depth_stencil = params.stencil_attachment.then(|| {
        let (face, write_mask) = stencil_face(key.stencil);
        wgpu::DepthStencilState {
            format: STENCIL_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: wgpu::StencilState {
                front: face,
                back: face,
                read_mask: 0xff,
                write_mask,
            },
            bias: wgpu::DepthBiasState::default(),
        }
    });

    let blend = match key.blend {
        BlendMode::Alpha => alpha_blend(),
        BlendMode::Additive => additive_blend(),
    };

    params.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(match key.blend {
            BlendMode::Alpha => "glowline alpha pipeline",
            BlendMode::Additive => "glowline additive pipeline",
        }),
        layout: Some(params.layout),

        vertex: wgpu::VertexState {
            module: params.shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &buffers,
        },

        fragment: Some(wgpu::FragmentState {
            module: params.shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: params.color_format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Strokes mix windings (joins, caps, reversed segments).
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil,
        multisample: wgpu::MultisampleState {
            count: params.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },

        multiview_mask: None,
        cache: None,
    })
}

/// Converts a device-pixel clip rect to scissor arguments clamped to the frame.
///
/// `None` clip means the whole frame. Returns `None` when the clipped area is
/// empty and the draw should be skipped.
pub(super) fn clip_to_scissor(clip: Option<Rect>, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let (x, y, w, h) = match clip {
        None => (0, 0, width, height),
        Some(r) => {
            let r = r.normalized();
            let x = (r.origin.x.floor().max(0.0) as u32).min(width);
            let y = (r.origin.y.floor().max(0.0) as u32).min(height);
            let x2 = ((r.origin.x + r.size.x).ceil().max(0.0) as u32).min(width);
            let y2 = ((r.origin.y + r.size.y).ceil().max(0.0) as u32).min(height);
            (x, y, x2.saturating_sub(x), y2.saturating_sub(y))
        }
    };

    if w == 0 || h == 0 { None } else { Some((x, y, w, h)) }
}

/// New vertex buffer size when `required` bytes do not fit in `current`,
/// `None` when no growth is needed. Sizes only grow, at least doubling.
pub(super) fn grown_capacity(current: u64, required: u64) -> Option<u64> {
    if current > 0 && required <= current {
        return None;
    }
    Some(
        required
            .max(current.saturating_mul(2))
            .max(MIN_VERTEX_BUFFER_BYTES)
            .next_power_of_two(),
    )
}

/// Command indices in submission order: every alpha run, then every
/// additive run.
pub(super) fn pass_order(commands: &[DrawCommand]) -> Vec<usize> {
    [BlendMode::Alpha, BlendMode::Additive]
        .into_iter()
        .flat_map(|pass| {
            commands
                .iter()
                .enumerate()
                .filter(move |(_, c)| c.style.blend == pass)
                .map(|(i, _)| i)
        })
        .collect()
}

/// Every command must lie inside the `uploaded` vertices.
pub(super) fn check_draw_ranges(commands: &[DrawCommand], uploaded: u32) -> VgResult<()> {
    match commands.iter().find(|c| c.end_vertex() > uploaded) {
        Some(bad) => Err(VgError::backend(format!(
            "draw range {}..{} exceeds uploaded vertex count {uploaded}",
            bad.first_vertex,
            bad.end_vertex()
        ))),
        None => Ok(()),
    }
}
