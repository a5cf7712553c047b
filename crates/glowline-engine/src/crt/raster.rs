use crate::backend::FrameGeometry;
use crate::batch::DrawCommand;
use crate::coords::{Color, Vec2};
use crate::error::{VgError, VgResult};
use crate::style::BlendMode;

use super::bloom::apply_bloom;
use super::noise::{hash32, signed_noise};
use super::CrtProfile;

/// Brightness perturbation per unit of jitter.
const JITTER_BRIGHTNESS: f32 = 0.25;

/// Caller-owned RGBA8 pixel buffer, tightly packed or strided.
#[derive(Debug)]
pub struct PixelTarget<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
    stride: usize,
}

impl<'a> PixelTarget<'a> {
    /// Wraps `pixels`; requires `stride_bytes >= width * 4` and enough bytes
    /// for every row.
    pub fn new(pixels: &'a mut [u8], width: u32, height: u32, stride_bytes: usize) -> VgResult<Self> {
        if width == 0 || height == 0 {
            return Err(VgError::invalid(format!("pixel target must be non-empty, got {width}x{height}")));
        }
        let row_bytes = width as usize * 4;
        if stride_bytes < row_bytes {
            return Err(VgError::invalid(format!("stride {stride_bytes} is smaller than row size {row_bytes}")));
        }
        let required = stride_bytes
            .checked_mul(height as usize - 1)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or_else(|| VgError::invalid(format!("stride {stride_bytes} x {height} rows overflows")))?;
        if pixels.len() < required {
            return Err(VgError::invalid(format!(
                "pixel buffer holds {} bytes, {required} required",
                pixels.len()
            )));
        }
        Ok(Self { pixels, width, height, stride: stride_bytes })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride + x as usize * 4
    }

    /// Reads a pixel as normalized floats.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [f32; 4] {
        let o = self.offset(x, y);
        let p = &self.pixels[o..o + 4];
        [p[0], p[1], p[2], p[3]].map(|c| c as f32 / 255.0)
    }

    /// Writes a pixel from normalized floats (clamped to `[0, 1]`).
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, rgba: [f32; 4]) {
        let o = self.offset(x, y);
        let out = rgba.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        self.pixels[o..o + 4].copy_from_slice(&out);
    }

    /// Fills every pixel with `color`.
    pub fn clear(&mut self, color: Color) {
        let rgba = color.to_array();
        for y in 0..self.height {
            for x in 0..self.width {
                self.set(x, y, rgba);
            }
        }
    }
}

/// Integer pixel bounds, half-open.
#[derive(Debug, Copy, Clone)]
struct PixelBounds {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

/// Per-command CRT modulation for one frame.
#[derive(Debug, Copy, Clone)]
struct Modulation {
    offset: Vec2,
    intensity: f32,
}

fn modulation(profile: &CrtProfile, frame_index: u64, cmd_index: u32, base_intensity: f32) -> Modulation {
    let n = |channel| signed_noise(hash32(frame_index, cmd_index, channel));
    let flicker = (1.0 + profile.flicker_amount * n(0)).max(0.0);
    let jitter_brightness = (1.0 + JITTER_BRIGHTNESS * profile.jitter_amount * n(1)).max(0.0);
    Modulation {
        offset: Vec2::new(n(2), n(3)) * profile.jitter_amount,
        intensity: base_intensity * profile.beam_intensity * flicker * jitter_brightness,
    }
}

/// Rasterizes every batched command into `target`, then applies bloom.
///
/// Alpha-blended commands are drawn before additive ones so glow always lands
/// on top, as on the GPU path.
/// Triangles are scan-converted with an edge-function half-space test at
/// pixel centers; both windings are accepted. The result depends only on the
/// geometry, the profile and `frame_index`.
pub fn rasterize_frame(
    geometry: &FrameGeometry,
    profile: &CrtProfile,
    frame_index: u64,
    target: &mut PixelTarget<'_>,
) -> VgResult<()> {
    profile.validate()?;
    let vertices = geometry.vertices();

    // Alpha runs first, then additive, matching the GPU pass order.
    let passes = [BlendMode::Alpha, BlendMode::Additive];
    let ordered = passes.iter().flat_map(|&pass| {
        geometry
            .commands()
            .iter()
            .enumerate()
            .filter(move |(_, cmd)| cmd.style.blend == pass)
    });

    for (i, cmd) in ordered {
        let Some(bounds) = command_bounds(cmd, target) else { continue };
        let m = modulation(profile, frame_index, i as u32, cmd.style.intensity);
        let src = cmd.style.color.scaled(m.intensity);

        let start = cmd.first_vertex as usize;
        let end = (cmd.end_vertex() as usize).min(vertices.len());
        for tri in vertices[start..end].chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|v| v.position() + m.offset);
            fill_triangle(target, bounds, a, b, c, src, cmd.style.blend);
        }
    }

    if profile.bloom_strength > 0.0 {
        apply_bloom(target, profile.bloom_strength, profile.bloom_radius_px);
    }
    Ok(())
}

fn command_bounds(cmd: &DrawCommand, target: &PixelTarget<'_>) -> Option<PixelBounds> {
    let full = PixelBounds { x0: 0, y0: 0, x1: target.width, y1: target.height };
    let Some(clip) = cmd.style.clip else { return Some(full) };
    let clip = clip.normalized();
    let to_px = |v: f32, max: u32| (v.max(0.0) as u32).min(max);
    let b = PixelBounds {
        x0: to_px(clip.origin.x.floor(), full.x1),
        y0: to_px(clip.origin.y.floor(), full.y1),
        x1: to_px((clip.origin.x + clip.size.x).ceil(), full.x1),
        y1: to_px((clip.origin.y + clip.size.y).ceil(), full.y1),
    };
    (b.x0 < b.x1 && b.y0 < b.y1).then_some(b)
}

#[inline]
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn fill_triangle(
    target: &mut PixelTarget<'_>,
    bounds: PixelBounds,
    a: Vec2,
    b: Vec2,
    c: Vec2,
    src: Color,
    blend: BlendMode,
) {
    let area = edge(a, b, c);
    if area == 0.0 || !area.is_finite() {
        return;
    }
    let sign = area.signum();

    let min_x = a.x.min(b.x).min(c.x).floor().max(bounds.x0 as f32);
    let min_y = a.y.min(b.y).min(c.y).floor().max(bounds.y0 as f32);
    let max_x = a.x.max(b.x).max(c.x).ceil().min(bounds.x1 as f32);
    let max_y = a.y.max(b.y).max(c.y).ceil().min(bounds.y1 as f32);
    if min_x >= max_x || min_y >= max_y {
        return;
    }

    for py in min_y as u32..max_y as u32 {
        for px in min_x as u32..max_x as u32 {
            let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
            let w0 = edge(b, c, p) * sign;
            let w1 = edge(c, a, p) * sign;
            let w2 = edge(a, b, p) * sign;
            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                let dst = target.get(px, py);
                target.set(px, py, blend_pixel(dst, src, blend));
            }
        }
    }
}

/// Blends straight-alpha `src` over `dst`.
pub(crate) fn blend_pixel(dst: [f32; 4], src: Color, blend: BlendMode) -> [f32; 4] {
    let a = src.a.clamp(0.0, 1.0);
    let s = [src.r, src.g, src.b].map(|c| c.clamp(0.0, 1.0));
    match blend {
        BlendMode::Alpha => [
            s[0] * a + dst[0] * (1.0 - a),
            s[1] * a + dst[1] * (1.0 - a),
            s[2] * a + dst[2] * (1.0 - a),
            a + dst[3] * (1.0 - a),
        ],
        BlendMode::Additive => [
            (dst[0] + s[0] * a).min(1.0),
            (dst[1] + s[1] * a).min(1.0),
            (dst[2] + s[2] * a).min(1.0),
            (dst[3] + a).min(1.0),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use crate::style::StrokeStyle;

    fn square_geometry(style: &StrokeStyle, clip: Option<Rect>) -> FrameGeometry {
        let mut g = FrameGeometry::new();
        let pts = [Vec2::new(2.0, 4.0), Vec2::new(6.0, 4.0)];
        g.push_stroke(&[(&pts, false)], style, clip).unwrap();
        g
    }

    // ── target validation ─────────────────────────────────────────────────

    #[test]
    fn stride_smaller_than_row_is_rejected() {
        let mut buf = vec![0u8; 64];
        assert!(PixelTarget::new(&mut buf, 4, 4, 12).is_err());
        assert!(PixelTarget::new(&mut buf, 4, 4, 16).is_ok());
    }

    #[test]
    fn short_buffer_is_rejected() {
        let mut buf = vec![0u8; 63];
        assert!(PixelTarget::new(&mut buf, 4, 4, 16).is_err());
    }

    #[test]
    fn overflowing_stride_is_rejected() {
        let mut buf = vec![0u8; 16];
        let err = PixelTarget::new(&mut buf, 1, 2, usize::MAX).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidArgument);
        assert!(PixelTarget::new(&mut buf, 1, 3, usize::MAX / 2 + 1).is_err());
    }

    #[test]
    fn strided_rows_leave_padding_untouched() {
        let mut buf = vec![7u8; 8 * 24];
        {
            let mut t = PixelTarget::new(&mut buf, 4, 8, 24).unwrap();
            t.clear(Color::white());
        }
        for row in buf.chunks(24) {
            assert!(row[..16].iter().all(|&b| b == 255));
            assert!(row[16..].iter().all(|&b| b == 7));
        }
    }

    // ── blending ──────────────────────────────────────────────────────────

    #[test]
    fn alpha_over_formula() {
        let out = blend_pixel([0.2, 0.2, 0.2, 0.5], Color::new(1.0, 0.0, 0.0, 0.5), BlendMode::Alpha);
        let expected = [0.6, 0.1, 0.1, 0.75];
        for (o, e) in out.iter().zip(expected) {
            assert!((o - e).abs() < 1e-6, "{out:?}");
        }
    }

    #[test]
    fn additive_saturates() {
        let out = blend_pixel([0.8, 0.0, 0.0, 1.0], Color::new(1.0, 0.5, 0.0, 1.0), BlendMode::Additive);
        assert_eq!(out, [1.0, 0.5, 0.0, 1.0]);
    }

    // ── scan conversion ───────────────────────────────────────────────────

    #[test]
    fn band_covers_pixel_centers_inside_stroke() {
        let style = StrokeStyle::new(2.0, Color::white());
        let g = square_geometry(&style, None);
        let mut buf = vec![0u8; 8 * 8 * 4];
        let mut t = PixelTarget::new(&mut buf, 8, 8, 32).unwrap();
        rasterize_frame(&g, &CrtProfile::clean(), 0, &mut t).unwrap();
        // Stroke spans y in [3, 5] and x in [2, 6]: rows 3 and 4, columns 2..6.
        for y in 0..8 {
            for x in 0..8 {
                let lit = t.get(x, y)[0] > 0.0;
                assert_eq!(lit, (2..6).contains(&x) && (3..5).contains(&y), "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn both_windings_rasterize() {
        let mut buf = vec![0u8; 4 * 4 * 4];
        let mut t = PixelTarget::new(&mut buf, 4, 4, 16).unwrap();
        let bounds = PixelBounds { x0: 0, y0: 0, x1: 4, y1: 4 };
        let (a, b, c) = (Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(0.0, 4.0));
        fill_triangle(&mut t, bounds, a, b, c, Color::white(), BlendMode::Alpha);
        let cw = t.get(0, 0);
        t.clear(Color::transparent());
        fill_triangle(&mut t, bounds, a, c, b, Color::white(), BlendMode::Alpha);
        assert_eq!(cw, t.get(0, 0));
        assert_eq!(cw, [1.0; 4]);
    }

    #[test]
    fn clip_limits_coverage() {
        let style = StrokeStyle::new(2.0, Color::white());
        let g = square_geometry(&style, Some(Rect::new(4.0, 0.0, 8.0, 8.0)));
        let mut buf = vec![0u8; 8 * 8 * 4];
        let mut t = PixelTarget::new(&mut buf, 8, 8, 32).unwrap();
        rasterize_frame(&g, &CrtProfile::clean(), 0, &mut t).unwrap();
        assert_eq!(t.get(3, 3)[0], 0.0);
        assert_eq!(t.get(4, 3)[0], 1.0);
    }

    #[test]
    fn same_frame_index_reproduces_jittered_output() {
        let style = StrokeStyle::new(2.0, Color::white()).with_intensity(0.8);
        let g = square_geometry(&style, None);
        let profile = CrtProfile { jitter_amount: 1.5, flicker_amount: 0.5, ..CrtProfile::clean() };

        let render = |frame| {
            let mut buf = vec![0u8; 8 * 8 * 4];
            let mut t = PixelTarget::new(&mut buf, 8, 8, 32).unwrap();
            rasterize_frame(&g, &profile, frame, &mut t).unwrap();
            buf
        };
        assert_eq!(render(11), render(11));
    }

    #[test]
    fn additive_runs_composite_after_alpha_runs() {
        use crate::style::FillStyle;
        let quad = [Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(4.0, 4.0), Vec2::new(0.0, 4.0)];
        let mut g = FrameGeometry::new();
        let glow = FillStyle::new(Color::rgb(0.0, 0.5, 0.0)).with_blend(BlendMode::Additive);
        g.push_fill(&quad, &glow, None).unwrap();
        g.push_fill(&quad, &FillStyle::new(Color::rgb(0.5, 0.0, 0.0)), None).unwrap();

        let mut buf = vec![0u8; 4 * 4 * 4];
        let mut t = PixelTarget::new(&mut buf, 4, 4, 16).unwrap();
        rasterize_frame(&g, &CrtProfile::clean(), 0, &mut t).unwrap();
        let [r, g, _, _] = t.get(1, 1);
        assert!(r > 0.45 && g > 0.45, "{r} {g}");
    }

    #[test]
    fn flicker_never_goes_negative() {
        let m = (0..256u64)
            .map(|f| modulation(&CrtProfile { flicker_amount: 5.0, ..CrtProfile::clean() }, f, 0, 1.0))
            .fold(f32::INFINITY, |acc, m| acc.min(m.intensity));
        assert!(m >= 0.0);
    }
}
