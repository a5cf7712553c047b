use super::raster::PixelTarget;

/// Upper bound on the blur radius in pixels.
pub const MAX_BLOOM_RADIUS: usize = 12;

/// Share of the blurred image added back on top of the source.
const BLOOM_MIX: f32 = 0.6;

/// Blur radius actually used for a requested `radius_px`: rounded and
/// clamped to `1..=12`.
pub fn bloom_radius(radius_px: f32) -> usize {
    if !radius_px.is_finite() {
        return 1;
    }
    (radius_px.round().max(1.0) as usize).min(MAX_BLOOM_RADIUS)
}

/// Separable box-blur bloom over an RGBA8 target.
///
/// The blurred copy is scaled by `strength * 0.6` and added to the source;
/// channels saturate at 255.
pub fn apply_bloom(target: &mut PixelTarget<'_>, strength: f32, radius_px: f32) {
    if !(strength > 0.0) {
        return;
    }
    let (w, h) = (target.width(), target.height());
    let mut linear = Vec::with_capacity(w as usize * h as usize * 4);
    for y in 0..h {
        for x in 0..w {
            linear.extend_from_slice(&target.get(x, y));
        }
    }
    apply_bloom_linear(&mut linear, w as usize, h as usize, strength, radius_px);
    for y in 0..h {
        for x in 0..w {
            let i = (y as usize * w as usize + x as usize) * 4;
            target.set(x, y, [linear[i], linear[i + 1], linear[i + 2], linear[i + 3]]);
        }
    }
}

/// Bloom over a tightly packed float RGBA buffer (values in `[0, 1]`).
///
/// Does nothing when the buffer does not match `width * height * 4`.
pub fn apply_bloom_linear(pixels: &mut [f32], width: usize, height: usize, strength: f32, radius_px: f32) {
    if !(strength > 0.0) || width == 0 || height == 0 || pixels.len() != width * height * 4 {
        return;
    }
    let r = bloom_radius(radius_px);

    let mut horizontal = vec![0.0f32; pixels.len()];
    box_blur(pixels, &mut horizontal, width, height, r, Axis::Horizontal);
    let mut blurred = vec![0.0f32; pixels.len()];
    box_blur(&horizontal, &mut blurred, width, height, r, Axis::Vertical);

    let k = strength * BLOOM_MIX;
    for (px, glow) in pixels.chunks_exact_mut(4).zip(blurred.chunks_exact(4)) {
        for c in 0..3 {
            px[c] = (px[c] + glow[c] * k).min(1.0);
        }
    }
}

#[derive(Copy, Clone)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Box blur along one axis; samples beyond the edge clamp to the border.
fn box_blur(src: &[f32], dst: &mut [f32], width: usize, height: usize, r: usize, axis: Axis) {
    let (len, lines) = match axis {
        Axis::Horizontal => (width, height),
        Axis::Vertical => (height, width),
    };
    let index = |line: usize, i: usize| match axis {
        Axis::Horizontal => (line * width + i) * 4,
        Axis::Vertical => (i * width + line) * 4,
    };
    let taps = (2 * r + 1) as f32;
    let r = r as isize;
    let last = len as isize - 1;

    for line in 0..lines {
        // Running sum over the window centred on `i`.
        let mut sum = [0.0f32; 4];
        for k in -r..=r {
            let o = index(line, k.clamp(0, last) as usize);
            for c in 0..4 {
                sum[c] += src[o + c];
            }
        }
        for i in 0..len {
            let o = index(line, i);
            for c in 0..4 {
                dst[o + c] = sum[c] / taps;
            }
            let leaving = index(line, (i as isize - r).clamp(0, last) as usize);
            let entering = index(line, (i as isize + r + 1).clamp(0, last) as usize);
            for c in 0..4 {
                sum[c] += src[entering + c] - src[leaving + c];
            }
        }
    }
}
