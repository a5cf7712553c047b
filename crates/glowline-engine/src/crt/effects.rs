//! Display post effects for the CPU preview path.
//!
//! The per-pixel factors are pure functions so hosts with their own
//! accumulation buffers can reuse them; [`apply_display_effects`] runs the
//! whole chain on a [`PixelTarget`].

use crate::coords::Vec2;
use crate::error::{VgError, VgResult};

use super::noise::{hash32, signed_noise};
use super::raster::PixelTarget;
use super::CrtProfile;

/// Channel used to seed per-pixel grain, distinct from per-command channels.
const GRAIN_CHANNEL: u32 = 7;

/// Fraction of the previous frame kept after `dt_seconds`: `decay^(dt * 60)`.
#[inline]
pub fn persistence_factor(decay: f32, dt_seconds: f32) -> f32 {
    decay.clamp(0.0, 1.0).powf(dt_seconds.max(0.0) * 60.0)
}

/// Phosphor accumulation: each byte of `history` becomes
/// `max(current, history * persistence_factor(decay, dt))`.
pub fn apply_persistence(history: &mut [u8], current: &[u8], decay: f32, dt_seconds: f32) -> VgResult<()> {
    if history.len() != current.len() {
        return Err(VgError::invalid(format!(
            "persistence buffers differ in size: {} vs {}",
            history.len(),
            current.len()
        )));
    }
    let factor = persistence_factor(decay, dt_seconds);
    for (prev, &cur) in history.iter_mut().zip(current) {
        let faded = (*prev as f32 * factor).round() as u8;
        *prev = faded.max(cur);
    }
    Ok(())
}

/// Brightness multiplier for row `y`; odd rows are darkened by `strength`.
#[inline]
pub fn scanline_factor(y: u32, strength: f32) -> f32 {
    if y % 2 == 1 { 1.0 - strength.clamp(0.0, 1.0) } else { 1.0 }
}

/// Radial falloff for normalized coordinates `u, v` in `[0, 1]`.
#[inline]
pub fn vignette_factor(u: f32, v: f32, strength: f32) -> f32 {
    let d = Vec2::new(u - 0.5, v - 0.5).length() / std::f32::consts::FRAC_1_SQRT_2;
    (1.0 - strength.clamp(0.0, 1.0) * d * d).clamp(0.0, 1.0)
}

/// Maps an output coordinate to the source coordinate it samples under
/// barrel distortion `k`. Both are normalized to `[0, 1]`; the result may
/// fall outside that range.
#[inline]
pub fn barrel_map(u: f32, v: f32, k: f32) -> (f32, f32) {
    let c = Vec2::new(u * 2.0 - 1.0, v * 2.0 - 1.0);
    let r2 = c.dot(c);
    let d = c * (1.0 + k * r2);
    ((d.x + 1.0) * 0.5, (d.y + 1.0) * 0.5)
}

/// Barrel distortion, scanlines, vignette and grain, in that order.
pub fn apply_display_effects(target: &mut PixelTarget<'_>, profile: &CrtProfile, frame_index: u64) -> VgResult<()> {
    profile.validate()?;
    let (w, h) = (target.width(), target.height());

    if profile.barrel_distortion != 0.0 {
        let mut source = Vec::with_capacity(w as usize * h as usize);
        for y in 0..h {
            for x in 0..w {
                source.push(target.get(x, y));
            }
        }
        for y in 0..h {
            for x in 0..w {
                let (u, v) = pixel_uv(x, y, w, h);
                let (su, sv) = barrel_map(u, v, profile.barrel_distortion);
                let sample = if (0.0..1.0).contains(&su) && (0.0..1.0).contains(&sv) {
                    let sx = (su * w as f32) as usize;
                    let sy = (sv * h as f32) as usize;
                    source[sy * w as usize + sx]
                } else {
                    [0.0, 0.0, 0.0, 1.0]
                };
                target.set(x, y, sample);
            }
        }
    }

    let shade = profile.scanline_strength > 0.0 || profile.vignette_strength > 0.0;
    if !shade && profile.noise_strength <= 0.0 {
        return Ok(());
    }

    for y in 0..h {
        let scan = scanline_factor(y, profile.scanline_strength);
        for x in 0..w {
            let (u, v) = pixel_uv(x, y, w, h);
            let k = scan * vignette_factor(u, v, profile.vignette_strength);
            let grain = profile.noise_strength * signed_noise(hash32(frame_index, y.wrapping_mul(w).wrapping_add(x), GRAIN_CHANNEL));
            let [r, g, b, a] = target.get(x, y);
            target.set(x, y, [r * k + grain, g * k + grain, b * k + grain, a]);
        }
    }
    Ok(())
}

#[inline]
fn pixel_uv(x: u32, y: u32, w: u32, h: u32) -> (f32, f32) {
    ((x as f32 + 0.5) / w as f32, (y as f32 + 0.5) / h as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── persistence ───────────────────────────────────────────────────────

    #[test]
    fn persistence_at_half_tick_rate() {
        let f = persistence_factor(0.9, 1.0 / 30.0);
        assert!((f - 0.81).abs() < 1e-4, "{f}");
    }

    #[test]
    fn persistence_limits() {
        assert_eq!(persistence_factor(0.5, 0.0), 1.0);
        assert_eq!(persistence_factor(0.0, 1.0 / 60.0), 0.0);
        assert_eq!(persistence_factor(1.0, 10.0), 1.0);
    }

    #[test]
    fn accumulation_keeps_brighter_of_faded_and_current() {
        let mut history = vec![200u8, 10, 0, 255];
        let current = [0u8, 50, 0, 255];
        apply_persistence(&mut history, &current, 0.5, 1.0 / 60.0).unwrap();
        assert_eq!(history, vec![100, 50, 0, 255]);
    }

    #[test]
    fn accumulation_rejects_mismatched_buffers() {
        let mut history = vec![0u8; 8];
        let err = apply_persistence(&mut history, &[0u8; 4], 0.5, 0.1).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidArgument);
    }

    // ── shading ───────────────────────────────────────────────────────────

    #[test]
    fn scanlines_darken_odd_rows_only() {
        assert_eq!(scanline_factor(0, 0.3), 1.0);
        assert!((scanline_factor(1, 0.3) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn vignette_is_one_at_centre_and_dims_corners() {
        assert_eq!(vignette_factor(0.5, 0.5, 0.8), 1.0);
        assert!((vignette_factor(0.0, 0.0, 0.8) - 0.2).abs() < 1e-5);
        assert_eq!(vignette_factor(0.0, 0.0, 0.0), 1.0);
    }

    #[test]
    fn barrel_keeps_centre_and_pushes_edges_out() {
        assert_eq!(barrel_map(0.5, 0.5, 0.3), (0.5, 0.5));
        let (u, _) = barrel_map(1.0, 0.5, 0.2);
        assert!(u > 1.0);
        assert_eq!(barrel_map(0.25, 0.75, 0.0), (0.25, 0.75));
    }

    // ── full chain ────────────────────────────────────────────────────────

    #[test]
    fn clean_profile_leaves_pixels_alone() {
        let mut buf: Vec<u8> = (0..64).map(|i| (i * 3) as u8).collect();
        let before = buf.clone();
        let mut t = PixelTarget::new(&mut buf, 4, 4, 16).unwrap();
        apply_display_effects(&mut t, &CrtProfile::clean(), 3).unwrap();
        assert_eq!(buf, before);
    }

    #[test]
    fn scanline_chain_darkens_odd_rows() {
        let mut buf = vec![255u8; 2 * 2 * 4];
        let profile = CrtProfile { scanline_strength: 0.5, ..CrtProfile::clean() };
        let mut t = PixelTarget::new(&mut buf, 2, 2, 8).unwrap();
        apply_display_effects(&mut t, &profile, 0).unwrap();
        assert_eq!(t.get(0, 0)[0], 1.0);
        assert_eq!(&buf[8..11], &[128, 128, 128]);
        assert_eq!(buf[11], 255);
    }
}
