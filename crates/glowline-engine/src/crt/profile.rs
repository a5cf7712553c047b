use crate::error::{VgError, VgResult};

/// Simulated phosphor display tunables.
///
/// Lives on the context and is read by the preview rasterizer and the
/// display-effect helpers. There is a single canonical copy; the legacy
/// five-field [`RetroParams`] is a view derived from it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CrtProfile {
    /// Width of the bright beam core, in pixels.
    pub beam_core_width_px: f32,
    /// Width of the soft halo around the core, in pixels.
    pub beam_halo_width_px: f32,
    /// Global brightness multiplier applied to every command.
    pub beam_intensity: f32,
    pub bloom_strength: f32,
    pub bloom_radius_px: f32,
    /// Fraction of the previous frame retained per 1/60 s tick, in `[0, 1]`.
    pub persistence_decay: f32,
    /// Per-command positional jitter in pixels; also perturbs brightness.
    pub jitter_amount: f32,
    pub flicker_amount: f32,
    pub vignette_strength: f32,
    /// Barrel distortion coefficient; negative values give pincushion.
    pub barrel_distortion: f32,
    pub scanline_strength: f32,
    pub noise_strength: f32,
}

impl Default for CrtProfile {
    fn default() -> Self {
        Self::vector_monitor()
    }
}

/// Legacy five-field view over [`CrtProfile`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RetroParams {
    pub bloom_strength: f32,
    pub bloom_radius_px: f32,
    pub persistence_decay: f32,
    pub jitter_amount: f32,
    pub flicker_amount: f32,
}

impl CrtProfile {
    /// Green-phosphor vector monitor look.
    pub const fn vector_monitor() -> Self {
        Self {
            beam_core_width_px: 1.0,
            beam_halo_width_px: 4.0,
            beam_intensity: 1.0,
            bloom_strength: 0.6,
            bloom_radius_px: 4.0,
            persistence_decay: 0.85,
            jitter_amount: 0.15,
            flicker_amount: 0.05,
            vignette_strength: 0.25,
            barrel_distortion: 0.08,
            scanline_strength: 0.2,
            noise_strength: 0.03,
        }
    }

    /// Every effect disabled; the preview shows geometry as submitted.
    pub const fn clean() -> Self {
        Self {
            beam_core_width_px: 1.0,
            beam_halo_width_px: 0.0,
            beam_intensity: 1.0,
            bloom_strength: 0.0,
            bloom_radius_px: 1.0,
            persistence_decay: 0.0,
            jitter_amount: 0.0,
            flicker_amount: 0.0,
            vignette_strength: 0.0,
            barrel_distortion: 0.0,
            scanline_strength: 0.0,
            noise_strength: 0.0,
        }
    }

    pub fn retro_params(&self) -> RetroParams {
        RetroParams {
            bloom_strength: self.bloom_strength,
            bloom_radius_px: self.bloom_radius_px,
            persistence_decay: self.persistence_decay,
            jitter_amount: self.jitter_amount,
            flicker_amount: self.flicker_amount,
        }
    }

    /// Overwrites the five overlapping fields; the other seven are untouched.
    pub fn apply_retro_params(&mut self, params: &RetroParams) {
        self.bloom_strength = params.bloom_strength;
        self.bloom_radius_px = params.bloom_radius_px;
        self.persistence_decay = params.persistence_decay;
        self.jitter_amount = params.jitter_amount;
        self.flicker_amount = params.flicker_amount;
    }

    pub fn validate(&self) -> VgResult<()> {
        let non_negative = [
            ("beam_core_width_px", self.beam_core_width_px),
            ("beam_halo_width_px", self.beam_halo_width_px),
            ("beam_intensity", self.beam_intensity),
            ("bloom_strength", self.bloom_strength),
            ("bloom_radius_px", self.bloom_radius_px),
            ("jitter_amount", self.jitter_amount),
            ("flicker_amount", self.flicker_amount),
        ];
        for (name, v) in non_negative {
            if !(v.is_finite() && v >= 0.0) {
                return Err(VgError::invalid(format!("{name} must be finite and >= 0, got {v}")));
            }
        }

        let unit = [
            ("persistence_decay", self.persistence_decay),
            ("vignette_strength", self.vignette_strength),
            ("scanline_strength", self.scanline_strength),
            ("noise_strength", self.noise_strength),
        ];
        for (name, v) in unit {
            if !(v.is_finite() && (0.0..=1.0).contains(&v)) {
                return Err(VgError::invalid(format!("{name} must be in [0, 1], got {v}")));
            }
        }

        if !(self.barrel_distortion.is_finite() && (-1.0..=1.0).contains(&self.barrel_distortion)) {
            return Err(VgError::invalid(format!(
                "barrel_distortion must be in [-1, 1], got {}",
                self.barrel_distortion
            )));
        }
        Ok(())
    }
}
