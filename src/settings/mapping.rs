//! Shared settings-to-effect parameter mapping.
//!
//! Both the pixel pipeline and the filter-graph compiler read their numbers
//! from [`EffectParams`], so the two strategies cannot drift apart.

use crate::settings::model::VhsSettings;

/// Noise amplitude at `noise = 100`, in 8-bit channel units
pub const NOISE_FULL_SCALE: f32 = 127.5;
/// `ghosting / GHOST_DIVISOR` is the previous-frame blend weight
pub const GHOST_DIVISOR: f32 = 20.0;
/// `scanLines / SCANLINE_DIVISOR` is the darkening alpha of each line
pub const SCANLINE_DIVISOR: f32 = 200.0;
/// Every `SCANLINE_SPACING`th row is darkened, starting at row 0
pub const SCANLINE_SPACING: u32 = 2;
/// Maximum horizontal glitch displacement per unit of tracking error
pub const TRACKING_OFFSET_PER_UNIT: f32 = 5.0;
pub const GLITCH_MIN_HEIGHT: u32 = 5;
pub const GLITCH_MAX_HEIGHT: u32 = 25;
/// Fraction of the center-to-corner radius left untouched by the vignette
pub const VIGNETTE_INNER_RADIUS: f32 = 0.3;
/// Color bias per unit of `colorShift / 10`, in 8-bit channel units.
/// Red and blue move in opposite directions, green always drops.
pub const COLOR_BIAS_RED: f32 = 8.0;
pub const COLOR_BIAS_GREEN: f32 = -2.0;
pub const COLOR_BIAS_BLUE: f32 = -6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorParams {
    pub contrast: f32,
    pub brightness: f32,
    pub saturation: f32,
    /// Additive RGB bias in 8-bit channel units
    pub bias: [f32; 3],
}

impl ColorParams {
    pub fn is_neutral(&self) -> bool {
        self.contrast == 1.0
            && self.brightness == 1.0
            && self.saturation == 1.0
            && self.bias == [0.0; 3]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingParams {
    pub glitches: u32,
    /// Displacements are drawn uniformly from `-max_offset..=max_offset`
    pub max_offset: f32,
}

/// Effect-level parameters derived from clamped settings
#[derive(Debug, Clone, PartialEq)]
pub struct EffectParams {
    pub color: ColorParams,
    pub chroma_offset: u32,
    pub noise_amplitude: f32,
    pub ghost_weight: f32,
    pub blur_sigma: f32,
    pub scanline_alpha: f32,
    pub tracking: TrackingParams,
    pub vignette_strength: f32,
    pub stamp_text: Option<String>,
    pub target_fps: f64,
}

impl EffectParams {
    pub fn from_settings(settings: &VhsSettings) -> Self {
        let s = settings.clamped();
        let shift = (s.color_shift / 10.0) as f32;

        Self {
            color: ColorParams {
                contrast: (s.contrast / 100.0) as f32,
                brightness: (s.brightness / 100.0) as f32,
                saturation: (s.saturation / 100.0) as f32,
                bias: color_bias(shift),
            },
            chroma_offset: s.chromatic_aberration.floor() as u32,
            noise_amplitude: (s.noise as f32 / 100.0) * NOISE_FULL_SCALE,
            ghost_weight: s.ghosting as f32 / GHOST_DIVISOR,
            blur_sigma: s.blur as f32,
            scanline_alpha: s.scan_lines as f32 / SCANLINE_DIVISOR,
            tracking: TrackingParams {
                glitches: s.tracking_error.floor() as u32,
                max_offset: s.tracking_error as f32 * TRACKING_OFFSET_PER_UNIT,
            },
            vignette_strength: s.vignette as f32 / 100.0,
            stamp_text: s
                .stamp_enabled()
                .then(|| s.date_stamp_text.trim().to_string()),
            target_fps: s.target_fps,
        }
    }
}

fn color_bias(shift: f32) -> [f32; 3] {
    if shift == 0.0 {
        return [0.0; 3];
    }
    [
        COLOR_BIAS_RED * shift,
        COLOR_BIAS_GREEN * shift.abs(),
        COLOR_BIAS_BLUE * shift,
    ]
}
