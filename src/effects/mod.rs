//! # Pixel Effect Library
//!
//! Each effect transforms a [`Frame`](crate::video::Frame) in place from
//! already-mapped [`EffectParams`](crate::settings::EffectParams) values.
//! Effects are independent of each other; ordering is the pipeline's job.
//!
//! ## Effects
//!
//! - **Color grade**: contrast, brightness, saturation and warm/cool cast
//! - **Chromatic aberration**: horizontal red/blue channel split
//! - **Noise**: per-channel uniform grain
//! - **Ghosting**: blend with the previous frame
//! - **Blur**: Gaussian softening
//! - **Scan lines**: darkened alternate rows
//! - **Tracking error**: displaced horizontal bands
//! - **Vignette**: radial corner darkening
//! - **Date stamp**: camcorder-style text overlay

pub mod blur;
pub mod chroma;
pub mod color;
pub mod font;
pub mod ghosting;
pub mod noise;
pub mod scanlines;
pub mod stamp;
pub mod tracking;
pub mod vignette;

use std::fmt;

pub use blur::blur;
pub use chroma::chromatic_aberration;
pub use color::color_grade;
pub use ghosting::ghost_blend;
pub use noise::add_noise;
pub use scanlines::scan_lines;
pub use stamp::date_stamp;
pub use tracking::tracking_error;
pub use vignette::vignette;

/// A named step of the degradation chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ColorGrade,
    ChromaticAberration,
    Noise,
    Ghosting,
    Blur,
    ScanLines,
    TrackingError,
    Vignette,
    DateStamp,
}

impl Stage {
    /// Order in which the frame pipeline applies the effects
    pub const PIPELINE_ORDER: [Stage; 9] = [
        Stage::ColorGrade,
        Stage::ChromaticAberration,
        Stage::Noise,
        Stage::Ghosting,
        Stage::Blur,
        Stage::ScanLines,
        Stage::TrackingError,
        Stage::Vignette,
        Stage::DateStamp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::ColorGrade => "color-grade",
            Stage::ChromaticAberration => "chromatic-aberration",
            Stage::Noise => "noise",
            Stage::Ghosting => "ghosting",
            Stage::Blur => "blur",
            Stage::ScanLines => "scan-lines",
            Stage::TrackingError => "tracking-error",
            Stage::Vignette => "vignette",
            Stage::DateStamp => "date-stamp",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Round and clamp a float channel value back into a byte
#[inline]
pub(crate) fn to_channel(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order_is_fixed() {
        let names: Vec<&str> = Stage::PIPELINE_ORDER.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "color-grade",
                "chromatic-aberration",
                "noise",
                "ghosting",
                "blur",
                "scan-lines",
                "tracking-error",
                "vignette",
                "date-stamp",
            ]
        );
    }

    #[test]
    fn test_to_channel_clamps() {
        assert_eq!(to_channel(-12.0), 0);
        assert_eq!(to_channel(300.0), 255);
        assert_eq!(to_channel(127.5), 128);
        assert_eq!(to_channel(f32::NAN), 0);
    }
}
