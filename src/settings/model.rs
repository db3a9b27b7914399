use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SettingsError};

/// Degradation parameters for one processing run.
///
/// Values are accepted as-is; [`VhsSettings::clamped`] brings every numeric
/// field back into its documented range and is what the effect mapping
/// consumes. The JSON form uses the camelCase names of the web dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VhsSettings {
    /// Horizontal RGB channel split in pixels (0-10)
    pub chromatic_aberration: f64,
    /// Warmth bias, negative is cool and positive is warm (-10-10)
    pub color_shift: f64,
    /// Percent of original saturation (0-200)
    pub saturation: f64,
    /// Percent brightness (0-200)
    pub brightness: f64,
    /// Percent contrast (0-200)
    pub contrast: f64,
    /// Noise intensity (0-100)
    pub noise: f64,
    /// Darkness of the horizontal scan lines (0-100)
    pub scan_lines: f64,
    /// Number and magnitude of tracking glitch bands (0-10)
    pub tracking_error: f64,
    /// Blend weight with the previous frame (0-10)
    pub ghosting: f64,
    /// Reserved. Carried through presets and JSON but never applied.
    pub sharpen: f64,
    /// Blur radius in pixels (0-5)
    pub blur: f64,
    /// Corner darkening strength (0-100)
    pub vignette: f64,
    pub date_stamp: bool,
    pub date_stamp_text: String,
    /// Frame extraction and encode rate for the frame loop (15-60)
    #[serde(rename = "targetFPS", alias = "targetFps")]
    pub target_fps: f64,
}

/// Inclusive bounds of every numeric field
pub mod ranges {
    pub const CHROMATIC_ABERRATION: (f64, f64) = (0.0, 10.0);
    pub const COLOR_SHIFT: (f64, f64) = (-10.0, 10.0);
    pub const PERCENT: (f64, f64) = (0.0, 200.0);
    pub const NOISE: (f64, f64) = (0.0, 100.0);
    pub const SCAN_LINES: (f64, f64) = (0.0, 100.0);
    pub const TRACKING_ERROR: (f64, f64) = (0.0, 10.0);
    pub const GHOSTING: (f64, f64) = (0.0, 10.0);
    pub const SHARPEN: (f64, f64) = (0.0, 10.0);
    pub const BLUR: (f64, f64) = (0.0, 5.0);
    pub const VIGNETTE: (f64, f64) = (0.0, 100.0);
    pub const TARGET_FPS: (f64, f64) = (15.0, 60.0);
}

pub const DEFAULT_TARGET_FPS: f64 = 30.0;

impl Default for VhsSettings {
    /// Neutral settings: every artifact off, color untouched
    fn default() -> Self {
        Self {
            chromatic_aberration: 0.0,
            color_shift: 0.0,
            saturation: 100.0,
            brightness: 100.0,
            contrast: 100.0,
            noise: 0.0,
            scan_lines: 0.0,
            tracking_error: 0.0,
            ghosting: 0.0,
            sharpen: 0.0,
            blur: 0.0,
            vignette: 0.0,
            date_stamp: false,
            date_stamp_text: String::new(),
            target_fps: DEFAULT_TARGET_FPS,
        }
    }
}

impl VhsSettings {
    /// Copy with every numeric field clamped to its range.
    ///
    /// NaN maps to the field's neutral value so nothing downstream ever sees
    /// a non-finite number.
    pub fn clamped(&self) -> Self {
        let neutral = Self::default();
        Self {
            chromatic_aberration: clamp_field(
                self.chromatic_aberration,
                ranges::CHROMATIC_ABERRATION,
                neutral.chromatic_aberration,
            ),
            color_shift: clamp_field(self.color_shift, ranges::COLOR_SHIFT, neutral.color_shift),
            saturation: clamp_field(self.saturation, ranges::PERCENT, neutral.saturation),
            brightness: clamp_field(self.brightness, ranges::PERCENT, neutral.brightness),
            contrast: clamp_field(self.contrast, ranges::PERCENT, neutral.contrast),
            noise: clamp_field(self.noise, ranges::NOISE, neutral.noise),
            scan_lines: clamp_field(self.scan_lines, ranges::SCAN_LINES, neutral.scan_lines),
            tracking_error: clamp_field(
                self.tracking_error,
                ranges::TRACKING_ERROR,
                neutral.tracking_error,
            ),
            ghosting: clamp_field(self.ghosting, ranges::GHOSTING, neutral.ghosting),
            sharpen: clamp_field(self.sharpen, ranges::SHARPEN, neutral.sharpen),
            blur: clamp_field(self.blur, ranges::BLUR, neutral.blur),
            vignette: clamp_field(self.vignette, ranges::VIGNETTE, neutral.vignette),
            date_stamp: self.date_stamp,
            date_stamp_text: self.date_stamp_text.clone(),
            target_fps: clamp_field(self.target_fps, ranges::TARGET_FPS, neutral.target_fps),
        }
    }

    /// Whether the date stamp will actually be drawn
    pub fn stamp_enabled(&self) -> bool {
        self.date_stamp && !self.date_stamp_text.trim().is_empty()
    }

    /// Parse settings from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            SettingsError::ParseFailed {
                source_name: "<inline>".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Load settings from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            SettingsError::ParseFailed {
                source_name: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

fn clamp_field(value: f64, (min, max): (f64, f64), neutral: f64) -> f64 {
    if value.is_nan() {
        neutral
    } else {
        value.clamp(min, max)
    }
}

/// Partial settings; every present field replaces the base value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chromatic_aberration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_shift: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_lines: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_error: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ghosting: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpen: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vignette: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_stamp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_stamp_text: Option<String>,
    #[serde(
        rename = "targetFPS",
        alias = "targetFps",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_fps: Option<f64>,
}

impl SettingsOverride {
    /// Load a (possibly partial) settings document from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            SettingsError::ParseFailed {
                source_name: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Overlay `partial` on `base`, leaving both inputs untouched
pub fn merge_overrides(base: &VhsSettings, partial: &SettingsOverride) -> VhsSettings {
    VhsSettings {
        chromatic_aberration: partial.chromatic_aberration.unwrap_or(base.chromatic_aberration),
        color_shift: partial.color_shift.unwrap_or(base.color_shift),
        saturation: partial.saturation.unwrap_or(base.saturation),
        brightness: partial.brightness.unwrap_or(base.brightness),
        contrast: partial.contrast.unwrap_or(base.contrast),
        noise: partial.noise.unwrap_or(base.noise),
        scan_lines: partial.scan_lines.unwrap_or(base.scan_lines),
        tracking_error: partial.tracking_error.unwrap_or(base.tracking_error),
        ghosting: partial.ghosting.unwrap_or(base.ghosting),
        sharpen: partial.sharpen.unwrap_or(base.sharpen),
        blur: partial.blur.unwrap_or(base.blur),
        vignette: partial.vignette.unwrap_or(base.vignette),
        date_stamp: partial.date_stamp.unwrap_or(base.date_stamp),
        date_stamp_text: partial
            .date_stamp_text
            .clone()
            .unwrap_or_else(|| base.date_stamp_text.clone()),
        target_fps: partial.target_fps.unwrap_or(base.target_fps),
    }
}
