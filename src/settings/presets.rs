use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SettingsError, VhsError};
use crate::settings::model::{VhsSettings, DEFAULT_TARGET_FPS};

/// Built-in degradation tiers, ordered from cleanest to most degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Clean,
    Authentic,
    Worn,
    Degraded,
}

impl Preset {
    /// All presets in degradation order
    pub const ALL: [Preset; 4] = [Preset::Clean, Preset::Authentic, Preset::Worn, Preset::Degraded];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Clean => "clean",
            Preset::Authentic => "authentic",
            Preset::Worn => "worn",
            Preset::Degraded => "degraded",
        }
    }

    /// A fresh copy of this preset's settings
    pub fn settings(self) -> VhsSettings {
        match self {
            Preset::Clean => VhsSettings {
                chromatic_aberration: 1.0,
                color_shift: 2.0,
                saturation: 95.0,
                brightness: 100.0,
                contrast: 105.0,
                noise: 5.0,
                scan_lines: 10.0,
                tracking_error: 0.0,
                ghosting: 1.0,
                sharpen: 0.0,
                blur: 0.5,
                vignette: 15.0,
                date_stamp: false,
                date_stamp_text: String::new(),
                target_fps: DEFAULT_TARGET_FPS,
            },
            Preset::Authentic => VhsSettings {
                chromatic_aberration: 3.0,
                color_shift: 5.0,
                saturation: 85.0,
                brightness: 95.0,
                contrast: 110.0,
                noise: 15.0,
                scan_lines: 30.0,
                tracking_error: 2.0,
                ghosting: 3.0,
                sharpen: 2.0,
                blur: 1.0,
                vignette: 30.0,
                date_stamp: true,
                date_stamp_text: "JAN 15 1997".to_string(),
                target_fps: DEFAULT_TARGET_FPS,
            },
            Preset::Worn => VhsSettings {
                chromatic_aberration: 6.0,
                color_shift: 8.0,
                saturation: 75.0,
                brightness: 90.0,
                contrast: 115.0,
                noise: 35.0,
                scan_lines: 50.0,
                tracking_error: 5.0,
                ghosting: 6.0,
                sharpen: 3.0,
                blur: 2.0,
                vignette: 45.0,
                date_stamp: true,
                date_stamp_text: "AUG 03 1988".to_string(),
                target_fps: DEFAULT_TARGET_FPS,
            },
            Preset::Degraded => VhsSettings {
                chromatic_aberration: 10.0,
                color_shift: 10.0,
                saturation: 65.0,
                brightness: 85.0,
                contrast: 125.0,
                noise: 60.0,
                scan_lines: 70.0,
                tracking_error: 8.0,
                ghosting: 9.0,
                sharpen: 5.0,
                blur: 3.0,
                vignette: 60.0,
                date_stamp: true,
                date_stamp_text: "DEC 24 1982".to_string(),
                target_fps: DEFAULT_TARGET_FPS,
            },
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Preset::Authentic
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = VhsError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SettingsError::UnknownPreset { name: s.to_string() }.into())
    }
}

/// Look up a preset by name and return a fresh copy of its settings
pub fn resolve_preset(name: &str) -> Result<VhsSettings> {
    name.parse::<Preset>().map(Preset::settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_non_decreasing(field: &str, values: impl Fn(&VhsSettings) -> f64) {
        let settings: Vec<VhsSettings> = Preset::ALL.iter().map(|p| p.settings()).collect();
        for pair in settings.windows(2) {
            assert!(
                values(&pair[0]) <= values(&pair[1]),
                "{} decreases between presets",
                field
            );
        }
    }

    #[test]
    fn test_resolve_known_presets() {
        for preset in Preset::ALL {
            let settings = resolve_preset(preset.name()).unwrap();
            assert_eq!(settings, preset.settings());
        }
        assert_eq!(resolve_preset("  Worn ").unwrap(), Preset::Worn.settings());
    }

    #[test]
    fn test_unknown_preset_fails() {
        let err = resolve_preset("betamax").unwrap_err();
        assert!(matches!(
            err,
            VhsError::Settings(SettingsError::UnknownPreset { ref name }) if name == "betamax"
        ));
    }

    #[test]
    fn test_resolve_returns_fresh_copy() {
        let mut first = resolve_preset("authentic").unwrap();
        first.noise = 99.0;
        let second = resolve_preset("authentic").unwrap();
        assert_eq!(second.noise, 15.0);
    }

    #[test]
    fn test_presets_degrade_monotonically() {
        assert_non_decreasing("noise", |s| s.noise);
        assert_non_decreasing("scanLines", |s| s.scan_lines);
        assert_non_decreasing("trackingError", |s| s.tracking_error);
        assert_non_decreasing("ghosting", |s| s.ghosting);
        assert_non_decreasing("chromaticAberration", |s| s.chromatic_aberration);
        assert_non_decreasing("colorShift", |s| s.color_shift);
        assert_non_decreasing("vignette", |s| s.vignette);
        assert_non_decreasing("blur", |s| s.blur);
        // saturation and brightness fall as tapes wear
        assert_non_decreasing("saturation", |s| -s.saturation);
        assert_non_decreasing("brightness", |s| -s.brightness);
    }

    #[test]
    fn test_presets_are_within_range() {
        for preset in Preset::ALL {
            let settings = preset.settings();
            assert_eq!(settings.clamped(), settings, "{} has out-of-range values", preset);
        }
    }
}
