use std::f32::consts::FRAC_PI_4;

use tracing::debug;

use crate::effects::stamp::{STAMP_MARGIN, STAMP_MIN_TEXT_HEIGHT};
use crate::effects::Stage;
use crate::error::{FilterError, Result};
use crate::filtergraph::graph::{FilterGraph, FilterStage};
use crate::settings::mapping::SCANLINE_SPACING;
use crate::settings::{EffectParams, VhsSettings};

/// ffmpeg's `noise` filter tops out at strength 100
const MAX_NOISE_STRENGTH: f32 = 100.0;

/// Translate settings into an ffmpeg filter chain.
///
/// Stage order is blur, noise, color grade, color shift, chromatic split,
/// scan lines, vignette, text. Ghosting and tracking error have no
/// stateless equivalent and are left out.
pub fn compile(settings: &VhsSettings) -> Result<FilterGraph> {
    let params = EffectParams::from_settings(settings);
    let mut graph = FilterGraph::new();

    if params.blur_sigma > 0.0 {
        let sigma = finite("blur", params.blur_sigma)?;
        graph.push(FilterStage::new(Stage::Blur, "gblur").param("sigma", fmt_num(sigma)));
    }

    if params.noise_amplitude > 0.0 {
        let amplitude = finite("noise", params.noise_amplitude)?;
        let strength = amplitude.round().clamp(1.0, MAX_NOISE_STRENGTH);
        graph.push(
            FilterStage::new(Stage::Noise, "noise")
                .param("alls", fmt_num(strength))
                .param("allf", "t+u"),
        );
    }

    let color = &params.color;
    if color.contrast != 1.0 || color.saturation != 1.0 {
        graph.push(
            FilterStage::new(Stage::ColorGrade, "eq")
                .param("contrast", fmt_num(finite("contrast", color.contrast)?))
                .param("saturation", fmt_num(finite("saturation", color.saturation)?)),
        );
    }

    if color.brightness != 1.0 {
        // eq brightness is additive; the pixel path scales
        let gain = fmt_num(finite("brightness", color.brightness)?);
        graph.push(
            FilterStage::new(Stage::ColorGrade, "colorchannelmixer")
                .param("rr", gain.clone())
                .param("gg", gain.clone())
                .param("bb", gain),
        );
    }

    if color.bias != [0.0; 3] {
        let [r, g, b] = color.bias;
        graph.push(
            FilterStage::new(Stage::ColorGrade, "colorbalance")
                .param("rm", fmt_num(finite("colorShift", r / 255.0)?))
                .param("gm", fmt_num(finite("colorShift", g / 255.0)?))
                .param("bm", fmt_num(finite("colorShift", b / 255.0)?)),
        );
    }

    if params.chroma_offset > 0 {
        let offset = params.chroma_offset;
        graph.push(
            FilterStage::new(Stage::ChromaticAberration, "rgbashift")
                .param("rh", offset.to_string())
                .param("bh", format!("-{}", offset))
                .param("edge", "smear"),
        );
    }

    if params.scanline_alpha > 0.0 {
        let keep = fmt_num(1.0 - finite("scanLines", params.scanline_alpha)?);
        graph.push(
            FilterStage::new(Stage::ScanLines, "geq")
                .param(
                    "lum",
                    format!(
                        "'if(mod(Y,{}),lum(X,Y),lum(X,Y)*{})'",
                        SCANLINE_SPACING, keep
                    ),
                )
                .param("cb", "'cb(X,Y)'")
                .param("cr", "'cr(X,Y)'"),
        );
    }

    if params.vignette_strength > 0.0 {
        let angle = finite("vignette", params.vignette_strength * FRAC_PI_4)?;
        graph.push(FilterStage::new(Stage::Vignette, "vignette").param("angle", fmt_num(angle)));
    }

    if let Some(text) = &params.stamp_text {
        graph.push(
            FilterStage::new(Stage::DateStamp, "drawtext")
                .param("text", escape_text(text)?)
                .param("expansion", "none")
                .param("fontcolor", "white@0.9")
                .param("fontsize", format!("'max({},h/30)'", STAMP_MIN_TEXT_HEIGHT))
                .param("borderw", "2")
                .param("bordercolor", "black@0.8")
                .param("x", STAMP_MARGIN.to_string())
                .param("y", format!("h-th-{}", STAMP_MARGIN)),
        );
    }

    if params.ghost_weight > 0.0 || params.tracking.glitches > 0 {
        debug!(
            "Ghosting ({:.2}) and tracking error ({} bands) are frame-loop only; skipped in filter graph",
            params.ghost_weight, params.tracking.glitches
        );
    }

    debug!("Compiled filter graph with {} stages: {}", graph.len(), graph);
    Ok(graph)
}

/// Quote overlay text as a drawtext `text` value inside a filter graph.
///
/// ffmpeg unescapes the value twice: the graph parser treats `\ ' [ ] , ;`
/// as special, then the option parser treats `\ ' :` as special. The text is
/// single-quoted for the option parser, with `'` written as `'\''` since
/// quotes cannot be escaped inside quotes, and the result is
/// backslash-escaped for the graph parser.
pub fn escape_text(text: &str) -> Result<String> {
    if let Some(c) = text.chars().find(|c| c.is_control()) {
        return Err(FilterError::UnsupportedSetting {
            setting: "dateStampText",
            value: format!("contains control character {:?}", c),
        }
        .into());
    }

    let quoted = format!("'{}'", text.replace('\'', r"'\''"));

    let mut escaped = String::with_capacity(quoted.len() * 2);
    for c in quoted.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Ok(escaped)
}

fn finite(setting: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FilterError::UnsupportedSetting {
            setting,
            value: value.to_string(),
        }
        .into())
    }
}

/// Up to four decimals, trailing zeros trimmed
fn fmt_num(value: f32) -> String {
    let formatted = format!("{:.4}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}
