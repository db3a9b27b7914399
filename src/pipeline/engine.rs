use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::effects::{self, Stage};
use crate::error::{Result, VideoError};
use crate::settings::{EffectParams, VhsSettings};
use crate::video::Frame;

/// Per-clip frame processor
///
/// Owns the only temporal state of the chain: the previous frame used for
/// ghosting. One instance belongs to exactly one job; call [`reset`] before
/// reusing it on another clip.
///
/// [`reset`]: FramePipeline::reset
pub struct FramePipeline<R: Rng = SmallRng> {
    settings: VhsSettings,
    params: EffectParams,
    rng: R,
    previous: Option<Frame>,
    frames_processed: u64,
}

impl FramePipeline<SmallRng> {
    /// Pipeline with an entropy-seeded generator
    pub fn new(settings: &VhsSettings) -> Self {
        Self::with_rng(settings, SmallRng::from_entropy())
    }

    /// Pipeline whose noise and glitches are reproducible for a given seed
    pub fn seeded(settings: &VhsSettings, seed: u64) -> Self {
        Self::with_rng(settings, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> FramePipeline<R> {
    pub fn with_rng(settings: &VhsSettings, rng: R) -> Self {
        let settings = settings.clamped();
        let params = EffectParams::from_settings(&settings);
        debug!(
            "Frame pipeline ready: chroma={}px noise=±{:.1} ghost={:.2} blur={:.1} glitches={}",
            params.chroma_offset,
            params.noise_amplitude,
            params.ghost_weight,
            params.blur_sigma,
            params.tracking.glitches
        );

        Self {
            settings,
            params,
            rng,
            previous: None,
            frames_processed: 0,
        }
    }

    /// The clamped settings this pipeline runs with
    pub fn settings(&self) -> &VhsSettings {
        &self.settings
    }

    pub fn params(&self) -> &EffectParams {
        &self.params
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Forget the retained frame; the next frame starts a new clip
    pub fn reset(&mut self) {
        self.previous = None;
        self.frames_processed = 0;
    }

    /// Run one frame through every stage in [`Stage::PIPELINE_ORDER`]
    pub fn process_frame(&mut self, mut frame: Frame) -> Result<Frame> {
        if frame.is_empty() {
            return Err(VideoError::FrameProcessing {
                stage: "input",
                reason: format!("frame has no pixels ({}x{})", frame.width(), frame.height()),
            }
            .into());
        }

        for stage in Stage::PIPELINE_ORDER {
            trace!("frame {}: {}", self.frames_processed, stage);
            self.apply(stage, &mut frame);
        }

        self.frames_processed += 1;
        Ok(frame)
    }

    fn apply(&mut self, stage: Stage, frame: &mut Frame) {
        let params = &self.params;
        match stage {
            Stage::ColorGrade => effects::color_grade(frame, &params.color),
            Stage::ChromaticAberration => effects::chromatic_aberration(frame, params.chroma_offset),
            Stage::Noise => effects::add_noise(frame, params.noise_amplitude, &mut self.rng),
            Stage::Ghosting => {
                if params.ghost_weight > 0.0 {
                    // the next frame blends with this one before its own ghost
                    let unghosted = frame.clone();
                    if let Some(previous) = &self.previous {
                        effects::ghost_blend(frame, previous, params.ghost_weight);
                    }
                    self.previous = Some(unghosted);
                }
            }
            Stage::Blur => effects::blur(frame, params.blur_sigma),
            Stage::ScanLines => effects::scan_lines(frame, params.scanline_alpha),
            Stage::TrackingError => effects::tracking_error(frame, &params.tracking, &mut self.rng),
            Stage::Vignette => effects::vignette(frame, params.vignette_strength),
            Stage::DateStamp => {
                if let Some(text) = &params.stamp_text {
                    effects::date_stamp(frame, text);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Preset;

    fn neutral() -> VhsSettings {
        VhsSettings::default()
    }

    fn patterned(width: u32, height: u32, seed: u8) -> Frame {
        let mut frame = Frame::new_black(width, height);
        for y in 0..height {
            for x in 0..width {
                let v = (x * 31 + y * 17 + seed as u32) as u8;
                frame.set_pixel(x, y, [v, v.wrapping_mul(3), v.wrapping_add(90), 255]);
            }
        }
        frame
    }

    #[test]
    fn test_neutral_settings_are_identity() {
        let mut pipeline = FramePipeline::seeded(&neutral(), 1);
        let input = Frame::new_filled(2, 2, [128, 128, 128, 255]);
        let output = pipeline.process_frame(input.clone()).unwrap();
        assert_eq!(output, input);

        let input = patterned(17, 9, 4);
        let output = pipeline.process_frame(input.clone()).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_chromatic_aberration_through_pipeline() {
        let settings = VhsSettings { chromatic_aberration: 2.0, ..neutral() };
        let mut pipeline = FramePipeline::seeded(&settings, 1);

        let mut input = Frame::new_black(4, 1);
        input.set_pixel(0, 0, [10, 11, 12, 255]);
        input.set_pixel(1, 0, [20, 21, 22, 255]);
        input.set_pixel(2, 0, [30, 31, 32, 255]);
        input.set_pixel(3, 0, [40, 41, 42, 255]);

        let output = pipeline.process_frame(input.clone()).unwrap();
        for x in 0..4u32 {
            let red_source = x.saturating_sub(2);
            let blue_source = (x + 2).min(3);
            let [r, g, b, _] = output.get_pixel(x, 0);
            assert_eq!(r, input.get_pixel(red_source, 0)[0]);
            assert_eq!(g, input.get_pixel(x, 0)[1]);
            assert_eq!(b, input.get_pixel(blue_source, 0)[2]);
        }
    }

    #[test]
    fn test_out_of_range_settings_stay_in_bounds() {
        let settings = VhsSettings {
            saturation: -50.0,
            brightness: 10_000.0,
            contrast: f64::NAN,
            noise: 1e9,
            color_shift: -1e6,
            chromatic_aberration: -4.0,
            scan_lines: 400.0,
            tracking_error: 99.0,
            ghosting: 99.0,
            blur: f64::INFINITY,
            vignette: 1000.0,
            target_fps: -1.0,
            ..neutral()
        };
        let mut pipeline = FramePipeline::seeded(&settings, 5);
        assert_eq!(pipeline.settings().saturation, 0.0);
        assert_eq!(pipeline.settings().blur, 5.0);

        for seed in 0..3 {
            let output = pipeline.process_frame(patterned(24, 16, seed)).unwrap();
            assert_eq!(output.dimensions(), (24, 16));
            assert!(output.as_raw().chunks_exact(4).all(|p| p[3] == 255));
        }
    }

    #[test]
    fn test_ghosting_zero_keeps_frames_independent() {
        let settings = VhsSettings { ghosting: 0.0, ..neutral() };
        let mut pipeline = FramePipeline::seeded(&settings, 1);

        pipeline.process_frame(Frame::new_filled(4, 4, [255, 255, 255, 255])).unwrap();
        let second = Frame::new_filled(4, 4, [0, 0, 0, 255]);
        let output = pipeline.process_frame(second.clone()).unwrap();
        assert_eq!(output, second);
        assert!(!pipeline.has_previous());
    }

    #[test]
    fn test_ghosting_blends_with_unghosted_previous() {
        let settings = VhsSettings { ghosting: 10.0, ..neutral() };
        let mut pipeline = FramePipeline::seeded(&settings, 1);

        // first frame has nothing to blend with
        let first = pipeline.process_frame(Frame::new_filled(2, 2, [200, 200, 200, 255])).unwrap();
        assert_eq!(first.get_pixel(0, 0), [200, 200, 200, 255]);

        let second = pipeline.process_frame(Frame::new_filled(2, 2, [0, 0, 0, 255])).unwrap();
        assert_eq!(second.get_pixel(0, 0), [100, 100, 100, 255]);

        // blends with the raw 0 frame, not the blended 100 output
        let third = pipeline.process_frame(Frame::new_filled(2, 2, [0, 0, 0, 255])).unwrap();
        assert_eq!(third.get_pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_reset_clears_temporal_state() {
        let settings = VhsSettings { ghosting: 10.0, ..neutral() };
        let mut pipeline = FramePipeline::seeded(&settings, 1);
        pipeline.process_frame(Frame::new_filled(2, 2, [200, 200, 200, 255])).unwrap();
        assert!(pipeline.has_previous());

        pipeline.reset();
        assert!(!pipeline.has_previous());
        assert_eq!(pipeline.frames_processed(), 0);

        let output = pipeline.process_frame(Frame::new_filled(2, 2, [0, 0, 0, 255])).unwrap();
        assert_eq!(output.get_pixel(1, 1), [0, 0, 0, 255]);
    }

    #[test]
    fn test_seeded_pipelines_are_reproducible() {
        let settings = Preset::Degraded.settings();
        let mut a = FramePipeline::seeded(&settings, 77);
        let mut b = FramePipeline::seeded(&settings, 77);

        for seed in 0..3 {
            let frame = patterned(64, 48, seed);
            assert_eq!(
                a.process_frame(frame.clone()).unwrap(),
                b.process_frame(frame).unwrap()
            );
        }
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let mut pipeline = FramePipeline::seeded(&neutral(), 1);
        let err = pipeline.process_frame(Frame::new_black(0, 4)).unwrap_err();
        assert_eq!(err.stage(), "input");
    }
}
