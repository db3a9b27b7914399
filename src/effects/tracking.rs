use rand::Rng;

use crate::settings::mapping::{GLITCH_MAX_HEIGHT, GLITCH_MIN_HEIGHT};
use crate::settings::TrackingParams;
use crate::video::Frame;

/// One displaced horizontal band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glitch {
    pub y: u32,
    pub height: u32,
    pub offset: i64,
}

/// Pick `params.glitches` bands at random positions, heights and offsets
pub fn sample_glitches<R: Rng + ?Sized>(
    frame_height: u32,
    params: &TrackingParams,
    rng: &mut R,
) -> Vec<Glitch> {
    if frame_height == 0 || params.glitches == 0 || !(params.max_offset > 0.0) {
        return Vec::new();
    }

    (0..params.glitches)
        .map(|_| Glitch {
            y: rng.gen_range(0..frame_height),
            height: rng.gen_range(GLITCH_MIN_HEIGHT..=GLITCH_MAX_HEIGHT),
            offset: rng
                .gen_range(-params.max_offset..=params.max_offset)
                .round() as i64,
        })
        .collect()
}

/// Shift each glitch band sideways.
///
/// Bands are copied from a snapshot taken before any displacement, and pixels
/// the shifted band does not cover keep their current value.
pub fn apply_glitches(frame: &mut Frame, glitches: &[Glitch]) {
    if glitches.is_empty() || frame.is_empty() {
        return;
    }

    let snapshot = frame.clone();
    let width = frame.width() as i64;
    let height = frame.height();

    for glitch in glitches.iter().filter(|g| g.offset != 0) {
        let end = glitch.y.saturating_add(glitch.height).min(height);
        for y in glitch.y..end {
            for x in 0..width {
                let source_x = x - glitch.offset;
                if (0..width).contains(&source_x) {
                    let pixel = snapshot.get_pixel(source_x as u32, y);
                    frame.set_pixel(x as u32, y, pixel);
                }
            }
        }
    }
}

/// Random tracking-error glitches, fresh every call
pub fn tracking_error<R: Rng + ?Sized>(frame: &mut Frame, params: &TrackingParams, rng: &mut R) {
    let glitches = sample_glitches(frame.height(), params, rng);
    apply_glitches(frame, &glitches);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn gradient(width: u32, height: u32) -> Frame {
        let mut frame = Frame::new_black(width, height);
        for y in 0..height {
            for x in 0..width {
                frame.set_pixel(x, y, [x as u8, y as u8, 0, 255]);
            }
        }
        frame
    }

    #[test]
    fn test_band_is_shifted_right() {
        let mut frame = gradient(10, 10);
        apply_glitches(&mut frame, &[Glitch { y: 2, height: 3, offset: 4 }]);

        // inside the band, pixels come from four columns to the left
        assert_eq!(frame.get_pixel(6, 3), [2, 3, 0, 255]);
        // uncovered pixels keep the original
        assert_eq!(frame.get_pixel(1, 3), [1, 3, 0, 255]);
        // rows outside the band are untouched
        assert_eq!(frame.get_pixel(6, 5), [6, 5, 0, 255]);
        assert_eq!(frame.get_pixel(6, 1), [6, 1, 0, 255]);
    }

    #[test]
    fn test_band_is_clipped_at_bottom() {
        let mut frame = gradient(6, 4);
        apply_glitches(&mut frame, &[Glitch { y: 3, height: 25, offset: -2 }]);
        assert_eq!(frame.get_pixel(0, 3), [2, 3, 0, 255]);
        assert_eq!(frame.get_pixel(5, 3), [5, 3, 0, 255]);
    }

    #[test]
    fn test_sampled_glitches_respect_bounds() {
        let params = TrackingParams { glitches: 8, max_offset: 40.0 };
        let mut rng = SmallRng::seed_from_u64(11);
        let glitches = sample_glitches(480, &params, &mut rng);

        assert_eq!(glitches.len(), 8);
        for glitch in glitches {
            assert!(glitch.y < 480);
            assert!((GLITCH_MIN_HEIGHT..=GLITCH_MAX_HEIGHT).contains(&glitch.height));
            assert!(glitch.offset.abs() <= 40);
        }
    }

    #[test]
    fn test_no_glitches_without_tracking_error() {
        let params = TrackingParams { glitches: 0, max_offset: 0.0 };
        let mut frame = gradient(8, 8);
        let original = frame.clone();
        tracking_error(&mut frame, &params, &mut SmallRng::seed_from_u64(5));
        assert_eq!(frame, original);
    }
}
