use rayon::prelude::*;

use crate::effects::to_channel;
use crate::settings::mapping::VIGNETTE_INNER_RADIUS;
use crate::video::Frame;

/// Darken toward the corners.
///
/// Pixels inside `VIGNETTE_INNER_RADIUS` of the center-to-corner radius are
/// untouched; beyond that the darkening ramps up with a smoothstep and
/// reaches `strength` at the corners.
pub fn vignette(frame: &mut Frame, strength: f32) {
    if !(strength > 0.0) || frame.is_empty() {
        return;
    }

    let strength = strength.min(1.0);
    let center_x = frame.width() as f32 / 2.0;
    let center_y = frame.height() as f32 / 2.0;
    let radius = (center_x * center_x + center_y * center_y).sqrt();
    let inner = radius * VIGNETTE_INNER_RADIUS;
    let span = (radius - inner).max(f32::EPSILON);
    let stride = frame.stride();

    frame
        .as_raw_mut()
        .par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let dy = y as f32 + 0.5 - center_y;
            for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                let dx = x as f32 + 0.5 - center_x;
                let distance = (dx * dx + dy * dy).sqrt();
                let t = ((distance - inner) / span).clamp(0.0, 1.0);
                let darkening = strength * t * t * (3.0 - 2.0 * t);
                if darkening > 0.0 {
                    let keep = 1.0 - darkening;
                    for channel in pixel.iter_mut().take(3) {
                        *channel = to_channel(*channel as f32 * keep);
                    }
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_untouched_corners_darkened() {
        let mut frame = Frame::new_filled(101, 101, [200, 200, 200, 255]);
        vignette(&mut frame, 1.0);

        assert_eq!(frame.get_pixel(50, 50), [200, 200, 200, 255]);
        let corner = frame.get_pixel(0, 0)[0];
        assert!(corner < 20, "corner too bright: {}", corner);
        // monotonic from the center outward
        let mid = frame.get_pixel(20, 20)[0];
        assert!(corner <= mid && mid <= 200);
    }

    #[test]
    fn test_zero_strength_is_noop() {
        let mut frame = Frame::new_filled(10, 10, [90, 90, 90, 255]);
        let original = frame.clone();
        vignette(&mut frame, 0.0);
        assert_eq!(frame, original);
    }
}
