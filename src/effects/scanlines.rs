use rayon::prelude::*;

use crate::effects::to_channel;
use crate::settings::mapping::SCANLINE_SPACING;
use crate::video::Frame;

/// Multiply every `SCANLINE_SPACING`th row (starting at row 0) by `1 - alpha`
pub fn scan_lines(frame: &mut Frame, alpha: f32) {
    if !(alpha > 0.0) || frame.is_empty() {
        return;
    }

    let keep = (1.0 - alpha).clamp(0.0, 1.0);
    let stride = frame.stride();

    frame
        .as_raw_mut()
        .par_chunks_exact_mut(stride)
        .enumerate()
        .filter(|(y, _)| *y as u32 % SCANLINE_SPACING == 0)
        .for_each(|(_, row)| {
            for pixel in row.chunks_exact_mut(4) {
                for channel in pixel.iter_mut().take(3) {
                    *channel = to_channel(*channel as f32 * keep);
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_rows_are_darkened() {
        let mut frame = Frame::new_filled(3, 4, [200, 200, 200, 255]);
        scan_lines(&mut frame, 0.5);

        assert_eq!(frame.get_pixel(0, 0), [100, 100, 100, 255]);
        assert_eq!(frame.get_pixel(1, 1), [200, 200, 200, 255]);
        assert_eq!(frame.get_pixel(2, 2), [100, 100, 100, 255]);
        assert_eq!(frame.get_pixel(0, 3), [200, 200, 200, 255]);
    }

    #[test]
    fn test_zero_alpha_is_noop() {
        let mut frame = Frame::new_filled(3, 4, [200, 200, 200, 255]);
        let original = frame.clone();
        scan_lines(&mut frame, 0.0);
        assert_eq!(frame, original);
    }
}
