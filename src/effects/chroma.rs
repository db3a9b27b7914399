use crate::video::Frame;

/// Split the red and blue channels horizontally.
///
/// Output red at `x` comes from `x - offset` and output blue from
/// `x + offset`, both clamped to the frame edge. Green is untouched.
pub fn chromatic_aberration(frame: &mut Frame, offset: u32) {
    if offset == 0 || frame.is_empty() {
        return;
    }

    let width = frame.width() as usize;
    let stride = frame.stride();
    let offset = offset as usize;
    let original = frame.as_raw().to_vec();

    for (row, source) in frame
        .as_raw_mut()
        .chunks_exact_mut(stride)
        .zip(original.chunks_exact(stride))
    {
        for x in 0..width {
            let red_x = x.saturating_sub(offset);
            let blue_x = (x + offset).min(width - 1);
            row[x * 4] = source[red_x * 4];
            row[x * 4 + 2] = source[blue_x * 4 + 2];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distinct_row() -> Frame {
        let mut frame = Frame::new_black(4, 1);
        frame.set_pixel(0, 0, [10, 11, 12, 255]);
        frame.set_pixel(1, 0, [20, 21, 22, 255]);
        frame.set_pixel(2, 0, [30, 31, 32, 255]);
        frame.set_pixel(3, 0, [40, 41, 42, 255]);
        frame
    }

    #[test]
    fn test_offset_two_on_four_pixels() {
        let mut frame = distinct_row();
        chromatic_aberration(&mut frame, 2);

        assert_eq!(frame.get_pixel(0, 0), [10, 11, 32, 255]);
        assert_eq!(frame.get_pixel(1, 0), [10, 21, 42, 255]);
        assert_eq!(frame.get_pixel(2, 0), [10, 31, 42, 255]);
        assert_eq!(frame.get_pixel(3, 0), [20, 41, 42, 255]);
    }

    #[test]
    fn test_red_follows_formula_for_every_pixel() {
        let mut frame = Frame::new_black(9, 3);
        for y in 0..3 {
            for x in 0..9 {
                frame.set_pixel(x, y, [(x * 20 + y) as u8, 7, (x * 3) as u8, 255]);
            }
        }
        let original = frame.clone();
        chromatic_aberration(&mut frame, 3);

        for y in 0..3u32 {
            for x in 0..9u32 {
                let expected_red = original.get_pixel(x.saturating_sub(3), y)[0];
                assert_eq!(frame.get_pixel(x, y)[0], expected_red);
                assert_eq!(frame.get_pixel(x, y)[1], 7);
            }
        }
    }

    #[test]
    fn test_zero_offset_is_noop() {
        let mut frame = distinct_row();
        let original = frame.clone();
        chromatic_aberration(&mut frame, 0);
        assert_eq!(frame, original);
    }

    #[test]
    fn test_offset_larger_than_frame() {
        let mut frame = distinct_row();
        chromatic_aberration(&mut frame, 10);
        for x in 0..4 {
            let [r, _, b, _] = frame.get_pixel(x, 0);
            assert_eq!(r, 10);
            assert_eq!(b, 42);
        }
    }
}
