use crate::effects::font::{self, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::effects::to_channel;
use crate::video::Frame;

/// Distance of the text from the left and bottom edges
pub const STAMP_MARGIN: u32 = 20;
/// Smallest rendered text height in pixels
pub const STAMP_MIN_TEXT_HEIGHT: u32 = 16;

const TEXT_COLOR: [f32; 3] = [255.0, 255.0, 255.0];
const TEXT_ALPHA: f32 = 0.9;
const OUTLINE_ALPHA: f32 = 0.8;

const MASK_NONE: u8 = 0;
const MASK_OUTLINE: u8 = 1;
const MASK_TEXT: u8 = 2;

/// Integer upscale of the 5x7 font for a frame of the given height
pub fn stamp_scale(frame_height: u32) -> u32 {
    let text_height = (frame_height / 30).max(STAMP_MIN_TEXT_HEIGHT);
    ((text_height as f32 / GLYPH_HEIGHT as f32).round() as u32).max(1)
}

/// Draw `text` bottom-left in white over a dark outline.
///
/// Characters without a glyph leave a blank cell. Anything falling outside
/// the frame is clipped.
pub fn date_stamp(frame: &mut Frame, text: &str) {
    if text.trim().is_empty() || frame.is_empty() {
        return;
    }

    let (width, height) = (frame.width() as i64, frame.height() as i64);
    let scale = stamp_scale(frame.height()) as i64;
    let outline = (scale / 2).max(1);
    let advance = (GLYPH_WIDTH as i64 + 1) * scale;
    let left = STAMP_MARGIN as i64;
    let top = height - STAMP_MARGIN as i64 - GLYPH_HEIGHT as i64 * scale;

    // text block plus its outline, clipped to the frame
    let glyph_count = text.chars().count() as i64;
    let x0 = (left - outline).max(0);
    let y0 = (top - outline).max(0);
    let x1 = (left + glyph_count * advance + outline).min(width);
    let y1 = (top + GLYPH_HEIGHT as i64 * scale + outline).min(height);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let box_width = x1 - x0;
    let mut mask = vec![MASK_NONE; (box_width * (y1 - y0)) as usize];
    let cell_index = |x: i64, y: i64| ((y - y0) * box_width + (x - x0)) as usize;

    for (index, c) in text.chars().enumerate() {
        let Some(glyph) = font::glyph(c) else {
            continue;
        };
        let cell_x = left + index as i64 * advance;
        if cell_x >= width {
            break;
        }

        for row in 0..GLYPH_HEIGHT {
            for col in 0..GLYPH_WIDTH {
                if !font::is_lit(glyph, col, row) {
                    continue;
                }
                let block_x = cell_x + col as i64 * scale;
                let block_y = top + row as i64 * scale;
                for y in block_y..block_y + scale {
                    for x in block_x..block_x + scale {
                        if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                            mask[cell_index(x, y)] = MASK_TEXT;
                        }
                    }
                }
            }
        }
    }

    for y in y0..y1 {
        for x in x0..x1 {
            if mask[cell_index(x, y)] != MASK_TEXT {
                continue;
            }
            for ny in (y - outline).max(y0)..=(y + outline).min(y1 - 1) {
                for nx in (x - outline).max(x0)..=(x + outline).min(x1 - 1) {
                    let cell = &mut mask[cell_index(nx, ny)];
                    if *cell == MASK_NONE {
                        *cell = MASK_OUTLINE;
                    }
                }
            }
        }
    }

    let stride = frame.stride();
    let row_bytes = box_width as usize * 4;
    let pixels = frame.as_raw_mut();
    for y in y0..y1 {
        let start = y as usize * stride + x0 as usize * 4;
        let cells = &mask[cell_index(x0, y)..cell_index(x0, y) + box_width as usize];
        for (pixel, &cell) in pixels[start..start + row_bytes].chunks_exact_mut(4).zip(cells) {
            match cell {
                MASK_TEXT => blend(pixel, TEXT_COLOR, TEXT_ALPHA),
                MASK_OUTLINE => blend(pixel, [0.0; 3], OUTLINE_ALPHA),
                _ => {}
            }
        }
    }
}

fn blend(pixel: &mut [u8], color: [f32; 3], alpha: f32) {
    for channel in 0..3 {
        pixel[channel] = to_channel(pixel[channel] as f32 * (1.0 - alpha) + color[channel] * alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_follows_frame_height() {
        assert_eq!(stamp_scale(240), 2);
        assert_eq!(stamp_scale(1080), 5);
        assert_eq!(stamp_scale(2160), 10);
    }

    #[test]
    fn test_stamp_draws_bottom_left() {
        let mut frame = Frame::new_filled(320, 240, [100, 100, 100, 255]);
        date_stamp(&mut frame, "JAN 15 1997");

        let scale = stamp_scale(240);
        let top = 240 - STAMP_MARGIN - GLYPH_HEIGHT * scale;
        // the 'J' top row is lit from its third column
        let lit = frame.get_pixel(STAMP_MARGIN + 2 * scale, top);
        assert!(lit[0] > 200, "expected white text, got {:?}", lit);

        // the outline darkens just above the glyph
        let above = frame.get_pixel(STAMP_MARGIN + 2 * scale, top - 1);
        assert!(above[0] < 100);

        // the top half of the frame is untouched
        assert_eq!(frame.get_pixel(160, 10), [100, 100, 100, 255]);
    }

    #[test]
    fn test_stamp_stays_inside_text_block() {
        let background = [100, 100, 100, 255];
        let mut frame = Frame::new_filled(320, 240, background);
        date_stamp(&mut frame, "AB");

        // scale 2, outline 1, two 12px cells
        let scale = stamp_scale(240);
        let top = 240 - STAMP_MARGIN - GLYPH_HEIGHT * scale;
        let (x0, x1) = (STAMP_MARGIN - 1, STAMP_MARGIN + 2 * 12 + 1);
        let (y0, y1) = (top - 1, top + GLYPH_HEIGHT * scale + 1);

        let mut changed = 0;
        for y in 0..240 {
            for x in 0..320 {
                if frame.get_pixel(x, y) != background {
                    assert!((x0..x1).contains(&x) && (y0..y1).contains(&y), "({}, {})", x, y);
                    changed += 1;
                }
            }
        }
        assert!(changed > 0);
    }

    #[test]
    fn test_long_text_is_clipped_at_right_edge() {
        let mut frame = Frame::new_filled(80, 240, [100, 100, 100, 255]);
        date_stamp(&mut frame, "WWWWWWWWWWWWWWWWWWWW");
        assert_eq!(frame.dimensions(), (80, 240));

        // the fifth glyph starts at x = 20 + 4 * 12 and still fits
        let top = 240 - STAMP_MARGIN - GLYPH_HEIGHT * stamp_scale(240);
        assert!(frame.get_pixel(68, top)[0] > 200);
    }

    #[test]
    fn test_blank_text_is_noop() {
        let mut frame = Frame::new_filled(64, 64, [100, 100, 100, 255]);
        let original = frame.clone();
        date_stamp(&mut frame, "   ");
        assert_eq!(frame, original);
    }

    #[test]
    fn test_tiny_frames_are_clipped_without_panicking() {
        let mut frame = Frame::new_filled(2, 2, [100, 100, 100, 255]);
        date_stamp(&mut frame, "DEC 24 1982");
        assert_eq!(frame.dimensions(), (2, 2));
    }
}
