use rayon::prelude::*;

use crate::effects::to_channel;
use crate::settings::ColorParams;
use crate::video::Frame;

/// Rec.601 luma weights used for desaturation
const LUMA_WEIGHTS: [f32; 3] = [0.2989, 0.587, 0.114];

/// Contrast around mid-grey, brightness scale, desaturation toward luma,
/// then the warm/cool color bias.
pub fn color_grade(frame: &mut Frame, params: &ColorParams) {
    if params.is_neutral() {
        return;
    }

    frame
        .as_raw_mut()
        .par_chunks_exact_mut(4)
        .for_each(|pixel| grade_pixel(pixel, params));
}

fn grade_pixel(pixel: &mut [u8], params: &ColorParams) {
    let mut rgb = [0.0f32; 3];
    for (channel, value) in rgb.iter_mut().enumerate() {
        let normalized = pixel[channel] as f32 / 255.0;
        *value = ((normalized - 0.5) * params.contrast + 0.5) * 255.0 * params.brightness;
    }

    let gray: f32 = rgb
        .iter()
        .zip(LUMA_WEIGHTS.iter())
        .map(|(value, weight)| value * weight)
        .sum();

    for channel in 0..3 {
        let saturated = gray + (rgb[channel] - gray) * params.saturation;
        pixel[channel] = to_channel(saturated + params.bias[channel]);
    }
}
