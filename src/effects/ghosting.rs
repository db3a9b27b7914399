use crate::effects::to_channel;
use crate::video::Frame;

/// Blend the current frame toward the previous one: `cur*(1-w) + prev*w`.
///
/// Does nothing when `weight` is zero or the two frames differ in size.
pub fn ghost_blend(frame: &mut Frame, previous: &Frame, weight: f32) {
    if !(weight > 0.0) || frame.dimensions() != previous.dimensions() {
        return;
    }

    let keep = 1.0 - weight;
    for (pixel, prev) in frame
        .as_raw_mut()
        .chunks_exact_mut(4)
        .zip(previous.as_raw().chunks_exact(4))
    {
        for channel in 0..3 {
            pixel[channel] = to_channel(pixel[channel] as f32 * keep + prev[channel] as f32 * weight);
        }
    }
}
