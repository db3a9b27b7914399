use rand::Rng;

use crate::effects::to_channel;
use crate::video::Frame;

/// Independent uniform noise in `-amplitude..=amplitude` on each of R, G, B
pub fn add_noise<R: Rng + ?Sized>(frame: &mut Frame, amplitude: f32, rng: &mut R) {
    if !(amplitude > 0.0) {
        return;
    }

    for pixel in frame.as_raw_mut().chunks_exact_mut(4) {
        for channel in pixel.iter_mut().take(3) {
            let noise: f32 = rng.gen_range(-amplitude..=amplitude);
            *channel = to_channel(*channel as f32 + noise);
        }
    }
}
