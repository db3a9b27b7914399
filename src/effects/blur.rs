use image::imageops;

use crate::video::Frame;

/// Gaussian blur with standard deviation `sigma` pixels
pub fn blur(frame: &mut Frame, sigma: f32) {
    // imageops::blur substitutes 1.0 for non-positive sigmas
    if !(sigma > 0.0) || frame.is_empty() {
        return;
    }

    let blurred = imageops::blur(frame.as_image(), sigma);
    *frame = Frame::new(blurred);
}
