//! Model-free stand-ins for the CLIP towers.
//!
//! Images map to a joint RGB color histogram (8 bins per channel) folded into the
//! configured dimension. It is invariant to rotation and flips and close to invariant
//! to crops that keep the color mix, which is enough to exercise the verification
//! pipeline end to end without weights. Labels map to hash-seeded pseudo-random vectors.

use image::DynamicImage;

use crate::hashing::hash_label;

const BINS_PER_CHANNEL: usize = 8;
const BIN_SHIFT: u8 = 5;

/// Larger images are thumbnailed first to bound the cost of a stub encode.
const MAX_STUB_SIDE: u32 = 512;

pub(super) fn color_histogram(image: &DynamicImage, dim: usize) -> Vec<f32> {
    let rgb = if image.width().max(image.height()) > MAX_STUB_SIDE {
        image.thumbnail(MAX_STUB_SIDE, MAX_STUB_SIDE).to_rgb8()
    } else {
        image.to_rgb8()
    };

    let mut histogram = vec![0.0f32; dim];
    for pixel in rgb.pixels() {
        let [r, g, b] = pixel.0.map(|c| usize::from(c >> BIN_SHIFT));
        let bin = (r * BINS_PER_CHANNEL + g) * BINS_PER_CHANNEL + b;
        histogram[bin % dim] += 1.0;
    }
    histogram
}

pub(super) fn label_vector(label: &str, dim: usize) -> Vec<f32> {
    let mut state = hash_label(label);
    (0..dim)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}
