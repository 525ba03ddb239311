//! Test fixtures for integration tests.
//!
//! Images are built from a handful of flat colors so the stub encoder's color
//! histogram gives predictable similarities: stripe works A, B and C share a palette
//! in different proportions, the landscape shares no color with them, and noise
//! spreads over every histogram bin.

use std::path::{Path, PathBuf};
use std::time::Duration;

use artcheck::config::Config;
use artcheck::scoring::TopK;
use image::{DynamicImage, Rgb, RgbImage};

pub const RED: [u8; 3] = [220, 30, 40];
pub const BLACK: [u8; 3] = [20, 20, 20];
pub const PINK: [u8; 3] = [245, 200, 210];

pub const SKY: [u8; 3] = [90, 160, 230];
pub const GRASS: [u8; 3] = [40, 140, 50];
pub const SUN: [u8; 3] = [250, 220, 60];

/// Stripe period in pixels; crops that are a multiple of it keep the color mix.
pub const STRIPE_PERIOD: u32 = 10;

pub const WORK_A: &str = "a_heart_eyes.png";
pub const WORK_B: &str = "b_crowned_lady.png";
pub const WORK_C: &str = "c_blue_profile.png";

/// Vertical stripes repeating `red`, `black` and `pink` pixels in that order.
pub fn stripes(width: u32, height: u32, (red, black, pink): (u32, u32, u32)) -> DynamicImage {
    assert_eq!(red + black + pink, STRIPE_PERIOD);
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
        let phase = x % STRIPE_PERIOD;
        if phase < red {
            Rgb(RED)
        } else if phase < red + black {
            Rgb(BLACK)
        } else {
            Rgb(PINK)
        }
    }))
}

pub fn work_a() -> DynamicImage {
    stripes(200, 80, (5, 3, 2))
}

pub fn work_b() -> DynamicImage {
    stripes(200, 80, (3, 5, 2))
}

pub fn work_c() -> DynamicImage {
    stripes(200, 80, (2, 3, 5))
}

/// A 100-pixel-wide crop of work A, rotated a quarter turn.
pub fn cropped_rotated_a() -> DynamicImage {
    work_a().crop_imm(30, 10, 10 * STRIPE_PERIOD, 60).rotate90()
}

/// Sky over grass with a sun; no pixel falls in a stripe color's bin.
pub fn landscape() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(160, 120, |x, y| {
        let (dx, dy) = (x as i32 - 120, y as i32 - 30);
        if dx * dx + dy * dy < 15 * 15 {
            Rgb(SUN)
        } else if y < 80 {
            Rgb(SKY)
        } else {
            Rgb(GRASS)
        }
    }))
}

/// Deterministic uniform RGB noise.
pub fn noise(seed: u64) -> DynamicImage {
    let mut state = seed;
    DynamicImage::ImageRgb8(RgbImage::from_fn(128, 128, |_, _| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let [r, g, b, ..] = (state >> 24).to_le_bytes();
        Rgb([r, g, b])
    }))
}

pub fn save(dir: &Path, name: &str, image: &DynamicImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).expect("write fixture image");
    path
}

/// A temp corpus holding works A, B and C.
pub fn corpus() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("create corpus dir");
    save(dir.path(), WORK_A, &work_a());
    save(dir.path(), WORK_B, &work_b());
    save(dir.path(), WORK_C, &work_c());
    dir
}

/// Stub-encoder config over `corpus_dir`.
pub fn config(corpus_dir: &Path) -> Config {
    Config {
        reference_dir: corpus_dir.to_path_buf(),
        artist_name: "Anna Laurini".to_string(),
        top_k: TopK::Fixed(3),
        verify_timeout: Duration::from_secs(10),
        ..Default::default()
    }
}
