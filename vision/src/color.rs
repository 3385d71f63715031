//! 8-bit color space conversions used for skin thresholding.
//!
//! Both conversions follow the usual 8-bit conventions of camera pipelines:
//! YCrCb is full range with chroma centred on 128, HSV stores hue as
//! degrees / 2 so it fits a byte (0..=179).

use hand_rps_common::config::{ColorSpace, SkinRange};
use image::Rgb;

pub fn to_ycrcb(px: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = px.0.map(f32::from);
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cr = (r - y) * 0.713 + 128.0;
    let cb = (b - y) * 0.564 + 128.0;
    [saturate(y), saturate(cr), saturate(cb)]
}

pub fn to_hsv(px: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = px.0.map(f32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { diff * 255.0 / v } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    [saturate(h / 2.0), saturate(s), saturate(v)]
}

fn saturate(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// A compiled skin range: which conversion to apply and the inclusive bounds.
#[derive(Debug, Clone)]
pub struct SkinPredicate {
    space: ColorSpace,
    lower: [u8; 3],
    upper: [u8; 3],
}

impl SkinPredicate {
    pub fn new(space: ColorSpace, lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self {
            space,
            lower,
            upper,
        }
    }

    pub fn space(&self) -> ColorSpace {
        self.space
    }

    /// True when every channel of the already converted pixel is in range.
    pub fn contains(&self, converted: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= converted[c] && converted[c] <= self.upper[c])
    }
}

impl From<&SkinRange> for SkinPredicate {
    fn from(range: &SkinRange) -> Self {
        Self::new(range.space, range.lower, range.upper)
    }
}
