use hand_rps_common::config::{ColorSpace, SegmenterConfig};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::morphology::{close, open};
use tracing::debug;

use crate::color::{to_hsv, to_ycrcb, SkinPredicate};

const FOREGROUND: Luma<u8> = Luma([255]);

/// Turns a color frame into a binary mask of likely skin pixels.
///
/// Pipeline: gaussian smoothing, bilateral filter, per-space range
/// thresholds (unioned), closing, opening, median filter.
pub struct SkinSegmenter {
    predicates: Vec<SkinPredicate>,
    blur_sigma: f32,
    bilateral_radius: u32,
    bilateral_sigma_color: f32,
    bilateral_sigma_space: f32,
    close_radius: u8,
    open_radius: u8,
    median_radius: u32,
}

impl SkinSegmenter {
    pub fn new(config: &SegmenterConfig) -> Self {
        Self {
            predicates: config.ranges.iter().map(SkinPredicate::from).collect(),
            blur_sigma: config.blur_sigma,
            bilateral_radius: config.bilateral_radius,
            bilateral_sigma_color: config.bilateral_sigma_color,
            bilateral_sigma_space: config.bilateral_sigma_space,
            close_radius: config.close_radius,
            open_radius: config.open_radius,
            median_radius: config.median_radius,
        }
    }

    pub fn segment(&self, frame: &RgbImage) -> GrayImage {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return GrayImage::new(width, height);
        }

        let blurred = if self.blur_sigma > 0.0 {
            gaussian_blur_f32(frame, self.blur_sigma)
        } else {
            frame.clone()
        };
        let smoothed = bilateral_filter(
            &blurred,
            self.bilateral_radius,
            self.bilateral_sigma_color,
            self.bilateral_sigma_space,
        );

        let mut mask = self.threshold(&smoothed);

        if self.close_radius > 0 {
            mask = close(&mask, Norm::L2, self.close_radius);
        }
        if self.open_radius > 0 {
            mask = open(&mask, Norm::L2, self.open_radius);
        }
        if self.median_radius > 0 {
            mask = median_filter(&mask, self.median_radius, self.median_radius);
        }

        debug!(
            width,
            height,
            foreground = mask.pixels().filter(|p| p.0[0] > 0).count(),
            "skin mask computed"
        );
        mask
    }

    /// Union of every range predicate, without any filtering.
    fn threshold(&self, image: &RgbImage) -> GrayImage {
        let needs_ycrcb = self.predicates.iter().any(|p| p.space() == ColorSpace::YCrCb);
        let needs_hsv = self.predicates.iter().any(|p| p.space() == ColorSpace::Hsv);

        let mut mask = GrayImage::new(image.width(), image.height());
        for (x, y, px) in image.enumerate_pixels() {
            let ycrcb = if needs_ycrcb { to_ycrcb(*px) } else { [0; 3] };
            let hsv = if needs_hsv { to_hsv(*px) } else { [0; 3] };
            let skin = self.predicates.iter().any(|p| match p.space() {
                ColorSpace::YCrCb => p.contains(ycrcb),
                ColorSpace::Hsv => p.contains(hsv),
            });
            if skin {
                mask.put_pixel(x, y, FOREGROUND);
            }
        }
        mask
    }
}

/// Edge-preserving smoothing over a circular window.
///
/// Weights combine a spatial gaussian with a gaussian over the L1 color
/// distance to the centre pixel. Borders replicate the edge pixel.
pub fn bilateral_filter(
    image: &RgbImage,
    radius: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> RgbImage {
    let (width, height) = image.dimensions();
    if radius == 0 || width == 0 || height == 0 {
        return image.clone();
    }

    let r = radius as i32;
    let mut window = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            let d2 = (dx * dx + dy * dy) as f32;
            if d2 > (r * r) as f32 {
                continue;
            }
            window.push((dx, dy, (-d2 / (2.0 * sigma_space * sigma_space)).exp()));
        }
    }
    let color_weight: Vec<f32> = (0..=255 * 3)
        .map(|d| {
            let d = d as f32;
            (-d * d / (2.0 * sigma_color * sigma_color)).exp()
        })
        .collect();

    let max_x = width as i32 - 1;
    let max_y = height as i32 - 1;
    let mut out = RgbImage::new(width, height);
    for (x, y, centre) in image.enumerate_pixels() {
        let mut sum = [0.0f32; 3];
        let mut total = 0.0f32;
        for &(dx, dy, spatial) in &window {
            let nx = (x as i32 + dx).clamp(0, max_x) as u32;
            let ny = (y as i32 + dy).clamp(0, max_y) as u32;
            let px = image.get_pixel(nx, ny);
            let dist: usize = (0..3)
                .map(|c| (px.0[c] as i32 - centre.0[c] as i32).unsigned_abs() as usize)
                .sum();
            let w = spatial * color_weight[dist];
            for c in 0..3 {
                sum[c] += w * px.0[c] as f32;
            }
            total += w;
        }
        let value = sum.map(|s| (s / total).round().clamp(0.0, 255.0) as u8);
        out.put_pixel(x, y, Rgb(value));
    }
    out
}
