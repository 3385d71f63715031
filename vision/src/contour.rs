use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use tracing::debug;

use crate::geometry::polygon_area;

/// Ordered boundary points of a single foreground region.
pub type Contour = Vec<Point<i32>>;

/// Picks the dominant foreground region out of a skin mask.
pub struct ContourExtractor {
    min_area: f64,
}

impl ContourExtractor {
    pub fn new(min_area: f64) -> Self {
        Self { min_area }
    }

    /// Largest external contour whose enclosed area exceeds the minimum.
    ///
    /// `None` means no hand is visible. Equal areas keep the first contour
    /// found in raster order.
    pub fn extract(&self, mask: &GrayImage) -> Option<Contour> {
        let mut best: Option<(f64, Contour)> = None;
        let mut candidates = 0usize;

        for contour in find_contours::<i32>(mask) {
            if !matches!(contour.border_type, BorderType::Outer) || contour.parent.is_some() {
                continue;
            }
            candidates += 1;
            let area = polygon_area(&contour.points);
            if area <= self.min_area {
                continue;
            }
            let larger = best.as_ref().map_or(true, |(best_area, _)| area > *best_area);
            if larger {
                best = Some((area, contour.points));
            }
        }

        debug!(
            candidates,
            selected_area = best.as_ref().map(|(a, _)| *a),
            min_area = self.min_area,
            "external contours scanned"
        );
        best.map(|(_, points)| points)
    }
}
