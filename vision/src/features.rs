use std::collections::HashMap;

use hand_rps_common::config::GestureConfig;
use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use tracing::debug;

use crate::contour::Contour;
use crate::geometry::{bounding_box, distance, line_distance, polygon_area, BoundingBox};

/// A concavity between two hull vertices that passed every acceptance test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defect {
    pub start: Point<i32>,
    pub end: Point<i32>,
    /// Deepest contour point between `start` and `end`.
    pub far: Point<i32>,
    /// Distance from `far` to the hull edge, in pixels.
    pub depth: f64,
    /// Interior angle at `far`, in degrees.
    pub angle: f64,
}

/// Shape measurements of the dominant hand contour.
#[derive(Debug, Clone)]
pub struct Features {
    pub contour: Contour,
    pub area: f64,
    pub hull: Vec<Point<i32>>,
    pub hull_area: f64,
    /// `area / hull_area`, or 0 when the hull is degenerate.
    pub solidity: f64,
    pub bbox: BoundingBox,
    /// `area / bbox area`, or 0 when the box is empty.
    pub extent: f64,
    pub center: Point<i32>,
    pub defects: Vec<Defect>,
}

impl Features {
    pub fn defect_count(&self) -> usize {
        self.defects.len()
    }
}

pub fn solidity(area: f64, hull_area: f64) -> f64 {
    if hull_area > 0.0 {
        (area / hull_area).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub struct FeatureExtractor {
    min_hand_area: f64,
    angle_min: f64,
    angle_max: f64,
    min_depth: f64,
    height_fraction: f64,
}

impl FeatureExtractor {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            min_hand_area: config.min_hand_area,
            angle_min: config.defect_angle_min,
            angle_max: config.defect_angle_max,
            min_depth: config.min_defect_depth,
            height_fraction: config.defect_height_fraction,
        }
    }

    pub fn extract(&self, contour: Contour) -> Features {
        let area = polygon_area(&contour);
        let hull = convex_hull(&contour[..]);
        let hull_area = polygon_area(&hull);
        let bbox = bounding_box(&contour);
        let extent = if bbox.area() > 0.0 {
            area / bbox.area()
        } else {
            0.0
        };

        // Too small to be a hand; the classifier rejects it anyway.
        let defects = if area < self.min_hand_area {
            Vec::new()
        } else {
            self.finger_gaps(&contour, &hull, bbox)
        };

        debug!(
            area,
            hull_area,
            solidity = format!("{:.3}", solidity(area, hull_area)),
            extent = format!("{:.3}", extent),
            defects = defects.len(),
            "contour features"
        );

        Features {
            area,
            hull_area,
            solidity: solidity(area, hull_area),
            center: bbox.center(),
            bbox,
            extent,
            hull,
            defects,
            contour,
        }
    }

    /// Convexity defects that look like the gap between two extended fingers.
    fn finger_gaps(
        &self,
        contour: &[Point<i32>],
        hull: &[Point<i32>],
        bbox: BoundingBox,
    ) -> Vec<Defect> {
        let height_limit = bbox.y as f64 + self.height_fraction * bbox.height as f64;

        convexity_defects(contour, hull)
            .into_iter()
            .filter_map(|(s, e, f, depth)| {
                let (start, end, far) = (contour[s], contour[e], contour[f]);
                let a = distance(end, start);
                let b = distance(far, start);
                let c = distance(end, far);
                if b == 0.0 || c == 0.0 {
                    return None;
                }
                let cos = ((b * b + c * c - a * a) / (2.0 * b * c)).clamp(-1.0, 1.0);
                let angle = cos.acos().to_degrees();

                let accepted = (self.angle_min..=self.angle_max).contains(&angle)
                    && depth > self.min_depth
                    && (far.y as f64) < height_limit;
                debug!(
                    far_x = far.x,
                    far_y = far.y,
                    angle = format!("{:.1}", angle),
                    depth = format!("{:.1}", depth),
                    accepted,
                    "defect candidate"
                );
                accepted.then_some(Defect {
                    start,
                    end,
                    far,
                    depth,
                    angle,
                })
            })
            .collect()
    }
}

/// Raw convexity defects as `(start, end, far, depth)` contour indices.
///
/// Hull vertices are located in the contour by their first occurrence and
/// visited in contour order; for every pair of neighbouring hull vertices
/// the contour point farthest from their connecting edge is the far point.
pub fn convexity_defects(
    contour: &[Point<i32>],
    hull: &[Point<i32>],
) -> Vec<(usize, usize, usize, f64)> {
    let n = contour.len();
    if n < 4 {
        return Vec::new();
    }

    let mut first_index: HashMap<(i32, i32), usize> = HashMap::with_capacity(n);
    for (i, p) in contour.iter().enumerate() {
        first_index.entry((p.x, p.y)).or_insert(i);
    }
    let mut hull_idx: Vec<usize> = hull
        .iter()
        .filter_map(|p| first_index.get(&(p.x, p.y)).copied())
        .collect();
    hull_idx.sort_unstable();
    hull_idx.dedup();

    // Vertices on a straight hull edge would split one gap across two edges.
    let count = hull_idx.len();
    let hull_idx: Vec<usize> = (0..count)
        .filter(|&i| {
            let prev = contour[hull_idx[(i + count - 1) % count]];
            let next = contour[hull_idx[(i + 1) % count]];
            cross(prev, contour[hull_idx[i]], next) != 0
        })
        .map(|i| hull_idx[i])
        .collect();
    if hull_idx.len() < 3 {
        return Vec::new();
    }

    let k = hull_idx.len();
    let mut defects = Vec::new();
    for i in 0..k {
        let s = hull_idx[i];
        let e = hull_idx[(i + 1) % k];

        let mut far = None;
        let mut depth = 0.0;
        let mut j = (s + 1) % n;
        while j != e {
            let d = line_distance(contour[j], contour[s], contour[e]);
            if d > depth {
                depth = d;
                far = Some(j);
            }
            j = (j + 1) % n;
        }

        if let Some(f) = far {
            defects.push((s, e, f, depth));
        }
    }
    defects
}

fn cross(o: Point<i32>, a: Point<i32>, b: Point<i32>) -> i64 {
    (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::contour::ContourExtractor;
    use image::{GrayImage, Luma};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    const WHITE: Luma<u8> = Luma([255]);

    fn mask_from(rects: &[Rect]) -> GrayImage {
        let mut mask = GrayImage::new(400, 420);
        for r in rects {
            draw_filled_rect_mut(&mut mask, *r, WHITE);
        }
        mask
    }

    pub(crate) fn fist() -> Vec<Rect> {
        vec![Rect::at(100, 100).of_size(150, 150)]
    }

    /// Two raised fingers over a palm, one deep gap between them.
    pub(crate) fn two_fingers() -> Vec<Rect> {
        vec![
            Rect::at(120, 40).of_size(40, 160),
            Rect::at(240, 40).of_size(40, 160),
            Rect::at(100, 200).of_size(200, 180),
        ]
    }

    /// Three raised fingers, the middle one tallest, two gaps.
    pub(crate) fn three_fingers() -> Vec<Rect> {
        vec![
            Rect::at(100, 100).of_size(40, 100),
            Rect::at(180, 40).of_size(40, 160),
            Rect::at(260, 100).of_size(40, 100),
            Rect::at(100, 200).of_size(200, 180),
        ]
    }

    fn features(rects: &[Rect], config: &GestureConfig) -> Features {
        let contour = ContourExtractor::new(5000.0)
            .extract(&mask_from(rects))
            .unwrap();
        FeatureExtractor::new(config).extract(contour)
    }

    #[test]
    fn solidity_of_empty_hull_is_zero() {
        assert_eq!(solidity(0.0, 0.0), 0.0);
        assert_eq!(solidity(1234.0, 0.0), 0.0);
        assert_eq!(solidity(50.0, 100.0), 0.5);
    }

    #[test]
    fn fist_is_solid_without_defects() {
        let f = features(&fist(), &GestureConfig::default());
        assert_eq!(f.area, 149.0 * 149.0);
        assert!(f.solidity > 0.99);
        assert!(f.extent > 0.98);
        assert_eq!(f.defect_count(), 0);
        assert_eq!(
            f.bbox,
            BoundingBox {
                x: 100,
                y: 100,
                width: 150,
                height: 150
            }
        );
        assert_eq!(f.center, Point::new(175, 175));
    }

    #[test]
    fn two_fingers_have_one_gap() {
        let f = features(&two_fingers(), &GestureConfig::default());
        assert!(f.solidity > 0.7 && f.solidity < 0.8, "solidity {}", f.solidity);
        assert_eq!(f.defect_count(), 1);
        let gap = f.defects[0];
        assert!((gap.far.y - 200).abs() <= 1, "far point {:?}", gap.far);
        assert!(gap.depth > 150.0);
        assert!(gap.angle > 45.0 && gap.angle < 56.0, "angle {}", gap.angle);
    }

    #[test]
    fn three_fingers_have_two_gaps() {
        let f = features(&three_fingers(), &GestureConfig::default());
        assert!(f.solidity > 0.75, "solidity {}", f.solidity);
        assert_eq!(f.defect_count(), 2);
        for gap in &f.defects {
            assert!(gap.depth > 100.0);
            assert!(gap.angle > 33.0 && gap.angle < 45.0, "angle {}", gap.angle);
        }
    }

    #[test]
    fn gaps_low_in_the_box_are_ignored() {
        let config = GestureConfig {
            defect_height_fraction: 0.1,
            ..GestureConfig::default()
        };
        assert_eq!(features(&two_fingers(), &config).defect_count(), 0);
    }

    #[test]
    fn narrow_angle_window_rejects_gap() {
        let config = GestureConfig {
            defect_angle_max: 45.0,
            ..GestureConfig::default()
        };
        assert_eq!(features(&two_fingers(), &config).defect_count(), 0);
    }

    #[test]
    fn shallow_gaps_are_ignored() {
        let config = GestureConfig {
            min_defect_depth: 200.0,
            ..GestureConfig::default()
        };
        assert_eq!(features(&two_fingers(), &config).defect_count(), 0);
    }

    #[test]
    fn small_contours_skip_defect_search() {
        let config = GestureConfig {
            min_hand_area: 1_000_000.0,
            ..GestureConfig::default()
        };
        let f = features(&two_fingers(), &config);
        assert_eq!(f.defect_count(), 0);
        assert!(f.area > 0.0);
    }

    #[test]
    fn degenerate_contour_has_no_defects() {
        let line = vec![Point::new(0, 0), Point::new(5, 0), Point::new(10, 0)];
        assert!(convexity_defects(&line, &line).is_empty());
    }
}
