use imageproc::point::Point;

/// Axis-aligned bounding box in pixel units, inclusive of both edge pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    pub fn center(&self) -> Point<i32> {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// Area enclosed by a closed polygon (shoelace formula), always non-negative.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice as f64).abs() / 2.0
}

/// Smallest upright rectangle holding every point.
pub fn bounding_box(points: &[Point<i32>]) -> BoundingBox {
    let Some(first) = points.first() else {
        return BoundingBox {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        };
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    }
}

pub fn distance(a: Point<i32>, b: Point<i32>) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Perpendicular distance from `p` to the infinite line through `a` and `b`.
/// Falls back to the point distance when `a == b`.
pub fn line_distance(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let len = distance(a, b);
    if len == 0.0 {
        return distance(p, a);
    }
    let cross = (b.x - a.x) as f64 * (p.y - a.y) as f64 - (b.y - a.y) as f64 * (p.x - a.x) as f64;
    cross.abs() / len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point<i32>> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn square_area_either_winding() {
        let cw = pts(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        let mut ccw = cw.clone();
        ccw.reverse();
        assert_eq!(polygon_area(&cw), 100.0);
        assert_eq!(polygon_area(&ccw), 100.0);
    }

    #[test]
    fn degenerate_area_is_zero() {
        assert_eq!(polygon_area(&pts(&[(0, 0), (5, 5)])), 0.0);
        assert_eq!(polygon_area(&pts(&[(0, 0), (5, 0), (10, 0)])), 0.0);
    }

    #[test]
    fn bounding_box_is_inclusive() {
        let bbox = bounding_box(&pts(&[(2, 3), (11, 3), (11, 7), (2, 7)]));
        assert_eq!(
            bbox,
            BoundingBox {
                x: 2,
                y: 3,
                width: 10,
                height: 5
            }
        );
        assert_eq!(bbox.center(), Point::new(7, 5));
    }

    #[test]
    fn line_distance_of_point_above_segment() {
        let d = line_distance(Point::new(5, 4), Point::new(0, 0), Point::new(10, 0));
        assert!((d - 4.0).abs() < 1e-9);
    }
}
