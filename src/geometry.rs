use serde::{Deserialize, Serialize};

/// 2-D point in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(a: Point, b: Point) -> Point {
        Point {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
        }
    }
}

/// Unsigned angle in degrees at vertex `p2` between the rays to `p1` and `p3`,
/// normalized into [0, 180]. Returns `None` when either ray has zero length.
pub fn angle_between(p1: Point, p2: Point, p3: Point) -> Option<f64> {
    let (v1x, v1y) = (p1.x - p2.x, p1.y - p2.y);
    let (v2x, v2y) = (p3.x - p2.x, p3.y - p2.y);

    if (v1x == 0.0 && v1y == 0.0) || (v2x == 0.0 && v2y == 0.0) {
        return None;
    }

    let radians = (v2y).atan2(v2x) - (v1y).atan2(v1x);
    let angle = radians.to_degrees().abs();

    // Reflect reflex angles back into [0, 180]
    Some(if angle > 180.0 { 360.0 - angle } else { angle })
}

/// Dot-product/arc-cosine form of [`angle_between`]. Agrees with the atan2
/// form after normalization; the bent-knee checks use this form.
pub fn angle_between_acos(p1: Point, p2: Point, p3: Point) -> Option<f64> {
    let (v1x, v1y) = (p1.x - p2.x, p1.y - p2.y);
    let (v2x, v2y) = (p3.x - p2.x, p3.y - p2.y);

    let m1 = (v1x * v1x + v1y * v1y).sqrt();
    let m2 = (v2x * v2x + v2y * v2y).sqrt();
    if m1 == 0.0 || m2 == 0.0 {
        return None;
    }

    let cos = ((v1x * v2x + v1y * v2y) / (m1 * m2)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}
