//! Collision predicates
//!
//! Everything in the game is a circle test: laser tips against entity
//! centers, body overlap between circles, and lightning polylines sampled
//! point-by-point against the rocket's hit circle.

use glam::Vec2;

/// True if `point` lies strictly inside the circle at `center`
#[inline]
pub fn circle_contains(center: Vec2, radius: f32, point: Vec2) -> bool {
    center.distance(point) < radius
}

/// True if two circles overlap
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}

/// True if any vertex of `path` falls inside the circle at `center`
///
/// Lightning bolts are jittered polylines with segments much shorter than
/// the rocket's hit radius, so sampling vertices is sufficient.
pub fn polyline_hits_circle(path: &[Vec2], center: Vec2, radius: f32) -> bool {
    path.iter().any(|&p| circle_contains(center, radius, p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_contains() {
        let center = Vec2::new(100.0, 100.0);
        assert!(circle_contains(center, 20.0, Vec2::new(110.0, 100.0)));
        assert!(!circle_contains(center, 20.0, Vec2::new(121.0, 100.0)));
        // Boundary is exclusive
        assert!(!circle_contains(center, 20.0, Vec2::new(120.0, 100.0)));
    }

    #[test]
    fn test_circles_overlap() {
        let a = Vec2::new(0.0, 0.0);
        assert!(circles_overlap(a, 10.0, Vec2::new(15.0, 0.0), 10.0));
        assert!(!circles_overlap(a, 10.0, Vec2::new(25.0, 0.0), 10.0));
    }

    #[test]
    fn test_polyline_hits_circle() {
        let path = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, 50.0),
            Vec2::new(100.0, 100.0),
        ];
        assert!(polyline_hits_circle(&path, Vec2::new(52.0, 48.0), 5.0));
        assert!(!polyline_hits_circle(&path, Vec2::new(200.0, 0.0), 5.0));
        assert!(!polyline_hits_circle(&[], Vec2::ZERO, 100.0));
    }
}
