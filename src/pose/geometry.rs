//! Joint angle at a vertex from three landmarks.

use super::Keypoint;

/// Interior angle at `b` formed by `a`-`b`-`c`, in degrees within [0, 180].
///
/// Uses the difference of the two arctangents, so the result does not depend
/// on which side of `b` the points are listed.
pub fn angle_at(a: &Keypoint, b: &Keypoint, c: &Keypoint) -> f32 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let angle = radians.to_degrees().abs();

    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::KeypointName;

    fn point(x: f32, y: f32) -> Keypoint {
        Keypoint::new(KeypointName::LeftKnee, x, y, 1.0)
    }

    #[test]
    fn test_straight_line() {
        let angle = angle_at(&point(0.0, 0.0), &point(0.5, 0.0), &point(1.0, 0.0));
        assert!((angle - 180.0).abs() < 0.01);
    }

    #[test]
    fn test_right_angle() {
        let angle = angle_at(&point(0.0, 0.0), &point(10.0, 0.0), &point(10.0, 10.0));
        assert!((angle - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_reflex_is_folded() {
        // atan2 difference of -270 degrees folds back to 90
        let angle = angle_at(&point(-10.0, 10.0), &point(0.0, 0.0), &point(-10.0, -10.0));
        assert!((angle - 90.0).abs() < 0.01);
        let swapped = angle_at(&point(-10.0, -10.0), &point(0.0, 0.0), &point(-10.0, 10.0));
        assert!((swapped - angle).abs() < 0.01);
    }
}
