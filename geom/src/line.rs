use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Pt2D};

/// A line segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

impl Line {
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Line {
        Line(pt1, pt2)
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn length(&self) -> Distance {
        self.pt1().dist_to(self.pt2())
    }

    pub fn angle(&self) -> Angle {
        self.pt1().angle_to(self.pt2())
    }

    /// Projects `pt` onto the infinite line through this segment. Returns the parametric
    /// position (0 at pt1, 1 at pt2, unclamped) and the signed perpendicular distance, positive
    /// to the right of the direction pt1 -> pt2. None for a zero-length segment.
    pub fn project(&self, pt: Pt2D) -> Option<(f64, f64)> {
        let dx = self.1.x() - self.0.x();
        let dy = self.1.y() - self.0.y();
        let len_sq = dx * dx + dy * dy;
        if len_sq < 1e-12 {
            return None;
        }
        let px = pt.x() - self.0.x();
        let py = pt.y() - self.0.y();
        let t = (px * dx + py * dy) / len_sq;
        // Cross product sign: negative means pt is to the left.
        let right = (px * dy - py * dx) / len_sq.sqrt();
        Some((t, right))
    }

    /// The point `percent` of the way along, unclamped.
    pub fn percent_along(&self, percent: f64) -> Pt2D {
        Pt2D::new(
            self.0.x() + percent * (self.1.x() - self.0.x()),
            self.0.y() + percent * (self.1.y() - self.0.y()),
        )
    }

    pub fn intersects(&self, other: &Line) -> bool {
        // From http://bryceboe.com/2006/10/23/line-segment-intersection-algorithm/
        is_counter_clockwise(self.pt1(), other.pt1(), other.pt2())
            != is_counter_clockwise(self.pt2(), other.pt1(), other.pt2())
            && is_counter_clockwise(self.pt1(), self.pt2(), other.pt1())
                != is_counter_clockwise(self.pt1(), self.pt2(), other.pt2())
    }
}

fn is_counter_clockwise(pt1: Pt2D, pt2: Pt2D, pt3: Pt2D) -> bool {
    (pt3.y() - pt1.y()) * (pt2.x() - pt1.x()) > (pt2.y() - pt1.y()) * (pt3.x() - pt1.x())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_right_is_positive() {
        let l = Line::new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let (t, right) = l.project(Pt2D::new(5.0, -2.0)).unwrap();
        assert!((t - 0.5).abs() < 1e-12);
        assert!((right - 2.0).abs() < 1e-12);
        let (_, left) = l.project(Pt2D::new(5.0, 3.0)).unwrap();
        assert!((left + 3.0).abs() < 1e-12);
    }

    #[test]
    fn crossing_segments() {
        let a = Line::new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 10.0));
        let b = Line::new(Pt2D::new(0.0, 10.0), Pt2D::new(10.0, 0.0));
        let c = Line::new(Pt2D::new(20.0, 0.0), Pt2D::new(30.0, 0.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
