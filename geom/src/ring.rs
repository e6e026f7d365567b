use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Bounds, Pt2D};

/// A closed, possibly non-convex outline, like an intersection's border.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    // first equals last
    pts: Vec<Pt2D>,
}

impl Ring {
    /// The points don't need to repeat the first point at the end; that's added if needed.
    pub fn new(mut pts: Vec<Pt2D>) -> Option<Ring> {
        if pts.len() < 3 {
            return None;
        }
        if pts[0] != *pts.last().unwrap() {
            pts.push(pts[0]);
        }
        if pts.len() < 4 || pts.windows(2).any(|pair| pair[0] == pair[1]) {
            return None;
        }
        Some(Ring { pts })
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.pts
    }

    /// Even-odd rule, so concave outlines work.
    pub fn contains_pt(&self, pt: Pt2D) -> bool {
        let mut inside = false;
        for pair in self.pts.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if (a.y() > pt.y()) != (b.y() > pt.y()) {
                let x_cross = a.x() + (pt.y() - a.y()) / (b.y() - a.y()) * (b.x() - a.x());
                if pt.x() < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    pub fn get_bounds(&self) -> Bounds {
        Bounds::from(&self.pts)
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Ring::new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  Pt2D::new({}, {}),", pt.x(), pt.y())?;
        }
        write!(f, "])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concave_outline() {
        // An L shape
        let ring = Ring::new(vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(10.0, 0.0),
            Pt2D::new(10.0, 4.0),
            Pt2D::new(4.0, 4.0),
            Pt2D::new(4.0, 10.0),
            Pt2D::new(0.0, 10.0),
        ])
        .unwrap();
        assert!(ring.contains_pt(Pt2D::new(2.0, 8.0)));
        assert!(ring.contains_pt(Pt2D::new(8.0, 2.0)));
        assert!(!ring.contains_pt(Pt2D::new(8.0, 8.0)));
        assert!(!ring.contains_pt(Pt2D::new(-1.0, 2.0)));
    }

    #[test]
    fn too_few_points() {
        assert!(Ring::new(vec![Pt2D::new(0.0, 0.0), Pt2D::new(1.0, 0.0)]).is_none());
    }
}
