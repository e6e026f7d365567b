use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Vector3D};

/// A point on the ground plane. Used for bounding boxes, intersection borders and corridors,
/// which don't carry their own elevation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Pt2D {
    x: f64,
    y: f64,
}

impl Pt2D {
    pub fn new(x: f64, y: f64) -> Pt2D {
        if !x.is_finite() || !y.is_finite() {
            panic!("Bad Pt2D {}, {}", x, y);
        }
        Pt2D { x, y }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn dist_to(self, to: Pt2D) -> Distance {
        Distance::meters(((self.x - to.x).powi(2) + (self.y - to.y).powi(2)).sqrt())
    }

    pub fn raw_dist_to(self, to: Pt2D) -> f64 {
        ((self.x - to.x).powi(2) + (self.y - to.y).powi(2)).sqrt()
    }

    pub fn angle_to(self, to: Pt2D) -> Angle {
        Angle::radians((to.y - self.y).atan2(to.x - self.x))
    }

    pub fn offset(self, dx: f64, dy: f64) -> Pt2D {
        Pt2D::new(self.x + dx, self.y + dy)
    }

    pub fn to_3d(self, z: f64) -> Pt3D {
        Pt3D::new(self.x, self.y, z)
    }
}

impl fmt::Display for Pt2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt2D({0}, {1})", self.x, self.y)
    }
}

/// A point in world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Pt3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Pt3D {
    pub fn new(x: f64, y: f64, z: f64) -> Pt3D {
        Pt3D { x, y, z }
    }

    pub fn to_2d(self) -> Pt2D {
        Pt2D::new(self.x, self.y)
    }

    pub fn dist_to(self, other: Pt3D) -> f64 {
        (other - self).length()
    }

    pub fn dist_xy(self, other: Pt3D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn offset(self, v: Vector3D) -> Pt3D {
        Pt3D::new(self.x + v.i, self.y + v.j, self.z + v.k)
    }

    /// Linear interpolation; percent 0 is self, 1 is other.
    pub fn lerp(self, other: Pt3D, percent: f64) -> Pt3D {
        Pt3D::new(
            self.x + (other.x - self.x) * percent,
            self.y + (other.y - self.y) * percent,
            self.z + (other.z - self.z) * percent,
        )
    }

    pub fn approx_eq(self, other: Pt3D, threshold: f64) -> bool {
        self.dist_to(other) <= threshold
    }
}

impl std::ops::Sub for Pt3D {
    type Output = Vector3D;

    fn sub(self, other: Pt3D) -> Vector3D {
        Vector3D::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl fmt::Display for Pt3D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt3D({}, {}, {})", self.x, self.y, self.z)
    }
}
