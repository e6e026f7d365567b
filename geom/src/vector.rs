use std::{fmt, ops};

use serde::{Deserialize, Serialize};

use crate::Angle;

/// A direction or displacement in world space. Tangents, right vectors and normals are stored as
/// unit vectors; nothing here enforces that, so callers normalize.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Vector3D {
    pub i: f64,
    pub j: f64,
    pub k: f64,
}

/// Vectors shorter than this can't be normalized.
const DEGENERATE_LENGTH: f64 = 1e-9;

impl Vector3D {
    pub const UP: Vector3D = Vector3D {
        i: 0.0,
        j: 0.0,
        k: 1.0,
    };

    pub fn new(i: f64, j: f64, k: f64) -> Vector3D {
        Vector3D { i, j, k }
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn dot(self, other: Vector3D) -> f64 {
        self.i * other.i + self.j * other.j + self.k * other.k
    }

    pub fn cross(self, other: Vector3D) -> Vector3D {
        Vector3D::new(
            self.j * other.k - self.k * other.j,
            self.k * other.i - self.i * other.k,
            self.i * other.j - self.j * other.i,
        )
    }

    /// None if the vector is too short to have a direction.
    pub fn normalized(self) -> Option<Vector3D> {
        let len = self.length();
        if len < DEGENERATE_LENGTH || !len.is_finite() {
            return None;
        }
        Some(self * (1.0 / len))
    }

    /// Like `normalized`, but substitutes `fallback` for a degenerate vector.
    pub fn normalized_or(self, fallback: Vector3D) -> Vector3D {
        match self.normalized() {
            Some(v) => v,
            None => {
                debug!("Degenerate vector {}, substituting {}", self, fallback);
                fallback
            }
        }
    }

    /// The heading of the xy projection.
    pub fn angle_xy(self) -> Angle {
        Angle::radians(self.j.atan2(self.i))
    }

    /// Rotated 90 degrees clockwise in the xy plane, so a tangent becomes the right vector.
    pub fn right_xy(self) -> Vector3D {
        Vector3D::new(self.j, -self.i, 0.0)
    }

    pub fn flatten(self) -> Vector3D {
        Vector3D::new(self.i, self.j, 0.0)
    }
}

impl ops::Add for Vector3D {
    type Output = Vector3D;

    fn add(self, other: Vector3D) -> Vector3D {
        Vector3D::new(self.i + other.i, self.j + other.j, self.k + other.k)
    }
}

impl ops::Sub for Vector3D {
    type Output = Vector3D;

    fn sub(self, other: Vector3D) -> Vector3D {
        Vector3D::new(self.i - other.i, self.j - other.j, self.k - other.k)
    }
}

impl ops::Mul<f64> for Vector3D {
    type Output = Vector3D;

    fn mul(self, scalar: f64) -> Vector3D {
        Vector3D::new(self.i * scalar, self.j * scalar, self.k * scalar)
    }
}

impl ops::Neg for Vector3D {
    type Output = Vector3D;

    fn neg(self) -> Vector3D {
        Vector3D::new(-self.i, -self.j, -self.k)
    }
}

impl fmt::Display for Vector3D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Vector3D({}, {}, {})", self.i, self.j, self.k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_of_east_is_south() {
        let east = Vector3D::new(1.0, 0.0, 0.0);
        assert_eq!(east.right_xy(), Vector3D::new(0.0, -1.0, 0.0));
        // right x tangent points up
        assert_eq!(east.right_xy().cross(east), Vector3D::UP);
    }

    #[test]
    fn degenerate_normalize() {
        assert!(Vector3D::new(0.0, 0.0, 0.0).normalized().is_none());
        let fallback = Vector3D::new(0.0, 1.0, 0.0);
        assert_eq!(Vector3D::default().normalized_or(fallback), fallback);
    }
}
