use serde::{Deserialize, Serialize};

use crate::Vector3D;

/// A 3x3 matrix, row-major. Only used for rotations between an object's local frame
/// (tangent, lateral, up) and the world frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mat3 {
    rows: [[f64; 3]; 3],
}

impl Mat3 {
    pub fn identity() -> Mat3 {
        Mat3 {
            rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// The columns are the local axes expressed in world coordinates, so multiplying a local
    /// vector gives the world vector.
    pub fn from_basis(tangent: Vector3D, lateral: Vector3D, up: Vector3D) -> Mat3 {
        Mat3 {
            rows: [
                [tangent.i, lateral.i, up.i],
                [tangent.j, lateral.j, up.j],
                [tangent.k, lateral.k, up.k],
            ],
        }
    }

    pub fn transpose(&self) -> Mat3 {
        let r = &self.rows;
        Mat3 {
            rows: [
                [r[0][0], r[1][0], r[2][0]],
                [r[0][1], r[1][1], r[2][1]],
                [r[0][2], r[1][2], r[2][2]],
            ],
        }
    }

    pub fn mul(&self, other: &Mat3) -> Mat3 {
        let mut rows = [[0.0; 3]; 3];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.rows[r][k] * other.rows[k][c]).sum();
            }
        }
        Mat3 { rows }
    }

    pub fn apply(&self, v: Vector3D) -> Vector3D {
        let r = &self.rows;
        Vector3D::new(
            r[0][0] * v.i + r[0][1] * v.j + r[0][2] * v.k,
            r[1][0] * v.i + r[1][1] * v.j + r[1][2] * v.k,
            r[2][0] * v.i + r[2][1] * v.j + r[2][2] * v.k,
        )
    }

    /// Rotation about the up axis.
    pub fn yaw(radians: f64) -> Mat3 {
        let (sin, cos) = radians.sin_cos();
        Mat3 {
            rows: [[cos, -sin, 0.0], [sin, cos, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    pub fn column(&self, idx: usize) -> Vector3D {
        Vector3D::new(self.rows[0][idx], self.rows[1][idx], self.rows[2][idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vector3D, b: Vector3D) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn basis_round_trip() {
        let tangent = Vector3D::new(0.0, 1.0, 0.0);
        let lateral = Vector3D::new(1.0, 0.0, 0.0);
        let m = Mat3::from_basis(tangent, lateral, Vector3D::new(0.0, 0.0, -1.0));
        let local = Vector3D::new(2.0, 3.0, 4.0);
        let world = m.apply(local);
        assert!(close(m.transpose().apply(world), local));
        assert!(close(m.mul(&m.transpose()).apply(local), local));
    }

    #[test]
    fn yaw_quarter_turn() {
        let m = Mat3::yaw(std::f64::consts::FRAC_PI_2);
        assert!(close(
            m.apply(Vector3D::new(1.0, 0.0, 0.0)),
            Vector3D::new(0.0, 1.0, 0.0)
        ));
    }
}
