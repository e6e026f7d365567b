use serde::{Deserialize, Serialize};

use crate::{Pt2D, Pt3D, Vector3D};

/// One segment of a centerline spline, between control point `i` and `i + 1`. Each axis is
/// `A*t^3 + B*t^2 + C*t + D`, where `t` is the local parameter in [0, 1], not a distance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct HermiteCubic {
    pub a: Vector3D,
    pub b: Vector3D,
    pub c: Vector3D,
    pub d: Vector3D,
}

impl HermiteCubic {
    /// Builds the cubic through `p0` and `p1` with endpoint derivatives `m0` and `m1`. The
    /// derivatives are per unit of `t`, so callers scale unit tangents by the chord length.
    pub fn new(p0: Pt3D, p1: Pt3D, m0: Vector3D, m1: Vector3D) -> HermiteCubic {
        let p0 = Vector3D::new(p0.x, p0.y, p0.z);
        let p1 = Vector3D::new(p1.x, p1.y, p1.z);
        HermiteCubic {
            a: p0 * 2.0 - p1 * 2.0 + m0 + m1,
            b: p0 * -3.0 + p1 * 3.0 - m0 * 2.0 - m1,
            c: m0,
            d: p0,
        }
    }

    /// A straight segment, traversed at constant speed.
    pub fn linear(p0: Pt3D, p1: Pt3D) -> HermiteCubic {
        let delta = p1 - p0;
        HermiteCubic::new(p0, p1, delta, delta)
    }

    pub fn position(&self, t: f64) -> Pt3D {
        let v = ((self.a * t + self.b) * t + self.c) * t + self.d;
        Pt3D::new(v.i, v.j, v.k)
    }

    /// dP/dt
    pub fn derivative(&self, t: f64) -> Vector3D {
        (self.a * (3.0 * t) + self.b * 2.0) * t + self.c
    }

    /// The unit tangent. A zero-length derivative substitutes `fallback`, which callers take
    /// from the previous valid vector.
    pub fn tangent(&self, t: f64, fallback: Vector3D) -> Vector3D {
        self.derivative(t).normalized_or(fallback)
    }

    /// The unit vector pointing to the right of travel, parallel to the ground plane.
    pub fn right(&self, t: f64, fallback: Vector3D) -> Vector3D {
        let tangent = self.tangent(t, Vector3D::UP.cross(fallback));
        tangent.cross(Vector3D::UP).normalized_or(fallback)
    }

    /// The unit surface normal, perpendicular to both the tangent and the right vector.
    pub fn normal(&self, t: f64, fallback: Vector3D) -> Vector3D {
        let tangent = self.derivative(t);
        let right = tangent.cross(Vector3D::UP);
        right.cross(tangent).normalized_or(fallback)
    }

    /// Arc length of the whole segment by 3-point Simpson quadrature of the speed |P'(t)|.
    pub fn arc_length(&self) -> f64 {
        let speed = |t: f64| self.derivative(t).length();
        (speed(0.0) + 4.0 * speed(0.5) + speed(1.0)) / 6.0
    }

    /// The straight-line distance between the endpoints.
    pub fn chord_length(&self) -> f64 {
        self.position(0.0).dist_to(self.position(1.0))
    }
}

/// Fits a circle through a small neighbourhood of points (algebraic least squares) and returns
/// its radius. Straight or degenerate neighbourhoods return infinity.
pub fn fit_radius(pts: &[Pt2D]) -> f64 {
    if pts.len() < 3 {
        return f64::INFINITY;
    }
    let n = pts.len() as f64;
    let mean_x = pts.iter().map(|pt| pt.x()).sum::<f64>() / n;
    let mean_y = pts.iter().map(|pt| pt.y()).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy, mut sxz, mut syz, mut sz) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    for pt in pts {
        let x = pt.x() - mean_x;
        let y = pt.y() - mean_y;
        let z = x * x + y * y;
        sxx += x * x;
        syy += y * y;
        sxy += x * y;
        sxz += x * z;
        syz += y * z;
        sz += z;
    }

    let det = sxx * syy - sxy * sxy;
    let scale = (sxx + syy).powi(2);
    if scale == 0.0 || det.abs() <= 1e-10 * scale {
        return f64::INFINITY;
    }
    // x^2 + y^2 + D*x + E*y + F = 0, and centering makes sum(x) = sum(y) = 0.
    let d = (-sxz * syy + syz * sxy) / det;
    let e = (-syz * sxx + sxz * sxy) / det;
    let f = -sz / n;
    let r_sq = (d * d + e * e) / 4.0 - f;
    if r_sq <= 0.0 {
        return f64::INFINITY;
    }
    r_sq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn endpoints_and_derivatives() {
        let p0 = Pt3D::new(0.0, 0.0, 1.0);
        let p1 = Pt3D::new(10.0, 5.0, 2.0);
        let m0 = Vector3D::new(12.0, 0.0, 0.0);
        let m1 = Vector3D::new(0.0, 12.0, 0.0);
        let h = HermiteCubic::new(p0, p1, m0, m1);
        assert!(h.position(0.0).approx_eq(p0, 1e-9));
        assert!(h.position(1.0).approx_eq(p1, 1e-9));
        assert!((h.derivative(0.0) - m0).length() < 1e-9);
        assert!((h.derivative(1.0) - m1).length() < 1e-9);
    }

    #[test]
    fn straight_segment_lengths_agree() {
        let h = HermiteCubic::linear(Pt3D::new(0.0, 0.0, 0.0), Pt3D::new(300.0, 400.0, 0.0));
        assert!(close(h.arc_length(), 500.0, 1e-9));
        assert!(close(h.chord_length(), 500.0, 1e-9));
        let right = h.right(0.5, Vector3D::default());
        assert!(close(right.i, 0.8, 1e-9) && close(right.j, -0.6, 1e-9));
        assert!((h.normal(0.3, Vector3D::default()) - Vector3D::UP).length() < 1e-9);
    }

    #[test]
    fn degenerate_segment_uses_fallback() {
        let pt = Pt3D::new(1.0, 1.0, 0.0);
        let h = HermiteCubic::new(pt, pt, Vector3D::default(), Vector3D::default());
        let fallback = Vector3D::new(0.0, 1.0, 0.0);
        assert_eq!(h.tangent(0.5, fallback), fallback);
    }

    #[test]
    fn fit_radius_on_circle() {
        let mut rng = XorShiftRng::seed_from_u64(42);
        for _ in 0..20 {
            let radius = rng.gen_range(10.0..500.0);
            let start = rng.gen_range(0.0..6.0);
            let pts: Vec<Pt2D> = (0..5)
                .map(|i| {
                    let theta: f64 = start + 0.05 * i as f64;
                    Pt2D::new(100.0 + radius * theta.cos(), -50.0 + radius * theta.sin())
                })
                .collect();
            assert!(close(fit_radius(&pts), radius, radius * 1e-6));
        }
    }

    #[test]
    fn fit_radius_straight() {
        let pts: Vec<Pt2D> = (0..5).map(|i| Pt2D::new(i as f64 * 3.0, 7.0)).collect();
        assert!(fit_radius(&pts).is_infinite());
    }
}
