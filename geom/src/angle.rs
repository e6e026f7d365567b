use std::fmt;

use serde::{Deserialize, Serialize};

/// An angle, stored in radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn radians(rads: f64) -> Angle {
        Angle(rads)
    }

    pub fn degrees(degs: f64) -> Angle {
        Angle(degs.to_radians())
    }

    pub fn opposite(self) -> Angle {
        Angle(self.0 + std::f64::consts::PI)
    }

    /// [0, 2pi)
    pub fn normalized_radians(self) -> f64 {
        let tau = 2.0 * std::f64::consts::PI;
        let x = self.0 % tau;
        if x < 0.0 {
            x + tau
        } else {
            x
        }
    }

    /// [0, 360)
    pub fn normalized_degrees(self) -> f64 {
        self.normalized_radians().to_degrees()
    }

    /// The signed turn from self to other, in (-180, 180] degrees. Positive is counter-clockwise,
    /// which is a left turn when y points north.
    pub fn simple_shortest_rotation_towards(self, other: Angle) -> f64 {
        let delta = other.normalized_degrees() - self.normalized_degrees();
        if delta > 180.0 {
            delta - 360.0
        } else if delta <= -180.0 {
            delta + 360.0
        } else {
            delta
        }
    }

    /// True if the two angles are within `within_degrees` of each other, in either direction.
    pub fn approx_eq(self, other: Angle, within_degrees: f64) -> bool {
        self.simple_shortest_rotation_towards(other).abs() < within_degrees
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Angle({} degrees)", self.normalized_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortest_rotation() {
        let east = Angle::degrees(0.0);
        assert!((east.simple_shortest_rotation_towards(Angle::degrees(90.0)) - 90.0).abs() < 1e-9);
        assert!(
            (east.simple_shortest_rotation_towards(Angle::degrees(270.0)) + 90.0).abs() < 1e-9
        );
        assert!(
            (Angle::degrees(350.0).simple_shortest_rotation_towards(Angle::degrees(10.0)) - 20.0)
                .abs()
                < 1e-9
        );
    }
}
