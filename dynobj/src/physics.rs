use geom::{Mat3, Vector3D};
use roadnet::TerrainCode;

use crate::{Pose, TerrainSource};

/// What a rigid-body engine needs to know about a free-moving object, and what it hands back.
/// The pose is at the bottom of the body, where it touches the ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidBody {
    pub pose: Pose,
    /// World frame.
    pub velocity: Vector3D,
    /// World frame, radians per second about each axis.
    pub angular: Vector3D,
    pub mass: f64,
    /// Length, width and height.
    pub size: Vector3D,
    /// Fraction of horizontal speed lost per second on the ground.
    pub friction: f64,
    /// Fraction of vertical speed kept after hitting the ground.
    pub bounce: f64,
}

/// Advances free-moving bodies. The trajectory follower only decides when a body goes free and
/// where it starts; everything after that belongs to the stepper.
pub trait RigidBodyStepper {
    fn step(&self, body: &RigidBody, terrain: &dyn TerrainSource, dt: f64) -> RigidBody;
}

/// Gravity, a bounce off the ground, and sliding friction. Only spins about the vertical, and
/// ignores mass and shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BallisticStepper {
    pub gravity: f64,
}

impl Default for BallisticStepper {
    fn default() -> BallisticStepper {
        BallisticStepper { gravity: 9.81 }
    }
}

impl RigidBodyStepper for BallisticStepper {
    fn step(&self, body: &RigidBody, terrain: &dyn TerrainSource, dt: f64) -> RigidBody {
        let mut velocity = body.velocity;
        velocity.k -= self.gravity * dt;
        let mut position = body.pose.position.offset(velocity * dt);
        let basis = Mat3::yaw(body.angular.k * dt).mul(&body.pose.basis());
        let mut angular = body.angular;

        // Off the network there's nothing to land on
        let ground = terrain.qry_terrain(position.to_2d(), position.z);
        if ground.code != TerrainCode::OffNetwork && position.z < ground.z {
            position.z = ground.z;
            if velocity.k < 0.0 {
                velocity.k *= -body.bounce;
            }
            let keep = (1.0 - body.friction * dt).max(0.0);
            velocity.i *= keep;
            velocity.j *= keep;
            angular = angular * keep;
        }

        RigidBody {
            pose: Pose::from_basis(position, &basis),
            velocity,
            angular,
            ..*body
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlatTerrain;
    use geom::Pt3D;

    fn test_body(pose: Pose, velocity: Vector3D, angular: Vector3D) -> RigidBody {
        RigidBody {
            pose,
            velocity,
            angular,
            mass: 100.0,
            size: Vector3D::new(1.0, 1.0, 1.0),
            friction: 0.5,
            bounce: 0.3,
        }
    }

    #[test]
    fn falls_then_rests_on_the_ground() {
        let stepper = BallisticStepper::default();
        let ground = FlatTerrain { z: 2.0 };
        let mut body = test_body(
            Pose::level(Pt3D::new(0.0, 0.0, 20.0), Vector3D::new(1.0, 0.0, 0.0)),
            Vector3D::new(3.0, 0.0, 0.0),
            Vector3D::default(),
        );
        let mut lowest = f64::MAX;
        for _ in 0..2000 {
            body = stepper.step(&body, &ground, 0.01);
            lowest = lowest.min(body.pose.position.z);
        }
        assert!(lowest >= 2.0 - 1e-9);
        assert!((body.pose.position.z - 2.0).abs() < 0.01);
        assert!(body.pose.position.x > 3.0);
        // Friction has nearly stopped it
        assert!(body.velocity.i < 0.1);
    }

    #[test]
    fn spins_about_the_vertical() {
        let stepper = BallisticStepper::default();
        let body = test_body(
            Pose::level(Pt3D::new(0.0, 0.0, 100.0), Vector3D::new(1.0, 0.0, 0.0)),
            Vector3D::default(),
            Vector3D::new(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );
        let after = stepper.step(&body, &FlatTerrain { z: 0.0 }, 1.0);
        assert!((after.pose.tangent - Vector3D::new(0.0, 1.0, 0.0)).length() < 1e-9);
        assert!((after.pose.up() - Vector3D::UP).length() < 1e-9);
    }
}
