use std::fmt;

use serde::{Deserialize, Serialize};

use geom::{Mat3, Pt3D, Vector3D};
use lri::ObjectKind;
use roadnet::{Path, RoadPos};

use crate::DynObjID;

/// Where an object is and which way it faces. `tangent` points forward and `lateral` to the
/// right; both are unit vectors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Pt3D,
    pub tangent: Vector3D,
    pub lateral: Vector3D,
}

impl Pose {
    /// Level, facing along `tangent`'s heading.
    pub fn level(position: Pt3D, tangent: Vector3D) -> Pose {
        let tangent = tangent.flatten().normalized_or(Vector3D::new(1.0, 0.0, 0.0));
        Pose {
            position,
            tangent,
            lateral: tangent.right_xy(),
        }
    }

    pub fn up(&self) -> Vector3D {
        self.lateral.cross(self.tangent)
    }

    /// Local (forward, right, up) to world.
    pub fn basis(&self) -> Mat3 {
        Mat3::from_basis(self.tangent, self.lateral, self.up())
    }

    pub fn from_basis(position: Pt3D, basis: &Mat3) -> Pose {
        Pose {
            position,
            tangent: basis.column(0),
            lateral: basis.column(1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FollowerMode {
    /// Driven along the ground, kept on the terrain.
    #[default]
    GroundTraj,
    /// Handed to the rigid-body stepper.
    FreeMotion,
    /// Rigidly attached to a parent object.
    CoupledObj,
    /// Following a trajectory expressed in a parent object's frame.
    ObjRelTraj,
    DiGuy,
    DiGuyGuideControl,
    DiGuyDirControl,
}

impl FollowerMode {
    pub(crate) fn keeps_to_ground(self) -> bool {
        matches!(
            self,
            FollowerMode::GroundTraj
                | FollowerMode::DiGuy
                | FollowerMode::DiGuyGuideControl
                | FollowerMode::DiGuyDirControl
        )
    }

    pub fn is_attached(self) -> bool {
        matches!(self, FollowerMode::CoupledObj | FollowerMode::ObjRelTraj)
    }
}

/// Absolute starting values for free motion, used instead of the follower's current motion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FreeInit {
    pub pose: Pose,
    pub velocity: Vector3D,
    pub angular: Vector3D,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajFollowerState {
    pub prev_mode: FollowerMode,
    pub mode: FollowerMode,
    /// A requested mode change. Stays here until the transition can happen.
    pub pending: Option<FollowerMode>,
    /// Set on a frame where the pending transition had to wait.
    pub no_transition: bool,
    pub pose: Pose,
    /// Along the tangent, on the ground or along a relative trajectory.
    pub speed: f64,
    /// World frame, in free motion.
    pub velocity: Vector3D,
    pub angular: Vector3D,
    pub free_init: Option<FreeInit>,
    pub parent: Option<DynObjID>,
    /// Position in the parent's frame.
    pub rel_offset: Vector3D,
    /// Orientation in the parent's frame, fixed when attaching.
    pub rel_rotation: Option<Mat3>,
    /// Direction of the relative trajectory in the parent's frame, once known.
    pub rel_tangent: Option<Vector3D>,
}

impl TrajFollowerState {
    pub fn new(pose: Pose) -> TrajFollowerState {
        TrajFollowerState {
            prev_mode: FollowerMode::GroundTraj,
            mode: FollowerMode::GroundTraj,
            pending: None,
            no_transition: false,
            pose,
            speed: 0.0,
            velocity: Vector3D::default(),
            angular: Vector3D::default(),
            free_init: None,
            parent: None,
            rel_offset: Vector3D::default(),
            rel_rotation: None,
            rel_tangent: None,
        }
    }

    /// World velocity, however the follower is currently moving.
    pub fn world_velocity(&self) -> Vector3D {
        if self.mode == FollowerMode::FreeMotion {
            self.velocity
        } else {
            self.pose.tangent * self.speed
        }
    }
}

/// Drives along a path on the network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub pos: RoadPos,
    pub path: Path,
    pub pose: Pose,
    pub speed: f64,
    pub target_speed: f64,
    pub max_accel: f64,
    pub max_decel: f64,
    /// Stuck at the end of the network, or somewhere the path doesn't go.
    pub stalled: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalkerState {
    pub pose: Pose,
    pub speed: f64,
    /// Where the walker wants to go, in the xy plane.
    pub heading: Vector3D,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightPhase {
    Green,
    Yellow,
    Red,
}

impl LightPhase {
    pub fn next(self) -> LightPhase {
        match self {
            LightPhase::Green => LightPhase::Yellow,
            LightPhase::Yellow => LightPhase::Red,
            LightPhase::Red => LightPhase::Green,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrafficLightState {
    pub pose: Pose,
    pub phase: LightPhase,
    /// Seconds spent in the current phase.
    pub elapsed: f64,
    pub green: f64,
    pub yellow: f64,
    pub red: f64,
}

impl TrafficLightState {
    pub fn new(pose: Pose) -> TrafficLightState {
        TrafficLightState {
            pose,
            phase: LightPhase::Red,
            elapsed: 0.0,
            green: 30.0,
            yellow: 5.0,
            red: 35.0,
        }
    }

    pub fn duration(&self, phase: LightPhase) -> f64 {
        match phase {
            LightPhase::Green => self.green,
            LightPhase::Yellow => self.yellow,
            LightPhase::Red => self.red,
        }
    }
}

/// Signs and obstacles don't move.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaticState {
    pub pose: Pose,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct CoordinatorState {
    pub members: Vec<DynObjID>,
}

/// One object's state for one frame. The variant always matches the object's `ObjectKind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ObjState {
    TrajFollower(TrajFollowerState),
    Vehicle(VehicleState),
    Walker(WalkerState),
    TrafficLight(TrafficLightState),
    TrafficSign(StaticState),
    Obstacle(StaticState),
    Coordinator(CoordinatorState),
}

impl ObjState {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjState::TrajFollower(_) => ObjectKind::TrajFollower,
            ObjState::Vehicle(_) => ObjectKind::Vehicle,
            ObjState::Walker(_) => ObjectKind::Walker,
            ObjState::TrafficLight(_) => ObjectKind::TrafficLight,
            ObjState::TrafficSign(_) => ObjectKind::TrafficSign,
            ObjState::Obstacle(_) => ObjectKind::Obstacle,
            ObjState::Coordinator(_) => ObjectKind::Coordinator,
        }
    }

    /// Coordinators have no place in the world.
    pub fn pose(&self) -> Option<&Pose> {
        match self {
            ObjState::TrajFollower(s) => Some(&s.pose),
            ObjState::Vehicle(s) => Some(&s.pose),
            ObjState::Walker(s) => Some(&s.pose),
            ObjState::TrafficLight(s) => Some(&s.pose),
            ObjState::TrafficSign(s) | ObjState::Obstacle(s) => Some(&s.pose),
            ObjState::Coordinator(_) => None,
        }
    }

    pub fn velocity(&self) -> Vector3D {
        match self {
            ObjState::TrajFollower(s) => s.world_velocity(),
            ObjState::Vehicle(s) => s.pose.tangent * s.speed,
            ObjState::Walker(s) => s.pose.tangent * s.speed,
            _ => Vector3D::default(),
        }
    }

    pub fn as_traj_follower(&self) -> Result<&TrajFollowerState, StateMismatch> {
        match self {
            ObjState::TrajFollower(s) => Ok(s),
            _ => Err(StateMismatch::new(ObjectKind::TrajFollower, self)),
        }
    }

    pub fn as_traj_follower_mut(&mut self) -> Result<&mut TrajFollowerState, StateMismatch> {
        let found = self.kind();
        match self {
            ObjState::TrajFollower(s) => Ok(s),
            _ => Err(StateMismatch {
                expected: ObjectKind::TrajFollower,
                found,
            }),
        }
    }

    pub fn as_vehicle(&self) -> Result<&VehicleState, StateMismatch> {
        match self {
            ObjState::Vehicle(s) => Ok(s),
            _ => Err(StateMismatch::new(ObjectKind::Vehicle, self)),
        }
    }

    pub fn as_vehicle_mut(&mut self) -> Result<&mut VehicleState, StateMismatch> {
        let found = self.kind();
        match self {
            ObjState::Vehicle(s) => Ok(s),
            _ => Err(StateMismatch {
                expected: ObjectKind::Vehicle,
                found,
            }),
        }
    }

    pub fn as_walker(&self) -> Result<&WalkerState, StateMismatch> {
        match self {
            ObjState::Walker(s) => Ok(s),
            _ => Err(StateMismatch::new(ObjectKind::Walker, self)),
        }
    }

    pub fn as_traffic_light(&self) -> Result<&TrafficLightState, StateMismatch> {
        match self {
            ObjState::TrafficLight(s) => Ok(s),
            _ => Err(StateMismatch::new(ObjectKind::TrafficLight, self)),
        }
    }
}

/// Asked for one kind of state, but the object holds another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateMismatch {
    pub expected: ObjectKind,
    pub found: ObjectKind,
}

impl StateMismatch {
    fn new(expected: ObjectKind, state: &ObjState) -> StateMismatch {
        StateMismatch {
            expected,
            found: state.kind(),
        }
    }
}

impl fmt::Display for StateMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "expected {:?} state, found {:?}", self.expected, self.found)
    }
}

impl std::error::Error for StateMismatch {}

/// A command from an external controller, applied at the start of the next frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ControlInput {
    /// Ask a trajectory follower to switch modes.
    Mode(FollowerMode),
    /// A follower or walker's speed, or a vehicle's target speed.
    Speed(f64),
    /// A walker's heading.
    Heading(Vector3D),
    /// Force a traffic light into a phase, restarting its timer.
    Phase(LightPhase),
    /// Attach a follower to a parent, to take effect on the next coupling.
    Parent(DynObjID),
    /// A relative trajectory's direction, in the parent's frame.
    RelTangent(Vector3D),
    /// Start free motion from these values instead of the current motion.
    Launch(FreeInit),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose() -> Pose {
        Pose::level(Pt3D::new(0.0, 0.0, 0.0), Vector3D::new(0.0, 1.0, 0.0))
    }

    #[test]
    fn accessors_check_the_kind() {
        let mut state = ObjState::Walker(WalkerState {
            pose: pose(),
            speed: 1.0,
            heading: Vector3D::new(0.0, 1.0, 0.0),
        });
        assert!(state.as_walker().is_ok());
        let err = state.as_vehicle().unwrap_err();
        assert_eq!(err.expected, ObjectKind::Vehicle);
        assert_eq!(err.found, ObjectKind::Walker);
        assert_eq!(err.to_string(), "expected Vehicle state, found Walker");
        assert!(state.as_traj_follower_mut().is_err());
        assert_eq!(state.as_vehicle_mut().unwrap_err().found, ObjectKind::Walker);

        let mut follower = ObjState::TrajFollower(TrajFollowerState::new(pose()));
        follower.as_traj_follower_mut().unwrap().speed = 3.0;
        assert_eq!(follower.as_traj_follower().unwrap().speed, 3.0);
        assert_eq!(follower.kind(), ObjectKind::TrajFollower);
    }

    #[test]
    fn level_poses_have_up_facing_up() {
        let p = pose();
        // Facing north, right is east
        assert!((p.lateral - Vector3D::new(1.0, 0.0, 0.0)).length() < 1e-12);
        assert!((p.up() - Vector3D::UP).length() < 1e-12);

        let back = Pose::from_basis(p.position, &p.basis());
        assert_eq!(back, p);
    }

    #[test]
    fn lights_cycle() {
        let mut phase = LightPhase::Red;
        for _ in 0..3 {
            phase = phase.next();
        }
        assert_eq!(phase, LightPhase::Red);
    }
}
