//! Dynamic objects moving over a road network: their per-kind state, a double-buffered store that
//! readers can look at while the next frame is computed, and the models that step each kind
//! forward one frame at a time.
//!
//! Rigid-body physics and terrain come in through the `RigidBodyStepper` and `TerrainSource`
//! traits, so the models never depend on a particular engine.

#[macro_use]
extern crate log;

mod control;
mod models;
mod physics;
mod state;
mod store;
mod terrain;

pub use crate::control::{ControlTable, ExtControlRegistry, SelfRef, ShutdownResult};
pub use crate::models::{step_frame, StepContext};
pub use crate::physics::{BallisticStepper, RigidBody, RigidBodyStepper};
pub use crate::state::{
    ControlInput, CoordinatorState, FollowerMode, FreeInit, LightPhase, ObjState, Pose,
    StateMismatch, StaticState, TrafficLightState, TrajFollowerState, VehicleState, WalkerState,
};
pub use crate::store::{DynObj, DynObjID, ObjectStore};
pub use crate::terrain::{FlatTerrain, TerrainSource};
