//! Per-kind update rules. Each one reads the published frame and returns the object's state for
//! the next.

mod follower;
mod ground;
mod light;
mod vehicle;
mod walker;

use std::collections::BTreeMap;

use roadnet::Network;

use crate::{
    ControlInput, DynObj, DynObjID, ObjState, ObjectStore, RigidBodyStepper, TerrainSource,
};

/// Everything a frame update reads besides the objects themselves.
pub struct StepContext<'a> {
    pub net: &'a Network,
    pub terrain: &'a dyn TerrainSource,
    pub physics: &'a dyn RigidBodyStepper,
    /// Commands to apply this frame, in the order they arrived.
    pub inputs: BTreeMap<DynObjID, Vec<ControlInput>>,
    /// Seconds.
    pub dt: f64,
}

/// One object's view of the frame being computed.
pub(crate) struct ObjFrame<'a> {
    pub id: DynObjID,
    pub obj: &'a DynObj,
    pub inputs: &'a [ControlInput],
    /// The published frame, for looking at other objects.
    pub current: &'a [ObjState],
}

impl<'a> ObjFrame<'a> {
    pub fn other(&self, id: DynObjID) -> Option<&'a ObjState> {
        if id == self.id {
            return None;
        }
        self.current.get(id.0)
    }
}

/// Fills in the store's next frame from the published one. The caller publishes it.
pub fn step_frame(store: &mut ObjectStore, ctx: &StepContext) {
    let (objs, current, future) = store.frame_parts();
    for ((idx, state), obj) in current.iter().enumerate().zip(objs) {
        let id = DynObjID(idx);
        let frame = ObjFrame {
            id,
            obj,
            inputs: ctx.inputs.get(&id).map(|v| v.as_slice()).unwrap_or(&[]),
            current,
        };
        future[idx] = match state {
            ObjState::TrajFollower(s) => ObjState::TrajFollower(follower::step(s, &frame, ctx)),
            ObjState::Vehicle(s) => ObjState::Vehicle(vehicle::step(s, &frame, ctx)),
            ObjState::Walker(s) => ObjState::Walker(walker::step(s, &frame, ctx)),
            ObjState::TrafficLight(s) => ObjState::TrafficLight(light::step(s, &frame, ctx)),
            ObjState::TrafficSign(_) | ObjState::Obstacle(_) | ObjState::Coordinator(_) => {
                for input in frame.inputs {
                    warn!("{} ({:?}) takes no input; ignoring {:?}", id, state.kind(), input);
                }
                state.clone()
            }
        };
    }
}
