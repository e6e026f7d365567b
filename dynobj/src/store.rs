use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use geom::{Pt3D, Vector3D};
use lri::{ObjID, ObjectKind};
use netutil::Timer;
use roadnet::{Network, Path, RoadPos};

use crate::{
    CoordinatorState, ObjState, Pose, StaticState, TrafficLightState, TrajFollowerState,
    VehicleState, WalkerState,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct DynObjID(pub usize);

impl fmt::Display for DynObjID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DynObj #{}", self.0)
    }
}

/// What doesn't change from frame to frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DynObj {
    pub id: DynObjID,
    pub name: String,
    pub kind: ObjectKind,
    /// Length, width and height.
    pub size: Vector3D,
    /// Kilograms. Only matters in free motion.
    pub mass: f64,
    /// Fraction of horizontal speed lost per second on the ground, in free motion.
    pub friction: f64,
    /// Fraction of vertical speed kept after a fall, in free motion.
    pub bounce: f64,
    /// Set for objects imported from the network's static object pool.
    pub static_obj: Option<ObjID>,
}

impl DynObj {
    fn default_mass(kind: ObjectKind) -> f64 {
        match kind {
            ObjectKind::Vehicle => 1500.0,
            ObjectKind::Walker => 80.0,
            ObjectKind::Coordinator => 0.0,
            _ => 100.0,
        }
    }
}

/// Every object's state, twice: the frame readers see now, and the one being computed. Which is
/// which flips with the parity of the frame counter, so publishing a frame is one atomic
/// increment and nothing gets copied.
pub struct ObjectStore {
    objs: Vec<DynObj>,
    buffers: [Vec<ObjState>; 2],
    frame: AtomicU64,
}

impl ObjectStore {
    pub fn new() -> ObjectStore {
        ObjectStore {
            objs: Vec::new(),
            buffers: [Vec::new(), Vec::new()],
            frame: AtomicU64::new(0),
        }
    }

    /// One object per static object in the network. Lights start red; movers start at rest
    /// where the network placed them.
    pub fn from_network(net: &Network, timer: &mut Timer) -> ObjectStore {
        timer.start("import static objects");
        let mut store = ObjectStore::new();
        let mut skipped = 0;
        for obj in net.all_static_objs() {
            let pose = Pose {
                position: obj.position(),
                tangent: obj.tangent().normalized_or(Vector3D::new(1.0, 0.0, 0.0)),
                lateral: obj.lateral().normalized_or(obj.tangent().right_xy()),
            };
            let state = match obj.kind() {
                ObjectKind::Obstacle => ObjState::Obstacle(StaticState { pose }),
                ObjectKind::TrafficSign => ObjState::TrafficSign(StaticState { pose }),
                ObjectKind::TrafficLight => ObjState::TrafficLight(TrafficLightState::new(pose)),
                ObjectKind::TrajFollower => ObjState::TrajFollower(TrajFollowerState::new(pose)),
                ObjectKind::Walker => ObjState::Walker(WalkerState {
                    pose,
                    speed: 0.0,
                    heading: pose.tangent,
                }),
                ObjectKind::Coordinator => ObjState::Coordinator(CoordinatorState::default()),
                ObjectKind::Vehicle => match vehicle_at(net, pose.position, 0.0) {
                    Ok(state) => ObjState::Vehicle(state),
                    Err(err) => {
                        warn!("Skipping vehicle {}: {}", obj.name(), err);
                        skipped += 1;
                        continue;
                    }
                },
            };
            let id = store.add(obj.name(), obj.size(), state);
            store.objs[id.0].static_obj = Some(obj.id());
        }
        timer.note(format!(
            "Imported {} static objects, skipped {}",
            netutil::prettyprint_usize(store.len()),
            skipped
        ));
        timer.stop("import static objects");
        store
    }

    /// Creates an object at run time. Both buffers get the initial state, so it shows up right
    /// away and the next frame starts from it.
    pub fn add(&mut self, name: &str, size: Vector3D, state: ObjState) -> DynObjID {
        let id = DynObjID(self.objs.len());
        self.objs.push(DynObj {
            id,
            name: name.to_string(),
            kind: state.kind(),
            size,
            mass: DynObj::default_mass(state.kind()),
            friction: 0.5,
            bounce: 0.3,
            static_obj: None,
        });
        self.buffers[0].push(state.clone());
        self.buffers[1].push(state);
        id
    }

    /// A vehicle snapped onto the network at `pt`, headed the way its lane flows.
    pub fn add_vehicle(
        &mut self,
        net: &Network,
        name: &str,
        pt: Pt3D,
        target_speed: f64,
    ) -> Result<DynObjID> {
        let state = vehicle_at(net, pt, target_speed)?;
        Ok(self.add(name, Vector3D::new(4.5, 1.8, 1.5), ObjState::Vehicle(state)))
    }

    pub fn len(&self) -> usize {
        self.objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }

    pub fn objs(&self) -> &[DynObj] {
        &self.objs
    }

    pub fn obj(&self, id: DynObjID) -> Option<&DynObj> {
        self.objs.get(id.0)
    }

    pub fn obj_by_name(&self, name: &str) -> Option<&DynObj> {
        self.objs.iter().find(|o| o.name == name)
    }

    pub fn frame(&self) -> u64 {
        self.frame.load(Ordering::Acquire)
    }

    fn current_idx(&self) -> usize {
        (self.frame() % 2) as usize
    }

    /// The published frame.
    pub fn current(&self) -> &[ObjState] {
        &self.buffers[self.current_idx()]
    }

    pub fn state(&self, id: DynObjID) -> Option<&ObjState> {
        self.current().get(id.0)
    }

    /// The published frame to read from, and the next one to fill in.
    pub fn split_buffers(&mut self) -> (&[ObjState], &mut [ObjState]) {
        let (_, current, future) = self.frame_parts();
        (current, future)
    }

    pub(crate) fn frame_parts(&mut self) -> (&[DynObj], &[ObjState], &mut [ObjState]) {
        let even_frame = self.frame.load(Ordering::Acquire) % 2 == 0;
        let [even, odd] = &mut self.buffers;
        if even_frame {
            (&self.objs, even.as_slice(), odd.as_mut_slice())
        } else {
            (&self.objs, odd.as_slice(), even.as_mut_slice())
        }
    }

    /// Makes the future buffer current, returning the new frame number.
    pub fn publish_frame(&self) -> u64 {
        self.frame.fetch_add(1, Ordering::AcqRel) + 1
    }
}

impl Default for ObjectStore {
    fn default() -> ObjectStore {
        ObjectStore::new()
    }
}

fn vehicle_at(net: &Network, pt: Pt3D, target_speed: f64) -> Result<VehicleState> {
    let pos = RoadPos::from_xyz(net, pt).with_context(|| format!("{} isn't on the network", pt))?;
    let mut path = Path::new();
    path.initialize(net, &pos);
    Ok(VehicleState {
        pose: Pose {
            position: pos.get_best_xyz(net),
            tangent: pos.get_tangent(net),
            lateral: pos.get_right_vec(net),
        },
        pos,
        path,
        speed: 0.0,
        target_speed,
        max_accel: 3.0,
        max_decel: 6.0,
        stalled: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lri::synthetic;

    fn obstacle(x: f64) -> ObjState {
        ObjState::Obstacle(StaticState {
            pose: Pose::level(Pt3D::new(x, 0.0, 0.0), Vector3D::new(1.0, 0.0, 0.0)),
        })
    }

    #[test]
    fn buffers_flip_with_the_frame() {
        let mut store = ObjectStore::new();
        let id = store.add("cone", Vector3D::new(1.0, 1.0, 1.0), obstacle(1.0));
        assert_eq!(store.frame(), 0);

        {
            let (current, future) = store.split_buffers();
            assert_eq!(current[id.0], obstacle(1.0));
            future[id.0] = obstacle(2.0);
        }
        // Nothing shows until the frame is published
        assert_eq!(store.state(id), Some(&obstacle(1.0)));
        assert_eq!(store.publish_frame(), 1);
        assert_eq!(store.state(id), Some(&obstacle(2.0)));

        let (current, future) = store.split_buffers();
        assert_eq!(current[id.0], obstacle(2.0));
        assert_eq!(future[id.0], obstacle(1.0));
    }

    #[test]
    fn imports_every_static_object() {
        let net = Network::from_pools(synthetic::four_way().unwrap());
        let store = ObjectStore::from_network(&net, &mut Timer::throwaway());
        assert_eq!(store.len(), net.all_static_objs().count());
        let barrel = store.obj_by_name("barrel").unwrap();
        assert_eq!(barrel.kind, ObjectKind::Obstacle);
        assert!(barrel.static_obj.is_some());
        assert!(store.state(barrel.id).unwrap().pose().is_some());
        assert!(store
            .objs()
            .iter()
            .any(|o| o.kind == ObjectKind::TrafficSign));
    }

    #[test]
    fn vehicles_snap_onto_the_network() {
        let net = Network::from_pools(synthetic::straight_road(2).unwrap());
        let mut store = ObjectStore::new();
        let id = store
            .add_vehicle(&net, "car", Pt3D::new(100.0, -6.0, 0.0), 10.0)
            .unwrap();
        let car = store.state(id).unwrap().as_vehicle().unwrap();
        assert_eq!(car.pos.lane(&net).unwrap().index(), 1);
        assert!(store
            .add_vehicle(&net, "lost", Pt3D::new(100.0, 500.0, 0.0), 10.0)
            .is_err());
        assert_eq!(store.len(), 1);
    }
}
