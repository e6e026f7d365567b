use std::collections::BTreeMap;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use dynobj::{
    step_frame, BallisticStepper, ControlInput, DynObjID, ExtControlRegistry, FlatTerrain,
    FollowerMode, FreeInit, LightPhase, ObjState, ObjectStore, Pose, ShutdownResult, StepContext,
    TerrainSource, TrafficLightState, TrajFollowerState, WalkerState,
};
use geom::{Pt3D, Vector3D};
use lri::synthetic;
use netutil::Timer;
use roadnet::Network;

const FLAT: FlatTerrain = FlatTerrain { z: 0.0 };

fn straight() -> Network {
    netutil::logger::setup();
    Network::from_pools(synthetic::straight_road(2).unwrap())
}

fn run_frame(
    store: &mut ObjectStore,
    net: &Network,
    terrain: &dyn TerrainSource,
    inputs: BTreeMap<DynObjID, Vec<ControlInput>>,
    dt: f64,
) -> u64 {
    let physics = BallisticStepper::default();
    let ctx = StepContext {
        net,
        terrain,
        physics: &physics,
        inputs,
        dt,
    };
    step_frame(store, &ctx);
    store.publish_frame()
}

fn close(a: Pt3D, b: Pt3D) -> bool {
    a.approx_eq(b, 1e-6)
}

fn close_vec(a: Vector3D, b: Vector3D) -> bool {
    (a - b).length() < 1e-6
}

fn east() -> Vector3D {
    Vector3D::new(1.0, 0.0, 0.0)
}

fn north() -> Vector3D {
    Vector3D::new(0.0, 1.0, 0.0)
}

fn follower(store: &ObjectStore, id: DynObjID) -> &TrajFollowerState {
    store.state(id).unwrap().as_traj_follower().unwrap()
}

#[test]
fn vehicle_drives_to_the_end_of_the_road() {
    let net = straight();
    let mut store = ObjectStore::new();
    let car = store
        .add_vehicle(&net, "car", Pt3D::new(100.0, -6.0, 0.0), 10.0)
        .unwrap();

    for _ in 0..100 {
        run_frame(&mut store, &net, &net, BTreeMap::new(), 0.1);
    }
    let state = store.state(car).unwrap().as_vehicle().unwrap();
    assert_eq!(state.pos.road(&net).unwrap().name(), "R1");
    // Three and a third seconds speeding up, then cruising
    let travelled = state.pos.get_distance().inner_meters() - 100.0;
    assert!(travelled > 80.0 && travelled < 86.0, "went {}", travelled);
    assert!((state.speed - 10.0).abs() < 1e-9);
    assert!(close_vec(state.pose.tangent, east()));
    assert!(!state.stalled);

    for _ in 0..2000 {
        run_frame(&mut store, &net, &net, BTreeMap::new(), 0.1);
    }
    let state = store.state(car).unwrap().as_vehicle().unwrap();
    assert_eq!(state.pos.road(&net).unwrap().name(), "R2");
    assert!((state.pos.get_distance().inner_meters() - 500.0).abs() < 1.0);
    assert_eq!(state.speed, 0.0);
    assert!(state.stalled);
    // Only the stretch still ahead is kept
    assert!(state.path.points().len() <= 2);
}

#[test]
fn vehicles_pull_up_at_a_dead_end() {
    let net = straight();
    let mut store = ObjectStore::new();
    let car = store
        .add_vehicle(&net, "car", Pt3D::new(1600.0, -6.0, 0.0), 15.0)
        .unwrap();

    for _ in 0..300 {
        run_frame(&mut store, &net, &net, BTreeMap::new(), 0.1);
    }
    let state = store.state(car).unwrap().as_vehicle().unwrap();
    assert_eq!(state.pos.road(&net).unwrap().name(), "R2");
    // Right up against the end, not one step short of it
    let short = 500.0 - state.pos.get_distance().inner_meters();
    assert!(short >= 0.0 && short < 0.01, "stopped {} short", short);
    assert_eq!(state.speed, 0.0);
    assert!(state.stalled);
}

#[test]
fn vehicles_take_new_target_speeds() {
    let net = straight();
    let mut store = ObjectStore::new();
    let car = store
        .add_vehicle(&net, "car", Pt3D::new(100.0, 6.0, 0.0), 10.0)
        .unwrap();
    for _ in 0..50 {
        run_frame(&mut store, &net, &net, BTreeMap::new(), 0.1);
    }
    let mut inputs = BTreeMap::new();
    inputs.insert(car, vec![ControlInput::Speed(0.0)]);
    run_frame(&mut store, &net, &net, inputs, 0.1);
    for _ in 0..50 {
        run_frame(&mut store, &net, &net, BTreeMap::new(), 0.1);
    }
    let state = store.state(car).unwrap().as_vehicle().unwrap();
    assert_eq!(state.target_speed, 0.0);
    assert_eq!(state.speed, 0.0);
    assert!(!state.stalled);
}

#[test]
fn follower_modes() {
    let net = straight();
    let mut store = ObjectStore::new();
    let walker = store.add(
        "parent",
        Vector3D::new(0.5, 0.5, 1.8),
        ObjState::Walker(WalkerState {
            pose: Pose::level(Pt3D::new(0.0, 0.0, 0.0), east()),
            speed: 0.0,
            heading: east(),
        }),
    );
    let rider = store.add(
        "rider",
        Vector3D::new(1.0, 1.0, 1.0),
        ObjState::TrajFollower(TrajFollowerState::new(Pose::level(
            Pt3D::new(10.0, 0.0, 0.0),
            east(),
        ))),
    );

    let registry = ExtControlRegistry::new();
    let controller = registry.handle().unwrap();
    let frame = |store: &mut ObjectStore| {
        run_frame(store, &net, &FLAT, registry.take_inputs(), 0.5);
    };

    // Attaching keeps the rider where it was
    controller.send(rider, ControlInput::Parent(walker));
    controller.send(rider, ControlInput::Mode(FollowerMode::CoupledObj));
    frame(&mut store);
    let state = follower(&store, rider);
    assert_eq!(state.prev_mode, FollowerMode::GroundTraj);
    assert_eq!(state.mode, FollowerMode::CoupledObj);
    assert!(close(state.pose.position, Pt3D::new(10.0, 0.0, 0.0)));

    // The parent turns north; the rider swings around with it a frame later
    controller.send(walker, ControlInput::Heading(north()));
    frame(&mut store);
    frame(&mut store);
    let state = follower(&store, rider);
    assert_eq!(state.prev_mode, FollowerMode::CoupledObj);
    assert!(close(state.pose.position, Pt3D::new(0.0, 10.0, 0.0)));
    assert!(close_vec(state.pose.tangent, north()));

    // A relative trajectory waits until it knows which way it goes
    controller.send(rider, ControlInput::Mode(FollowerMode::ObjRelTraj));
    frame(&mut store);
    let state = follower(&store, rider);
    assert!(state.no_transition);
    assert_eq!(state.mode, FollowerMode::CoupledObj);
    assert_eq!(state.pending, Some(FollowerMode::ObjRelTraj));

    // Toward the parent's right, which is east now
    controller.send(rider, ControlInput::RelTangent(Vector3D::new(0.0, 1.0, 0.0)));
    controller.send(rider, ControlInput::Speed(2.0));
    frame(&mut store);
    let state = follower(&store, rider);
    assert!(!state.no_transition);
    assert_eq!(state.prev_mode, FollowerMode::CoupledObj);
    assert_eq!(state.mode, FollowerMode::ObjRelTraj);
    assert!(close(state.pose.position, Pt3D::new(1.0, 10.0, 0.0)));
    assert!(close_vec(state.pose.tangent, east()));
    assert!(close_vec(state.pose.lateral, Vector3D::new(0.0, -1.0, 0.0)));

    // Let go, carrying the relative motion out into the world
    controller.send(rider, ControlInput::Mode(FollowerMode::FreeMotion));
    frame(&mut store);
    let state = follower(&store, rider);
    assert_eq!(state.mode, FollowerMode::FreeMotion);
    assert!(close(state.pose.position, Pt3D::new(2.0, 10.0, 0.0)));
    assert!(state.velocity.i > 0.0);
    assert!(state.rel_rotation.is_none());

    // And back on the ground, keeping the forward speed
    let forward = state.velocity.i;
    controller.send(rider, ControlInput::Mode(FollowerMode::GroundTraj));
    frame(&mut store);
    let state = follower(&store, rider);
    assert_eq!(state.mode, FollowerMode::GroundTraj);
    assert!((state.speed - forward).abs() < 1e-9);
    assert!(close(state.pose.position, Pt3D::new(2.0 + forward * 0.5, 10.0, 0.0)));
    assert!(close_vec(state.pose.up(), Vector3D::UP));

    drop(controller);
    assert_eq!(registry.shutdown(Duration::from_secs(1)), ShutdownResult::Clean);
}

#[test]
fn followers_need_a_real_parent() {
    let net = straight();
    let mut store = ObjectStore::new();
    let rider = store.add(
        "rider",
        Vector3D::new(1.0, 1.0, 1.0),
        ObjState::TrajFollower(TrajFollowerState::new(Pose::level(
            Pt3D::new(0.0, 0.0, 0.0),
            east(),
        ))),
    );
    let mut inputs = BTreeMap::new();
    inputs.insert(
        rider,
        vec![
            ControlInput::Parent(DynObjID(99)),
            ControlInput::Mode(FollowerMode::CoupledObj),
        ],
    );
    run_frame(&mut store, &net, &FLAT, inputs, 0.1);
    let state = follower(&store, rider);
    assert_eq!(state.mode, FollowerMode::GroundTraj);
    assert!(state.no_transition);

    // Coupling to itself doesn't work either
    let mut inputs = BTreeMap::new();
    inputs.insert(rider, vec![ControlInput::Parent(rider)]);
    run_frame(&mut store, &net, &FLAT, inputs, 0.1);
    assert_eq!(follower(&store, rider).mode, FollowerMode::GroundTraj);
}

#[test]
fn launching_from_given_values() {
    let net = straight();
    let mut store = ObjectStore::new();
    let rider = store.add(
        "rider",
        Vector3D::new(1.0, 1.0, 1.0),
        ObjState::TrajFollower(TrajFollowerState::new(Pose::level(
            Pt3D::new(0.0, 0.0, 0.0),
            east(),
        ))),
    );
    let mut inputs = BTreeMap::new();
    inputs.insert(
        rider,
        vec![ControlInput::Launch(FreeInit {
            pose: Pose::level(Pt3D::new(5.0, 5.0, 50.0), north()),
            velocity: Vector3D::new(0.0, 4.0, 0.0),
            angular: Vector3D::default(),
        })],
    );
    run_frame(&mut store, &net, &FLAT, inputs, 0.1);
    let state = follower(&store, rider);
    assert_eq!(state.mode, FollowerMode::FreeMotion);
    assert!(state.free_init.is_none());
    assert!(state.pose.position.z < 50.0);
    assert!((state.pose.position.y - 5.4).abs() < 1e-9);
    assert!(close_vec(state.pose.tangent, north()));
}

#[test]
fn walkers_stay_on_flat_ground() {
    let net = straight();
    let mut store = ObjectStore::new();
    let mut rng = XorShiftRng::seed_from_u64(3);
    let mut walkers = Vec::new();
    for idx in 0..10 {
        walkers.push(store.add(
            &format!("walker {}", idx),
            Vector3D::new(0.5, 0.5, 1.8),
            ObjState::Walker(WalkerState {
                pose: Pose::level(Pt3D::new(rng.gen_range(-50.0..50.0), 0.0, 2.0), east()),
                speed: 1.5,
                heading: east(),
            }),
        ));
    }
    let ground = FlatTerrain { z: 2.0 };
    for _ in 0..30 {
        let mut inputs = BTreeMap::new();
        for id in &walkers {
            let angle: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
            inputs.insert(
                *id,
                vec![ControlInput::Heading(Vector3D::new(angle.cos(), angle.sin(), 0.0))],
            );
        }
        let before: Vec<Pt3D> = walkers
            .iter()
            .map(|id| store.state(*id).unwrap().pose().unwrap().position)
            .collect();
        run_frame(&mut store, &net, &ground, inputs, 1.0);
        for (id, prev) in walkers.iter().zip(before) {
            let pose = store.state(*id).unwrap().pose().unwrap();
            assert!((pose.position.z - 2.0).abs() < 1e-9);
            assert!((pose.position.dist_xy(prev) - 1.5).abs() < 1e-9);
            assert!(close_vec(pose.up(), Vector3D::UP));
        }
    }
}

#[test]
fn lights_cycle_and_take_overrides() {
    let net = straight();
    let mut store = ObjectStore::new();
    let light = store.add(
        "light",
        Vector3D::new(0.3, 0.3, 4.0),
        ObjState::TrafficLight(TrafficLightState::new(Pose::level(
            Pt3D::new(990.0, -20.0, 0.0),
            east(),
        ))),
    );
    let phase = |store: &ObjectStore| store.state(light).unwrap().as_traffic_light().unwrap().phase;

    for _ in 0..34 {
        run_frame(&mut store, &net, &FLAT, BTreeMap::new(), 1.0);
    }
    assert_eq!(phase(&store), LightPhase::Red);
    run_frame(&mut store, &net, &FLAT, BTreeMap::new(), 1.0);
    assert_eq!(phase(&store), LightPhase::Green);

    let mut inputs = BTreeMap::new();
    inputs.insert(light, vec![ControlInput::Phase(LightPhase::Yellow)]);
    run_frame(&mut store, &net, &FLAT, inputs, 1.0);
    assert_eq!(phase(&store), LightPhase::Yellow);
    for _ in 0..4 {
        run_frame(&mut store, &net, &FLAT, BTreeMap::new(), 1.0);
    }
    assert_eq!(phase(&store), LightPhase::Red);
}

#[test]
fn readers_share_a_published_frame() {
    let net = Network::from_pools(synthetic::four_way().unwrap());
    let mut store = ObjectStore::from_network(&net, &mut Timer::throwaway());
    let frame = run_frame(&mut store, &net, &net, BTreeMap::new(), 0.1);
    assert_eq!(frame, 1);

    let snapshot = store.current().to_vec();
    let store = &store;
    let net = &net;
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                assert_eq!(store.current(), snapshot.as_slice());
                assert_eq!(store.frame(), 1);
                for state in store.current() {
                    if let Some(pose) = state.pose() {
                        // Network queries run alongside
                        let _ = net.qry_terrain(pose.position.to_2d(), pose.position.z);
                    }
                }
            });
        }
    });
}
