use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use geom::{Distance, Pt2D, Pt3D, Vector3D};
use lri::{
    square_border, synthetic, AttrSpec, Builder, CrdrDir, CrdrSpec, ElevGrid, HoldReason, LaneDir,
    LaneSpec, ObjSpec, ObjectKind, RoadSpec,
};
use netutil::Timer;
use roadnet::Network;

fn four_way() -> Network {
    Network::from_pools(synthetic::four_way().unwrap())
}

#[test]
fn control_point_lookup_brackets_the_distance() {
    let net = Network::from_pools(synthetic::ring().unwrap());
    let mut rng = XorShiftRng::seed_from_u64(11);
    for road in net.all_roads() {
        let cps = road.cntrl_pnts();
        let mut hint = 0;
        for _ in 0..200 {
            let d = rng.gen_range(0.0..road.length().inner_meters());
            let idx = road.cntrl_pnt_at(Distance::meters(d));
            assert!(cps[idx].cummulative_cubic_dist <= d + 1e-9);
            assert!(d <= cps[idx + 1].cummulative_cubic_dist + 1e-9);

            // Walking from any earlier answer lands in the same place
            let found = road.find_cntrl_pnt(Distance::meters(d), hint, Distance::meters(20.0));
            assert_eq!(found, idx);
            hint = found;
        }
        assert_eq!(road.cntrl_pnt_at(Distance::meters(-5.0)), 0);
        assert_eq!(road.cntrl_pnt_at(road.length() + Distance::meters(5.0)), cps.len() - 2);
    }
}

#[test]
fn distances_survive_a_trip_through_xy() {
    let net = Network::from_pools(synthetic::ring().unwrap());
    let mut rng = XorShiftRng::seed_from_u64(5);
    for road in net.all_roads() {
        for _ in 0..50 {
            let d = Distance::meters(rng.gen_range(5.0..road.length().inner_meters() - 5.0));
            let pt = road.chord_position_at(d, Distance::ZERO);
            let pos = roadnet::RoadPos::from_xy(&net, pt.to_2d()).unwrap();
            assert_eq!(pos.road(&net).unwrap().id(), road.id());
            assert!((pos.get_distance() - d).abs() < Distance::meters(1e-3), "{} vs {}", pos.get_distance(), d);
        }
    }
}

#[test]
fn lane_neighbors_are_symmetric() {
    for net in [
        four_way(),
        Network::from_pools(synthetic::three_lane_road().unwrap()),
    ] {
        for road in net.all_roads() {
            for lane in road.lanes() {
                if let Some(left) = lane.get_left() {
                    assert_eq!(left.get_right().unwrap(), lane);
                } else {
                    assert!(lane.is_leftmost());
                }
                if let Some(right) = lane.get_right() {
                    assert_eq!(right.get_left().unwrap(), lane);
                } else {
                    assert!(lane.is_rightmost());
                }
                if let Some(left) = lane.driver_left() {
                    assert_eq!(left.driver_right().unwrap(), lane);
                    assert_eq!(left.direction(), lane.direction());
                }
            }
        }
    }
}

#[test]
fn corridors_connect_what_they_claim() {
    let net = four_way();
    for i in net.all_intrsctns() {
        for (local, crdr) in i.all_crdrs().enumerate() {
            assert_eq!(crdr.intrsctn().id(), i.id());
            assert_eq!(crdr.local_index(), local);
            assert_eq!(i.local_index(crdr.id()), Some(local));

            let src = crdr.src_lane();
            let dst = crdr.dst_lane();
            assert_eq!(src.next_intrsctn().id(), i.id());
            assert_eq!(dst.prev_intrsctn().id(), i.id());
            assert!(src.outgoing_crdrs().contains(&crdr));
            assert!(dst.incoming_crdrs().contains(&crdr));
            assert!(i.roads().iter().any(|r| r.id() == src.road().id()));
        }
    }
}

#[test]
fn hold_offsets_are_sorted() {
    let net = four_way();
    let c = net.intrsctn_by_name("C").unwrap();
    for crdr in c.all_crdrs() {
        let dists: Vec<Distance> = crdr.hld_ofs().map(|h| h.distance()).collect();
        assert!(dists.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(dists.iter().all(|d| *d <= crdr.length()));

        let first = crdr.get_hld_of_by_dist(Distance::meters(-1.0)).unwrap();
        assert_eq!(first.distance(), Distance::meters(1.0));
        assert!(first.reasons().contains(HoldReason::Sign));
        assert!(first.obj().unwrap().name().starts_with("stop sign"));

        if crdr.direction() == CrdrDir::Left {
            assert_eq!(dists.len(), 2);
            let next = crdr.get_hld_of_by_dist(Distance::meters(5.0)).unwrap();
            assert_eq!(next.distance(), Distance::meters(10.0));
            assert!(crdr.get_hld_of_by_dist(Distance::meters(11.0)).is_none());
        } else {
            assert_eq!(dists.len(), 1);
            assert!(crdr.get_hld_of_by_dist(Distance::meters(5.0)).is_none());
        }
    }
}

#[test]
fn attributes_by_distance() {
    let net = four_way();
    let north = net.road_by_name("North").unwrap();
    let at = |d: f64| north.qry_attr(1, Some(Distance::meters(d)), 0);
    assert!(at(10.0).is_none());
    assert_eq!(at(50.0).unwrap().value1(), 35.0);
    assert_eq!(at(149.0).unwrap().name(), "SpeedLimit");
    assert!(at(150.0).is_none());
    assert!(north.qry_attr(1, None, 0).is_some());
    assert!(north.qry_attr_by_name("SpeedLimit", Some(Distance::meters(60.0)), 0).is_some());

    assert!(net.road_by_name("East").unwrap().has_attr(synthetic::HIGHWAY_ATTR));
    assert!(!north.has_attr(synthetic::HIGHWAY_ATTR));
}

#[test]
fn prioritizing_a_crossing() {
    let net = four_way();
    let c = net.intrsctn_by_name("C").unwrap();
    let priorities = c.prioritize_corridors();
    assert_eq!(priorities.len(), c.n_crdrs() as usize);
    for p in &priorities {
        let crdr = net.crdr(p.crdr);
        assert_eq!(p.hld_ofs_dist, Distance::meters(1.0));
        for other in &p.intersecting {
            assert_ne!(net.crdr(*other).rec().src_lane, crdr.rec().src_lane);
            assert!(crdr.merge_with(*other).unwrap().overlaps());
        }
    }
}

#[test]
fn static_objects_on_roads() {
    let net = four_way();
    let east = net.road_by_name("East").unwrap();
    let placed = east.static_objs();
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].distance, 100.0);
    assert!(placed[0].crdr.is_none());
    assert_eq!(net.static_obj(placed[0].obj).name(), "barrel");
    assert!(net.road_by_name("West").unwrap().static_objs().is_empty());
}

/// Like the straight road with one lane, except I2 slopes up to the east, has a stop attribute and
/// a light standing on its corridor.
fn sloped_crossing() -> Network {
    let mut b = Builder::new();
    let i1 = b.add_intersection("I1", square_border(Pt2D::new(-20.0, 0.0), 20.0), 0.0);
    let i2 = b.add_intersection("I2", square_border(Pt2D::new(1075.0, 0.0), 75.0), 0.0);
    let i3 = b.add_intersection("I3", square_border(Pt2D::new(1670.0, 0.0), 20.0), 0.0);
    let lanes = vec![LaneSpec::new(synthetic::LANE_WIDTH, LaneDir::Pos)];
    let line = |x1: f64, x2: f64| {
        vec![
            Pt3D::new(x1, 0.0, 0.0),
            Pt3D::new((x1 + x2) / 2.0, 0.0, 0.0),
            Pt3D::new(x2, 0.0, 0.0),
        ]
    };
    let r1 = b
        .add_road(RoadSpec::new("R1", i1, i2, line(0.0, 1000.0), lanes.clone()))
        .unwrap();
    let r2 = b
        .add_road(RoadSpec::new("R2", i2, i3, line(1150.0, 1650.0), lanes))
        .unwrap();
    let crdr = b.add_corridor(i2, CrdrSpec::new(r1, 0, r2, 0)).unwrap();

    let light = b.add_static_object(ObjSpec {
        name: "signal".to_string(),
        kind: ObjectKind::TrafficLight,
        sol_id: 3,
        flags: 0,
        position: Pt3D::new(1010.0, -10.0, 0.0),
        tangent: Vector3D::new(1.0, 0.0, 0.0),
        size: Vector3D::new(0.5, 0.5, 4.0),
    });
    b.attach_obj_to_crdr(light, crdr, 5.0).unwrap();
    b.add_intrsctn_attr(i2, AttrSpec::new(3, "Stop", 1.0))
        .unwrap();

    let grid = |values: Vec<f64>| ElevGrid {
        origin: Pt2D::new(1000.0, -75.0),
        resolution: 150.0,
        n_rows: 2,
        n_cols: 2,
        values,
    };
    assert!(b.set_elev_map(i2, grid(vec![1.0])).is_err());
    b.set_elev_map(i2, grid(vec![0.0, 3.0, 0.0, 3.0])).unwrap();

    Network::from_pools(b.finish(&mut Timer::throwaway()).unwrap())
}

#[test]
fn intersection_elevation_attributes_and_objects() {
    let net = sloped_crossing();
    let i2 = net.intrsctn_by_name("I2").unwrap();
    assert!((i2.elevation_at(Pt2D::new(1075.0, 0.0)) - 1.5).abs() < 1e-9);
    // Past the edge of the map, the edge value holds
    assert!((i2.elevation_at(Pt2D::new(2000.0, 0.0)) - 3.0).abs() < 1e-9);
    let i1 = net.intrsctn_by_name("I1").unwrap();
    assert_eq!(i1.elevation_at(Pt2D::new(-20.0, 0.0)), 0.0);

    assert_eq!(i2.qry_attr(3, 0).unwrap().name(), "Stop");
    assert!(i2.qry_attr(synthetic::HIGHWAY_ATTR, 0).is_none());
    assert!(i1.qry_attr(3, 0).is_none());

    let placed = i2.static_objs();
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].crdr, Some(i2.crdr_by_local(0).unwrap().id()));
    assert_eq!(placed[0].distance, 5.0);
    assert_eq!(net.static_obj(placed[0].obj).kind(), ObjectKind::TrafficLight);
}

#[test]
fn parallel_corridors_head_the_same_way() {
    let net = Network::from_pools(synthetic::straight_road(2).unwrap());
    let i2 = net.intrsctn_by_name("I2").unwrap();
    let a = i2.crdr_by_local(0).unwrap();
    let b = i2.crdr_by_local(1).unwrap();
    assert_eq!(a.relative_dir(b.id()), Some(CrdrDir::Straight));
    assert_eq!(b.relative_dir(a.id()), Some(CrdrDir::Straight));
    // No record pairs a corridor with itself
    assert_eq!(a.relative_dir(a.id()), None);
}

#[test]
fn attribute_names_come_from_the_dictionary() {
    let mut net = four_way();
    let north = net.road_by_name("North").unwrap().id();
    let at = Some(Distance::meters(60.0));
    assert!(net.road(north).qry_attr_by_name("Limit", at, 0).is_none());

    let mut dict = lri::AttrDictionary::new();
    dict.insert("Limit", 1).unwrap();
    net.set_attr_dict(dict);
    assert_eq!(net.road(north).qry_attr_by_name("Limit", at, 0).unwrap().value1(), 35.0);
    assert!(net.road(north).qry_attr_by_name("SpeedLimit", at, 0).is_none());
}
