use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use geom::Distance;
use lri::{synthetic, CrdrDir, LaneDir};
use roadnet::{Network, Path, PathPoint, RoadPos, TravelResult};

fn close(a: Distance, b: f64, eps: f64) -> bool {
    (a.inner_meters() - b).abs() <= eps
}

fn on_lane(net: &Network, road: &str, lane: u32, dist: f64) -> RoadPos {
    let road = net.road_by_name(road).unwrap();
    let lane = road.lane(lane).unwrap();
    RoadPos::on_road(net, road.id(), lane.id(), Distance::meters(dist), Distance::ZERO).unwrap()
}

fn four_way() -> Network {
    netutil::logger::setup();
    Network::from_pools(synthetic::four_way().unwrap())
}

fn road_names(net: &Network, path: &Path) -> Vec<String> {
    path.points()
        .iter()
        .filter_map(|p| match p {
            PathPoint::Road { road, .. } => Some(net.road(*road).name().to_string()),
            PathPoint::Intrsctn { .. } => None,
        })
        .collect()
}

#[test]
fn initialize_takes_every_lane_going_the_same_way() {
    let net = Network::from_pools(synthetic::three_lane_road().unwrap());
    let pos = on_lane(&net, "R1", 1, 200.0);
    let mut path = Path::new();
    path.initialize(&net, &pos);
    match &path.points()[0] {
        PathPoint::Road { lanes, .. } => {
            assert_eq!(lanes.len(), 3);
            assert_eq!(lanes[0].lane, pos.lane(&net).unwrap().id());
        }
        PathPoint::Intrsctn { .. } => panic!("should start on a road"),
    }
    assert_eq!(path.get_length(), Distance::ZERO);
    assert!(path.contains(&pos));
    assert!(path.is_valid(&net));
}

#[test]
fn append_goes_straight_by_default() {
    let net = four_way();
    let start = on_lane(&net, "North", 0, 200.0);
    let mut path = Path::new();
    path.initialize(&net, &start);

    assert!(path.append(&net, Distance::meters(100.0), false));
    assert!(close(path.get_length(), 100.0, 1e-3));
    assert_eq!(path.points().len(), 1);

    assert!(path.append(&net, Distance::meters(200.0), false));
    assert!(close(path.get_length(), 300.0, 1e-3));
    assert_eq!(road_names(&net, &path), vec!["North", "South"]);
    match &path.points()[1] {
        PathPoint::Intrsctn { crdrs, .. } => {
            assert_eq!(net.crdr(crdrs[0].crdr).direction(), CrdrDir::Straight);
        }
        PathPoint::Road { .. } => panic!("expected the crossing"),
    }
    assert!(path.is_valid(&net));
}

#[test]
fn append_only_grows() {
    let net = four_way();
    let mut rng = XorShiftRng::seed_from_u64(3);
    let mut path = Path::new();
    path.initialize(&net, &on_lane(&net, "West", 0, 150.0));
    let mut expected = 0.0;
    for _ in 0..30 {
        let step = rng.gen_range(0.0..80.0);
        let before = path.get_length();
        assert!(path.append(&net, Distance::meters(step), false));
        assert!(path.get_length() >= before);
        expected += step;
        // Dead ends have U-turns, so nothing stops the path
        assert!(close(path.get_length(), expected, 0.01));
        assert!(path.is_valid(&net));
    }
}

#[test]
fn append_can_stay_on_highways() {
    let net = four_way();
    let mut path = Path::new();
    path.initialize(&net, &on_lane(&net, "North", 0, 50.0));
    assert!(path.append(&net, Distance::meters(200.0), true));
    let roads = road_names(&net, &path);
    assert_eq!(roads[0], "North");
    assert!(roads[1] == "East" || roads[1] == "West", "{:?}", roads);
    assert!(path.is_valid(&net));
}

#[test]
fn append_turn_picks_the_angle() {
    let net = four_way();
    let c = net.intrsctn_by_name("C").unwrap();
    let inbound = net.road_by_name("North").unwrap().lane(0).unwrap();
    let right = c
        .crdrs_from_lane(inbound.id())
        .into_iter()
        .find(|crdr| crdr.direction() == CrdrDir::Right)
        .unwrap();

    let mut path = Path::new();
    path.initialize(&net, &on_lane(&net, "North", 0, 100.0));
    let got = path.append_turn(&net, right.turn_angle(), 1.0, Distance::meters(250.0), false);
    assert!(close(got, 250.0, 0.01));
    match &path.points()[1] {
        PathPoint::Intrsctn { crdrs, .. } => assert_eq!(crdrs[0].crdr, right.id()),
        PathPoint::Road { .. } => panic!("expected the crossing"),
    }
    assert_eq!(road_names(&net, &path)[1], "West");

    // Nothing at C turns 60 degrees away from a right turn
    let mut path = Path::new();
    path.initialize(&net, &on_lane(&net, "North", 0, 100.0));
    let got = path.append_turn(&net, right.turn_angle() + 60.0, 1.0, Distance::meters(250.0), false);
    assert!(close(got, 100.0, 1e-3));
    assert_eq!(path.points().len(), 1);
}

#[test]
fn append_no_lane_change_follows_the_mask() {
    let net = Network::from_pools(synthetic::three_lane_road().unwrap());
    let mut path = Path::new();
    path.initialize(&net, &on_lane(&net, "R1", 0, 900.0));

    assert!(!path.append_no_lane_change(&net, 1 << 5, Distance::meters(10.0)));
    assert!(path.append_no_lane_change(&net, 1 << 2, Distance::meters(200.0)));
    match &path.points()[0] {
        PathPoint::Road { lanes, .. } => {
            assert_eq!(lanes.len(), 1);
            assert_eq!(net.lane(lanes[0].lane).index(), 2);
        }
        PathPoint::Intrsctn { .. } => panic!("should start on a road"),
    }
    match &path.points()[1] {
        PathPoint::Intrsctn { crdrs, .. } => {
            assert_eq!(crdrs.len(), 1);
            assert_eq!(net.crdr(crdrs[0].crdr).src_lane().index(), 2);
        }
        PathPoint::Road { .. } => panic!("expected the crossing"),
    }
    assert!(close(path.get_length(), 200.0, 1e-3));
}

#[test]
fn prepend_reaches_back_over_the_intersection() {
    let net = Network::from_pools(synthetic::straight_road(2).unwrap());
    let mut path = Path::new();
    path.initialize(&net, &on_lane(&net, "R2", 0, 100.0));
    assert!(path.prepend(&net, Distance::meters(300.0)));
    assert_eq!(road_names(&net, &path), vec!["R1", "R2"]);
    assert!(close(path.get_length(), 300.0, 1e-3));
    let start = path.start_pos(&net).unwrap();
    assert!(close(start.get_distance(), 950.0, 1e-3));
    assert!(path.is_valid(&net));

    // I1 is a dead end
    assert!(path.prepend(&net, Distance::meters(5000.0)));
    assert!(close(path.get_length(), 1250.0, 1e-2));
    assert!(!path.prepend(&net, Distance::meters(10.0)));
}

#[test]
fn route_around_the_ring() {
    let net = Network::from_pools(synthetic::ring().unwrap());
    let start = on_lane(&net, "AB", 0, 100.0);
    let end = on_lane(&net, "CD", 0, 100.0);
    let mut path = Path::new();
    let total = path.calculate_route(&net, &start, &end, false, 20).unwrap();

    assert_eq!(road_names(&net, &path), vec!["AB", "BC", "CD"]);
    let by_hand = net.road_by_name("AB").unwrap().length() - Distance::meters(100.0)
        + net.intrsctn_by_name("B").unwrap().crdr_by_local(0).unwrap().length()
        + net.road_by_name("BC").unwrap().length()
        + net.intrsctn_by_name("C").unwrap().crdr_by_local(0).unwrap().length()
        + Distance::meters(100.0);
    assert!(close(total, by_hand.inner_meters(), 1e-2));
    assert!(path.is_valid(&net));
    assert_eq!(path.end_pos(&net).unwrap(), end);
}

#[test]
fn route_behind_the_start_goes_all_the_way_around() {
    let net = Network::from_pools(synthetic::ring().unwrap());
    let start = on_lane(&net, "AB", 0, 300.0);
    let end = on_lane(&net, "AB", 0, 100.0);
    let mut path = Path::new();
    assert!(path.calculate_route(&net, &start, &end, true, 20).is_some());
    assert_eq!(road_names(&net, &path), vec!["AB", "BC", "CD", "DA", "AB"]);
    assert!(path.is_valid(&net));
}

#[test]
fn route_search_gives_up_within_its_budget() {
    let net = Network::from_pools(synthetic::ring().unwrap());
    let start = on_lane(&net, "AB", 0, 100.0);
    let end = on_lane(&net, "DA", 0, 100.0);
    let mut path = Path::new();
    path.initialize(&net, &start);
    let before = path.clone();
    assert!(path.calculate_route(&net, &start, &end, false, 2).is_none());
    assert_eq!(path, before);
}

#[test]
fn append_to_a_destination() {
    let net = four_way();
    let mut path = Path::new();
    path.initialize(&net, &on_lane(&net, "North", 0, 100.0));
    assert!(path.append(&net, Distance::meters(20.0), false));

    let target = on_lane(&net, "East", 1, 80.0);
    assert!(path.append_to(&net, &target));
    assert_eq!(road_names(&net, &path), vec!["North", "East"]);
    assert!(path.is_valid(&net));
    assert!(path.contains(&target));
}

#[test]
fn travel_follows_the_path() {
    let net = four_way();
    let mut path = Path::new();
    let c = net.intrsctn_by_name("C").unwrap();
    let inbound = net.road_by_name("North").unwrap().lane(0).unwrap();
    let left = c
        .crdrs_from_lane(inbound.id())
        .into_iter()
        .find(|crdr| crdr.direction() == CrdrDir::Left)
        .unwrap();
    let mut pos = on_lane(&net, "North", 0, 50.0);
    path.initialize(&net, &pos);
    let got = path.append_turn(&net, left.turn_angle(), 1.0, Distance::meters(200.0), false);
    assert!(close(got, 200.0, 0.01));

    assert_eq!(path.travel(&net, &mut pos, Distance::meters(60.0)), TravelResult::WithinCrdr);
    assert_eq!(pos.crdr(&net).unwrap().direction(), CrdrDir::Left);
    assert_eq!(path.travel(&net, &mut pos, Distance::meters(100.0)), TravelResult::PastRoad);
    assert_eq!(pos.road(&net).unwrap().name(), "East");
    assert_eq!(pos.lane(&net).unwrap().direction(), LaneDir::Pos);

    let off_path = on_lane(&net, "South", 0, 50.0);
    let mut moved = off_path.clone();
    assert_eq!(path.travel(&net, &mut moved, Distance::meters(10.0)), TravelResult::Error);
    assert_eq!(moved, off_path);
}

#[test]
fn things_ahead_on_the_path() {
    let net = four_way();
    let start = on_lane(&net, "West", 0, 50.0);
    let mut path = Path::new();
    path.initialize(&net, &start);
    assert!(path.append(&net, Distance::meters(300.0), false));
    assert_eq!(road_names(&net, &path)[1], "East");

    let crossing = path.intrsctns_ahead(&start, Distance::meters(300.0));
    assert_eq!(crossing.len(), 1);
    assert_eq!(net.intrsctn(crossing[0].item).name(), "C");
    assert!(close(crossing[0].dist, 50.0, 1e-3));

    // The stop line on the straight corridor
    let holds = path.hld_ofs_ahead(&net, &start, Distance::meters(300.0));
    assert_eq!(holds.len(), 1);
    assert!(close(holds[0].dist, 51.0, 1e-3));
    assert!(path.hld_ofs_ahead(&net, &start, Distance::meters(40.0)).is_empty());

    // The barrel, 100 along East, past a 60 long crossing
    let objs = path.static_objs_ahead(&net, &start, Distance::meters(300.0));
    assert_eq!(objs.len(), 1);
    assert_eq!(net.static_obj(objs[0].item).name(), "barrel");
    assert!(close(objs[0].dist, 210.0, 0.5));
}

#[test]
fn path_string_round_trip() {
    let net = four_way();
    let mut path = Path::new();
    path.initialize(&net, &on_lane(&net, "South", 0, 123.25));
    assert!(path.append(&net, Distance::meters(400.0), false));
    let raw = path.get_string(&net);
    assert_eq!(Path::parse(&net, &raw).unwrap(), path);

    let mut copy = path.clone();
    assert!(copy.set_string(&net, "r:Nowhere:0@1@2").is_err());
    assert!(copy.set_string(&net, "x:C:0@1@2").is_err());
    assert_eq!(copy, path);
}
