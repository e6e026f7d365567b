use enumset::EnumSet;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use geom::{Pt2D, Pt3D};
use lri::{
    square_border, synthetic, Builder, CrdrDir, CrdrSpec, HldOfsSpec, HoldReason, LaneDir,
    LaneSpec, Pools, RoadSpec,
};
use netutil::Timer;

fn close(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

#[test]
fn straight_road_lengths() {
    let pools = synthetic::straight_road(2).unwrap();
    let r1 = pools.road_by_name("R1").unwrap();
    let road = pools.roads.get(r1).unwrap();
    assert!(close(road.lin_length, 1000.0, 1e-9));
    assert!(close(road.cubic_length, 1000.0, 1e-6));
    assert_eq!(road.n_cntrl_pnts, 11);

    let cps = pools.cntrl_pnts.slice(road.cntrl_pnt_idx, road.n_cntrl_pnts);
    for (idx, cp) in cps.iter().enumerate() {
        assert!(close(cp.cummulative_lin_dist, 100.0 * idx as f64, 1e-9));
        assert!(cp.radius.is_infinite());
        // Looking east, right is south
        assert!(close(cp.right_linear.j, -1.0, 1e-9));
    }
}

#[test]
fn lanes_partition_the_width() {
    let pools = synthetic::three_lane_road().unwrap();
    for (_, road) in pools.roads.iter() {
        let cps = pools.cntrl_pnts.slice(road.cntrl_pnt_idx, road.n_cntrl_pnts);
        for cp in cps {
            let lanes = pools.lanes.slice(cp.lane_idx, cp.n_lanes);
            let total: f64 = lanes.iter().map(|l| l.width).sum();
            assert!(close(total, cp.logical_width, 1e-9));
            let mut left_edge = -total / 2.0;
            for lane in lanes {
                assert!(close(lane.offset - lane.width / 2.0, left_edge, 1e-9));
                left_edge += lane.width;
            }
        }
    }
}

#[test]
fn curved_roads_are_longer_than_their_chords() {
    let pools = synthetic::ring().unwrap();
    for (id, road) in pools.roads.iter() {
        assert!(road.cubic_length >= road.lin_length - 1e-6, "{}", id);
        let cps = pools.cntrl_pnts.slice(road.cntrl_pnt_idx, road.n_cntrl_pnts);
        // The middle control point sits on the bulge
        assert!(cps[2].radius.is_finite());
        assert!(cps[2].radius > 100.0);
    }
}

#[test]
fn four_way_corridors() {
    let pools = synthetic::four_way().unwrap();
    let c = pools.intrsctn_by_name("C").unwrap();
    let crdrs = pools.intrsctn_crdrs(c);
    assert_eq!(crdrs.len(), 12);

    let mut per_dir = std::collections::BTreeMap::new();
    for id in &crdrs {
        let crdr = pools.crdrs.get(*id).unwrap();
        *per_dir.entry(format!("{:?}", crdr.direction)).or_insert(0) += 1;
        assert_eq!(crdr.n_mrgs, 11);
        let hlds = pools.hld_ofs.slice(crdr.hld_ofs_idx, crdr.n_hld_ofs);
        assert!(!hlds.is_empty());
        assert!(hlds.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
        assert!(pools.objs.contains(hlds[0].obj));
    }
    assert_eq!(per_dir["Straight"], 4);
    assert_eq!(per_dir["Left"], 4);
    assert_eq!(per_dir["Right"], 4);

    // Every left turn crosses the opposing straight corridor
    let east = pools.road_by_name("East").unwrap();
    let west = pools.road_by_name("West").unwrap();
    let south = pools.road_by_name("South").unwrap();
    let left = pools
        .find_crdr(
            pools.road_lane(east, 0).unwrap(),
            pools.road_lane(south, 1).unwrap(),
        )
        .unwrap();
    let opposing = pools
        .find_crdr(
            pools.road_lane(west, 0).unwrap(),
            pools.road_lane(east, 1).unwrap(),
        )
        .unwrap();
    let rec = pools.crdrs.get(left).unwrap();
    assert_eq!(rec.direction, CrdrDir::Left);
    let mrg = pools
        .crdr_mrgs
        .slice(rec.mrg_idx, rec.n_mrgs)
        .iter()
        .find(|m| m.other == opposing)
        .unwrap();
    assert!(mrg.crosses());
    assert!(mrg.overlaps());
    assert!(mrg.first_dist <= mrg.cross_dist && mrg.cross_dist <= mrg.last_dist);
}

#[test]
fn grid_covers_every_corridor() {
    let pools = synthetic::four_way().unwrap();
    for (_, i) in pools.intrsctns.iter() {
        let cells = pools.grids.slice(i.grid_idx, i.n_grid_cols * i.n_grid_rows);
        let all = cells.iter().fold(0_u64, |acc, cell| acc | cell.crdr_mask);
        let expected = if i.n_crdrs == 64 {
            u64::MAX
        } else {
            (1_u64 << i.n_crdrs) - 1
        };
        assert_eq!(all, expected);
    }
}

#[test]
fn random_polylines_build() {
    let mut rng = XorShiftRng::seed_from_u64(7);
    for _ in 0..10 {
        let mut b = Builder::new();
        let i1 = b.add_intersection("a", square_border(Pt2D::new(-10.0, 0.0), 10.0), 0.0);
        let i2 = b.add_intersection("b", square_border(Pt2D::new(1000.0, 0.0), 10.0), 0.0);
        let mut pts = Vec::new();
        for step in 0..10 {
            pts.push(Pt3D::new(
                100.0 * step as f64 + rng.gen_range(-20.0..20.0),
                rng.gen_range(-50.0..50.0),
                rng.gen_range(0.0..5.0),
            ));
        }
        b.add_road(RoadSpec::new(
            "wiggly",
            i1,
            i2,
            pts,
            vec![LaneSpec::new(10.0, LaneDir::Pos)],
        ))
        .unwrap();
        let pools = b.finish(&mut Timer::throwaway()).unwrap();
        let road = pools.roads.get(pools.road_by_name("wiggly").unwrap()).unwrap();
        let cps = pools.cntrl_pnts.slice(road.cntrl_pnt_idx, road.n_cntrl_pnts);
        for pair in cps.windows(2) {
            // The spline passes through both control points
            assert!(pair[0].hermite.position(1.0).approx_eq(pair[1].location, 1e-6));
            assert!(pair[0].dist_to_next_cubic >= pair[0].dist_to_next_lin - 1e-6);
        }
        assert!(close(road.cubic_length, cps[cps.len() - 1].cummulative_cubic_dist, 1e-9));
    }
}

#[test]
fn builder_rejects_bad_input() {
    let mut b = Builder::new();
    let i1 = b.add_intersection("a", square_border(Pt2D::new(0.0, 0.0), 10.0), 0.0);
    let i2 = b.add_intersection("b", square_border(Pt2D::new(100.0, 0.0), 10.0), 0.0);
    let pos = vec![LaneSpec::new(10.0, LaneDir::Pos)];

    // Coincident points
    let degenerate = b
        .add_road(RoadSpec::new(
            "dup",
            i1,
            i2,
            vec![Pt3D::new(10.0, 0.0, 0.0), Pt3D::new(10.0, 0.0, 0.0)],
            pos.clone(),
        ))
        .unwrap();
    let road = b
        .add_road(RoadSpec::new(
            "ok",
            i1,
            i2,
            vec![Pt3D::new(10.0, 0.0, 0.0), Pt3D::new(90.0, 0.0, 0.0)],
            pos,
        ))
        .unwrap();
    // A positive lane flows into its destination, so it can't leave from its source
    assert!(b.add_corridor(i1, CrdrSpec::new(road, 0, road, 0)).is_err());
    assert!(b
        .add_corridor(i2, CrdrSpec::new(road, 3, degenerate, 0))
        .is_err());
    assert!(b.finish(&mut Timer::throwaway()).is_err());
}

#[test]
fn hold_offsets_are_sorted_on_build() {
    let mut b = Builder::new();
    let i1 = b.add_intersection("a", square_border(Pt2D::new(-10.0, 0.0), 10.0), 0.0);
    let i2 = b.add_intersection("b", square_border(Pt2D::new(110.0, 0.0), 20.0), 0.0);
    let i3 = b.add_intersection("c", square_border(Pt2D::new(230.0, 0.0), 10.0), 0.0);
    let lanes = vec![LaneSpec::new(10.0, LaneDir::Pos)];
    let r1 = b
        .add_road(RoadSpec::new(
            "r1",
            i1,
            i2,
            vec![Pt3D::new(0.0, 0.0, 0.0), Pt3D::new(90.0, 0.0, 0.0)],
            lanes.clone(),
        ))
        .unwrap();
    let r2 = b
        .add_road(RoadSpec::new(
            "r2",
            i2,
            i3,
            vec![Pt3D::new(130.0, 0.0, 0.0), Pt3D::new(220.0, 0.0, 0.0)],
            lanes,
        ))
        .unwrap();
    let crdr = b.add_corridor(i2, CrdrSpec::new(r1, 0, r2, 0)).unwrap();
    for (dist, reason) in [
        (30.0, HoldReason::Overlap),
        (5.0, HoldReason::Sign),
        (30.0, HoldReason::TrafficLight),
    ] {
        b.add_hold_offset(crdr, HldOfsSpec::new(dist, EnumSet::only(reason)))
            .unwrap();
    }
    let pools: Pools = b.finish(&mut Timer::throwaway()).unwrap();
    let rec = pools.crdrs.ids().next().map(|id| pools.crdrs.get(id).unwrap()).unwrap();
    let reasons: Vec<_> = pools
        .hld_ofs
        .slice(rec.hld_ofs_idx, rec.n_hld_ofs)
        .iter()
        .map(|h| (h.distance, h.reason))
        .collect();
    // Ties keep the order they were added in
    assert_eq!(
        reasons,
        vec![
            (5.0, EnumSet::only(HoldReason::Sign)),
            (30.0, EnumSet::only(HoldReason::Overlap)),
            (30.0, EnumSet::only(HoldReason::TrafficLight)),
        ]
    );
}
