//! Small networks assembled in code, for tests and experiments. Lane widths are 12 units; every
//! network is flat at z = 0 unless noted.

use anyhow::Result;
use enumset::EnumSet;

use geom::{Pt2D, Pt3D, Vector3D};
use netutil::Timer;

use crate::{
    square_border, AttrSpec, Builder, CrdrSpec, HldOfsSpec, HoldReason, IntrsctnID, LaneDir,
    LaneSpec, ObjSpec, ObjectKind, Pools, RoadID, RoadSpec,
};

pub const LANE_WIDTH: f64 = 12.0;
/// The attribute ID marking highways in these networks.
pub const HIGHWAY_ATTR: u32 = 9;

fn pts(coords: &[(f64, f64)]) -> Vec<Pt3D> {
    coords.iter().map(|(x, y)| Pt3D::new(*x, *y, 0.0)).collect()
}

/// A straight polyline with a control point every `step`.
fn straight(from: (f64, f64), to: (f64, f64), step: f64) -> Vec<Pt3D> {
    let len = ((to.0 - from.0).powi(2) + (to.1 - from.1).powi(2)).sqrt();
    let n = (len / step).ceil().max(1.0) as usize;
    (0..=n)
        .map(|i| {
            let pct = i as f64 / n as f64;
            Pt3D::new(
                from.0 + (to.0 - from.0) * pct,
                from.1 + (to.1 - from.1) * pct,
                0.0,
            )
        })
        .collect()
}

/// I1 - R1 - I2 - R2 - I3, running east. R1 is 1000 long and R2 500; every lane flows east. I2
/// has one straight corridor per lane, 150 long. I1 and I3 are dead ends.
pub fn straight_road(n_lanes: usize) -> Result<Pools> {
    let mut b = Builder::new();
    let i1 = b.add_intersection("I1", square_border(Pt2D::new(-20.0, 0.0), 20.0), 0.0);
    let i2 = b.add_intersection("I2", square_border(Pt2D::new(1075.0, 0.0), 75.0), 0.0);
    let i3 = b.add_intersection("I3", square_border(Pt2D::new(1670.0, 0.0), 20.0), 0.0);

    let lanes = vec![LaneSpec::new(LANE_WIDTH, LaneDir::Pos); n_lanes];
    let r1 = b.add_road(RoadSpec::new(
        "R1",
        i1,
        i2,
        straight((0.0, 0.0), (1000.0, 0.0), 100.0),
        lanes.clone(),
    ))?;
    let r2 = b.add_road(RoadSpec::new(
        "R2",
        i2,
        i3,
        straight((1150.0, 0.0), (1650.0, 0.0), 100.0),
        lanes,
    ))?;
    for lane in 0..n_lanes as u32 {
        b.add_corridor(i2, CrdrSpec::new(r1, lane, r2, lane))?;
    }
    b.finish(&mut Timer::throwaway())
}

/// `straight_road` with three lanes.
pub fn three_lane_road() -> Result<Pools> {
    straight_road(3)
}

/// A four-way crossing "C" at the origin. Roads "North", "South", "East" and "West" run outwards
/// from it, each with an inbound lane 0 and an outbound lane 1, and end at intersections "N",
/// "S", "E" and "W", where a U-turn corridor joins the two lanes. From every inbound lane, C has a
/// straight, left and right corridor. Every corridor at C has a stop line at 1.0; left turns
/// also hold at 10.0 for the opposing traffic. East and West are highways. An obstacle sits on
/// East at distance 100.
pub fn four_way() -> Result<Pools> {
    let mut b = Builder::new();
    let c = b.add_intersection("C", square_border(Pt2D::new(0.0, 0.0), 30.0), 0.0);

    let arms = [
        ("North", "N", (0.0, 1.0)),
        ("East", "E", (1.0, 0.0)),
        ("South", "S", (0.0, -1.0)),
        ("West", "W", (-1.0, 0.0)),
    ];
    let lanes = vec![
        LaneSpec::new(LANE_WIDTH, LaneDir::Neg),
        LaneSpec::new(LANE_WIDTH, LaneDir::Pos),
    ];
    let mut roads: Vec<(RoadID, IntrsctnID)> = Vec::new();
    for (road_name, end_name, (dx, dy)) in arms {
        let end = b.add_intersection(
            end_name,
            square_border(Pt2D::new(320.0 * dx, 320.0 * dy), 20.0),
            0.0,
        );
        let road = b.add_road(RoadSpec::new(
            road_name,
            c,
            end,
            straight((30.0 * dx, 30.0 * dy), (300.0 * dx, 300.0 * dy), 50.0),
            lanes.clone(),
        ))?;
        // Outbound lane back into the inbound one
        b.add_corridor(end, CrdrSpec::new(road, 1, road, 0))?;
        roads.push((road, end));
    }

    for (idx, (from, _)) in roads.iter().enumerate() {
        let sign = b.add_static_object(ObjSpec {
            name: format!("stop sign {}", idx + 1),
            kind: ObjectKind::TrafficSign,
            sol_id: 1,
            flags: 0,
            position: Pt3D::new(0.0, 0.0, 0.0),
            tangent: Vector3D::new(1.0, 0.0, 0.0),
            size: Vector3D::new(0.5, 2.0, 7.0),
        });
        // Arms are listed clockwise, so the next one is a left turn, the previous one a right
        // turn, and the opposite one straight.
        for offset in [1, 2, 3] {
            let (to, _) = roads[(idx + offset) % roads.len()];
            let crdr = b.add_corridor(c, CrdrSpec::new(*from, 0, to, 1))?;
            let mut stop = HldOfsSpec::new(1.0, EnumSet::only(HoldReason::Sign));
            stop.obj = sign;
            b.add_hold_offset(crdr, stop)?;
            if offset == 1 {
                b.add_hold_offset(crdr, HldOfsSpec::new(10.0, EnumSet::only(HoldReason::Overlap)))?;
            }
        }
    }

    for (road, _) in [roads[1], roads[3]] {
        b.add_road_attr(road, AttrSpec::new(HIGHWAY_ATTR, "Highway", 1.0))?;
    }
    let mut limit = AttrSpec::new(1, "SpeedLimit", 35.0);
    limit.from = 50.0;
    limit.to = 150.0;
    b.add_road_attr(roads[0].0, limit)?;

    let obstacle = b.add_static_object(ObjSpec {
        name: "barrel".to_string(),
        kind: ObjectKind::Obstacle,
        sol_id: 2,
        flags: 0,
        position: Pt3D::new(130.0, -6.0, 0.0),
        tangent: Vector3D::new(1.0, 0.0, 0.0),
        size: Vector3D::new(2.0, 2.0, 3.0),
    });
    b.attach_obj_to_road(obstacle, roads[1].0, 100.0)?;

    b.finish(&mut Timer::throwaway())
}

/// Four one-lane, one-way roads bent slightly outwards, joined at four corner intersections
/// into a counter-clockwise loop. Every intersection has one left-turning corridor.
pub fn ring() -> Result<Pools> {
    let mut b = Builder::new();
    let corners = [(0.0, 0.0), (500.0, 0.0), (500.0, 500.0), (0.0, 500.0)];
    let names = ["A", "B", "C", "D"];
    let ids: Vec<IntrsctnID> = corners
        .iter()
        .zip(names.iter())
        .map(|((x, y), name)| b.add_intersection(name, square_border(Pt2D::new(*x, *y), 20.0), 0.0))
        .collect();

    let lanes = vec![LaneSpec::new(LANE_WIDTH, LaneDir::Pos)];
    let mut roads = Vec::new();
    for i in 0..4 {
        let (x1, y1) = corners[i];
        let (x2, y2) = corners[(i + 1) % 4];
        let (dx, dy) = ((x2 - x1) / 500.0, (y2 - y1) / 500.0);
        // The outward side is to the right of travel
        let (ox, oy) = (dy, -dx);
        let road = b.add_road(RoadSpec::new(
            &format!("{}{}", names[i], names[(i + 1) % 4]),
            ids[i],
            ids[(i + 1) % 4],
            pts(&[
                (x1 + 20.0 * dx, y1 + 20.0 * dy),
                (x1 + 130.0 * dx + 12.0 * ox, y1 + 130.0 * dy + 12.0 * oy),
                (x1 + 250.0 * dx + 20.0 * ox, y1 + 250.0 * dy + 20.0 * oy),
                (x1 + 370.0 * dx + 12.0 * ox, y1 + 370.0 * dy + 12.0 * oy),
                (x2 - 20.0 * dx, y2 - 20.0 * dy),
            ]),
            lanes.clone(),
        ))?;
        roads.push(road);
    }
    for i in 0..4 {
        let into = roads[(i + 3) % 4];
        b.add_corridor(ids[i], CrdrSpec::new(into, 0, roads[i], 0))?;
    }
    b.finish(&mut Timer::throwaway())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_networks_build() {
        let straight = straight_road(2).unwrap();
        assert_eq!(straight.roads.len(), 2);
        assert_eq!(straight.crdrs.len(), 2);

        let four_way = four_way().unwrap();
        assert_eq!(four_way.intrsctns.len(), 5);
        assert_eq!(four_way.crdrs.len(), 16);

        let ring = ring().unwrap();
        assert_eq!(ring.roads.len(), 4);
        assert_eq!(ring.crdrs.len(), 4);
    }
}
