use geom::{Distance, Line, Pt2D, Pt3D};

use super::{CrdrPos, OnIntrsctn, OnRoad, RoadPos};
use crate::network::Located;
use crate::{Intersection, Network, Road};

// Projections this far past either end of a segment still count as on it, so points exactly on
// a control point aren't lost between segments.
const T_TOLERANCE: f64 = 1e-9;

impl RoadPos {
    /// The position on the network nearest to `pt`, looking only at roads and intersections
    /// whose surface is within the vertical snap tolerance.
    pub fn from_xyz(net: &Network, pt: Pt3D) -> Option<RoadPos> {
        locate(net, pt.to_2d(), Some(pt.z))
    }

    /// Ignores elevation entirely.
    pub fn from_xy(net: &Network, pt: Pt2D) -> Option<RoadPos> {
        locate(net, pt, None)
    }

    /// Rebinds to the nearest position to `pt`. On a miss, returns false and changes nothing.
    pub fn set_xyz(&mut self, net: &Network, pt: Pt3D) -> bool {
        match RoadPos::from_xyz(net, pt) {
            Some(pos) => {
                *self = pos;
                true
            }
            None => false,
        }
    }

    pub fn set_xy(&mut self, net: &Network, pt: Pt2D) -> bool {
        match RoadPos::from_xy(net, pt) {
            Some(pos) => {
                *self = pos;
                true
            }
            None => false,
        }
    }
}

/// Every candidate whose footprint holds the point is scored by its unsigned lateral distance
/// from the centerline; the lowest wins.
pub(crate) fn locate(net: &Network, pt: Pt2D, z: Option<f64>) -> Option<RoadPos> {
    let snap = net.config().terrain_snap;
    let mut best: Option<(f64, RoadPos)> = None;
    for candidate in net.candidates_at(pt) {
        let found = match candidate {
            Located::Piece(id) => net
                .pools()
                .road_pieces
                .get(id)
                .and_then(|piece| {
                    let road = net.road(piece.road);
                    let first = road.rec().cntrl_pnt_idx.0;
                    let range = (piece.first_cp.0 - first) as usize..(piece.last_cp.0 - first) as usize;
                    on_road_segments(net, road, range, pt, z, snap)
                }),
            Located::Intrsctn(id) => in_intrsctn(net.intrsctn(id), pt, z, snap),
        };
        if let Some((score, pos)) = found {
            if best.as_ref().map(|(s, _)| score < *s).unwrap_or(true) {
                best = Some((score, pos));
            }
        }
    }
    if best.is_none() {
        debug!("Nothing on the network near {}", pt);
    }
    best.map(|(_, pos)| pos)
}

/// Checks segments `range.start..range.end`, each running from that control point to the next.
fn on_road_segments(
    net: &Network,
    road: Road,
    range: std::ops::Range<usize>,
    pt: Pt2D,
    z: Option<f64>,
    snap: f64,
) -> Option<(f64, RoadPos)> {
    let cps = road.cntrl_pnts();
    let mut best: Option<(f64, RoadPos)> = None;
    for idx in range {
        let (a, b) = match (cps.get(idx), cps.get(idx + 1)) {
            (Some(a), Some(b)) => (a, b),
            _ => continue,
        };
        let (t, lateral) = match Line::new(a.location.to_2d(), b.location.to_2d()).project(pt) {
            Some(x) => x,
            None => continue,
        };
        if t < -T_TOLERANCE || t > 1.0 + T_TOLERANCE {
            continue;
        }
        let t = t.clamp(0.0, 1.0);
        let distance = Distance::meters(a.cummulative_cubic_dist + t * a.dist_to_next_cubic);
        let lateral = Distance::meters(lateral);
        if lateral.abs() > road.physical_width_at(distance) / 2.0 {
            continue;
        }
        if let Some(z) = z {
            let surface = a.location.lerp(b.location, t).z + road.profile_height(distance, lateral);
            if (z - surface).abs() > snap {
                continue;
            }
        }
        let score = lateral.inner_meters().abs();
        if best.as_ref().map(|(s, _)| score >= *s).unwrap_or(false) {
            continue;
        }

        // The lane whose span holds the point, or the nearest one when it's on the shoulder
        let lanes: Vec<_> = road.lanes().collect();
        let lane = lanes
            .iter()
            .find(|l| (lateral - l.offset_at(distance)).abs() <= l.width_at(distance) / 2.0)
            .or_else(|| {
                lanes
                    .iter()
                    .min_by_key(|l| (lateral - l.offset_at(distance)).abs())
            })?;
        best = Some((
            score,
            RoadPos::Road(OnRoad {
                road: road.id(),
                lane: lane.id(),
                distance,
                offset: (lateral - lane.offset_at(distance)) * lane.direction().sign(),
                cntrl_pnt: idx,
            }),
        ));
    }
    best
}

fn in_intrsctn(i: Intersection, pt: Pt2D, z: Option<f64>, snap: f64) -> Option<(f64, RoadPos)> {
    if !i.contains_xy(pt) {
        return None;
    }
    if let Some(z) = z {
        if (z - i.elevation_at(pt)).abs() > snap {
            return None;
        }
    }

    let mut within = Vec::new();
    let mut nearest: Option<CrdrPos> = None;
    for crdr in i.crdrs_near(pt) {
        let (distance, offset) = match crdr.project(pt) {
            Some(x) => x,
            None => continue,
        };
        let cp = CrdrPos {
            crdr: crdr.id(),
            distance,
            offset,
        };
        if offset.abs() <= crdr.width_at(distance) / 2.0 {
            within.push(cp);
        }
        if nearest.map(|n| offset.abs() < n.offset.abs()).unwrap_or(true) {
            nearest = Some(cp);
        }
    }
    if within.is_empty() {
        within.extend(nearest);
    }
    // The corridor nearest its centerline takes priority
    let priority = within
        .iter()
        .enumerate()
        .min_by_key(|(_, cp)| cp.offset.abs())
        .map(|(idx, _)| idx)?;
    let score = within[priority].offset.inner_meters().abs();
    Some((
        score,
        RoadPos::Intrsctn(OnIntrsctn {
            intrsctn: i.id(),
            crdrs: within,
            priority,
        }),
    ))
}
