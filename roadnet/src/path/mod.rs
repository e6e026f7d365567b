//! A planned or travelled route: a run of connected road stretches and intersection crossings.

mod append;
mod route;
mod string;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use geom::Distance;
use lri::{CrdrID, HldOfsID, IntrsctnID, LaneID, ObjID, RoadID};

use crate::{Network, RoadPos, TravelResult, TurnDir};

/// The stretch `start` to `end` of one lane, in road distance. For lanes flowing against the
/// road, `start` is the larger.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneRange {
    pub lane: LaneID,
    pub start: Distance,
    pub end: Distance,
}

/// The stretch `start` to `end` of one corridor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrdrRange {
    pub crdr: CrdrID,
    pub start: Distance,
    pub end: Distance,
}

/// One road or intersection along a path. The first lane or corridor listed is the primary one;
/// the rest are alternatives covering the same stretch. Every lane of a road point flows the same
/// way.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PathPoint {
    Road { road: RoadID, lanes: Vec<LaneRange> },
    Intrsctn { intrsctn: IntrsctnID, crdrs: Vec<CrdrRange> },
}

impl PathPoint {
    pub fn is_road(&self) -> bool {
        matches!(self, PathPoint::Road { .. })
    }

    /// How far the primary lane or corridor is covered.
    pub fn length(&self) -> Distance {
        match self {
            PathPoint::Road { lanes, .. } => lanes
                .first()
                .map(|l| (l.end - l.start).abs())
                .unwrap_or(Distance::ZERO),
            PathPoint::Intrsctn { crdrs, .. } => crdrs
                .first()
                .map(|c| c.end - c.start)
                .unwrap_or(Distance::ZERO),
        }
    }

    /// Whether the position lies within one of this point's ranges.
    fn covers(&self, pos: &RoadPos) -> bool {
        match (self, pos) {
            (PathPoint::Road { road, lanes }, RoadPos::Road(r)) => {
                *road == r.road
                    && lanes.iter().any(|l| {
                        l.lane == r.lane
                            && r.distance >= l.start.min(l.end)
                            && r.distance <= l.start.max(l.end)
                    })
            }
            (PathPoint::Intrsctn { intrsctn, crdrs }, RoadPos::Intrsctn(i)) => {
                *intrsctn == i.intrsctn
                    && crdrs.iter().any(|c| {
                        i.crdrs.iter().any(|cp| {
                            cp.crdr == c.crdr && cp.distance >= c.start && cp.distance <= c.end
                        })
                    })
            }
            _ => false,
        }
    }

    /// How far along this point's primary range the position is, from its start.
    fn progress(&self, pos: &RoadPos) -> Distance {
        match (self, pos) {
            (PathPoint::Road { lanes, .. }, RoadPos::Road(r)) => match lanes.first() {
                Some(l) => (r.distance - l.start).abs(),
                None => Distance::ZERO,
            },
            (PathPoint::Intrsctn { crdrs, .. }, RoadPos::Intrsctn(i)) => {
                let c = match crdrs.first() {
                    Some(c) => c,
                    None => return Distance::ZERO,
                };
                let d = i
                    .crdrs
                    .iter()
                    .find(|cp| cp.crdr == c.crdr)
                    .map(|cp| cp.distance)
                    .unwrap_or_else(|| pos.get_distance());
                (d - c.start).max(Distance::ZERO)
            }
            _ => Distance::ZERO,
        }
    }
}

/// Something on the path ahead of a position, and how far along the path it is.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Upcoming<T> {
    pub item: T,
    pub dist: Distance,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: VecDeque<PathPoint>,
}

impl Path {
    pub fn new() -> Path {
        Path {
            points: VecDeque::new(),
        }
    }

    pub fn points(&self) -> &VecDeque<PathPoint> {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Starts over with a zero-length path at `pos`. On a road, every lane flowing the same way
    /// is included, with the position's lane first.
    pub fn initialize(&mut self, net: &Network, pos: &RoadPos) {
        self.points.clear();
        let point = match pos {
            RoadPos::Road(r) => {
                let dir = net.lane(r.lane).direction();
                let mut lanes = vec![LaneRange {
                    lane: r.lane,
                    start: r.distance,
                    end: r.distance,
                }];
                for lane in net.road(r.road).lanes_in_dir(dir) {
                    if lane.id() != r.lane {
                        lanes.push(LaneRange {
                            lane: lane.id(),
                            start: r.distance,
                            end: r.distance,
                        });
                    }
                }
                PathPoint::Road {
                    road: r.road,
                    lanes,
                }
            }
            RoadPos::Intrsctn(i) => {
                let primary = *i.primary();
                let mut crdrs = vec![CrdrRange {
                    crdr: primary.crdr,
                    start: primary.distance,
                    end: primary.distance,
                }];
                for cp in &i.crdrs {
                    if cp.crdr != primary.crdr {
                        crdrs.push(CrdrRange {
                            crdr: cp.crdr,
                            start: cp.distance,
                            end: cp.distance,
                        });
                    }
                }
                PathPoint::Intrsctn {
                    intrsctn: i.intrsctn,
                    crdrs,
                }
            }
        };
        self.points.push_back(point);
    }

    pub fn get_length(&self) -> Distance {
        self.points.iter().map(|p| p.length()).sum()
    }

    pub fn contains(&self, pos: &RoadPos) -> bool {
        self.index_of(pos).is_some()
    }

    /// The first point covering the position.
    pub fn index_of(&self, pos: &RoadPos) -> Option<usize> {
        self.points.iter().position(|p| p.covers(pos))
    }

    /// How much of the path is left from `pos` to its end, along the primary ranges.
    pub fn remaining(&self, pos: &RoadPos) -> Option<Distance> {
        let idx = self.index_of(pos)?;
        let ahead: Distance = self.points.iter().skip(idx).map(|p| p.length()).sum();
        Some(ahead - self.points[idx].progress(pos))
    }

    /// Drops every point before the one covering `pos`, returning how many went. A position off
    /// the path drops nothing.
    pub fn discard_behind(&mut self, pos: &RoadPos) -> usize {
        let idx = self.index_of(pos).unwrap_or(0);
        self.points.drain(..idx);
        idx
    }

    /// Every ID binds, lanes belong to their road and flow one way, corridors belong to their
    /// intersection, and consecutive points connect.
    pub fn is_valid(&self, net: &Network) -> bool {
        if self.points.is_empty() {
            return false;
        }
        for point in &self.points {
            match point {
                PathPoint::Road { road, lanes } => {
                    if net.try_road(*road).is_err() || lanes.is_empty() {
                        return false;
                    }
                    let mut dir = None;
                    for l in lanes {
                        let lane = match net.try_lane(l.lane) {
                            Ok(lane) => lane,
                            Err(_) => return false,
                        };
                        if lane.road().id() != *road
                            || dir.map(|d| d != lane.direction()).unwrap_or(false)
                        {
                            return false;
                        }
                        dir = Some(lane.direction());
                    }
                }
                PathPoint::Intrsctn { intrsctn, crdrs } => {
                    if net.try_intrsctn(*intrsctn).is_err() || crdrs.is_empty() {
                        return false;
                    }
                    for c in crdrs {
                        match net.try_crdr(c.crdr) {
                            Ok(crdr) if crdr.rec().intrsctn == *intrsctn => {}
                            _ => return false,
                        }
                    }
                }
            }
        }
        for pair in self.points.iter().collect::<Vec<_>>().windows(2) {
            let ok = match (pair[0], pair[1]) {
                (PathPoint::Road { road, lanes }, PathPoint::Intrsctn { crdrs, .. }) => {
                    crdrs.iter().all(|c| {
                        let rec = net.crdr(c.crdr).rec();
                        rec.src_road == *road && lanes.iter().any(|l| l.lane == rec.src_lane)
                    })
                }
                (PathPoint::Intrsctn { crdrs, .. }, PathPoint::Road { road, lanes }) => {
                    crdrs.iter().all(|c| {
                        let rec = net.crdr(c.crdr).rec();
                        rec.dst_road == *road && lanes.iter().any(|l| l.lane == rec.dst_lane)
                    })
                }
                _ => false,
            };
            if !ok {
                return false;
            }
        }
        true
    }

    /// The last position on the path, on its primary lane or corridor.
    pub fn end_pos(&self, net: &Network) -> Option<RoadPos> {
        match self.points.back()? {
            PathPoint::Road { road, lanes } => {
                let l = lanes.first()?;
                RoadPos::on_road(net, *road, l.lane, l.end, Distance::ZERO).ok()
            }
            PathPoint::Intrsctn { intrsctn, crdrs } => {
                let c = crdrs.first()?;
                RoadPos::on_crdr(net, *intrsctn, c.crdr, c.end, Distance::ZERO).ok()
            }
        }
    }

    /// The first position on the path, on its primary lane or corridor.
    pub fn start_pos(&self, net: &Network) -> Option<RoadPos> {
        match self.points.front()? {
            PathPoint::Road { road, lanes } => {
                let l = lanes.first()?;
                RoadPos::on_road(net, *road, l.lane, l.start, Distance::ZERO).ok()
            }
            PathPoint::Intrsctn { intrsctn, crdrs } => {
                let c = crdrs.first()?;
                RoadPos::on_crdr(net, *intrsctn, c.crdr, c.start, Distance::ZERO).ok()
            }
        }
    }

    /// Moves `pos` along the path, taking the path's corridors at each intersection. Fails if
    /// the position isn't on the path or the path doesn't leave the way it's going.
    pub fn travel(&self, net: &Network, pos: &mut RoadPos, dist: Distance) -> TravelResult {
        let idx = match self.index_of(pos) {
            Some(idx) => idx,
            None => {
                debug!("{:?} isn't on the path", pos);
                return TravelResult::Error;
            }
        };
        // Corridors still ahead, in order, with the primary corridor of each crossing first
        let ahead: Vec<CrdrID> = self
            .points
            .iter()
            .skip(idx)
            .flat_map(|p| match p {
                PathPoint::Intrsctn { crdrs, .. } => crdrs.iter().map(|c| c.crdr).collect(),
                PathPoint::Road { .. } => Vec::new(),
            })
            .collect();
        pos.travel_by(net, dist, None, |candidates| {
            ahead
                .iter()
                .find(|id| candidates.iter().any(|c| c.id() == **id))
                .copied()
                .or_else(|| {
                    if ahead.is_empty() {
                        TurnDir::Default.choose(candidates)
                    } else {
                        None
                    }
                })
        })
    }

    /// Walks forward from `pos`, calling `visit` with each point still ahead, the distance along
    /// that point's primary range where the walk enters it, and how far along the path that is
    /// from `pos`. Stops once `max_dist` is covered.
    fn walk_ahead<F: FnMut(&PathPoint, Distance, Distance)>(
        &self,
        pos: &RoadPos,
        max_dist: Distance,
        mut visit: F,
    ) {
        let idx = match self.index_of(pos) {
            Some(idx) => idx,
            None => return,
        };
        let mut covered = Distance::ZERO;
        for (n, point) in self.points.iter().enumerate().skip(idx) {
            if covered > max_dist {
                break;
            }
            let progress = if n == idx {
                point.progress(pos)
            } else {
                Distance::ZERO
            };
            visit(point, progress, covered);
            covered += point.length() - progress;
        }
    }

    /// Hold offsets on the path's primary corridors, from `pos` out to `max_dist`.
    pub fn hld_ofs_ahead(
        &self,
        net: &Network,
        pos: &RoadPos,
        max_dist: Distance,
    ) -> Vec<Upcoming<HldOfsID>> {
        let mut found = Vec::new();
        self.walk_ahead(pos, max_dist, |point, progress, covered| {
            if let PathPoint::Intrsctn { crdrs, .. } = point {
                if let Some(c) = crdrs.first() {
                    for h in net.crdr(c.crdr).hld_ofs() {
                        let along = h.distance() - c.start;
                        if along < progress || h.distance() > c.end {
                            continue;
                        }
                        let dist = covered + along - progress;
                        if dist <= max_dist {
                            found.push(Upcoming { item: h.id(), dist });
                        }
                    }
                }
            }
        });
        found
    }

    /// Static objects along the path's primary lanes and corridors, from `pos` out to `max_dist`.
    pub fn static_objs_ahead(
        &self,
        net: &Network,
        pos: &RoadPos,
        max_dist: Distance,
    ) -> Vec<Upcoming<ObjID>> {
        let mut found = Vec::new();
        self.walk_ahead(pos, max_dist, |point, progress, covered| {
            let candidates: Vec<(ObjID, Distance)> = match point {
                PathPoint::Road { road, lanes } => {
                    let l = match lanes.first() {
                        Some(l) => l,
                        None => return,
                    };
                    let sign = net.lane(l.lane).direction().sign();
                    net.road(*road)
                        .static_objs()
                        .into_iter()
                        .filter(|o| o.crdr.is_none())
                        .map(|o| (o.obj, (Distance::meters(o.distance) - l.start) * sign))
                        .filter(|(_, along)| *along <= (l.end - l.start).abs())
                        .collect()
                }
                PathPoint::Intrsctn { crdrs, .. } => {
                    let c = match crdrs.first() {
                        Some(c) => c,
                        None => return,
                    };
                    net.crdr(c.crdr)
                        .static_objs()
                        .into_iter()
                        .map(|o| (o.obj, Distance::meters(o.distance) - c.start))
                        .filter(|(_, along)| *along <= c.end - c.start)
                        .collect()
                }
            };
            for (obj, along) in candidates {
                if along < progress {
                    continue;
                }
                let dist = covered + along - progress;
                if dist <= max_dist {
                    found.push(Upcoming { item: obj, dist });
                }
            }
        });
        found.sort_by_key(|u| u.dist);
        found
    }

    /// Intersections the path enters after `pos`, out to `max_dist`.
    pub fn intrsctns_ahead(&self, pos: &RoadPos, max_dist: Distance) -> Vec<Upcoming<IntrsctnID>> {
        let mut found = Vec::new();
        let mut first = true;
        self.walk_ahead(pos, max_dist, |point, _, covered| {
            if let PathPoint::Intrsctn { intrsctn, .. } = point {
                if !first && covered <= max_dist {
                    found.push(Upcoming {
                        item: *intrsctn,
                        dist: covered,
                    });
                }
            }
            first = false;
        });
        found
    }
}
