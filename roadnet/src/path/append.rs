use geom::{Distance, EPSILON_DIST};
use lri::{CrdrDir, LaneID, RoadID};

use super::{CrdrRange, LaneRange, Path, PathPoint};
use crate::{Corridor, Network, RoadPos};

/// Why an extension stopped short.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Outcome {
    Complete,
    DeadEnd,
    /// Too many intersections in one extension; most likely a cycle.
    Limit,
}

impl PathPoint {
    /// Pushes every range's end toward the far end of its lane or corridor by up to `amount`.
    /// Returns how far the primary range moved.
    fn extend_end(&mut self, net: &Network, amount: Distance) -> Distance {
        let mut primary = Distance::ZERO;
        match self {
            PathPoint::Road { lanes, .. } => {
                for (idx, l) in lanes.iter_mut().enumerate() {
                    let lane = net.lane(l.lane);
                    let sign = lane.direction().sign();
                    let take = amount.min((lane.end_dist() - l.end).abs());
                    l.end = l.end + take * sign;
                    if idx == 0 {
                        primary = take;
                    }
                }
            }
            PathPoint::Intrsctn { crdrs, .. } => {
                for (idx, c) in crdrs.iter_mut().enumerate() {
                    let take = amount.min(net.crdr(c.crdr).length() - c.end);
                    c.end += take;
                    if idx == 0 {
                        primary = take;
                    }
                }
            }
        }
        primary
    }

    /// Pulls every range's start back toward the near end of its lane or corridor.
    fn extend_start(&mut self, net: &Network, amount: Distance) -> Distance {
        let mut primary = Distance::ZERO;
        match self {
            PathPoint::Road { lanes, .. } => {
                for (idx, l) in lanes.iter_mut().enumerate() {
                    let lane = net.lane(l.lane);
                    let sign = lane.direction().sign();
                    let take = amount.min((l.start - lane.start_dist()).abs());
                    l.start = l.start - take * sign;
                    if idx == 0 {
                        primary = take;
                    }
                }
            }
            PathPoint::Intrsctn { crdrs, .. } => {
                for (idx, c) in crdrs.iter_mut().enumerate() {
                    let take = amount.min(c.start);
                    c.start -= take;
                    if idx == 0 {
                        primary = take;
                    }
                }
            }
        }
        primary
    }
}

/// Corridors leaving `lanes`, grouped by the road they lead to. Within a group the corridor
/// from the first lane going straight comes first; groups with a straight corridor come first.
fn group_by_dst<'a>(net: &'a Network, lanes: &[LaneID]) -> Vec<Vec<Corridor<'a>>> {
    let mut groups: Vec<(RoadID, Vec<Corridor<'a>>)> = Vec::new();
    for lane in lanes {
        for crdr in net.lane(*lane).outgoing_crdrs() {
            let dst = crdr.rec().dst_road;
            match groups.iter_mut().find(|(r, _)| *r == dst) {
                Some((_, group)) => group.push(crdr),
                None => groups.push((dst, vec![crdr])),
            }
        }
    }
    let mut groups: Vec<Vec<Corridor>> = groups.into_iter().map(|(_, g)| g).collect();
    for group in &mut groups {
        // Stable, so the first lane's corridors stay ahead of the rest
        group.sort_by_key(|c| c.direction() != CrdrDir::Straight || lanes.first() != Some(&c.rec().src_lane));
    }
    groups.sort_by_key(|g| !g.iter().any(|c| c.direction() == CrdrDir::Straight));
    groups
}

fn crdr_point(crdrs: &[Corridor]) -> PathPoint {
    PathPoint::Intrsctn {
        intrsctn: crdrs[0].rec().intrsctn,
        crdrs: crdrs
            .iter()
            .map(|c| CrdrRange {
                crdr: c.id(),
                start: Distance::ZERO,
                end: Distance::ZERO,
            })
            .collect(),
    }
}

impl Path {
    /// Candidates for the point after the last one, best first.
    fn next_path_points(&self, net: &Network, stay_on_highway: bool, lane_change: bool) -> Vec<PathPoint> {
        match self.points.back() {
            Some(PathPoint::Road { lanes, .. }) => {
                let sources: Vec<LaneID> = if lane_change {
                    lanes.iter().map(|l| l.lane).collect()
                } else {
                    lanes.iter().take(1).map(|l| l.lane).collect()
                };
                if sources.is_empty() {
                    return Vec::new();
                }
                let highway = net.config().highway_attr;
                group_by_dst(net, &sources)
                    .into_iter()
                    .filter(|g| !stay_on_highway || g[0].dst_road().has_attr(highway))
                    .map(|g| crdr_point(&g))
                    .collect()
            }
            Some(PathPoint::Intrsctn { crdrs, .. }) => {
                let first = match crdrs.first() {
                    Some(c) => net.crdr(c.crdr),
                    None => return Vec::new(),
                };
                let dst_road = first.rec().dst_road;
                let dir = first.dst_lane().direction();
                let mut lanes: Vec<LaneRange> = Vec::new();
                for c in crdrs {
                    let lane = net.crdr(c.crdr).dst_lane();
                    if lane.road().id() != dst_road
                        || lane.direction() != dir
                        || lanes.iter().any(|l| l.lane == lane.id())
                    {
                        continue;
                    }
                    lanes.push(LaneRange {
                        lane: lane.id(),
                        start: lane.start_dist(),
                        end: lane.start_dist(),
                    });
                }
                vec![PathPoint::Road {
                    road: dst_road,
                    lanes,
                }]
            }
            None => Vec::new(),
        }
    }

    /// Candidate for the point before the first one.
    fn prev_path_point(&self, net: &Network) -> Option<PathPoint> {
        match self.points.front()? {
            PathPoint::Road { lanes, .. } => {
                let primary = lanes.first()?.lane;
                let mut incoming: Vec<Corridor> = Vec::new();
                for l in lanes {
                    incoming.extend(net.lane(l.lane).incoming_crdrs());
                }
                let pick = incoming
                    .iter()
                    .find(|c| c.direction() == CrdrDir::Straight && c.rec().dst_lane == primary)
                    .or_else(|| incoming.first())?;
                let src_road = pick.rec().src_road;
                let mut crdrs = vec![*pick];
                crdrs.extend(
                    incoming
                        .iter()
                        .filter(|c| c.id() != pick.id() && c.rec().src_road == src_road),
                );
                Some(PathPoint::Intrsctn {
                    intrsctn: pick.rec().intrsctn,
                    crdrs: crdrs
                        .iter()
                        .map(|c| CrdrRange {
                            crdr: c.id(),
                            start: c.length(),
                            end: c.length(),
                        })
                        .collect(),
                })
            }
            PathPoint::Intrsctn { crdrs, .. } => {
                let first = net.crdr(crdrs.first()?.crdr);
                let src_road = first.rec().src_road;
                let dir = first.src_lane().direction();
                let mut lanes: Vec<LaneRange> = Vec::new();
                for c in crdrs {
                    let lane = net.crdr(c.crdr).src_lane();
                    if lane.road().id() != src_road
                        || lane.direction() != dir
                        || lanes.iter().any(|l| l.lane == lane.id())
                    {
                        continue;
                    }
                    lanes.push(LaneRange {
                        lane: lane.id(),
                        start: lane.end_dist(),
                        end: lane.end_dist(),
                    });
                }
                Some(PathPoint::Road {
                    road: src_road,
                    lanes,
                })
            }
        }
    }

    /// Extends the last point, then tries each following candidate in turn. Only a dead end
    /// makes it back up and try the next candidate; the longest attempt is kept.
    fn recursive_append(
        &mut self,
        net: &Network,
        remaining: Distance,
        stay_on_highway: bool,
        lane_change: bool,
        hits: usize,
    ) -> (Distance, Outcome) {
        let took = match self.points.back_mut() {
            Some(point) => point.extend_end(net, remaining),
            None => return (Distance::ZERO, Outcome::DeadEnd),
        };
        let remaining = remaining - took;
        if remaining <= EPSILON_DIST {
            return (took, Outcome::Complete);
        }
        if hits >= net.config().max_intrsctns_hit {
            debug!("Gave up extending a path after {} intersections", hits);
            return (took, Outcome::Limit);
        }

        let base = self.points.len();
        let mut best: Option<(Distance, Outcome, Vec<PathPoint>)> = None;
        for candidate in self.next_path_points(net, stay_on_highway, lane_change) {
            let hits = if candidate.is_road() { hits } else { hits + 1 };
            self.points.push_back(candidate);
            let (got, outcome) = self.recursive_append(net, remaining, stay_on_highway, lane_change, hits);
            if outcome != Outcome::DeadEnd {
                return (took + got, outcome);
            }
            let tail: Vec<PathPoint> = self.points.drain(base..).collect();
            if best.as_ref().map(|(d, _, _)| got > *d).unwrap_or(true) {
                best = Some((got, outcome, tail));
            }
        }
        match best {
            Some((got, outcome, tail)) => {
                self.points.extend(tail);
                (took + got, outcome)
            }
            None => (took, Outcome::DeadEnd),
        }
    }

    /// Extends the path forward by `dist`, choosing the straightest way through intersections
    /// and backing out of dead ends. With `stay_on_highway`, only roads carrying the highway
    /// attribute are entered. False only if nothing could be added.
    pub fn append(&mut self, net: &Network, dist: Distance, stay_on_highway: bool) -> bool {
        if self.points.is_empty() || dist < Distance::ZERO {
            return false;
        }
        if dist == Distance::ZERO {
            return true;
        }
        let (got, _) = self.recursive_append(net, dist, stay_on_highway, true, 0);
        got > Distance::ZERO
    }

    /// Extends to the end of the current road, takes the next corridor turning within `epsilon`
    /// degrees of `turn_angle`, and carries on from there. Returns how far the path grew.
    pub fn append_turn(
        &mut self,
        net: &Network,
        turn_angle: f64,
        epsilon: f64,
        dist: Distance,
        lane_change_allowed: bool,
    ) -> Distance {
        let took = match self.points.back_mut() {
            Some(point) => point.extend_end(net, dist),
            None => return Distance::ZERO,
        };
        let remaining = dist - took;
        if remaining <= EPSILON_DIST {
            return took;
        }
        if !self.points.back().map(|p| p.is_road()).unwrap_or(false) {
            let (got, _) = self.recursive_append(net, remaining, false, lane_change_allowed, 0);
            return took + got;
        }

        let sources: Vec<LaneID> = match self.points.back() {
            Some(PathPoint::Road { lanes, .. }) if lane_change_allowed => {
                lanes.iter().map(|l| l.lane).collect()
            }
            Some(PathPoint::Road { lanes, .. }) => lanes.iter().take(1).map(|l| l.lane).collect(),
            _ => Vec::new(),
        };
        if sources.is_empty() {
            return took;
        }
        let off_by = |c: &Corridor| (c.turn_angle() - turn_angle).abs();
        let mut best: Option<(f64, Vec<Corridor>)> = None;
        for group in group_by_dst(net, &sources) {
            let matching: Vec<Corridor> = group.into_iter().filter(|c| off_by(c) <= epsilon).collect();
            if matching.is_empty() {
                continue;
            }
            let score = matching.iter().map(off_by).fold(f64::MAX, f64::min);
            if best.as_ref().map(|(s, _)| score < *s).unwrap_or(true) {
                best = Some((score, matching));
            }
        }
        let group = match best {
            Some((_, group)) => group,
            None => {
                debug!("Nothing turns {} degrees (within {})", turn_angle, epsilon);
                return took;
            }
        };
        self.points.push_back(crdr_point(&group));
        let (got, _) = self.recursive_append(net, remaining, false, lane_change_allowed, 1);
        took + got
    }

    /// Narrows the last point to the lanes (by index) or corridors (by position within the
    /// intersection) whose bits are set in `mask`, then extends without changing lanes.
    pub fn append_no_lane_change(&mut self, net: &Network, mask: u64, dist: Distance) -> bool {
        let selected = |idx: usize| idx < 64 && mask & (1 << idx) != 0;
        let narrowed = match self.points.back() {
            Some(PathPoint::Road { road, lanes }) => {
                let kept: Vec<LaneRange> = lanes
                    .iter()
                    .filter(|l| selected(net.lane(l.lane).index() as usize))
                    .copied()
                    .collect();
                if kept.is_empty() {
                    return false;
                }
                PathPoint::Road {
                    road: *road,
                    lanes: kept,
                }
            }
            Some(PathPoint::Intrsctn { intrsctn, crdrs }) => {
                let kept: Vec<CrdrRange> = crdrs
                    .iter()
                    .filter(|c| selected(net.crdr(c.crdr).local_index()))
                    .copied()
                    .collect();
                if kept.is_empty() {
                    return false;
                }
                PathPoint::Intrsctn {
                    intrsctn: *intrsctn,
                    crdrs: kept,
                }
            }
            None => return false,
        };
        if let Some(last) = self.points.back_mut() {
            *last = narrowed;
        }
        if dist <= Distance::ZERO {
            return true;
        }
        let (got, _) = self.recursive_append(net, dist, false, false, 0);
        got > Distance::ZERO
    }

    /// Extends the path backwards by `dist`, greedily preferring straight corridors. False only
    /// if nothing could be added.
    pub fn prepend(&mut self, net: &Network, dist: Distance) -> bool {
        let mut remaining = dist;
        let mut total = Distance::ZERO;
        let mut hits = 0;
        loop {
            let took = match self.points.front_mut() {
                Some(point) => point.extend_start(net, remaining),
                None => return false,
            };
            total += took;
            remaining -= took;
            if remaining <= EPSILON_DIST || hits >= net.config().max_intrsctns_hit {
                break;
            }
            match self.prev_path_point(net) {
                Some(point) => {
                    if !point.is_road() {
                        hits += 1;
                    }
                    self.points.push_front(point);
                }
                None => break,
            }
        }
        total > Distance::ZERO
    }

    /// Extends the path until it reaches `target`, using route search from the current end.
    pub fn append_to(&mut self, net: &Network, target: &RoadPos) -> bool {
        let start = match self.end_pos(net) {
            Some(pos) => pos,
            None => return false,
        };
        let mut route = Path::new();
        if route
            .calculate_route(net, &start, target, false, 2 * net.config().max_intrsctns_hit)
            .is_none()
        {
            return false;
        }
        self.absorb(route);
        true
    }

    /// Joins a path that starts where this one ends.
    fn absorb(&mut self, mut other: Path) {
        let first = match other.points.pop_front() {
            Some(p) => p,
            None => return,
        };
        let merged = match (self.points.back_mut(), &first) {
            (
                Some(PathPoint::Road { road, lanes }),
                PathPoint::Road {
                    road: other_road,
                    lanes: other_lanes,
                },
            ) if road == other_road => {
                let start = lanes.first().map(|l| l.start).unwrap_or(Distance::ZERO);
                for ol in other_lanes {
                    match lanes.iter_mut().find(|l| l.lane == ol.lane) {
                        Some(l) => l.end = ol.end,
                        None => lanes.push(LaneRange {
                            lane: ol.lane,
                            start,
                            end: ol.end,
                        }),
                    }
                }
                // Lanes the route didn't use stop where the path used to end
                true
            }
            (
                Some(PathPoint::Intrsctn { intrsctn, crdrs }),
                PathPoint::Intrsctn {
                    intrsctn: other_intrsctn,
                    crdrs: other_crdrs,
                },
            ) if intrsctn == other_intrsctn => {
                for oc in other_crdrs {
                    if let Some(c) = crdrs.iter_mut().find(|c| c.crdr == oc.crdr) {
                        c.end = oc.end;
                    }
                }
                true
            }
            _ => false,
        };
        if !merged {
            self.points.push_back(first);
        }
        self.points.extend(other.points);
    }
}
