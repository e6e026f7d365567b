use geom::{Distance, Pt3D};
use lri::{CrdrID, LaneID};

use super::{CrdrRange, LaneRange, Path, PathPoint};
use crate::{Network, RoadPos};

/// One step of a route: a whole lane, or a whole corridor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Element {
    Lane(LaneID),
    Crdr(CrdrID),
}

struct RouteNode {
    elem: Element,
    parent: Option<usize>,
    /// Travelled from the start to the far end of this element
    cum: Distance,
    /// Straight-line gap between the far end of this element and the destination
    gap: Distance,
    /// How many steps on the way here moved away from the destination
    away: usize,
}

impl Element {
    fn of(pos: &RoadPos) -> Element {
        match pos {
            RoadPos::Road(r) => Element::Lane(r.lane),
            RoadPos::Intrsctn(i) => Element::Crdr(i.primary().crdr),
        }
    }

    fn length(self, net: &Network) -> Distance {
        match self {
            Element::Lane(l) => net.lane(l).road().length(),
            Element::Crdr(c) => net.crdr(c).length(),
        }
    }

    fn exit_pt(self, net: &Network) -> Pt3D {
        match self {
            Element::Lane(l) => {
                let lane = net.lane(l);
                let end = lane.end_dist();
                lane.road().chord_position_at(end, lane.offset_at(end))
            }
            Element::Crdr(c) => {
                let crdr = net.crdr(c);
                crdr.position_at(crdr.length(), Distance::ZERO)
            }
        }
    }

    /// Lanes match any lane of the same road flowing the same way, since changing lanes along
    /// a road is free.
    fn same_way(self, other: Element, net: &Network) -> bool {
        match (self, other) {
            (Element::Lane(a), Element::Lane(b)) => {
                let (a, b) = (net.lane(a), net.lane(b));
                a.road().id() == b.road().id() && a.direction() == b.direction()
            }
            (a, b) => a == b,
        }
    }

    fn children(self, net: &Network) -> Vec<Element> {
        match self {
            Element::Lane(l) => {
                let lane = net.lane(l);
                let mut children = Vec::new();
                for sibling in lane.road().lanes_in_dir(lane.direction()) {
                    for crdr in sibling.outgoing_crdrs() {
                        let child = Element::Crdr(crdr.id());
                        if !children.contains(&child) {
                            children.push(child);
                        }
                    }
                }
                children
            }
            Element::Crdr(c) => vec![Element::Lane(net.crdr(c).rec().dst_lane)],
        }
    }

    /// Whether `end` lies on this element, and ahead of `from` when the search starts here.
    fn reaches(self, net: &Network, end: &RoadPos, from: Option<&RoadPos>) -> bool {
        match (self, end) {
            (Element::Lane(l), RoadPos::Road(r)) => {
                let lane = net.lane(l);
                if lane.road().id() != r.road || lane.direction() != net.lane(r.lane).direction() {
                    return false;
                }
                match from {
                    Some(start) => {
                        (r.distance - start.get_distance()) * lane.direction().sign() >= Distance::ZERO
                    }
                    None => true,
                }
            }
            (Element::Crdr(c), RoadPos::Intrsctn(_)) => {
                let target = match end.get_distance_on(c) {
                    Some(d) => d,
                    None => return false,
                };
                match from {
                    Some(start) => start.get_distance_on(c).map(|d| target >= d).unwrap_or(false),
                    None => true,
                }
            }
            _ => false,
        }
    }

    /// How far into this element `end` is, from where travel enters it.
    fn dist_into(self, net: &Network, end: &RoadPos) -> Distance {
        match self {
            Element::Lane(l) => (end.get_distance() - net.lane(l).start_dist()).abs(),
            Element::Crdr(c) => end.get_distance_on(c).unwrap_or(Distance::ZERO),
        }
    }
}

fn in_chain(nodes: &[RouteNode], mut idx: usize, elem: Element, net: &Network) -> bool {
    loop {
        if nodes[idx].elem.same_way(elem, net) {
            return true;
        }
        match nodes[idx].parent {
            Some(parent) => idx = parent,
            None => return false,
        }
    }
}

impl Path {
    /// Replaces this path with a route from `start` to `end`, returning its length. The search
    /// expands one level of lanes or corridors at a time, keeping only the most promising few
    /// per level: those closest to `end`, or with `shortest`, those with the least distance
    /// travelled plus remaining. Branches that keep moving away from `end` are dropped. So this
    /// can miss a route that exists, in which case the path is left alone.
    pub fn calculate_route(
        &mut self,
        net: &Network,
        start: &RoadPos,
        end: &RoadPos,
        shortest: bool,
        max_height: usize,
    ) -> Option<Distance> {
        let config = net.config();
        let target = end.get_xyz(net);
        let gap_from = |elem: Element| Distance::meters(elem.exit_pt(net).dist_to(target));

        let root = Element::of(start);
        let mut nodes = vec![RouteNode {
            elem: root,
            parent: None,
            cum: start.dist_to_end(net),
            gap: gap_from(root),
            away: 0,
        }];

        let found = if root.reaches(net, end, Some(start)) {
            Some(0)
        } else {
            let mut level = vec![0];
            let mut found = None;
            for _ in 0..max_height {
                let mut next = Vec::new();
                let mut arrivals: Vec<(usize, Distance)> = Vec::new();
                for idx in level {
                    let parent_elem = nodes[idx].elem;
                    for child in parent_elem.children(net) {
                        let arrives = child.reaches(net, end, None);
                        // Coming back around to where the search started is fine if that's
                        // where the destination is
                        if !arrives && in_chain(&nodes, idx, child, net) {
                            continue;
                        }
                        let gap = gap_from(child);
                        let away = nodes[idx].away + usize::from(gap > nodes[idx].gap);
                        let node = RouteNode {
                            elem: child,
                            parent: Some(idx),
                            cum: nodes[idx].cum + child.length(net),
                            gap,
                            away,
                        };
                        if arrives {
                            let total = nodes[idx].cum + child.dist_into(net, end);
                            nodes.push(node);
                            arrivals.push((nodes.len() - 1, total));
                            continue;
                        }
                        if away > config.route_max_away {
                            continue;
                        }
                        nodes.push(node);
                        next.push(nodes.len() - 1);
                    }
                }
                if !arrivals.is_empty() {
                    found = if shortest {
                        arrivals.into_iter().min_by_key(|(_, total)| *total)
                    } else {
                        arrivals.into_iter().next()
                    }
                    .map(|(idx, _)| idx);
                    break;
                }
                if next.is_empty() {
                    break;
                }
                if shortest {
                    next.sort_by_key(|idx| nodes[*idx].cum + nodes[*idx].gap);
                } else {
                    next.sort_by_key(|idx| nodes[*idx].gap);
                }
                next.truncate(config.route_beam_width);
                level = next;
            }
            found
        };

        let found = match found {
            Some(idx) => idx,
            None => {
                debug!("No route found from {:?} to {:?}", start, end);
                return None;
            }
        };
        let mut chain = vec![nodes[found].elem];
        let mut idx = found;
        while let Some(parent) = nodes[idx].parent {
            chain.push(nodes[parent].elem);
            idx = parent;
        }
        chain.reverse();

        self.points.clear();
        let n = chain.len();
        for (k, elem) in chain.iter().enumerate() {
            let (first, last) = (k == 0, k == n - 1);
            match *elem {
                Element::Lane(l) => {
                    let lane = net.lane(l);
                    let from = if first { start.get_distance() } else { lane.start_dist() };
                    let to = if last { end.get_distance() } else { lane.end_dist() };
                    let mut lanes = vec![LaneRange {
                        lane: l,
                        start: from,
                        end: to,
                    }];
                    // The lane the route actually leaves on, if it changes lanes along the way
                    let leave_on = if last {
                        match end {
                            RoadPos::Road(r) => Some(r.lane),
                            RoadPos::Intrsctn(_) => None,
                        }
                    } else {
                        match chain.get(k + 1) {
                            Some(Element::Crdr(c)) => Some(net.crdr(*c).rec().src_lane),
                            _ => None,
                        }
                    };
                    if let Some(other) = leave_on.filter(|other| *other != l) {
                        lanes.push(LaneRange {
                            lane: other,
                            start: from,
                            end: to,
                        });
                    }
                    self.points.push_back(PathPoint::Road {
                        road: lane.road().id(),
                        lanes,
                    });
                }
                Element::Crdr(c) => {
                    let crdr = net.crdr(c);
                    let from = if first {
                        start.get_distance_on(c).unwrap_or(Distance::ZERO)
                    } else {
                        Distance::ZERO
                    };
                    let to = if last {
                        end.get_distance_on(c).unwrap_or_else(|| crdr.length())
                    } else {
                        crdr.length()
                    };
                    self.points.push_back(PathPoint::Intrsctn {
                        intrsctn: crdr.rec().intrsctn,
                        crdrs: vec![CrdrRange {
                            crdr: c,
                            start: from,
                            end: to,
                        }],
                    });
                }
            }
        }
        Some(self.get_length())
    }
}
