use serde::{Deserialize, Serialize};

use geom::Distance;
use lri::{CrdrDir, CrdrID, LaneDir, LaneID};

use super::{CrdrPos, OnIntrsctn, OnRoad, RoadPos};
use crate::{Corridor, Network};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelResult {
    /// Still on the road it started on.
    WithinRoad,
    /// Crossed at least one intersection and ended on a road.
    PastRoad,
    /// Ended inside an intersection.
    WithinCrdr,
    /// Nothing was changed. Dead ends, a missing corridor, or an unreachable lane.
    Error,
}

/// Which corridor to take when travel reaches an intersection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TurnDir {
    /// Straight if possible, otherwise the first corridor.
    #[default]
    Default,
    Straight,
    Left,
    Right,
    UTurn,
}

impl TurnDir {
    fn as_crdr_dir(self) -> Option<CrdrDir> {
        match self {
            TurnDir::Default => None,
            TurnDir::Straight => Some(CrdrDir::Straight),
            TurnDir::Left => Some(CrdrDir::Left),
            TurnDir::Right => Some(CrdrDir::Right),
            TurnDir::UTurn => Some(CrdrDir::UTurn),
        }
    }

    /// Picks among the corridors leaving one lane. An unavailable turn falls back to straight.
    pub(crate) fn choose(self, candidates: &[Corridor]) -> Option<CrdrID> {
        let straight = candidates
            .iter()
            .find(|c| c.direction() == CrdrDir::Straight);
        let pick = match self.as_crdr_dir() {
            None => straight.or_else(|| candidates.first()),
            Some(dir) => candidates
                .iter()
                .find(|c| c.direction() == dir)
                .or(straight),
        };
        pick.map(|c| c.id())
    }
}

// Crossing more intersections than this in one call means zero-length geometry somewhere.
const MAX_CROSSINGS: usize = 1000;

impl RoadPos {
    /// Moves `dist` along the direction of travel, or backwards if negative, taking the default
    /// corridor at each intersection.
    pub fn travel(&mut self, net: &Network, dist: Distance) -> TravelResult {
        self.travel_with(net, dist, None, TurnDir::Default)
    }

    pub fn travel_dir(&mut self, net: &Network, dist: Distance, turn: TurnDir) -> TravelResult {
        self.travel_with(net, dist, None, turn)
    }

    /// Takes `crdr` at the next intersection; it must leave the current lane.
    pub fn travel_crdr(&mut self, net: &Network, dist: Distance, crdr: CrdrID) -> TravelResult {
        self.travel_by(net, dist, None, |candidates| {
            candidates.iter().find(|c| c.id() == crdr).map(|c| c.id())
        })
    }

    /// Like `travel_dir`, but every corridor taken must end in `dst_lane` (start in it, when
    /// travelling backwards).
    pub fn travel_with(
        &mut self,
        net: &Network,
        dist: Distance,
        dst_lane: Option<LaneID>,
        turn: TurnDir,
    ) -> TravelResult {
        self.travel_by(net, dist, dst_lane, |candidates| turn.choose(candidates))
    }

    /// The general form. `choose` picks among the corridors available at each intersection
    /// crossed. The position only changes when the whole distance could be travelled.
    pub(crate) fn travel_by<F: FnMut(&[Corridor]) -> Option<CrdrID>>(
        &mut self,
        net: &Network,
        dist: Distance,
        dst_lane: Option<LaneID>,
        mut choose: F,
    ) -> TravelResult {
        let start_road = match self {
            RoadPos::Road(r) => Some(r.road),
            RoadPos::Intrsctn(_) => None,
        };
        let forwards = dist >= Distance::ZERO;
        let mut pos = self.clone();
        let mut remaining = dist.abs();
        let mut crossed = false;

        for _ in 0..MAX_CROSSINGS {
            let next = match &mut pos {
                RoadPos::Road(r) => step_on_road(net, r, forwards, remaining),
                RoadPos::Intrsctn(i) => step_in_intrsctn(net, i, forwards, remaining),
            };
            match next {
                Step::Done => {
                    *self = pos;
                    return match self {
                        RoadPos::Intrsctn(_) => TravelResult::WithinCrdr,
                        RoadPos::Road(r) if !crossed && Some(r.road) == start_road => {
                            TravelResult::WithinRoad
                        }
                        RoadPos::Road(_) => TravelResult::PastRoad,
                    };
                }
                Step::LeaveRoad { lane, overflow } => {
                    let lane = net.lane(lane);
                    let mut candidates = if forwards {
                        lane.outgoing_crdrs()
                    } else {
                        lane.incoming_crdrs()
                    };
                    if candidates.is_empty() {
                        debug!("{} is a dead end", lane.id());
                        return TravelResult::Error;
                    }
                    if let Some(want) = dst_lane {
                        candidates.retain(|c| {
                            if forwards {
                                c.rec().dst_lane == want
                            } else {
                                c.rec().src_lane == want
                            }
                        });
                        if candidates.is_empty() {
                            debug!("No corridor from {} reaches {}", lane.id(), want);
                            return TravelResult::Error;
                        }
                    }
                    let crdr = match choose(&candidates) {
                        Some(id) => net.crdr(id),
                        None => {
                            debug!("No acceptable corridor leaving {}", lane.id());
                            return TravelResult::Error;
                        }
                    };
                    let offset = pos.get_offset();
                    pos = RoadPos::Intrsctn(OnIntrsctn {
                        intrsctn: crdr.rec().intrsctn,
                        crdrs: vec![CrdrPos {
                            crdr: crdr.id(),
                            distance: if forwards {
                                Distance::ZERO
                            } else {
                                crdr.length()
                            },
                            offset,
                        }],
                        priority: 0,
                    });
                    remaining = overflow;
                    crossed = true;
                }
                Step::LeaveCrdr { crdr, overflow } => {
                    let crdr = net.crdr(crdr);
                    let lane = if forwards {
                        crdr.dst_lane()
                    } else {
                        crdr.src_lane()
                    };
                    let road = lane.road();
                    let distance = match (forwards, lane.direction()) {
                        (true, LaneDir::Pos) | (false, LaneDir::Neg) => Distance::ZERO,
                        (true, LaneDir::Neg) | (false, LaneDir::Pos) => road.length(),
                    };
                    pos = RoadPos::Road(OnRoad {
                        road: road.id(),
                        lane: lane.id(),
                        distance,
                        offset: pos.get_offset(),
                        cntrl_pnt: road.cntrl_pnt_at(distance),
                    });
                    remaining = overflow;
                    crossed = true;
                }
            }
        }
        warn!("Travelling {} from {:?} never finished", dist, self);
        TravelResult::Error
    }
}

enum Step {
    Done,
    LeaveRoad { lane: LaneID, overflow: Distance },
    LeaveCrdr { crdr: CrdrID, overflow: Distance },
}

// A Pos lane covers [0, length) going forwards and (0, length] going backwards. Neg lanes mirror
// that, so exactly reversing a move that stayed on the road always lands back on it.
fn step_on_road(net: &Network, r: &mut OnRoad, forwards: bool, amount: Distance) -> Step {
    let lane = net.lane(r.lane);
    let road = net.road(r.road);
    let len = road.length();
    let toward_dst = forwards == (lane.direction() == LaneDir::Pos);
    let new_d = if toward_dst {
        r.distance + amount
    } else {
        r.distance - amount
    };

    let (inside, overflow) = if toward_dst {
        if forwards {
            (new_d < len, new_d - len)
        } else {
            (new_d <= len, new_d - len)
        }
    } else if forwards {
        (new_d > Distance::ZERO, -new_d)
    } else {
        (new_d >= Distance::ZERO, -new_d)
    };

    if inside {
        r.cntrl_pnt = road.find_cntrl_pnt(
            new_d,
            r.cntrl_pnt,
            Distance::meters(net.config().search_distance),
        );
        r.distance = new_d;
        Step::Done
    } else {
        Step::LeaveRoad {
            lane: r.lane,
            overflow,
        }
    }
}

// Every bound corridor moves by the same amount. The priority corridor decides whether the
// position stays in the intersection; siblings that run out are dropped.
fn step_in_intrsctn(net: &Network, i: &mut OnIntrsctn, forwards: bool, amount: Distance) -> Step {
    let primary = *i.primary();
    let len = net.crdr(primary.crdr).length();
    let new_d = if forwards {
        primary.distance + amount
    } else {
        primary.distance - amount
    };
    let inside = if forwards {
        new_d < len
    } else {
        new_d >= Distance::ZERO
    };
    if !inside {
        return Step::LeaveCrdr {
            crdr: primary.crdr,
            overflow: if forwards { new_d - len } else { -new_d },
        };
    }

    let mut kept = Vec::new();
    for cp in &i.crdrs {
        let d = if forwards {
            cp.distance + amount
        } else {
            cp.distance - amount
        };
        if cp.crdr == primary.crdr
            || (d >= Distance::ZERO && d <= net.crdr(cp.crdr).length())
        {
            kept.push(CrdrPos {
                crdr: cp.crdr,
                distance: d,
                offset: cp.offset,
            });
        }
    }
    i.priority = kept
        .iter()
        .position(|cp| cp.crdr == primary.crdr)
        .unwrap_or(0);
    i.crdrs = kept;
    Step::Done
}
