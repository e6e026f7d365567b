//! A coordinate on the network: a lane of a road, or one or more corridors through an
//! intersection, plus a distance along it and a lateral offset.

mod search;
mod string;
mod travel;

use serde::{Deserialize, Serialize};

use geom::{Distance, Pt3D, Vector3D};
use lri::{CrdrDir, CrdrID, IntrsctnID, LaneDir, LaneID, RoadID};

use crate::{BindingError, Corridor, Intersection, Lane, Network, Road};

pub(crate) use self::search::locate;
pub(crate) use self::string::parse_dist;
pub use self::travel::{TravelResult, TurnDir};

/// Bound to one lane of a road. `distance` runs along the road's spline from its source end,
/// whichever way the lane flows. `offset` is measured from the lane's center, positive to the
/// right of a driver in the lane.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OnRoad {
    pub road: RoadID,
    pub lane: LaneID,
    pub distance: Distance,
    pub offset: Distance,
    // The control point starting the segment containing distance. Only a search hint.
    #[serde(skip)]
    cntrl_pnt: usize,
}

impl PartialEq for OnRoad {
    fn eq(&self, other: &OnRoad) -> bool {
        self.road == other.road
            && self.lane == other.lane
            && self.distance == other.distance
            && self.offset == other.offset
    }
}

/// One corridor a position lies on, with the distance along it and the offset to the right of
/// its centerline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrdrPos {
    pub crdr: CrdrID,
    pub distance: Distance,
    pub offset: Distance,
}

/// Inside an intersection, possibly on several overlapping corridors at once. `priority` picks
/// the corridor that single-valued queries report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OnIntrsctn {
    pub intrsctn: IntrsctnID,
    pub crdrs: Vec<CrdrPos>,
    pub priority: usize,
}

impl OnIntrsctn {
    pub fn primary(&self) -> &CrdrPos {
        &self.crdrs[self.priority.min(self.crdrs.len() - 1)]
    }

    fn primary_mut(&mut self) -> &mut CrdrPos {
        let idx = self.priority.min(self.crdrs.len() - 1);
        &mut self.crdrs[idx]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RoadPos {
    Road(OnRoad),
    Intrsctn(OnIntrsctn),
}

impl RoadPos {
    /// Distances past either end of the road are clamped onto it.
    pub fn on_road(
        net: &Network,
        road: RoadID,
        lane: LaneID,
        distance: Distance,
        offset: Distance,
    ) -> Result<RoadPos, BindingError> {
        let r = net.try_road(road)?;
        let l = net.try_lane(lane)?;
        if l.road().id() != road {
            return Err(BindingError::new(lane, "lane isn't on the road"));
        }
        let distance = distance.max(Distance::ZERO).min(r.length());
        Ok(RoadPos::Road(OnRoad {
            road,
            lane,
            distance,
            offset,
            cntrl_pnt: r.cntrl_pnt_at(distance),
        }))
    }

    pub fn on_crdr(
        net: &Network,
        intrsctn: IntrsctnID,
        crdr: CrdrID,
        distance: Distance,
        offset: Distance,
    ) -> Result<RoadPos, BindingError> {
        net.try_intrsctn(intrsctn)?;
        let c = net.try_crdr(crdr)?;
        if c.rec().intrsctn != intrsctn {
            return Err(BindingError::new(crdr, "corridor isn't in the intersection"));
        }
        let distance = distance.max(Distance::ZERO).min(c.length());
        Ok(RoadPos::Intrsctn(OnIntrsctn {
            intrsctn,
            crdrs: vec![CrdrPos {
                crdr,
                distance,
                offset,
            }],
            priority: 0,
        }))
    }

    /// Rebinds to a lane, keeping nothing from the old position.
    pub fn set_road(
        &mut self,
        net: &Network,
        road: RoadID,
        lane: LaneID,
        distance: Distance,
        offset: Distance,
    ) -> Result<(), BindingError> {
        *self = RoadPos::on_road(net, road, lane, distance, offset)?;
        Ok(())
    }

    /// Moves to another lane of the same road, keeping distance and offset.
    pub fn set_lane(&mut self, net: &Network, lane: LaneID) -> Result<(), BindingError> {
        let l = net.try_lane(lane)?;
        match self {
            RoadPos::Road(r) if l.road().id() == r.road => {
                r.lane = lane;
                Ok(())
            }
            _ => Err(BindingError::new(lane, "lane isn't on the current road")),
        }
    }

    pub fn is_road(&self) -> bool {
        matches!(self, RoadPos::Road(_))
    }

    /// Every ID binds, the lane belongs to the road, every corridor belongs to the intersection,
    /// and distances fall within what they measure.
    pub fn is_valid(&self, net: &Network) -> bool {
        match self {
            RoadPos::Road(r) => match (net.try_road(r.road), net.try_lane(r.lane)) {
                (Ok(road), Ok(lane)) => {
                    lane.road().id() == r.road
                        && r.distance >= Distance::ZERO
                        && r.distance <= road.length()
                }
                _ => false,
            },
            RoadPos::Intrsctn(i) => {
                net.try_intrsctn(i.intrsctn).is_ok()
                    && !i.crdrs.is_empty()
                    && i.priority < i.crdrs.len()
                    && i.crdrs.iter().all(|cp| match net.try_crdr(cp.crdr) {
                        Ok(c) => {
                            c.rec().intrsctn == i.intrsctn
                                && cp.distance >= Distance::ZERO
                                && cp.distance <= c.length()
                        }
                        Err(_) => false,
                    })
            }
        }
    }

    pub fn road<'a>(&self, net: &'a Network) -> Option<Road<'a>> {
        match self {
            RoadPos::Road(r) => Some(net.road(r.road)),
            RoadPos::Intrsctn(_) => None,
        }
    }

    pub fn lane<'a>(&self, net: &'a Network) -> Option<Lane<'a>> {
        match self {
            RoadPos::Road(r) => Some(net.lane(r.lane)),
            RoadPos::Intrsctn(_) => None,
        }
    }

    pub fn intrsctn<'a>(&self, net: &'a Network) -> Option<Intersection<'a>> {
        match self {
            RoadPos::Road(_) => None,
            RoadPos::Intrsctn(i) => Some(net.intrsctn(i.intrsctn)),
        }
    }

    /// The priority corridor.
    pub fn crdr<'a>(&self, net: &'a Network) -> Option<Corridor<'a>> {
        match self {
            RoadPos::Road(_) => None,
            RoadPos::Intrsctn(i) => Some(net.crdr(i.primary().crdr)),
        }
    }

    pub fn crdrs(&self) -> &[CrdrPos] {
        match self {
            RoadPos::Road(_) => &[],
            RoadPos::Intrsctn(i) => &i.crdrs,
        }
    }

    /// Along the road, or along the priority corridor.
    pub fn get_distance(&self) -> Distance {
        match self {
            RoadPos::Road(r) => r.distance,
            RoadPos::Intrsctn(i) => i.primary().distance,
        }
    }

    pub fn get_distance_on(&self, crdr: CrdrID) -> Option<Distance> {
        self.crdrs()
            .iter()
            .find(|cp| cp.crdr == crdr)
            .map(|cp| cp.distance)
    }

    pub fn get_offset(&self) -> Distance {
        match self {
            RoadPos::Road(r) => r.offset,
            RoadPos::Intrsctn(i) => i.primary().offset,
        }
    }

    pub fn set_offset(&mut self, offset: Distance) {
        match self {
            RoadPos::Road(r) => r.offset = offset,
            RoadPos::Intrsctn(i) => i.primary_mut().offset = offset,
        }
    }

    /// Sets the distance along the road or priority corridor without crossing into anything
    /// else. Out of range distances are an error and change nothing.
    pub fn set_distance(&mut self, net: &Network, distance: Distance) -> TravelResult {
        match self {
            RoadPos::Road(r) => {
                let road = net.road(r.road);
                if distance < Distance::ZERO || distance > road.length() {
                    debug!("{} is off the end of {}", distance, r.road);
                    return TravelResult::Error;
                }
                r.cntrl_pnt = road.find_cntrl_pnt(
                    distance,
                    r.cntrl_pnt,
                    Distance::meters(net.config().search_distance),
                );
                r.distance = distance;
                TravelResult::WithinRoad
            }
            RoadPos::Intrsctn(i) => {
                let cp = i.primary_mut();
                if distance < Distance::ZERO || distance > net.crdr(cp.crdr).length() {
                    debug!("{} is off the end of {}", distance, cp.crdr);
                    return TravelResult::Error;
                }
                cp.distance = distance;
                TravelResult::WithinCrdr
            }
        }
    }

    /// Towards the road's destination end, regardless of the lane's direction.
    pub fn incr_distance(&mut self, net: &Network, delta: Distance) -> TravelResult {
        let d = self.get_distance() + delta;
        self.set_distance(net, d)
    }

    pub fn decr_distance(&mut self, net: &Network, delta: Distance) -> TravelResult {
        let d = self.get_distance() - delta;
        self.set_distance(net, d)
    }

    /// The lateral position relative to the road centerline, positive to the right of increasing
    /// distance.
    fn road_lateral(net: &Network, r: &OnRoad) -> Distance {
        let lane = net.lane(r.lane);
        lane.offset_at(r.distance) + r.offset * lane.direction().sign()
    }

    /// Interpolated along the chords between control points.
    pub fn get_xyz(&self, net: &Network) -> Pt3D {
        match self {
            RoadPos::Road(r) => {
                net.road(r.road)
                    .chord_position_at(r.distance, RoadPos::road_lateral(net, r))
            }
            RoadPos::Intrsctn(i) => {
                let cp = i.primary();
                net.crdr(cp.crdr).position_at(cp.distance, cp.offset)
            }
        }
    }

    /// On the spline. Corridors have no spline, so this matches `get_xyz` there.
    pub fn get_best_xyz(&self, net: &Network) -> Pt3D {
        match self {
            RoadPos::Road(r) => {
                let road = net.road(r.road);
                let idx = road.find_cntrl_pnt(
                    r.distance,
                    r.cntrl_pnt,
                    Distance::meters(net.config().search_distance),
                );
                road.position_in_segment(idx, r.distance, RoadPos::road_lateral(net, r))
            }
            RoadPos::Intrsctn(_) => self.get_xyz(net),
        }
    }

    /// The direction of travel.
    pub fn get_tangent(&self, net: &Network) -> Vector3D {
        match self {
            RoadPos::Road(r) => {
                let sign = net.lane(r.lane).direction().sign();
                net.road(r.road).tangent_at(r.distance) * sign
            }
            RoadPos::Intrsctn(i) => {
                let cp = i.primary();
                net.crdr(cp.crdr).tangent_at(cp.distance)
            }
        }
    }

    /// To the right of the direction of travel.
    pub fn get_right_vec(&self, net: &Network) -> Vector3D {
        match self {
            RoadPos::Road(r) => {
                let sign = net.lane(r.lane).direction().sign();
                net.road(r.road).right_at(r.distance) * sign
            }
            RoadPos::Intrsctn(i) => {
                let cp = i.primary();
                net.crdr(cp.crdr).right_at(cp.distance)
            }
        }
    }

    /// The index, within the road or priority corridor, of the control point starting the
    /// segment that contains this position.
    pub fn get_cntrl_pnt(&self, net: &Network) -> usize {
        match self {
            RoadPos::Road(r) => net.road(r.road).find_cntrl_pnt(
                r.distance,
                r.cntrl_pnt,
                Distance::meters(net.config().search_distance),
            ),
            RoadPos::Intrsctn(i) => {
                let cp = i.primary();
                net.crdr(cp.crdr).cntrl_pnt_at(cp.distance)
            }
        }
    }

    /// The intersection this position is heading into. Inside an intersection, that's the one
    /// after the priority corridor's destination road.
    pub fn get_next_intrsctn<'a>(&self, net: &'a Network) -> Intersection<'a> {
        match self {
            RoadPos::Road(r) => net.lane(r.lane).next_intrsctn(),
            RoadPos::Intrsctn(i) => net.crdr(i.primary().crdr).dst_lane().next_intrsctn(),
        }
    }

    pub fn get_prev_intrsctn<'a>(&self, net: &'a Network) -> Intersection<'a> {
        match self {
            RoadPos::Road(r) => net.lane(r.lane).prev_intrsctn(),
            RoadPos::Intrsctn(i) => net.crdr(i.primary().crdr).src_lane().prev_intrsctn(),
        }
    }

    /// How much further travel stays on the current road or priority corridor.
    pub fn dist_to_end(&self, net: &Network) -> Distance {
        match self {
            RoadPos::Road(r) => match net.lane(r.lane).direction() {
                LaneDir::Pos => net.road(r.road).length() - r.distance,
                LaneDir::Neg => r.distance,
            },
            RoadPos::Intrsctn(i) => {
                let cp = i.primary();
                net.crdr(cp.crdr).length() - cp.distance
            }
        }
    }

    /// Moves to the lane on the driver's left, if one flows the same way. `center` also zeroes
    /// the lateral offset.
    pub fn change_lane_left(&mut self, net: &Network, center: bool) -> bool {
        self.change_lane(net, center, true)
    }

    pub fn change_lane_right(&mut self, net: &Network, center: bool) -> bool {
        self.change_lane(net, center, false)
    }

    fn change_lane(&mut self, net: &Network, center: bool, left: bool) -> bool {
        let r = match self {
            RoadPos::Road(r) => r,
            RoadPos::Intrsctn(_) => return false,
        };
        let lane = net.lane(r.lane);
        let next = if left {
            lane.driver_left()
        } else {
            lane.driver_right()
        };
        match next {
            Some(next) => {
                r.lane = next.id();
                if center {
                    r.offset = Distance::ZERO;
                }
                true
            }
            None => false,
        }
    }

    /// Only meaningful inside an intersection, and only for corridors already bound.
    pub fn set_crd_priority(&mut self, crdr: CrdrID) -> bool {
        match self {
            RoadPos::Intrsctn(i) => match i.crdrs.iter().position(|cp| cp.crdr == crdr) {
                Some(idx) => {
                    i.priority = idx;
                    true
                }
                None => false,
            },
            RoadPos::Road(_) => false,
        }
    }

    /// Picks the first bound corridor turning the given way.
    pub fn set_crd_priority_by_dir(&mut self, net: &Network, dir: CrdrDir) -> bool {
        match self {
            RoadPos::Intrsctn(i) => {
                match i
                    .crdrs
                    .iter()
                    .position(|cp| net.crdr(cp.crdr).direction() == dir)
                {
                    Some(idx) => {
                        i.priority = idx;
                        true
                    }
                    None => false,
                }
            }
            RoadPos::Road(_) => false,
        }
    }
}
