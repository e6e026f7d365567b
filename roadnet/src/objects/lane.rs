use geom::Distance;
use lri::records::LaneRec;
use lri::{LaneDir, LaneID};

use crate::objects::impl_view_traits;
use crate::{Corridor, Intersection, Network, Road};

#[derive(Clone, Copy)]
pub struct Lane<'a> {
    net: &'a Network,
    id: LaneID,
    rec: &'a LaneRec,
}

impl_view_traits!(Lane, id);

impl<'a> Lane<'a> {
    pub(crate) fn new(net: &'a Network, id: LaneID, rec: &'a LaneRec) -> Lane<'a> {
        Lane { net, id, rec }
    }

    pub fn id(&self) -> LaneID {
        self.id
    }

    pub fn road(&self) -> Road<'a> {
        self.net.road(self.rec.road)
    }

    /// Position from the left edge of the road, looking along increasing distance.
    pub fn index(&self) -> u32 {
        self.rec.index
    }

    pub fn direction(&self) -> LaneDir {
        self.rec.direction
    }

    pub fn flags(&self) -> u32 {
        self.rec.flags
    }

    /// Where a driver entering this lane starts, in road distance.
    pub fn start_dist(&self) -> Distance {
        match self.rec.direction {
            LaneDir::Pos => Distance::ZERO,
            LaneDir::Neg => self.road().length(),
        }
    }

    /// Where a driver in this lane leaves the road.
    pub fn end_dist(&self) -> Distance {
        match self.rec.direction {
            LaneDir::Pos => self.road().length(),
            LaneDir::Neg => Distance::ZERO,
        }
    }

    pub fn width_at(&self, dist: Distance) -> Distance {
        self.interpolate(dist, |l| l.width)
    }

    /// The lateral position of this lane's center relative to the road centerline, positive to
    /// the right of increasing distance.
    pub fn offset_at(&self, dist: Distance) -> Distance {
        self.interpolate(dist, |l| l.offset)
    }

    fn interpolate<F: Fn(&LaneRec) -> f64>(&self, dist: Distance, f: F) -> Distance {
        let road = self.road();
        let idx = road.cntrl_pnt_at(dist);
        let t = road.segment_t(idx, dist);
        let here = road
            .lanes_at(idx)
            .get(self.rec.index as usize)
            .map(&f)
            .unwrap_or_else(|| f(self.rec));
        let next = road
            .lanes_at(idx + 1)
            .get(self.rec.index as usize)
            .map(&f)
            .unwrap_or(here);
        Distance::meters(here + (next - here) * t)
    }

    /// The neighbor with the next lower index, regardless of its direction.
    pub fn get_left(&self) -> Option<Lane<'a>> {
        if self.rec.index == 0 {
            return None;
        }
        self.road().lane(self.rec.index - 1)
    }

    /// The neighbor with the next higher index, regardless of its direction.
    pub fn get_right(&self) -> Option<Lane<'a>> {
        self.road().lane(self.rec.index + 1)
    }

    pub fn is_leftmost(&self) -> bool {
        self.rec.index == 0
    }

    pub fn is_rightmost(&self) -> bool {
        self.rec.index + 1 >= self.road().n_lanes()
    }

    /// The neighbor on the driver's left, if it flows the same way.
    pub fn driver_left(&self) -> Option<Lane<'a>> {
        let lane = match self.rec.direction {
            LaneDir::Pos => self.get_left(),
            LaneDir::Neg => self.get_right(),
        }?;
        if lane.direction() == self.rec.direction {
            Some(lane)
        } else {
            None
        }
    }

    /// The neighbor on the driver's right, if it flows the same way.
    pub fn driver_right(&self) -> Option<Lane<'a>> {
        let lane = match self.rec.direction {
            LaneDir::Pos => self.get_right(),
            LaneDir::Neg => self.get_left(),
        }?;
        if lane.direction() == self.rec.direction {
            Some(lane)
        } else {
            None
        }
    }

    /// The intersection traffic in this lane flows into.
    pub fn next_intrsctn(&self) -> Intersection<'a> {
        let road = self.road();
        match self.rec.direction {
            LaneDir::Pos => road.dst_intrsctn(),
            LaneDir::Neg => road.src_intrsctn(),
        }
    }

    pub fn prev_intrsctn(&self) -> Intersection<'a> {
        let road = self.road();
        match self.rec.direction {
            LaneDir::Pos => road.src_intrsctn(),
            LaneDir::Neg => road.dst_intrsctn(),
        }
    }

    /// Corridors leaving this lane, in intersection order.
    pub fn outgoing_crdrs(&self) -> Vec<Corridor<'a>> {
        self.next_intrsctn().crdrs_from_lane(self.id)
    }

    /// Corridors feeding into this lane, in intersection order.
    pub fn incoming_crdrs(&self) -> Vec<Corridor<'a>> {
        self.prev_intrsctn().crdrs_to_lane(self.id)
    }
}
