use geom::{Distance, Pt3D, Vector3D};
use lri::records::{CntrlPntRec, LaneRec, RoadPieceRec, RoadRec};
use lri::{LaneDir, RoadID};

use crate::objects::attribute::qry_attr;
use crate::objects::{impl_view_traits, ObjPlacement};
use crate::{Attribute, Intersection, Lane, Network};

#[derive(Clone, Copy)]
pub struct Road<'a> {
    net: &'a Network,
    id: RoadID,
    rec: &'a RoadRec,
}

impl_view_traits!(Road, id);

impl<'a> Road<'a> {
    pub(crate) fn new(net: &'a Network, id: RoadID, rec: &'a RoadRec) -> Road<'a> {
        Road { net, id, rec }
    }

    pub fn id(&self) -> RoadID {
        self.id
    }

    pub fn name(&self) -> &'a str {
        self.net.pools().name(self.rec.name)
    }

    pub fn rec(&self) -> &'a RoadRec {
        self.rec
    }

    pub fn n_lanes(&self) -> u32 {
        self.rec.n_lanes
    }

    /// Lanes are indexed left to right, looking along increasing distance.
    pub fn lane(&self, index: u32) -> Option<Lane<'a>> {
        if index >= self.rec.n_lanes {
            return None;
        }
        self.net.try_lane(self.rec.lane_idx.offset(index)).ok()
    }

    pub fn lanes(&self) -> impl Iterator<Item = Lane<'a>> + 'a {
        let road = *self;
        (0..self.rec.n_lanes).filter_map(move |idx| road.lane(idx))
    }

    pub fn lanes_in_dir(&self, dir: LaneDir) -> Vec<Lane<'a>> {
        self.lanes().filter(|l| l.direction() == dir).collect()
    }

    pub fn src_intrsctn(&self) -> Intersection<'a> {
        self.net.intrsctn(self.rec.src_intrsctn)
    }

    pub fn dst_intrsctn(&self) -> Intersection<'a> {
        self.net.intrsctn(self.rec.dst_intrsctn)
    }

    /// Along the chords between control points.
    pub fn lin_length(&self) -> Distance {
        Distance::meters(self.rec.lin_length)
    }

    /// Along the spline. Every distance along a road uses this measure.
    pub fn length(&self) -> Distance {
        Distance::meters(self.rec.cubic_length)
    }

    pub fn cntrl_pnts(&self) -> &'a [CntrlPntRec] {
        self.net
            .pools()
            .cntrl_pnts
            .slice(self.rec.cntrl_pnt_idx, self.rec.n_cntrl_pnts)
    }

    pub fn pieces(&self) -> &'a [RoadPieceRec] {
        self.net
            .pools()
            .road_pieces
            .slice(self.rec.road_piece_idx, self.rec.n_road_pieces)
    }

    /// The index of the control point starting the segment containing `dist`. Distances off
    /// either end clamp to the first or last segment.
    pub fn cntrl_pnt_at(&self, dist: Distance) -> usize {
        let cps = self.cntrl_pnts();
        if cps.len() < 2 {
            return 0;
        }
        let d = dist.inner_meters();
        // The first control point past dist, minus one
        let after = cps.partition_point(|cp| cp.cummulative_cubic_dist <= d);
        after.saturating_sub(1).min(cps.len() - 2)
    }

    /// Like `cntrl_pnt_at`, but starts from a previous answer. Nearby distances are found by
    /// walking; anything more than `window` away from the hint falls back to a full search.
    pub fn find_cntrl_pnt(&self, dist: Distance, hint: usize, window: Distance) -> usize {
        let cps = self.cntrl_pnts();
        if cps.len() < 2 || hint > cps.len() - 2 {
            return self.cntrl_pnt_at(dist);
        }
        let d = dist.inner_meters();
        let base = cps[hint].cummulative_cubic_dist;
        if (d - base).abs() > window.inner_meters() {
            return self.cntrl_pnt_at(dist);
        }

        let mut idx = hint;
        while idx > 0 && d < cps[idx].cummulative_cubic_dist {
            idx -= 1;
        }
        while idx < cps.len() - 2 && d >= cps[idx + 1].cummulative_cubic_dist {
            idx += 1;
        }
        idx
    }

    /// The spline parameter within segment `cp_idx`, clamped to [0, 1].
    pub(crate) fn segment_t(&self, cp_idx: usize, dist: Distance) -> f64 {
        let cp = &self.cntrl_pnts()[cp_idx];
        if cp.dist_to_next_cubic <= 0.0 {
            return 0.0;
        }
        ((dist.inner_meters() - cp.cummulative_cubic_dist) / cp.dist_to_next_cubic).clamp(0.0, 1.0)
    }

    /// The lanes as recorded at one control point, left to right.
    pub fn lanes_at(&self, cp_idx: usize) -> &'a [LaneRec] {
        match self.cntrl_pnts().get(cp_idx) {
            Some(cp) => self.net.pools().lanes.slice(cp.lane_idx, cp.n_lanes),
            None => &[],
        }
    }

    /// On the spline, `lateral` to the right of the centerline.
    pub fn position_at(&self, dist: Distance, lateral: Distance) -> Pt3D {
        let idx = self.cntrl_pnt_at(dist);
        self.position_in_segment(idx, dist, lateral)
    }

    pub(crate) fn position_in_segment(&self, idx: usize, dist: Distance, lateral: Distance) -> Pt3D {
        let cp = &self.cntrl_pnts()[idx];
        let t = self.segment_t(idx, dist);
        let center = cp.hermite.position(t);
        center.offset(cp.hermite.right(t, cp.right_cubic) * lateral.inner_meters())
    }

    /// Along the chord between control points instead of the spline.
    pub fn chord_position_at(&self, dist: Distance, lateral: Distance) -> Pt3D {
        let cps = self.cntrl_pnts();
        let idx = self.cntrl_pnt_at(dist);
        let t = self.segment_t(idx, dist);
        let next = cps.get(idx + 1).unwrap_or(&cps[idx]);
        cps[idx]
            .location
            .lerp(next.location, t)
            .offset(cps[idx].right_linear * lateral.inner_meters())
    }

    pub fn tangent_at(&self, dist: Distance) -> Vector3D {
        let idx = self.cntrl_pnt_at(dist);
        let cp = &self.cntrl_pnts()[idx];
        cp.hermite.tangent(self.segment_t(idx, dist), cp.tangent)
    }

    pub fn right_at(&self, dist: Distance) -> Vector3D {
        let idx = self.cntrl_pnt_at(dist);
        let cp = &self.cntrl_pnts()[idx];
        cp.hermite.right(self.segment_t(idx, dist), cp.right_cubic)
    }

    pub fn normal_at(&self, dist: Distance) -> Vector3D {
        let idx = self.cntrl_pnt_at(dist);
        let cp = &self.cntrl_pnts()[idx];
        cp.hermite.normal(self.segment_t(idx, dist), cp.normal)
    }

    /// The total width of the lanes, interpolated between control points.
    pub fn width_at(&self, dist: Distance) -> Distance {
        self.interpolate(dist, |cp| cp.logical_width)
    }

    /// Including shoulders and anything else drivable.
    pub fn physical_width_at(&self, dist: Distance) -> Distance {
        self.interpolate(dist, |cp| cp.physical_width)
    }

    fn interpolate<F: Fn(&CntrlPntRec) -> f64>(&self, dist: Distance, f: F) -> Distance {
        let cps = self.cntrl_pnts();
        let idx = self.cntrl_pnt_at(dist);
        let t = self.segment_t(idx, dist);
        let a = f(&cps[idx]);
        let b = cps.get(idx + 1).map(|cp| f(cp)).unwrap_or(a);
        Distance::meters(a + (b - a) * t)
    }

    /// The height of the cross-section profile at `lateral`, relative to the centerline. Flat
    /// when the road has no profile.
    pub fn profile_height(&self, dist: Distance, lateral: Distance) -> f64 {
        let cp = &self.cntrl_pnts()[self.cntrl_pnt_at(dist)];
        let profile = self
            .net
            .pools()
            .lat_cntrl_pnts
            .slice(cp.lat_cp_idx, cp.n_lat_cps);
        let x = lateral.inner_meters();
        match profile {
            [] => 0.0,
            [only] => only.height,
            _ => {
                if x <= profile[0].offset {
                    return profile[0].height;
                }
                for pair in profile.windows(2) {
                    if x <= pair[1].offset {
                        let span = pair[1].offset - pair[0].offset;
                        if span <= 0.0 {
                            return pair[1].height;
                        }
                        let t = (x - pair[0].offset) / span;
                        return pair[0].height + (pair[1].height - pair[0].height) * t;
                    }
                }
                profile[profile.len() - 1].height
            }
        }
    }

    pub fn attrs(&self) -> impl Iterator<Item = Attribute<'a>> + 'a {
        let net = self.net;
        let first = self.rec.attr_idx;
        (0..self.rec.n_attrs).map(move |n| net.attr(first.offset(n)))
    }

    /// The first matching active attribute, in the order they were added. `dist` of None
    /// matches regardless of extent; a `lane_mask` of 0 matches any lane.
    pub fn qry_attr(&self, attr_id: u32, dist: Option<Distance>, lane_mask: u32) -> Option<Attribute<'a>> {
        qry_attr(self.attrs(), attr_id, dist.map(|d| d.inner_meters()), lane_mask)
    }

    pub fn qry_attr_by_name(&self, name: &str, dist: Option<Distance>, lane_mask: u32) -> Option<Attribute<'a>> {
        let attr_id = self.net.attr_dict().id(name)?;
        self.qry_attr(attr_id, dist, lane_mask)
    }

    pub fn has_attr(&self, attr_id: u32) -> bool {
        self.qry_attr(attr_id, None, 0).is_some()
    }

    /// Sorted by distance.
    pub fn static_objs(&self) -> Vec<ObjPlacement> {
        self.net
            .pools()
            .obj_refs
            .slice(self.rec.obj_ref_idx, self.rec.n_obj_refs)
            .iter()
            .map(ObjPlacement::from_rec)
            .collect()
    }
}
