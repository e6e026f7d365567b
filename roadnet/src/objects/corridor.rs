use geom::{Distance, Line, Pt2D, Pt3D, Vector3D};
use lri::records::{CrdrCntrlPntRec, CrdrMrgRec, CrdrRec};
use lri::{CrdrDir, CrdrID};

use crate::objects::{impl_view_traits, ObjPlacement};
use crate::{HoldOffset, Intersection, Lane, Network, Road};

/// A legal path through an intersection, from one lane to another.
#[derive(Clone, Copy)]
pub struct Corridor<'a> {
    net: &'a Network,
    id: CrdrID,
    rec: &'a CrdrRec,
}

impl_view_traits!(Corridor, id);

impl<'a> Corridor<'a> {
    pub(crate) fn new(net: &'a Network, id: CrdrID, rec: &'a CrdrRec) -> Corridor<'a> {
        Corridor { net, id, rec }
    }

    pub fn id(&self) -> CrdrID {
        self.id
    }

    pub fn rec(&self) -> &'a CrdrRec {
        self.rec
    }

    pub fn intrsctn(&self) -> Intersection<'a> {
        self.net.intrsctn(self.rec.intrsctn)
    }

    /// This corridor's position among its intersection's corridors.
    pub fn local_index(&self) -> usize {
        (self.id.0 - self.intrsctn().rec().crdr_idx.0) as usize
    }

    pub fn src_road(&self) -> Road<'a> {
        self.net.road(self.rec.src_road)
    }

    pub fn src_lane(&self) -> Lane<'a> {
        self.net.lane(self.rec.src_lane)
    }

    pub fn dst_road(&self) -> Road<'a> {
        self.net.road(self.rec.dst_road)
    }

    pub fn dst_lane(&self) -> Lane<'a> {
        self.net.lane(self.rec.dst_lane)
    }

    pub fn direction(&self) -> CrdrDir {
        self.rec.direction
    }

    /// Signed heading change in degrees, positive to the left.
    pub fn turn_angle(&self) -> f64 {
        self.rec.turn_angle
    }

    pub fn length(&self) -> Distance {
        Distance::meters(self.rec.length)
    }

    pub fn cntrl_pnts(&self) -> &'a [CrdrCntrlPntRec] {
        self.net
            .pools()
            .crdr_cntrl_pnts
            .slice(self.rec.cntrl_pnt_idx, self.rec.n_cntrl_pnts)
    }

    /// Sorted by distance.
    pub fn hld_ofs(&self) -> impl Iterator<Item = HoldOffset<'a>> + 'a {
        let net = self.net;
        let first = self.rec.hld_ofs_idx;
        (0..self.rec.n_hld_ofs).map(move |n| net.hld_ofs(first.offset(n)))
    }

    /// The first hold offset at or past `dist`. A negative distance asks for the first one.
    pub fn get_hld_of_by_dist(&self, dist: Distance) -> Option<HoldOffset<'a>> {
        if dist < Distance::ZERO {
            return self.hld_ofs().next();
        }
        self.hld_ofs().find(|h| h.distance() >= dist)
    }

    /// One record for every other corridor in the intersection.
    pub fn merges(&self) -> &'a [CrdrMrgRec] {
        self.net
            .pools()
            .crdr_mrgs
            .slice(self.rec.mrg_idx, self.rec.n_mrgs)
    }

    pub fn merge_with(&self, other: CrdrID) -> Option<&'a CrdrMrgRec> {
        self.merges().iter().find(|m| m.other == other)
    }

    /// How `other` turns compared to this corridor.
    pub fn relative_dir(&self, other: CrdrID) -> Option<CrdrDir> {
        self.merge_with(other).map(|m| m.rel_dir)
    }

    /// The index of the control point starting the segment containing `dist`.
    pub fn cntrl_pnt_at(&self, dist: Distance) -> usize {
        let cps = self.cntrl_pnts();
        if cps.len() < 2 {
            return 0;
        }
        let d = dist.inner_meters();
        cps.partition_point(|cp| cp.distance <= d)
            .saturating_sub(1)
            .min(cps.len() - 2)
    }

    fn segment(&self, dist: Distance) -> (&'a CrdrCntrlPntRec, &'a CrdrCntrlPntRec, f64) {
        let cps = self.cntrl_pnts();
        let idx = self.cntrl_pnt_at(dist);
        let a = &cps[idx];
        let b = cps.get(idx + 1).unwrap_or(a);
        let span = b.distance - a.distance;
        let t = if span > 0.0 {
            ((dist.inner_meters() - a.distance) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (a, b, t)
    }

    pub fn width_at(&self, dist: Distance) -> Distance {
        let (a, b, t) = self.segment(dist);
        Distance::meters(a.width + (b.width - a.width) * t)
    }

    pub fn right_at(&self, dist: Distance) -> Vector3D {
        let (a, b, t) = self.segment(dist);
        (a.right * (1.0 - t) + b.right * t).normalized_or(a.right)
    }

    pub fn tangent_at(&self, dist: Distance) -> Vector3D {
        let (a, b, _) = self.segment(dist);
        let delta = Vector3D::new(
            b.location.x() - a.location.x(),
            b.location.y() - a.location.y(),
            0.0,
        );
        // Right is the tangent turned clockwise, so turn it back
        delta
            .normalized()
            .unwrap_or_else(|| Vector3D::new(-a.right.j, a.right.i, 0.0))
    }

    /// `offset` to the right of the centerline, at the intersection's elevation.
    pub fn position_at(&self, dist: Distance, offset: Distance) -> Pt3D {
        let (a, b, t) = self.segment(dist);
        let right = self.right_at(dist);
        let center = Line::new(a.location, b.location).percent_along(t);
        let pt = center.offset(right.i * offset.inner_meters(), right.j * offset.inner_meters());
        pt.to_3d(self.intrsctn().elevation_at(pt))
    }

    /// The nearest point on the centerline, as a distance along the corridor and a signed offset
    /// to the right. None if `pt` doesn't project onto any segment.
    pub fn project(&self, pt: Pt2D) -> Option<(Distance, Distance)> {
        let cps = self.cntrl_pnts();
        let mut best: Option<(f64, f64)> = None;
        for pair in cps.windows(2) {
            let (t, lateral) = match Line::new(pair[0].location, pair[1].location).project(pt) {
                Some(x) => x,
                None => continue,
            };
            if !(0.0..=1.0).contains(&t) {
                continue;
            }
            let dist = pair[0].distance + (pair[1].distance - pair[0].distance) * t;
            if best.map(|(_, l)| lateral.abs() < l.abs()).unwrap_or(true) {
                best = Some((dist, lateral));
            }
        }
        best.map(|(d, l)| (Distance::meters(d), Distance::meters(l)))
    }

    /// Whether `pt` falls within the corridor's width.
    pub fn contains_xy(&self, pt: Pt2D) -> bool {
        match self.project(pt) {
            Some((dist, lateral)) => lateral.abs() <= self.width_at(dist) / 2.0,
            None => false,
        }
    }

    /// Objects placed along this corridor, sorted by distance.
    pub fn static_objs(&self) -> Vec<ObjPlacement> {
        self.intrsctn()
            .static_objs()
            .into_iter()
            .filter(|o| o.crdr == Some(self.id))
            .collect()
    }
}
