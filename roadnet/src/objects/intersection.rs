use serde::{Deserialize, Serialize};

use geom::{Distance, Pt2D, Ring};
use lri::records::{CrdrMrgRec, IntrsctnRec, MAX_CRDRS_PER_INTRSCTN};
use lri::{CrdrID, IntrsctnID, LaneID};

use crate::objects::attribute::qry_attr;
use crate::objects::{impl_view_traits, ObjPlacement};
use crate::{Attribute, Corridor, Network, Road};

#[derive(Clone, Copy)]
pub struct Intersection<'a> {
    net: &'a Network,
    id: IntrsctnID,
    rec: &'a IntrsctnRec,
}

impl_view_traits!(Intersection, id);

/// One corridor and the corridors it has to yield to before reaching its first hold offset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrdrPriority {
    pub crdr: CrdrID,
    pub hld_ofs_dist: Distance,
    pub intersecting: Vec<CrdrID>,
}

impl<'a> Intersection<'a> {
    pub(crate) fn new(net: &'a Network, id: IntrsctnID, rec: &'a IntrsctnRec) -> Intersection<'a> {
        Intersection { net, id, rec }
    }

    pub fn id(&self) -> IntrsctnID {
        self.id
    }

    pub fn name(&self) -> &'a str {
        self.net.pools().name(self.rec.name)
    }

    pub fn rec(&self) -> &'a IntrsctnRec {
        self.rec
    }

    pub fn roads(&self) -> Vec<Road<'a>> {
        self.rec.roads.iter().map(|r| self.net.road(*r)).collect()
    }

    pub fn n_crdrs(&self) -> u32 {
        self.rec.n_crdrs
    }

    pub fn all_crdrs(&self) -> impl Iterator<Item = Corridor<'a>> + 'a {
        let net = self.net;
        let first = self.rec.crdr_idx;
        (0..self.rec.n_crdrs).map(move |n| net.crdr(first.offset(n)))
    }

    /// Corridors are numbered from 0 within their intersection.
    pub fn crdr_by_local(&self, local: usize) -> Option<Corridor<'a>> {
        if local >= self.rec.n_crdrs as usize {
            return None;
        }
        self.net.try_crdr(self.rec.crdr_idx.offset(local as u32)).ok()
    }

    pub fn local_index(&self, crdr: CrdrID) -> Option<usize> {
        if crdr.0 < self.rec.crdr_idx.0 || crdr.0 >= self.rec.crdr_idx.0 + self.rec.n_crdrs {
            return None;
        }
        Some((crdr.0 - self.rec.crdr_idx.0) as usize)
    }

    pub fn crdrs_from_lane(&self, lane: LaneID) -> Vec<Corridor<'a>> {
        self.all_crdrs().filter(|c| c.rec().src_lane == lane).collect()
    }

    pub fn crdrs_to_lane(&self, lane: LaneID) -> Vec<Corridor<'a>> {
        self.all_crdrs().filter(|c| c.rec().dst_lane == lane).collect()
    }

    pub fn border(&self) -> Vec<Pt2D> {
        self.net
            .pools()
            .border_segs
            .slice(self.rec.border_idx, self.rec.n_border_segs)
            .iter()
            .map(|seg| seg.pt)
            .collect()
    }

    pub fn border_ring(&self) -> Option<Ring> {
        Ring::new(self.border())
    }

    pub fn contains_xy(&self, pt: Pt2D) -> bool {
        match self.border_ring() {
            Some(ring) => ring.contains_pt(pt),
            None => self.rec.bounds.contains(pt),
        }
    }

    /// Sampled from the elevation map when there is one, bilinearly. Points outside the map
    /// clamp to its edge.
    pub fn elevation_at(&self, pt: Pt2D) -> f64 {
        let map = match self.net.pools().elev_maps.get(self.rec.elev_map) {
            Some(map) => map,
            None => return self.rec.elevation,
        };
        let values = self
            .net
            .pools()
            .elev_values
            .slice(map.values_idx, map.n_rows * map.n_cols);
        if values.is_empty() || map.resolution <= 0.0 {
            return self.rec.elevation;
        }
        let max_col = (map.n_cols - 1) as f64;
        let max_row = (map.n_rows - 1) as f64;
        let fx = ((pt.x() - map.origin.x()) / map.resolution).clamp(0.0, max_col);
        let fy = ((pt.y() - map.origin.y()) / map.resolution).clamp(0.0, max_row);
        let (c0, r0) = (fx.floor() as u32, fy.floor() as u32);
        let (c1, r1) = ((c0 + 1).min(map.n_cols - 1), (r0 + 1).min(map.n_rows - 1));
        let (tx, ty) = (fx - c0 as f64, fy - r0 as f64);
        let z = |col: u32, row: u32| values[(row * map.n_cols + col) as usize].z;

        let bottom = z(c0, r0) + (z(c1, r0) - z(c0, r0)) * tx;
        let top = z(c0, r1) + (z(c1, r1) - z(c0, r1)) * tx;
        bottom + (top - bottom) * ty
    }

    /// Corridors whose footprint might contain `pt`, per the intersection's grid.
    pub fn crdrs_near(&self, pt: Pt2D) -> Vec<Corridor<'a>> {
        let size = self.rec.grid_cell_size;
        if size <= 0.0 || self.rec.n_grid_cols == 0 || self.rec.n_grid_rows == 0 {
            return self.all_crdrs().collect();
        }
        let col = ((pt.x() - self.rec.grid_origin.x()) / size).floor();
        let row = ((pt.y() - self.rec.grid_origin.y()) / size).floor();
        if col < 0.0
            || row < 0.0
            || col >= self.rec.n_grid_cols as f64
            || row >= self.rec.n_grid_rows as f64
        {
            return Vec::new();
        }
        let cells = self
            .net
            .pools()
            .grids
            .slice(self.rec.grid_idx, self.rec.n_grid_cols * self.rec.n_grid_rows);
        let mask = match cells.get(row as usize * self.rec.n_grid_cols as usize + col as usize) {
            Some(cell) => cell.crdr_mask,
            None => return Vec::new(),
        };
        (0..(self.rec.n_crdrs as usize).min(MAX_CRDRS_PER_INTRSCTN))
            .filter(|k| mask & (1u64 << k) != 0)
            .filter_map(|k| self.crdr_by_local(k))
            .collect()
    }

    pub fn attrs(&self) -> impl Iterator<Item = Attribute<'a>> + 'a {
        let net = self.net;
        let first = self.rec.attr_idx;
        (0..self.rec.n_attrs).map(move |n| net.attr(first.offset(n)))
    }

    pub fn qry_attr(&self, attr_id: u32, lane_mask: u32) -> Option<Attribute<'a>> {
        qry_attr(self.attrs(), attr_id, None, lane_mask)
    }

    /// Grouped by corridor, then sorted by distance.
    pub fn static_objs(&self) -> Vec<ObjPlacement> {
        self.net
            .pools()
            .obj_refs
            .slice(self.rec.obj_ref_idx, self.rec.n_obj_refs)
            .iter()
            .map(ObjPlacement::from_rec)
            .collect()
    }

    /// For every corridor, the others whose path it enters before reaching its own first hold
    /// offset. Corridors fed by the same lane never conflict; they're alternatives.
    pub fn prioritize_corridors(&self) -> Vec<CrdrPriority> {
        self.all_crdrs()
            .map(|crdr| {
                let hld_ofs_dist = crdr
                    .hld_ofs()
                    .next()
                    .map(|h| h.distance())
                    .unwrap_or_else(|| crdr.length());
                let intersecting = crdr
                    .merges()
                    .iter()
                    .filter(|m: &&CrdrMrgRec| m.overlaps() && m.first_dist < hld_ofs_dist.inner_meters())
                    .filter(|m| self.net.crdr(m.other).rec().src_lane != crdr.rec().src_lane)
                    .map(|m| m.other)
                    .collect();
                CrdrPriority {
                    crdr: crdr.id(),
                    hld_ofs_dist,
                    intersecting,
                }
            })
            .collect()
    }
}
