use serde::{Deserialize, Serialize};

use crate::records::{
    AttrRec, BorderSegRec, CntrlPntRec, CrdrCntrlPntRec, CrdrMrgRec, CrdrRec, ElevMapRec,
    ElevValueRec, GridRec, HldOfsRec, IntrsctnRec, LaneRec, LatCntrlPntRec, ObjRec, ObjRefRec,
    RoadPieceRec, RoadRec,
};
use crate::{CharPool, CrdrID, FileVersion, IntrsctnID, LaneID, Pool, PoolKind, RoadID};

/// The complete network: every pool, as loaded from a file or produced by the `Builder`.
/// Immutable once built, except for the reserved object and attribute capacity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pools {
    pub version: FileVersion,
    pub chars: CharPool,
    pub roads: Pool<RoadRec>,
    pub road_pieces: Pool<RoadPieceRec>,
    pub lanes: Pool<LaneRec>,
    pub cntrl_pnts: Pool<CntrlPntRec>,
    pub lat_cntrl_pnts: Pool<LatCntrlPntRec>,
    pub intrsctns: Pool<IntrsctnRec>,
    pub border_segs: Pool<BorderSegRec>,
    pub crdrs: Pool<CrdrRec>,
    pub crdr_cntrl_pnts: Pool<CrdrCntrlPntRec>,
    pub crdr_mrgs: Pool<CrdrMrgRec>,
    pub hld_ofs: Pool<HldOfsRec>,
    pub attrs: Pool<AttrRec>,
    pub objs: Pool<ObjRec>,
    pub obj_refs: Pool<ObjRefRec>,
    pub elev_maps: Pool<ElevMapRec>,
    pub elev_values: Pool<ElevValueRec>,
    pub grids: Pool<GridRec>,
}

impl Pools {
    pub fn empty() -> Pools {
        Pools {
            version: FileVersion::CURRENT,
            chars: CharPool::new(),
            roads: Pool::new(),
            road_pieces: Pool::new(),
            lanes: Pool::new(),
            cntrl_pnts: Pool::new(),
            lat_cntrl_pnts: Pool::new(),
            intrsctns: Pool::new(),
            border_segs: Pool::new(),
            crdrs: Pool::new(),
            crdr_cntrl_pnts: Pool::new(),
            crdr_mrgs: Pool::new(),
            hld_ofs: Pool::new(),
            attrs: Pool::new(),
            objs: Pool::new(),
            obj_refs: Pool::new(),
            elev_maps: Pool::new(),
            elev_values: Pool::new(),
            grids: Pool::new(),
        }
    }

    /// Number of real records in one pool, or bytes for the char pool.
    pub fn count(&self, kind: PoolKind) -> usize {
        match kind {
            PoolKind::Chars => self.chars.len(),
            PoolKind::Roads => self.roads.len(),
            PoolKind::RoadPieces => self.road_pieces.len(),
            PoolKind::Lanes => self.lanes.len(),
            PoolKind::CntrlPnts => self.cntrl_pnts.len(),
            PoolKind::LatCntrlPnts => self.lat_cntrl_pnts.len(),
            PoolKind::Intrsctns => self.intrsctns.len(),
            PoolKind::BorderSegs => self.border_segs.len(),
            PoolKind::Crdrs => self.crdrs.len(),
            PoolKind::CrdrCntrlPnts => self.crdr_cntrl_pnts.len(),
            PoolKind::CrdrMrgs => self.crdr_mrgs.len(),
            PoolKind::HldOfs => self.hld_ofs.len(),
            PoolKind::Attrs => self.attrs.len(),
            PoolKind::Objs => self.objs.len(),
            PoolKind::ObjRefs => self.obj_refs.len(),
            PoolKind::ElevMaps => self.elev_maps.len(),
            PoolKind::ElevValues => self.elev_values.len(),
            PoolKind::Grids => self.grids.len(),
        }
    }

    pub fn name(&self, offset: u32) -> &str {
        self.chars.get(offset)
    }

    pub fn road_by_name(&self, name: &str) -> Option<RoadID> {
        self.roads
            .iter()
            .find(|(_, r)| self.name(r.name) == name)
            .map(|(id, _)| id)
    }

    pub fn intrsctn_by_name(&self, name: &str) -> Option<IntrsctnID> {
        self.intrsctns
            .iter()
            .find(|(_, i)| self.name(i.name) == name)
            .map(|(id, _)| id)
    }

    /// The canonical ID of a road's lane, as listed at its first control point.
    pub fn road_lane(&self, road: RoadID, index: u32) -> Option<LaneID> {
        let r = self.roads.get(road)?;
        if index >= r.n_lanes {
            return None;
        }
        Some(r.lane_idx.offset(index))
    }

    /// The corridor connecting two canonical lanes, if any.
    pub fn find_crdr(&self, src_lane: LaneID, dst_lane: LaneID) -> Option<CrdrID> {
        self.crdrs
            .iter()
            .find(|(_, c)| c.src_lane == src_lane && c.dst_lane == dst_lane)
            .map(|(id, _)| id)
    }

    /// Every corridor of an intersection, in storage order.
    pub fn intrsctn_crdrs(&self, id: IntrsctnID) -> Vec<CrdrID> {
        match self.intrsctns.get(id) {
            Some(i) => (0..i.n_crdrs).map(|k| i.crdr_idx.offset(k)).collect(),
            None => Vec::new(),
        }
    }

    /// One line per pool, for logging.
    pub fn describe(&self) -> Vec<String> {
        PoolKind::ALL
            .iter()
            .map(|kind| format!("{:?}: {}", kind, netutil::prettyprint_usize(self.count(*kind))))
            .collect()
    }
}
