use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use geom::{Bounds, HermiteCubic, Pt3D, Vector3D};

use super::{
    read_bounds, read_f64, read_hermite, read_id, read_lane_dir, read_pt3d, read_u32, read_vec3,
    write_bounds, write_f64, write_hermite, write_id, write_lane_dir, write_pt3d, write_u32,
    write_vec3, LaneDir,
};
use crate::{
    AttrID, CntrlPntID, IntrsctnID, LaneID, LatCntrlPntID, ObjRefID, Record, RoadID, RoadPieceID,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct RoadRec {
    /// Offset into the char pool.
    pub name: u32,
    pub cntrl_pnt_idx: CntrlPntID,
    pub n_cntrl_pnts: u32,
    pub n_lanes: u32,
    /// The lanes valid from the first control point.
    pub lane_idx: LaneID,
    pub src_intrsctn: IntrsctnID,
    pub dst_intrsctn: IntrsctnID,
    pub attr_idx: AttrID,
    pub n_attrs: u32,
    pub obj_ref_idx: ObjRefID,
    pub n_obj_refs: u32,
    pub road_piece_idx: RoadPieceID,
    pub n_road_pieces: u32,
    pub lin_length: f64,
    pub cubic_length: f64,
}

impl Record for RoadRec {
    type Id = RoadID;
    const SIZE: usize = 14 * 4 + 2 * 8;

    fn read<R: Read>(r: &mut R) -> io::Result<RoadRec> {
        let mut rec = RoadRec {
            name: read_u32(r)?,
            cntrl_pnt_idx: read_id(r)?,
            n_cntrl_pnts: read_u32(r)?,
            n_lanes: read_u32(r)?,
            lane_idx: read_id(r)?,
            src_intrsctn: read_id(r)?,
            dst_intrsctn: read_id(r)?,
            attr_idx: read_id(r)?,
            n_attrs: read_u32(r)?,
            obj_ref_idx: read_id(r)?,
            n_obj_refs: read_u32(r)?,
            road_piece_idx: read_id(r)?,
            n_road_pieces: read_u32(r)?,
            lin_length: 0.0,
            cubic_length: 0.0,
        };
        // Padding
        read_u32(r)?;
        rec.lin_length = read_f64(r)?;
        rec.cubic_length = read_f64(r)?;
        Ok(rec)
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_u32(w, self.name)?;
        write_id(w, self.cntrl_pnt_idx)?;
        write_u32(w, self.n_cntrl_pnts)?;
        write_u32(w, self.n_lanes)?;
        write_id(w, self.lane_idx)?;
        write_id(w, self.src_intrsctn)?;
        write_id(w, self.dst_intrsctn)?;
        write_id(w, self.attr_idx)?;
        write_u32(w, self.n_attrs)?;
        write_id(w, self.obj_ref_idx)?;
        write_u32(w, self.n_obj_refs)?;
        write_id(w, self.road_piece_idx)?;
        write_u32(w, self.n_road_pieces)?;
        write_u32(w, 0)?;
        write_f64(w, self.lin_length)?;
        write_f64(w, self.cubic_length)
    }
}

/// A run of consecutive control points on one road, with a box covering the full road width.
/// The spatial index is built over these instead of whole roads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoadPieceRec {
    pub road: RoadID,
    pub first_cp: CntrlPntID,
    pub last_cp: CntrlPntID,
    pub bounds: Bounds,
}

impl Default for RoadPieceRec {
    fn default() -> RoadPieceRec {
        RoadPieceRec {
            road: RoadID::NULL,
            first_cp: CntrlPntID::NULL,
            last_cp: CntrlPntID::NULL,
            bounds: Bounds::new(),
        }
    }
}

impl Record for RoadPieceRec {
    type Id = RoadPieceID;
    const SIZE: usize = 4 * 4 + 4 * 8;

    fn read<R: Read>(r: &mut R) -> io::Result<RoadPieceRec> {
        let road = read_id(r)?;
        let first_cp = read_id(r)?;
        let last_cp = read_id(r)?;
        read_u32(r)?;
        Ok(RoadPieceRec {
            road,
            first_cp,
            last_cp,
            bounds: read_bounds(r)?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_id(w, self.road)?;
        write_id(w, self.first_cp)?;
        write_id(w, self.last_cp)?;
        write_u32(w, 0)?;
        write_bounds(w, &self.bounds)
    }
}

/// One lane, as it exists from one control point until the next. Every control point carries a
/// full set, so a lane's width and offset can change along the road.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct LaneRec {
    pub road: RoadID,
    /// 0 is the leftmost lane, looking in the road's positive direction.
    pub index: u32,
    pub direction: LaneDir,
    /// Free-form lane markings and restrictions.
    pub flags: u32,
    pub width: f64,
    /// Signed offset of the lane's center from the road centerline, positive to the right.
    pub offset: f64,
}

impl Record for LaneRec {
    type Id = LaneID;
    const SIZE: usize = 4 * 4 + 2 * 8;

    fn read<R: Read>(r: &mut R) -> io::Result<LaneRec> {
        Ok(LaneRec {
            road: read_id(r)?,
            index: read_u32(r)?,
            direction: read_lane_dir(r)?,
            flags: read_u32(r)?,
            width: read_f64(r)?,
            offset: read_f64(r)?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_id(w, self.road)?;
        write_u32(w, self.index)?;
        write_lane_dir(w, self.direction)?;
        write_u32(w, self.flags)?;
        write_f64(w, self.width)?;
        write_f64(w, self.offset)
    }
}

/// A sample along a road centerline, and the spline segment leaving it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct CntrlPntRec {
    pub location: Pt3D,
    pub normal: Vector3D,
    /// Direction of the straight chord to the next point.
    pub tangent: Vector3D,
    pub right_linear: Vector3D,
    pub right_cubic: Vector3D,
    /// Coefficients of the segment to the next point. Zero on the last point of a road.
    pub hermite: HermiteCubic,
    pub cummulative_lin_dist: f64,
    pub cummulative_cubic_dist: f64,
    pub dist_to_next_lin: f64,
    pub dist_to_next_cubic: f64,
    /// Infinite where the road is straight.
    pub radius: f64,
    pub logical_width: f64,
    pub physical_width: f64,
    pub lane_idx: LaneID,
    pub n_lanes: u32,
    pub lat_cp_idx: LatCntrlPntID,
    pub n_lat_cps: u32,
}

impl Record for CntrlPntRec {
    type Id = CntrlPntID;
    const SIZE: usize = 5 * 24 + 4 * 24 + 7 * 8 + 4 * 4;

    fn read<R: Read>(r: &mut R) -> io::Result<CntrlPntRec> {
        Ok(CntrlPntRec {
            location: read_pt3d(r)?,
            normal: read_vec3(r)?,
            tangent: read_vec3(r)?,
            right_linear: read_vec3(r)?,
            right_cubic: read_vec3(r)?,
            hermite: read_hermite(r)?,
            cummulative_lin_dist: read_f64(r)?,
            cummulative_cubic_dist: read_f64(r)?,
            dist_to_next_lin: read_f64(r)?,
            dist_to_next_cubic: read_f64(r)?,
            radius: read_f64(r)?,
            logical_width: read_f64(r)?,
            physical_width: read_f64(r)?,
            lane_idx: read_id(r)?,
            n_lanes: read_u32(r)?,
            lat_cp_idx: read_id(r)?,
            n_lat_cps: read_u32(r)?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_pt3d(w, self.location)?;
        write_vec3(w, self.normal)?;
        write_vec3(w, self.tangent)?;
        write_vec3(w, self.right_linear)?;
        write_vec3(w, self.right_cubic)?;
        write_hermite(w, &self.hermite)?;
        write_f64(w, self.cummulative_lin_dist)?;
        write_f64(w, self.cummulative_cubic_dist)?;
        write_f64(w, self.dist_to_next_lin)?;
        write_f64(w, self.dist_to_next_cubic)?;
        write_f64(w, self.radius)?;
        write_f64(w, self.logical_width)?;
        write_f64(w, self.physical_width)?;
        write_id(w, self.lane_idx)?;
        write_u32(w, self.n_lanes)?;
        write_id(w, self.lat_cp_idx)?;
        write_u32(w, self.n_lat_cps)
    }
}

/// One sample of a road's cross-section: the surface height at a lateral offset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct LatCntrlPntRec {
    pub offset: f64,
    pub height: f64,
    pub material: u32,
}

impl Record for LatCntrlPntRec {
    type Id = LatCntrlPntID;
    const SIZE: usize = 2 * 8 + 2 * 4;

    fn read<R: Read>(r: &mut R) -> io::Result<LatCntrlPntRec> {
        let offset = read_f64(r)?;
        let height = read_f64(r)?;
        let material = read_u32(r)?;
        read_u32(r)?;
        Ok(LatCntrlPntRec {
            offset,
            height,
            material,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_f64(w, self.offset)?;
        write_f64(w, self.height)?;
        write_u32(w, self.material)?;
        write_u32(w, 0)
    }
}
