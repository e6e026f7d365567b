use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use enumset::EnumSet;
use serde::{Deserialize, Serialize};

use geom::{Bounds, Pt2D, Vector3D};

use super::{
    invalid, read_bounds, read_crdr_dir, read_f64, read_id, read_pt2d, read_u32, read_vec3,
    write_bounds, write_crdr_dir, write_f64, write_id, write_pt2d, write_u32, write_vec3, CrdrDir,
    HoldReason,
};
use crate::{
    AttrID, BorderSegID, CrdrCntrlPntID, CrdrID, CrdrMrgID, ElevMapID, ElevValueID, GridID,
    HldOfsID, IntrsctnID, LaneID, ObjID, ObjRefID, Record, RoadID,
};

/// An intersection joins at most this many roads.
pub const MAX_ROADS: usize = 16;
/// Corridor sets inside an intersection are 64-bit masks.
pub const MAX_CRDRS_PER_INTRSCTN: usize = 64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct IntrsctnRec {
    pub name: u32,
    pub roads: Vec<RoadID>,
    pub crdr_idx: CrdrID,
    pub n_crdrs: u32,
    pub border_idx: BorderSegID,
    pub n_border_segs: u32,
    /// Null when the intersection is flat at `elevation`.
    pub elev_map: ElevMapID,
    pub grid_idx: GridID,
    pub n_grid_cols: u32,
    pub n_grid_rows: u32,
    pub attr_idx: AttrID,
    pub n_attrs: u32,
    pub obj_ref_idx: ObjRefID,
    pub n_obj_refs: u32,
    pub elevation: f64,
    pub bounds: Bounds,
    pub grid_origin: Pt2D,
    pub grid_cell_size: f64,
}

impl Record for IntrsctnRec {
    type Id = IntrsctnID;
    const SIZE: usize = (14 + MAX_ROADS) * 4 + 8 + 32 + 16 + 8;

    fn read<R: Read>(r: &mut R) -> io::Result<IntrsctnRec> {
        let name = read_u32(r)?;
        let n_roads = read_u32(r)? as usize;
        if n_roads > MAX_ROADS {
            return Err(invalid(format!("intersection with {} roads", n_roads)));
        }
        let mut roads = Vec::new();
        for idx in 0..MAX_ROADS {
            let road: RoadID = read_id(r)?;
            if idx < n_roads {
                roads.push(road);
            }
        }
        Ok(IntrsctnRec {
            name,
            roads,
            crdr_idx: read_id(r)?,
            n_crdrs: read_u32(r)?,
            border_idx: read_id(r)?,
            n_border_segs: read_u32(r)?,
            elev_map: read_id(r)?,
            grid_idx: read_id(r)?,
            n_grid_cols: read_u32(r)?,
            n_grid_rows: read_u32(r)?,
            attr_idx: read_id(r)?,
            n_attrs: read_u32(r)?,
            obj_ref_idx: read_id(r)?,
            n_obj_refs: read_u32(r)?,
            elevation: read_f64(r)?,
            bounds: read_bounds(r)?,
            grid_origin: read_pt2d(r)?,
            grid_cell_size: read_f64(r)?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if self.roads.len() > MAX_ROADS {
            return Err(invalid(format!(
                "intersection with {} roads",
                self.roads.len()
            )));
        }
        write_u32(w, self.name)?;
        write_u32(w, self.roads.len() as u32)?;
        for idx in 0..MAX_ROADS {
            write_id(w, self.roads.get(idx).cloned().unwrap_or(RoadID::NULL))?;
        }
        write_id(w, self.crdr_idx)?;
        write_u32(w, self.n_crdrs)?;
        write_id(w, self.border_idx)?;
        write_u32(w, self.n_border_segs)?;
        write_id(w, self.elev_map)?;
        write_id(w, self.grid_idx)?;
        write_u32(w, self.n_grid_cols)?;
        write_u32(w, self.n_grid_rows)?;
        write_id(w, self.attr_idx)?;
        write_u32(w, self.n_attrs)?;
        write_id(w, self.obj_ref_idx)?;
        write_u32(w, self.n_obj_refs)?;
        write_f64(w, self.elevation)?;
        write_bounds(w, &self.bounds)?;
        write_pt2d(w, self.grid_origin)?;
        write_f64(w, self.grid_cell_size)
    }
}

/// One vertex of an intersection's border polygon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct BorderSegRec {
    pub pt: Pt2D,
    /// Whether a painted line runs along the edge starting here.
    pub line: bool,
}

impl Record for BorderSegRec {
    type Id = BorderSegID;
    const SIZE: usize = 16 + 8;

    fn read<R: Read>(r: &mut R) -> io::Result<BorderSegRec> {
        let pt = read_pt2d(r)?;
        let line = read_u32(r)? != 0;
        read_u32(r)?;
        Ok(BorderSegRec { pt, line })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_pt2d(w, self.pt)?;
        write_u32(w, self.line as u32)?;
        write_u32(w, 0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct CrdrRec {
    pub intrsctn: IntrsctnID,
    pub src_road: RoadID,
    /// The source road's lane, as listed at its first control point.
    pub src_lane: LaneID,
    pub dst_road: RoadID,
    pub dst_lane: LaneID,
    pub cntrl_pnt_idx: CrdrCntrlPntID,
    pub n_cntrl_pnts: u32,
    pub hld_ofs_idx: HldOfsID,
    pub n_hld_ofs: u32,
    /// One record per sibling corridor, in sibling order, skipping this corridor.
    pub mrg_idx: CrdrMrgID,
    pub n_mrgs: u32,
    pub direction: CrdrDir,
    pub length: f64,
    /// Signed heading change from entry to exit in degrees, positive turning left.
    pub turn_angle: f64,
}

impl Record for CrdrRec {
    type Id = CrdrID;
    const SIZE: usize = 12 * 4 + 2 * 8;

    fn read<R: Read>(r: &mut R) -> io::Result<CrdrRec> {
        Ok(CrdrRec {
            intrsctn: read_id(r)?,
            src_road: read_id(r)?,
            src_lane: read_id(r)?,
            dst_road: read_id(r)?,
            dst_lane: read_id(r)?,
            cntrl_pnt_idx: read_id(r)?,
            n_cntrl_pnts: read_u32(r)?,
            hld_ofs_idx: read_id(r)?,
            n_hld_ofs: read_u32(r)?,
            mrg_idx: read_id(r)?,
            n_mrgs: read_u32(r)?,
            direction: read_crdr_dir(r)?,
            length: read_f64(r)?,
            turn_angle: read_f64(r)?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_id(w, self.intrsctn)?;
        write_id(w, self.src_road)?;
        write_id(w, self.src_lane)?;
        write_id(w, self.dst_road)?;
        write_id(w, self.dst_lane)?;
        write_id(w, self.cntrl_pnt_idx)?;
        write_u32(w, self.n_cntrl_pnts)?;
        write_id(w, self.hld_ofs_idx)?;
        write_u32(w, self.n_hld_ofs)?;
        write_id(w, self.mrg_idx)?;
        write_u32(w, self.n_mrgs)?;
        write_crdr_dir(w, self.direction)?;
        write_f64(w, self.length)?;
        write_f64(w, self.turn_angle)
    }
}

/// A vertex of a corridor's centerline. Corridors are flat polylines; elevation comes from the
/// intersection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct CrdrCntrlPntRec {
    pub location: Pt2D,
    pub right: Vector3D,
    pub width: f64,
    /// Distance along the corridor.
    pub distance: f64,
    pub left_line_style: u32,
    pub right_line_style: u32,
}

impl Record for CrdrCntrlPntRec {
    type Id = CrdrCntrlPntID;
    const SIZE: usize = 16 + 24 + 2 * 8 + 2 * 4;

    fn read<R: Read>(r: &mut R) -> io::Result<CrdrCntrlPntRec> {
        Ok(CrdrCntrlPntRec {
            location: read_pt2d(r)?,
            right: read_vec3(r)?,
            width: read_f64(r)?,
            distance: read_f64(r)?,
            left_line_style: read_u32(r)?,
            right_line_style: read_u32(r)?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_pt2d(w, self.location)?;
        write_vec3(w, self.right)?;
        write_f64(w, self.width)?;
        write_f64(w, self.distance)?;
        write_u32(w, self.left_line_style)?;
        write_u32(w, self.right_line_style)
    }
}

/// How one corridor relates to a sibling in the same intersection. Distances are along `crdr`;
/// negative means the relationship doesn't exist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct CrdrMrgRec {
    pub crdr: CrdrID,
    pub other: CrdrID,
    /// Where `other` heads, relative to `crdr`'s entry heading.
    pub rel_dir: CrdrDir,
    /// The span where the two corridors' lateral extents overlap.
    pub first_dist: f64,
    pub last_dist: f64,
    /// Where the two centerlines cross, along `crdr` and along `other`.
    pub cross_dist: f64,
    pub other_cross_dist: f64,
}

impl CrdrMrgRec {
    pub fn overlaps(&self) -> bool {
        self.first_dist >= 0.0
    }

    pub fn crosses(&self) -> bool {
        self.cross_dist >= 0.0
    }
}

impl Record for CrdrMrgRec {
    type Id = CrdrMrgID;
    const SIZE: usize = 4 * 4 + 4 * 8;

    fn read<R: Read>(r: &mut R) -> io::Result<CrdrMrgRec> {
        let crdr = read_id(r)?;
        let other = read_id(r)?;
        let rel_dir = read_crdr_dir(r)?;
        read_u32(r)?;
        Ok(CrdrMrgRec {
            crdr,
            other,
            rel_dir,
            first_dist: read_f64(r)?,
            last_dist: read_f64(r)?,
            cross_dist: read_f64(r)?,
            other_cross_dist: read_f64(r)?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_id(w, self.crdr)?;
        write_id(w, self.other)?;
        write_crdr_dir(w, self.rel_dir)?;
        write_u32(w, 0)?;
        write_f64(w, self.first_dist)?;
        write_f64(w, self.last_dist)?;
        write_f64(w, self.cross_dist)?;
        write_f64(w, self.other_cross_dist)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct HldOfsRec {
    pub crdr: CrdrID,
    pub reason: EnumSet<HoldReason>,
    /// The sign or light controlling this line, if any.
    pub obj: ObjID,
    pub distance: f64,
    /// Heading of the stop line, in degrees.
    pub orientation: f64,
    pub thickness: f64,
}

impl Record for HldOfsRec {
    type Id = HldOfsID;
    const SIZE: usize = 4 * 4 + 3 * 8;

    fn read<R: Read>(r: &mut R) -> io::Result<HldOfsRec> {
        let crdr = read_id(r)?;
        let bits = read_u32(r)?;
        let reason = EnumSet::try_from_u32(bits)
            .ok_or_else(|| invalid(format!("bad hold reason bits {}", bits)))?;
        let obj = read_id(r)?;
        read_u32(r)?;
        Ok(HldOfsRec {
            crdr,
            reason,
            obj,
            distance: read_f64(r)?,
            orientation: read_f64(r)?,
            thickness: read_f64(r)?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_id(w, self.crdr)?;
        write_u32(w, self.reason.as_u32())?;
        write_id(w, self.obj)?;
        write_u32(w, 0)?;
        write_f64(w, self.distance)?;
        write_f64(w, self.orientation)?;
        write_f64(w, self.thickness)
    }
}

/// A regular grid of elevation samples, row-major from `origin`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct ElevMapRec {
    pub values_idx: ElevValueID,
    pub n_rows: u32,
    pub n_cols: u32,
    pub origin: Pt2D,
    pub resolution: f64,
}

impl Record for ElevMapRec {
    type Id = ElevMapID;
    const SIZE: usize = 4 * 4 + 16 + 8;

    fn read<R: Read>(r: &mut R) -> io::Result<ElevMapRec> {
        let values_idx = read_id(r)?;
        let n_rows = read_u32(r)?;
        let n_cols = read_u32(r)?;
        read_u32(r)?;
        Ok(ElevMapRec {
            values_idx,
            n_rows,
            n_cols,
            origin: read_pt2d(r)?,
            resolution: read_f64(r)?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_id(w, self.values_idx)?;
        write_u32(w, self.n_rows)?;
        write_u32(w, self.n_cols)?;
        write_u32(w, 0)?;
        write_pt2d(w, self.origin)?;
        write_f64(w, self.resolution)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct ElevValueRec {
    pub z: f64,
}

impl Record for ElevValueRec {
    type Id = ElevValueID;
    const SIZE: usize = 8;

    fn read<R: Read>(r: &mut R) -> io::Result<ElevValueRec> {
        Ok(ElevValueRec { z: read_f64(r)? })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_f64(w, self.z)
    }
}

/// One cell of an intersection's corridor grid. Bit `k` is set when the intersection's `k`th
/// corridor passes through the cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct GridRec {
    pub crdr_mask: u64,
}

impl Record for GridRec {
    type Id = GridID;
    const SIZE: usize = 8;

    fn read<R: Read>(r: &mut R) -> io::Result<GridRec> {
        Ok(GridRec {
            crdr_mask: r.read_u64::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u64::<LittleEndian>(self.crdr_mask)
    }
}
