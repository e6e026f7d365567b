use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use geom::{Pt3D, Vector3D};

use super::{
    read_f64, read_id, read_obj_kind, read_pt3d, read_u32, read_vec3, write_f64, write_id,
    write_obj_kind, write_pt3d, write_u32, write_vec3, ObjectKind,
};
use crate::{AttrID, CrdrID, ObjID, ObjRefID, Record};

/// An attribute attached to a road or intersection, possibly limited to part of the road and to
/// some lanes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct AttrRec {
    /// The attribute type, as numbered by the attribute dictionary.
    pub id: u32,
    /// Offset into the char pool.
    pub name: u32,
    /// Bit `i` covers lane `i`. 0 means every lane.
    pub lane_mask: u32,
    pub active: bool,
    pub from: f64,
    /// Negative means through the end of the road.
    pub to: f64,
    pub value1: f64,
    pub value2: f64,
}

impl Record for AttrRec {
    type Id = AttrID;
    const SIZE: usize = 4 * 4 + 4 * 8;

    fn read<R: Read>(r: &mut R) -> io::Result<AttrRec> {
        Ok(AttrRec {
            id: read_u32(r)?,
            name: read_u32(r)?,
            lane_mask: read_u32(r)?,
            active: read_u32(r)? != 0,
            from: read_f64(r)?,
            to: read_f64(r)?,
            value1: read_f64(r)?,
            value2: read_f64(r)?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_u32(w, self.id)?;
        write_u32(w, self.name)?;
        write_u32(w, self.lane_mask)?;
        write_u32(w, self.active as u32)?;
        write_f64(w, self.from)?;
        write_f64(w, self.to)?;
        write_f64(w, self.value1)?;
        write_f64(w, self.value2)
    }
}

/// A static object placed by the network author: signs, lights, obstacles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct ObjRec {
    pub name: u32,
    pub kind: ObjectKind,
    /// Which solid model to draw; opaque here.
    pub sol_id: u32,
    pub flags: u32,
    pub position: Pt3D,
    pub tangent: Vector3D,
    pub lateral: Vector3D,
    /// Length, width and height of the bounding box.
    pub size: Vector3D,
}

impl Record for ObjRec {
    type Id = ObjID;
    const SIZE: usize = 4 * 4 + 4 * 24;

    fn read<R: Read>(r: &mut R) -> io::Result<ObjRec> {
        Ok(ObjRec {
            name: read_u32(r)?,
            kind: read_obj_kind(r)?,
            sol_id: read_u32(r)?,
            flags: read_u32(r)?,
            position: read_pt3d(r)?,
            tangent: read_vec3(r)?,
            lateral: read_vec3(r)?,
            size: read_vec3(r)?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_u32(w, self.name)?;
        write_obj_kind(w, self.kind)?;
        write_u32(w, self.sol_id)?;
        write_u32(w, self.flags)?;
        write_pt3d(w, self.position)?;
        write_vec3(w, self.tangent)?;
        write_vec3(w, self.lateral)?;
        write_vec3(w, self.size)
    }
}

/// Places an object along a road, or along a corridor when `crdr` is set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct ObjRefRec {
    pub obj: ObjID,
    pub crdr: CrdrID,
    pub distance: f64,
}

impl Record for ObjRefRec {
    type Id = ObjRefID;
    const SIZE: usize = 2 * 4 + 8;

    fn read<R: Read>(r: &mut R) -> io::Result<ObjRefRec> {
        Ok(ObjRefRec {
            obj: read_id(r)?,
            crdr: read_id(r)?,
            distance: read_f64(r)?,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_id(w, self.obj)?;
        write_id(w, self.crdr)?;
        write_f64(w, self.distance)
    }
}
