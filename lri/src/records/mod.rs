//! The fixed-stride records stored in each pool, and their little-endian encoding.

mod intersection;
mod object;
mod road;

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use enumset::EnumSetType;
use serde::{Deserialize, Serialize};

use geom::{Bounds, HermiteCubic, Pt2D, Pt3D, Vector3D};

pub use self::intersection::{
    BorderSegRec, CrdrCntrlPntRec, CrdrMrgRec, CrdrRec, ElevMapRec, ElevValueRec, GridRec,
    HldOfsRec, IntrsctnRec, MAX_CRDRS_PER_INTRSCTN, MAX_ROADS,
};
pub use self::object::{AttrRec, ObjRec, ObjRefRec};
pub use self::road::{CntrlPntRec, LaneRec, LatCntrlPntRec, RoadPieceRec, RoadRec};
use crate::PoolId;

/// Which way traffic flows in a lane, relative to increasing road distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LaneDir {
    #[default]
    Pos,
    Neg,
}

impl LaneDir {
    pub fn opposite(self) -> LaneDir {
        match self {
            LaneDir::Pos => LaneDir::Neg,
            LaneDir::Neg => LaneDir::Pos,
        }
    }

    /// +1 for positive lanes, -1 for negative.
    pub fn sign(self) -> f64 {
        match self {
            LaneDir::Pos => 1.0,
            LaneDir::Neg => -1.0,
        }
    }

    fn to_u32(self) -> u32 {
        match self {
            LaneDir::Pos => 1,
            LaneDir::Neg => 2,
        }
    }

    fn from_u32(x: u32) -> io::Result<LaneDir> {
        match x {
            1 => Ok(LaneDir::Pos),
            2 => Ok(LaneDir::Neg),
            _ => Err(invalid(format!("bad lane direction {}", x))),
        }
    }
}

/// How a corridor turns, from its entry heading to its exit heading. Also used to describe one
/// corridor relative to a sibling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CrdrDir {
    #[default]
    Straight,
    Left,
    Right,
    UTurn,
}

impl CrdrDir {
    /// Classifies a signed heading change in degrees, positive meaning a left turn.
    pub fn from_turn_degrees(degrees: f64) -> CrdrDir {
        if degrees.abs() <= 45.0 {
            CrdrDir::Straight
        } else if degrees.abs() >= 150.0 {
            CrdrDir::UTurn
        } else if degrees > 0.0 {
            CrdrDir::Left
        } else {
            CrdrDir::Right
        }
    }

    fn to_u32(self) -> u32 {
        match self {
            CrdrDir::Straight => 1,
            CrdrDir::Left => 2,
            CrdrDir::Right => 3,
            CrdrDir::UTurn => 4,
        }
    }

    fn from_u32(x: u32) -> io::Result<CrdrDir> {
        match x {
            1 => Ok(CrdrDir::Straight),
            2 => Ok(CrdrDir::Left),
            3 => Ok(CrdrDir::Right),
            4 => Ok(CrdrDir::UTurn),
            _ => Err(invalid(format!("bad corridor direction {}", x))),
        }
    }
}

/// Why a vehicle might have to stop at a hold offset.
#[derive(Debug, PartialOrd, Ord, EnumSetType, Serialize, Deserialize)]
pub enum HoldReason {
    Sign,
    TrafficLight,
    Overlap,
}

/// What a static or dynamic object is. Selects which state variant is meaningful.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ObjectKind {
    #[default]
    Obstacle,
    TrafficSign,
    TrafficLight,
    TrajFollower,
    Vehicle,
    Walker,
    Coordinator,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 7] = [
        ObjectKind::Obstacle,
        ObjectKind::TrafficSign,
        ObjectKind::TrafficLight,
        ObjectKind::TrajFollower,
        ObjectKind::Vehicle,
        ObjectKind::Walker,
        ObjectKind::Coordinator,
    ];

    fn to_u32(self) -> u32 {
        ObjectKind::ALL
            .iter()
            .position(|k| *k == self)
            .map(|idx| idx as u32 + 1)
            .unwrap_or(0)
    }

    fn from_u32(x: u32) -> io::Result<ObjectKind> {
        (x as usize)
            .checked_sub(1)
            .and_then(|idx| ObjectKind::ALL.get(idx).cloned())
            .ok_or_else(|| invalid(format!("bad object kind {}", x)))
    }
}

pub(crate) fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

pub(crate) fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    r.read_u32::<LittleEndian>()
}

pub(crate) fn write_u32<W: Write>(w: &mut W, x: u32) -> io::Result<()> {
    w.write_u32::<LittleEndian>(x)
}

pub(crate) fn read_f64<R: Read>(r: &mut R) -> io::Result<f64> {
    r.read_f64::<LittleEndian>()
}

pub(crate) fn write_f64<W: Write>(w: &mut W, x: f64) -> io::Result<()> {
    w.write_f64::<LittleEndian>(x)
}

fn read_finite<R: Read>(r: &mut R) -> io::Result<f64> {
    let x = read_f64(r)?;
    if x.is_finite() {
        Ok(x)
    } else {
        Err(invalid(format!("non-finite coordinate {}", x)))
    }
}

pub(crate) fn read_id<R: Read, I: PoolId>(r: &mut R) -> io::Result<I> {
    Ok(I::from_raw(read_u32(r)?))
}

pub(crate) fn write_id<W: Write, I: PoolId>(w: &mut W, id: I) -> io::Result<()> {
    write_u32(w, id.raw())
}

pub(crate) fn read_pt3d<R: Read>(r: &mut R) -> io::Result<Pt3D> {
    Ok(Pt3D {
        x: read_finite(r)?,
        y: read_finite(r)?,
        z: read_finite(r)?,
    })
}

pub(crate) fn write_pt3d<W: Write>(w: &mut W, pt: Pt3D) -> io::Result<()> {
    write_f64(w, pt.x)?;
    write_f64(w, pt.y)?;
    write_f64(w, pt.z)
}

pub(crate) fn read_pt2d<R: Read>(r: &mut R) -> io::Result<Pt2D> {
    let x = read_finite(r)?;
    let y = read_finite(r)?;
    Ok(Pt2D::new(x, y))
}

pub(crate) fn write_pt2d<W: Write>(w: &mut W, pt: Pt2D) -> io::Result<()> {
    write_f64(w, pt.x())?;
    write_f64(w, pt.y())
}

pub(crate) fn read_vec3<R: Read>(r: &mut R) -> io::Result<Vector3D> {
    Ok(Vector3D::new(read_finite(r)?, read_finite(r)?, read_finite(r)?))
}

pub(crate) fn write_vec3<W: Write>(w: &mut W, v: Vector3D) -> io::Result<()> {
    write_f64(w, v.i)?;
    write_f64(w, v.j)?;
    write_f64(w, v.k)
}

pub(crate) fn read_hermite<R: Read>(r: &mut R) -> io::Result<HermiteCubic> {
    Ok(HermiteCubic {
        a: read_vec3(r)?,
        b: read_vec3(r)?,
        c: read_vec3(r)?,
        d: read_vec3(r)?,
    })
}

pub(crate) fn write_hermite<W: Write>(w: &mut W, h: &HermiteCubic) -> io::Result<()> {
    write_vec3(w, h.a)?;
    write_vec3(w, h.b)?;
    write_vec3(w, h.c)?;
    write_vec3(w, h.d)
}

/// Empty bounds round-trip as their inverted extremes.
pub(crate) fn read_bounds<R: Read>(r: &mut R) -> io::Result<Bounds> {
    Ok(Bounds {
        min_x: read_f64(r)?,
        min_y: read_f64(r)?,
        max_x: read_f64(r)?,
        max_y: read_f64(r)?,
    })
}

pub(crate) fn write_bounds<W: Write>(w: &mut W, b: &Bounds) -> io::Result<()> {
    write_f64(w, b.min_x)?;
    write_f64(w, b.min_y)?;
    write_f64(w, b.max_x)?;
    write_f64(w, b.max_y)
}

pub(crate) fn read_lane_dir<R: Read>(r: &mut R) -> io::Result<LaneDir> {
    let x = read_u32(r)?;
    // The sentinel record is all zeroes.
    if x == 0 {
        return Ok(LaneDir::default());
    }
    LaneDir::from_u32(x)
}

pub(crate) fn write_lane_dir<W: Write>(w: &mut W, dir: LaneDir) -> io::Result<()> {
    write_u32(w, dir.to_u32())
}

pub(crate) fn read_crdr_dir<R: Read>(r: &mut R) -> io::Result<CrdrDir> {
    let x = read_u32(r)?;
    if x == 0 {
        return Ok(CrdrDir::default());
    }
    CrdrDir::from_u32(x)
}

pub(crate) fn write_crdr_dir<W: Write>(w: &mut W, dir: CrdrDir) -> io::Result<()> {
    write_u32(w, dir.to_u32())
}

pub(crate) fn read_obj_kind<R: Read>(r: &mut R) -> io::Result<ObjectKind> {
    let x = read_u32(r)?;
    if x == 0 {
        return Ok(ObjectKind::default());
    }
    ObjectKind::from_u32(x)
}

pub(crate) fn write_obj_kind<W: Write>(w: &mut W, kind: ObjectKind) -> io::Result<()> {
    write_u32(w, kind.to_u32())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;

    fn check_size<T: Record>(rec: T) {
        let mut buf = Vec::new();
        rec.write(&mut buf).unwrap();
        assert_eq!(buf.len(), T::SIZE, "{}", std::any::type_name::<T>());
        assert_eq!(T::SIZE % 8, 0, "{}", std::any::type_name::<T>());
        let mut cursor = std::io::Cursor::new(buf);
        T::read(&mut cursor).unwrap();
        assert_eq!(cursor.position() as usize, T::SIZE);
    }

    #[test]
    fn strides_match_encoding() {
        check_size(RoadRec::default());
        check_size(RoadPieceRec::default());
        check_size(LaneRec::default());
        check_size(CntrlPntRec::default());
        check_size(LatCntrlPntRec::default());
        check_size(IntrsctnRec::default());
        check_size(BorderSegRec::default());
        check_size(CrdrRec::default());
        check_size(CrdrCntrlPntRec::default());
        check_size(CrdrMrgRec::default());
        check_size(HldOfsRec::default());
        check_size(AttrRec::default());
        check_size(ObjRec::default());
        check_size(ObjRefRec::default());
        check_size(ElevMapRec::default());
        check_size(ElevValueRec::default());
        check_size(GridRec::default());
    }

    #[test]
    fn turn_classification() {
        assert_eq!(CrdrDir::from_turn_degrees(3.0), CrdrDir::Straight);
        assert_eq!(CrdrDir::from_turn_degrees(-44.0), CrdrDir::Straight);
        assert_eq!(CrdrDir::from_turn_degrees(90.0), CrdrDir::Left);
        assert_eq!(CrdrDir::from_turn_degrees(-90.0), CrdrDir::Right);
        assert_eq!(CrdrDir::from_turn_degrees(179.0), CrdrDir::UTurn);
    }

    #[test]
    fn object_kind_codes() {
        for kind in ObjectKind::ALL {
            assert_eq!(ObjectKind::from_u32(kind.to_u32()).unwrap(), kind);
        }
        assert!(ObjectKind::from_u32(99).is_err());
    }
}
