//! The pool store: every road, lane, intersection and corridor of a network, kept in flat
//! fixed-stride arrays that reference each other by typed index. Pools can be written to and
//! read from a single binary file, or assembled programmatically with the `Builder`.

#[macro_use]
extern crate log;

mod attr_dict;
mod builder;
mod file;
mod ids;
mod pool;
mod pools;
pub mod records;
pub mod synthetic;
mod validate;

pub use crate::attr_dict::AttrDictionary;
pub use crate::builder::{
    square_border, AttrSpec, Builder, CrdrRef, CrdrSpec, ElevGrid, HldOfsSpec, LaneSpec, ObjSpec,
    RoadPoint, RoadSpec, MIN_SEGMENT_LENGTH,
};
pub use crate::file::{FileVersion, HEADER_SIZE, MAGIC, RESERVED_ATTRS, RESERVED_OBJS};
pub use crate::ids::{
    AttrID, BorderSegID, CntrlPntID, CrdrCntrlPntID, CrdrID, CrdrMrgID, ElevMapID, ElevValueID,
    GridID, HldOfsID, IntrsctnID, LaneID, LatCntrlPntID, ObjID, ObjRefID, PoolId, RoadID,
    RoadPieceID,
};
pub use crate::pool::{CharPool, Pool, PoolKind, Record};
pub use crate::pools::Pools;
pub use crate::records::{CrdrDir, HoldReason, LaneDir, ObjectKind};
