//! Every cross-reference between pools is one of these typed indices, so a `RoadID` can't be
//! passed where a `LaneID` is expected. Index 0 is the null sentinel in every pool.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PoolKind;

/// Implemented by every ID type, so `Pool<T>` can be indexed by the right kind of ID.
pub trait PoolId: Copy + Eq + Ord + fmt::Debug + fmt::Display {
    const POOL: PoolKind;

    fn from_raw(x: u32) -> Self;
    fn raw(self) -> u32;

    fn is_null(self) -> bool {
        self.raw() == 0
    }

    fn idx(self) -> usize {
        self.raw() as usize
    }
}

macro_rules! define_id {
    ($name:ident, $pool:ident, $label:expr) => {
        #[derive(
            Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl $name {
            pub const NULL: $name = $name(0);

            /// None for the null sentinel.
            pub fn non_null(self) -> Option<$name> {
                if self.0 == 0 {
                    None
                } else {
                    Some(self)
                }
            }

            /// The ID `n` records after this one.
            pub fn offset(self, n: u32) -> $name {
                $name(self.0 + n)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{} #{}", $label, self.0)
            }
        }

        impl PoolId for $name {
            const POOL: PoolKind = PoolKind::$pool;

            fn from_raw(x: u32) -> $name {
                $name(x)
            }

            fn raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(RoadID, Roads, "Road");
define_id!(RoadPieceID, RoadPieces, "RoadPiece");
define_id!(LaneID, Lanes, "Lane");
define_id!(CntrlPntID, CntrlPnts, "CntrlPnt");
define_id!(LatCntrlPntID, LatCntrlPnts, "LatCntrlPnt");
define_id!(IntrsctnID, Intrsctns, "Intersection");
define_id!(BorderSegID, BorderSegs, "BorderSeg");
define_id!(CrdrID, Crdrs, "Corridor");
define_id!(CrdrCntrlPntID, CrdrCntrlPnts, "CrdrCntrlPnt");
define_id!(CrdrMrgID, CrdrMrgs, "CrdrMrg");
define_id!(HldOfsID, HldOfs, "HoldOffset");
define_id!(AttrID, Attrs, "Attribute");
define_id!(ObjID, Objs, "Object");
define_id!(ObjRefID, ObjRefs, "ObjRef");
define_id!(ElevMapID, ElevMaps, "ElevMap");
define_id!(ElevValueID, ElevValues, "ElevValue");
define_id!(GridID, Grids, "GridCell");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sentinel() {
        assert!(RoadID::NULL.is_null());
        assert_eq!(RoadID(0).non_null(), None);
        assert_eq!(LaneID(3).non_null(), Some(LaneID(3)));
        assert_eq!(CrdrID(4).offset(2), CrdrID(6));
        assert_eq!(IntrsctnID(7).to_string(), "Intersection #7");
    }
}
