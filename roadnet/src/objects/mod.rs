//! Read-only views of pool records. Each binds one record to the network it came from, so
//! related records can be reached by following IDs. Views are cheap to copy and are only created
//! through `Network`, which checks that the ID resolves.

mod attribute;
mod corridor;
mod hold_offset;
mod intersection;
mod lane;
mod road;
mod static_obj;

use serde::{Deserialize, Serialize};

use lri::records::ObjRefRec;
use lri::{CrdrID, ObjID};

pub use self::attribute::Attribute;
pub use self::corridor::Corridor;
pub use self::hold_offset::HoldOffset;
pub use self::intersection::{CrdrPriority, Intersection};
pub use self::lane::Lane;
pub use self::road::Road;
pub use self::static_obj::StaticObj;

/// A static object placed along a road, or along one corridor of an intersection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjPlacement {
    pub obj: ObjID,
    pub crdr: Option<CrdrID>,
    pub distance: f64,
}

impl ObjPlacement {
    fn from_rec(rec: &ObjRefRec) -> ObjPlacement {
        ObjPlacement {
            obj: rec.obj,
            crdr: rec.crdr.non_null(),
            distance: rec.distance,
        }
    }
}

macro_rules! impl_view_traits {
    ($view:ident, $field:ident) => {
        impl<'a> PartialEq for $view<'a> {
            fn eq(&self, other: &$view<'a>) -> bool {
                self.$field == other.$field
            }
        }

        impl<'a> std::fmt::Debug for $view<'a> {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.$field)
            }
        }
    };
}

pub(crate) use impl_view_traits;
