use geom::{Pt3D, Vector3D};
use lri::records::ObjRec;
use lri::{ObjID, ObjectKind};

use crate::objects::impl_view_traits;
use crate::Network;

#[derive(Clone, Copy)]
pub struct StaticObj<'a> {
    net: &'a Network,
    id: ObjID,
    rec: &'a ObjRec,
}

impl_view_traits!(StaticObj, id);

impl<'a> StaticObj<'a> {
    pub(crate) fn new(net: &'a Network, id: ObjID, rec: &'a ObjRec) -> StaticObj<'a> {
        StaticObj { net, id, rec }
    }

    pub fn id(&self) -> ObjID {
        self.id
    }

    pub fn name(&self) -> &'a str {
        self.net.pools().name(self.rec.name)
    }

    pub fn kind(&self) -> ObjectKind {
        self.rec.kind
    }

    /// Identifies the model used to draw and collide with this object.
    pub fn sol_id(&self) -> u32 {
        self.rec.sol_id
    }

    pub fn flags(&self) -> u32 {
        self.rec.flags
    }

    pub fn position(&self) -> Pt3D {
        self.rec.position
    }

    pub fn tangent(&self) -> Vector3D {
        self.rec.tangent
    }

    pub fn lateral(&self) -> Vector3D {
        self.rec.lateral
    }

    /// Length, width, height.
    pub fn size(&self) -> Vector3D {
        self.rec.size
    }
}
