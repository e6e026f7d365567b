use enumset::EnumSet;

use geom::Distance;
use lri::records::HldOfsRec;
use lri::{HldOfsID, HoldReason};

use crate::objects::impl_view_traits;
use crate::{Corridor, Network, StaticObj};

/// A place along a corridor where traffic may have to stop.
#[derive(Clone, Copy)]
pub struct HoldOffset<'a> {
    net: &'a Network,
    id: HldOfsID,
    rec: &'a HldOfsRec,
}

impl_view_traits!(HoldOffset, id);

impl<'a> HoldOffset<'a> {
    pub(crate) fn new(net: &'a Network, id: HldOfsID, rec: &'a HldOfsRec) -> HoldOffset<'a> {
        HoldOffset { net, id, rec }
    }

    pub fn id(&self) -> HldOfsID {
        self.id
    }

    pub fn crdr(&self) -> Corridor<'a> {
        self.net.crdr(self.rec.crdr)
    }

    pub fn distance(&self) -> Distance {
        Distance::meters(self.rec.distance)
    }

    pub fn reasons(&self) -> EnumSet<HoldReason> {
        self.rec.reason
    }

    /// Degrees, relative to the corridor's heading at the hold line.
    pub fn orientation(&self) -> f64 {
        self.rec.orientation
    }

    pub fn thickness(&self) -> f64 {
        self.rec.thickness
    }

    /// The sign or light that causes the hold, if any.
    pub fn obj(&self) -> Option<StaticObj<'a>> {
        self.net.try_static_obj(self.rec.obj).ok()
    }
}
