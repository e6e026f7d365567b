use lri::records::AttrRec;
use lri::AttrID;

use crate::objects::impl_view_traits;
use crate::Network;

#[derive(Clone, Copy)]
pub struct Attribute<'a> {
    net: &'a Network,
    id: AttrID,
    rec: &'a AttrRec,
}

impl_view_traits!(Attribute, id);

impl<'a> Attribute<'a> {
    pub(crate) fn new(net: &'a Network, id: AttrID, rec: &'a AttrRec) -> Attribute<'a> {
        Attribute { net, id, rec }
    }

    pub fn id(&self) -> AttrID {
        self.id
    }

    /// The attribute's type, as numbered by the dictionary.
    pub fn attr_id(&self) -> u32 {
        self.rec.id
    }

    pub fn name(&self) -> &'a str {
        self.net.pools().name(self.rec.name)
    }

    pub fn value1(&self) -> f64 {
        self.rec.value1
    }

    pub fn value2(&self) -> f64 {
        self.rec.value2
    }

    pub fn is_active(&self) -> bool {
        self.rec.active
    }

    pub fn lane_mask(&self) -> u32 {
        self.rec.lane_mask
    }

    pub fn from(&self) -> f64 {
        self.rec.from
    }

    /// None when the attribute runs through the end of its road.
    pub fn to(&self) -> Option<f64> {
        if self.rec.to < 0.0 {
            None
        } else {
            Some(self.rec.to)
        }
    }

    /// [from, to), where an open end covers everything past `from`.
    pub fn applies_at(&self, dist: f64) -> bool {
        dist >= self.rec.from && self.to().map(|to| dist < to).unwrap_or(true)
    }

    /// A mask of 0 on either side means every lane.
    pub fn applies_to_lanes(&self, mask: u32) -> bool {
        self.rec.lane_mask == 0 || mask == 0 || self.rec.lane_mask & mask != 0
    }
}

/// The first active attribute of type `attr_id` in pool order that covers `dist` (if given) and
/// intersects `lane_mask`.
pub(crate) fn qry_attr<'a>(
    attrs: impl Iterator<Item = Attribute<'a>>,
    attr_id: u32,
    dist: Option<f64>,
    lane_mask: u32,
) -> Option<Attribute<'a>> {
    attrs
        .filter(|a| a.attr_id() == attr_id && a.is_active())
        .filter(|a| dist.map(|d| a.applies_at(d)).unwrap_or(true))
        .find(|a| a.applies_to_lanes(lane_mask))
}
