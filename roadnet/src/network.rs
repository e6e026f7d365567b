use std::path::Path;

use anyhow::Result;

use geom::{FindClosest, Pt2D};
use lri::{
    AttrDictionary, AttrID, CrdrID, HldOfsID, IntrsctnID, LaneID, ObjID, Pools, RoadID,
    RoadPieceID,
};
use netutil::Timer;

use crate::{
    Attribute, BindingError, Corridor, HoldOffset, Intersection, Lane, NetworkConfig, Road,
    StaticObj,
};

#[derive(Clone, Copy, Debug)]
pub(crate) enum Located {
    Piece(RoadPieceID),
    Intrsctn(IntrsctnID),
}

/// A loaded, validated network and everything needed to query it. Immutable, so any number of
/// threads can share one.
pub struct Network {
    pools: Pools,
    config: NetworkConfig,
    attr_dict: AttrDictionary,
    spatial: FindClosest<Located>,
}

impl Network {
    /// `pools` must already be validated; the builder and `Pools::load` both do that.
    pub fn new(pools: Pools, config: NetworkConfig, timer: &mut Timer) -> Network {
        timer.start("index network");
        let mut items = Vec::new();
        for (id, piece) in pools.road_pieces.iter() {
            items.push((Located::Piece(id), piece.bounds.clone()));
        }
        for (id, i) in pools.intrsctns.iter() {
            items.push((Located::Intrsctn(id), i.bounds.clone()));
        }
        let spatial = FindClosest::bulk_load(items);
        timer.note(format!(
            "Indexed {} road pieces and intersections",
            netutil::prettyprint_usize(spatial.len())
        ));
        timer.stop("index network");

        Network {
            pools,
            config,
            attr_dict: AttrDictionary::standard(),
            spatial,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P, config: NetworkConfig, timer: &mut Timer) -> Result<Network> {
        let pools = Pools::load(path, timer)?;
        Ok(Network::new(pools, config, timer))
    }

    /// Uses the default config.
    pub fn from_pools(pools: Pools) -> Network {
        Network::new(pools, NetworkConfig::default(), &mut Timer::throwaway())
    }

    pub fn pools(&self) -> &Pools {
        &self.pools
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn attr_dict(&self) -> &AttrDictionary {
        &self.attr_dict
    }

    pub fn set_attr_dict(&mut self, dict: AttrDictionary) {
        self.attr_dict = dict;
    }

    pub fn try_road(&self, id: RoadID) -> Result<Road, BindingError> {
        match self.pools.roads.get(id) {
            Some(rec) => Ok(Road::new(self, id, rec)),
            None => Err(BindingError::new(id, "road")),
        }
    }

    pub fn road(&self, id: RoadID) -> Road {
        self.try_road(id).unwrap_or_else(|err| panic!("{}", err))
    }

    /// Only the canonical ID of a lane binds, the one listed at its road's first control point.
    pub fn try_lane(&self, id: LaneID) -> Result<Lane, BindingError> {
        let rec = self
            .pools
            .lanes
            .get(id)
            .ok_or_else(|| BindingError::new(id, "lane"))?;
        match self.pools.roads.get(rec.road) {
            Some(road) if road.lane_idx.offset(rec.index) == id => Ok(Lane::new(self, id, rec)),
            _ => Err(BindingError::new(id, "lane")),
        }
    }

    pub fn lane(&self, id: LaneID) -> Lane {
        self.try_lane(id).unwrap_or_else(|err| panic!("{}", err))
    }

    pub fn try_intrsctn(&self, id: IntrsctnID) -> Result<Intersection, BindingError> {
        match self.pools.intrsctns.get(id) {
            Some(rec) => Ok(Intersection::new(self, id, rec)),
            None => Err(BindingError::new(id, "intersection")),
        }
    }

    pub fn intrsctn(&self, id: IntrsctnID) -> Intersection {
        self.try_intrsctn(id).unwrap_or_else(|err| panic!("{}", err))
    }

    pub fn try_crdr(&self, id: CrdrID) -> Result<Corridor, BindingError> {
        match self.pools.crdrs.get(id) {
            Some(rec) => Ok(Corridor::new(self, id, rec)),
            None => Err(BindingError::new(id, "corridor")),
        }
    }

    pub fn crdr(&self, id: CrdrID) -> Corridor {
        self.try_crdr(id).unwrap_or_else(|err| panic!("{}", err))
    }

    pub fn try_hld_ofs(&self, id: HldOfsID) -> Result<HoldOffset, BindingError> {
        match self.pools.hld_ofs.get(id) {
            Some(rec) => Ok(HoldOffset::new(self, id, rec)),
            None => Err(BindingError::new(id, "hold offset")),
        }
    }

    pub fn hld_ofs(&self, id: HldOfsID) -> HoldOffset {
        self.try_hld_ofs(id).unwrap_or_else(|err| panic!("{}", err))
    }

    pub fn try_attr(&self, id: AttrID) -> Result<Attribute, BindingError> {
        match self.pools.attrs.get(id) {
            Some(rec) => Ok(Attribute::new(self, id, rec)),
            None => Err(BindingError::new(id, "attribute")),
        }
    }

    pub fn attr(&self, id: AttrID) -> Attribute {
        self.try_attr(id).unwrap_or_else(|err| panic!("{}", err))
    }

    pub fn try_static_obj(&self, id: ObjID) -> Result<StaticObj, BindingError> {
        match self.pools.objs.get(id) {
            Some(rec) => Ok(StaticObj::new(self, id, rec)),
            None => Err(BindingError::new(id, "static object")),
        }
    }

    pub fn static_obj(&self, id: ObjID) -> StaticObj {
        self.try_static_obj(id).unwrap_or_else(|err| panic!("{}", err))
    }

    pub fn all_roads(&self) -> impl Iterator<Item = Road> + '_ {
        self.pools
            .roads
            .iter()
            .map(move |(id, rec)| Road::new(self, id, rec))
    }

    pub fn all_intrsctns(&self) -> impl Iterator<Item = Intersection> + '_ {
        self.pools
            .intrsctns
            .iter()
            .map(move |(id, rec)| Intersection::new(self, id, rec))
    }

    pub fn all_crdrs(&self) -> impl Iterator<Item = Corridor> + '_ {
        self.pools
            .crdrs
            .iter()
            .map(move |(id, rec)| Corridor::new(self, id, rec))
    }

    pub fn all_static_objs(&self) -> impl Iterator<Item = StaticObj> + '_ {
        self.pools
            .objs
            .iter()
            .map(move |(id, rec)| StaticObj::new(self, id, rec))
    }

    pub fn road_by_name(&self, name: &str) -> Option<Road> {
        self.pools.road_by_name(name).map(|id| self.road(id))
    }

    pub fn intrsctn_by_name(&self, name: &str) -> Option<Intersection> {
        self.pools.intrsctn_by_name(name).map(|id| self.intrsctn(id))
    }

    /// Road pieces and intersections whose bounding box contains the point.
    pub(crate) fn candidates_at(&self, pt: Pt2D) -> Vec<Located> {
        self.spatial.candidates(pt, 0.0)
    }
}
