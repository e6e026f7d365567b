//! Queries over a loaded road network: read-only views of roads, lanes, intersections and
//! corridors; road-relative positions that can be travelled along the network; paths and route
//! search; and terrain lookups.
//!
//! Everything here borrows an immutable `Network`, so queries from many threads can share one.

#[macro_use]
extern crate log;

mod config;
mod error;
mod network;
mod objects;
mod path;
mod roadpos;
mod terrain;

pub use crate::config::NetworkConfig;
pub use crate::error::BindingError;
pub use crate::network::Network;
pub use crate::objects::{
    Attribute, Corridor, CrdrPriority, HoldOffset, Intersection, Lane, ObjPlacement, Road,
    StaticObj,
};
pub use crate::path::{CrdrRange, LaneRange, Path, PathPoint, Upcoming};
pub use crate::roadpos::{CrdrPos, OnIntrsctn, OnRoad, RoadPos, TravelResult, TurnDir};
pub use crate::terrain::{TerrainCode, TerrainResult};
