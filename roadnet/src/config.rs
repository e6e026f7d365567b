use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tuning for queries over a loaded network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// How far from the last known control point a local search walks before giving up and
    /// searching the whole road.
    pub search_distance: f64,
    /// Vertical tolerance when snapping an arbitrary point onto the network.
    pub terrain_snap: f64,
    /// Route search keeps this many candidates per level.
    pub route_beam_width: usize,
    /// Route search drops branches that moved away from the destination more often than this.
    pub route_max_away: usize,
    /// A single path extension gives up after entering this many intersections.
    pub max_intrsctns_hit: usize,
    /// The attribute ID that marks a road as a highway.
    pub highway_attr: u32,
}

impl Default for NetworkConfig {
    fn default() -> NetworkConfig {
        NetworkConfig {
            search_distance: 20.0,
            terrain_snap: 4.0,
            route_beam_width: 12,
            route_max_away: 4,
            max_intrsctns_hit: 64,
            highway_attr: 9,
        }
    }
}

impl NetworkConfig {
    /// Fields missing from the file keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<NetworkConfig> {
        let path = path.as_ref();
        let raw = fs_err::read_to_string(path)?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: NetworkConfig = serde_json::from_str(r#"{"terrain_snap": 2.5}"#).unwrap();
        assert_eq!(config.terrain_snap, 2.5);
        assert_eq!(config.search_distance, 20.0);
        assert_eq!(config.route_beam_width, 12);
    }
}
