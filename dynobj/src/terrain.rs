use geom::{Pt2D, Vector3D};
use roadnet::{Network, TerrainCode, TerrainResult};

/// Answers "how high is the ground here, and which way does it face".
pub trait TerrainSource {
    fn qry_terrain(&self, pt: Pt2D, z_hint: f64) -> TerrainResult;
}

impl TerrainSource for Network {
    fn qry_terrain(&self, pt: Pt2D, z_hint: f64) -> TerrainResult {
        Network::qry_terrain(self, pt, z_hint)
    }
}

/// Level ground everywhere, at one height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatTerrain {
    pub z: f64,
}

impl TerrainSource for FlatTerrain {
    fn qry_terrain(&self, _: Pt2D, _: f64) -> TerrainResult {
        TerrainResult {
            z: self.z,
            normal: Vector3D::UP,
            code: TerrainCode::OnRoad,
        }
    }
}
