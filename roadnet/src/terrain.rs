use serde::{Deserialize, Serialize};

use geom::{Pt2D, Vector3D};

use crate::roadpos::locate;
use crate::{Network, RoadPos};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainCode {
    OnRoad,
    OnIntrsctn,
    /// Nothing within the snap tolerance of the hint. The result echoes the hint, facing up.
    OffNetwork,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainResult {
    pub z: f64,
    pub normal: Vector3D,
    pub code: TerrainCode,
}

// Step used to estimate the slope of an intersection's elevation map.
const SLOPE_STEP: f64 = 0.5;

impl Network {
    /// The surface under `pt`, preferring whatever is closest to `z_hint` vertically. Used to
    /// keep ground objects on the road.
    pub fn qry_terrain(&self, pt: Pt2D, z_hint: f64) -> TerrainResult {
        match locate(self, pt, Some(z_hint)) {
            Some(RoadPos::Road(r)) => {
                let road = self.road(r.road);
                let lane = self.lane(r.lane);
                let lateral = lane.offset_at(r.distance) + r.offset * lane.direction().sign();
                let z = road.position_at(r.distance, lateral).z
                    + road.profile_height(r.distance, lateral);
                TerrainResult {
                    z,
                    normal: road.normal_at(r.distance),
                    code: TerrainCode::OnRoad,
                }
            }
            Some(RoadPos::Intrsctn(i)) => {
                let intrsctn = self.intrsctn(i.intrsctn);
                let z = intrsctn.elevation_at(pt);
                let dzdx = (intrsctn.elevation_at(pt.offset(SLOPE_STEP, 0.0))
                    - intrsctn.elevation_at(pt.offset(-SLOPE_STEP, 0.0)))
                    / (2.0 * SLOPE_STEP);
                let dzdy = (intrsctn.elevation_at(pt.offset(0.0, SLOPE_STEP))
                    - intrsctn.elevation_at(pt.offset(0.0, -SLOPE_STEP)))
                    / (2.0 * SLOPE_STEP);
                TerrainResult {
                    z,
                    normal: Vector3D::new(-dzdx, -dzdy, 1.0).normalized_or(Vector3D::UP),
                    code: TerrainCode::OnIntrsctn,
                }
            }
            None => TerrainResult {
                z: z_hint,
                normal: Vector3D::UP,
                code: TerrainCode::OffNetwork,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lri::synthetic;

    #[test]
    fn flat_roads_face_up() {
        let net = Network::from_pools(synthetic::straight_road(2).unwrap());
        let result = net.qry_terrain(Pt2D::new(250.0, 3.0), 1.0);
        assert_eq!(result.code, TerrainCode::OnRoad);
        assert!(result.z.abs() < 1e-9);
        assert!((result.normal.k - 1.0).abs() < 1e-9);

        let inside = net.qry_terrain(Pt2D::new(1075.0, 0.0), 0.0);
        assert_eq!(inside.code, TerrainCode::OnIntrsctn);

        let off = net.qry_terrain(Pt2D::new(250.0, 500.0), 7.0);
        assert_eq!(off.code, TerrainCode::OffNetwork);
        assert_eq!(off.z, 7.0);
    }
}
