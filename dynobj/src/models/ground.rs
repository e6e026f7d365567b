use geom::{Pt3D, Vector3D};
use roadnet::TerrainCode;

use crate::{Pose, TerrainSource};

// Footprints smaller than this get sampled as if they were this big, so the three points never
// collapse onto each other.
const MIN_HALF_SPAN: f64 = 0.25;

/// Moves `dist` along `dir` in the xy plane and settles onto the terrain. The ground is sampled
/// under the front of the footprint and its two rear corners; the plane through those three
/// points gives the new height and attitude. If any sample misses the terrain, the previous
/// attitude and height are kept.
pub(crate) fn ground_step(
    pose: &Pose,
    dir: Vector3D,
    dist: f64,
    size: Vector3D,
    terrain: &dyn TerrainSource,
) -> Pose {
    let fallback = pose
        .tangent
        .flatten()
        .normalized_or(Vector3D::new(1.0, 0.0, 0.0));
    let heading = dir.flatten().normalized_or(fallback);
    let right = heading.right_xy();
    let center = pose.position.offset(heading * dist);
    let half_len = (size.i / 2.0).max(MIN_HALF_SPAN);
    let half_width = (size.j / 2.0).max(MIN_HALF_SPAN);

    let samples = [
        center.offset(heading * half_len),
        center.offset(heading * -half_len - right * half_width),
        center.offset(heading * -half_len + right * half_width),
    ];
    let mut ground = [Pt3D::default(); 3];
    for (pt, sample) in ground.iter_mut().zip(samples) {
        let result = terrain.qry_terrain(sample.to_2d(), pose.position.z);
        if result.code == TerrainCode::OffNetwork {
            trace!("No terrain under {}; keeping the old attitude", sample);
            return Pose {
                position: Pt3D::new(center.x, center.y, pose.position.z),
                tangent: pose.tangent,
                lateral: pose.lateral,
            };
        }
        *pt = Pt3D::new(sample.x, sample.y, result.z);
    }
    let [front, rear_left, rear_right] = ground;

    let tangent = (front - rear_left.lerp(rear_right, 0.5)).normalized_or(pose.tangent);
    let lateral = rear_right - rear_left;
    // Square up the lateral against the tangent
    let lateral = (lateral - tangent * lateral.dot(tangent)).normalized_or(pose.lateral);
    let normal = lateral.cross(tangent).normalized_or(Vector3D::UP);

    let centroid = Pt3D::new(
        (front.x + rear_left.x + rear_right.x) / 3.0,
        (front.y + rear_left.y + rear_right.y) / 3.0,
        (front.z + rear_left.z + rear_right.z) / 3.0,
    );
    let z = if normal.k.abs() > 1e-9 {
        centroid.z
            - (normal.i * (center.x - centroid.x) + normal.j * (center.y - centroid.y)) / normal.k
    } else {
        centroid.z
    };

    Pose {
        position: Pt3D::new(center.x, center.y, z),
        tangent,
        lateral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlatTerrain;
    use geom::Pt2D;
    use roadnet::TerrainResult;

    /// Rises 1 for every 10 travelled east; nothing west of x = -50.
    struct Ramp;

    impl TerrainSource for Ramp {
        fn qry_terrain(&self, pt: Pt2D, z_hint: f64) -> TerrainResult {
            if pt.x() < -50.0 {
                return TerrainResult {
                    z: z_hint,
                    normal: Vector3D::UP,
                    code: TerrainCode::OffNetwork,
                };
            }
            TerrainResult {
                z: pt.x() / 10.0,
                normal: Vector3D::new(-0.1, 0.0, 1.0).normalized_or(Vector3D::UP),
                code: TerrainCode::OnRoad,
            }
        }
    }

    fn size() -> Vector3D {
        Vector3D::new(4.0, 2.0, 1.5)
    }

    #[test]
    fn level_ground() {
        let start = Pose::level(Pt3D::new(0.0, 0.0, 3.0), Vector3D::new(0.0, 1.0, 0.0));
        let pose = ground_step(&start, start.tangent, 5.0, size(), &FlatTerrain { z: 1.0 });
        assert!(pose.position.approx_eq(Pt3D::new(0.0, 5.0, 1.0), 1e-9));
        assert!((pose.tangent - start.tangent).length() < 1e-9);
        assert!((pose.up() - Vector3D::UP).length() < 1e-9);
    }

    #[test]
    fn climbing_a_ramp() {
        let start = Pose::level(Pt3D::new(0.0, 0.0, 0.0), Vector3D::new(1.0, 0.0, 0.0));
        let pose = ground_step(&start, start.tangent, 20.0, size(), &Ramp);
        assert!((pose.position.z - 2.0).abs() < 1e-9);
        // Pitched up along the slope, still level side to side
        let expected = Vector3D::new(10.0, 0.0, 1.0).normalized_or(Vector3D::UP);
        assert!((pose.tangent - expected).length() < 1e-9);
        assert!(pose.lateral.k.abs() < 1e-9);
        assert!(pose.up().k > 0.0);
    }

    #[test]
    fn missing_terrain_keeps_the_attitude() {
        let start = ground_step(
            &Pose::level(Pt3D::new(-40.0, 0.0, -4.0), Vector3D::new(1.0, 0.0, 0.0)),
            Vector3D::new(1.0, 0.0, 0.0),
            0.0,
            size(),
            &Ramp,
        );
        // Heading west past the edge, the leading sample misses
        let pose = ground_step(&start, Vector3D::new(-1.0, 0.0, 0.0), 9.0, size(), &Ramp);
        assert_eq!(pose.tangent, start.tangent);
        assert_eq!(pose.lateral, start.lateral);
        assert_eq!(pose.position.z, start.position.z);
        assert!((pose.position.x + 49.0).abs() < 1e-9);
    }
}
