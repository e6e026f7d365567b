use anyhow::{bail, Result};

use geom::{fit_radius, Bounds, HermiteCubic, Pt2D, Pt3D, Vector3D};

use crate::records::{CntrlPntRec, LaneRec};
use crate::{CntrlPntID, LaneID, RoadID};

use super::RoadSpec;

/// Shorter segments can't produce a stable tangent.
pub const MIN_SEGMENT_LENGTH: f64 = 0.01;
/// Road pieces cover this many segments each.
const PIECE_SEGMENTS: usize = 8;

/// Derives every control point of a road from its polyline. Tangents follow Catmull-Rom, so the
/// spline passes through every point with a continuous heading. Lane and lateral indices are
/// left null for the caller.
pub fn compute_cntrl_pnts(spec: &RoadSpec) -> Result<Vec<CntrlPntRec>> {
    let pts: Vec<Pt3D> = spec.points.iter().map(|p| p.pos).collect();
    if pts.len() < 2 {
        bail!("Road {} has {} control points", spec.name, pts.len());
    }
    let n = pts.len();

    let mut chords = Vec::new();
    for i in 0..n - 1 {
        let len = pts[i].dist_to(pts[i + 1]);
        if len < MIN_SEGMENT_LENGTH {
            bail!(
                "Road {} has a degenerate segment between points {} and {}",
                spec.name,
                i,
                i + 1
            );
        }
        chords.push(len);
    }

    // Unit tangents at each point
    let mut unit_tangents = Vec::new();
    for i in 0..n {
        let chord_dir = if i == n - 1 {
            (pts[i] - pts[i - 1]) * (1.0 / chords[i - 1])
        } else {
            (pts[i + 1] - pts[i]) * (1.0 / chords[i])
        };
        let tangent = if i == 0 || i == n - 1 {
            chord_dir
        } else {
            (pts[i + 1] - pts[i - 1]).normalized_or(chord_dir)
        };
        unit_tangents.push(tangent);
    }

    let mut hermites = Vec::new();
    for i in 0..n - 1 {
        hermites.push(HermiteCubic::new(
            pts[i],
            pts[i + 1],
            unit_tangents[i] * chords[i],
            unit_tangents[i + 1] * chords[i],
        ));
    }

    let widths = lane_widths(spec)?;
    let mut cps = Vec::new();
    let mut cum_lin = 0.0;
    let mut cum_cubic = 0.0;
    let mut prev_right = Vector3D::new(0.0, -1.0, 0.0);
    let mut prev_tangent = Vector3D::new(1.0, 0.0, 0.0);
    for i in 0..n {
        let last = i == n - 1;
        let tangent = if last {
            prev_tangent
        } else {
            (pts[i + 1] - pts[i]) * (1.0 / chords[i])
        };
        let right_linear = tangent.cross(Vector3D::UP).normalized_or(prev_right);
        let (hermite, right_cubic, normal, dist_to_next_cubic) = if last {
            let h = &hermites[i - 1];
            (
                HermiteCubic::default(),
                h.right(1.0, right_linear),
                h.normal(1.0, Vector3D::UP),
                0.0,
            )
        } else {
            let h = hermites[i];
            (
                h,
                h.right(0.0, right_linear),
                h.normal(0.0, Vector3D::UP),
                h.arc_length(),
            )
        };
        let logical_width: f64 = widths[i].iter().sum();

        cps.push(CntrlPntRec {
            location: pts[i],
            normal,
            tangent,
            right_linear,
            right_cubic,
            hermite,
            cummulative_lin_dist: cum_lin,
            cummulative_cubic_dist: cum_cubic,
            dist_to_next_lin: if last { 0.0 } else { chords[i] },
            dist_to_next_cubic,
            radius: radius_at(&pts, &hermites, i),
            logical_width,
            physical_width: logical_width + 2.0 * spec.shoulder,
            lane_idx: LaneID::NULL,
            n_lanes: widths[i].len() as u32,
            lat_cp_idx: Default::default(),
            n_lat_cps: 0,
        });

        if !last {
            cum_lin += chords[i];
            cum_cubic += dist_to_next_cubic;
        }
        prev_right = right_linear;
        prev_tangent = tangent;
    }
    Ok(cps)
}

/// Fits a circle through the control points around `i` and the midpoints of the adjacent
/// segments.
fn radius_at(pts: &[Pt3D], hermites: &[HermiteCubic], i: usize) -> f64 {
    let mut window = Vec::new();
    if i > 0 {
        window.push(pts[i - 1].to_2d());
        window.push(hermites[i - 1].position(0.5).to_2d());
    }
    window.push(pts[i].to_2d());
    if i + 1 < pts.len() {
        window.push(hermites[i].position(0.5).to_2d());
        window.push(pts[i + 1].to_2d());
    }
    fit_radius(&window)
}

/// The width of every lane at every control point.
fn lane_widths(spec: &RoadSpec) -> Result<Vec<Vec<f64>>> {
    if spec.lanes.is_empty() {
        bail!("Road {} has no lanes", spec.name);
    }
    let mut result = Vec::new();
    for (idx, pt) in spec.points.iter().enumerate() {
        let widths = match pt.lane_widths {
            Some(ref widths) => {
                if widths.len() != spec.lanes.len() {
                    bail!(
                        "Road {} point {} lists {} lane widths, but the road has {} lanes",
                        spec.name,
                        idx,
                        widths.len(),
                        spec.lanes.len()
                    );
                }
                widths.clone()
            }
            None => spec.lanes.iter().map(|l| l.width).collect(),
        };
        if widths.iter().any(|w| *w <= 0.0) {
            bail!("Road {} point {} has a lane without width", spec.name, idx);
        }
        result.push(widths);
    }
    Ok(result)
}

/// The lanes at one control point. Lanes are listed left to right, looking along the road's
/// positive direction, and together span the logical width centered on the road.
pub fn lanes_at(spec: &RoadSpec, road: RoadID, cp_idx: usize) -> Result<Vec<LaneRec>> {
    let widths = lane_widths(spec)?.remove(cp_idx);
    let total: f64 = widths.iter().sum();
    let mut left_edge = -total / 2.0;
    let mut lanes = Vec::new();
    for (idx, (width, lane)) in widths.into_iter().zip(spec.lanes.iter()).enumerate() {
        lanes.push(LaneRec {
            road,
            index: idx as u32,
            direction: lane.dir,
            flags: lane.flags,
            width,
            offset: left_edge + width / 2.0,
        });
        left_edge += width;
    }
    Ok(lanes)
}

/// Splits a road's control points into runs and bounds each, covering the full physical width.
/// Returns (first, last) control point and bounds per piece.
pub fn road_pieces(
    cps: &[CntrlPntRec],
    first_id: CntrlPntID,
) -> Vec<(CntrlPntID, CntrlPntID, Bounds)> {
    let mut pieces = Vec::new();
    let n_segments = cps.len() - 1;
    let mut start = 0;
    while start < n_segments {
        let end = (start + PIECE_SEGMENTS).min(n_segments);
        let mut bounds = Bounds::new();
        let mut half_width: f64 = 0.0;
        for cp in &cps[start..=end] {
            bounds.update(cp.location.to_2d());
            half_width = half_width.max(cp.physical_width / 2.0);
        }
        for cp in &cps[start..end] {
            for t in [0.25, 0.5, 0.75] {
                bounds.update(cp.hermite.position(t).to_2d());
            }
        }
        pieces.push((
            first_id.offset(start as u32),
            first_id.offset(end as u32),
            bounds.expand(half_width),
        ));
        start = end;
    }
    pieces
}

/// Where a lane crosses one end of its road.
pub struct LaneEnd {
    pub pt: Pt2D,
    /// Unit heading of travel in the lane, on the ground plane.
    pub heading: Vector3D,
    pub width: f64,
}

/// `cp` must be the road's first or last control point, and `lane` the lane listed there.
pub fn lane_end(cp: &CntrlPntRec, lane: &LaneRec) -> LaneEnd {
    let pt = cp.location.offset(cp.right_linear * lane.offset).to_2d();
    let heading = cp.tangent.flatten().normalized_or(cp.tangent) * lane.direction.sign();
    LaneEnd {
        pt,
        heading,
        width: lane.width,
    }
}
