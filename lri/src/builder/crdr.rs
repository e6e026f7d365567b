use anyhow::{bail, Result};

use geom::{Bounds, HermiteCubic, Line, Pt2D, Vector3D};

use crate::records::{CrdrCntrlPntRec, CrdrDir, CrdrMrgRec};
use crate::CrdrID;

use super::road::LaneEnd;

/// Generated centerlines are sampled into this many segments.
const GENERATED_SEGMENTS: usize = 8;
/// Overlap between corridors is checked at about this spacing.
const OVERLAP_STEP: f64 = 0.5;
const MAX_OVERLAP_SAMPLES: usize = 400;
/// Grid cells are at least this big.
const MIN_GRID_CELL: f64 = 5.0;
const MAX_GRID_CELLS_PER_SIDE: f64 = 16.0;

/// The centerline and widths of one corridor, before it's placed in the pools.
pub struct CrdrGeom {
    pub cps: Vec<CrdrCntrlPntRec>,
    pub length: f64,
    pub turn_angle: f64,
    pub direction: CrdrDir,
}

/// A smooth curve from the end of the source lane to the start of the destination lane, leaving
/// and arriving along the lanes' headings.
pub fn generate_centerline(from: &LaneEnd, to: &LaneEnd) -> Result<Vec<Pt2D>> {
    let chord = from.pt.raw_dist_to(to.pt);
    if chord < super::road::MIN_SEGMENT_LENGTH {
        bail!(
            "Can't generate a corridor between coincident lane ends at {}",
            from.pt
        );
    }
    let curve = HermiteCubic::new(
        from.pt.to_3d(0.0),
        to.pt.to_3d(0.0),
        from.heading * chord,
        to.heading * chord,
    );
    Ok((0..=GENERATED_SEGMENTS)
        .map(|i| {
            curve
                .position(i as f64 / GENERATED_SEGMENTS as f64)
                .to_2d()
        })
        .collect())
}

/// Builds control points along a centerline. Width blends linearly from the source lane's width
/// to the destination's.
pub fn crdr_geom(pts: &[Pt2D], start_width: f64, end_width: f64) -> Result<CrdrGeom> {
    if pts.len() < 2 {
        bail!("A corridor needs at least 2 points, not {}", pts.len());
    }
    let mut lengths = Vec::new();
    for pair in pts.windows(2) {
        let len = pair[0].raw_dist_to(pair[1]);
        if len < super::road::MIN_SEGMENT_LENGTH {
            bail!("Corridor has a degenerate segment at {}", pair[0]);
        }
        lengths.push(len);
    }
    let length: f64 = lengths.iter().sum();

    let mut cps = Vec::new();
    let mut dist = 0.0;
    for (idx, pt) in pts.iter().enumerate() {
        let seg = idx.min(pts.len() - 2);
        let dir = Vector3D::new(
            pts[seg + 1].x() - pts[seg].x(),
            pts[seg + 1].y() - pts[seg].y(),
            0.0,
        ) * (1.0 / lengths[seg]);
        let pct = dist / length;
        cps.push(CrdrCntrlPntRec {
            location: *pt,
            right: dir.right_xy(),
            width: start_width + (end_width - start_width) * pct,
            distance: dist,
            left_line_style: 0,
            right_line_style: 0,
        });
        if idx < lengths.len() {
            dist += lengths[idx];
        }
    }

    let entry = Line::new(pts[0], pts[1]).angle();
    let exit = Line::new(pts[pts.len() - 2], pts[pts.len() - 1]).angle();
    let turn_angle = entry.simple_shortest_rotation_towards(exit);
    Ok(CrdrGeom {
        cps,
        length,
        turn_angle,
        direction: CrdrDir::from_turn_degrees(turn_angle),
    })
}

/// The closest point on a corridor centerline: distance along it and unsigned lateral distance.
pub fn project_onto(cps: &[CrdrCntrlPntRec], pt: Pt2D) -> (f64, f64) {
    let mut best = (0.0, f64::MAX);
    for pair in cps.windows(2) {
        let line = Line::new(pair[0].location, pair[1].location);
        let seg_len = pair[1].distance - pair[0].distance;
        let (t, _) = match line.project(pt) {
            Some(x) => x,
            None => continue,
        };
        let t = t.clamp(0.0, 1.0);
        let closest = line.percent_along(t);
        let lateral = closest.raw_dist_to(pt);
        if lateral < best.1 {
            best = (pair[0].distance + t * seg_len, lateral);
        }
    }
    best
}

pub fn width_at(cps: &[CrdrCntrlPntRec], dist: f64) -> f64 {
    for pair in cps.windows(2) {
        if dist <= pair[1].distance {
            let span = pair[1].distance - pair[0].distance;
            let pct = ((dist - pair[0].distance) / span).clamp(0.0, 1.0);
            return pair[0].width + (pair[1].width - pair[0].width) * pct;
        }
    }
    cps.last().map(|cp| cp.width).unwrap_or(0.0)
}

fn point_at(cps: &[CrdrCntrlPntRec], dist: f64) -> Pt2D {
    for pair in cps.windows(2) {
        if dist <= pair[1].distance {
            let span = pair[1].distance - pair[0].distance;
            let pct = ((dist - pair[0].distance) / span).clamp(0.0, 1.0);
            return Line::new(pair[0].location, pair[1].location).percent_along(pct);
        }
    }
    cps[cps.len() - 1].location
}

/// Where two segments properly cross, as percentages along each.
fn segment_crossing(a: &Line, b: &Line) -> Option<(f64, f64)> {
    let (ax, ay) = (a.pt2().x() - a.pt1().x(), a.pt2().y() - a.pt1().y());
    let (bx, by) = (b.pt2().x() - b.pt1().x(), b.pt2().y() - b.pt1().y());
    let denom = ax * by - ay * bx;
    if denom.abs() < 1e-12 {
        return None;
    }
    let (dx, dy) = (b.pt1().x() - a.pt1().x(), b.pt1().y() - a.pt1().y());
    let t = (dx * by - dy * bx) / denom;
    let u = (dx * ay - dy * ax) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((t, u))
    } else {
        None
    }
}

/// How `crdr` relates to `other`: where their lateral extents overlap, where their centerlines
/// cross, and which way `other` heads relative to `crdr`.
pub fn merge_record(
    crdr: CrdrID,
    a: &[CrdrCntrlPntRec],
    other: CrdrID,
    b: &[CrdrCntrlPntRec],
) -> CrdrMrgRec {
    let len_a = a[a.len() - 1].distance;
    let n_samples = ((len_a / OVERLAP_STEP).ceil() as usize).clamp(2, MAX_OVERLAP_SAMPLES);

    let mut first_dist = -1.0;
    let mut last_dist = -1.0;
    for i in 0..=n_samples {
        let dist = len_a * (i as f64) / (n_samples as f64);
        let pt = point_at(a, dist);
        let (dist_b, lateral) = project_onto(b, pt);
        if lateral < (width_at(a, dist) + width_at(b, dist_b)) / 2.0 {
            if first_dist < 0.0 {
                first_dist = dist;
            }
            last_dist = dist;
        }
    }

    let len_b = b[b.len() - 1].distance;
    let mut cross_dist = -1.0;
    let mut other_cross_dist = -1.0;
    'search: for pair_a in a.windows(2) {
        let line_a = Line::new(pair_a[0].location, pair_a[1].location);
        for pair_b in b.windows(2) {
            let line_b = Line::new(pair_b[0].location, pair_b[1].location);
            if let Some((t, u)) = segment_crossing(&line_a, &line_b) {
                let da = pair_a[0].distance + t * (pair_a[1].distance - pair_a[0].distance);
                let db = pair_b[0].distance + u * (pair_b[1].distance - pair_b[0].distance);
                // Sharing an entrance or an exit isn't a crossing.
                let shared_start = da < 1e-6 && db < 1e-6;
                let shared_end = (len_a - da) < 1e-6 && (len_b - db) < 1e-6;
                if shared_start || shared_end {
                    continue;
                }
                cross_dist = da;
                other_cross_dist = db;
                break 'search;
            }
        }
    }

    let heading_a = Line::new(a[0].location, a[1].location).angle();
    let heading_b = Line::new(b[0].location, b[1].location).angle();
    CrdrMrgRec {
        crdr,
        other,
        rel_dir: CrdrDir::from_turn_degrees(heading_a.simple_shortest_rotation_towards(heading_b)),
        first_dist,
        last_dist,
        cross_dist,
        other_cross_dist,
    }
}

pub fn crdr_bounds(cps: &[CrdrCntrlPntRec]) -> Bounds {
    let mut bounds = Bounds::new();
    let mut half_width: f64 = 0.0;
    for cp in cps {
        bounds.update(cp.location);
        half_width = half_width.max(cp.width / 2.0);
    }
    bounds.expand(half_width)
}

/// A grid over an intersection. Each cell lists the corridors passing through it as a bitmask
/// over the intersection's corridors, in order.
pub struct CrdrGrid {
    pub origin: Pt2D,
    pub cell_size: f64,
    pub n_cols: u32,
    pub n_rows: u32,
    pub masks: Vec<u64>,
}

pub fn build_grid(bounds: &Bounds, crdrs: &[&[CrdrCntrlPntRec]]) -> CrdrGrid {
    let cell_size = MIN_GRID_CELL
        .max(bounds.width() / MAX_GRID_CELLS_PER_SIDE)
        .max(bounds.height() / MAX_GRID_CELLS_PER_SIDE);
    let n_cols = ((bounds.width() / cell_size).ceil() as u32).max(1);
    let n_rows = ((bounds.height() / cell_size).ceil() as u32).max(1);
    let origin = Pt2D::new(bounds.min_x, bounds.min_y);
    let mut masks = vec![0_u64; (n_cols * n_rows) as usize];

    let cell_of = |x: f64, y: f64| -> (u32, u32) {
        let col = ((x - origin.x()) / cell_size).floor().max(0.0) as u32;
        let row = ((y - origin.y()) / cell_size).floor().max(0.0) as u32;
        (col.min(n_cols - 1), row.min(n_rows - 1))
    };

    for (k, cps) in crdrs.iter().enumerate() {
        let bit = 1_u64 << k;
        for pair in cps.windows(2) {
            let half_width = pair[0].width.max(pair[1].width) / 2.0;
            let seg = Bounds::from(&[pair[0].location, pair[1].location]).expand(half_width);
            let (c1, r1) = cell_of(seg.min_x, seg.min_y);
            let (c2, r2) = cell_of(seg.max_x, seg.max_y);
            for row in r1..=r2 {
                for col in c1..=c2 {
                    masks[(row * n_cols + col) as usize] |= bit;
                }
            }
        }
    }

    CrdrGrid {
        origin,
        cell_size,
        n_cols,
        n_rows,
        masks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(x1: f64, y1: f64, x2: f64, y2: f64, width: f64) -> Vec<CrdrCntrlPntRec> {
        crdr_geom(&[Pt2D::new(x1, y1), Pt2D::new(x2, y2)], width, width)
            .unwrap()
            .cps
    }

    #[test]
    fn crossing_corridors() {
        let a = straight(0.0, -10.0, 0.0, 10.0, 3.0);
        let b = straight(-10.0, 0.0, 10.0, 0.0, 3.0);
        let mrg = merge_record(CrdrID(1), &a, CrdrID(2), &b);
        assert!((mrg.cross_dist - 10.0).abs() < 1e-9);
        assert!((mrg.other_cross_dist - 10.0).abs() < 1e-9);
        assert!(mrg.overlaps());
        assert!(mrg.first_dist > 7.0 && mrg.first_dist < 10.0);
        assert!(mrg.last_dist > 10.0 && mrg.last_dist < 13.0);
        // a heads north, b heads east
        assert_eq!(mrg.rel_dir, CrdrDir::Right);
    }

    #[test]
    fn parallel_corridors_dont_interact() {
        let a = straight(0.0, 0.0, 20.0, 0.0, 3.0);
        let b = straight(0.0, 10.0, 20.0, 10.0, 3.0);
        let mrg = merge_record(CrdrID(1), &a, CrdrID(2), &b);
        assert!(!mrg.overlaps());
        assert!(!mrg.crosses());
        assert_eq!(mrg.rel_dir, CrdrDir::Straight);
    }

    #[test]
    fn left_turn_geometry() {
        let from = LaneEnd {
            pt: Pt2D::new(0.0, 0.0),
            heading: Vector3D::new(1.0, 0.0, 0.0),
            width: 3.0,
        };
        let to = LaneEnd {
            pt: Pt2D::new(10.0, 10.0),
            heading: Vector3D::new(0.0, 1.0, 0.0),
            width: 3.0,
        };
        let pts = generate_centerline(&from, &to).unwrap();
        let geom = crdr_geom(&pts, 3.0, 3.0).unwrap();
        assert_eq!(geom.direction, CrdrDir::Left);
        assert!(geom.turn_angle > 45.0);
        // Longer than the chord, shorter than going around the corner
        assert!(geom.length > 200.0_f64.sqrt() && geom.length < 20.0);
    }

    #[test]
    fn grid_marks_cells() {
        let a = straight(0.0, 0.0, 40.0, 0.0, 2.0);
        let b = straight(0.0, 30.0, 40.0, 30.0, 2.0);
        let mut bounds = crdr_bounds(&a);
        bounds.union(crdr_bounds(&b));
        let grid = build_grid(&bounds, &[&a, &b]);
        assert!(grid.masks.iter().any(|m| *m == 1));
        assert!(grid.masks.iter().any(|m| *m == 2));
        assert!(grid.masks.iter().all(|m| *m != 3));
    }
}
