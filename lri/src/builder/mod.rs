//! Assembles a network from roads, intersections and corridors described in world coordinates,
//! deriving everything the pools store: spline coefficients, lengths, curvature, lane layout,
//! corridor relationships and spatial grids. All construction state lives in one `Builder`.

mod crdr;
mod road;

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use enumset::EnumSet;
use serde::{Deserialize, Serialize};

use geom::{Pt2D, Pt3D, Ring, Vector3D};
use netutil::Timer;

use crate::file::{RESERVED_ATTRS, RESERVED_OBJS};
use crate::records::{
    AttrRec, BorderSegRec, CrdrRec, ElevMapRec, ElevValueRec, GridRec, HldOfsRec, HoldReason,
    IntrsctnRec, LaneDir, LatCntrlPntRec, ObjRec, ObjRefRec, ObjectKind, RoadPieceRec, RoadRec,
    MAX_CRDRS_PER_INTRSCTN, MAX_ROADS,
};
use crate::{CharPool, CrdrID, IntrsctnID, LaneID, ObjID, Pools, RoadID};

pub use self::road::MIN_SEGMENT_LENGTH;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LaneSpec {
    pub width: f64,
    pub dir: LaneDir,
    pub flags: u32,
}

impl LaneSpec {
    pub fn new(width: f64, dir: LaneDir) -> LaneSpec {
        LaneSpec {
            width,
            dir,
            flags: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoadPoint {
    pub pos: Pt3D,
    /// Overrides the lanes' default widths from this point on.
    pub lane_widths: Option<Vec<f64>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoadSpec {
    pub name: String,
    pub src: IntrsctnID,
    pub dst: IntrsctnID,
    pub points: Vec<RoadPoint>,
    /// Left to right, looking along the direction from `src` to `dst`.
    pub lanes: Vec<LaneSpec>,
    /// Paved width beyond the outer lanes, on each side.
    pub shoulder: f64,
    /// The cross-section as (lateral offset, height) pairs.
    pub profile: Vec<(f64, f64)>,
}

impl RoadSpec {
    pub fn new(
        name: &str,
        src: IntrsctnID,
        dst: IntrsctnID,
        points: Vec<Pt3D>,
        lanes: Vec<LaneSpec>,
    ) -> RoadSpec {
        RoadSpec {
            name: name.to_string(),
            src,
            dst,
            points: points
                .into_iter()
                .map(|pos| RoadPoint {
                    pos,
                    lane_widths: None,
                })
                .collect(),
            lanes,
            shoulder: 0.0,
            profile: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrdrSpec {
    pub src_road: RoadID,
    pub src_lane: u32,
    pub dst_road: RoadID,
    pub dst_lane: u32,
    /// The centerline. When empty, a smooth curve between the two lane ends is generated.
    pub points: Vec<Pt2D>,
}

impl CrdrSpec {
    pub fn new(src_road: RoadID, src_lane: u32, dst_road: RoadID, dst_lane: u32) -> CrdrSpec {
        CrdrSpec {
            src_road,
            src_lane,
            dst_road,
            dst_lane,
            points: Vec::new(),
        }
    }
}

/// Names a corridor before its final ID is known. Corridors are stored grouped by intersection,
/// so IDs are only assigned by `finish`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrdrRef {
    pub intrsctn: IntrsctnID,
    pub local: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HldOfsSpec {
    pub distance: f64,
    pub reason: EnumSet<HoldReason>,
    pub obj: ObjID,
    pub orientation: f64,
    pub thickness: f64,
}

impl HldOfsSpec {
    pub fn new(distance: f64, reason: EnumSet<HoldReason>) -> HldOfsSpec {
        HldOfsSpec {
            distance,
            reason,
            obj: ObjID::NULL,
            orientation: 0.0,
            thickness: 0.3,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttrSpec {
    pub id: u32,
    pub name: String,
    pub lane_mask: u32,
    pub from: f64,
    pub to: f64,
    pub value1: f64,
    pub value2: f64,
    pub active: bool,
}

impl AttrSpec {
    /// Applies to the whole element and every lane.
    pub fn new(id: u32, name: &str, value1: f64) -> AttrSpec {
        AttrSpec {
            id,
            name: name.to_string(),
            lane_mask: 0,
            from: 0.0,
            to: -1.0,
            value1,
            value2: 0.0,
            active: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjSpec {
    pub name: String,
    pub kind: ObjectKind,
    pub sol_id: u32,
    pub flags: u32,
    pub position: Pt3D,
    pub tangent: Vector3D,
    pub size: Vector3D,
}

/// Elevation samples covering an intersection, row-major starting at `origin`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElevGrid {
    pub origin: Pt2D,
    pub resolution: f64,
    pub n_rows: u32,
    pub n_cols: u32,
    pub values: Vec<f64>,
}

struct IntrsctnSpec {
    name: String,
    border: Vec<Pt2D>,
    elevation: f64,
    elev_grid: Option<ElevGrid>,
    crdrs: Vec<PendingCrdr>,
    attrs: Vec<AttrSpec>,
    obj_refs: Vec<(ObjID, usize, f64)>,
}

struct PendingCrdr {
    spec: CrdrSpec,
    hld_ofs: Vec<HldOfsSpec>,
}

struct PendingRoad {
    spec: RoadSpec,
    attrs: Vec<AttrSpec>,
    obj_refs: Vec<(ObjID, f64)>,
}

/// Collects a network's elements, then derives and lays out all pools in `finish`. IDs for
/// roads, intersections and objects are handed out immediately; corridors get a `CrdrRef`.
#[derive(Default)]
pub struct Builder {
    intrsctns: Vec<IntrsctnSpec>,
    roads: Vec<PendingRoad>,
    objs: Vec<ObjSpec>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// `border` is the outline, in order; it's closed automatically.
    pub fn add_intersection(&mut self, name: &str, border: Vec<Pt2D>, elevation: f64) -> IntrsctnID {
        self.intrsctns.push(IntrsctnSpec {
            name: name.to_string(),
            border,
            elevation,
            elev_grid: None,
            crdrs: Vec::new(),
            attrs: Vec::new(),
            obj_refs: Vec::new(),
        });
        IntrsctnID(self.intrsctns.len() as u32)
    }

    pub fn add_road(&mut self, spec: RoadSpec) -> Result<RoadID> {
        for i in [spec.src, spec.dst] {
            if self.intrsctn(i).is_none() {
                bail!("Road {} references unknown {}", spec.name, i);
            }
        }
        self.roads.push(PendingRoad {
            spec,
            attrs: Vec::new(),
            obj_refs: Vec::new(),
        });
        Ok(RoadID(self.roads.len() as u32))
    }

    /// Both roads must already exist, and the lanes must flow into and out of `intrsctn`.
    pub fn add_corridor(&mut self, intrsctn: IntrsctnID, spec: CrdrSpec) -> Result<CrdrRef> {
        let src = self.road(spec.src_road)?;
        let dst = self.road(spec.dst_road)?;
        let src_dir = lane_dir(src, spec.src_lane)?;
        let dst_dir = lane_dir(dst, spec.dst_lane)?;
        let exits_into = match src_dir {
            LaneDir::Pos => src.dst,
            LaneDir::Neg => src.src,
        };
        let enters_from = match dst_dir {
            LaneDir::Pos => dst.src,
            LaneDir::Neg => dst.dst,
        };
        if exits_into != intrsctn || enters_from != intrsctn {
            bail!(
                "Corridor from {} lane {} to {} lane {} doesn't pass through {}",
                src.name,
                spec.src_lane,
                dst.name,
                spec.dst_lane,
                intrsctn
            );
        }

        let i = self.intrsctn_mut(intrsctn)?;
        if i.crdrs.len() == MAX_CRDRS_PER_INTRSCTN {
            bail!("{} already has {} corridors", i.name, MAX_CRDRS_PER_INTRSCTN);
        }
        i.crdrs.push(PendingCrdr {
            spec,
            hld_ofs: Vec::new(),
        });
        Ok(CrdrRef {
            intrsctn,
            local: i.crdrs.len() - 1,
        })
    }

    pub fn add_hold_offset(&mut self, crdr: CrdrRef, hld: HldOfsSpec) -> Result<()> {
        let c = self.pending_crdr(crdr)?;
        if hld.distance < 0.0 {
            bail!("Hold offset at negative distance {}", hld.distance);
        }
        c.hld_ofs.push(hld);
        Ok(())
    }

    pub fn add_road_attr(&mut self, road: RoadID, attr: AttrSpec) -> Result<()> {
        self.road_mut(road)?.attrs.push(attr);
        Ok(())
    }

    pub fn add_intrsctn_attr(&mut self, intrsctn: IntrsctnID, attr: AttrSpec) -> Result<()> {
        self.intrsctn_mut(intrsctn)?.attrs.push(attr);
        Ok(())
    }

    pub fn add_static_object(&mut self, spec: ObjSpec) -> ObjID {
        self.objs.push(spec);
        ObjID(self.objs.len() as u32)
    }

    pub fn attach_obj_to_road(&mut self, obj: ObjID, road: RoadID, distance: f64) -> Result<()> {
        self.check_obj(obj)?;
        self.road_mut(road)?.obj_refs.push((obj, distance));
        Ok(())
    }

    pub fn attach_obj_to_crdr(&mut self, obj: ObjID, crdr: CrdrRef, distance: f64) -> Result<()> {
        self.check_obj(obj)?;
        self.pending_crdr(crdr)?;
        self.intrsctn_mut(crdr.intrsctn)?
            .obj_refs
            .push((obj, crdr.local, distance));
        Ok(())
    }

    pub fn set_elev_map(&mut self, intrsctn: IntrsctnID, grid: ElevGrid) -> Result<()> {
        if grid.values.len() != (grid.n_rows * grid.n_cols) as usize
            || grid.n_rows == 0
            || grid.n_cols == 0
        {
            bail!(
                "Elevation grid is {}x{}, but has {} values",
                grid.n_rows,
                grid.n_cols,
                grid.values.len()
            );
        }
        if grid.resolution <= 0.0 {
            bail!("Elevation grid resolution {}", grid.resolution);
        }
        self.intrsctn_mut(intrsctn)?.elev_grid = Some(grid);
        Ok(())
    }

    fn intrsctn(&self, id: IntrsctnID) -> Option<&IntrsctnSpec> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|idx| self.intrsctns.get(idx))
    }

    fn intrsctn_mut(&mut self, id: IntrsctnID) -> Result<&mut IntrsctnSpec> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(move |idx| self.intrsctns.get_mut(idx))
            .with_context(|| format!("unknown {}", id))
    }

    fn road(&self, id: RoadID) -> Result<&RoadSpec> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|idx| self.roads.get(idx))
            .map(|r| &r.spec)
            .with_context(|| format!("unknown {}", id))
    }

    fn road_mut(&mut self, id: RoadID) -> Result<&mut PendingRoad> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(move |idx| self.roads.get_mut(idx))
            .with_context(|| format!("unknown {}", id))
    }

    fn pending_crdr(&mut self, crdr: CrdrRef) -> Result<&mut PendingCrdr> {
        self.intrsctn_mut(crdr.intrsctn)?
            .crdrs
            .get_mut(crdr.local)
            .with_context(|| format!("unknown corridor {:?}", crdr))
    }

    fn check_obj(&self, obj: ObjID) -> Result<()> {
        if obj.0 == 0 || obj.0 as usize > self.objs.len() {
            bail!("unknown {}", obj);
        }
        Ok(())
    }

    /// Derives all geometry, lays out every pool and validates the result.
    pub fn finish(self, timer: &mut Timer) -> Result<Pools> {
        timer.start("build network");
        let mut pools = Pools::empty();
        let mut names = NameInterner::default();

        timer.start("roads");
        for (idx, pending) in self.roads.iter().enumerate() {
            let road_id = RoadID(idx as u32 + 1);
            let spec = &pending.spec;
            let cps = road::compute_cntrl_pnts(spec)?;
            let first_cp = pools.cntrl_pnts.next_id();

            let lat_cp_idx = pools.lat_cntrl_pnts.next_id();
            for (offset, height) in &spec.profile {
                pools.lat_cntrl_pnts.push(LatCntrlPntRec {
                    offset: *offset,
                    height: *height,
                    material: 0,
                });
            }

            let mut lane_idx = LaneID::NULL;
            for (cp_idx, mut cp) in cps.iter().cloned().enumerate() {
                let first_lane = pools.lanes.next_id();
                if cp_idx == 0 {
                    lane_idx = first_lane;
                }
                for lane in road::lanes_at(spec, road_id, cp_idx)? {
                    pools.lanes.push(lane);
                }
                cp.lane_idx = first_lane;
                if !spec.profile.is_empty() {
                    cp.lat_cp_idx = lat_cp_idx;
                    cp.n_lat_cps = spec.profile.len() as u32;
                }
                pools.cntrl_pnts.push(cp);
            }

            let road_piece_idx = pools.road_pieces.next_id();
            let pieces = road::road_pieces(&cps, first_cp);
            let n_road_pieces = pieces.len() as u32;
            for (first, last, bounds) in pieces {
                pools.road_pieces.push(RoadPieceRec {
                    road: road_id,
                    first_cp: first,
                    last_cp: last,
                    bounds,
                });
            }

            let last = &cps[cps.len() - 1];
            pools.roads.push(RoadRec {
                name: names.intern(&mut pools.chars, &spec.name),
                cntrl_pnt_idx: first_cp,
                n_cntrl_pnts: cps.len() as u32,
                n_lanes: spec.lanes.len() as u32,
                lane_idx,
                src_intrsctn: spec.src,
                dst_intrsctn: spec.dst,
                attr_idx: Default::default(),
                n_attrs: 0,
                obj_ref_idx: Default::default(),
                n_obj_refs: 0,
                road_piece_idx,
                n_road_pieces,
                lin_length: last.cummulative_lin_dist,
                cubic_length: last.cummulative_cubic_dist,
            });
        }
        timer.note(format!(
            "{} roads, {} control points, {} lanes",
            pools.roads.len(),
            pools.cntrl_pnts.len(),
            pools.lanes.len()
        ));
        timer.stop("roads");

        timer.start("intersections");
        let mut crdr_base = Vec::new();
        for (idx, ispec) in self.intrsctns.iter().enumerate() {
            let id = IntrsctnID(idx as u32 + 1);
            let ring = Ring::new(ispec.border.clone())
                .with_context(|| format!("{} has an invalid border", ispec.name))?;

            let roads: Vec<RoadID> = pools
                .roads
                .iter()
                .filter(|(_, r)| r.src_intrsctn == id || r.dst_intrsctn == id)
                .map(|(r, _)| r)
                .collect();
            if roads.len() > MAX_ROADS {
                bail!("{} joins {} roads; the limit is {}", ispec.name, roads.len(), MAX_ROADS);
            }

            let border_idx = pools.border_segs.next_id();
            // Skip the closing point
            let border_pts = &ring.points()[0..ring.points().len() - 1];
            for pt in border_pts {
                pools.border_segs.push(BorderSegRec {
                    pt: *pt,
                    line: false,
                });
            }

            let crdr_idx = pools.crdrs.next_id();
            crdr_base.push(crdr_idx);
            let mut bounds = ring.get_bounds();
            let mut all_cps = Vec::new();
            for pending in &ispec.crdrs {
                let (rec, cps) = build_crdr(&pools, id, &pending.spec)
                    .with_context(|| format!("corridor in {}", ispec.name))?;
                bounds.union(crdr::crdr_bounds(&cps));
                let crdr_id = pools.crdrs.push(rec);

                let cp_idx = pools.crdr_cntrl_pnts.next_id();
                for cp in &cps {
                    pools.crdr_cntrl_pnts.push(cp.clone());
                }
                let hld_idx = pools.hld_ofs.next_id();
                let mut hlds = pending.hld_ofs.clone();
                // Stable, so equal distances keep insertion order
                hlds.sort_by(|a, b| a.distance.total_cmp(&b.distance));
                for h in &hlds {
                    pools.hld_ofs.push(HldOfsRec {
                        crdr: crdr_id,
                        reason: h.reason,
                        obj: h.obj,
                        distance: h.distance,
                        orientation: h.orientation,
                        thickness: h.thickness,
                    });
                }
                let rec = pools
                    .crdrs
                    .get_mut(crdr_id)
                    .context("corridor vanished")?;
                rec.cntrl_pnt_idx = cp_idx;
                rec.n_cntrl_pnts = cps.len() as u32;
                rec.hld_ofs_idx = if hlds.is_empty() {
                    Default::default()
                } else {
                    hld_idx
                };
                rec.n_hld_ofs = hlds.len() as u32;
                all_cps.push(cps);
            }

            // Merge records, one per ordered sibling pair
            for (a, cps_a) in all_cps.iter().enumerate() {
                let crdr_a = crdr_idx.offset(a as u32);
                let mrg_idx = pools.crdr_mrgs.next_id();
                let mut n_mrgs = 0;
                for (b, cps_b) in all_cps.iter().enumerate() {
                    if a == b {
                        continue;
                    }
                    let crdr_b = crdr_idx.offset(b as u32);
                    pools
                        .crdr_mrgs
                        .push(crdr::merge_record(crdr_a, cps_a, crdr_b, cps_b));
                    n_mrgs += 1;
                }
                let rec = pools.crdrs.get_mut(crdr_a).context("corridor vanished")?;
                rec.mrg_idx = if n_mrgs == 0 {
                    Default::default()
                } else {
                    mrg_idx
                };
                rec.n_mrgs = n_mrgs;
            }

            let slices: Vec<&[_]> = all_cps.iter().map(|cps| cps.as_slice()).collect();
            let grid = crdr::build_grid(&bounds, &slices);
            let grid_idx = pools.grids.next_id();
            for mask in &grid.masks {
                pools.grids.push(GridRec { crdr_mask: *mask });
            }

            let elev_map = match ispec.elev_grid {
                Some(ref g) => {
                    let values_idx = pools.elev_values.next_id();
                    for z in &g.values {
                        pools.elev_values.push(ElevValueRec { z: *z });
                    }
                    pools.elev_maps.push(ElevMapRec {
                        values_idx,
                        n_rows: g.n_rows,
                        n_cols: g.n_cols,
                        origin: g.origin,
                        resolution: g.resolution,
                    })
                }
                None => Default::default(),
            };

            pools.intrsctns.push(IntrsctnRec {
                name: names.intern(&mut pools.chars, &ispec.name),
                roads,
                crdr_idx: if ispec.crdrs.is_empty() {
                    Default::default()
                } else {
                    crdr_idx
                },
                n_crdrs: ispec.crdrs.len() as u32,
                border_idx,
                n_border_segs: border_pts.len() as u32,
                elev_map,
                grid_idx,
                n_grid_cols: grid.n_cols,
                n_grid_rows: grid.n_rows,
                attr_idx: Default::default(),
                n_attrs: 0,
                obj_ref_idx: Default::default(),
                n_obj_refs: 0,
                elevation: ispec.elevation,
                bounds,
                grid_origin: grid.origin,
                grid_cell_size: grid.cell_size,
            });
        }
        timer.note(format!(
            "{} intersections, {} corridors, {} merge records",
            pools.intrsctns.len(),
            pools.crdrs.len(),
            pools.crdr_mrgs.len()
        ));
        timer.stop("intersections");

        timer.start("attributes and objects");
        for (idx, pending) in self.roads.iter().enumerate() {
            let id = RoadID(idx as u32 + 1);
            let attr_idx = pools.attrs.next_id();
            for a in &pending.attrs {
                pools.attrs.push(attr_rec(&mut pools.chars, &mut names, a));
            }
            let obj_ref_idx = pools.obj_refs.next_id();
            let mut refs = pending.obj_refs.clone();
            refs.sort_by(|a, b| a.1.total_cmp(&b.1));
            for (obj, distance) in refs {
                pools.obj_refs.push(ObjRefRec {
                    obj,
                    crdr: CrdrID::NULL,
                    distance,
                });
            }
            let rec = pools.roads.get_mut(id).context("road vanished")?;
            if !pending.attrs.is_empty() {
                rec.attr_idx = attr_idx;
                rec.n_attrs = pending.attrs.len() as u32;
            }
            if !pending.obj_refs.is_empty() {
                rec.obj_ref_idx = obj_ref_idx;
                rec.n_obj_refs = pending.obj_refs.len() as u32;
            }
        }
        for (idx, ispec) in self.intrsctns.iter().enumerate() {
            let id = IntrsctnID(idx as u32 + 1);
            let attr_idx = pools.attrs.next_id();
            for a in &ispec.attrs {
                pools.attrs.push(attr_rec(&mut pools.chars, &mut names, a));
            }
            let obj_ref_idx = pools.obj_refs.next_id();
            let mut refs = ispec.obj_refs.clone();
            refs.sort_by(|a, b| a.1.cmp(&b.1).then(a.2.total_cmp(&b.2)));
            for (obj, local, distance) in refs {
                pools.obj_refs.push(ObjRefRec {
                    obj,
                    crdr: crdr_base[idx].offset(local as u32),
                    distance,
                });
            }
            let rec = pools.intrsctns.get_mut(id).context("intersection vanished")?;
            if !ispec.attrs.is_empty() {
                rec.attr_idx = attr_idx;
                rec.n_attrs = ispec.attrs.len() as u32;
            }
            if !ispec.obj_refs.is_empty() {
                rec.obj_ref_idx = obj_ref_idx;
                rec.n_obj_refs = ispec.obj_refs.len() as u32;
            }
        }
        for spec in &self.objs {
            let tangent = spec.tangent.normalized_or(Vector3D::new(1.0, 0.0, 0.0));
            pools.objs.push(ObjRec {
                name: names.intern(&mut pools.chars, &spec.name),
                kind: spec.kind,
                sol_id: spec.sol_id,
                flags: spec.flags,
                position: spec.position,
                tangent,
                lateral: tangent.right_xy().normalized_or(Vector3D::new(0.0, -1.0, 0.0)),
                size: spec.size,
            });
        }
        pools.objs.set_reserved(RESERVED_OBJS);
        pools.attrs.set_reserved(RESERVED_ATTRS);
        timer.stop("attributes and objects");

        pools.validate(timer)?;
        timer.stop("build network");
        Ok(pools)
    }
}

fn lane_dir(road: &RoadSpec, lane: u32) -> Result<LaneDir> {
    road.lanes
        .get(lane as usize)
        .map(|l| l.dir)
        .with_context(|| format!("{} has no lane {}", road.name, lane))
}

/// The corridor record, minus its pool indices, and its control points.
fn build_crdr(
    pools: &Pools,
    intrsctn: IntrsctnID,
    spec: &CrdrSpec,
) -> Result<(CrdrRec, Vec<crate::records::CrdrCntrlPntRec>)> {
    let src_lane = pools
        .road_lane(spec.src_road, spec.src_lane)
        .with_context(|| format!("{} has no lane {}", spec.src_road, spec.src_lane))?;
    let dst_lane = pools
        .road_lane(spec.dst_road, spec.dst_lane)
        .with_context(|| format!("{} has no lane {}", spec.dst_road, spec.dst_lane))?;
    let from = end_of_lane(pools, spec.src_road, spec.src_lane, true)?;
    let to = end_of_lane(pools, spec.dst_road, spec.dst_lane, false)?;

    let pts = if spec.points.is_empty() {
        crdr::generate_centerline(&from, &to)?
    } else {
        spec.points.clone()
    };
    let geom = crdr::crdr_geom(&pts, from.width, to.width)?;
    Ok((
        CrdrRec {
            intrsctn,
            src_road: spec.src_road,
            src_lane,
            dst_road: spec.dst_road,
            dst_lane,
            cntrl_pnt_idx: Default::default(),
            n_cntrl_pnts: 0,
            hld_ofs_idx: Default::default(),
            n_hld_ofs: 0,
            mrg_idx: Default::default(),
            n_mrgs: 0,
            direction: geom.direction,
            length: geom.length,
            turn_angle: geom.turn_angle,
        },
        geom.cps,
    ))
}

/// Where traffic in one lane leaves (`exiting`) or joins its road.
fn end_of_lane(
    pools: &Pools,
    road: RoadID,
    lane: u32,
    exiting: bool,
) -> Result<road::LaneEnd> {
    let r = pools.roads.get(road).with_context(|| format!("unknown {}", road))?;
    let cps = pools.cntrl_pnts.slice(r.cntrl_pnt_idx, r.n_cntrl_pnts);
    if cps.is_empty() {
        bail!("{} has no control points", road);
    }
    let dir = pools
        .lanes
        .get(r.lane_idx.offset(lane))
        .with_context(|| format!("{} has no lane {}", road, lane))?
        .direction;
    let at_last = match dir {
        LaneDir::Pos => exiting,
        LaneDir::Neg => !exiting,
    };
    let cp = if at_last { &cps[cps.len() - 1] } else { &cps[0] };
    let lane_rec = pools
        .lanes
        .get(cp.lane_idx.offset(lane))
        .with_context(|| format!("{} has no lane {}", road, lane))?;
    Ok(road::lane_end(cp, lane_rec))
}

fn attr_rec(chars: &mut CharPool, names: &mut NameInterner, a: &AttrSpec) -> AttrRec {
    AttrRec {
        id: a.id,
        name: names.intern(chars, &a.name),
        lane_mask: a.lane_mask,
        active: a.active,
        from: a.from,
        to: a.to,
        value1: a.value1,
        value2: a.value2,
    }
}

#[derive(Default)]
struct NameInterner {
    offsets: HashMap<String, u32>,
}

impl NameInterner {
    fn intern(&mut self, chars: &mut CharPool, name: &str) -> u32 {
        if let Some(offset) = self.offsets.get(name) {
            return *offset;
        }
        let offset = chars.push(name);
        self.offsets.insert(name.to_string(), offset);
        offset
    }
}

/// A square border centered on a point.
pub fn square_border(center: Pt2D, half_size: f64) -> Vec<Pt2D> {
    vec![
        center.offset(-half_size, -half_size),
        center.offset(half_size, -half_size),
        center.offset(half_size, half_size),
        center.offset(-half_size, half_size),
    ]
}
