//! Load-time checks. Everything downstream assumes a network that passed these: every reference
//! is null or in range, children point back at their parents, and distances are ordered.

use anyhow::{bail, Result};

use netutil::Timer;

use crate::records::{CrdrRec, IntrsctnRec, RoadRec, MAX_CRDRS_PER_INTRSCTN};
use crate::{CrdrID, IntrsctnID, Pool, PoolId, Pools, Record, RoadID, MIN_SEGMENT_LENGTH};

macro_rules! ensure_valid {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            bail!($($arg)+);
        }
    };
}

fn check_ref<T: Record>(pool: &Pool<T>, id: T::Id, owner: &dyn std::fmt::Display) -> Result<()> {
    ensure_valid!(
        id.is_null() || pool.contains(id),
        "{} references {}, which doesn't exist",
        owner,
        id
    );
    Ok(())
}

fn check_range<T: Record>(
    pool: &Pool<T>,
    first: T::Id,
    count: u32,
    owner: &dyn std::fmt::Display,
) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    ensure_valid!(
        !first.is_null() && first.idx() + count as usize <= pool.len() + 1,
        "{} lists {} records from {}, past the end of the pool",
        owner,
        count,
        first
    );
    Ok(())
}

impl Pools {
    pub fn validate(&self, timer: &mut Timer) -> Result<()> {
        timer.start("validate network");
        let result = self.validate_all();
        timer.stop("validate network");
        result
    }

    fn validate_all(&self) -> Result<()> {
        for (id, road) in self.roads.iter() {
            self.validate_road(id, road)?;
        }
        for (id, i) in self.intrsctns.iter() {
            self.validate_intrsctn(id, i)?;
        }
        for (id, c) in self.crdrs.iter() {
            self.validate_crdr(id, c)?;
        }
        for (id, r) in self.obj_refs.iter() {
            ensure_valid!(self.objs.contains(r.obj), "{} points at missing {}", id, r.obj);
            check_ref(&self.crdrs, r.crdr, &id)?;
        }
        for (id, m) in self.elev_maps.iter() {
            check_range(&self.elev_values, m.values_idx, m.n_rows * m.n_cols, &id)?;
        }
        Ok(())
    }

    fn validate_road(&self, id: RoadID, road: &RoadRec) -> Result<()> {
        ensure_valid!(
            self.intrsctns.contains(road.src_intrsctn) && self.intrsctns.contains(road.dst_intrsctn),
            "{} isn't bound to an intersection at both ends",
            id
        );
        ensure_valid!(road.n_cntrl_pnts >= 2, "{} has {} control points", id, road.n_cntrl_pnts);
        check_range(&self.cntrl_pnts, road.cntrl_pnt_idx, road.n_cntrl_pnts, &id)?;
        check_range(&self.attrs, road.attr_idx, road.n_attrs, &id)?;
        check_range(&self.obj_refs, road.obj_ref_idx, road.n_obj_refs, &id)?;
        check_range(&self.road_pieces, road.road_piece_idx, road.n_road_pieces, &id)?;
        for piece in self.road_pieces.slice(road.road_piece_idx, road.n_road_pieces) {
            ensure_valid!(piece.road == id, "{} lists a piece of {}", id, piece.road);
        }

        let cps = self.cntrl_pnts.slice(road.cntrl_pnt_idx, road.n_cntrl_pnts);
        ensure_valid!(
            cps[0].cummulative_lin_dist == 0.0 && cps[0].cummulative_cubic_dist == 0.0,
            "{} doesn't start at distance 0",
            id
        );
        ensure_valid!(
            cps[0].lane_idx == road.lane_idx,
            "{} lists different lanes than its first control point",
            id
        );
        for (idx, cp) in cps.iter().enumerate() {
            let last = idx == cps.len() - 1;
            if !last {
                ensure_valid!(
                    cp.dist_to_next_lin >= MIN_SEGMENT_LENGTH
                        && cp.dist_to_next_cubic >= MIN_SEGMENT_LENGTH,
                    "{} has a degenerate segment after control point {}",
                    id,
                    idx
                );
                let next = &cps[idx + 1];
                ensure_valid!(
                    next.cummulative_cubic_dist > cp.cummulative_cubic_dist
                        && next.cummulative_lin_dist > cp.cummulative_lin_dist,
                    "{} control points aren't ordered by distance at {}",
                    id,
                    idx
                );
            }
            ensure_valid!(
                cp.n_lanes == road.n_lanes,
                "{} control point {} has {} lanes, not {}",
                id,
                idx,
                cp.n_lanes,
                road.n_lanes
            );
            check_range(&self.lanes, cp.lane_idx, cp.n_lanes, &id)?;
            check_range(&self.lat_cntrl_pnts, cp.lat_cp_idx, cp.n_lat_cps, &id)?;
            for (k, lane) in self.lanes.slice(cp.lane_idx, cp.n_lanes).iter().enumerate() {
                ensure_valid!(
                    lane.road == id && lane.index == k as u32,
                    "{} control point {} lists a lane of {} as lane {}",
                    id,
                    idx,
                    lane.road,
                    k
                );
            }
        }
        Ok(())
    }

    fn validate_intrsctn(&self, id: IntrsctnID, i: &IntrsctnRec) -> Result<()> {
        for r in &i.roads {
            ensure_valid!(self.roads.contains(*r), "{} lists missing {}", id, r);
        }
        ensure_valid!(i.n_border_segs >= 3, "{} has no border", id);
        // Grid cells hold one bit per corridor
        ensure_valid!(
            i.n_crdrs as usize <= MAX_CRDRS_PER_INTRSCTN,
            "{} has {} corridors, more than {}",
            id,
            i.n_crdrs,
            MAX_CRDRS_PER_INTRSCTN
        );
        check_range(&self.border_segs, i.border_idx, i.n_border_segs, &id)?;
        check_range(&self.crdrs, i.crdr_idx, i.n_crdrs, &id)?;
        check_range(&self.grids, i.grid_idx, i.n_grid_cols * i.n_grid_rows, &id)?;
        check_range(&self.attrs, i.attr_idx, i.n_attrs, &id)?;
        check_range(&self.obj_refs, i.obj_ref_idx, i.n_obj_refs, &id)?;
        check_ref(&self.elev_maps, i.elev_map, &id)?;
        for (k, c) in self.crdrs.slice(i.crdr_idx, i.n_crdrs).iter().enumerate() {
            ensure_valid!(
                c.intrsctn == id,
                "{} lists {}, which belongs to {}",
                id,
                i.crdr_idx.offset(k as u32),
                c.intrsctn
            );
        }
        Ok(())
    }

    fn validate_crdr(&self, id: CrdrID, c: &CrdrRec) -> Result<()> {
        let i = match self.intrsctns.get(c.intrsctn) {
            Some(i) => i,
            None => bail!("{} doesn't belong to an intersection", id),
        };
        ensure_valid!(
            id >= i.crdr_idx && id.0 < i.crdr_idx.0 + i.n_crdrs,
            "{} isn't listed by its {}",
            id,
            c.intrsctn
        );
        for (road, lane) in [(c.src_road, c.src_lane), (c.dst_road, c.dst_lane)] {
            let r = match self.roads.get(road) {
                Some(r) => r,
                None => bail!("{} connects missing {}", id, road),
            };
            ensure_valid!(
                lane >= r.lane_idx && lane.0 < r.lane_idx.0 + r.n_lanes,
                "{} uses {}, which isn't a lane of {}",
                id,
                lane,
                road
            );
        }

        ensure_valid!(c.n_cntrl_pnts >= 2, "{} has {} control points", id, c.n_cntrl_pnts);
        check_range(&self.crdr_cntrl_pnts, c.cntrl_pnt_idx, c.n_cntrl_pnts, &id)?;
        let cps = self.crdr_cntrl_pnts.slice(c.cntrl_pnt_idx, c.n_cntrl_pnts);
        for pair in cps.windows(2) {
            ensure_valid!(
                pair[1].distance > pair[0].distance,
                "{} control points aren't ordered by distance",
                id
            );
        }

        check_range(&self.hld_ofs, c.hld_ofs_idx, c.n_hld_ofs, &id)?;
        let hlds = self.hld_ofs.slice(c.hld_ofs_idx, c.n_hld_ofs);
        for (k, h) in hlds.iter().enumerate() {
            ensure_valid!(h.crdr == id, "{} lists a hold offset of {}", id, h.crdr);
            check_ref(&self.objs, h.obj, &id)?;
            ensure_valid!(
                h.distance >= 0.0 && h.distance <= c.length,
                "{} has a hold offset at {}, outside its length {}",
                id,
                h.distance,
                c.length
            );
            if k > 0 {
                ensure_valid!(
                    hlds[k - 1].distance <= h.distance,
                    "{} hold offsets aren't sorted",
                    id
                );
            }
        }

        check_range(&self.crdr_mrgs, c.mrg_idx, c.n_mrgs, &id)?;
        for m in self.crdr_mrgs.slice(c.mrg_idx, c.n_mrgs) {
            ensure_valid!(m.crdr == id, "{} lists a merge record of {}", id, m.crdr);
            let other = self.crdrs.get(m.other).map(|o| o.intrsctn);
            ensure_valid!(
                other == Some(c.intrsctn),
                "{} merges with {}, outside its intersection",
                id,
                m.other
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::synthetic;
    use netutil::Timer;

    #[test]
    fn catches_dangling_lane() {
        let mut pools = synthetic::four_way().unwrap();
        assert!(pools.validate(&mut Timer::throwaway()).is_ok());
        let first = pools.crdrs.ids().next().unwrap();
        pools.crdrs.get_mut(first).unwrap().src_lane = crate::LaneID(9999);
        assert!(pools.validate(&mut Timer::throwaway()).is_err());
    }

    #[test]
    fn catches_too_many_corridors() {
        let mut pools = synthetic::four_way().unwrap();
        let center = pools
            .intrsctns
            .iter()
            .find(|(_, i)| i.n_crdrs > 1)
            .map(|(id, _)| id)
            .unwrap();
        pools.intrsctns.get_mut(center).unwrap().n_crdrs = 65;
        let err = pools.validate(&mut Timer::throwaway()).unwrap_err();
        assert!(err.to_string().contains("more than 64"));
    }

    #[test]
    fn catches_unsorted_hold_offsets() {
        let mut pools = synthetic::four_way().unwrap();
        let hld_ofs_idx = pools
            .crdrs
            .iter()
            .find(|(_, c)| c.n_hld_ofs > 1)
            .map(|(_, c)| c.hld_ofs_idx)
            .unwrap();
        // Move the first hold offset just past the second
        let second = pools.hld_ofs.get(hld_ofs_idx.offset(1)).unwrap().distance;
        pools.hld_ofs.get_mut(hld_ofs_idx).unwrap().distance = second + 0.1;
        assert!(pools.validate(&mut Timer::throwaway()).is_err());
    }
}
