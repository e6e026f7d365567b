use anyhow::{bail, Context, Result};

use geom::Distance;

use super::{CrdrPos, OnIntrsctn, RoadPos};
use crate::Network;

impl RoadPos {
    /// A compact, editable form that `parse` turns back into an equal position. Roads and
    /// intersections are referred to by name, lanes and corridors by their index within them.
    ///
    /// - `road:<road>:<lane>:<distance>:<offset>`
    /// - `intrsctn:<intersection>:<priority>:<crdr>@<distance>@<offset>,...`
    pub fn get_string(&self, net: &Network) -> String {
        match self {
            RoadPos::Road(r) => format!(
                "road:{}:{}:{}:{}",
                net.road(r.road).name(),
                net.lane(r.lane).index(),
                r.distance,
                r.offset
            ),
            RoadPos::Intrsctn(i) => {
                let crdrs: Vec<String> = i
                    .crdrs
                    .iter()
                    .map(|cp| {
                        format!(
                            "{}@{}@{}",
                            net.crdr(cp.crdr).local_index(),
                            cp.distance,
                            cp.offset
                        )
                    })
                    .collect();
                format!(
                    "intrsctn:{}:{}:{}",
                    net.intrsctn(i.intrsctn).name(),
                    i.priority,
                    crdrs.join(",")
                )
            }
        }
    }

    pub fn parse(net: &Network, raw: &str) -> Result<RoadPos> {
        if let Some(rest) = raw.strip_prefix("road:") {
            // Names may contain colons; the numeric fields can't
            let parts: Vec<&str> = rest.rsplitn(4, ':').collect();
            if parts.len() != 4 {
                bail!("{} should have a road, lane, distance, and offset", raw);
            }
            let (offset, distance, lane, name) = (parts[0], parts[1], parts[2], parts[3]);
            let road = net
                .road_by_name(name)
                .with_context(|| format!("no road named {}", name))?;
            let index: u32 = lane.parse().with_context(|| format!("bad lane in {}", raw))?;
            let lane = road
                .lane(index)
                .with_context(|| format!("{} has no lane {}", name, index))?;
            let pos = RoadPos::on_road(
                net,
                road.id(),
                lane.id(),
                parse_dist(distance)?,
                parse_dist(offset)?,
            )?;
            return Ok(pos);
        }

        if let Some(rest) = raw.strip_prefix("intrsctn:") {
            let parts: Vec<&str> = rest.rsplitn(3, ':').collect();
            if parts.len() != 3 {
                bail!("{} should have an intersection, priority, and corridors", raw);
            }
            let (crdrs, priority, name) = (parts[0], parts[1], parts[2]);
            let intrsctn = net
                .intrsctn_by_name(name)
                .with_context(|| format!("no intersection named {}", name))?;
            let priority: usize = priority
                .parse()
                .with_context(|| format!("bad priority in {}", raw))?;

            let mut list = Vec::new();
            for chunk in crdrs.split(',') {
                let fields: Vec<&str> = chunk.split('@').collect();
                if fields.len() != 3 {
                    bail!("{} should be <corridor>@<distance>@<offset>", chunk);
                }
                let local: usize = fields[0]
                    .parse()
                    .with_context(|| format!("bad corridor in {}", chunk))?;
                let crdr = intrsctn
                    .crdr_by_local(local)
                    .with_context(|| format!("{} has no corridor {}", name, local))?;
                let distance = parse_dist(fields[1])?;
                if distance < Distance::ZERO || distance > crdr.length() {
                    bail!("{} is off the end of {:?}", distance, crdr);
                }
                list.push(CrdrPos {
                    crdr: crdr.id(),
                    distance,
                    offset: parse_dist(fields[2])?,
                });
            }
            if priority >= list.len() {
                bail!("priority {} but only {} corridors", priority, list.len());
            }
            return Ok(RoadPos::Intrsctn(OnIntrsctn {
                intrsctn: intrsctn.id(),
                crdrs: list,
                priority,
            }));
        }

        bail!("{} isn't a road or intersection position", raw)
    }

    /// On error, the position is unchanged.
    pub fn set_string(&mut self, net: &Network, raw: &str) -> Result<()> {
        *self = RoadPos::parse(net, raw)?;
        Ok(())
    }
}

pub(crate) fn parse_dist(raw: &str) -> Result<Distance> {
    let x: f64 = raw
        .parse()
        .with_context(|| format!("bad distance {}", raw))?;
    if !x.is_finite() {
        bail!("bad distance {}", raw);
    }
    Ok(Distance::meters(x))
}
