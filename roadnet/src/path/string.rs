use anyhow::{bail, Context, Result};

use geom::Distance;

use super::{CrdrRange, LaneRange, Path, PathPoint};
use crate::roadpos::parse_dist;
use crate::Network;

impl Path {
    /// Points joined by `|`, each one of
    ///
    /// - `r:<road>:<lane>@<start>@<end>,...`
    /// - `i:<intersection>:<crdr>@<start>@<end>,...`
    ///
    /// with lanes and corridors given by their index within the road or intersection.
    pub fn get_string(&self, net: &Network) -> String {
        let points: Vec<String> = self
            .points
            .iter()
            .map(|point| match point {
                PathPoint::Road { road, lanes } => {
                    let ranges: Vec<String> = lanes
                        .iter()
                        .map(|l| format!("{}@{}@{}", net.lane(l.lane).index(), l.start, l.end))
                        .collect();
                    format!("r:{}:{}", net.road(*road).name(), ranges.join(","))
                }
                PathPoint::Intrsctn { intrsctn, crdrs } => {
                    let ranges: Vec<String> = crdrs
                        .iter()
                        .map(|c| format!("{}@{}@{}", net.crdr(c.crdr).local_index(), c.start, c.end))
                        .collect();
                    format!("i:{}:{}", net.intrsctn(*intrsctn).name(), ranges.join(","))
                }
            })
            .collect();
        points.join("|")
    }

    pub fn parse(net: &Network, raw: &str) -> Result<Path> {
        let mut path = Path::new();
        if raw.is_empty() {
            return Ok(path);
        }
        for chunk in raw.split('|') {
            path.points.push_back(parse_point(net, chunk)?);
        }
        Ok(path)
    }

    /// On error, the path is unchanged.
    pub fn set_string(&mut self, net: &Network, raw: &str) -> Result<()> {
        *self = Path::parse(net, raw)?;
        Ok(())
    }
}

fn parse_point(net: &Network, raw: &str) -> Result<PathPoint> {
    let (kind, rest) = raw
        .split_once(':')
        .with_context(|| format!("{} isn't a path point", raw))?;
    // Names may contain colons; the ranges can't
    let (name, ranges) = rest
        .rsplit_once(':')
        .with_context(|| format!("{} has no ranges", raw))?;
    let ranges = ranges
        .split(',')
        .map(parse_range)
        .collect::<Result<Vec<(usize, Distance, Distance)>>>()?;

    match kind {
        "r" => {
            let road = net
                .road_by_name(name)
                .with_context(|| format!("no road named {}", name))?;
            let mut lanes = Vec::new();
            for (index, start, end) in ranges {
                let lane = road
                    .lane(index as u32)
                    .with_context(|| format!("{} has no lane {}", name, index))?;
                lanes.push(LaneRange {
                    lane: lane.id(),
                    start,
                    end,
                });
            }
            Ok(PathPoint::Road {
                road: road.id(),
                lanes,
            })
        }
        "i" => {
            let intrsctn = net
                .intrsctn_by_name(name)
                .with_context(|| format!("no intersection named {}", name))?;
            let mut crdrs = Vec::new();
            for (local, start, end) in ranges {
                let crdr = intrsctn
                    .crdr_by_local(local)
                    .with_context(|| format!("{} has no corridor {}", name, local))?;
                crdrs.push(CrdrRange {
                    crdr: crdr.id(),
                    start,
                    end,
                });
            }
            Ok(PathPoint::Intrsctn {
                intrsctn: intrsctn.id(),
                crdrs,
            })
        }
        _ => bail!("{} should start with r: or i:", raw),
    }
}

fn parse_range(raw: &str) -> Result<(usize, Distance, Distance)> {
    let fields: Vec<&str> = raw.split('@').collect();
    if fields.len() != 3 {
        bail!("{} should be <index>@<start>@<end>", raw);
    }
    let idx = fields[0]
        .parse()
        .with_context(|| format!("bad index in {}", raw))?;
    Ok((idx, parse_dist(fields[1])?, parse_dist(fields[2])?))
}
