use geom::{Distance, EPSILON_DIST};
use roadnet::TravelResult;

use super::{ObjFrame, StepContext};
use crate::{ControlInput, Pose, VehicleState};

/// Path kept ahead of a vehicle beyond what it needs to stop.
const LOOKAHEAD: f64 = 50.0;

pub(crate) fn step(cur: &VehicleState, frame: &ObjFrame, ctx: &StepContext) -> VehicleState {
    let mut next = cur.clone();
    for input in frame.inputs {
        match input {
            ControlInput::Speed(speed) => next.target_speed = speed.max(0.0),
            other => warn!("{} is a vehicle; ignoring {:?}", frame.id, other),
        }
    }
    let net = ctx.net;
    let dt = ctx.dt;

    if !next.path.contains(&next.pos) {
        debug!("{} wandered off its path; starting a new one", frame.id);
        next.path.initialize(net, &next.pos);
    }
    let stopping = next.speed * next.speed / (2.0 * next.max_decel);
    let wanted = Distance::meters(stopping + next.speed * dt + LOOKAHEAD);
    let mut remaining = next.path.remaining(&next.pos).unwrap_or(Distance::ZERO);
    if remaining < wanted {
        // Falls short at a dead end; the vehicle just brakes for it
        next.path.append(net, wanted - remaining, false);
        remaining = next.path.remaining(&next.pos).unwrap_or(remaining);
    }

    // Never faster than what still lets it stop by the end of the path
    let safe = (2.0 * next.max_decel * remaining.inner_meters()).sqrt();
    let target = next.target_speed.min(safe);
    next.speed = if next.speed < target {
        (next.speed + next.max_accel * dt).min(target)
    } else {
        (next.speed - next.max_decel * dt).max(target)
    };

    // Landing exactly on the end of a dead end counts as running off it
    let room = (remaining - EPSILON_DIST).inner_meters().max(0.0);
    let dist = (next.speed * dt).min(room);
    if room <= 0.0 {
        next.speed = 0.0;
        next.stalled = next.target_speed > 0.0;
    } else if dist > 0.0 {
        match next.path.travel(net, &mut next.pos, Distance::meters(dist)) {
            TravelResult::Error => {
                warn!("{} couldn't travel {} along its path", frame.id, dist);
                next.speed = 0.0;
                next.stalled = true;
            }
            _ => next.stalled = false,
        }
    } else {
        next.stalled = next.target_speed > 0.0;
    }
    next.path.discard_behind(&next.pos);

    next.pose = Pose {
        position: next.pos.get_best_xyz(net),
        tangent: next.pos.get_tangent(net),
        lateral: next.pos.get_right_vec(net),
    };
    next
}
