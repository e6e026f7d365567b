use super::{ObjFrame, StepContext};
use crate::{ControlInput, TrafficLightState};

pub(crate) fn step(cur: &TrafficLightState, frame: &ObjFrame, ctx: &StepContext) -> TrafficLightState {
    let mut next = cur.clone();
    for input in frame.inputs {
        match input {
            ControlInput::Phase(phase) => {
                next.phase = *phase;
                next.elapsed = 0.0;
            }
            other => warn!("{} is a traffic light; ignoring {:?}", frame.id, other),
        }
    }
    next.elapsed += ctx.dt;
    // At most one full cycle per frame, even with zero-length phases
    for _ in 0..3 {
        let duration = next.duration(next.phase);
        if next.elapsed < duration {
            break;
        }
        next.elapsed -= duration;
        next.phase = next.phase.next();
    }
    next
}
