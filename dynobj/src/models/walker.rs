use super::ground::ground_step;
use super::{ObjFrame, StepContext};
use crate::{ControlInput, WalkerState};

pub(crate) fn step(cur: &WalkerState, frame: &ObjFrame, ctx: &StepContext) -> WalkerState {
    let mut next = cur.clone();
    for input in frame.inputs {
        match input {
            ControlInput::Speed(speed) => next.speed = speed.max(0.0),
            ControlInput::Heading(heading) => {
                next.heading = heading.flatten().normalized_or(next.heading);
            }
            other => warn!("{} is a walker; ignoring {:?}", frame.id, other),
        }
    }
    next.pose = ground_step(
        &cur.pose,
        next.heading,
        next.speed * ctx.dt,
        frame.obj.size,
        ctx.terrain,
    );
    next
}
