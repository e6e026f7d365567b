use geom::{Mat3, Vector3D};

use super::ground::ground_step;
use super::{ObjFrame, StepContext};
use crate::{ControlInput, FollowerMode, Pose, RigidBody, TrajFollowerState};

pub(crate) fn step(
    cur: &TrajFollowerState,
    frame: &ObjFrame,
    ctx: &StepContext,
) -> TrajFollowerState {
    let mut next = cur.clone();
    next.prev_mode = cur.mode;
    next.no_transition = false;

    for input in frame.inputs {
        match input {
            ControlInput::Mode(mode) => next.pending = Some(*mode),
            ControlInput::Speed(speed) => next.speed = *speed,
            ControlInput::Parent(parent) => next.parent = Some(*parent),
            ControlInput::RelTangent(tangent) => next.rel_tangent = tangent.normalized(),
            ControlInput::Launch(init) => {
                next.free_init = Some(*init);
                next.pending = Some(FollowerMode::FreeMotion);
            }
            other => warn!("{} is a trajectory follower; ignoring {:?}", frame.id, other),
        }
    }

    if let Some(mode) = next.pending {
        if mode == next.mode {
            next.pending = None;
        } else if enter(&mut next, mode, frame) {
            debug!("{} switched from {:?} to {:?}", frame.id, next.mode, mode);
            next.mode = mode;
            next.pending = None;
        } else {
            next.no_transition = true;
        }
    }

    match next.mode {
        FollowerMode::FreeMotion => {
            let body = RigidBody {
                pose: next.pose,
                velocity: next.velocity,
                angular: next.angular,
                mass: frame.obj.mass,
                size: frame.obj.size,
                friction: frame.obj.friction,
                bounce: frame.obj.bounce,
            };
            let body = ctx.physics.step(&body, ctx.terrain, ctx.dt);
            next.pose = body.pose;
            next.velocity = body.velocity;
            next.angular = body.angular;
        }
        FollowerMode::CoupledObj | FollowerMode::ObjRelTraj => follow_parent(&mut next, frame, ctx),
        FollowerMode::GroundTraj
        | FollowerMode::DiGuy
        | FollowerMode::DiGuyGuideControl
        | FollowerMode::DiGuyDirControl => {
            next.pose = ground_step(
                &next.pose,
                next.pose.tangent,
                next.speed * ctx.dt,
                frame.obj.size,
                ctx.terrain,
            );
        }
    }
    next
}

/// Sets up `mode` from the follower's current mode. False means the transition has to wait.
fn enter(next: &mut TrajFollowerState, mode: FollowerMode, frame: &ObjFrame) -> bool {
    match mode {
        FollowerMode::FreeMotion => {
            enter_free_motion(next, frame);
            true
        }
        FollowerMode::CoupledObj | FollowerMode::ObjRelTraj => attach(next, mode, frame),
        _ => {
            if next.mode == FollowerMode::FreeMotion {
                next.speed = next.velocity.flatten().dot(next.pose.tangent);
            }
            if !next.mode.keeps_to_ground() {
                next.pose = Pose::level(next.pose.position, next.pose.tangent);
                next.rel_rotation = None;
            }
            true
        }
    }
}

fn enter_free_motion(next: &mut TrajFollowerState, frame: &ObjFrame) {
    if let Some(init) = next.free_init.take() {
        next.pose = init.pose;
        next.velocity = init.velocity;
        next.angular = init.angular;
        return;
    }
    next.angular = Vector3D::default();

    let parent = next.parent.and_then(|id| frame.other(id));
    match (next.mode.is_attached(), parent.and_then(|p| p.pose().map(|pose| (pose, p)))) {
        (true, Some((parent_pose, parent))) => {
            // Attached motion lives in the parent's frame; carry it out into the world
            let rel_rotation = next.rel_rotation.unwrap_or_else(Mat3::identity);
            next.pose = attached_pose(parent_pose, next.rel_offset, &rel_rotation);
            let local = match (next.mode, next.rel_tangent) {
                (FollowerMode::ObjRelTraj, Some(tangent)) => tangent * next.speed,
                _ => Vector3D::default(),
            };
            next.velocity = parent.velocity() + parent_pose.basis().apply(local);
        }
        _ => {
            next.velocity = next.pose.tangent * next.speed;
        }
    }
    next.rel_rotation = None;
}

/// Caches where the follower sits relative to its parent. A relative trajectory also needs its
/// direction, since the follower turns to face along it.
fn attach(next: &mut TrajFollowerState, mode: FollowerMode, frame: &ObjFrame) -> bool {
    let parent_pose = match next.parent.and_then(|id| frame.other(id)).and_then(|p| p.pose()) {
        Some(pose) => *pose,
        None => {
            debug!("{} can't attach without a parent", frame.id);
            return false;
        }
    };
    let to_local = parent_pose.basis().transpose();
    let mut rel_rotation = to_local.mul(&next.pose.basis());

    if mode == FollowerMode::ObjRelTraj {
        let tangent = match next.rel_tangent {
            Some(tangent) => tangent,
            None => {
                debug!("{} waiting for its relative trajectory", frame.id);
                return false;
            }
        };
        let facing = rel_rotation.column(0);
        let turn = facing
            .angle_xy()
            .simple_shortest_rotation_towards(tangent.angle_xy())
            .to_radians();
        rel_rotation = Mat3::yaw(turn).mul(&rel_rotation);
    }

    next.rel_offset = to_local.apply(next.pose.position - parent_pose.position);
    next.rel_rotation = Some(rel_rotation);
    true
}

fn follow_parent(next: &mut TrajFollowerState, frame: &ObjFrame, ctx: &StepContext) {
    let parent_pose = match next.parent.and_then(|id| frame.other(id)).and_then(|p| p.pose()) {
        Some(pose) => *pose,
        None => {
            warn!("{} lost its parent; back on the ground", frame.id);
            next.mode = FollowerMode::GroundTraj;
            next.pose = Pose::level(next.pose.position, next.pose.tangent);
            next.rel_rotation = None;
            return;
        }
    };
    if next.mode == FollowerMode::ObjRelTraj {
        if let Some(tangent) = next.rel_tangent {
            next.rel_offset = next.rel_offset + tangent * (next.speed * ctx.dt);
        }
    }
    let rel_rotation = next.rel_rotation.unwrap_or_else(Mat3::identity);
    next.pose = attached_pose(&parent_pose, next.rel_offset, &rel_rotation);
}

fn attached_pose(parent: &Pose, rel_offset: Vector3D, rel_rotation: &Mat3) -> Pose {
    let basis = parent.basis();
    Pose::from_basis(
        parent.position.offset(basis.apply(rel_offset)),
        &basis.mul(rel_rotation),
    )
}
