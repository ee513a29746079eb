//! Coordinate Fusion Engine.
//!
//! The vision pipeline reports object poses in the robot's raw odometry
//! frame, which drifts. The particle filter maintains a separate, corrected
//! estimate of where the robot really is. [`fuse_observation`] re-anchors an
//! observation on the filtered pose:
//!
//! ```text
//! dx, dy      = object − raw robot position
//! alpha       = atan2(dy, dx) − θ_raw          (bearing relative to robot)
//! r           = √(dx² + dy²)                   (range)
//! world_x     = x_f + r · cos(alpha + θ_f)
//! world_y     = y_f + r · sin(alpha + θ_f)
//! world_z     = z                              (trusted as reported)
//! world_theta = wrap(yaw + wrap(θ_f − θ_raw))
//! ```
//!
//! Objects held in the gripper are not observed at all: [`project_carried`]
//! places them from the kinematic chain and the filtered heading.
//!
//! # Example
//!
//! ```rust
//! use robomap_perception::fusion::fuse_observation;
//! use robomap_types::{Pose2D, SensorPose};
//!
//! // Odometry thinks the robot is at the origin; the filter says (100, 0).
//! let raw = Pose2D::new(0.0, 0.0, 0.0);
//! let filtered = Pose2D::new(100.0, 0.0, 0.0);
//! let cube = SensorPose::new(50.0, 0.0, 22.0, 0.0);
//!
//! let fused = fuse_observation(raw, filtered, &cube);
//! assert!((fused.x - 150.0).abs() < 1e-4);
//! assert!((fused.z - 22.0).abs() < 1e-6);
//! ```

use std::f32::consts::{PI, TAU};

use robomap_types::{Pose2D, SensorPose};
use tracing::trace;

use crate::transform::Homogeneous;

/// Offset from the lift attach point to the centre of a held object, along
/// the attach frame's +X axis (mm).
///
/// This is half a light cube's width and is applied to every carried object
/// regardless of its real size; custom objects and chips end up slightly
/// misplaced while held.
pub const CARRIED_HALF_WIDTH_MM: f32 = 22.0;

/// Wrap an angle into (−π, π].
pub fn wrap_angle(theta: f32) -> f32 {
    let mut wrapped = theta % TAU;
    if wrapped > PI {
        wrapped -= TAU;
    } else if wrapped <= -PI {
        wrapped += TAU;
    }
    wrapped
}

/// World-frame pose produced for an observed object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedPose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub theta: f32,
}

/// Re-express an observation made from `raw` in the particle filter's frame,
/// where the robot stands at `filtered`.
pub fn fuse_observation(raw: Pose2D, filtered: Pose2D, sensed: &SensorPose) -> FusedPose {
    let dx = sensed.x - raw.x;
    let dy = sensed.y - raw.y;
    let alpha = dy.atan2(dx) - raw.theta;
    let r = (dx * dx + dy * dy).sqrt();

    let orient_diff = wrap_angle(filtered.theta - raw.theta);
    let fused = FusedPose {
        x: filtered.x + r * (alpha + filtered.theta).cos(),
        y: filtered.y + r * (alpha + filtered.theta).sin(),
        z: sensed.z,
        theta: wrap_angle(sensed.yaw + orient_diff),
    };
    trace!(range = r, bearing = alpha, x = fused.x, y = fused.y, "fused observation");
    fused
}

/// Place an object held in the gripper.
///
/// `world_to_attach` is the homogeneous pose of the lift attach frame in the
/// world frame; the object's centre sits [`CARRIED_HALF_WIDTH_MM`] in front
/// of it. The heading is taken from the filter. Only `x`, `y` and `theta` are
/// meaningful.
pub fn project_carried(world_to_attach: &Homogeneous, filtered_heading: f32) -> Pose2D {
    let point = [CARRIED_HALF_WIDTH_MM, 0.0, 0.0, 1.0];
    let row = |r: &[f32; 4]| r.iter().zip(point).map(|(m, p)| m * p).sum::<f32>();
    Pose2D::new(row(&world_to_attach[0]), row(&world_to_attach[1]), filtered_heading)
}
