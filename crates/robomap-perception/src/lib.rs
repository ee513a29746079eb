//! `robomap-perception` – geometry for the world map.
//!
//! # Modules
//!
//! - [`transform`] – [`TfEngine`][transform::TfEngine]: graph of named
//!   kinematic frames; answers "where is the lift attach point in the world
//!   frame" for objects held by the robot.
//! - [`fusion`] – [`fuse_observation`][fusion::fuse_observation]: re-anchors a
//!   raw-frame sensor observation on the particle filter's pose estimate, and
//!   [`project_carried`][fusion::project_carried] for held objects.

pub mod fusion;
pub mod transform;

pub use fusion::{fuse_observation, project_carried, wrap_angle, FusedPose};
pub use transform::{Homogeneous, Quaternion, TfEngine, Transform3D, Vec3};
