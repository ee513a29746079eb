//! Interfaces the world map consumes from the rest of the robot stack.
//!
//! Implement these on whatever owns the real subsystems; the world map only
//! reads through them. [`Robot`] bundles all four and is implemented
//! automatically.

use robomap_perception::transform::{Homogeneous, TfEngine, Transform3D};
use robomap_types::{
    CubeObservation, EntityId, FaceObservation, LandmarkEstimate, MarkerId, Pose2D, SensorPose,
};

/// The vision pipeline's current view of the world.
pub trait Perception {
    /// Every light cube the pipeline knows about, seen or not.
    fn light_cubes(&self) -> Vec<CubeObservation>;

    /// Every face the pipeline knows about.
    fn faces(&self) -> Vec<FaceObservation>;

    /// Whether `pose` shares a reference frame with the robot's current pose
    /// closely enough to be combined with it.
    fn is_comparable(&self, pose: &SensorPose) -> bool;
}

/// The particle filter.
pub trait Localization {
    /// Best-estimate robot pose in the world frame.
    fn filtered_pose(&self) -> Pose2D;

    /// Marker landmarks currently held by the sensor model.
    fn landmarks(&self) -> Vec<(MarkerId, LandmarkEstimate)>;
}

/// Proprioceptive robot state.
pub trait Odometry {
    /// Pose in the raw odometry frame, as of the latest observations.
    fn raw_pose(&self) -> Pose2D;

    /// The entity currently held in the gripper, if any.
    fn carrying(&self) -> Option<EntityId>;
}

/// Kinematic chain solver.
pub trait Kinematics {
    /// Pose of frame `to` expressed in frame `from`, as a 4x4 homogeneous
    /// matrix. `None` when the frames are not connected.
    fn frame_transform(&self, from: &str, to: &str) -> Option<Homogeneous>;
}

impl Kinematics for TfEngine {
    fn frame_transform(&self, from: &str, to: &str) -> Option<Homogeneous> {
        self.lookup(from, to).map(Transform3D::to_homogeneous)
    }
}

/// Everything the world map reads from the robot.
pub trait Robot: Perception + Localization + Odometry + Kinematics {}

impl<T: Perception + Localization + Odometry + Kinematics + ?Sized> Robot for T {}
