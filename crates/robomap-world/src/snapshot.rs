//! Recorded robot state and scenario replay.
//!
//! [`SnapshotRobot`] is a frozen copy of everything the world map reads from
//! the robot in one cycle. It implements every collaborator trait, so a
//! recorded [`Scenario`] can be replayed through a [`WorldMap`] offline.
//!
//! Kinematics are reduced to two links: `world → base_link` from the
//! filtered pose and `base_link → lift_attach` from [`SnapshotRobot::lift_attach`].

use serde::{Deserialize, Serialize};
use tracing::info;

use robomap_perception::transform::{Homogeneous, TfEngine, Transform3D, Vec3};
use robomap_types::{
    CubeObservation, EntityId, FaceObservation, LandmarkEstimate, MarkerId, Observation, Pose2D,
    SensorPose,
};

use crate::collaborators::{Kinematics, Localization, Odometry, Perception};
use crate::world_map::{DEFAULT_LIFT_ATTACH_FRAME, DEFAULT_WORLD_FRAME, WorldMap};

pub const BASE_FRAME: &str = "base_link";

fn default_lift_attach() -> [f32; 3] {
    [30.0, 0.0, 40.0]
}

/// Robot state captured at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRobot {
    pub raw_pose: Pose2D,
    pub filtered_pose: Pose2D,
    /// Odometry origin of `raw_pose`; sensor poses with another origin are
    /// not comparable.
    #[serde(default)]
    pub origin_id: u32,
    #[serde(default)]
    pub carrying: Option<EntityId>,
    #[serde(default)]
    pub cubes: Vec<CubeObservation>,
    #[serde(default)]
    pub faces: Vec<FaceObservation>,
    #[serde(default)]
    pub landmarks: Vec<(MarkerId, LandmarkEstimate)>,
    /// Lift attach point in the base frame (mm).
    #[serde(default = "default_lift_attach")]
    pub lift_attach: [f32; 3],
}

impl Default for SnapshotRobot {
    fn default() -> Self {
        Self {
            raw_pose: Pose2D::default(),
            filtered_pose: Pose2D::default(),
            origin_id: 0,
            carrying: None,
            cubes: Vec::new(),
            faces: Vec::new(),
            landmarks: Vec::new(),
            lift_attach: default_lift_attach(),
        }
    }
}

impl SnapshotRobot {
    /// Kinematic tree for this instant.
    pub fn frames(&self) -> TfEngine {
        let [x, y, z] = self.lift_attach;
        let mut tf = TfEngine::new();
        tf.set_transform(
            DEFAULT_WORLD_FRAME,
            BASE_FRAME,
            Transform3D::from_planar_pose(self.filtered_pose),
        );
        tf.set_transform(
            BASE_FRAME,
            DEFAULT_LIFT_ATTACH_FRAME,
            Transform3D::from_translation(Vec3::new(x, y, z)),
        );
        tf
    }
}

impl Perception for SnapshotRobot {
    fn light_cubes(&self) -> Vec<CubeObservation> {
        self.cubes.clone()
    }

    fn faces(&self) -> Vec<FaceObservation> {
        self.faces.clone()
    }

    fn is_comparable(&self, pose: &SensorPose) -> bool {
        pose.origin_id == self.origin_id
    }
}

impl Localization for SnapshotRobot {
    fn filtered_pose(&self) -> Pose2D {
        self.filtered_pose
    }

    fn landmarks(&self) -> Vec<(MarkerId, LandmarkEstimate)> {
        self.landmarks.clone()
    }
}

impl Odometry for SnapshotRobot {
    fn raw_pose(&self) -> Pose2D {
        self.raw_pose
    }

    fn carrying(&self) -> Option<EntityId> {
        self.carrying
    }
}

impl Kinematics for SnapshotRobot {
    fn frame_transform(&self, from: &str, to: &str) -> Option<Homogeneous> {
        self.frames().frame_transform(from, to)
    }
}

/// One planning cycle of a recording: the robot state, the observation
/// events delivered during the cycle, then an `update_map`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioFrame {
    pub robot: SnapshotRobot,
    #[serde(default)]
    pub events: Vec<Observation>,
}

/// A recorded sequence of cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub frames: Vec<ScenarioFrame>,
}

impl Scenario {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Replay every frame through `map`.
    pub fn replay(&self, map: &mut WorldMap) {
        for (index, frame) in self.frames.iter().enumerate() {
            for observation in &frame.events {
                map.observe(&frame.robot, observation);
            }
            map.update_map(&frame.robot);
            info!(frame = index, entities = map.len(), "replayed frame");
        }
    }
}
