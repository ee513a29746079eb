//! `robomap-types` – shared value types for the robomap workspace.
//!
//! Everything that crosses a crate boundary lives here: robot poses, the raw
//! sensor pose attached to an observation, the opaque identity tokens used to
//! key the world map, the closed set of observation kinds emitted by the
//! perception pipeline, and the workspace-wide error type.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a fiducial vision marker.
pub type MarkerId = u32;

/// Identifier of a registered wall template (the minimum of its marker ids).
pub type WallId = MarkerId;

/// A planar robot pose: position in millimetres, heading in radians
/// (counter-clockwise from +X).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f32,
    pub y: f32,
    pub theta: f32,
}

impl Pose2D {
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self { x, y, theta }
    }
}

/// Pose of an observed object as reported by the vision pipeline.
///
/// Expressed in the robot's raw (odometry) frame, i.e. the same frame as the
/// raw robot pose, not the particle filter's world frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorPose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Rotation about the vertical axis (radians).
    pub yaw: f32,
    /// Odometry origin the pose was recorded against. Poses recorded against
    /// different origins (e.g. after the robot was picked up) cannot be
    /// combined.
    #[serde(default)]
    pub origin_id: u32,
}

impl SensorPose {
    pub fn new(x: f32, y: f32, z: f32, yaw: f32) -> Self {
        Self {
            x,
            y,
            z,
            yaw,
            origin_id: 0,
        }
    }

    pub fn with_origin(mut self, origin_id: u32) -> Self {
        self.origin_id = origin_id;
        self
    }
}

/// Object dimensions in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Size3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn cube(edge: f32) -> Self {
        Self::new(edge, edge, edge)
    }
}

/// Opaque identity of a world-map entry, compared by value.
///
/// Handles are minted by the perception pipeline (cubes, custom objects,
/// faces), by the wall registry (walls) or by the caller (chips).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "handle")]
pub enum EntityId {
    Wall(WallId),
    Cube(u32),
    CustomObject(u32),
    Chip(u32),
    Face(u32),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Wall(id) => write!(f, "wall-{id}"),
            EntityId::Cube(id) => write!(f, "cube-{id}"),
            EntityId::CustomObject(id) => write!(f, "custom-{id}"),
            EntityId::Chip(id) => write!(f, "chip-{id}"),
            EntityId::Face(id) => write!(f, "face-{id}"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Observations
// ────────────────────────────────────────────────────────────────────────────

/// A light cube as currently known to the perception pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeObservation {
    pub handle: u32,
    /// `None` until the cube has been seen at least once.
    #[serde(default)]
    pub pose: Option<SensorPose>,
    #[serde(default)]
    pub is_visible: bool,
}

/// A custom fiducial object sighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomObjectObservation {
    pub handle: u32,
    /// Name of the declared custom object type, e.g. `"CustomType02"`.
    pub object_type: String,
    /// Dimensions declared for the custom object type, if any.
    #[serde(default)]
    pub declared_size: Option<Size3>,
    pub pose: SensorPose,
    #[serde(default)]
    pub is_visible: bool,
}

/// A face detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    /// Detector-assigned handle; may change after a tracking gap.
    pub handle: u32,
    /// Enrolled name; stable across re-detections.
    pub name: String,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub pose: Option<SensorPose>,
    #[serde(default)]
    pub is_visible: bool,
}

/// Closed set of observation kinds delivered by the perception pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "observation")]
pub enum Observation {
    Cube(CubeObservation),
    CustomObject(CustomObjectObservation),
    Face(FaceObservation),
}

/// Envelope for an observation delivered through the event dispatch callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "vision::object_observed"
    pub source: String,
    pub observation: Observation,
}

impl ObservationEvent {
    pub fn new(source: impl Into<String>, observation: Observation) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            observation,
        }
    }
}

/// Localization estimate of a marker landmark, as maintained by the particle
/// filter's sensor model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkEstimate {
    /// Mean marker position `(x, y)` in the world frame (mm).
    pub mean: [f32; 2],
    /// Marker orientation in the world frame (radians).
    pub orientation: f32,
    /// Position covariance.
    #[serde(default)]
    pub covariance: [[f32; 2]; 2],
}

impl LandmarkEstimate {
    pub fn new(x: f32, y: f32, orientation: f32) -> Self {
        Self {
            mean: [x, y],
            orientation,
            covariance: [[0.0; 2]; 2],
        }
    }
}

/// Wall registration failures. Runtime tracking never fails; it skips.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldMapError {
    #[error("Wall specification has no markers")]
    EmptyWallSpec,

    #[error("Marker {marker} is already registered to wall {wall}")]
    DuplicateMarker { marker: MarkerId, wall: WallId },
}
