//! `robomap-world` – the robot's world map.
//!
//! Keeps cubes, walls, custom objects, chips and faces in the particle
//! filter's world frame, re-anchoring every raw-frame sensor sighting on the
//! filter's pose estimate.
//!
//! # Modules
//!
//! - [`walls`] – [`WallRegistry`][walls::WallRegistry]: wall templates indexed
//!   by marker id, plus [`infer_walls`][walls::infer_walls] which places walls
//!   from marker landmarks.
//! - [`entity`] – [`WorldEntity`][entity::WorldEntity]: the tracked entity
//!   model.
//! - [`world_map`] – [`WorldMap`][world_map::WorldMap]: identity tracking,
//!   face re-identification and the per-cycle
//!   [`update_map`][world_map::WorldMap::update_map].
//! - [`collaborators`] – traits for the perception, localization, odometry
//!   and kinematics subsystems the map reads from.
//! - [`config`] – TOML configuration listing walls and kinematic frames.
//! - [`snapshot`] – [`SnapshotRobot`][snapshot::SnapshotRobot] and recorded
//!   [`Scenario`][snapshot::Scenario] replay.
//!
//! # Example
//!
//! ```rust
//! use robomap_types::{CubeObservation, EntityId, Observation, Pose2D, SensorPose};
//! use robomap_world::snapshot::SnapshotRobot;
//! use robomap_world::walls::WallRegistry;
//! use robomap_world::WorldMap;
//!
//! let robot = SnapshotRobot {
//!     raw_pose: Pose2D::new(0.0, 0.0, 0.0),
//!     filtered_pose: Pose2D::new(100.0, 0.0, 0.0),
//!     ..SnapshotRobot::default()
//! };
//! let mut map = WorldMap::new(WallRegistry::new());
//! map.observe(&robot, &Observation::Cube(CubeObservation {
//!     handle: 1,
//!     pose: Some(SensorPose::new(50.0, 0.0, 22.0, 0.0)),
//!     is_visible: true,
//! }));
//!
//! let cube = map.get(&EntityId::Cube(1)).unwrap();
//! assert!((cube.x - 150.0).abs() < 1e-3);
//! ```

pub mod collaborators;
pub mod config;
pub mod entity;
pub mod snapshot;
pub mod walls;
pub mod world_map;

pub use collaborators::{Kinematics, Localization, Odometry, Perception, Robot};
pub use entity::{EntityKind, WorldEntity};
pub use walls::{WallMarker, WallRegistry, WallSpec};
pub use world_map::WorldMap;
