//! World entity model.
//!
//! Every entry in the world map is a [`WorldEntity`]: the attributes shared by
//! all trackable things plus an [`EntityKind`] carrying what is specific to
//! walls, cubes, chips and faces.

use std::fmt;

use serde::{Deserialize, Serialize};

use robomap_types::{EntityId, MarkerId, Size3};

/// Edge length of a light cube (mm).
pub const LIGHT_CUBE_SIZE: Size3 = Size3::cube(44.0);

/// Size assumed for a custom object whose type declares no dimensions.
pub const DEFAULT_CUSTOM_CUBE_SIZE: Size3 = Size3::cube(50.0);

pub const DEFAULT_CHIP_RADIUS: f32 = 25.0 / 2.0;
pub const DEFAULT_CHIP_THICKNESS: f32 = 4.0;

/// Variant-specific attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EntityKind {
    Wall {
        theta: f32,
        length: f32,
        height: f32,
        door_width: f32,
        door_height: f32,
    },
    LightCube {
        theta: f32,
        size: Size3,
    },
    CustomCube {
        theta: f32,
        size: Size3,
        object_type: String,
    },
    /// Flat circular token.
    Chip {
        radius: f32,
        thickness: f32,
    },
    Face {
        name: String,
        /// Last expression seen while the face was visible.
        expression: Option<String>,
    },
}

/// A tracked thing in the particle filter's world frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEntity {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Participates in planning geometry.
    pub obstacle: bool,
    /// Seen in the most recent update.
    pub is_visible: bool,
    /// Refresh the pose from the next sensor report. Cleared while the
    /// object cannot be independently observed (e.g. it was just dropped).
    pub update_from_sdk: bool,
    pub kind: EntityKind,
}

impl WorldEntity {
    fn base(id: EntityId, x: f32, y: f32, z: f32, kind: EntityKind) -> Self {
        Self {
            id,
            x,
            y,
            z,
            obstacle: true,
            is_visible: false,
            update_from_sdk: false,
            kind,
        }
    }

    /// A wall centred at `(x, y)`; its z is half its height.
    #[allow(clippy::too_many_arguments)]
    pub fn wall(
        wall_id: MarkerId,
        x: f32,
        y: f32,
        theta: f32,
        length: f32,
        height: f32,
        door_width: f32,
        door_height: f32,
    ) -> Self {
        Self::base(
            EntityId::Wall(wall_id),
            x,
            y,
            height / 2.0,
            EntityKind::Wall {
                theta,
                length,
                height,
                door_width,
                door_height,
            },
        )
    }

    pub fn light_cube(handle: u32, is_visible: bool) -> Self {
        let mut cube = Self::base(
            EntityId::Cube(handle),
            0.0,
            0.0,
            0.0,
            EntityKind::LightCube {
                theta: 0.0,
                size: LIGHT_CUBE_SIZE,
            },
        );
        cube.update_from_sdk = true;
        cube.is_visible = is_visible;
        cube
    }

    /// Size comes from the type's declared dimensions, else `size_override`,
    /// else [`DEFAULT_CUSTOM_CUBE_SIZE`].
    pub fn custom_cube(
        handle: u32,
        object_type: impl Into<String>,
        declared: Option<Size3>,
        size_override: Option<Size3>,
        is_visible: bool,
    ) -> Self {
        let size = declared
            .or(size_override)
            .unwrap_or(DEFAULT_CUSTOM_CUBE_SIZE);
        let mut cube = Self::base(
            EntityId::CustomObject(handle),
            0.0,
            0.0,
            0.0,
            EntityKind::CustomCube {
                theta: 0.0,
                size,
                object_type: object_type.into(),
            },
        );
        cube.update_from_sdk = true;
        cube.is_visible = is_visible;
        cube
    }

    pub fn chip(id: u32, x: f32, y: f32) -> Self {
        Self::chip_with_dimensions(id, x, y, DEFAULT_CHIP_RADIUS, DEFAULT_CHIP_THICKNESS)
    }

    pub fn chip_with_dimensions(id: u32, x: f32, y: f32, radius: f32, thickness: f32) -> Self {
        Self::base(
            EntityId::Chip(id),
            x,
            y,
            0.0,
            EntityKind::Chip { radius, thickness },
        )
    }

    pub fn face(handle: u32, x: f32, y: f32, z: f32, name: impl Into<String>, is_visible: bool) -> Self {
        let mut face = Self::base(
            EntityId::Face(handle),
            x,
            y,
            z,
            EntityKind::Face {
                name: name.into(),
                expression: None,
            },
        );
        face.obstacle = false;
        face.is_visible = is_visible;
        face
    }

    /// Orientation, for the variants that have one.
    pub fn theta(&self) -> Option<f32> {
        match &self.kind {
            EntityKind::Wall { theta, .. }
            | EntityKind::LightCube { theta, .. }
            | EntityKind::CustomCube { theta, .. } => Some(*theta),
            EntityKind::Chip { .. } | EntityKind::Face { .. } => None,
        }
    }

    /// Set the orientation; ignored by chips and faces.
    pub fn set_theta(&mut self, value: f32) {
        match &mut self.kind {
            EntityKind::Wall { theta, .. }
            | EntityKind::LightCube { theta, .. }
            | EntityKind::CustomCube { theta, .. } => *theta = value,
            EntityKind::Chip { .. } | EntityKind::Face { .. } => {}
        }
    }

    pub fn face_name(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Face { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_wall(&self) -> bool {
        matches!(self.kind, EntityKind::Wall { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            EntityKind::Wall { .. } => "wall",
            EntityKind::LightCube { .. } => "light_cube",
            EntityKind::CustomCube { .. } => "custom_cube",
            EntityKind::Chip { .. } => "chip",
            EntityKind::Face { .. } => "face",
        }
    }
}

impl fmt::Display for WorldEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EntityKind::Wall { theta, length, .. } => write!(
                f,
                "<Wall {}: ({:.1}, {:.1}) @ {:.0} deg. for {:.1}>",
                self.id,
                self.x,
                self.y,
                theta.to_degrees(),
                length
            ),
            EntityKind::LightCube { theta, .. } => write!(
                f,
                "<LightCube {}: ({:.1}, {:.1}, {:.1}) @ {:.0} deg.>",
                self.id,
                self.x,
                self.y,
                self.z,
                theta.to_degrees()
            ),
            EntityKind::CustomCube {
                theta, object_type, ..
            } => write!(
                f,
                "<CustomCube {object_type}: ({:.1}, {:.1}, {:.1}) @ {:.0} deg.>",
                self.x,
                self.y,
                self.z,
                theta.to_degrees()
            ),
            EntityKind::Chip { radius, .. } => {
                write!(f, "<Chip ({:.1}, {:.1}) radius {radius:.1}>", self.x, self.y)
            }
            EntityKind::Face { name, expression } => write!(
                f,
                "<Face name:'{name}' expr:{} ({:.1}, {:.1}, {:.1}) vis:{}>",
                expression.as_deref().unwrap_or("unknown"),
                self.x,
                self.y,
                self.z,
                self.is_visible
            ),
        }
    }
}
