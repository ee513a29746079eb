//! Wall specification registry and wall inference.
//!
//! Walls carry fiducial markers at known places. Each [`WallSpec`] is
//! registered once at startup with a [`WallRegistry`], which assigns the wall
//! the id of its lowest marker and indexes every marker back to its wall.
//!
//! Walls produce no observation events. Every cycle [`infer_walls`] looks at
//! the landmarks the particle filter currently knows, groups them by wall and
//! places one wall per group from a single marker:
//!
//! ```text
//! dist   = length / 2 − marker.offset
//! wall_x = m_x + dist · cos(θ_m − π/2)
//! wall_y = m_y + dist · sin(θ_m − π/2)
//! θ_wall = θ_m
//! ```
//!
//! When several markers of one wall are visible the lowest marker id wins.
//! The estimates are not fused.

use std::collections::{BTreeMap, HashMap};
use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use robomap_types::{LandmarkEstimate, MarkerId, WallId, WorldMapError};

use crate::entity::WorldEntity;

/// Where a marker is mounted on its wall.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WallMarker {
    /// Distance from the wall's left end to the marker, along the wall (mm).
    pub offset: f32,
    /// Height of the marker centre above the floor (mm).
    #[serde(default)]
    pub height: f32,
}

impl WallMarker {
    pub fn new(offset: f32, height: f32) -> Self {
        Self { offset, height }
    }
}

/// A doorway cut into a wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Doorway {
    /// Distance from the wall's left end to the doorway centre (mm).
    pub center: f32,
    pub width: f32,
}

/// Template for a physical wall.
#[derive(Debug, Clone, PartialEq)]
pub struct WallSpec {
    pub length: f32,
    pub height: f32,
    pub door_width: f32,
    pub door_height: f32,
    pub markers: BTreeMap<MarkerId, WallMarker>,
    pub doorways: Vec<Doorway>,
}

impl Default for WallSpec {
    fn default() -> Self {
        Self {
            length: 100.0,
            height: 210.0,
            door_width: 75.0,
            door_height: 105.0,
            markers: BTreeMap::new(),
            doorways: Vec::new(),
        }
    }
}

impl WallSpec {
    pub fn new(length: f32, height: f32) -> Self {
        Self {
            length,
            height,
            ..Self::default()
        }
    }

    pub fn with_door(mut self, width: f32, height: f32) -> Self {
        self.door_width = width;
        self.door_height = height;
        self
    }

    pub fn with_marker(mut self, id: MarkerId, marker: WallMarker) -> Self {
        self.markers.insert(id, marker);
        self
    }

    pub fn with_doorway(mut self, doorway: Doorway) -> Self {
        self.doorways.push(doorway);
        self
    }

    /// The id this spec is registered under: its lowest marker id.
    pub fn id(&self) -> Option<WallId> {
        self.markers.keys().next().copied()
    }
}

/// Catalog of wall templates, keyed by wall id and by marker id.
#[derive(Debug, Default, Clone)]
pub struct WallRegistry {
    specs: BTreeMap<WallId, WallSpec>,
    by_marker: HashMap<MarkerId, WallId>,
}

impl WallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a wall and index all of its markers.
    ///
    /// # Errors
    ///
    /// [`WorldMapError::EmptyWallSpec`] when the spec has no markers, and
    /// [`WorldMapError::DuplicateMarker`] when one of its markers already
    /// belongs to a registered wall. Nothing is inserted on error.
    pub fn register(&mut self, spec: WallSpec) -> Result<WallId, WorldMapError> {
        let id = spec.id().ok_or(WorldMapError::EmptyWallSpec)?;
        if let Some((&marker, &wall)) = spec
            .markers
            .keys()
            .find_map(|m| self.by_marker.get_key_value(m))
        {
            return Err(WorldMapError::DuplicateMarker { marker, wall });
        }
        for marker in spec.markers.keys() {
            self.by_marker.insert(*marker, id);
        }
        info!(wall_id = id, markers = spec.markers.len(), length = spec.length, "registered wall");
        self.specs.insert(id, spec);
        Ok(id)
    }

    /// The wall a marker belongs to, with that wall's id.
    pub fn spec_for_marker(&self, marker: MarkerId) -> Option<(WallId, &WallSpec)> {
        let id = *self.by_marker.get(&marker)?;
        self.specs.get(&id).map(|spec| (id, spec))
    }

    pub fn get(&self, id: WallId) -> Option<&WallSpec> {
        self.specs.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (WallId, &WallSpec)> {
        self.specs.iter().map(|(id, spec)| (*id, spec))
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Place every wall that has at least one known marker landmark.
pub fn infer_walls(
    registry: &WallRegistry,
    landmarks: &[(MarkerId, LandmarkEstimate)],
) -> Vec<WorldEntity> {
    let mut seen: BTreeMap<WallId, BTreeMap<MarkerId, &LandmarkEstimate>> = BTreeMap::new();
    for (marker, estimate) in landmarks {
        let Some((wall_id, _)) = registry.spec_for_marker(*marker) else {
            continue;
        };
        seen.entry(wall_id).or_default().insert(*marker, estimate);
    }

    seen.iter()
        .filter_map(|(wall_id, markers)| {
            let spec = registry.get(*wall_id)?;
            infer_wall(*wall_id, spec, markers)
        })
        .collect()
}

fn infer_wall(
    wall_id: WallId,
    spec: &WallSpec,
    markers: &BTreeMap<MarkerId, &LandmarkEstimate>,
) -> Option<WorldEntity> {
    let (marker_id, estimate) = markers
        .iter()
        .find(|(id, _)| spec.markers.contains_key(*id))?;
    let placement = spec.markers.get(marker_id)?;

    let [m_x, m_y] = estimate.mean;
    let orient = estimate.orientation;
    let dist = spec.length / 2.0 - placement.offset;
    let x = m_x + dist * (orient - FRAC_PI_2).cos();
    let y = m_y + dist * (orient - FRAC_PI_2).sin();
    debug!(wall_id, marker_id, x, y, theta = orient, "inferred wall");

    Some(WorldEntity::wall(
        wall_id,
        x,
        y,
        orient,
        spec.length,
        spec.height,
        spec.door_width,
        spec.door_height,
    ))
}
