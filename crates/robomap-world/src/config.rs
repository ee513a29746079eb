//! World map configuration – reads/writes `~/.robomap/config.toml`.
//!
//! The file names the kinematic frames used for carried objects and lists
//! every wall in the arena:
//!
//! ```toml
//! world_frame = "world"
//! lift_attach_frame = "lift_attach"
//!
//! [[walls]]
//! length = 300.0
//! height = 190.0
//! markers = [ { id = 1, offset = 50.0, height = 60.0 }, { id = 2, offset = 250.0 } ]
//! doorways = [ { center = 150.0, width = 75.0 } ]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use robomap_types::{MarkerId, WorldMapError};

use crate::walls::{Doorway, WallMarker, WallRegistry, WallSpec};
use crate::world_map::{DEFAULT_LIFT_ATTACH_FRAME, DEFAULT_WORLD_FRAME, WorldMap};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Wall(#[from] WorldMapError),
}

/// A marker as listed in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    pub id: MarkerId,
    pub offset: f32,
    #[serde(default)]
    pub height: f32,
}

/// A wall as listed in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallConfig {
    #[serde(default = "default_wall_length")]
    pub length: f32,
    #[serde(default = "default_wall_height")]
    pub height: f32,
    #[serde(default = "default_door_width")]
    pub door_width: f32,
    #[serde(default = "default_door_height")]
    pub door_height: f32,
    #[serde(default)]
    pub markers: Vec<MarkerConfig>,
    #[serde(default)]
    pub doorways: Vec<Doorway>,
}

impl WallConfig {
    pub fn to_spec(&self) -> WallSpec {
        let mut spec = WallSpec::new(self.length, self.height).with_door(self.door_width, self.door_height);
        for marker in &self.markers {
            spec = spec.with_marker(marker.id, WallMarker::new(marker.offset, marker.height));
        }
        for doorway in &self.doorways {
            spec = spec.with_doorway(*doorway);
        }
        spec
    }
}

fn default_wall_length() -> f32 {
    100.0
}
fn default_wall_height() -> f32 {
    210.0
}
fn default_door_width() -> f32 {
    75.0
}
fn default_door_height() -> f32 {
    105.0
}
fn default_world_frame() -> String {
    DEFAULT_WORLD_FRAME.to_string()
}
fn default_lift_attach_frame() -> String {
    DEFAULT_LIFT_ATTACH_FRAME.to_string()
}

/// Persisted world map configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldMapConfig {
    #[serde(default = "default_world_frame")]
    pub world_frame: String,

    #[serde(default = "default_lift_attach_frame")]
    pub lift_attach_frame: String,

    #[serde(default)]
    pub walls: Vec<WallConfig>,
}

impl Default for WorldMapConfig {
    fn default() -> Self {
        Self {
            world_frame: default_world_frame(),
            lift_attach_frame: default_lift_attach_frame(),
            walls: Vec::new(),
        }
    }
}

impl WorldMapConfig {
    /// Register every configured wall.
    ///
    /// # Errors
    ///
    /// The first [`WorldMapError`] raised by a wall (no markers, or a marker
    /// shared with an earlier wall).
    pub fn build_registry(&self) -> Result<WallRegistry, WorldMapError> {
        let mut registry = WallRegistry::new();
        for wall in &self.walls {
            registry.register(wall.to_spec())?;
        }
        Ok(registry)
    }

    /// An empty world map over the configured walls and frames.
    pub fn build_world_map(&self) -> Result<WorldMap, WorldMapError> {
        Ok(WorldMap::with_frames(
            self.build_registry()?,
            self.world_frame.clone(),
            self.lift_attach_frame.clone(),
        ))
    }
}

/// Return the path to `~/.robomap/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".robomap").join("config.toml")
}

/// Load the config from disk. Returns `None` if the file does not exist.
pub fn load() -> Result<Option<WorldMapConfig>, ConfigError> {
    load_from(&config_path())
}

/// Load the config from a specific path, applying environment overrides.
pub fn load_from(path: &Path) -> Result<Option<WorldMapConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cfg: WorldMapConfig = toml::from_str(&raw)?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Load the config at `path` (defaults when the file is absent) and build the
/// world map it describes.
pub fn load_world_map(path: &Path) -> Result<(WorldMapConfig, WorldMap), ConfigError> {
    let cfg = load_from(path)?.unwrap_or_default();
    let map = cfg.build_world_map()?;
    Ok((cfg, map))
}

/// Apply `ROBOMAP_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `ROBOMAP_WORLD_FRAME` | `world_frame` |
/// | `ROBOMAP_LIFT_ATTACH_FRAME` | `lift_attach_frame` |
pub fn apply_env_overrides(cfg: &mut WorldMapConfig) {
    if let Ok(v) = std::env::var("ROBOMAP_WORLD_FRAME")
        && !v.is_empty()
    {
        cfg.world_frame = v;
    }
    if let Ok(v) = std::env::var("ROBOMAP_LIFT_ATTACH_FRAME")
        && !v.is_empty()
    {
        cfg.lift_attach_frame = v;
    }
}

/// Save the config to a specific path, creating parent directories.
pub fn save_to(cfg: &WorldMapConfig, path: &Path) -> Result<(), ConfigError> {
    let io_err = |source: std::io::Error| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let raw = toml::to_string_pretty(cfg)?;
    fs::write(path, raw).map_err(io_err)?;
    Ok(())
}
