//! [`WorldMap`] – entity tracking, identity resolution and the per-cycle
//! update.
//!
//! The map is keyed by [`EntityId`]; there is at most one entity per key.
//! Observations arrive two ways:
//!
//! - pushed: [`WorldMap::handle_observation`] is called from the perception
//!   event callback for every cube, custom object or face sighting;
//! - pulled: [`WorldMap::update_map`] runs once per planning cycle, rebuilds
//!   walls from marker landmarks and re-reads every known cube and face so
//!   the planner sees the freshest poses.
//!
//! Nothing here fails. Observations that cannot be used (pose recorded
//! against another odometry origin, face without a pose, unknown marker) are
//! dropped and logged at `debug`.
//!
//! Walls whose markers are no longer known stay in the map with their last
//! inferred pose.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use robomap_perception::fusion::{fuse_observation, project_carried};
use robomap_types::{
    CubeObservation, CustomObjectObservation, EntityId, FaceObservation, Observation,
    ObservationEvent, SensorPose,
};

use crate::collaborators::Robot;
use crate::entity::{EntityKind, WorldEntity};
use crate::walls::{infer_walls, WallRegistry};

pub const DEFAULT_WORLD_FRAME: &str = "world";
pub const DEFAULT_LIFT_ATTACH_FRAME: &str = "lift_attach";

/// The robot's belief about the objects around it, in the particle filter's
/// frame.
#[derive(Debug, Clone)]
pub struct WorldMap {
    objects: BTreeMap<EntityId, WorldEntity>,
    walls: WallRegistry,
    world_frame: String,
    lift_attach_frame: String,
}

impl WorldMap {
    /// Create an empty map over a fully populated wall registry.
    pub fn new(walls: WallRegistry) -> Self {
        Self::with_frames(walls, DEFAULT_WORLD_FRAME, DEFAULT_LIFT_ATTACH_FRAME)
    }

    /// Like [`WorldMap::new`], naming the kinematic frames used to place
    /// carried objects.
    pub fn with_frames(
        walls: WallRegistry,
        world_frame: impl Into<String>,
        lift_attach_frame: impl Into<String>,
    ) -> Self {
        Self {
            objects: BTreeMap::new(),
            walls,
            world_frame: world_frame.into(),
            lift_attach_frame: lift_attach_frame.into(),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    pub fn objects(&self) -> &BTreeMap<EntityId, WorldEntity> {
        &self.objects
    }

    pub fn get(&self, id: &EntityId) -> Option<&WorldEntity> {
        self.objects.get(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn registry(&self) -> &WallRegistry {
        &self.walls
    }

    pub fn walls(&self) -> impl Iterator<Item = &WorldEntity> {
        self.objects.values().filter(|e| e.is_wall())
    }

    pub fn faces(&self) -> impl Iterator<Item = &WorldEntity> {
        self.objects.values().filter(|e| e.face_name().is_some())
    }

    pub fn find_face_by_name(&self, name: &str) -> Option<&WorldEntity> {
        self.objects.values().find(|e| e.face_name() == Some(name))
    }

    // ── Caller-managed state ────────────────────────────────────────────────

    /// Place a chip. Chips are never observed, so they only change through
    /// this call.
    pub fn insert_chip(&mut self, id: u32, x: f32, y: f32) -> &WorldEntity {
        let chip = WorldEntity::chip(id, x, y);
        let key = chip.id;
        self.objects.insert(key, chip);
        &self.objects[&key]
    }

    /// Enable or suspend sensor refreshes for an entity, e.g. after the robot
    /// sets a cube down somewhere it cannot see. Returns `false` if the
    /// entity is unknown.
    pub fn set_update_from_sdk(&mut self, id: &EntityId, enabled: bool) -> bool {
        match self.objects.get_mut(id) {
            Some(entity) => {
                entity.update_from_sdk = enabled;
                true
            }
            None => false,
        }
    }

    // ── Per-cycle update ────────────────────────────────────────────────────

    /// Bring the map up to date just before the planner runs.
    ///
    /// Walls are regenerated from landmarks, then every cube and face the
    /// perception pipeline knows is re-read. Custom objects only change
    /// through their observation events.
    pub fn update_map(&mut self, robot: &dyn Robot) {
        self.generate_walls_from_markers(robot);
        let cubes = robot.light_cubes();
        for cube in &cubes {
            self.update_cube(robot, cube);
        }
        let faces = robot.faces();
        for face in &faces {
            self.update_face(robot, face);
        }
        debug!(
            cubes = cubes.len(),
            faces = faces.len(),
            entities = self.objects.len(),
            "world map updated"
        );
    }

    /// Replace the wall entity of every wall with a currently known marker.
    pub fn generate_walls_from_markers(&mut self, robot: &dyn Robot) {
        let landmarks = robot.landmarks();
        for wall in infer_walls(&self.walls, &landmarks) {
            self.objects.insert(wall.id, wall);
        }
    }

    // ── Observation ingress ─────────────────────────────────────────────────

    /// Entry point for the perception event callback.
    pub fn handle_observation(&mut self, robot: &dyn Robot, event: &ObservationEvent) {
        debug!(event_id = %event.id, source = %event.source, "observation received");
        self.observe(robot, &event.observation);
    }

    /// Route an observation to the matching update.
    pub fn observe(&mut self, robot: &dyn Robot, observation: &Observation) {
        match observation {
            Observation::Cube(cube) => self.update_cube(robot, cube),
            Observation::CustomObject(object) => self.update_custom_object(robot, object),
            Observation::Face(face) => self.update_face(robot, face),
        }
    }

    /// Track a light cube.
    ///
    /// Visibility always follows the latest report. A carried cube is placed
    /// from kinematics only. An untracked cube is created on its first
    /// comparable pose. A visible cube re-enables refreshes, and refreshes
    /// apply the filter correction.
    pub fn update_cube(&mut self, robot: &dyn Robot, obs: &CubeObservation) {
        let key = EntityId::Cube(obs.handle);
        if let Some(entity) = self.objects.get_mut(&key) {
            entity.is_visible = obs.is_visible;
            if robot.carrying() == Some(key) {
                self.update_carried_object(robot, key);
                return;
            }
        } else {
            let comparable = obs.pose.as_ref().is_some_and(|p| robot.is_comparable(p));
            if !comparable {
                debug!(%key, "cube pose not comparable; not tracking yet");
                return;
            }
            debug!(%key, "tracking new light cube");
            self.objects
                .insert(key, WorldEntity::light_cube(obs.handle, obs.is_visible));
        }

        let Some(entity) = self.objects.get_mut(&key) else {
            return;
        };
        if obs.is_visible {
            entity.update_from_sdk = true;
        }
        if entity.update_from_sdk
            && let Some(pose) = &obs.pose
        {
            apply_correction(entity, robot, pose, obs.is_visible);
        }
    }

    /// Track a custom fiducial object. Custom objects have no carry logic:
    /// every comparable sighting is applied.
    pub fn update_custom_object(&mut self, robot: &dyn Robot, obs: &CustomObjectObservation) {
        if !robot.is_comparable(&obs.pose) {
            debug!(handle = obs.handle, "custom object pose not comparable; ignored");
            return;
        }
        let entity = self
            .objects
            .entry(EntityId::CustomObject(obs.handle))
            .or_insert_with(|| {
                debug!(handle = obs.handle, object_type = %obs.object_type, "tracking new custom object");
                WorldEntity::custom_cube(
                    obs.handle,
                    obs.object_type.clone(),
                    obs.declared_size,
                    None,
                    obs.is_visible,
                )
            });
        apply_correction(entity, robot, &obs.pose, obs.is_visible);
    }

    /// Track a face, re-identifying it by name across detector handle churn.
    /// Faces are only created from a visible detection.
    pub fn update_face(&mut self, robot: &dyn Robot, obs: &FaceObservation) {
        let Some(pose) = obs.pose.as_ref() else {
            return;
        };
        let key = match self.lookup_face(obs) {
            Some(key) => key,
            None if !obs.is_visible => return,
            None => {
                let key = EntityId::Face(obs.handle);
                debug!(%key, name = %obs.name, "tracking new face");
                self.objects.insert(
                    key,
                    WorldEntity::face(obs.handle, pose.x, pose.y, pose.z, obs.name.clone(), obs.is_visible),
                );
                key
            }
        };

        let Some(entity) = self.objects.get_mut(&key) else {
            return;
        };
        entity.is_visible = obs.is_visible;
        if obs.is_visible {
            entity.x = pose.x;
            entity.y = pose.y;
            entity.z = pose.z;
            if let EntityKind::Face { expression, .. } = &mut entity.kind {
                expression.clone_from(&obs.expression);
            }
            apply_correction(entity, robot, pose, obs.is_visible);
        }
    }

    /// Find the face entity carrying `obs.name`. When it is stored under an
    /// older handle and the new detection is visible, move it to the new
    /// handle. Returns the key the entity now lives under.
    fn lookup_face(&mut self, obs: &FaceObservation) -> Option<EntityId> {
        let current = self
            .objects
            .iter()
            .find(|(key, entity)| {
                matches!(key, EntityId::Face(_)) && entity.face_name() == Some(obs.name.as_str())
            })
            .map(|(key, _)| *key)?;

        let new_key = EntityId::Face(obs.handle);
        if current == new_key || !obs.is_visible {
            return Some(current);
        }
        let mut entity = self.objects.remove(&current)?;
        debug!(from = %current, to = %new_key, name = %obs.name, "face re-identified under new handle");
        entity.id = new_key;
        self.objects.insert(new_key, entity);
        Some(new_key)
    }

    fn update_carried_object(&mut self, robot: &dyn Robot, key: EntityId) {
        let Some(attach) = robot.frame_transform(&self.world_frame, &self.lift_attach_frame) else {
            warn!(
                %key,
                from = %self.world_frame,
                to = %self.lift_attach_frame,
                "no kinematic path to lift attach frame; carried object not moved"
            );
            return;
        };
        let pose = project_carried(&attach, robot.filtered_pose().theta);
        if let Some(entity) = self.objects.get_mut(&key) {
            entity.x = pose.x;
            entity.y = pose.y;
            entity.set_theta(pose.theta);
        }
    }
}

fn apply_correction(entity: &mut WorldEntity, robot: &dyn Robot, pose: &SensorPose, is_visible: bool) {
    let fused = fuse_observation(robot.raw_pose(), robot.filtered_pose(), pose);
    entity.x = fused.x;
    entity.y = fused.y;
    entity.z = fused.z;
    entity.set_theta(fused.theta);
    entity.is_visible = is_visible;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotRobot;
    use crate::walls::{WallMarker, WallSpec};
    use robomap_types::{LandmarkEstimate, Pose2D, Size3};
    use std::f32::consts::FRAC_PI_2;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    /// Odometry at the origin; the filter has the robot 100 mm further along X.
    fn drifted_robot() -> SnapshotRobot {
        SnapshotRobot {
            raw_pose: Pose2D::new(0.0, 0.0, 0.0),
            filtered_pose: Pose2D::new(100.0, 0.0, 0.0),
            ..SnapshotRobot::default()
        }
    }

    fn cube(handle: u32, x: f32, y: f32, visible: bool) -> CubeObservation {
        CubeObservation {
            handle,
            pose: Some(SensorPose::new(x, y, 22.0, 0.2)),
            is_visible: visible,
        }
    }

    fn face(handle: u32, name: &str, visible: bool) -> FaceObservation {
        FaceObservation {
            handle,
            name: name.to_string(),
            expression: Some("happy".to_string()),
            pose: Some(SensorPose::new(300.0, 0.0, 150.0, 0.0)),
            is_visible: visible,
        }
    }

    fn custom(handle: u32, pose: SensorPose) -> CustomObjectObservation {
        CustomObjectObservation {
            handle,
            object_type: "CustomType02".to_string(),
            declared_size: Some(Size3::new(30.0, 30.0, 60.0)),
            pose,
            is_visible: true,
        }
    }

    // ── Cubes ───────────────────────────────────────────────────────────────

    #[test]
    fn first_comparable_sighting_creates_corrected_cube() {
        let robot = drifted_robot();
        let mut map = WorldMap::new(WallRegistry::new());
        map.update_cube(&robot, &cube(1, 50.0, 0.0, true));

        let entity = map.get(&EntityId::Cube(1)).unwrap();
        assert!(close(entity.x, 150.0), "x={}", entity.x);
        assert!(close(entity.y, 0.0));
        assert!(close(entity.z, 22.0));
        assert_eq!(entity.theta(), Some(0.2));
        assert!(entity.is_visible);
    }

    #[test]
    fn incomparable_cube_is_not_created() {
        let robot = SnapshotRobot {
            origin_id: 1,
            ..drifted_robot()
        };
        let mut map = WorldMap::new(WallRegistry::new());
        map.update_cube(&robot, &cube(1, 50.0, 0.0, true));
        assert!(map.is_empty());

        let never_seen = CubeObservation {
            handle: 2,
            pose: None,
            is_visible: false,
        };
        map.update_cube(&robot, &never_seen);
        assert!(map.is_empty());
    }

    #[test]
    fn suspended_cube_ignores_unseen_reports_until_visible() {
        let robot = drifted_robot();
        let mut map = WorldMap::new(WallRegistry::new());
        map.update_cube(&robot, &cube(1, 50.0, 0.0, true));
        assert!(map.set_update_from_sdk(&EntityId::Cube(1), false));

        // Stale report while out of view: position stays put.
        map.update_cube(&robot, &cube(1, 80.0, 0.0, false));
        let entity = map.get(&EntityId::Cube(1)).unwrap();
        assert!(close(entity.x, 150.0));
        assert!(!entity.update_from_sdk);

        // Seen again: refreshes resume.
        map.update_cube(&robot, &cube(1, 80.0, 0.0, true));
        let entity = map.get(&EntityId::Cube(1)).unwrap();
        assert!(entity.update_from_sdk);
        assert!(close(entity.x, 180.0));
    }

    #[test]
    fn unseen_cube_marked_invisible_but_still_refreshed() {
        let robot = drifted_robot();
        let mut map = WorldMap::new(WallRegistry::new());
        map.update_cube(&robot, &cube(1, 50.0, 0.0, true));
        map.update_cube(&robot, &cube(1, 60.0, 0.0, false));
        let entity = map.get(&EntityId::Cube(1)).unwrap();
        assert!(!entity.is_visible);
        assert!(close(entity.x, 160.0));
    }

    #[test]
    fn carried_cube_follows_kinematics_only() {
        let mut robot = drifted_robot();
        let mut map = WorldMap::new(WallRegistry::new());
        map.update_cube(&robot, &cube(1, 50.0, 0.0, true));

        robot.carrying = Some(EntityId::Cube(1));
        robot.filtered_pose = Pose2D::new(200.0, 100.0, FRAC_PI_2);
        robot.lift_attach = [30.0, 0.0, 40.0];

        for x in [500.0, -500.0, 0.0] {
            map.update_cube(&robot, &cube(1, x, x, true));
            let entity = map.get(&EntityId::Cube(1)).unwrap();
            // Attach point is 30 mm ahead of the filtered pose, object centre 22 mm beyond.
            assert!(close(entity.x, 200.0), "x={}", entity.x);
            assert!(close(entity.y, 152.0), "y={}", entity.y);
            assert_eq!(entity.theta(), Some(FRAC_PI_2));
        }
    }

    #[test]
    fn suspended_and_carried_cubes_still_report_visibility() {
        let mut robot = drifted_robot();
        let mut map = WorldMap::new(WallRegistry::new());
        map.update_cube(&robot, &cube(1, 50.0, 0.0, true));
        map.update_cube(&robot, &cube(2, 70.0, 0.0, true));
        map.set_update_from_sdk(&EntityId::Cube(1), false);
        robot.carrying = Some(EntityId::Cube(2));

        map.update_cube(&robot, &cube(1, 50.0, 0.0, false));
        map.update_cube(&robot, &cube(2, 70.0, 0.0, false));
        assert!(!map.get(&EntityId::Cube(1)).unwrap().is_visible);
        assert!(!map.get(&EntityId::Cube(2)).unwrap().is_visible);

        map.update_cube(&robot, &cube(2, 70.0, 0.0, true));
        assert!(map.get(&EntityId::Cube(2)).unwrap().is_visible);
    }

    #[test]
    fn carrying_untracked_cube_still_requires_creation() {
        let robot = SnapshotRobot {
            carrying: Some(EntityId::Cube(1)),
            ..drifted_robot()
        };
        let mut map = WorldMap::new(WallRegistry::new());
        map.update_cube(&robot, &cube(1, 50.0, 0.0, true));
        assert!(close(map.get(&EntityId::Cube(1)).unwrap().x, 150.0));
    }

    #[test]
    fn missing_kinematic_frame_leaves_carried_cube_in_place() {
        let mut robot = drifted_robot();
        let mut map = WorldMap::with_frames(WallRegistry::new(), "world", "gripper");
        map.update_cube(&robot, &cube(1, 50.0, 0.0, true));
        robot.carrying = Some(EntityId::Cube(1));
        map.update_cube(&robot, &cube(1, 0.0, 0.0, true));
        assert!(close(map.get(&EntityId::Cube(1)).unwrap().x, 150.0));
    }

    // ── Custom objects ──────────────────────────────────────────────────────

    #[test]
    fn custom_object_created_and_always_corrected() {
        let mut robot = drifted_robot();
        robot.carrying = Some(EntityId::CustomObject(4));
        let mut map = WorldMap::new(WallRegistry::new());

        map.update_custom_object(&robot, &custom(4, SensorPose::new(10.0, 20.0, 30.0, 0.0)));
        map.update_custom_object(&robot, &custom(4, SensorPose::new(20.0, 20.0, 30.0, 0.0)));
        let entity = map.get(&EntityId::CustomObject(4)).unwrap();
        assert!(close(entity.x, 120.0));
        assert!(close(entity.y, 20.0));
        assert!(matches!(
            &entity.kind,
            EntityKind::CustomCube { size, object_type, .. }
                if *size == Size3::new(30.0, 30.0, 60.0) && object_type == "CustomType02"
        ));
    }

    #[test]
    fn incomparable_custom_object_is_ignored_even_when_tracked() {
        let robot = drifted_robot();
        let mut map = WorldMap::new(WallRegistry::new());
        map.update_custom_object(&robot, &custom(4, SensorPose::new(10.0, 0.0, 0.0, 0.0)));
        map.update_custom_object(&robot, &custom(4, SensorPose::new(90.0, 0.0, 0.0, 0.0).with_origin(3)));
        assert!(close(map.get(&EntityId::CustomObject(4)).unwrap().x, 110.0));
    }

    // ── Faces ───────────────────────────────────────────────────────────────

    #[test]
    fn face_without_pose_is_ignored() {
        let robot = drifted_robot();
        let mut map = WorldMap::new(WallRegistry::new());
        let mut obs = face(1, "Alice", true);
        obs.pose = None;
        map.update_face(&robot, &obs);
        assert!(map.is_empty());

        map.update_face(&robot, &face(1, "Alice", true));
        obs.is_visible = false;
        map.update_face(&robot, &obs);
        assert!(map.get(&EntityId::Face(1)).unwrap().is_visible);
    }

    #[test]
    fn unseen_face_is_not_tracked_until_visible() {
        let robot = drifted_robot();
        let mut map = WorldMap::new(WallRegistry::new());
        map.update_face(&robot, &face(1, "Alice", false));
        assert!(map.is_empty());

        map.update_face(&robot, &face(1, "Alice", true));
        let entity = map.get(&EntityId::Face(1)).unwrap();
        assert!(close(entity.x, 400.0), "x={}", entity.x);
    }

    #[test]
    fn visible_face_is_corrected_with_expression() {
        let robot = drifted_robot();
        let mut map = WorldMap::new(WallRegistry::new());
        map.update_face(&robot, &face(1, "Alice", true));
        let entity = map.get(&EntityId::Face(1)).unwrap();
        assert!(close(entity.x, 400.0));
        assert!(close(entity.z, 150.0));
        assert!(!entity.obstacle);
        assert!(matches!(&entity.kind, EntityKind::Face { expression: Some(e), .. } if e == "happy"));
    }

    #[test]
    fn invisible_face_keeps_last_position() {
        let robot = drifted_robot();
        let mut map = WorldMap::new(WallRegistry::new());
        map.update_face(&robot, &face(1, "Alice", true));
        let mut gone = face(1, "Alice", false);
        gone.pose = Some(SensorPose::new(0.0, 0.0, 0.0, 0.0));
        gone.expression = Some("sad".to_string());
        map.update_face(&robot, &gone);

        let entity = map.get(&EntityId::Face(1)).unwrap();
        assert!(!entity.is_visible);
        assert!(close(entity.x, 400.0));
        assert!(matches!(&entity.kind, EntityKind::Face { expression: Some(e), .. } if e == "happy"));
    }

    #[test]
    fn face_is_rekeyed_to_new_handle_by_name() {
        let robot = drifted_robot();
        let mut map = WorldMap::new(WallRegistry::new());
        map.update_face(&robot, &face(1, "Alice", true));
        map.update_face(&robot, &face(1, "Alice", false));
        map.update_face(&robot, &face(2, "Alice", true));

        let alices: Vec<_> = map
            .objects()
            .iter()
            .filter(|(_, e)| e.face_name() == Some("Alice"))
            .collect();
        assert_eq!(alices.len(), 1);
        assert_eq!(*alices[0].0, EntityId::Face(2));
        assert_eq!(alices[0].1.id, EntityId::Face(2));
        assert!(alices[0].1.is_visible);
        assert!(map.get(&EntityId::Face(1)).is_none());
    }

    #[test]
    fn invisible_new_handle_does_not_steal_face() {
        let robot = drifted_robot();
        let mut map = WorldMap::new(WallRegistry::new());
        map.update_face(&robot, &face(1, "Alice", true));
        map.update_face(&robot, &face(2, "Alice", false));

        assert!(map.get(&EntityId::Face(1)).is_some());
        assert!(map.get(&EntityId::Face(2)).is_none());
        assert!(!map.find_face_by_name("Alice").unwrap().is_visible);
    }

    #[test]
    fn distinct_names_are_distinct_faces() {
        let robot = drifted_robot();
        let mut map = WorldMap::new(WallRegistry::new());
        map.update_face(&robot, &face(1, "Alice", true));
        map.update_face(&robot, &face(2, "Bob", true));
        assert_eq!(map.faces().count(), 2);
    }

    // ── Dispatch and orchestration ──────────────────────────────────────────

    #[test]
    fn handle_observation_dispatches_by_kind() {
        let robot = drifted_robot();
        let mut map = WorldMap::new(WallRegistry::new());
        for observation in [
            Observation::Cube(cube(1, 50.0, 0.0, true)),
            Observation::CustomObject(custom(2, SensorPose::new(0.0, 50.0, 0.0, 0.0))),
            Observation::Face(face(3, "Carol", true)),
        ] {
            map.handle_observation(&robot, &ObservationEvent::new("vision", observation));
        }
        assert!(map.get(&EntityId::Cube(1)).is_some());
        assert!(map.get(&EntityId::CustomObject(2)).is_some());
        assert!(map.get(&EntityId::Face(3)).is_some());
    }

    fn walled_map() -> WorldMap {
        let mut registry = WallRegistry::new();
        registry
            .register(
                WallSpec::new(200.0, 150.0)
                    .with_marker(5, WallMarker::new(50.0, 60.0))
                    .with_marker(6, WallMarker::new(150.0, 60.0)),
            )
            .unwrap();
        WorldMap::new(registry)
    }

    #[test]
    fn update_map_refreshes_walls_cubes_and_faces() {
        let mut robot = drifted_robot();
        let mut other_origin = cube(2, 0.0, 0.0, false);
        other_origin.pose = other_origin.pose.map(|p| p.with_origin(9));
        robot.cubes = vec![cube(1, 50.0, 0.0, true), other_origin];
        robot.faces = vec![face(7, "Alice", true)];
        robot.landmarks = vec![(6, LandmarkEstimate::new(100.0, 50.0, 0.0))];

        let mut map = walled_map();
        map.update_map(&robot);

        assert!(map.get(&EntityId::Cube(1)).is_some());
        assert!(map.get(&EntityId::Cube(2)).is_none());
        assert!(map.get(&EntityId::Face(7)).is_some());
        let wall = map.get(&EntityId::Wall(5)).unwrap();
        assert!(close(wall.y, 100.0));
        assert_eq!(map.walls().count(), 1);
    }

    #[test]
    fn update_map_is_idempotent_for_tracked_entities() {
        let mut robot = drifted_robot();
        robot.cubes = vec![cube(1, 50.0, 30.0, true), cube(2, -20.0, 70.0, false)];
        robot.faces = vec![face(7, "Alice", true)];

        let mut map = walled_map();
        map.update_map(&robot);
        let first: Vec<WorldEntity> = map.objects().values().cloned().collect();
        map.update_map(&robot);
        let second: Vec<WorldEntity> = map.objects().values().cloned().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn update_map_does_not_touch_custom_objects() {
        let robot = drifted_robot();
        let mut map = walled_map();
        map.update_custom_object(&robot, &custom(4, SensorPose::new(10.0, 0.0, 0.0, 0.0)));
        let moved = SnapshotRobot {
            filtered_pose: Pose2D::new(-300.0, 0.0, 0.0),
            ..drifted_robot()
        };
        map.update_map(&moved);
        assert!(close(map.get(&EntityId::CustomObject(4)).unwrap().x, 110.0));
    }

    #[test]
    fn stale_walls_are_retained() {
        let mut robot = drifted_robot();
        robot.landmarks = vec![(5, LandmarkEstimate::new(100.0, 0.0, 0.0))];
        let mut map = walled_map();
        map.update_map(&robot);
        robot.landmarks.clear();
        map.update_map(&robot);
        assert!(map.get(&EntityId::Wall(5)).is_some());
    }

    #[test]
    fn chips_are_caller_managed() {
        let robot = drifted_robot();
        let mut map = walled_map();
        let chip = map.insert_chip(3, 40.0, -40.0);
        assert_eq!(chip.id, EntityId::Chip(3));
        map.update_map(&robot);
        let chip = map.get(&EntityId::Chip(3)).unwrap();
        assert_eq!((chip.x, chip.y), (40.0, -40.0));
        assert!(!map.set_update_from_sdk(&EntityId::Cube(99), true));
    }
}
