//! Integrity rules for scene, equipment, and environment payloads
//!
//! Rules are pure functions over plain data - no rendering or platform
//! dependencies - registered once at startup and evaluated in registration
//! order. The first failing rule produces the error; a payload that passes
//! every rule for its kind is safe to snapshot or render.

use std::fmt;

use thiserror::Error;

use crate::environment::EnvironmentState;
use crate::equipment::EquipmentState;
use crate::finite_vec3;
use crate::scene::SceneState;

/// Payload kind a rule targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Scene,
    Equipment,
    Environment,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Scene => "scene",
            PayloadKind::Equipment => "equipment",
            PayloadKind::Environment => "environment",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a payload violates a registered rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} payload failed rule '{rule}': {detail}")]
pub struct DataIntegrityError {
    pub kind: PayloadKind,
    pub rule: &'static str,
    pub detail: String,
}

/// A single rule: a named pure predicate returning a failure detail
struct Rule<T> {
    name: &'static str,
    check: fn(&T) -> Result<(), String>,
}

/// Registry of integrity rules, grouped by payload kind
#[derive(Default)]
pub struct DataIntegrity {
    scene_rules: Vec<Rule<SceneState>>,
    equipment_rules: Vec<Rule<EquipmentState>>,
    environment_rules: Vec<Rule<EnvironmentState>>,
}

impl DataIntegrity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the default rule set
    pub fn initialize_common_rules(&mut self) {
        self.add_scene_rule("scene_has_camera", |scene| {
            if scene.camera.is_some() {
                Ok(())
            } else {
                Err("no camera present".to_string())
            }
        });
        self.add_scene_rule("scene_has_light", |scene| {
            if scene.lights.is_empty() {
                Err("no light sources present".to_string())
            } else {
                Ok(())
            }
        });
        self.add_scene_rule("scene_viewport_nonzero", |scene| {
            let (w, h) = scene.viewport;
            if w == 0 || h == 0 {
                Err(format!("viewport is {w}x{h}"))
            } else {
                Ok(())
            }
        });
        self.add_scene_rule("scene_light_intensity_sane", |scene| {
            for light in &scene.lights {
                if !light.intensity.is_finite() || light.intensity < 0.0 {
                    return Err(format!(
                        "light {} has intensity {}",
                        light.id, light.intensity
                    ));
                }
            }
            Ok(())
        });

        self.add_equipment_rule("equipment_labeled", |equipment| {
            for item in &equipment.items {
                if item.label.trim().is_empty() {
                    return Err(format!("item {} has an empty label", item.id));
                }
            }
            Ok(())
        });
        self.add_equipment_rule("equipment_position_finite", |equipment| {
            for item in &equipment.items {
                if !finite_vec3(item.position) {
                    return Err(format!(
                        "item {} has non-finite position {:?}",
                        item.id, item.position
                    ));
                }
            }
            Ok(())
        });
        self.add_equipment_rule("equipment_ids_unique", |equipment| {
            for (i, a) in equipment.items.iter().enumerate() {
                if equipment.items[i + 1..].iter().any(|b| b.id == a.id) {
                    return Err(format!("duplicate item id {}", a.id));
                }
            }
            Ok(())
        });

        self.add_environment_rule("environment_dimensions_positive", |env| {
            let room = env.room;
            let sane = |d: f32| d.is_finite() && d > 0.0;
            if sane(room.width) && sane(room.length) && sane(room.height) {
                Ok(())
            } else {
                Err(format!(
                    "room is {}x{}x{}",
                    room.width, room.length, room.height
                ))
            }
        });

        log::info!(
            "Integrity rules registered ({} scene, {} equipment, {} environment)",
            self.scene_rules.len(),
            self.equipment_rules.len(),
            self.environment_rules.len()
        );
    }

    pub fn add_scene_rule(&mut self, name: &'static str, check: fn(&SceneState) -> Result<(), String>) {
        self.scene_rules.push(Rule { name, check });
    }

    pub fn add_equipment_rule(
        &mut self,
        name: &'static str,
        check: fn(&EquipmentState) -> Result<(), String>,
    ) {
        self.equipment_rules.push(Rule { name, check });
    }

    pub fn add_environment_rule(
        &mut self,
        name: &'static str,
        check: fn(&EnvironmentState) -> Result<(), String>,
    ) {
        self.environment_rules.push(Rule { name, check });
    }

    pub fn validate_scene(&self, scene: &SceneState) -> Result<(), DataIntegrityError> {
        run_rules(&self.scene_rules, PayloadKind::Scene, scene)
    }

    pub fn validate_equipment(&self, equipment: &EquipmentState) -> Result<(), DataIntegrityError> {
        run_rules(&self.equipment_rules, PayloadKind::Equipment, equipment)
    }

    pub fn validate_environment(
        &self,
        environment: &EnvironmentState,
    ) -> Result<(), DataIntegrityError> {
        run_rules(&self.environment_rules, PayloadKind::Environment, environment)
    }
}

fn run_rules<T>(rules: &[Rule<T>], kind: PayloadKind, payload: &T) -> Result<(), DataIntegrityError> {
    for rule in rules {
        if let Err(detail) = (rule.check)(payload) {
            return Err(DataIntegrityError {
                kind,
                rule: rule.name,
                detail,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::equipment::EquipmentManager;
    use crate::scene::SceneManager;
    use glam::Vec3;

    fn rules() -> DataIntegrity {
        let mut integrity = DataIntegrity::new();
        integrity.initialize_common_rules();
        integrity
    }

    #[test]
    fn test_valid_payloads_pass() {
        let integrity = rules();

        let mut scene = SceneManager::new();
        scene.init();
        assert!(integrity.validate_scene(scene.state()).is_ok());

        let mut equipment = EquipmentManager::new();
        equipment.create_equipment(catalog::find("skypanel-s60").unwrap(), Vec3::ZERO);
        assert!(integrity.validate_equipment(equipment.state()).is_ok());

        assert!(
            integrity
                .validate_environment(&crate::environment::EnvironmentState::default())
                .is_ok()
        );
    }

    #[test]
    fn test_scene_without_camera_fails_that_rule() {
        let integrity = rules();
        let scene = SceneState::default();
        let err = integrity.validate_scene(&scene).unwrap_err();
        assert_eq!(err.rule, "scene_has_camera");
        assert_eq!(err.kind, PayloadKind::Scene);
    }

    #[test]
    fn test_nan_position_is_caught() {
        let integrity = rules();
        let mut equipment = EquipmentManager::new();
        let entry = catalog::find("c-stand").unwrap();
        let id = equipment.create_equipment(entry, Vec3::new(f32::NAN, 1.0, 0.0));

        let err = integrity.validate_equipment(equipment.state()).unwrap_err();
        assert_eq!(err.rule, "equipment_position_finite");
        assert!(err.detail.contains(&id.to_string()));
    }

    #[test]
    fn test_degenerate_room_is_caught() {
        use crate::environment::{EnvironmentState, RoomDimensions, RoomPreset};

        let integrity = rules();
        let env = EnvironmentState {
            preset: RoomPreset::BlackBox,
            room: RoomDimensions::new(12.0, 0.0, 5.0),
        };
        let err = integrity.validate_environment(&env).unwrap_err();
        assert_eq!(err.rule, "environment_dimensions_positive");
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let integrity = rules();
        // Violates both the camera and light rules; camera is registered first
        let scene = SceneState::default();
        let err = integrity.validate_scene(&scene).unwrap_err();
        assert_eq!(err.rule, "scene_has_camera");
    }
}
