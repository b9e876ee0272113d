//! Application shell
//!
//! Owns the safety layer and the three managers as one explicit context (no
//! ambient globals) and funnels every mutation through the same envelope:
//!
//! ```text
//! validate operation -> mutate -> validate payloads
//!     -> refresh protected surfaces -> snapshot
//! ```
//!
//! On failure the error and its context go to `AutoRecovery::handle_error`
//! and the returned action is applied - the application degrades or rolls
//! back instead of crashing. A snapshot is never taken of data that failed
//! validation.

use glam::Vec3;
use serde::Serialize;
use serde_json::Value;

use crate::catalog;
use crate::consts::STABLE_CHECKPOINT;
use crate::core::{
    AppPhase, AutoRecovery, CoreError, CoreProtection, DataIntegrity, DataIntegrityError,
    EditorOp, ErrorContext, FeatureFlags, PayloadKind, RecoveryAction, StateBundle,
    StateValidator,
};
use crate::environment::{EnvironmentManager, EnvironmentState, RoomPreset};
use crate::equipment::{EquipmentManager, EquipmentState};
use crate::scene::{SceneManager, SceneState};
use crate::settings::RenderSettings;

/// Names the managers are registered under in the protection registry
pub const MODULE_SCENE: &str = "scene";
pub const MODULE_EQUIPMENT: &str = "equipment";
pub const MODULE_ENVIRONMENT: &str = "environment";

/// Capture a manager's surface as plain JSON. Best-effort: a capture
/// failure degrades to a null surface rather than blocking the operation.
fn capture<T: Serialize>(state: &T) -> Value {
    serde_json::to_value(state).unwrap_or_else(|err| {
        log::warn!("Surface capture failed: {err}");
        Value::Null
    })
}

/// The planner application: safety layer plus managers
pub struct PlannerApp {
    validator: StateValidator,
    integrity: DataIntegrity,
    protection: CoreProtection,
    recovery: AutoRecovery,
    flags: FeatureFlags,
    scene: SceneManager,
    equipment: EquipmentManager,
    environment: EnvironmentManager,
    render_settings: RenderSettings,
}

impl Default for PlannerApp {
    fn default() -> Self {
        Self::new()
    }
}

impl PlannerApp {
    pub fn new() -> Self {
        Self {
            validator: StateValidator::new(),
            integrity: DataIntegrity::new(),
            protection: CoreProtection::new(),
            recovery: AutoRecovery::new(),
            flags: FeatureFlags::new(),
            scene: SceneManager::new(),
            equipment: EquipmentManager::new(),
            environment: EnvironmentManager::new(),
            render_settings: RenderSettings::default(),
        }
    }

    /// Initialize managers, seed rules and strategies, protect the modules,
    /// take the first snapshot, and create the automatic stable checkpoint
    pub fn bootstrap(&mut self) -> Result<(), CoreError> {
        match self.try_bootstrap() {
            Ok(()) => Ok(()),
            Err(err) => {
                self.recover(&err, ErrorContext::for_op(EditorOp::InitScene));
                self.validator.set_phase(AppPhase::Error);
                Err(err)
            }
        }
    }

    fn try_bootstrap(&mut self) -> Result<(), CoreError> {
        self.validator
            .validate_operation(EditorOp::InitScene, AppPhase::Initializing)?;

        self.scene.init();
        self.environment.set_environment(RoomPreset::default());
        self.integrity.initialize_common_rules();
        self.recovery.initialize_common_strategies();

        self.integrity.validate_scene(self.scene.state())?;
        self.integrity.validate_equipment(self.equipment.state())?;
        self.integrity.validate_environment(self.environment.state())?;

        let version = env!("CARGO_PKG_VERSION");
        self.protection
            .protect_module(MODULE_SCENE, capture(self.scene.state()), version);
        self.protection
            .protect_module(MODULE_EQUIPMENT, capture(self.equipment.state()), version);
        self.protection
            .protect_module(MODULE_ENVIRONMENT, capture(self.environment.state()), version);

        self.recovery.take_snapshot(self.bundle());
        if !self.flags.flag("skip_stable_checkpoint") {
            self.protection.create_checkpoint(STABLE_CHECKPOINT);
        }

        self.validator.set_phase(AppPhase::Ready);
        log::info!("Bootstrap complete");
        Ok(())
    }

    // === Guarded operations ===

    /// Place a catalog entry into the scene; returns the equipment item ID
    pub fn place_equipment(&mut self, key: &str, position: Vec3) -> Result<u32, CoreError> {
        match self.try_place_equipment(key, position) {
            Ok(id) => Ok(id),
            Err(err) => {
                self.recover(&err, ErrorContext::for_op(EditorOp::CreateEquipment));
                Err(err)
            }
        }
    }

    fn try_place_equipment(&mut self, key: &str, position: Vec3) -> Result<u32, CoreError> {
        self.validator
            .validate_operation(EditorOp::CreateEquipment, AppPhase::Ready)?;
        let entry = catalog::find(key).ok_or_else(|| DataIntegrityError {
            kind: PayloadKind::Equipment,
            rule: "catalog_key_known",
            detail: format!("no catalog entry '{key}'"),
        })?;

        let id = self.equipment.create_equipment(entry, position);
        // Mirror the item into the scene; the label embeds the item ID, so
        // the node can be found again on removal
        let (label, pos) = match self.equipment.item(id) {
            Some(item) => (item.label.clone(), item.position),
            None => (entry.name.to_string(), position),
        };
        self.scene.add_to_scene(label, pos);

        self.commit()?;
        Ok(id)
    }

    /// Remove a placed item and its scene node
    pub fn remove_equipment(&mut self, id: u32) -> Result<(), CoreError> {
        match self.try_remove_equipment(id) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.recover(&err, ErrorContext::for_op(EditorOp::RemoveEquipment));
                Err(err)
            }
        }
    }

    fn try_remove_equipment(&mut self, id: u32) -> Result<(), CoreError> {
        self.validator
            .validate_operation(EditorOp::RemoveEquipment, AppPhase::Ready)?;

        if let Some(item) = self.equipment.item(id) {
            let label = item.label.clone();
            let node_id = self
                .scene
                .state()
                .nodes
                .iter()
                .find(|n| n.label == label)
                .map(|n| n.id);
            self.equipment.remove_equipment(id);
            if let Some(node_id) = node_id {
                self.scene.remove_from_scene(node_id);
            }
        } else {
            log::warn!("Remove requested for unknown equipment id {id}");
            return Ok(());
        }

        self.commit()
    }

    /// Switch the room environment
    pub fn switch_environment(&mut self, preset: RoomPreset) -> Result<(), CoreError> {
        match self.try_switch_environment(preset) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.recover(&err, ErrorContext::for_op(EditorOp::SetEnvironment));
                Err(err)
            }
        }
    }

    fn try_switch_environment(&mut self, preset: RoomPreset) -> Result<(), CoreError> {
        self.validator
            .validate_operation(EditorOp::SetEnvironment, AppPhase::Ready)?;
        self.environment.set_environment(preset);
        self.commit()
    }

    /// Resize the viewport
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), CoreError> {
        match self.try_resize(width, height) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.recover(&err, ErrorContext::for_op(EditorOp::Resize));
                Err(err)
            }
        }
    }

    fn try_resize(&mut self, width: u32, height: u32) -> Result<(), CoreError> {
        self.validator
            .validate_operation(EditorOp::Resize, AppPhase::Ready)?;
        self.scene.resize(width, height);
        self.commit()
    }

    /// Advance one animation frame. Frame ticks are validated but not
    /// snapshotted - the history would otherwise hold nothing but frames.
    pub fn animate(&mut self, dt: f32) -> Result<(), CoreError> {
        match self.try_animate(dt) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.recover(&err, ErrorContext::for_op(EditorOp::Animate));
                Err(err)
            }
        }
    }

    fn try_animate(&mut self, dt: f32) -> Result<(), CoreError> {
        self.validator
            .validate_operation(EditorOp::Animate, AppPhase::Ready)?;
        self.scene.animate(dt);
        self.integrity.validate_scene(self.scene.state())?;
        self.protection
            .refresh_surface(MODULE_SCENE, capture(self.scene.state()))?;
        Ok(())
    }

    /// Remove all placed nodes and equipment
    pub fn clear_scene(&mut self) -> Result<(), CoreError> {
        match self.try_clear_scene() {
            Ok(()) => Ok(()),
            Err(err) => {
                self.recover(&err, ErrorContext::for_op(EditorOp::ClearScene));
                Err(err)
            }
        }
    }

    fn try_clear_scene(&mut self) -> Result<(), CoreError> {
        self.validator
            .validate_operation(EditorOp::ClearScene, AppPhase::Ready)?;
        self.scene.clear_scene();
        self.equipment.set_state(EquipmentState::default());
        self.commit()
    }

    /// Create a named checkpoint of all protected modules
    pub fn checkpoint(&mut self, codeword: &str) {
        self.protection.create_checkpoint(codeword);
    }

    /// Roll all modules back to a named checkpoint
    pub fn rollback(&mut self, codeword: &str) -> Result<(), CoreError> {
        match self.try_rollback(codeword) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.recover(&err, ErrorContext::for_op(EditorOp::RestoreState));
                Err(err)
            }
        }
    }

    fn try_rollback(&mut self, codeword: &str) -> Result<(), CoreError> {
        self.validator
            .validate_operation(EditorOp::RestoreState, AppPhase::Ready)?;
        self.apply_checkpoint(codeword)?;
        self.commit()
    }

    /// Check every live surface against the protection registry
    pub fn verify_modules(&mut self) -> Result<(), CoreError> {
        match self.try_verify_modules() {
            Ok(()) => Ok(()),
            Err(err) => {
                self.recover(&err, ErrorContext::default());
                Err(err)
            }
        }
    }

    fn try_verify_modules(&mut self) -> Result<(), CoreError> {
        self.protection
            .verify_module(MODULE_SCENE, &capture(self.scene.state()))?;
        self.protection
            .verify_module(MODULE_EQUIPMENT, &capture(self.equipment.state()))?;
        self.protection
            .verify_module(MODULE_ENVIRONMENT, &capture(self.environment.state()))?;
        Ok(())
    }

    /// Forward a failure reported by the rendering layer
    pub fn report_renderer_failure(&mut self, detail: &str) {
        let err = CoreError::Renderer(detail.to_string());
        self.recover(&err, ErrorContext::default());
    }

    // === Envelope internals ===

    /// Validate all payloads, refresh the protected surfaces, snapshot
    fn commit(&mut self) -> Result<(), CoreError> {
        self.integrity.validate_scene(self.scene.state())?;
        self.integrity.validate_equipment(self.equipment.state())?;
        self.integrity.validate_environment(self.environment.state())?;

        self.refresh_all_surfaces()?;
        self.recovery.take_snapshot(self.bundle());
        Ok(())
    }

    fn refresh_all_surfaces(&mut self) -> Result<(), CoreError> {
        self.protection
            .refresh_surface(MODULE_SCENE, capture(self.scene.state()))?;
        self.protection
            .refresh_surface(MODULE_EQUIPMENT, capture(self.equipment.state()))?;
        self.protection
            .refresh_surface(MODULE_ENVIRONMENT, capture(self.environment.state()))?;
        Ok(())
    }

    fn bundle(&self) -> StateBundle {
        StateBundle {
            scene: self.scene.state().clone(),
            equipment: self.equipment.state().clone(),
            environment: self.environment.state().clone(),
        }
    }

    /// Deserialize a checkpoint's surfaces back into the managers
    fn apply_checkpoint(&mut self, codeword: &str) -> Result<(), CoreError> {
        let checkpoint = self.protection.restore_checkpoint(codeword)?;
        let scene = checkpoint.surface(MODULE_SCENE).cloned();
        let equipment = checkpoint.surface(MODULE_EQUIPMENT).cloned();
        let environment = checkpoint.surface(MODULE_ENVIRONMENT).cloned();

        if let Some(value) = scene {
            match serde_json::from_value::<SceneState>(value) {
                Ok(state) => self.scene.set_state(state),
                Err(err) => log::warn!("Checkpoint scene surface unreadable: {err}"),
            }
        }
        if let Some(value) = equipment {
            match serde_json::from_value::<EquipmentState>(value) {
                Ok(state) => self.equipment.set_state(state),
                Err(err) => log::warn!("Checkpoint equipment surface unreadable: {err}"),
            }
        }
        if let Some(value) = environment {
            match serde_json::from_value::<EnvironmentState>(value) {
                Ok(state) => self.environment.set_state(state),
                Err(err) => log::warn!("Checkpoint environment surface unreadable: {err}"),
            }
        }
        log::info!("Rolled back to checkpoint '{codeword}'");
        Ok(())
    }

    fn recover(&mut self, error: &CoreError, context: ErrorContext) {
        let action = self.recovery.handle_error(error, &context);
        self.apply_action(action, context);
    }

    /// Apply a recovery decision. Errors raised while applying feed back
    /// into `handle_error` with an incremented depth, which caps the
    /// recursion.
    fn apply_action(&mut self, action: RecoveryAction, context: ErrorContext) {
        match action {
            RecoveryAction::RestoreSnapshot { index } => {
                self.validator.set_phase(AppPhase::Recovering);
                match self.recovery.restore_snapshot(index) {
                    Ok(bundle) => {
                        let bundle = bundle.clone();
                        self.scene.set_state(bundle.scene);
                        self.equipment.set_state(bundle.equipment);
                        self.environment.set_state(bundle.environment);
                        // The restored state is already in the history; no
                        // new snapshot
                        if let Err(err) = self.refresh_all_surfaces() {
                            log::warn!("Surface refresh after restore failed: {err}");
                        }
                        self.validator.set_phase(AppPhase::Ready);
                        log::info!("State restored from snapshot {index}");
                    }
                    Err(err) => {
                        let err = CoreError::from(err);
                        let next_context = context.deeper();
                        let next = self.recovery.handle_error(&err, &next_context);
                        self.validator.set_phase(AppPhase::Error);
                        self.apply_action(next, next_context);
                    }
                }
            }
            RecoveryAction::RestoreCheckpoint { codeword } => {
                self.validator.set_phase(AppPhase::Recovering);
                match self.apply_checkpoint(&codeword) {
                    Ok(()) => {
                        if let Err(err) = self.refresh_all_surfaces() {
                            log::warn!("Surface refresh after rollback failed: {err}");
                        }
                        self.validator.set_phase(AppPhase::Ready);
                    }
                    Err(err) => {
                        let next_context = context.deeper();
                        let next = self.recovery.handle_error(&err, &next_context);
                        self.validator.set_phase(AppPhase::Error);
                        self.apply_action(next, next_context);
                    }
                }
            }
            RecoveryAction::ReinitializeRenderer { settings } => {
                log::warn!(
                    "Reinitializing renderer at {} quality",
                    settings.quality.as_str()
                );
                self.render_settings = settings;
            }
            RecoveryAction::LogOnly => {
                log::warn!("No recovery action applied");
            }
        }
    }

    // === Accessors ===

    pub fn phase(&self) -> AppPhase {
        self.validator.current_phase()
    }

    pub fn scene(&self) -> &SceneState {
        self.scene.state()
    }

    pub fn equipment(&self) -> &EquipmentState {
        self.equipment.state()
    }

    pub fn environment(&self) -> &EnvironmentState {
        self.environment.state()
    }

    pub fn render_settings(&self) -> &RenderSettings {
        &self.render_settings
    }

    pub fn recovery(&self) -> &AutoRecovery {
        &self.recovery
    }

    pub fn protection(&self) -> &CoreProtection {
        &self.protection
    }

    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut FeatureFlags {
        &mut self.flags
    }

    /// Out-of-band mutable access, used to exercise drift detection
    #[cfg(test)]
    fn scene_manager_mut(&mut self) -> &mut SceneManager {
        &mut self.scene
    }
}
