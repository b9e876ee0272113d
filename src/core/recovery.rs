//! Error-to-action strategies and bounded state snapshots
//!
//! The single place where failures become decisions: `handle_error` always
//! returns an action and never raises. Strategies are matched in
//! registration order, first match wins. The snapshot history is bounded;
//! once the cap is reached the oldest entry is evicted.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{MAX_RECOVERY_DEPTH, MAX_SNAPSHOTS};
use crate::core::CoreError;
use crate::core::state_validator::EditorOp;
use crate::environment::EnvironmentState;
use crate::equipment::EquipmentState;
use crate::now_ms;
use crate::scene::SceneState;
use crate::settings::RenderSettings;

/// The whole application's logical state as plain data
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateBundle {
    pub scene: SceneState,
    pub equipment: EquipmentState,
    pub environment: EnvironmentState,
}

/// One entry in the snapshot history; never mutated after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub bundle: StateBundle,
}

/// Raised when a snapshot restore addresses a missing entry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("snapshot index {index} out of range (history holds {len})")]
    SnapshotNotFound { index: usize, len: usize },
}

/// What was being attempted when an error surfaced
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub operation: Option<EditorOp>,
    pub module: Option<String>,
    /// Recovery actions already on the stack
    pub recovery_depth: u32,
}

impl ErrorContext {
    pub fn for_op(operation: EditorOp) -> Self {
        Self {
            operation: Some(operation),
            ..Self::default()
        }
    }

    /// Context for an error raised while applying a recovery action
    pub fn deeper(&self) -> Self {
        Self {
            operation: self.operation,
            module: self.module.clone(),
            recovery_depth: self.recovery_depth + 1,
        }
    }
}

/// What to do about an error; each variant carries exactly its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryAction {
    /// Roll the managers back to a stored snapshot
    RestoreSnapshot { index: usize },
    /// Roll protected modules back to a named checkpoint
    RestoreCheckpoint { codeword: String },
    /// Rebuild the renderer with fallback settings
    ReinitializeRenderer { settings: RenderSettings },
    /// Nothing to roll back; record and continue
    LogOnly,
}

/// Action a strategy yields. Snapshot indices are resolved against the
/// history at decision time, not at registration time.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionTemplate {
    RestoreLatestSnapshot,
    RestoreCheckpoint(String),
    ReinitializeRenderer,
    LogOnly,
}

/// A registered recovery strategy
pub struct RecoveryStrategy {
    pub name: &'static str,
    matches: fn(&CoreError, &ErrorContext) -> bool,
    template: ActionTemplate,
}

/// Strategy registry plus the bounded snapshot history
#[derive(Default)]
pub struct AutoRecovery {
    strategies: Vec<RecoveryStrategy>,
    history: VecDeque<StateSnapshot>,
    next_sequence: u64,
}

impl AutoRecovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the default strategies, in priority order
    pub fn initialize_common_strategies(&mut self) {
        self.add_strategy(
            "renderer_context_lost",
            |error, _| matches!(error, CoreError::Renderer(_)),
            ActionTemplate::ReinitializeRenderer,
        );
        self.add_strategy(
            "state_rollback",
            |error, _| {
                matches!(
                    error,
                    CoreError::DataIntegrity(_)
                        | CoreError::Protection(
                            crate::core::protection::ProtectionError::ModuleDrift { .. }
                        )
                )
            },
            ActionTemplate::RestoreLatestSnapshot,
        );
        // A refused operation never touched state; there is nothing to roll
        // back
        self.add_strategy(
            "operation_refused",
            |error, _| matches!(error, CoreError::StateTransition(_)),
            ActionTemplate::LogOnly,
        );
        log::info!("Recovery strategies registered ({})", self.strategies.len());
    }

    pub fn add_strategy(
        &mut self,
        name: &'static str,
        matches: fn(&CoreError, &ErrorContext) -> bool,
        template: ActionTemplate,
    ) {
        self.strategies.push(RecoveryStrategy {
            name,
            matches,
            template,
        });
    }

    /// Append a snapshot, evicting the oldest beyond the cap. Infallible:
    /// the bundle is already plain data.
    pub fn take_snapshot(&mut self, bundle: StateBundle) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.history.push_back(StateSnapshot {
            sequence,
            timestamp_ms: now_ms(),
            bundle,
        });
        while self.history.len() > MAX_SNAPSHOTS {
            self.history.pop_front();
        }
        log::debug!(
            "Snapshot {} taken ({} retained)",
            sequence,
            self.history.len()
        );
    }

    pub fn snapshot_count(&self) -> usize {
        self.history.len()
    }

    /// Index of the most recent snapshot, if any
    pub fn latest_index(&self) -> Option<usize> {
        self.history.len().checked_sub(1)
    }

    pub fn snapshot(&self, index: usize) -> Option<&StateSnapshot> {
        self.history.get(index)
    }

    /// The stored bundle at `index` (0 = oldest retained). The caller
    /// applies it; the history is not mutated.
    pub fn restore_snapshot(&self, index: usize) -> Result<&StateBundle, RecoveryError> {
        self.history
            .get(index)
            .map(|s| &s.bundle)
            .ok_or(RecoveryError::SnapshotNotFound {
                index,
                len: self.history.len(),
            })
    }

    /// Convert an error into a recovery decision. Total: every input yields
    /// an action, and dispatch degrades to `LogOnly` once the recovery
    /// depth cap is reached.
    pub fn handle_error(&self, error: &CoreError, context: &ErrorContext) -> RecoveryAction {
        match context.operation {
            Some(op) => log::error!("Error during '{op}': {error}"),
            None => log::error!("Error: {error}"),
        }

        if context.recovery_depth >= MAX_RECOVERY_DEPTH {
            log::warn!(
                "Recovery depth {} reached; degrading to log-only",
                context.recovery_depth
            );
            return RecoveryAction::LogOnly;
        }

        for strategy in &self.strategies {
            if (strategy.matches)(error, context) {
                let action = self.materialize(&strategy.template);
                log::warn!("Strategy '{}' chose {:?}", strategy.name, action);
                return action;
            }
        }
        RecoveryAction::LogOnly
    }

    fn materialize(&self, template: &ActionTemplate) -> RecoveryAction {
        match template {
            ActionTemplate::RestoreLatestSnapshot => match self.latest_index() {
                Some(index) => RecoveryAction::RestoreSnapshot { index },
                // No history yet; nothing to restore
                None => RecoveryAction::LogOnly,
            },
            ActionTemplate::RestoreCheckpoint(codeword) => RecoveryAction::RestoreCheckpoint {
                codeword: codeword.clone(),
            },
            ActionTemplate::ReinitializeRenderer => RecoveryAction::ReinitializeRenderer {
                settings: RenderSettings::reduced_fidelity(),
            },
            ActionTemplate::LogOnly => RecoveryAction::LogOnly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::integrity::{DataIntegrityError, PayloadKind};
    use crate::core::state_validator::{AppPhase, StateTransitionError};
    use proptest::prelude::*;

    fn recovery_with_strategies() -> AutoRecovery {
        let mut recovery = AutoRecovery::new();
        recovery.initialize_common_strategies();
        recovery
    }

    fn integrity_error() -> CoreError {
        CoreError::DataIntegrity(DataIntegrityError {
            kind: PayloadKind::Scene,
            rule: "scene_has_camera",
            detail: "no camera present".to_string(),
        })
    }

    #[test]
    fn test_history_is_bounded() {
        let mut recovery = AutoRecovery::new();
        for _ in 0..MAX_SNAPSHOTS + 1 {
            recovery.take_snapshot(StateBundle::default());
        }
        assert_eq!(recovery.snapshot_count(), MAX_SNAPSHOTS);
        // The original oldest (sequence 0) was evicted; index 0 now
        // addresses the next one
        assert_eq!(recovery.snapshot(0).map(|s| s.sequence), Some(1));
    }

    proptest! {
        #[test]
        fn prop_history_never_exceeds_cap(n in 0usize..40) {
            let mut recovery = AutoRecovery::new();
            for _ in 0..n {
                recovery.take_snapshot(StateBundle::default());
            }
            prop_assert_eq!(recovery.snapshot_count(), n.min(MAX_SNAPSHOTS));
            if n > 0 {
                let oldest = recovery.snapshot(0).map(|s| s.sequence);
                prop_assert_eq!(oldest, Some(n.saturating_sub(MAX_SNAPSHOTS) as u64));
            }
        }
    }

    #[test]
    fn test_restore_out_of_range() {
        let mut recovery = AutoRecovery::new();
        recovery.take_snapshot(StateBundle::default());
        let err = recovery.restore_snapshot(5).unwrap_err();
        assert_eq!(err, RecoveryError::SnapshotNotFound { index: 5, len: 1 });
    }

    #[test]
    fn test_integrity_error_restores_latest_snapshot() {
        let mut recovery = recovery_with_strategies();
        recovery.take_snapshot(StateBundle::default());
        recovery.take_snapshot(StateBundle::default());

        let action = recovery.handle_error(&integrity_error(), &ErrorContext::default());
        assert_eq!(action, RecoveryAction::RestoreSnapshot { index: 1 });
    }

    #[test]
    fn test_integrity_error_with_empty_history_degrades() {
        let recovery = recovery_with_strategies();
        let action = recovery.handle_error(&integrity_error(), &ErrorContext::default());
        assert_eq!(action, RecoveryAction::LogOnly);
    }

    #[test]
    fn test_renderer_error_reinitializes() {
        let recovery = recovery_with_strategies();
        let error = CoreError::Renderer("device lost".to_string());
        let action = recovery.handle_error(&error, &ErrorContext::default());
        assert_eq!(
            action,
            RecoveryAction::ReinitializeRenderer {
                settings: RenderSettings::reduced_fidelity()
            }
        );
    }

    #[test]
    fn test_refused_operation_is_log_only() {
        let mut recovery = recovery_with_strategies();
        recovery.take_snapshot(StateBundle::default());
        let error = CoreError::StateTransition(StateTransitionError::NotAllowed {
            operation: EditorOp::Resize,
            phase: AppPhase::Initializing,
        });
        let action = recovery.handle_error(&error, &ErrorContext::default());
        assert_eq!(action, RecoveryAction::LogOnly);
    }

    #[test]
    fn test_unmatched_error_falls_back_to_log_only() {
        // No strategies registered at all
        let recovery = AutoRecovery::new();
        let action = recovery.handle_error(&integrity_error(), &ErrorContext::default());
        assert_eq!(action, RecoveryAction::LogOnly);
    }

    #[test]
    fn test_depth_cap_degrades_to_log_only() {
        let mut recovery = recovery_with_strategies();
        recovery.take_snapshot(StateBundle::default());

        let mut context = ErrorContext::default();
        for _ in 0..MAX_RECOVERY_DEPTH {
            context = context.deeper();
        }
        let action = recovery.handle_error(&integrity_error(), &context);
        assert_eq!(action, RecoveryAction::LogOnly);
    }
}
