//! Operation gating by application phase
//!
//! A declarative table maps each editor operation to the phases it is legal
//! in; `validate_operation` refuses everything else before any state is
//! touched. Phase changes themselves are unconditional - bootstrap and
//! recovery need to force transitions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::now_ms;

/// Application lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AppPhase {
    #[default]
    Initializing,
    Loading,
    Ready,
    Error,
    Recovering,
}

impl AppPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppPhase::Initializing => "initializing",
            AppPhase::Loading => "loading",
            AppPhase::Ready => "ready",
            AppPhase::Error => "error",
            AppPhase::Recovering => "recovering",
        }
    }
}

impl fmt::Display for AppPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editor operations subject to phase gating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditorOp {
    InitScene,
    Resize,
    Animate,
    ClearScene,
    AddToScene,
    CreateEquipment,
    RemoveEquipment,
    SetEnvironment,
    RestoreState,
}

impl EditorOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorOp::InitScene => "init_scene",
            EditorOp::Resize => "resize",
            EditorOp::Animate => "animate",
            EditorOp::ClearScene => "clear_scene",
            EditorOp::AddToScene => "add_to_scene",
            EditorOp::CreateEquipment => "create_equipment",
            EditorOp::RemoveEquipment => "remove_equipment",
            EditorOp::SetEnvironment => "set_environment",
            EditorOp::RestoreState => "restore_state",
        }
    }

    /// Phases in which this operation is legal
    pub fn allowed_in(self) -> &'static [AppPhase] {
        use AppPhase::*;
        match self {
            EditorOp::InitScene => &[Initializing, Recovering],
            EditorOp::Resize => &[Ready],
            EditorOp::Animate => &[Ready],
            EditorOp::ClearScene => &[Ready],
            EditorOp::AddToScene => &[Ready],
            EditorOp::CreateEquipment => &[Ready],
            EditorOp::RemoveEquipment => &[Ready],
            EditorOp::SetEnvironment => &[Loading, Ready],
            EditorOp::RestoreState => &[Ready, Error, Recovering],
        }
    }
}

impl fmt::Display for EditorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when an operation is requested in the wrong phase
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateTransitionError {
    #[error("operation '{operation}' expected phase '{expected}' but the application is '{current}'")]
    PhaseMismatch {
        operation: EditorOp,
        expected: AppPhase,
        current: AppPhase,
    },
    #[error("operation '{operation}' is not allowed in phase '{phase}'")]
    NotAllowed { operation: EditorOp, phase: AppPhase },
}

/// One recorded phase change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: AppPhase,
    pub to: AppPhase,
    pub at_ms: u64,
}

/// Holds the current phase and its transition history
#[derive(Debug, Default)]
pub struct StateValidator {
    phase: AppPhase,
    history: Vec<PhaseTransition>,
}

impl StateValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally record a new phase. Bootstrap and recovery-forced
    /// transitions go through here.
    pub fn set_phase(&mut self, phase: AppPhase) {
        if phase != self.phase {
            log::info!("Phase {} -> {}", self.phase, phase);
        }
        self.history.push(PhaseTransition {
            from: self.phase,
            to: phase,
            at_ms: now_ms(),
        });
        self.phase = phase;
    }

    pub fn current_phase(&self) -> AppPhase {
        self.phase
    }

    pub fn history(&self) -> &[PhaseTransition] {
        &self.history
    }

    /// Refuse `operation` unless the application is in `expected` and the
    /// operation is legal there. Never mutates state.
    pub fn validate_operation(
        &self,
        operation: EditorOp,
        expected: AppPhase,
    ) -> Result<(), StateTransitionError> {
        if expected != self.phase {
            return Err(StateTransitionError::PhaseMismatch {
                operation,
                expected,
                current: self.phase,
            });
        }
        if !operation.allowed_in().contains(&self.phase) {
            return Err(StateTransitionError::NotAllowed {
                operation,
                phase: self.phase,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_only_in_ready() {
        let mut validator = StateValidator::new();
        validator.set_phase(AppPhase::Ready);
        assert!(
            validator
                .validate_operation(EditorOp::Resize, AppPhase::Ready)
                .is_ok()
        );

        // Wrong expected phase fails even though resize is a known op
        let err = validator
            .validate_operation(EditorOp::Resize, AppPhase::Initializing)
            .unwrap_err();
        assert!(matches!(err, StateTransitionError::PhaseMismatch { .. }));
    }

    #[test]
    fn test_op_not_allowed_in_matching_phase() {
        let validator = StateValidator::new();
        // Phase matches (Initializing) but resize is not legal there
        let err = validator
            .validate_operation(EditorOp::Resize, AppPhase::Initializing)
            .unwrap_err();
        assert_eq!(
            err,
            StateTransitionError::NotAllowed {
                operation: EditorOp::Resize,
                phase: AppPhase::Initializing,
            }
        );
    }

    #[test]
    fn test_failed_validation_leaves_phase_unchanged() {
        let mut validator = StateValidator::new();
        validator.set_phase(AppPhase::Ready);
        let _ = validator.validate_operation(EditorOp::InitScene, AppPhase::Ready);
        assert_eq!(validator.current_phase(), AppPhase::Ready);
    }

    #[test]
    fn test_table_is_consistent() {
        // Every operation allowed in a phase must validate there, and fail
        // everywhere else with the right error
        let phases = [
            AppPhase::Initializing,
            AppPhase::Loading,
            AppPhase::Ready,
            AppPhase::Error,
            AppPhase::Recovering,
        ];
        let ops = [
            EditorOp::InitScene,
            EditorOp::Resize,
            EditorOp::Animate,
            EditorOp::ClearScene,
            EditorOp::AddToScene,
            EditorOp::CreateEquipment,
            EditorOp::RemoveEquipment,
            EditorOp::SetEnvironment,
            EditorOp::RestoreState,
        ];
        for phase in phases {
            let mut validator = StateValidator::new();
            validator.set_phase(phase);
            for op in ops {
                let result = validator.validate_operation(op, phase);
                assert_eq!(result.is_ok(), op.allowed_in().contains(&phase));
            }
        }
    }

    #[test]
    fn test_history_records_transitions() {
        let mut validator = StateValidator::new();
        validator.set_phase(AppPhase::Loading);
        validator.set_phase(AppPhase::Ready);
        let history = validator.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].from, AppPhase::Initializing);
        assert_eq!(history[1].to, AppPhase::Ready);
    }
}
