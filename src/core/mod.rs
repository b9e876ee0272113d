//! Safety layer wrapping the planner's mutable state
//!
//! Four components give the editor's ad-hoc mutations basic safety
//! guarantees:
//! - `state_validator`: which operations are legal in which phase
//! - `integrity`: rule checks on scene/equipment/environment payloads
//! - `protection`: checksummed module surfaces and named checkpoints
//! - `recovery`: error-to-action strategies and bounded state snapshots
//!
//! Every call site uses one pattern: attempt the operation, and on failure
//! hand the error and its context to [`AutoRecovery::handle_error`], then
//! apply whatever action comes back.

pub mod integrity;
pub mod protection;
pub mod recovery;
pub mod state_validator;

pub use integrity::{DataIntegrity, DataIntegrityError, PayloadKind};
pub use protection::{CoreProtection, FeatureFlags, ModuleStatus, ProtectionError};
pub use recovery::{
    ActionTemplate, AutoRecovery, ErrorContext, RecoveryAction, RecoveryError, StateBundle,
    StateSnapshot,
};
pub use state_validator::{AppPhase, EditorOp, StateTransitionError, StateValidator};

use thiserror::Error;

/// Unified error type for the safety layer
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    StateTransition(#[from] StateTransitionError),
    #[error(transparent)]
    DataIntegrity(#[from] DataIntegrityError),
    #[error(transparent)]
    Protection(#[from] ProtectionError),
    #[error(transparent)]
    Recovery(#[from] RecoveryError),
    /// Failure reported by the rendering layer
    #[error("renderer failure: {0}")]
    Renderer(String),
}
