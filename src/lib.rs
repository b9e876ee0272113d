//! Lightdesk - an interactive 3D scene planner for film/video lighting setups
//!
//! Core modules:
//! - `core`: Safety layer (operation gating, integrity rules, module protection, auto-recovery)
//! - `scene`: Scene manager (camera, lights, placed nodes)
//! - `equipment`: Equipment manager (fixture instancing from the catalog)
//! - `environment`: Environment manager (room presets and dimensions)
//! - `catalog`: Static lighting/grip equipment catalog
//! - `settings`: Data-driven render quality settings

pub mod app;
pub mod catalog;
pub mod core;
pub mod environment;
pub mod equipment;
pub mod scene;
pub mod settings;

pub use app::PlannerApp;
pub use settings::{QualityPreset, RenderSettings};

/// Planner configuration constants
pub mod consts {
    /// Maximum retained auto-recovery snapshots
    pub const MAX_SNAPSHOTS: usize = 10;
    /// Maximum recovery depth before decisions degrade to log-only
    pub const MAX_RECOVERY_DEPTH: u32 = 3;
    /// Codeword of the automatic post-bootstrap checkpoint
    pub const STABLE_CHECKPOINT: &str = "STABLE_V1";

    /// Default viewport size (pixels)
    pub const DEFAULT_VIEWPORT: (u32, u32) = (1280, 720);
    /// Default camera vertical field of view (degrees)
    pub const DEFAULT_FOV_DEG: f32 = 50.0;
    /// Default camera distance from the room center (meters)
    pub const DEFAULT_CAMERA_DISTANCE: f32 = 6.5;
}

/// Wall-clock time in milliseconds since the Unix epoch (0 if the clock is
/// set before the epoch)
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Check that every component of a world-space vector is finite
#[inline]
pub fn finite_vec3(v: glam::Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}
