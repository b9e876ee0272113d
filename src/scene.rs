//! Scene state and manager
//!
//! The logical scene the renderer consumes: camera, lights, placed nodes.
//! This module is pure data - no GPU or windowing resources live here, so the
//! whole state can be captured, checksummed, and restored by the safety layer.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Perspective camera state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    /// World-space position (meters)
    pub position: Vec3,
    /// Look-at target
    pub target: Vec3,
    /// Vertical field of view (degrees)
    pub fov_deg: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.7, DEFAULT_CAMERA_DISTANCE),
            target: Vec3::new(0.0, 1.0, 0.0),
            fov_deg: DEFAULT_FOV_DEG,
        }
    }
}

/// Role of a light in the setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightRole {
    Key,
    Fill,
    Back,
    /// In-shot source (lamp, window, monitor glow)
    Practical,
}

/// A light source in the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneLight {
    pub id: u32,
    pub role: LightRole,
    pub position: Vec3,
    /// Relative intensity (1.0 = nominal)
    pub intensity: f32,
    /// Correlated color temperature (Kelvin)
    pub color_temp_k: u32,
}

/// A placed node: a fixture mesh, a label, a view marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: u32,
    pub label: String,
    pub position: Vec3,
}

/// Complete logical scene state (serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneState {
    pub camera: Option<CameraState>,
    pub lights: Vec<SceneLight>,
    pub nodes: Vec<SceneNode>,
    /// Animation frame counter
    pub frame: u64,
    /// Viewport size in pixels
    pub viewport: (u32, u32),
    /// Next entity ID
    next_id: u32,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            camera: None,
            lights: Vec::new(),
            nodes: Vec::new(),
            frame: 0,
            viewport: DEFAULT_VIEWPORT,
            next_id: 1,
        }
    }
}

impl SceneState {
    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Owns the scene state and applies the operations the shell requests
#[derive(Debug, Default)]
pub struct SceneManager {
    state: SceneState,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the default camera and key light
    pub fn init(&mut self) {
        self.state = SceneState::default();
        self.state.camera = Some(CameraState::default());
        let id = self.state.next_entity_id();
        self.state.lights.push(SceneLight {
            id,
            role: LightRole::Key,
            position: Vec3::new(2.0, 3.0, 2.0),
            intensity: 1.0,
            color_temp_k: 5600,
        });
        log::info!("Scene initialized ({} light)", self.state.lights.len());
    }

    /// Advance the frame counter
    pub fn animate(&mut self, _dt: f32) {
        self.state.frame += 1;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.state.viewport = (width, height);
        log::info!("Viewport resized to {}x{}", width, height);
    }

    /// Remove all placed nodes, keeping camera and lights
    pub fn clear_scene(&mut self) {
        let removed = self.state.nodes.len();
        self.state.nodes.clear();
        log::info!("Scene cleared ({} nodes removed)", removed);
    }

    /// Add a node (fixture mesh, label) and return its ID
    pub fn add_to_scene(&mut self, label: impl Into<String>, position: Vec3) -> u32 {
        let id = self.state.next_entity_id();
        self.state.nodes.push(SceneNode {
            id,
            label: label.into(),
            position,
        });
        id
    }

    /// Remove the node with the given ID; returns whether it existed
    pub fn remove_from_scene(&mut self, id: u32) -> bool {
        let before = self.state.nodes.len();
        self.state.nodes.retain(|n| n.id != id);
        self.state.nodes.len() < before
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn set_state(&mut self, state: SceneState) {
        self.state = state;
    }
}
