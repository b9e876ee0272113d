//! Environment state and manager
//!
//! Room presets with fixed dimensions. Switching presets replaces the whole
//! environment state; the mesh generation that consumes it lives elsewhere.

use serde::{Deserialize, Serialize};

/// Available room environments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoomPreset {
    #[default]
    SoundStage,
    Warehouse,
    BlackBox,
    LocationHouse,
}

impl RoomPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomPreset::SoundStage => "Sound Stage",
            RoomPreset::Warehouse => "Warehouse",
            RoomPreset::BlackBox => "Black Box",
            RoomPreset::LocationHouse => "Location House",
        }
    }

    /// Fixed dimensions for the preset (meters)
    pub fn dimensions(&self) -> RoomDimensions {
        match self {
            RoomPreset::SoundStage => RoomDimensions::new(18.0, 24.0, 9.0),
            RoomPreset::Warehouse => RoomDimensions::new(30.0, 45.0, 7.5),
            RoomPreset::BlackBox => RoomDimensions::new(12.0, 12.0, 5.0),
            RoomPreset::LocationHouse => RoomDimensions::new(6.0, 8.0, 2.7),
        }
    }
}

/// Interior dimensions of a room (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomDimensions {
    pub width: f32,
    pub length: f32,
    pub height: f32,
}

impl RoomDimensions {
    pub fn new(width: f32, length: f32, height: f32) -> Self {
        Self {
            width,
            length,
            height,
        }
    }
}

/// Complete environment state (serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentState {
    pub preset: RoomPreset,
    pub room: RoomDimensions,
}

impl Default for EnvironmentState {
    fn default() -> Self {
        let preset = RoomPreset::default();
        Self {
            preset,
            room: preset.dimensions(),
        }
    }
}

/// Owns the environment state
#[derive(Debug, Default)]
pub struct EnvironmentManager {
    state: EnvironmentState,
}

impl EnvironmentManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_environment(&mut self, preset: RoomPreset) {
        self.state = EnvironmentState {
            preset,
            room: preset.dimensions(),
        };
        log::info!("Environment set to {}", preset.as_str());
    }

    pub fn current_environment(&self) -> RoomPreset {
        self.state.preset
    }

    pub fn room(&self) -> RoomDimensions {
        self.state.room
    }

    pub fn state(&self) -> &EnvironmentState {
        &self.state
    }

    pub fn set_state(&mut self, state: EnvironmentState) {
        self.state = state;
    }
}
