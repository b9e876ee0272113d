//! Render quality settings
//!
//! Data-driven fidelity levels. The reduced-fidelity configuration is what
//! the recovery layer swaps in when the renderer has to be reinitialized
//! after a context failure.

use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    /// Maximum shadow-casting lights for this preset
    pub fn max_shadow_casters(&self) -> usize {
        match self {
            QualityPreset::Low => 0,
            QualityPreset::Medium => 2,
            QualityPreset::High => 8,
        }
    }

    /// Whether antialiasing is enabled
    pub fn antialiasing(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Renderer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub quality: QualityPreset,
    /// Render fixture shadows
    pub shadows: bool,
    pub antialiasing: bool,
    /// Draw equipment name labels over the scene
    pub labels: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from_preset(QualityPreset::Medium)
    }
}

impl RenderSettings {
    /// Settings derived from a quality preset
    pub fn from_preset(quality: QualityPreset) -> Self {
        Self {
            quality,
            shadows: quality.max_shadow_casters() > 0,
            antialiasing: quality.antialiasing(),
            labels: true,
        }
    }

    /// The fallback configuration used when reinitializing a failed renderer
    pub fn reduced_fidelity() -> Self {
        Self {
            quality: QualityPreset::Low,
            shadows: false,
            antialiasing: false,
            labels: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_fidelity_is_low() {
        let settings = RenderSettings::reduced_fidelity();
        assert_eq!(settings.quality, QualityPreset::Low);
        assert!(!settings.shadows);
        assert!(!settings.antialiasing);
    }

    #[test]
    fn test_from_preset() {
        let high = RenderSettings::from_preset(QualityPreset::High);
        assert!(high.shadows);
        assert!(high.antialiasing);

        let low = RenderSettings::from_preset(QualityPreset::Low);
        assert!(!low.shadows);
    }
}
