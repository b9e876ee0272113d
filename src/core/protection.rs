//! Module protection registry and feature flags
//!
//! Each protected module's surface - the full serialization of its manager
//! state - is stored together with a blake3 digest. Out-of-band mutation
//! shows up as a digest mismatch; named checkpoints capture every stored
//! surface at once for later rollback. The registry holds values only:
//! applying a restored surface back onto a live module is the caller's job.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::now_ms;

/// Raised by the protection registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtectionError {
    #[error("checkpoint '{0}' not found")]
    CheckpointNotFound(String),
    #[error("module '{0}' is not registered")]
    ModuleNotRegistered(String),
    #[error("module '{name}' drifted: expected digest {expected}, live digest {actual}")]
    ModuleDrift {
        name: String,
        expected: String,
        actual: String,
    },
}

/// blake3 digest of a captured surface, as hex
fn digest(surface: &Value) -> String {
    blake3::hash(surface.to_string().as_bytes())
        .to_hex()
        .to_string()
}

/// A module registered for protection
#[derive(Debug, Clone)]
pub struct ProtectedModule {
    pub name: String,
    pub version: String,
    /// Last-known-good captured surface
    surface: Value,
    checksum: String,
    pub registered_at_ms: u64,
    pub last_verified_ms: Option<u64>,
}

/// A named, immutable capture of every protected module's surface
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub codeword: String,
    pub timestamp_ms: u64,
    surfaces: HashMap<String, Value>,
}

impl Checkpoint {
    /// Stored surface for one module
    pub fn surface(&self, module: &str) -> Option<&Value> {
        self.surfaces.get(module)
    }

    pub fn surfaces(&self) -> &HashMap<String, Value> {
        &self.surfaces
    }
}

/// Registration status report for one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleStatus {
    Unregistered,
    Registered {
        version: String,
        last_verified_ms: Option<u64>,
    },
}

/// Registry of protected modules and named checkpoints
#[derive(Debug, Default)]
pub struct CoreProtection {
    modules: HashMap<String, ProtectedModule>,
    checkpoints: HashMap<String, Checkpoint>,
}

impl CoreProtection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module with its captured surface. Registering an existing
    /// name replaces the stored surface.
    pub fn protect_module(&mut self, name: &str, surface: Value, version: &str) {
        let checksum = digest(&surface);
        log::info!("Protecting module '{name}' v{version} (digest {})", &checksum[..8]);
        self.modules.insert(
            name.to_string(),
            ProtectedModule {
                name: name.to_string(),
                version: version.to_string(),
                surface,
                checksum,
                registered_at_ms: now_ms(),
                last_verified_ms: None,
            },
        );
    }

    /// Update the last-known-good surface after an accepted mutation
    pub fn refresh_surface(&mut self, name: &str, surface: Value) -> Result<(), ProtectionError> {
        let module = self
            .modules
            .get_mut(name)
            .ok_or_else(|| ProtectionError::ModuleNotRegistered(name.to_string()))?;
        module.checksum = digest(&surface);
        module.surface = surface;
        Ok(())
    }

    /// Check a live surface against the stored digest
    pub fn verify_module(&mut self, name: &str, live: &Value) -> Result<(), ProtectionError> {
        let module = self
            .modules
            .get_mut(name)
            .ok_or_else(|| ProtectionError::ModuleNotRegistered(name.to_string()))?;
        let actual = digest(live);
        if actual != module.checksum {
            log::warn!("Module '{name}' failed verification");
            return Err(ProtectionError::ModuleDrift {
                name: name.to_string(),
                expected: module.checksum.clone(),
                actual,
            });
        }
        module.last_verified_ms = Some(now_ms());
        Ok(())
    }

    /// Last-known-good surface of a module
    pub fn surface(&self, name: &str) -> Option<&Value> {
        self.modules.get(name).map(|m| &m.surface)
    }

    /// Capture every stored surface under `codeword`, superseding a prior
    /// checkpoint with the same codeword
    pub fn create_checkpoint(&mut self, codeword: &str) {
        let surfaces: HashMap<String, Value> = self
            .modules
            .iter()
            .map(|(name, module)| (name.clone(), module.surface.clone()))
            .collect();
        log::info!(
            "Checkpoint '{codeword}' created ({} modules)",
            surfaces.len()
        );
        self.checkpoints.insert(
            codeword.to_string(),
            Checkpoint {
                codeword: codeword.to_string(),
                timestamp_ms: now_ms(),
                surfaces,
            },
        );
    }

    /// The stored bundle for `codeword`; the caller applies it to the live
    /// modules
    pub fn restore_checkpoint(&self, codeword: &str) -> Result<&Checkpoint, ProtectionError> {
        self.checkpoints
            .get(codeword)
            .ok_or_else(|| ProtectionError::CheckpointNotFound(codeword.to_string()))
    }

    /// Codewords and creation timestamps, oldest first
    pub fn list_checkpoints(&self) -> Vec<(String, u64)> {
        let mut list: Vec<(String, u64)> = self
            .checkpoints
            .values()
            .map(|c| (c.codeword.clone(), c.timestamp_ms))
            .collect();
        list.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        list
    }

    pub fn module_status(&self, name: &str) -> ModuleStatus {
        match self.modules.get(name) {
            Some(module) => ModuleStatus::Registered {
                version: module.version.clone(),
                last_verified_ms: module.last_verified_ms,
            },
            None => ModuleStatus::Unregistered,
        }
    }
}

/// Process-wide advisory toggles. Unknown flags read as `false` - flags are
/// advisory, never load-bearing.
#[derive(Debug, Clone, Default)]
pub struct FeatureFlags {
    flags: HashMap<String, bool>,
}

impl FeatureFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flag(&mut self, name: &str, value: bool) {
        self.flags.insert(name.to_string(), value);
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checkpoint_round_trip_survives_live_mutation() {
        let mut protection = CoreProtection::new();
        protection.protect_module("scene", json!({"lights": 1}), "1.0.0");
        protection.create_checkpoint("A");

        // Live module mutates afterward
        protection
            .refresh_surface("scene", json!({"lights": 99}))
            .unwrap();

        let checkpoint = protection.restore_checkpoint("A").unwrap();
        assert_eq!(checkpoint.surface("scene"), Some(&json!({"lights": 1})));
    }

    #[test]
    fn test_missing_checkpoint() {
        let protection = CoreProtection::new();
        let err = protection.restore_checkpoint("NOPE").unwrap_err();
        assert_eq!(err, ProtectionError::CheckpointNotFound("NOPE".to_string()));
    }

    #[test]
    fn test_same_codeword_supersedes() {
        let mut protection = CoreProtection::new();
        protection.protect_module("scene", json!({"v": 1}), "1.0.0");
        protection.create_checkpoint("A");

        protection.refresh_surface("scene", json!({"v": 2})).unwrap();
        protection.create_checkpoint("A");

        let checkpoint = protection.restore_checkpoint("A").unwrap();
        assert_eq!(checkpoint.surface("scene"), Some(&json!({"v": 2})));
        assert_eq!(protection.list_checkpoints().len(), 1);
    }

    #[test]
    fn test_drift_detection() {
        let mut protection = CoreProtection::new();
        let surface = json!({"items": ["skypanel"]});
        protection.protect_module("equipment", surface.clone(), "1.0.0");

        // Unchanged surface verifies
        assert!(protection.verify_module("equipment", &surface).is_ok());
        assert!(matches!(
            protection.module_status("equipment"),
            ModuleStatus::Registered {
                last_verified_ms: Some(_),
                ..
            }
        ));

        // Out-of-band mutation is flagged
        let drifted = json!({"items": ["skypanel", "rogue"]});
        let err = protection.verify_module("equipment", &drifted).unwrap_err();
        assert!(matches!(err, ProtectionError::ModuleDrift { .. }));
    }

    #[test]
    fn test_unregistered_module() {
        let mut protection = CoreProtection::new();
        let err = protection
            .refresh_surface("ghost", json!(null))
            .unwrap_err();
        assert_eq!(
            err,
            ProtectionError::ModuleNotRegistered("ghost".to_string())
        );
        assert_eq!(protection.module_status("ghost"), ModuleStatus::Unregistered);
    }

    #[test]
    fn test_list_checkpoints_empty() {
        let protection = CoreProtection::new();
        assert!(protection.list_checkpoints().is_empty());
    }

    #[test]
    fn test_flags_default_false() {
        let mut flags = FeatureFlags::new();
        assert!(!flags.flag("experimental_gels"));
        flags.set_flag("experimental_gels", true);
        assert!(flags.flag("experimental_gels"));
        flags.set_flag("experimental_gels", false);
        assert!(!flags.flag("experimental_gels"));
    }
}
