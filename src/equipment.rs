//! Equipment state and manager
//!
//! Instantiates catalog entries as placed equipment items. Item IDs are
//! allocated monotonically so iteration order is stable across restores.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;

/// A placed piece of equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub id: u32,
    /// Catalog key this item was instanced from
    pub catalog_key: String,
    /// Display label (catalog name plus instance number)
    pub label: String,
    pub position: Vec3,
    /// Yaw around the vertical axis (degrees)
    pub rotation_deg: f32,
}

/// Complete equipment state (serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentState {
    pub items: Vec<EquipmentItem>,
    /// Next item ID
    next_id: u32,
}

impl Default for EquipmentState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }
}

impl EquipmentState {
    /// Allocate a new item ID
    pub fn next_item_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Owns the equipment state and instances catalog entries
#[derive(Debug, Default)]
pub struct EquipmentManager {
    state: EquipmentState,
}

impl EquipmentManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance a catalog entry at the given position; returns the item ID.
    /// Drops onto the entry's default mount height when the requested Y is
    /// at floor level.
    pub fn create_equipment(&mut self, entry: &CatalogEntry, position: Vec3) -> u32 {
        let id = self.state.next_item_id();
        let y = if position.y == 0.0 {
            entry.mount_height_m
        } else {
            position.y
        };
        self.state.items.push(EquipmentItem {
            id,
            catalog_key: entry.key.to_string(),
            label: format!("{} #{}", entry.name, id),
            position: Vec3::new(position.x, y, position.z),
            rotation_deg: 0.0,
        });
        log::info!("Placed {} (id {})", entry.name, id);
        id
    }

    /// Remove the item with the given ID; returns whether it existed
    pub fn remove_equipment(&mut self, id: u32) -> bool {
        let before = self.state.items.len();
        self.state.items.retain(|i| i.id != id);
        self.state.items.len() < before
    }

    pub fn item(&self, id: u32) -> Option<&EquipmentItem> {
        self.state.items.iter().find(|i| i.id == id)
    }

    pub fn state(&self) -> &EquipmentState {
        &self.state
    }

    pub fn set_state(&mut self, state: EquipmentState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn test_create_uses_default_mount_height() {
        let mut mgr = EquipmentManager::new();
        let entry = catalog::find("skypanel-s60").unwrap();
        let id = mgr.create_equipment(entry, Vec3::new(1.0, 0.0, -2.0));
        let item = mgr.item(id).unwrap();
        assert_eq!(item.position.y, entry.mount_height_m);
        assert!(item.label.starts_with("ARRI SkyPanel"));
    }

    #[test]
    fn test_explicit_height_wins() {
        let mut mgr = EquipmentManager::new();
        let entry = catalog::find("astera-tube").unwrap();
        let id = mgr.create_equipment(entry, Vec3::new(0.0, 0.4, 0.0));
        assert_eq!(mgr.item(id).unwrap().position.y, 0.4);
    }

    #[test]
    fn test_remove_equipment() {
        let mut mgr = EquipmentManager::new();
        let entry = catalog::find("c-stand").unwrap();
        let a = mgr.create_equipment(entry, Vec3::ZERO);
        let b = mgr.create_equipment(entry, Vec3::new(1.0, 0.0, 0.0));
        assert_ne!(a, b);

        assert!(mgr.remove_equipment(a));
        assert!(!mgr.remove_equipment(a));
        assert_eq!(mgr.state().items.len(), 1);
        assert_eq!(mgr.state().items[0].id, b);
    }
}
