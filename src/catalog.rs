//! Static lighting/grip equipment catalog
//!
//! Data-driven: a fixed table the equipment manager instantiates from. No
//! I/O and no dynamic registration - the catalog ships with the build.

use serde::{Deserialize, Serialize};

/// Equipment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// LED panel or tube fixtures
    Led,
    /// Tungsten fresnels and open-face units
    Tungsten,
    /// Daylight HMI units
    Hmi,
    /// Stands, flags, frames
    Grip,
}

/// One catalog entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    /// Stable lookup key
    pub key: &'static str,
    /// Display name shown on scene labels
    pub name: &'static str,
    pub category: Category,
    /// Default mounting height when dropped into the scene (meters)
    pub mount_height_m: f32,
}

/// The shipped catalog
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        key: "skypanel-s60",
        name: "ARRI SkyPanel S60-C",
        category: Category::Led,
        mount_height_m: 2.4,
    },
    CatalogEntry {
        key: "aputure-600d",
        name: "Aputure LS 600d Pro",
        category: Category::Led,
        mount_height_m: 2.1,
    },
    CatalogEntry {
        key: "astera-tube",
        name: "Astera Titan Tube",
        category: Category::Led,
        mount_height_m: 1.8,
    },
    CatalogEntry {
        key: "arri-650",
        name: "ARRI 650 Plus Fresnel",
        category: Category::Tungsten,
        mount_height_m: 2.0,
    },
    CatalogEntry {
        key: "arri-m18",
        name: "ARRI M18 HMI",
        category: Category::Hmi,
        mount_height_m: 2.6,
    },
    CatalogEntry {
        key: "c-stand",
        name: "Matthews C-Stand 40\"",
        category: Category::Grip,
        mount_height_m: 0.0,
    },
    CatalogEntry {
        key: "combo-stand",
        name: "Combo Stand Double Riser",
        category: Category::Grip,
        mount_height_m: 0.0,
    },
    CatalogEntry {
        key: "flag-4x4",
        name: "4x4 Floppy Flag",
        category: Category::Grip,
        mount_height_m: 1.5,
    },
];

/// Look up a catalog entry by key
pub fn find(key: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.key == key)
}
