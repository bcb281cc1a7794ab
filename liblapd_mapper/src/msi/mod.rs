//! MSI diagnostic mappings.
//!
//! The `MSI` group holds the machine state information of the LaPD: the
//! discharge, gas fill, cathode heater, interferometers and magnetic field.
pub mod discharge;
pub mod gas_pressure;
pub mod heater;
pub mod interferometer_array;
pub mod magnetic_field;
pub mod template;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::node::Group;
pub use template::{MsiConfig, MsiInfo, MsiKind, MsiLayout, MsiMap};

/// All MSI diagnostic mappings found in the MSI group
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct MsiMaps {
    maps: BTreeMap<String, MsiMap>,
    #[serde(skip)]
    warnings: Vec<String>,
}

impl MsiMaps {
    /// Map every known diagnostic in the MSI group
    pub fn new(msi_group: &Group) -> Self {
        let mut collection = Self::default();
        for kind in MsiKind::ALL {
            let Some(group) = msi_group.group(kind.name()) else {
                continue;
            };
            match MsiMap::build(kind, group) {
                Ok(map) => {
                    spdlog::debug!("Mapped MSI diagnostic {}", kind.name());
                    collection.maps.insert(kind.name().to_string(), map);
                }
                Err(e) => collection.warnings.push(format!(
                    "Mapping of MSI diagnostic '{}' failed: {e}",
                    kind.name()
                )),
            }
        }
        collection
    }

    pub fn get(&self, name: &str) -> Option<&MsiMap> {
        self.maps.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.maps.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.maps.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MsiMap)> {
        self.maps.iter()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
