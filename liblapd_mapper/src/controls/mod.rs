//! Control device mappings.
//!
//! Control devices live in the `Raw data + config` group next to the
//! digitizers. Each known device group is handed to its mapper; groups that
//! fail to map are reported and left for the unknowns list.
pub mod cl_template;
pub mod n5700ps;
pub mod nixyz;
pub mod sixk;
pub mod template;
pub mod waveform;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::node::Group;
pub use template::{ConType, ControlConfig, ControlInfo, ControlKind, ControlMap, StateValue};

/// All control device mappings found in a data group
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ControlMaps {
    maps: BTreeMap<String, ControlMap>,
    #[serde(skip)]
    warnings: Vec<String>,
}

impl ControlMaps {
    /// Map every known control device in the data group
    pub fn new(data_group: &Group) -> Self {
        let mut collection = Self::default();
        for kind in ControlKind::ALL {
            let Some(group) = data_group.group(kind.name()) else {
                continue;
            };
            match ControlMap::build(kind, group) {
                Ok(map) => {
                    spdlog::debug!("Mapped control device {}", kind.name());
                    collection.maps.insert(kind.name().to_string(), map);
                }
                Err(e) => collection.warnings.push(format!(
                    "Mapping of control device '{}' failed: {e}",
                    kind.name()
                )),
            }
        }
        collection
    }

    pub fn get(&self, name: &str) -> Option<&ControlMap> {
        self.maps.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ControlMap> {
        self.maps.get_mut(name)
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

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ControlMap)> {
        self.maps.iter()
    }

    /// Devices that were found but could not be mapped
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
