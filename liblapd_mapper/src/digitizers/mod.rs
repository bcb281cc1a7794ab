//! Digitizer mappings.
//!
//! Digitizers record the probe signals. A configuration of a digitizer
//! describes which boards and channels took data and at what rate.
pub mod sis3301;
pub mod siscrate;
pub mod template;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::node::Group;
pub use template::{AdcConnection, DigiConfig, DigiInfo, DigiKind, DigiMap};

/// All digitizer mappings found in a data group
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DigiMaps {
    maps: BTreeMap<String, DigiMap>,
    #[serde(skip)]
    warnings: Vec<String>,
}

impl DigiMaps {
    /// Map every known digitizer in the data group
    pub fn new(data_group: &Group) -> Self {
        let mut collection = Self::default();
        for kind in DigiKind::ALL {
            let Some(group) = data_group.group(kind.name()) else {
                continue;
            };
            match DigiMap::build(kind, group) {
                Ok(map) => {
                    spdlog::debug!("Mapped digitizer {}", kind.name());
                    collection.maps.insert(kind.name().to_string(), map);
                }
                Err(e) => collection.warnings.push(format!(
                    "Mapping of digitizer '{}' failed: {e}",
                    kind.name()
                )),
            }
        }
        collection
    }

    /// The first mapped digitizer in order of preference
    pub fn main(&self) -> Option<&DigiMap> {
        DigiKind::ALL
            .iter()
            .find_map(|kind| self.maps.get(kind.name()))
    }

    pub fn get(&self, name: &str) -> Option<&DigiMap> {
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

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DigiMap)> {
        self.maps.iter()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
