use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::constants::{DATA_GROUP_NAME, LAPD_VERSION_ATTR, MSI_GROUP_NAME};
use super::controls::ControlMaps;
use super::digitizers::{DigiMap, DigiMaps};
use super::error::MapError;
use super::msi::MsiMaps;
use super::node::{decode_attrs, Group, MetaValue};

/// Information about the data run, taken from the data group attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunInfo {
    #[serde(rename = "run name")]
    pub run_name: String,
    #[serde(rename = "run description")]
    pub run_description: String,
    #[serde(rename = "run status")]
    pub run_status: String,
    #[serde(rename = "run date")]
    pub run_date: String,
}

/// Information about the experiment, taken from the data group attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpInfo {
    pub investigator: String,
    #[serde(rename = "exp name")]
    pub exp_name: String,
    #[serde(rename = "exp description")]
    pub exp_description: String,
    #[serde(rename = "exp set name")]
    pub exp_set_name: String,
    #[serde(rename = "exp set description")]
    pub exp_set_description: String,
}

/// # HdfMap
/// The map of a LaPD HDF5 file. Walks the MSI and data groups, maps every
/// known diagnostic, digitizer and control device, and records whatever it
/// could not map as unknowns.
///
/// The map is built from an in-memory metadata tree (see [`crate::node`]);
/// nothing here touches the bulk data.
#[derive(Debug, Clone)]
pub struct HdfMap {
    file_name: String,
    version: String,
    has_msi_group: bool,
    has_data_group: bool,
    attrs: BTreeMap<String, BTreeMap<String, MetaValue>>,
    msi: MsiMaps,
    digitizers: DigiMaps,
    controls: ControlMaps,
    unknowns: Vec<String>,
    warnings: Vec<String>,
}

impl HdfMap {
    /// Map the file whose root group is `root`. With `silent` the mapping
    /// warnings are kept but not logged.
    pub fn new(root: &Group, silent: bool) -> Result<Self, MapError> {
        let file_name = root.file_name.clone().unwrap_or_default();
        let version = root
            .attr(LAPD_VERSION_ATTR)
            .ok_or_else(|| MapError::NotLapd(file_name.clone()))?
            .as_string()
            .unwrap_or_default();

        let mut warnings = Vec::new();
        let msi_group = root.group(MSI_GROUP_NAME);
        let data_group = root.group(DATA_GROUP_NAME);
        for (name, found) in [
            (MSI_GROUP_NAME, msi_group.is_some()),
            (DATA_GROUP_NAME, data_group.is_some()),
        ] {
            if !found {
                warnings.push(format!("No {name} group found in {file_name}"));
            }
        }

        let mut attrs = BTreeMap::new();
        attrs.insert(
            MSI_GROUP_NAME.to_string(),
            msi_group.map(|g| decode_attrs(&g.attrs)).unwrap_or_default(),
        );
        attrs.insert(
            DATA_GROUP_NAME.to_string(),
            data_group.map(|g| decode_attrs(&g.attrs)).unwrap_or_default(),
        );

        let msi = msi_group.map(MsiMaps::new).unwrap_or_default();
        let digitizers = data_group.map(DigiMaps::new).unwrap_or_default();
        let controls = data_group.map(ControlMaps::new).unwrap_or_default();

        warnings.extend(msi.warnings().iter().cloned());
        warnings.extend(msi.iter().flat_map(|(_, m)| m.warnings().iter().cloned()));
        warnings.extend(digitizers.warnings().iter().cloned());
        warnings.extend(digitizers.iter().flat_map(|(_, m)| m.warnings().iter().cloned()));
        warnings.extend(controls.warnings().iter().cloned());
        warnings.extend(controls.iter().flat_map(|(_, m)| m.warnings().iter().cloned()));
        if !silent {
            for warning in warnings.iter() {
                spdlog::warn!("{warning}");
            }
        }

        let mut unknowns: Vec<String> = root
            .members()
            .into_iter()
            .filter(|node| {
                let path = node.path();
                path != msi_group.map_or("", |g| g.path.as_str())
                    && path != data_group.map_or("", |g| g.path.as_str())
            })
            .map(|node| node.path().to_string())
            .collect();
        if let Some(group) = msi_group {
            unknowns.extend(
                group
                    .member_names()
                    .into_iter()
                    .filter(|name| !msi.contains(name))
                    .filter_map(|name| group.member(&name).map(|n| n.path().to_string())),
            );
        }
        if let Some(group) = data_group {
            unknowns.extend(
                group
                    .member_names()
                    .into_iter()
                    .filter(|name| !digitizers.contains(name) && !controls.contains(name))
                    .filter_map(|name| group.member(&name).map(|n| n.path().to_string())),
            );
        }

        spdlog::info!(
            "Mapped {}: {} MSI diagnostic(s), {} digitizer(s), {} control device(s), {} unknown(s)",
            file_name,
            msi.len(),
            digitizers.len(),
            controls.len(),
            unknowns.len()
        );

        Ok(Self {
            file_name,
            version,
            has_msi_group: msi_group.is_some(),
            has_data_group: data_group.is_some(),
            attrs,
            msi,
            digitizers,
            controls,
            unknowns,
            warnings,
        })
    }

    /// A root group is LaPD generated when it carries the software version
    pub fn is_lapd_hdf(root: &Group) -> bool {
        root.attr(LAPD_VERSION_ATTR).is_some()
    }

    pub fn hdf_version(&self) -> &str {
        &self.version
    }

    pub fn filename(&self) -> &str {
        &self.file_name
    }

    /// Decoded attributes of the MSI and data groups, keyed by group name
    pub fn attrs(&self) -> &BTreeMap<String, BTreeMap<String, MetaValue>> {
        &self.attrs
    }

    pub fn has_msi_group(&self) -> bool {
        self.has_msi_group
    }

    pub fn has_data_group(&self) -> bool {
        self.has_data_group
    }

    /// `Data run sequence` groups are not mapped yet
    pub fn has_data_run_sequence(&self) -> bool {
        false
    }

    pub fn has_msi_diagnostics(&self) -> bool {
        !self.msi.is_empty()
    }

    pub fn has_digitizers(&self) -> bool {
        !self.digitizers.is_empty()
    }

    pub fn has_controls(&self) -> bool {
        !self.controls.is_empty()
    }

    pub fn has_unknowns(&self) -> bool {
        !self.unknowns.is_empty()
    }

    pub fn msi(&self) -> &MsiMaps {
        &self.msi
    }

    pub fn digitizers(&self) -> &DigiMaps {
        &self.digitizers
    }

    pub fn controls(&self) -> &ControlMaps {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut ControlMaps {
        &mut self.controls
    }

    /// Absolute paths of every member that could not be mapped
    pub fn unknowns(&self) -> &[String] {
        &self.unknowns
    }

    /// Every warning raised while mapping
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn main_digitizer(&self) -> Option<&DigiMap> {
        self.digitizers.main()
    }

    fn data_attr(&self, name: &str) -> String {
        self.attrs
            .get(DATA_GROUP_NAME)
            .and_then(|attrs| attrs.get(name))
            .map(meta_to_string)
            .unwrap_or_default()
    }

    pub fn run_info(&self) -> RunInfo {
        RunInfo {
            run_name: self.data_attr("Data run"),
            run_description: self.data_attr("Description"),
            run_status: self.data_attr("Status"),
            run_date: self.data_attr("Status date"),
        }
    }

    pub fn exp_info(&self) -> ExpInfo {
        ExpInfo {
            investigator: self.data_attr("Investigator"),
            exp_name: self.data_attr("Experiment name"),
            exp_description: self.data_attr("Experiment description"),
            exp_set_name: self.data_attr("Experiment set name"),
            exp_set_description: self.data_attr("Experiment set description"),
        }
    }
}

fn meta_to_string(value: &MetaValue) -> String {
    match value {
        MetaValue::Str(s) => s.clone(),
        MetaValue::Null => String::new(),
        MetaValue::Bool(b) => b.to_string(),
        MetaValue::Int(v) => v.to_string(),
        MetaValue::Float(v) => v.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl fmt::Display for HdfMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = Path::new(&self.file_name)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        write!(f, "<HdfMap of HDF5 file '{name}'>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use crate::node::AttrValue;

    fn lapd_root() -> Group {
        let mut root = Group::root().with_file_name("/data/lapd/run_test.hdf5");
        root.set_attr(LAPD_VERSION_ATTR, AttrValue::bytes("1.2"));
        let data = root.add_group(DATA_GROUP_NAME);
        data.set_attr("Data run", AttrValue::bytes("run_test"))
            .set_attr("Investigator", AttrValue::bytes("Everson"))
            .set_attr("Status", AttrValue::bytes("Started"));
        data.add_group("Mystery device");
        root.add_group(MSI_GROUP_NAME).add_group("Heater").add_dataset(
            "Heater summary",
            &[5],
            DType::compound(&[("Shot number", DType::Int32)]),
        );
        root.add_dataset("Stray dataset", &[1], DType::Int8);
        root
    }

    #[test]
    fn test_not_lapd() {
        let root = Group::root().with_file_name("other.h5");
        assert!(!HdfMap::is_lapd_hdf(&root));
        assert!(matches!(
            HdfMap::new(&root, true),
            Err(MapError::NotLapd(name)) if name == "other.h5"
        ));
    }

    #[test]
    fn test_map_queries() {
        let map = HdfMap::new(&lapd_root(), true).unwrap();
        assert_eq!(map.hdf_version(), "1.2");
        assert!(map.has_msi_group());
        assert!(map.has_data_group());
        assert!(!map.has_data_run_sequence());
        assert!(map.has_msi_diagnostics());
        assert!(!map.has_digitizers());
        assert!(!map.has_controls());
        assert!(map.main_digitizer().is_none());
        assert_eq!(
            map.unknowns(),
            &[
                String::from("/Stray dataset"),
                String::from("/Raw data + config/Mystery device")
            ]
        );

        let run = map.run_info();
        assert_eq!(run.run_name, "run_test");
        assert_eq!(run.run_status, "Started");
        assert_eq!(run.run_date, "");
        assert_eq!(map.exp_info().investigator, "Everson");
        assert_eq!(
            map.attrs()[DATA_GROUP_NAME]["Data run"],
            MetaValue::Str(String::from("run_test"))
        );
        assert_eq!(map.to_string(), "<HdfMap of HDF5 file 'run_test.hdf5'>");
    }

    #[test]
    fn test_missing_groups_warn() {
        let mut root = Group::root();
        root.set_attr(LAPD_VERSION_ATTR, "1.1");
        let map = HdfMap::new(&root, true).unwrap();
        assert!(!map.has_msi_group());
        assert!(!map.has_data_group());
        assert_eq!(map.warnings().len(), 2);
        assert!(map.attrs()[MSI_GROUP_NAME].is_empty());
    }
}
