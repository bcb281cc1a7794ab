//! Mapping of the NI_XZ and NI_XYZ probe drives.
//!
//! ```text
//! NI_XZ (or NI_XYZ)
//! |---- <motion list>   - probe_name, motion_list, x0, z0, dx, dz, nx, nz, ...
//! |---- Run time list(dset) - Shot number, x, [y,] z, theta, phi, motion_list, probe_name
//! ```
//!
//! All probes record into the shared `Run time list`; rows are told apart by
//! the `probe_name` field, so configurations are keyed by probe name.
use std::collections::BTreeMap;

use super::sixk::motion_state_values;
use super::template::ControlConfig;
use crate::constants::{RUN_TIME_LIST, SHOT_NUMBER_FIELD};
use crate::dtype::DType;
use crate::error::MappingError;
use crate::mapping::{require_field, FieldMap};
use crate::node::{decode_attrs, Group, MetaValue};

pub const NI_XZ_GROUP_NAME: &str = "NI_XZ";
pub const NI_XYZ_GROUP_NAME: &str = "NI_XYZ";
const PROBE_NAME_ATTR: &str = "probe_name";
const PROBE_NAME_FIELD: &str = "probe_name";

/// Which axes a drive records
pub struct DriveAxes {
    /// Field names backing the `xyz` state value
    pub xyz_fields: [&'static str; 3],
}

pub const NI_XZ: DriveAxes = DriveAxes {
    xyz_fields: ["x", "", "z"],
};

pub const NI_XYZ: DriveAxes = DriveAxes {
    xyz_fields: ["x", "y", "z"],
};

pub fn build_configs(
    group: &Group,
    axes: &DriveAxes,
    warnings: &mut Vec<String>,
) -> Result<BTreeMap<String, ControlConfig>, MappingError> {
    let device = group.name.as_str();
    let dset = group
        .dataset(RUN_TIME_LIST)
        .ok_or_else(|| MappingError::MissingDataset {
            device: device.to_string(),
            dataset: RUN_TIME_LIST.to_string(),
        })?;
    let shotnum_dtype = require_field(device, dset, SHOT_NUMBER_FIELD)?;
    for field in axes
        .xyz_fields
        .iter()
        .filter(|f| !f.is_empty())
        .chain(["theta", "phi", PROBE_NAME_FIELD].iter())
    {
        require_field(device, dset, field)?;
    }

    // motion lists grouped by the probe that runs them
    let mut probes: BTreeMap<String, BTreeMap<String, MetaValue>> = BTreeMap::new();
    for name in group.subgroup_names() {
        let Some(ml_group) = group.group(&name) else {
            continue;
        };
        match ml_group.attr(PROBE_NAME_ATTR).and_then(|a| a.as_string()) {
            Some(probe) => {
                probes
                    .entry(probe)
                    .or_default()
                    .insert(name.clone(), MetaValue::Map(decode_attrs(&ml_group.attrs)));
            }
            None => warnings.push(format!(
                "{device}: motion list '{name}' has no '{PROBE_NAME_ATTR}' attribute, skipping"
            )),
        }
    }
    if probes.is_empty() {
        return Err(MappingError::NoConfigurations(device.to_string()));
    }

    let dset_paths = vec![dset.path.clone()];
    let configs = probes
        .into_iter()
        .map(|(probe, motion_lists)| {
            let mut meta = BTreeMap::new();
            meta.insert(
                String::from("probe"),
                MetaValue::Map(BTreeMap::from([(
                    String::from("probe name"),
                    MetaValue::Str(probe.clone()),
                )])),
            );
            meta.insert(String::from("motion lists"), MetaValue::Map(motion_lists));
            let config = ControlConfig {
                dset_paths: dset_paths.clone(),
                config_column: Some(PROBE_NAME_FIELD.to_string()),
                shotnum: FieldMap::new(
                    dset_paths.clone(),
                    &[SHOT_NUMBER_FIELD],
                    shotnum_dtype.shape(),
                    DType::Int32,
                ),
                state_values: motion_state_values(&dset_paths, &axes.xyz_fields),
                command_list: None,
                meta,
            };
            (probe, config)
        })
        .collect();
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::super::template::{ControlKind, ControlMap};
    use super::*;
    use crate::node::AttrValue;

    fn drive_group(name: &str, with_y: bool) -> Group {
        let mut group = Group::new(name, &format!("/Raw data + config/{name}"));
        for (ml, probe) in [("ml-0001", "P31"), ("ml-0002", "P31"), ("ml-0003", "P22")] {
            group
                .add_group(ml)
                .set_attr("probe_name", AttrValue::bytes(probe))
                .set_attr("motion_list", AttrValue::bytes(ml))
                .set_attr("dx", 0.5)
                .set_attr("nx", 21);
        }
        let mut fields = vec![("Shot number", DType::Int32), ("x", DType::Float64)];
        if with_y {
            fields.push(("y", DType::Float64));
        }
        fields.extend([
            ("z", DType::Float64),
            ("theta", DType::Float64),
            ("phi", DType::Float64),
            ("motion_list", DType::FixedAscii(120)),
            ("probe_name", DType::FixedAscii(120)),
        ]);
        group.add_dataset("Run time list", &[300], DType::compound(&fields));
        group
    }

    #[test]
    fn test_configs_by_drive_name() {
        let map = ControlMap::build(ControlKind::NiXz, &drive_group("NI_XZ", false)).unwrap();
        assert_eq!(map.configs().len(), 2);
        let p31 = map.config("P31").unwrap();
        assert_eq!(p31.config_column.as_deref(), Some("probe_name"));
        assert_eq!(p31.state_values["xyz"].dset_field, vec!["x", "", "z"]);
        let MetaValue::Map(mls) = &p31.meta["motion lists"] else {
            panic!("motion lists should be a map");
        };
        assert_eq!(mls.len(), 2);
        assert_eq!(map.construct_dataset_name("P22").unwrap(), "Run time list");
    }

    #[test]
    fn test_xyz_drive_needs_y() {
        let map = ControlMap::build(ControlKind::NiXyz, &drive_group("NI_XYZ", true)).unwrap();
        assert_eq!(
            map.config("P22").unwrap().state_values["xyz"].dset_field,
            vec!["x", "y", "z"]
        );
        assert!(matches!(
            ControlMap::build(ControlKind::NiXyz, &drive_group("NI_XYZ", false)),
            Err(MappingError::MissingField { field, .. }) if field == "y"
        ));
    }

    #[test]
    fn test_motion_list_without_drive_name() {
        let mut group = drive_group("NI_XZ", false);
        group.add_group("ml-0004").set_attr("dx", 1.0);
        let map = ControlMap::build(ControlKind::NiXz, &group).unwrap();
        assert_eq!(map.configs().len(), 2);
        assert_eq!(map.warnings().len(), 1);
    }
}
