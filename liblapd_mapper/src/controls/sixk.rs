//! Mapping of the 6K Compumotor probe drives.
//!
//! ```text
//! 6K Compumotor
//! |---- Motion list: <name>       - Motion list, Delta x, Delta y, Nx, Ny, ...
//! |---- Probe: XY[<r>]: <probe>   - Probe, Probe type, Receptacle, Port, ...
//! |---- XY[<r>]: <probe>(dset)    - Shot number, x, y, z, theta, phi, Motion list, Probe name
//! ```
//!
//! Every probe drive receptacle is its own configuration with its own dataset.
use std::collections::BTreeMap;

use super::template::{ControlConfig, StateValue};
use crate::constants::SHOT_NUMBER_FIELD;
use crate::dtype::DType;
use crate::error::MappingError;
use crate::mapping::{require_field, FieldMap};
use crate::node::{decode_attrs, Group, MetaValue};

pub const GROUP_NAME: &str = "6K Compumotor";
const MOTION_LIST_PREFIX: &str = "Motion list: ";
const RECEPTACLE_ATTR: &str = "Receptacle";
const STATE_FIELDS: [&str; 5] = ["x", "y", "z", "theta", "phi"];

/// Split a `Probe: XY[<r>]: <name>` group name into receptacle and probe name
fn parse_probe_group(name: &str) -> Option<(&str, &str)> {
    let (rnum, probe_name) = name.strip_prefix("Probe: XY[")?.split_once("]: ")?;
    if rnum.is_empty() || !rnum.chars().all(|c| c.is_ascii_digit()) || probe_name.is_empty() {
        return None;
    }
    Some((rnum, probe_name))
}

/// Name of the dataset a probe drive records into
pub fn dataset_name(receptacle: i64, probe_name: &str) -> String {
    format!("XY[{receptacle}]: {probe_name}")
}

pub fn build_configs(
    group: &Group,
    warnings: &mut Vec<String>,
) -> Result<BTreeMap<String, ControlConfig>, MappingError> {
    let device = group.name.as_str();

    let mut motion_lists = BTreeMap::new();
    for name in group.subgroup_names() {
        if let (Some(ml_name), Some(ml_group)) =
            (name.strip_prefix(MOTION_LIST_PREFIX), group.group(&name))
        {
            motion_lists.insert(ml_name.to_string(), MetaValue::Map(decode_attrs(&ml_group.attrs)));
        }
    }
    if motion_lists.is_empty() {
        warnings.push(format!("{device}: no motion lists found"));
    }

    let mut configs: BTreeMap<String, ControlConfig> = BTreeMap::new();
    for name in group.subgroup_names() {
        let Some((rnum, probe_name)) = parse_probe_group(&name) else {
            continue;
        };
        let Some(probe_group) = group.group(&name) else {
            continue;
        };
        let probe_name = probe_name.to_string();
        let receptacle = match probe_group.attr(RECEPTACLE_ATTR).and_then(|a| a.as_i64()) {
            Some(r) => r,
            None => match rnum.parse::<i64>() {
                Ok(r) => r,
                Err(_) => {
                    warnings.push(format!(
                        "{device}: '{name}' has no usable receptacle number, skipping"
                    ));
                    continue;
                }
            },
        };
        let key = receptacle.to_string();
        if configs.contains_key(&key) {
            warnings.push(format!(
                "{device}: receptacle {receptacle} is claimed by more than one probe, \
                 skipping '{name}'"
            ));
            continue;
        }

        let dset_name = dataset_name(receptacle, &probe_name);
        let Some(dset) = group.dataset(&dset_name) else {
            warnings.push(format!(
                "Dataset '{dset_name}' not found for control device '{device}', \
                 skipping probe '{probe_name}'"
            ));
            continue;
        };
        let shotnum_dtype = match require_field(device, dset, SHOT_NUMBER_FIELD) {
            Ok(dtype) => dtype,
            Err(e) => {
                warnings.push(format!("{e}, skipping probe '{probe_name}'"));
                continue;
            }
        };
        if let Some(missing) = STATE_FIELDS.iter().find(|f| !dset.dtype.has_field(f)) {
            warnings.push(format!(
                "Dataset '{}' is missing field '{missing}', skipping probe '{probe_name}'",
                dset.path
            ));
            continue;
        }

        let dset_paths = vec![dset.path.clone()];
        let mut probe = decode_attrs(&probe_group.attrs);
        probe.insert(String::from("probe name"), MetaValue::Str(probe_name.clone()));

        let mut meta = BTreeMap::new();
        meta.insert(String::from("receptacle"), MetaValue::Int(receptacle));
        meta.insert(String::from("probe"), MetaValue::Map(probe));
        meta.insert(String::from("motion lists"), MetaValue::Map(motion_lists.clone()));

        configs.insert(
            key,
            ControlConfig {
                dset_paths: dset_paths.clone(),
                config_column: None,
                shotnum: FieldMap::new(
                    dset_paths.clone(),
                    &[SHOT_NUMBER_FIELD],
                    shotnum_dtype.shape(),
                    DType::Int32,
                ),
                state_values: motion_state_values(&dset_paths, &["x", "y", "z"]),
                command_list: None,
                meta,
            },
        );
    }

    if configs.is_empty() {
        return Err(MappingError::NoConfigurations(device.to_string()));
    }
    Ok(configs)
}

/// Probe position and probe tip rotation. An empty field name marks an axis
/// the drive does not record.
pub fn motion_state_values(
    dset_paths: &[String],
    xyz_fields: &[&str],
) -> BTreeMap<String, StateValue> {
    BTreeMap::from([
        (
            String::from("xyz"),
            StateValue::from_fields(dset_paths.to_vec(), xyz_fields, vec![3], DType::Float64),
        ),
        (
            String::from("ptip_rot_theta"),
            StateValue::from_fields(dset_paths.to_vec(), &["theta"], vec![], DType::Float64),
        ),
        (
            String::from("ptip_rot_phi"),
            StateValue::from_fields(dset_paths.to_vec(), &["phi"], vec![], DType::Float64),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::super::template::{ConType, ControlKind, ControlMap};
    use super::*;
    use crate::node::AttrValue;

    fn probe_dtype() -> DType {
        DType::compound(&[
            ("Shot number", DType::UInt32),
            ("x", DType::Float64),
            ("y", DType::Float64),
            ("z", DType::Float64),
            ("theta", DType::Float64),
            ("phi", DType::Float64),
            ("Motion list", DType::FixedAscii(120)),
            ("Probe name", DType::FixedAscii(120)),
        ])
    }

    fn add_probe(group: &mut Group, receptacle: i64, probe: &str) {
        group
            .add_group(&format!("Probe: XY[{receptacle}]: {probe}"))
            .set_attr("Probe", AttrValue::bytes(probe))
            .set_attr("Probe type", AttrValue::bytes("LaPD probe"))
            .set_attr("Receptacle", receptacle)
            .set_attr("Port", 27);
        group.add_dataset(&dataset_name(receptacle, probe), &[50], probe_dtype());
    }

    fn sixk_group() -> Group {
        let mut group = Group::new(GROUP_NAME, "/Raw data + config/6K Compumotor");
        group
            .add_group("Motion list: ml-0001")
            .set_attr("Motion list", AttrValue::bytes("ml-0001"))
            .set_attr("Delta x", 1.0)
            .set_attr("Nx", 11);
        add_probe(&mut group, 1, "Langmuir1");
        add_probe(&mut group, 3, "Bdot2");
        group
    }

    #[test]
    fn test_receptacle_configs() {
        let map = ControlMap::build(ControlKind::SixK, &sixk_group()).unwrap();
        assert_eq!(map.contype(), ConType::Motion);
        assert!(map.one_config_per_dset());
        assert!(!map.has_command_list());
        assert_eq!(map.configs().len(), 2);

        let config = map.config("3").unwrap();
        assert_eq!(
            config.dset_paths,
            vec!["/Raw data + config/6K Compumotor/XY[3]: Bdot2"]
        );
        assert_eq!(config.meta["receptacle"], MetaValue::Int(3));
        let MetaValue::Map(probe) = &config.meta["probe"] else {
            panic!("probe meta should be a map");
        };
        assert_eq!(probe["probe name"], MetaValue::Str(String::from("Bdot2")));
        let MetaValue::Map(mls) = &config.meta["motion lists"] else {
            panic!("motion list meta should be a map");
        };
        assert!(mls.contains_key("ml-0001"));

        let xyz = &config.state_values["xyz"];
        assert_eq!(xyz.dset_field, vec!["x", "y", "z"]);
        assert_eq!(xyz.shape, vec![3]);
        assert_eq!(config.state_values["ptip_rot_phi"].dset_field, vec!["phi"]);
        assert_eq!(map.construct_dataset_name("3").unwrap(), "XY[3]: Bdot2");
        assert!(map.clparse("3").is_err());
    }

    #[test]
    fn test_missing_dataset_is_skipped() {
        let mut group = sixk_group();
        group.remove(&dataset_name(1, "Langmuir1"));
        let map = ControlMap::build(ControlKind::SixK, &group).unwrap();
        assert_eq!(map.configs().len(), 1);
        assert!(map.warnings().iter().any(|w| w.contains("Langmuir1")));
    }

    #[test]
    fn test_no_receptacles_fails() {
        let mut group = sixk_group();
        group.remove("Probe: XY[1]: Langmuir1");
        group.remove("Probe: XY[3]: Bdot2");
        assert!(matches!(
            ControlMap::build(ControlKind::SixK, &group),
            Err(MappingError::NoConfigurations(_))
        ));
    }
}
