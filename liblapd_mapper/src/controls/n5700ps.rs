//! Mapping of the N5700 power supply.
//!
//! ```text
//! N5700_PS
//! |---- <configuration> - IP address, Model Number, Initialization commands,
//! |                       N5700 power supply command list
//! |---- Run time list(dset)
//! ```
use std::collections::BTreeMap;

use super::cl_template::{build_cl_configs, ClDeviceLayout};
use super::template::ControlConfig;
use crate::constants::CL_VALUE_PATTERN;
use crate::error::MappingError;
use crate::node::Group;

pub const GROUP_NAME: &str = "N5700_PS";

const LAYOUT: ClDeviceLayout = ClDeviceLayout {
    attr_pairs: &[
        ("IP address", "IP address"),
        ("power supply device", "Model Number"),
        ("initial state", "Initialization commands"),
    ],
    command_list_attr: "N5700 power supply command list",
};

/// Output voltage set by `SOURCE:VOLTAGE:LEVEL <value>`
pub fn cl_patterns() -> Vec<String> {
    vec![format!(
        r"(?P<VOLT>(\bSOURCE:VOLTAGE:LEVEL\s){CL_VALUE_PATTERN})"
    )]
}

pub fn build_configs(
    group: &Group,
    warnings: &mut Vec<String>,
) -> Result<BTreeMap<String, ControlConfig>, MappingError> {
    build_cl_configs(group, &LAYOUT, &cl_patterns(), warnings)
}

#[cfg(test)]
mod tests {
    use super::super::template::{ControlKind, ControlMap};
    use super::*;
    use crate::clparse::CommandValues;
    use crate::dtype::DType;
    use crate::node::{AttrValue, MetaValue};

    fn run_time_list_dtype() -> DType {
        DType::compound(&[
            ("Shot number", DType::Int32),
            ("Configuration name", DType::FixedAscii(120)),
            ("Command index", DType::Int32),
        ])
    }

    fn n5700_group(command_list: &str) -> Group {
        let mut root = Group::root();
        let data = root.add_group("Raw data + config");
        let n5700 = data.add_group(GROUP_NAME);
        n5700
            .add_group("config01")
            .set_attr("IP address", AttrValue::bytes("192.168.7.3"))
            .set_attr("Model Number", AttrValue::bytes("N5751A"))
            .set_attr("Initialization commands", AttrValue::bytes("*RST"))
            .set_attr(
                "N5700 power supply command list",
                AttrValue::bytes(command_list),
            );
        n5700.add_dataset("Run time list", &[10], run_time_list_dtype());
        n5700.clone()
    }

    #[test]
    fn test_voltage_state_values() {
        let group = n5700_group(
            "SOURCE:VOLTAGE:LEVEL 10.0\nSOURCE:VOLTAGE:LEVEL 20.0\nSOURCE:VOLTAGE:LEVEL 30.0",
        );
        let map = ControlMap::build(ControlKind::N5700Ps, &group).unwrap();
        assert_eq!(map.info().contype.to_string(), "power");
        assert!(map.has_command_list());
        assert!(!map.one_config_per_dset());

        let config = map.config("config01").unwrap();
        assert_eq!(config.dset_paths, vec!["/Raw data + config/N5700_PS/Run time list"]);
        assert_eq!(config.config_column.as_deref(), Some("Configuration name"));
        assert_eq!(config.shotnum.dset_field, vec!["Shot number"]);
        assert_eq!(config.shotnum.dtype, DType::Int32);
        assert!(config.shotnum.shape.is_empty());
        assert_eq!(
            config.meta["power supply device"],
            MetaValue::Str(String::from("N5751A"))
        );

        let volt = &config.state_values["volt"];
        assert_eq!(volt.dset_field, vec!["Command index"]);
        assert_eq!(
            volt.command_list,
            Some(CommandValues::Float(vec![10.0, 20.0, 30.0]))
        );
        assert_eq!(volt.dtype, DType::Float64);
        assert!(map.warnings().is_empty());
    }

    #[test]
    fn test_default_state_values_on_unparsable_list() {
        let group = n5700_group("SOURCE:VOLTAGE:LEVEL 10.0\nOUTPUT ON");
        let map = ControlMap::build(ControlKind::N5700Ps, &group).unwrap();
        let config = map.config("config01").unwrap();
        assert_eq!(config.state_values.len(), 1);
        let command = &config.state_values["command"];
        assert!(command.re_pattern.is_none());
        assert_eq!(
            command.cl_str.as_deref(),
            Some(
                &[
                    String::from("SOURCE:VOLTAGE:LEVEL 10.0"),
                    String::from("OUTPUT ON")
                ][..]
            )
        );
        assert_eq!(command.dtype, DType::FixedUnicode(25));
    }

    #[test]
    fn test_missing_optional_attribute_warns() {
        let mut group = n5700_group("SOURCE:VOLTAGE:LEVEL 10.0");
        group.add_group("config01").remove_attr("Model Number");
        let map = ControlMap::build(ControlKind::N5700Ps, &group).unwrap();
        assert_eq!(map.warnings().len(), 1);
        assert!(map.warnings()[0].contains("Model Number"));
        assert_eq!(map.config("config01").unwrap().meta["power supply device"], MetaValue::Null);
    }

    #[test]
    fn test_build_failures() {
        let mut group = n5700_group("SOURCE:VOLTAGE:LEVEL 10.0");
        group
            .add_group("config01")
            .remove_attr("N5700 power supply command list");
        assert!(matches!(
            ControlMap::build(ControlKind::N5700Ps, &group),
            Err(MappingError::MissingAttribute { .. })
        ));

        let mut group = n5700_group("SOURCE:VOLTAGE:LEVEL 10.0");
        group.remove("Run time list");
        assert!(matches!(
            ControlMap::build(ControlKind::N5700Ps, &group),
            Err(MappingError::MissingDataset { .. })
        ));

        let mut group = n5700_group("SOURCE:VOLTAGE:LEVEL 10.0");
        group.remove("config01");
        assert!(matches!(
            ControlMap::build(ControlKind::N5700Ps, &group),
            Err(MappingError::NoConfigurations(_))
        ));
    }

    #[test]
    fn test_custom_and_reset_state_values() {
        let group = n5700_group("SOURCE:VOLTAGE:LEVEL 10.0;SOURCE:CURRENT:LEVEL 1.5");
        let mut map = ControlMap::build(ControlKind::N5700Ps, &group).unwrap();
        let curr = r"(?P<CURR>(\bSOURCE:CURRENT:LEVEL\s)(?P<VAL>(\d+\.\d*|\.\d+|\d+\b)))";
        let patterns = vec![cl_patterns()[0].clone(), curr.to_string()];

        map.set_state_values_config("config01", &patterns).unwrap();
        let config = map.config("config01").unwrap();
        assert_eq!(config.state_values.len(), 2);
        assert_eq!(
            config.state_values["curr"].command_list,
            Some(CommandValues::Float(vec![1.5]))
        );

        assert!(map.set_state_values_config("config01", &["(bad"]).is_err());
        assert_eq!(map.config("config01").unwrap().state_values.len(), 2);
        assert!(matches!(
            map.set_state_values_config("nope", &patterns),
            Err(MappingError::UnknownConfig { .. })
        ));

        map.reset_state_values_config("config01", false).unwrap();
        assert!(map.config("config01").unwrap().state_values.contains_key("command"));
        map.reset_state_values_config("config01", true).unwrap();
        assert!(map.config("config01").unwrap().state_values.contains_key("volt"));
    }

    #[test]
    fn test_clparse_and_dataset_name() {
        let group = n5700_group("SOURCE:VOLTAGE:LEVEL 10.0");
        let map = ControlMap::build(ControlKind::N5700Ps, &group).unwrap();
        let cl = map.clparse("config01").unwrap();
        assert_eq!(cl.command_list(), &[String::from("SOURCE:VOLTAGE:LEVEL 10.0")]);
        assert_eq!(map.construct_dataset_name("config01").unwrap(), "Run time list");
    }
}
