//! Shared mapping for control devices driven by a command list.
//!
//! Layout of such a device group:
//!
//! ```text
//! <device>
//! |---- <configuration>   - IP address, <device specific attrs>, <command list attr>
//! |---- ...
//! |---- Run time list(dset) - Shot number, Configuration name, Command index, ...
//! ```
use std::collections::BTreeMap;

use super::template::{ControlConfig, StateValue};
use crate::clparse::{split_command_list, text_dtype, ClParse, CommandValues};
use crate::constants::{COMMAND_INDEX_FIELD, CONFIG_NAME_FIELD, RUN_TIME_LIST, SHOT_NUMBER_FIELD};
use crate::dtype::DType;
use crate::error::MappingError;
use crate::mapping::{require_field, FieldMap};
use crate::node::{Group, MetaValue};

/// State name used when no pattern could be applied to a command list
pub const DEFAULT_STATE_NAME: &str = "command";

/// Attribute naming of one command list device
pub struct ClDeviceLayout {
    /// (config key, attribute name) pairs that are nice to have
    pub attr_pairs: &'static [(&'static str, &'static str)],
    /// Attribute holding the newline separated command list
    pub command_list_attr: &'static str,
}

/// Build the configurations of a command list device. Every subgroup is a
/// configuration and all of them share the `Run time list` dataset.
pub fn build_cl_configs(
    group: &Group,
    layout: &ClDeviceLayout,
    patterns: &[String],
    warnings: &mut Vec<String>,
) -> Result<BTreeMap<String, ControlConfig>, MappingError> {
    let device = group.name.as_str();
    let config_names = group.subgroup_names();
    if config_names.is_empty() {
        return Err(MappingError::NoConfigurations(device.to_string()));
    }

    let dset = group
        .dataset(RUN_TIME_LIST)
        .ok_or_else(|| MappingError::MissingDataset {
            device: device.to_string(),
            dataset: RUN_TIME_LIST.to_string(),
        })?;
    let shotnum_dtype = require_field(device, dset, SHOT_NUMBER_FIELD)?;
    require_field(device, dset, COMMAND_INDEX_FIELD)?;
    let config_column = dset
        .dtype
        .has_field(CONFIG_NAME_FIELD)
        .then(|| CONFIG_NAME_FIELD.to_string());

    let mut configs = BTreeMap::new();
    for name in config_names.iter() {
        let Some(config_group) = group.group(name) else {
            continue;
        };

        let mut meta = BTreeMap::new();
        for (key, attr) in layout.attr_pairs.iter() {
            match config_group.attr(attr) {
                Some(value) => {
                    meta.insert(key.to_string(), value.to_meta());
                }
                None => {
                    meta.insert(key.to_string(), MetaValue::Null);
                    warnings.push(format!(
                        "Attribute '{attr}' not found in control device '{device}' \
                         configuration group '{name}', continuing with mapping"
                    ));
                }
            }
        }

        let command_list = config_group
            .attr(layout.command_list_attr)
            .ok_or_else(|| MappingError::MissingAttribute {
                device: device.to_string(),
                group: name.clone(),
                attr: layout.command_list_attr.to_string(),
            })?
            .as_string()
            .ok_or_else(|| MappingError::BadAttribute {
                device: device.to_string(),
                group: name.clone(),
                attr: layout.command_list_attr.to_string(),
            })?;

        let mut config = ControlConfig {
            dset_paths: vec![dset.path.clone()],
            config_column: config_column.clone(),
            shotnum: FieldMap::new(
                vec![dset.path.clone()],
                &[SHOT_NUMBER_FIELD],
                shotnum_dtype.shape(),
                DType::Int32,
            ),
            state_values: BTreeMap::new(),
            command_list: Some(split_command_list(&command_list)),
            meta,
        };
        config.state_values = state_values_or_default(device, &config, patterns);
        configs.insert(name.clone(), config);
    }

    Ok(configs)
}

/// State values parsed from the configuration's command list
pub fn parsed_state_values<S: AsRef<str>>(
    device: &str,
    config: &ControlConfig,
    patterns: &[S],
) -> Result<BTreeMap<String, StateValue>, MappingError> {
    let command_list = config
        .command_list
        .as_ref()
        .ok_or_else(|| MappingError::NoCommandList(device.to_string()))?;
    let states = ClParse::new(command_list).apply_patterns(patterns)?;
    Ok(states
        .into_iter()
        .map(|(name, state)| {
            let dtype = state.dtype();
            let value = StateValue {
                dset_paths: config.dset_paths.clone(),
                dset_field: vec![COMMAND_INDEX_FIELD.to_string()],
                re_pattern: Some(state.re_pattern),
                command_list: Some(state.command_list),
                cl_str: Some(state.cl_str),
                shape: vec![],
                dtype,
            };
            (name, value)
        })
        .collect())
}

/// The fallback state value: the raw command strings under `command`
pub fn default_state_values(config: &ControlConfig) -> BTreeMap<String, StateValue> {
    let command_list = config.command_list.clone().unwrap_or_default();
    let value = StateValue {
        dset_paths: config.dset_paths.clone(),
        dset_field: vec![COMMAND_INDEX_FIELD.to_string()],
        re_pattern: None,
        dtype: text_dtype(&command_list),
        command_list: Some(CommandValues::Text(command_list.clone())),
        cl_str: Some(command_list),
        shape: vec![],
    };
    BTreeMap::from([(DEFAULT_STATE_NAME.to_string(), value)])
}

/// Parsed state values when the patterns work on this command list,
/// otherwise the default
pub fn state_values_or_default<S: AsRef<str>>(
    device: &str,
    config: &ControlConfig,
    patterns: &[S],
) -> BTreeMap<String, StateValue> {
    match parsed_state_values(device, config, patterns) {
        Ok(state_values) if !state_values.is_empty() => state_values,
        Ok(_) => default_state_values(config),
        Err(e) => {
            spdlog::debug!("{device}: using default state values ({e})");
            default_state_values(config)
        }
    }
}
