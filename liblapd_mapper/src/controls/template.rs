use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::clparse::{ClParse, CommandValues};
use crate::constants::RUN_TIME_LIST;
use crate::dtype::DType;
use crate::error::MappingError;
use crate::mapping::FieldMap;
use crate::node::{Group, MetaValue};
use super::{cl_template, n5700ps, nixyz, sixk, waveform};

/// What a control device physically controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConType {
    Motion,
    Power,
    Waveform,
}

impl fmt::Display for ConType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConType::Motion => write!(f, "motion"),
            ConType::Power => write!(f, "power"),
            ConType::Waveform => write!(f, "waveform"),
        }
    }
}

/// The control devices this crate knows how to map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    SixK,
    N5700Ps,
    NiXyz,
    NiXz,
    Waveform,
}

impl ControlKind {
    pub const ALL: [ControlKind; 5] = [
        ControlKind::SixK,
        ControlKind::N5700Ps,
        ControlKind::NiXyz,
        ControlKind::NiXz,
        ControlKind::Waveform,
    ];

    /// Group name the LaPD DAQ gives this device
    pub fn name(&self) -> &'static str {
        match self {
            ControlKind::SixK => sixk::GROUP_NAME,
            ControlKind::N5700Ps => n5700ps::GROUP_NAME,
            ControlKind::NiXyz => nixyz::NI_XYZ_GROUP_NAME,
            ControlKind::NiXz => nixyz::NI_XZ_GROUP_NAME,
            ControlKind::Waveform => waveform::GROUP_NAME,
        }
    }

    pub fn contype(&self) -> ConType {
        match self {
            ControlKind::SixK | ControlKind::NiXyz | ControlKind::NiXz => ConType::Motion,
            ControlKind::N5700Ps => ConType::Power,
            ControlKind::Waveform => ConType::Waveform,
        }
    }

    pub fn has_command_list(&self) -> bool {
        matches!(self, ControlKind::N5700Ps | ControlKind::Waveform)
    }

    /// Whether every configuration records into its own dataset
    pub fn one_config_per_dset(&self) -> bool {
        matches!(self, ControlKind::SixK)
    }

    /// Built-in command list patterns
    pub fn cl_patterns(&self) -> Vec<String> {
        match self {
            ControlKind::N5700Ps => n5700ps::cl_patterns(),
            ControlKind::Waveform => waveform::cl_patterns(),
            _ => vec![],
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlInfo {
    #[serde(rename = "group name")]
    pub group_name: String,
    #[serde(rename = "group path")]
    pub group_path: String,
    pub contype: ConType,
}

/// A state value of a control configuration (probe position, output voltage, ...).
///
/// The command list members are only present for command list devices, where
/// the recorded `Command index` selects an entry of `command_list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateValue {
    #[serde(rename = "dset paths")]
    pub dset_paths: Vec<String>,
    #[serde(rename = "dset field")]
    pub dset_field: Vec<String>,
    #[serde(rename = "re pattern", skip_serializing_if = "Option::is_none")]
    pub re_pattern: Option<String>,
    #[serde(rename = "command list", skip_serializing_if = "Option::is_none")]
    pub command_list: Option<CommandValues>,
    #[serde(rename = "cl str", skip_serializing_if = "Option::is_none")]
    pub cl_str: Option<Vec<String>>,
    pub shape: Vec<usize>,
    pub dtype: DType,
}

impl StateValue {
    /// A state value read straight out of dataset fields
    pub fn from_fields(
        dset_paths: Vec<String>,
        fields: &[&str],
        shape: Vec<usize>,
        dtype: DType,
    ) -> Self {
        Self {
            dset_paths,
            dset_field: fields.iter().map(|f| f.to_string()).collect(),
            re_pattern: None,
            command_list: None,
            cl_str: None,
            shape,
            dtype,
        }
    }
}

/// Normalized description of one control device configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlConfig {
    #[serde(rename = "dset paths")]
    pub dset_paths: Vec<String>,
    #[serde(rename = "config column", skip_serializing_if = "Option::is_none")]
    pub config_column: Option<String>,
    pub shotnum: FieldMap,
    #[serde(rename = "state values")]
    pub state_values: BTreeMap<String, StateValue>,
    #[serde(rename = "command list", skip_serializing_if = "Option::is_none")]
    pub command_list: Option<Vec<String>>,
    pub meta: BTreeMap<String, MetaValue>,
}

/// Mapping of a single control device group
#[derive(Debug, Clone, Serialize)]
pub struct ControlMap {
    info: ControlInfo,
    #[serde(skip)]
    kind: ControlKind,
    configs: BTreeMap<String, ControlConfig>,
    #[serde(skip)]
    dataset_names: Vec<String>,
    #[serde(skip)]
    subgroup_names: Vec<String>,
    #[serde(skip)]
    warnings: Vec<String>,
}

impl ControlMap {
    /// Map a control device group. An Err means the build did not succeed and
    /// the group cannot be used.
    pub fn build(kind: ControlKind, group: &Group) -> Result<Self, MappingError> {
        let mut warnings = Vec::new();
        let configs = match kind {
            ControlKind::SixK => sixk::build_configs(group, &mut warnings)?,
            ControlKind::N5700Ps => n5700ps::build_configs(group, &mut warnings)?,
            ControlKind::NiXyz => nixyz::build_configs(group, &nixyz::NI_XYZ, &mut warnings)?,
            ControlKind::NiXz => nixyz::build_configs(group, &nixyz::NI_XZ, &mut warnings)?,
            ControlKind::Waveform => waveform::build_configs(group, &mut warnings)?,
        };
        Ok(Self {
            info: ControlInfo {
                group_name: group.name.clone(),
                group_path: group.path.clone(),
                contype: kind.contype(),
            },
            kind,
            configs,
            dataset_names: group.dataset_names(),
            subgroup_names: group.subgroup_names(),
            warnings,
        })
    }

    pub fn info(&self) -> &ControlInfo {
        &self.info
    }

    pub fn contype(&self) -> ConType {
        self.info.contype
    }

    pub fn configs(&self) -> &BTreeMap<String, ControlConfig> {
        &self.configs
    }

    pub fn config(&self, name: &str) -> Option<&ControlConfig> {
        self.configs.get(name)
    }

    pub fn dataset_names(&self) -> &[String] {
        &self.dataset_names
    }

    pub fn subgroup_names(&self) -> &[String] {
        &self.subgroup_names
    }

    pub fn has_command_list(&self) -> bool {
        self.kind.has_command_list()
    }

    pub fn one_config_per_dset(&self) -> bool {
        self.kind.one_config_per_dset()
    }

    /// Warnings raised while mapping; none of them stopped the build
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Name of the dataset holding the state value data of a configuration
    pub fn construct_dataset_name(&self, config_name: &str) -> Result<String, MappingError> {
        let config = self.get_config(config_name)?;
        if self.one_config_per_dset() {
            config
                .dset_paths
                .first()
                .and_then(|path| path.rsplit('/').next())
                .map(|name| name.to_string())
                .ok_or_else(|| self.unknown_config(config_name))
        } else {
            Ok(String::from(RUN_TIME_LIST))
        }
    }

    /// Parser over the command list of a configuration
    pub fn clparse(&self, config_name: &str) -> Result<ClParse, MappingError> {
        let config = self.get_config(config_name)?;
        match &config.command_list {
            Some(cl) if self.has_command_list() => Ok(ClParse::new(cl)),
            _ => Err(MappingError::NoCommandList(self.info.group_name.clone())),
        }
    }

    /// Replace the state values of a configuration with the ones parsed by
    /// custom command list patterns. The configuration is left untouched if
    /// parsing fails.
    pub fn set_state_values_config<S: AsRef<str>>(
        &mut self,
        config_name: &str,
        patterns: &[S],
    ) -> Result<(), MappingError> {
        if !self.has_command_list() {
            return Err(MappingError::NoCommandList(self.info.group_name.clone()));
        }
        let device = self.info.group_name.clone();
        let config = self
            .configs
            .get_mut(config_name)
            .ok_or_else(|| MappingError::UnknownConfig {
                device: device.clone(),
                config: config_name.to_string(),
            })?;
        let state_values = cl_template::parsed_state_values(&device, config, patterns)?;
        config.state_values = state_values;
        spdlog::debug!("{device}: custom state values set for configuration '{config_name}'");
        Ok(())
    }

    /// Put the state values of a configuration back to the defaults. With
    /// `apply_patterns` the device's built-in patterns are tried first.
    pub fn reset_state_values_config(
        &mut self,
        config_name: &str,
        apply_patterns: bool,
    ) -> Result<(), MappingError> {
        if !self.has_command_list() {
            return Err(MappingError::NoCommandList(self.info.group_name.clone()));
        }
        let device = self.info.group_name.clone();
        let patterns = if apply_patterns {
            self.kind.cl_patterns()
        } else {
            vec![]
        };
        let config = self
            .configs
            .get_mut(config_name)
            .ok_or_else(|| MappingError::UnknownConfig {
                device: device.clone(),
                config: config_name.to_string(),
            })?;
        config.state_values = cl_template::state_values_or_default(&device, config, &patterns);
        Ok(())
    }

    fn get_config(&self, config_name: &str) -> Result<&ControlConfig, MappingError> {
        self.configs
            .get(config_name)
            .ok_or_else(|| self.unknown_config(config_name))
    }

    fn unknown_config(&self, config_name: &str) -> MappingError {
        MappingError::UnknownConfig {
            device: self.info.group_name.clone(),
            config: config_name.to_string(),
        }
    }
}
