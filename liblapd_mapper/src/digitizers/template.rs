use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::{sis3301, siscrate};
use crate::error::MappingError;
use crate::node::{Dataset, Group};

/// Suffix of the dataset holding the per-shot headers of a channel
pub const HEADER_SUFFIX: &str = " headers";

/// The digitizers this crate knows how to map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigiKind {
    Sis3301,
    SisCrate,
}

impl DigiKind {
    /// Order matters: the first one present is the main digitizer
    pub const ALL: [DigiKind; 2] = [DigiKind::Sis3301, DigiKind::SisCrate];

    pub fn name(&self) -> &'static str {
        match self {
            DigiKind::Sis3301 => sis3301::GROUP_NAME,
            DigiKind::SisCrate => siscrate::GROUP_NAME,
        }
    }

    /// Analog-digital converters the digitizer can carry
    pub fn device_adcs(&self) -> &'static [&'static str] {
        match self {
            DigiKind::Sis3301 => &[sis3301::ADC],
            DigiKind::SisCrate => &[siscrate::SIS3302, siscrate::SIS3305],
        }
    }
}

impl fmt::Display for DigiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigiInfo {
    #[serde(rename = "group name")]
    pub group_name: String,
    #[serde(rename = "group path")]
    pub group_path: String,
}

/// The channels of one board that took data, and how they sampled
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdcConnection {
    pub adc: String,
    pub board: i64,
    pub channels: Vec<i64>,
    pub bit: u32,
    /// Sample rate in Hz
    #[serde(rename = "clock rate")]
    pub clock_rate: f64,
    /// Recorded shots, known once the channel datasets are found
    pub nshotnum: Option<usize>,
    /// Samples per shot, known once the channel datasets are found
    pub nt: Option<usize>,
    #[serde(rename = "shot average")]
    pub shot_average: Option<i64>,
    #[serde(rename = "sample average")]
    pub sample_average: Option<i64>,
}

impl AdcConnection {
    /// Fill `nshotnum` and `nt` from a recorded channel dataset
    pub fn set_data_shape(&mut self, dset: &Dataset) {
        self.nshotnum = dset.shape.first().copied();
        self.nt = dset.shape.get(1).copied();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigiConfig {
    /// Whether any recorded dataset belongs to this configuration
    pub active: bool,
    pub adc: Vec<String>,
    #[serde(rename = "config group path")]
    pub config_group_path: String,
    #[serde(rename = "shot average")]
    pub shot_average: Option<i64>,
    #[serde(rename = "sample average")]
    pub sample_average: Option<i64>,
    pub connections: Vec<AdcConnection>,
}

/// Mapping of a single digitizer group
#[derive(Debug, Clone, Serialize)]
pub struct DigiMap {
    info: DigiInfo,
    #[serde(skip)]
    kind: DigiKind,
    configs: BTreeMap<String, DigiConfig>,
    #[serde(skip)]
    warnings: Vec<String>,
}

impl DigiMap {
    /// Map a digitizer group. An Err means the build did not succeed.
    pub fn build(kind: DigiKind, group: &Group) -> Result<Self, MappingError> {
        let mut warnings = Vec::new();
        let configs = match kind {
            DigiKind::Sis3301 => sis3301::build_configs(group, &mut warnings)?,
            DigiKind::SisCrate => siscrate::build_configs(group, &mut warnings)?,
        };
        if configs.is_empty() {
            return Err(MappingError::NoConfigurations(group.name.clone()));
        }
        if !configs.values().any(|c| c.active) {
            warnings.push(format!("{}: no active configuration found", group.name));
        }
        Ok(Self {
            info: DigiInfo {
                group_name: group.name.clone(),
                group_path: group.path.clone(),
            },
            kind,
            configs,
            warnings,
        })
    }

    pub fn info(&self) -> &DigiInfo {
        &self.info
    }

    pub fn configs(&self) -> &BTreeMap<String, DigiConfig> {
        &self.configs
    }

    pub fn config(&self, name: &str) -> Option<&DigiConfig> {
        self.configs.get(name)
    }

    pub fn active_configs(&self) -> Vec<&str> {
        self.configs
            .iter()
            .filter(|(_, c)| c.active)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Name of the dataset recording `board`/`channel`.
    ///
    /// Without `config` the single active configuration is used, without
    /// `adc` the configuration's only adc is used.
    pub fn construct_dataset_name(
        &self,
        board: i64,
        channel: i64,
        config: Option<&str>,
        adc: Option<&str>,
    ) -> Result<String, MappingError> {
        let device = self.info.group_name.as_str();
        let config_name = match config {
            Some(name) => name,
            None => match self.active_configs().as_slice() {
                [only] => *only,
                [] => return Err(MappingError::NoConfigurations(device.to_string())),
                _ => {
                    return Err(MappingError::Ambiguous {
                        device: device.to_string(),
                        what: String::from("configuration, more than one is active"),
                    })
                }
            },
        };
        let digi_config = self
            .configs
            .get(config_name)
            .ok_or_else(|| MappingError::UnknownConfig {
                device: device.to_string(),
                config: config_name.to_string(),
            })?;
        let adc = match adc {
            Some(adc) => adc,
            None => match digi_config.adc.as_slice() {
                [only] => only.as_str(),
                _ => {
                    return Err(MappingError::Ambiguous {
                        device: device.to_string(),
                        what: format!("adc, configuration '{config_name}' uses several"),
                    })
                }
            },
        };
        if !self.kind.device_adcs().contains(&adc) {
            return Err(MappingError::UnknownAdc {
                device: device.to_string(),
                adc: adc.to_string(),
            });
        }
        let connected = digi_config
            .connections
            .iter()
            .any(|conn| conn.adc == adc && conn.board == board && conn.channels.contains(&channel));
        if !connected {
            return Err(MappingError::NoConnection {
                device: device.to_string(),
                adc: adc.to_string(),
                board,
                channel,
            });
        }
        match self.kind {
            DigiKind::Sis3301 => Ok(sis3301::dataset_name(config_name, board, channel)),
            DigiKind::SisCrate => siscrate::dataset_name(config_name, adc, board, channel)
                .ok_or_else(|| MappingError::NoConnection {
                    device: device.to_string(),
                    adc: adc.to_string(),
                    board,
                    channel,
                }),
        }
    }

    pub fn construct_header_dataset_name(
        &self,
        board: i64,
        channel: i64,
        config: Option<&str>,
        adc: Option<&str>,
    ) -> Result<String, MappingError> {
        self.construct_dataset_name(board, channel, config, adc)
            .map(|name| format!("{name}{HEADER_SUFFIX}"))
    }
}

/// A configuration is active when the digitizer recorded data for it
pub(crate) fn is_active(group: &Group, config_name: &str) -> bool {
    let prefix = format!("{config_name} [");
    group
        .dataset_names()
        .iter()
        .any(|name| name.starts_with(&prefix))
}

/// Averaging attributes are only meaningful above one
pub(crate) fn averaging(group: &Group, attr: &str) -> Option<i64> {
    group.attr(attr).and_then(|a| a.as_i64()).filter(|v| *v > 1)
}

/// Check the channel dataset and its header companion. Returns the channel
/// dataset when the pair is usable.
pub(crate) fn channel_dataset<'a>(
    group: &'a Group,
    dset_name: &str,
    header_field: &str,
    warnings: &mut Vec<String>,
) -> Option<&'a Dataset> {
    let device = group.name.as_str();
    let Some(dset) = group.dataset(dset_name) else {
        warnings.push(format!("{device}: dataset '{dset_name}' not found, dropping channel"));
        return None;
    };
    let header_name = format!("{dset_name}{HEADER_SUFFIX}");
    match group.dataset(&header_name) {
        Some(header) if header.dtype.has_field(header_field) => {
            if header.shape.first() != dset.shape.first() {
                warnings.push(format!(
                    "{device}: '{header_name}' and '{dset_name}' disagree on the number of shots"
                ));
            }
        }
        Some(_) => warnings.push(format!(
            "{device}: '{header_name}' has no '{header_field}' field"
        )),
        None => warnings.push(format!("{device}: header dataset '{header_name}' not found")),
    }
    Some(dset)
}
