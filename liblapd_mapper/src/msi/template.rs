use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::{discharge, gas_pressure, heater, interferometer_array, magnetic_field};
use crate::constants::SHOT_NUMBER_FIELD;
use crate::dtype::DType;
use crate::error::MappingError;
use crate::mapping::{require_field, FieldMap};
use crate::node::{Dataset, Group, MetaValue};

/// The MSI diagnostics this crate knows how to map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsiKind {
    Discharge,
    GasPressure,
    Heater,
    InterferometerArray,
    MagneticField,
}

impl MsiKind {
    pub const ALL: [MsiKind; 5] = [
        MsiKind::Discharge,
        MsiKind::GasPressure,
        MsiKind::Heater,
        MsiKind::InterferometerArray,
        MsiKind::MagneticField,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MsiKind::Discharge => discharge::GROUP_NAME,
            MsiKind::GasPressure => gas_pressure::GROUP_NAME,
            MsiKind::Heater => heater::GROUP_NAME,
            MsiKind::InterferometerArray => interferometer_array::GROUP_NAME,
            MsiKind::MagneticField => magnetic_field::GROUP_NAME,
        }
    }
}

impl fmt::Display for MsiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MsiInfo {
    #[serde(rename = "group name")]
    pub group_name: String,
    #[serde(rename = "group path")]
    pub group_path: String,
}

/// Normalized description of an MSI diagnostic.
///
/// `signals` are per-shot arrays (traces, profiles), `meta` are per-shot
/// scalars out of the summary dataset(s), `attrs` is decoded group metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MsiConfig {
    pub shotnum: FieldMap,
    pub signals: BTreeMap<String, FieldMap>,
    #[serde(rename = "meta shape")]
    pub meta_shape: Vec<usize>,
    pub meta: BTreeMap<String, FieldMap>,
    pub attrs: BTreeMap<String, MetaValue>,
}

/// Mapping of a single MSI diagnostic group
#[derive(Debug, Clone, Serialize)]
pub struct MsiMap {
    info: MsiInfo,
    configs: MsiConfig,
    #[serde(skip)]
    warnings: Vec<String>,
}

impl MsiMap {
    /// Map an MSI diagnostic group. An Err means the build did not succeed.
    pub fn build(kind: MsiKind, group: &Group) -> Result<Self, MappingError> {
        let mut warnings = Vec::new();
        let configs = match kind {
            MsiKind::Discharge => build_from_layout(group, &discharge::LAYOUT, &mut warnings)?,
            MsiKind::GasPressure => build_from_layout(group, &gas_pressure::LAYOUT, &mut warnings)?,
            MsiKind::Heater => build_from_layout(group, &heater::LAYOUT, &mut warnings)?,
            MsiKind::InterferometerArray => {
                interferometer_array::build_configs(group, &mut warnings)?
            }
            MsiKind::MagneticField => {
                build_from_layout(group, &magnetic_field::LAYOUT, &mut warnings)?
            }
        };
        Ok(Self {
            info: MsiInfo {
                group_name: group.name.clone(),
                group_path: group.path.clone(),
            },
            configs,
            warnings,
        })
    }

    pub fn info(&self) -> &MsiInfo {
        &self.info
    }

    pub fn configs(&self) -> &MsiConfig {
        &self.configs
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Layout of a diagnostic that records one summary dataset plus optional
/// signal datasets. All pairs are (mapping key, HDF5 name).
pub struct MsiLayout {
    pub summary_dset: &'static str,
    pub signals: &'static [(&'static str, &'static str)],
    pub meta_fields: &'static [(&'static str, &'static str)],
    pub attrs: &'static [(&'static str, &'static str)],
}

pub(crate) fn require_dataset<'a>(
    group: &'a Group,
    name: &str,
) -> Result<&'a Dataset, MappingError> {
    group
        .dataset(name)
        .ok_or_else(|| MappingError::MissingDataset {
            device: group.name.clone(),
            dataset: name.to_string(),
        })
}

/// Meta entries for every wanted summary field, warning about the missing ones
pub(crate) fn meta_from_fields(
    device: &str,
    summaries: &[&Dataset],
    fields: &[(&str, &str)],
    warnings: &mut Vec<String>,
) -> BTreeMap<String, FieldMap> {
    let mut meta = BTreeMap::new();
    let Some(first) = summaries.first() else {
        return meta;
    };
    let paths: Vec<String> = summaries.iter().map(|d| d.path.clone()).collect();
    for (key, field) in fields.iter() {
        match first.dtype.field(field) {
            Some(dtype) => {
                meta.insert(
                    key.to_string(),
                    FieldMap::new(paths.clone(), &[field], dtype.shape(), dtype.base().clone()),
                );
            }
            None => warnings.push(format!(
                "{device}: field '{field}' not found in '{}', '{key}' will not be mapped",
                first.path
            )),
        }
    }
    meta
}

/// Decode wanted group attributes, warning about the missing ones
pub(crate) fn attrs_from_group(
    group: &Group,
    attrs: &[(&str, &str)],
    warnings: &mut Vec<String>,
) -> BTreeMap<String, MetaValue> {
    let mut decoded = BTreeMap::new();
    for (key, attr) in attrs.iter() {
        match group.attr(attr) {
            Some(value) => {
                decoded.insert(key.to_string(), value.to_meta());
            }
            None => {
                decoded.insert(key.to_string(), MetaValue::Null);
                warnings.push(format!(
                    "Attribute '{attr}' not found for MSI diagnostic '{}', continuing with mapping",
                    group.name
                ));
            }
        }
    }
    decoded
}

pub(crate) fn build_from_layout(
    group: &Group,
    layout: &MsiLayout,
    warnings: &mut Vec<String>,
) -> Result<MsiConfig, MappingError> {
    let device = group.name.as_str();
    let summary = require_dataset(group, layout.summary_dset)?;
    let shotnum_dtype = require_field(device, summary, SHOT_NUMBER_FIELD)?;
    let n_shots = summary.shape.first().copied();

    let mut signals = BTreeMap::new();
    for (key, dset_name) in layout.signals.iter() {
        let dset = require_dataset(group, dset_name)?;
        if dset.shape.first().copied() != n_shots {
            warnings.push(format!(
                "{device}: '{dset_name}' and '{}' disagree on the number of shots",
                layout.summary_dset
            ));
        }
        signals.insert(
            key.to_string(),
            FieldMap::new(vec![dset.path.clone()], &[], dset.row_shape(), dset.dtype.clone()),
        );
    }

    Ok(MsiConfig {
        shotnum: FieldMap::new(
            vec![summary.path.clone()],
            &[SHOT_NUMBER_FIELD],
            shotnum_dtype.shape(),
            DType::Int32,
        ),
        signals,
        meta_shape: vec![],
        meta: meta_from_fields(device, &[summary], layout.meta_fields, warnings),
        attrs: attrs_from_group(group, layout.attrs, warnings),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::AttrValue;

    const TEST_LAYOUT: MsiLayout = MsiLayout {
        summary_dset: "Test summary",
        signals: &[("trace", "Test trace")],
        meta_fields: &[("timestamp", "Timestamp"), ("peak", "Peak value")],
        attrs: &[("calib tag", "Calibration tag")],
    };

    fn test_group() -> Group {
        let mut group = Group::new("Test", "/MSI/Test");
        group.set_attr("Calibration tag", AttrValue::bytes("08/27/2021"));
        group.add_dataset(
            "Test summary",
            &[20],
            DType::compound(&[
                ("Shot number", DType::Int32),
                ("Timestamp", DType::Float64),
                ("Peak value", DType::Float32),
            ]),
        );
        group.add_dataset("Test trace", &[20, 2048], DType::Float32);
        group
    }

    #[test]
    fn test_layout_build() {
        let mut warnings = vec![];
        let config = build_from_layout(&test_group(), &TEST_LAYOUT, &mut warnings).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(config.shotnum.dset_paths, vec!["/MSI/Test/Test summary"]);
        assert_eq!(config.signals["trace"].shape, vec![2048]);
        assert_eq!(config.signals["trace"].dtype, DType::Float32);
        assert!(config.signals["trace"].dset_field.is_empty());
        assert_eq!(config.meta["peak"].dset_field, vec!["Peak value"]);
        assert_eq!(config.meta["peak"].dtype, DType::Float32);
        assert_eq!(
            config.attrs["calib tag"],
            MetaValue::Str(String::from("08/27/2021"))
        );
    }

    #[test]
    fn test_missing_pieces() {
        let mut group = test_group();
        group.remove_attr("Calibration tag");
        group.add_dataset(
            "Test summary",
            &[20],
            DType::compound(&[("Shot number", DType::Int32), ("Timestamp", DType::Float64)]),
        );
        let mut warnings = vec![];
        let config = build_from_layout(&group, &TEST_LAYOUT, &mut warnings).unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(!config.meta.contains_key("peak"));
        assert_eq!(config.attrs["calib tag"], MetaValue::Null);

        group.remove("Test trace");
        assert!(matches!(
            build_from_layout(&group, &TEST_LAYOUT, &mut warnings),
            Err(MappingError::MissingDataset { .. })
        ));
    }

    #[test]
    fn test_shot_count_mismatch_warns() {
        let mut group = test_group();
        group.add_dataset("Test trace", &[19, 2048], DType::Float32);
        let mut warnings = vec![];
        build_from_layout(&group, &TEST_LAYOUT, &mut warnings).unwrap();
        assert_eq!(warnings.len(), 1);
    }
}
