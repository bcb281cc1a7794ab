//! Interferometer array diagnostic.
//!
//! ```text
//! Interferometer array          - Interferometer count, Calibration tag
//! |---- Interferometer [0]      - Start time, Timestep, n_bar_L, z location
//! |     |---- Interferometer summary list(dset)
//! |     |---- Interferometer trace(dset)
//! |---- Interferometer [1]
//! ...
//! ```
//!
//! All interferometers are mapped into one configuration. Every meta field
//! and signal then carries one dataset path per interferometer.
use std::collections::BTreeMap;

use super::template::{attrs_from_group, meta_from_fields, require_dataset, MsiConfig};
use crate::constants::SHOT_NUMBER_FIELD;
use crate::dtype::DType;
use crate::error::MappingError;
use crate::mapping::{require_field, FieldMap};
use crate::node::{Dataset, Group, MetaValue};

pub const GROUP_NAME: &str = "Interferometer array";
const COUNT_ATTR: &str = "Interferometer count";
const INTERFEROMETER_PREFIX: &str = "Interferometer [";
const SUMMARY_DSET: &str = "Interferometer summary list";
const TRACE_DSET: &str = "Interferometer trace";

const META_FIELDS: [(&str, &str); 3] = [
    ("timestamp", "Start time"),
    ("data valid", "Data valid"),
    ("peak density", "Peak density"),
];

/// Attributes recorded on each interferometer subgroup, gathered into lists
const PER_INTERFEROMETER_ATTRS: [(&str, &str); 4] = [
    ("t0", "Start time"),
    ("dt", "Timestep"),
    ("n_bar_L", "n_bar_L"),
    ("z", "z location"),
];

pub fn build_configs(group: &Group, warnings: &mut Vec<String>) -> Result<MsiConfig, MappingError> {
    let device = group.name.as_str();
    let count = group
        .attr(COUNT_ATTR)
        .ok_or_else(|| MappingError::MissingAttribute {
            device: device.to_string(),
            group: group.path.clone(),
            attr: COUNT_ATTR.to_string(),
        })?
        .as_i64()
        .ok_or_else(|| MappingError::BadAttribute {
            device: device.to_string(),
            group: group.path.clone(),
            attr: COUNT_ATTR.to_string(),
        })?;

    let interferometers: Vec<&Group> = group
        .subgroup_names()
        .iter()
        .filter(|name| name.starts_with(INTERFEROMETER_PREFIX))
        .filter_map(|name| group.group(name))
        .collect();
    if interferometers.len() as i64 != count {
        return Err(MappingError::Inconsistent {
            device: device.to_string(),
            what: format!(
                "'{COUNT_ATTR}' is {count} but {} interferometer groups were found",
                interferometers.len()
            ),
        });
    }
    if interferometers.is_empty() {
        return Err(MappingError::NoConfigurations(device.to_string()));
    }

    let mut summaries: Vec<&Dataset> = Vec::with_capacity(interferometers.len());
    let mut traces: Vec<&Dataset> = Vec::with_capacity(interferometers.len());
    for sub in interferometers.iter() {
        let summary = require_dataset(sub, SUMMARY_DSET)?;
        require_field(device, summary, SHOT_NUMBER_FIELD)?;
        summaries.push(summary);
        traces.push(require_dataset(sub, TRACE_DSET)?);
    }

    let (first_summary, first_trace) = (summaries[0], traces[0]);
    if summaries.iter().any(|s| s.dtype != first_summary.dtype) {
        return Err(MappingError::Inconsistent {
            device: device.to_string(),
            what: format!("'{SUMMARY_DSET}' datasets do not share a dtype"),
        });
    }
    if traces
        .iter()
        .any(|t| t.shape != first_trace.shape || t.dtype != first_trace.dtype)
    {
        return Err(MappingError::Inconsistent {
            device: device.to_string(),
            what: format!("'{TRACE_DSET}' datasets do not share a shape and dtype"),
        });
    }

    let summary_paths: Vec<String> = summaries.iter().map(|d| d.path.clone()).collect();
    let trace_paths: Vec<String> = traces.iter().map(|d| d.path.clone()).collect();
    let shotnum_dtype = require_field(device, first_summary, SHOT_NUMBER_FIELD)?;

    let mut attrs = attrs_from_group(group, &[("calib tag", "Calibration tag")], warnings);
    attrs.insert(String::from("n interferometer"), MetaValue::Int(count));
    for (key, attr) in PER_INTERFEROMETER_ATTRS {
        let values = interferometers
            .iter()
            .map(|sub| match sub.attr(attr) {
                Some(value) => value.to_meta(),
                None => {
                    warnings.push(format!(
                        "{device}: attribute '{attr}' not found in '{}'",
                        sub.path
                    ));
                    MetaValue::Null
                }
            })
            .collect();
        attrs.insert(key.to_string(), MetaValue::List(values));
    }

    Ok(MsiConfig {
        shotnum: FieldMap::new(
            summary_paths,
            &[SHOT_NUMBER_FIELD],
            shotnum_dtype.shape(),
            DType::Int32,
        ),
        signals: BTreeMap::from([(
            String::from("signals"),
            FieldMap::new(trace_paths, &[], first_trace.row_shape(), first_trace.dtype.clone()),
        )]),
        meta_shape: vec![interferometers.len()],
        meta: meta_from_fields(device, &summaries, &META_FIELDS, warnings),
        attrs,
    })
}

#[cfg(test)]
mod tests {
    use super::super::template::{MsiKind, MsiMap};
    use super::*;
    use crate::node::{AttrValue, Node};

    fn summary_dtype() -> DType {
        DType::compound(&[
            ("Shot number", DType::Int32),
            ("Start time", DType::Float64),
            ("Data valid", DType::Int8),
            ("Peak density", DType::Float32),
        ])
    }

    fn array_group(count: usize) -> Group {
        let mut group = Group::new(GROUP_NAME, "/MSI/Interferometer array");
        group
            .set_attr(COUNT_ATTR, count as i64)
            .set_attr("Calibration tag", AttrValue::bytes("08/27/2021"));
        for idx in 0..count {
            let sub = group.add_group(&format!("Interferometer [{idx}]"));
            sub.set_attr("Start time", -0.0034)
                .set_attr("Timestep", 4.88e-5)
                .set_attr("n_bar_L", 2.6e13)
                .set_attr("z location", 40.0 * idx as f64);
            sub.add_dataset(SUMMARY_DSET, &[10], summary_dtype());
            sub.add_dataset(TRACE_DSET, &[10, 2048], DType::Int16);
        }
        group
    }

    #[test]
    fn test_array_map() {
        let map = MsiMap::build(MsiKind::InterferometerArray, &array_group(3)).unwrap();
        assert!(map.warnings().is_empty());
        let configs = map.configs();
        assert_eq!(configs.meta_shape, vec![3]);
        assert_eq!(configs.shotnum.dset_paths.len(), 3);
        assert_eq!(
            configs.signals["signals"].dset_paths[2],
            "/MSI/Interferometer array/Interferometer [2]/Interferometer trace"
        );
        assert_eq!(configs.signals["signals"].shape, vec![2048]);
        assert_eq!(configs.meta["peak density"].dset_paths.len(), 3);
        assert_eq!(configs.attrs["n interferometer"], MetaValue::Int(3));
        assert!(matches!(&configs.attrs["z"], MetaValue::List(z) if z.len() == 3));
    }

    #[test]
    fn test_count_mismatch() {
        let mut group = array_group(2);
        group.set_attr(COUNT_ATTR, 3);
        assert!(matches!(
            MsiMap::build(MsiKind::InterferometerArray, &group),
            Err(MappingError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_trace_shape_mismatch() {
        let mut group = array_group(2);
        let Some(Node::Group(mut sub)) = group.remove("Interferometer [1]") else {
            panic!("interferometer group should exist");
        };
        sub.add_dataset(TRACE_DSET, &[10, 1024], DType::Int16);
        group.insert(Node::Group(sub));
        assert!(matches!(
            MsiMap::build(MsiKind::InterferometerArray, &group),
            Err(MappingError::Inconsistent { what, .. }) if what.contains(TRACE_DSET)
        ));
    }
}
