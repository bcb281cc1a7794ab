//! Cathode heater diagnostic. Summary only, no signal datasets.
use super::template::MsiLayout;

pub const GROUP_NAME: &str = "Heater";

pub const LAYOUT: MsiLayout = MsiLayout {
    summary_dset: "Heater summary",
    signals: &[],
    meta_fields: &[
        ("timestamp", "Start time"),
        ("data valid", "Data valid"),
        ("current", "Heater current"),
        ("voltage", "Heater voltage"),
        ("temperature", "Heater temperature"),
    ],
    attrs: &[("calib tag", "Calibration tag")],
};

#[cfg(test)]
mod tests {
    use super::super::template::{MsiKind, MsiMap};
    use super::*;
    use crate::dtype::DType;
    use crate::error::MappingError;
    use crate::node::Group;

    #[test]
    fn test_heater_without_shot_number() {
        let mut group = Group::new(GROUP_NAME, "/MSI/Heater");
        group.add_dataset(
            "Heater summary",
            &[10],
            DType::compound(&[("Start time", DType::Float64), ("Heater current", DType::Float32)]),
        );
        assert!(matches!(
            MsiMap::build(MsiKind::Heater, &group),
            Err(MappingError::MissingField { .. })
        ));
    }

    #[test]
    fn test_heater_map() {
        let mut group = Group::new(GROUP_NAME, "/MSI/Heater");
        group.add_dataset(
            "Heater summary",
            &[10],
            DType::compound(&[
                ("Shot number", DType::Int32),
                ("Start time", DType::Float64),
                ("Data valid", DType::Int8),
                ("Heater current", DType::Float32),
                ("Heater voltage", DType::Float32),
                ("Heater temperature", DType::Float32),
            ]),
        );
        let map = MsiMap::build(MsiKind::Heater, &group).unwrap();
        assert!(map.configs().signals.is_empty());
        assert_eq!(map.configs().meta["temperature"].dset_field, vec!["Heater temperature"]);
        // only the calibration tag is missing
        assert_eq!(map.warnings().len(), 1);
    }
}
