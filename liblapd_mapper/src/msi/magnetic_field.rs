//! Magnetic field diagnostic: axial field profile and magnet supply currents.
use super::template::MsiLayout;

pub const GROUP_NAME: &str = "Magnetic field";

pub const LAYOUT: MsiLayout = MsiLayout {
    summary_dset: "Magnetic field summary",
    signals: &[
        ("magnetic field", "Magnetic field profile"),
        ("supply currents", "Magnet power supply currents"),
    ],
    meta_fields: &[
        ("timestamp", "Start time"),
        ("data valid", "Data valid"),
        ("peak magnetic field", "Peak magnetic field"),
    ],
    attrs: &[
        ("calib tag", "Calibration tag"),
        ("z", "Profile z locations"),
    ],
};

#[cfg(test)]
mod tests {
    use super::super::template::{MsiKind, MsiMap};
    use super::*;
    use crate::dtype::DType;
    use crate::node::{AttrValue, Group};

    #[test]
    fn test_magnetic_field_map() {
        let mut group = Group::new(GROUP_NAME, "/MSI/Magnetic field");
        group
            .set_attr("Calibration tag", AttrValue::bytes("08/27/2021"))
            .set_attr("Profile z locations", vec![-300.0, -297.0, -294.0]);
        group.add_dataset(
            "Magnetic field summary",
            &[10],
            DType::compound(&[
                ("Shot number", DType::Int32),
                ("Start time", DType::Float64),
                ("Data valid", DType::Int8),
                ("Peak magnetic field", DType::Float32),
            ]),
        );
        group.add_dataset("Magnetic field profile", &[10, 3], DType::Float32);
        group.add_dataset("Magnet power supply currents", &[10, 10], DType::Float32);

        let map = MsiMap::build(MsiKind::MagneticField, &group).unwrap();
        assert!(map.warnings().is_empty());
        assert_eq!(map.configs().signals["magnetic field"].shape, vec![3]);
        assert_eq!(map.configs().signals["supply currents"].shape, vec![10]);
        assert_eq!(map.info().group_path, "/MSI/Magnetic field");
    }
}
