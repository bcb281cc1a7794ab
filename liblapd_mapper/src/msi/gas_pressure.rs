//! Gas pressure diagnostic: ion gauge fill pressure and RGA partial pressures.
use super::template::MsiLayout;

pub const GROUP_NAME: &str = "Gas pressure";

pub const LAYOUT: MsiLayout = MsiLayout {
    summary_dset: "Gas pressure summary",
    signals: &[("RGA", "RGA partial pressures")],
    meta_fields: &[
        ("timestamp", "Start time"),
        ("data valid", "Data valid"),
        ("RGA valid", "RGA valid"),
        ("fill pressure", "Fill pressure"),
        ("peak AMU", "Peak AMU"),
    ],
    attrs: &[
        ("RGA AMUs", "RGA AMUs"),
        ("ion gauge calib tag", "Ion gauge calibration tag"),
        ("RGA calib tag", "RGA calibration tag"),
    ],
};
