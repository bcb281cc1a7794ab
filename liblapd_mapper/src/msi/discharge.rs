//! Discharge diagnostic: cathode-anode voltage and discharge current traces.
use super::template::MsiLayout;

pub const GROUP_NAME: &str = "Discharge";

pub const LAYOUT: MsiLayout = MsiLayout {
    summary_dset: "Discharge summary",
    signals: &[
        ("voltage", "Cathode-anode voltage"),
        ("current", "Discharge current"),
    ],
    meta_fields: &[
        ("timestamp", "Start time"),
        ("data valid", "Data valid"),
        ("pulse length", "Pulse length"),
        ("peak current", "Peak current"),
        ("bank voltage", "Bank voltage"),
    ],
    attrs: &[
        ("current conversion factor", "Current conversion factor"),
        ("voltage conversion factor", "Voltage conversion factor"),
        ("t0", "Start time"),
        ("dt", "Timestep"),
        ("calib tag", "Calibration tag"),
    ],
};
