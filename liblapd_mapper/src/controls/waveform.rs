//! Mapping of the Waveform control device (function generators).
//!
//! ```text
//! Waveform
//! |---- <configuration> - IP address, Generator type, Waveform command list
//! |---- Run time list(dset)
//! ```
use std::collections::BTreeMap;

use super::cl_template::{build_cl_configs, ClDeviceLayout};
use super::template::ControlConfig;
use crate::constants::CL_VALUE_PATTERN;
use crate::error::MappingError;
use crate::node::Group;

pub const GROUP_NAME: &str = "Waveform";

const LAYOUT: ClDeviceLayout = ClDeviceLayout {
    attr_pairs: &[
        ("IP address", "IP address"),
        ("generator device", "Generator type"),
    ],
    command_list_attr: "Waveform command list",
};

/// Output frequency set by `FREQ <value>`
pub fn cl_patterns() -> Vec<String> {
    vec![format!(r"(?P<FREQ>(\bFREQ\s){CL_VALUE_PATTERN})")]
}

pub fn build_configs(
    group: &Group,
    warnings: &mut Vec<String>,
) -> Result<BTreeMap<String, ControlConfig>, MappingError> {
    build_cl_configs(group, &LAYOUT, &cl_patterns(), warnings)
}
