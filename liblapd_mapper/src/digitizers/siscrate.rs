//! Mapping of the SIS crate digitizer (SIS 3302 and SIS 3305 boards).
//!
//! ```text
//! SIS crate
//! |---- <name>    - SIS crate board types, SIS crate config indices, SIS crate slot numbers
//! |     |---- SIS crate 3302 configurations[0]  - Enabled 1..8, Shot averaging (software), ...
//! |     |---- SIS crate 3305 configurations[0]  - Enabled 1..8, Channel mode, ...
//! |---- <name> [Slot 5: SIS 3302 ch 1](dset)
//! |---- <name> [Slot 13: SIS 3305 FPGA 1 ch 1](dset)
//! |---- ... headers(dset)
//! ```
//!
//! The three crate attributes are parallel arrays with one entry per
//! installed board. A board's slot decides both its adc and its board number.
use std::collections::BTreeMap;

use super::template::{averaging, channel_dataset, is_active, AdcConnection, DigiConfig};
use crate::error::MappingError;
use crate::node::Group;

pub const GROUP_NAME: &str = "SIS crate";
pub const SIS3302: &str = "SIS 3302";
pub const SIS3305: &str = "SIS 3305";

const BOARD_TYPES_ATTR: &str = "SIS crate board types";
const CONFIG_INDICES_ATTR: &str = "SIS crate config indices";
const SLOT_NUMBERS_ATTR: &str = "SIS crate slot numbers";
const SAMPLE_AVERAGING_ATTR: &str = "Sample averaging (hardware)";
const HEADER_SHOT_FIELD: &str = "Shot number";
const CHANNELS_PER_BOARD: i64 = 8;
const CHANNELS_PER_FPGA: i64 = 4;

/// Board type codes used in `SIS crate board types`
const SIS3302_TYPE: i64 = 2;
const SIS3305_TYPE: i64 = 3;

/// Slot of every (adc, board) pair the crate can hold
const SLOT_MAP: [(i64, &str, i64); 6] = [
    (5, SIS3302, 1),
    (7, SIS3302, 2),
    (9, SIS3302, 3),
    (11, SIS3302, 4),
    (13, SIS3305, 1),
    (15, SIS3305, 2),
];

pub fn slot_to_board(slot: i64) -> Option<(&'static str, i64)> {
    SLOT_MAP
        .iter()
        .find(|(s, _, _)| *s == slot)
        .map(|(_, adc, board)| (*adc, *board))
}

pub fn board_to_slot(adc: &str, board: i64) -> Option<i64> {
    SLOT_MAP
        .iter()
        .find(|(_, a, b)| *a == adc && *b == board)
        .map(|(slot, _, _)| *slot)
}

/// SIS 3305 sample rate in Hz for its `Channel mode`
fn sis3305_clock_rate(channel_mode: i64) -> Option<f64> {
    match channel_mode {
        0 => Some(1.25e9),
        1 => Some(2.5e9),
        2 => Some(5.0e9),
        _ => None,
    }
}

pub fn dataset_name(config_name: &str, adc: &str, board: i64, channel: i64) -> Option<String> {
    let slot = board_to_slot(adc, board)?;
    if !(1..=CHANNELS_PER_BOARD).contains(&channel) {
        return None;
    }
    if adc == SIS3305 {
        let fpga = (channel - 1) / CHANNELS_PER_FPGA + 1;
        let fpga_channel = (channel - 1) % CHANNELS_PER_FPGA + 1;
        Some(format!("{config_name} [Slot {slot}: SIS 3305 FPGA {fpga} ch {fpga_channel}]"))
    } else {
        Some(format!("{config_name} [Slot {slot}: SIS 3302 ch {channel}]"))
    }
}

fn board_config_group_name(adc: &str, index: i64) -> String {
    let model = adc.trim_start_matches("SIS ");
    format!("SIS crate {model} configurations[{index}]")
}

fn enabled_channels(board_group: &Group) -> Vec<i64> {
    (1..=CHANNELS_PER_BOARD)
        .filter(|ch| {
            board_group
                .attr(&format!("Enabled {ch}"))
                .and_then(|a| a.as_string())
                .is_some_and(|flag| flag.trim().eq_ignore_ascii_case("true"))
        })
        .collect()
}

fn int_list(group: &Group, device: &str, attr: &str) -> Result<Vec<i64>, MappingError> {
    group
        .attr(attr)
        .ok_or_else(|| MappingError::MissingAttribute {
            device: device.to_string(),
            group: group.path.clone(),
            attr: attr.to_string(),
        })?
        .as_i64_vec()
        .ok_or_else(|| MappingError::BadAttribute {
            device: device.to_string(),
            group: group.path.clone(),
            attr: attr.to_string(),
        })
}

/// Map one configuration group. Errors mean the configuration is unusable.
fn build_config(
    group: &Group,
    config_name: &str,
    config_group: &Group,
    warnings: &mut Vec<String>,
) -> Result<DigiConfig, MappingError> {
    let device = group.name.as_str();
    let board_types = int_list(config_group, device, BOARD_TYPES_ATTR)?;
    let config_indices = int_list(config_group, device, CONFIG_INDICES_ATTR)?;
    let slots = int_list(config_group, device, SLOT_NUMBERS_ATTR)?;
    if board_types.len() != config_indices.len() || board_types.len() != slots.len() {
        return Err(MappingError::Inconsistent {
            device: device.to_string(),
            what: format!("crate attributes in configuration '{config_name}'"),
        });
    }
    let active = is_active(group, config_name);

    let mut connections: Vec<AdcConnection> = Vec::new();
    for ((board_type, index), slot) in board_types.iter().zip(&config_indices).zip(&slots) {
        let Some((adc, board)) = slot_to_board(*slot) else {
            warnings.push(format!("{device}: slot {slot} does not hold a known board, skipping"));
            continue;
        };
        let expected_type = if adc == SIS3302 { SIS3302_TYPE } else { SIS3305_TYPE };
        if *board_type != expected_type {
            warnings.push(format!(
                "{device}: slot {slot} is listed with board type {board_type}, \
                 expected {adc}, skipping"
            ));
            continue;
        }
        let board_group_name = board_config_group_name(adc, *index);
        let Some(board_group) = config_group.group(&board_group_name) else {
            warnings.push(format!(
                "{device}: '{board_group_name}' not found in configuration '{config_name}', \
                 skipping slot {slot}"
            ));
            continue;
        };

        let (bit, clock_rate) = if adc == SIS3302 {
            (16, 100.0e6)
        } else {
            let mode = board_group.attr("Channel mode").and_then(|a| a.as_i64());
            match mode.and_then(sis3305_clock_rate) {
                Some(rate) => (10, rate),
                None => {
                    warnings.push(format!(
                        "{device}: '{}' has no usable Channel mode, assuming 1.25 GHz",
                        board_group.path
                    ));
                    (10, 1.25e9)
                }
            }
        };
        let mut conn = AdcConnection {
            adc: adc.to_string(),
            board,
            channels: vec![],
            bit,
            clock_rate,
            nshotnum: None,
            nt: None,
            shot_average: averaging(board_group, "Shot averaging (software)"),
            sample_average: hardware_averaging(device, board_group, warnings),
        };
        for channel in enabled_channels(board_group) {
            if active {
                let Some(dset_name) = dataset_name(config_name, adc, board, channel) else {
                    continue;
                };
                match channel_dataset(group, &dset_name, HEADER_SHOT_FIELD, warnings) {
                    Some(dset) => {
                        if conn.nshotnum.is_none() {
                            conn.set_data_shape(dset);
                        }
                    }
                    None => continue,
                }
            }
            conn.channels.push(channel);
        }
        if conn.channels.is_empty() {
            continue;
        }
        if connections.iter().any(|c| c.adc == conn.adc && c.board == board) {
            warnings.push(format!(
                "{device}: slot {slot} is listed twice in configuration '{config_name}', \
                 keeping the first"
            ));
            continue;
        }
        connections.push(conn);
    }
    connections.sort_by(|a, b| a.adc.cmp(&b.adc).then(a.board.cmp(&b.board)));

    let mut adcs: Vec<String> = connections.iter().map(|c| c.adc.clone()).collect();
    adcs.dedup();
    Ok(DigiConfig {
        active,
        adc: adcs,
        config_group_path: config_group.path.clone(),
        shot_average: shared_value(&connections, |c| c.shot_average),
        sample_average: shared_value(&connections, |c| c.sample_average),
        connections,
    })
}

/// Hardware sample averaging is stored as a power of two exponent
fn hardware_averaging(
    device: &str,
    board_group: &Group,
    warnings: &mut Vec<String>,
) -> Option<i64> {
    let exp = board_group
        .attr(SAMPLE_AVERAGING_ATTR)
        .and_then(|a| a.as_i64())
        .filter(|exp| *exp > 0)?;
    let samples = u32::try_from(exp).ok().and_then(|e| 1_i64.checked_shl(e)).filter(|s| *s > 0);
    if samples.is_none() {
        warnings.push(format!(
            "{device}: '{}' has out of range {SAMPLE_AVERAGING_ATTR} exponent {exp}, ignoring",
            board_group.path
        ));
    }
    samples
}

/// Averaging is set per board; a configuration only reports a value all boards share
fn shared_value(
    connections: &[AdcConnection],
    get: impl Fn(&AdcConnection) -> Option<i64>,
) -> Option<i64> {
    let first = connections.first().and_then(&get);
    connections
        .iter()
        .all(|c| get(c) == first)
        .then_some(first)
        .flatten()
}

pub fn build_configs(
    group: &Group,
    warnings: &mut Vec<String>,
) -> Result<BTreeMap<String, DigiConfig>, MappingError> {
    let device = group.name.as_str();
    let mut configs = BTreeMap::new();
    for sub_name in group.subgroup_names() {
        let Some(config_group) = group.group(&sub_name) else {
            continue;
        };
        if config_group.attr(BOARD_TYPES_ATTR).is_none() {
            continue;
        }
        match build_config(group, &sub_name, config_group, warnings) {
            Ok(config) => {
                configs.insert(sub_name, config);
            }
            Err(e) => warnings.push(format!("{device}: skipping configuration '{sub_name}': {e}")),
        }
    }
    Ok(configs)
}
