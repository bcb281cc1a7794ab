//! Mapping of the SIS 3301 digitizer.
//!
//! ```text
//! SIS 3301
//! |---- Configuration: <name>     - Shots to average, Samples to average
//! |     |---- Boards[0]           - Board
//! |     |     |---- Channels[0]   - Channel
//! |---- <name> [<board>:<channel>](dset)
//! |---- <name> [<board>:<channel>] headers(dset) - Shot, Scale, Offset, ...
//! ```
use std::collections::BTreeMap;

use super::template::{averaging, channel_dataset, is_active, AdcConnection, DigiConfig};
use crate::error::MappingError;
use crate::node::Group;

pub const GROUP_NAME: &str = "SIS 3301";
pub const ADC: &str = "SIS 3301";
const CONFIG_PREFIX: &str = "Configuration: ";
const BOARD_PREFIX: &str = "Boards[";
const CHANNEL_PREFIX: &str = "Channels[";
const HEADER_SHOT_FIELD: &str = "Shot";
const BIT: u32 = 14;
const CLOCK_RATE: f64 = 100.0e6;

pub fn dataset_name(config_name: &str, board: i64, channel: i64) -> String {
    format!("{config_name} [{board}:{channel}]")
}

fn numbered_subgroups<'a>(
    group: &'a Group,
    prefix: &str,
    attr: &str,
) -> Vec<(&'a Group, Option<i64>)> {
    group
        .subgroup_names()
        .iter()
        .filter(|name| name.starts_with(prefix))
        .filter_map(|name| group.group(name))
        .map(|sub| (sub, sub.attr(attr).and_then(|a| a.as_i64())))
        .collect()
}

pub fn build_configs(
    group: &Group,
    warnings: &mut Vec<String>,
) -> Result<BTreeMap<String, DigiConfig>, MappingError> {
    let device = group.name.as_str();
    let mut configs = BTreeMap::new();
    for sub_name in group.subgroup_names() {
        let Some(config_name) = sub_name.strip_prefix(CONFIG_PREFIX) else {
            continue;
        };
        let Some(config_group) = group.group(&sub_name) else {
            continue;
        };
        let active = is_active(group, config_name);
        let shot_average = averaging(config_group, "Shots to average");
        let sample_average = averaging(config_group, "Samples to average");

        let mut connections: Vec<AdcConnection> = Vec::new();
        for (board_group, board) in numbered_subgroups(config_group, BOARD_PREFIX, "Board") {
            let Some(board) = board else {
                warnings.push(format!("{device}: '{}' has no Board attribute", board_group.path));
                continue;
            };
            let mut conn = AdcConnection {
                adc: ADC.to_string(),
                board,
                channels: vec![],
                bit: BIT,
                clock_rate: CLOCK_RATE,
                nshotnum: None,
                nt: None,
                shot_average,
                sample_average,
            };
            let channels = numbered_subgroups(board_group, CHANNEL_PREFIX, "Channel");
            for (chan_group, channel) in channels {
                let Some(channel) = channel else {
                    warnings.push(format!(
                        "{device}: '{}' has no Channel attribute",
                        chan_group.path
                    ));
                    continue;
                };
                if active {
                    let dset_name = dataset_name(config_name, board, channel);
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
            conn.channels.sort_unstable();
            if connections.iter().any(|c| c.board == board) {
                warnings.push(format!(
                    "{device}: board {board} is listed twice in configuration '{config_name}', \
                     keeping the first"
                ));
                continue;
            }
            connections.push(conn);
        }
        connections.sort_by_key(|c| c.board);

        configs.insert(
            config_name.to_string(),
            DigiConfig {
                active,
                adc: vec![ADC.to_string()],
                config_group_path: config_group.path.clone(),
                shot_average,
                sample_average,
                connections,
            },
        );
    }
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::super::template::{DigiKind, DigiMap};
    use super::*;
    use crate::dtype::DType;

    fn header_dtype() -> DType {
        DType::compound(&[
            ("Shot", DType::UInt32),
            ("Scale", DType::Float64),
            ("Offset", DType::Float64),
            ("Min", DType::UInt16),
            ("Max", DType::UInt16),
            ("Clipped", DType::Int8),
        ])
    }

    fn sis3301_group() -> Group {
        let mut group = Group::new(GROUP_NAME, "/Raw data + config/SIS 3301");
        for (config, active) in [("config01", true), ("config02", false)] {
            let config_group = group.add_group(&format!("Configuration: {config}"));
            config_group
                .set_attr("Shots to average", 1)
                .set_attr("Samples to average", 4);
            for (bidx, board) in [(0, 1), (1, 3)] {
                let board_group = config_group.add_group(&format!("Boards[{bidx}]"));
                board_group.set_attr("Board", board);
                for (cidx, channel) in [(0, 2), (1, 1)] {
                    board_group
                        .add_group(&format!("Channels[{cidx}]"))
                        .set_attr("Channel", channel);
                }
            }
            if active {
                for board in [1, 3] {
                    for channel in [1, 2] {
                        let name = dataset_name(config, board, channel);
                        group.add_dataset(&name, &[25, 16384], DType::Int16);
                        group.add_dataset(&format!("{name} headers"), &[25], header_dtype());
                    }
                }
            }
        }
        group
    }

    #[test]
    fn test_sis3301_map() {
        let map = DigiMap::build(DigiKind::Sis3301, &sis3301_group()).unwrap();
        assert!(map.warnings().is_empty());
        assert_eq!(map.active_configs(), vec!["config01"]);

        let config = map.config("config01").unwrap();
        assert_eq!(config.shot_average, None);
        assert_eq!(config.sample_average, Some(4));
        assert_eq!(config.connections.len(), 2);
        let conn = &config.connections[1];
        assert_eq!(conn.board, 3);
        assert_eq!(conn.channels, vec![1, 2]);
        assert_eq!(conn.bit, 14);
        assert_eq!(conn.nshotnum, Some(25));
        assert_eq!(conn.nt, Some(16384));

        let inactive = map.config("config02").unwrap();
        assert!(!inactive.active);
        assert_eq!(inactive.connections[0].nshotnum, None);
    }

    #[test]
    fn test_dataset_names() {
        let map = DigiMap::build(DigiKind::Sis3301, &sis3301_group()).unwrap();
        assert_eq!(map.construct_dataset_name(3, 2, None, None).unwrap(), "config01 [3:2]");
        assert_eq!(
            map.construct_header_dataset_name(1, 1, Some("config01"), Some("SIS 3301"))
                .unwrap(),
            "config01 [1:1] headers"
        );
        assert!(matches!(
            map.construct_dataset_name(2, 1, None, None),
            Err(MappingError::NoConnection { board: 2, .. })
        ));
        assert!(matches!(
            map.construct_dataset_name(1, 1, Some("config03"), None),
            Err(MappingError::UnknownConfig { .. })
        ));
        assert!(matches!(
            map.construct_dataset_name(1, 1, None, Some("SIS 3302")),
            Err(MappingError::UnknownAdc { adc, .. }) if adc == "SIS 3302"
        ));
    }

    #[test]
    fn test_missing_channel_dataset_drops_channel() {
        let mut group = sis3301_group();
        group.remove("config01 [1:2]");
        let map = DigiMap::build(DigiKind::Sis3301, &group).unwrap();
        assert_eq!(map.config("config01").unwrap().connections[0].channels, vec![1]);
        assert_eq!(map.warnings().len(), 1);
    }

    #[test]
    fn test_active_needs_full_config_name() {
        let mut group = Group::new(GROUP_NAME, "/Raw data + config/SIS 3301");
        for config in ["config1", "config10"] {
            group
                .add_group(&format!("Configuration: {config}"))
                .add_group("Boards[0]")
                .set_attr("Board", 0)
                .add_group("Channels[0]")
                .set_attr("Channel", 0);
        }
        let name = dataset_name("config10", 0, 0);
        group.add_dataset(&name, &[25, 16384], DType::Int16);
        group.add_dataset(&format!("{name} headers"), &[25], header_dtype());

        let map = DigiMap::build(DigiKind::Sis3301, &group).unwrap();
        assert!(!map.config("config1").unwrap().active);
        assert!(map.config("config10").unwrap().active);
        assert_eq!(map.active_configs(), vec!["config10"]);
        assert_eq!(map.construct_dataset_name(0, 0, None, None).unwrap(), "config10 [0:0]");
    }
}
