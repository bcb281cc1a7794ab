use super::config::Config;
use super::error::ProcessorError;
use super::mapper::HdfMap;
use super::node::Group;
use super::summary::MapSummary;

/// Map an already loaded file and apply the configured state value patterns
pub fn map_group(config: &Config, root: &Group) -> Result<HdfMap, ProcessorError> {
    let mut map = HdfMap::new(root, config.silent)?;
    for custom in config.state_patterns.iter() {
        let control = map
            .controls_mut()
            .get_mut(&custom.control)
            .ok_or_else(|| ProcessorError::UnknownControl(custom.control.clone()))?;
        control.set_state_values_config(&custom.config, &custom.patterns)?;
        spdlog::info!(
            "Applied custom state values to {} configuration '{}'",
            custom.control,
            custom.config
        );
    }
    Ok(map)
}

#[cfg(feature = "hdf5")]
fn load_root(config: &Config) -> Result<Group, ProcessorError> {
    Ok(super::h5_loader::load_file(&config.hdf_path)?)
}

#[cfg(not(feature = "hdf5"))]
fn load_root(_config: &Config) -> Result<Group, ProcessorError> {
    Err(ProcessorError::NoHdf5Support)
}

/// The main entry point of lapd_mapper.
///
/// Loads the configured file, maps it and writes the summary if an output path was given.
pub fn process(config: &Config) -> Result<MapSummary, ProcessorError> {
    spdlog::info!("Mapping {}...", config.hdf_path.display());
    let root = load_root(config)?;
    let map = map_group(config, &root)?;
    let summary = MapSummary::new(&map);
    if let Some(output) = config.get_output_file_name() {
        summary.write_summary(&output)?;
        spdlog::info!("Wrote map summary to {}", output.display());
    }
    spdlog::info!("Finished mapping {map}.");
    Ok(summary)
}
