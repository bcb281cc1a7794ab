use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ConfigError;

/// Custom command list patterns for one configuration of a control device.
/// Applied after mapping in place of the device's default patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePatternOverride {
    pub control: String,
    pub config: String,
    pub patterns: Vec<String>,
}

/// Structure representing the application configuration. Contains the file to map and
/// where the summary goes.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub hdf_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub silent: bool,
    #[serde(default)]
    pub state_patterns: Vec<StatePatternOverride>,
}

impl Default for Config {
    /// Generate a new Config object. All fields will be empty/invalid
    fn default() -> Self {
        Self {
            hdf_path: PathBuf::from("None"),
            output_path: None,
            silent: false,
            state_patterns: vec![],
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(self)?;
        std::fs::write(config_path, yaml_str)?;
        Ok(())
    }

    pub fn does_hdf_file_exist(&self) -> bool {
        self.hdf_path.exists()
    }

    /// Get the path of the summary file, if one was requested.
    /// A directory gets `<hdf file stem>_map.yml` inside it.
    pub fn get_output_file_name(&self) -> Option<PathBuf> {
        let output = self.output_path.as_ref()?;
        if output.is_dir() {
            let stem = self
                .hdf_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| String::from("lapd"));
            Some(output.join(format!("{stem}_map.yml")))
        } else {
            Some(output.clone())
        }
    }
}
