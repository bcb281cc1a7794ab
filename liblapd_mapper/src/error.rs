use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ClParseError {
    #[error("No command list patterns were given")]
    NoPatterns,
    #[error("Command list pattern {0:?} failed to compile: {1}")]
    BadPattern(String, regex::Error),
    #[error("Command list pattern {0:?} must define exactly two named groups, one of which is VAL")]
    BadGroups(String),
    #[error("State value {0:?} is defined by more than one command list pattern")]
    DuplicateState(String),
    #[error("Command list pattern {pattern:?} did not match command {command:?}")]
    Unmatched { pattern: String, command: String },
}

#[derive(Debug, Clone, Error)]
pub enum MappingError {
    #[error("{0}: has no mappable configurations")]
    NoConfigurations(String),
    #[error("Dataset '{dataset}' not found for device '{device}'")]
    MissingDataset { device: String, dataset: String },
    #[error("Attribute '{attr}' not found in device '{device}' group '{group}'")]
    MissingAttribute {
        device: String,
        group: String,
        attr: String,
    },
    #[error("Attribute '{attr}' of device '{device}' group '{group}' has an unexpected type")]
    BadAttribute {
        device: String,
        group: String,
        attr: String,
    },
    #[error("Dataset '{dataset}' of device '{device}' is missing field '{field}'")]
    MissingField {
        device: String,
        dataset: String,
        field: String,
    },
    #[error("Device '{device}' has inconsistent {what}")]
    Inconsistent { device: String, what: String },
    #[error("Configuration '{config}' not found in device '{device}'")]
    UnknownConfig { device: String, config: String },
    #[error("Device '{device}' has no {adc} connection for board {board} channel {channel}")]
    NoConnection {
        device: String,
        adc: String,
        board: i64,
        channel: i64,
    },
    #[error("Device '{device}' has no adc named '{adc}'")]
    UnknownAdc { device: String, adc: String },
    #[error("Device '{device}' needs an explicit {what}")]
    Ambiguous { device: String, what: String },
    #[error("Device '{0}' does not record a command list")]
    NoCommandList(String),
    #[error("Command list parsing failed: {0}")]
    ClParse(#[from] ClParseError),
}

#[derive(Debug, Clone, Error)]
pub enum MapError {
    #[error("HDF5 file ({0}) was not generated by the LaPD")]
    NotLapd(String),
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[cfg(feature = "hdf5")]
    #[error("Loader failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("Could not open HDF5 file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Loader found attribute '{attr}' of {path} with unsupported type {dtype}")]
    UnsupportedAttribute {
        path: String,
        attr: String,
        dtype: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum SummaryWriterError {
    #[error("SummaryWriter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("SummaryWriter failed to convert to yaml: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Loader error: {0}")]
    LoaderError(#[from] LoaderError),
    #[error("Processor failed due to HdfMap error: {0}")]
    MapError(#[from] MapError),
    #[error("Processor failed due to Mapping error: {0}")]
    MappingError(#[from] MappingError),
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to SummaryWriter error: {0}")]
    SummaryError(#[from] SummaryWriterError),
    #[error("Processor failed because control device '{0}' is not mapped in this file")]
    UnknownControl(String),
    #[error("Processor cannot read HDF5 files; rebuild with the `hdf5` feature enabled")]
    NoHdf5Support,
}
