// Top level layout of a LaPD file
pub const MSI_GROUP_NAME: &str = "MSI";
pub const DATA_GROUP_NAME: &str = "Raw data + config";
pub const LAPD_VERSION_ATTR: &str = "LaPD HDF5 software version";

// Shared by every control device
pub const RUN_TIME_LIST: &str = "Run time list";
pub const SHOT_NUMBER_FIELD: &str = "Shot number";
pub const COMMAND_INDEX_FIELD: &str = "Command index";
pub const CONFIG_NAME_FIELD: &str = "Configuration name";

/// Value pattern shared by the command list devices: a decimal number
pub const CL_VALUE_PATTERN: &str = r"(?P<VAL>(\d+\.\d*|\.\d+|\d+\b))";
