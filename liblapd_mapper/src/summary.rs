use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use super::controls::ControlMaps;
use super::digitizers::DigiMaps;
use super::error::SummaryWriterError;
use super::mapper::{ExpInfo, HdfMap, RunInfo};
use super::msi::MsiMaps;
use super::node::MetaValue;

/// A serializable snapshot of a HdfMap
#[derive(Debug, Clone, Serialize)]
pub struct MapSummary {
    pub file: String,
    #[serde(rename = "LaPD HDF5 software version")]
    pub version: String,
    #[serde(rename = "run info")]
    pub run_info: RunInfo,
    #[serde(rename = "exp info")]
    pub exp_info: ExpInfo,
    #[serde(rename = "main digitizer")]
    pub main_digitizer: Option<String>,
    pub attrs: BTreeMap<String, BTreeMap<String, MetaValue>>,
    pub msi: MsiMaps,
    pub digitizers: DigiMaps,
    pub controls: ControlMaps,
    pub unknowns: Vec<String>,
    pub warnings: Vec<String>,
}

impl MapSummary {
    pub fn new(map: &HdfMap) -> Self {
        Self {
            file: map.filename().to_string(),
            version: map.hdf_version().to_string(),
            run_info: map.run_info(),
            exp_info: map.exp_info(),
            main_digitizer: map.main_digitizer().map(|d| d.info().group_name.clone()),
            attrs: map.attrs().clone(),
            msi: map.msi().clone(),
            digitizers: map.digitizers().clone(),
            controls: map.controls().clone(),
            unknowns: map.unknowns().to_vec(),
            warnings: map.warnings().to_vec(),
        }
    }

    pub fn to_yaml(&self) -> Result<String, SummaryWriterError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the summary in a yaml file
    pub fn write_summary(&self, path: &Path) -> Result<(), SummaryWriterError> {
        let mut summary_file = std::fs::File::create(path)?;
        summary_file.write_all(self.to_yaml()?.as_bytes())?;
        Ok(())
    }
}
