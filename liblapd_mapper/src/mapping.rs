use serde::Serialize;

use super::dtype::DType;
use super::error::MappingError;
use super::node::Dataset;

/// Where one quantity lives: which datasets, which compound fields of them,
/// and the shape/dtype of a single shot's worth of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMap {
    #[serde(rename = "dset paths")]
    pub dset_paths: Vec<String>,
    #[serde(rename = "dset field")]
    pub dset_field: Vec<String>,
    pub shape: Vec<usize>,
    pub dtype: DType,
}

impl FieldMap {
    pub fn new(
        dset_paths: Vec<String>,
        dset_field: &[&str],
        shape: Vec<usize>,
        dtype: DType,
    ) -> Self {
        Self {
            dset_paths,
            dset_field: dset_field.iter().map(|f| f.to_string()).collect(),
            shape,
            dtype,
        }
    }
}

/// Get the dtype of a compound field, or fail the mapping of `device`
pub fn require_field<'a>(
    device: &str,
    dset: &'a Dataset,
    field: &str,
) -> Result<&'a DType, MappingError> {
    dset.dtype
        .field(field)
        .ok_or_else(|| MappingError::MissingField {
            device: device.to_string(),
            dataset: dset.path.clone(),
            field: field.to_string(),
        })
}
