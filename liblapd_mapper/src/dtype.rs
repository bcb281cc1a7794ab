use serde::{Serialize, Serializer};
use std::fmt;

/// A named member of a compound datatype
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundField {
    pub name: String,
    pub dtype: DType,
}

impl CompoundField {
    pub fn new(name: &str, dtype: DType) -> Self {
        Self {
            name: name.to_string(),
            dtype,
        }
    }
}

/// The subset of HDF5 datatypes found in LaPD files.
///
/// Rendering follows numpy naming, since that is how the LaPD tooling has
/// always reported dtypes (`int32`, `float64`, `S12`, `<U24`, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum DType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Bool,
    FixedAscii(usize),
    FixedUnicode(usize),
    VarLenAscii,
    VarLenUnicode,
    Array(Box<DType>, Vec<usize>),
    Compound(Vec<CompoundField>),
}

impl DType {
    /// Build a compound dtype from (name, dtype) pairs, keeping their order
    pub fn compound(fields: &[(&str, DType)]) -> Self {
        DType::Compound(
            fields
                .iter()
                .map(|(name, dtype)| CompoundField::new(name, dtype.clone()))
                .collect(),
        )
    }

    /// Get the dtype of a compound member. None if this is not a compound or
    /// the member does not exist.
    pub fn field(&self, name: &str) -> Option<&DType> {
        match self {
            DType::Compound(fields) => fields.iter().find(|f| f.name == name).map(|f| &f.dtype),
            _ => None,
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Sub-array shape of this dtype. Empty for anything but a fixed array.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            DType::Array(_, dims) => dims.clone(),
            _ => vec![],
        }
    }

    /// The element type with any sub-array shape stripped
    pub fn base(&self) -> &DType {
        match self {
            DType::Array(base, _) => base.base(),
            _ => self,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Int8 => write!(f, "int8"),
            DType::Int16 => write!(f, "int16"),
            DType::Int32 => write!(f, "int32"),
            DType::Int64 => write!(f, "int64"),
            DType::UInt8 => write!(f, "uint8"),
            DType::UInt16 => write!(f, "uint16"),
            DType::UInt32 => write!(f, "uint32"),
            DType::UInt64 => write!(f, "uint64"),
            DType::Float32 => write!(f, "float32"),
            DType::Float64 => write!(f, "float64"),
            DType::Bool => write!(f, "bool"),
            DType::FixedAscii(n) => write!(f, "S{n}"),
            DType::FixedUnicode(n) => write!(f, "<U{n}"),
            DType::VarLenAscii | DType::VarLenUnicode => write!(f, "str"),
            DType::Array(base, dims) => {
                let dims: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                write!(f, "({}){}", dims.join(","), base)
            }
            DType::Compound(fields) => {
                write!(f, "{{")?;
                for (idx, field) in fields.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{}': {}", field.name, field.dtype)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Serialize for DType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_fields() {
        let dtype = DType::compound(&[
            ("Shot number", DType::Int32),
            ("x", DType::Float64),
            ("Motion list", DType::FixedAscii(120)),
        ]);
        assert!(dtype.has_field("x"));
        assert!(!dtype.has_field("y"));
        assert_eq!(dtype.field("Shot number"), Some(&DType::Int32));
        assert_eq!(dtype.field("Motion list"), Some(&DType::FixedAscii(120)));
        assert!(dtype.field("Shot number").unwrap().shape().is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::FixedUnicode(24).to_string(), "<U24");
        assert_eq!(DType::FixedAscii(8).to_string(), "S8");
        assert_eq!(
            DType::Array(Box::new(DType::Float32), vec![3]).to_string(),
            "(3)float32"
        );
        let dtype = DType::compound(&[("Shot number", DType::Int32), ("x", DType::Float64)]);
        assert_eq!(dtype.to_string(), "{'Shot number': int32, 'x': float64}");
    }

    #[test]
    fn test_array_shape() {
        let dtype = DType::Array(Box::new(DType::Int32), vec![1]);
        assert_eq!(dtype.shape(), vec![1]);
        assert_eq!(dtype.base(), &DType::Int32);
    }
}
