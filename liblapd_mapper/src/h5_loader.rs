//! Reading of LaPD HDF5 files into the metadata tree.
//!
//! Only structure, shapes, datatypes and attributes are read; bulk data is
//! never touched.
use hdf5::types::{
    EnumType, FixedAscii, FixedUnicode, FloatSize, IntSize, TypeDescriptor, VarLenAscii,
    VarLenUnicode,
};
use hdf5::Location;
use std::collections::BTreeMap;
use std::path::Path;

use super::dtype::{CompoundField, DType};
use super::error::LoaderError;
use super::node::{AttrValue, Group};

/// Load the metadata tree of the HDF5 file at `path`
pub fn load_file(path: &Path) -> Result<Group, LoaderError> {
    if !path.exists() {
        return Err(LoaderError::BadFilePath(path.to_path_buf()));
    }
    let file = hdf5::File::open(path)?;
    let mut root = Group::root().with_file_name(&file.filename());
    load_group(&file, &mut root)?;
    spdlog::info!("Loaded metadata of {}", path.display());
    Ok(root)
}

fn load_group(h5_group: &hdf5::Group, group: &mut Group) -> Result<(), LoaderError> {
    load_attrs(h5_group, &group.path, &mut group.attrs)?;
    for name in h5_group.member_names()? {
        if let Ok(h5_sub) = h5_group.group(&name) {
            load_group(&h5_sub, group.add_group(&name))?;
        } else if let Ok(h5_dset) = h5_group.dataset(&name) {
            let descriptor = h5_dset.dtype()?.to_descriptor()?;
            let dtype = match to_dtype(&descriptor) {
                Some(dtype) => dtype,
                None => {
                    spdlog::warn!(
                        "Dataset {} has unsupported type {}, skipping",
                        h5_dset.name(),
                        descriptor
                    );
                    continue;
                }
            };
            let dset = group.add_dataset(&name, &h5_dset.shape(), dtype);
            load_attrs(&h5_dset, &dset.path, &mut dset.attrs)?;
        } else {
            spdlog::debug!("Member {name} of {} is neither group nor dataset", group.path);
        }
    }
    Ok(())
}

fn load_attrs(
    location: &Location,
    path: &str,
    attrs: &mut BTreeMap<String, AttrValue>,
) -> Result<(), LoaderError> {
    for name in location.attr_names()? {
        // one unreadable attribute should not cost the whole file
        match read_attr(location, path, &name) {
            Ok(value) => {
                attrs.insert(name, value);
            }
            Err(e) => spdlog::warn!("Skipping attribute '{name}' of {path}: {e}"),
        }
    }
    Ok(())
}

fn int_descriptor(size: IntSize, signed: bool) -> DType {
    match (size, signed) {
        (IntSize::U1, true) => DType::Int8,
        (IntSize::U2, true) => DType::Int16,
        (IntSize::U4, true) => DType::Int32,
        (IntSize::U8, true) => DType::Int64,
        (IntSize::U1, false) => DType::UInt8,
        (IntSize::U2, false) => DType::UInt16,
        (IntSize::U4, false) => DType::UInt32,
        (IntSize::U8, false) => DType::UInt64,
    }
}

fn enum_dtype(enum_type: &EnumType) -> DType {
    int_descriptor(enum_type.size, enum_type.signed)
}

/// Convert an HDF5 type description. `None` for types the maps never need.
pub fn to_dtype(descriptor: &TypeDescriptor) -> Option<DType> {
    let dtype = match descriptor {
        TypeDescriptor::Integer(size) => int_descriptor(*size, true),
        TypeDescriptor::Unsigned(size) => int_descriptor(*size, false),
        TypeDescriptor::Float(FloatSize::U4) => DType::Float32,
        TypeDescriptor::Float(FloatSize::U8) => DType::Float64,
        TypeDescriptor::Boolean => DType::Bool,
        TypeDescriptor::Enum(enum_type) => enum_dtype(enum_type),
        TypeDescriptor::Compound(compound) => {
            let mut fields = Vec::with_capacity(compound.fields.len());
            for field in compound.fields.iter() {
                fields.push(CompoundField::new(&field.name, to_dtype(&field.ty)?));
            }
            DType::Compound(fields)
        }
        TypeDescriptor::FixedArray(base, len) => match to_dtype(base)? {
            DType::Array(inner, mut shape) => {
                shape.insert(0, *len);
                DType::Array(inner, shape)
            }
            inner => DType::Array(Box::new(inner), vec![*len]),
        },
        TypeDescriptor::FixedAscii(len) => DType::FixedAscii(*len),
        TypeDescriptor::FixedUnicode(len) => DType::FixedUnicode(*len),
        TypeDescriptor::VarLenAscii => DType::VarLenAscii,
        TypeDescriptor::VarLenUnicode => DType::VarLenUnicode,
        _ => return None,
    };
    Some(dtype)
}

// Fixed length strings are read through a buffer at least as long as the
// stored string; longer strings are not expected in LaPD metadata.
const FIXED_STRING_BUFFERS: [usize; 3] = [256, 4096, 65536];

fn read_fixed_ascii<const N: usize>(attr: &hdf5::Attribute) -> hdf5::Result<Vec<Vec<u8>>> {
    Ok(attr
        .read_raw::<FixedAscii<N>>()?
        .iter()
        .map(|s| s.as_bytes().to_vec())
        .collect())
}

fn read_fixed_unicode<const N: usize>(attr: &hdf5::Attribute) -> hdf5::Result<Vec<String>> {
    Ok(attr
        .read_raw::<FixedUnicode<N>>()?
        .iter()
        .map(|s| s.as_str().to_string())
        .collect())
}

fn strings_value(mut values: Vec<String>, scalar: bool) -> AttrValue {
    match (scalar, values.len()) {
        (true, 1) => AttrValue::Str(values.remove(0)),
        _ => AttrValue::StrArray(values),
    }
}

fn read_attr(location: &Location, path: &str, name: &str) -> Result<AttrValue, LoaderError> {
    let attr = location.attr(name)?;
    let descriptor = attr.dtype()?.to_descriptor()?;
    let scalar = attr.is_scalar();
    let unsupported = || LoaderError::UnsupportedAttribute {
        path: path.to_string(),
        attr: name.to_string(),
        dtype: descriptor.to_string(),
    };

    let value = match &descriptor {
        TypeDescriptor::Integer(_) => {
            let values = attr.read_raw::<i64>()?;
            if scalar && values.len() == 1 {
                AttrValue::Int(values[0])
            } else {
                AttrValue::IntArray(values)
            }
        }
        TypeDescriptor::Unsigned(_) => {
            let values = attr.read_raw::<u64>()?;
            if scalar && values.len() == 1 {
                AttrValue::UInt(values[0])
            } else {
                AttrValue::UIntArray(values)
            }
        }
        TypeDescriptor::Float(_) => {
            let values = attr.read_raw::<f64>()?;
            if scalar && values.len() == 1 {
                AttrValue::Float(values[0])
            } else {
                AttrValue::FloatArray(values)
            }
        }
        TypeDescriptor::Boolean => {
            let values = attr.read_raw::<bool>()?;
            if scalar && values.len() == 1 {
                AttrValue::Bool(values[0])
            } else {
                AttrValue::IntArray(values.iter().map(|b| i64::from(*b)).collect())
            }
        }
        TypeDescriptor::VarLenAscii => strings_value(
            attr.read_raw::<VarLenAscii>()?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            scalar,
        ),
        TypeDescriptor::VarLenUnicode => strings_value(
            attr.read_raw::<VarLenUnicode>()?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            scalar,
        ),
        TypeDescriptor::FixedAscii(len) => {
            let mut values = match FIXED_STRING_BUFFERS.iter().copied().find(|size| *size >= *len) {
                Some(256) => read_fixed_ascii::<256>(&attr)?,
                Some(4096) => read_fixed_ascii::<4096>(&attr)?,
                Some(_) => read_fixed_ascii::<65536>(&attr)?,
                None => return Err(unsupported()),
            };
            if scalar && values.len() == 1 {
                AttrValue::Bytes(values.remove(0))
            } else {
                AttrValue::StrArray(
                    values
                        .iter()
                        .map(|b| String::from_utf8_lossy(b).trim_end_matches('\0').to_string())
                        .collect(),
                )
            }
        }
        TypeDescriptor::FixedUnicode(len) => {
            let values = match FIXED_STRING_BUFFERS.iter().copied().find(|size| *size >= *len) {
                Some(256) => read_fixed_unicode::<256>(&attr)?,
                Some(4096) => read_fixed_unicode::<4096>(&attr)?,
                Some(_) => read_fixed_unicode::<65536>(&attr)?,
                None => return Err(unsupported()),
            };
            strings_value(values, scalar)
        }
        _ => return Err(unsupported()),
    };
    Ok(value)
}
