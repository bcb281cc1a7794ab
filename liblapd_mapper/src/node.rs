//! The in-memory metadata tree the mappers work on.
//!
//! A loaded tree holds everything the mapping needs from an HDF5 file (group
//! hierarchy, attributes, dataset shapes and dtypes) and nothing else; sample
//! data is never read. The builder methods double as the way synthetic LaPD
//! files are fabricated for tests.
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use super::dtype::DType;

/// A raw HDF5 attribute value.
///
/// LaPD writes most strings as fixed-length byte strings, which are kept as
/// `Bytes` until something asks for them decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Bytes(Vec<u8>),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    IntArray(Vec<i64>),
    UIntArray(Vec<u64>),
    FloatArray(Vec<f64>),
    StrArray(Vec<String>),
}

impl AttrValue {
    /// Make a byte-string attribute, the way the LaPD DAQ stores text
    pub fn bytes(value: &str) -> Self {
        AttrValue::Bytes(value.as_bytes().to_vec())
    }

    /// Decode a string attribute. Byte strings are decoded as UTF-8 with
    /// trailing NUL padding removed.
    pub fn as_string(&self) -> Option<String> {
        match self {
            AttrValue::Str(s) => Some(s.clone()),
            AttrValue::Bytes(b) => Some(decode_bytes(b)),
            AttrValue::StrArray(v) if v.len() == 1 => Some(v[0].clone()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            AttrValue::UInt(v) => i64::try_from(*v).ok(),
            AttrValue::Bool(v) => Some(*v as i64),
            AttrValue::IntArray(v) if v.len() == 1 => Some(v[0]),
            AttrValue::UIntArray(v) if v.len() == 1 => i64::try_from(v[0]).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::FloatArray(v) if v.len() == 1 => Some(v[0]),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Integer array view of the attribute; scalars become one-element arrays
    pub fn as_i64_vec(&self) -> Option<Vec<i64>> {
        match self {
            AttrValue::IntArray(v) => Some(v.clone()),
            AttrValue::UIntArray(v) => v.iter().map(|x| i64::try_from(*x).ok()).collect(),
            _ => self.as_i64().map(|v| vec![v]),
        }
    }

    /// Decode into a normalized metadata value
    pub fn to_meta(&self) -> MetaValue {
        match self {
            AttrValue::Str(s) => MetaValue::Str(s.clone()),
            AttrValue::Bytes(b) => MetaValue::Str(decode_bytes(b)),
            AttrValue::Int(v) => MetaValue::Int(*v),
            AttrValue::UInt(v) => match i64::try_from(*v) {
                Ok(v) => MetaValue::Int(v),
                Err(_) => MetaValue::Float(*v as f64),
            },
            AttrValue::Float(v) => MetaValue::Float(*v),
            AttrValue::Bool(v) => MetaValue::Bool(*v),
            AttrValue::IntArray(v) => {
                MetaValue::List(v.iter().map(|x| MetaValue::Int(*x)).collect())
            }
            AttrValue::UIntArray(v) => {
                MetaValue::List(v.iter().map(|x| AttrValue::UInt(*x).to_meta()).collect())
            }
            AttrValue::FloatArray(v) => {
                MetaValue::List(v.iter().map(|x| MetaValue::Float(*x)).collect())
            }
            AttrValue::StrArray(v) => {
                MetaValue::List(v.iter().map(|x| MetaValue::Str(x.clone())).collect())
            }
        }
    }
}

fn decode_bytes(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|b| *b != 0)
        .map(|idx| idx + 1)
        .unwrap_or(0);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value as i64)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::UInt(value as u64)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(value: Vec<i64>) -> Self {
        AttrValue::IntArray(value)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(value: Vec<f64>) -> Self {
        AttrValue::FloatArray(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::StrArray(value)
    }
}

/// Decoded, normalized metadata as it appears in a mapping
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum MetaValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<MetaValue>),
    Map(BTreeMap<String, MetaValue>),
}

/// Decode every attribute of a group or dataset
pub fn decode_attrs(attrs: &BTreeMap<String, AttrValue>) -> BTreeMap<String, MetaValue> {
    attrs
        .iter()
        .map(|(key, val)| (key.clone(), val.to_meta()))
        .collect()
}

/// Join a member name onto an absolute HDF5 path
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Metadata of a single dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub path: String,
    pub shape: Vec<usize>,
    pub dtype: DType,
    pub attrs: BTreeMap<String, AttrValue>,
}

impl Dataset {
    pub fn new(name: &str, path: &str, shape: &[usize], dtype: DType) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            shape: shape.to_vec(),
            dtype,
            attrs: BTreeMap::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) -> &mut Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    /// Shape of a single row, i.e. the dataset shape without the leading shot axis
    pub fn row_shape(&self) -> Vec<usize> {
        self.shape.iter().skip(1).copied().collect()
    }
}

/// An owned member of a group, as taken out of or put into a tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group(Group),
    Dataset(Dataset),
}

/// A borrowed member of a group
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Group(&'a Group),
    Dataset(&'a Dataset),
}

impl NodeRef<'_> {
    pub fn path(&self) -> &str {
        match self {
            NodeRef::Group(g) => &g.path,
            NodeRef::Dataset(d) => &d.path,
        }
    }
}

/// Metadata of an HDF5 group and everything below it.
///
/// A member name is either a subgroup or a dataset, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub path: String,
    pub file_name: Option<String>,
    pub attrs: BTreeMap<String, AttrValue>,
    groups: BTreeMap<String, Group>,
    datasets: BTreeMap<String, Dataset>,
}

impl Group {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            file_name: None,
            attrs: BTreeMap::new(),
            groups: BTreeMap::new(),
            datasets: BTreeMap::new(),
        }
    }

    /// The root group of a file
    pub fn root() -> Self {
        Self::new("/", "/")
    }

    pub fn with_file_name(mut self, file_name: &str) -> Self {
        self.file_name = Some(file_name.to_string());
        self
    }

    /// Get (or create) a subgroup. Replaces a dataset of the same name.
    pub fn add_group(&mut self, name: &str) -> &mut Group {
        let path = join_path(&self.path, name);
        self.datasets.remove(name);
        self.groups
            .entry(name.to_string())
            .or_insert_with(|| Group::new(name, &path))
    }

    /// Create a dataset, replacing any member of the same name
    pub fn add_dataset(&mut self, name: &str, shape: &[usize], dtype: DType) -> &mut Dataset {
        let dset = Dataset::new(name, &join_path(&self.path, name), shape, dtype);
        self.groups.remove(name);
        match self.datasets.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(dset);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(dset),
        }
    }

    /// Insert an already built member
    pub fn insert(&mut self, node: Node) {
        match node {
            Node::Group(group) => {
                self.datasets.remove(&group.name);
                self.groups.insert(group.name.clone(), group);
            }
            Node::Dataset(dset) => {
                self.groups.remove(&dset.name);
                self.datasets.insert(dset.name.clone(), dset);
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.groups
            .remove(name)
            .map(Node::Group)
            .or_else(|| self.datasets.remove(name).map(Node::Dataset))
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) -> &mut Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<AttrValue> {
        self.attrs.remove(name)
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name) || self.datasets.contains_key(name)
    }

    pub fn member(&self, name: &str) -> Option<NodeRef<'_>> {
        self.groups
            .get(name)
            .map(NodeRef::Group)
            .or_else(|| self.datasets.get(name).map(NodeRef::Dataset))
    }

    /// Every member, ordered by name like HDF5's default name index
    pub fn members(&self) -> Vec<NodeRef<'_>> {
        let mut members: Vec<(&String, NodeRef<'_>)> = self
            .groups
            .iter()
            .map(|(name, g)| (name, NodeRef::Group(g)))
            .chain(self.datasets.iter().map(|(name, d)| (name, NodeRef::Dataset(d))))
            .collect();
        members.sort_by(|a, b| a.0.cmp(b.0));
        members.into_iter().map(|(_, node)| node).collect()
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        self.datasets.get(name)
    }

    pub fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .groups
            .keys()
            .chain(self.datasets.keys())
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn subgroup_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    pub fn dataset_names(&self) -> Vec<String> {
        self.datasets.keys().cloned().collect()
    }

    /// Look up a member by a path relative to this group (`a/b/c`)
    pub fn get(&self, path: &str) -> Option<NodeRef<'_>> {
        let mut parts = path.split('/').filter(|p| !p.is_empty()).peekable();
        let mut group = self;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                return group.member(part);
            }
            group = group.group(part)?;
        }
        None
    }
}
