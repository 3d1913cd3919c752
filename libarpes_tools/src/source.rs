use ndarray::Array3;
use std::collections::BTreeMap;

use super::binning::EventRecord;
use super::error::SourceError;

/// A hierarchical store of ARPES datasets.
///
/// Each top-level key is one measurement. It carries scalar attributes and holds one or more
/// named sub-datasets (raw events or converted data), which carry attributes of their own.
/// Every lookup of something that is not there fails with a [`SourceError`] naming it.
pub trait DataSource {
    /// All top-level dataset keys, sorted
    fn dataset_keys(&self) -> Result<Vec<String>, SourceError>;

    /// Names of the sub-datasets under `key`, sorted
    fn members(&self, key: &str) -> Result<Vec<String>, SourceError>;

    /// A string attribute on `key`. Numeric attributes come back as text.
    fn group_attr_string(&self, key: &str, name: &str) -> Result<String, SourceError>;

    /// A numeric attribute on a sub-dataset. Text holding a number is parsed.
    fn dataset_attr_f64(&self, key: &str, member: &str, name: &str) -> Result<f64, SourceError>;

    /// Read a raw event table with `x`, `y` and `time` columns
    fn read_events(&self, key: &str, member: &str) -> Result<Vec<EventRecord>, SourceError>;

    /// Read a 3D data cube
    fn read_cube(&self, key: &str, member: &str) -> Result<Array3<f64>, SourceError>;
}

/// Attribute value held by a [`MemorySource`]
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Float(f64),
    Text(String),
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Parse a number stored as text in the attribute `name` of `owner`
pub(crate) fn parse_attr_f64(owner: &str, name: &str, text: &str) -> Result<f64, SourceError> {
    text.trim().parse().map_err(|_| {
        SourceError::BadAttribute(owner.to_string(), name.to_string(), text.to_string())
    })
}

#[derive(Debug, Clone)]
enum MemoryData {
    Events(Vec<EventRecord>),
    Cube(Array3<f64>),
}

#[derive(Debug, Clone)]
struct MemoryMember {
    data: MemoryData,
    attrs: BTreeMap<String, AttrValue>,
}

#[derive(Debug, Clone, Default)]
struct MemoryGroup {
    attrs: BTreeMap<String, AttrValue>,
    members: BTreeMap<String, MemoryMember>,
}

/// A [`DataSource`] held entirely in memory.
///
/// Useful when the data was already read by other means, and for testing.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    groups: BTreeMap<String, MemoryGroup>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute on a top-level key, creating the key if needed
    pub fn with_group_attr(mut self, key: &str, name: &str, value: impl Into<AttrValue>) -> Self {
        self.groups
            .entry(key.to_string())
            .or_default()
            .attrs
            .insert(name.to_string(), value.into());
        self
    }

    /// Add a raw event table under `key`
    pub fn with_events(mut self, key: &str, member: &str, events: Vec<EventRecord>) -> Self {
        self.insert_member(key, member, MemoryData::Events(events));
        self
    }

    /// Add a data cube under `key`
    pub fn with_cube(mut self, key: &str, member: &str, cube: Array3<f64>) -> Self {
        self.insert_member(key, member, MemoryData::Cube(cube));
        self
    }

    /// Set an attribute on a sub-dataset. The sub-dataset must have been added already.
    pub fn with_dataset_attr(
        mut self,
        key: &str,
        member: &str,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> Self {
        if let Some(m) = self
            .groups
            .get_mut(key)
            .and_then(|group| group.members.get_mut(member))
        {
            m.attrs.insert(name.to_string(), value.into());
        }
        self
    }

    fn insert_member(&mut self, key: &str, member: &str, data: MemoryData) {
        self.groups.entry(key.to_string()).or_default().members.insert(
            member.to_string(),
            MemoryMember {
                data,
                attrs: BTreeMap::new(),
            },
        );
    }

    fn group(&self, key: &str) -> Result<&MemoryGroup, SourceError> {
        self.groups
            .get(key)
            .ok_or_else(|| SourceError::MissingDataset(key.to_string()))
    }

    fn member(&self, key: &str, member: &str) -> Result<&MemoryMember, SourceError> {
        self.group(key)?
            .members
            .get(member)
            .ok_or_else(|| SourceError::MissingMember(key.to_string(), member.to_string()))
    }

    fn group_attr(&self, key: &str, name: &str) -> Result<&AttrValue, SourceError> {
        self.group(key)?
            .attrs
            .get(name)
            .ok_or_else(|| SourceError::MissingAttribute(key.to_string(), name.to_string()))
    }
}

impl DataSource for MemorySource {
    fn dataset_keys(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.groups.keys().cloned().collect())
    }

    fn members(&self, key: &str) -> Result<Vec<String>, SourceError> {
        Ok(self.group(key)?.members.keys().cloned().collect())
    }

    fn group_attr_string(&self, key: &str, name: &str) -> Result<String, SourceError> {
        match self.group_attr(key, name)? {
            AttrValue::Float(value) => Ok(value.to_string()),
            AttrValue::Text(text) => Ok(text.clone()),
        }
    }

    fn dataset_attr_f64(&self, key: &str, member: &str, name: &str) -> Result<f64, SourceError> {
        let owner = format!("{key}/{member}");
        match self.member(key, member)?.attrs.get(name) {
            Some(AttrValue::Float(value)) => Ok(*value),
            Some(AttrValue::Text(text)) => parse_attr_f64(&owner, name, text),
            None => Err(SourceError::MissingAttribute(owner, name.to_string())),
        }
    }

    fn read_events(&self, key: &str, member: &str) -> Result<Vec<EventRecord>, SourceError> {
        match &self.member(key, member)?.data {
            MemoryData::Events(events) => Ok(events.clone()),
            MemoryData::Cube(cube) => Err(SourceError::BadShape(
                format!("{key}/{member}"),
                cube.shape().to_vec(),
                1,
            )),
        }
    }

    fn read_cube(&self, key: &str, member: &str) -> Result<Array3<f64>, SourceError> {
        match &self.member(key, member)?.data {
            MemoryData::Cube(cube) => Ok(cube.clone()),
            MemoryData::Events(events) => Err(SourceError::BadShape(
                format!("{key}/{member}"),
                vec![events.len()],
                3,
            )),
        }
    }
}
