use hdf5::types::{FixedAscii, VarLenAscii, VarLenUnicode};
use hdf5::{File, Group, H5Type, Location};
use ndarray::{Array3, Ix3};
use std::path::Path;

use super::binning::EventRecord;
use super::error::SourceError;
use super::source::{parse_attr_f64, DataSource};

/// Row of a raw event table. HDF5 matches compound fields by name, so only these three
/// columns are read whatever else the table holds.
#[derive(H5Type, Debug, Clone, Copy)]
#[repr(C)]
struct EventRow {
    x: f64,
    y: f64,
    time: f64,
}

impl From<EventRow> for EventRecord {
    fn from(row: EventRow) -> Self {
        EventRecord::new(row.x, row.y, row.time)
    }
}

/// An HDF5 data file written by the Themis acquisition software.
///
/// Layout:
///
/// ```text
/// scan.h5
/// dataset_key - lensmode, Kinetic Energy, Pass Energy, TITLE
/// |---- events(dset, compound x/y/time) - FIELD_2_FACTOR, FIELD_2_OFFSET
/// dataset_key
/// |---- converted(dset, 3D) - minimumenergy, maximumenergy, maximumangle
/// ```
///
/// The file is closed when the ThemisFile is dropped.
#[derive(Debug)]
pub struct ThemisFile {
    file_handle: File,
}

impl ThemisFile {
    /// Open a file for reading
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        if !path.exists() {
            return Err(SourceError::BadFilePath(path.to_path_buf()));
        }
        let file_handle = File::open(path)?;
        spdlog::info!(
            "Opened Themis file {} ({})",
            path.to_string_lossy(),
            human_bytes::human_bytes(file_handle.size() as f64)
        );
        Ok(Self { file_handle })
    }

    fn group(&self, key: &str) -> Result<Group, SourceError> {
        self.file_handle
            .group(key)
            .map_err(|_| SourceError::MissingDataset(key.to_string()))
    }

    fn dataset(&self, key: &str, member: &str) -> Result<hdf5::Dataset, SourceError> {
        self.group(key)?
            .dataset(member)
            .map_err(|_| SourceError::MissingMember(key.to_string(), member.to_string()))
    }
}

/// Read a numeric scalar attribute, whatever its stored numeric type. A string attribute is
/// parsed as a number.
fn read_f64_attr(location: &Location, owner: &str, name: &str) -> Result<f64, SourceError> {
    let attr = location
        .attr(name)
        .map_err(|_| SourceError::MissingAttribute(owner.to_string(), name.to_string()))?;
    match attr.read_scalar::<f64>() {
        Ok(value) => Ok(value),
        Err(e) => match read_string_attr(location, owner, name) {
            Ok(text) => parse_attr_f64(owner, name, &text),
            Err(_) => Err(e.into()),
        },
    }
}

/// Read a string attribute stored as variable length UTF-8 or ASCII, or fixed length ASCII.
///
/// Fixed length strings are read into 1024 bytes: trailing NULs are stripped and anything
/// past 1024 bytes is cut off.
fn read_string_attr(location: &Location, owner: &str, name: &str) -> Result<String, SourceError> {
    let attr = location
        .attr(name)
        .map_err(|_| SourceError::MissingAttribute(owner.to_string(), name.to_string()))?;
    let value = if let Ok(value) = attr.read_scalar::<VarLenUnicode>() {
        value.as_str().to_string()
    } else if let Ok(value) = attr.read_scalar::<VarLenAscii>() {
        value.as_str().to_string()
    } else {
        attr.read_scalar::<FixedAscii<1024>>()?.as_str().to_string()
    };
    Ok(value.trim_end_matches('\0').to_string())
}

impl DataSource for ThemisFile {
    fn dataset_keys(&self) -> Result<Vec<String>, SourceError> {
        let mut keys = self.file_handle.member_names()?;
        keys.sort();
        Ok(keys)
    }

    fn members(&self, key: &str) -> Result<Vec<String>, SourceError> {
        let mut names = self.group(key)?.member_names()?;
        names.sort();
        Ok(names)
    }

    fn group_attr_string(&self, key: &str, name: &str) -> Result<String, SourceError> {
        let group = self.group(key)?;
        match read_string_attr(&group, key, name) {
            Ok(value) => Ok(value),
            // Some acquisition versions store energies as numbers
            Err(SourceError::HDF5Error(_)) => Ok(read_f64_attr(&group, key, name)?.to_string()),
            Err(e) => Err(e),
        }
    }

    fn dataset_attr_f64(&self, key: &str, member: &str, name: &str) -> Result<f64, SourceError> {
        let dataset = self.dataset(key, member)?;
        read_f64_attr(&dataset, &format!("{key}/{member}"), name)
    }

    fn read_events(&self, key: &str, member: &str) -> Result<Vec<EventRecord>, SourceError> {
        let rows = self.dataset(key, member)?.read_raw::<EventRow>()?;
        spdlog::info!("Read {} events from {key}/{member}", rows.len());
        Ok(rows.into_iter().map(EventRecord::from).collect())
    }

    fn read_cube(&self, key: &str, member: &str) -> Result<Array3<f64>, SourceError> {
        let dataset = self.dataset(key, member)?;
        let shape = dataset.shape();
        if shape.len() != 3 {
            return Err(SourceError::BadShape(format!("{key}/{member}"), shape, 3));
        }
        Ok(dataset.read::<f64, Ix3>()?)
    }
}
