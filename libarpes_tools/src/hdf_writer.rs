use hdf5::types::VarLenUnicode;
use hdf5::{File, Group};
use std::path::Path;
use std::str::FromStr;

use super::binning::{ConvertedCube, HistogramResult};
use super::error::HDF5WriterError;
use super::loader::LoadedData;

const COUNTS_NAME: &str = "counts";
const X_EDGES_NAME: &str = "x_edges";
const Y_EDGES_NAME: &str = "y_edges";
const TIME_EDGES_NAME: &str = "time_edges";
const DATA_NAME: &str = "data";
const X_AXIS_NAME: &str = "x_axis";
const Y_AXIS_NAME: &str = "y_axis";
const ENERGY_AXIS_NAME: &str = "energy_axis";

/// This is the version of the output format
const FORMAT_VERSION: &str = "1.0";

/// Writes loaded datasets to a new HDF5 file.
///
/// Structure
/// ```text
/// output.h5
/// dataset_key(events) - kind, version
/// |---- counts(dset)
/// |---- x_edges(dset)
/// |---- y_edges(dset)
/// |---- time_edges(dset)
/// dataset_key(converted) - kind, version
/// |---- data(dset)
/// |---- x_axis(dset) - units
/// |---- y_axis(dset) - units
/// |---- energy_axis(dset) - units
/// ```
#[derive(Debug)]
pub struct HDFWriter {
    file_handle: File,
    version: String,
}

impl HDFWriter {
    /// Create the writer, creating (or truncating) the file at path
    pub fn new(path: &Path) -> Result<Self, HDF5WriterError> {
        let file_handle = File::create(path)?;
        Ok(Self {
            file_handle,
            version: format!("{}:{}", env!("CARGO_PKG_NAME"), FORMAT_VERSION),
        })
    }

    /// Write a loaded dataset into a group named `dataset`
    pub fn write(&self, dataset: &str, data: &LoadedData) -> Result<(), HDF5WriterError> {
        let group = self.file_handle.create_group(dataset)?;
        write_str_attr(&group, "kind", &data.kind().to_string())?;
        write_str_attr(&group, "version", &self.version)?;
        match data {
            LoadedData::Events(hist) => write_histogram(&group, hist)?,
            LoadedData::Converted(cube) => write_converted(&group, cube)?,
        }
        spdlog::info!("Wrote dataset {dataset} to {}", self.file_handle.filename());
        Ok(())
    }

    /// Flush and close the file
    pub fn close(self) -> Result<(), HDF5WriterError> {
        self.file_handle.flush()?;
        Ok(())
    }
}

fn write_str_attr(group: &Group, name: &str, value: &str) -> Result<(), HDF5WriterError> {
    let value =
        VarLenUnicode::from_str(value).map_err(|e| HDF5WriterError::StringError(e.to_string()))?;
    group
        .new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn write_histogram(group: &Group, hist: &HistogramResult) -> Result<(), HDF5WriterError> {
    group
        .new_dataset_builder()
        .with_data(&hist.counts)
        .create(COUNTS_NAME)?;
    for (name, edges) in [X_EDGES_NAME, Y_EDGES_NAME, TIME_EDGES_NAME]
        .iter()
        .zip(hist.edges.iter())
    {
        group.new_dataset_builder().with_data(edges).create(*name)?;
    }
    Ok(())
}

fn write_converted(group: &Group, cube: &ConvertedCube) -> Result<(), HDF5WriterError> {
    group
        .new_dataset_builder()
        .with_data(&cube.data)
        .create(DATA_NAME)?;
    for (name, axis, units) in [
        (X_AXIS_NAME, &cube.x_axis, "deg"),
        (Y_AXIS_NAME, &cube.y_axis, "deg"),
        (ENERGY_AXIS_NAME, &cube.energy_axis, "eV"),
    ] {
        let dset = group.new_dataset_builder().with_data(axis).create(name)?;
        let units =
            VarLenUnicode::from_str(units).map_err(|e| HDF5WriterError::StringError(e.to_string()))?;
        dset.new_attr::<VarLenUnicode>()
            .create("units")?
            .write_scalar(&units)?;
    }
    Ok(())
}
