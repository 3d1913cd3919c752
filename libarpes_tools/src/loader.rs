use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use super::binning::{
    bin_events, reconstruct_axes, BinningOptions, ConversionBounds, ConvertedCube, HistogramResult,
    TimeCalibration,
};
use super::constants::*;
use super::error::LoadError;
use super::source::DataSource;
use super::themis_file::ThemisFile;

/// The kind of data held by a dataset, marked by the name of its sub-dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Events,
    Converted,
}

impl FromStr for DataKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            EVENTS_NAME => Ok(Self::Events),
            CONVERTED_NAME | CONVERSION_NAME => Ok(Self::Converted),
            _ => Err(s.to_string()),
        }
    }
}

impl Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Events => write!(f, "events"),
            Self::Converted => write!(f, "converted"),
        }
    }
}

/// A loaded dataset.
///
/// Raw events come back histogrammed with their bin edges, converted data comes back as
/// the original cube with its reconstructed axes.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedData {
    Events(HistogramResult),
    Converted(ConvertedCube),
}

impl LoadedData {
    pub fn kind(&self) -> DataKind {
        match self {
            Self::Events(_) => DataKind::Events,
            Self::Converted(_) => DataKind::Converted,
        }
    }
}

/// Find the sub-dataset marking the data kind of `dataset`.
///
/// The last member (in sorted order) is taken as the marker.
pub fn detect_kind<S: DataSource>(
    source: &S,
    dataset: &str,
) -> Result<(DataKind, String), LoadError> {
    let member = source
        .members(dataset)?
        .pop()
        .ok_or_else(|| LoadError::EmptyDataset(dataset.to_string()))?;
    let kind = DataKind::from_str(&member)
        .map_err(|marker| LoadError::UnknownDataKind(dataset.to_string(), marker))?;
    Ok((kind, member))
}

/// Read the time calibration of a raw event table
pub fn read_time_calibration<S: DataSource>(
    source: &S,
    dataset: &str,
    member: &str,
) -> Result<TimeCalibration, LoadError> {
    Ok(TimeCalibration {
        factor: source.dataset_attr_f64(dataset, member, TIME_FACTOR_ATTR)?,
        offset: source.dataset_attr_f64(dataset, member, TIME_OFFSET_ATTR)?,
    })
}

/// Read the energy and angle bounds of converted data
pub fn read_conversion_bounds<S: DataSource>(
    source: &S,
    dataset: &str,
    member: &str,
) -> Result<ConversionBounds, LoadError> {
    Ok(ConversionBounds {
        minimum_energy: source.dataset_attr_f64(dataset, member, MINIMUM_ENERGY_ATTR)?,
        maximum_energy: source.dataset_attr_f64(dataset, member, MAXIMUM_ENERGY_ATTR)?,
        maximum_angle: source.dataset_attr_f64(dataset, member, MAXIMUM_ANGLE_ATTR)?,
    })
}

/// Load one dataset from a source.
///
/// Raw events are histogrammed according to `options`; `options` is unused for converted data.
pub fn load_dataset<S: DataSource>(
    source: &S,
    dataset: &str,
    options: &BinningOptions,
) -> Result<LoadedData, LoadError> {
    let (kind, member) = detect_kind(source, dataset)?;
    spdlog::info!("Dataset {dataset} holds {kind} data in {member}");
    match kind {
        DataKind::Events => {
            let calibration = read_time_calibration(source, dataset, &member)?;
            let events = source.read_events(dataset, &member)?;
            Ok(LoadedData::Events(bin_events(&events, &calibration, options)?))
        }
        DataKind::Converted => {
            let bounds = read_conversion_bounds(source, dataset, &member)?;
            let cube = source.read_cube(dataset, &member)?;
            Ok(LoadedData::Converted(reconstruct_axes(cube, &bounds)))
        }
    }
}

/// Load one dataset from a Themis HDF5 file. The file is closed before returning.
pub fn load_themis(
    path: &Path,
    dataset: &str,
    options: &BinningOptions,
) -> Result<LoadedData, LoadError> {
    let file = ThemisFile::open(path)?;
    load_dataset(&file, dataset, options)
}
