use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    #[error("Cannot broadcast arrays of shape {0:?} and {1:?} together")]
    ShapeMismatch(Vec<usize>, Vec<usize>),
}

#[derive(Debug, Clone, Error)]
pub enum BinningError {
    #[error("Histogram was asked for zero bins along axis {0}")]
    ZeroBins(usize),
    #[error("Subsample size must be at least one event")]
    ZeroSubsample,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Could not open data file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Data source has no dataset named {0}")]
    MissingDataset(String),
    #[error("Dataset {0} has no sub-dataset named {1}")]
    MissingMember(String, String),
    #[error("Dataset {0} is missing the attribute {1}")]
    MissingAttribute(String, String),
    #[error("Attribute {1} of {0} is not a number: {2:?}")]
    BadAttribute(String, String, String),
    #[error("Sub-dataset {0} has shape {1:?}; expected {2} dimensions")]
    BadShape(String, Vec<usize>, usize),
    #[error("Data source failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Dataset {0} contains no sub-datasets")]
    EmptyDataset(String),
    #[error("Dataset {0} has unrecognized data type marker {1}; expected events or converted")]
    UnknownDataKind(String, String),
    #[error("Loading failed due to data source error: {0}")]
    SourceError(#[from] SourceError),
    #[error("Loading failed due to binning error: {0}")]
    BinningError(#[from] BinningError),
}

#[derive(Debug, Error)]
pub enum HDF5WriterError {
    #[error("HDF5Writer failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("HDF5Writer could not write a string attribute: {0}")]
    StringError(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}
