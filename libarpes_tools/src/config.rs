use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::binning::BinningOptions;
use super::error::ConfigError;

/// Structure representing a load job. Contains the file, the dataset and the binning options.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub file_path: PathBuf,
    pub dataset: String,
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub binning: BinningOptions,
}

impl Default for Config {
    /// Generate a new Config object. Paths and dataset will be empty/invalid
    fn default() -> Self {
        Self {
            file_path: PathBuf::from("None"),
            dataset: String::from(""),
            output_path: None,
            binning: BinningOptions::default(),
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(self)?;
        std::fs::write(config_path, yaml_str)?;
        Ok(())
    }

    pub fn is_bins_valid(&self) -> bool {
        self.binning.bins.iter().all(|&n| n > 0)
    }

    /// A subsample must hold at least one event; `None` (no subsampling) is always valid
    pub fn is_subsample_size_valid(&self) -> bool {
        self.binning.subsample_size != Some(0)
    }
}
