use std::fmt::Display;

use super::constants::{KINETIC_ENERGY_ATTR, LENS_MODE_ATTR, PASS_ENERGY_ATTR, TITLE_ATTR};
use super::error::SourceError;
use super::source::DataSource;

/// Summary of one dataset in a file, taken from the attributes written by the acquisition
/// software. Energies are kept as written.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    pub name: String,
    pub lens_mode: String,
    pub kinetic_energy: String,
    pub pass_energy: String,
    pub data_type: String,
    pub comment: String,
}

impl DatasetInfo {
    pub fn read<S: DataSource>(source: &S, key: &str) -> Result<Self, SourceError> {
        Ok(Self {
            name: key.to_string(),
            lens_mode: source.group_attr_string(key, LENS_MODE_ATTR)?,
            kinetic_energy: source.group_attr_string(key, KINETIC_ENERGY_ATTR)?,
            pass_energy: source.group_attr_string(key, PASS_ENERGY_ATTR)?,
            data_type: source.members(key)?.join(", "),
            comment: source.group_attr_string(key, TITLE_ATTR)?.replace('\n', "; "),
        })
    }
}

impl Display for DatasetInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -- Lens mode: {} Kinetic energy: {} Pass energy: {} Type: {} Comment: {}",
            self.name,
            self.lens_mode,
            self.kinetic_energy,
            self.pass_energy,
            self.data_type,
            self.comment
        )
    }
}

/// Collect the metadata of every dataset in a source
pub fn list_datasets<S: DataSource>(source: &S) -> Result<Vec<DatasetInfo>, SourceError> {
    source
        .dataset_keys()?
        .iter()
        .map(|key| DatasetInfo::read(source, key))
        .collect()
}
