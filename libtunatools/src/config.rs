use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::channels::ChannelAssignment;
use super::error::ConfigError;

const DEFAULT_SENSORS_FOLDER: &str = "./Sensors";

/// Structure representing the user settings. Contains the sensor folder and the last
/// channel assignment.
/// Settings are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub sensors_folder: PathBuf,
    pub channels: ChannelAssignment,
}

impl Default for Settings {
    /// Generate new Settings: the local Sensors folder and no channels set
    fn default() -> Self {
        Self {
            sensors_folder: PathBuf::from(DEFAULT_SENSORS_FOLDER),
            channels: ChannelAssignment::default(),
        }
    }
}

impl Settings {
    /// Read the settings in a YAML file
    /// Returns Settings if successful
    pub fn read_settings_file(settings_path: &Path) -> Result<Self, ConfigError> {
        if !settings_path.exists() {
            return Err(ConfigError::BadFilePath(settings_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(settings_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the settings to a YAML file, replacing it
    pub fn write_settings_file(&self, settings_path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(self)?;
        let mut file = std::fs::File::create(settings_path)?;
        file.write_all(yaml_str.as_bytes())?;
        Ok(())
    }

    /// Check whether the sensor folder exists; an absent folder scans as empty
    pub fn has_sensors_folder(&self) -> bool {
        self.sensors_folder.is_dir()
    }
}
