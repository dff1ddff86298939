use std::path::{Path, PathBuf};

use super::channels::ChannelLayout;
use super::composer::ConfigComposer;
use super::config::Settings;
use super::error::{ConfigError, StorageError};

const SETTINGS_FILE_NAME: &str = "settings.yaml";
const LAYOUT_FILE_NAME: &str = "config.yaml";
const TEMPLATE_FILE_NAME: &str = "default.xmlcon";

/// AppStorage is the folder holding the editable copies of the channel layout, the XMLCON
/// template, and the user settings.
///
/// The bundled defaults are only ever copied in, never edited, so a broken file can simply
/// be deleted and it will be rebuilt the next time the storage is opened.
#[derive(Debug, Clone)]
pub struct AppStorage {
    root: PathBuf,
}

impl AppStorage {
    /// The platform data directory for the application
    pub fn default_location() -> Result<PathBuf, StorageError> {
        let dirs = directories::ProjectDirs::from("org", "TUNA", "TunaTools")
            .ok_or(StorageError::NoDataDirectory)?;
        Ok(dirs.data_local_dir().to_path_buf())
    }

    /// Open the storage at root, creating the folder and seeding any missing defaults
    pub fn open(root: &Path) -> Result<Self, StorageError> {
        if !root.is_dir() {
            std::fs::create_dir_all(root)?;
            log::info!("Created storage folder {}", root.display());
        }
        let storage = Self {
            root: root.to_path_buf(),
        };
        seed_file(&storage.layout_path(), &ChannelLayout::default_yaml())?;
        seed_file(&storage.template_path(), &ConfigComposer::default_template())?;
        Ok(storage)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE_NAME)
    }

    pub fn layout_path(&self) -> PathBuf {
        self.root.join(LAYOUT_FILE_NAME)
    }

    pub fn template_path(&self) -> PathBuf {
        self.root.join(TEMPLATE_FILE_NAME)
    }

    /// Load the saved settings, or defaults if nothing has been saved yet
    pub fn load_settings(&self) -> Result<Settings, StorageError> {
        match Settings::read_settings_file(&self.settings_path()) {
            Ok(settings) => Ok(settings),
            Err(ConfigError::BadFilePath(_)) => Ok(Settings::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        settings.write_settings_file(&self.settings_path())?;
        Ok(())
    }

    pub fn load_layout(&self) -> Result<ChannelLayout, StorageError> {
        Ok(ChannelLayout::read_layout_file(&self.layout_path())?)
    }

    pub fn composer(&self) -> ConfigComposer {
        ConfigComposer::new(&self.template_path())
    }
}

/// Write contents to path unless the file is already there
fn seed_file(path: &Path, contents: &str) -> Result<(), StorageError> {
    if !path.is_file() {
        std::fs::write(path, contents)?;
        log::info!("Seeded default {}", path.display());
    }
    Ok(())
}
