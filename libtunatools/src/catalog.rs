use std::path::{Path, PathBuf};

use fxhash::FxHashMap;

use super::error::CatalogError;
use super::sensor::{SensorDescriptor, DESCRIPTOR_EXTENSION};

/// SensorCatalog is every sensor known to the application, keyed by its display string.
///
/// The catalog is backed by a folder of descriptor files. A scan is always a full rebuild;
/// sensors added through an import are written to the folder so that the next scan finds
/// them again.
#[derive(Debug, Clone, Default)]
pub struct SensorCatalog {
    root_folder: PathBuf,
    entries: FxHashMap<String, SensorDescriptor>,
}

impl SensorCatalog {
    /// Create an empty catalog backed by root_folder. Nothing is read until a scan.
    pub fn new(root_folder: &Path) -> Self {
        Self {
            root_folder: root_folder.to_path_buf(),
            entries: FxHashMap::default(),
        }
    }

    /// Create a catalog and immediately scan its folder
    pub fn load(root_folder: &Path) -> Result<Self, CatalogError> {
        let mut catalog = Self::new(root_folder);
        catalog.rescan()?;
        Ok(catalog)
    }

    /// Throw away the current entries and rebuild them from the folder
    pub fn rescan(&mut self) -> Result<(), CatalogError> {
        self.entries = scan(&self.root_folder)?;
        log::info!(
            "Found {} sensors in {}",
            self.entries.len(),
            self.root_folder.display()
        );
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn get(&self, key: &str) -> Option<&SensorDescriptor> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Add a sensor, replacing any entry with the same key. Returns the replaced entry.
    pub fn insert(&mut self, sensor: SensorDescriptor) -> Option<SensorDescriptor> {
        self.entries.insert(sensor.key(), sensor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All keys in sorted order
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(|k| k.as_str()).collect();
        keys.sort();
        keys
    }

    /// All (key, sensor) pairs, sorted by key
    pub fn sorted_entries(&self) -> Vec<(&str, &SensorDescriptor)> {
        let mut sensors: Vec<(&str, &SensorDescriptor)> = self
            .entries
            .iter()
            .map(|(key, sensor)| (key.as_str(), sensor))
            .collect();
        sensors.sort_by(|a, b| a.0.cmp(b.0));
        sensors
    }

    /// All sensors, sorted by key
    pub fn sorted(&self) -> Vec<&SensorDescriptor> {
        self.sorted_entries()
            .into_iter()
            .map(|(_, sensor)| sensor)
            .collect()
    }
}

/// Scan folder (recursively) for sensor descriptors.
///
/// Every file with an .xml extension (any case) is parsed. Files which fail to parse, or
/// which have no serial number, are skipped. Candidates are visited in sorted path order,
/// and when two files share a key the later one wins. A folder that does not exist gives
/// an empty map.
pub fn scan(folder: &Path) -> Result<FxHashMap<String, SensorDescriptor>, CatalogError> {
    let mut sensors = FxHashMap::default();
    if !folder.is_dir() {
        log::warn!(
            "Sensor folder {} does not exist, no sensors loaded",
            folder.display()
        );
        return Ok(sensors);
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    collect_candidates(folder, &mut candidates)?;
    candidates.sort();

    for path in candidates {
        match SensorDescriptor::from_file(&path) {
            Ok(sensor) => {
                if let Some(old) = sensors.insert(sensor.key(), sensor) {
                    log::debug!(
                        "Sensor {} found again in {}, replacing earlier entry",
                        old,
                        path.display()
                    );
                }
            }
            Err(e) => log::debug!("Skipping {}: {}", path.display(), e),
        }
    }
    Ok(sensors)
}

/// Recursively gather every file with the descriptor extension.
///
/// Only a failure to read dir itself is returned. Subfolders or entries which cannot be
/// read are logged and skipped, and symbolic links to folders are not followed.
fn collect_candidates(dir: &Path, candidates: &mut Vec<PathBuf>) -> Result<(), CatalogError> {
    for item in dir.read_dir()? {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let item_path = item.path();
        let is_dir = match item.file_type() {
            Ok(file_type) => file_type.is_dir(),
            Err(e) => {
                log::warn!("Skipping {}: {}", item_path.display(), e);
                continue;
            }
        };
        if is_dir {
            if let Err(e) = collect_candidates(&item_path, candidates) {
                log::warn!("Skipping folder {}: {}", item_path.display(), e);
            }
        } else if is_descriptor_file(&item_path) {
            candidates.push(item_path);
        }
    }
    Ok(())
}

fn is_descriptor_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(DESCRIPTOR_EXTENSION))
        .unwrap_or(false)
}
