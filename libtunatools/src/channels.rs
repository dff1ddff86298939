use serde::{Deserialize, Serialize};
use std::path::Path;

use super::catalog::SensorCatalog;
use super::error::{ChannelLayoutError, ComposerError, ConfigError};
use super::sensor::SensorDescriptor;

/// Number of logical channels on an SBE 911plus CTD
pub const CHANNEL_COUNT: usize = 13;
/// Persisted marker for a channel deliberately left without a sensor
pub const NO_SENSOR_MARKER: &str = "(no sensor)";

/// Load the bundled channel layout
fn load_default_layout() -> String {
    String::from(include_str!("data/default_config.yaml"))
}

/// Whether the listed sensor kinds are the only ones allowed, or the ones not allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Include,
    Exclude,
}

/// One channel of the instrument: its label and which sensor kinds may occupy it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDefinition {
    pub label: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    #[serde(default)]
    pub values: Vec<String>,
}

impl ChannelDefinition {
    /// Check if a sensor kind may be placed on this channel.
    ///
    /// An empty include list admits nothing, an empty exclude list admits everything.
    pub fn accepts(&self, kind: &str) -> bool {
        let listed = self.values.iter().any(|v| v == kind);
        match self.filter_type {
            FilterType::Include => listed,
            FilterType::Exclude => !listed,
        }
    }
}

/// The ordered set of channel definitions for an instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLayout {
    pub channels: Vec<ChannelDefinition>,
}

impl ChannelLayout {
    /// The bundled SBE 911plus layout
    pub fn bundled() -> Result<Self, ChannelLayoutError> {
        Self::parse(&load_default_layout())
    }

    /// Parse a layout from YAML, requiring exactly CHANNEL_COUNT channels
    pub fn parse(yaml_str: &str) -> Result<Self, ChannelLayoutError> {
        let layout = serde_yaml::from_str::<Self>(yaml_str)?;
        if layout.channels.len() != CHANNEL_COUNT {
            return Err(ChannelLayoutError::WrongChannelCount(layout.channels.len()));
        }
        Ok(layout)
    }

    /// Read a layout from a YAML file
    pub fn read_layout_file(path: &Path) -> Result<Self, ChannelLayoutError> {
        if !path.exists() {
            return Err(ChannelLayoutError::BadFilePath(path.to_path_buf()));
        }
        let yaml_str = std::fs::read_to_string(path)?;
        Self::parse(&yaml_str)
    }

    /// The bundled layout as YAML text, used to seed a new storage folder
    pub fn default_yaml() -> String {
        load_default_layout()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.channels.get(index).map(|c| c.label.as_str())
    }

    /// Sorted keys of the catalog sensors which may be placed on a channel
    pub fn options<'a>(&self, index: usize, catalog: &'a SensorCatalog) -> Vec<&'a str> {
        let Some(channel) = self.channels.get(index) else {
            return vec![];
        };
        catalog
            .sorted_entries()
            .into_iter()
            .filter(|(_, sensor)| channel.accepts(&sensor.kind))
            .map(|(key, _)| key)
            .collect()
    }
}

/// The state of a single channel in an assignment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum ChannelSlot {
    /// Nothing chosen yet; blocks composition
    #[default]
    Unresolved,
    /// Deliberately left empty; skipped when composing
    NoSensor,
    /// A catalog key
    Sensor(String),
}

impl From<Option<String>> for ChannelSlot {
    fn from(value: Option<String>) -> Self {
        match value {
            None => Self::Unresolved,
            Some(s) if s.is_empty() => Self::Unresolved,
            Some(s) if s == NO_SENSOR_MARKER => Self::NoSensor,
            Some(s) => Self::Sensor(s),
        }
    }
}

impl From<ChannelSlot> for Option<String> {
    fn from(value: ChannelSlot) -> Self {
        match value {
            ChannelSlot::Unresolved => None,
            ChannelSlot::NoSensor => Some(String::from(NO_SENSOR_MARKER)),
            ChannelSlot::Sensor(key) => Some(key),
        }
    }
}

/// Which sensor sits on each of the instrument's channels, in channel order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<ChannelSlot>", into = "Vec<ChannelSlot>")]
pub struct ChannelAssignment {
    slots: [ChannelSlot; CHANNEL_COUNT],
}

impl TryFrom<Vec<ChannelSlot>> for ChannelAssignment {
    type Error = ConfigError;
    fn try_from(value: Vec<ChannelSlot>) -> Result<Self, Self::Error> {
        let count = value.len();
        let slots = <[ChannelSlot; CHANNEL_COUNT]>::try_from(value)
            .map_err(|_| ConfigError::WrongChannelCount(count))?;
        Ok(Self { slots })
    }
}

impl From<ChannelAssignment> for Vec<ChannelSlot> {
    fn from(value: ChannelAssignment) -> Self {
        value.slots.to_vec()
    }
}

impl ChannelAssignment {
    pub fn slots(&self) -> &[ChannelSlot] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&ChannelSlot> {
        self.slots.get(index)
    }

    pub fn set(&mut self, index: usize, slot: ChannelSlot) -> Result<(), ChannelLayoutError> {
        match self.slots.get_mut(index) {
            Some(old) => {
                *old = slot;
                Ok(())
            }
            None => Err(ChannelLayoutError::BadChannelIndex(index)),
        }
    }

    /// Indices of the channels which have not been set
    pub fn unresolved(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| **slot == ChannelSlot::Unresolved)
            .map(|(idx, _)| idx)
            .collect()
    }
}

fn channel_label(layout: &ChannelLayout, index: usize) -> String {
    layout
        .label(index)
        .map(String::from)
        .unwrap_or_else(|| format!("Channel {index}"))
}

/// Check that every channel has been set, either to a sensor or to no sensor.
///
/// Fails with IncompleteAssignment listing the labels of the unset channels.
pub fn validate_assignment(
    assignment: &ChannelAssignment,
    layout: &ChannelLayout,
) -> Result<(), ComposerError> {
    let missing: Vec<String> = assignment
        .unresolved()
        .into_iter()
        .map(|idx| channel_label(layout, idx))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ComposerError::IncompleteAssignment(missing))
    }
}

/// Turn an assignment into the ordered list of sensors to compose.
///
/// Channels set to no sensor are skipped. The assignment must be complete, and every key
/// must exist in the catalog.
pub fn resolve_assignment<'a>(
    assignment: &ChannelAssignment,
    layout: &ChannelLayout,
    catalog: &'a SensorCatalog,
) -> Result<Vec<&'a SensorDescriptor>, ComposerError> {
    validate_assignment(assignment, layout)?;
    let mut sensors = Vec::new();
    for (idx, slot) in assignment.slots().iter().enumerate() {
        if let ChannelSlot::Sensor(key) = slot {
            match catalog.get(key) {
                Some(sensor) => sensors.push(sensor),
                None => {
                    return Err(ComposerError::UnknownSensor {
                        channel: channel_label(layout, idx),
                        key: key.clone(),
                    })
                }
            }
        }
    }
    Ok(sensors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::parse_descriptor;

    fn catalog() -> SensorCatalog {
        let mut catalog = SensorCatalog::new(Path::new("unused"));
        for (kind, sn) in [
            ("TemperatureSensor", "6083"),
            ("TemperatureSensor", "2410"),
            ("ConductivitySensor", "4191"),
            ("OxygenSensor", "1503"),
        ] {
            let text = format!("<{kind}><SerialNumber>{sn}</SerialNumber></{kind}>");
            catalog.insert(parse_descriptor(&text).unwrap());
        }
        catalog
    }

    #[test]
    fn test_default_layout() {
        let layout = ChannelLayout::parse(&ChannelLayout::default_yaml()).unwrap();
        assert_eq!(layout.channels.len(), CHANNEL_COUNT);
        assert_eq!(layout.label(0), Some("Frequency 0, Temperature"));
        assert_eq!(layout, ChannelLayout::bundled().unwrap());
    }

    #[test]
    fn test_wrong_channel_count() {
        let yaml = "channels:\n  - label: only\n    type: include\n    values: []\n";
        assert!(matches!(
            ChannelLayout::parse(yaml),
            Err(ChannelLayoutError::WrongChannelCount(1))
        ));
    }

    #[test]
    fn test_filters() {
        let include = ChannelDefinition {
            label: String::from("a"),
            filter_type: FilterType::Include,
            values: vec![],
        };
        assert!(!include.accepts("TemperatureSensor"));
        let exclude = ChannelDefinition {
            label: String::from("b"),
            filter_type: FilterType::Exclude,
            values: vec![String::from("TemperatureSensor")],
        };
        assert!(!exclude.accepts("TemperatureSensor"));
        assert!(exclude.accepts("OxygenSensor"));
    }

    #[test]
    fn test_channel_options() {
        let layout = ChannelLayout::bundled().unwrap();
        let catalog = catalog();
        assert_eq!(
            layout.options(0, &catalog),
            vec!["2410 (TemperatureSensor)", "6083 (TemperatureSensor)"]
        );
        assert_eq!(layout.options(5, &catalog), vec!["1503 (OxygenSensor)"]);
        assert!(layout.options(CHANNEL_COUNT, &catalog).is_empty());
    }

    #[test]
    fn test_slot_persistence() {
        let mut assignment = ChannelAssignment::default();
        assignment
            .set(0, ChannelSlot::Sensor(String::from("6083 (TemperatureSensor)")))
            .unwrap();
        assignment.set(1, ChannelSlot::NoSensor).unwrap();
        assert!(assignment.set(CHANNEL_COUNT, ChannelSlot::NoSensor).is_err());

        let yaml = serde_yaml::to_string(&assignment).unwrap();
        let back: ChannelAssignment = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, assignment);

        let short: Result<ChannelAssignment, _> = serde_yaml::from_str("[null, null]");
        assert!(short.is_err());
        let empty_string: ChannelAssignment =
            serde_yaml::from_str(&format!("[{}]", vec!["''"; CHANNEL_COUNT].join(", "))).unwrap();
        assert_eq!(empty_string.unresolved().len(), CHANNEL_COUNT);
    }

    #[test]
    fn test_validate_reports_labels() {
        let layout = ChannelLayout::bundled().unwrap();
        let mut assignment = ChannelAssignment::default();
        for idx in 0..CHANNEL_COUNT {
            if idx != 2 && idx != 7 {
                assignment.set(idx, ChannelSlot::NoSensor).unwrap();
            }
        }
        match validate_assignment(&assignment, &layout) {
            Err(ComposerError::IncompleteAssignment(labels)) => assert_eq!(
                labels,
                vec![
                    String::from("Frequency 2, Pressure, Digiquartz with TC"),
                    String::from("A/D voltage 2")
                ]
            ),
            other => panic!("Expected IncompleteAssignment, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_assignment() {
        let layout = ChannelLayout::bundled().unwrap();
        let catalog = catalog();
        let mut assignment = ChannelAssignment::default();
        for idx in 0..CHANNEL_COUNT {
            assignment.set(idx, ChannelSlot::NoSensor).unwrap();
        }
        assignment
            .set(3, ChannelSlot::Sensor(String::from("2410 (TemperatureSensor)")))
            .unwrap();
        assignment
            .set(0, ChannelSlot::Sensor(String::from("6083 (TemperatureSensor)")))
            .unwrap();
        let sensors = resolve_assignment(&assignment, &layout, &catalog).unwrap();
        let keys: Vec<String> = sensors.iter().map(|s| s.key()).collect();
        assert_eq!(keys, vec!["6083 (TemperatureSensor)", "2410 (TemperatureSensor)"]);

        assignment
            .set(6, ChannelSlot::Sensor(String::from("1 (Nonexistent)")))
            .unwrap();
        assert!(matches!(
            resolve_assignment(&assignment, &layout, &catalog),
            Err(ComposerError::UnknownSensor { key, .. }) if key == "1 (Nonexistent)"
        ));
    }
}
