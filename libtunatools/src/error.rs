use std::path::PathBuf;
use thiserror::Error;

use super::channels::CHANNEL_COUNT;

#[derive(Debug, Error)]
pub enum XmlTreeError {
    #[error("XmlTree failed to parse markup: {0}")]
    ParsingError(#[from] quick_xml::Error),
    #[error("XmlTree found a malformed attribute: {0}")]
    BadAttribute(#[from] quick_xml::events::attributes::AttrError),
    #[error("XmlTree failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("XmlTree found no root element in the document")]
    NoRootElement,
    #[error("XmlTree found more than one root element; second root is <{0}>")]
    MultipleRootElements(String),
    #[error("XmlTree found element <{0}> which was never closed")]
    UnclosedElement(String),
    #[error("XmlTree found closing tag </{0}> with no matching opening tag")]
    UnexpectedEndTag(String),
    #[error("XmlTree found text outside of the root element")]
    TextOutsideRoot,
}

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Malformed sensor descriptor, document is not well-formed: {0}")]
    MalformedDocument(#[from] XmlTreeError),
    #[error("Malformed sensor descriptor <{0}>, it has no SerialNumber")]
    MissingSerialNumber(String),
    #[error("Sensor descriptor failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("SensorCatalog failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ChannelLayoutError {
    #[error("ChannelLayout must have exactly {exp} channels, found {0}", exp=CHANNEL_COUNT)]
    WrongChannelCount(usize),
    #[error("Channel index {0} is out of range; channels are numbered 0 to {max}", max=CHANNEL_COUNT - 1)]
    BadChannelIndex(usize),
    #[error("ChannelLayout failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Failed to load channel layout as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("ChannelLayout failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("Template is invalid: {0}")]
    InvalidTemplate(String),
    #[error("Sensor {0} has no SensorID attribute and cannot be composed")]
    MissingSensorID(String),
    #[error("Some channels have no sensor set: {}", .0.join(", "))]
    IncompleteAssignment(Vec<String>),
    #[error("Channel {channel} references sensor {key} which is not in the catalog")]
    UnknownSensor { channel: String, key: String },
    #[error("Composer failed to read or write XML: {0}")]
    XmlError(#[from] XmlTreeError),
    #[error("Composer failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Import failed to read or write XML: {0}")]
    XmlError(#[from] XmlTreeError),
    #[error("Import failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load settings as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Settings failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Settings failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Settings must hold exactly {exp} channels, found {0}", exp=CHANNEL_COUNT)]
    WrongChannelCount(usize),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Could not determine a data directory for this platform")]
    NoDataDirectory,
    #[error("Storage failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Storage failed due to settings error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Storage failed due to channel layout error: {0}")]
    LayoutError(#[from] ChannelLayoutError),
}
