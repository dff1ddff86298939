use std::fmt::Display;
use std::path::{Component, Path, PathBuf};

use super::error::{DescriptorError, XmlTreeError};
use super::xml_tree::Element;

/// Name of the child element holding a sensor's serial number
pub const SERIAL_NUMBER_TAG: &str = "SerialNumber";
/// Name of the payload attribute identifying the sensor model to the downstream software
pub const SENSOR_ID_ATTRIBUTE: &str = "SensorID";
/// Extension used for descriptor files
pub const DESCRIPTOR_EXTENSION: &str = "xml";

/// SensorDescriptor is a single physical sensor: its type, its serial number, and the full
/// parameter set (calibration coefficients, etc.) as an XML element.
///
/// The pair (kind, serial number) is the sensor's identity. Its display form
/// `"{serial_number} ({kind})"` is the key used everywhere else (catalog, channel
/// assignments, descriptor file names).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorDescriptor {
    pub kind: String,
    pub serial_number: String,
    pub payload: Element,
}

impl SensorDescriptor {
    /// Build a descriptor from an element whose tag is the sensor kind
    pub fn from_element(payload: Element) -> Result<Self, DescriptorError> {
        let serial_number = match payload.child_text(SERIAL_NUMBER_TAG) {
            Some(sn) if !sn.is_empty() => sn,
            _ => return Err(DescriptorError::MissingSerialNumber(payload.tag.clone())),
        };
        Ok(Self {
            kind: payload.tag.clone(),
            serial_number,
            payload,
        })
    }

    /// Read a descriptor file
    pub fn from_file(path: &Path) -> Result<Self, DescriptorError> {
        let contents = std::fs::read_to_string(path)?;
        parse_descriptor(&contents)
    }

    /// The catalog key of this sensor
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// The SensorID attribute of the payload, needed when composing an XMLCON
    pub fn sensor_id(&self) -> Option<&str> {
        self.payload.attribute(SENSOR_ID_ATTRIBUTE)
    }

    /// Whether the key can be used as a file name directly inside a folder.
    ///
    /// Keys come from the SerialNumber text, so an imported serial number such as
    /// `../escaped` or `A/1` would otherwise point outside of, or below, the folder.
    pub fn has_plain_file_name(&self) -> bool {
        let name = self.key();
        if name.contains(['/', '\\', '\0']) {
            return false;
        }
        let mut components = Path::new(&name).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    }

    /// The path this descriptor would be saved to in a given folder
    pub fn file_path(&self, folder: &Path) -> PathBuf {
        folder.join(format!("{}.{}", self.key(), DESCRIPTOR_EXTENSION))
    }

    /// Save the descriptor as a standalone document in folder.
    ///
    /// Returns the path of the written file.
    pub fn save(&self, folder: &Path) -> Result<PathBuf, XmlTreeError> {
        let path = self.file_path(folder);
        self.payload.write_file(&path)?;
        Ok(path)
    }

    /// Human readable dump of the full parameter set
    pub fn describe(&self) -> Result<String, XmlTreeError> {
        self.payload.to_string_pretty()
    }
}

impl Display for SensorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.serial_number, self.kind)
    }
}

/// Parse the contents of a descriptor file.
///
/// The root tag becomes the sensor kind and the SerialNumber child the serial number. A
/// document that is not well-formed or has no serial number is a MalformedDescriptor.
pub fn parse_descriptor(contents: &str) -> Result<SensorDescriptor, DescriptorError> {
    let root = Element::parse(contents)?;
    SensorDescriptor::from_element(root)
}
