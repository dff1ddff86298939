use std::path::{Path, PathBuf};

use super::catalog::SensorCatalog;
use super::channels::{resolve_assignment, ChannelAssignment, ChannelLayout};
use super::error::ComposerError;
use super::sensor::{SensorDescriptor, SENSOR_ID_ATTRIBUTE};
use super::xml_tree::Element;

pub const SENSOR_ARRAY_TAG: &str = "SensorArray";
pub const SENSOR_WRAPPER_TAG: &str = "Sensor";
pub const SIZE_ATTRIBUTE: &str = "Size";
pub const INDEX_ATTRIBUTE: &str = "index";
pub const XMLCON_EXTENSION: &str = "xmlcon";

/// Load the bundled SBE 911plus template
fn load_default_template() -> String {
    String::from(include_str!("data/default.xmlcon"))
}

/// ConfigComposer builds XMLCON documents from a template file and a channel assignment
#[derive(Debug, Clone)]
pub struct ConfigComposer {
    template_path: PathBuf,
}

impl ConfigComposer {
    pub fn new(template_path: &Path) -> Self {
        Self {
            template_path: template_path.to_path_buf(),
        }
    }

    /// The bundled template as text, used to seed a new storage folder
    pub fn default_template() -> String {
        load_default_template()
    }

    /// Read and parse the template file
    pub fn load_template(&self) -> Result<Element, ComposerError> {
        Ok(Element::from_file(&self.template_path)?)
    }

    /// Validate and resolve an assignment, then compose the sensors into a fresh copy of
    /// the template
    pub fn compose_assignment(
        &self,
        assignment: &ChannelAssignment,
        layout: &ChannelLayout,
        catalog: &SensorCatalog,
    ) -> Result<Element, ComposerError> {
        let sensors = resolve_assignment(assignment, layout, catalog)?;
        let mut document = self.load_template()?;
        compose(&mut document, &sensors)?;
        log::info!(
            "Composed {} sensors into template {}",
            sensors.len(),
            self.template_path.display()
        );
        Ok(document)
    }
}

/// Read the Size attribute of a SensorArray
fn sensor_array_size(array: &Element) -> Result<usize, ComposerError> {
    let size = array.attribute(SIZE_ATTRIBUTE).ok_or_else(|| {
        ComposerError::InvalidTemplate(format!(
            "{SENSOR_ARRAY_TAG} has no {SIZE_ATTRIBUTE} attribute"
        ))
    })?;
    size.trim().parse::<usize>().map_err(|_| {
        ComposerError::InvalidTemplate(format!(
            "{SENSOR_ARRAY_TAG} {SIZE_ATTRIBUTE} '{size}' is not an integer"
        ))
    })
}

/// Append sensors, in order, to the SensorArray of template.
///
/// Each sensor is wrapped in a Sensor element carrying its index and SensorID, and the
/// array Size is incremented. The template must have a SensorArray with an integer Size,
/// otherwise nothing is done and InvalidTemplate is returned. If a sensor has no SensorID
/// the sensors before it remain inserted and the Size counts exactly those.
pub fn compose(template: &mut Element, sensors: &[&SensorDescriptor]) -> Result<(), ComposerError> {
    let array = template.find_descendant(SENSOR_ARRAY_TAG).ok_or_else(|| {
        ComposerError::InvalidTemplate(format!("no {SENSOR_ARRAY_TAG} element found"))
    })?;
    sensor_array_size(array)?;

    for sensor in sensors {
        insert_sensor(template, sensor)?;
    }
    Ok(())
}

/// Insert a single sensor into the SensorArray of document. Returns the index it was given.
pub fn insert_sensor(
    document: &mut Element,
    sensor: &SensorDescriptor,
) -> Result<usize, ComposerError> {
    let sensor_id = sensor
        .sensor_id()
        .ok_or_else(|| ComposerError::MissingSensorID(sensor.key()))?
        .to_string();
    let array = document
        .find_descendant_mut(SENSOR_ARRAY_TAG)
        .ok_or_else(|| {
            ComposerError::InvalidTemplate(format!("no {SENSOR_ARRAY_TAG} element found"))
        })?;
    let index = sensor_array_size(array)?;

    array.set_attribute(SIZE_ATTRIBUTE, &(index + 1).to_string());
    array.push_child(
        Element::new(SENSOR_WRAPPER_TAG)
            .with_attribute(INDEX_ATTRIBUTE, &index.to_string())
            .with_attribute(SENSOR_ID_ATTRIBUTE, &sensor_id)
            .with_child(sensor.payload.clone()),
    );
    log::debug!("Inserted sensor {} at index {}", sensor, index);
    Ok(index)
}

/// Write a composed document to path
pub fn write_xmlcon(document: &Element, path: &Path) -> Result<(), ComposerError> {
    document.write_file(path)?;
    log::info!("Wrote XMLCON {}", path.display());
    Ok(())
}

/// A timestamped file name for a new XMLCON, e.g. xmlcon_20240112_134501.xmlcon
pub fn default_output_name() -> String {
    let now = time::OffsetDateTime::now_utc();
    format!(
        "xmlcon_{:04}{:02}{:02}_{:02}{:02}{:02}.{}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        XMLCON_EXTENSION
    )
}
