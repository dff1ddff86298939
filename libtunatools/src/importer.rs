use std::path::Path;

use fxhash::FxHashSet;

use super::catalog::SensorCatalog;
use super::composer::{SENSOR_ARRAY_TAG, SENSOR_WRAPPER_TAG};
use super::error::ImportError;
use super::sensor::SensorDescriptor;
use super::xml_tree::Element;

/// Collect the sensor payloads nested in an XMLCON.
///
/// Payloads live one level below each Sensor wrapper of the SensorArray. Fragments that are
/// not valid descriptors are skipped.
pub fn sensors_in(document: &Element) -> Vec<SensorDescriptor> {
    let Some(array) = document.find_descendant(SENSOR_ARRAY_TAG) else {
        log::warn!("XMLCON has no {SENSOR_ARRAY_TAG}, nothing to import");
        return vec![];
    };

    let mut sensors = Vec::new();
    for wrapper in array
        .child_elements()
        .filter(|child| child.tag == SENSOR_WRAPPER_TAG)
    {
        for payload in wrapper.child_elements() {
            match SensorDescriptor::from_element(payload.clone()) {
                Ok(sensor) => sensors.push(sensor),
                Err(e) => log::warn!(
                    "Skipping sensor at index {}: {}",
                    wrapper.attribute("index").unwrap_or("?"),
                    e
                ),
            }
        }
    }
    sensors
}

/// Add the sensors of an XMLCON which the catalog does not know yet.
///
/// Each new sensor is saved as a descriptor file in the catalog folder (created if needed)
/// and inserted into the catalog. Sensors already in the catalog are left as they are.
/// A sensor whose key cannot be a file name in the folder, or whose file cannot be written,
/// is skipped with a warning. Returns the newly added sensors.
pub fn import_from(
    document: &Element,
    catalog: &mut SensorCatalog,
) -> Result<Vec<SensorDescriptor>, ImportError> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let new_sensors: Vec<SensorDescriptor> = sensors_in(document)
        .into_iter()
        .filter(|sensor| {
            if sensor.has_plain_file_name() {
                true
            } else {
                log::warn!("Skipping sensor {}: serial number is not a valid file name", sensor);
                false
            }
        })
        .filter(|sensor| !catalog.contains(&sensor.key()) && seen.insert(sensor.key()))
        .collect();

    if new_sensors.is_empty() {
        log::info!("No new sensors to import");
        return Ok(new_sensors);
    }

    let folder = catalog.root_folder().to_path_buf();
    if !folder.is_dir() {
        std::fs::create_dir_all(&folder)?;
    }

    let mut added = Vec::with_capacity(new_sensors.len());
    for sensor in new_sensors {
        match sensor.save(&folder) {
            Ok(path) => {
                log::info!("Imported sensor {} to {}", sensor, path.display());
                catalog.insert(sensor.clone());
                added.push(sensor);
            }
            Err(e) => log::warn!("Skipping sensor {}: {}", sensor, e),
        }
    }
    Ok(added)
}

/// Read an XMLCON file and import its new sensors
pub fn import_file(
    path: &Path,
    catalog: &mut SensorCatalog,
) -> Result<Vec<SensorDescriptor>, ImportError> {
    let document = Element::from_file(path)?;
    import_from(&document, catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{compose, ConfigComposer};
    use crate::sensor::parse_descriptor;

    fn sensors() -> Vec<SensorDescriptor> {
        [
            ("TemperatureSensor", "6083", "55"),
            ("ConductivitySensor", "4191", "3"),
            ("PressureSensor", "1210", "45"),
        ]
        .iter()
        .map(|(kind, sn, id)| {
            parse_descriptor(&format!(
                "<{kind} SensorID=\"{id}\"><SerialNumber>{sn}</SerialNumber><G>4.3e-003</G></{kind}>"
            ))
            .unwrap()
        })
        .collect()
    }

    fn composed(sensors: &[SensorDescriptor]) -> Element {
        let mut document = Element::parse(&ConfigComposer::default_template()).unwrap();
        let refs: Vec<&SensorDescriptor> = sensors.iter().collect();
        compose(&mut document, &refs).unwrap();
        document
    }

    #[test]
    fn test_round_trip_into_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let originals = sensors();
        let document = composed(&originals);

        let mut catalog = SensorCatalog::new(&dir.path().join("Sensors"));
        let added = import_from(&document, &mut catalog).unwrap();
        assert_eq!(added, originals);
        assert_eq!(catalog.len(), originals.len());

        // Catalog and folder agree
        let rescanned = SensorCatalog::load(catalog.root_folder()).unwrap();
        for sensor in originals.iter() {
            assert_eq!(catalog.get(&sensor.key()), Some(sensor));
            assert_eq!(rescanned.get(&sensor.key()), Some(sensor));
        }
    }

    #[test]
    fn test_second_import_adds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let document = composed(&sensors());
        let mut catalog = SensorCatalog::new(dir.path());

        let first = import_from(&document, &mut catalog).unwrap();
        assert_eq!(first.len(), 3);
        let keys_after_first: Vec<String> =
            catalog.sorted_keys().into_iter().map(String::from).collect();

        let second = import_from(&document, &mut catalog).unwrap();
        assert!(second.is_empty());
        assert_eq!(catalog.sorted_keys(), keys_after_first);
    }

    #[test]
    fn test_existing_entries_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = SensorCatalog::new(dir.path());
        let existing = parse_descriptor(
            "<TemperatureSensor SensorID=\"55\"><SerialNumber>6083</SerialNumber><G>1.0</G></TemperatureSensor>",
        )
        .unwrap();
        catalog.insert(existing.clone());

        let added = import_from(&composed(&sensors()), &mut catalog).unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(catalog.get("6083 (TemperatureSensor)"), Some(&existing));
        assert!(!dir.path().join("6083 (TemperatureSensor).xml").exists());
    }

    #[test]
    fn test_malformed_fragment_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let document = Element::parse(
            r#"<Root><SensorArray Size="3">
                <Sensor index="0" SensorID="55"><TemperatureSensor SensorID="55"><SerialNumber>6083</SerialNumber></TemperatureSensor></Sensor>
                <Sensor index="1" SensorID="0"><NotInUse SensorID="0"/></Sensor>
                <Sensor index="2" SensorID="55"><TemperatureSensor SensorID="55"><SerialNumber>6083</SerialNumber></TemperatureSensor></Sensor>
            </SensorArray></Root>"#,
        )
        .unwrap();
        let mut catalog = SensorCatalog::new(dir.path());
        let added = import_from(&document, &mut catalog).unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].key(), "6083 (TemperatureSensor)");
    }

    fn array_of(payloads: &[&str]) -> Element {
        let mut text = format!("<Root><SensorArray Size=\"{}\">", payloads.len());
        for (idx, payload) in payloads.iter().enumerate() {
            text.push_str(&format!("<Sensor index=\"{idx}\" SensorID=\"3\">{payload}</Sensor>"));
        }
        text.push_str("</SensorArray></Root>");
        Element::parse(&text).unwrap()
    }

    #[test]
    fn test_serial_number_cannot_leave_folder() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("Sensors");
        let document = array_of(&[
            "<TemperatureSensor SensorID=\"55\"><SerialNumber>../escaped</SerialNumber></TemperatureSensor>",
        ]);
        let mut catalog = SensorCatalog::new(&folder);
        let added = import_from(&document, &mut catalog).unwrap();
        assert!(added.is_empty());
        assert!(catalog.is_empty());
        assert!(!dir.path().join("escaped (TemperatureSensor).xml").exists());
    }

    #[test]
    fn test_bad_serial_number_does_not_stop_import() {
        let dir = tempfile::tempdir().unwrap();
        let document = array_of(&[
            "<ConductivitySensor SensorID=\"3\"><SerialNumber>A/1</SerialNumber></ConductivitySensor>",
            "<ConductivitySensor SensorID=\"3\"><SerialNumber>4191</SerialNumber></ConductivitySensor>",
        ]);
        let mut catalog = SensorCatalog::new(&dir.path().join("Sensors"));
        let added = import_from(&document, &mut catalog).unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].key(), "4191 (ConductivitySensor)");
        assert_eq!(catalog.sorted_keys(), vec!["4191 (ConductivitySensor)"]);
        assert!(dir
            .path()
            .join("Sensors")
            .join("4191 (ConductivitySensor).xml")
            .is_file());
    }

    #[test]
    fn test_document_without_sensor_array() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("Sensors");
        let document = Element::parse(
            "<SBE_InstrumentConfiguration><Instrument><Name>SBE 911plus</Name></Instrument></SBE_InstrumentConfiguration>",
        )
        .unwrap();
        assert!(sensors_in(&document).is_empty());

        let mut catalog = SensorCatalog::new(&folder);
        assert!(import_from(&document, &mut catalog).unwrap().is_empty());
        assert!(catalog.is_empty());
        assert!(!folder.exists());
    }

    #[test]
    fn test_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cruise.xmlcon");
        composed(&sensors()).write_file(&path).unwrap();
        let mut catalog = SensorCatalog::new(&dir.path().join("Sensors"));
        assert_eq!(import_file(&path, &mut catalog).unwrap().len(), 3);
        assert!(import_file(&dir.path().join("missing.xmlcon"), &mut catalog).is_err());
    }
}
