//! # tunatools
//!
//! tunatools assembles instrument configuration files (XMLCON) for SBE 911plus CTD
//! packages. Each physical sensor (identified by its serial number and type) is kept as a
//! standalone XML descriptor file in a sensor folder. The user picks, for each of the 13
//! logical channels of the instrument, which sensor occupies it, and tunatools merges the
//! chosen descriptors into a base XMLCON template.
//!
//! ## Installation
//!
//! The only method of install is from source. If you have not used Rust before, you will
//! most likely need to install the Rust tool chain. See the
//! [Rust docs](https://www.rust-lang.org/tools/install) for installation instructions.
//!
//! To build and install the CLI use `cargo install --path ./tunatools_cli` from the top
//! level tunatools repository.
//!
//! ## Storage
//!
//! On first run a storage folder is created in the platform local data directory (or the
//! folder given with `--storage`) and seeded with two bundled defaults:
//!
//! - `config.yaml`: the channel layout, see below
//! - `default.xmlcon`: the XMLCON template with an empty `SensorArray`
//!
//! These copies can be edited freely. If one gets broken, delete it and it will be
//! rebuilt. The user settings are saved next to them in `settings.yaml`:
//!
//! ```yml
//! sensors_folder: ./Sensors
//! channels:
//! - 6083 (TemperatureSensor)
//! - 4191 (ConductivitySensor)
//! - (no sensor)
//! - null
//! ...
//! ```
//!
//! Each of the 13 channels is a sensor key, `(no sensor)` for a channel deliberately left
//! empty, or `null` for a channel that has not been set. An XMLCON can only be created once
//! no channel is `null`.
//!
//! ### Channel Layout Format
//!
//! The layout lists the 13 channels in order. Each channel has a label and a filter
//! restricting which sensor kinds (the root tag of a descriptor) may be placed on it:
//!
//! ```yml
//! channels:
//!   - label: "Frequency 0, Temperature"
//!     type: include
//!     values: [TemperatureSensor]
//!   - label: "A/D voltage 0"
//!     type: exclude
//!     values: [TemperatureSensor, ConductivitySensor, PressureSensor]
//! ```
//!
//! ## Sensor Descriptors
//!
//! A descriptor is the XML of one sensor as it appears inside an XMLCON:
//!
//! ```xml
//! <TemperatureSensor SensorID="55">
//!   <SerialNumber>6083</SerialNumber>
//!   <CalibrationDate>12-Jan-24</CalibrationDate>
//!   ...
//! </TemperatureSensor>
//! ```
//!
//! Every `.xml` file below the sensor folder is scanned. Files that do not parse, or have
//! no `SerialNumber`, are skipped. Sensors are keyed as `"{serial number} ({kind})"`; if
//! two files give the same key, the one with the later path wins.
//!
//! Sensors can also be imported from an existing XMLCON: any sensor in it that is not yet
//! in the catalog is written to the sensor folder as a new descriptor.
pub mod catalog;
pub mod channels;
pub mod composer;
pub mod config;
pub mod error;
pub mod importer;
pub mod sensor;
pub mod storage;
pub mod xml_tree;
