//! # tunatools_cli
//!
//! Part of the tunatools crate family.
//!
//! Command line front end for building SBE 911plus XMLCON files from a folder of sensor
//! descriptors.
//!
//! ## Use
//!
//! ```bash
//! tunatools_cli init
//! tunatools_cli folder /path/to/Sensors
//! tunatools_cli channels
//! tunatools_cli assign 0 "6083 (TemperatureSensor)"
//! tunatools_cli assign 5 none
//! tunatools_cli compose -o cruise.xmlcon
//! tunatools_cli import old_cruise.xmlcon
//! ```
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::error::Error;
use std::path::{Path, PathBuf};

use libtunatools::catalog::SensorCatalog;
use libtunatools::channels::{ChannelSlot, CHANNEL_COUNT};
use libtunatools::composer::{default_output_name, write_xmlcon};
use libtunatools::config::Settings;
use libtunatools::importer::import_file;
use libtunatools::storage::AppStorage;

const NO_SENSOR_ARG: &str = "none";
const CLEAR_ARG: &str = "clear";

fn build_cli() -> Command {
    Command::new("tunatools_cli")
        .about("Assemble SBE 911plus XMLCON files from sensor descriptors")
        .arg_required_else_help(true)
        .arg(
            Arg::new("storage")
                .short('s')
                .long("storage")
                .global(true)
                .help("Storage folder for settings, channel layout and template"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Also log skipped files and other details"),
        )
        .subcommand(Command::new("init").about("Create the storage folder and its default files"))
        .subcommand(Command::new("sensors").about("List the sensors in the sensor folder"))
        .subcommand(
            Command::new("show")
                .about("Print the full parameters of a sensor")
                .arg(Arg::new("key").required(true).help("Sensor key, e.g. \"6083 (TemperatureSensor)\"")),
        )
        .subcommand(
            Command::new("folder")
                .about("Show, or change, the sensor folder")
                .arg(Arg::new("path").help("New sensor folder")),
        )
        .subcommand(Command::new("channels").about("Show the channel assignment and the options for each channel"))
        .subcommand(
            Command::new("assign")
                .about("Set the sensor of a channel")
                .arg(
                    Arg::new("channel")
                        .required(true)
                        .value_parser(clap::value_parser!(usize))
                        .help("Channel number, starting at 0"),
                )
                .arg(
                    Arg::new("sensor")
                        .required(true)
                        .help("Sensor key, 'none' for an empty channel, or 'clear' to unset"),
                ),
        )
        .subcommand(
            Command::new("compose")
                .about("Create an XMLCON from the channel assignment")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Output file; defaults to a timestamped name in the current directory"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Add the sensors of an existing XMLCON to the sensor folder")
                .arg(Arg::new("file").required(true).help("XMLCON file to import")),
        )
}

fn open_storage(matches: &ArgMatches) -> Result<AppStorage, Box<dyn Error>> {
    let root = match matches.get_one::<String>("storage") {
        Some(path) => PathBuf::from(path),
        None => AppStorage::default_location()?,
    };
    Ok(AppStorage::open(&root)?)
}

fn load_catalog(settings: &Settings) -> Result<SensorCatalog, Box<dyn Error>> {
    Ok(SensorCatalog::load(&settings.sensors_folder)?)
}

fn slot_text(slot: &ChannelSlot) -> &str {
    match slot {
        ChannelSlot::Unresolved => "<not set>",
        ChannelSlot::NoSensor => "<no sensor>",
        ChannelSlot::Sensor(key) => key,
    }
}

fn list_sensors(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let catalog = load_catalog(settings)?;
    for sensor in catalog.sorted() {
        log::info!("{}", sensor);
    }
    Ok(())
}

fn show_sensor(settings: &Settings, key: &str) -> Result<(), Box<dyn Error>> {
    let catalog = load_catalog(settings)?;
    match catalog.get(key) {
        Some(sensor) => {
            log::info!("Data for sensor {}", sensor.serial_number);
            log::info!("{}", sensor.describe()?);
            Ok(())
        }
        None => Err(format!("No sensor {key} in {}", catalog.root_folder().display()).into()),
    }
}

fn change_folder(
    storage: &AppStorage,
    settings: &mut Settings,
    path: Option<&String>,
) -> Result<(), Box<dyn Error>> {
    if let Some(path) = path {
        settings.sensors_folder = PathBuf::from(path);
        storage.save_settings(settings)?;
        log::info!("Saved settings to {}", storage.settings_path().display());
    }
    log::info!(
        "Looking for sensors in {}",
        settings.sensors_folder.display()
    );
    if !settings.has_sensors_folder() {
        log::warn!("The sensor folder does not exist yet");
    }
    Ok(())
}

fn show_channels(storage: &AppStorage, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let layout = storage.load_layout()?;
    let catalog = load_catalog(settings)?;
    for (idx, channel) in layout.channels.iter().enumerate() {
        let slot = settings
            .channels
            .get(idx)
            .cloned()
            .unwrap_or_default();
        log::info!("[{idx:>2}] {}: {}", channel.label, slot_text(&slot));
        let options = layout.options(idx, &catalog);
        if options.is_empty() {
            log::info!("       no sensors available");
        } else {
            log::info!("       options: {}", options.join(", "));
        }
    }
    Ok(())
}

fn assign_channel(
    storage: &AppStorage,
    settings: &mut Settings,
    channel: usize,
    value: &str,
) -> Result<(), Box<dyn Error>> {
    let slot = match value {
        NO_SENSOR_ARG => ChannelSlot::NoSensor,
        CLEAR_ARG => ChannelSlot::Unresolved,
        key => {
            let layout = storage.load_layout()?;
            let catalog = load_catalog(settings)?;
            let Some(sensor) = catalog.get(key) else {
                return Err(format!("No sensor {key} in {}", catalog.root_folder().display()).into());
            };
            if let Some(definition) = layout.channels.get(channel) {
                if !definition.accepts(&sensor.kind) {
                    log::warn!(
                        "{} sensors are not normally placed on channel {}",
                        sensor.kind,
                        definition.label
                    );
                }
            }
            ChannelSlot::Sensor(key.to_string())
        }
    };
    settings.channels.set(channel, slot)?;
    storage.save_settings(settings)?;
    log::info!("Channel {channel} set to {value}");
    Ok(())
}

fn compose(
    storage: &AppStorage,
    settings: &Settings,
    output: Option<&String>,
) -> Result<(), Box<dyn Error>> {
    let layout = storage.load_layout()?;
    let catalog = load_catalog(settings)?;
    let document = storage
        .composer()
        .compose_assignment(&settings.channels, &layout, &catalog)?;
    let path = match output {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from(default_output_name()),
    };
    write_xmlcon(&document, &path)?;
    log::info!("The xmlcon {} was created", path.display());
    Ok(())
}

fn import(settings: &Settings, file: &Path) -> Result<(), Box<dyn Error>> {
    let mut catalog = load_catalog(settings)?;
    let new_sensors = import_file(file, &mut catalog)?;
    if new_sensors.is_empty() {
        log::info!("We already had those sensors!");
    } else {
        let names: Vec<String> = new_sensors.iter().map(|s| s.to_string()).collect();
        log::info!("New sensors: {}", names.join(", "));
    }
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let storage = open_storage(matches)?;
    let mut settings = storage.load_settings()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            log::info!("Storage ready at {}", storage.root().display());
            log::info!("Channel layout: {}", storage.layout_path().display());
            log::info!("Template: {}", storage.template_path().display());
            Ok(())
        }
        Some(("sensors", _)) => list_sensors(&settings),
        Some(("show", sub)) => match sub.get_one::<String>("key") {
            Some(key) => show_sensor(&settings, key),
            None => Err("A sensor key is required".into()),
        },
        Some(("folder", sub)) => change_folder(&storage, &mut settings, sub.get_one::<String>("path")),
        Some(("channels", _)) => show_channels(&storage, &settings),
        Some(("assign", sub)) => {
            let channel = sub.get_one::<usize>("channel").copied().unwrap_or(CHANNEL_COUNT);
            match sub.get_one::<String>("sensor") {
                Some(value) => assign_channel(&storage, &mut settings, channel, value),
                None => Err("A sensor is required".into()),
            }
        }
        Some(("compose", sub)) => compose(&storage, &settings, sub.get_one::<String>("output")),
        Some(("import", sub)) => match sub.get_one::<String>("file") {
            Some(file) => import(&settings, Path::new(file)),
            None => Err("An XMLCON file is required".into()),
        },
        _ => Ok(()),
    }
}

fn main() {
    let matches = build_cli().get_matches();

    // Initialize feedback
    let level = if matches.get_flag("verbose") {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };
    if let Err(e) = simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    ) {
        eprintln!("Could not create logging: {e}");
    }

    if let Err(e) = run(&matches) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_assign_and_compose() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AppStorage::open(&dir.path().join("storage")).unwrap();
        let sensors = dir.path().join("Sensors");
        std::fs::create_dir(&sensors).unwrap();
        std::fs::write(
            sensors.join("t.xml"),
            "<TemperatureSensor SensorID=\"55\"><SerialNumber>6083</SerialNumber></TemperatureSensor>",
        )
        .unwrap();

        let mut settings = storage.load_settings().unwrap();
        change_folder(&storage, &mut settings, Some(&sensors.to_string_lossy().to_string())).unwrap();
        for idx in 1..CHANNEL_COUNT {
            assign_channel(&storage, &mut settings, idx, NO_SENSOR_ARG).unwrap();
        }
        let output = dir.path().join("out.xmlcon");
        let output_arg = output.to_string_lossy().to_string();
        // Channel 0 still unset
        assert!(compose(&storage, &settings, Some(&output_arg)).is_err());

        assign_channel(&storage, &mut settings, 0, "6083 (TemperatureSensor)").unwrap();
        assert!(assign_channel(&storage, &mut settings, 0, "1 (Missing)").is_err());
        assert!(assign_channel(&storage, &mut settings, CHANNEL_COUNT, NO_SENSOR_ARG).is_err());

        let reloaded = storage.load_settings().unwrap();
        assert_eq!(reloaded, settings);
        compose(&storage, &reloaded, Some(&output_arg)).unwrap();
        assert!(output.is_file());
    }
}
