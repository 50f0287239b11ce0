/// Command-line entry point for the weather dashboard service.
///
/// Usage:
///   skywatch check <owner-uuid> <location-uuid>
///   skywatch alerts <owner-uuid>
///   skywatch current <lat> <lon>
///   skywatch forecast <lat> <lon>
///   skywatch historical <lat> <lon> <unix-time>
///
/// Reads `skywatch.toml` (or the path in `SKYWATCH_CONFIG`) plus `.env`.

use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use skywatch_service::alert::check_location_alerts;
use skywatch_service::config::{Config, DatabaseConfig, DEFAULT_CONFIG_PATH};
use skywatch_service::ingest::{OpenWeatherClient, WeatherProvider};
use skywatch_service::logging::{self, DataSource};
use skywatch_service::store::{list_alerts_with_locations, PgStore};
use uuid::Uuid;

const USAGE: &str = "usage: skywatch <check OWNER LOCATION | alerts OWNER | current LAT LON | forecast LAT LON | historical LAT LON UNIX_TIME>";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("skywatch: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let config_path = env::var("SKYWATCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = Config::load(&config_path)?;

    logging::init_logger(
        config.logging.min_level()?,
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );
    logging::debug(DataSource::System, None, &format!("Loaded config from {}", config_path.display()));

    let provider = OpenWeatherClient::new(
        &config.weather.base_url,
        config.require_api_key()?,
        config.weather.timeout(),
    )?;

    match args {
        [cmd, owner, location] if cmd == "check" => {
            let owner = Uuid::parse_str(owner)?;
            let location = Uuid::parse_str(location)?;
            let mut store = open_store(&config.database)?;
            let report = check_location_alerts(&mut store, &provider, owner, location)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        [cmd, owner] if cmd == "alerts" => {
            let owner = Uuid::parse_str(owner)?;
            let mut store = open_store(&config.database)?;
            let alerts = list_alerts_with_locations(&mut store, owner)?;
            println!("{}", serde_json::to_string_pretty(&alerts)?);
        }
        [cmd, lat, lon] if cmd == "current" => {
            let snapshot = provider.current(lat.parse()?, lon.parse()?)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        [cmd, lat, lon] if cmd == "forecast" => {
            let entries = provider.forecast(lat.parse()?, lon.parse()?)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        [cmd, lat, lon, at] if cmd == "historical" => {
            let snapshot = provider.historical(lat.parse()?, lon.parse()?, at.parse()?)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        _ => return Err(USAGE.into()),
    }

    Ok(())
}

fn open_store(database: &DatabaseConfig) -> Result<PgStore, Box<dyn Error>> {
    if database.url.is_empty() {
        return Err("DATABASE_URL is not set".into());
    }
    let mut store = PgStore::connect(&database.url)?;
    store.ensure_schema()?;
    Ok(store)
}
