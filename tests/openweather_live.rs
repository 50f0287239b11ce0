//! Live OpenWeatherMap checks
//!
//! These hit the real API and need OPENWEATHER_API_KEY in the environment or
//! `.env`. Run with: cargo test --test openweather_live -- --ignored

use skywatch_service::config::Config;
use skywatch_service::ingest::{OpenWeatherClient, WeatherProvider};
use std::path::Path;

const PEORIA: (f64, f64) = (40.6936, -89.5890);

fn live_client() -> OpenWeatherClient {
    let config = Config::load(Path::new("skywatch.toml")).expect("config should load");
    let key = config.require_api_key().expect("OPENWEATHER_API_KEY must be set");
    OpenWeatherClient::new(&config.weather.base_url, key, config.weather.timeout()).unwrap()
}

#[test]
#[ignore]
fn test_live_current_conditions() {
    let snapshot = live_client().current(PEORIA.0, PEORIA.1).expect("current weather");
    println!("Peoria now: {:?}", snapshot);
    assert!((-60.0..60.0).contains(&snapshot.temperature), "temperature should be in Celsius");
    assert!(snapshot.wind_speed >= 0.0);
    assert!(!snapshot.primary_condition.is_empty());
}

#[test]
#[ignore]
fn test_live_forecast() {
    let entries = live_client().forecast(PEORIA.0, PEORIA.1).expect("forecast");
    println!("Peoria forecast: {} slots", entries.len());
    assert!(!entries.is_empty());
    assert!(entries.windows(2).all(|w| w[0].time <= w[1].time));
}
