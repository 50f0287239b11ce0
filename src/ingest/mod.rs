/// Weather data ingestion.
///
/// The rest of the service only sees the `WeatherProvider` trait; the
/// OpenWeatherMap client is the one production implementation.
///
/// Submodules:
/// - `openweather` — OpenWeatherMap 2.5 client and response parsing.

pub mod openweather;

pub use self::openweather::OpenWeatherClient;

use crate::model::{ForecastEntry, WeatherError, WeatherSnapshot};

/// Source of live and historical weather readings for a coordinate pair.
///
/// Implementations must report failures as errors. Returning a default or
/// zeroed snapshot in place of an unavailable reading is not allowed.
pub trait WeatherProvider {
    fn current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, WeatherError>;

    fn forecast(&self, lat: f64, lon: f64) -> Result<Vec<ForecastEntry>, WeatherError>;

    /// Reading at `unix_time` (seconds since the epoch, UTC).
    fn historical(&self, lat: f64, lon: f64, unix_time: i64) -> Result<WeatherSnapshot, WeatherError>;
}
