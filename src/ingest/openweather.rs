/// OpenWeatherMap Data API Client
///
/// Retrieves current conditions, the 5-day / 3-hour forecast and historical
/// readings for a coordinate pair. All requests ask for metric units, so
/// temperatures arrive in degrees Celsius and wind speeds in metres/second.
///
/// API Documentation: https://openweathermap.org/current
/// Forecast: https://openweathermap.org/forecast5

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use super::WeatherProvider;
use crate::logging;
use crate::model::{valid_coordinates, ForecastEntry, WeatherError, WeatherSnapshot};

pub const OWM_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

// ============================================================================
// OpenWeatherMap API Response Structures
// ============================================================================

/// Entry of the `weather` array. The first entry is the primary condition.
#[derive(Debug, Deserialize)]
pub struct OwmCondition {
    pub main: String,  // Category: Rain, Snow, Clear, Clouds, ...
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OwmMain {
    pub temp: f64,
}

#[derive(Debug, Deserialize)]
pub struct OwmWind {
    pub speed: f64,
}

/// `/weather` response
#[derive(Debug, Deserialize)]
pub struct OwmCurrentResponse {
    #[serde(default)]
    pub weather: Vec<OwmCondition>,
    pub main: Option<OwmMain>,
    pub wind: Option<OwmWind>,
    pub dt: Option<i64>,  // Unix seconds, UTC
}

/// `/forecast` response
#[derive(Debug, Deserialize)]
pub struct OwmForecastResponse {
    #[serde(default)]
    pub list: Vec<OwmForecastSlot>,
}

#[derive(Debug, Deserialize)]
pub struct OwmForecastSlot {
    pub dt: i64,
    pub main: OwmMain,
    #[serde(default)]
    pub weather: Vec<OwmCondition>,
    pub wind: OwmWind,
}

/// `/onecall/timemachine` response
#[derive(Debug, Deserialize)]
pub struct OwmTimemachineResponse {
    pub current: Option<OwmTimemachineReading>,
}

#[derive(Debug, Deserialize)]
pub struct OwmTimemachineReading {
    pub dt: i64,
    pub temp: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub weather: Vec<OwmCondition>,
}

// ============================================================================
// API Client
// ============================================================================

/// Blocking client for the OpenWeatherMap 2.5 API.
pub struct OpenWeatherClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Build a client with the given request timeout.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Build the URL for `endpoint` with coordinates and any extra query pairs.
    /// The API key is appended last so log lines can strip it easily.
    pub fn build_url(&self, endpoint: &str, lat: f64, lon: f64, extra: &[(&str, String)]) -> String {
        let mut url = format!(
            "{}/{}?lat={}&lon={}&units=metric",
            self.base_url, endpoint, lat, lon
        );
        for (key, value) in extra {
            url.push_str(&format!("&{}={}", key, value));
        }
        url.push_str(&format!("&appid={}", self.api_key));
        url
    }

    fn get_body(&self, endpoint: &str, lat: f64, lon: f64, extra: &[(&str, String)]) -> Result<String, WeatherError> {
        if !valid_coordinates(lat, lon) {
            return Err(WeatherError::InvalidCoordinates { latitude: lat, longitude: lon });
        }

        let url = self.build_url(endpoint, lat, lon, extra);
        let subject = format!("{:.4},{:.4}", lat, lon);

        let result = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| WeatherError::Network(without_key(&e.to_string(), &self.api_key)))
            .and_then(|response| {
                let status = response.status();
                if status.as_u16() == 429 {
                    return Err(WeatherError::RateLimited);
                }
                if !status.is_success() {
                    return Err(WeatherError::HttpError(status.as_u16()));
                }
                response
                    .text()
                    .map_err(|e| WeatherError::Network(without_key(&e.to_string(), &self.api_key)))
            });

        if let Err(ref e) = result {
            logging::log_weather_failure(&subject, endpoint, e);
        }
        result
    }
}

/// Redacts the API key from error text that may echo the request URL.
fn without_key(text: &str, api_key: &str) -> String {
    if api_key.is_empty() {
        text.to_string()
    } else {
        text.replace(api_key, "***")
    }
}

impl WeatherProvider for OpenWeatherClient {
    fn current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, WeatherError> {
        let body = self.get_body("weather", lat, lon, &[])?;
        parse_current(&body)
    }

    fn forecast(&self, lat: f64, lon: f64) -> Result<Vec<ForecastEntry>, WeatherError> {
        let body = self.get_body("forecast", lat, lon, &[])?;
        parse_forecast(&body)
    }

    fn historical(&self, lat: f64, lon: f64, unix_time: i64) -> Result<WeatherSnapshot, WeatherError> {
        let body = self.get_body("onecall/timemachine", lat, lon, &[("dt", unix_time.to_string())])?;
        parse_historical(&body)
    }
}

// ============================================================================
// Response Parsing
// ============================================================================

fn from_unix(secs: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| WeatherError::ParseError(format!("timestamp out of range: {}", secs)))
}

fn primary(weather: Vec<OwmCondition>) -> Result<OwmCondition, WeatherError> {
    weather
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::NoData("response has an empty weather array".to_string()))
}

/// Parse a `/weather` body into a snapshot.
///
/// A body missing temperature, wind or weather category is rejected rather
/// than filled with zeros.
pub fn parse_current(body: &str) -> Result<WeatherSnapshot, WeatherError> {
    let response: OwmCurrentResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::ParseError(e.to_string()))?;

    let main = response
        .main
        .ok_or_else(|| WeatherError::NoData("response has no temperature".to_string()))?;
    let wind = response
        .wind
        .ok_or_else(|| WeatherError::NoData("response has no wind reading".to_string()))?;
    let condition = primary(response.weather)?;
    let observed_at = response.dt.map(from_unix).transpose()?;

    Ok(WeatherSnapshot {
        temperature: main.temp,
        wind_speed: wind.speed,
        primary_condition: condition.main,
        description: condition.description,
        observed_at,
    })
}

/// Parse a `/forecast` body into time-ordered entries.
pub fn parse_forecast(body: &str) -> Result<Vec<ForecastEntry>, WeatherError> {
    let response: OwmForecastResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::ParseError(e.to_string()))?;

    if response.list.is_empty() {
        return Err(WeatherError::NoData("forecast list is empty".to_string()));
    }

    let mut entries = response
        .list
        .into_iter()
        .map(|slot| -> Result<ForecastEntry, WeatherError> {
            let condition = primary(slot.weather)?;
            Ok(ForecastEntry {
                time: from_unix(slot.dt)?,
                temperature: slot.main.temp,
                wind_speed: slot.wind.speed,
                primary_condition: condition.main,
                description: condition.description,
            })
        })
        .collect::<Result<Vec<_>, WeatherError>>()?;

    entries.sort_by_key(|e| e.time);
    Ok(entries)
}

/// Parse an `/onecall/timemachine` body into a snapshot.
pub fn parse_historical(body: &str) -> Result<WeatherSnapshot, WeatherError> {
    let response: OwmTimemachineResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::ParseError(e.to_string()))?;

    let reading = response
        .current
        .ok_or_else(|| WeatherError::NoData("no reading for requested time".to_string()))?;
    let condition = primary(reading.weather)?;

    Ok(WeatherSnapshot {
        temperature: reading.temp,
        wind_speed: reading.wind_speed,
        primary_condition: condition.main,
        description: condition.description,
        observed_at: Some(from_unix(reading.dt)?),
    })
}

// ============================================================================
// Forecast Helpers
// ============================================================================

/// Highest and lowest forecast temperature, or `None` for an empty forecast.
pub fn temperature_range(entries: &[ForecastEntry]) -> Option<(f64, f64)> {
    let mut temps = entries.iter().map(|e| e.temperature);
    let first = temps.next()?;
    Some(temps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
}

/// Forecast entries whose category matches `category` (case-insensitive).
pub fn slots_with_condition<'a>(entries: &'a [ForecastEntry], category: &str) -> Vec<&'a ForecastEntry> {
    entries
        .iter()
        .filter(|e| e.primary_condition.eq_ignore_ascii_case(category))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
