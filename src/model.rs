/// Core data types for the weather dashboard service.
///
/// This module defines the shared domain model imported by all other modules:
/// saved locations, alert definitions, weather snapshots and the errors raised
/// by the storage and weather-provider collaborators. It contains no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identifier of an authenticated user. Issued by the auth layer, opaque here.
pub type OwnerId = Uuid;

/// Identifier of a saved location.
pub type LocationId = Uuid;

/// Identifier of an alert definition.
pub type AlertId = Uuid;

// ---------------------------------------------------------------------------
// Coordinate bounds
// ---------------------------------------------------------------------------

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// Returns `true` if the pair is a finite WGS84 coordinate.
pub fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude)
        && (MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude)
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// A named place saved by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub owner_id: OwnerId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the owner when saving a new location.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub is_favorite: bool,
}

/// Partial update of a location. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_favorite: Option<bool>,
}

impl NewLocation {
    /// Checks the name and coordinates before anything is written.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_location_fields(&self.name, self.latitude, self.longitude)
    }
}

impl Location {
    /// Applies an update to a copy of this location and validates the result.
    pub fn with_update(&self, update: &LocationUpdate, now: DateTime<Utc>) -> Result<Location, StoreError> {
        let mut next = self.clone();
        if let Some(name) = &update.name {
            next.name = name.clone();
        }
        if let Some(latitude) = update.latitude {
            next.latitude = latitude;
        }
        if let Some(longitude) = update.longitude {
            next.longitude = longitude;
        }
        if let Some(is_favorite) = update.is_favorite {
            next.is_favorite = is_favorite;
        }
        validate_location_fields(&next.name, next.latitude, next.longitude)?;
        next.updated_at = now;
        Ok(next)
    }
}

fn validate_location_fields(name: &str, latitude: f64, longitude: f64) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidInput("location name is required".to_string()));
    }
    if !valid_coordinates(latitude, longitude) {
        return Err(StoreError::InvalidInput(format!(
            "coordinates out of range: ({}, {})",
            latitude, longitude
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Alert definitions
// ---------------------------------------------------------------------------

/// The five comparison rules an alert can use.
///
/// Serialized with the short names used by the alert store
/// (`temp_above`, `temp_below`, `rain`, `snow`, `wind_above`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertCondition {
    #[serde(rename = "temp_above")]
    TemperatureAbove,
    #[serde(rename = "temp_below")]
    TemperatureBelow,
    #[serde(rename = "rain")]
    Rain,
    #[serde(rename = "snow")]
    Snow,
    #[serde(rename = "wind_above")]
    WindAbove,
}

impl AlertCondition {
    pub const ALL: [AlertCondition; 5] = [
        AlertCondition::TemperatureAbove,
        AlertCondition::TemperatureBelow,
        AlertCondition::Rain,
        AlertCondition::Snow,
        AlertCondition::WindAbove,
    ];

    /// Storage / wire name of the condition.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCondition::TemperatureAbove => "temp_above",
            AlertCondition::TemperatureBelow => "temp_below",
            AlertCondition::Rain => "rain",
            AlertCondition::Snow => "snow",
            AlertCondition::WindAbove => "wind_above",
        }
    }

    /// Whether the threshold takes part in the comparison.
    /// Rain and snow only look at the weather category.
    pub fn uses_threshold(&self) -> bool {
        !matches!(self, AlertCondition::Rain | AlertCondition::Snow)
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertCondition {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertCondition::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| StoreError::InvalidInput(format!("unknown alert condition: {}", s)))
    }
}

/// A stored rule pairing a location, a condition kind and a threshold.
///
/// `threshold` is degrees Celsius for the temperature conditions and
/// metres/second for wind. It is ignored for rain and snow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDefinition {
    pub id: AlertId,
    pub owner_id: OwnerId,
    pub location_id: LocationId,
    pub condition: AlertCondition,
    pub threshold: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the owner when creating an alert. New alerts are active.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub location_id: LocationId,
    pub condition: AlertCondition,
    pub threshold: f64,
}

/// Partial update of an alert. Owner, location and id cannot change.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertUpdate {
    pub condition: Option<AlertCondition>,
    pub threshold: Option<f64>,
    pub active: Option<bool>,
}

impl NewAlert {
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_threshold(self.threshold)
    }
}

impl AlertDefinition {
    /// Applies an update to a copy of this alert and validates the result.
    pub fn with_update(&self, update: &AlertUpdate, now: DateTime<Utc>) -> Result<AlertDefinition, StoreError> {
        let mut next = self.clone();
        if let Some(condition) = update.condition {
            next.condition = condition;
        }
        if let Some(threshold) = update.threshold {
            next.threshold = threshold;
        }
        if let Some(active) = update.active {
            next.active = active;
        }
        validate_threshold(next.threshold)?;
        next.updated_at = now;
        Ok(next)
    }
}

/// Name and coordinates of the location an alert watches.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub id: LocationId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Location> for LocationSummary {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id,
            name: location.name.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

/// An alert together with the location it watches, for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertWithLocation {
    #[serde(flatten)]
    pub alert: AlertDefinition,
    pub location: LocationSummary,
}

fn validate_threshold(threshold: f64) -> Result<(), StoreError> {
    if threshold.is_finite() {
        Ok(())
    } else {
        Err(StoreError::InvalidInput("threshold must be a finite number".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Weather readings
// ---------------------------------------------------------------------------

/// A single point-in-time weather reading for a location, in metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Metres per second.
    pub wind_speed: f64,
    /// Weather category label, e.g. "Rain", "Snow", "Clear".
    pub primary_condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherSnapshot {
    pub fn new(temperature: f64, wind_speed: f64, primary_condition: impl Into<String>) -> Self {
        Self {
            temperature,
            wind_speed,
            primary_condition: primary_condition.into(),
            description: None,
            observed_at: None,
        }
    }
}

/// One 3-hour slot of the 5-day forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastEntry {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub wind_speed: f64,
    pub primary_condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by the location / alert store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The record does not exist or belongs to another owner.
    NotFound(String),
    /// A field failed validation (empty name, bad coordinates, unknown condition).
    InvalidInput(String),
    /// The backing database failed.
    Database(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(what) => write!(f, "{} not found", what),
            StoreError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            StoreError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<postgres::Error> for StoreError {
    fn from(err: postgres::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Errors that can arise when fetching weather data from the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherError {
    /// Non-2xx HTTP response other than a rate limit.
    HttpError(u16),
    /// The provider answered 429 Too Many Requests.
    RateLimited,
    /// The request never produced a response (DNS, connect, timeout).
    Network(String),
    /// The response body could not be deserialized.
    ParseError(String),
    /// The response parsed but carried no usable reading.
    NoData(String),
    /// Latitude or longitude outside the valid range.
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

impl fmt::Display for WeatherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherError::HttpError(code) => write!(f, "HTTP error: {}", code),
            WeatherError::RateLimited => write!(f, "HTTP error: 429 rate limited"),
            WeatherError::Network(msg) => write!(f, "Network error: {}", msg),
            WeatherError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            WeatherError::NoData(msg) => write!(f, "No data: {}", msg),
            WeatherError::InvalidCoordinates { latitude, longitude } => {
                write!(f, "Invalid coordinates: ({}, {})", latitude, longitude)
            }
        }
    }
}

impl std::error::Error for WeatherError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
