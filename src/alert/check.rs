//! On-demand alert check for a saved location.
//!
//! Ties the collaborators together the way a "check alerts" request handler
//! needs them: load the owner's location, fetch live weather for it, load the
//! active alerts, and evaluate. Nothing here is scheduled or repeated; every
//! call fetches fresh weather.

use serde::Serialize;
use std::fmt;

use super::thresholds::{self, EvaluationResult};
use crate::ingest::WeatherProvider;
use crate::logging::{self, DataSource};
use crate::model::{LocationId, OwnerId, StoreError, WeatherError, WeatherSnapshot};
use crate::store::{AlertStore, LocationStore};

/// Summary of the snapshot shown next to the verdicts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub temp: f64,
    pub weather: String,
    pub wind: f64,
}

impl From<&WeatherSnapshot> for CurrentConditions {
    fn from(snapshot: &WeatherSnapshot) -> Self {
        Self {
            temp: snapshot.temperature,
            weather: snapshot.primary_condition.clone(),
            wind: snapshot.wind_speed,
        }
    }
}

/// Response body for an alert check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    #[serde(rename = "location")]
    pub location_id: LocationId,
    pub current_conditions: CurrentConditions,
    pub alerts: Vec<EvaluationResult>,
}

/// Why a check could not produce a report.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckError {
    /// No such location for this owner.
    LocationNotFound,
    /// The weather provider failed; no evaluation was attempted.
    ServiceUnavailable(WeatherError),
    /// The store failed for a reason other than a missing location.
    Store(StoreError),
}

impl CheckError {
    /// HTTP status an API layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            CheckError::LocationNotFound => 404,
            CheckError::ServiceUnavailable(_) => 503,
            CheckError::Store(StoreError::InvalidInput(_)) => 400,
            CheckError::Store(_) => 500,
        }
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::LocationNotFound => write!(f, "Location not found"),
            CheckError::ServiceUnavailable(e) => write!(f, "Weather service unavailable: {}", e),
            CheckError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckError::ServiceUnavailable(e) => Some(e),
            CheckError::Store(e) => Some(e),
            CheckError::LocationNotFound => None,
        }
    }
}

impl From<StoreError> for CheckError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => CheckError::LocationNotFound,
            other => CheckError::Store(other),
        }
    }
}

/// Checks the owner's active alerts for `location_id` against live weather.
pub fn check_location_alerts<S, P>(
    store: &mut S,
    provider: &P,
    owner: OwnerId,
    location_id: LocationId,
) -> Result<CheckReport, CheckError>
where
    S: LocationStore + AlertStore + ?Sized,
    P: WeatherProvider + ?Sized,
{
    let location = store.get_location(owner, location_id)?;
    let subject = location.id.to_string();

    let snapshot = provider
        .current(location.latitude, location.longitude)
        .map_err(|e| {
            // The provider already logged the failure at its classified level.
            logging::debug(DataSource::Evaluator, Some(&subject), &format!("Skipping alert check: {}", e));
            CheckError::ServiceUnavailable(e)
        })?;

    let alerts = store.active_alerts_for_location(owner, location.id)?;
    let results = thresholds::evaluate(&snapshot, &alerts);
    logging::log_check_summary(&subject, results.len(), thresholds::triggered_count(&results));

    Ok(CheckReport {
        location_id: location.id,
        current_conditions: CurrentConditions::from(&snapshot),
        alerts: results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(CheckError::LocationNotFound.status_code(), 404);
        assert_eq!(CheckError::ServiceUnavailable(WeatherError::RateLimited).status_code(), 503);
        assert_eq!(CheckError::Store(StoreError::Database("down".into())).status_code(), 500);
    }

    #[test]
    fn test_not_found_store_error_maps_to_location_not_found() {
        let err: CheckError = StoreError::NotFound("Location".into()).into();
        assert_eq!(err, CheckError::LocationNotFound);
    }

    #[test]
    fn test_report_serializes_with_wire_names() {
        let report = CheckReport {
            location_id: uuid::Uuid::nil(),
            current_conditions: CurrentConditions::from(&WeatherSnapshot::new(30.0, 5.0, "Clear")),
            alerts: Vec::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["location"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["currentConditions"]["temp"], 30.0);
        assert_eq!(json["currentConditions"]["weather"], "Clear");
        assert_eq!(json["currentConditions"]["wind"], 5.0);
        assert_eq!(json["alerts"], serde_json::json!([]));
    }
}
