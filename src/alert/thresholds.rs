//! Alert threshold evaluation.
//!
//! Compares a single weather snapshot against a list of alert definitions and
//! reports, per definition, whether its rule is met. Evaluation is a pure
//! function of its inputs: no I/O, no shared state, and nothing is mutated, so
//! it can be called from any number of request handlers at once.
//!
//! Callers are expected to pass only active alerts; the `active` flag is not
//! re-checked here.

use serde::Serialize;

use crate::model::{AlertCondition, AlertDefinition, AlertId, WeatherSnapshot};

/// Weather category that triggers a rain alert (compared case-insensitively).
pub const RAIN_CATEGORY: &str = "rain";

/// Weather category that triggers a snow alert (compared case-insensitively).
pub const SNOW_CATEGORY: &str = "snow";

/// Outcome of checking one alert definition against a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    #[serde(rename = "alert")]
    pub alert_id: AlertId,
    pub condition: AlertCondition,
    pub threshold: f64,
    pub triggered: bool,
}

/// Returns `true` if `snapshot` meets the rule `condition`/`threshold`.
///
/// Numeric comparisons are strict: a reading exactly equal to the threshold
/// does not trigger. A NaN reading never triggers.
pub fn is_triggered(snapshot: &WeatherSnapshot, condition: AlertCondition, threshold: f64) -> bool {
    match condition {
        AlertCondition::TemperatureAbove => snapshot.temperature > threshold,
        AlertCondition::TemperatureBelow => snapshot.temperature < threshold,
        AlertCondition::Rain => snapshot.primary_condition.eq_ignore_ascii_case(RAIN_CATEGORY),
        AlertCondition::Snow => snapshot.primary_condition.eq_ignore_ascii_case(SNOW_CATEGORY),
        AlertCondition::WindAbove => snapshot.wind_speed > threshold,
    }
}

/// Evaluates every alert against the snapshot.
///
/// Produces exactly one result per definition, in input order. An empty
/// slice yields an empty vector.
pub fn evaluate(snapshot: &WeatherSnapshot, alerts: &[AlertDefinition]) -> Vec<EvaluationResult> {
    alerts
        .iter()
        .map(|alert| EvaluationResult {
            alert_id: alert.id,
            condition: alert.condition,
            threshold: alert.threshold,
            triggered: is_triggered(snapshot, alert.condition, alert.threshold),
        })
        .collect()
}

/// Number of results that fired.
pub fn triggered_count(results: &[EvaluationResult]) -> usize {
    results.iter().filter(|r| r.triggered).count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
