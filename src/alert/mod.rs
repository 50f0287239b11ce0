/// Alert evaluation.
///
/// Submodules:
/// - `thresholds` — pure per-condition comparison of a snapshot against alerts.
/// - `check`      — on-demand check of one location against live weather.

pub mod check;
pub mod thresholds;

pub use self::check::{check_location_alerts, CheckError, CheckReport, CurrentConditions};
pub use self::thresholds::{evaluate, is_triggered, EvaluationResult};
