//! Backend core for a personal weather dashboard.
//!
//! Users save named locations and attach threshold alerts to them
//! ("temperature above 30", "snow"). An alert check fetches live weather for
//! the location and reports which alerts fire.
//!
//! - `model`   — domain types and collaborator error types.
//! - `alert`   — alert evaluation and the on-demand check.
//! - `ingest`  — weather provider trait and the OpenWeatherMap client.
//! - `store`   — owner-scoped persistence for locations and alerts.
//! - `config`  — TOML + environment configuration.
//! - `logging` — structured console / file logging.

pub mod alert;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod store;
