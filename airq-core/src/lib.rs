//! Core library for the `airq` PM2.5 forecast dashboard.
//!
//! This crate defines:
//! - Configuration handling (config file + environment overrides)
//! - The client for the external prediction API
//! - Shared domain models (stations, forecasts, city bundles)
//! - AQI classification and the dashboard view state
//!
//! It is used by `airq-cli`, but can also be reused by other front-ends.

pub mod api;
pub mod aqi;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;

pub use api::{ForecastApi, HttpForecastApi};
pub use aqi::{AqiBand, AqiSummary, Extremes};
pub use config::{ApiConfig, Config};
pub use dashboard::{Dashboard, MapView, SeriesSummary};
pub use error::{ApiError, ApiResult};
pub use model::{CityPrediction, PredictionPoint, Station, StationOutcome, StationPrediction};
