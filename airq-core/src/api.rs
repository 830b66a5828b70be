use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    Config,
    config::MAX_HORIZON,
    error::{ApiError, ApiResult},
    model::{CityPrediction, HealthStatus, RefreshOutcome, RefreshRequest, Station, StationPrediction},
};

pub mod http;

pub use http::HttpForecastApi;

/// The prediction backend as seen by the dashboard.
#[async_trait]
pub trait ForecastApi: Send + Sync + Debug {
    async fn stations(&self, limit: u32) -> ApiResult<Vec<Station>>;

    async fn predict(&self, station_id: &str, horizon: u32) -> ApiResult<StationPrediction>;

    async fn predict_by_city(&self, city: &str, horizon: u32) -> ApiResult<CityPrediction>;

    async fn health(&self) -> ApiResult<HealthStatus>;

    async fn refresh(&self, request: &RefreshRequest) -> ApiResult<RefreshOutcome>;
}

/// Construct the HTTP client for the configured backend.
pub fn api_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastApi>> {
    config.validate()?;
    Ok(Box::new(HttpForecastApi::new(&config.api.base_url)))
}

pub(crate) fn check_horizon(horizon: u32) -> ApiResult<()> {
    if (1..=MAX_HORIZON).contains(&horizon) {
        Ok(())
    } else {
        Err(ApiError::invalid(format!("horizon must be within 1..={MAX_HORIZON}, got {horizon}")))
    }
}

pub(crate) fn check_refresh_limit(limit: u32) -> ApiResult<()> {
    if (1..=5000).contains(&limit) {
        Ok(())
    } else {
        Err(ApiError::invalid(format!("refresh limit must be within 1..=5000, got {limit}")))
    }
}
