use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    model::{CityPrediction, HealthStatus, RefreshOutcome, RefreshRequest, Station, StationPrediction},
};

use super::{ForecastApi, check_horizon, check_refresh_limit};

/// `reqwest`-backed client for the AirQ prediction API.
#[derive(Debug, Clone)]
pub struct HttpForecastApi {
    base_url: String,
    http: Client,
}

impl HttpForecastApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: String, request: RequestBuilder) -> ApiResult<T> {
        debug!(%url, "requesting");

        let res = request
            .send()
            .await
            .map_err(|source| ApiError::Transport { url: url.clone(), source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ApiError::Transport { url: url.clone(), source })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode { url, source })
    }
}

#[async_trait]
impl ForecastApi for HttpForecastApi {
    async fn stations(&self, limit: u32) -> ApiResult<Vec<Station>> {
        if limit == 0 {
            return Err(ApiError::invalid("station limit must be at least 1"));
        }

        let url = self.url("/api/stations");
        let request = self.http.get(&url).query(&[("limit", limit)]);
        self.fetch(url, request).await
    }

    async fn predict(&self, station_id: &str, horizon: u32) -> ApiResult<StationPrediction> {
        check_horizon(horizon)?;

        let url = self.url("/api/predict");
        let horizon = horizon.to_string();
        let request =
            self.http.get(&url).query(&[("station_id", station_id), ("horizon", horizon.as_str())]);
        self.fetch(url, request).await
    }

    async fn predict_by_city(&self, city: &str, horizon: u32) -> ApiResult<CityPrediction> {
        check_horizon(horizon)?;

        let url = self.url("/api/predict_by_city");
        let horizon = horizon.to_string();
        let request = self.http.get(&url).query(&[("city", city), ("horizon", horizon.as_str())]);
        self.fetch(url, request).await
    }

    async fn health(&self) -> ApiResult<HealthStatus> {
        let url = self.url("/api/health");
        let request = self.http.get(&url);
        self.fetch(url, request).await
    }

    async fn refresh(&self, refresh: &RefreshRequest) -> ApiResult<RefreshOutcome> {
        check_refresh_limit(refresh.limit)?;

        let url = self.url("/api/refresh");
        let blocking = refresh.blocking.to_string();
        let limit = refresh.limit.to_string();
        let mut request = self
            .http
            .post(&url)
            .query(&[("blocking", blocking.as_str()), ("limit", limit.as_str())]);
        if let Some(api_key) = &refresh.api_key {
            request = request.query(&[("api_key", api_key.as_str())]);
        }
        if let Some(token) = &refresh.token {
            request = request.header("X-Refresh-Token", token);
        }
        self.fetch(url, request).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
