//! State behind the dashboard view: station list, current forecast and map viewport.
//!
//! Every operation issues one request, waits for it, and then updates state.
//! Failures are logged with full detail and surfaced to the user as a fixed
//! message per action; nothing is retried.

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    Config,
    aqi::{self, AqiSummary, Extremes},
    api::ForecastApi,
    config::{DEFAULT_HORIZON, DEFAULT_STATION_LIMIT},
    error::ApiResult,
    model::{CityPrediction, PredictionPoint, Station},
};

pub const STATIONS_ERROR: &str = "Failed to load stations. Is the forecast backend running?";
pub const STATION_PREDICT_ERROR: &str = "Failed to fetch predictions for the selected station.";
pub const CITY_PREDICT_ERROR: &str = "Failed to fetch predictions for the selected city.";

/// Map viewport: center coordinates and zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
}

impl MapView {
    /// Whole-country view used before anything is selected.
    pub const INITIAL: MapView = MapView { lat: 20.5937, lon: 78.9629, zoom: 5 };
    pub const STATION_ZOOM: u8 = 11;
    pub const CITY_ZOOM: u8 = 10;

    fn centered_on(station: &Station, zoom: u8) -> Self {
        Self { lat: station.lat, lon: station.lon, zoom }
    }
}

impl Default for MapView {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Average, band and extremes of one forecast series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub aqi: AqiSummary,
    pub extremes: Extremes,
}

impl SeriesSummary {
    /// `None` for an empty series.
    pub fn of(points: &[PredictionPoint]) -> Option<Self> {
        let extremes = aqi::extremes(points)?;
        Some(Self { aqi: aqi::summarize_points(points), extremes })
    }
}

/// Per-station entry of a city forecast, in bundle order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityStationSummary {
    pub station_id: String,
    pub station_name: Option<String>,
    pub summary: StationSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StationSummary {
    Ready(SeriesSummary),
    Empty,
    Failed { error: String },
}

#[derive(Debug)]
pub struct Dashboard {
    api: Box<dyn ForecastApi>,
    station_limit: u32,
    horizon: u32,

    stations: Vec<Station>,
    cities: Vec<String>,
    predictions: Vec<PredictionPoint>,
    city_data: Option<CityPrediction>,
    selected_station: Option<String>,
    selected_city: Option<String>,
    map: MapView,
    loading: bool,
    error: Option<String>,
}

impl Dashboard {
    pub fn new(api: Box<dyn ForecastApi>) -> Self {
        Self {
            api,
            station_limit: DEFAULT_STATION_LIMIT,
            horizon: DEFAULT_HORIZON,
            stations: Vec::new(),
            cities: Vec::new(),
            predictions: Vec::new(),
            city_data: None,
            selected_station: None,
            selected_city: None,
            map: MapView::INITIAL,
            loading: false,
            error: None,
        }
    }

    /// Use the limit and horizon from `config`.
    pub fn with_config(api: Box<dyn ForecastApi>, config: &Config) -> Self {
        Self {
            station_limit: config.api.station_limit,
            horizon: config.api.horizon,
            ..Self::new(api)
        }
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Distinct city names of the loaded stations, sorted.
    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn predictions(&self) -> &[PredictionPoint] {
        &self.predictions
    }

    pub fn city_data(&self) -> Option<&CityPrediction> {
        self.city_data.as_ref()
    }

    pub fn selected_station(&self) -> Option<&Station> {
        let id = self.selected_station.as_deref()?;
        self.station(id)
    }

    pub fn selected_city(&self) -> Option<&str> {
        self.selected_city.as_deref()
    }

    pub fn map(&self) -> MapView {
        self.map
    }

    /// True only between the start and end of an operation. Operations hold
    /// `&mut self` until their request completes, so callers observe `false`
    /// once the returned future resolves.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn station(&self, station_id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.station_id == station_id)
    }

    pub fn stations_in<'a>(&'a self, city: &'a str) -> impl Iterator<Item = &'a Station> + 'a {
        self.stations.iter().filter(move |s| s.city == city)
    }

    /// Fetch the station list. On failure the list stays empty.
    pub async fn load_stations(&mut self) -> ApiResult<()> {
        self.begin();
        let result = self.api.stations(self.station_limit).await;
        self.loading = false;

        match result {
            Ok(stations) => {
                self.cities = distinct_cities(&stations);
                info!(stations = stations.len(), cities = self.cities.len(), "stations loaded");
                self.stations = stations;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load stations");
                self.error = Some(STATIONS_ERROR.to_string());
                Err(err)
            }
        }
    }

    /// Fetch the forecast for one station and recenter the map on it.
    pub async fn predict_station(&mut self, station_id: &str) -> ApiResult<()> {
        self.begin();
        let result = self.api.predict(station_id, self.horizon).await;
        self.loading = false;

        match result {
            Ok(prediction) => {
                info!(station_id, points = prediction.predictions.len(), "station forecast loaded");
                self.predictions = prediction.predictions;
                self.selected_station = Some(station_id.to_string());
                self.city_data = None;
                self.selected_city = None;
                let view = self.station(station_id).map(|s| MapView::centered_on(s, MapView::STATION_ZOOM));
                if let Some(view) = view {
                    self.map = view;
                }
                Ok(())
            }
            Err(err) => {
                warn!(station_id, error = %err, "failed to fetch station forecast");
                self.predictions.clear();
                self.selected_station = None;
                self.error = Some(STATION_PREDICT_ERROR.to_string());
                Err(err)
            }
        }
    }

    /// Fetch forecasts for every station of `city` and recenter the map on
    /// the first loaded station in that city.
    pub async fn predict_city(&mut self, city: &str) -> ApiResult<()> {
        self.begin();
        let result = self.api.predict_by_city(city, self.horizon).await;
        self.loading = false;

        match result {
            Ok(bundle) => {
                info!(city, stations = bundle.stations.len(), "city forecast loaded");
                self.city_data = Some(bundle);
                self.selected_city = Some(city.to_string());
                self.predictions.clear();
                self.selected_station = None;
                let view = self.stations_in(city).next().map(|s| MapView::centered_on(s, MapView::CITY_ZOOM));
                if let Some(view) = view {
                    self.map = view;
                }
                Ok(())
            }
            Err(err) => {
                warn!(city, error = %err, "failed to fetch city forecast");
                self.city_data = None;
                self.selected_city = None;
                self.error = Some(CITY_PREDICT_ERROR.to_string());
                Err(err)
            }
        }
    }

    /// Summary of the current single-station series.
    pub fn station_summary(&self) -> Option<SeriesSummary> {
        SeriesSummary::of(&self.predictions)
    }

    /// Summaries for each station of the current city forecast.
    pub fn city_summaries(&self) -> Vec<CityStationSummary> {
        let Some(bundle) = &self.city_data else {
            return Vec::new();
        };

        bundle
            .stations
            .iter()
            .map(|result| {
                let summary = match (result.outcome.predictions(), result.outcome.error()) {
                    (Some(points), _) => {
                        SeriesSummary::of(points).map_or(StationSummary::Empty, StationSummary::Ready)
                    }
                    (None, Some(error)) => StationSummary::Failed { error: error.to_string() },
                    (None, None) => StationSummary::Empty,
                };

                CityStationSummary {
                    station_id: result.station_id.clone(),
                    station_name: self.station(&result.station_id).map(|s| s.station_name.clone()),
                    summary,
                }
            })
            .collect()
    }

    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }
}

/// Distinct, alphabetically sorted city names.
pub fn distinct_cities(stations: &[Station]) -> Vec<String> {
    let mut cities: Vec<String> = stations.iter().map(|s| s.city.clone()).collect();
    cities.sort();
    cities.dedup();
    cities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aqi::AqiBand,
        error::ApiError,
        model::{
            HealthStatus, RefreshOutcome, RefreshRequest, StationOutcome, StationPrediction,
            StationResult,
        },
    };
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};

    fn station(id: &str, city: &str, lat: f64, lon: f64) -> Station {
        Station {
            station_id: id.into(),
            station_name: format!("{id} station"),
            city: city.into(),
            country: "India".into(),
            lat,
            lon,
        }
    }

    fn series(values: &[f64]) -> Vec<PredictionPoint> {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| PredictionPoint { timestamp: start + Duration::hours(i as i64 + 1), pm25: *v })
            .collect()
    }

    /// In-memory backend. `None` fields fail with a 500.
    #[derive(Debug, Default)]
    struct FakeApi {
        stations: Option<Vec<Station>>,
        series: Option<Vec<f64>>,
        city: Option<CityPrediction>,
    }

    fn server_error(path: &str) -> ApiError {
        ApiError::Status { url: path.into(), status: 500, body: "boom".into() }
    }

    #[async_trait]
    impl ForecastApi for FakeApi {
        async fn stations(&self, limit: u32) -> ApiResult<Vec<Station>> {
            let stations = self.stations.clone().ok_or_else(|| server_error("/api/stations"))?;
            Ok(stations.into_iter().take(limit as usize).collect())
        }

        async fn predict(&self, station_id: &str, horizon: u32) -> ApiResult<StationPrediction> {
            let values = self.series.clone().ok_or_else(|| server_error("/api/predict"))?;
            let mut points = series(&values);
            points.truncate(horizon as usize);
            Ok(StationPrediction { station_id: station_id.into(), last_updated: None, predictions: points })
        }

        async fn predict_by_city(&self, _city: &str, _horizon: u32) -> ApiResult<CityPrediction> {
            self.city.clone().ok_or_else(|| server_error("/api/predict_by_city"))
        }

        async fn health(&self) -> ApiResult<HealthStatus> {
            Ok(HealthStatus { status: "ok".into() })
        }

        async fn refresh(&self, _request: &RefreshRequest) -> ApiResult<RefreshOutcome> {
            Ok(RefreshOutcome::Scheduled { message: "queued".into() })
        }
    }

    fn network() -> Vec<Station> {
        vec![
            station("D1", "Delhi", 28.61, 77.21),
            station("M1", "Mumbai", 19.07, 72.87),
            station("D2", "Delhi", 28.70, 77.10),
        ]
    }

    fn loaded(api: FakeApi) -> Dashboard {
        Dashboard::new(Box::new(FakeApi { stations: Some(network()), ..api }))
    }

    #[test]
    fn cities_are_sorted_and_distinct() {
        assert_eq!(distinct_cities(&network()), vec!["Delhi".to_string(), "Mumbai".to_string()]);
    }

    #[tokio::test]
    async fn load_stations_populates_cities() {
        let mut dash = loaded(FakeApi::default());

        dash.load_stations().await.unwrap();

        assert_eq!(dash.stations().len(), 3);
        assert_eq!(dash.cities(), ["Delhi", "Mumbai"]);
        assert!(!dash.is_loading());
        assert!(dash.error().is_none());
    }

    #[tokio::test]
    async fn load_stations_respects_limit() {
        let mut cfg = Config::default();
        cfg.api.station_limit = 1;
        let mut dash =
            Dashboard::with_config(Box::new(FakeApi { stations: Some(network()), ..Default::default() }), &cfg);

        dash.load_stations().await.unwrap();
        assert_eq!(dash.stations().len(), 1);
        assert_eq!(dash.cities(), ["Delhi"]);
    }

    #[tokio::test]
    async fn failed_station_load_sets_error_and_stays_empty() {
        let mut dash = Dashboard::new(Box::new(FakeApi::default()));

        assert!(dash.load_stations().await.is_err());

        assert_eq!(dash.error(), Some(STATIONS_ERROR));
        assert!(dash.stations().is_empty());
        assert!(dash.cities().is_empty());
        assert!(!dash.is_loading());
    }

    #[tokio::test]
    async fn predict_station_recenters_map() {
        let mut dash = loaded(FakeApi { series: Some(vec![30.0; 24]), ..Default::default() });
        dash.load_stations().await.unwrap();

        dash.predict_station("M1").await.unwrap();

        assert_eq!(dash.predictions().len(), 24);
        assert_eq!(dash.map(), MapView { lat: 19.07, lon: 72.87, zoom: MapView::STATION_ZOOM });
        assert_eq!(dash.selected_station().map(|s| s.city.as_str()), Some("Mumbai"));
    }

    #[tokio::test]
    async fn predict_unknown_station_keeps_map() {
        let mut dash = loaded(FakeApi { series: Some(vec![30.0; 3]), ..Default::default() });
        dash.load_stations().await.unwrap();

        dash.predict_station("ZZ").await.unwrap();

        assert_eq!(dash.predictions().len(), 3);
        assert_eq!(dash.map(), MapView::INITIAL);
    }

    #[tokio::test]
    async fn failed_station_predict_clears_series() {
        let mut dash = loaded(FakeApi::default());
        dash.load_stations().await.unwrap();

        assert!(dash.predict_station("D1").await.is_err());

        assert_eq!(dash.error(), Some(STATION_PREDICT_ERROR));
        assert!(dash.predictions().is_empty());
        assert!(dash.station_summary().is_none());
        assert!(dash.selected_station().is_none());
        assert!(!dash.is_loading());
        assert_eq!(dash.stations().len(), 3);
    }

    #[tokio::test]
    async fn failed_city_predict_keeps_station_selection() {
        let mut dash = loaded(FakeApi { series: Some(vec![42.0; 4]), ..Default::default() });
        dash.load_stations().await.unwrap();
        dash.predict_station("M1").await.unwrap();

        assert!(dash.predict_city("Delhi").await.is_err());

        assert!(dash.selected_city().is_none());
        assert_eq!(dash.selected_station().map(|s| s.station_id.as_str()), Some("M1"));
        assert_eq!(dash.predictions().len(), 4);
        assert_eq!(dash.map(), MapView { lat: 19.07, lon: 72.87, zoom: MapView::STATION_ZOOM });
    }

    #[tokio::test]
    async fn repeated_station_predictions_are_stable() {
        let values: Vec<f64> = (0..24).map(|i| 20.0 + f64::from(i) * 3.5).collect();
        let mut dash = loaded(FakeApi { series: Some(values), ..Default::default() });
        dash.load_stations().await.unwrap();

        dash.predict_station("D1").await.unwrap();
        let first = dash.station_summary().unwrap();
        dash.predict_station("D1").await.unwrap();
        let second = dash.station_summary().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.aqi.band, AqiBand::Moderate);
        assert!((first.extremes.max.pm25 - 100.5).abs() < 1e-9);
        assert!((first.extremes.min.pm25 - 20.0).abs() < 1e-9);
    }

    fn delhi_bundle() -> CityPrediction {
        CityPrediction {
            city: "Delhi".into(),
            last_updated: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            stations: vec![
                StationResult {
                    station_id: "D1".into(),
                    outcome: StationOutcome::Predictions { predictions: series(&[180.0, 220.0]) },
                },
                StationResult {
                    station_id: "D2".into(),
                    outcome: StationOutcome::Failed { error: "model missing".into() },
                },
                StationResult {
                    station_id: "D3".into(),
                    outcome: StationOutcome::Predictions { predictions: Vec::new() },
                },
            ],
        }
    }

    #[tokio::test]
    async fn predict_city_centers_on_first_station() {
        let mut dash = loaded(FakeApi { city: Some(delhi_bundle()), ..Default::default() });
        dash.load_stations().await.unwrap();

        dash.predict_city("Delhi").await.unwrap();

        assert_eq!(dash.map(), MapView { lat: 28.61, lon: 77.21, zoom: MapView::CITY_ZOOM });
        assert_eq!(dash.selected_city(), Some("Delhi"));
        assert_eq!(dash.city_data().map(|c| c.stations.len()), Some(3));
    }

    #[tokio::test]
    async fn city_summaries_follow_bundle_order() {
        let mut dash = loaded(FakeApi { city: Some(delhi_bundle()), ..Default::default() });
        dash.load_stations().await.unwrap();
        dash.predict_city("Delhi").await.unwrap();

        let summaries = dash.city_summaries();

        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].station_name.as_deref(), Some("D1 station"));
        match &summaries[0].summary {
            StationSummary::Ready(s) => {
                assert!((s.aqi.average - 200.0).abs() < 1e-9);
                assert_eq!(s.aqi.band, AqiBand::Unhealthy);
            }
            other => panic!("expected ready summary, got {other:?}"),
        }
        assert_eq!(summaries[1].summary, StationSummary::Failed { error: "model missing".into() });
        assert_eq!(summaries[2].summary, StationSummary::Empty);
        assert!(summaries[2].station_name.is_none());
    }

    #[tokio::test]
    async fn failed_city_predict_sets_error() {
        let mut dash = loaded(FakeApi::default());
        dash.load_stations().await.unwrap();

        assert!(dash.predict_city("Delhi").await.is_err());

        assert_eq!(dash.error(), Some(CITY_PREDICT_ERROR));
        assert!(dash.city_data().is_none());
        assert!(dash.city_summaries().is_empty());
        assert!(dash.selected_city().is_none());
        assert!(!dash.is_loading());
        assert_eq!(dash.map(), MapView::INITIAL);
    }

    #[tokio::test]
    async fn city_match_is_case_sensitive() {
        let mut dash = loaded(FakeApi { city: Some(delhi_bundle()), ..Default::default() });
        dash.load_stations().await.unwrap();

        dash.predict_city("delhi").await.unwrap();

        assert_eq!(dash.stations_in("delhi").count(), 0);
        assert_eq!(dash.stations_in("Delhi").count(), 2);
        assert_eq!(dash.map(), MapView::INITIAL);
        assert_eq!(dash.selected_city(), Some("delhi"));
    }

    #[tokio::test]
    async fn city_forecast_replaces_station_selection() {
        let mut dash = loaded(FakeApi {
            series: Some(vec![10.0; 2]),
            city: Some(delhi_bundle()),
            ..Default::default()
        });
        dash.load_stations().await.unwrap();
        dash.predict_station("M1").await.unwrap();

        dash.predict_city("Delhi").await.unwrap();

        assert!(dash.selected_station().is_none());
        assert!(dash.predictions().is_empty());
        assert_eq!(dash.selected_city(), Some("Delhi"));
    }

    #[tokio::test]
    async fn new_request_clears_previous_error() {
        let mut dash = loaded(FakeApi { series: Some(vec![10.0]), ..Default::default() });
        dash.load_stations().await.unwrap();

        assert!(dash.predict_city("Delhi").await.is_err());
        dash.predict_station("D1").await.unwrap();

        assert!(dash.error().is_none());
    }
}
