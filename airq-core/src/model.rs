use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// A monitoring station as listed by `/api/stations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub station_id: String,
    pub station_name: String,
    pub city: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

/// One hourly forecast value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    #[serde(deserialize_with = "de_timestamp")]
    pub timestamp: NaiveDateTime,
    /// PM2.5 concentration in µg/m³.
    pub pm25: f64,
}

/// Response of `/api/predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationPrediction {
    #[serde(default)]
    pub station_id: String,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub last_updated: Option<NaiveDateTime>,
    pub predictions: Vec<PredictionPoint>,
}

/// Response of `/api/predict_by_city`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityPrediction {
    pub city: String,
    #[serde(deserialize_with = "de_timestamp")]
    pub last_updated: NaiveDateTime,
    pub stations: Vec<StationResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationResult {
    pub station_id: String,
    #[serde(flatten)]
    pub outcome: StationOutcome,
}

/// Either a forecast series or the backend's error for that station, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StationOutcome {
    Predictions { predictions: Vec<PredictionPoint> },
    Failed { error: String },
}

impl StationOutcome {
    pub fn predictions(&self) -> Option<&[PredictionPoint]> {
        match self {
            StationOutcome::Predictions { predictions } => Some(predictions),
            StationOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StationOutcome::Predictions { .. } => None,
            StationOutcome::Failed { error } => Some(error),
        }
    }
}

/// Response of `/api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Parameters of `/api/refresh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Run the ingestion synchronously and wait for its result.
    pub blocking: bool,
    /// Rows to request from the upstream CPCB feed (1..=5000).
    pub limit: u32,
    /// Overrides the backend's CPCB API key for this run.
    pub api_key: Option<String>,
    pub token: Option<String>,
}

impl Default for RefreshRequest {
    fn default() -> Self {
        Self { blocking: false, limit: 1000, api_key: None, token: None }
    }
}

/// Response of `/api/refresh`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RefreshOutcome {
    Scheduled { message: String },
    Ok { result: serde_json::Value },
}

// The backend emits naive ISO timestamps; accept offset-carrying ones too and
// normalise them to UTC.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    raw.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok())
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'")))
}

fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'"))),
    }
}
