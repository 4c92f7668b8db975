use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::ValidationError, province::Province};

/// Prefix that marks a storage key as one of ours.
pub const KEY_PREFIX: &str = "weather_";

/// Prediction returned by the service. Values are kept exactly as received;
/// rounding only ever happens at display time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPrediction {
    /// Cloud cover, percent.
    pub cloud: f64,
    pub have_rain: bool,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// °C. Not guaranteed to be >= `min_temperature`.
    pub max_temperature: f64,
    pub min_temperature: f64,
    /// hPa.
    pub pressure: f64,
    /// mm.
    pub rain: f64,
    /// Bearing in degrees, not normalized.
    pub wind_degree: f64,
    /// km/h.
    pub wind_speed: f64,
}

/// A validated (date, province) pair, built once at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredictionQuery {
    pub date: NaiveDate,
    pub province: Province,
}

impl PredictionQuery {
    pub fn new(date: NaiveDate, province: Province) -> Self {
        Self { date, province }
    }

    /// Validate raw form input. Missing values are reported before malformed ones.
    pub fn from_input(date: Option<NaiveDate>, province: &str) -> Result<Self, ValidationError> {
        let date = date.ok_or(ValidationError::MissingDate)?;
        let province = Province::parse(province)?;
        Ok(Self { date, province })
    }

    /// Like [`PredictionQuery::from_input`], with the date still as `YYYY-MM-DD` text.
    pub fn parse(date: &str, province: &str) -> Result<Self, ValidationError> {
        let date = date.trim();
        if date.is_empty() {
            return Err(ValidationError::MissingDate);
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(date.to_string()))?;
        Self::from_input(Some(date), province)
    }

    /// `YYYY-MM-DD`, the form sent to the service and used in keys.
    pub fn iso_day(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Storage key: `weather_<YYYY-MM-DD>_<province>`.
    ///
    /// The date part has a fixed width and province names never contain `_`,
    /// so distinct queries always map to distinct keys.
    pub fn key(&self) -> String {
        format!("{KEY_PREFIX}{}_{}", self.iso_day(), self.province)
    }
}

impl std::fmt::Display for PredictionQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.province, self.iso_day())
    }
}

/// Outbound request body.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest<'a> {
    pub date: String,
    pub province: &'a str,
}

impl<'a> From<&'a PredictionQuery> for PredictionRequest<'a> {
    fn from(query: &'a PredictionQuery) -> Self {
        Self { date: query.iso_day(), province: query.province.as_str() }
    }
}

/// One saved prediction together with the query that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub query: PredictionQuery,
    pub prediction: WeatherPrediction,
    pub saved_at: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn new(query: PredictionQuery, prediction: WeatherPrediction, saved_at: DateTime<Utc>) -> Self {
        Self { query, prediction, saved_at }
    }

    pub fn key(&self) -> String {
        self.query.key()
    }
}
