//! Core library for the `weather-predict` client.
//!
//! This crate defines:
//! - The prediction data model, province set and query keys
//! - Wind-direction classification and display derivation
//! - The HTTP client for the prediction service
//! - Keyed persistence of past predictions
//!
//! It is used by `predict-cli`, but can also be reused by other front ends.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod predictor;
pub mod present;
pub mod province;
pub mod store;
pub mod wind;

pub use client::{HttpPredictionClient, PredictionService};
pub use config::Config;
pub use error::{PersistenceError, PredictError, PredictionServiceError, ValidationError};
pub use model::{PredictionQuery, PredictionRecord, WeatherPrediction};
pub use predictor::Predictor;
pub use present::{PredictionDisplay, RainBadge};
pub use province::{PROVINCES, Province};
pub use store::{MemoryBackend, PredictionStore, SqliteBackend, StorageBackend};
pub use wind::WindSector;
