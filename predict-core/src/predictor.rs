use chrono::{NaiveDate, SubsecRound, Utc};

use crate::{
    client::PredictionService,
    error::PredictError,
    model::{PredictionQuery, PredictionRecord},
    store::{PredictionStore, StorageBackend},
};

/// Drives one submit cycle: validate, fetch, record.
///
/// `submit` borrows the predictor mutably, so a second submission cannot
/// start while one is outstanding. Nothing is written until the service has
/// answered; dropping the future before then leaves the store untouched.
#[derive(Debug)]
pub struct Predictor<S, B> {
    service: S,
    store: PredictionStore<B>,
}

impl<S: PredictionService, B: StorageBackend> Predictor<S, B> {
    pub fn new(service: S, store: PredictionStore<B>) -> Self {
        Self { service, store }
    }

    pub fn store(&self) -> &PredictionStore<B> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PredictionStore<B> {
        &mut self.store
    }

    pub async fn submit(
        &mut self,
        date: Option<NaiveDate>,
        province: &str,
    ) -> Result<PredictionRecord, PredictError> {
        let query = PredictionQuery::from_input(date, province)?;
        self.submit_query(query).await
    }

    pub async fn submit_query(&mut self, query: PredictionQuery) -> Result<PredictionRecord, PredictError> {
        let prediction = self.service.fetch_prediction(&query).await?;
        tracing::info!(%query, have_rain = prediction.have_rain, "received prediction");

        let record = PredictionRecord::new(query, prediction, Utc::now().trunc_subsecs(3));
        self.store.save(&record)?;
        Ok(record)
    }
}
