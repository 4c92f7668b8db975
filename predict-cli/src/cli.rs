use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use predict_core::{
    Config, HttpPredictionClient, PROVINCES, PredictError, PredictionDisplay,
    PredictionQuery, PredictionStore, Predictor, SqliteBackend, present,
};

use crate::prompt;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-predict", version, about = "Weather prediction client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Request a prediction and save it to history.
    Predict {
        /// Day to predict, YYYY-MM-DD. Prompted for when absent.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Province name, exactly as listed by `provinces`. Prompted for when absent.
        #[arg(long)]
        province: Option<String>,
    },

    /// Show saved predictions.
    History {
        /// Delete every saved prediction instead of listing them.
        #[arg(long)]
        clear: bool,
    },

    /// Show one saved prediction.
    Show {
        /// Day of the saved prediction, YYYY-MM-DD.
        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        province: String,
    },

    /// Discard one saved prediction, even if it no longer reads back.
    Forget {
        /// Day of the saved prediction, YYYY-MM-DD.
        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        province: String,
    },

    /// List the provinces the service accepts.
    Provinces,

    /// Set the service URL and history location.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Predict { date, province } => {
                let date = match date {
                    Some(date) => date,
                    None => prompt::date()?,
                };
                let province = match province {
                    Some(province) => province,
                    None => prompt::province()?,
                };
                predict(&config, date, &province).await
            }
            Command::History { clear: true } => {
                open_store(&config)?.clear_all()?;
                println!("Prediction history cleared.");
                Ok(())
            }
            Command::History { clear: false } => history(&config),
            Command::Show { date, province } => {
                let query = PredictionQuery::from_input(Some(date), &province)?;
                match open_store(&config)?.get(&query)? {
                    Some(record) => print!("{}", PredictionDisplay::from_record(&record)),
                    None => println!("No saved prediction for {query}."),
                }
                Ok(())
            }
            Command::Forget { date, province } => {
                let query = PredictionQuery::from_input(Some(date), &province)?;
                open_store(&config)?.remove(&query)?;
                println!("Removed saved prediction for {query}.");
                Ok(())
            }
            Command::Provinces => {
                for name in PROVINCES {
                    println!("{name}");
                }
                Ok(())
            }
            Command::Configure => {
                let mut config = config;
                prompt::configure(&mut config)?;
                config.save()?;
                println!("Saved configuration to {}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

fn open_store(config: &Config) -> anyhow::Result<PredictionStore<SqliteBackend>> {
    let path = config.history_file()?;
    let backend = SqliteBackend::open(&path)
        .with_context(|| format!("Failed to open history at {}", path.display()))?;
    Ok(PredictionStore::new(backend))
}

async fn predict(config: &Config, date: NaiveDate, province: &str) -> anyhow::Result<()> {
    let client = HttpPredictionClient::new(config.endpoint());
    let mut predictor = Predictor::new(client, open_store(config)?);

    tracing::debug!(endpoint = config.endpoint(), %date, province, "submitting prediction");
    println!("Predicting...");
    let outcome = tokio::select! {
        res = predictor.submit(Some(date), province) => res,
        _ = tokio::signal::ctrl_c() => {
            println!("Cancelled; nothing was saved.");
            return Ok(());
        }
    };

    match outcome {
        Ok(record) => {
            print!("{}", PredictionDisplay::from_record(&record));
            Ok(())
        }
        Err(err @ (PredictError::Validation(_) | PredictError::Service(_))) => {
            Err(anyhow::anyhow!(err.user_message()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Read-only: records are rendered, never re-saved or re-submitted.
fn history(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let records = store.list_all().context(
        "Saved predictions could not be read. Discard the entry with \
         `weather-predict forget`, or everything with `weather-predict history --clear`.",
    )?;

    if records.is_empty() {
        println!("No predictions saved yet.");
        return Ok(());
    }

    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", present::history_heading(record));
        print!("{}", PredictionDisplay::from_record(record));
    }
    Ok(())
}
