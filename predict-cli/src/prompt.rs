use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use inquire::{DateSelect, Select, Text};
use predict_core::{Config, PROVINCES};

pub fn date() -> Result<NaiveDate> {
    DateSelect::new("Date")
        .with_default(Local::now().date_naive())
        .with_week_start(chrono::Weekday::Mon)
        .prompt()
        .context("Date selection aborted")
}

pub fn province() -> Result<String> {
    Select::new("Province", PROVINCES.to_vec())
        .with_page_size(10)
        .prompt()
        .map(str::to_string)
        .context("Province selection aborted")
}

/// Interactive edit of every config field, pre-filled with current values.
pub fn configure(config: &mut Config) -> Result<()> {
    let endpoint = Text::new("Prediction service URL")
        .with_default(config.endpoint())
        .prompt()
        .context("Configuration aborted")?;
    config.set_endpoint(&endpoint)?;

    let current = config.history_file()?;
    let history = Text::new("History file")
        .with_default(&current.display().to_string())
        .prompt()
        .context("Configuration aborted")?;
    config.history_file =
        if history.trim() == current.display().to_string() && config.history_file.is_none() {
            None
        } else {
            Some(history.trim().into())
        };

    Ok(())
}
