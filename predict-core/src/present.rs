use chrono::NaiveDate;

use crate::{
    model::{PredictionRecord, WeatherPrediction},
    province::Province,
    wind::WindSector,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainBadge {
    RainExpected,
    NoRainExpected,
}

impl RainBadge {
    pub fn from_prediction(prediction: &WeatherPrediction) -> Self {
        if prediction.have_rain { Self::RainExpected } else { Self::NoRainExpected }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::RainExpected => "Rain Expected",
            Self::NoRainExpected => "No Rain Expected",
        }
    }
}

/// Display strings derived from a prediction. Never written back to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionDisplay {
    pub title: String,
    pub rain: RainBadge,
    pub max_temperature: String,
    pub min_temperature: String,
    pub wind_speed: String,
    pub wind_sector: WindSector,
    pub wind_direction: String,
    pub rainfall: String,
    pub humidity: String,
    pub cloud_cover: String,
    pub pressure: String,
}

impl PredictionDisplay {
    pub fn new(province: Province, date: NaiveDate, prediction: &WeatherPrediction) -> Self {
        let wind_sector = WindSector::from_bearing(prediction.wind_degree);

        Self {
            title: format!("Weather Prediction for {province} on {}", format_day(date)),
            rain: RainBadge::from_prediction(prediction),
            max_temperature: format!("{:.1}°C", prediction.max_temperature),
            min_temperature: format!("{:.1}°C", prediction.min_temperature),
            wind_speed: format!("{:.1} km/h", prediction.wind_speed),
            wind_sector,
            wind_direction: format!("{:.1}° {wind_sector}", prediction.wind_degree),
            rainfall: format!("{:.1} mm", prediction.rain),
            humidity: format!("{:.1}%", prediction.humidity),
            cloud_cover: format!("{:.1}%", prediction.cloud),
            pressure: format!("{:.1} hPa", prediction.pressure),
        }
    }

    pub fn from_record(record: &PredictionRecord) -> Self {
        Self::new(record.query.province, record.query.date, &record.prediction)
    }

    /// Label / value pairs in display order.
    pub fn fields(&self) -> [(&'static str, &str); 8] {
        [
            ("Max Temperature", self.max_temperature.as_str()),
            ("Min Temperature", self.min_temperature.as_str()),
            ("Wind Speed", self.wind_speed.as_str()),
            ("Wind Direction", self.wind_direction.as_str()),
            ("Rainfall", self.rainfall.as_str()),
            ("Humidity", self.humidity.as_str()),
            ("Cloud Cover", self.cloud_cover.as_str()),
            ("Pressure", self.pressure.as_str()),
        ]
    }
}

impl std::fmt::Display for PredictionDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "  [{}]", self.rain.label())?;
        for (label, value) in self.fields() {
            if label == "Wind Direction" {
                writeln!(f, "  {label:<16} {value} {}", self.wind_sector.arrow())?;
            } else {
                writeln!(f, "  {label:<16} {value}")?;
            }
        }
        Ok(())
    }
}

/// Heading used for each entry of the history listing.
pub fn history_heading(record: &PredictionRecord) -> String {
    format!("{} - {}", record.query.province, format_day(record.query.date))
}

/// `dd/mm/yyyy`.
pub fn format_day(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
