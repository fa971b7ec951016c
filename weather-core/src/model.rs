use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Body of the search request posted to the backend.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherRequest {
    pub location: String,
}

/// Current conditions as sent by the backend under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location: String,
    pub country: String,
    /// Classification of the query ("City", "Zip Code", "GPS Coordinates", ...).
    #[serde(default)]
    pub address_type: Option<String>,
    pub temperature: f64,
    pub feels_like: f64,
    pub description: String,
    pub humidity: f64,
    /// km/h
    pub wind_speed: f64,
    /// km
    #[serde(default)]
    pub visibility: f64,
    pub icon: String,
    /// Epoch seconds.
    pub sunrise: i64,
    /// Epoch seconds.
    pub sunset: i64,
    /// `[day_label, message...]`
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

/// One entry of the daily forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub day_name: String,
    pub icon: String,
    pub description: String,
    pub min_temp: f64,
    pub max_temp: f64,
    pub feels_like: f64,
    /// Percent.
    pub rain_chance: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

/// A successful lookup: current conditions plus the (possibly empty) forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastDay>,
}

/// What the backend answered for one search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(WeatherReport),
    /// `success: false`, with the server message when one was given.
    Rejected { error: Option<String> },
}

/// Raw response envelope.
///
/// `data` and `forecast` stay untyped until `success` is known, since failed
/// responses may carry placeholders such as `data: {}`.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub forecast: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl WeatherEnvelope {
    pub fn into_outcome(self) -> Result<SearchOutcome, ClientError> {
        if !self.success {
            let error = self.error.filter(|e| !e.is_empty());
            return Ok(SearchOutcome::Rejected { error });
        }

        let data = match self.data {
            Some(value) if !value.is_null() => value,
            _ => return Err(ClientError::MissingData),
        };
        let current: CurrentConditions = serde_json::from_value(data)?;

        let forecast = match self.forecast {
            Some(value) if !value.is_null() => serde_json::from_value(value)?,
            _ => Vec::new(),
        };

        Ok(SearchOutcome::Found(WeatherReport { current, forecast }))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn current(warnings: &[&str]) -> CurrentConditions {
        CurrentConditions {
            location: "London".into(),
            country: "GB".into(),
            address_type: Some("City".into()),
            temperature: 17.6,
            feels_like: 16.4,
            description: "light rain".into(),
            humidity: 72.0,
            wind_speed: 14.76,
            visibility: 10.0,
            icon: "10d".into(),
            sunrise: 1_714_537_800,
            sunset: 1_714_591_500,
            warnings: strings(warnings),
        }
    }

    /// An empty list means "no warnings field".
    fn strings(items: &[&str]) -> Option<Vec<String>> {
        if items.is_empty() { None } else { Some(items.iter().map(|s| s.to_string()).collect()) }
    }

    pub fn day(date: NaiveDate, day_name: &str, warnings: &[&str]) -> ForecastDay {
        ForecastDay {
            date,
            day_name: day_name.into(),
            icon: "04d".into(),
            description: "broken clouds".into(),
            min_temp: 11.5,
            max_temp: 20.4,
            feels_like: 18.2,
            rain_chance: 35.0,
            humidity: 64.0,
            wind_speed: 12.3,
            warnings: strings(warnings),
        }
    }
}
