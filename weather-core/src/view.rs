//! View-model of the weather page.
//!
//! Every piece of visible state is an explicit value here; [`crate::render`]
//! turns a [`ViewModel`] into text without consulting anything else.

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::{
    format,
    model::{CurrentConditions, ForecastDay, WeatherReport},
    warnings::{PanelState, WarningPanel, collect_warnings},
};

pub const VALIDATION_MESSAGE: &str = "Enter a location OR allow current location access.";
pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to fetch weather data";
pub const AWAITING_PERMISSION_MESSAGE: &str = "Waiting for location permission...";
pub const FORECAST_TITLE: &str = "Weather Forecast";

pub const SEARCH_LABEL: &str = "🔍";
pub const SEARCHING_LABEL: &str = "Searching...";

/// Display slots of the current-conditions card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentView {
    pub location: String,
    pub address_type: Option<String>,
    pub temperature: String,
    pub description: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind_speed: String,
    pub visibility: String,
    pub country: String,
    pub sunrise: String,
    pub sunset: String,
    pub icon_url: String,
}

impl CurrentView {
    pub fn new<Tz: TimeZone>(current: &CurrentConditions, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            location: format!("{}, {}", current.location, current.country),
            address_type: current
                .address_type
                .as_ref()
                .filter(|t| !t.is_empty())
                .map(|t| format!("📍 {t}")),
            temperature: format::celsius(current.temperature),
            description: current.description.clone(),
            feels_like: format::celsius(current.feels_like),
            humidity: format!("{}%", format::number(current.humidity)),
            wind_speed: format!("{} km/h", format::number(current.wind_speed)),
            visibility: format!("{} km", format::number(current.visibility)),
            country: current.country.clone(),
            sunrise: format::clock_time(current.sunrise, tz),
            sunset: format::clock_time(current.sunset, tz),
            icon_url: format::icon_url(&current.icon),
        }
    }
}

/// One forecast day card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastCard {
    pub label: String,
    pub date: String,
    pub icon_url: String,
    pub high: String,
    pub low: String,
    pub description: String,
    pub feels_like: String,
    pub rain_chance: String,
    pub humidity: String,
    pub wind_speed: String,
}

impl ForecastCard {
    pub fn new(day: &ForecastDay, today: NaiveDate) -> Self {
        Self {
            label: format::day_label(day.date, &day.day_name, today),
            date: format::short_date(day.date),
            icon_url: format::icon_url(&day.icon),
            high: format::degrees(day.max_temp),
            low: format::degrees(day.min_temp),
            description: day.description.clone(),
            feels_like: format::degrees(day.feels_like),
            rain_chance: format!("{}%", format::number(day.rain_chance)),
            humidity: format!("{}%", format::number(day.humidity)),
            wind_speed: format!("{} km/h", format::number(day.wind_speed)),
        }
    }
}

/// Rendered report: current card plus forecast grid (empty grid means no section).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub current: CurrentView,
    pub forecast: Vec<ForecastCard>,
}

impl ResultView {
    /// Build the cards as seen at `now`: local date for "Tomorrow", local zone for clock times.
    pub fn new<Tz: TimeZone>(report: &WeatherReport, now: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let tz = now.timezone();
        let today = now.date_naive();

        Self {
            current: CurrentView::new(&report.current, &tz),
            forecast: report.forecast.iter().map(|day| ForecastCard::new(day, today)).collect(),
        }
    }
}

/// Phase of the search area.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UiState {
    #[default]
    Idle,
    Loading {
        location: String,
    },
    Result(Box<ResultView>),
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewModel {
    pub state: UiState,
    pub warnings: WarningPanel,
    /// The "waiting for permission" message is showing.
    pub awaiting_permission: bool,
    /// Blocking notice the user must acknowledge.
    pub alert: Option<String>,
}

impl ViewModel {
    pub fn is_loading(&self) -> bool {
        matches!(self.state, UiState::Loading { .. })
    }

    pub fn search_label(&self) -> &'static str {
        if self.is_loading() { SEARCHING_LABEL } else { SEARCH_LABEL }
    }

    pub fn search_enabled(&self) -> bool {
        !self.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            UiState::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ResultView> {
        match &self.state {
            UiState::Result(view) => Some(view.as_ref()),
            _ => None,
        }
    }

    pub fn panel_state(&self) -> PanelState {
        self.warnings.state
    }

    /// Enter the loading phase, dropping the previous error, result and warnings.
    pub(crate) fn start_loading(&mut self, location: &str) {
        self.state = UiState::Loading { location: location.to_string() };
        self.warnings = WarningPanel::default();
        self.awaiting_permission = false;
    }

    pub(crate) fn show_error(&mut self, message: impl Into<String>) {
        self.state = UiState::Error(message.into());
    }

    pub(crate) fn show_report<Tz: TimeZone>(&mut self, report: &WeatherReport, now: &DateTime<Tz>)
    where
        Tz::Offset: std::fmt::Display,
    {
        self.state = UiState::Result(Box::new(ResultView::new(report, now)));
        self.warnings = WarningPanel::from_summary(collect_warnings(&report.current, &report.forecast));
    }
}
