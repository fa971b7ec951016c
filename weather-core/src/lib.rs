//! Core library for the `weather` lookup client.
//!
//! This crate defines:
//! - The wire contract of the weather backend and an HTTP client for it
//! - Location caching and geolocation, including the startup bootstrap
//! - A view-model of the weather page and a pure text renderer for it
//! - The controller that drives searches, warnings and the current-location flow
//!
//! It is used by `weather-cli`, but can also be reused by other frontends.

pub mod client;
pub mod config;
pub mod controller;
pub mod cookie;
pub mod error;
pub mod format;
pub mod location;
pub mod model;
pub mod render;
pub mod storage;
pub mod view;
pub mod warnings;

pub use client::{HttpBackend, WeatherBackend};
pub use config::{Config, GeolocationConfig, GeolocationMode};
pub use controller::{Clock, ClockZone, ControllerSettings, LocateStatus, SearchStatus, SystemClock, WeatherController};
pub use error::{ClientError, GeolocationError, StorageError};
pub use location::{Bootstrap, Coordinates, Geolocator, bootstrap_location};
pub use model::{CurrentConditions, ForecastDay, SearchOutcome, WeatherReport, WeatherRequest};
pub use render::render;
pub use storage::{FileLocationStore, LocationStore, MemoryLocationStore};
pub use view::{UiState, ViewModel};
pub use warnings::{PanelState, WarningSummary};
