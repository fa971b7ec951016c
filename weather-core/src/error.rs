//! Error types for backend requests, geolocation and location storage.

use thiserror::Error;

/// Message shown for any transport or decoding failure.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decode weather response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Weather response reported success without data")]
    MissingData,
}

impl ClientError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> &'static str {
        NETWORK_ERROR_MESSAGE
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    Denied,

    #[error("Geolocation is not supported")]
    Unsupported,

    #[error("Timed out waiting for a position")]
    Timeout,

    #[error("Location request was cancelled")]
    Cancelled,

    #[error("Location lookup failed: {0}")]
    Lookup(String),

    #[error("Failed to store location: {0}")]
    Storage(String),
}

impl GeolocationError {
    /// Text of the blocking alert for this failure. Cancellation is silent.
    pub fn alert_message(&self) -> Option<&'static str> {
        match self {
            Self::Denied => Some("Location access denied. Please allow location to get local weather."),
            Self::Unsupported => Some("Geolocation is not supported on this device."),
            Self::Timeout => Some("Timed out waiting for location permission."),
            Self::Cancelled => None,
            Self::Lookup(_) => Some("Unable to determine your location."),
            Self::Storage(_) => Some("Unable to remember your location."),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Format(#[from] serde_json::Error),
}
