use std::sync::Arc;

use async_trait::async_trait;
use inquire::{Confirm, InquireError};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use weather_core::{Coordinates, GeolocationError, Geolocator};

/// Held by the thread that owns the terminal.
static TERMINAL: Mutex<()> = parking_lot::const_mutex(());

/// Run a blocking inquire prompt without stalling the runtime.
///
/// A plain thread is used instead of `spawn_blocking` so that an abandoned
/// prompt (e.g. after a cancelled location request) does not keep the runtime
/// from shutting down. Prompts never overlap: a new one waits until any
/// abandoned prompt has been answered.
pub async fn ask<T, F>(prompt: F) -> Result<T, InquireError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, InquireError> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let _terminal = TERMINAL.lock();
        let _ = tx.send(prompt());
    });

    rx.await.unwrap_or(Err(InquireError::OperationInterrupted))
}

/// Asks the user for permission before consulting the real geolocator.
#[derive(Debug)]
pub struct PromptGeolocator {
    inner: Arc<dyn Geolocator>,
}

impl PromptGeolocator {
    pub fn new(inner: Arc<dyn Geolocator>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Geolocator for PromptGeolocator {
    async fn request_permission(&self) -> Result<(), GeolocationError> {
        let answer = ask(|| {
            Confirm::new("Allow weather to use your current location?")
                .with_default(true)
                .prompt()
        })
        .await;

        match answer {
            Ok(true) => self.inner.request_permission().await,
            Ok(false) => Err(GeolocationError::Denied),
            // No terminal to ask on: behave like a host without geolocation.
            Err(InquireError::NotTTY) => Err(GeolocationError::Unsupported),
            Err(e) => {
                tracing::debug!("Location permission prompt aborted: {e}");
                Err(GeolocationError::Denied)
            }
        }
    }

    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        self.inner.current_position().await
    }
}
