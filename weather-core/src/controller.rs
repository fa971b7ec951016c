//! The weather page controller.
//!
//! Owns the [`ViewModel`] and mutates it in response to user actions. Frontends
//! observe it through [`WeatherController::subscribe`] and render snapshots.

use std::{
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, FixedOffset, Local, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    client::WeatherBackend,
    error::GeolocationError,
    location::{self, Bootstrap, Geolocator},
    model::SearchOutcome,
    storage::LocationStore,
    view::{FALLBACK_ERROR_MESSAGE, VALIDATION_MESSAGE, ViewModel},
    warnings::PanelState,
};

/// Zone that dates and sunrise/sunset times are shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockZone {
    /// The system zone, resolved per instant so DST changes apply.
    System,
    Fixed(FixedOffset),
}

/// Source of the current instant and the zone used for rendering.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
    fn zone(&self) -> ClockZone;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn zone(&self) -> ClockZone {
        ClockZone::System
    }
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub geolocation_timeout: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self { geolocation_timeout: Duration::from_secs(30) }
    }
}

/// How a search submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// Blank input; nothing was sent.
    Invalid,
    /// The response was shown (result or error).
    Applied,
    /// A newer search started first; the response was dropped.
    Superseded,
}

/// How "use current location" ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LocateStatus {
    /// A location was available and searched for.
    Searched(SearchStatus),
    /// A newer search cancelled the wait.
    Cancelled,
    Failed(GeolocationError),
}

pub struct WeatherController {
    backend: Arc<dyn WeatherBackend>,
    store: Arc<dyn LocationStore>,
    geolocator: Arc<dyn Geolocator>,
    clock: Arc<dyn Clock>,
    settings: ControllerSettings,
    /// Sequence number of the latest search; only its response is applied.
    latest: AtomicU64,
    /// Token of the geolocation wait in progress, if any.
    pending_locate: Mutex<Option<(u64, CancellationToken)>>,
    locate_ids: AtomicU64,
    view: watch::Sender<ViewModel>,
}

impl WeatherController {
    pub fn new(
        backend: Arc<dyn WeatherBackend>,
        store: Arc<dyn LocationStore>,
        geolocator: Arc<dyn Geolocator>,
        clock: Arc<dyn Clock>,
        settings: ControllerSettings,
    ) -> Self {
        let (view, _) = watch::channel(ViewModel::default());

        Self {
            backend,
            store,
            geolocator,
            clock,
            settings,
            latest: AtomicU64::new(0),
            pending_locate: Mutex::new(None),
            locate_ids: AtomicU64::new(0),
            view,
        }
    }

    /// Receiver notified on every view change.
    pub fn subscribe(&self) -> watch::Receiver<ViewModel> {
        self.view.subscribe()
    }

    pub fn snapshot(&self) -> ViewModel {
        self.view.borrow().clone()
    }

    /// Search for `input`; blank input only shows the validation message.
    pub async fn submit_search(&self, input: &str) -> SearchStatus {
        let location = input.trim();
        self.cancel_pending_locate();

        // Bump and mark loading under the view lock so completions see a consistent order.
        let mut seq = 0;
        self.view.send_modify(|vm| {
            seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            vm.awaiting_permission = false;
            if location.is_empty() {
                vm.show_error(VALIDATION_MESSAGE);
            } else {
                vm.start_loading(location);
            }
        });

        if location.is_empty() {
            tracing::debug!("Rejected blank search");
            return SearchStatus::Invalid;
        }

        tracing::debug!(seq, location, "Submitting weather search");
        let outcome = self.backend.fetch(location).await;

        if let Err(e) = &outcome {
            tracing::error!(seq, location, "Weather request failed: {e}");
        }

        let now = self.clock.now();
        let applied = self.view.send_if_modified(|vm| {
            if self.latest.load(Ordering::SeqCst) != seq {
                return false;
            }
            match &outcome {
                Ok(SearchOutcome::Found(report)) => match self.clock.zone() {
                    ClockZone::System => vm.show_report(report, &now.with_timezone(&Local)),
                    ClockZone::Fixed(offset) => vm.show_report(report, &now.with_timezone(&offset)),
                },
                Ok(SearchOutcome::Rejected { error }) => {
                    vm.show_error(error.as_deref().unwrap_or(FALLBACK_ERROR_MESSAGE))
                }
                Err(e) => vm.show_error(e.user_message()),
            }
            true
        });

        if applied {
            SearchStatus::Applied
        } else {
            tracing::warn!(seq, location, "Discarding response of superseded search");
            SearchStatus::Superseded
        }
    }

    /// Search the cached location, acquiring one first when nothing is cached.
    pub async fn use_current_location(&self) -> LocateStatus {
        if let Some(cached) = self.store.get() {
            self.view.send_modify(|vm| vm.awaiting_permission = false);
            return LocateStatus::Searched(self.submit_search(&cached).await);
        }

        let id = self.locate_ids.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Some((_, previous)) = self.pending_locate.lock().replace((id, token.clone())) {
            previous.cancel();
        }

        self.view.send_modify(|vm| {
            vm.awaiting_permission = true;
            vm.alert = None;
        });

        let acquired = tokio::select! {
            _ = token.cancelled() => Err(GeolocationError::Cancelled),
            result = location::acquire_location(
                self.store.as_ref(),
                self.geolocator.as_ref(),
                self.settings.geolocation_timeout,
            ) => result,
        };

        {
            let mut pending = self.pending_locate.lock();
            if pending.as_ref().is_some_and(|(pending_id, _)| *pending_id == id) {
                *pending = None;
            }
        }

        // A search that slipped in after acquisition finished still wins.
        let acquired = if token.is_cancelled() { Err(GeolocationError::Cancelled) } else { acquired };

        match acquired {
            Ok(location) => {
                self.view.send_modify(|vm| vm.awaiting_permission = false);
                LocateStatus::Searched(self.submit_search(&location).await)
            }
            Err(GeolocationError::Cancelled) => {
                tracing::debug!("Location request cancelled by a newer search");
                LocateStatus::Cancelled
            }
            Err(e) => {
                tracing::warn!("Could not acquire current location: {e}");
                self.raise_alert(&e);
                LocateStatus::Failed(e)
            }
        }
    }

    /// Startup routine: make sure a location is cached, alerting on failure.
    pub async fn bootstrap(&self) -> Result<Bootstrap, GeolocationError> {
        let result = location::bootstrap_location(
            self.store.as_ref(),
            self.geolocator.as_ref(),
            self.settings.geolocation_timeout,
        )
        .await;

        if let Err(e) = &result {
            tracing::warn!("Location bootstrap failed: {e}");
            self.raise_alert(e);
        }
        result
    }

    pub fn toggle_warning_details(&self) -> PanelState {
        let mut state = PanelState::Hidden;
        self.view.send_modify(|vm| state = vm.warnings.toggle());
        state
    }

    pub fn dismiss_warnings(&self) {
        self.view.send_modify(|vm| vm.warnings.dismiss());
    }

    /// Clear the blocking alert once the user has seen it.
    pub fn acknowledge_alert(&self) {
        self.view.send_if_modified(|vm| vm.alert.take().is_some());
    }

    fn raise_alert(&self, error: &GeolocationError) {
        if let Some(message) = error.alert_message() {
            self.view.send_modify(|vm| {
                vm.awaiting_permission = false;
                vm.alert = Some(message.to_string());
            });
        }
    }

    fn cancel_pending_locate(&self) {
        if let Some((_, token)) = self.pending_locate.lock().take() {
            token.cancel();
        }
    }
}

impl Debug for WeatherController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherController")
            .field("backend", &self.backend)
            .field("latest", &self.latest.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
