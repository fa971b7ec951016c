use std::{
    fmt::Debug,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use reqwest::{Client, header};
use tokio::sync::Mutex;

use crate::{
    Config,
    cookie::{DEFAULT_CSRF_COOKIE, cookie_header_from_set_cookie, get_cookie},
    error::ClientError,
    model::{SearchOutcome, WeatherEnvelope, WeatherRequest},
};

/// Header Django expects the CSRF token in.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// How long a failed cookie harvest is remembered before the home page is tried again.
pub const COOKIE_RETRY_AFTER: Duration = Duration::from_secs(300);

/// Something that can answer a weather search for a location string.
#[async_trait]
pub trait WeatherBackend: Send + Sync + Debug {
    async fn fetch(&self, location: &str) -> Result<SearchOutcome, ClientError>;
}

/// Connection settings for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub endpoint: String,
    /// Page fetched once to obtain the CSRF cookie when `cookie` is not set.
    pub home_url: Option<String>,
    /// Raw `Cookie` header value.
    pub cookie: Option<String>,
    pub csrf_cookie_name: String,
    pub request_timeout: Duration,
}

impl BackendSettings {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            home_url: None,
            cookie: None,
            csrf_cookie_name: DEFAULT_CSRF_COOKIE.to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            home_url: config.home_url.clone(),
            cookie: config.cookie.clone(),
            csrf_cookie_name: config.csrf_cookie_name.clone(),
            request_timeout: config.request_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Cookies {
    Unknown,
    Known(String),
    Unavailable { since: Instant },
}

/// Posts searches to the weather backend as JSON.
#[derive(Debug)]
pub struct HttpBackend {
    endpoint: String,
    home_url: Option<String>,
    csrf_cookie_name: String,
    cookies: Mutex<Cookies>,
    http: Client,
}

impl HttpBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(settings.request_timeout).build()?;
        let cookies = match settings.cookie.filter(|c| !c.trim().is_empty()) {
            Some(cookie) => Cookies::Known(cookie),
            None => Cookies::Unknown,
        };

        Ok(Self {
            endpoint: settings.endpoint,
            home_url: settings.home_url,
            csrf_cookie_name: settings.csrf_cookie_name,
            cookies: Mutex::new(cookies),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current cookie header, fetching the home page first if nothing is known yet.
    ///
    /// A failed harvest is remembered for [`COOKIE_RETRY_AFTER`] so searches
    /// do not each pay for another home-page request.
    async fn cookie_header(&self) -> Option<String> {
        let mut cookies = self.cookies.lock().await;
        let stale = match &*cookies {
            Cookies::Known(header) => return Some(header.clone()),
            Cookies::Unknown => true,
            Cookies::Unavailable { since } => since.elapsed() >= COOKIE_RETRY_AFTER,
        };
        if !stale {
            return None;
        }

        *cookies = match self.harvest_cookies().await {
            Some(header) => Cookies::Known(header),
            None => Cookies::Unavailable { since: Instant::now() },
        };
        match &*cookies {
            Cookies::Known(header) => Some(header.clone()),
            _ => None,
        }
    }

    async fn harvest_cookies(&self) -> Option<String> {
        let url = self.home_url.as_deref()?;

        let res = match self.http.get(url).send().await {
            Ok(res) => res,
            Err(e) => {
                tracing::warn!(url, "Failed to fetch CSRF cookie: {e}");
                return None;
            }
        };

        let header = cookie_header_from_set_cookie(
            res.headers()
                .get_all(header::SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );

        match &header {
            Some(_) => tracing::debug!(url, "Obtained session cookies"),
            None => tracing::warn!(url, status = %res.status(), "Home page set no cookies"),
        }
        header
    }
}

#[async_trait]
impl WeatherBackend for HttpBackend {
    async fn fetch(&self, location: &str) -> Result<SearchOutcome, ClientError> {
        let cookies = self.cookie_header().await;
        let token = cookies
            .as_deref()
            .and_then(|c| get_cookie(c, &self.csrf_cookie_name));

        let mut req = self
            .http
            .post(&self.endpoint)
            .json(&WeatherRequest { location: location.to_owned() });

        if let Some(token) = &token {
            req = req.header(CSRF_HEADER, token);
        }
        if let Some(cookies) = &cookies {
            req = req.header(header::COOKIE, cookies);
        }

        let res = req.send().await?;
        let status = res.status();
        let body = res.text().await?;

        tracing::debug!(%status, bytes = body.len(), "Weather backend responded");

        // Error statuses still carry a JSON envelope, so decode regardless.
        let envelope: WeatherEnvelope = serde_json::from_str(&body).inspect_err(|_| {
            tracing::debug!(%status, body = %truncate_body(&body), "Undecodable weather response");
        })?;

        envelope.into_outcome()
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn settings_default_to_django_cookie_name() {
        let settings = BackendSettings::new("http://localhost/api/get_weather/");
        assert_eq!(settings.csrf_cookie_name, "csrftoken");
        assert!(settings.cookie.is_none());
    }

    #[test]
    fn blank_configured_cookie_is_ignored() {
        let mut settings = BackendSettings::new("http://localhost/api/get_weather/");
        settings.cookie = Some("   ".into());
        let backend = HttpBackend::new(settings).unwrap();
        assert_eq!(*backend.cookies.try_lock().unwrap(), Cookies::Unknown);
    }

    #[tokio::test]
    async fn missing_home_page_is_remembered_as_unavailable() {
        let backend = HttpBackend::new(BackendSettings::new("http://localhost/")).unwrap();

        assert_eq!(backend.cookie_header().await, None);
        assert!(matches!(
            *backend.cookies.lock().await,
            Cookies::Unavailable { .. }
        ));
    }
}
