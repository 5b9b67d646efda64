//! Loading the events document from a URL or a local file.

use chrono::Utc;
use reqwest::Url;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::error::LoadError;
use crate::store::check_record;
use crate::types::{new_event_id, EventRecord};

/// Where the events document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    Remote(Url),
    File(PathBuf),
}

impl EventSource {
    /// `http://` and `https://` values are URLs, anything else is a path
    pub fn parse(raw: &str) -> Result<Self, LoadError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(LoadError::InvalidSource(raw.to_string()));
        }

        if raw.starts_with("http://") || raw.starts_with("https://") {
            let url = Url::parse(raw).map_err(|_| LoadError::InvalidSource(raw.to_string()))?;
            Ok(EventSource::Remote(url))
        } else {
            Ok(EventSource::File(PathBuf::from(raw)))
        }
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            EventSource::File(path) => Some(path),
            EventSource::Remote(_) => None,
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSource::Remote(url) => write!(f, "{}", url),
            EventSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Result of a load that never fails
#[derive(Debug, Default)]
pub struct Loaded {
    pub events: Vec<EventRecord>,
    pub error: Option<String>,
}

/// Fetches and parses the events document
#[derive(Debug, Clone)]
pub struct Loader {
    source: EventSource,
    cache_bust: bool,
    client: reqwest::Client,
}

impl Loader {
    pub fn new(source: EventSource, cache_bust: bool) -> Self {
        Self {
            source,
            cache_bust,
            client: reqwest::Client::new(),
        }
    }

    pub fn source(&self) -> &EventSource {
        &self.source
    }

    pub async fn load(&self) -> Result<Vec<EventRecord>, LoadError> {
        let text = match &self.source {
            EventSource::Remote(url) => self.fetch(url).await?,
            EventSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?,
        };

        let events = parse_records(&text)?;
        info!(count = events.len(), source = %self.source, "Events loaded");
        Ok(events)
    }

    /// Load, falling back to an empty list and an error message
    pub async fn load_or_empty(&self) -> Loaded {
        match self.load().await {
            Ok(events) => Loaded {
                events,
                error: None,
            },
            Err(e) => {
                error!(source = %self.source, error = %e, "Error loading events");
                Loaded {
                    events: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn fetch(&self, url: &Url) -> Result<String, LoadError> {
        let url = if self.cache_bust {
            cache_busted(url)
        } else {
            url.clone()
        };

        debug!(url = %url, "Sending HTTP request");
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Append a `v=<unix millis>` query parameter so caches are bypassed
pub fn cache_busted(url: &Url) -> Url {
    let mut url = url.clone();
    url.query_pairs_mut()
        .append_pair("v", &Utc::now().timestamp_millis().to_string());
    url
}

/// Parse the events document, assigning ids to records that lack one
pub fn parse_records(text: &str) -> Result<Vec<EventRecord>, LoadError> {
    let mut events: Vec<EventRecord> = serde_json::from_str(text)?;

    for event in &mut events {
        if event.id.trim().is_empty() {
            event.id = new_event_id();
        }
        if let Err(e) = check_record(event) {
            warn!(title = %event.title, start = %event.start, error = %e, "Loaded event fails validation");
        }
    }

    Ok(events)
}
