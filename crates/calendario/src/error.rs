//! Error types for loading and editing events.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons an event form or record is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all required fields (Title, Start Date, Type)")]
    MissingFields,

    #[error("Invalid {field} date '{value}'. Expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("End date cannot be before start date")]
    EndBeforeStart,
}

/// Errors from store operations that address a record by position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("No event at position {0}")]
    NotFound(usize),
}

/// Errors that can occur while loading the events document.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Invalid event source '{0}'")]
    InvalidSource(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to load events: {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse events JSON: {0}")]
    Json(#[from] serde_json::Error),
}
