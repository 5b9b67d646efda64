//! JSON export of the working copy.

use anyhow::{Context, Result};
use std::path::Path;

use crate::types::EventRecord;

/// File name offered for download
pub const EXPORT_FILENAME: &str = "events.json";

/// The events document, pretty-printed with two-space indentation
pub fn to_pretty_json(events: &[EventRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(events)
}

pub fn save_json(events: &[EventRecord], path: &Path) -> Result<()> {
    let json = to_pretty_json(events)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// `Content-Disposition` value for the download
pub fn attachment_disposition() -> String {
    format!("attachment; filename=\"{}\"", EXPORT_FILENAME)
}
