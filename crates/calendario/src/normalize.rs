//! Conversion of stored event records into the shape the calendar widget expects.
//!
//! The widget treats `end` as exclusive, while records store an inclusive last
//! day. [`normalize`] only accepts an [`EventRecord`], so a [`DisplayEvent`] can
//! never be shifted twice.

use base64::Engine;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::hash::{Hash, Hasher};

use crate::types::{EventCategory, EventRecord};

/// Text color used for every event
pub const TEXT_COLOR: &str = "#ffffff";

const ACADEMIC_COLOR: &str = "#3b82f6";
const CO_CURRICULAR_COLOR: &str = "#16a34a";
const NEUTRAL_COLOR: &str = "#6b7280";

/// Length of a derived identifier
pub const DERIVED_ID_LEN: usize = 10;

/// An event ready to be handed to the calendar widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayEvent {
    pub id: String,
    pub legacy_id: String,
    pub title: String,
    pub start: NaiveDate,
    /// Exclusive end day
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    pub all_day: bool,
    pub class_name: String,
    pub background_color: &'static str,
    pub border_color: &'static str,
    pub text_color: &'static str,
    pub extended_props: ExtendedProps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedProps {
    #[serde(rename = "type")]
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Fill/border color for a category
pub fn category_color(category: &EventCategory) -> &'static str {
    match category {
        EventCategory::Academic => ACADEMIC_COLOR,
        EventCategory::CoCurricular => CO_CURRICULAR_COLOR,
        EventCategory::Other(_) => NEUTRAL_COLOR,
    }
}

/// Derive the content-based identifier from title, start and type.
///
/// Records with the same three values share an identifier. It is never
/// persisted; the stable `id` is what locates an event.
pub fn derived_id(title: &str, start: NaiveDate, category: &EventCategory) -> String {
    use std::collections::hash_map::DefaultHasher;

    let mut hasher = DefaultHasher::new();
    format!("{}{}{}", title, start.format("%Y-%m-%d"), category).hash(&mut hasher);
    let digest = hasher.finish().to_be_bytes();

    base64::engine::general_purpose::STANDARD
        .encode(digest)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(DERIVED_ID_LEN)
        .collect()
}

/// Convert a stored record into a display event
pub fn normalize(record: &EventRecord) -> DisplayEvent {
    let color = category_color(&record.category);

    let end = match record.end {
        Some(end) if end != record.start => end.checked_add_days(Days::new(1)),
        other => other,
    };

    DisplayEvent {
        id: record.id.clone(),
        legacy_id: derived_id(&record.title, record.start, &record.category),
        title: record.title.clone(),
        start: record.start,
        end,
        all_day: true,
        class_name: record.category.to_string(),
        background_color: color,
        border_color: color,
        text_color: TEXT_COLOR,
        extended_props: ExtendedProps {
            category: record.category.to_string(),
            description: record.description.clone(),
        },
    }
}

pub fn normalize_all(records: &[EventRecord]) -> Vec<DisplayEvent> {
    records.iter().map(normalize).collect()
}

/// Short date, e.g. "Sep 10, 2024"
pub fn format_short(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Long date, e.g. "Tuesday, September 10, 2024"
pub fn format_long(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Human readable date range of a stored record, short form
pub fn display_range(record: &EventRecord) -> String {
    if record.is_multi_day() {
        format!(
            "{} - {}",
            format_short(record.start),
            format_short(record.last_day())
        )
    } else {
        format_short(record.start)
    }
}

/// Human readable date range of a stored record, long form
pub fn display_range_long(record: &EventRecord) -> String {
    if record.is_multi_day() {
        format!(
            "{} - {}",
            format_long(record.start),
            format_long(record.last_day())
        )
    } else {
        format_long(record.start)
    }
}

/// Description shown when a record has none
pub fn default_description(category: &EventCategory, start: NaiveDate) -> String {
    format!(
        "{} event scheduled for {}.",
        category.label(),
        format_short(start)
    )
}
