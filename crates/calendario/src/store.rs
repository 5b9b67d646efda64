//! In-memory event store used by the admin panel.
//!
//! Holds records in insertion order. Listings are sorted copies; the store
//! order only changes through add and delete.

use chrono::NaiveDate;

use crate::error::{StoreError, ValidationError};
use crate::normalize::default_description;
use crate::types::{new_event_id, EventCategory, EventDraft, EventRecord};

#[derive(Debug, Default, Clone)]
pub struct EventStore {
    events: Vec<EventRecord>,
    editing: Option<usize>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(events: Vec<EventRecord>) -> Self {
        Self {
            events,
            editing: None,
        }
    }

    /// Replace all records, dropping any edit in progress
    pub fn replace_all(&mut self, events: Vec<EventRecord>) {
        self.events = events;
        self.editing = None;
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&EventRecord> {
        self.events.get(index)
    }

    /// Position of the record with the given stable id
    #[cfg(test)]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.events.iter().position(|e| e.id == id)
    }

    #[cfg(test)]
    pub fn find(&self, id: &str) -> Option<&EventRecord> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Validate a draft and append it as a new record
    pub fn add(&mut self, draft: &EventDraft) -> Result<&EventRecord, ValidationError> {
        let record = build_record(draft, new_event_id())?;
        self.events.push(record);
        Ok(&self.events[self.events.len() - 1])
    }

    /// Load the record at `index` into form values and remember the position
    pub fn begin_edit(&mut self, index: usize) -> Option<EventDraft> {
        let draft = self.events.get(index).map(EventDraft::from)?;
        self.editing = Some(index);
        Some(draft)
    }

    pub fn editing(&self) -> Option<usize> {
        self.editing
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Overwrite the record at `index`, keeping its stable id.
    ///
    /// Returns the replaced record and the new one.
    pub fn update(
        &mut self,
        index: usize,
        draft: &EventDraft,
    ) -> Result<(EventRecord, EventRecord), StoreError> {
        let current = self.events.get(index).ok_or(StoreError::NotFound(index))?;
        let updated = build_record(draft, current.id.clone())?;
        let old = std::mem::replace(&mut self.events[index], updated.clone());
        self.editing = None;
        Ok((old, updated))
    }

    /// Remove exactly one record by position
    pub fn delete(&mut self, index: usize) -> Option<EventRecord> {
        if index >= self.events.len() {
            return None;
        }
        let removed = self.events.remove(index);
        self.editing = match self.editing {
            Some(i) if i == index => None,
            Some(i) if i > index => Some(i - 1),
            other => other,
        };
        Some(removed)
    }

    /// Records paired with their store position, ordered by start date
    pub fn sorted(&self) -> Vec<(usize, &EventRecord)> {
        let mut sorted: Vec<_> = self.events.iter().enumerate().collect();
        sorted.sort_by_key(|(_, e)| e.start);
        sorted
    }
}

/// Check a loaded record against the same rules the form enforces
pub fn check_record(record: &EventRecord) -> Result<(), ValidationError> {
    if record.title.trim().is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if record.end.is_some_and(|end| end < record.start) {
        return Err(ValidationError::EndBeforeStart);
    }
    Ok(())
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// Validate form values and turn them into a record with the given id
fn build_record(draft: &EventDraft, id: String) -> Result<EventRecord, ValidationError> {
    let title = draft.title.trim();
    let start = draft.start.trim();
    let category = draft.category.trim();

    if title.is_empty() || start.is_empty() || category.is_empty() {
        return Err(ValidationError::MissingFields);
    }

    let start = parse_date("start", start)?;
    let end = match draft.end.trim() {
        "" => start,
        raw => parse_date("end", raw)?,
    };
    if end < start {
        return Err(ValidationError::EndBeforeStart);
    }

    let category = EventCategory::parse(category);
    let description = match draft.description.trim() {
        "" => default_description(&category, start),
        text => text.to_string(),
    };

    Ok(EventRecord {
        id,
        title: title.to_string(),
        start,
        end: Some(end),
        category,
        description: Some(description),
    })
}
