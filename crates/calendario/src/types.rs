use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Event category. Unknown values are kept verbatim so they survive an
/// export, and get the neutral visual treatment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum EventCategory {
    #[default]
    Academic,
    CoCurricular,
    Other(String),
}

impl EventCategory {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "academic" => EventCategory::Academic,
            "co-curricular" => EventCategory::CoCurricular,
            other => EventCategory::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventCategory::Academic => "academic",
            EventCategory::CoCurricular => "co-curricular",
            EventCategory::Other(name) => name,
        }
    }

    /// Label used when synthesizing a default description
    pub fn label(&self) -> &'static str {
        match self {
            EventCategory::Academic => "Academic",
            _ => "Co-curricular",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| EventCategory::parse(&s)).unwrap_or_default())
    }
}

/// A single calendar event as stored in the events document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    /// Stable identifier, assigned on creation (or on load for older documents)
    #[serde(default)]
    pub id: String,

    pub title: String,

    /// First day of the event
    pub start: NaiveDate,

    /// Last day of the event, inclusive
    #[serde(
        default,
        deserialize_with = "blank_date_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<NaiveDate>,

    #[serde(rename = "type", default)]
    pub category: EventCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Read an optional date where `null` and `""` both mean absent
fn blank_date_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

impl EventRecord {
    pub fn new(title: &str, start: NaiveDate, category: EventCategory) -> Self {
        Self {
            id: new_event_id(),
            title: title.to_string(),
            start,
            end: None,
            category,
            description: None,
        }
    }

    #[cfg(test)]
    pub fn with_end(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    #[cfg(test)]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Last day covered by the event, inclusive
    pub fn last_day(&self) -> NaiveDate {
        self.end.unwrap_or(self.start)
    }

    pub fn is_multi_day(&self) -> bool {
        self.end.is_some_and(|end| end != self.start)
    }
}

/// Generate a fresh stable identifier for an event
pub fn new_event_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Raw values from the admin form, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(rename = "type", default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

impl EventDraft {
    /// Empty form with the start date preset
    pub fn starting(start: NaiveDate) -> Self {
        Self {
            start: start.format("%Y-%m-%d").to_string(),
            ..Self::default()
        }
    }
}

impl From<&EventRecord> for EventDraft {
    fn from(record: &EventRecord) -> Self {
        Self {
            title: record.title.clone(),
            start: record.start.format("%Y-%m-%d").to_string(),
            end: record.last_day().format("%Y-%m-%d").to_string(),
            category: record.category.to_string(),
            description: record.description.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_category_parse_known_values() {
        assert_eq!(EventCategory::parse("academic"), EventCategory::Academic);
        assert_eq!(
            EventCategory::parse("co-curricular"),
            EventCategory::CoCurricular
        );
        assert_eq!(EventCategory::parse(""), EventCategory::Academic);
    }

    #[test]
    fn test_category_unknown_value_preserved() {
        let category = EventCategory::parse("holiday");
        assert_eq!(category, EventCategory::Other("holiday".to_string()));
        assert_eq!(category.as_str(), "holiday");
        assert_eq!(category.label(), "Co-curricular");
    }

    #[test]
    fn test_record_deserialization_without_id_or_end() {
        let json = r#"{"title":"Founders Day","start":"2024-09-10","type":"academic"}"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();

        assert!(record.id.is_empty());
        assert_eq!(record.title, "Founders Day");
        assert_eq!(record.start, date("2024-09-10"));
        assert_eq!(record.end, None);
        assert_eq!(record.category, EventCategory::Academic);
        assert_eq!(record.description, None);
    }

    #[test]
    fn test_record_missing_type_defaults_to_academic() {
        let json = r#"{"title":"Assembly","start":"2024-09-10"}"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.category, EventCategory::Academic);

        let json = r#"{"title":"Assembly","start":"2024-09-10","type":null}"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.category, EventCategory::Academic);
    }

    #[test]
    fn test_record_blank_or_null_end_is_absent() {
        let json = r#"{"title":"Assembly","start":"2024-09-10","end":""}"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.end, None);

        let json = r#"{"title":"Assembly","start":"2024-09-10","end":null}"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.end, None);

        let json = r#"{"title":"Assembly","start":"2024-09-10","end":"2024-09-12"}"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.end, Some(date("2024-09-12")));
    }

    #[test]
    fn test_record_serialization_uses_type_key() {
        let record = EventRecord::new("Sports Week", date("2024-03-04"), EventCategory::CoCurricular)
            .with_end(date("2024-03-08"));

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"type\":\"co-curricular\""));
        assert!(json.contains("\"start\":\"2024-03-04\""));
        assert!(json.contains("\"end\":\"2024-03-08\""));
        assert!(!json.contains("description"));
    }

    #[test]
    fn test_new_records_get_distinct_ids() {
        let a = EventRecord::new("Same", date("2024-01-01"), EventCategory::Academic);
        let b = EventRecord::new("Same", date("2024-01-01"), EventCategory::Academic);
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_multi_day_detection() {
        let single = EventRecord::new("Exam", date("2024-05-02"), EventCategory::Academic);
        assert!(!single.is_multi_day());
        assert_eq!(single.last_day(), date("2024-05-02"));

        let same_day = single.clone().with_end(date("2024-05-02"));
        assert!(!same_day.is_multi_day());

        let spanning = single.with_end(date("2024-05-04"));
        assert!(spanning.is_multi_day());
        assert_eq!(spanning.last_day(), date("2024-05-04"));
    }

    #[test]
    fn test_draft_from_record_fills_end_with_start() {
        let record = EventRecord::new("Exam", date("2024-05-02"), EventCategory::Academic)
            .with_description("Room 4");
        let draft = EventDraft::from(&record);

        assert_eq!(draft.title, "Exam");
        assert_eq!(draft.start, "2024-05-02");
        assert_eq!(draft.end, "2024-05-02");
        assert_eq!(draft.category, "academic");
        assert_eq!(draft.description, "Room 4");
    }
}
