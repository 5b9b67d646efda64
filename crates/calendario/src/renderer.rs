//! Binding to the calendar widget.
//!
//! The grid itself is drawn in the browser by FullCalendar. This module keeps
//! the widget's event collection on the server side and emits the markup and
//! JSON configuration the boot script in [`crate::html`] hands to the widget.

use chrono::NaiveDate;
use maud::{html, Markup, PreEscaped};
use serde::Serialize;
use tracing::warn;

use crate::normalize::DisplayEvent;

/// Navigation target for a widget click.
///
/// Clicks come back to the app as requests, so a callback is a URL template:
/// `{id}` is replaced with the event id, `{date}` with the clicked day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickTarget(String);

impl ClickTarget {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn template(&self) -> &str {
        &self.0
    }

    pub fn for_event(&self, id: &str) -> String {
        self.0.replace("{id}", id)
    }

    pub fn for_date(&self, date: NaiveDate) -> String {
        self.0.replace("{date}", &date.format("%Y-%m-%d").to_string())
    }
}

/// What the app needs from a calendar widget
pub trait CalendarRenderer {
    /// Markup that mounts the widget with its current events
    fn render(&self) -> Markup;

    /// Replace the whole event collection
    fn set_events(&mut self, events: Vec<DisplayEvent>);

    fn add_event(&mut self, event: DisplayEvent);

    /// Remove the first event with the given id
    fn remove_event(&mut self, id: &str) -> Option<DisplayEvent>;

    fn events(&self) -> &[DisplayEvent];

    fn on_event_click(&mut self, target: ClickTarget);

    fn on_date_click(&mut self, target: ClickTarget);
}

/// FullCalendar month view
#[derive(Debug, Clone)]
pub struct FullCalendarWidget {
    element_id: String,
    events: Vec<DisplayEvent>,
    event_click: Option<ClickTarget>,
    date_click: Option<ClickTarget>,
    hover_hint: String,
    initial_date: Option<NaiveDate>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WidgetConfig<'a> {
    element_id: &'a str,
    events: &'a [DisplayEvent],
    #[serde(skip_serializing_if = "Option::is_none")]
    event_click_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_click_url: Option<&'a str>,
    hover_hint: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    initial_date: Option<NaiveDate>,
}

impl FullCalendarWidget {
    pub fn new(element_id: &str) -> Self {
        Self {
            element_id: element_id.to_string(),
            events: Vec::new(),
            event_click: None,
            date_click: None,
            hover_hint: "Click for details".to_string(),
            initial_date: None,
        }
    }

    /// Tooltip suffix shown when hovering an event
    pub fn with_hover_hint(mut self, hint: &str) -> Self {
        self.hover_hint = hint.to_string();
        self
    }

    /// Month the widget opens on; defaults to the current month
    pub fn set_initial_date(&mut self, date: Option<NaiveDate>) {
        self.initial_date = date;
    }

    pub fn event_click(&self) -> Option<&ClickTarget> {
        self.event_click.as_ref()
    }

    pub fn date_click(&self) -> Option<&ClickTarget> {
        self.date_click.as_ref()
    }

    /// JSON handed to the boot script
    pub fn config_json(&self) -> String {
        let config = WidgetConfig {
            element_id: &self.element_id,
            events: &self.events,
            event_click_url: self.event_click.as_ref().map(ClickTarget::template),
            date_click_url: self.date_click.as_ref().map(ClickTarget::template),
            hover_hint: &self.hover_hint,
            initial_date: self.initial_date,
        };

        match serde_json::to_string(&config) {
            // Keep "</script>" inside titles from closing the tag
            Ok(json) => json.replace("</", "<\\/"),
            Err(e) => {
                warn!(error = %e, "Failed to serialize calendar config");
                String::from("{}")
            }
        }
    }
}

impl CalendarRenderer for FullCalendarWidget {
    fn render(&self) -> Markup {
        html! {
            div.calendar-container {
                div.calendar id=(self.element_id) {}
                script type="application/json" data-calendar-config="" {
                    (PreEscaped(self.config_json()))
                }
            }
        }
    }

    fn set_events(&mut self, events: Vec<DisplayEvent>) {
        self.events = events;
    }

    fn add_event(&mut self, event: DisplayEvent) {
        self.events.push(event);
    }

    fn remove_event(&mut self, id: &str) -> Option<DisplayEvent> {
        let index = self.events.iter().position(|e| e.id == id)?;
        Some(self.events.remove(index))
    }

    fn events(&self) -> &[DisplayEvent] {
        &self.events
    }

    fn on_event_click(&mut self, target: ClickTarget) {
        self.event_click = Some(target);
    }

    fn on_date_click(&mut self, target: ClickTarget) {
        self.date_click = Some(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::types::{EventCategory, EventRecord};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn display(title: &str) -> DisplayEvent {
        normalize(&EventRecord::new(
            title,
            date("2024-09-10"),
            EventCategory::Academic,
        ))
    }

    #[test]
    fn test_click_target_substitution() {
        let target = ClickTarget::new("/admin?date={date}#event-form");
        assert_eq!(
            target.for_date(date("2024-03-04")),
            "/admin?date=2024-03-04#event-form"
        );

        let target = ClickTarget::new("#event-{id}");
        assert_eq!(target.for_event("abc"), "#event-abc");
    }

    #[test]
    fn test_add_and_remove_by_id() {
        let mut widget = FullCalendarWidget::new("calendar");
        let first = display("First");
        let second = display("Second");
        widget.add_event(first.clone());
        widget.add_event(second.clone());

        let removed = widget.remove_event(&first.id).unwrap();
        assert_eq!(removed.title, "First");
        assert_eq!(widget.events().len(), 1);
        assert_eq!(widget.events()[0].id, second.id);

        assert!(widget.remove_event("unknown").is_none());
    }

    #[test]
    fn test_remove_only_targets_matching_id_even_with_same_content() {
        let mut widget = FullCalendarWidget::new("calendar");
        let a = display("Twin");
        let b = display("Twin");
        assert_eq!(a.legacy_id, b.legacy_id);

        widget.set_events(vec![a.clone(), b.clone()]);
        widget.remove_event(&b.id);

        assert_eq!(widget.events(), &[a]);
    }

    #[test]
    fn test_config_json_includes_callbacks_and_events() {
        let mut widget = FullCalendarWidget::new("adminCalendar").with_hover_hint("Click to edit/delete");
        widget.on_event_click(ClickTarget::new("#event-{id}"));
        widget.on_date_click(ClickTarget::new("/admin?date={date}"));
        widget.add_event(display("Founders Day"));

        let config: serde_json::Value = serde_json::from_str(&widget.config_json()).unwrap();
        assert_eq!(config["elementId"], "adminCalendar");
        assert_eq!(config["eventClickUrl"], "#event-{id}");
        assert_eq!(config["dateClickUrl"], "/admin?date={date}");
        assert_eq!(config["hoverHint"], "Click to edit/delete");
        assert_eq!(config["events"].as_array().unwrap().len(), 1);
        assert!(config.get("initialDate").is_none());
    }

    #[test]
    fn test_config_without_callbacks_omits_urls() {
        let widget = FullCalendarWidget::new("calendar");
        let config: serde_json::Value = serde_json::from_str(&widget.config_json()).unwrap();
        assert!(config.get("eventClickUrl").is_none());
        assert!(config.get("dateClickUrl").is_none());
        assert_eq!(config["events"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_render_escapes_closing_script_tags() {
        let mut widget = FullCalendarWidget::new("calendar");
        widget.add_event(display("</script><b>x</b>"));

        let markup = widget.render().into_string();
        assert!(markup.contains("id=\"calendar\""));
        assert!(markup.contains("data-calendar-config"));
        assert!(!markup.contains("</script><b>"));
        assert!(markup.contains("<\\/script>"));
    }

    #[test]
    fn test_initial_date_in_config() {
        let mut widget = FullCalendarWidget::new("calendar");
        widget.set_initial_date(Some(date("2024-03-04")));
        let config: serde_json::Value = serde_json::from_str(&widget.config_json()).unwrap();
        assert_eq!(config["initialDate"], "2024-03-04");
    }
}
