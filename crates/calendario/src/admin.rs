use tracing::{debug, info};

use crate::error::{StoreError, ValidationError};
use crate::normalize::{normalize, normalize_all};
use crate::renderer::CalendarRenderer;
use crate::store::EventStore;
use crate::types::{EventDraft, EventRecord};

/// Admin working copy: the event store plus the widget showing it.
///
/// Every mutation goes through here so the widget never drifts from the store.
#[derive(Debug)]
pub struct AdminPanel<R> {
    store: EventStore,
    renderer: R,
}

impl<R: CalendarRenderer> AdminPanel<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            store: EventStore::new(),
            renderer,
        }
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Replace the working copy with freshly loaded records
    pub fn load(&mut self, records: Vec<EventRecord>) {
        self.renderer.set_events(normalize_all(&records));
        self.store.replace_all(records);
        debug!(count = self.store.len(), "Admin working copy loaded");
    }

    pub fn add(&mut self, draft: &EventDraft) -> Result<EventRecord, ValidationError> {
        let record = self.store.add(draft)?.clone();
        self.renderer.add_event(normalize(&record));
        info!(title = %record.title, start = %record.start, "Event added");
        Ok(record)
    }

    pub fn begin_edit(&mut self, index: usize) -> Option<EventDraft> {
        self.store.begin_edit(index)
    }

    pub fn cancel_edit(&mut self) {
        self.store.cancel_edit();
    }

    pub fn update(&mut self, index: usize, draft: &EventDraft) -> Result<EventRecord, StoreError> {
        let (old, new) = self.store.update(index, draft)?;
        self.renderer.remove_event(&old.id);
        self.renderer.add_event(normalize(&new));
        info!(title = %new.title, start = %new.start, "Event updated");
        Ok(new)
    }

    /// Delete by position; confirmation is the caller's job
    pub fn delete(&mut self, index: usize) -> Result<EventRecord, StoreError> {
        let removed = self.store.delete(index).ok_or(StoreError::NotFound(index))?;
        self.renderer.remove_event(&removed.id);
        info!(title = %removed.title, "Event deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::FullCalendarWidget;
    use crate::types::EventCategory;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn draft(title: &str, start: &str, end: &str, category: &str) -> EventDraft {
        EventDraft {
            title: title.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            category: category.to_string(),
            description: String::new(),
        }
    }

    fn panel() -> AdminPanel<FullCalendarWidget> {
        let mut panel = AdminPanel::new(FullCalendarWidget::new("adminCalendar"));
        panel.load(vec![
            EventRecord::new("Orientation", date("2024-01-15"), EventCategory::Academic),
            EventRecord::new("Sports Week", date("2024-03-04"), EventCategory::CoCurricular)
                .with_end(date("2024-03-08")),
        ]);
        panel
    }

    fn renderer_ids(panel: &AdminPanel<FullCalendarWidget>) -> Vec<String> {
        let mut ids: Vec<_> = panel.renderer().events().iter().map(|e| e.id.clone()).collect();
        ids.sort();
        ids
    }

    fn store_ids(panel: &AdminPanel<FullCalendarWidget>) -> Vec<String> {
        let mut ids: Vec<_> = panel.store().records().iter().map(|e| e.id.clone()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_load_populates_store_and_renderer() {
        let panel = panel();
        assert_eq!(panel.store().len(), 2);
        assert_eq!(renderer_ids(&panel), store_ids(&panel));
    }

    #[test]
    fn test_add_inserts_normalized_event() {
        let mut panel = panel();
        let record = panel
            .add(&draft("Sports Day", "2024-03-04", "2024-03-08", "co-curricular"))
            .unwrap();

        assert_eq!(panel.store().len(), 3);
        let shown = panel
            .renderer()
            .events()
            .iter()
            .find(|e| e.id == record.id)
            .unwrap();
        assert_eq!(shown.end, Some(date("2024-03-09")));
        assert_eq!(renderer_ids(&panel), store_ids(&panel));
    }

    #[test]
    fn test_add_invalid_touches_nothing() {
        let mut panel = panel();
        let result = panel.add(&draft("Bad", "2024-03-08", "2024-03-04", "academic"));

        assert_eq!(result, Err(ValidationError::EndBeforeStart));
        assert_eq!(panel.store().len(), 2);
        assert_eq!(panel.renderer().events().len(), 2);
    }

    #[test]
    fn test_update_replaces_renderer_entry() {
        let mut panel = panel();
        panel.begin_edit(0);
        let updated = panel
            .update(0, &draft("Orientation Week", "2024-01-15", "2024-01-19", "academic"))
            .unwrap();

        assert_eq!(panel.renderer().events().len(), 2);
        let shown: Vec<_> = panel
            .renderer()
            .events()
            .iter()
            .filter(|e| e.id == updated.id)
            .collect();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Orientation Week");
        assert_eq!(shown[0].end, Some(date("2024-01-20")));
    }

    #[test]
    fn test_update_renamed_event_with_twin_keeps_twin() {
        let mut panel = AdminPanel::new(FullCalendarWidget::new("adminCalendar"));
        panel.load(vec![
            EventRecord::new("Twin", date("2024-02-01"), EventCategory::Academic),
            EventRecord::new("Twin", date("2024-02-01"), EventCategory::Academic),
        ]);
        let twin_id = panel.store().get(1).unwrap().id.clone();

        panel
            .update(0, &draft("Renamed", "2024-02-01", "", "academic"))
            .unwrap();

        assert!(panel.renderer().events().iter().any(|e| e.id == twin_id));
        assert_eq!(renderer_ids(&panel), store_ids(&panel));
    }

    #[test]
    fn test_delete_removes_matching_renderer_entry() {
        let mut panel = panel();
        let removed = panel.delete(1).unwrap();

        assert_eq!(removed.title, "Sports Week");
        assert_eq!(panel.store().len(), 1);
        assert!(panel.renderer().events().iter().all(|e| e.id != removed.id));
        assert_eq!(renderer_ids(&panel), store_ids(&panel));
    }

    #[test]
    fn test_delete_unknown_position() {
        let mut panel = panel();
        assert_eq!(panel.delete(5), Err(StoreError::NotFound(5)));
        assert_eq!(panel.store().len(), 2);
    }
}
