use anyhow::Result;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::Path;

use crate::admin::AdminPanel;
use crate::normalize::{display_range, display_range_long, normalize_all};
use crate::renderer::{CalendarRenderer, ClickTarget, FullCalendarWidget};
use crate::types::{EventDraft, EventRecord};

const TITLE: &str = "School Events Calendar";
const FULLCALENDAR_JS: &str = "https://cdn.jsdelivr.net/npm/fullcalendar@6.1.15/index.global.min.js";

/// Banner shown above the page content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
    Info,
}

impl MessageKind {
    fn class(self) -> &'static str {
        match self {
            MessageKind::Success => "admin-message admin-message-success",
            MessageKind::Error => "admin-message admin-message-error",
            MessageKind::Info => "admin-message admin-message-info",
        }
    }
}

impl Message {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Info,
            text: text.into(),
        }
    }
}

/// Everything the admin page needs to render
pub struct AdminView<'a> {
    pub panel: &'a AdminPanel<FullCalendarWidget>,
    pub form: EventDraft,
    pub message: Option<Message>,
    pub confirm_delete: Option<usize>,
    pub show_json: Option<String>,
}

/// Generate the static public page
pub fn generate_html(events: &[EventRecord], path: &Path) -> Result<()> {
    let html = render_public_page(events, None);
    fs::write(path, html.into_string())?;
    Ok(())
}

/// Widget for the public page; clicks open the in-page detail modal
pub fn public_widget(events: &[EventRecord]) -> FullCalendarWidget {
    let mut widget = FullCalendarWidget::new("calendar");
    widget.on_event_click(ClickTarget::new("#event-{id}"));
    widget.set_events(normalize_all(events));
    widget
}

/// Widget for the admin panel; date clicks prefill the form
pub fn admin_widget() -> FullCalendarWidget {
    let mut widget = FullCalendarWidget::new("adminCalendar").with_hover_hint("Click to edit/delete");
    widget.on_event_click(ClickTarget::new("#event-{id}"));
    widget.on_date_click(ClickTarget::new("/admin?date={date}#event-form"));
    widget
}

fn page(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(CSS)) }
                script src=(FULLCALENDAR_JS) {}
            }
            body {
                div.container {
                    (body)
                }
                script { (PreEscaped(JAVASCRIPT)) }
            }
        }
    }
}

pub fn render_public_page(events: &[EventRecord], load_error: Option<&str>) -> Markup {
    let widget = public_widget(events);

    page(
        TITLE,
        html! {
            h1 { (TITLE) }
            (render_legend())
            @if load_error.is_some() {
                div.error-message {
                    div.error-content {
                        h3 { "⚠️ Error" }
                        p { "Failed to load events. Please check your internet connection." }
                        button.btn.btn-primary onclick="retryLoad()" { "Retry" }
                    }
                }
            }
            (widget.render())
            @for event in events {
                (render_event_modal(event, None))
            }
        },
    )
}

pub fn render_login_page(message: Option<&Message>) -> Markup {
    page(
        "Admin - School Events Calendar",
        html! {
            h1 { "Admin Panel" }
            div.password-screen #"passwordScreen" {
                @if let Some(message) = message {
                    (render_message(message))
                }
                form.password-form method="post" action="/admin/login" {
                    label for="adminPassword" { "Enter admin password" }
                    input #"adminPassword" type="password" name="password" value="" autofocus;
                    button.btn.btn-primary type="submit" { "Login" }
                }
                p.hint { a href="/" { "← Back to calendar" } }
            }
        },
    )
}

pub fn render_admin_page(view: &AdminView<'_>) -> Markup {
    let store = view.panel.store();
    let editing = store.editing();
    let widget = view.panel.renderer();
    let today = chrono::Local::now().date_naive();

    page(
        "Admin - School Events Calendar",
        html! {
            div.admin-content #"adminContent" {
                @if let Some(message) = &view.message {
                    (render_message(message))
                }
                div.admin-header {
                    h1 { "Admin Panel" }
                    div.admin-toolbar {
                        @if let Some(target) = widget.date_click() {
                            a.btn.btn-primary href=(target.for_date(today)) { "＋ New event today" }
                        }
                        form method="post" action="/admin/refresh" {
                            button.btn.btn-secondary type="submit" { "🔄 Refresh" }
                        }
                        form method="post" action="/admin/logout" {
                            button.btn.btn-secondary type="submit" { "Logout" }
                        }
                    }
                }
                (render_legend())
                (widget.render())

                @if let Some(index) = view.confirm_delete {
                    @if let Some(event) = store.get(index) {
                        (render_delete_confirmation(index, event))
                    }
                }

                (render_event_form(&view.form, editing))

                section.events-section {
                    h2 { "Events (" (store.len()) ")" }
                    div.events-list #"eventsList" {
                        @if store.is_empty() {
                            div.empty-state {
                                p { "📅 No events added yet. Use the form above to add your first event." }
                            }
                        } @else {
                            @for (index, event) in store.sorted() {
                                (render_event_item(index, event, widget.event_click()))
                            }
                        }
                    }
                }

                (render_json_section(view.show_json.as_deref()))

                @for (index, event) in store.records().iter().enumerate() {
                    (render_event_modal(event, Some(index)))
                }
            }
        },
    )
}

fn render_legend() -> Markup {
    html! {
        div.legend {
            span.legend-item.academic { "Academic" }
            span.legend-item.co-curricular { "Co-curricular" }
        }
    }
}

fn render_message(message: &Message) -> Markup {
    html! {
        div class=(message.kind.class()) {
            div.message-content {
                span.message-text { (message.text) }
                button.message-close type="button" { "×" }
            }
        }
    }
}

fn render_event_form(form: &EventDraft, editing: Option<usize>) -> Markup {
    let known = ["academic", "co-curricular"];
    let custom = !form.category.is_empty() && !known.contains(&form.category.as_str());

    html! {
        section.form-section {
            h2 {
                @if editing.is_some() { "Edit Event" } @else { "Add Event" }
            }
            form.event-form #"event-form" method="post" action="/admin/events" {
                label for="eventTitle" { "Title *" }
                input #"eventTitle" type="text" name="title" value=(form.title) required;

                div.form-row {
                    div {
                        label for="eventStart" { "Start Date *" }
                        input #"eventStart" type="date" name="start" value=(form.start) required;
                    }
                    div {
                        label for="eventEnd" { "End Date" }
                        input #"eventEnd" type="date" name="end" value=(form.end);
                    }
                }

                label for="eventType" { "Type *" }
                select #"eventType" name="type" required {
                    option value="" selected[form.category.is_empty()] { "Select type" }
                    option value="academic" selected[form.category == "academic"] { "Academic" }
                    option value="co-curricular" selected[form.category == "co-curricular"] { "Co-curricular" }
                    @if custom {
                        option value=(form.category) selected { (form.category) }
                    }
                }

                label for="eventDescription" { "Description" }
                textarea #"eventDescription" name="description" rows="3" { (form.description) }

                div.form-actions {
                    @if editing.is_some() {
                        button.btn.btn-success type="submit" { "Update Event" }
                    } @else {
                        button.btn.btn-primary type="submit" { "Add Event" }
                    }
                    button.btn.btn-secondary type="submit" formaction="/admin/clear" formnovalidate { "Clear" }
                }
            }
        }
    }
}

fn render_event_item(index: usize, event: &EventRecord, details: Option<&ClickTarget>) -> Markup {
    let category = event.category.as_str();

    html! {
        div class={"event-item " (category)} data-index=(index) {
            div.event-header {
                h4.event-title { (event.title) }
                span class={"event-type-badge " (category)} { (category) }
            }
            div.event-details {
                p.event-date { "📅 " (display_range(event)) }
                p.event-description {
                    (event.description.as_deref().unwrap_or("No description"))
                }
            }
            div.event-actions {
                @if let Some(target) = details {
                    a.btn.btn-small.btn-secondary href=(target.for_event(&event.id)) { "🔍 Details" }
                }
                a.btn.btn-small.btn-primary href={"/admin?edit=" (index) "#event-form"} { "✏️ Edit" }
                a.btn.btn-small.btn-secondary href={"/admin?confirm_delete=" (index)} { "🗑️ Delete" }
            }
        }
    }
}

/// Detail modal, opened through the `#event-<id>` fragment
fn render_event_modal(event: &EventRecord, admin_index: Option<usize>) -> Markup {
    let category = event.category.as_str();

    html! {
        div.modal id={"event-" (event.id)} role="dialog" aria-labelledby={"title-" (event.id)} {
            div.modal-content {
                a.close href="#" aria-label="Close" { "×" }
                h2 id={"title-" (event.id)} { (event.title) }
                span class={"event-type-badge " (category)} { (category) }
                p.modal-date { (display_range_long(event)) }
                p.modal-description {
                    (event.description.as_deref().unwrap_or("No description available."))
                }
                @if let Some(index) = admin_index {
                    div.modal-actions {
                        a.btn.btn-primary href={"/admin?edit=" (index) "#event-form"} { "✏️ Edit" }
                        a.btn.btn-secondary href={"/admin?confirm_delete=" (index)} { "🗑️ Delete" }
                    }
                }
            }
        }
    }
}

fn render_delete_confirmation(index: usize, event: &EventRecord) -> Markup {
    html! {
        div.confirm-dialog role="alertdialog" {
            p { "Are you sure you want to delete the event \"" (event.title) "\"?" }
            form method="post" action={"/admin/events/" (index) "/delete"} {
                input type="hidden" name="confirm" value="yes";
                button.btn.btn-danger type="submit" { "Delete" }
                a.btn.btn-secondary href="/admin" { "Cancel" }
            }
        }
    }
}

fn render_json_section(json: Option<&str>) -> Markup {
    html! {
        section.json-section {
            h2 { "Export" }
            p.hint {
                "Changes live only in this session. Download the JSON and replace the published events file to make them permanent."
            }
            div.json-actions {
                a.btn.btn-primary href="/admin?json=1#jsonContainer" { "Generate JSON" }
                a.btn.btn-secondary href="/admin/export" download="events.json" { "💾 Download JSON" }
            }
            @if let Some(json) = json {
                div.json-container #"jsonContainer" {
                    div.json-actions {
                        button.btn.btn-primary type="button" #"copyJson" { "📋 Copy" }
                        a.btn.btn-secondary href="/admin" { "Hide" }
                    }
                    pre #"jsonOutput" { (json) }
                }
            }
        }
    }
}

const CSS: &str = r#"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
    background: #f3f4f6;
    color: #1f2937;
    line-height: 1.5;
}

.container {
    max-width: 1100px;
    margin: 0 auto;
    padding: 32px 20px 60px;
}

h1 {
    font-size: 2em;
    font-weight: 800;
    margin-bottom: 12px;
    color: #312e81;
}

h2 {
    font-size: 1.25em;
    margin-bottom: 12px;
}

.legend {
    display: flex;
    gap: 16px;
    margin-bottom: 16px;
    font-size: 0.9em;
}

.legend-item::before {
    content: '';
    display: inline-block;
    width: 12px;
    height: 12px;
    border-radius: 3px;
    margin-right: 6px;
    background: #6b7280;
}

.legend-item.academic::before { background: #3b82f6; }
.legend-item.co-curricular::before { background: #16a34a; }

.calendar-container {
    position: relative;
    background: white;
    border-radius: 12px;
    padding: 16px;
    margin-bottom: 24px;
    box-shadow: 0 2px 8px rgba(0, 0, 0, 0.08);
}

.btn {
    display: inline-block;
    border: none;
    border-radius: 6px;
    padding: 0.55rem 1rem;
    font-size: 0.9rem;
    font-weight: 600;
    cursor: pointer;
    text-decoration: none;
    color: white;
}

.btn-primary { background: #6366f1; }
.btn-secondary { background: #6b7280; }
.btn-success { background: #16a34a; }
.btn-danger { background: #dc2626; }
.btn-small { padding: 0.4rem 0.8rem; font-size: 0.8rem; }

.error-message {
    background: #fef2f2;
    border: 1px solid #fecaca;
    border-radius: 8px;
    padding: 1rem;
    margin-bottom: 1rem;
    text-align: center;
}

.error-content h3 { color: #dc2626; margin-bottom: 0.5rem; }
.error-content p { color: #991b1b; margin-bottom: 1rem; }

.modal {
    display: none;
    position: fixed;
    inset: 0;
    background: rgba(0, 0, 0, 0.5);
    z-index: 1000;
}

.modal:target {
    display: flex;
    align-items: center;
    justify-content: center;
}

.modal-content {
    position: relative;
    background: white;
    border-radius: 12px;
    padding: 24px;
    width: min(520px, 92vw);
}

.close {
    position: absolute;
    top: 12px;
    right: 16px;
    font-size: 1.5em;
    text-decoration: none;
    color: #6b7280;
}

.modal-date { color: #6b7280; margin: 12px 0 8px; }
.modal-actions { display: flex; gap: 0.5rem; justify-content: center; margin-top: 1rem; }

.event-type-badge {
    display: inline-block;
    font-size: 0.75em;
    font-weight: 700;
    text-transform: uppercase;
    padding: 2px 8px;
    border-radius: 999px;
    background: #e5e7eb;
    color: #374151;
}

.event-type-badge.academic { background: #dbeafe; color: #1d4ed8; }
.event-type-badge.co-curricular { background: #dcfce7; color: #166534; }

.password-screen, .form-section, .events-section, .json-section, .confirm-dialog {
    background: white;
    border-radius: 12px;
    padding: 20px;
    margin-bottom: 24px;
    box-shadow: 0 2px 8px rgba(0, 0, 0, 0.08);
}

.password-form, .event-form {
    display: grid;
    gap: 8px;
}

input, select, textarea {
    font: inherit;
    padding: 0.5rem;
    border: 1px solid #d1d5db;
    border-radius: 6px;
    width: 100%;
}

.form-row { display: grid; grid-template-columns: 1fr 1fr; gap: 12px; }
.form-actions, .json-actions, .admin-toolbar { display: flex; gap: 0.5rem; flex-wrap: wrap; margin-top: 8px; }

.admin-header {
    display: flex;
    justify-content: space-between;
    align-items: center;
    gap: 1rem;
}

.event-item {
    background: white;
    border-radius: 8px;
    padding: 1rem;
    margin-bottom: 1rem;
    box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);
    border-left: 4px solid #e5e7eb;
}

.event-item.academic { border-left-color: #3b82f6; }
.event-item.co-curricular { border-left-color: #16a34a; }

.event-header {
    display: flex;
    justify-content: space-between;
    align-items: flex-start;
    gap: 1rem;
    margin-bottom: 0.5rem;
}

.event-title { font-size: 1.1rem; margin: 0; flex: 1; }
.event-date { color: #6b7280; font-size: 0.9rem; }
.event-description { color: #4b5563; font-size: 0.9rem; margin-bottom: 0.75rem; }
.event-actions { display: flex; gap: 0.5rem; flex-wrap: wrap; }

.empty-state { text-align: center; padding: 2rem; color: #6b7280; font-style: italic; }

.admin-message { margin-bottom: 1rem; border-radius: 8px; padding: 1rem; }
.admin-message-success { background: #f0fdf4; border: 1px solid #bbf7d0; color: #166534; }
.admin-message-error { background: #fef2f2; border: 1px solid #fecaca; color: #dc2626; }
.admin-message-info { background: #eff6ff; border: 1px solid #bfdbfe; color: #1d4ed8; }

.message-content { display: flex; justify-content: space-between; align-items: center; gap: 1rem; }
.message-close { background: none; border: none; font-size: 1.2rem; cursor: pointer; color: inherit; }

.hint { color: #6b7280; font-size: 0.9em; margin: 8px 0; }

pre {
    background: #111827;
    color: #e5e7eb;
    padding: 16px;
    border-radius: 8px;
    overflow-x: auto;
    margin-top: 12px;
    font-size: 0.85em;
}

@media (max-width: 768px) {
    h1 { font-size: 1.5em; }
    .form-row { grid-template-columns: 1fr; }
    .event-header, .admin-header { flex-direction: column; gap: 0.5rem; }
}
"#;

const JAVASCRIPT: &str = r#"
const calendars = {};

// Boot every calendar widget from its JSON config
document.querySelectorAll('script[data-calendar-config]').forEach(function (node) {
    const config = JSON.parse(node.textContent);
    const el = document.getElementById(config.elementId);
    if (!el || typeof FullCalendar === 'undefined') {
        return;
    }

    const narrow = () => window.innerWidth < 768;
    const toolbar = () => narrow()
        ? { left: 'prev,next', center: 'title', right: 'today' }
        : { left: 'prev,next today', center: 'title', right: '' };

    const calendar = new FullCalendar.Calendar(el, {
        initialView: 'dayGridMonth',
        initialDate: config.initialDate,
        height: 'auto',
        events: config.events,
        headerToolbar: toolbar(),
        aspectRatio: narrow() ? 1.0 : 1.35,
        eventClick: function (info) {
            if (config.eventClickUrl) {
                info.jsEvent.preventDefault();
                window.location.href = config.eventClickUrl.replace('{id}', encodeURIComponent(info.event.id));
            }
        },
        dateClick: function (info) {
            if (config.dateClickUrl) {
                window.location.href = config.dateClickUrl.replace('{date}', info.dateStr);
            }
        },
        eventDidMount: function (info) {
            info.el.style.cursor = 'pointer';
            info.el.title = info.event.title + '\n' + config.hoverHint;
        },
        windowResize: function () {
            calendar.setOption('aspectRatio', narrow() ? 1.0 : 1.35);
            calendar.setOption('headerToolbar', toolbar());
        }
    });
    calendar.render();
    calendars[config.elementId] = calendar;
});

// Reload the events on the server, then the page
function retryLoad() {
    fetch('/api/refresh', { method: 'POST' }).finally(function () {
        location.reload();
    });
}

// Operations on the public calendar for other scripts on the page
window.calendarAPI = {
    refreshCalendar: async function () {
        const response = await fetch('/api/refresh', { method: 'POST' });
        if (!response.ok) {
            throw new Error('Refresh failed: HTTP ' + response.status);
        }
        const events = await window.calendarAPI.getEvents();
        const calendar = calendars['calendar'];
        if (calendar) {
            calendar.removeAllEvents();
            events.forEach(function (event) {
                calendar.addEvent(event);
            });
        }
        return events;
    },
    getEvents: async function () {
        const response = await fetch('/api/events');
        return response.json();
    },
    addEvent: async function (record) {
        const response = await fetch('/api/normalize', {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify(record)
        });
        const event = await response.json();
        if (!response.ok) {
            throw new Error(event.error);
        }
        const calendar = calendars['calendar'];
        if (calendar) {
            calendar.addEvent(event);
        }
        return event;
    }
};

// Close the detail modal with Escape
document.addEventListener('keydown', function (e) {
    if (e.key === 'Escape' && window.location.hash.startsWith('#event-')) {
        window.location.hash = '';
    }
});

// Close a modal when clicking the backdrop
document.querySelectorAll('.modal').forEach(function (modal) {
    modal.addEventListener('click', function (e) {
        if (e.target === modal) {
            window.location.hash = '';
        }
    });
});

// Dismiss banners
document.querySelectorAll('.message-close').forEach(function (button) {
    button.addEventListener('click', function () {
        button.closest('.admin-message').remove();
    });
});

// Default the end date to the start date
const startField = document.getElementById('eventStart');
const endField = document.getElementById('eventEnd');
if (startField && endField) {
    startField.addEventListener('change', function () {
        if (!endField.value) {
            endField.value = startField.value;
        }
    });
}

// Copy the exported JSON, falling back to a manual selection
const copyButton = document.getElementById('copyJson');
if (copyButton) {
    copyButton.addEventListener('click', async function () {
        const text = document.getElementById('jsonOutput').textContent;
        try {
            await navigator.clipboard.writeText(text);
            copyButton.textContent = '📋 Copied!';
        } catch (err) {
            const textArea = document.createElement('textarea');
            textArea.value = text;
            document.body.appendChild(textArea);
            textArea.select();
            document.execCommand('copy');
            document.body.removeChild(textArea);
            copyButton.textContent = '📋 Copied!';
        }
    });
}
"#;
