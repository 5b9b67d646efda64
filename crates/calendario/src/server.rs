use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::NaiveDate;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::admin::AdminPanel;
use crate::error::{LoadError, ValidationError};
use crate::export;
use crate::gate::{self, AdminGate};
use crate::html::{self, AdminView, Message};
use crate::normalize::{normalize, normalize_all, DisplayEvent};
use crate::renderer::FullCalendarWidget;
use crate::source::{Loaded, Loader};
use crate::store::check_record;
use crate::types::{new_event_id, EventDraft, EventRecord};

/// Application state shared across requests
pub struct AppState {
    /// Records shown on the public page
    pub published: RwLock<Loaded>,
    /// Admin working copy, edited in memory only
    pub admin: RwLock<AdminPanel<FullCalendarWidget>>,
    pub gate: RwLock<AdminGate>,
    pub loader: Loader,
}

impl AppState {
    pub fn new(loader: Loader, admin_password: &str) -> Self {
        Self {
            published: RwLock::new(Loaded::default()),
            admin: RwLock::new(AdminPanel::new(html::admin_widget())),
            gate: RwLock::new(AdminGate::new(admin_password)),
            loader,
        }
    }

    /// Reload the public records from the source
    pub async fn refresh_published(&self) -> Option<String> {
        let loaded = self.loader.load_or_empty().await;
        let error = loaded.error.clone();

        let mut published = self.published.write().await;
        let old_count = published.events.len();
        *published = loaded;
        let new_count = published.events.len();
        if new_count != old_count {
            info!(
                count = new_count,
                delta = new_count as i64 - old_count as i64,
                "Published events updated"
            );
        } else {
            debug!(count = new_count, "Published events unchanged in size");
        }

        error
    }

    /// Replace the admin working copy with the current source contents
    async fn reload_admin(&self) -> Result<usize, String> {
        let loaded = self.loader.load_or_empty().await;
        let mut panel = self.admin.write().await;
        panel.load(loaded.events);
        panel.renderer_mut().set_initial_date(None);
        match loaded.error {
            Some(e) => Err(e),
            None => Ok(panel.store().len()),
        }
    }

    async fn is_admin(&self, headers: &HeaderMap) -> bool {
        let token = gate::session_token(headers);
        self.gate.read().await.is_admitted(token.as_deref())
    }
}

/// JSON API failures
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Admin session required")]
    Unauthorized,

    #[error("Failed to serialize events: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Load(_) => StatusCode::BAD_GATEWAY,
            AppError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/events.json", get(records_handler))
        .route("/api/events", get(display_events_handler))
        .route("/api/refresh", post(refresh_handler))
        .route("/api/normalize", post(normalize_handler))
        .route("/admin", get(admin_handler))
        .route("/admin/login", post(login_handler))
        .route("/admin/logout", post(logout_handler))
        .route("/admin/events", post(save_event_handler))
        .route("/admin/events/{index}/delete", post(delete_event_handler))
        .route("/admin/clear", post(clear_form_handler))
        .route("/admin/refresh", post(admin_refresh_handler))
        .route("/admin/export", get(export_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server, watching a local source for changes
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    info!(source = %state.loader.source(), "Loading events");
    state.refresh_published().await;

    if let Some(path) = state.loader.source().local_path() {
        start_file_watcher(state.clone(), path.to_path_buf())?;
    }

    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Server running at http://{}", addr);
    info!("Admin panel at http://{}/admin", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Reload the published events when the source file changes
fn start_file_watcher(state: Arc<AppState>, file: PathBuf) -> anyhow::Result<()> {
    let watch_dir = match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let Some(file_name) = file.file_name().map(|n| n.to_os_string()) else {
        anyhow::bail!("Cannot watch {}: not a file path", file.display());
    };

    let (tx, mut rx) = tokio::sync::mpsc::channel(10);

    let dir = watch_dir.clone();
    std::thread::spawn(move || {
        let debouncer = new_debouncer(
            Duration::from_secs(2),
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    if events
                        .iter()
                        .any(|e| e.path.file_name() == Some(file_name.as_os_str()))
                    {
                        let _ = tx.blocking_send(());
                    }
                }
                Err(e) => warn!(error = %e, "File watch error"),
            },
        );

        let mut debouncer = match debouncer {
            Ok(debouncer) => debouncer,
            Err(e) => {
                error!(error = %e, "Failed to create debouncer");
                return;
            }
        };

        if let Err(e) = debouncer.watcher().watch(&dir, RecursiveMode::NonRecursive) {
            error!(dir = %dir.display(), error = %e, "Failed to watch directory");
            return;
        }

        // Keep the watcher alive
        loop {
            std::thread::sleep(Duration::from_secs(60));
        }
    });

    info!(dir = %watch_dir.display(), "Watching for changes");

    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            info!(file = %file.display(), "Detected change in events file");
            if let Some(e) = state.refresh_published().await {
                error!(error = %e, "Failed to refresh");
            }
        }
    });

    Ok(())
}

// ========== public ==========

/// Public page; a failed load is retried before rendering
async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let failed = state.published.read().await.error.is_some();
    if failed {
        info!("Retrying failed event load");
        state.refresh_published().await;
    }

    let published = state.published.read().await;
    let markup = html::render_public_page(&published.events, published.error.as_deref());
    Html(markup.into_string())
}

/// The published records in their stored form
async fn records_handler(State(state): State<Arc<AppState>>) -> Json<Vec<EventRecord>> {
    let published = state.published.read().await;
    Json(published.events.clone())
}

/// The published records as the calendar widget sees them
async fn display_events_handler(State(state): State<Arc<AppState>>) -> Json<Vec<DisplayEvent>> {
    let published = state.published.read().await;
    Json(normalize_all(&published.events))
}

#[derive(Debug, Serialize)]
struct RefreshSummary {
    count: usize,
}

/// Reload published records (manual trigger)
async fn refresh_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshSummary>, AppError> {
    info!("Manual refresh triggered");

    let events = state.loader.load().await?;
    let count = events.len();
    *state.published.write().await = Loaded {
        events,
        error: None,
    };
    Ok(Json(RefreshSummary { count }))
}

/// Validate a single record and return it as the widget would show it
async fn normalize_handler(Json(mut record): Json<EventRecord>) -> Result<Json<DisplayEvent>, AppError> {
    if record.id.trim().is_empty() {
        record.id = new_event_id();
    }
    check_record(&record)?;
    Ok(Json(normalize(&record)))
}

// ========== admin ==========

#[derive(Debug, Deserialize)]
struct AdminQuery {
    date: Option<String>,
    edit: Option<usize>,
    confirm_delete: Option<usize>,
    json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(default)]
    password: String,
}

#[derive(Debug, Default, Deserialize)]
struct DeleteForm {
    confirm: Option<String>,
}

fn login_prompt(status: StatusCode, message: Option<Message>) -> Response {
    let markup = html::render_login_page(message.as_ref());
    (status, Html(markup.into_string())).into_response()
}

/// Render the admin page around the given form values
fn admin_page(
    panel: &AdminPanel<FullCalendarWidget>,
    form: EventDraft,
    message: Option<Message>,
    confirm_delete: Option<usize>,
    show_json: Option<String>,
) -> Html<String> {
    let view = AdminView {
        panel,
        form,
        message,
        confirm_delete,
        show_json,
    };
    Html(html::render_admin_page(&view).into_string())
}

/// Form values for the record being edited, if any
fn editing_form(panel: &mut AdminPanel<FullCalendarWidget>) -> EventDraft {
    match panel.store().editing() {
        Some(index) => panel.begin_edit(index).unwrap_or_default(),
        None => EventDraft::default(),
    }
}

async fn admin_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
) -> Response {
    if !state.is_admin(&headers).await {
        return login_prompt(StatusCode::OK, None);
    }

    let mut panel = state.admin.write().await;
    let mut message = None;
    let mut form = editing_form(&mut panel);
    panel.renderer_mut().set_initial_date(None);

    if let Some(index) = query.edit {
        match panel.begin_edit(index) {
            Some(draft) => form = draft,
            None => message = Some(Message::error(format!("No event at position {}", index))),
        }
    } else if let Some(raw) = query.date.as_deref() {
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => {
                panel.cancel_edit();
                panel.renderer_mut().set_initial_date(Some(date));
                form = EventDraft::starting(date);
            }
            Err(_) => message = Some(Message::error(format!("Invalid date '{}'", raw))),
        }
    }

    let confirm_delete = match query.confirm_delete {
        Some(index) if panel.store().get(index).is_some() => Some(index),
        Some(index) => {
            message = Some(Message::error(format!("No event at position {}", index)));
            None
        }
        None => None,
    };

    let show_json = match query.json {
        Some(_) => match export::to_pretty_json(panel.store().records()) {
            Ok(json) => Some(json),
            Err(e) => {
                error!(error = %e, "Failed to generate JSON");
                message = Some(Message::error("Failed to generate JSON"));
                None
            }
        },
        None => None,
    };

    admin_page(&panel, form, message, confirm_delete, show_json).into_response()
}

async fn login_handler(State(state): State<Arc<AppState>>, Form(login): Form<LoginForm>) -> Response {
    let token = state.gate.write().await.login(&login.password);
    let Some(token) = token else {
        warn!("Failed admin login attempt");
        return login_prompt(
            StatusCode::UNAUTHORIZED,
            Some(Message::error("❌ Incorrect password. Please try again.")),
        );
    };

    let message = match state.reload_admin().await {
        Ok(count) => Message::success(format!("✅ Access granted! {} events loaded.", count)),
        Err(e) => Message::error(format!("Failed to load events: {}", e)),
    };

    let mut panel = state.admin.write().await;
    panel.cancel_edit();
    let page = admin_page(&panel, EventDraft::default(), Some(message), None, None);

    (
        [(header::SET_COOKIE, gate::session_cookie(&token))],
        page,
    )
        .into_response()
}

async fn logout_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = gate::session_token(&headers) {
        if state.gate.write().await.logout(&token) {
            info!("Admin session ended");
        }
    }

    (
        [(header::SET_COOKIE, gate::expired_cookie())],
        Redirect::to("/admin"),
    )
        .into_response()
}

/// Add a new event, or update the one being edited
async fn save_event_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(draft): Form<EventDraft>,
) -> Response {
    if !state.is_admin(&headers).await {
        return login_prompt(StatusCode::UNAUTHORIZED, None);
    }

    let mut panel = state.admin.write().await;
    let result = match panel.store().editing() {
        Some(index) => panel
            .update(index, &draft)
            .map(|event| format!("✅ Event \"{}\" updated successfully!", event.title))
            .map_err(|e| e.to_string()),
        None => panel
            .add(&draft)
            .map(|event| format!("✅ Event \"{}\" added successfully!", event.title))
            .map_err(|e| e.to_string()),
    };

    match result {
        Ok(text) => {
            admin_page(&panel, EventDraft::default(), Some(Message::success(text)), None, None)
                .into_response()
        }
        Err(text) => {
            debug!(error = %text, "Event form rejected");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                admin_page(&panel, draft, Some(Message::error(text)), None, None),
            )
                .into_response()
        }
    }
}

async fn clear_form_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if !state.is_admin(&headers).await {
        return login_prompt(StatusCode::UNAUTHORIZED, None);
    }

    let mut panel = state.admin.write().await;
    panel.cancel_edit();
    admin_page(&panel, EventDraft::default(), None, None, None).into_response()
}

async fn delete_event_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(index): Path<usize>,
    Form(form): Form<DeleteForm>,
) -> Response {
    if !state.is_admin(&headers).await {
        return login_prompt(StatusCode::UNAUTHORIZED, None);
    }

    let mut panel = state.admin.write().await;

    if form.confirm.as_deref() != Some("yes") {
        let form = editing_form(&mut panel);
        let confirm = panel.store().get(index).map(|_| index);
        return admin_page(&panel, form, None, confirm, None).into_response();
    }

    let message = match panel.delete(index) {
        Ok(event) => Message::success(format!("🗑️ Event \"{}\" deleted.", event.title)),
        Err(e) => Message::error(e.to_string()),
    };
    let form = editing_form(&mut panel);
    admin_page(&panel, form, Some(message), None, None).into_response()
}

async fn admin_refresh_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if !state.is_admin(&headers).await {
        return login_prompt(StatusCode::UNAUTHORIZED, None);
    }

    let message = match state.reload_admin().await {
        Ok(count) => Message::info(format!("🔄 Reloaded {} events from the source.", count)),
        Err(e) => Message::error(format!("Failed to load events: {}", e)),
    };

    let panel = state.admin.read().await;
    admin_page(&panel, EventDraft::default(), Some(message), None, None).into_response()
}

/// Download the working copy as `events.json`
async fn export_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if !state.is_admin(&headers).await {
        return Err(AppError::Unauthorized);
    }

    let panel = state.admin.read().await;
    let json = export::to_pretty_json(panel.store().records())?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, export::attachment_disposition()),
        ],
        json,
    )
        .into_response())
}
