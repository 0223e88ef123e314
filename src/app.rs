use axum::{
    Form, Json, Router,
    body::Body,
    extract::{Path as AxumPath, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use handlebars::Handlebars;
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::downloader;
use crate::error::{Error, Result};
use crate::guest::{Category, Field, GuestId, GuestRecord};
use crate::roster::{Command, ExportMode, NewGuest, Roster, group_by_table};
use crate::session::{
    Notice, PasswordGate, SESSION_COOKIE, SessionStore, Workspace, event_from_query,
};
use crate::storage::Store;

/// Shared state of the web application.
pub struct AppState {
    pub store: Store,
    pub sessions: SessionStore,
    pub gate: PasswordGate,
    pub default_event: String,
    pub static_dir: PathBuf,
    templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(
        store: Store,
        password: &str,
        default_event: &str,
        static_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let mut templates = Handlebars::new();
        templates
            .register_template_string("login", include_str!("./static/login.hbs"))
            .map_err(|e| Error::Template(e.to_string()))?;
        templates
            .register_template_string("roster", include_str!("./static/roster.hbs"))
            .map_err(|e| Error::Template(e.to_string()))?;

        Ok(AppState {
            store,
            sessions: SessionStore::new(),
            gate: PasswordGate::new(password),
            default_event: default_event.to_string(),
            static_dir: static_dir.into(),
            templates,
        })
    }

    fn render(&self, template: &str, data: &Value) -> Result<Html<String>> {
        self.templates
            .render(template, data)
            .map(Html)
            .map_err(|e| Error::Template(e.to_string()))
    }

    fn has_logo(&self) -> bool {
        self.static_dir.join("logonegro.jpg").exists()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Connection(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Deserialize)]
struct PageQuery {
    id: Option<String>,
    #[serde(default)]
    q: String,
}

#[derive(Deserialize)]
struct LoginForm {
    password: String,
    #[serde(default)]
    id: String,
}

#[derive(Deserialize)]
struct AddGuestForm {
    #[serde(default)]
    table: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    notes: String,
}

#[derive(Deserialize)]
struct FieldForm {
    field: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    q: String,
}

#[derive(Deserialize)]
struct ReturnForm {
    #[serde(default)]
    q: String,
}

#[derive(Deserialize)]
struct ExportQuery {
    mode: Option<String>,
}

/// Build the application router around `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let editor = Router::new()
        .route("/guests", post(add_guest))
        .route("/guests/:guest_id/field", post(set_field))
        .route("/guests/:guest_id/delete", post(delete_guest))
        .route("/save", post(save_roster))
        .route("/export.pdf", get(export_pdf))
        .route("/api/roster", get(get_roster))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(serve_roster))
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .merge(editor)
        .nest_service("/static", ServeDir::new(&state.static_dir))
        .with_state(state)
}

pub async fn run(config: Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let store = config.store()?;
    let state = Arc::new(AppState::new(
        store,
        &config.password,
        &config.default_event,
        &config.static_dir,
    )?);

    let app = router(state);
    let listener = TcpListener::bind(&config.bind).await?;
    info!("listening on http://{}", config.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

fn session_cookie(id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .build()
}

/// Id of the caller's session, if the cookie names a live one.
fn current_session(state: &AppState, jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|id| state.sessions.exists(id))
}

/// Reuse the caller's session or start a new one.
fn ensure_session(state: &AppState, jar: CookieJar) -> (CookieJar, String) {
    match current_session(state, &jar) {
        Some(id) => (jar, id),
        None => {
            let id = state.sessions.create();
            (jar.add(session_cookie(id.clone())), id)
        }
    }
}

/// Make `event` the session's workspace, loading it from storage unless it
/// is already the one being edited.
async fn ensure_workspace(state: &AppState, session_id: &str, event: &str) {
    let loaded = state
        .sessions
        .with(session_id, |s| s.has_event(event))
        .unwrap_or(false);
    if loaded {
        return;
    }

    let loaded = state.store.load_or_empty(event).await;
    state.sessions.with(session_id, |s| {
        s.workspace = Some(Workspace {
            event: event.to_string(),
            roster: loaded.roster,
        });
        if let Some(diagnostic) = loaded.diagnostic {
            s.notice = Some(Notice::Error(diagnostic));
        }
    });
}

fn home(event: &str, query: &str) -> Redirect {
    let mut target = format!("/?id={}", urlencoding::encode(event));
    if !query.trim().is_empty() {
        target.push_str(&format!("&q={}", urlencoding::encode(query)));
    }
    Redirect::to(&target)
}

/// Authentication middleware
///
/// Lets the request through only for an authenticated session; everyone else
/// is sent back to the front page, which shows the password form.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    match current_session(&state, &jar) {
        Some(id) if state.sessions.is_authenticated(&id) => next.run(request).await,
        _ => Redirect::to("/").into_response(),
    }
}

async fn serve_roster(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<PageQuery>,
) -> Response {
    let event = event_from_query(params.id.as_deref(), &state.default_event);

    // Anonymous visitors get the password form without a session; one is
    // opened only by a successful login.
    let Some(session_id) =
        current_session(&state, &jar).filter(|id| state.sessions.is_authenticated(id))
    else {
        return match state.render("login", &login_page(&event, None)) {
            Ok(page) => page.into_response(),
            Err(e) => e.into_response(),
        };
    };

    ensure_workspace(&state, &session_id, &event).await;

    let page = state
        .sessions
        .with(&session_id, |s| {
            let notice = s.take_notice();
            s.workspace
                .as_ref()
                .map(|w| roster_page(&w.event, &w.roster, &params.q, notice, state.has_logo()))
        })
        .flatten();

    match page {
        Some(data) => match state.render("roster", &data) {
            Ok(page) => page.into_response(),
            Err(e) => e.into_response(),
        },
        None => Redirect::to("/").into_response(),
    }
}

async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let event = event_from_query(Some(&form.id), &state.default_event);

    if state.gate.check(&form.password) {
        let (jar, session_id) = ensure_session(&state, jar);
        state.sessions.with(&session_id, |s| s.authenticated = true);
        info!("login accepted");
        (jar, home(&event, "")).into_response()
    } else {
        warn!("login rejected");
        match state.render("login", &login_page(&event, Some("Contraseña incorrecta"))) {
            Ok(page) => (StatusCode::UNAUTHORIZED, page).into_response(),
            Err(e) => e.into_response(),
        }
    }
}

async fn handle_logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(id) = current_session(&state, &jar) {
        state.sessions.remove(&id);
        info!("session closed");
    }
    let expired = Cookie::build(SESSION_COOKIE).path("/").build();
    (jar.remove(expired), Redirect::to("/")).into_response()
}

/// Apply a command to the session's roster and write the roster through to
/// storage when the command calls for it.
async fn run_command(state: &AppState, session_id: &str, command: Command, query: &str) -> Response {
    let applied = state
        .sessions
        .with(session_id, |s| {
            let workspace = s.workspace.as_mut()?;
            let outcome = command.apply(&mut workspace.roster);
            let snapshot = match &outcome {
                Ok(o) if o.needs_save() => Some(workspace.roster.clone()),
                _ => None,
            };
            if let Err(e) = &outcome {
                s.notice = Some(Notice::Error(e.to_string()));
            }
            Some((workspace.event.clone(), outcome, snapshot))
        })
        .flatten();

    let Some((event, outcome, snapshot)) = applied else {
        return Redirect::to("/").into_response();
    };

    match &outcome {
        Ok(o) => info!("applied command on '{}': {:?}", event, o),
        Err(e) => warn!("command rejected on '{}': {}", event, e),
    }

    if let Some(roster) = snapshot {
        if let Err(e) = state.store.save(&roster, &event).await {
            error!("failed to save '{}': {}", event, e);
            state.sessions.with(session_id, |s| {
                s.notice = Some(Notice::Error(format!("No se pudo guardar: {}", e)));
            });
        }
    }

    home(&event, query).into_response()
}

fn session_id(state: &AppState, jar: &CookieJar) -> String {
    // Routes behind `require_auth` always carry a live session.
    current_session(state, jar).unwrap_or_default()
}

async fn add_guest(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<AddGuestForm>,
) -> Response {
    let command = Command::AddGuest(NewGuest {
        table: form.table,
        name: form.name,
        category: Category::from_label(&form.category),
        notes: form.notes,
    });
    run_command(&state, &session_id(&state, &jar), command, "").await
}

async fn set_field(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AxumPath(guest_id): AxumPath<String>,
    Form(form): Form<FieldForm>,
) -> Response {
    let Some(field) = Field::from_name(&form.field) else {
        return (StatusCode::BAD_REQUEST, "unknown field").into_response();
    };
    let command = Command::SetField {
        id: GuestId::new(guest_id),
        field,
        value: form.value,
    };
    run_command(&state, &session_id(&state, &jar), command, &form.q).await
}

async fn delete_guest(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AxumPath(guest_id): AxumPath<String>,
    Form(form): Form<ReturnForm>,
) -> Response {
    let command = Command::DeleteGuest {
        id: GuestId::new(guest_id),
    };
    run_command(&state, &session_id(&state, &jar), command, &form.q).await
}

async fn save_roster(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<ReturnForm>,
) -> Response {
    let id = session_id(&state, &jar);
    let snapshot = state
        .sessions
        .with(&id, |s| {
            s.workspace
                .as_ref()
                .map(|w| (w.event.clone(), w.roster.clone()))
        })
        .flatten();

    let Some((event, roster)) = snapshot else {
        return Redirect::to("/").into_response();
    };

    let notice = match state.store.save(&roster, &event).await {
        Ok(()) => {
            info!("saved {} guests for '{}'", roster.len(), event);
            Notice::Info("¡Cambios guardados!".to_string())
        }
        Err(e) => {
            error!("failed to save '{}': {}", event, e);
            Notice::Error(format!("No se pudo guardar: {}", e))
        }
    };
    state.sessions.with(&id, |s| s.notice = Some(notice));

    home(&event, &form.q).into_response()
}

async fn export_pdf(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<ExportQuery>,
) -> Response {
    let mode = params
        .mode
        .as_deref()
        .and_then(ExportMode::from_query)
        .unwrap_or_default();

    let snapshot = state
        .sessions
        .with(&session_id(&state, &jar), |s| {
            s.workspace
                .as_ref()
                .map(|w| (w.event.clone(), w.roster.clone()))
        })
        .flatten();
    let Some((event, roster)) = snapshot else {
        return Redirect::to("/").into_response();
    };

    let bytes = match downloader::to_pdf(&roster.export_ordering(mode), &event, mode) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("pdf export failed for '{}': {}", event, e);
            return e.into_response();
        }
    };
    info!("exported {} guests of '{}' as pdf", roster.len(), event);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"invitados_{}.pdf\"", mode.query_value()),
        )
        .body(Body::from(bytes))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

async fn get_roster(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let body = state
        .sessions
        .with(&session_id(&state, &jar), |s| {
            s.workspace.as_ref().map(|w| {
                json!({
                    "event": w.event,
                    "guests": w.roster.records(),
                    "tally": w.roster.tally(),
                })
            })
        })
        .flatten();

    match body {
        Some(body) => Json(body).into_response(),
        None => (StatusCode::NOT_FOUND, "no event loaded").into_response(),
    }
}

fn login_page(event: &str, error: Option<&str>) -> Value {
    json!({
        "event": event,
        "error": error,
    })
}

/// Template data for the roster page.
fn roster_page(
    event: &str,
    roster: &Roster,
    query: &str,
    notice: Option<Notice>,
    logo: bool,
) -> Value {
    let totals = if roster.is_empty() {
        Vec::new()
    } else {
        let tally = roster.tally();
        let mut totals = vec![
            json!({ "label": "MESAS", "value": tally.table_count, "style": "grey" }),
            json!({ "label": "TOTAL", "value": tally.total, "style": "black" }),
        ];
        for (category, count) in &tally.per_category {
            totals.push(json!({
                "label": category.short_label(),
                "value": count,
                "style": "grey",
            }));
        }
        totals
    };

    let tables: Vec<Value> = group_by_table(roster.search(query))
        .into_iter()
        .map(|group| {
            json!({
                "table": group.table,
                "count": group.guests.len(),
                "guests": group.guests.iter().map(|g| guest_row(g)).collect::<Vec<_>>(),
            })
        })
        .collect();

    let notice = notice.map(|n| match n {
        Notice::Info(text) => json!({ "kind": "info", "text": text }),
        Notice::Error(text) => json!({ "kind": "error", "text": text }),
    });

    json!({
        "event": event,
        "query": query,
        "logo": logo,
        "notice": notice,
        "totals": totals,
        "categories": Category::KNOWN.iter().map(|c| c.label()).collect::<Vec<_>>(),
        "tables": tables,
    })
}

fn guest_row(guest: &GuestRecord) -> Value {
    let mut options: Vec<Value> = Category::KNOWN
        .iter()
        .map(|c| json!({ "label": c.label(), "selected": *c == guest.category }))
        .collect();
    if !guest.category.is_known() {
        options.push(json!({ "label": guest.category.label(), "selected": true }));
    }

    json!({
        "id": guest.id.as_str(),
        "path_id": urlencoding::encode(guest.id.as_str()),
        "table": guest.table,
        "name": guest.name,
        "notes": guest.notes,
        "attended": guest.attended.label(),
        "options": options,
    })
}
