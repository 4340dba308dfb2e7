//! HTTP request handlers
//!
//! Handlers for the entry page, upload/download and the JSON API.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::form::{check_record, RecordForm};
use super::page::{render_page, Flash, PageView};
use super::server::AppState;
use crate::error::{IntakeError, IntakeResult};
use crate::session::{Preview, SessionId};
use crate::types::{Record, XLSX_MIME};

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "intake_session";

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

//==============================================================================
// Session cookie helpers
//==============================================================================

/// Read the session id from the request's `Cookie` header
pub fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| value.parse().ok())
}

/// `Set-Cookie` value binding the client to `id`
pub fn session_cookie(id: SessionId) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

/// `Set-Cookie` value that clears the session cookie
fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

fn with_cookie(cookie: String, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

/// HTTP status for an error
pub fn status_for(err: &IntakeError) -> StatusCode {
    match err {
        IntakeError::MalformedUpload(_) | IntakeError::Validation(_) => StatusCode::BAD_REQUEST,
        IntakeError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        IntakeError::CorruptState(_) | IntakeError::Serialization(_) | IntakeError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn json_error(err: &IntakeError) -> Response {
    if !err.is_client_error() {
        warn!("Request failed: {}", err);
    }
    (status_for(err), Json(ApiResponse::<()>::err(err.to_string()))).into_response()
}

fn html_error(err: &IntakeError) -> Response {
    warn!("Page render failed: {}", err);
    let view = PageView {
        flash: Some(Flash::Error(err.to_string())),
        ..Default::default()
    };
    (status_for(err), Html(render_page(&view))).into_response()
}

//==============================================================================
// Entry page
//==============================================================================

/// Render the page for `id` with the given form values and banner
fn page_for(
    state: &AppState,
    id: SessionId,
    form: RecordForm,
    flash: Option<Flash>,
) -> IntakeResult<String> {
    let preview = state
        .sessions
        .with_session(id, |s| s.preview_tail(state.preview_rows))?;
    Ok(render_page(&PageView {
        form,
        flash,
        preview: Some(preview),
        preview_rows: state.preview_rows,
    }))
}

/// GET / - Entry page
pub async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let result = state
        .sessions
        .get_or_create(session_from_headers(&headers))
        .and_then(|id| Ok((id, page_for(&state, id, RecordForm::default(), None)?)));

    match result {
        Ok((id, html)) => with_cookie(session_cookie(id), Html(html)),
        Err(e) => html_error(&e),
    }
}

/// POST /rows - "Add Row" form submission
pub async fn add_row(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<RecordForm>,
) -> Response {
    let id = match state.sessions.get_or_create(session_from_headers(&headers)) {
        Ok(id) => id,
        Err(e) => return html_error(&e),
    };

    let today = chrono::Local::now().date_naive();
    let appended = form
        .to_record(today)
        .and_then(|record| state.sessions.with_session(id, |s| s.append_row(&record)));

    let (status, form, flash) = match appended {
        Ok(rows) => {
            info!(session = %id, rows, "Row added");
            (
                StatusCode::OK,
                RecordForm::default(),
                Flash::Success("Row added to workbook in memory ✅".to_string()),
            )
        }
        Err(e) => {
            warn!(session = %id, "Row rejected: {}", e);
            (status_for(&e), form, Flash::Error(e.to_string()))
        }
    };

    match page_for(&state, id, form, Some(flash)) {
        Ok(html) => with_cookie(session_cookie(id), (status, Html(html))),
        Err(e) => html_error(&e),
    }
}

//==============================================================================
// Upload / download
//==============================================================================

/// Result of a successful upload
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct UploadResponse {
    pub session_id: String,
    pub total_rows: usize,
}

/// POST /upload - Start a new session from an uploaded .xlsx body
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if body.is_empty() {
        return json_error(&IntakeError::Validation("No file uploaded".to_string()));
    }

    let created = state.sessions.create(Some(&body[..])).and_then(|id| {
        let preview = state.sessions.with_session(id, |s| s.preview_tail(0))?;
        Ok((id, preview.total_rows))
    });

    match created {
        Ok((id, total_rows)) => {
            if let Some(previous) = session_from_headers(&headers) {
                state.sessions.remove(previous);
            }
            info!(session = %id, bytes = body.len(), total_rows, "Workbook uploaded");
            with_cookie(
                session_cookie(id),
                Json(ApiResponse::ok(UploadResponse {
                    session_id: id.to_string(),
                    total_rows,
                })),
            )
        }
        Err(e) => json_error(&e),
    }
}

/// GET /download - Current workbook as an .xlsx attachment
pub async fn download(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let result = state
        .sessions
        .get_or_create(session_from_headers(&headers))
        .and_then(|id| {
            let file = state
                .sessions
                .with_session(id, |s| Ok((s.bytes().to_vec(), s.filename().to_string())))?;
            Ok((id, file))
        });

    match result {
        Ok((id, (bytes, filename))) => with_cookie(
            session_cookie(id),
            (
                [
                    (header::CONTENT_TYPE, XLSX_MIME.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", filename),
                    ),
                ],
                bytes,
            ),
        ),
        Err(e) => json_error(&e),
    }
}

//==============================================================================
// Health / version
//==============================================================================

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_sessions: usize,
}

/// GET /health - Health check
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        active_sessions: state.sessions.len(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec![
            "form".to_string(),
            "upload".to_string(),
            "download".to_string(),
            "preview".to_string(),
        ],
    }))
}

//==============================================================================
// JSON API
//==============================================================================

/// Result of appending a row
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct AppendResponse {
    pub session_id: String,
    pub total_rows: usize,
}

/// POST /api/v1/rows - Append a typed record
pub async fn api_add_row(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(record): Json<Record>,
) -> Response {
    let result = state
        .sessions
        .get_or_create(session_from_headers(&headers))
        .and_then(|id| {
            check_record(&record)?;
            let total_rows = state.sessions.with_session(id, |s| s.append_row(&record))?;
            Ok((id, total_rows))
        });

    match result {
        Ok((id, total_rows)) => {
            info!(session = %id, rows = total_rows, "Row added");
            with_cookie(
                session_cookie(id),
                Json(ApiResponse::ok(AppendResponse {
                    session_id: id.to_string(),
                    total_rows,
                })),
            )
        }
        Err(e) => json_error(&e),
    }
}

/// Preview query parameters
#[derive(Deserialize, Debug, Default)]
pub struct PreviewQuery {
    pub rows: Option<usize>,
}

/// GET /api/v1/preview - Trailing rows of the data sheet
pub async fn api_preview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PreviewQuery>,
) -> Response {
    let rows = query.rows.unwrap_or(state.preview_rows);
    let result: IntakeResult<(SessionId, Preview)> = state
        .sessions
        .get_or_create(session_from_headers(&headers))
        .and_then(|id| Ok((id, state.sessions.with_session(id, |s| s.preview_tail(rows))?)));

    match result {
        Ok((id, preview)) => with_cookie(session_cookie(id), Json(ApiResponse::ok(preview))),
        Err(e) => json_error(&e),
    }
}

/// DELETE /api/v1/session - End the current session
pub async fn end_session(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(id) = session_from_headers(&headers) else {
        return json_error(&IntakeError::SessionNotFound("no session cookie".to_string()));
    };

    if state.sessions.remove(id) {
        with_cookie(expired_session_cookie(), Json(ApiResponse::ok(id.to_string())))
    } else {
        json_error(&IntakeError::SessionNotFound(id.to_string()))
    }
}
