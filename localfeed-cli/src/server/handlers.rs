//! Request handlers.
//!
//! Each handler runs its engine call on the blocking pool, then maps the
//! resulting envelope onto HTTP:
//!
//! | Envelope status | HTTP | Body |
//! |---|---|---|
//! | `Ok` | 200 | JSON (the full envelope for push, the data otherwise) |
//! | `NotFound` | 404 | message text |
//! | `Conflict` | 409 | message text |
//! | `BadRequest` | 400 | message text, or a generic message |

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use localfeed::engine::{
    FeedResult, PackageService, Response as Envelope, StatusCode as FeedStatus,
};

use super::session::SessionPackages;

/// Body of failures that carry no message of their own.
pub const DEFAULT_ERROR_MESSAGE: &str =
    "An error has occured during request. Please try again later.";

/// Multipart field holding the uploaded archive.
pub const UPLOAD_FIELD: &str = "package";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn PackageService>,
    pub session: Arc<SessionPackages>,
}

impl AppState {
    /// State over `service` with an empty session list.
    pub fn new(service: Arc<dyn PackageService>) -> Self {
        Self {
            service,
            session: Arc::new(SessionPackages::new()),
        }
    }
}

/// Query string of `GET /packages`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// `PUT /api/package`
pub async fn push(State(state): State<AppState>, multipart: Multipart) -> Response {
    match read_upload(multipart).await {
        Ok((filename, bytes)) => push_upload(&state, filename, bytes).await,
        Err(message) => (StatusCode::BAD_REQUEST, message).into_response(),
    }
}

/// Push an already-received upload.
pub async fn push_upload(state: &AppState, filename: String, bytes: Vec<u8>) -> Response {
    let service = Arc::clone(&state.service);
    let envelope = call(move || service.push(&filename, &bytes)).await;

    if let Some(stored) = &envelope.data {
        state.session.set(stored.identity.clone());
    }
    if envelope.is_success() {
        Json(envelope).into_response()
    } else {
        failure(envelope)
    }
}

/// `GET /packages?q=`
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let service = Arc::clone(&state.service);
    let envelope = call(move || service.search(params.q.as_deref())).await;
    data_or_failure(envelope)
}

/// `GET /package/:id`
pub async fn package_versions(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let service = Arc::clone(&state.service);
    let envelope = call(move || service.package_versions(&id)).await;

    if let Some(versions) = &envelope.data {
        state
            .session
            .set_many(versions.iter().map(|stored| stored.identity.clone()));
    }
    data_or_failure(envelope)
}

/// `GET /package/:id/:version/content`
pub async fn package_content(
    State(state): State<AppState>,
    Path((id, version)): Path<(String, String)>,
) -> Response {
    let filename = format!("{}.{}.nupkg", id, version)
        .to_lowercase()
        .replace(['"', '\\'], "_");
    let service = Arc::clone(&state.service);
    let envelope = call(move || service.package_archive(&id, &version)).await;

    match envelope {
        Envelope {
            data: Some(bytes), ..
        } => (
            [
                (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ],
            bytes,
        )
            .into_response(),
        other => failure(other),
    }
}

/// `GET /session/packages`
pub async fn session_packages(State(state): State<AppState>) -> Response {
    Json(state.session.get()).into_response()
}

/// Run an engine call on the blocking pool.
async fn call<T, F>(operation: F) -> Envelope<T>
where
    F: FnOnce() -> FeedResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(operation).await {
        Ok(result) => Envelope::from(result),
        Err(e) => {
            error!(error = %e, "Engine task failed");
            Envelope::failure(FeedStatus::BadRequest, DEFAULT_ERROR_MESSAGE)
        }
    }
}

fn data_or_failure<T: Serialize>(envelope: Envelope<T>) -> Response {
    match envelope {
        Envelope {
            data: Some(data), ..
        } => Json(data).into_response(),
        other => failure(other),
    }
}

fn failure<T>(envelope: Envelope<T>) -> Response {
    let status = match envelope.status_code {
        FeedStatus::NotFound => StatusCode::NOT_FOUND,
        FeedStatus::Conflict => StatusCode::CONFLICT,
        FeedStatus::Ok | FeedStatus::BadRequest => StatusCode::BAD_REQUEST,
    };
    let message = envelope
        .message
        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
    (status, message).into_response()
}

async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), String> {
    while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("package.nupkg").to_string();
        let bytes = field.bytes().await.map_err(|e| e.body_text())?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(format!("No '{}' file in upload", UPLOAD_FIELD))
}
