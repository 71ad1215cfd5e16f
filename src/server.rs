//! HTTP service for the profiling and cleaning pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/upload` | Upload a file (multipart field `file`) and profile it |
//! | `POST` | `/api/csvmetadata` | Alias of `/api/upload` |
//! | `GET` | `/api/analyze/{file_name}` | Re-profile a stored file |
//! | `POST` | `/api/remove/duplicates/{file_name}` | Drop repeated rows |
//! | `POST` | `/api/remove/missing/{file_name}` | Drop rows with missing cells |
//! | `POST` | `/api/normalize/{file_name}/{column}` | Normalize one column |
//! | `POST` | `/api/download` | Download a lineage point as CSV |
//! | `GET`/`DELETE` | `/api/session` | Read or end the session pointer |
//! | `GET` | `/health` | Health check |
//!
//! Uploads and cleaning calls need an `x-session-id` header; cleaning is only
//! accepted against the session's current file.
//!
//! # Error Responses
//!
//! ```json
//! { "error": { "code": "stale_version", "message": "..." } }
//! ```
//!
//! | Code | Status |
//! |------|--------|
//! | `format_error` | 400 |
//! | `not_found`, `column_not_found` | 404 |
//! | `stale_version` | 409 |
//! | `validation_error` | 422 |
//! | `internal` | 500 |

use crate::analyser::lifecycle::{CleaningOutcome, DownloadVariant, Workspace};
use crate::analyser::logic::{MetadataView, TableProfile};
use crate::config::ServiceSettings;
use crate::error::StewardError;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Clone)]
struct AppState {
    workspace: Workspace,
}

/// Build the router over `workspace`. Request bodies above
/// `max_upload_bytes` are rejected.
pub fn router(workspace: Workspace, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/upload", post(handle_upload))
        .route("/api/csvmetadata", post(handle_upload))
        .route("/api/analyze/{file_name}", get(handle_analyze))
        .route(
            "/api/remove/duplicates/{file_name}",
            post(handle_remove_duplicates),
        )
        .route("/api/remove/missing/{file_name}", post(handle_remove_missing))
        .route("/api/normalize/{file_name}/{column}", post(handle_normalize))
        .route("/api/download", post(handle_download))
        .route(
            "/api/session",
            get(handle_get_session).delete(handle_end_session),
        )
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { workspace })
}

/// Open the version store from `settings` and serve until the process exits.
pub async fn run_server(settings: &ServiceSettings) -> anyhow::Result<()> {
    let workspace = Workspace::open(settings.storage_dir.clone())?
        .with_profile_options(settings.profile.clone())
        .with_null_tokens(settings.null_tokens.clone());

    let app = router(workspace, settings.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&settings.bind).await?;
    tracing::info!(
        "csvsteward listening on http://{} (storage: {})",
        settings.bind,
        settings.storage_dir.display()
    );
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g. `"not_found"`)
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<StewardError> for AppError {
    fn from(err: StewardError) -> Self {
        let status = match &err {
            StewardError::Format(_) => StatusCode::BAD_REQUEST,
            StewardError::NotFound(_) | StewardError::ColumnNotFound(_) => StatusCode::NOT_FOUND,
            StewardError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StewardError::StaleVersion { .. } => StatusCode::CONFLICT,
            StewardError::Io(_) | StewardError::DataProcessing(_) | StewardError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if err.is_client_error() {
            tracing::warn!("Request rejected: {}", err);
        } else {
            tracing::error!("Request failed: {}", err);
        }

        Self {
            status,
            code: err.kind().to_owned(),
            message: err.to_string(),
        }
    }
}

fn validation_error(message: impl Into<String>) -> AppError {
    AppError::from(StewardError::Validation(message.into()))
}

fn session_key(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| validation_error(format!("missing {SESSION_HEADER} header")))
}

/// Run workspace calls off the async executor; they do file IO and
/// dataframe work.
async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::from(StewardError::Internal(format!("worker task failed: {e}"))))?
        .map_err(AppError::from)
}

// ============ Profile responses ============

#[derive(Serialize)]
struct OutcomeResponse {
    file_name: String,
    /// Set for cleaning calls: the version they produced
    #[serde(skip_serializing_if = "Option::is_none")]
    cleaned_file: Option<String>,
    derived_from: Option<String>,
    profile: TableProfile,
    /// Flat per-column maps for table-oriented clients
    metadata: MetadataView,
}

impl OutcomeResponse {
    fn profiled(outcome: CleaningOutcome) -> Self {
        let metadata = outcome.metadata();
        Self {
            file_name: outcome.file_name,
            cleaned_file: None,
            derived_from: outcome.derived_from,
            profile: outcome.profile,
            metadata,
        }
    }

    fn cleaned(outcome: CleaningOutcome) -> Self {
        let cleaned_file = Some(outcome.file_name.clone());
        Self {
            cleaned_file,
            ..Self::profiled(outcome)
        }
    }
}

// ============ POST /api/upload ============

async fn handle_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<OutcomeResponse>, AppError> {
    let session = session_key(&headers)?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("upload.csv").to_owned();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((original_name, bytes));
        break;
    }

    let (original_name, bytes) =
        upload.ok_or_else(|| validation_error("multipart field 'file' is required"))?;

    let workspace = state.workspace.clone();
    let outcome =
        run_blocking(move || workspace.upload(&session, &original_name, &bytes)).await?;
    Ok(Json(OutcomeResponse::profiled(outcome)))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    let status = err.status();
    tracing::warn!("Multipart upload rejected: {}", err.body_text());
    AppError {
        status,
        code: if status == StatusCode::PAYLOAD_TOO_LARGE {
            "payload_too_large".to_owned()
        } else {
            "format_error".to_owned()
        },
        message: err.body_text(),
    }
}

// ============ GET /api/analyze/{file_name} ============

async fn handle_analyze(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Json<OutcomeResponse>, AppError> {
    let workspace = state.workspace.clone();
    let outcome = run_blocking(move || workspace.analyze(&file_name)).await?;
    Ok(Json(OutcomeResponse::profiled(outcome)))
}

// ============ Cleaning ============

async fn handle_remove_duplicates(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(file_name): Path<String>,
) -> Result<Json<OutcomeResponse>, AppError> {
    let session = session_key(&headers)?;
    let workspace = state.workspace.clone();
    let outcome =
        run_blocking(move || workspace.remove_duplicates(&session, &file_name)).await?;
    Ok(Json(OutcomeResponse::cleaned(outcome)))
}

async fn handle_remove_missing(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(file_name): Path<String>,
) -> Result<Json<OutcomeResponse>, AppError> {
    let session = session_key(&headers)?;
    let workspace = state.workspace.clone();
    let outcome =
        run_blocking(move || workspace.remove_missing_values(&session, &file_name)).await?;
    Ok(Json(OutcomeResponse::cleaned(outcome)))
}

async fn handle_normalize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((file_name, column)): Path<(String, String)>,
) -> Result<Json<OutcomeResponse>, AppError> {
    let session = session_key(&headers)?;
    let workspace = state.workspace.clone();
    let outcome =
        run_blocking(move || workspace.normalize(&session, &file_name, &column)).await?;
    Ok(Json(OutcomeResponse::cleaned(outcome)))
}

// ============ POST /api/download ============

#[derive(Deserialize)]
struct DownloadRequest {
    file_name: String,
    /// `original`, `duplicates`, `missingvalues` or `normalized`; defaults to `original`
    variant: Option<String>,
}

async fn handle_download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<Response, AppError> {
    let variant = match request.variant.as_deref() {
        Some(v) => v.parse::<DownloadVariant>()?,
        None => DownloadVariant::Original,
    };

    let workspace = state.workspace.clone();
    let file_name = request.file_name;
    let file = run_blocking(move || workspace.download(&file_name, variant)).await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.file_name),
        ),
    ];
    Ok((headers, file.bytes).into_response())
}

// ============ /api/session ============

#[derive(Serialize)]
struct SessionResponse {
    session: String,
    file_name: Option<String>,
}

async fn handle_get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, AppError> {
    let session = session_key(&headers)?;
    let file_name = state.workspace.current(&session).map_err(AppError::from)?;
    Ok(Json(SessionResponse {
        session,
        file_name: Some(file_name),
    }))
}

async fn handle_end_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, AppError> {
    let session = session_key(&headers)?;
    let file_name = state
        .workspace
        .end_session(&session)
        .map_err(AppError::from)?;
    Ok(Json(SessionResponse { session, file_name }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
    })
}
