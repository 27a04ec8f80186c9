//! # Relay Stub
//!
//! A local stand-in for the two external collaborators of the report form: the endpoint that
//! lists authorised users and the webhook that receives submissions.
//!
//! Handles:
//! - `GET /users` with a built-in or file-provided user list
//! - `POST /webhook`, answering in one of several [`WebhookMode`]s so the controller's lenient
//!   response handling can be exercised
//! - `GET /submissions` to inspect what was received
//! - OpenAPI/Swagger documentation

#![warn(rust_2018_idioms)]

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use relay_types::{FormPayload, ReferenceEntity};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

#[derive(Debug, thiserror::Error)]
pub enum StubError {
    #[error("failed to read users file {path}: {source}", path = path.display())]
    UsersFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse users file: {0}")]
    UsersFileParse(serde_json::Error),
    #[error("invalid webhook mode: {0}")]
    InvalidMode(String),
    #[error("server i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StubResult<T> = std::result::Result<T, StubError>;

/// How the webhook answers an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebhookMode {
    /// 200 with a JSON acknowledgement.
    #[default]
    Json,
    /// 200 with no body.
    Empty,
    /// 200 with a plain-text body.
    Text,
    /// The given status, submission not recorded.
    Fail(u16),
}

impl std::str::FromStr for WebhookMode {
    type Err = StubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "" | "json" => Ok(WebhookMode::Json),
            "empty" => Ok(WebhookMode::Empty),
            "text" => Ok(WebhookMode::Text),
            other => {
                let status = other
                    .strip_prefix("fail:")
                    .and_then(|code| code.parse::<u16>().ok())
                    .filter(|code| (100..=599).contains(code))
                    .ok_or_else(|| StubError::InvalidMode(other.to_string()))?;
                Ok(WebhookMode::Fail(status))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookAck {
    pub success: bool,
    pub id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecordedSubmission {
    pub id: String,
    pub payload: FormPayload,
}

/// Application state shared across the stub's handlers.
#[derive(Clone, Default)]
pub struct StubState {
    users: Arc<Vec<ReferenceEntity>>,
    mode: WebhookMode,
    submissions: Arc<Mutex<Vec<RecordedSubmission>>>,
}

impl StubState {
    pub fn new(users: Vec<ReferenceEntity>, mode: WebhookMode) -> Self {
        Self {
            users: Arc::new(users),
            mode,
            submissions: Arc::default(),
        }
    }

    fn submissions(&self) -> MutexGuard<'_, Vec<RecordedSubmission>> {
        self.submissions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn recorded(&self) -> Vec<RecordedSubmission> {
        self.submissions().clone()
    }
}

/// The user list served when no file is configured.
pub fn default_users() -> Vec<ReferenceEntity> {
    vec![
        ReferenceEntity::new("Alice", "Eng"),
        ReferenceEntity::new("Bob", "Ops"),
        ReferenceEntity::new("Carol", "Finance"),
    ]
}

/// Read a JSON array of `{name, dep, ...}` records.
pub fn load_users(path: &Path) -> StubResult<Vec<ReferenceEntity>> {
    let contents = std::fs::read_to_string(path).map_err(|source| StubError::UsersFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(StubError::UsersFileParse)
}

#[derive(OpenApi)]
#[openapi(
    paths(health, list_users, receive_submission, list_submissions),
    components(schemas(HealthRes, WebhookAck, RecordedSubmission, FormPayload, ReferenceEntity))
)]
struct ApiDoc;

pub fn router(state: StubState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", get(list_users))
        .route("/webhook", post(receive_submission))
        .route("/submissions", get(list_submissions))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, state: StubState) -> StubResult<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_listener(listener, state).await
}

/// Serve on an already bound listener, so callers can learn the port before requests arrive.
pub async fn serve_listener(listener: tokio::net::TcpListener, state: StubState) -> StubResult<()> {
    tracing::info!("-- Relay stub listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
#[axum::debug_handler]
async fn health(State(_state): State<StubState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Relay stub is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Authorised users", body = [ReferenceEntity])
    )
)]
/// List authorised users
///
/// Serves the reference data the form checks names against.
#[axum::debug_handler]
async fn list_users(State(state): State<StubState>) -> Json<Vec<ReferenceEntity>> {
    Json(state.users.as_ref().clone())
}

#[utoipa::path(
    post,
    path = "/webhook",
    request_body = FormPayload,
    responses(
        (status = 200, description = "Submission accepted", body = WebhookAck),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Configured failure")
    )
)]
/// Receive a report submission
///
/// Records the payload and answers according to the configured [`WebhookMode`].
#[axum::debug_handler]
async fn receive_submission(
    State(state): State<StubState>,
    Json(payload): Json<FormPayload>,
) -> Response {
    if let WebhookMode::Fail(status) = state.mode {
        tracing::warn!(status, "rejecting submission from {}", payload.field1);
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "Stub configured to fail").into_response();
    }

    let id = uuid::Uuid::new_v4().simple().to_string();
    tracing::info!(%id, name = %payload.field1, dep = %payload.dep, "submission received");
    state.submissions().push(RecordedSubmission {
        id: id.clone(),
        payload,
    });

    match state.mode {
        WebhookMode::Json => Json(WebhookAck {
            success: true,
            id,
            message: "Report received".into(),
        })
        .into_response(),
        WebhookMode::Empty => StatusCode::OK.into_response(),
        WebhookMode::Text => (StatusCode::OK, format!("Accepted {id}")).into_response(),
        WebhookMode::Fail(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/submissions",
    responses(
        (status = 200, description = "Submissions received so far", body = [RecordedSubmission])
    )
)]
#[axum::debug_handler]
async fn list_submissions(State(state): State<StubState>) -> Json<Vec<RecordedSubmission>> {
    Json(state.recorded())
}
