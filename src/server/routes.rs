//! # HTTP API
//!
//! Exposes one [`UploadSession`] to a browser front-end. The front-end only
//! renders; every state transition of the upload modal goes through here.
//!
//! | Method | Path | Effect |
//! | --- | --- | --- |
//! | GET | `/api/health` | liveness + wallet/client status |
//! | POST | `/api/wallet/connect` | connect the configured wallet and build the client |
//! | POST | `/api/wallet/disconnect` | disconnect it and release the client |
//! | POST | `/api/modal/open` | show the modal |
//! | POST | `/api/modal/close` | hide the modal |
//! | POST | `/api/modal/pointer` | pointer press, `{ "inside": bool }` |
//! | PUT | `/api/account` | `{ "account": "<address>" \| null }` |
//! | POST | `/api/file` | multipart, field `file`; first accepted file wins |
//! | POST | `/api/submit` | upload the selection |
//! | GET | `/api/notification` | current notification |
//! | DELETE | `/api/notification` | dismiss it |
//! | GET | `/api/session` | full snapshot |

use axum::{
    extract::{multipart::Multipart, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::common::error::{DriveError, PickError};
use crate::common::notification::Notification;
use crate::drive::provider::DriveProvider;
use crate::drive::wallet::{KeypairWallet, WalletAdapter};
use crate::upload::picker::{Candidate, PickerRules};
use crate::upload::session::{SessionSnapshot, SubmitOutcome, UploadSession};

/// Images up to this size are echoed back as an inline preview.
const PREVIEW_LIMIT: u64 = 1024 * 1024;

/// Room for multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared state behind every handler.
pub struct AppState {
    pub session: UploadSession,
    pub picker: PickerRules,
    pub wallet: Arc<KeypairWallet>,
    /// Kept alive for as long as the server runs
    pub provider: Arc<DriveProvider>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Pick(#[from] PickError),

    #[error("Failed to read multipart data: {0}")]
    Multipart(String),

    #[error("{0}")]
    Drive(#[from] DriveError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Pick(PickError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Pick(PickError::UnsupportedType(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Pick(PickError::NoFiles) | ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
            ApiError::Pick(PickError::Io(_)) | ApiError::Drive(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.picker.max_size() as usize + MULTIPART_OVERHEAD;

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/wallet/connect", post(connect_wallet))
        .route("/api/wallet/disconnect", post(disconnect_wallet))
        .route("/api/modal/open", post(open_modal))
        .route("/api/modal/close", post(close_modal))
        .route("/api/modal/pointer", post(pointer_down))
        .route("/api/account", put(set_account))
        .route("/api/file", post(pick_file))
        .route("/api/submit", post(submit))
        .route(
            "/api/notification",
            get(get_notification).delete(dismiss_notification),
        )
        .route("/api/session", get(get_session))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "shdw-upload",
        "wallet_connected": state.wallet.state().is_connected(),
        "client_ready": state.provider.state().is_ready(),
    }))
}

/// Connecting builds the client before replying, so a submit sent right after
/// the reply already sees it.
async fn connect_wallet(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    state.wallet.connect();
    wallet_reply(&state)
}

async fn disconnect_wallet(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    state.wallet.disconnect();
    wallet_reply(&state)
}

fn wallet_reply(state: &AppState) -> Result<Json<Value>, ApiError> {
    let client = state.provider.refresh()?;
    Ok(Json(json!({
        "connected": state.wallet.state().is_connected(),
        "client_ready": client.is_ready(),
    })))
}

async fn open_modal(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    state.session.open_modal();
    Json(state.session.snapshot())
}

async fn close_modal(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    state.session.close_modal();
    Json(state.session.snapshot())
}

#[derive(Deserialize)]
struct PointerEvent {
    inside: bool,
}

async fn pointer_down(
    State(state): State<Arc<AppState>>,
    Json(event): Json<PointerEvent>,
) -> impl IntoResponse {
    let closed = state.session.pointer_down(event.inside);
    Json(json!({ "closed": closed, "modal_open": state.session.is_modal_open() }))
}

#[derive(Deserialize)]
struct AccountSelection {
    account: Option<String>,
}

async fn set_account(
    State(state): State<Arc<AppState>>,
    Json(selection): Json<AccountSelection>,
) -> Json<SessionSnapshot> {
    state.session.set_account(selection.account);
    Json(state.session.snapshot())
}

async fn pick_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let mut candidates = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Multipart(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or("upload").to_string();
        let declared_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Multipart(e.to_string()))?;

        candidates.push(Candidate {
            name,
            declared_type,
            contents: data.to_vec(),
        });
    }

    let file = state.picker.pick_first(candidates)?;
    info!("📥 Received {} ({} bytes)", file.name(), file.size());
    state.session.pick_file(file);

    Ok(Json(state.session.snapshot()))
}

async fn submit(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let outcome = state.session.submit().await.map_err(|e| {
        error!("❌ Upload session used without its provider: {}", e);
        ApiError::from(e)
    })?;
    let notification = state.session.notification();

    let (status, body) = match outcome {
        SubmitOutcome::Uploaded(receipt) => (
            StatusCode::OK,
            json!({ "outcome": "uploaded", "location": receipt.location, "notification": notification }),
        ),
        SubmitOutcome::Rejected(reason) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "outcome": "rejected", "reason": reason.to_string(), "notification": notification }),
        ),
        SubmitOutcome::Failed => (
            StatusCode::BAD_GATEWAY,
            json!({ "outcome": "failed", "notification": notification }),
        ),
        SubmitOutcome::Busy => (
            StatusCode::CONFLICT,
            json!({ "outcome": "busy", "notification": notification }),
        ),
    };

    Ok((status, Json(body)).into_response())
}

async fn get_notification(State(state): State<Arc<AppState>>) -> Json<Notification> {
    Json(state.session.notification())
}

async fn dismiss_notification(State(state): State<Arc<AppState>>) -> Json<Notification> {
    state.session.dismiss_notification();
    Json(state.session.notification())
}

#[derive(Serialize)]
struct SessionView {
    #[serde(flatten)]
    snapshot: SessionSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview: Option<String>,
}

async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    let preview = state
        .session
        .selection()
        .filter(|f| f.mime().starts_with("image/") && f.size() <= PREVIEW_LIMIT)
        .map(|f| {
            format!(
                "data:{};base64,{}",
                f.mime(),
                general_purpose::STANDARD.encode(f.contents())
            )
        });

    Json(SessionView {
        snapshot: state.session.snapshot(),
        preview,
    })
}
