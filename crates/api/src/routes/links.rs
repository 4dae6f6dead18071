//! Link issuance route.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::AppState;
use crate::routes::error_response;
use seclink_core::link::IssueOptions;
use seclink_shared::AppError;

/// Creates the link issuance routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/links", post(issue_link))
}

/// Request body for issuing a secret link.
#[derive(Debug, Deserialize)]
pub struct IssueLinkRequest {
    /// Storage path or internal URL/path to grant access to.
    pub target: String,
    /// Expiry override in minutes.
    #[serde(default)]
    pub minutes: Option<i64>,
    /// Delete-after-download override (storage mode only).
    #[serde(default)]
    pub delete: Option<bool>,
    /// Storage disk override (storage mode only).
    #[serde(default)]
    pub disk: Option<String>,
}

/// Response for an issued link.
#[derive(Debug, Serialize)]
pub struct IssueLinkResponse {
    /// The signed URL.
    pub url: String,
    /// Expiry timestamp (ISO 8601).
    pub expires_at: String,
    /// Link mode: `storage` or `url`.
    pub mode: &'static str,
}

/// POST `/api/v1/links`
/// Issue a secret link for a storage path or internal URL.
///
/// Unlike the string-returning issuer aliases, this endpoint reports
/// rejections as 422 with a reason, since HTTP callers can handle errors.
async fn issue_link(
    State(state): State<AppState>,
    Json(payload): Json<IssueLinkRequest>,
) -> impl IntoResponse {
    let opts = IssueOptions {
        minutes: payload.minutes,
        delete: payload.delete,
        disk: payload.disk,
    };

    match state.issuer.issue(&payload.target, &opts) {
        Ok(link) => {
            info!(mode = link.mode.as_str(), "secret link issued");
            (
                StatusCode::OK,
                Json(IssueLinkResponse {
                    url: link.url,
                    expires_at: link.expires_at.to_rfc3339(),
                    mode: link.mode.as_str(),
                }),
            )
                .into_response()
        }
        Err(err) => {
            debug!(%err, "link issuance rejected");
            error_response(&AppError::Validation(err.to_string()))
        }
    }
}
