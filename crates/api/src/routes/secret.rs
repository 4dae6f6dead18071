//! Link redemption route.
//!
//! Linear early-exit pipeline: verify the URL signature and expiry, extract
//! and decrypt the token, re-validate the payload against the current
//! request, then stream the file or proxy the internal URL. Signature
//! failures are 403; anything that would reveal whether a token was valid
//! is 404.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use axum_extra::extract::Host;
use chrono::Utc;
use tracing::{debug, error, warn};

use crate::AppState;
use crate::routes::error_response;
use seclink_core::link::{
    REDEEM_PATH, RedeemError, ResolvedUrlTarget, SecretPayload, TOKEN_PARAM, basename,
    escape_filename, validate_storage_target, validate_url_target,
};
use seclink_core::storage::{StorageError, StorageService};
use seclink_shared::AppError;

/// Creates the redemption routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(REDEEM_PATH, get(download))
}

/// GET the redemption endpoint.
async fn download(
    State(state): State<AppState>,
    Host(host): Host,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(err) = state.signer.verify(REDEEM_PATH, &params, Utc::now()) {
        debug!(%err, "signed url rejected");
        return forbidden();
    }

    let Some(token) = params.get(TOKEN_PARAM) else {
        return not_found();
    };

    // Decrypt and parse. Both failure kinds surface as 404 so callers
    // cannot distinguish a bad token from an absent resource.
    let plaintext = match state.cipher.decrypt(token) {
        Ok(plaintext) => plaintext,
        Err(err) => {
            debug!(%err, "token decryption rejected");
            return not_found();
        }
    };
    let payload = match SecretPayload::from_json(&plaintext) {
        Ok(payload) => payload,
        Err(err) => {
            debug!(%err, "token payload rejected");
            return not_found();
        }
    };

    match payload {
        SecretPayload::Url { url } => serve_url(&state, &url, &host).await,
        SecretPayload::Storage {
            path,
            disk,
            delete_after_download,
        } => serve_storage(&state, &path, disk.as_deref(), delete_after_download).await,
    }
}

/// One message per status, shared by every failure path, so the response
/// never reveals which check a token failed.
fn forbidden() -> Response {
    error_response(&AppError::Forbidden("link is invalid or expired".to_string()))
}

fn not_found() -> Response {
    error_response(&AppError::NotFound("resource not found".to_string()))
}

fn redeem_response(err: &RedeemError) -> Response {
    match err {
        RedeemError::NotFound => not_found(),
        RedeemError::Forbidden => forbidden(),
    }
}

/// URL mode: proxy the internal resource rather than redirecting, so the
/// browser never learns the real location.
async fn serve_url(state: &AppState, url: &str, request_host: &str) -> Response {
    let resolved = match validate_url_target(url, request_host) {
        Ok(resolved) => resolved,
        Err(err) => return redeem_response(&err),
    };

    let target = match resolved {
        ResolvedUrlTarget::Absolute(url) => url,
        ResolvedUrlTarget::Relative(path) => {
            format!("{}://{request_host}{path}", public_scheme(state))
        }
    };

    let upstream = match state.http.get(&target).send().await {
        Ok(upstream) => upstream,
        Err(err) => {
            debug!(%err, "upstream fetch failed");
            return not_found();
        }
    };

    let status = upstream.status();
    if !status.is_success() {
        debug!(status = status.as_u16(), "upstream returned failure");
        return error_response(&AppError::Upstream(status.as_u16()));
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    match Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, "inline")
        .body(Body::from_stream(upstream.bytes_stream()))
    {
        Ok(response) => response,
        Err(err) => {
            error!(%err, "proxy response build failed");
            error_response(&AppError::Internal("response build failed".to_string()))
        }
    }
}

/// Storage mode: stream the file as an attachment, deleting it afterwards
/// when the link asks for that.
async fn serve_storage(
    state: &AppState,
    path: &str,
    disk: Option<&str>,
    delete_after: bool,
) -> Response {
    let path = match validate_storage_target(path) {
        Ok(path) => path,
        Err(err) => return redeem_response(&err),
    };

    let info = match state.storage.stat(disk, &path).await {
        Ok(Some(info)) => info,
        Ok(None) => return not_found(),
        Err(StorageError::UnknownDisk { disk }) => {
            warn!(disk, "link names an unconfigured disk");
            return not_found();
        }
        Err(err) => {
            error!(%err, "storage stat failed");
            return error_response(&AppError::Internal("storage unavailable".to_string()));
        }
    };

    let stream = match state
        .storage
        .read_stream(disk, &path, info.size, delete_after)
        .await
    {
        Ok(stream) => stream,
        Err(err) => {
            error!(%err, "storage read failed");
            return error_response(&AppError::Internal("storage unavailable".to_string()));
        }
    };

    let mime = StorageService::mime_type(&path, &info);
    let filename = escape_filename(basename(&path));

    match Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime)
        .header(header::CONTENT_LENGTH, info.size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(stream))
    {
        Ok(response) => response,
        Err(err) => {
            error!(%err, "download response build failed");
            error_response(&AppError::Internal("response build failed".to_string()))
        }
    }
}

/// Scheme used to resolve relative URL-mode targets, taken from the
/// configured public URL.
fn public_scheme(state: &AppState) -> &str {
    state
        .config
        .app
        .public_url
        .split_once("://")
        .map_or("http", |(scheme, _)| scheme)
}
