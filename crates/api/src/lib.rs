//! HTTP API layer with Axum routes for Seclink.
//!
//! This crate provides:
//! - The redemption route serving/proxying what a secret link grants
//! - The issuance route for service consumers
//! - Application state wiring

pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use seclink_core::crypto::{KeyMaterial, TokenCipher, UrlSigner};
use seclink_core::link::LinkIssuer;
use seclink_core::storage::StorageService;
use seclink_shared::{AppConfig, AppError};

/// Upstream request timeout for proxied URL-mode fetches.
pub const PROXY_TIMEOUT_SECS: u64 = 30;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Link issuer for the issuance endpoint.
    pub issuer: Arc<LinkIssuer>,
    /// Token cipher for redemption-time decryption.
    pub cipher: Arc<TokenCipher>,
    /// URL signer for redemption-time verification.
    pub signer: Arc<UrlSigner>,
    /// Storage disk registry.
    pub storage: Arc<StorageService>,
    /// HTTP client for proxying internal URLs.
    pub http: reqwest::Client,
}

/// Builds the application state from loaded configuration.
///
/// # Errors
///
/// Returns an error if key material is invalid, a storage disk cannot be
/// initialized, or the HTTP client cannot be built.
pub fn build_state(config: AppConfig) -> Result<AppState, AppError> {
    let keys = KeyMaterial::from_master_key(&config.crypto.master_key)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let issuer = LinkIssuer::new(&keys, config.links.clone(), config.app.public_url.clone());
    let storage =
        StorageService::from_settings(&config.storage).map_err(|e| AppError::Internal(e.to_string()))?;

    // Targets are same-host by construction, so self-signed certs on
    // internal endpoints are accepted.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(PROXY_TIMEOUT_SECS))
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AppState {
        cipher: Arc::new(TokenCipher::new(keys.token_key())),
        signer: Arc::new(UrlSigner::new(keys.signing_key())),
        issuer: Arc::new(issuer),
        storage: Arc::new(storage),
        config: Arc::new(config),
        http,
    })
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
