//! End-to-end redemption tests.
//!
//! These drive the full router with in-memory requests: real signed URLs,
//! real encrypted tokens, and a tempdir-backed filesystem disk.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration as StdDuration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use seclink_api::{AppState, build_state, create_router};
use seclink_core::link::{IssueOptions, REDEEM_PATH, TOKEN_PARAM};
use seclink_shared::config::{
    AppConfig, AppSettings, CryptoConfig, DiskProvider, LinkConfig, ServerConfig, StorageSettings,
};

const MASTER_KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";
const APP_HOST: &str = "app.test";

fn test_config(root: &Path) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        app: AppSettings {
            public_url: format!("http://{APP_HOST}"),
        },
        links: LinkConfig::default(),
        crypto: CryptoConfig {
            master_key: MASTER_KEY.to_string(),
        },
        storage: StorageSettings {
            default_disk: "local".to_string(),
            disks: HashMap::from([("local".to_string(), DiskProvider::fs(root))]),
        },
    }
}

fn test_state(root: &Path) -> AppState {
    build_state(test_config(root)).expect("state builds")
}

/// Strips scheme and host so a signed URL can be replayed as a request URI.
fn signed_uri(url: &str) -> &str {
    let idx = url.find(REDEEM_PATH).expect("redeem path in url");
    &url[idx..]
}

async fn send(router: Router, uri: &str, host: &str) -> Response {
    router
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::HOST, host)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
    response
        .headers()
        .get(name)
        .expect("header present")
        .to_str()
        .unwrap()
}

/// Signs a URL around an arbitrary token, for crafting payloads the issuer
/// itself would refuse to produce.
fn sign_token(state: &AppState, token: &str, expires_in: Duration) -> String {
    state.signer.sign(
        &state.config.app.public_url,
        REDEEM_PATH,
        Utc::now() + expires_in,
        &[(TOKEN_PARAM, token)],
    )
}

fn craft_link(state: &AppState, payload_json: &str) -> String {
    let token = state.cipher.encrypt(payload_json.as_bytes()).unwrap();
    sign_token(state, &token, Duration::minutes(5))
}

#[tokio::test]
async fn test_storage_link_streams_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("media")).unwrap();
    std::fs::write(dir.path().join("media/report.pdf"), b"pdf bytes here").unwrap();

    let state = test_state(dir.path());
    let link = state
        .issuer
        .issue("media/report.pdf", &IssueOptions::default())
        .unwrap();

    let response = send(create_router(state), signed_uri(&link.url), APP_HOST).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        "application/pdf"
    );
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        "attachment; filename=\"report.pdf\""
    );
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), "14");
    assert_eq!(body_bytes(response).await, b"pdf bytes here");
}

#[tokio::test]
async fn test_unsigned_request_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());

    let uri = format!("{REDEEM_PATH}?t=whatever");
    let response = send(create_router(state), &uri, APP_HOST).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_tampered_signature_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"x").unwrap();

    let state = test_state(dir.path());
    let link = state.issuer.issue("a.txt", &IssueOptions::default()).unwrap();

    // Flip the last hex digit of the signature.
    let url = &link.url;
    let flipped = if url.ends_with('0') { "1" } else { "0" };
    let uri = format!("{}{flipped}", &signed_uri(url)[..signed_uri(url).len() - 1]);

    let response = send(create_router(state), &uri, APP_HOST).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_expired_link_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"x").unwrap();

    let state = test_state(dir.path());
    let token = state
        .cipher
        .encrypt(br#"{"mode":"storage","p":"a.txt","del":0}"#)
        .unwrap();
    let url = sign_token(&state, &token, Duration::minutes(-5));

    // The signature itself is valid; only the expiry is in the past.
    let response = send(create_router(state), signed_uri(&url), APP_HOST).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_token_param_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());

    let url = state.signer.sign(
        &state.config.app.public_url,
        REDEEM_PATH,
        Utc::now() + Duration::minutes(5),
        &[],
    );
    let response = send(create_router(state), signed_uri(&url), APP_HOST).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_undecryptable_token_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());

    // Validly signed URL around a token encrypted under no key of ours.
    let url = sign_token(&state, "bm90LWEtcmVhbC10b2tlbg", Duration::minutes(5));
    let response = send(create_router(state), signed_uri(&url), APP_HOST).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_mode_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());

    let url = craft_link(&state, r#"{"mode":"ftp","u":"/x"}"#);
    let response = send(create_router(state), signed_uri(&url), APP_HOST).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_crafted_traversal_payload_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());

    // The issuer refuses traversal, so this token is hand-built. The
    // redeemer must catch it anyway.
    let url = craft_link(&state, r#"{"mode":"storage","p":"../../etc/passwd"}"#);
    let response = send(create_router(state), signed_uri(&url), APP_HOST).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());
    let link = state
        .issuer
        .issue("no/such/file.bin", &IssueOptions::default())
        .unwrap();

    let response = send(create_router(state), signed_uri(&link.url), APP_HOST).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_disk_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"x").unwrap();

    let state = test_state(dir.path());
    let opts = IssueOptions {
        disk: Some("nonexistent".to_string()),
        ..IssueOptions::default()
    };
    let link = state.issuer.issue("a.txt", &opts).unwrap();

    let response = send(create_router(state), signed_uri(&link.url), APP_HOST).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

async fn wait_for_removal(path: &Path) -> bool {
    for _ in 0..50 {
        if !path.exists() {
            return true;
        }
        tokio::time::sleep(StdDuration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_delete_after_download_removes_file_once_streamed() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("once.bin");
    std::fs::write(&file, b"single use").unwrap();

    let state = test_state(dir.path());
    let opts = IssueOptions {
        delete: Some(true),
        ..IssueOptions::default()
    };
    let link = state.issuer.issue("once.bin", &opts).unwrap();
    let uri = signed_uri(&link.url).to_string();

    let response = send(create_router(state.clone()), &uri, APP_HOST).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"single use");

    assert!(wait_for_removal(&file).await, "file should be deleted");

    // The same link is still signed and unexpired, but the file is gone.
    let response = send(create_router(state), &uri, APP_HOST).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_abandoned_download_keeps_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("kept.bin");
    std::fs::write(&file, b"not fully read").unwrap();

    let state = test_state(dir.path());
    let opts = IssueOptions {
        delete: Some(true),
        ..IssueOptions::default()
    };
    let link = state.issuer.issue("kept.bin", &opts).unwrap();

    let response = send(create_router(state), signed_uri(&link.url), APP_HOST).await;
    assert_eq!(response.status(), StatusCode::OK);
    drop(response);

    tokio::time::sleep(StdDuration::from_millis(200)).await;
    assert!(file.exists(), "interrupted download must not delete");
}

#[tokio::test]
async fn test_file_survives_download_without_delete_flag() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("durable.bin");
    std::fs::write(&file, b"many uses").unwrap();

    let state = test_state(dir.path());
    let link = state.issuer.issue("durable.bin", &IssueOptions::default()).unwrap();
    let uri = signed_uri(&link.url).to_string();

    for _ in 0..2 {
        let response = send(create_router(state.clone()), &uri, APP_HOST).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"many uses");
    }
    assert!(file.exists());
}

async fn spawn_upstream() -> String {
    let app = Router::new()
        .route("/hello", get(|| async { "hello from upstream" }))
        .route("/teapot", get(|| async { StatusCode::IM_A_TEAPOT }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

#[tokio::test]
async fn test_url_link_proxies_relative_target() {
    let dir = tempfile::tempdir().unwrap();
    let upstream_host = spawn_upstream().await;

    let state = test_state(dir.path());
    let link = state.issuer.issue("/hello", &IssueOptions::default()).unwrap();

    // Relative targets resolve against the Host the request arrived on.
    let response = send(create_router(state), signed_uri(&link.url), &upstream_host).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        "inline"
    );
    assert_eq!(body_bytes(response).await, b"hello from upstream");
}

#[tokio::test]
async fn test_url_link_propagates_upstream_status() {
    let dir = tempfile::tempdir().unwrap();
    let upstream_host = spawn_upstream().await;

    let state = test_state(dir.path());
    let link = state.issuer.issue("/teapot", &IssueOptions::default()).unwrap();

    let response = send(create_router(state), signed_uri(&link.url), &upstream_host).await;
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
}

#[tokio::test]
async fn test_url_link_unreachable_upstream_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());
    let link = state.issuer.issue("/anything", &IssueOptions::default()).unwrap();

    // No upstream is listening on this port.
    let response = send(
        create_router(state),
        signed_uri(&link.url),
        "127.0.0.1:1",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_url_link_host_mismatch_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());

    // Token legitimately issued for our host, redeemed behind another one.
    let link = state
        .issuer
        .issue("http://app.test/media/x.jpg", &IssueOptions::default())
        .unwrap();
    let response = send(create_router(state), signed_uri(&link.url), "other.test").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_failure_responses_carry_error_codes() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());

    // Unsigned request: 403 with the FORBIDDEN error code.
    let uri = format!("{REDEEM_PATH}?t=whatever");
    let response = send(create_router(state.clone()), &uri, APP_HOST).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "FORBIDDEN");

    // Missing file: 404 with the NOT_FOUND error code.
    let link = state
        .issuer
        .issue("no/such/file.bin", &IssueOptions::default())
        .unwrap();
    let response = send(create_router(state), signed_uri(&link.url), APP_HOST).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_url_link_blank_target_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());

    let url = craft_link(&state, r#"{"mode":"url","u":""}"#);
    let response = send(create_router(state), signed_uri(&url), APP_HOST).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
