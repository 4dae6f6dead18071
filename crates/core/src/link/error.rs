//! Link error types.

use thiserror::Error;

use crate::crypto::CryptoError;

/// Reasons an issuance request is rejected.
///
/// The string-returning adapters collapse all of these to an empty string
/// so template-style callers never see an error surface.
#[derive(Debug, Error)]
pub enum IssueError {
    /// Target was blank after trimming.
    #[error("target is blank")]
    BlankTarget,

    /// Storage path contains a `..` segment. The check is a substring
    /// check, not segment-aware, so `a..b` is also rejected; intentionally
    /// conservative.
    #[error("path contains a traversal sequence")]
    PathTraversal,

    /// Absolute URL target points at a host other than this application.
    #[error("target host is not this application")]
    UntrustedHost,

    /// Absolute URL target has no parsable host.
    #[error("target host cannot be parsed")]
    UnparsableTarget,

    /// No application host is configured to check URL targets against.
    #[error("no application host is configured")]
    AppHostNotConfigured,

    /// Payload encryption failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Payload serialization failed.
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Errors from payload serialization and parsing.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// JSON encoding or decoding failed.
    #[error("payload JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The `mode` discriminator names neither `storage` nor `url`.
    #[error("unknown payload mode '{0}'")]
    UnknownMode(String),
}

/// Redemption-side validation failures. Deliberately coarse: everything is
/// either "absent" (404) or "denied" (403), so responses leak nothing about
/// token internals.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RedeemError {
    /// Surface as HTTP 404.
    #[error("resource not found")]
    NotFound,

    /// Surface as HTTP 403.
    #[error("access denied")]
    Forbidden,
}
