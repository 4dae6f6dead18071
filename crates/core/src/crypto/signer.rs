//! Expiring URL signatures.
//!
//! A signed URL binds an expiry timestamp and every query parameter to an
//! HMAC-SHA256 signature, verifiable without server-side storage. The
//! canonical form sorts parameters by key so verification does not depend
//! on parameter order.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Query parameter carrying the signature.
pub const SIGNATURE_PARAM: &str = "signature";
/// Query parameter carrying the expiry unix timestamp.
pub const EXPIRES_PARAM: &str = "expires";

/// Errors from signed-URL verification. All map to HTTP 403.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// No signature parameter on the request.
    #[error("signature parameter missing")]
    Missing,

    /// Signature does not match the URL, or the expiry is unreadable.
    #[error("signature does not match")]
    Invalid,

    /// The link's expiry timestamp is in the past.
    #[error("link has expired")]
    Expired,
}

/// Signs and verifies expiring URLs with HMAC-SHA256.
#[derive(Clone)]
pub struct UrlSigner {
    key: [u8; 32],
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("key", &"[hidden]")
            .finish()
    }
}

impl UrlSigner {
    /// Creates a signer from a 32-byte key.
    #[must_use]
    pub fn new(key: &[u8; 32]) -> Self {
        Self { key: *key }
    }

    /// Produces an absolute signed URL.
    ///
    /// The signature covers the path, the expiry, and every given parameter.
    /// Parameter values must be query-safe (the token and expiry are); no
    /// percent-encoding is applied.
    #[must_use]
    pub fn sign(
        &self,
        base_url: &str,
        path: &str,
        expires_at: DateTime<Utc>,
        params: &[(&str, &str)],
    ) -> String {
        let mut all: BTreeMap<&str, String> = params
            .iter()
            .map(|(k, v)| (*k, (*v).to_string()))
            .collect();
        all.insert(EXPIRES_PARAM, expires_at.timestamp().to_string());

        let canonical = canonical_string(path, all.iter().map(|(k, v)| (*k, v.as_str())));
        let signature = hex::encode(self.mac(canonical.as_bytes()));

        let query: Vec<String> = all.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!(
            "{}{path}?{}&{SIGNATURE_PARAM}={signature}",
            base_url.trim_end_matches('/'),
            query.join("&"),
        )
    }

    /// Verifies the signature and expiry of an incoming request's path and
    /// decoded query parameters.
    ///
    /// # Errors
    ///
    /// Returns a `SignatureError` if the signature is absent, does not
    /// match, or the link has expired.
    pub fn verify(
        &self,
        path: &str,
        params: &HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let provided = params.get(SIGNATURE_PARAM).ok_or(SignatureError::Missing)?;
        let provided = hex::decode(provided).map_err(|_| SignatureError::Invalid)?;

        let filtered: BTreeMap<&str, &str> = params
            .iter()
            .filter(|(k, _)| k.as_str() != SIGNATURE_PARAM)
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let canonical = canonical_string(path, filtered.into_iter());

        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key size");
        mac.update(canonical.as_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| SignatureError::Invalid)?;

        let expires: i64 = params
            .get(EXPIRES_PARAM)
            .and_then(|v| v.parse().ok())
            .ok_or(SignatureError::Invalid)?;
        if expires < now.timestamp() {
            return Err(SignatureError::Expired);
        }

        Ok(())
    }

    fn mac(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key size");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

fn canonical_string<'a>(path: &str, params: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let query: Vec<String> = params.map(|(k, v)| format!("{k}={v}")).collect();
    format!("{path}?{}", query.join("&"))
}
