//! Link issuance.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use seclink_shared::config::LinkConfig;

use super::error::IssueError;
use super::payload::{LinkMode, SecretPayload};
use super::target::{hosts_equal, is_http_url, url_host};
use super::{REDEEM_PATH, TOKEN_PARAM};
use crate::crypto::{KeyMaterial, TokenCipher, UrlSigner};

/// Expiry used when neither the caller nor the configuration supplies a
/// positive number of minutes.
pub const FALLBACK_EXPIRY_MINUTES: i64 = 60;

/// Upper bound on a link lifetime: ten years in minutes. Overrides come
/// straight from callers as an `i64`; without a cap a huge value overflows
/// the expiry arithmetic.
pub const MAX_EXPIRY_MINUTES: i64 = 60 * 24 * 365 * 10;

/// Per-call overrides for link issuance. Unset fields fall back to the
/// configured defaults.
#[derive(Debug, Clone, Default)]
pub struct IssueOptions {
    /// Link lifetime in minutes; non-positive values are ignored.
    pub minutes: Option<i64>,
    /// Delete-after-download flag (storage mode only).
    pub delete: Option<bool>,
    /// Storage disk name (storage mode only).
    pub disk: Option<String>,
}

/// A successfully issued link.
#[derive(Debug, Clone)]
pub struct IssuedLink {
    /// The absolute signed URL.
    pub url: String,
    /// When the link stops being redeemable.
    pub expires_at: DateTime<Utc>,
    /// Which mode the link was issued in.
    pub mode: LinkMode,
}

/// Builds signed, expiring secret links.
#[derive(Debug, Clone)]
pub struct LinkIssuer {
    cipher: TokenCipher,
    signer: UrlSigner,
    defaults: LinkConfig,
    public_url: String,
    app_host: Option<String>,
}

impl LinkIssuer {
    /// Creates an issuer from derived key material, configured defaults,
    /// and the deployment's public base URL.
    #[must_use]
    pub fn new(keys: &KeyMaterial, defaults: LinkConfig, public_url: impl Into<String>) -> Self {
        let public_url = public_url.into();
        let app_host = url_host(&public_url);
        Self {
            cipher: TokenCipher::new(keys.token_key()),
            signer: UrlSigner::new(keys.signing_key()),
            defaults,
            public_url,
            app_host,
        }
    }

    /// Issues a secret link for a storage path or internal URL.
    ///
    /// Mode selection: targets matching `^https?://` or starting with `/`
    /// are URL mode; everything else is a storage path.
    ///
    /// # Errors
    ///
    /// Returns an `IssueError` naming the rejection reason; the
    /// string-returning aliases collapse these to `""`.
    pub fn issue(&self, target: &str, opts: &IssueOptions) -> Result<IssuedLink, IssueError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(IssueError::BlankTarget);
        }

        let minutes = resolve_minutes(opts.minutes, self.defaults.default_expiry_minutes);

        let payload = if is_http_url(target) || target.starts_with('/') {
            // URL mode: absolute targets must point at our own host.
            // Relative paths cannot point off-host, so no check is needed.
            if is_http_url(target) {
                let host = url_host(target).ok_or(IssueError::UnparsableTarget)?;
                let app_host = self
                    .app_host
                    .as_deref()
                    .ok_or(IssueError::AppHostNotConfigured)?;
                if !hosts_equal(&host, app_host) {
                    return Err(IssueError::UntrustedHost);
                }
            }
            SecretPayload::Url {
                url: target.to_string(),
            }
        } else {
            // Storage mode. The `..` substring check also rejects names
            // like `a..b`; intentionally conservative.
            if target.contains("..") {
                return Err(IssueError::PathTraversal);
            }
            SecretPayload::Storage {
                path: target.to_string(),
                disk: opts
                    .disk
                    .clone()
                    .or_else(|| self.defaults.default_disk.clone()),
                delete_after_download: opts
                    .delete
                    .unwrap_or(self.defaults.default_delete_after_download),
            }
        };

        let mode = payload.mode();
        let token = self.cipher.encrypt(payload.to_json()?.as_bytes())?;
        let expires_at = Utc::now() + Duration::minutes(minutes);
        let url = self.signer.sign(
            &self.public_url,
            REDEEM_PATH,
            expires_at,
            &[(TOKEN_PARAM, &token)],
        );

        Ok(IssuedLink {
            url,
            expires_at,
            mode,
        })
    }

    /// Filter-style alias: returns the signed URL, or an empty string on
    /// any rejection so rendering contexts never crash on bad input.
    #[must_use]
    pub fn secret(
        &self,
        target: &str,
        minutes: Option<i64>,
        delete: Option<bool>,
        disk: Option<&str>,
    ) -> String {
        let opts = IssueOptions {
            minutes,
            delete,
            disk: disk.map(str::to_owned),
        };
        match self.issue(target, &opts) {
            Ok(link) => link.url,
            Err(err) => {
                debug!(target, %err, "secret link rejected");
                String::new()
            }
        }
    }

    /// Function-style alias; identical to [`Self::secret`].
    #[must_use]
    pub fn secret_link(
        &self,
        target: &str,
        minutes: Option<i64>,
        delete: Option<bool>,
        disk: Option<&str>,
    ) -> String {
        self.secret(target, minutes, delete, disk)
    }
}

/// Resolves the link lifetime: a positive override wins, then the
/// configured default, then [`FALLBACK_EXPIRY_MINUTES`]. The result is
/// capped at [`MAX_EXPIRY_MINUTES`].
fn resolve_minutes(override_minutes: Option<i64>, configured: i64) -> i64 {
    let minutes = override_minutes.unwrap_or(configured);
    let minutes = if minutes > 0 {
        minutes
    } else if configured > 0 {
        configured
    } else {
        FALLBACK_EXPIRY_MINUTES
    };
    minutes.min(MAX_EXPIRY_MINUTES)
}
