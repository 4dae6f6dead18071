//! Redemption-side validation.
//!
//! These checks duplicate the issuance-time checks on purpose. A token is a
//! bearer credential that can outlive the environment it was issued under,
//! so the redeemer re-validates against the *current* request instead of
//! trusting the issuer.

use super::error::RedeemError;
use super::target::{hosts_equal, is_http_url, url_host};

/// A URL-mode target that passed redemption validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedUrlTarget {
    /// Absolute same-host URL, fetched as-is.
    Absolute(String),
    /// In-application path, normalized to a leading `/`; the caller
    /// resolves it against the current scheme and host.
    Relative(String),
}

/// Validates a URL-mode payload against the current request host.
///
/// # Errors
///
/// `NotFound` for a blank target; `Forbidden` for an absolute target whose
/// host is unparsable or differs from the request host.
pub fn validate_url_target(
    url: &str,
    request_host: &str,
) -> Result<ResolvedUrlTarget, RedeemError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(RedeemError::NotFound);
    }

    if is_http_url(url) {
        let host = url_host(url).ok_or(RedeemError::Forbidden)?;
        if !hosts_equal(&host, host_only(request_host)) {
            return Err(RedeemError::Forbidden);
        }
        return Ok(ResolvedUrlTarget::Absolute(url.to_string()));
    }

    let normalized = if url.starts_with('/') {
        url.to_string()
    } else {
        format!("/{}", url.trim_start_matches('/'))
    };
    Ok(ResolvedUrlTarget::Relative(normalized))
}

/// Validates a storage-mode path at redemption time.
///
/// # Errors
///
/// `NotFound` for a blank path; `Forbidden` for URL-shaped paths and for
/// any path containing `..`.
pub fn validate_storage_target(path: &str) -> Result<String, RedeemError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(RedeemError::NotFound);
    }
    if is_http_url(path) || path.contains("..") {
        return Err(RedeemError::Forbidden);
    }
    Ok(path.to_string())
}

/// Strips the port from a Host header value. Bracketed IPv6 literals keep
/// their brackets, matching what URL parsing reports for the host.
#[must_use]
pub fn host_only(host_header: &str) -> &str {
    if host_header.starts_with('[') {
        if let Some(end) = host_header.find(']') {
            return &host_header[..=end];
        }
        return host_header;
    }
    host_header
        .split_once(':')
        .map_or(host_header, |(host, _)| host)
}

/// Final path segment, used as the download filename.
#[must_use]
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Escapes a filename for a quoted Content-Disposition parameter.
#[must_use]
pub fn escape_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\r' | '\n' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}
