//! The encrypted link payload.

use serde::{Deserialize, Serialize};

use super::error::PayloadError;

/// What a secret link grants access to.
///
/// Exactly one variant exists per link; the wire `mode` field selects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretPayload {
    /// A file on a named storage disk, streamed as an attachment.
    Storage {
        /// Path relative to the disk root. Never contains `..`.
        path: String,
        /// Logical disk name; `None` means the registry's default disk.
        disk: Option<String>,
        /// Delete the file after one complete, successful download.
        delete_after_download: bool,
    },
    /// An internal HTTP resource, proxied to the client.
    Url {
        /// Absolute same-host URL or absolute in-application path.
        url: String,
    },
}

/// Payload mode discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Storage-backed file link.
    Storage,
    /// Internal URL link.
    Url,
}

impl LinkMode {
    /// Wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::Url => "url",
        }
    }
}

/// Wire shape, kept compatible with short keys:
/// `{"mode":"storage","p":...,"d":...,"del":0|1}` or `{"mode":"url","u":...}`.
#[derive(Debug, Serialize, Deserialize)]
struct WirePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    del: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    u: Option<String>,
}

impl SecretPayload {
    /// The payload's mode.
    #[must_use]
    pub const fn mode(&self) -> LinkMode {
        match self {
            Self::Storage { .. } => LinkMode::Storage,
            Self::Url { .. } => LinkMode::Url,
        }
    }

    /// Serializes to the wire JSON form.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::Json` if encoding fails.
    pub fn to_json(&self) -> Result<String, PayloadError> {
        let wire = match self {
            Self::Storage {
                path,
                disk,
                delete_after_download,
            } => WirePayload {
                mode: Some("storage".to_string()),
                p: Some(path.clone()),
                d: disk.clone(),
                del: Some(u8::from(*delete_after_download)),
                u: None,
            },
            Self::Url { url } => WirePayload {
                mode: Some("url".to_string()),
                p: None,
                d: None,
                del: None,
                u: Some(url.clone()),
            },
        };
        Ok(serde_json::to_string(&wire)?)
    }

    /// Parses the wire JSON form.
    ///
    /// A missing `mode` key is treated as storage mode, tolerating tokens
    /// issued before the mode field existed.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::Json` for malformed JSON and
    /// `PayloadError::UnknownMode` for an unrecognized discriminator.
    pub fn from_json(json: &[u8]) -> Result<Self, PayloadError> {
        let wire: WirePayload = serde_json::from_slice(json)?;
        match wire.mode.as_deref() {
            None | Some("storage") => Ok(Self::Storage {
                path: wire.p.unwrap_or_default(),
                disk: wire.d,
                delete_after_download: wire.del.unwrap_or(0) != 0,
            }),
            Some("url") => Ok(Self::Url {
                url: wire.u.unwrap_or_default(),
            }),
            Some(other) => Err(PayloadError::UnknownMode(other.to_string())),
        }
    }
}
