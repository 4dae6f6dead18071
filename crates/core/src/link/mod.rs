//! Secret link issuance and redemption logic.
//!
//! A secret link is a signed, expiring URL carrying an encrypted payload
//! that names either a file on a storage disk or an internal URL. The
//! issuer builds the payload and wraps it; the redemption side re-validates
//! every safety constraint before dispatching, because a token can outlive
//! the configuration it was issued under.

mod error;
mod issuer;
mod payload;
mod redeem;
mod target;

pub use error::{IssueError, PayloadError, RedeemError};
pub use issuer::{
    IssueOptions, IssuedLink, LinkIssuer, FALLBACK_EXPIRY_MINUTES, MAX_EXPIRY_MINUTES,
};
pub use payload::{LinkMode, SecretPayload};
pub use redeem::{
    ResolvedUrlTarget, basename, escape_filename, host_only, validate_storage_target,
    validate_url_target,
};

/// Route path the redemption endpoint is mounted at.
pub const REDEEM_PATH: &str = "/secret/download";

/// Query parameter carrying the encrypted token.
pub const TOKEN_PARAM: &str = "t";
