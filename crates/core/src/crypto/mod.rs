//! Cryptographic primitives for secret links.
//!
//! Two keys are derived from the configured master key via HKDF-SHA256:
//! one for AES-256-GCM token encryption, one for HMAC-SHA256 URL signing.
//! Issuance and redemption share nothing else.

mod cipher;
mod error;
mod keys;
mod signer;

pub use cipher::TokenCipher;
pub use error::CryptoError;
pub use keys::KeyMaterial;
pub use signer::{EXPIRES_PARAM, SIGNATURE_PARAM, SignatureError, UrlSigner};
