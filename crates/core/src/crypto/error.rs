//! Crypto error types.

use thiserror::Error;

/// Errors from key derivation and token encryption/decryption.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Master key is not valid base64 or not 32 bytes.
    #[error("master key must be base64 of 32 random bytes")]
    InvalidMasterKey,

    /// HKDF expansion failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// AES-GCM encryption failed.
    #[error("token encryption failed")]
    Encrypt,

    /// AES-GCM decryption failed (wrong key or tampered ciphertext).
    #[error("token decryption failed")]
    Decrypt,

    /// Token is not valid base64url or too short to hold a nonce.
    #[error("malformed token")]
    InvalidToken,
}
