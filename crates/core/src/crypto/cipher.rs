//! Authenticated encryption of link payloads.

use aes_gcm::aead::{Aead, AeadCore, OsRng};
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use super::error::CryptoError;

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Encrypts serialized payloads into opaque token strings and back.
///
/// Token format: base64url(nonce || AES-256-GCM ciphertext), no padding,
/// so the token travels inside a query string without escaping.
#[derive(Clone)]
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher")
            .field("cipher", &"[hidden]")
            .finish()
    }
}

impl TokenCipher {
    /// Creates a cipher from a 32-byte key.
    #[must_use]
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    /// Encrypts a plaintext into a token string with a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Encrypt` if encryption fails.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CryptoError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(out))
    }

    /// Decrypts a token string back into the plaintext.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidToken` for malformed tokens and
    /// `CryptoError::Decrypt` for tampered or wrong-key ciphertexts.
    /// Callers must surface both identically to avoid an oracle.
    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>, CryptoError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| CryptoError::InvalidToken)?;
        if raw.len() <= NONCE_LEN {
            return Err(CryptoError::InvalidToken);
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Decrypt)
    }
}
