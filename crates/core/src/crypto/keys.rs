//! Key material derived from the application master key.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hkdf::Hkdf;
use sha2::Sha256;

use super::error::CryptoError;

/// HKDF info string for the token-encryption key.
const TOKEN_KEY_INFO: &[u8] = b"seclink/token-encryption";
/// HKDF info string for the URL-signing key.
const SIGNING_KEY_INFO: &[u8] = b"seclink/url-signing";

/// The two process-wide keys, derived once at startup.
#[derive(Clone)]
pub struct KeyMaterial {
    token_key: [u8; 32],
    signing_key: [u8; 32],
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("token_key", &"[hidden]")
            .field("signing_key", &"[hidden]")
            .finish()
    }
}

impl KeyMaterial {
    /// Derives token-encryption and URL-signing keys from a base64-encoded
    /// 32-byte master key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidMasterKey` if the master key is not
    /// base64 of exactly 32 bytes.
    pub fn from_master_key(master_key_b64: &str) -> Result<Self, CryptoError> {
        let master = STANDARD
            .decode(master_key_b64.trim())
            .map_err(|_| CryptoError::InvalidMasterKey)?;
        if master.len() != 32 {
            return Err(CryptoError::InvalidMasterKey);
        }

        let hkdf = Hkdf::<Sha256>::new(None, &master);

        let mut token_key = [0u8; 32];
        hkdf.expand(TOKEN_KEY_INFO, &mut token_key)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

        let mut signing_key = [0u8; 32];
        hkdf.expand(SIGNING_KEY_INFO, &mut signing_key)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

        Ok(Self {
            token_key,
            signing_key,
        })
    }

    /// The AES-256-GCM key for token encryption.
    #[must_use]
    pub const fn token_key(&self) -> &[u8; 32] {
        &self.token_key
    }

    /// The HMAC-SHA256 key for URL signing.
    #[must_use]
    pub const fn signing_key(&self) -> &[u8; 32] {
        &self.signing_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";

    #[test]
    fn test_derivation_is_deterministic() {
        let a = KeyMaterial::from_master_key(TEST_KEY).unwrap();
        let b = KeyMaterial::from_master_key(TEST_KEY).unwrap();
        assert_eq!(a.token_key(), b.token_key());
        assert_eq!(a.signing_key(), b.signing_key());
    }

    #[test]
    fn test_derived_keys_are_distinct() {
        let keys = KeyMaterial::from_master_key(TEST_KEY).unwrap();
        assert_ne!(keys.token_key(), keys.signing_key());
    }

    #[test]
    fn test_rejects_bad_base64() {
        assert!(matches!(
            KeyMaterial::from_master_key("not base64!!"),
            Err(CryptoError::InvalidMasterKey)
        ));
    }

    #[test]
    fn test_rejects_short_key() {
        let short = STANDARD.encode(b"too short");
        assert!(matches!(
            KeyMaterial::from_master_key(&short),
            Err(CryptoError::InvalidMasterKey)
        ));
    }

    #[test]
    fn test_debug_hides_keys() {
        let keys = KeyMaterial::from_master_key(TEST_KEY).unwrap();
        let debug = format!("{keys:?}");
        assert!(debug.contains("[hidden]"));
        assert!(!debug.contains("0123"));
    }
}
