/// Credential Vault
///
/// Provides AES-256-GCM sealing for social account credentials.
///
/// Access and refresh tokens obtained during OAuth must never reach the
/// database or logs in cleartext. This crate serializes the credential record
/// to JSON and seals it before storage; the key is managed outside the code:
/// - AWS KMS (recommended for production)
/// - HashiCorp Vault
/// - Environment variable (development only)
///
/// ## Sealed Format
///
/// Each sealed record is stored as BYTEA with the following layout:
/// - Nonce (12 bytes): random per seal
/// - Ciphertext (variable): encrypted JSON record
/// - Tag (16 bytes): authentication tag
///
/// The nonce is regenerated on every seal, so sealing the same record twice
/// yields different bytes.
use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use base64::engine::{general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the base64-encoded 256-bit vault key.
pub const VAULT_KEY_ENV: &str = "CREDENTIAL_VAULT_KEY";

/// Vault errors
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Seal failed: {0}")]
    SealFailed(String),

    #[error("Open failed: {0}")]
    OpenFailed(String),

    #[error("Invalid key length: {0}")]
    InvalidKeyLength(String),

    #[error("Invalid vault key: {0}")]
    InvalidKey(String),

    #[error("Missing vault key")]
    MissingKey,
}

/// Credentials held for one connected social account.
///
/// `Debug` redacts the token fields so the record can appear in error
/// context without leaking secrets.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountCredentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Sealing service holding the AES-256-GCM cipher.
pub struct CredentialVault {
    cipher: Aes256Gcm,
}

impl CredentialVault {
    /// Create a vault from a base64-encoded 256-bit (32-byte) key.
    pub fn new(key_base64: &str) -> Result<Self, VaultError> {
        let key_bytes = STANDARD
            .decode(key_base64)
            .map_err(|e| VaultError::InvalidKey(format!("Failed to decode base64: {}", e)))?;

        if key_bytes.len() != 32 {
            return Err(VaultError::InvalidKeyLength(format!(
                "Key must be 32 bytes (256 bits), got {} bytes",
                key_bytes.len()
            )));
        }

        let key = aes_gcm::Key::<Aes256Gcm>::from_slice(&key_bytes);
        let cipher = Aes256Gcm::new(key);

        Ok(Self { cipher })
    }

    /// Create a vault from the `CREDENTIAL_VAULT_KEY` environment variable.
    pub fn from_env() -> Result<Self, VaultError> {
        let key_base64 = std::env::var(VAULT_KEY_ENV).map_err(|_| VaultError::MissingKey)?;
        Self::new(&key_base64)
    }

    /// Seal a credential record for storage.
    ///
    /// Returns bytes in the layout: [Nonce (12 bytes)][Ciphertext][Tag (16 bytes)]
    pub fn seal(&self, credentials: &AccountCredentials) -> Result<Vec<u8>, VaultError> {
        let plaintext = serde_json::to_vec(credentials)
            .map_err(|e| VaultError::SealFailed(format!("Serialization failed: {}", e)))?;

        let mut rng = rand::thread_rng();
        let nonce_bytes: [u8; 12] = rng.gen();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, Payload::from(plaintext.as_slice()))
            .map_err(|e| VaultError::SealFailed(format!("AES-GCM failed: {}", e)))?;

        let mut result = Vec::with_capacity(12 + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(result)
    }

    /// Open a sealed credential record.
    pub fn open(&self, sealed: &[u8]) -> Result<AccountCredentials, VaultError> {
        // Minimum length: 12-byte nonce + 16-byte tag.
        if sealed.len() < 28 {
            return Err(VaultError::OpenFailed("Sealed data too short".to_string()));
        }

        let nonce = Nonce::from_slice(&sealed[..12]);
        let ciphertext = &sealed[12..];

        let plaintext = self
            .cipher
            .decrypt(nonce, Payload::from(ciphertext))
            .map_err(|e| VaultError::OpenFailed(format!("AES-GCM failed: {}", e)))?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| VaultError::OpenFailed(format!("Deserialization failed: {}", e)))
    }
}

/// Generate a random 256-bit vault key encoded in base64.
///
/// The output goes into `CREDENTIAL_VAULT_KEY` or a key management system.
pub fn generate_key() -> String {
    let mut rng = rand::thread_rng();
    let key_bytes: [u8; 32] = rng.gen();
    STANDARD.encode(key_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_credentials() -> AccountCredentials {
        AccountCredentials {
            access_token: "ig_access_abc123".to_string(),
            refresh_token: Some("ig_refresh_xyz789".to_string()),
            expires_at: Some(Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()),
            scopes: vec!["content.publish".to_string(), "profile.read".to_string()],
        }
    }

    #[test]
    fn test_generate_key() {
        let key = generate_key();
        assert!(!key.is_empty());
        // Base64 encoded 32 bytes should be ~43 characters
        assert!(key.len() > 40);
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = generate_key();
        let vault = CredentialVault::new(&key).unwrap();

        let credentials = sample_credentials();
        let sealed = vault.seal(&credentials).unwrap();
        let opened = vault.open(&sealed).unwrap();

        assert_eq!(credentials, opened);
    }

    #[test]
    fn test_seal_produces_different_ciphertexts() {
        let key = generate_key();
        let vault = CredentialVault::new(&key).unwrap();

        let credentials = sample_credentials();
        let sealed1 = vault.seal(&credentials).unwrap();
        let sealed2 = vault.seal(&credentials).unwrap();

        // Random nonce makes repeated seals differ
        assert_ne!(sealed1, sealed2);

        assert_eq!(vault.open(&sealed1).unwrap(), credentials);
        assert_eq!(vault.open(&sealed2).unwrap(), credentials);
    }

    #[test]
    fn test_seal_minimal_record() {
        let key = generate_key();
        let vault = CredentialVault::new(&key).unwrap();

        let credentials = AccountCredentials {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_at: None,
            scopes: vec![],
        };

        let sealed = vault.seal(&credentials).unwrap();
        assert_eq!(vault.open(&sealed).unwrap(), credentials);
    }

    #[test]
    fn test_invalid_key_length() {
        let short_key = STANDARD.encode("too_short");
        let result = CredentialVault::new(&short_key);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_base64() {
        let invalid_base64 = "not@valid@base64!!!";
        let result = CredentialVault::new(invalid_base64);
        assert!(result.is_err());
    }

    #[test]
    fn test_open_tampered_data() {
        let key = generate_key();
        let vault = CredentialVault::new(&key).unwrap();

        let mut sealed = vault.seal(&sample_credentials()).unwrap();
        // Flip a bit in the ciphertext; the tag must catch it
        if sealed.len() > 12 {
            sealed[13] ^= 0xFF;
        }

        let result = vault.open(&sealed);
        assert!(result.is_err());
    }

    #[test]
    fn test_open_truncated_data() {
        let key = generate_key();
        let vault = CredentialVault::new(&key).unwrap();

        let result = vault.open(&[0u8; 20]);
        assert!(result.is_err());
    }

    #[test]
    fn test_different_keys_incompatible() {
        let vault1 = CredentialVault::new(&generate_key()).unwrap();
        let vault2 = CredentialVault::new(&generate_key()).unwrap();

        let sealed = vault1.seal(&sample_credentials()).unwrap();
        assert!(vault2.open(&sealed).is_err());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", sample_credentials());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("ig_access_abc123"));
        assert!(!rendered.contains("ig_refresh_xyz789"));
        // Non-secret fields stay visible
        assert!(rendered.contains("content.publish"));
    }
}
