use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use thiserror::Error;

const NONCE_SIZE: usize = 12; // AES-GCM standard nonce size

#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("Invalid key length")]
    InvalidKeyLength,
}

/// Symmetric encryption for program credential bundles, using AES-256-GCM.
/// Credentials are never stored or logged in plaintext; the 32-byte key is
/// loaded hex-encoded from the environment at startup.
pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl EncryptionService {
    /// Creates a new service from a 32-byte key.
    pub fn new(key: &[u8]) -> Result<Self, EncryptionError> {
        Ok(Self {
            cipher: Aes256Gcm::new_from_slice(key)
                .map_err(|_| EncryptionError::InvalidKeyLength)?,
        })
    }

    /// Creates a new service from a hex-encoded 32-byte key.
    pub fn from_hex_key(key_hex: &str) -> Result<Self, EncryptionError> {
        let key_bytes = hex::decode(key_hex).map_err(|_| EncryptionError::InvalidKeyLength)?;
        Self::new(&key_bytes)
    }

    /// Encrypts a plaintext byte slice. The 12-byte nonce is prepended to the
    /// ciphertext; it is required for decryption and unique per call.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

        let mut result = nonce.to_vec();
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    /// Decrypts an encrypted byte slice, assuming the first 12 bytes are the
    /// nonce.
    pub fn decrypt(&self, encrypted_data: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        if encrypted_data.len() < NONCE_SIZE {
            return Err(EncryptionError::DecryptionFailed(
                "Invalid encrypted data: too short to contain a nonce".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = encrypted_data.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| EncryptionError::DecryptionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let service = EncryptionService::from_hex_key(KEY_HEX).unwrap();
        let plaintext = b"{\"apiKey\":\"abc\",\"apiSecret\":\"shh\"}";

        let encrypted = service.encrypt(plaintext).unwrap();
        let decrypted = service.decrypt(&encrypted).unwrap();

        assert_ne!(encrypted.as_slice(), plaintext.as_ref());
        assert_eq!(decrypted.as_slice(), plaintext.as_ref());
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let service = EncryptionService::from_hex_key(KEY_HEX).unwrap();
        let other = EncryptionService::from_hex_key(
            "f1e1d1c1b1a191817161514131211101f0e0d0c0b0a09080706050403020100f",
        )
        .unwrap();

        let encrypted = service.encrypt(b"secret").unwrap();
        assert!(other.decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_invalid_key_length() {
        assert!(matches!(
            EncryptionService::new(&[0u8; 16]),
            Err(EncryptionError::InvalidKeyLength)
        ));
        assert!(matches!(
            EncryptionService::from_hex_key("1234"),
            Err(EncryptionError::InvalidKeyLength)
        ));
    }

    #[test]
    fn test_decrypt_too_short_input() {
        let service = EncryptionService::from_hex_key(KEY_HEX).unwrap();
        let result = service.decrypt(&[0u8; 4]);
        assert!(matches!(result, Err(EncryptionError::DecryptionFailed(_))));
    }
}
