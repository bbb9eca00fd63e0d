use base64::prelude::*;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::CryptoError;

const NONCE_LEN: usize = 24;
const MASK: &str = "************";

/// Derive a 32-byte cipher key from configured key material.
fn derive_key(key_material: &str) -> [u8; 32] {
    let digest = Sha256::digest(key_material.as_bytes());
    digest.into()
}

/// Encrypt an access token for storage. Returns base64(nonce || ciphertext).
/// An empty token encrypts to the empty string.
pub fn encrypt_token(key_material: &str, token: &str) -> Result<String, CryptoError> {
    if token.is_empty() {
        return Ok(String::new());
    }
    let key = derive_key(key_material);
    let cipher = XChaCha20Poly1305::new(&key.into());

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, token.as_bytes())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut data = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    data.extend_from_slice(&nonce_bytes);
    data.extend_from_slice(&ciphertext);
    Ok(BASE64_STANDARD.encode(data))
}

/// Decrypt a stored token. An empty value decrypts to the empty string.
pub fn decrypt_token(key_material: &str, stored: &str) -> Result<String, CryptoError> {
    if stored.is_empty() {
        return Ok(String::new());
    }
    let data = BASE64_STANDARD
        .decode(stored)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;
    if data.len() < NONCE_LEN + 1 {
        return Err(CryptoError::DecryptionFailed("data too short".into()));
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let nonce = XNonce::from_slice(nonce_bytes);

    let key = derive_key(key_material);
    let cipher = XChaCha20Poly1305::new(&key.into());
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

    String::from_utf8(plaintext).map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Mask a token for display: fixed-length mask plus the last four characters.
pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }
    if token.len() <= 4 {
        return MASK.to_string();
    }
    let tail: String = token.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("{MASK}{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn roundtrip() {
        let encrypted = encrypt_token("site-key", "ghp_example1234").unwrap();
        assert_ne!(encrypted, "ghp_example1234");
        let decrypted = decrypt_token("site-key", &encrypted).unwrap();
        assert_eq!(decrypted, "ghp_example1234");
    }

    #[test]
    fn empty_maps_to_empty() {
        assert_eq!(encrypt_token("k", "").unwrap(), "");
        assert_eq!(decrypt_token("k", "").unwrap(), "");
    }

    #[test]
    fn wrong_key_fails() {
        let encrypted = encrypt_token("key-a", "secret").unwrap();
        assert!(decrypt_token("key-b", &encrypted).is_err());
    }

    #[test]
    fn garbage_input_fails() {
        assert!(decrypt_token("k", "not base64 !!!").is_err());
        assert!(decrypt_token("k", "AAAA").is_err());
    }

    #[test]
    fn nonces_differ_between_calls() {
        let a = encrypt_token("k", "same token").unwrap();
        let b = encrypt_token("k", "same token").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn masking_shows_only_tail() {
        assert_eq!(mask_token(""), "");
        assert_eq!(mask_token("abcd"), "************");
        assert_eq!(mask_token("ghp_abcdEFGH1234"), "************1234");
    }

    proptest! {
        #[test]
        fn roundtrip_any_token(token in "[ -~]{1,64}", key in "[ -~]{1,32}") {
            let encrypted = encrypt_token(&key, &token).unwrap();
            prop_assert_eq!(decrypt_token(&key, &encrypted).unwrap(), token);
        }
    }
}
