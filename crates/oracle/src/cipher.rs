//! Symmetric encryption service used to seal function bodies.
//!
//! The key travels next to the ciphertext in the emitted program, so sealing a body is an
//! obfuscation layer only; it gives no confidentiality.
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use murk_utils::errors::CipherError;

pub const KEY_SIZE: usize = 32; // 256 bits
pub const NONCE_SIZE: usize = 12; // 96 bits

/// Raw key material generated once per obfuscation run.
#[derive(Clone, PartialEq, Eq)]
pub struct Key(Vec<u8>);

impl Key {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key({} bytes)", self.0.len())
    }
}

/// Encryption service contract. `decrypt(encrypt(x, k), k) == x` for every generated `k`.
///
/// Besides the host-side operations a cipher describes how the emitted program undoes the
/// encryption at run time: the imports it needs and an expression yielding the plaintext.
pub trait Cipher: Send + Sync {
    fn generate_key(&self) -> Result<Key, CipherError>;

    /// Encrypts `plaintext` into a transport-safe (ASCII) ciphertext.
    fn encrypt(&self, plaintext: &str, key: &Key) -> Result<String, CipherError>;

    fn decrypt(&self, ciphertext: &str, key: &Key) -> Result<String, CipherError>;

    /// Text of the key as embedded in the emitted program.
    fn key_literal(&self, key: &Key) -> String {
        key.to_hex()
    }

    /// Import statements the runtime decryption needs.
    fn runtime_imports(&self) -> Vec<String>;

    /// Expression that evaluates to the plaintext, given variable names holding the
    /// ciphertext and the key literal.
    fn runtime_decrypt_expr(&self, blob: &str, key: &str) -> String;
}

/// AES-256-GCM with a random nonce prepended to the ciphertext, hex encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher;

impl Cipher for AesGcmCipher {
    fn generate_key(&self) -> Result<Key, CipherError> {
        let key = Aes256Gcm::generate_key(OsRng);
        Ok(Key(key.to_vec()))
    }

    fn encrypt(&self, plaintext: &str, key: &Key) -> Result<String, CipherError> {
        let cipher = cipher_for(key)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(hex::encode(sealed))
    }

    fn decrypt(&self, ciphertext: &str, key: &Key) -> Result<String, CipherError> {
        let cipher = cipher_for(key)?;
        let sealed = hex::decode(ciphertext)?;
        if sealed.len() < NONCE_SIZE {
            return Err(CipherError::Truncated);
        }
        let (nonce_bytes, encrypted) = sealed.split_at(NONCE_SIZE);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), encrypted)
            .map_err(|_| CipherError::Decrypt)?;
        Ok(String::from_utf8(plaintext)?)
    }

    fn runtime_imports(&self) -> Vec<String> {
        vec!["from cryptography.hazmat.primitives.ciphers.aead import AESGCM".to_string()]
    }

    fn runtime_decrypt_expr(&self, blob: &str, key: &str) -> String {
        format!(
            "AESGCM(bytes.fromhex({key})).decrypt(bytes.fromhex({blob})[:{NONCE_SIZE}], \
             bytes.fromhex({blob})[{NONCE_SIZE}:], None).decode()"
        )
    }
}

fn cipher_for(key: &Key) -> Result<Aes256Gcm, CipherError> {
    if key.0.len() != KEY_SIZE {
        return Err(CipherError::InvalidKeySize {
            expected: KEY_SIZE,
            actual: key.0.len(),
        });
    }
    Aes256Gcm::new_from_slice(&key.0).map_err(|_| CipherError::InvalidKeySize {
        expected: KEY_SIZE,
        actual: key.0.len(),
    })
}
