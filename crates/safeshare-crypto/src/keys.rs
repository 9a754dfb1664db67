//! Key material: random key + IV generation and the hex cipher-token codec
//!
//! Token format (96 lowercase hex characters, no separator):
//! ```text
//! [64 hex: 32-byte AES-256 key][32 hex: 16-byte CBC IV]
//! ```

use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{CipherError, CipherFault};
use crate::{IV_SIZE, KEY_SIZE, TOKEN_LEN};

/// A 256-bit key and its CBC IV. Zeroized on drop.
#[derive(Clone)]
pub struct KeyMaterial {
    key: [u8; KEY_SIZE],
    iv: [u8; IV_SIZE],
}

impl KeyMaterial {
    pub fn from_parts(key: [u8; KEY_SIZE], iv: [u8; IV_SIZE]) -> Self {
        Self { key, iv }
    }

    /// Draw a fresh key and an independent IV.
    pub fn generate() -> Self {
        Self::from_parts(generate_key(), generate_iv())
    }

    /// Hex-decode both halves of a split token.
    ///
    /// Invalid hex is a cipher fault rather than a length error: the
    /// stream engine reports it as a direction-tagged failure.
    pub fn decode(split: &SplitToken<'_>) -> Result<Self, CipherFault> {
        let mut key = [0u8; KEY_SIZE];
        let mut iv = [0u8; IV_SIZE];
        if let Err(e) = hex::decode_to_slice(split.key, &mut key)
            .and_then(|()| hex::decode_to_slice(split.iv, &mut iv))
        {
            key.zeroize();
            iv.zeroize();
            return Err(e.into());
        }
        Ok(Self::from_parts(key, iv))
    }

    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    /// Encode as `hex(key) || hex(iv)`.
    pub fn to_token(&self) -> String {
        let mut token = String::with_capacity(TOKEN_LEN);
        token.push_str(&hex::encode(self.key));
        token.push_str(&hex::encode(self.iv));
        token
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.key.zeroize();
        self.iv.zeroize();
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .finish()
    }
}

/// A cipher token split into its key and IV hex halves (not yet decoded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitToken<'a> {
    pub key: &'a str,
    pub iv: &'a str,
}

/// Generate a random 256-bit key.
pub fn generate_key() -> [u8; KEY_SIZE] {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Generate a random 128-bit IV.
pub fn generate_iv() -> [u8; IV_SIZE] {
    let mut bytes = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Generate a new cipher token (`hex(key) || hex(iv)`).
pub fn generate_token() -> String {
    KeyMaterial::generate().to_token()
}

/// Split a cipher token into key hex and IV hex.
///
/// Only the length is checked here. A token whose 64th byte falls inside a
/// multi-byte character cannot be split and is reported as a length error.
pub fn split_token(token: &str) -> Result<SplitToken<'_>, CipherError> {
    let invalid = || CipherError::InvalidKeyLength {
        expected: TOKEN_LEN,
        actual: token.len(),
    };
    if token.len() != TOKEN_LEN {
        return Err(invalid());
    }
    let (key, iv) = token.split_at_checked(KEY_SIZE * 2).ok_or_else(invalid)?;
    Ok(SplitToken { key, iv })
}
