//! Incremental AES-256-CBC transform with PKCS#7 padding
//!
//! Accepts input in arbitrary-sized pieces and emits whole blocks as soon as
//! they are safe to emit:
//! - encrypt keeps back only the trailing partial block
//! - decrypt also keeps back the last complete block, since it carries the
//!   padding that `finalize` has to validate and strip
//!
//! Ciphertext size for `n` plaintext bytes is `(n / 16 + 1) * 16`.

use aes::Aes256;
use cbc::cipher::block_padding::{Padding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::error::CipherFault;
use crate::keys::KeyMaterial;
use crate::BLOCK_SIZE;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Which way a stream is transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    /// User-facing message for a failed transform in this direction.
    pub fn failure_message(self) -> &'static str {
        match self {
            Direction::Encrypt => "Encryption failed",
            Direction::Decrypt => "Decryption failed",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Encrypt => f.write_str("encrypt"),
            Direction::Decrypt => f.write_str("decrypt"),
        }
    }
}

enum Mode {
    Encrypt(Aes256CbcEnc),
    Decrypt(Aes256CbcDec),
}

/// One CBC chain in one direction. Carries block-chaining state, so a single
/// transform must see its input strictly in order.
pub struct CbcTransform {
    mode: Mode,
    pending: Vec<u8>,
}

impl CbcTransform {
    pub fn new(direction: Direction, material: &KeyMaterial) -> Self {
        let (key, iv) = (material.key(), material.iv());
        let mode = match direction {
            Direction::Encrypt => Mode::Encrypt(Aes256CbcEnc::new(key.into(), iv.into())),
            Direction::Decrypt => Mode::Decrypt(Aes256CbcDec::new(key.into(), iv.into())),
        };
        Self {
            mode,
            pending: Vec::with_capacity(BLOCK_SIZE),
        }
    }

    pub fn direction(&self) -> Direction {
        match self.mode {
            Mode::Encrypt(_) => Direction::Encrypt,
            Mode::Decrypt(_) => Direction::Decrypt,
        }
    }

    /// Feed `input` and append every block that is ready to `out`.
    pub fn update(&mut self, input: &[u8], out: &mut Vec<u8>) {
        self.pending.extend_from_slice(input);

        let ready = match self.mode {
            Mode::Encrypt(_) => self.pending.len() / BLOCK_SIZE * BLOCK_SIZE,
            Mode::Decrypt(_) => self.pending.len().saturating_sub(1) / BLOCK_SIZE * BLOCK_SIZE,
        };
        if ready == 0 {
            return;
        }

        let start = out.len();
        out.extend(self.pending.drain(..ready));
        self.apply(&mut out[start..]);
    }

    /// Flush the final block: pad on encrypt, validate and strip padding on
    /// decrypt. Consumes the transform; a chain is finalized once.
    pub fn finalize(mut self, out: &mut Vec<u8>) -> Result<(), CipherFault> {
        let mut block = aes::Block::default();
        match self.mode {
            Mode::Encrypt(ref mut enc) => {
                let used = self.pending.len();
                block[..used].copy_from_slice(&self.pending);
                Pkcs7::pad(&mut block, used);
                enc.encrypt_block_mut(&mut block);
                out.extend_from_slice(&block);
            }
            Mode::Decrypt(ref mut dec) => {
                match self.pending.len() {
                    0 => return Err(CipherFault::TruncatedCiphertext),
                    BLOCK_SIZE => {}
                    n => return Err(CipherFault::UnalignedCiphertext(n % BLOCK_SIZE)),
                }
                block.copy_from_slice(&self.pending);
                dec.decrypt_block_mut(&mut block);
                let plain = Pkcs7::unpad(&block).map_err(|_| CipherFault::BadPadding)?;
                out.extend_from_slice(plain);
            }
        }
        Ok(())
    }

    fn apply(&mut self, blocks: &mut [u8]) {
        for chunk in blocks.chunks_exact_mut(BLOCK_SIZE) {
            let block = aes::Block::from_mut_slice(chunk);
            match &mut self.mode {
                Mode::Encrypt(enc) => enc.encrypt_block_mut(block),
                Mode::Decrypt(dec) => dec.decrypt_block_mut(block),
            }
        }
    }
}
