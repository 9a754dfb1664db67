//! safeshare-crypto: Client-side file encryption for SafeShare
//!
//! Architecture: Encrypt-then-Upload with AES-256-CBC (PKCS#7 padding)
//!
//! Pipeline: file stream → chunked AES-256-CBC transform → blob → upload
//!
//! Key material:
//! ```text
//! Cipher token (96 hex chars, generated per upload, shared out-of-band)
//!   ├── key: 32 bytes  (hex chars 0..64)
//!   └── iv:  16 bytes  (hex chars 64..96)
//!
//! Share token = base64("<cipher token>:<server identifier>")
//! ```
//!
//! The storage backend only ever sees ciphertext. There is no authentication
//! tag: integrity is left to the transport and the backend.

pub mod error;
pub mod keys;
pub mod share;
pub mod source;
pub mod stream;
pub mod transform;

pub use error::{CipherError, CipherFault};
pub use keys::{generate_iv, generate_key, generate_token, split_token, KeyMaterial, SplitToken};
pub use share::{pack, parse_share_link, share_link, unpack, ShareParts};
pub use source::{ChunkSource, StreamSource};
pub use stream::{decrypt_stream, encrypt_stream, transform_stream};
pub use transform::{CbcTransform, Direction};

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of a CBC initialization vector (one AES block)
pub const IV_SIZE: usize = 16;

/// AES block size; also the size of the PKCS#7 padding block
pub const BLOCK_SIZE: usize = 16;

/// Length of a cipher token in hex characters
pub const TOKEN_LEN: usize = 2 * (KEY_SIZE + IV_SIZE);
