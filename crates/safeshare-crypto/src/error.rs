use thiserror::Error;

use crate::transform::Direction;

/// Outcome of a failed key decode or stream transform.
///
/// Callers switch on the variant to pick a user message; the underlying
/// primitive's error is only reachable through `source()`.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("invalid key length: expected {expected} hex characters (32-byte key + 16-byte IV), got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("input length is unknown or zero")]
    UnknownLength,

    #[error("{}", direction.failure_message())]
    StreamCipherFailure {
        direction: Direction,
        #[source]
        source: CipherFault,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("reading source stream: {0}")]
    Source(#[source] std::io::Error),
}

impl CipherError {
    pub(crate) fn failure(direction: Direction, source: CipherFault) -> Self {
        Self::StreamCipherFailure { direction, source }
    }
}

/// Faults raised by the cipher primitive itself.
#[derive(Debug, Error)]
pub enum CipherFault {
    #[error("cipher token is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("ciphertext length is not a multiple of the block size ({0} trailing bytes)")]
    UnalignedCiphertext(usize),

    #[error("ciphertext is empty; expected at least one padding block")]
    TruncatedCiphertext,

    #[error("padding validation failed: wrong key or corrupted ciphertext")]
    BadPadding,
}
