use thiserror::Error;

use crate::format::ByteSize;

pub type SafeshareResult<T> = Result<T, SafeshareError>;

#[derive(Debug, Error)]
pub enum SafeshareError {
    #[error("config error: {0}")]
    Config(String),

    #[error("The file size cannot be 0 bytes.")]
    EmptyFile,

    #[error("File size cannot exceed {limit}.")]
    FileTooLarge { size: ByteSize, limit: ByteSize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
