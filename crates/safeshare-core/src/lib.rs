pub mod config;
pub mod error;
pub mod format;

pub use error::{SafeshareError, SafeshareResult};
