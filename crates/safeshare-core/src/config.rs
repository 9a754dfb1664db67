use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SafeshareError, SafeshareResult};
use crate::format::ByteSize;

/// Top-level client configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeshareConfig {
    pub log: LogConfig,
    pub crypto: CryptoConfig,
    pub upload: UploadConfig,
    pub share: ShareConfig,
}

impl SafeshareConfig {
    /// Load from `path`, or fall back to defaults if the file does not exist.
    pub fn load(path: &Path) -> SafeshareResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| SafeshareError::Config(format!("parsing {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SafeshareResult<()> {
        if self.crypto.chunk_size == 0 {
            return Err(SafeshareError::Config("crypto.chunk_size must be greater than 0".into()));
        }
        match self.log.format.as_str() {
            "json" | "text" => Ok(()),
            other => Err(SafeshareError::Config(format!(
                "log.format must be \"json\" or \"text\", got {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

/// Stream encryption settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Bytes per source read (default: 65536)
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest file accepted for encryption in bytes; 0 disables the check
    /// (default: 10485760 = 10 MiB)
    pub max_file_size: u64,
    /// Print a packed share token when an upload identifier is known
    pub merge_key: bool,
}

impl UploadConfig {
    /// Reject empty files and files over `max_file_size`.
    pub fn check_size(&self, size: u64) -> SafeshareResult<()> {
        if size == 0 {
            return Err(SafeshareError::EmptyFile);
        }
        if self.max_file_size > 0 && size > self.max_file_size {
            return Err(SafeshareError::FileTooLarge {
                size: ByteSize(size),
                limit: ByteSize(self.max_file_size),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Base URL for share links (`<link_base>/link/<share token>`)
    pub link_base: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            merge_key: true,
        }
    }
}

/// Default config path: `$XDG_CONFIG_HOME/safeshare/config.toml`, else
/// `~/.config/safeshare/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        if !dir.is_empty() {
            return PathBuf::from(dir).join("safeshare/config.toml");
        }
    }
    let home = std::env::var("HOME").unwrap_or_default();
    PathBuf::from(home).join(".config/safeshare/config.toml")
}
