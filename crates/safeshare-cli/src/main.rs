//! safeshare: client-side file encryption CLI
//!
//! Commands:
//!   keygen                          - print a fresh cipher token
//!   encrypt <input> [-o <out>]      - encrypt a file before upload
//!   decrypt <input> [-o <out>]      - decrypt a downloaded file (--key or --share)
//!   pack <token> <identifier>       - build a share token
//!   unpack <share>                  - split a share token or share link
//!   config show                     - display current configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use safeshare_core::config::{default_config_path, SafeshareConfig};
use safeshare_core::format::{format_bytes, shorten_file_name};
use safeshare_crypto::{CipherError, Direction, StreamSource};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "safeshare",
    version,
    about = "SafeShare client-side encryption",
    long_about = "safeshare: encrypt files before upload, decrypt them after download, \
                  and pack cipher tokens into share tokens"
)]
struct Cli {
    /// Path to config.toml (default: $XDG_CONFIG_HOME/safeshare/config.toml)
    #[arg(long, short = 'c', env = "SAFESHARE_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "safeshare_crypto=trace" (overrides config)
    #[arg(long, env = "SAFESHARE_LOG")]
    log: Option<String>,

    /// Log output format (overrides config)
    #[arg(long, env = "SAFESHARE_LOG_FORMAT", value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a new random cipher token (32-byte key + 16-byte IV, hex)
    Keygen,

    /// Encrypt a local file
    Encrypt {
        /// File to encrypt
        input: PathBuf,
        /// Output path (default: <input>.enc)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Reuse an existing cipher token instead of generating one
        #[arg(long, short = 'k')]
        key: Option<String>,
        /// Server identifier of the upload; prints a share token when set
        #[arg(long, short = 'i')]
        identifier: Option<String>,
    },

    /// Decrypt a downloaded file
    Decrypt {
        /// File to decrypt
        input: PathBuf,
        /// Output path (default: <input> without .enc, else <input>.dec)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Cipher token
        #[arg(long, short = 'k', conflicts_with = "share", required_unless_present = "share")]
        key: Option<String>,
        /// Share token or share link carrying the cipher token
        #[arg(long, short = 's')]
        share: Option<String>,
    },

    /// Pack a cipher token and server identifier into a share token
    Pack {
        token: String,
        identifier: String,
    },

    /// Split a share token (or share link) into cipher token and identifier
    Unpack {
        share: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show the current configuration
    Show,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = load_config(&config_path)?;

    let level = cli.log.as_deref().unwrap_or(&config.log.level);
    let format = cli.log_format.unwrap_or_else(|| {
        LogFormat::from_str(&config.log.format, true).unwrap_or(LogFormat::Text)
    });
    init_logging(level, format);

    if !config_path.exists() {
        tracing::warn!("config file not found: {}  (using defaults)", config_path.display());
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling");
                cancel.cancel();
            }
        }
    });

    match cli.command {
        Commands::Keygen => {
            println!("{}", safeshare_crypto::generate_token());
            Ok(())
        }
        Commands::Encrypt { input, output, key, identifier } => {
            cmd_encrypt(
                &config,
                &input,
                output.as_deref(),
                key.as_deref(),
                identifier.as_deref(),
                &cancel,
            )
            .await
        }
        Commands::Decrypt { input, output, key, share } => {
            let token = resolve_token(key, share.as_deref())?;
            cmd_decrypt(&config, &input, output.as_deref(), &token, &cancel).await
        }
        Commands::Pack { token, identifier } => cmd_pack(&config, &token, &identifier),
        Commands::Unpack { share } => cmd_unpack(&share),
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &config_path),
    }
}

// ── Config + logging ───────────────────────────────────────────────────────────

fn load_config(path: &Path) -> Result<SafeshareConfig> {
    SafeshareConfig::load(path).with_context(|| format!("loading config: {}", path.display()))
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries tokens and packed shares only
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Progress display ───────────────────────────────────────────────────────────

/// Bar position runs over hundredths of a percent.
const PROGRESS_SCALE: u64 = 10_000;

fn make_progress_bar(prefix: &str, name: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(PROGRESS_SCALE);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {msg}")
            .context("building progress style")?
            .progress_chars("=>-"),
    );
    pb.set_prefix(format!("{prefix} {name}"));
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn report_progress(pb: &ProgressBar, percent: f64) {
    pb.set_position((percent.clamp(0.0, 100.0) * 100.0) as u64);
    pb.set_message(format!("{percent:.2}%"));
}

/// Close the bar and turn a stream error into the message shown to the user.
fn finish_progress<T>(
    pb: &ProgressBar,
    direction: Direction,
    result: std::result::Result<T, CipherError>,
) -> Result<T> {
    match result {
        Ok(value) => {
            pb.finish_with_message("done");
            Ok(value)
        }
        Err(e) => {
            pb.abandon_with_message("failed");
            tracing::debug!(error = ?e, %direction, "stream transform failed");
            Err(anyhow::anyhow!(describe_failure(direction, &e)))
        }
    }
}

fn describe_failure(direction: Direction, err: &CipherError) -> String {
    match err {
        CipherError::InvalidKeyLength { .. } => {
            "Invalid key length. The key should include both the 32-byte key and 16-byte IV."
                .to_string()
        }
        CipherError::UnknownLength => "Content length cannot be 0 bytes.".to_string(),
        CipherError::StreamCipherFailure { .. } => err.to_string(),
        CipherError::Cancelled => format!("{direction} was cancelled"),
        CipherError::Source(e) => format!("reading input: {e}"),
    }
}

// ── `safeshare encrypt` ────────────────────────────────────────────────────────

async fn cmd_encrypt(
    config: &SafeshareConfig,
    input: &Path,
    output: Option<&Path>,
    key: Option<&str>,
    identifier: Option<&str>,
    cancel: &CancellationToken,
) -> Result<()> {
    let size = tokio::fs::metadata(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?
        .len();
    config.upload.check_size(size)?;

    let token = match key {
        Some(k) => {
            safeshare_crypto::split_token(k)
                .map_err(|e| anyhow::anyhow!(describe_failure(Direction::Encrypt, &e)))?;
            k.to_string()
        }
        None => safeshare_crypto::generate_token(),
    };

    let file = tokio::fs::File::open(input)
        .await
        .with_context(|| format!("opening {}", input.display()))?;
    let mut source = StreamSource::from_reader(file, config.crypto.chunk_size);

    let pb = make_progress_bar("encrypt", &display_name(input))?;
    let result = safeshare_crypto::encrypt_stream(&token, &mut source, Some(size), cancel, |p| {
        report_progress(&pb, p)
    })
    .await;
    let ciphertext = finish_progress(&pb, Direction::Encrypt, result)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| encrypted_path(input));
    tokio::fs::write(&output, &ciphertext)
        .await
        .with_context(|| format!("writing {}", output.display()))?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        bytes = ciphertext.len(),
        "encrypted"
    );

    println!(
        "encrypted: {} ({}) -> {}",
        display_name(input),
        format_bytes(size),
        output.display()
    );
    println!("token:     {token}");
    if let Some(id) = identifier.filter(|_| config.upload.merge_key) {
        print_share(config, &token, id);
    }
    Ok(())
}

// ── `safeshare decrypt` ────────────────────────────────────────────────────────

async fn cmd_decrypt(
    config: &SafeshareConfig,
    input: &Path,
    output: Option<&Path>,
    token: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    let size = tokio::fs::metadata(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?
        .len();

    let file = tokio::fs::File::open(input)
        .await
        .with_context(|| format!("opening {}", input.display()))?;
    let mut source = StreamSource::from_reader(file, config.crypto.chunk_size);

    let pb = make_progress_bar("decrypt", &display_name(input))?;
    let result = safeshare_crypto::decrypt_stream(token, &mut source, Some(size), cancel, |p| {
        report_progress(&pb, p)
    })
    .await;
    let plaintext = finish_progress(&pb, Direction::Decrypt, result)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| decrypted_path(input));
    tokio::fs::write(&output, &plaintext)
        .await
        .with_context(|| format!("writing {}", output.display()))?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        bytes = plaintext.len(),
        "decrypted"
    );

    println!(
        "decrypted: {} ({}) -> {}",
        display_name(input),
        format_bytes(plaintext.len() as u64),
        output.display()
    );
    Ok(())
}

/// Cipher token from `--key`, or unpacked from a share token or link.
fn resolve_token(key: Option<String>, share: Option<&str>) -> Result<String> {
    if let Some(key) = key {
        return Ok(key);
    }
    let share = share.context("either --key or --share is required")?;
    let parts = safeshare_crypto::unpack(safeshare_crypto::parse_share_link(share))
        .context("Identifier format is invalid.")?;
    Ok(parts.token)
}

// ── `safeshare pack` / `safeshare unpack` ──────────────────────────────────────

fn cmd_pack(config: &SafeshareConfig, token: &str, identifier: &str) -> Result<()> {
    if let Err(e) = safeshare_crypto::split_token(token) {
        tracing::warn!("packing a token that will not decrypt: {e}");
    }
    print_share(config, token, identifier);
    Ok(())
}

fn cmd_unpack(share: &str) -> Result<()> {
    let parts = safeshare_crypto::unpack(safeshare_crypto::parse_share_link(share))
        .context("Identifier format is invalid.")?;
    println!("token:      {}", parts.token);
    println!("identifier: {}", parts.identifier);
    Ok(())
}

fn print_share(config: &SafeshareConfig, token: &str, identifier: &str) {
    let packed = safeshare_crypto::pack(token, identifier);
    println!("share:     {packed}");
    if let Some(base) = config.share.link_base.as_deref() {
        println!("link:      {}", safeshare_crypto::share_link(base, &packed));
    }
}

// ── `safeshare config show` ────────────────────────────────────────────────────

fn cmd_config_show(config: &SafeshareConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── Utilities ──────────────────────────────────────────────────────────────────

fn display_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    shorten_file_name(&name, 32)
}

fn encrypted_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".enc");
    PathBuf::from(name)
}

fn decrypted_path(input: &Path) -> PathBuf {
    if input.extension().is_some_and(|ext| ext == "enc") {
        input.with_extension("")
    } else {
        let mut name = OsString::from(input.as_os_str());
        name.push(".dec");
        PathBuf::from(name)
    }
}
