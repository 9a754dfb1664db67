//! Stream cipher engine: whole-file encrypt/decrypt over a chunk source
//!
//! Each call is independent: it owns its transform and output buffer, pulls
//! the source strictly in order, reports progress after every non-empty
//! chunk and returns the fully materialized output.
//!
//! Progress is `input_bytes_consumed / total_size * 100`, neither clamped nor
//! rounded. Finalization emits no progress event.

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CipherError;
use crate::keys::{split_token, KeyMaterial};
use crate::source::ChunkSource;
use crate::transform::{CbcTransform, Direction};
use crate::BLOCK_SIZE;

/// Upper bound on the output buffer reserved up front from `total_size`.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Encrypt everything `source` yields under `token`.
///
/// `total_size` is the plaintext size; `None` or zero fails with
/// [`CipherError::UnknownLength`] before any chunk is read.
pub async fn encrypt_stream<S, P>(
    token: &str,
    source: &mut S,
    total_size: Option<u64>,
    cancel: &CancellationToken,
    on_progress: P,
) -> Result<Bytes, CipherError>
where
    S: ChunkSource,
    P: FnMut(f64),
{
    transform_stream(Direction::Encrypt, token, source, total_size, cancel, on_progress).await
}

/// Decrypt everything `source` yields under `token`.
///
/// `total_size` is the ciphertext size (e.g. a content-length header).
pub async fn decrypt_stream<S, P>(
    token: &str,
    source: &mut S,
    total_size: Option<u64>,
    cancel: &CancellationToken,
    on_progress: P,
) -> Result<Bytes, CipherError>
where
    S: ChunkSource,
    P: FnMut(f64),
{
    transform_stream(Direction::Decrypt, token, source, total_size, cancel, on_progress).await
}

/// Run one stream through AES-256-CBC in `direction`.
///
/// The source is released exactly once on every exit path, including when
/// the returned future is dropped before completion.
pub async fn transform_stream<S, P>(
    direction: Direction,
    token: &str,
    source: &mut S,
    total_size: Option<u64>,
    cancel: &CancellationToken,
    mut on_progress: P,
) -> Result<Bytes, CipherError>
where
    S: ChunkSource,
    P: FnMut(f64),
{
    let mut lease = Lease { source };

    let total = match total_size {
        Some(n) if n > 0 => n,
        _ => return Err(CipherError::UnknownLength),
    };

    let split = split_token(token)?;
    let material = KeyMaterial::decode(&split).map_err(|fault| {
        warn!(%direction, error = %fault, "cipher token rejected");
        CipherError::failure(direction, fault)
    })?;
    let mut transform = CbcTransform::new(direction, &material);

    debug!(%direction, total_size = total, "stream transform started");

    let mut output = Vec::with_capacity((total.min(MAX_PREALLOC) as usize) + BLOCK_SIZE);
    let mut processed: u64 = 0;
    let mut chunks: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%direction, processed, "stream transform cancelled");
                return Err(CipherError::Cancelled);
            }
            next = lease.source.next_chunk() => next,
        };

        let chunk = match next {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                warn!(%direction, processed, error = %e, "source read failed");
                return Err(CipherError::Source(e));
            }
        };
        if chunk.is_empty() {
            continue;
        }

        transform.update(&chunk, &mut output);
        processed += chunk.len() as u64;
        chunks += 1;
        on_progress(processed as f64 / total as f64 * 100.0);
    }

    transform.finalize(&mut output).map_err(|fault| {
        warn!(%direction, processed, error = %fault, "stream finalization failed");
        CipherError::failure(direction, fault)
    })?;

    debug!(
        %direction,
        processed,
        chunks,
        output_bytes = output.len(),
        "stream transform finished"
    );

    Ok(Bytes::from(output))
}

/// Releases the borrowed source when dropped.
struct Lease<'a, S: ChunkSource> {
    source: &'a mut S,
}

impl<S: ChunkSource> Drop for Lease<'_, S> {
    fn drop(&mut self) {
        self.source.release();
    }
}
