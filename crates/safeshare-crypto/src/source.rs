//! Read-once chunk sources for the stream engine
//!
//! A source yields variable-length chunks until it returns `Ok(None)`, and
//! owns some underlying resource (file handle, response body) that
//! `release` gives back. `release` must be idempotent; after it, the source
//! reports end-of-stream.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// A lazy, finite, non-restartable sequence of byte chunks.
#[allow(async_fn_in_trait)]
pub trait ChunkSource {
    /// Pull the next chunk; `Ok(None)` signals end-of-stream.
    async fn next_chunk(&mut self) -> std::io::Result<Option<Bytes>>;

    /// Release the underlying resource. Safe to call more than once.
    fn release(&mut self);
}

/// [`ChunkSource`] over any `Stream` of byte chunks.
pub struct StreamSource<S> {
    inner: Option<S>,
}

impl<S> StreamSource<S>
where
    S: Stream<Item = std::io::Result<Bytes>> + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            inner: Some(stream),
        }
    }

    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }
}

impl<R: AsyncRead + Unpin> StreamSource<ReaderStream<R>> {
    /// Read `reader` in chunks of at most `chunk_size` bytes.
    pub fn from_reader(reader: R, chunk_size: usize) -> Self {
        Self::new(ReaderStream::with_capacity(reader, chunk_size.max(1)))
    }
}

impl StreamSource<futures::stream::Iter<std::vec::IntoIter<std::io::Result<Bytes>>>> {
    /// In-memory source yielding `chunks` in order.
    pub fn from_chunks(chunks: Vec<Bytes>) -> Self {
        let items: Vec<std::io::Result<Bytes>> = chunks.into_iter().map(Ok).collect();
        Self::new(futures::stream::iter(items))
    }
}

impl<S> ChunkSource for StreamSource<S>
where
    S: Stream<Item = std::io::Result<Bytes>> + Unpin,
{
    async fn next_chunk(&mut self) -> std::io::Result<Option<Bytes>> {
        match self.inner.as_mut() {
            Some(stream) => stream.next().await.transpose(),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.inner = None;
    }
}
