//! Async adapters that feed a [`Parser`] from a reader or a byte stream.

use super::Parser;
use crate::{Result, manifest::Manifest};
use futures::{Stream, StreamExt};
use std::io;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Bytes requested from a reader per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

impl Parser {
    /// Push everything `reader` yields, `chunk_size` bytes at a time.
    ///
    /// Does not call [`Parser::end`].
    pub async fn read_from<R>(&mut self, reader: R, chunk_size: usize) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let stream = ReaderStream::with_capacity(reader, chunk_size.max(1));
        self.consume_stream(stream).await
    }

    /// Push every chunk of `stream` as it arrives. Stops at the first I/O
    /// error; whatever was parsed so far stays in the manifest.
    ///
    /// Does not call [`Parser::end`].
    pub async fn consume_stream<S, B>(&mut self, stream: S) -> Result<()>
    where
        S: Stream<Item = io::Result<B>>,
        B: AsRef<[u8]>,
    {
        let mut stream = std::pin::pin!(stream);
        let mut total = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            total += chunk.as_ref().len();
            self.push(chunk);
        }

        tracing::debug!("Pushed {} bytes", total);
        Ok(())
    }
}

/// Parse a whole playlist from `reader`.
pub async fn parse_reader<R>(parser: Parser, reader: R, chunk_size: usize) -> Result<Manifest>
where
    R: AsyncRead + Unpin,
{
    let mut parser = parser;
    parser.read_from(reader, chunk_size).await?;
    parser.end();
    Ok(parser.into_manifest())
}
