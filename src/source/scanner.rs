//! Bounded buffered scanning over a byte source.
//!
//! Shared by the hand-framed codecs (lines, delim, chunker, all-bytes,
//! regex segments). Extracted segments are owned copies, never views into
//! the scan buffer.

use std::io;

use snafu::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::error::{CancelledSnafu, CodecError, MalformedInputSnafu, SourceIoSnafu};
use crate::source::{ByteSource, ReadStatus};

const READ_CHUNK: usize = 8 * 1024;

pub(crate) struct SourceScanner {
    source: Box<dyn ByteSource>,
    buf: Vec<u8>,
    eof: bool,
    closed: bool,
    max_scan_size: usize,
}

impl SourceScanner {
    pub(crate) fn new(source: Box<dyn ByteSource>, max_scan_size: usize) -> Self {
        Self {
            source,
            buf: Vec::new(),
            eof: false,
            closed: false,
            max_scan_size,
        }
    }

    /// Perform one source read, appending to the scan buffer.
    fn fill(&mut self) -> Result<(), CodecError> {
        let mut chunk = [0u8; READ_CHUNK];
        let (n, status) = self.source.read(&mut chunk).context(SourceIoSnafu)?;
        self.buf.extend_from_slice(&chunk[..n]);
        if status == ReadStatus::End {
            self.eof = true;
        }
        Ok(())
    }

    /// Yield the bytes up to the next occurrence of `separator`, consuming
    /// the separator. The trailing fragment after the last separator is
    /// yielded as a final segment; `None` means the input is exhausted.
    pub(crate) fn next_segment(
        &mut self,
        separator: &[u8],
        shutdown: &CancellationToken,
    ) -> Result<Option<Vec<u8>>, CodecError> {
        debug_assert!(!separator.is_empty());
        let mut from = 0;
        loop {
            ensure!(!shutdown.is_cancelled(), CancelledSnafu);
            if let Some(i) = self.buf[from..]
                .windows(separator.len())
                .position(|window| window == separator)
            {
                let at = from + i;
                let segment = self.buf[..at].to_vec();
                self.buf.drain(..at + separator.len());
                return Ok(Some(segment));
            }
            if self.eof {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(std::mem::take(&mut self.buf)));
            }
            ensure!(
                self.buf.len() <= self.max_scan_size,
                MalformedInputSnafu {
                    message: format!(
                        "segment exceeds the {} byte scan limit",
                        self.max_scan_size
                    ),
                }
            );
            // Separator may straddle the refill boundary.
            from = self.buf.len().saturating_sub(separator.len() - 1);
            self.fill()?;
        }
    }

    /// Yield the next fixed-size chunk; the final chunk may be shorter.
    pub(crate) fn next_chunk(
        &mut self,
        size: usize,
        shutdown: &CancellationToken,
    ) -> Result<Option<Vec<u8>>, CodecError> {
        debug_assert!(size > 0);
        ensure!(!shutdown.is_cancelled(), CancelledSnafu);
        while self.buf.len() < size && !self.eof {
            ensure!(!shutdown.is_cancelled(), CancelledSnafu);
            self.fill()?;
        }
        if self.buf.is_empty() {
            return Ok(None);
        }
        let take = size.min(self.buf.len());
        let chunk = self.buf[..take].to_vec();
        self.buf.drain(..take);
        Ok(Some(chunk))
    }

    /// Drain the source to its end; `None` for an empty input.
    pub(crate) fn read_to_end(
        &mut self,
        shutdown: &CancellationToken,
    ) -> Result<Option<Vec<u8>>, CodecError> {
        ensure!(!shutdown.is_cancelled(), CancelledSnafu);
        while !self.eof {
            ensure!(!shutdown.is_cancelled(), CancelledSnafu);
            self.fill()?;
        }
        if self.buf.is_empty() {
            return Ok(None);
        }
        Ok(Some(std::mem::take(&mut self.buf)))
    }

    /// Close the underlying source. Idempotent.
    pub(crate) fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.source.close()
    }
}
