//! Byte source abstraction consumed by codec readers.
//!
//! A [`ByteSource`] is the already-opened input handed to a reader
//! constructor: sequential reads plus an idempotent close. Unlike
//! `std::io::Read`, a source can deliver its final bytes and the
//! end-of-input signal in a single call, exactly like a POSIX read that
//! drains the tail of a file.

pub(crate) mod scanner;

use std::io::{self, Read};

/// Status of a single source read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// More input may follow.
    Open,
    /// The source is exhausted; any bytes returned alongside this status
    /// are the final ones.
    End,
}

/// Sequential byte input with an idempotent close.
///
/// A read into a non-empty buffer returns at least one byte unless the
/// status is [`ReadStatus::End`]. Codecs must surface every byte returned
/// with `End` before reporting end-of-stream.
pub trait ByteSource: Send {
    /// Read up to `buf.len()` bytes.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<(usize, ReadStatus)>;

    /// Release the input. Safe to call more than once.
    fn close(&mut self) -> io::Result<()>;
}

/// Adapter presenting any `std::io::Read` value as a [`ByteSource`].
///
/// Close is a no-op; callers that need resource release should implement
/// [`ByteSource`] directly.
pub struct ReadSource<R> {
    inner: R,
}

impl<R: Read + Send> ReadSource<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read + Send> ByteSource for ReadSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<(usize, ReadStatus)> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            Ok((0, ReadStatus::End))
        } else {
            Ok((n, ReadStatus::Open))
        }
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The inverse adapter: presents a boxed [`ByteSource`] as `std::io::Read`
/// with a sticky end-of-input flag, so crate-based decoders (csv, tar,
/// flate2) can consume a source directly. The data-with-EOF case is
/// preserved: the final bytes are returned first and the following read
/// reports zero.
pub(crate) struct SourceReader {
    source: Box<dyn ByteSource>,
    eof: bool,
    closed: bool,
}

impl SourceReader {
    pub(crate) fn new(source: Box<dyn ByteSource>) -> Self {
        Self {
            source,
            eof: false,
            closed: false,
        }
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

impl Read for SourceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.eof || buf.is_empty() {
            return Ok(0);
        }
        let (n, status) = self.source.read(buf)?;
        if status == ReadStatus::End {
            self.eof = true;
        }
        Ok(n)
    }
}
