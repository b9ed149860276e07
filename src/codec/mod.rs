//! Codec readers: decode a byte source into an acknowledged message stream.
//!
//! A codec spec string (e.g. `csv`, `gzip/tar`, `chunker:64`) resolves to
//! a [`ReaderCtor`] via [`get_reader`]. The constructor builds a
//! [`CodecReader`] over an opened [`ByteSource`](crate::source::ByteSource);
//! the caller drives it with `next`, acknowledges every message, and
//! closes it. The terminal callback handed to the constructor fires
//! exactly once when the reader's lifecycle completes.

mod all_bytes;
mod auto;
mod chunker;
mod csv;
mod delim;
mod gzip;
mod multipart;
mod segment;
mod skipbom;
mod spec;
mod tar;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::ack::{AckTracker, MessageAck, TerminalFn};
use crate::config::ReaderConfig;
use crate::error::CodecError;
use crate::message::Message;
use crate::source::{ByteSource, SourceReader};
use crate::source::scanner::SourceScanner;

use self::all_bytes::AllBytesReader;
use self::chunker::ChunkerReader;
use self::csv::CsvReader;
use self::delim::DelimReader;
use self::gzip::GzipSource;
use self::multipart::MultipartReader;
use self::segment::SegmentReader;
use self::skipbom::SkipBomSource;
use self::spec::CodecKind;
use self::tar::TarReader;

/// A stateful decoder yielding messages from a byte source.
///
/// `next` is driven from a single consumer context; the acks it hands out
/// may resolve from any thread. Once `next` returns
/// [`CodecError::EndOfStream`] every later call returns it again, and
/// messages are yielded in underlying stream order.
pub trait CodecReader: Send {
    /// Yield the next message together with its one-shot ack handle.
    fn next(&mut self, shutdown: &CancellationToken) -> Result<(Message, MessageAck), CodecError>;

    /// Release the underlying source. Idempotent; closing before
    /// end-of-input delivers `ServiceShuttingDown` to the terminal
    /// callback.
    fn close(&mut self) -> Result<(), CodecError>;
}

/// A parsed, validated reader constructor for one codec spec.
///
/// Reusable: each `create` call builds an independent reader. Creation
/// allocates but never reads from the source.
pub struct ReaderCtor {
    kind: CodecKind,
    config: ReaderConfig,
}

impl ReaderCtor {
    /// Build a reader over `source`. `path` feeds `auto` suffix
    /// resolution; `terminal` fires exactly once when the reader's
    /// lifecycle completes.
    pub fn create(
        &self,
        path: &str,
        source: Box<dyn ByteSource>,
        terminal: TerminalFn,
    ) -> Result<Box<dyn CodecReader>, CodecError> {
        let tracker = AckTracker::new(terminal);
        build(&self.kind, path, source, tracker, &self.config)
    }
}

/// Resolve a codec spec string into a reader constructor.
///
/// The spec is fully validated here: unknown names and bad arguments fail
/// now, never at `create` time.
pub fn get_reader(spec: &str, config: ReaderConfig) -> Result<ReaderCtor, CodecError> {
    let kind = spec::parse(spec)?;
    debug!(spec, "resolved codec reader");
    Ok(ReaderCtor { kind, config })
}

fn build(
    kind: &CodecKind,
    path: &str,
    source: Box<dyn ByteSource>,
    tracker: Arc<AckTracker>,
    config: &ReaderConfig,
) -> Result<Box<dyn CodecReader>, CodecError> {
    let scan = |source: Box<dyn ByteSource>| SourceScanner::new(source, config.max_scan_size);
    Ok(match kind {
        CodecKind::Lines => Box::new(DelimReader::new(scan(source), tracker, b"\n".to_vec())),
        CodecKind::Delim { separator } => {
            Box::new(DelimReader::new(scan(source), tracker, separator.clone()))
        }
        CodecKind::MultipartLines => Box::new(MultipartReader::new(scan(source), tracker)),
        CodecKind::AllBytes => Box::new(AllBytesReader::new(scan(source), tracker)),
        CodecKind::Chunker { size } => {
            Box::new(ChunkerReader::new(scan(source), tracker, *size))
        }
        CodecKind::Segment { pattern } => Box::new(SegmentReader::new(
            scan(source),
            tracker,
            pattern.clone(),
        )),
        CodecKind::Csv { delimiter } => Box::new(CsvReader::new(
            SourceReader::new(source),
            tracker,
            *delimiter,
        )),
        CodecKind::Tar => Box::new(TarReader::new(SourceReader::new(source), tracker)),
        CodecKind::Gzip { inner } => {
            let decompressed = Box::new(GzipSource::new(source));
            return build(inner, path, decompressed, tracker, config);
        }
        CodecKind::SkipBom { inner } => {
            let stripped = Box::new(SkipBomSource::new(source));
            return build(inner, path, stripped, tracker, config);
        }
        CodecKind::Auto => {
            let resolved = auto::resolve(path);
            return build(&resolved, path, source, tracker, config);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ReadSource;
    use std::io::Cursor;
    use std::sync::Mutex;

    fn noop_terminal() -> TerminalFn {
        Box::new(|_err| {})
    }

    #[test]
    fn test_create_reads_messages_in_stream_order() {
        let ctor = get_reader("lines", ReaderConfig::default()).unwrap();
        let source = Box::new(ReadSource::new(Cursor::new(b"foo\nbar".to_vec())));
        let mut reader = ctor.create("", source, noop_terminal()).unwrap();

        let shutdown = CancellationToken::new();
        let (message, ack) = reader.next(&shutdown).unwrap();
        assert_eq!(message[0].as_bytes(), b"foo");
        ack.success();
        let (message, ack) = reader.next(&shutdown).unwrap();
        assert_eq!(message[0].as_bytes(), b"bar");
        ack.success();
        assert!(matches!(
            reader.next(&shutdown),
            Err(CodecError::EndOfStream)
        ));
        reader.close().unwrap();
    }

    #[test]
    fn test_ctor_is_reusable_across_streams() {
        let ctor = get_reader("chunker:2", ReaderConfig::default()).unwrap();
        let shutdown = CancellationToken::new();

        for input in [b"abcd".to_vec(), b"wxyz".to_vec()] {
            let fired = std::sync::Arc::new(Mutex::new(false));
            let flag = std::sync::Arc::clone(&fired);
            let source = Box::new(ReadSource::new(Cursor::new(input)));
            let mut reader = ctor
                .create(
                    "",
                    source,
                    Box::new(move |err| {
                        assert!(err.is_none());
                        *flag.lock().unwrap() = true;
                    }),
                )
                .unwrap();

            while let Ok((_message, ack)) = reader.next(&shutdown) {
                ack.success();
            }
            reader.close().unwrap();
            assert!(*fired.lock().unwrap());
        }
    }

    #[test]
    fn test_create_performs_no_reads() {
        struct ExplodingSource;
        impl crate::source::ByteSource for ExplodingSource {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<(usize, crate::source::ReadStatus)> {
                panic!("constructor must not read");
            }
            fn close(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        for spec in ["lines", "csv", "tar", "gzip/csv", "lines/multipart"] {
            let ctor = get_reader(spec, ReaderConfig::default()).unwrap();
            let reader = ctor.create("", Box::new(ExplodingSource), noop_terminal());
            assert!(reader.is_ok(), "construction read from the source: {spec}");
        }
    }
}
