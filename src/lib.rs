//! Squall: a streaming codec framework for byte streams.
//!
//! This crate turns an opaque byte source (a file, a network body, an
//! archive member) into a lazy sequence of messages, each carrying a
//! one-shot acknowledgement handle. It handles:
//! - Format dispatch and composition from codec spec strings
//!   (`lines`, `csv:|`, `gzip/tar`, `auto`, ...)
//! - Concurrency-safe acknowledgement tracking with out-of-order and
//!   parallel acks
//! - A uniform termination protocol that collapses per-message results
//!   into a single upstream signal
//!
//! ```no_run
//! use squall::{get_reader, CodecError, ReadSource, ReaderConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # fn demo() -> Result<(), CodecError> {
//! let ctor = get_reader("gzip/csv", ReaderConfig::default())?;
//! let source = Box::new(ReadSource::new(std::fs::File::open("rows.csv.gz").unwrap()));
//! let mut reader = ctor.create("rows.csv.gz", source, Box::new(|err| {
//!     if let Some(err) = err {
//!         eprintln!("stream failed: {err}");
//!     }
//! }))?;
//!
//! let shutdown = CancellationToken::new();
//! loop {
//!     match reader.next(&shutdown) {
//!         Ok((message, ack)) => {
//!             for part in &message {
//!                 println!("{}", String::from_utf8_lossy(part.as_bytes()));
//!             }
//!             ack.success();
//!         }
//!         Err(err) if err.is_end_of_stream() => break,
//!         Err(err) => return Err(err),
//!     }
//! }
//! reader.close()?;
//! # Ok(())
//! # }
//! ```

pub mod ack;
pub mod codec;
pub mod config;
pub mod error;
pub mod message;
pub mod source;

pub use ack::{AckTracker, MessageAck, TerminalFn, TerminalOutcome};
pub use codec::{CodecReader, ReaderCtor, get_reader};
pub use config::ReaderConfig;
pub use error::CodecError;
pub use message::{Message, Part};
pub use source::{ByteSource, ReadSource, ReadStatus};
