//! Error types for the squall codec framework.

use snafu::prelude::*;

/// Errors produced while constructing or driving a codec reader.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CodecError {
    /// Requested codec name is not registered.
    #[snafu(display("unknown codec type: {name}"))]
    UnknownCodec { name: String },

    /// Codec spec argument failed validation at construction time.
    #[snafu(display("invalid argument for codec {codec}: {message}"))]
    InvalidArgument { codec: String, message: String },

    /// Codec-level parse failure; the reader is terminal afterwards but
    /// must still be closed.
    #[snafu(display("malformed input: {message}"))]
    MalformedInput { message: String },

    /// Read failure from the underlying byte source.
    #[snafu(display("failed to read from source: {source}"))]
    SourceIo { source: std::io::Error },

    /// Sentinel returned by `next` once the input is exhausted. Not a
    /// failure; every call after the first returns it again.
    #[snafu(display("end of stream"))]
    EndOfStream,

    /// The reader was closed before its input was exhausted.
    #[snafu(display("service shutting down"))]
    ServiceShuttingDown,

    /// The operation observed a cancelled shutdown token.
    #[snafu(display("operation cancelled"))]
    Cancelled,

    /// Consumer-supplied rejection carried through an ack.
    #[snafu(display("{message}"))]
    Rejected { message: String },
}

impl CodecError {
    /// Check whether this is the end-of-stream sentinel rather than a
    /// genuine failure.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, CodecError::EndOfStream)
    }
}
