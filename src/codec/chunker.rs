//! Fixed-size chunking codec.

use std::sync::Arc;

use snafu::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::ack::{AckTracker, MessageAck};
use crate::error::{CodecError, SourceIoSnafu};
use crate::message::{Message, Part};
use crate::source::scanner::SourceScanner;

use super::CodecReader;

/// Yields consecutive chunks of exactly `size` bytes; the final chunk may
/// be shorter. Empty input yields no messages.
pub(crate) struct ChunkerReader {
    scanner: SourceScanner,
    tracker: Arc<AckTracker>,
    size: usize,
    finished: bool,
}

impl ChunkerReader {
    pub(crate) fn new(scanner: SourceScanner, tracker: Arc<AckTracker>, size: usize) -> Self {
        Self {
            scanner,
            tracker,
            size,
            finished: false,
        }
    }
}

impl CodecReader for ChunkerReader {
    fn next(&mut self, shutdown: &CancellationToken) -> Result<(Message, MessageAck), CodecError> {
        if self.finished {
            return Err(CodecError::EndOfStream);
        }
        match self.scanner.next_chunk(self.size, shutdown)? {
            Some(chunk) => {
                let ack = self.tracker.register();
                Ok((vec![Part::new(chunk)], ack))
            }
            None => {
                self.finished = true;
                self.tracker.mark_end();
                Err(CodecError::EndOfStream)
            }
        }
    }

    fn close(&mut self) -> Result<(), CodecError> {
        self.tracker.shutdown();
        self.scanner.close().context(SourceIoSnafu)
    }
}
