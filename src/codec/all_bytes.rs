//! Whole-stream codec.

use std::sync::Arc;

use snafu::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::ack::{AckTracker, MessageAck};
use crate::error::{CodecError, SourceIoSnafu};
use crate::message::{Message, Part};
use crate::source::scanner::SourceScanner;

use super::CodecReader;

/// Reads the entire input into one single-part message. Empty input
/// yields no messages.
pub(crate) struct AllBytesReader {
    scanner: SourceScanner,
    tracker: Arc<AckTracker>,
    finished: bool,
}

impl AllBytesReader {
    pub(crate) fn new(scanner: SourceScanner, tracker: Arc<AckTracker>) -> Self {
        Self {
            scanner,
            tracker,
            finished: false,
        }
    }
}

impl CodecReader for AllBytesReader {
    fn next(&mut self, shutdown: &CancellationToken) -> Result<(Message, MessageAck), CodecError> {
        if self.finished {
            return Err(CodecError::EndOfStream);
        }
        match self.scanner.read_to_end(shutdown)? {
            Some(data) => {
                self.finished = true;
                let ack = self.tracker.register();
                self.tracker.mark_end();
                Ok((vec![Part::new(data)], ack))
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
