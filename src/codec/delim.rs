//! Delimiter-framed codec reader.
//!
//! Backs both `lines` (newline separator) and `delim:<sep>` (arbitrary
//! literal separator, possibly multi-byte). Every non-empty segment
//! becomes a single-part message; a trailing fragment without a final
//! separator is still emitted.

use std::sync::Arc;

use snafu::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::ack::{AckTracker, MessageAck};
use crate::error::{CodecError, SourceIoSnafu};
use crate::message::{Message, Part};
use crate::source::scanner::SourceScanner;

use super::CodecReader;

pub(crate) struct DelimReader {
    scanner: SourceScanner,
    tracker: Arc<AckTracker>,
    separator: Vec<u8>,
    finished: bool,
}

impl DelimReader {
    pub(crate) fn new(
        scanner: SourceScanner,
        tracker: Arc<AckTracker>,
        separator: Vec<u8>,
    ) -> Self {
        Self {
            scanner,
            tracker,
            separator,
            finished: false,
        }
    }
}

impl CodecReader for DelimReader {
    fn next(&mut self, shutdown: &CancellationToken) -> Result<(Message, MessageAck), CodecError> {
        if self.finished {
            return Err(CodecError::EndOfStream);
        }
        loop {
            match self.scanner.next_segment(&self.separator, shutdown)? {
                // Blank segments carry no payload.
                Some(segment) if segment.is_empty() => continue,
                Some(segment) => {
                    let ack = self.tracker.register();
                    return Ok((vec![Part::new(segment)], ack));
                }
                None => {
                    self.finished = true;
                    self.tracker.mark_end();
                    return Err(CodecError::EndOfStream);
                }
            }
        }
    }

    fn close(&mut self) -> Result<(), CodecError> {
        self.tracker.shutdown();
        self.scanner.close().context(SourceIoSnafu)
    }
}
