//! Multipart line grouping.
//!
//! `lines/multipart` collects consecutive non-empty lines into one
//! multi-part message; a blank line terminates the group. A final group
//! without a trailing blank line is still emitted.

use std::sync::Arc;

use snafu::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::ack::{AckTracker, MessageAck};
use crate::error::{CodecError, SourceIoSnafu};
use crate::message::{Message, Part};
use crate::source::scanner::SourceScanner;

use super::CodecReader;

pub(crate) struct MultipartReader {
    scanner: SourceScanner,
    tracker: Arc<AckTracker>,
    finished: bool,
}

impl MultipartReader {
    pub(crate) fn new(scanner: SourceScanner, tracker: Arc<AckTracker>) -> Self {
        Self {
            scanner,
            tracker,
            finished: false,
        }
    }
}

impl CodecReader for MultipartReader {
    fn next(&mut self, shutdown: &CancellationToken) -> Result<(Message, MessageAck), CodecError> {
        if self.finished {
            return Err(CodecError::EndOfStream);
        }
        let mut parts: Message = Vec::new();
        loop {
            match self.scanner.next_segment(b"\n", shutdown)? {
                Some(line) if line.is_empty() => {
                    if !parts.is_empty() {
                        let ack = self.tracker.register();
                        return Ok((parts, ack));
                    }
                }
                Some(line) => parts.push(Part::new(line)),
                None => {
                    self.finished = true;
                    if parts.is_empty() {
                        self.tracker.mark_end();
                        return Err(CodecError::EndOfStream);
                    }
                    // The trailing group goes out with end-of-input; the
                    // ack is registered first so the terminal waits on it.
                    let ack = self.tracker.register();
                    self.tracker.mark_end();
                    return Ok((parts, ack));
                }
            }
        }
    }

    fn close(&mut self) -> Result<(), CodecError> {
        self.tracker.shutdown();
        self.scanner.close().context(SourceIoSnafu)
    }
}
