//! Regex-delimited segment codec.
//!
//! `regex:<pattern>` consumes the stream line by line; a line matching the
//! pattern starts a new segment. Each emitted message is a single part
//! holding the segment's lines joined by `\n`, including the matching
//! line that opened it. Lines before the first match form the opening
//! segment.

use std::sync::Arc;

use regex::bytes::Regex;
use snafu::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::ack::{AckTracker, MessageAck};
use crate::error::{CodecError, SourceIoSnafu};
use crate::message::{Message, Part};
use crate::source::scanner::SourceScanner;

use super::CodecReader;

pub(crate) struct SegmentReader {
    scanner: SourceScanner,
    tracker: Arc<AckTracker>,
    pattern: Regex,
    /// Matched line that terminated the previous segment; it opens the
    /// next one.
    carry: Option<Vec<u8>>,
    finished: bool,
}

impl SegmentReader {
    pub(crate) fn new(scanner: SourceScanner, tracker: Arc<AckTracker>, pattern: Regex) -> Self {
        Self {
            scanner,
            tracker,
            pattern,
            carry: None,
            finished: false,
        }
    }
}

impl CodecReader for SegmentReader {
    fn next(&mut self, shutdown: &CancellationToken) -> Result<(Message, MessageAck), CodecError> {
        if self.finished {
            return Err(CodecError::EndOfStream);
        }
        let mut lines: Vec<Vec<u8>> = self.carry.take().into_iter().collect();
        loop {
            match self.scanner.next_segment(b"\n", shutdown)? {
                Some(line) => {
                    if self.pattern.is_match(&line) && !lines.is_empty() {
                        self.carry = Some(line);
                        let ack = self.tracker.register();
                        return Ok((vec![Part::new(lines.join(&b'\n'))], ack));
                    }
                    lines.push(line);
                }
                None => {
                    self.finished = true;
                    if lines.is_empty() {
                        self.tracker.mark_end();
                        return Err(CodecError::EndOfStream);
                    }
                    let ack = self.tracker.register();
                    self.tracker.mark_end();
                    return Ok((vec![Part::new(lines.join(&b'\n'))], ack));
                }
            }
        }
    }

    fn close(&mut self) -> Result<(), CodecError> {
        self.tracker.shutdown();
        self.scanner.close().context(SourceIoSnafu)
    }
}
