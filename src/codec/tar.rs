//! POSIX tar codec.
//!
//! Each regular-file entry's body becomes one single-part message;
//! directories and other entry types are skipped. Entry name and size are
//! attached as part metadata.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::sync::Arc;

use snafu::prelude::*;
use tar::Archive;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::ack::{AckTracker, MessageAck};
use crate::error::{CancelledSnafu, CodecError, SourceIoSnafu};
use crate::message::{Message, Part};
use crate::source::SourceReader;

use super::CodecReader;

pub(crate) struct TarReader {
    /// Consumed on the first `next` call; `tar::Entries` borrows the
    /// archive, so entries are drained in one pass and served as messages
    /// from the queue. Construction performs no reads.
    archive: Option<Archive<SourceReader>>,
    /// Underlying source, recovered after draining so close can release it.
    source: Option<SourceReader>,
    queue: VecDeque<Part>,
    tracker: Arc<AckTracker>,
    finished: bool,
}

impl TarReader {
    pub(crate) fn new(source: SourceReader, tracker: Arc<AckTracker>) -> Self {
        Self {
            archive: Some(Archive::new(source)),
            source: None,
            queue: VecDeque::new(),
            tracker,
            finished: false,
        }
    }

    fn drain(&mut self) -> Result<(), CodecError> {
        let Some(mut archive) = self.archive.take() else {
            return Ok(());
        };
        for entry in archive.entries().map_err(map_tar_err)? {
            let mut entry = entry.map_err(map_tar_err)?;
            let header = entry.header();
            if !header.entry_type().is_file() {
                debug!(kind = ?header.entry_type(), "skipping non-regular tar entry");
                continue;
            }
            let name = entry
                .path()
                .map(|path| path.display().to_string())
                .unwrap_or_default();
            let size = header.size().unwrap_or(0);
            let mut body = Vec::with_capacity(size as usize);
            entry.read_to_end(&mut body).map_err(map_tar_err)?;
            self.queue.push_back(
                Part::new(body)
                    .with_metadata("tar_name", name)
                    .with_metadata("tar_size", size.to_string()),
            );
        }
        self.source = Some(archive.into_inner());
        Ok(())
    }
}

impl CodecReader for TarReader {
    fn next(&mut self, shutdown: &CancellationToken) -> Result<(Message, MessageAck), CodecError> {
        if self.finished {
            return Err(CodecError::EndOfStream);
        }
        ensure!(!shutdown.is_cancelled(), CancelledSnafu);
        self.drain()?;

        match self.queue.pop_front() {
            Some(part) => {
                let ack = self.tracker.register();
                Ok((vec![part], ack))
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
        if let Some(archive) = self.archive.take() {
            self.source = Some(archive.into_inner());
        }
        if let Some(source) = self.source.as_mut() {
            source.close().context(SourceIoSnafu)?;
        }
        Ok(())
    }
}

/// The tar crate reports both genuine source failures and truncated or
/// corrupt archives as `io::Error`; header-level corruption surfaces as
/// malformed input, the rest as source errors.
fn map_tar_err(err: std::io::Error) -> CodecError {
    match err.kind() {
        ErrorKind::UnexpectedEof | ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            CodecError::MalformedInput {
                message: err.to_string(),
            }
        }
        _ => CodecError::SourceIo { source: err },
    }
}
