//! UTF-8 BOM stripping layer.
//!
//! `skipbom/<inner>` removes a leading byte-order mark from the stream
//! before the inner codec sees it. Bytes that merely resemble a BOM
//! prefix are passed through untouched.

use std::io;

use crate::source::{ByteSource, ReadStatus};

const BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub(crate) struct SkipBomSource {
    source: Box<dyn ByteSource>,
    /// Probed bytes not yet handed to the reader.
    pending: Vec<u8>,
    checked: bool,
    /// Source signalled end-of-input while probing.
    end_after_pending: bool,
}

impl SkipBomSource {
    pub(crate) fn new(source: Box<dyn ByteSource>) -> Self {
        Self {
            source,
            pending: Vec::new(),
            checked: false,
            end_after_pending: false,
        }
    }

    fn probe(&mut self) -> io::Result<()> {
        self.checked = true;
        while self.pending.len() < BOM.len() && !self.end_after_pending {
            let mut chunk = [0u8; 3];
            let want = BOM.len() - self.pending.len();
            let (n, status) = self.source.read(&mut chunk[..want])?;
            self.pending.extend_from_slice(&chunk[..n]);
            if status == ReadStatus::End {
                self.end_after_pending = true;
            }
        }
        if self.pending.starts_with(BOM) {
            self.pending.drain(..BOM.len());
        }
        Ok(())
    }
}

impl ByteSource for SkipBomSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<(usize, ReadStatus)> {
        if !self.checked {
            self.probe()?;
        }
        if !self.pending.is_empty() {
            let n = buf.len().min(self.pending.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            let status = if self.pending.is_empty() && self.end_after_pending {
                ReadStatus::End
            } else {
                ReadStatus::Open
            };
            return Ok((n, status));
        }
        if self.end_after_pending {
            return Ok((0, ReadStatus::End));
        }
        self.source.read(buf)
    }

    fn close(&mut self) -> io::Result<()> {
        self.source.close()
    }
}
