//! Gzip decompression layer.
//!
//! `gzip/<inner>` decompresses the byte source on the fly and hands the
//! plain bytes to the inner codec; the inner codec's lifecycle (acks,
//! end-of-input, close) is untouched. Concatenated gzip members are
//! decoded as one continuous stream.

use std::io::{self, Read};

use flate2::read::MultiGzDecoder;

use crate::source::{ByteSource, ReadStatus, SourceReader};

pub(crate) struct GzipSource {
    decoder: MultiGzDecoder<SourceReader>,
}

impl GzipSource {
    pub(crate) fn new(source: Box<dyn ByteSource>) -> Self {
        Self {
            decoder: MultiGzDecoder::new(SourceReader::new(source)),
        }
    }
}

impl ByteSource for GzipSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<(usize, ReadStatus)> {
        let n = self.decoder.read(buf)?;
        if n == 0 && !buf.is_empty() {
            Ok((0, ReadStatus::End))
        } else {
            Ok((n, ReadStatus::Open))
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.decoder.get_mut().close()
    }
}
