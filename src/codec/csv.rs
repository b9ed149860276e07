//! CSV codec.
//!
//! The first record is the header; every following record becomes a
//! single-part message whose payload is a JSON object mapping header
//! names, in header order, to that row's values. Values are emitted as
//! JSON strings with no type inference. Quoting follows the standard
//! dialect (double quotes, `""` as an escaped quote).

use std::sync::Arc;

use csv::ByteRecord;
use serde_json::Value;
use snafu::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::ack::{AckTracker, MessageAck};
use crate::error::{CancelledSnafu, CodecError, MalformedInputSnafu, SourceIoSnafu};
use crate::message::{Message, Part};
use crate::source::SourceReader;

use super::CodecReader;

pub(crate) struct CsvReader {
    /// Taken on close so the underlying source can be released.
    reader: Option<csv::Reader<SourceReader>>,
    headers: Option<Vec<String>>,
    record: ByteRecord,
    tracker: Arc<AckTracker>,
    finished: bool,
}

impl CsvReader {
    pub(crate) fn new(source: SourceReader, tracker: Arc<AckTracker>, delimiter: u8) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(source);
        Self {
            reader: Some(reader),
            headers: None,
            record: ByteRecord::new(),
            tracker,
            finished: false,
        }
    }
}

impl CodecReader for CsvReader {
    fn next(&mut self, shutdown: &CancellationToken) -> Result<(Message, MessageAck), CodecError> {
        if self.finished {
            return Err(CodecError::EndOfStream);
        }
        ensure!(!shutdown.is_cancelled(), CancelledSnafu);
        let Some(reader) = self.reader.as_mut() else {
            return Err(CodecError::EndOfStream);
        };

        if self.headers.is_none() {
            let raw = reader.byte_headers().map_err(map_csv_err)?;
            let headers = raw
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect();
            self.headers = Some(headers);
        }

        if !reader
            .read_byte_record(&mut self.record)
            .map_err(map_csv_err)?
        {
            self.finished = true;
            self.tracker.mark_end();
            return Err(CodecError::EndOfStream);
        }

        let headers = self.headers.as_deref().expect("headers read before records");
        // Header order is preserved in the emitted object.
        let mut object = serde_json::Map::with_capacity(headers.len());
        for (name, field) in headers.iter().zip(self.record.iter()) {
            object.insert(
                name.clone(),
                Value::String(String::from_utf8_lossy(field).into_owned()),
            );
        }
        let payload = serde_json::to_vec(&Value::Object(object)).map_err(|e| {
            MalformedInputSnafu {
                message: e.to_string(),
            }
            .build()
        })?;

        let ack = self.tracker.register();
        Ok((vec![Part::new(payload)], ack))
    }

    fn close(&mut self) -> Result<(), CodecError> {
        self.tracker.shutdown();
        if let Some(reader) = self.reader.take() {
            reader.into_inner().close().context(SourceIoSnafu)?;
        }
        Ok(())
    }
}

fn map_csv_err(err: csv::Error) -> CodecError {
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(source) => CodecError::SourceIo { source },
            other => CodecError::MalformedInput {
                message: format!("{other:?}"),
            },
        }
    } else {
        CodecError::MalformedInput {
            message: err.to_string(),
        }
    }
}
