//! Codec spec string grammar.
//!
//! ```text
//! spec := atom ( '/' atom )*
//! atom := name ( ':' arg )?
//! ```
//!
//! Composition reads outer-to-inner left-to-right: `gzip/csv` is a gzip
//! layer over the csv codec. The first `:` in an atom starts its argument;
//! the remainder is taken verbatim, so separators like `delim:a/b` work.
//! Two historical spellings are kept for compatibility: `csv-gzip` and
//! `tar-gzip`.

use regex::bytes::Regex;
use snafu::prelude::*;

use crate::error::{CodecError, InvalidArgumentSnafu, UnknownCodecSnafu};

/// Parsed codec tree, built outside-in.
#[derive(Debug, Clone)]
pub(crate) enum CodecKind {
    Lines,
    MultipartLines,
    Csv { delimiter: u8 },
    AllBytes,
    Delim { separator: Vec<u8> },
    Chunker { size: usize },
    Tar,
    Segment { pattern: Regex },
    Gzip { inner: Box<CodecKind> },
    SkipBom { inner: Box<CodecKind> },
    Auto,
}

/// Parse and validate a codec spec string.
pub(crate) fn parse(spec: &str) -> Result<CodecKind, CodecError> {
    match spec {
        "csv-gzip" => {
            return Ok(CodecKind::Gzip {
                inner: Box::new(CodecKind::Csv { delimiter: b',' }),
            });
        }
        "tar-gzip" => {
            return Ok(CodecKind::Gzip {
                inner: Box::new(CodecKind::Tar),
            });
        }
        "lines/multipart" => return Ok(CodecKind::MultipartLines),
        _ => {}
    }
    if let Some(rest) = spec.strip_prefix("gzip/") {
        return Ok(CodecKind::Gzip {
            inner: Box::new(parse(rest)?),
        });
    }
    if let Some(rest) = spec.strip_prefix("skipbom/") {
        return Ok(CodecKind::SkipBom {
            inner: Box::new(parse(rest)?),
        });
    }
    parse_atom(spec)
}

fn parse_atom(atom: &str) -> Result<CodecKind, CodecError> {
    let (name, arg) = match atom.split_once(':') {
        Some((name, arg)) => (name, Some(arg)),
        None => (atom, None),
    };
    match name {
        "lines" => {
            no_arg(name, arg)?;
            Ok(CodecKind::Lines)
        }
        "csv" => {
            let delimiter = match arg {
                None => b',',
                Some(d) if d.len() == 1 => d.as_bytes()[0],
                Some(d) => {
                    return InvalidArgumentSnafu {
                        codec: name,
                        message: format!("delimiter must be a single byte, got {d:?}"),
                    }
                    .fail();
                }
            };
            Ok(CodecKind::Csv { delimiter })
        }
        "all-bytes" => {
            no_arg(name, arg)?;
            Ok(CodecKind::AllBytes)
        }
        "delim" => match arg {
            Some(sep) if !sep.is_empty() => Ok(CodecKind::Delim {
                separator: sep.as_bytes().to_vec(),
            }),
            _ => InvalidArgumentSnafu {
                codec: name,
                message: "a non-empty separator is required",
            }
            .fail(),
        },
        "chunker" => {
            let size = arg
                .and_then(|raw| raw.parse::<usize>().ok())
                .filter(|size| *size > 0)
                .context(InvalidArgumentSnafu {
                    codec: name,
                    message: "chunk size must be a positive integer",
                })?;
            Ok(CodecKind::Chunker { size })
        }
        "tar" => {
            no_arg(name, arg)?;
            Ok(CodecKind::Tar)
        }
        "regex" => {
            let raw = arg.filter(|raw| !raw.is_empty()).context(InvalidArgumentSnafu {
                codec: name,
                message: "a pattern is required",
            })?;
            let pattern = Regex::new(raw).map_err(|e| CodecError::InvalidArgument {
                codec: name.to_string(),
                message: e.to_string(),
            })?;
            Ok(CodecKind::Segment { pattern })
        }
        "auto" => {
            no_arg(name, arg)?;
            Ok(CodecKind::Auto)
        }
        // These only make sense layered over an inner codec.
        "gzip" | "skipbom" => InvalidArgumentSnafu {
            codec: name,
            message: "an inner codec is required, e.g. gzip/lines",
        }
        .fail(),
        _ => UnknownCodecSnafu { name: atom }.fail(),
    }
}

fn no_arg(name: &str, arg: Option<&str>) -> Result<(), CodecError> {
    ensure!(
        arg.is_none(),
        InvalidArgumentSnafu {
            codec: name,
            message: "this codec takes no argument",
        }
    );
    Ok(())
}
