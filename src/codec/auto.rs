//! Path-based codec selection.
//!
//! The `auto` codec inspects a path's suffixes right-to-left and builds
//! the matching codec chain: a compression suffix prepends a gzip layer,
//! the remaining suffix picks the container codec, and anything
//! unrecognized falls through to plain lines.

use tracing::debug;

use super::spec::CodecKind;

/// Resolve a path to a concrete codec chain.
///
/// `foo.csv` → csv, `foo.tar` → tar, `foo.tar.gz` → gzip/tar,
/// `foo.tgz` → gzip/tar, anything else → lines.
pub(crate) fn resolve(path: &str) -> CodecKind {
    let name = path.to_ascii_lowercase();

    let (name, gzipped) = if let Some(stripped) = name.strip_suffix(".gz") {
        (stripped.to_string(), true)
    } else if let Some(stripped) = name.strip_suffix(".gzip") {
        (stripped.to_string(), true)
    } else if let Some(stripped) = name.strip_suffix(".tgz") {
        (format!("{stripped}.tar"), true)
    } else {
        (name, false)
    };

    let inner = if name.ends_with(".tar") {
        CodecKind::Tar
    } else if name.ends_with(".csv") {
        CodecKind::Csv { delimiter: b',' }
    } else {
        CodecKind::Lines
    };

    let resolved = if gzipped {
        CodecKind::Gzip {
            inner: Box::new(inner),
        }
    } else {
        inner
    };
    debug!(path, codec = ?resolved, "resolved codec from path suffix");
    resolved
}
