//! Reader configuration.

use serde::Deserialize;

/// One mebibyte.
pub const MB: usize = 1024 * 1024;

fn default_max_scan_size() -> usize {
    16 * MB
}

/// Configuration shared by all codec readers.
#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    /// Upper bound on a single delimited segment, in bytes. A stream that
    /// runs this long without a separator is treated as malformed rather
    /// than buffered without limit.
    #[serde(default = "default_max_scan_size")]
    pub max_scan_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_scan_size: default_max_scan_size(),
        }
    }
}
