//! Initial presentation settings. The viewer can change these at
//! runtime; the file only provides the starting point.

use serde::{Deserialize, Serialize};

/// Column names accepted by `sort_column`, in display order.
pub const SORT_COLUMN_NAMES: [&str; 9] = [
    "protocol", "src", "dst", "dscp", "bytes", "packets", "avgPps", "maxPps", "avgBps",
];

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Column to sort by when the viewer starts
    pub sort_column: String,
    /// Sort direction when the viewer starts
    pub sort_descending: bool,
    /// Filter text applied when the viewer starts
    pub filter: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            sort_column: "bytes".to_string(),
            sort_descending: true,
            filter: String::new(),
        }
    }
}
