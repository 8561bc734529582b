//! Runtime options

use serde::{Deserialize, Serialize};

/// Behavior switches of a [`HeapRuntime`](crate::HeapRuntime)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeOptions {
    /// Nesting limit for JSON encoding; deeper values (or cycles) are a
    /// `RangeError`
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Throw a `TypeError` when a proxy's `set` trap refuses an assignment
    /// instead of ignoring it
    #[serde(default)]
    pub strict: bool,

    /// Largest length an array may grow to through an index assignment;
    /// writing past it is a `RangeError`
    #[serde(default = "default_max_array_length")]
    pub max_array_length: usize,
}

fn default_max_depth() -> usize {
    64
}

fn default_max_array_length() -> usize {
    1 << 24
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            strict: false,
            max_array_length: default_max_array_length(),
        }
    }
}
