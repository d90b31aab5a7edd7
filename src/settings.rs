//! Generation settings, read from the `settings` section of a declaration file.

use crate::error_catalog::ErrorSpec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Render decimals as strings (`format: decimal`) instead of numbers
    pub coerce_decimal_to_string: bool,

    /// Seed making every generated example reproducible
    pub example_seed: Option<String>,

    /// Wrap non-list result shapes in a `<Name>Result` envelope
    pub wrap_result: bool,

    /// Names of errors documented on every resource; `None` keeps the defaults
    pub common_errors: Option<Vec<String>>,

    /// Errors added to (or replacing entries of) the standard catalog
    pub errors: Vec<ErrorSpec>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            coerce_decimal_to_string: true,
            example_seed: None,
            wrap_result: false,
            common_errors: None,
            errors: Vec::new(),
        }
    }
}
