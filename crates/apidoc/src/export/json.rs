//! JSON format export for the documentation page.
//!
//! Every function becomes one object with its registry metadata plus
//! `parameters` and `returns` schemas; an absent schema is `null`.

use crate::{FunctionSchema, Result};

/// Export functions as compact JSON, suitable for a single script line
pub fn export_json(functions: &[FunctionSchema]) -> Result<String> {
    Ok(serde_json::to_string(functions)?)
}

/// Export functions as indented JSON
pub fn export_json_pretty(functions: &[FunctionSchema]) -> Result<String> {
    Ok(serde_json::to_string_pretty(functions)?)
}
