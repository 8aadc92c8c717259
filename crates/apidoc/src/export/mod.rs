//! Export of compiled function schemas.
//!
//! - **JSON**: the `funcs` array consumed by the documentation page
//! - **Script**: in-place injection of that array into the page's `script.js`

pub mod json;
pub mod script;

pub use json::{export_json, export_json_pretty};
pub use script::{inject_declaration, inject_into_file, DECLARATION_PREFIX};
