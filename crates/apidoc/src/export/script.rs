//! Injection of the exported JSON into the documentation page script.

use crate::{ApidocError, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Line prefix of the declaration that gets replaced
pub const DECLARATION_PREFIX: &str = "const funcs = ";

/// Replace every `const funcs = ...` line in `script` with the given JSON.
///
/// Returns `None` when the script has no such line.
pub fn inject_declaration(script: &str, json: &str) -> Option<String> {
    let mut replaced = false;
    let lines: Vec<String> = script
        .lines()
        .map(|line| {
            if line.starts_with(DECLARATION_PREFIX) {
                replaced = true;
                format!("{DECLARATION_PREFIX}{json}")
            } else {
                line.to_string()
            }
        })
        .collect();

    replaced.then(|| lines.join("\n"))
}

/// Rewrite the script file at `path` in place
pub fn inject_into_file(path: &Path, json: &str) -> Result<()> {
    let script = fs::read_to_string(path).map_err(|e| ApidocError::io(path, e))?;
    let updated =
        inject_declaration(&script, json).ok_or_else(|| ApidocError::MissingDeclaration {
            path: path.to_path_buf(),
            marker: DECLARATION_PREFIX.trim_end().to_string(),
        })?;

    fs::write(path, updated).map_err(|e| ApidocError::io(path, e))?;
    debug!(path = %path.display(), bytes = json.len(), "injected function declarations");
    Ok(())
}
