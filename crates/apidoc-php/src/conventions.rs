//! File header conventions of service files.

use apidoc::{DiagnosticKind, Reporter};
use regex::Regex;
use std::sync::OnceLock;

fn subpackage_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*\*\s*@subpackage\s+(\S+)").expect("valid regex"))
}

fn copyright_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*\*\s*@copyright\s+\S").expect("valid regex"))
}

/// Check the `@subpackage services_<group>` and `@copyright` doc tags.
///
/// Returns the number of problems reported.
pub fn check_header(src: &str, group: &str, reporter: &mut Reporter<'_>) -> usize {
    let mut problems = 0;
    let expected = format!("services_{group}");

    match subpackage_re().captures(src) {
        Some(caps) if &caps[1] == expected => {}
        Some(caps) => {
            reporter.report(
                DiagnosticKind::Convention,
                format!("Wrong @subpackage {}, expected {expected}", &caps[1]),
            );
            problems += 1;
        }
        None => {
            reporter.report(
                DiagnosticKind::Convention,
                format!("Missing @subpackage {expected}"),
            );
            problems += 1;
        }
    }

    if !copyright_re().is_match(src) {
        reporter.report(DiagnosticKind::Convention, "Missing @copyright");
        problems += 1;
    }

    problems
}
