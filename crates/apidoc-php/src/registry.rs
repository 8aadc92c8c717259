//! Function discovery from the plugin's `db/services.php` registry.

use apidoc::{DiagnosticKind, Diagnostics, FunctionInfo};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};
use walkdir::WalkDir;

fn noise_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"//.*|<\?php|defined\(.*\)\s*\|\|\s*die\(\);").expect("valid regex")
    })
}

fn field_re(field: &str) -> Regex {
    let pattern = format!(r"'{}'\s*=>\s*'((?:[^'\\]|\\.)*)'", regex::escape(field));
    Regex::new(&pattern).expect("valid regex")
}

fn classpath_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]+/[^/]+/").expect("valid regex"))
}

/// Read every `'<component>_<group>_<name>' => [...]` entry of the registry.
///
/// Entries missing a capability list, description or class path are reported
/// and left out.
pub fn scan_registry(
    source: &str,
    component: &str,
    diagnostics: &mut Diagnostics,
) -> Vec<FunctionInfo> {
    let cleaned = noise_re().replace_all(source, "");
    let entry_re = match Regex::new(&format!(
        r"(?s)'({}_(\w+?)_(\w+))'\s*=>\s*\[(.*?)\],",
        regex::escape(component)
    )) {
        Ok(re) => re,
        Err(e) => {
            diagnostics.record(
                DiagnosticKind::Extraction,
                format!("Invalid component name {component}: {e}"),
                None,
            );
            return Vec::new();
        }
    };

    let capabilities_re = field_re("capabilities");
    let description_re = field_re("description");
    let classpath_re = field_re("classpath");

    let mut functions = Vec::new();
    for caps in entry_re.captures_iter(&cleaned) {
        let key = &caps[1];
        let body = &caps[4];

        let capabilities = capabilities_re
            .captures(body)
            .map(|c| parse_capabilities(&c[1]));
        let description = description_re
            .captures(body)
            .map(|c| c[1].replace("\\'", "'"));
        let classpath = classpath_re
            .captures(body)
            .map(|c| classpath_prefix_re().replace(&c[1], "").into_owned());

        match (capabilities, description, classpath) {
            (Some(capabilities), Some(description), Some(path)) => {
                debug!(function = key, "found registry entry");
                functions.push(
                    FunctionInfo::new(&caps[3], &caps[2], path)
                        .with_capabilities(capabilities)
                        .with_description(description),
                );
            }
            _ => diagnostics.record(
                DiagnosticKind::Extraction,
                format!("Could not gather all info for {key}"),
                Some(body.trim().to_string()),
            ),
        }
    }

    if functions.is_empty() {
        diagnostics.record(
            DiagnosticKind::Extraction,
            "Couldn't find any functions!",
            None,
        );
    } else {
        info!(count = functions.len(), "scanned service registry");
    }
    functions
}

/// `'local/lb_planner:student, local/lb_planner:teacher'` -> `["student", "teacher"]`
fn parse_capabilities(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|cap| !cap.is_empty())
        .map(|cap| cap.rsplit(':').next().unwrap_or(cap).to_string())
        .collect()
}

/// All `*.php` files below `services_dir`, relative to `root`, sorted
pub fn list_service_files(root: &Path, services_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(services_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "php"))
        .map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_path_buf()
        })
        .collect();
    files.sort();
    files
}

/// Report registry entries without a file, and files without a registry entry.
///
/// Returns the registered paths that are missing on disk.
pub fn cross_check(
    functions: &[FunctionInfo],
    service_files: &[PathBuf],
    diagnostics: &mut Diagnostics,
) -> BTreeSet<PathBuf> {
    let registered: BTreeSet<&Path> = functions.iter().map(|f| f.path.as_path()).collect();
    let on_disk: BTreeSet<&Path> = service_files.iter().map(PathBuf::as_path).collect();

    let mut missing = BTreeSet::new();
    for function in functions {
        if !on_disk.contains(function.path.as_path()) {
            diagnostics.reporter(function.qualified_name()).report(
                DiagnosticKind::Extraction,
                format!("Registered file {} does not exist", function.path.display()),
            );
            missing.insert(function.path.clone());
        }
    }

    for file in on_disk.difference(&registered) {
        diagnostics.record(
            DiagnosticKind::Extraction,
            format!("Service file {} is not registered", file.display()),
            None,
        );
    }
    missing
}
