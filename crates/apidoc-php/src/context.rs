//! Namespace and import context of a PHP file.

use regex::Regex;
use std::sync::OnceLock;

/// One imported symbol, e.g. `use local_lbplanner\enums\WEEKDAY;`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportEntry {
    /// Fully qualified path without leading backslash
    pub path: String,

    /// Alias from `as Alias`
    pub alias: Option<String>,
}

impl ImportEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into().trim_start_matches('\\').to_string(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Name the symbol is visible under in the importing file
    pub fn terminal_symbol(&self) -> &str {
        self.alias
            .as_deref()
            .unwrap_or_else(|| self.path.rsplit('\\').next().unwrap_or(&self.path))
    }

    /// Namespace path segments, excluding the symbol itself
    pub fn namespace_segments(&self) -> Vec<&str> {
        let mut segments: Vec<&str> = self.path.split('\\').collect();
        segments.pop();
        segments
    }
}

/// Declared namespace plus imports of one source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameResolutionContext {
    pub namespace: Option<String>,
    pub imports: Vec<ImportEntry>,
}

fn namespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*namespace\s+([\w\\]+)\s*;").expect("valid regex"))
}

fn use_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*use\s+([\w\\]+?)(?:\\\{([^}]*)\}|\s+as\s+(\w+))?\s*;")
            .expect("valid regex")
    })
}

impl NameResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_import(mut self, import: ImportEntry) -> Self {
        self.imports.push(import);
        self
    }

    /// Read `namespace` and top-level `use` declarations from a PHP file.
    ///
    /// Brace groups (`use a\b\{c, d as e};`) expand into one entry per symbol.
    /// Trait `use` lines inside class bodies are picked up as well; they never
    /// map to a configured namespace, so they do not affect resolution.
    pub fn from_source(src: &str) -> Self {
        let namespace = namespace_re()
            .captures(src)
            .map(|caps| caps[1].trim_start_matches('\\').to_string());

        let mut imports = Vec::new();
        for caps in use_re().captures_iter(src) {
            let base = &caps[1];
            if base == "function" || base == "const" {
                continue;
            }

            if let Some(group) = caps.get(2) {
                for member in group.as_str().split(',') {
                    let member = member.trim();
                    if member.is_empty() {
                        continue;
                    }
                    let mut parts = member.split_whitespace();
                    let Some(symbol) = parts.next() else { continue };
                    let mut entry = ImportEntry::new(format!("{base}\\{symbol}"));
                    if parts.next() == Some("as") {
                        if let Some(alias) = parts.next() {
                            entry = entry.with_alias(alias);
                        }
                    }
                    imports.push(entry);
                }
            } else {
                let mut entry = ImportEntry::new(base);
                if let Some(alias) = caps.get(3) {
                    entry = entry.with_alias(alias.as_str());
                }
                imports.push(entry);
            }
        }

        Self { namespace, imports }
    }

    /// Imports visible under `symbol`
    pub fn imports_of<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a ImportEntry> {
        self.imports
            .iter()
            .filter(move |entry| entry.terminal_symbol() == symbol)
    }

    /// Namespace path segments of the file's own namespace
    pub fn namespace_segments(&self) -> Vec<&str> {
        self.namespace
            .as_deref()
            .map(|ns| ns.split('\\').collect())
            .unwrap_or_default()
    }
}
