//! Cross-file symbol resolution.
//!
//! Imports are mapped to files through the configured namespace table, the way
//! Moodle's class autoloader lays out `classes/`. Nothing is cached: resolving
//! the same enum twice reads its file twice.

use crate::config::ExtractorConfig;
use crate::context::{ImportEntry, NameResolutionContext};
use crate::expression::{ClassMemberCall, Delegated, Expression, MemberRef};
use crate::parser::ExpressionParser;
use crate::source::{find_class, find_static_methods};
use apidoc::{ApidocError, DiagnosticKind, Reporter, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Value substituted for enum cases that could not be found
pub const MISSING_CASE: &str = "?";

/// Base class of the plugin's enum polyfill
const ENUM_BASE: &str = "Enum";

fn const_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"const\s+(\w+)\s*=\s*(-?\d+|true|false|'(?:[^'\\]|\\.)*'|"[^"]*")\s*;"#)
            .expect("valid regex")
    })
}

/// One `const NAME = value;` declaration of an enum class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCase {
    pub name: String,

    /// Value as written in the source, quotes included
    pub literal: String,
}

impl EnumCase {
    /// Value with string quotes removed
    pub fn value(&self) -> String {
        match self.literal.as_bytes().first() {
            Some(b'\'') => unquote(&self.literal).replace("\\'", "'").replace("\\\\", "\\"),
            Some(b'"') => unquote(&self.literal).to_string(),
            _ => self.literal.clone(),
        }
    }

    /// `Name = value`, strings shown double-quoted
    pub fn display(&self) -> String {
        let value = match self.literal.as_bytes().first() {
            Some(b'\'' | b'"') => format!("\"{}\"", self.value()),
            _ => self.literal.clone(),
        };
        format!("{} = {}", capitalize(&self.name), value)
    }
}

fn unquote(literal: &str) -> &str {
    literal
        .get(1..literal.len().saturating_sub(1))
        .unwrap_or_default()
}

/// `MONDAY` -> `Monday`
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn short_name(symbol: &str) -> &str {
    symbol.rsplit('\\').next().unwrap_or(symbol)
}

/// Locates symbols on disk and loads what they refer to
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'c> {
    config: &'c ExtractorConfig,
}

impl<'c> Resolver<'c> {
    pub fn new(config: &'c ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'c ExtractorConfig {
        self.config
    }

    /// File a fully qualified class name is autoloaded from
    pub fn path_for(&self, qualified: &str) -> Option<PathBuf> {
        let mut segments = qualified.trim_start_matches('\\').split('\\');
        let dir = self.config.namespace_dir(segments.next()?)?;
        let rest: Vec<&str> = segments.collect();
        let (symbol, subdirs) = rest.split_last()?;

        let mut path = self.config.root.join(dir);
        path.extend(subdirs);
        path.push(format!("{symbol}.php"));
        Some(path)
    }

    /// Find the file defining `symbol` as seen from `current_file`.
    ///
    /// Records a resolution diagnostic and returns `None` if there is no
    /// candidate or more than one. More than one import with the same terminal
    /// symbol counts as ambiguous even if they would resolve to the same file.
    pub fn find_import(
        &self,
        ctx: &NameResolutionContext,
        symbol: &str,
        current_file: &Path,
        reporter: &mut Reporter<'_>,
    ) -> Option<PathBuf> {
        if symbol == "self" || symbol == "static" {
            return Some(current_file.to_path_buf());
        }

        if symbol.starts_with('\\') {
            let found = self.path_for(symbol);
            if found.is_none() {
                reporter.report(
                    DiagnosticKind::Resolution,
                    format!("Couldn't find symbol: {symbol}"),
                );
            }
            return found;
        }

        let matches: Vec<&ImportEntry> = ctx.imports_of(symbol).collect();
        match matches.as_slice() {
            [import] => {
                let found = self.path_for(&import.path);
                if found.is_none() {
                    reporter.report_with(
                        DiagnosticKind::Resolution,
                        format!("Couldn't find symbol: {symbol}"),
                        format!("imported as {} from an unmapped namespace", import.path),
                    );
                }
                found
            }
            [] => {
                let fallback = ctx
                    .namespace
                    .as_deref()
                    .and_then(|ns| self.path_for(&format!("{ns}\\{symbol}")))
                    .filter(|path| path.is_file());
                if fallback.is_none() {
                    reporter.report(
                        DiagnosticKind::Resolution,
                        format!("Couldn't find symbol: {symbol}"),
                    );
                }
                fallback
            }
            many => {
                let paths: Vec<&str> = many.iter().map(|i| i.path.as_str()).collect();
                reporter.report_with(
                    DiagnosticKind::Resolution,
                    format!("Found {} imports for symbol: {symbol}", many.len()),
                    paths.join("\n"),
                );
                None
            }
        }
    }

    /// Cases of an enum class in declaration order, followed by those it
    /// inherits from its direct base class.
    pub fn load_enum_cases(
        &self,
        class_name: &str,
        file: &Path,
        reporter: &mut Reporter<'_>,
    ) -> Option<Vec<EnumCase>> {
        let (src, mut cases, base) = self.read_enum_class(class_name, file, reporter)?;

        if let Some(base) = base.filter(|b| short_name(b) != ENUM_BASE) {
            // one level only; the base's own parent is not consulted
            let ctx = NameResolutionContext::from_source(&src);
            let inherited = self
                .find_import(&ctx, &base, file, reporter)
                .and_then(|base_file| self.read_enum_class(short_name(&base), &base_file, reporter));
            for case in inherited.map(|(_, cases, _)| cases).unwrap_or_default() {
                if !cases.iter().any(|c| c.name == case.name) {
                    cases.push(case);
                }
            }
        }

        Some(cases)
    }

    fn read_enum_class(
        &self,
        class_name: &str,
        file: &Path,
        reporter: &mut Reporter<'_>,
    ) -> Option<(String, Vec<EnumCase>, Option<String>)> {
        let src = match fs::read_to_string(file) {
            Ok(src) => src,
            Err(e) => {
                reporter.report(
                    DiagnosticKind::Resolution,
                    format!("Couldn't read {}: {e}", file.display()),
                );
                return None;
            }
        };

        let class_name = short_name(class_name);
        let Some(class) = find_class(&src, class_name).into_iter().next() else {
            reporter.report(
                DiagnosticKind::Resolution,
                format!("Couldn't find class {class_name} in {}", file.display()),
            );
            return None;
        };

        let cases = const_re()
            .captures_iter(class.body)
            .map(|caps| EnumCase {
                name: caps[1].to_string(),
                literal: caps[2].to_string(),
            })
            .collect();
        let extends = class.extends;
        debug!(class = class_name, file = %file.display(), "loaded enum");
        Some((src, cases, extends))
    }

    /// Value of `class::case`, or [`MISSING_CASE`]
    pub fn resolve_enum_case(
        &self,
        class_name: &str,
        case_name: &str,
        file: Option<&Path>,
        reporter: &mut Reporter<'_>,
    ) -> String {
        let Some(file) = file else {
            return MISSING_CASE.to_string();
        };
        let Some(cases) = self.load_enum_cases(class_name, file, reporter) else {
            return MISSING_CASE.to_string();
        };

        match cases.iter().find(|c| c.name == case_name) {
            Some(case) => case.value(),
            None => {
                reporter.report(
                    DiagnosticKind::Resolution,
                    format!("Couldn't find enum case {class_name}::{case_name}"),
                );
                MISSING_CASE.to_string()
            }
        }
    }

    /// All cases of an enum rendered as `{ Name = value, ... }`
    pub fn resolve_enum_format(&self, member: &MemberRef, reporter: &mut Reporter<'_>) -> String {
        let Some(file) = member.resolved_file.as_deref() else {
            return MISSING_CASE.to_string();
        };
        let Some(cases) = self.load_enum_cases(&member.class_name, file, reporter) else {
            return MISSING_CASE.to_string();
        };

        let rendered: Vec<String> = cases.iter().map(EnumCase::display).collect();
        format!("{{ {} }}", rendered.join(", "))
    }

    /// Parse the body of a delegated static method.
    ///
    /// Returns `None` on a soft failure, which has already been reported
    /// (an unresolved import is reported while parsing the call). More than
    /// one definition of the method in its file is fatal.
    pub fn resolve_class_member(
        &self,
        call: &ClassMemberCall,
        reporter: &mut Reporter<'_>,
    ) -> Result<Option<Expression>> {
        let Some(file) = call.resolved_file() else {
            return Ok(None);
        };

        let src = match fs::read_to_string(file) {
            Ok(src) => src,
            Err(e) => {
                reporter.report(
                    DiagnosticKind::Resolution,
                    format!("Couldn't read {}: {e}", file.display()),
                );
                return Ok(None);
            }
        };

        let methods = find_static_methods(&src, call.member_name());
        match methods.as_slice() {
            [] => {
                reporter.report(
                    DiagnosticKind::Resolution,
                    format!(
                        "Couldn't find {}() inside {}",
                        call.member,
                        file.display()
                    ),
                );
                Ok(None)
            }
            [method] => {
                debug!(member = %call.member, file = %file.display(), "resolving delegated method");
                let ctx = NameResolutionContext::from_source(&src);
                ExpressionParser::for_method(&src, method, file, &ctx, self)
                    .parse_body(reporter)
                    .map(Some)
            }
            many => Err(ApidocError::DuplicateDefinition {
                file: file.to_path_buf(),
                name: call.member_name().to_string(),
                count: many.len(),
            }),
        }
    }
}
