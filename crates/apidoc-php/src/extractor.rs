//! Per-function compilation driver.

use crate::builder::IrBuilder;
use crate::config::ExtractorConfig;
use crate::context::NameResolutionContext;
use crate::conventions::check_header;
use crate::parser::ExpressionParser;
use crate::registry::{cross_check, list_service_files, scan_registry};
use crate::resolver::Resolver;
use crate::source::{find_static_methods, find_static_methods_with_suffix, MethodBody};
use apidoc::{
    Absence, ApidocError, DiagnosticKind, Diagnostics, FunctionInfo, FunctionSchema, Reporter,
    Result, Schema,
};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const PARAMETERS_SUFFIX: &str = "_parameters";
const RETURNS_SUFFIX: &str = "_returns";

/// Compile the parameters and returns schemas of one registered function.
///
/// Returns `Ok(None)` if the function had to be skipped; the reason has been
/// recorded in `diagnostics`.
pub fn compile_function(
    info: &FunctionInfo,
    config: &ExtractorConfig,
    diagnostics: &mut Diagnostics,
) -> Result<Option<FunctionSchema>> {
    let mut reporter = diagnostics.reporter(info.qualified_name());
    let path = config.root.join(&info.path);

    let src = match fs::read_to_string(&path) {
        Ok(src) => src,
        Err(e) => {
            reporter.report(
                DiagnosticKind::Extraction,
                format!("Couldn't read {}: {e}", path.display()),
            );
            return Ok(None);
        }
    };

    if config.check_conventions {
        check_header(&src, &info.group, &mut reporter);
    }

    let parameters = find_method(&src, &info.name, PARAMETERS_SUFFIX, &path, &mut reporter)?;
    let returns = find_method(&src, &info.name, RETURNS_SUFFIX, &path, &mut reporter)?;
    let (Some(parameters), Some(returns)) = (parameters, returns) else {
        return Ok(None);
    };

    let ctx = NameResolutionContext::from_source(&src);
    let resolver = Resolver::new(config);
    let source = ServiceSource {
        src: &src,
        path: &path,
        ctx: &ctx,
        resolver: &resolver,
    };

    let parameters = source.compile(&parameters, &mut reporter)?;
    if parameters.absence() == Some(Absence::NullLiteral) {
        reporter.report(
            DiagnosticKind::Extraction,
            "Parameters are null, use external_function_parameters([]) instead",
        );
    }

    let returns = source.compile(&returns, &mut reporter)?;
    if returns.absence() == Some(Absence::EmptyStructure) {
        reporter.report(
            DiagnosticKind::Extraction,
            "Returns an empty structure, use 'return null;' instead",
        );
    }

    debug!(function = reporter.function(), "compiled");
    Ok(Some(FunctionSchema::new(info.clone(), parameters, returns)))
}

struct ServiceSource<'a, 'c> {
    src: &'a str,
    path: &'a Path,
    ctx: &'a NameResolutionContext,
    resolver: &'a Resolver<'c>,
}

impl ServiceSource<'_, '_> {
    fn compile(&self, method: &MethodBody<'_>, reporter: &mut Reporter<'_>) -> Result<Schema> {
        let expr = ExpressionParser::for_method(self.src, method, self.path, self.ctx, self.resolver)
            .parse_body(reporter)?;
        IrBuilder::new(self.resolver).build_schema(&expr, reporter)
    }
}

/// Locate `<name><suffix>()`, falling back to the only method with that suffix
fn find_method<'s>(
    src: &'s str,
    name: &str,
    suffix: &str,
    path: &Path,
    reporter: &mut Reporter<'_>,
) -> Result<Option<MethodBody<'s>>> {
    let expected = format!("{name}{suffix}");
    let mut exact = find_static_methods(src, &expected);
    match exact.len() {
        1 => return Ok(exact.pop()),
        0 => {}
        count => {
            return Err(ApidocError::DuplicateDefinition {
                file: path.to_path_buf(),
                name: expected,
                count,
            })
        }
    }

    let mut candidates = find_static_methods_with_suffix(src, suffix);
    match candidates.len() {
        0 => {
            reporter.report(
                DiagnosticKind::Extraction,
                format!("Couldn't find {expected}() inside {}", path.display()),
            );
            Ok(None)
        }
        1 => {
            let found = candidates.pop();
            if let Some(method) = &found {
                reporter.report(
                    DiagnosticKind::Extraction,
                    format!("Expected {expected}(), found {}()", method.name),
                );
            }
            Ok(found)
        }
        count => {
            reporter.report(
                DiagnosticKind::Extraction,
                format!("Couldn't find {expected}(), and {count} other *{suffix}() methods exist"),
            );
            Ok(None)
        }
    }
}

/// Scan the registry and compile every function in registry order
pub fn compile_all(
    config: &ExtractorConfig,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<FunctionSchema>> {
    config.validate()?;

    let registry = config.registry_path();
    let source = fs::read_to_string(&registry).map_err(|e| ApidocError::io(&registry, e))?;
    let functions = scan_registry(&source, &config.component, diagnostics);

    let files = list_service_files(&config.root, &config.services_dir());
    let missing = cross_check(&functions, &files, diagnostics);

    let mut compiled = Vec::with_capacity(functions.len());
    for function in functions.iter().filter(|f| !missing.contains(&f.path)) {
        if let Some(schema) = compile_function(function, config, diagnostics)? {
            compiled.push(schema);
        }
    }

    info!(
        compiled = compiled.len(),
        registered = functions.len(),
        diagnostics = diagnostics.len(),
        "extraction finished"
    );
    Ok(compiled)
}
