//! Builds schema IR from parsed constructor expressions.

use crate::expression::{ClassMemberCall, ConstructorCall, Delegated, Expression};
use crate::resolver::Resolver;
use apidoc::{
    Absence, ApidocError, ArraySchema, DefaultValue, DiagnosticKind, IrElement, ObjectSchema, Reporter,
    Result, Schema, ValueSchema,
};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Default shown for parameters filled in from the caller's session
pub const TOKEN_DEFAULT: &str = "derived from token";

/// Recognized schema-building classes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaConstructor {
    FunctionParameters,
    SingleStructure,
    MultipleStructure,
    Value,
    Unknown(String),
}

impl SchemaConstructor {
    /// Dispatch on a class name; any namespace qualifier is ignored
    pub fn from_name(name: &str) -> Self {
        match name.rsplit('\\').next().unwrap_or(name) {
            "external_function_parameters" => Self::FunctionParameters,
            "external_single_structure" => Self::SingleStructure,
            "external_multiple_structure" => Self::MultipleStructure,
            "external_value" => Self::Value,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Normalized name of a `PARAM_*` type constant
pub fn normalize_type(constant: &str) -> String {
    match constant {
        "PARAM_INT" => "int",
        "PARAM_TEXT" | "PARAM_URL" => "String",
        "PARAM_BOOL" => "bool",
        other => other,
    }
    .to_string()
}

/// Short rendering of an expression for diagnostics
fn describe(expr: &Expression) -> String {
    match expr {
        Expression::Constant(name) => name.clone(),
        Expression::StringLiteral(text) => format!("'{text}'"),
        Expression::ClassMember(call) => format!("{}()", call.member),
        other => other.kind().to_string(),
    }
}

/// One delegated method currently being built
#[derive(Debug, Clone)]
struct DelegationFrame {
    file: Option<PathBuf>,
    member: String,
    label: String,
}

impl DelegationFrame {
    fn new(call: &ClassMemberCall) -> Self {
        Self {
            file: call.resolved_file().map(Path::to_path_buf),
            member: call.member_name().to_string(),
            label: format!("{}()", call.member),
        }
    }
}

// `self::x()` in two different files are different frames
impl PartialEq for DelegationFrame {
    fn eq(&self, other: &Self) -> bool {
        self.file == other.file && self.member == other.member
    }
}

/// Outcome of building one expression
#[derive(Debug, Clone, PartialEq)]
pub enum Built {
    Element(IrElement),
    /// Literal `null`
    Null,
    /// Delegated method that could not be resolved; already reported
    Unresolved,
}

/// Turns expressions into [`IrElement`]s, following delegated methods
pub struct IrBuilder<'r, 'c> {
    resolver: &'r Resolver<'c>,
    stack: Vec<DelegationFrame>,
    max_depth: usize,
}

impl<'r, 'c> IrBuilder<'r, 'c> {
    pub fn new(resolver: &'r Resolver<'c>) -> Self {
        Self {
            resolver,
            stack: Vec::new(),
            max_depth: resolver.config().max_delegation_depth,
        }
    }

    /// Build the schema for a whole method body, applying the collapse rule
    pub fn build_schema(&mut self, expr: &Expression, reporter: &mut Reporter<'_>) -> Result<Schema> {
        Ok(match self.build(expr, reporter)? {
            Built::Element(element) => Schema::from_element(element),
            Built::Null => Schema::Absent(Absence::NullLiteral),
            Built::Unresolved => Schema::Absent(Absence::Unresolved),
        })
    }

    /// Build one element
    pub fn build(&mut self, expr: &Expression, reporter: &mut Reporter<'_>) -> Result<Built> {
        match expr {
            e if e.is_null() => Ok(Built::Null),
            Expression::ClassMember(call) => self.build_delegated(call, reporter),
            Expression::Constructor(call) => self.build_constructor(call, reporter).map(Built::Element),
            other => {
                reporter.report_with(
                    DiagnosticKind::SchemaShape,
                    "Expected a schema constructor",
                    format!("found {}", describe(other)),
                );
                Ok(Built::Element(IrElement::placeholder()))
            }
        }
    }

    fn build_delegated(
        &mut self,
        call: &ClassMemberCall,
        reporter: &mut Reporter<'_>,
    ) -> Result<Built> {
        let frame = DelegationFrame::new(call);
        let cyclic = self.stack.contains(&frame);
        if cyclic || self.stack.len() >= self.max_depth {
            let chain: Vec<&str> = self
                .stack
                .iter()
                .chain(std::iter::once(&frame))
                .map(|f| f.label.as_str())
                .collect();
            let chain = chain.join(" -> ");
            return Err(if cyclic {
                ApidocError::CyclicDelegation { chain }
            } else {
                ApidocError::DelegationTooDeep {
                    limit: self.max_depth,
                    chain,
                }
            });
        }

        trace!(member = %frame.label, depth = self.stack.len(), "following delegation");
        self.stack.push(frame);
        let built = match self.resolver.resolve_class_member(call, reporter) {
            Ok(Some(body)) => self.build(&body, reporter),
            Ok(None) => Ok(Built::Unresolved),
            Err(e) => Err(e),
        };
        self.stack.pop();
        built
    }

    /// Element nested inside another constructor; `null` is not allowed here
    fn build_nested(&mut self, expr: &Expression, reporter: &mut Reporter<'_>) -> Result<IrElement> {
        match self.build(expr, reporter)? {
            Built::Element(element) => Ok(element),
            Built::Unresolved => Ok(IrElement::placeholder()),
            Built::Null => {
                reporter.report_with(
                    DiagnosticKind::SchemaShape,
                    "Nested schema is null",
                    format!("found {}", describe(expr)),
                );
                Ok(IrElement::placeholder())
            }
        }
    }

    fn build_constructor(
        &mut self,
        call: &ConstructorCall,
        reporter: &mut Reporter<'_>,
    ) -> Result<IrElement> {
        match SchemaConstructor::from_name(&call.name) {
            SchemaConstructor::FunctionParameters | SchemaConstructor::SingleStructure => {
                self.build_object(call, reporter)
            }
            SchemaConstructor::MultipleStructure => self.build_array(call, reporter),
            SchemaConstructor::Value => Ok(self.build_value(call, reporter)),
            SchemaConstructor::Unknown(name) => {
                reporter.report(
                    DiagnosticKind::SchemaShape,
                    format!("Unknown schema constructor {name}"),
                );
                Ok(IrElement::placeholder())
            }
        }
    }

    fn build_object(
        &mut self,
        call: &ConstructorCall,
        reporter: &mut Reporter<'_>,
    ) -> Result<IrElement> {
        if !(1..=3).contains(&call.arguments.len()) {
            return Ok(wrong_arity(call, "1 to 3", reporter));
        }

        let Some(Expression::Array(fields)) = call.argument(0) else {
            reporter.report_with(
                DiagnosticKind::SchemaShape,
                format!("{} expects an array of fields", call.short_name()),
                format!("found {}", call.arguments.first().map(describe).unwrap_or_default()),
            );
            return Ok(IrElement::placeholder());
        };
        if !fields.is_associative() && !fields.is_empty() {
            reporter.report(
                DiagnosticKind::SchemaShape,
                format!("{} expects a keyed array of fields", call.short_name()),
            );
            return Ok(IrElement::placeholder());
        }

        let mut object = ObjectSchema::new();
        for (key, value) in fields.entries() {
            let name = key.string_value().unwrap_or_default();
            let element = self.build_nested(value, reporter)?;
            if !object.insert_field(name.clone(), element) {
                reporter.report(
                    DiagnosticKind::SchemaShape,
                    format!("Duplicate field '{name}', keeping the first declaration"),
                );
            }
        }
        object.description = description(call.argument(1), reporter);
        object.required = required_flag(call.argument(2), reporter);
        Ok(IrElement::Object(object))
    }

    fn build_array(
        &mut self,
        call: &ConstructorCall,
        reporter: &mut Reporter<'_>,
    ) -> Result<IrElement> {
        let Some(element) = call.argument(0).filter(|_| call.arguments.len() <= 3) else {
            return Ok(wrong_arity(call, "1 to 3", reporter));
        };

        let mut array = ArraySchema::new(self.build_nested(element, reporter)?);
        array.description = description(call.argument(1), reporter);
        array.required = required_flag(call.argument(2), reporter);
        Ok(IrElement::Array(array))
    }

    fn build_value(&mut self, call: &ConstructorCall, reporter: &mut Reporter<'_>) -> IrElement {
        if !(2..=5).contains(&call.arguments.len()) {
            return wrong_arity(call, "2 to 5", reporter);
        }

        let Some(type_constant) = call.arguments[0].as_constant() else {
            reporter.report_with(
                DiagnosticKind::SchemaShape,
                "external_value expects a PARAM_* type constant",
                format!("found {}", describe(&call.arguments[0])),
            );
            return IrElement::placeholder();
        };

        let value = ValueSchema::new(
            normalize_type(type_constant),
            description(call.argument(1), reporter),
        )
        .with_required(required_flag(call.argument(2), reporter))
        .with_default(default_value(call.argument(3), reporter))
        .with_nullable(nullable_flag(call.argument(4), reporter));
        IrElement::Value(value)
    }
}

fn wrong_arity(call: &ConstructorCall, expected: &str, reporter: &mut Reporter<'_>) -> IrElement {
    reporter.report(
        DiagnosticKind::SchemaShape,
        format!(
            "{} expects {expected} arguments, got {}",
            call.short_name(),
            call.arguments.len()
        ),
    );
    IrElement::placeholder()
}

fn description(arg: Option<&Expression>, reporter: &mut Reporter<'_>) -> String {
    let Some(arg) = arg else {
        return String::new();
    };
    arg.string_value().unwrap_or_else(|| {
        reporter.report_with(
            DiagnosticKind::SchemaShape,
            "Description is not a string",
            format!("found {}", describe(arg)),
        );
        String::new()
    })
}

fn required_flag(arg: Option<&Expression>, reporter: &mut Reporter<'_>) -> bool {
    match arg.map(|a| (a, a.as_constant())) {
        None | Some((_, Some("VALUE_REQUIRED"))) => true,
        Some((_, Some("VALUE_DEFAULT"))) => false,
        Some((other, _)) => {
            reporter.report_with(
                DiagnosticKind::SchemaShape,
                "Unknown required flag, assuming VALUE_REQUIRED",
                format!("found {}", describe(other)),
            );
            true
        }
    }
}

fn nullable_flag(arg: Option<&Expression>, reporter: &mut Reporter<'_>) -> bool {
    match arg.map(|a| (a, a.as_constant())) {
        None | Some((_, Some("NULL_NOT_ALLOWED"))) => false,
        Some((_, Some("NULL_ALLOWED"))) => true,
        Some((other, _)) => {
            reporter.report_with(
                DiagnosticKind::SchemaShape,
                "Unknown nullable flag, assuming NULL_NOT_ALLOWED",
                format!("found {}", describe(other)),
            );
            false
        }
    }
}

fn default_value(arg: Option<&Expression>, reporter: &mut Reporter<'_>) -> Option<DefaultValue> {
    let arg = arg?;
    if arg.is_null() {
        return None;
    }
    match arg {
        Expression::UserIdReference => Some(DefaultValue::Text(TOKEN_DEFAULT.to_string())),
        Expression::Constant(name) if name.eq_ignore_ascii_case("true") => {
            Some(DefaultValue::Bool(true))
        }
        Expression::Constant(name) if name.eq_ignore_ascii_case("false") => {
            Some(DefaultValue::Bool(false))
        }
        other => {
            reporter.report_with(
                DiagnosticKind::SchemaShape,
                "Unsupported default value, ignoring it",
                format!("found {}", describe(other)),
            );
            None
        }
    }
}
