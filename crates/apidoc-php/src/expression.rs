//! Expression nodes of the restricted PHP grammar.
//!
//! Nodes are immutable once built. String-valued nodes (`StringLiteral`,
//! `Concat`, `EnumCase`, `EnumFormat`) are the only ones allowed on either side
//! of a concatenation; [`Concat::new`] enforces that.

use std::fmt;
use std::path::{Path, PathBuf};

/// The id of the currently authenticated caller, as written in PHP
pub const USER_ID_TOKEN: &str = "$USER->id";

/// Nodes with a compile-time string value
pub trait StringValued {
    fn string_value(&self) -> String;
}

/// Nodes backed by an enumeration-like class
pub trait EnumBacked {
    fn enum_class(&self) -> &str;
    fn enum_file(&self) -> Option<&Path>;
}

/// Nodes naming a static member of another class
pub trait Delegated {
    fn class_name(&self) -> &str;
    fn member_name(&self) -> &str;
    fn resolved_file(&self) -> Option<&Path>;
}

/// `Class::member`, with the file the class was resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub class_name: String,
    pub member_name: String,
    pub resolved_file: Option<PathBuf>,
}

impl MemberRef {
    pub fn new(
        class_name: impl Into<String>,
        member_name: impl Into<String>,
        resolved_file: Option<PathBuf>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            member_name: member_name.into(),
            resolved_file,
        }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class_name, self.member_name)
    }
}

/// `a . b`
#[derive(Debug, Clone, PartialEq)]
pub struct Concat {
    left: Box<Expression>,
    right: Box<Expression>,
}

impl Concat {
    /// Join two string-valued expressions; hands the operands back otherwise
    pub fn new(left: Expression, right: Expression) -> Result<Self, (Expression, Expression)> {
        if left.is_string_kind() && right.is_string_kind() {
            Ok(Self {
                left: Box::new(left),
                right: Box::new(right),
            })
        } else {
            Err((left, right))
        }
    }

    pub fn left(&self) -> &Expression {
        &self.left
    }

    pub fn right(&self) -> &Expression {
        &self.right
    }
}

impl StringValued for Concat {
    fn string_value(&self) -> String {
        let mut out = self.left.string_value().unwrap_or_default();
        out.push_str(&self.right.string_value().unwrap_or_default());
        out
    }
}

/// `[a, b]` or `['k' => a]`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteral {
    pub values: Vec<Expression>,

    /// Parallel to `values`; present iff the array is associative
    pub keys: Option<Vec<Expression>>,
}

impl ArrayLiteral {
    pub fn positional(values: Vec<Expression>) -> Self {
        Self { values, keys: None }
    }

    pub fn associative(entries: Vec<(Expression, Expression)>) -> Self {
        let (keys, values) = entries.into_iter().unzip();
        Self {
            values,
            keys: Some(keys),
        }
    }

    pub fn is_associative(&self) -> bool {
        self.keys.is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Key/value pairs of an associative array
    pub fn entries(&self) -> impl Iterator<Item = (&Expression, &Expression)> {
        self.keys.iter().flatten().zip(self.values.iter())
    }
}

/// `new name(args)`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorCall {
    pub name: String,
    pub arguments: Vec<Expression>,
}

impl ConstructorCall {
    pub fn new(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Class name without namespace qualifier
    pub fn short_name(&self) -> &str {
        self.name.rsplit('\\').next().unwrap_or(&self.name)
    }

    pub fn argument(&self, index: usize) -> Option<&Expression> {
        self.arguments.get(index)
    }
}

/// `Class::method()` whose body is compiled on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMemberCall {
    pub member: MemberRef,
}

impl Delegated for ClassMemberCall {
    fn class_name(&self) -> &str {
        &self.member.class_name
    }

    fn member_name(&self) -> &str {
        &self.member.member_name
    }

    fn resolved_file(&self) -> Option<&Path> {
        self.member.resolved_file.as_deref()
    }
}

/// `ENUM::CASE`, already looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCaseRef {
    pub class_name: String,
    pub case_name: String,
    pub enum_file: Option<PathBuf>,

    /// Case value, or `"?"` if it could not be found
    pub value: String,
}

impl StringValued for EnumCaseRef {
    fn string_value(&self) -> String {
        self.value.clone()
    }
}

impl EnumBacked for EnumCaseRef {
    fn enum_class(&self) -> &str {
        &self.class_name
    }

    fn enum_file(&self) -> Option<&Path> {
        self.enum_file.as_deref()
    }
}

/// `ENUM::format()`, already rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumFormatRef {
    pub member: MemberRef,

    /// e.g. `{ Monday = 1, Tuesday = 2 }`
    pub rendered: String,
}

impl StringValued for EnumFormatRef {
    fn string_value(&self) -> String {
        self.rendered.clone()
    }
}

impl EnumBacked for EnumFormatRef {
    fn enum_class(&self) -> &str {
        &self.member.class_name
    }

    fn enum_file(&self) -> Option<&Path> {
        self.member.resolved_file.as_deref()
    }
}

impl Delegated for EnumFormatRef {
    fn class_name(&self) -> &str {
        &self.member.class_name
    }

    fn member_name(&self) -> &str {
        &self.member.member_name
    }

    fn resolved_file(&self) -> Option<&Path> {
        self.member.resolved_file.as_deref()
    }
}

/// One parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    StringLiteral(String),
    Concat(Concat),
    UserIdReference,
    Array(ArrayLiteral),
    /// Bare identifier: `null`, `true`, `PARAM_INT`, `VALUE_REQUIRED`, ...
    Constant(String),
    Constructor(ConstructorCall),
    ClassMember(ClassMemberCall),
    EnumCase(EnumCaseRef),
    EnumFormat(EnumFormatRef),
}

impl Expression {
    pub fn constant(name: impl Into<String>) -> Self {
        Self::Constant(name.into())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self::StringLiteral(text.into())
    }

    pub fn is_string_kind(&self) -> bool {
        self.as_string_valued().is_some()
    }

    /// Capability view of string-valued nodes
    pub fn as_string_valued(&self) -> Option<&dyn StringValued> {
        match self {
            Self::StringLiteral(s) => Some(s),
            Self::Concat(c) => Some(c),
            Self::EnumCase(e) => Some(e),
            Self::EnumFormat(e) => Some(e),
            _ => None,
        }
    }

    pub fn string_value(&self) -> Option<String> {
        self.as_string_valued().map(StringValued::string_value)
    }

    pub fn as_constant(&self) -> Option<&str> {
        match self {
            Self::Constant(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.as_constant()
            .is_some_and(|name| name.eq_ignore_ascii_case("null"))
    }

    /// Short name of the node kind, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StringLiteral(_) => "string literal",
            Self::Concat(_) => "concatenation",
            Self::UserIdReference => "user id reference",
            Self::Array(_) => "array literal",
            Self::Constant(_) => "constant",
            Self::Constructor(_) => "constructor call",
            Self::ClassMember(_) => "static method call",
            Self::EnumCase(_) => "enum case",
            Self::EnumFormat(_) => "enum format",
        }
    }
}

impl StringValued for String {
    fn string_value(&self) -> String {
        self.clone()
    }
}
