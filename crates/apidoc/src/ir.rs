//! Typed schema tree produced for one parameters or returns definition.
//!
//! This is the bridge between the PHP expression parser and the JSON export.
//! The builder produces a [`Schema`] per method body; the exporter only ever
//! sees these types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

/// Value type used for placeholders produced by recoverable schema errors
pub const UNTYPED: &str = "unknown";

/// Default value of a scalar parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// `true` / `false`
    Bool(bool),
    /// Human readable stand-in, e.g. "derived from token"
    Text(String),
}

/// A scalar leaf (`external_value`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSchema {
    /// Normalized scalar type (`int`, `String`, `bool`, or the raw constant)
    pub value_type: String,

    /// Field description
    pub description: String,

    /// Whether the caller must supply the value
    pub required: bool,

    /// Default used when the value is omitted
    pub default_value: Option<DefaultValue>,

    /// Whether `null` is accepted
    pub nullable: bool,
}

impl ValueSchema {
    pub fn new(value_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            value_type: value_type.into(),
            description: description.into(),
            required: true,
            default_value: None,
            nullable: false,
        }
    }

    /// Untyped nullable value standing in for something that could not be built
    pub fn placeholder() -> Self {
        Self {
            nullable: true,
            ..Self::new(UNTYPED, "")
        }
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_default(mut self, default_value: Option<DefaultValue>) -> Self {
        self.default_value = default_value;
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// A keyed structure (`external_single_structure`, `external_function_parameters`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    /// Fields in declaration order
    pub fields: IndexMap<String, IrElement>,

    pub description: String,

    pub required: bool,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
            description: String::new(),
            required: true,
        }
    }

    /// Add a field unless the name is already taken.
    ///
    /// Returns `false` (and keeps the first declaration) on a duplicate name.
    pub fn insert_field(&mut self, name: impl Into<String>, element: IrElement) -> bool {
        let name = name.into();
        if self.fields.contains_key(&name) {
            return false;
        }
        self.fields.insert(name, element);
        true
    }

    pub fn field(&self, name: &str) -> Option<&IrElement> {
        self.fields.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for ObjectSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// A homogeneous list (`external_multiple_structure`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArraySchema {
    /// Schema shared by every element
    pub value: Box<IrElement>,

    pub description: String,

    pub required: bool,
}

impl ArraySchema {
    pub fn new(element: IrElement) -> Self {
        Self {
            value: Box::new(element),
            description: String::new(),
            required: true,
        }
    }

    pub fn element(&self) -> &IrElement {
        &self.value
    }
}

/// One node of the schema tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IrElement {
    Value(ValueSchema),
    Object(ObjectSchema),
    Array(ArraySchema),
}

impl IrElement {
    pub fn placeholder() -> Self {
        Self::Value(ValueSchema::placeholder())
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Value(v) => &v.description,
            Self::Object(o) => &o.description,
            Self::Array(a) => &a.description,
        }
    }

    pub fn required(&self) -> bool {
        match self {
            Self::Value(v) => v.required,
            Self::Object(o) => o.required,
            Self::Array(a) => a.required,
        }
    }

    pub fn as_value(&self) -> Option<&ValueSchema> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArraySchema> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Number of nodes in this subtree, including itself
    pub fn node_count(&self) -> usize {
        match self {
            Self::Value(_) => 1,
            Self::Object(o) => 1 + o.fields.values().map(IrElement::node_count).sum::<usize>(),
            Self::Array(a) => 1 + a.value.node_count(),
        }
    }
}

/// Why a method body produced no schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absence {
    /// The body was `return null;`
    NullLiteral,
    /// The body built a structure without any fields
    EmptyStructure,
    /// The body delegated to a method that could not be resolved
    Unresolved,
}

/// Result of compiling one parameters or returns method.
///
/// Every kind of absence renders as `null`; they are kept apart so callers can
/// tell an explicit `return null;` from an empty structure literal or a
/// delegation that was already reported as unresolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Absent(Absence),
    Present(IrElement),
}

impl Schema {
    /// Apply the collapse rule: empty objects become absent.
    pub fn from_element(element: IrElement) -> Self {
        match element {
            IrElement::Object(ref o) if o.is_empty() => Self::Absent(Absence::EmptyStructure),
            other => Self::Present(other),
        }
    }

    pub fn element(&self) -> Option<&IrElement> {
        match self {
            Self::Present(e) => Some(e),
            Self::Absent(_) => None,
        }
    }

    pub fn absence(&self) -> Option<Absence> {
        match self {
            Self::Absent(a) => Some(*a),
            Self::Present(_) => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent(_))
    }
}

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.element().serialize(serializer)
    }
}
