//! # apidoc
//!
//! Schema model and output stage for documenting Moodle web service functions.
//!
//! ## Architecture
//!
//! ```text
//! Registry scan + PHP expression parser (apidoc-php)
//!     ↓
//! Schema IR (IrElement / Schema)
//!     ↓
//! JSON export + script injection
//! ```
//!
//! Language front ends compile `*_parameters()` / `*_returns()` method bodies
//! into [`Schema`] values and record recoverable problems in a [`Diagnostics`]
//! sink. Fatal problems are returned as [`ApidocError`].
//!
//! ## Example
//!
//! ```rust
//! use apidoc::{export, FunctionInfo, FunctionSchema, IrElement, Schema, ValueSchema};
//!
//! let f = FunctionSchema::new(
//!     FunctionInfo::new("get_slot", "slots", "services/slots/get_slot.php"),
//!     Schema::Present(IrElement::Value(ValueSchema::new("int", "slot ID"))),
//!     Schema::Present(IrElement::placeholder()),
//! );
//! let json = export::export_json(&[f]).unwrap();
//! assert!(json.contains("\"value_type\":\"int\""));
//! ```

#![deny(unsafe_code)]

pub mod diagnostics;
pub mod error;
pub mod export;
pub mod function;
pub mod ir;

// Re-export main types
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Reporter};
pub use error::{ApidocError, Result};
pub use function::{FunctionInfo, FunctionSchema};
pub use ir::{
    Absence, ArraySchema, DefaultValue, IrElement, ObjectSchema, Schema, ValueSchema, UNTYPED,
};
