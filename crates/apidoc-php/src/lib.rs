//! # apidoc-php
//!
//! PHP front end for apidoc: reads a Moodle plugin's service registry and
//! compiles each function's `*_parameters()` / `*_returns()` definitions into
//! schema IR.
//!
//! ## Features
//!
//! - Registry scan of `db/services.php` with a services directory cross-check
//! - Parser for the restricted expression grammar used in schema methods
//!   (single-quoted strings, concatenation, arrays, `new`, `Class::member`)
//! - Cross-file resolution of enum cases, `ENUM::format()` and delegated
//!   `Class::method()` calls
//! - Soft failures are recorded as diagnostics; only malformed source aborts
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use apidoc::Diagnostics;
//! use apidoc_php::{compile_all, ExtractorConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExtractorConfig::default().with_root("lbplanner");
//! let mut diagnostics = Diagnostics::new();
//! let functions = compile_all(&config, &mut diagnostics)?;
//! println!("{} functions, {} warnings", functions.len(), diagnostics.len());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod context;
pub mod conventions;
pub mod expression;
pub mod extractor;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod source;

pub use builder::{Built, IrBuilder, SchemaConstructor};
pub use config::ExtractorConfig;
pub use context::{ImportEntry, NameResolutionContext};
pub use expression::{Delegated, EnumBacked, Expression, StringValued};
pub use extractor::{compile_all, compile_function};
pub use parser::ExpressionParser;
pub use resolver::Resolver;
