//! Diagnostics for the hrw4u translator.
//!
//! - `SymbolResolutionError`: the typed error every resolver returns. It keeps
//!   the offending symbol and section as data, not just prose.
//! - `ErrorCode`: stable codes for searchability.
//! - `Diagnostic`: a located, renderable report built from an error.
//! - `DiagnosticQueue`: collects many diagnostics for interactive checking,
//!   where one failed statement must not hide the rest of the document.

mod diagnostic;
mod error_code;
pub mod queue;
mod resolution;

pub use diagnostic::{Diagnostic, Label};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticConfig, DiagnosticQueue};
pub use resolution::{ErrorClass, SymbolResolutionError};
