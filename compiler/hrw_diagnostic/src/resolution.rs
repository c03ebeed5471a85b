//! The typed error raised by the forward and inverse resolvers.

use hrw_ir::{Section, Span, SymbolKind};
use thiserror::Error;

use crate::{Diagnostic, ErrorCode};

/// Which side of the translation a failure belongs to.
///
/// Callers use this to tell "this hrw4u is invalid" apart from "this
/// header-rewrite config cannot be decompiled".
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorClass {
    InvalidSource,
    NotDecompilable,
}

/// A symbol lookup failure.
///
/// Every variant carries the offending name as data; restriction and inverse
/// failures also carry the section, so a language server can build a precise
/// diagnostic without parsing the message.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Error)]
pub enum SymbolResolutionError {
    /// The name is not in any table searched for this kind.
    #[error("Unknown {kind}: '{name}'")]
    Unknown { kind: SymbolKind, name: String },

    /// The name exists but is restricted in the current section.
    #[error("{name} is not available in the {section} section")]
    Restricted { name: String, section: Section },

    /// A prefix symbol matched but its suffix is not a known field.
    #[error("invalid suffix '{suffix}' for {prefix}")]
    InvalidSuffix {
        name: String,
        prefix: String,
        suffix: String,
    },

    /// Wrong argument count or an argument/value that fails validation.
    #[error("{name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    /// A `VARS` declaration that cannot be honoured.
    #[error("cannot declare variable '{name}': {reason}")]
    InvalidVariable { name: String, reason: String },

    /// Inverse resolution found no hrw4u equivalent for a primitive.
    #[error("no hrw4u equivalent for '{primitive}' in the {section} section")]
    NotDecompilable { primitive: String, section: Section },
}

impl SymbolResolutionError {
    pub fn unknown(kind: SymbolKind, name: impl Into<String>) -> Self {
        SymbolResolutionError::Unknown {
            kind,
            name: name.into(),
        }
    }

    pub fn restricted(name: impl Into<String>, section: Section) -> Self {
        SymbolResolutionError::Restricted {
            name: name.into(),
            section,
        }
    }

    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        SymbolResolutionError::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn not_decompilable(primitive: impl Into<String>, section: Section) -> Self {
        SymbolResolutionError::NotDecompilable {
            primitive: primitive.into(),
            section,
        }
    }

    /// The offending symbol (or primitive, for inverse failures).
    pub fn symbol(&self) -> &str {
        match self {
            SymbolResolutionError::Unknown { name, .. }
            | SymbolResolutionError::Restricted { name, .. }
            | SymbolResolutionError::InvalidSuffix { name, .. }
            | SymbolResolutionError::InvalidArgument { name, .. }
            | SymbolResolutionError::InvalidVariable { name, .. } => name,
            SymbolResolutionError::NotDecompilable { primitive, .. } => primitive,
        }
    }

    /// The section the failure is tied to, when there is one.
    pub fn section(&self) -> Option<Section> {
        match self {
            SymbolResolutionError::Restricted { section, .. }
            | SymbolResolutionError::NotDecompilable { section, .. } => Some(*section),
            _ => None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            SymbolResolutionError::Unknown { .. } => ErrorCode::E1001,
            SymbolResolutionError::Restricted { .. } => ErrorCode::E1002,
            SymbolResolutionError::InvalidSuffix { .. } => ErrorCode::E1003,
            SymbolResolutionError::InvalidArgument { .. } => ErrorCode::E1004,
            SymbolResolutionError::InvalidVariable { .. } => ErrorCode::E1006,
            SymbolResolutionError::NotDecompilable { .. } => ErrorCode::E2001,
        }
    }

    pub fn class(&self) -> ErrorClass {
        if self.is_inverse_miss() {
            ErrorClass::NotDecompilable
        } else {
            ErrorClass::InvalidSource
        }
    }

    /// Whether this is an inverse-resolution miss.
    pub fn is_inverse_miss(&self) -> bool {
        matches!(self, SymbolResolutionError::NotDecompilable { .. })
    }

    /// Build a diagnostic located at `span`.
    pub fn to_diagnostic(&self, span: Span) -> Diagnostic {
        let code = self.code();
        let mut diag = Diagnostic::error(code)
            .with_message(self.to_string())
            .with_label(span, code.description());
        if let Some(section) = self.section() {
            diag = diag.with_note(format!("Current section: {section}"));
        }
        if let SymbolResolutionError::Unknown { kind, .. } = self {
            diag = diag.with_note(format!("searched the {kind} table"));
        }
        diag
    }
}
