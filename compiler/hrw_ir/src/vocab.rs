//! Closed vocabularies used to seed the canonicalization pools.
//!
//! Section and hook names come from [`Section`](crate::Section); everything
//! else the translator compares often is listed here.

/// hrw4u language keywords and variable type names.
pub const KEYWORDS: &[&str] = &[
    "if", "elif", "else", "in", "with", "break", "true", "false", "bool", "boolean", "int8",
    "int16",
];

/// Condition and operator modifiers, as written inside `[...]` in
/// header-rewrite output and after `with` in hrw4u source.
pub const MODIFIERS: &[&str] = &[
    "AND", "OR", "NOT", "NOCASE", "PRE", "SUF", "EXT", "MID", "L", "LAST", "I", "INV", "QSA",
];

/// Field names the language server builds completion and hover payloads from.
pub const LSP_FIELDS: &[&str] = &[
    "label",
    "kind",
    "detail",
    "documentation",
    "insertText",
    "range",
    "start",
    "end",
    "line",
    "character",
    "message",
    "severity",
    "source",
    "contents",
    "value",
    "markdown",
];
