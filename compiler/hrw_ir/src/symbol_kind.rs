//! Symbol namespaces.

use std::fmt;

/// One of the four independent symbol namespaces.
///
/// The same name string may legitimately appear in more than one namespace
/// with different meanings, so every lookup names the namespace it searches.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SymbolKind {
    /// Identifiers used in conditions (`inbound.method`, `inbound.req.X-Foo`).
    Condition,
    /// Assignment targets (`http.status = 403`).
    Operator,
    /// Function calls used as conditions (`random(100)`).
    Function,
    /// Function calls used as statements (`set-redirect(302, "...")`).
    StatementFunction,
}

impl SymbolKind {
    /// All kinds, in table order.
    pub const ALL: [SymbolKind; 4] = [
        SymbolKind::Condition,
        SymbolKind::Operator,
        SymbolKind::Function,
        SymbolKind::StatementFunction,
    ];

    /// Dense index, used to address per-kind storage.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            SymbolKind::Condition => 0,
            SymbolKind::Operator => 1,
            SymbolKind::Function => 2,
            SymbolKind::StatementFunction => 3,
        }
    }

    /// Human-readable name, as used in "Unknown condition: 'x'".
    pub const fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Condition => "condition",
            SymbolKind::Operator => "operator",
            SymbolKind::Function => "function",
            SymbolKind::StatementFunction => "statement function",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
