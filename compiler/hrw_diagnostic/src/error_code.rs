use std::fmt;

/// Error codes for all translator diagnostics.
///
/// Format: E#### where first digit indicates direction:
/// - E1xxx: Forward resolution (the hrw4u source is invalid)
/// - E2xxx: Inverse resolution (the header-rewrite input cannot be decompiled)
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorCode {
    /// Unknown symbol
    E1001,
    /// Symbol not available in this section
    E1002,
    /// Invalid suffix for a prefix symbol
    E1003,
    /// Invalid argument or argument count
    E1004,
    /// Invalid variable declaration
    E1006,

    /// No hrw4u equivalent for a primitive
    E2001,
}

impl ErrorCode {
    /// Get the string representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E2001 => "E2001",
        }
    }

    /// Short description, used as the diagnostic title.
    pub const fn description(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "unknown symbol",
            ErrorCode::E1002 => "symbol not available in this section",
            ErrorCode::E1003 => "invalid suffix",
            ErrorCode::E1004 => "invalid argument",
            ErrorCode::E1006 => "invalid variable declaration",
            ErrorCode::E2001 => "cannot decompile primitive",
        }
    }

    /// Whether this code reports a decompilation failure rather than bad source.
    pub const fn is_inverse(&self) -> bool {
        matches!(self, ErrorCode::E2001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
