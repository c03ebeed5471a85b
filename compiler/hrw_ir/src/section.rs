//! Section model: the closed set of request-processing hooks.
//!
//! Every symbol lookup is evaluated against the section it appears in. A
//! section is a value type; `SectionSet` is the bitset used by symbol
//! descriptors to record where a symbol is restricted.

use std::fmt;
use std::str::FromStr;

/// A named request-processing stage (hook point).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Section {
    PreRemap,
    Remap,
    ReadRequest,
    SendRequest,
    ReadResponse,
    SendResponse,
    TxnStart,
    TxnClose,
    /// Variable declarations. Not a hook; no condition or operator is legal here.
    Vars,
}

impl Section {
    /// All sections, in request-processing order.
    pub const ALL: [Section; 9] = [
        Section::TxnStart,
        Section::PreRemap,
        Section::Remap,
        Section::ReadRequest,
        Section::SendRequest,
        Section::ReadResponse,
        Section::SendResponse,
        Section::TxnClose,
        Section::Vars,
    ];

    /// Section name as written in hrw4u source (`READ_RESPONSE { ... }`).
    pub const fn name(self) -> &'static str {
        match self {
            Section::PreRemap => "PRE_REMAP",
            Section::Remap => "REMAP",
            Section::ReadRequest => "READ_REQUEST",
            Section::SendRequest => "SEND_REQUEST",
            Section::ReadResponse => "READ_RESPONSE",
            Section::SendResponse => "SEND_RESPONSE",
            Section::TxnStart => "TXN_START",
            Section::TxnClose => "TXN_CLOSE",
            Section::Vars => "VARS",
        }
    }

    /// Hook name used by the header-rewrite engine (`cond %{HOOK}`).
    ///
    /// `VARS` has no hook.
    pub const fn hook_name(self) -> Option<&'static str> {
        match self {
            Section::PreRemap => Some("READ_REQUEST_PRE_REMAP_HOOK"),
            Section::Remap => Some("REMAP_PSEUDO_HOOK"),
            Section::ReadRequest => Some("READ_REQUEST_HDR_HOOK"),
            Section::SendRequest => Some("SEND_REQUEST_HDR_HOOK"),
            Section::ReadResponse => Some("READ_RESPONSE_HDR_HOOK"),
            Section::SendResponse => Some("SEND_RESPONSE_HDR_HOOK"),
            Section::TxnStart => Some("TXN_START_HOOK"),
            Section::TxnClose => Some("TXN_CLOSE_HOOK"),
            Section::Vars => None,
        }
    }

    /// Map a header-rewrite hook name back to its section.
    ///
    /// Accepts the short forms the engine also understands
    /// (`READ_REQUEST_HOOK`, `SEND_RESPONSE_HOOK`, ...).
    pub fn from_hook(hook: &str) -> Option<Section> {
        let section = match hook {
            "READ_REQUEST_PRE_REMAP_HOOK" => Section::PreRemap,
            "REMAP_PSEUDO_HOOK" => Section::Remap,
            "READ_REQUEST_HDR_HOOK" | "READ_REQUEST_HOOK" => Section::ReadRequest,
            "SEND_REQUEST_HDR_HOOK" | "SEND_REQUEST_HOOK" => Section::SendRequest,
            "READ_RESPONSE_HDR_HOOK" | "READ_RESPONSE_HOOK" => Section::ReadResponse,
            "SEND_RESPONSE_HDR_HOOK" | "SEND_RESPONSE_HOOK" => Section::SendResponse,
            "TXN_START_HOOK" => Section::TxnStart,
            "TXN_CLOSE_HOOK" => Section::TxnClose,
            _ => return None,
        };
        Some(section)
    }

    /// Singleton set containing this section.
    #[inline]
    pub const fn set(self) -> SectionSet {
        SectionSet::from_bits_retain(1 << self.index())
    }

    #[inline]
    const fn index(self) -> u16 {
        match self {
            Section::PreRemap => 0,
            Section::Remap => 1,
            Section::ReadRequest => 2,
            Section::SendRequest => 3,
            Section::ReadResponse => 4,
            Section::SendResponse => 5,
            Section::TxnStart => 6,
            Section::TxnClose => 7,
            Section::Vars => 8,
        }
    }

    /// Whether HTTP transaction headers exist in this section.
    pub const fn is_http(self) -> bool {
        SectionSet::HTTP.contains(self.set())
    }

    /// One-paragraph description for hover text.
    pub const fn description(self) -> &'static str {
        match self {
            Section::PreRemap => "Runs after the client request is read, before remapping.",
            Section::Remap => "Runs as part of the remap rule evaluation.",
            Section::ReadRequest => "Runs after the client request headers are read and remapped.",
            Section::SendRequest => "Runs before the request is sent to the origin server.",
            Section::ReadResponse => "Runs after the origin response headers are read.",
            Section::SendResponse => "Runs before the response is sent to the client.",
            Section::TxnStart => "Runs at the start of the transaction, before any headers exist.",
            Section::TxnClose => "Runs when the transaction is closed.",
            Section::Vars => "Declares typed state variables shared by all sections.",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognized section name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseSectionError(pub String);

impl fmt::Display for ParseSectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid section name: '{}'", self.0)
    }
}

impl std::error::Error for ParseSectionError {}

impl FromStr for Section {
    type Err = ParseSectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseSectionError(s.to_owned()))
    }
}

bitflags::bitflags! {
    /// A set of sections.
    ///
    /// Symbol descriptors store the sections where a symbol is *restricted*
    /// (deny-list polarity); the empty set means "valid everywhere".
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SectionSet: u16 {
        const PRE_REMAP = 1 << 0;
        const REMAP = 1 << 1;
        const READ_REQUEST = 1 << 2;
        const SEND_REQUEST = 1 << 3;
        const READ_RESPONSE = 1 << 4;
        const SEND_RESPONSE = 1 << 5;
        const TXN_START = 1 << 6;
        const TXN_CLOSE = 1 << 7;
        const VARS = 1 << 8;

        /// Client request hooks, before the origin is contacted.
        const CLIENT_REQUEST = Self::PRE_REMAP.bits() | Self::REMAP.bits() | Self::READ_REQUEST.bits();
        /// Every hook where HTTP transaction headers are available.
        const HTTP = Self::CLIENT_REQUEST.bits()
            | Self::SEND_REQUEST.bits()
            | Self::READ_RESPONSE.bits()
            | Self::SEND_RESPONSE.bits();
        /// Every hook (everything except `VARS`).
        const HOOKS = Self::HTTP.bits() | Self::TXN_START.bits() | Self::TXN_CLOSE.bits();
    }
}

impl SectionSet {
    /// Sections in this set, in `Section::ALL` order.
    pub fn sections(self) -> impl Iterator<Item = Section> {
        Section::ALL
            .into_iter()
            .filter(move |section| self.contains(section.set()))
    }

    /// Deny-list for a symbol that is only available in `allowed`.
    ///
    /// `VARS` is always part of the result.
    #[inline]
    pub const fn only(allowed: SectionSet) -> SectionSet {
        allowed.complement().union(SectionSet::VARS)
    }
}

impl fmt::Display for SectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for section in self.sections() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            f.write_str(section.name())?;
        }
        Ok(())
    }
}

/// Whether `section` is a member of `restriction_set`.
///
/// Pure and total; every validation path goes through this.
#[inline]
pub fn is_member(section: Section, restriction_set: SectionSet) -> bool {
    restriction_set.contains(section.set())
}
