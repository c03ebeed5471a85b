//! hrw4u IR - shared vocabulary types
//!
//! This crate contains the leaf data structures every other hrw4u crate
//! builds on:
//! - `Section` and `SectionSet` for hook-scoped symbol validity
//! - `SymbolKind` selecting one of the four symbol namespaces
//! - `Span` for diagnostic locations
//! - The canonicalization pool (`intern`, `Canon`, `PoolKind`)
//!
//! # Design Philosophy
//!
//! - **Closed vocabularies are enums**: sections, symbol kinds and pool kinds
//!   never grow at runtime.
//! - **Intern repeated strings**: keywords, section and hook names, modifiers
//!   and LSP field names are pooled once and compared by identity.

mod interner;
mod section;
mod span;
mod symbol_kind;
pub mod vocab;

pub use interner::{intern, pool_len, Canon, PoolKind};
pub use section::{is_member, ParseSectionError, Section, SectionSet};
pub use span::{Span, SpanError};
pub use symbol_kind::SymbolKind;
