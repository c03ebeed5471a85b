//! Symbol tables and resolvers for the hrw4u translator.
//!
//! # Architecture
//!
//! - [`params`]: the `MapParams` descriptor and its shape metadata
//! - [`table`]: `SymbolTable`, `SymbolTables` and the derived reverse table
//! - [`builtin`]: the shipped header-rewrite vocabulary
//! - [`forward`]: `SymbolResolver`, hrw4u name to header-rewrite primitive
//! - [`inverse`]: `InverseResolver`, header-rewrite primitive to hrw4u text
//! - [`variables`]: typed state variables declared in `VARS`
//! - [`lsp`]: completion and hover built from the same tables
//!
//! Tables are process-wide and immutable after load. Each resolver owns its
//! lookup cache and variable bindings.

pub mod builtin;
mod cache;
mod config;
pub mod forward;
pub mod inverse;
pub mod lsp;
pub mod params;
pub mod table;
pub mod variables;

pub use cache::CacheStats;
pub use config::ResolverConfig;
pub use forward::{Resolve, SymbolResolver};
pub use inverse::{
    hook_to_section, parse_operator_line, DecompiledCondition, EmissionState, InverseResolve, InverseResolver, OperatorLine,
};
pub use params::{Arity, CondModifiers, MapParams, OpModifiers, OpTemplate, SuffixGroup, ValueCheck};
pub use table::{
    find_prefix_matches, get_longest_prefix_match, Lookup, ReverseAlias, SymbolTable, SymbolTables, TableData,
    TableError,
};
pub use variables::{VarType, Variable, Variables};

/// Result type for every resolver operation.
pub type Result<T> = std::result::Result<T, hrw_diagnostic::SymbolResolutionError>;
