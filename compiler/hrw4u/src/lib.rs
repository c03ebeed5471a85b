//! hrw4u translator core.
//!
//! Drives the symbol resolvers over whole documents in both directions:
//!
//! ```text
//! Document (parsed hrw4u) ──compile──► header-rewrite config text
//! header-rewrite config   ──decompile──► hrw4u text
//! ```
//!
//! Parsing hrw4u source is the front end's job; it hands over a [`Document`].
//! Every symbol goes through [`hrw_symbols`], and every failure is either
//! returned (batch mode) or collected as a [`Diagnostic`] (interactive mode).

use std::sync::Once;

pub mod ast;
mod compile;
mod decompile;
mod options;
mod report;

pub use ast::{
    Comparable, CompareOp, Comparison, Connective, Document, ElifClause, Factor, IfBlock, Item, SectionBlock, Statement,
    Term, VarDecl,
};
pub use compile::compile;
pub use decompile::decompile;
pub use hrw_diagnostic::{Diagnostic, DiagnosticConfig, SymbolResolutionError};
pub use options::{CompileOptions, Mode};

/// Translated text plus the diagnostics collected on the way.
///
/// In batch mode `diagnostics` is always empty: the first failure is
/// returned as an error instead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Output {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl Output {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing from `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set. With `HRW4U_TRACE_TREE` also set,
/// events are printed as an indented span tree. Safe to call repeatedly.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        if std::env::var_os("HRW4U_TRACE_TREE").is_some() {
            tracing_subscriber::registry()
                .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
                .with(filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
