//! Driver configuration.

use hrw_diagnostic::DiagnosticConfig;
use hrw_ir::Section;
use hrw_symbols::ResolverConfig;

/// How failures are surfaced.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Mode {
    /// Stop at the first failure and return it.
    #[default]
    Batch,
    /// Turn every failure into a diagnostic and keep going.
    Interactive,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompileOptions {
    pub mode: Mode,
    pub resolver: ResolverConfig,
    pub diagnostics: DiagnosticConfig,
    /// Section assumed for decompiled rules that appear before any hook
    /// condition. The header-rewrite engine's global default.
    pub default_section: Section,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            mode: Mode::Batch,
            resolver: ResolverConfig::default(),
            diagnostics: DiagnosticConfig::default(),
            default_section: Section::ReadResponse,
        }
    }
}

impl CompileOptions {
    /// Interactive options, as used by the language server.
    pub fn interactive() -> Self {
        CompileOptions {
            mode: Mode::Interactive,
            ..CompileOptions::default()
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_default_section(mut self, section: Section) -> Self {
        self.default_section = section;
        self
    }
}
