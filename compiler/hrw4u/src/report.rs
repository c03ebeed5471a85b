//! Mode-dependent failure handling shared by both drivers.

use hrw_diagnostic::{Diagnostic, DiagnosticQueue, SymbolResolutionError};
use hrw_ir::Span;

use crate::options::{CompileOptions, Mode};

pub(crate) struct Reporter {
    mode: Mode,
    queue: DiagnosticQueue,
}

impl Reporter {
    pub fn new(options: &CompileOptions) -> Self {
        Reporter {
            mode: options.mode,
            queue: DiagnosticQueue::with_config(options.diagnostics.clone()),
        }
    }

    /// Record `err` at `span`. In batch mode this hands the error back so the
    /// caller can abort with `?`.
    pub fn report(&mut self, err: SymbolResolutionError, span: Span) -> Result<(), SymbolResolutionError> {
        match self.mode {
            Mode::Batch => Err(err),
            Mode::Interactive => {
                tracing::debug!(%err, start = span.start, end = span.end, "collected diagnostic");
                self.queue.add(err.to_diagnostic(span));
                Ok(())
            }
        }
    }

    /// Unwrap `result`, reporting a failure. `Ok(None)` means the failure was
    /// collected and the construct should be skipped.
    pub fn check<T>(
        &mut self,
        result: Result<T, SymbolResolutionError>,
        span: Span,
    ) -> Result<Option<T>, SymbolResolutionError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) => self.report(err, span).map(|()| None),
        }
    }

    pub fn finish(mut self) -> Vec<Diagnostic> {
        self.queue.flush()
    }
}
