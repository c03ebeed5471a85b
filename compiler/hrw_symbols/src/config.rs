//! Resolver configuration.

/// Lookup cache entries kept per symbol kind unless configured otherwise.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Per-resolver settings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResolverConfig {
    /// Maximum cached lookups per symbol kind. Zero disables caching.
    pub cache_capacity: usize,
    /// Emit a trace event for every lookup. Never changes results.
    pub debug: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            debug: false,
        }
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
