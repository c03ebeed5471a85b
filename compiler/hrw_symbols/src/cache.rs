//! Bounded lookup memoization.
//!
//! One FIFO-evicting map per symbol kind, keyed by symbol name. A cached
//! value is the table descriptor the name resolved to (or `None` when the
//! name is in no table); section checks and suffix validation always run
//! afresh, so a hit can never change a result.

use std::collections::VecDeque;

use hrw_ir::SymbolKind;
use rustc_hash::FxHashMap;

use crate::params::MapParams;

/// Hit and miss counters, for tests and debug output.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
struct KindCache {
    map: FxHashMap<Box<str>, Option<&'static MapParams>>,
    order: VecDeque<Box<str>>,
}

#[derive(Debug)]
pub(crate) struct LookupCache {
    capacity: usize,
    kinds: [KindCache; 4],
    hits: u64,
    misses: u64,
}

impl LookupCache {
    pub fn new(capacity: usize) -> Self {
        LookupCache {
            capacity,
            kinds: Default::default(),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached result for `name`, computing and storing it on a miss.
    pub fn get_or_insert_with(
        &mut self,
        kind: SymbolKind,
        name: &str,
        compute: impl FnOnce() -> Option<&'static MapParams>,
    ) -> Option<&'static MapParams> {
        if self.capacity == 0 {
            self.misses += 1;
            return compute();
        }

        let cache = &mut self.kinds[kind.index()];
        if let Some(&cached) = cache.map.get(name) {
            self.hits += 1;
            return cached;
        }

        self.misses += 1;
        let value = compute();
        tracing::debug!(%kind, name, found = value.is_some(), "symbol cache miss");

        if cache.order.len() >= self.capacity {
            if let Some(evicted) = cache.order.pop_front() {
                cache.map.remove(&evicted);
            }
        }
        let key: Box<str> = name.into();
        cache.order.push_back(key.clone());
        cache.map.insert(key, value);
        value
    }

    /// Drop every cached lookup. Counters are kept.
    pub fn clear(&mut self) {
        for cache in &mut self.kinds {
            cache.map.clear();
            cache.order.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.kinds.iter().map(|c| c.map.len()).sum(),
        }
    }
}

#[cfg(test)]
mod tests;
