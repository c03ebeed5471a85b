use super::*;
use pretty_assertions::assert_eq;

static ENTRY: MapParams = MapParams::new("inbound.method", "%{METHOD}");

#[test]
fn test_hit_after_miss() {
    let mut cache = LookupCache::new(4);
    let mut computed = 0;

    for _ in 0..3 {
        let found = cache.get_or_insert_with(SymbolKind::Condition, "inbound.method", || {
            computed += 1;
            Some(&ENTRY)
        });
        assert_eq!(found.map(|p| p.key), Some("inbound.method"));
    }

    assert_eq!(computed, 1);
    assert_eq!(
        cache.stats(),
        CacheStats {
            hits: 2,
            misses: 1,
            entries: 1
        }
    );
}

#[test]
fn test_absent_results_are_cached() {
    let mut cache = LookupCache::new(4);
    assert_eq!(cache.get_or_insert_with(SymbolKind::Condition, "NOPE", || None), None);
    assert_eq!(
        cache.get_or_insert_with(SymbolKind::Condition, "NOPE", || Some(&ENTRY)),
        None
    );
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn test_kinds_are_separate() {
    let mut cache = LookupCache::new(4);
    cache.get_or_insert_with(SymbolKind::Condition, "cache", || Some(&ENTRY));
    let function = cache.get_or_insert_with(SymbolKind::Function, "cache", || None);
    assert_eq!(function, None);
    assert_eq!(cache.stats().entries, 2);
}

#[test]
fn test_fifo_eviction() {
    let mut cache = LookupCache::new(2);
    for name in ["a", "b", "c"] {
        cache.get_or_insert_with(SymbolKind::Operator, name, || None);
    }
    assert_eq!(cache.stats().entries, 2);

    // "a" was evicted first, so it is computed again.
    let mut recomputed = false;
    cache.get_or_insert_with(SymbolKind::Operator, "a", || {
        recomputed = true;
        None
    });
    assert!(recomputed);
}

#[test]
fn test_zero_capacity_disables_caching() {
    let mut cache = LookupCache::new(0);
    cache.get_or_insert_with(SymbolKind::Condition, "x", || None);
    cache.get_or_insert_with(SymbolKind::Condition, "x", || None);
    assert_eq!(
        cache.stats(),
        CacheStats {
            hits: 0,
            misses: 2,
            entries: 0
        }
    );
}

#[test]
fn test_clear() {
    let mut cache = LookupCache::new(8);
    cache.get_or_insert_with(SymbolKind::Condition, "x", || None);
    cache.clear();
    assert_eq!(cache.stats().entries, 0);
    assert_eq!(cache.stats().misses, 1);
}
