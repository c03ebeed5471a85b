use super::*;

#[test]
fn test_intern_returns_same_instance() {
    let a = intern("inbound.req.X-Foo", PoolKind::General);
    let b = intern(&String::from("inbound.req.X-Foo"), PoolKind::General);
    assert!(std::ptr::eq(a, b));
    assert_eq!(a, "inbound.req.X-Foo");
}

#[test]
fn test_pools_are_independent() {
    let general = intern("pool-independence", PoolKind::General);
    let lsp = intern("pool-independence", PoolKind::LspField);
    assert_eq!(general, lsp);
    assert!(!std::ptr::eq(general, lsp));
}

#[test]
fn test_vocabulary_is_seeded() {
    let hooks_before = pool_len(PoolKind::Hook);
    for section in Section::ALL {
        if let Some(hook) = section.hook_name() {
            assert_eq!(intern(hook, PoolKind::Hook), hook);
        }
        assert_eq!(intern(section.name(), PoolKind::Section), section.name());
    }
    // Nothing new was registered: every hook name was already pooled.
    assert_eq!(pool_len(PoolKind::Hook), hooks_before);
    assert!(pool_len(PoolKind::Modifier) >= vocab::MODIFIERS.len());
}

#[test]
fn test_canon_identity_equality() {
    let a = Canon::new("label", PoolKind::LspField);
    let b = Canon::new("label", PoolKind::LspField);
    let other_pool = Canon::new("label", PoolKind::General);
    assert_eq!(a, b);
    assert_ne!(a, other_pool);
    assert_eq!(&*a, "label");
}

#[test]
fn test_canon_as_map_key() {
    let mut set = FxHashSet::default();
    set.insert(Canon::new("AND", PoolKind::Modifier));
    set.insert(Canon::new("AND", PoolKind::Modifier));
    set.insert(Canon::new("OR", PoolKind::Modifier));
    assert_eq!(set.len(), 2);
}

#[test]
fn test_empty_string() {
    let a = intern("", PoolKind::General);
    let b = intern("", PoolKind::General);
    assert!(std::ptr::eq(a, b));
    assert!(a.is_empty());
}
