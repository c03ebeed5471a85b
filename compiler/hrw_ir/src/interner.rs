//! Canonicalization pool for frequently repeated strings.
//!
//! Keywords, section names, hook names, modifiers and LSP field names are
//! compared and hashed constantly by the resolvers and the language server.
//! Interning them hands back one shared `&'static str` per distinct string and
//! pool, so equality can be a pointer comparison.
//!
//! # Lifetime
//!
//! The pools are process-wide and seeded from the closed vocabulary on first
//! use. Strings are leaked on first sight and never evicted. This is bounded
//! growth, not a leak: the vocabulary is closed and small. Each pool carries a
//! soft limit that logs a warning once if a caller starts feeding it unbounded
//! input (for example, raw document text).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use crate::{vocab, Section};

/// Entries per pool above which a one-time warning is logged.
const POOL_SOFT_LIMIT: usize = 4096;

/// Named sub-pool. Equal text interned in different pools is not shared.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum PoolKind {
    Keyword,
    Section,
    Hook,
    Modifier,
    LspField,
    #[default]
    General,
}

impl PoolKind {
    const COUNT: usize = 6;

    #[inline]
    const fn index(self) -> usize {
        match self {
            PoolKind::Keyword => 0,
            PoolKind::Section => 1,
            PoolKind::Hook => 2,
            PoolKind::Modifier => 3,
            PoolKind::LspField => 4,
            PoolKind::General => 5,
        }
    }
}

struct CanonPools {
    pools: [RwLock<FxHashSet<&'static str>>; PoolKind::COUNT],
    warned: [AtomicBool; PoolKind::COUNT],
}

impl CanonPools {
    fn seeded() -> Self {
        let mut sets: [FxHashSet<&'static str>; PoolKind::COUNT] =
            std::array::from_fn(|_| FxHashSet::default());

        sets[PoolKind::Keyword.index()].extend(vocab::KEYWORDS.iter().copied());
        sets[PoolKind::Modifier.index()].extend(vocab::MODIFIERS.iter().copied());
        sets[PoolKind::LspField.index()].extend(vocab::LSP_FIELDS.iter().copied());
        for section in Section::ALL {
            sets[PoolKind::Section.index()].insert(section.name());
            if let Some(hook) = section.hook_name() {
                sets[PoolKind::Hook.index()].insert(hook);
            }
        }

        CanonPools {
            pools: sets.map(RwLock::new),
            warned: std::array::from_fn(|_| AtomicBool::new(false)),
        }
    }

    fn intern(&self, raw: &str, kind: PoolKind) -> &'static str {
        let pool = &self.pools[kind.index()];

        // Fast path: already interned
        if let Some(&existing) = pool.read().get(raw) {
            return existing;
        }

        let mut guard = pool.write();

        // Double-check after acquiring write lock
        if let Some(&existing) = guard.get(raw) {
            return existing;
        }

        let leaked: &'static str = Box::leak(raw.to_owned().into_boxed_str());
        guard.insert(leaked);

        if guard.len() > POOL_SOFT_LIMIT && !self.warned[kind.index()].swap(true, Ordering::Relaxed)
        {
            tracing::warn!(
                pool = ?kind,
                entries = guard.len(),
                "canonicalization pool exceeded its soft limit; is unbounded input being interned?"
            );
        }
        leaked
    }

    fn len(&self, kind: PoolKind) -> usize {
        self.pools[kind.index()].read().len()
    }
}

static POOLS: OnceLock<CanonPools> = OnceLock::new();

fn pools() -> &'static CanonPools {
    POOLS.get_or_init(CanonPools::seeded)
}

/// Intern `raw` in `pool`, returning the shared instance.
///
/// Two calls with equal text and the same pool return pointer-identical
/// slices. Never fails.
#[inline]
pub fn intern(raw: &str, pool: PoolKind) -> &'static str {
    pools().intern(raw, pool)
}

/// Number of distinct strings currently held by `pool`.
pub fn pool_len(pool: PoolKind) -> usize {
    pools().len(pool)
}

/// A canonical string: equality and hashing use the pointer, not the text.
///
/// Only compare `Canon` values interned in the same pool; the same text in
/// two pools yields two distinct handles.
#[derive(Copy, Clone)]
pub struct Canon(&'static str);

impl Canon {
    /// Intern `raw` in `pool` and wrap the shared instance.
    #[inline]
    pub fn new(raw: &str, pool: PoolKind) -> Self {
        Canon(intern(raw, pool))
    }

    #[inline]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl PartialEq for Canon {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for Canon {}

impl Hash for Canon {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.0, state);
    }
}

impl std::ops::Deref for Canon {
    type Target = str;

    fn deref(&self) -> &str {
        self.0
    }
}

impl fmt::Debug for Canon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Canon({:?})", self.0)
    }
}

impl fmt::Display for Canon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests;
