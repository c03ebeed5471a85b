//! Symbol tables.
//!
//! A [`SymbolTable`] maps hrw4u keys to descriptors for one [`SymbolKind`].
//! Exact keys are a hash lookup; prefix keys (ending in `.`) are kept sorted
//! longest first so the first match is the most specific one.
//!
//! [`SymbolTables`] bundles the four tables with the reverse table derived
//! from them. Every consistency rule is checked once at load time, so
//! resolution itself never meets an ambiguous or malformed table.

use std::sync::OnceLock;

use hrw_ir::{Section, SectionSet, SymbolKind};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use thiserror::Error;

use crate::params::{primitive_inner, MapParams, OpModifiers, OpTemplate};

/// Static input for [`SymbolTables::new`].
#[derive(Copy, Clone, Debug)]
pub struct TableData {
    pub conditions: &'static [MapParams],
    pub operators: &'static [MapParams],
    pub functions: &'static [MapParams],
    pub statements: &'static [MapParams],
    pub reverse_aliases: &'static [ReverseAlias],
}

/// A reverse-only mapping: in `sections`, a primitive decompiles to the
/// forward entry `key` even though that entry is not round-trippable.
///
/// Used where several hrw4u spellings share one primitive and the section
/// decides which one is meant.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ReverseAlias {
    pub kind: SymbolKind,
    pub key: &'static str,
    /// Primitive to match instead of the entry's own target, written like a
    /// target (`%{HEADER:`).
    pub primitive: Option<&'static str>,
    pub sections: SectionSet,
}

impl ReverseAlias {
    pub const fn new(kind: SymbolKind, key: &'static str, sections: SectionSet) -> Self {
        ReverseAlias {
            kind,
            key,
            primitive: None,
            sections,
        }
    }

    pub const fn with_primitive(mut self, primitive: &'static str) -> Self {
        self.primitive = Some(primitive);
        self
    }
}

/// Table consistency failure, reported at load time.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TableError {
    #[error("duplicate {kind} key '{key}'")]
    DuplicateKey { kind: SymbolKind, key: &'static str },

    #[error("invalid {kind} key '{key}': {reason}")]
    InvalidKey {
        kind: SymbolKind,
        key: &'static str,
        reason: &'static str,
    },

    #[error("{kind} '{key}' has no operator template")]
    MissingTemplate { kind: SymbolKind, key: &'static str },

    #[error("invalid reverse alias for {kind} '{key}': {reason}")]
    InvalidAlias {
        kind: SymbolKind,
        key: &'static str,
        reason: &'static str,
    },

    #[error("ambiguous reverse mapping for '{primitive}' in the {section} section: '{first}' and '{second}'")]
    AmbiguousReverse {
        primitive: &'static str,
        section: Section,
        first: &'static str,
        second: &'static str,
    },
}

/// A table hit: the descriptor plus the suffix after a prefix key.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Lookup<'a> {
    pub params: &'static MapParams,
    pub suffix: Option<&'a str>,
}

impl<'a> Lookup<'a> {
    /// Rebuild a hit from a descriptor previously found for `name`.
    pub(crate) fn for_name(params: &'static MapParams, name: &'a str) -> Self {
        let suffix = params.is_prefix().then(|| &name[params.key.len()..]);
        Lookup { params, suffix }
    }
}

/// One symbol namespace.
#[derive(Debug)]
pub struct SymbolTable {
    kind: SymbolKind,
    entries: &'static [MapParams],
    exact: FxHashMap<&'static str, &'static MapParams>,
    /// Prefix entries, longest key first.
    prefixes: Vec<&'static MapParams>,
}

impl SymbolTable {
    /// Build and validate a table.
    pub fn build(kind: SymbolKind, entries: &'static [MapParams]) -> Result<Self, TableError> {
        let mut seen = FxHashSet::default();
        let mut exact = FxHashMap::default();
        let mut prefixes = Vec::new();

        for params in entries {
            let key = params.key;
            if key.is_empty() || key == "." {
                return Err(TableError::InvalidKey {
                    kind,
                    key,
                    reason: "key is empty",
                });
            }
            if key.contains(char::is_whitespace) {
                return Err(TableError::InvalidKey {
                    kind,
                    key,
                    reason: "key contains whitespace",
                });
            }
            if !seen.insert(key) {
                return Err(TableError::DuplicateKey { kind, key });
            }
            if matches!(kind, SymbolKind::Operator | SymbolKind::StatementFunction)
                && params.op.is_none()
            {
                return Err(TableError::MissingTemplate { kind, key });
            }

            if params.is_prefix() {
                prefixes.push(params);
            } else {
                exact.insert(key, params);
            }
        }

        prefixes.sort_by(|a, b| b.key.len().cmp(&a.key.len()).then(a.key.cmp(b.key)));

        Ok(SymbolTable {
            kind,
            entries,
            exact,
            prefixes,
        })
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// Every descriptor, in declaration order.
    pub fn entries(&self) -> &'static [MapParams] {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptor whose key is exactly `key` (prefix keys included).
    pub fn get(&self, key: &str) -> Option<&'static MapParams> {
        self.exact
            .get(key)
            .copied()
            .or_else(|| self.prefixes.iter().copied().find(|p| p.key == key))
    }

    /// Resolve `name` to an exact entry, or else the longest prefix entry.
    pub fn lookup<'a>(&self, name: &'a str) -> Option<Lookup<'a>> {
        if let Some(&params) = self.exact.get(name) {
            return Some(Lookup {
                params,
                suffix: None,
            });
        }
        get_longest_prefix_match(name, self).map(|params| Lookup::for_name(params, name))
    }

    fn prefixes(&self) -> &[&'static MapParams] {
        &self.prefixes
    }
}

/// All prefix entries of `table` that `target` starts with, longest first.
pub fn find_prefix_matches(target: &str, table: &SymbolTable) -> SmallVec<[&'static MapParams; 4]> {
    table
        .prefixes()
        .iter()
        .copied()
        .filter(|params| target.starts_with(params.key))
        .collect()
}

/// The most specific prefix entry of `table` for `target`.
pub fn get_longest_prefix_match(target: &str, table: &SymbolTable) -> Option<&'static MapParams> {
    // Sorted longest first, and keys are unique, so the first hit wins.
    table
        .prefixes()
        .iter()
        .copied()
        .find(|params| target.starts_with(params.key))
}

/// A reverse candidate for a condition or function primitive.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ReverseEntry {
    pub params: &'static MapParams,
    pub target: &'static str,
    pub sections: SectionSet,
}

/// Which form of an operator template a command corresponds to.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum OpForm {
    Value,
    Set,
    Remove,
    Add,
    Call,
}

/// A reverse candidate for an operator command.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ReverseOp {
    pub kind: SymbolKind,
    pub params: &'static MapParams,
    pub form: OpForm,
    pub sections: SectionSet,
}

impl ReverseOp {
    /// Leading arguments fixed by the template.
    pub fn fixed(&self) -> &'static [&'static str] {
        match self.params.op {
            Some(OpTemplate::Call { fixed, .. }) => fixed,
            _ => &[],
        }
    }

    /// Modifiers that are part of the template itself.
    pub fn template_modifiers(&self) -> OpModifiers {
        match self.params.op {
            Some(OpTemplate::Call { modifiers, .. }) => modifiers,
            _ => OpModifiers::empty(),
        }
    }

    /// Accepted argument count, fixed arguments included.
    pub fn argc(&self) -> (usize, usize) {
        let suffix = usize::from(self.params.is_prefix());
        match self.form {
            OpForm::Value | OpForm::Set | OpForm::Add => (suffix + 1, suffix + 1),
            OpForm::Remove => (suffix, suffix),
            OpForm::Call => {
                let fixed = self.fixed().len();
                (
                    fixed + usize::from(self.params.arity.min),
                    fixed + usize::from(self.params.arity.max),
                )
            }
        }
    }

    /// Whether a parsed operator line can be decompiled through this entry.
    pub fn accepts(&self, args: &[&str], modifiers: OpModifiers) -> bool {
        let (min, max) = self.argc();
        if !(min..=max).contains(&args.len()) || !modifiers.contains(self.template_modifiers()) {
            return false;
        }
        self.fixed()
            .iter()
            .zip(args)
            .all(|(fixed, arg)| fixed.eq_ignore_ascii_case(arg))
    }

    fn overlaps(&self, other: &ReverseOp) -> bool {
        let (a_min, a_max) = self.argc();
        let (b_min, b_max) = other.argc();
        self.sections.intersects(other.sections)
            && a_min <= b_max
            && b_min <= a_max
            && self.template_modifiers() == other.template_modifiers()
            && self.fixed() == other.fixed()
    }
}

/// Primitive-keyed view of the forward tables, for decompilation.
#[derive(Debug, Default)]
pub(crate) struct ReverseTable {
    /// Exact condition target to candidates.
    conditions: FxHashMap<&'static str, SmallVec<[ReverseEntry; 2]>>,
    /// Prefix condition target (without the `:SUFFIX`) to candidates.
    prefixed: FxHashMap<&'static str, SmallVec<[ReverseEntry; 2]>>,
    /// Function tag to candidates.
    functions: FxHashMap<&'static str, SmallVec<[ReverseEntry; 2]>>,
    /// Command name to candidates.
    operators: FxHashMap<&'static str, SmallVec<[ReverseOp; 4]>>,
}

impl ReverseTable {
    fn build(tables: &[SymbolTable; 4], aliases: &'static [ReverseAlias]) -> Result<Self, TableError> {
        let mut reverse = ReverseTable::default();

        for table in tables {
            for params in table.entries() {
                if params.round_trip {
                    reverse.insert(table.kind(), params, params.primitive(), params.valid_sections())?;
                }
            }
        }

        for alias in aliases {
            let table = &tables[alias.kind.index()];
            let Some(params) = table.get(alias.key) else {
                return Err(TableError::InvalidAlias {
                    kind: alias.kind,
                    key: alias.key,
                    reason: "no such forward entry",
                });
            };
            if alias.sections.intersects(params.restricted) {
                return Err(TableError::InvalidAlias {
                    kind: alias.kind,
                    key: alias.key,
                    reason: "alias sections include sections where the entry is restricted",
                });
            }
            let target = alias.primitive.map_or(params.primitive(), primitive_inner);
            reverse.insert(alias.kind, params, target, alias.sections)?;
        }

        Ok(reverse)
    }

    fn insert(
        &mut self,
        kind: SymbolKind,
        params: &'static MapParams,
        target: &'static str,
        sections: SectionSet,
    ) -> Result<(), TableError> {
        let entry = ReverseEntry {
            params,
            target,
            sections,
        };
        match kind {
            SymbolKind::Condition => {
                let map = if params.is_prefix() {
                    &mut self.prefixed
                } else {
                    &mut self.conditions
                };
                let slot = map.entry(target).or_default();
                check_unambiguous(target, slot.iter().map(|e| (e.params, e.sections)), params, sections)?;
                slot.push(entry);
            }
            SymbolKind::Function => {
                let slot = self.functions.entry(target).or_default();
                check_unambiguous(target, slot.iter().map(|e| (e.params, e.sections)), params, sections)?;
                slot.push(entry);
            }
            SymbolKind::Operator | SymbolKind::StatementFunction => {
                let Some(template) = params.op else {
                    return Err(TableError::MissingTemplate {
                        kind,
                        key: params.key,
                    });
                };
                let forms: SmallVec<[(&'static str, OpForm); 3]> = match template {
                    OpTemplate::Value { cmd } => smallvec::smallvec![(cmd, OpForm::Value)],
                    OpTemplate::Keyed { set, rm, add } => {
                        let mut forms = smallvec::smallvec![(set, OpForm::Set), (rm, OpForm::Remove)];
                        if let Some(add) = add {
                            forms.push((add, OpForm::Add));
                        }
                        forms
                    }
                    OpTemplate::Call { cmd, .. } => smallvec::smallvec![(cmd, OpForm::Call)],
                };
                for (cmd, form) in forms {
                    let op = ReverseOp {
                        kind,
                        params,
                        form,
                        sections,
                    };
                    let slot = self.operators.entry(cmd).or_default();
                    if let Some(existing) = slot.iter().find(|other| other.overlaps(&op)) {
                        return Err(ambiguity(cmd, existing.params, existing.sections, params, sections));
                    }
                    slot.push(op);
                }
            }
        }
        Ok(())
    }

    /// Longest condition target matching `inner` (the text of `%{inner}`)
    /// that is valid in `section`. Returns the entry and the raw suffix.
    pub fn condition<'a>(&self, inner: &'a str, section: Section) -> Option<(ReverseEntry, Option<&'a str>)> {
        if let Some(entry) = self.find_condition(inner, false, section, None) {
            return Some((entry, None));
        }
        for (pos, _) in inner.rmatch_indices(':') {
            let (target, suffix) = (&inner[..pos], &inner[pos + 1..]);
            if let Some(entry) = self.find_condition(target, true, section, Some(suffix)) {
                return Some((entry, Some(suffix)));
            }
        }
        None
    }

    fn find_condition(
        &self,
        target: &str,
        prefix: bool,
        section: Section,
        suffix: Option<&str>,
    ) -> Option<ReverseEntry> {
        let map = if prefix { &self.prefixed } else { &self.conditions };
        map.get(target)?.iter().copied().find(|entry| {
            entry.sections.contains(section.set())
                && suffix.map_or(true, |suffix| entry.params.suffix.validate(suffix))
        })
    }

    pub fn function(&self, tag: &str, section: Section) -> Option<ReverseEntry> {
        self.functions
            .get(tag)?
            .iter()
            .copied()
            .find(|entry| entry.sections.contains(section.set()))
    }

    pub fn operators(&self, cmd: &str) -> &[ReverseOp] {
        self.operators.get(cmd).map_or(&[], |ops| ops.as_slice())
    }
}

fn check_unambiguous(
    primitive: &'static str,
    existing: impl Iterator<Item = (&'static MapParams, SectionSet)>,
    params: &'static MapParams,
    sections: SectionSet,
) -> Result<(), TableError> {
    for (other, other_sections) in existing {
        if other_sections.intersects(sections) {
            return Err(ambiguity(primitive, other, other_sections, params, sections));
        }
    }
    Ok(())
}

fn ambiguity(
    primitive: &'static str,
    first: &'static MapParams,
    first_sections: SectionSet,
    second: &'static MapParams,
    second_sections: SectionSet,
) -> TableError {
    let section = first_sections
        .intersection(second_sections)
        .sections()
        .next()
        .unwrap_or(Section::Vars);
    TableError::AmbiguousReverse {
        primitive,
        section,
        first: first.key,
        second: second.key,
    }
}

/// The four symbol tables plus their reverse view.
#[derive(Debug)]
pub struct SymbolTables {
    tables: [SymbolTable; 4],
    reverse: ReverseTable,
}

impl SymbolTables {
    /// Build and validate all tables from `data`.
    pub fn new(data: &'static TableData) -> Result<Self, TableError> {
        let tables = [
            SymbolTable::build(SymbolKind::Condition, data.conditions)?,
            SymbolTable::build(SymbolKind::Operator, data.operators)?,
            SymbolTable::build(SymbolKind::Function, data.functions)?,
            SymbolTable::build(SymbolKind::StatementFunction, data.statements)?,
        ];
        let reverse = ReverseTable::build(&tables, data.reverse_aliases)?;
        tracing::debug!(
            conditions = tables[0].len(),
            operators = tables[1].len(),
            functions = tables[2].len(),
            statements = tables[3].len(),
            "symbol tables loaded"
        );
        Ok(SymbolTables { tables, reverse })
    }

    /// Build `data` and leak it for the lifetime of the process.
    pub fn leak(data: &'static TableData) -> Result<&'static SymbolTables, TableError> {
        Ok(Box::leak(Box::new(SymbolTables::new(data)?)))
    }

    /// The shipped tables, built on first use.
    ///
    /// # Panics
    ///
    /// Panics if the built-in data fails validation, which the test suite rules out.
    pub fn builtin() -> &'static SymbolTables {
        static BUILTIN: OnceLock<Result<SymbolTables, TableError>> = OnceLock::new();
        match BUILTIN.get_or_init(|| SymbolTables::new(&crate::builtin::DATA)) {
            Ok(tables) => tables,
            Err(err) => panic!("built-in symbol tables are inconsistent: {err}"),
        }
    }

    pub fn table(&self, kind: SymbolKind) -> &SymbolTable {
        &self.tables[kind.index()]
    }

    pub(crate) fn reverse(&self) -> &ReverseTable {
        &self.reverse
    }
}
