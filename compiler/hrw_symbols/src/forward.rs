//! Forward resolution: hrw4u symbols to header-rewrite primitives.
//!
//! The parser calls into a [`Resolve`] implementation once per construct.
//! Every call validates the symbol against the section it appears in and
//! either returns the primitive text or a [`SymbolResolutionError`] naming the
//! symbol and section.

use hrw_diagnostic::SymbolResolutionError;
use hrw_ir::{intern, PoolKind, Section, SymbolKind};
use parking_lot::{Mutex, RwLock};

use crate::cache::{CacheStats, LookupCache};
use crate::config::ResolverConfig;
use crate::params::{unquote, MapParams, OpModifiers, OpTemplate, ValueCheck};
use crate::table::{Lookup, SymbolTables};
use crate::variables::{VarType, Variable, Variables};
use crate::Result;

/// Forward resolver protocol.
pub trait Resolve {
    /// Resolve an identifier used as a condition.
    ///
    /// Returns the condition text and whether a bare use is negatable.
    fn resolve_condition(&self, name: &str, section: Section) -> Result<(String, bool)>;

    /// Resolve `name = value`. An empty value on a keyed operator removes.
    fn resolve_assignment(&self, name: &str, value: &str, section: Section) -> Result<String>;

    /// Resolve `name += value`.
    fn resolve_add_assignment(&self, name: &str, value: &str, section: Section) -> Result<String>;

    /// Resolve a function call used inside a condition.
    fn resolve_function(&self, name: &str, args: &[&str], section: Section) -> Result<String>;

    /// Resolve a function call used as a statement.
    fn resolve_statement_function(&self, name: &str, args: &[&str], section: Section) -> Result<String>;

    /// Hook name for `section`; `None` for `VARS`.
    fn map_hook(&self, section: Section) -> Option<&'static str>;
}

/// Resolver over a set of symbol tables, with its own lookup cache and
/// variable bindings.
pub struct SymbolResolver {
    tables: &'static SymbolTables,
    config: ResolverConfig,
    cache: Mutex<LookupCache>,
    variables: RwLock<Variables>,
}

impl Default for SymbolResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolResolver {
    /// Resolver over the built-in tables with default configuration.
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        Self::with_tables(SymbolTables::builtin(), config)
    }

    pub fn with_tables(tables: &'static SymbolTables, config: ResolverConfig) -> Self {
        SymbolResolver {
            tables,
            config,
            cache: Mutex::new(LookupCache::new(config.cache_capacity)),
            variables: RwLock::new(Variables::new()),
        }
    }

    pub fn tables(&self) -> &'static SymbolTables {
        self.tables
    }

    pub fn config(&self) -> ResolverConfig {
        self.config
    }

    /// Drop every memoized lookup.
    pub fn invalidate(&self) {
        self.cache.lock().clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    /// Declare a `VARS` variable, binding it to the next free slot.
    pub fn declare_variable(&self, name: &str, ty: VarType) -> Result<Variable> {
        self.variables.write().declare(name, ty).cloned()
    }

    /// Snapshot of the declared variables.
    pub fn variables(&self) -> Variables {
        self.variables.read().clone()
    }

    /// The declared variable called `name`.
    pub fn variable(&self, name: &str) -> Option<Variable> {
        self.variables.read().get(name).cloned()
    }

    /// Table lookup through the cache. No section check.
    fn lookup<'a>(&self, kind: SymbolKind, name: &'a str) -> Option<Lookup<'a>> {
        let table = self.tables.table(kind);
        let params = self
            .cache
            .lock()
            .get_or_insert_with(kind, name, || table.lookup(name).map(|hit| hit.params))?;
        if self.config.debug {
            tracing::trace!(%kind, name, key = params.key, "symbol lookup");
        }
        Some(Lookup::for_name(params, name))
    }

    /// Look `name` up in one table and validate it for `section`.
    fn resolve_in<'a>(&self, kind: SymbolKind, name: &'a str, section: Section) -> Result<Option<Lookup<'a>>> {
        let Some(hit) = self.lookup(kind, name) else {
            return Ok(None);
        };
        if !hit.params.is_valid_in(section) {
            return Err(SymbolResolutionError::restricted(name, section));
        }
        if let Some(suffix) = hit.suffix {
            if !hit.params.suffix.validate(suffix) {
                return Err(SymbolResolutionError::InvalidSuffix {
                    name: name.to_owned(),
                    prefix: hit.params.key.to_owned(),
                    suffix: suffix.to_owned(),
                });
            }
        }
        Ok(Some(hit))
    }

    fn declared_variable(&self, name: &str, section: Section) -> Result<Option<Variable>> {
        match self.variable(name) {
            Some(_) if section == Section::Vars => Err(SymbolResolutionError::restricted(name, section)),
            found => Ok(found),
        }
    }

    fn function_primitive(&self, name: &str, args: &[&str], section: Section, quotes: ArgQuotes) -> Result<String> {
        let Some(hit) = self.resolve_in(SymbolKind::Function, name, section)? else {
            return Err(SymbolResolutionError::unknown(SymbolKind::Function, name));
        };
        check_arity(hit.params, args.len())?;
        Ok(render_function(hit.params, args, quotes))
    }

    /// Substitute `{ident}` and `{func(args)}` inside a string with the
    /// primitives they resolve to in `section`.
    ///
    /// Braces that do not enclose an identifier or call are kept verbatim.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn expand_interpolations(&self, text: &str, section: Section) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match parse_interpolation(after) {
                Some((Interpolation::Ident(ident), consumed)) => {
                    out.push_str(&self.resolve_condition(ident, section)?.0);
                    rest = &after[consumed..];
                }
                Some((Interpolation::Call(name, args), consumed)) => {
                    let args: Vec<&str> = split_args(args);
                    out.push_str(&self.function_primitive(name, &args, section, ArgQuotes::Keep)?);
                    rest = &after[consumed..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    }
}

impl Resolve for SymbolResolver {
    #[tracing::instrument(level = "trace", skip(self))]
    fn resolve_condition(&self, name: &str, section: Section) -> Result<(String, bool)> {
        if let Some(var) = self.declared_variable(name, section)? {
            return Ok((var.condition_target(), var.is_negatable()));
        }

        if let Some(hit) = self.resolve_in(SymbolKind::Condition, name, section)? {
            let target = hit.params.render_target(hit.suffix);
            if self.config.debug {
                tracing::debug!(name, %section, %target, "resolved condition");
            }
            return Ok((target, hit.params.default_expr));
        }

        // Bare function use, e.g. `if internal { ... }`.
        if let Some(hit) = self.resolve_in(SymbolKind::Function, name, section)? {
            check_arity(hit.params, 0)?;
            return Ok((render_function(hit.params, &[], ArgQuotes::Strip), hit.params.default_expr));
        }

        Err(SymbolResolutionError::unknown(SymbolKind::Condition, name))
    }

    #[tracing::instrument(level = "trace", skip(self))]
    fn resolve_assignment(&self, name: &str, value: &str, section: Section) -> Result<String> {
        if let Some(var) = self.declared_variable(name, section)? {
            return var.assign(value);
        }

        if let Some(hit) = self.resolve_in(SymbolKind::Operator, name, section)? {
            return render_assignment(&hit, name, value);
        }

        if let Some(hit) = self.resolve_in(SymbolKind::StatementFunction, name, section)? {
            return render_call(hit.params, &[value]);
        }

        Err(SymbolResolutionError::unknown(SymbolKind::Operator, name))
    }

    #[tracing::instrument(level = "trace", skip(self))]
    fn resolve_add_assignment(&self, name: &str, value: &str, section: Section) -> Result<String> {
        if self.declared_variable(name, section)?.is_some() {
            return Err(SymbolResolutionError::invalid_argument(
                name,
                "cannot use += with variables",
            ));
        }

        let Some(hit) = self.resolve_in(SymbolKind::Operator, name, section)? else {
            return Err(SymbolResolutionError::unknown(SymbolKind::Operator, name));
        };
        match hit.params.op {
            Some(OpTemplate::Keyed { add: Some(add), .. }) => {
                check_value(hit.params, name, value)?;
                Ok(join_command(add, hit.suffix.map(|s| hit.params.normalize_suffix(s)), value))
            }
            _ => Err(SymbolResolutionError::invalid_argument(
                name,
                "+= is not supported for this operator",
            )),
        }
    }

    #[tracing::instrument(level = "trace", skip(self))]
    fn resolve_function(&self, name: &str, args: &[&str], section: Section) -> Result<String> {
        self.function_primitive(name, args, section, ArgQuotes::Strip)
    }

    #[tracing::instrument(level = "trace", skip(self))]
    fn resolve_statement_function(&self, name: &str, args: &[&str], section: Section) -> Result<String> {
        let Some(hit) = self.resolve_in(SymbolKind::StatementFunction, name, section)? else {
            return Err(SymbolResolutionError::unknown(SymbolKind::StatementFunction, name));
        };
        render_call(hit.params, args)
    }

    fn map_hook(&self, section: Section) -> Option<&'static str> {
        section.hook_name().map(|hook| intern(hook, PoolKind::Hook))
    }
}

fn is_empty_value(value: &str) -> bool {
    matches!(value.trim(), "" | "\"\"")
}

fn check_arity(params: &MapParams, count: usize) -> Result<()> {
    if params.arity.contains(count) {
        Ok(())
    } else {
        Err(SymbolResolutionError::invalid_argument(
            params.key,
            format!("expects {}, found {count}", params.arity),
        ))
    }
}

fn check_value(params: &MapParams, name: &str, value: &str) -> Result<()> {
    params
        .value
        .validate(value)
        .map_err(|reason| SymbolResolutionError::invalid_argument(name, reason))
}

/// Numbers and booleans are emitted bare, everything else as written.
fn render_value(params: &MapParams, value: &str) -> String {
    let value = value.trim();
    match params.value {
        ValueCheck::Int { .. } | ValueCheck::Bool => unquote(value).to_owned(),
        _ => value.to_owned(),
    }
}

fn join_command(cmd: &str, suffix: Option<String>, value: &str) -> String {
    let mut line = String::from(cmd);
    for part in suffix.as_deref().into_iter().chain(Some(value.trim())) {
        if !part.is_empty() {
            line.push(' ');
            line.push_str(part);
        }
    }
    line
}

fn render_assignment(hit: &Lookup<'_>, name: &str, value: &str) -> Result<String> {
    let params = hit.params;
    let suffix = hit.suffix.map(|s| params.normalize_suffix(s));
    match params.op {
        Some(OpTemplate::Value { cmd }) => {
            check_value(params, name, value)?;
            Ok(join_command(cmd, suffix, &render_value(params, value)))
        }
        Some(OpTemplate::Keyed { set, rm, .. }) => {
            if is_empty_value(value) {
                Ok(join_command(rm, suffix, ""))
            } else {
                check_value(params, name, value)?;
                Ok(join_command(set, suffix, &render_value(params, value)))
            }
        }
        Some(OpTemplate::Call { .. }) => render_call(params, &[value]),
        None => Err(SymbolResolutionError::invalid_argument(
            name,
            "symbol cannot be assigned",
        )),
    }
}

/// Whether function arguments lose their quotes when rendered.
///
/// Calls inside an interpolated string keep them; the string around the
/// call is already quoted for the header-rewrite engine.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum ArgQuotes {
    Strip,
    Keep,
}

fn render_function(params: &MapParams, args: &[&str], quotes: ArgQuotes) -> String {
    if args.is_empty() {
        return format!("%{{{}}}", params.target);
    }
    let args: Vec<&str> = args
        .iter()
        .map(|a| match quotes {
            ArgQuotes::Strip => strip_arg_quotes(a.trim()),
            ArgQuotes::Keep => a.trim(),
        })
        .collect();
    format!("%{{{}:{}}}", params.target, args.join(","))
}

/// Drop one level of `"..."` or `'...'` quoting.
fn strip_arg_quotes(arg: &str) -> &str {
    match arg.strip_prefix('\'') {
        Some(rest) => rest.strip_suffix('\'').unwrap_or(arg),
        None => unquote(arg),
    }
}

const NO_FIXED: &[&str] = &[];

/// `cmd FIXED... ARGS... [MODIFIERS]`.
fn render_call(params: &MapParams, args: &[&str]) -> Result<String> {
    check_arity(params, args.len())?;
    let (cmd, fixed, modifiers) = match params.op {
        Some(OpTemplate::Call {
            cmd,
            fixed,
            modifiers,
        }) => (cmd, fixed, modifiers),
        Some(template) => (template.command(), NO_FIXED, OpModifiers::empty()),
        None => (params.target, NO_FIXED, OpModifiers::empty()),
    };

    let mut line = String::from(cmd);
    for part in fixed.iter().copied().chain(args.iter().map(|a| a.trim())) {
        line.push(' ');
        line.push_str(part);
    }
    if !modifiers.is_empty() {
        line.push(' ');
        line.push_str(&modifiers.render());
    }
    Ok(line)
}

enum Interpolation<'a> {
    Ident(&'a str),
    Call(&'a str, &'a str),
}

/// Parse `ident}` or `name(args)}` at the start of `text` (just after `{`).
/// Returns the interpolation and the bytes consumed, closing brace included.
fn parse_interpolation(text: &str) -> Option<(Interpolation<'_>, usize)> {
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        .unwrap_or(text.len());
    let ident = &text[..end];
    if !ident.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    match text[end..].chars().next()? {
        '}' => Some((Interpolation::Ident(ident), end + 1)),
        '(' => {
            let close = text[end..].find(')')? + end;
            if text[close + 1..].starts_with('}') {
                Some((Interpolation::Call(ident, &text[end + 1..close]), close + 2))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Split a call's argument text on top-level commas, respecting quotes.
pub(crate) fn split_args(text: &str) -> Vec<&str> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (i, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                args.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(text[start..].trim());
    args
}
