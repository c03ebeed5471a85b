//! Inverse resolution: header-rewrite primitives back to hrw4u.
//!
//! The config reader hands over one primitive at a time: a `%{...}` condition
//! token, or an operator line split into command, arguments and modifiers.
//! Every lookup goes through the reverse table derived from the forward
//! tables, so decompiled output always resolves forward to the same
//! primitive. A primitive with no reverse entry is an error, never passed
//! through.

use hrw_diagnostic::SymbolResolutionError;
use hrw_fmt::INDENT_WIDTH;
use hrw_ir::{intern, PoolKind, Section};
use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::config::ResolverConfig;
use crate::params::{unquote, MapParams, OpModifiers, ValueCheck};
use crate::table::{OpForm, ReverseOp, SymbolTables};
use crate::variables::{VarType, Variables};
use crate::Result;

/// Nesting limit for `%{...}` tokens inside arguments.
const MAX_NESTING: usize = 8;

/// Inverse resolver protocol.
pub trait InverseResolve {
    /// Decompile a `%{...}` token. Returns the hrw4u text and whether it is
    /// a function call.
    fn percent_to_ident_or_func(&self, token: &str, section: Section) -> Result<(String, bool)>;

    /// Decompile one operator into an hrw4u statement.
    fn op_to_hrw4u(
        &self,
        primitive: &str,
        args: &[&str],
        section: Section,
        state: &mut EmissionState,
    ) -> Result<String>;
}

/// Emission context threaded through operator decompilation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EmissionState {
    /// Indentation level of the emitted statement.
    pub indent: usize,
    /// Modifiers of the operator being decompiled.
    pub modifiers: OpModifiers,
    depth: usize,
}

impl EmissionState {
    pub fn new(indent: usize) -> Self {
        EmissionState {
            indent,
            ..EmissionState::default()
        }
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: OpModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    fn indentation(&self) -> String {
        " ".repeat(self.indent * INDENT_WIDTH)
    }
}

/// A header-rewrite operator line split into its parts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperatorLine {
    pub command: String,
    /// Arguments; quoted arguments keep their quotes.
    pub args: SmallVec<[String; 4]>,
    pub modifiers: OpModifiers,
}

impl OperatorLine {
    pub fn arg_refs(&self) -> SmallVec<[&str; 4]> {
        self.args.iter().map(String::as_str).collect()
    }
}

/// Split an operator line such as `set-header X-Foo "a b" [L]`.
///
/// Quoted arguments and `%{...}` tokens may contain spaces. A trailing
/// bracketed list is parsed as modifiers.
pub fn parse_operator_line(text: &str) -> Result<OperatorLine> {
    let malformed = |reason: &str| SymbolResolutionError::invalid_argument(text.trim(), reason);

    let mut tokens = tokenize(text).map_err(|reason| malformed(reason))?;
    let mut modifiers = OpModifiers::empty();

    if let Some(&last) = tokens.last() {
        if let Some(list) = last.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            for name in list.split(',') {
                let Some(modifier) = OpModifiers::parse_one(name) else {
                    return Err(malformed(&format!("unknown operator modifier '{}'", name.trim())));
                };
                modifiers |= modifier;
            }
            tokens.pop();
        }
    }

    let mut tokens = tokens.into_iter();
    let Some(command) = tokens.next() else {
        return Err(malformed("empty operator line"));
    };

    Ok(OperatorLine {
        command: command.to_owned(),
        args: tokens.map(str::to_owned).collect(),
        modifiers,
    })
}

fn tokenize(text: &str) -> std::result::Result<Vec<&str>, &'static str> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        let mut in_quotes = false;
        let mut depth = 0usize;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' if in_quotes => i += 1,
                b'"' => in_quotes = !in_quotes,
                b'{' if !in_quotes => depth += 1,
                b'}' if !in_quotes => depth = depth.saturating_sub(1),
                b if b.is_ascii_whitespace() && !in_quotes && depth == 0 => break,
                _ => {}
            }
            i += 1;
        }
        if in_quotes {
            return Err("unterminated string");
        }
        tokens.push(&text[start..i.min(bytes.len())]);
    }
    Ok(tokens)
}

/// Section for a header-rewrite hook name.
pub fn hook_to_section(hook: &str) -> Option<Section> {
    let hook = hook.trim();
    let hook = hook
        .strip_prefix("%{")
        .and_then(|h| h.strip_suffix('}'))
        .unwrap_or(hook);
    Section::from_hook(hook)
}

/// A decompiled condition token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecompiledCondition {
    /// hrw4u identifier or call text.
    pub ident: String,
    pub is_function: bool,
    /// A bare use means the implicit `=""` test.
    pub negatable: bool,
}

/// Resolver from header-rewrite primitives to hrw4u text.
pub struct InverseResolver {
    tables: &'static SymbolTables,
    config: ResolverConfig,
    variables: RwLock<Variables>,
}

impl Default for InverseResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl InverseResolver {
    pub fn new() -> Self {
        Self::with_tables(SymbolTables::builtin(), ResolverConfig::default())
    }

    pub fn with_tables(tables: &'static SymbolTables, config: ResolverConfig) -> Self {
        InverseResolver {
            tables,
            config,
            variables: RwLock::new(Variables::new()),
        }
    }

    /// Variables met while decompiling, for emitting a `VARS` section.
    pub fn variables(&self) -> Variables {
        self.variables.read().clone()
    }

    /// Parse and decompile a full operator line.
    pub fn decompile_operator_line(&self, line: &str, section: Section, indent: usize) -> Result<String> {
        let parsed = parse_operator_line(line)?;
        let mut state = EmissionState::new(indent).with_modifiers(parsed.modifiers);
        let args = parsed.arg_refs();
        self.op_to_hrw4u(&parsed.command, &args, section, &mut state)
    }

    /// Decompile a `%{...}` condition token, also reporting whether a bare
    /// use of the result is the implicit non-empty test.
    pub fn decompile_condition(&self, token: &str, section: Section) -> Result<DecompiledCondition> {
        let token = token.trim();
        let Some(inner) = token.strip_prefix("%{").and_then(|t| t.strip_suffix('}')) else {
            return Err(SymbolResolutionError::not_decompilable(token, section));
        };
        let (head, args) = match inner.split_once(':') {
            Some((head, args)) => (head, Some(args)),
            None => (inner, None),
        };

        if let Some(ty) = VarType::from_state_tag(head) {
            let ident = self.variable_name(ty, args.unwrap_or_default())?;
            return Ok(DecompiledCondition {
                ident,
                is_function: false,
                negatable: false,
            });
        }

        let reverse = self.tables.reverse();
        if let Some(entry) = reverse.function(head, section) {
            return Ok(DecompiledCondition {
                ident: self.function_call(entry.params, args, token, section)?,
                is_function: true,
                negatable: entry.params.default_expr,
            });
        }

        if let Some((entry, suffix)) = reverse.condition(inner, section) {
            let ident = dsl_key(entry.params, suffix);
            if self.config.debug {
                tracing::debug!(token, target = entry.target, %ident, "decompiled condition");
            }
            return Ok(DecompiledCondition {
                ident,
                is_function: false,
                negatable: entry.params.default_expr,
            });
        }

        Err(SymbolResolutionError::not_decompilable(token, section))
    }

    fn variable_name(&self, ty: VarType, slot: &str) -> Result<String> {
        let Ok(slot) = slot.trim().parse::<u8>() else {
            return Err(SymbolResolutionError::InvalidVariable {
                name: format!("{}:{slot}", ty.state_tag()),
                reason: "slot is not a number".to_owned(),
            });
        };
        Ok(self.variables.write().for_slot(ty, slot)?.name.clone())
    }

    fn function_call(&self, params: &MapParams, args: Option<&str>, token: &str, section: Section) -> Result<String> {
        let args: Vec<&str> = args.map_or_else(Vec::new, |a| a.split(',').map(str::trim).collect());
        if !params.arity.contains(args.len()) {
            return Err(SymbolResolutionError::not_decompilable(token, section));
        }
        Ok(format!("{}({})", params.key, args.join(", ")))
    }

    /// Rewrite `%{...}` tokens inside an argument to `{dsl}` interpolations.
    fn rewrite_arg(&self, arg: &str, section: Section, state: &mut EmissionState) -> Result<String> {
        if !arg.contains("%{") {
            return Ok(arg.to_owned());
        }
        if state.depth >= MAX_NESTING {
            return Err(SymbolResolutionError::invalid_argument(arg, "too deeply nested"));
        }
        state.depth += 1;
        let rewritten = self.rewrite_tokens(unquote(arg), section, state);
        state.depth -= 1;
        Ok(format!("\"{}\"", rewritten?))
    }

    fn rewrite_tokens(&self, text: &str, section: Section, state: &mut EmissionState) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("%{") {
            out.push_str(&rest[..start]);
            let Some(len) = token_len(&rest[start..]) else {
                return Err(SymbolResolutionError::invalid_argument(text, "unterminated %{ token"));
            };
            let token = &rest[start..start + len];
            let inner = &token[2..len - 1];
            let resolved = if inner.contains("%{") {
                let nested = self.rewrite_tokens(inner, section, state)?;
                self.percent_to_ident_or_func(&format!("%{{{nested}}}"), section)?
            } else {
                self.percent_to_ident_or_func(token, section)?
            };
            out.push('{');
            out.push_str(&resolved.0);
            out.push('}');
            rest = &rest[start + len..];
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Pick the reverse operator entry for a command in `section`.
    fn select_op(&self, cmd: &str, args: &[&str], section: Section, modifiers: OpModifiers) -> Option<ReverseOp> {
        self.tables
            .reverse()
            .operators(cmd)
            .iter()
            .filter(|op| op.sections.contains(section.set()) && op.accepts(args, modifiers))
            .max_by_key(|op| op.template_modifiers().bits().count_ones())
            .copied()
    }
}

/// Length of the `%{...}` token at the start of `text`, braces balanced.
fn token_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// hrw4u key for a reverse entry plus suffix, lower-casing upper-cased groups.
fn dsl_key(params: &MapParams, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) if params.upper => format!("{}{}", params.key, suffix.to_ascii_lowercase()),
        Some(suffix) => format!("{}{suffix}", params.key),
        None => params.key.to_owned(),
    }
}

/// An assignment right-hand side in hrw4u syntax.
fn dsl_value(params: &MapParams, value: &str) -> String {
    let value = value.trim();
    match params.value {
        ValueCheck::Int { .. } | ValueCheck::Bool => unquote(value).to_owned(),
        _ if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 => value.to_owned(),
        _ => format!("\"{}\"", value.replace('"', "\\\"")),
    }
}

/// ` with QSA` for modifiers that have no other rendering.
fn with_clause(modifiers: OpModifiers) -> String {
    let names: Vec<&str> = [(OpModifiers::QSA, "QSA"), (OpModifiers::INV, "INV")]
        .into_iter()
        .filter(|(flag, _)| modifiers.contains(*flag))
        .map(|(_, name)| intern(name, PoolKind::Modifier))
        .collect();
    if names.is_empty() {
        String::new()
    } else {
        format!(" {} {}", intern("with", PoolKind::Keyword), names.join(","))
    }
}

impl InverseResolve for InverseResolver {
    #[tracing::instrument(level = "trace", skip(self))]
    fn percent_to_ident_or_func(&self, token: &str, section: Section) -> Result<(String, bool)> {
        let cond = self.decompile_condition(token, section)?;
        Ok((cond.ident, cond.is_function))
    }

    #[tracing::instrument(level = "trace", skip(self, state))]
    fn op_to_hrw4u(
        &self,
        primitive: &str,
        args: &[&str],
        section: Section,
        state: &mut EmissionState,
    ) -> Result<String> {
        let indent = state.indentation();
        let brk = intern("break", PoolKind::Keyword);

        if primitive == "no-op" && args.is_empty() && state.modifiers.contains(OpModifiers::LAST) {
            return Ok(format!("{indent}{brk};"));
        }

        let mut rewritten: SmallVec<[String; 4]> = SmallVec::with_capacity(args.len());
        for arg in args {
            rewritten.push(self.rewrite_arg(arg, section, state)?);
        }

        let (body, leftover) = if let Some(ty) = VarType::from_set_command(primitive) {
            let [slot, value] = args else {
                return Err(SymbolResolutionError::not_decompilable(primitive, section));
            };
            let name = self.variable_name(ty, slot)?;
            (format!("{name} = {}", unquote(value.trim())), state.modifiers)
        } else {
            let Some(op) = self.select_op(primitive, args, section, state.modifiers) else {
                return Err(SymbolResolutionError::not_decompilable(primitive, section));
            };
            let params = op.params;
            let suffix = rewritten
                .first()
                .filter(|_| params.is_prefix())
                .map(String::as_str);
            if self.config.debug {
                tracing::debug!(primitive, kind = %op.kind, key = params.key, "decompiled operator");
            }
            let body = match op.form {
                OpForm::Value | OpForm::Set => {
                    let value = rewritten.last().map_or("", String::as_str);
                    format!("{} = {}", dsl_key(params, suffix), dsl_value(params, value))
                }
                OpForm::Remove => format!("{} = \"\"", dsl_key(params, suffix)),
                OpForm::Add => {
                    let value = rewritten.last().map_or("", String::as_str);
                    format!("{} += {}", dsl_key(params, suffix), dsl_value(params, value))
                }
                OpForm::Call => {
                    let call_args: Vec<&str> = rewritten[op.fixed().len()..].iter().map(String::as_str).collect();
                    format!("{}({})", params.key, call_args.join(", "))
                }
            };
            (body, state.modifiers.difference(op.template_modifiers()))
        };

        let mut statement = format!("{indent}{body}{};", with_clause(leftover));
        if leftover.contains(OpModifiers::LAST) {
            statement.push('\n');
            statement.push_str(&indent);
            statement.push_str(brk);
            statement.push(';');
        }
        Ok(statement)
    }
}
