//! hrw4u document to header-rewrite configuration.
//!
//! Each run of plain statements and each `if` block becomes one rule headed
//! by the section's hook condition:
//!
//! ```text
//! cond %{READ_RESPONSE_HDR_HOOK} [AND]
//! cond %{STATUS} =404
//!     set-status 403
//! elif
//!     cond %{STATUS} =500
//!         set-status 502
//! else
//!     set-status 200
//! ```
//!
//! Parenthesised conditions are bracketed by `cond %{GROUP}` and
//! `cond %{GROUP:END}`, with the inner conditions one level deeper.

use hrw_diagnostic::SymbolResolutionError;
use hrw_fmt::OutputAssembler;
use hrw_ir::{intern, PoolKind, Section};
use hrw_symbols::{CondModifiers, Resolve, SymbolResolver, VarType};

use crate::ast::{
    Comparable, CompareOp, Comparison, Connective, Document, Factor, IfBlock, Item, SectionBlock, Statement, Term,
    VarDecl,
};
use crate::options::CompileOptions;
use crate::report::Reporter;
use crate::Output;

type Result<T> = std::result::Result<T, SymbolResolutionError>;

pub(crate) const GROUP_START: &str = "%{GROUP}";
pub(crate) const GROUP_END: &str = "%{GROUP:END}";

/// Compile `doc` into header-rewrite configuration text.
///
/// In batch mode the first resolution failure is returned. In interactive
/// mode each failure is reported as a diagnostic. A failing statement is
/// left out; a failing condition drops its whole rule, so guarded
/// statements never run unguarded.
#[tracing::instrument(level = "debug", skip_all, fields(sections = doc.sections.len()))]
pub fn compile(doc: &Document, options: &CompileOptions) -> Result<Output> {
    let mut compiler = Compiler {
        resolver: SymbolResolver::with_config(options.resolver),
        reporter: Reporter::new(options),
        rules: Vec::new(),
    };

    for decl in &doc.vars {
        compiler.declare(decl)?;
    }
    for block in &doc.sections {
        compiler.section(block)?;
    }

    let mut out = OutputAssembler::new();
    out.join(&compiler.rules, "\n");
    Ok(Output {
        text: out.into_string(),
        diagnostics: compiler.reporter.finish(),
    })
}

struct Compiler {
    resolver: SymbolResolver,
    reporter: Reporter,
    /// Finished rules, each a block of lines.
    rules: Vec<String>,
}

impl Compiler {
    fn declare(&mut self, decl: &VarDecl) -> Result<()> {
        let declared = match VarType::from_keyword(&decl.ty) {
            Some(ty) => self.resolver.declare_variable(&decl.name, ty),
            None => Err(SymbolResolutionError::InvalidVariable {
                name: decl.name.clone(),
                reason: format!("unknown type '{}'", decl.ty),
            }),
        };
        if let Some(var) = self.reporter.check(declared, decl.span)? {
            tracing::debug!(name = %var.name, target = %var.condition_target(), "declared variable");
        }
        Ok(())
    }

    fn section(&mut self, block: &SectionBlock) -> Result<()> {
        let section = block.section;
        let Some(hook) = self.resolver.map_hook(section) else {
            let err = SymbolResolutionError::invalid_argument(section.name(), "only variable declarations are allowed here");
            return self.reporter.report(err, block.span);
        };
        let hook_cond = format!("cond %{{{hook}}} [AND]");

        let mut run: Vec<&Statement> = Vec::new();
        for item in &block.body {
            match item {
                Item::Statement(stmt) => run.push(stmt),
                Item::If(if_block) => {
                    self.flush_run(&hook_cond, &mut run, section)?;
                    self.if_block(&hook_cond, if_block, section)?;
                }
            }
        }
        self.flush_run(&hook_cond, &mut run, section)
    }

    fn flush_run(&mut self, hook_cond: &str, run: &mut Vec<&Statement>, section: Section) -> Result<()> {
        if run.is_empty() {
            return Ok(());
        }
        let mut rule = OutputAssembler::new();
        rule.append_line(hook_cond);
        for stmt in run.drain(..) {
            self.statement(stmt, section, 1, &mut rule)?;
        }
        self.rules.push(rule.into_string());
        Ok(())
    }

    fn if_block(&mut self, hook_cond: &str, block: &IfBlock, section: Section) -> Result<()> {
        let mut rule = OutputAssembler::new();
        rule.append_line(hook_cond);

        let mut complete = self.conditions(&block.terms, section, 0, &mut rule)?;
        self.body(&block.body, section, 1, &mut rule)?;

        for elif in &block.elifs {
            rule.append_line(intern("elif", PoolKind::Keyword));
            complete &= self.conditions(&elif.terms, section, 1, &mut rule)?;
            self.body(&elif.body, section, 2, &mut rule)?;
        }
        if let Some(body) = &block.else_body {
            rule.append_line(intern("else", PoolKind::Keyword));
            self.body(body, section, 1, &mut rule)?;
        }

        if complete {
            self.rules.push(rule.into_string());
        } else {
            tracing::debug!(%section, start = block.span.start, "dropped rule with an unresolved condition");
        }
        Ok(())
    }

    fn body(&mut self, body: &[Statement], section: Section, level: usize, out: &mut OutputAssembler) -> Result<()> {
        for stmt in body {
            self.statement(stmt, section, level, out)?;
        }
        Ok(())
    }

    /// Emit the condition lines for `terms` at `level`. `Ok(false)` means at
    /// least one term failed and was reported.
    fn conditions(&mut self, terms: &[Term], section: Section, level: usize, out: &mut OutputAssembler) -> Result<bool> {
        let mut complete = true;
        let count = terms.len();
        for (i, term) in terms.iter().enumerate() {
            complete &= self.term(term, section, level, i + 1 == count, out)?;
        }
        Ok(complete)
    }

    fn term(&mut self, term: &Term, section: Section, level: usize, last: bool, out: &mut OutputAssembler) -> Result<bool> {
        let mut modifiers = CondModifiers::empty();
        modifiers.set(CondModifiers::NOT, term.negated);
        modifiers.set(CondModifiers::OR, !last && term.connective == Connective::Or);

        let resolved = match &term.factor {
            Factor::Group(inner) => {
                out.append_indented(&cond_line(GROUP_START, CondModifiers::empty()), level);
                let complete = self.conditions(inner, section, level + 1, out)?;
                out.append_indented(&cond_line(GROUP_END, modifiers), level);
                return Ok(complete);
            }
            Factor::Ident(name) => self.bare_condition(name, section),
            Factor::Call { name, args } => self.function(name, args, section).map(|text| (text, CondModifiers::empty())),
            Factor::Compare(cmp) => self.comparison(cmp, section),
            Factor::Bool(true) => Ok(("%{TRUE}".to_owned(), CondModifiers::empty())),
            Factor::Bool(false) => Ok(("%{FALSE}".to_owned(), CondModifiers::empty())),
        };
        let Some((text, flags)) = self.reporter.check(resolved, term.span)? else {
            return Ok(false);
        };

        // A negative form flips the term's own negation.
        let modifiers = (modifiers ^ (flags & CondModifiers::NOT)) | flags.difference(CondModifiers::NOT);
        out.append_indented(&cond_line(&text, modifiers), level);
        Ok(true)
    }

    fn bare_condition(&self, name: &str, section: Section) -> Result<(String, CondModifiers)> {
        let (target, default_expr) = self.resolver.resolve_condition(name, section)?;
        // Bare use of a value is an implicit non-empty test.
        if default_expr && self.resolver.variable(name).is_none() {
            Ok((format!("{target} =\"\""), CondModifiers::NOT))
        } else {
            Ok((target, CondModifiers::empty()))
        }
    }

    fn function(&self, name: &str, args: &[String], section: Section) -> Result<String> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.resolver.resolve_function(name, &args, section)
    }

    fn comparison(&self, cmp: &Comparison, section: Section) -> Result<(String, CondModifiers)> {
        let lhs = match &cmp.lhs {
            Comparable::Ident(name) => self.resolver.resolve_condition(name, section)?.0,
            Comparable::Call { name, args } => self.function(name, args, section)?,
        };
        let mut flags = match_modifiers(&cmp.modifiers)?;
        if cmp.op.is_negative() {
            flags |= CondModifiers::NOT;
        }

        let rhs = cmp.rhs.trim();
        let text = match cmp.op {
            CompareOp::Eq | CompareOp::Ne => format!("{lhs} ={}", self.value(rhs, section)?),
            CompareOp::Lt | CompareOp::Gt => format!("{lhs} {}{}", cmp.op.as_str(), self.value(rhs, section)?),
            CompareOp::Match | CompareOp::NotMatch => {
                if !is_regex(rhs) {
                    return Err(SymbolResolutionError::invalid_argument(
                        cmp.lhs.name(),
                        format!("expected a /regex/, found '{rhs}'"),
                    ));
                }
                format!("{lhs} {rhs}")
            }
            CompareOp::In => {
                if let Some(inner) = rhs.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
                    format!("{lhs} ({})", inner.trim())
                } else if rhs.starts_with('{') && rhs.ends_with('}') {
                    // IP ranges stay verbatim.
                    format!("{lhs} {rhs}")
                } else {
                    return Err(SymbolResolutionError::invalid_argument(
                        cmp.lhs.name(),
                        format!("expected a [set] or {{ip range}}, found '{rhs}'"),
                    ));
                }
            }
        };
        Ok((text, flags))
    }

    /// Resolve one statement into `out`. A failure is reported and the
    /// statement left out.
    fn statement(&mut self, stmt: &Statement, section: Section, level: usize, out: &mut OutputAssembler) -> Result<()> {
        let line = match stmt {
            Statement::Break { .. } => Ok(format!("no-op [{}]", intern("L", PoolKind::Modifier))),
            Statement::Assign { name, value, .. } => self
                .value(value, section)
                .and_then(|value| self.resolver.resolve_assignment(name, &value, section)),
            Statement::AddAssign { name, value, .. } => self
                .value(value, section)
                .and_then(|value| self.resolver.resolve_add_assignment(name, &value, section)),
            Statement::Call { name, args, .. } => args
                .iter()
                .map(|arg| self.value(arg, section))
                .collect::<Result<Vec<String>>>()
                .and_then(|args| {
                    let args: Vec<&str> = args.iter().map(String::as_str).collect();
                    self.resolver.resolve_statement_function(name, &args, section)
                }),
        };
        if let Some(line) = self.reporter.check(line, stmt.span())? {
            out.append_indented(&line, level);
        }
        Ok(())
    }

    /// Expand interpolations inside quoted strings; other values pass through.
    fn value(&self, value: &str, section: Section) -> Result<String> {
        if is_quoted(value) {
            self.resolver.expand_interpolations(value, section)
        } else {
            Ok(value.to_owned())
        }
    }
}

/// `with` modifiers, checked against the string-match set.
fn match_modifiers(names: &[String]) -> Result<CondModifiers> {
    let mut modifiers = CondModifiers::empty();
    for name in names {
        match CondModifiers::parse_one(name) {
            Some(flag) if CondModifiers::MATCH.contains(flag) => modifiers |= flag,
            _ => {
                return Err(SymbolResolutionError::invalid_argument(
                    name.as_str(),
                    "unknown condition modifier",
                ))
            }
        }
    }
    Ok(modifiers)
}

fn cond_line(text: &str, modifiers: CondModifiers) -> String {
    if modifiers.is_empty() {
        format!("cond {text}")
    } else {
        format!("cond {text} {}", modifiers.render())
    }
}

fn is_quoted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('"') && value.ends_with('"')
}

pub(crate) fn is_regex(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('/') && value.ends_with('/')
}

#[cfg(test)]
mod tests;
