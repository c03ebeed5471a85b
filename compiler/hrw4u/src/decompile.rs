//! Header-rewrite configuration back to hrw4u.
//!
//! Rules are read line by line. A hook condition starts a rule in its
//! section; further conditions become the rule's `if`, and operator lines
//! its body. `elif` and `else` lines open further branches, and
//! `%{GROUP}`/`%{GROUP:END}` become parentheses. Consecutive rules of one
//! section share a section block.

use hrw_diagnostic::SymbolResolutionError;
use hrw_fmt::OutputAssembler;
use hrw_ir::{intern, PoolKind, Section, Span};
use hrw_symbols::{hook_to_section, InverseResolver, SymbolTables};

use crate::ast::Connective;
use crate::compile::{is_regex, GROUP_END, GROUP_START};
use crate::options::CompileOptions;
use crate::report::Reporter;
use crate::Output;

type Result<T> = std::result::Result<T, SymbolResolutionError>;

/// Decompile header-rewrite configuration text into hrw4u source.
///
/// Comments and blank lines are dropped. Primitives without an hrw4u
/// spelling in their section are failures, reported per `options.mode`.
/// In interactive mode a rule with a failed condition is left out whole.
#[tracing::instrument(level = "debug", skip_all, fields(bytes = config.len()))]
pub fn decompile(config: &str, options: &CompileOptions) -> Result<Output> {
    let mut decompiler = Decompiler::new(options);

    let mut offset = 0usize;
    let mut last_span = Span::DUMMY;
    for raw in config.split_inclusive('\n') {
        let start = offset;
        offset += raw.len();
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let span = line_span(start, raw, line);
        last_span = span;
        decompiler.line(line, span, options.default_section)?;
    }
    decompiler.close_rule(last_span)?;

    Ok(Output {
        text: decompiler.render(),
        diagnostics: decompiler.reporter.finish(),
    })
}

fn line_span(start: usize, raw: &str, line: &str) -> Span {
    let leading = raw.len() - raw.trim_start().len();
    let begin = start + leading;
    Span::try_from_range(begin..begin + line.len()).unwrap_or(Span::DUMMY)
}

type Conditions = Vec<(String, Connective)>;

/// `if`/`elif` arm.
#[derive(Default)]
struct Branch {
    conditions: Conditions,
    body: Vec<String>,
}

/// One rule being read.
struct Rule {
    section: Section,
    branches: Vec<Branch>,
    else_body: Option<Vec<String>>,
    /// Open `%{GROUP}` frames, innermost last.
    groups: Vec<Conditions>,
    /// A condition failed; the rule is dropped on close.
    poisoned: bool,
}

impl Rule {
    fn new(section: Section) -> Self {
        Rule {
            section,
            branches: vec![Branch::default()],
            else_body: None,
            groups: Vec::new(),
            poisoned: false,
        }
    }

    fn is_conditional(&self) -> bool {
        self.branches.first().is_some_and(|b| !b.conditions.is_empty())
    }

    fn is_empty(&self) -> bool {
        !self.is_conditional() && self.branches.iter().all(|b| b.body.is_empty()) && self.else_body.is_none()
    }

    /// Whether a new condition still belongs to this rule.
    fn accepts_condition(&self) -> bool {
        !self.groups.is_empty()
            || (self.else_body.is_none() && self.branches.last().map_or(true, |b| b.body.is_empty()))
    }

    fn push_condition(&mut self, expr: String, connective: Connective) {
        let target = match self.groups.last_mut() {
            Some(group) => group,
            None => match self.branches.last_mut() {
                Some(branch) => &mut branch.conditions,
                None => return,
            },
        };
        target.push((expr, connective));
    }

    fn body_mut(&mut self) -> Option<&mut Vec<String>> {
        match &mut self.else_body {
            Some(body) => Some(body),
            None => self.branches.last_mut().map(|b| &mut b.body),
        }
    }

    fn render(&self) -> String {
        let mut out = OutputAssembler::new();
        if !self.is_conditional() {
            for branch in &self.branches {
                for stmt in &branch.body {
                    out.append_line(stmt);
                }
            }
            return out.into_string();
        }

        let indent = " ".repeat(hrw_fmt::INDENT_WIDTH);
        for (i, branch) in self.branches.iter().enumerate() {
            if i == 0 {
                out.append(&indent).append(intern("if", PoolKind::Keyword));
            } else {
                out.append(&indent).append("} ").append(intern("elif", PoolKind::Keyword));
            }
            out.append(" ").append(&join_conditions(&branch.conditions)).append_line(" {");
            for stmt in &branch.body {
                out.append_line(stmt);
            }
        }
        if let Some(body) = &self.else_body {
            out.append(&indent).append("} ").append(intern("else", PoolKind::Keyword)).append_line(" {");
            for stmt in body {
                out.append_line(stmt);
            }
        }
        out.append_indented("}", 1);
        out.into_string()
    }
}

fn join_conditions(conditions: &[(String, Connective)]) -> String {
    let mut out = OutputAssembler::new();
    let count = conditions.len();
    for (i, (expr, connective)) in conditions.iter().enumerate() {
        out.append(expr);
        if i + 1 < count {
            out.append(match connective {
                Connective::And => " && ",
                Connective::Or => " || ",
            });
        }
    }
    out.into_string()
}

struct Decompiler {
    resolver: InverseResolver,
    reporter: Reporter,
    current: Option<Rule>,
    /// Section blocks in order of appearance, each a list of rendered rules.
    blocks: Vec<(Section, Vec<String>)>,
}

impl Decompiler {
    fn new(options: &CompileOptions) -> Self {
        Decompiler {
            resolver: InverseResolver::with_tables(SymbolTables::builtin(), options.resolver),
            reporter: Reporter::new(options),
            current: None,
            blocks: Vec::new(),
        }
    }

    fn line(&mut self, line: &str, span: Span, default_section: Section) -> Result<()> {
        match line {
            "elif" => return self.branch(span, false),
            "else" => return self.branch(span, true),
            _ => {}
        }
        if let Some(rest) = line.strip_prefix("cond").filter(|r| r.is_empty() || r.starts_with(char::is_whitespace)) {
            return self.condition_line(rest, span, default_section);
        }

        self.close_groups(span)?;
        let rule = self.current.get_or_insert_with(|| Rule::new(default_section));
        let section = rule.section;
        let indent = if rule.is_conditional() { 2 } else { 1 };
        let stmt = self.resolver.decompile_operator_line(line, section, indent);
        if let Some(stmt) = self.reporter.check(stmt, span)? {
            if let Some(body) = self.current.as_mut().and_then(Rule::body_mut) {
                body.push(stmt);
            }
        }
        Ok(())
    }

    fn condition_line(&mut self, rest: &str, span: Span, default_section: Section) -> Result<()> {
        let parsed = parse_condition(rest);
        let Some(cond) = self.reporter.check(parsed, span)? else {
            self.poison();
            return Ok(());
        };
        if let Some(section) = hook_to_section(cond.token) {
            self.close_rule(span)?;
            self.current = Some(Rule::new(section));
            return Ok(());
        }

        let section = self.rule_for_condition(span, default_section)?;
        let connective = if cond.has_modifier("OR") {
            Connective::Or
        } else {
            Connective::And
        };

        match cond.token {
            GROUP_START => {
                if let Some(rule) = self.current.as_mut() {
                    rule.groups.push(Vec::new());
                }
                Ok(())
            }
            GROUP_END => {
                let Some(inner) = self.current.as_mut().and_then(|rule| rule.groups.pop()) else {
                    let err = SymbolResolutionError::invalid_argument(GROUP_END, "no open %{GROUP}");
                    self.poison();
                    return self.reporter.report(err, span);
                };
                let group = format!("({})", join_conditions(&inner));
                let expr = if cond.has_modifier("NOT") { format!("!{group}") } else { group };
                if let Some(rule) = self.current.as_mut() {
                    rule.push_condition(expr, connective);
                }
                Ok(())
            }
            _ => {
                let expr = self.condition(&cond, section);
                match self.reporter.check(expr, span)? {
                    Some(expr) => {
                        if let Some(rule) = self.current.as_mut() {
                            rule.push_condition(expr, connective);
                        }
                    }
                    None => self.poison(),
                }
                Ok(())
            }
        }
    }

    /// Handle an `elif` or `else` line.
    fn branch(&mut self, span: Span, is_else: bool) -> Result<()> {
        self.close_groups(span)?;
        let keyword = if is_else { "else" } else { "elif" };
        let open = self
            .current
            .as_ref()
            .is_some_and(|rule| rule.is_conditional() && rule.else_body.is_none());
        if !open {
            let err = SymbolResolutionError::invalid_argument(keyword, "no preceding condition to continue");
            self.poison();
            return self.reporter.report(err, span);
        }
        if let Some(rule) = self.current.as_mut() {
            if is_else {
                rule.else_body = Some(Vec::new());
            } else {
                rule.branches.push(Branch::default());
            }
        }
        Ok(())
    }

    /// The section for a new condition, starting a rule when the current one
    /// can no longer take conditions.
    fn rule_for_condition(&mut self, span: Span, default_section: Section) -> Result<Section> {
        let section = self.current.as_ref().map_or(default_section, |rule| rule.section);
        if !self.current.as_ref().is_some_and(Rule::accepts_condition) {
            self.close_rule(span)?;
            self.current = Some(Rule::new(section));
        }
        Ok(section)
    }

    fn poison(&mut self) {
        if let Some(rule) = self.current.as_mut() {
            rule.poisoned = true;
        }
    }

    /// Report and discard groups left open.
    fn close_groups(&mut self, span: Span) -> Result<()> {
        let open = self.current.as_ref().map_or(0, |rule| rule.groups.len());
        if open == 0 {
            return Ok(());
        }
        if let Some(rule) = self.current.as_mut() {
            rule.groups.clear();
        }
        self.poison();
        let err = SymbolResolutionError::invalid_argument(GROUP_START, "missing %{GROUP:END}");
        self.reporter.report(err, span)
    }

    fn close_rule(&mut self, span: Span) -> Result<()> {
        self.close_groups(span)?;
        let Some(rule) = self.current.take() else {
            return Ok(());
        };
        if rule.poisoned {
            tracing::debug!(section = %rule.section, "dropped rule with an unresolved condition");
            return Ok(());
        }
        if rule.is_empty() {
            return Ok(());
        }
        let text = rule.render();
        if let Some((section, rules)) = self.blocks.last_mut() {
            if *section == rule.section {
                rules.push(text);
                return Ok(());
            }
        }
        self.blocks.push((rule.section, vec![text]));
        Ok(())
    }

    fn condition(&self, cond: &Condition<'_>, section: Section) -> Result<String> {
        let negate = cond.has_modifier("NOT");
        let (ident, negatable) = match cond.token {
            "%{TRUE}" => (intern("true", PoolKind::Keyword).to_owned(), false),
            "%{FALSE}" => (intern("false", PoolKind::Keyword).to_owned(), false),
            token => {
                let decompiled = self.resolver.decompile_condition(token, section)?;
                (decompiled.ident, decompiled.negatable)
            }
        };

        let comparison = cond.comparison;
        let mut expr = if comparison.is_empty() {
            if negate {
                format!("!{ident}")
            } else {
                ident
            }
        } else if comparison == "=\"\"" && negatable {
            // Implicit non-empty test.
            if negate {
                ident
            } else {
                format!("!{ident}")
            }
        } else if is_regex(comparison) {
            let op = if negate { "!~" } else { "~" };
            format!("{ident} {op} {comparison}")
        } else if let Some(inner) = comparison.strip_prefix('(').and_then(|c| c.strip_suffix(')')) {
            negated_if(negate, format!("{ident} in [{inner}]"))
        } else if comparison.starts_with('{') && comparison.ends_with('}') {
            negated_if(negate, format!("{ident} in {comparison}"))
        } else {
            let op_len = comparison.chars().next().map_or(0, char::len_utf8);
            let (op, value) = comparison.split_at(op_len);
            let value = dsl_literal(value);
            match (op, negate) {
                ("=", false) => format!("{ident} == {value}"),
                ("=", true) => format!("{ident} != {value}"),
                ("<" | ">", _) => negated_if(negate, format!("{ident} {op} {value}")),
                _ => {
                    return Err(SymbolResolutionError::invalid_argument(
                        cond.token,
                        format!("unsupported comparison '{comparison}'"),
                    ))
                }
            }
        };

        let extra: Vec<&str> = cond
            .modifiers
            .iter()
            .copied()
            .filter(|m| !matches!(*m, "NOT" | "OR" | "AND" | "L" | "LAST"))
            .map(|m| intern(m, PoolKind::Modifier))
            .collect();
        if !extra.is_empty() {
            expr.push_str(&format!(" {} {}", intern("with", PoolKind::Keyword), extra.join(",")));
        }
        Ok(expr)
    }

    fn render(&self) -> String {
        let mut out = OutputAssembler::new();
        let vars = self.resolver.variables();
        let mut first = true;

        if !vars.is_empty() {
            out.append_line("VARS {");
            for var in vars.iter() {
                out.append_indented(&var.declaration(), 1);
            }
            out.append_line("}");
            first = false;
        }

        for (section, rules) in &self.blocks {
            if !first {
                out.append_line("");
            }
            first = false;
            out.append(section.name()).append_line(" {");
            out.join(rules, "\n");
            out.append_line("}");
        }
        out.into_string()
    }
}

fn negated_if(negate: bool, expr: String) -> String {
    if negate {
        format!("!({expr})")
    } else {
        expr
    }
}

/// `cond %{TOKEN} COMPARISON [MODS]`, split.
struct Condition<'a> {
    token: &'a str,
    comparison: &'a str,
    modifiers: Vec<&'a str>,
}

impl Condition<'_> {
    fn has_modifier(&self, name: &str) -> bool {
        self.modifiers.iter().any(|m| *m == name)
    }
}

/// Split the text after `cond`.
fn parse_condition(text: &str) -> Result<Condition<'_>> {
    let text = text.trim();
    let malformed = |reason: &str| SymbolResolutionError::invalid_argument(format!("cond {text}"), reason);

    if !text.starts_with("%{") {
        return Err(malformed("expected a %{...} condition"));
    }
    let mut depth = 0usize;
    let mut end = None;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    end = Some(i + 1);
                    break;
                }
            }
            _ => {}
        }
    }
    let Some(end) = end else {
        return Err(malformed("unterminated %{ token"));
    };

    let (token, rest) = text.split_at(end);
    let mut rest = rest.trim();
    let mut modifiers = Vec::new();
    if rest.ends_with(']') {
        if let Some(open) = rest.rfind('[') {
            modifiers = rest[open + 1..rest.len() - 1]
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .collect();
            rest = rest[..open].trim();
        }
    }

    Ok(Condition {
        token,
        comparison: rest,
        modifiers,
    })
}

/// A comparison operand as an hrw4u literal: numbers stay bare, everything
/// else is quoted.
fn dsl_literal(value: &str) -> String {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value.to_owned()
    } else if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        value.to_owned()
    } else {
        format!("\"{value}\"")
    }
}

#[cfg(test)]
mod tests;
