//! Completion and hover content for the hrw4u language server.
//!
//! Only payload content is built here. Positions, ranges and the wire
//! protocol belong to the server; it asks for candidates given the text
//! typed so far and the section the cursor is in.

use std::fmt::Write as _;

use hrw_ir::{Canon, PoolKind, Section, SectionSet, SymbolKind};

use crate::params::{MapParams, OpTemplate};
use crate::table::SymbolTables;
use crate::variables::VarType;

/// One completion candidate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompletionItem {
    pub label: String,
    pub kind: SymbolKind,
    /// What the candidate maps to, e.g. `%{CLIENT-URL:PATH}` or `set-status`.
    pub detail: String,
    pub documentation: Option<&'static str>,
}

/// Hover content. `kind` is the markup kind, always `markdown`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Hover {
    pub kind: Canon,
    pub value: String,
}

impl Hover {
    fn markdown(value: String) -> Self {
        Hover {
            kind: Canon::new("markdown", PoolKind::LspField),
            value,
        }
    }
}

/// Completion candidates starting with `prefix` that are valid in `section`.
///
/// Prefix keys with a closed suffix group expand to one candidate per field
/// (`inbound.url.` gives `inbound.url.host`, `inbound.url.path`, ...); open
/// prefix keys such as `inbound.req.` are offered as they are. Results are
/// sorted by label and deduplicated per kind.
pub fn complete(prefix: &str, section: Section, tables: &SymbolTables) -> Vec<CompletionItem> {
    let mut items = Vec::new();

    for kind in SymbolKind::ALL {
        for params in tables.table(kind).entries() {
            if !params.is_valid_in(section) {
                continue;
            }
            let documentation = (!params.doc.is_empty()).then_some(params.doc);
            match params.suffix.fields().filter(|_| params.is_prefix()) {
                Some(fields) => {
                    for field in fields {
                        let suffix = if params.upper {
                            field.to_ascii_lowercase()
                        } else {
                            (*field).to_owned()
                        };
                        let label = format!("{}{suffix}", params.key);
                        if label.starts_with(prefix) {
                            items.push(CompletionItem {
                                label,
                                kind,
                                detail: maps_to(kind, params, Some(*field)),
                                documentation,
                            });
                        }
                    }
                }
                None if params.key.starts_with(prefix) => items.push(CompletionItem {
                    label: params.key.to_owned(),
                    kind,
                    detail: maps_to(kind, params, None),
                    documentation,
                }),
                None => {}
            }
        }
    }

    items.sort_by(|a, b| a.label.cmp(&b.label).then(a.kind.index().cmp(&b.kind.index())));
    items.dedup_by(|a, b| a.label == b.label && a.kind == b.kind);
    items
}

/// Hover text for `token` as seen from `section`.
///
/// Recognizes section names, variable type keywords, operators, conditions
/// and function names (with or without a trailing `()`). Operators win over
/// conditions for names in both tables, matching how the token reads on the
/// left of an assignment.
pub fn hover(token: &str, section: Section, tables: &SymbolTables) -> Option<Hover> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if let Ok(named) = token.parse::<Section>() {
        return Some(Hover::markdown(section_hover(named)));
    }
    if let Some(ty) = VarType::from_keyword(token) {
        return Some(Hover::markdown(format!(
            "**{}** - HRW4U Variable Type\n\nState slots: `{}` ({} available).\n\nUsed in variable declarations within the VARS section.",
            ty.keyword(),
            ty.state_tag(),
            ty.slots()
        )));
    }

    let name = token.strip_suffix("()").unwrap_or(token);
    let order = [
        SymbolKind::Operator,
        SymbolKind::Condition,
        SymbolKind::Function,
        SymbolKind::StatementFunction,
    ];
    for kind in order {
        let Some(hit) = tables.table(kind).lookup(name) else {
            continue;
        };
        let params = hit.params;
        // A bare prefix key (`inbound.req.`) hovers without a suffix.
        let suffix = hit.suffix.filter(|s| !s.is_empty());
        if suffix.is_some_and(|s| !params.suffix.validate(s)) {
            continue;
        }
        return Some(Hover::markdown(symbol_hover(name, kind, params, suffix, section)));
    }
    None
}

fn section_hover(section: Section) -> String {
    let mut text = format!("**{section}** - HRW4U Section\n\n");
    if let Some(hook) = section.hook_name() {
        let _ = write!(text, "**Hook:** `{hook}`\n\n");
    }
    text.push_str(section.description());
    text
}

fn symbol_hover(
    name: &str,
    kind: SymbolKind,
    params: &MapParams,
    suffix: Option<&str>,
    section: Section,
) -> String {
    let (label, title) = match kind {
        SymbolKind::Operator => (name.to_owned(), "Operator"),
        SymbolKind::Condition => (name.to_owned(), "Condition"),
        SymbolKind::Function => (format!("{name}()"), "Function"),
        SymbolKind::StatementFunction => (format!("{name}()"), "Statement Function"),
    };

    let mut text = format!("**{label}** - HRW4U {title}\n\n");
    if let Some(suffix) = suffix {
        let _ = writeln!(text, "**Base:** `{}`", params.key);
        let _ = writeln!(text, "**Suffix:** `{suffix}`");
    }
    let _ = write!(text, "**Maps to:** `{}`", maps_to(kind, params, suffix));

    if !params.doc.is_empty() {
        let _ = write!(text, "\n\n{}", params.doc);
    }

    let restricted = params.restricted.intersection(SectionSet::HOOKS);
    if !restricted.is_empty() {
        let _ = write!(text, "\n\n**Restricted in sections:** {restricted}");
    }
    if !params.is_valid_in(section) {
        let _ = write!(text, "\n\n*Not available in the {section} section.*");
    }
    text
}

/// Display form of what an entry maps to.
fn maps_to(kind: SymbolKind, params: &MapParams, suffix: Option<&str>) -> String {
    match (kind, params.op) {
        (_, Some(OpTemplate::Keyed { set, rm, add })) => match add {
            Some(add) => format!("{set} / {rm} / {add}"),
            None => format!("{set} / {rm}"),
        },
        (_, Some(template)) => template.command().to_owned(),
        (SymbolKind::Function, None) if params.arity.max == 0 => format!("%{{{}}}", params.target),
        (SymbolKind::Function, None) => format!("%{{{}:...}}", params.target),
        (_, None) => match suffix {
            Some(suffix) => params.render_target(Some(suffix)),
            None if params.is_prefix() => format!("{}...}}", params.target),
            None => params.target.to_owned(),
        },
    }
}
