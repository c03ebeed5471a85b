//! The parsed hrw4u document handed over by the front end.
//!
//! Only what the drivers need: names, raw argument text and spans. Values
//! keep their quotes exactly as written in the source.

use hrw_ir::{Section, Span};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub vars: Vec<VarDecl>,
    pub sections: Vec<SectionBlock>,
}

/// `name: type;` inside `VARS { ... }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarDecl {
    pub name: String,
    pub ty: String,
    pub span: Span,
}

/// `SECTION { ... }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionBlock {
    pub section: Section,
    pub body: Vec<Item>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    Statement(Statement),
    If(IfBlock),
}

/// `if a && !b || c { ... } elif d { ... } else { ... }`.
///
/// Conditions are flattened left to right; parentheses become
/// [`Factor::Group`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IfBlock {
    pub terms: Vec<Term>,
    pub body: Vec<Statement>,
    pub elifs: Vec<ElifClause>,
    pub else_body: Option<Vec<Statement>>,
    pub span: Span,
}

impl IfBlock {
    pub fn new(terms: Vec<Term>, body: Vec<Statement>, span: Span) -> Self {
        IfBlock {
            terms,
            body,
            elifs: Vec::new(),
            else_body: None,
            span,
        }
    }

    #[must_use]
    pub fn elif(mut self, terms: Vec<Term>, body: Vec<Statement>, span: Span) -> Self {
        self.elifs.push(ElifClause { terms, body, span });
        self
    }

    #[must_use]
    pub fn otherwise(mut self, body: Vec<Statement>) -> Self {
        self.else_body = Some(body);
        self
    }
}

/// `elif cond { ... }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElifClause {
    pub terms: Vec<Term>,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Term {
    pub factor: Factor,
    pub negated: bool,
    /// How this term joins the next one. Ignored on the last term.
    pub connective: Connective,
    pub span: Span,
}

impl Term {
    pub fn new(factor: Factor, span: Span) -> Self {
        Term {
            factor,
            negated: false,
            connective: Connective::And,
            span,
        }
    }

    #[must_use]
    pub fn negated(mut self) -> Self {
        self.negated = true;
        self
    }

    #[must_use]
    pub fn or(mut self) -> Self {
        self.connective = Connective::Or;
        self
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Connective {
    #[default]
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Factor {
    /// Bare identifier: `inbound.req.X-Foo`, `my_flag`.
    Ident(String),
    /// Function call: `random(100)`.
    Call { name: String, args: Vec<String> },
    Compare(Comparison),
    /// Parenthesised sub-condition.
    Group(Vec<Term>),
    Bool(bool),
}

/// Left-hand side of a comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Comparable {
    Ident(String),
    Call { name: String, args: Vec<String> },
}

impl Comparable {
    pub fn name(&self) -> &str {
        match self {
            Comparable::Ident(name) | Comparable::Call { name, .. } => name,
        }
    }
}

/// `lhs OP rhs [with MODS]`.
///
/// `rhs` is source text: a value for `==`/`!=`/`<`/`>`, a `/regex/` for
/// `~`/`!~`, and a `[a, b]` set or `{10.0.0.0/8, ...}` IP range for `in`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub lhs: Comparable,
    pub op: CompareOp,
    pub rhs: String,
    /// `with NOCASE,PRE`, upper- or lower-case as written.
    pub modifiers: Vec<String>,
}

impl Comparison {
    pub fn new(lhs: Comparable, op: CompareOp, rhs: impl Into<String>) -> Self {
        Comparison {
            lhs,
            op,
            rhs: rhs.into(),
            modifiers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, modifier: impl Into<String>) -> Self {
        self.modifiers.push(modifier.into());
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Match,
    NotMatch,
    In,
}

impl CompareOp {
    /// hrw4u spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Match => "~",
            CompareOp::NotMatch => "!~",
            CompareOp::In => "in",
        }
    }

    /// Whether the header-rewrite form carries `[NOT]`.
    pub const fn is_negative(self) -> bool {
        matches!(self, CompareOp::Ne | CompareOp::NotMatch)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    /// `break;`
    Break { span: Span },
    /// `name = value;`
    Assign { name: String, value: String, span: Span },
    /// `name += value;`
    AddAssign { name: String, value: String, span: Span },
    /// `name(args);`
    Call {
        name: String,
        args: Vec<String>,
        span: Span,
    },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Break { span }
            | Statement::Assign { span, .. }
            | Statement::AddAssign { span, .. }
            | Statement::Call { span, .. } => *span,
        }
    }
}
