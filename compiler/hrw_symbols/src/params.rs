//! Symbol descriptors.
//!
//! A [`MapParams`] is one row of a symbol table: the hrw4u key, the
//! header-rewrite primitive it maps to, where it is restricted, and the shape
//! metadata the resolvers need to validate and render a use of it.
//! Descriptors are `const`-constructed so the built-in tables are plain
//! statics.

use std::fmt;

use hrw_ir::{is_member, Section, SectionSet};

/// Field vocabulary a prefix symbol's suffix is validated against.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SuffixGroup {
    /// Any non-empty token without whitespace (header and cookie names).
    Any,
    /// A single regex capture group index, `0` to `9`.
    Capture,
    Url,
    Cert,
    San,
    Conn,
    Geo,
    Id,
    Date,
    HttpCntl,
}

impl SuffixGroup {
    /// The closed field list, or `None` for open groups.
    pub const fn fields(self) -> Option<&'static [&'static str]> {
        match self {
            SuffixGroup::Any | SuffixGroup::Capture => None,
            SuffixGroup::Url => Some(&["HOST", "PORT", "PATH", "QUERY", "SCHEME", "URL"]),
            SuffixGroup::Cert => Some(&[
                "PEM",
                "SIG",
                "SUBJECT",
                "ISSUER",
                "SERIAL",
                "NOT_BEFORE",
                "NOT_AFTER",
                "VERSION",
            ]),
            SuffixGroup::San => Some(&["DNS", "IP", "EMAIL", "URI"]),
            SuffixGroup::Conn => Some(&[
                "LOCAL-ADDR",
                "LOCAL-PORT",
                "REMOTE-ADDR",
                "REMOTE-PORT",
                "TLS",
                "H2",
                "IPV4",
                "IPV6",
                "IP-FAMILY",
                "STACK",
            ]),
            SuffixGroup::Geo => Some(&["COUNTRY", "COUNTRY-ISO", "ASN", "ASN-NAME"]),
            SuffixGroup::Id => Some(&["REQUEST", "PROCESS", "UNIQUE"]),
            SuffixGroup::Date => Some(&["YEAR", "MONTH", "DAY", "HOUR", "MINUTE", "WEEKDAY", "YEARDAY"]),
            SuffixGroup::HttpCntl => Some(&[
                "LOGGING",
                "INTERCEPT_RETRY",
                "RESP_CACHEABLE",
                "REQ_CACHEABLE",
                "SERVER_NO_STORE",
                "TXN_DEBUG",
                "SKIP_REMAP",
            ]),
        }
    }

    /// Case-insensitive suffix check.
    pub fn validate(self, suffix: &str) -> bool {
        if suffix.is_empty() || suffix.contains(char::is_whitespace) {
            return false;
        }
        match self {
            SuffixGroup::Any => true,
            SuffixGroup::Capture => suffix.len() == 1 && suffix.as_bytes()[0].is_ascii_digit(),
            group => group
                .fields()
                .is_some_and(|fields| fields.iter().any(|field| field.eq_ignore_ascii_case(suffix))),
        }
    }
}

/// Validation applied to the right-hand side of an assignment.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ValueCheck {
    Any,
    /// Integer in `min..=max`.
    Int { min: i64, max: i64 },
    /// `true` or `false`.
    Bool,
    OneOf(&'static [&'static str]),
}

impl ValueCheck {
    /// Check `value`, which may still carry its source quotes.
    pub fn validate(self, value: &str) -> Result<(), String> {
        let bare = unquote(value.trim());
        match self {
            ValueCheck::Any => Ok(()),
            ValueCheck::Int { min, max } => match bare.parse::<i64>() {
                Ok(n) if (min..=max).contains(&n) => Ok(()),
                Ok(n) => Err(format!("value {n} is out of range {min}..={max}")),
                Err(_) => Err(format!("expected an integer, found '{bare}'")),
            },
            ValueCheck::Bool => match bare {
                "true" | "false" => Ok(()),
                _ => Err(format!("expected true or false, found '{bare}'")),
            },
            ValueCheck::OneOf(allowed) => {
                if allowed.iter().any(|a| a.eq_ignore_ascii_case(bare)) {
                    Ok(())
                } else {
                    Err(format!("expected one of {}, found '{bare}'", allowed.join(", ")))
                }
            }
        }
    }
}

/// Strip one pair of surrounding double quotes, if present.
pub(crate) fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

/// Accepted argument count for functions and statement functions.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Arity {
    pub min: u8,
    pub max: u8,
}

impl Arity {
    pub const NONE: Arity = Arity { min: 0, max: 0 };
    /// Upper bound used for variadic calls.
    pub const VARIADIC: u8 = u8::MAX;

    pub const fn new(min: u8, max: u8) -> Self {
        Arity { min, max }
    }

    pub const fn exactly(n: u8) -> Self {
        Arity { min: n, max: n }
    }

    pub fn contains(self, count: usize) -> bool {
        (usize::from(self.min)..=usize::from(self.max)).contains(&count)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = |n: u8| if n == 1 { "argument" } else { "arguments" };
        if self.min == self.max {
            write!(f, "exactly {} {}", self.min, plural(self.min))
        } else if self.max == Arity::VARIADIC {
            write!(f, "at least {} {}", self.min, plural(self.min))
        } else {
            write!(f, "{} to {} arguments", self.min, self.max)
        }
    }
}

bitflags::bitflags! {
    /// Operator modifiers, written `[L,QSA]` after a header-rewrite operator.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct OpModifiers: u8 {
        /// Stop evaluating further rules (`[L]`).
        const LAST = 1 << 0;
        /// Keep the original query string on redirect (`[QSA]`).
        const QSA = 1 << 1;
        /// Invert the operator's selection (`[I]`).
        const INV = 1 << 2;
    }
}

impl OpModifiers {
    /// Parse a single modifier name, case-insensitively.
    pub fn parse_one(name: &str) -> Option<OpModifiers> {
        match name.trim().to_ascii_uppercase().as_str() {
            "L" | "LAST" => Some(OpModifiers::LAST),
            "QSA" => Some(OpModifiers::QSA),
            "I" | "INV" => Some(OpModifiers::INV),
            _ => None,
        }
    }

    /// Short names, in rendering order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        [
            (OpModifiers::LAST, "L"),
            (OpModifiers::QSA, "QSA"),
            (OpModifiers::INV, "I"),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
    }

    /// `[L,QSA]`, or the empty string when no modifier is set.
    pub fn render(self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let names: Vec<_> = self.names().collect();
        format!("[{}]", names.join(","))
    }
}

bitflags::bitflags! {
    /// Condition modifiers, written `[NOT,OR]` after a header-rewrite condition.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct CondModifiers: u16 {
        const AND = 1 << 0;
        const NOT = 1 << 1;
        const NOCASE = 1 << 2;
        const EXT = 1 << 3;
        const PRE = 1 << 4;
        const SUF = 1 << 5;
        const MID = 1 << 6;
        const OR = 1 << 7;
        const LAST = 1 << 8;

        /// String-match modifiers, the ones hrw4u spells with `with`.
        const MATCH = Self::NOCASE.bits()
            | Self::EXT.bits()
            | Self::PRE.bits()
            | Self::SUF.bits()
            | Self::MID.bits();
    }
}

impl CondModifiers {
    const NAMES: [(CondModifiers, &'static str); 9] = [
        (CondModifiers::AND, "AND"),
        (CondModifiers::NOT, "NOT"),
        (CondModifiers::NOCASE, "NOCASE"),
        (CondModifiers::EXT, "EXT"),
        (CondModifiers::PRE, "PRE"),
        (CondModifiers::SUF, "SUF"),
        (CondModifiers::MID, "MID"),
        (CondModifiers::OR, "OR"),
        (CondModifiers::LAST, "L"),
    ];

    /// Parse a single modifier name, case-insensitively.
    pub fn parse_one(name: &str) -> Option<CondModifiers> {
        let name = name.trim().to_ascii_uppercase();
        if name == "LAST" {
            return Some(CondModifiers::LAST);
        }
        Self::NAMES.iter().find(|(_, n)| *n == name).map(|(flag, _)| *flag)
    }

    /// Short names, in rendering order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }

    /// `[NOT,OR]`, or the empty string when no modifier is set.
    pub fn render(self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let names: Vec<_> = self.names().collect();
        format!("[{}]", names.join(","))
    }
}

/// How an operator or statement function renders as a header-rewrite line.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum OpTemplate {
    /// `cmd VALUE`, or `cmd SUFFIX VALUE` for prefix keys.
    Value { cmd: &'static str },
    /// Set/remove/add family: `set SUFFIX VALUE`, `rm SUFFIX`, `add SUFFIX VALUE`.
    /// An empty value selects the remove form.
    Keyed {
        set: &'static str,
        rm: &'static str,
        add: Option<&'static str>,
    },
    /// `cmd FIXED... ARGS... [MODIFIERS]`.
    Call {
        cmd: &'static str,
        fixed: &'static [&'static str],
        modifiers: OpModifiers,
    },
}

impl OpTemplate {
    pub const fn value(cmd: &'static str) -> Self {
        OpTemplate::Value { cmd }
    }

    pub const fn keyed(set: &'static str, rm: &'static str, add: Option<&'static str>) -> Self {
        OpTemplate::Keyed { set, rm, add }
    }

    pub const fn call(cmd: &'static str) -> Self {
        OpTemplate::Call {
            cmd,
            fixed: &[],
            modifiers: OpModifiers::empty(),
        }
    }

    pub const fn call_with(
        cmd: &'static str,
        fixed: &'static [&'static str],
        modifiers: OpModifiers,
    ) -> Self {
        OpTemplate::Call {
            cmd,
            fixed,
            modifiers,
        }
    }

    /// The primary command name.
    pub const fn command(&self) -> &'static str {
        match self {
            OpTemplate::Value { cmd } | OpTemplate::Call { cmd, .. } => cmd,
            OpTemplate::Keyed { set, .. } => set,
        }
    }
}

/// One symbol table row.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct MapParams {
    /// hrw4u key. Keys ending in `.` are prefix keys.
    pub key: &'static str,
    /// What the key maps to:
    /// - exact conditions: the complete primitive, `%{IP:CLIENT}`
    /// - prefix conditions: the primitive up to the suffix, `%{CLIENT-HEADER:`
    /// - functions: the bare tag, `RANDOM`
    /// - operators and statement functions: the primary command
    pub target: &'static str,
    /// Sections where this symbol is NOT available.
    pub restricted: SectionSet,
    pub arity: Arity,
    /// Upper-case the suffix when rendering.
    pub upper: bool,
    pub suffix: SuffixGroup,
    pub value: ValueCheck,
    pub op: Option<OpTemplate>,
    /// Bare use is an implicit non-empty test, so the condition is negatable.
    pub default_expr: bool,
    /// Whether inverse resolution reconstructs this key.
    pub round_trip: bool,
    pub doc: &'static str,
}

impl MapParams {
    /// A descriptor valid in every hook and restricted only in `VARS`.
    pub const fn new(key: &'static str, target: &'static str) -> Self {
        MapParams {
            key,
            target,
            restricted: SectionSet::VARS,
            arity: Arity::NONE,
            upper: false,
            suffix: SuffixGroup::Any,
            value: ValueCheck::Any,
            op: None,
            default_expr: false,
            round_trip: true,
            doc: "",
        }
    }

    /// An operator or statement function rendered through `template`.
    pub const fn operator(key: &'static str, template: OpTemplate) -> Self {
        let mut params = MapParams::new(key, template.command());
        params.op = Some(template);
        params
    }

    /// Restrict to `allowed` (plus the implicit `VARS` restriction).
    pub const fn only_in(mut self, allowed: SectionSet) -> Self {
        self.restricted = SectionSet::only(allowed);
        self
    }

    pub const fn with_suffix(mut self, group: SuffixGroup) -> Self {
        self.suffix = group;
        self
    }

    /// Validate the suffix against `group` and upper-case it.
    pub const fn with_upper(mut self, group: SuffixGroup) -> Self {
        self.suffix = group;
        self.upper = true;
        self
    }

    pub const fn with_value(mut self, check: ValueCheck) -> Self {
        self.value = check;
        self
    }

    pub const fn with_arity(mut self, min: u8, max: u8) -> Self {
        self.arity = Arity::new(min, max);
        self
    }

    pub const fn negatable(mut self) -> Self {
        self.default_expr = true;
        self
    }

    /// Forward-only spelling; inverse resolution never produces it.
    pub const fn alias(mut self) -> Self {
        self.round_trip = false;
        self
    }

    pub const fn with_doc(mut self, doc: &'static str) -> Self {
        self.doc = doc;
        self
    }

    pub const fn is_prefix(&self) -> bool {
        let bytes = self.key.as_bytes();
        !bytes.is_empty() && bytes[bytes.len() - 1] == b'.'
    }

    #[inline]
    pub fn is_valid_in(&self, section: Section) -> bool {
        !is_member(section, self.restricted)
    }

    /// Hooks where this symbol is available.
    pub fn valid_sections(&self) -> SectionSet {
        SectionSet::HOOKS.difference(self.restricted)
    }

    /// Apply upper-casing to a validated suffix.
    pub fn normalize_suffix(&self, suffix: &str) -> String {
        if self.upper {
            suffix.to_ascii_uppercase()
        } else {
            suffix.to_owned()
        }
    }

    /// The condition text for a use of this entry.
    ///
    /// Exact entries return the target verbatim. Prefix entries append the
    /// normalized suffix and close the `%{` they opened.
    pub fn render_target(&self, suffix: Option<&str>) -> String {
        let Some(suffix) = suffix else {
            return self.target.to_owned();
        };
        let suffix = self.normalize_suffix(suffix);
        if self.target.starts_with("%{") {
            format!("{}{suffix}}}", self.target)
        } else {
            format!("{}{suffix}", self.target)
        }
    }

    /// The target with its `%{`, `}` and trailing `:` stripped, as it appears
    /// inside a header-rewrite `%{...}` token.
    pub fn primitive(&self) -> &'static str {
        primitive_inner(self.target)
    }
}

/// Strip `%{`, a closing `}` and a trailing `:` from a target.
pub(crate) fn primitive_inner(target: &'static str) -> &'static str {
    let inner = target.strip_prefix("%{").unwrap_or(target);
    let inner = inner.strip_suffix('}').unwrap_or(inner);
    inner.strip_suffix(':').unwrap_or(inner)
}

#[cfg(test)]
mod tests;
