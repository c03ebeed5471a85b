//! State variables declared in the `VARS` section.
//!
//! A declaration binds a name to the next free numbered state slot of its
//! type. Conditions read the slot (`%{STATE-FLAG:3}`); assignments write it
//! (`set-state-flag 3 true`).

use std::fmt;

use hrw_diagnostic::SymbolResolutionError;
use hrw_ir::vocab;
use rustc_hash::FxHashMap;

use crate::params::ValueCheck;
use crate::Result;

/// Declared type of a state variable.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum VarType {
    Bool,
    Int8,
    Int16,
}

impl VarType {
    pub const ALL: [VarType; 3] = [VarType::Bool, VarType::Int8, VarType::Int16];

    /// Parse a type keyword (`bool`, `boolean`, `int8`, `int16`).
    pub fn from_keyword(keyword: &str) -> Option<VarType> {
        match keyword.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Some(VarType::Bool),
            "int8" => Some(VarType::Int8),
            "int16" => Some(VarType::Int16),
            _ => None,
        }
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            VarType::Bool => "bool",
            VarType::Int8 => "int8",
            VarType::Int16 => "int16",
        }
    }

    /// Number of slots available for this type.
    pub const fn slots(self) -> u8 {
        match self {
            VarType::Bool => 16,
            VarType::Int8 => 4,
            VarType::Int16 => 1,
        }
    }

    /// Condition tag, as in `%{STATE-FLAG:0}`.
    pub const fn state_tag(self) -> &'static str {
        match self {
            VarType::Bool => "STATE-FLAG",
            VarType::Int8 => "STATE-INT8",
            VarType::Int16 => "STATE-INT16",
        }
    }

    /// Operator writing a slot of this type.
    pub const fn set_command(self) -> &'static str {
        match self {
            VarType::Bool => "set-state-flag",
            VarType::Int8 => "set-state-int8",
            VarType::Int16 => "set-state-int16",
        }
    }

    pub fn from_state_tag(tag: &str) -> Option<VarType> {
        VarType::ALL.into_iter().find(|ty| ty.state_tag() == tag)
    }

    pub fn from_set_command(cmd: &str) -> Option<VarType> {
        VarType::ALL.into_iter().find(|ty| ty.set_command() == cmd)
    }

    const fn value_check(self) -> ValueCheck {
        match self {
            VarType::Bool => ValueCheck::Bool,
            VarType::Int8 => ValueCheck::Int { min: 0, max: 255 },
            VarType::Int16 => ValueCheck::Int { min: 0, max: 65535 },
        }
    }

    const fn index(self) -> usize {
        match self {
            VarType::Bool => 0,
            VarType::Int8 => 1,
            VarType::Int16 => 2,
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A declared variable bound to a state slot.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Variable {
    pub name: String,
    pub ty: VarType,
    pub slot: u8,
}

impl Variable {
    /// `%{STATE-FLAG:3}`.
    pub fn condition_target(&self) -> String {
        format!("%{{{}:{}}}", self.ty.state_tag(), self.slot)
    }

    /// `set-state-flag 3 true`, after checking `value` against the type.
    pub fn assign(&self, value: &str) -> Result<String> {
        let value = value.trim();
        self.ty
            .value_check()
            .validate(value)
            .map_err(|reason| SymbolResolutionError::invalid_argument(self.name.clone(), reason))?;
        Ok(format!(
            "{} {} {}",
            self.ty.set_command(),
            self.slot,
            crate::params::unquote(value)
        ))
    }

    /// Whether a bare use of the variable is a truth test.
    pub fn is_negatable(&self) -> bool {
        self.ty == VarType::Bool
    }

    /// `name: type;` as written in a `VARS` section.
    pub fn declaration(&self) -> String {
        format!("{}: {};", self.name, self.ty)
    }
}

/// Variables of one resolver, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct Variables {
    by_name: FxHashMap<String, usize>,
    by_slot: FxHashMap<(VarType, u8), usize>,
    declared: Vec<Variable>,
    next: [u8; 3],
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to the next free slot of `ty`.
    pub fn declare(&mut self, name: &str, ty: VarType) -> Result<&Variable> {
        let invalid = |reason: String| SymbolResolutionError::InvalidVariable {
            name: name.to_owned(),
            reason,
        };

        if !is_identifier(name) {
            return Err(invalid("names must be identifiers".to_owned()));
        }
        if vocab::KEYWORDS.contains(&name) {
            return Err(invalid(format!("'{name}' is a keyword")));
        }
        if self.by_name.contains_key(name) {
            return Err(invalid("already declared".to_owned()));
        }

        let mut slot = self.next[ty.index()];
        while self.by_slot.contains_key(&(ty, slot)) {
            slot += 1;
        }
        if slot >= ty.slots() {
            return Err(invalid(format!(
                "all {} {} slots are in use",
                ty.slots(),
                ty.keyword()
            )));
        }
        self.next[ty.index()] = slot + 1;
        Ok(self.bind(name.to_owned(), ty, slot))
    }

    /// The variable bound to `slot`, declaring `{type}_{slot}` if none is.
    ///
    /// Used when decompiling, where slots appear without declarations.
    pub fn for_slot(&mut self, ty: VarType, slot: u8) -> Result<&Variable> {
        if slot >= ty.slots() {
            return Err(SymbolResolutionError::InvalidVariable {
                name: format!("{}:{slot}", ty.state_tag()),
                reason: format!("{} has only {} slots", ty.keyword(), ty.slots()),
            });
        }
        let index = match self.by_slot.get(&(ty, slot)) {
            Some(&index) => index,
            None => {
                let mut name = format!("{}_{slot}", ty.keyword());
                while self.by_name.contains_key(&name) {
                    name.push('_');
                }
                self.bind(name, ty, slot);
                self.declared.len() - 1
            }
        };
        Ok(&self.declared[index])
    }

    fn bind(&mut self, name: String, ty: VarType, slot: u8) -> &Variable {
        let index = self.declared.len();
        self.by_name.insert(name.clone(), index);
        self.by_slot.insert((ty, slot), index);
        self.declared.push(Variable { name, ty, slot });
        &self.declared[index]
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.by_name.get(name).map(|&index| &self.declared[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.declared.iter()
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Variables::default();
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests;
