//! Variable values, comparisons and parameter bindings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed value stored in the shared variable store or a parameter slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VarValue {
    Integer(i32),
    Boolean(bool),
    Text(String),
}

impl VarValue {
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            VarValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            VarValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            VarValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Parse a raw token the way script authors write values: integer first,
    /// then boolean, falling back to text.
    pub fn parse(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i32>() {
            VarValue::Integer(i)
        } else if let Ok(b) = raw.parse::<bool>() {
            VarValue::Boolean(b)
        } else {
            VarValue::Text(raw.to_string())
        }
    }
}

impl std::fmt::Display for VarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VarValue::Integer(i) => write!(f, "{i}"),
            VarValue::Boolean(b) => write!(f, "{b}"),
            VarValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i32> for VarValue {
    fn from(i: i32) -> Self {
        VarValue::Integer(i)
    }
}

impl From<bool> for VarValue {
    fn from(b: bool) -> Self {
        VarValue::Boolean(b)
    }
}

impl From<String> for VarValue {
    fn from(s: String) -> Self {
        VarValue::Text(s)
    }
}

impl From<&str> for VarValue {
    fn from(s: &str) -> Self {
        VarValue::Text(s.to_string())
    }
}

/// Shared store for game variables, visible to every running list
pub type VarStore = BTreeMap<String, VarValue>;

/// Named typed slots owned by a list; actions bind against them at dispatch
pub type ParamSet = BTreeMap<String, VarValue>;

/// Comparison operators usable in branch tests
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Comparison {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Comparison {
    /// Evaluate `lhs <op> rhs`. Ordering comparisons only apply to integers;
    /// booleans and text support equality tests and answer false otherwise.
    pub fn evaluate(&self, lhs: &VarValue, rhs: &VarValue) -> bool {
        match (lhs, rhs) {
            (VarValue::Integer(a), VarValue::Integer(b)) => match self {
                Comparison::Equal => a == b,
                Comparison::NotEqual => a != b,
                Comparison::LessThan => a < b,
                Comparison::LessThanOrEqual => a <= b,
                Comparison::GreaterThan => a > b,
                Comparison::GreaterThanOrEqual => a >= b,
            },
            (VarValue::Boolean(a), VarValue::Boolean(b)) => match self {
                Comparison::Equal => a == b,
                Comparison::NotEqual => a != b,
                _ => false,
            },
            (VarValue::Text(a), VarValue::Text(b)) => match self {
                Comparison::Equal => a == b,
                Comparison::NotEqual => a != b,
                _ => false,
            },
            _ => false,
        }
    }
}

/// Arithmetic operators for variable modification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NumericOp {
    Add,
    Subtract,
}

/// A field binding: either a literal value or a reference into the owning
/// list's parameter set, resolved at dispatch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Arg {
    Literal(VarValue),
    Param(String),
}

impl Arg {
    pub fn literal(value: impl Into<VarValue>) -> Self {
        Arg::Literal(value.into())
    }

    pub fn param(name: impl Into<String>) -> Self {
        Arg::Param(name.into())
    }

    /// Resolve against a parameter set. `None` means a dangling parameter
    /// reference; callers log and fall back rather than fault.
    pub fn resolve<'a>(&'a self, params: &'a ParamSet) -> Option<&'a VarValue> {
        match self {
            Arg::Literal(value) => Some(value),
            Arg::Param(name) => params.get(name),
        }
    }
}

impl From<VarValue> for Arg {
    fn from(value: VarValue) -> Self {
        Arg::Literal(value)
    }
}
