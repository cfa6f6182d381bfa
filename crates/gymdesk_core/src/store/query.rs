//! Exact-match filters and operator conditions.
//!
//! # Invariants
//! - Numbers compare numerically regardless of integer/float encoding.
//! - Ordering operators only match number-to-number or string-to-string.
//! - A missing field matches `!=` and nothing else.
//! - Unrecognized operators keep every document.

use crate::model::document::Document;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Exact-match predicate over zero or more fields.
///
/// The empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: Map<String, Value>,
}

impl Filter {
    /// Filter that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds one `field == value` requirement.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.fields.iter().all(|(name, expected)| {
            document
                .get(name)
                .is_some_and(|actual| values_equal(&actual, expected))
        })
    }
}

impl From<Map<String, Value>> for Filter {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Comparison operator of a query condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    In,
    /// Operator text nobody understands; passes every document through.
    Unknown(String),
}

impl Operator {
    pub fn parse(value: &str) -> Self {
        match value {
            "==" => Self::Eq,
            "!=" => Self::Ne,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Ge,
            "<=" => Self::Le,
            "in" => Self::In,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::In => "in",
            Self::Unknown(raw) => raw.as_str(),
        }
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        value.as_str().to_string()
    }
}

/// One `(field, operator, value)` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Builds a condition from operator text such as `">="`.
    pub fn parse(field: impl Into<String>, operator: &str, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::parse(operator), value)
    }

    pub fn matches(&self, document: &Document) -> bool {
        let actual = document.get(&self.field);
        let actual = actual.as_deref();
        match &self.operator {
            Operator::Eq => actual.is_some_and(|a| values_equal(a, &self.value)),
            Operator::Ne => !actual.is_some_and(|a| values_equal(a, &self.value)),
            Operator::Gt => ordering(actual, &self.value) == Some(Ordering::Greater),
            Operator::Lt => ordering(actual, &self.value) == Some(Ordering::Less),
            Operator::Ge => matches!(
                ordering(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Le => matches!(
                ordering(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::In => match (&self.value, actual) {
                (Value::Array(candidates), Some(a)) => {
                    candidates.iter().any(|candidate| values_equal(a, candidate))
                }
                _ => false,
            },
            Operator::Unknown(_) => true,
        }
    }
}

/// Strict equality with numeric normalization.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_f64(), r.as_f64()) {
            (Some(l), Some(r)) => l == r,
            _ => l == r,
        },
        _ => left == right,
    }
}

fn ordering(actual: Option<&Value>, expected: &Value) -> Option<Ordering> {
    match (actual?, expected) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}
