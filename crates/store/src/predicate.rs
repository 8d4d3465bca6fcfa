//! Predicates for filtering the materialized view.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use tidemark_core::{QueryError, Record, Value};

/// Comparison operator for [`Predicate::Compare`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Returns true for operators that need an ordering between operands.
    fn is_ordering(&self) -> bool {
        matches!(self, CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge)
    }
}

/// A filter applied to every record before it enters the view.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Matches every record.
    True,
    /// Compares a field against a literal.
    Compare {
        key: String,
        op: CompareOp,
        value: Value,
    },
    /// Matches records whose field is null or absent.
    IsNull(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn compare(key: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            key: key.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Eq, value)
    }

    pub fn ne(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Ne, value)
    }

    pub fn lt(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Lt, value)
    }

    pub fn le(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Le, value)
    }

    pub fn gt(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Gt, value)
    }

    pub fn ge(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Ge, value)
    }

    pub fn is_null(key: impl Into<String>) -> Self {
        Predicate::IsNull(key.into())
    }

    /// Conjunction of `self` and `other`, flattening nested `And`s.
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut parts) => {
                parts.push(other);
                Predicate::And(parts)
            }
            first => Predicate::And(alloc::vec![first, other]),
        }
    }

    /// Disjunction of `self` and `other`, flattening nested `Or`s.
    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut parts) => {
                parts.push(other);
                Predicate::Or(parts)
            }
            first => Predicate::Or(alloc::vec![first, other]),
        }
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Evaluates the predicate against a record.
    ///
    /// A `Compare` on a key the record lacks fails with
    /// [`QueryError::UnknownKey`]; ordering a field against a literal of an
    /// incompatible type fails with [`QueryError::TypeMismatch`]. Null fields
    /// never satisfy an ordering comparison.
    pub fn evaluate<R: Record + ?Sized>(&self, record: &R) -> Result<bool, QueryError> {
        match self {
            Predicate::True => Ok(true),
            Predicate::Compare { key, op, value } => {
                let field = record.field(key).ok_or_else(|| QueryError::unknown_key(key.as_str()))?;
                compare(key, &field, *op, value)
            }
            Predicate::IsNull(key) => Ok(record.field(key).map_or(true, |v| v.is_null())),
            Predicate::And(parts) => {
                for part in parts {
                    if !part.evaluate(record)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or(parts) => {
                for part in parts {
                    if part.evaluate(record)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not(inner) => Ok(!inner.evaluate(record)?),
        }
    }
}

fn compare(key: &str, field: &Value, op: CompareOp, literal: &Value) -> Result<bool, QueryError> {
    if !field.is_comparable_with(literal) {
        if op.is_ordering() {
            // Both sides are non-null here, otherwise they would be comparable
            let (expected, got) = match (literal.data_type(), field.data_type()) {
                (Some(expected), Some(got)) => (expected, got),
                _ => return Ok(false),
            };
            return Err(QueryError::type_mismatch(key, expected, got));
        }
        return Ok(op == CompareOp::Ne);
    }
    if op.is_ordering() && (field.is_null() || literal.is_null()) {
        return Ok(false);
    }
    let ordering = field.value_cmp(literal);
    Ok(match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    })
}
