//! Query lookups and Q objects for building filters.
//!
//! This module provides the [`Lookup`] enum for column-level comparisons and
//! the [`Q`] enum for combining filters with AND, OR, and NOT operators.
//!
//! # Examples
//!
//! ```
//! use autoscopes_db::query::lookups::{Q, Lookup};
//! use autoscopes_db::value::Value;
//!
//! // Simple filter: login = "betty"
//! let q = Q::filter("login", Lookup::Exact(Value::from("betty")));
//!
//! // Combining with AND: login = "betty" AND amount > 300
//! let combined = q & Q::filter("amount", Lookup::Gt(Value::from(300)));
//!
//! // NOT: NOT(active = false)
//! let negated = !Q::filter("active", Lookup::Exact(Value::from(false)));
//! ```

use crate::value::Value;
use std::ops;

/// A column-level lookup operation.
///
/// Each variant produces one SQL WHERE clause fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Exact match (`col = value`, or `col IS NULL` for a null value).
    Exact(Value),
    /// Substring match (`col LIKE '%value%'`).
    Contains(String),
    /// Membership test (`col IN (values...)`). An empty list matches nothing.
    In(Vec<Value>),
    /// Greater than (`col > value`).
    Gt(Value),
    /// Greater than or equal (`col >= value`).
    Gte(Value),
    /// Less than (`col < value`).
    Lt(Value),
    /// Less than or equal (`col <= value`).
    Lte(Value),
    /// Starts with (`col LIKE 'value%'`).
    StartsWith(String),
    /// Ends with (`col LIKE '%value'`).
    EndsWith(String),
    /// Inclusive range test (`col BETWEEN low AND high`).
    Range(Value, Value),
    /// NULL test (`col IS NULL` or `col IS NOT NULL`).
    IsNull(bool),
}

/// A composable query filter.
///
/// `Q` objects can be combined using `&` (AND), `|` (OR), and `!` (NOT).
/// An empty `And` is always true and an empty `Or` is always false.
#[derive(Debug, Clone, PartialEq)]
pub enum Q {
    /// A single column lookup.
    Filter {
        /// The column name.
        field: String,
        /// The lookup operation.
        lookup: Lookup,
    },
    /// Logical AND of multiple conditions.
    And(Vec<Q>),
    /// Logical OR of multiple conditions.
    Or(Vec<Q>),
    /// Logical negation of a condition.
    Not(Box<Q>),
}

impl Q {
    /// Creates a new filter Q object.
    pub fn filter(field: impl Into<String>, lookup: Lookup) -> Self {
        Self::Filter {
            field: field.into(),
            lookup,
        }
    }

    /// A filter that matches every row.
    pub const fn always() -> Self {
        Self::And(Vec::new())
    }

    /// A filter that matches no row.
    pub const fn never() -> Self {
        Self::Or(Vec::new())
    }

    /// Returns `true` if this is an empty AND or OR.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => children.is_empty(),
            _ => false,
        }
    }
}

impl ops::BitAnd for Q {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ANDs
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (other, Self::And(mut right)) => {
                right.insert(0, other);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }
}

impl ops::BitOr for Q {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ORs
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (other, Self::Or(mut right)) => {
                right.insert(0, other);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }
}

impl ops::Not for Q {
    type Output = Self;

    fn not(self) -> Self::Output {
        // Double negation cancellation
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}
