//! Query fragments: the output of a scope.
//!
//! A [`QueryFragment`] is either a narrowing filter or an ordering directive.
//! Fragments compose in call order: filters AND together, orderings append.

use super::compiler::{OrderBy, Query, WhereNode};
use super::lookups::Q;

/// One composable piece of a query, produced by calling a scope.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFragment {
    /// Narrow the result set.
    Filter(Q),
    /// Append an ORDER BY term.
    Order(OrderBy),
}

impl QueryFragment {
    /// Applies this fragment to a query AST.
    pub fn apply_to(self, query: &mut Query) {
        match self {
            Self::Filter(q) => query.add_where(WhereNode::from_q(&q)),
            Self::Order(order) => query.order_by.push(order),
        }
    }

    /// Returns the filter, if this is one.
    pub const fn as_filter(&self) -> Option<&Q> {
        match self {
            Self::Filter(q) => Some(q),
            Self::Order(_) => None,
        }
    }

    /// Returns the ordering, if this is one.
    pub const fn as_order(&self) -> Option<&OrderBy> {
        match self {
            Self::Order(order) => Some(order),
            Self::Filter(_) => None,
        }
    }
}

impl From<Q> for QueryFragment {
    fn from(q: Q) -> Self {
        Self::Filter(q)
    }
}

impl From<OrderBy> for QueryFragment {
    fn from(order: OrderBy) -> Self {
        Self::Order(order)
    }
}
