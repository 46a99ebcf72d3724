//! # autoscopes-db
//!
//! The small ORM layer that generated scopes target. Provides column
//! descriptors and model schemas ([`ModelMeta`](model::ModelMeta)), the
//! backend-agnostic [`Value`](value::Value), composable [`Q`](query::Q)
//! filters, and a lazy [`QuerySet`](query::QuerySet) that compiles to
//! parameterized SQL through the [`SqlCompiler`](query::SqlCompiler).
//!
//! ## Module Overview
//!
//! - [`model`] - The [`Model`](model::Model) trait, [`ModelMeta`](model::ModelMeta) and schema files
//! - [`fields`] - Column descriptors ([`ColumnDescriptor`](fields::ColumnDescriptor)) and types
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum
//! - [`query`] - Lookups, query fragments, the query AST and compilation
//! - [`executor`] - The async [`DbExecutor`](executor::DbExecutor) bridge

// These clippy lints are intentionally allowed for the ORM crate:
// - format_push_string: format! with push_str is clearer than write! for SQL generation
// - doc_markdown: backtick requirements for documentation items are too strict
// - return_self_not_must_use: builder pattern methods are self-documenting
// - missing_const_for_fn: some functions may gain runtime logic later
#![allow(clippy::format_push_string)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::match_same_arms)]

pub mod executor;
pub mod fields;
pub mod model;
pub mod query;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use executor::DbExecutor;
pub use fields::{ColumnDescriptor, ColumnType};
pub use model::{load_schema_file, Model, ModelMeta, SchemaFile};
pub use query::{
    DatabaseBackendType, Lookup, Manager, OrderBy, Query, QueryFragment, QuerySet, Row,
    SqlCompiler, WhereNode, Q, QUERYSET_METHODS,
};
pub use value::Value;
