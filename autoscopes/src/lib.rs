//! # autoscopes
//!
//! Column-driven query scopes for a Django-style Rust ORM.
//!
//! This is the meta-crate that re-exports all sub-crates. Describe a model's
//! columns, and every `QuerySet` over it gains named scopes such as
//! `amount_greater_than`, `in_reverse_id_order`, `recent` or `id_excludes`.
//! Names that the model already answers to are never overwritten; they are
//! listed by [`list_rejected`](scopes::list_rejected) instead.
//!
//! ```
//! use std::sync::LazyLock;
//! use autoscopes::prelude::*;
//!
//! struct Payment { id: Value }
//!
//! impl Model for Payment {
//!     fn meta() -> &'static ModelMeta {
//!         static META: LazyLock<ModelMeta> = LazyLock::new(|| {
//!             ModelMeta::new("shop", "payment")
//!                 .column(ColumnDescriptor::integer("id").primary_key())
//!                 .column(ColumnDescriptor::boolean("active"))
//!         });
//!         &META
//!     }
//!     fn pk(&self) -> Option<&Value> { Some(&self.id) }
//!     fn from_row(row: &Row) -> AutoScopesResult<Self> {
//!         Ok(Payment { id: row.get::<Value>("id")? })
//!     }
//! }
//!
//! let qs = Manager::<Payment>::new().all().scope("not_active", &[])?;
//! let (sql, params) = qs.to_sql(DatabaseBackendType::SQLite);
//! assert_eq!(sql, "SELECT * FROM \"shop_payment\" WHERE \"active\" = ?");
//! assert_eq!(params, vec![Value::Bool(false)]);
//! # Ok::<(), AutoScopesError>(())
//! ```

/// Error types, settings, the settings loader and logging setup.
pub use autoscopes_core as core;

/// ORM surface: models, column descriptors, `Q` lookups, `QuerySet` and the
/// SQL compiler.
pub use autoscopes_db as db;

/// Column classification, the template bank, the collision guard and the
/// scope registry.
pub use autoscopes_scopes as scopes;

/// Management commands (CLI).
#[cfg(feature = "cli")]
pub use autoscopes_cli as cli;

/// The types most programs need, in one import.
pub mod prelude {
    pub use autoscopes_core::{AutoScopesError, AutoScopesResult, Settings, SETTINGS};
    pub use autoscopes_db::{
        ColumnDescriptor, ColumnType, DatabaseBackendType, DbExecutor, Lookup, Manager, Model,
        ModelMeta, QuerySet, Row, Value, Q,
    };
    pub use autoscopes_scopes::{
        generate, generate_model, list_installed, list_rejected, ScopeArg, ScopeContext,
        ScopedQuerySet,
    };
}
