//! Calling scopes on a [`QuerySet`].

use autoscopes_core::AutoScopesResult;
use autoscopes_db::model::Model;
use autoscopes_db::query::queryset::QuerySet;

use crate::args::{ScopeArg, ScopeContext};
use crate::generator::generate_model;
use crate::registry::SCOPES;

/// Applies generated scopes by name.
///
/// Scopes for a model type are generated on first use.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
/// use autoscopes_core::AutoScopesResult;
/// use autoscopes_db::{ColumnDescriptor, DatabaseBackendType, Manager, Model, ModelMeta, Row, Value};
/// use autoscopes_scopes::ScopedQuerySet;
///
/// struct Payment { id: Value }
///
/// impl Model for Payment {
///     fn meta() -> &'static ModelMeta {
///         static META: LazyLock<ModelMeta> = LazyLock::new(|| {
///             ModelMeta::new("doc", "payment")
///                 .column(ColumnDescriptor::integer("id").primary_key())
///                 .column(ColumnDescriptor::float("amount"))
///         });
///         &META
///     }
///     fn pk(&self) -> Option<&Value> { Some(&self.id) }
///     fn from_row(row: &Row) -> AutoScopesResult<Self> {
///         Ok(Payment { id: row.get::<Value>("id")? })
///     }
/// }
///
/// let qs = Manager::<Payment>::new()
///     .all()
///     .scope("amount_in_range", &[(300..=600).into()])?
///     .scope("in_reverse_id_order", &[])?
///     .limit(2);
/// let (sql, _) = qs.to_sql(DatabaseBackendType::PostgreSQL);
/// assert_eq!(
///     sql,
///     "SELECT * FROM \"doc_payment\" WHERE \"amount\" BETWEEN $1 AND $2 ORDER BY \"id\" DESC LIMIT 2"
/// );
/// # Ok::<(), autoscopes_core::AutoScopesError>(())
/// ```
pub trait ScopedQuerySet: Sized {
    /// Applies scope `name` with a fresh [`ScopeContext`].
    ///
    /// # Errors
    ///
    /// Returns the scope lookup or template error.
    fn scope(self, name: &str, args: &[ScopeArg]) -> AutoScopesResult<Self> {
        self.scope_with(name, args, &ScopeContext::new())
    }

    /// Applies scope `name` with an explicit context.
    ///
    /// # Errors
    ///
    /// Returns the scope lookup or template error.
    fn scope_with(self, name: &str, args: &[ScopeArg], ctx: &ScopeContext) -> AutoScopesResult<Self>;
}

impl<M: Model> ScopedQuerySet for QuerySet<M> {
    fn scope_with(self, name: &str, args: &[ScopeArg], ctx: &ScopeContext) -> AutoScopesResult<Self> {
        let label = M::meta().label();
        if !SCOPES.contains(&label) {
            generate_model::<M>();
        }
        let fragment = SCOPES.call(&label, name, args, ctx)?;
        Ok(self.apply(fragment))
    }
}
