//! Database executor trait.
//!
//! [`DbExecutor`] is the minimal async interface [`QuerySet`] execution
//! methods need. Backends (or test doubles) implement it; the ORM never talks
//! to a driver directly.
//!
//! [`QuerySet`]: crate::query::queryset::QuerySet

use crate::query::compiler::{DatabaseBackendType, Row};
use crate::value::Value;
use autoscopes_core::AutoScopesResult;

/// Minimal async database executor trait.
#[async_trait::async_trait]
pub trait DbExecutor: Send + Sync {
    /// Returns the backend type for SQL compilation.
    fn backend_type(&self) -> DatabaseBackendType;

    /// Runs a SQL query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> AutoScopesResult<Vec<Row>>;
}
