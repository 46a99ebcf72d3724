//! QuerySet and Manager for building and executing database queries.
//!
//! The [`QuerySet`] represents a lazy database query that builds up a SQL query
//! AST. It only executes when a terminal method is called (`execute_query`,
//! `count_exec`, ...). The [`Manager`] is the entry point for accessing
//! querysets on a model.
//!
//! # Examples
//!
//! ```
//! use autoscopes_db::query::lookups::{Q, Lookup};
//! use autoscopes_db::query::queryset::QUERYSET_METHODS;
//! // QuerySets are lazy: they build a Query AST without executing anything.
//! assert!(QUERYSET_METHODS.contains(&"filter"));
//! ```

use super::compiler::{DatabaseBackendType, OrderBy, Query, SelectColumn, SqlCompiler, WhereNode};
use super::fragment::QueryFragment;
use super::lookups::Q;
use crate::executor::DbExecutor;
use crate::model::Model;
use crate::value::Value;
use autoscopes_core::AutoScopesResult;
use std::marker::PhantomData;

/// Every name a [`QuerySet`] or [`Manager`] already answers to.
///
/// Generated scopes may never shadow these.
pub const QUERYSET_METHODS: &[&str] = &[
    "all",
    "apply",
    "count",
    "count_exec",
    "count_sql",
    "distinct",
    "exclude",
    "execute_query",
    "exists",
    "filter",
    "first",
    "get",
    "last",
    "limit",
    "none",
    "offset",
    "order_by",
    "query",
    "reverse",
    "scope",
    "scope_with",
    "then_order_by",
    "to_sql",
    "values",
];

/// The entry point for model-level query operations.
///
/// The `Manager` itself does not hold any query state; it simply creates
/// fresh `QuerySet` instances.
#[derive(Debug)]
pub struct Manager<M: Model> {
    _phantom: PhantomData<M>,
}

impl<M: Model> Default for Manager<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Manager<M> {
    /// Creates a new manager.
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }

    /// Returns a new `QuerySet` that returns all objects.
    pub fn all(&self) -> QuerySet<M> {
        QuerySet::new()
    }

    /// Returns a new `QuerySet` with the given filter applied.
    pub fn filter(&self, q: Q) -> QuerySet<M> {
        self.all().filter(q)
    }

    /// Returns a new `QuerySet` with the given exclusion applied.
    pub fn exclude(&self, q: Q) -> QuerySet<M> {
        self.all().exclude(q)
    }

    /// Returns an empty `QuerySet` that matches nothing.
    pub fn none(&self) -> QuerySet<M> {
        self.all().none()
    }
}

/// A lazy, composable database query.
///
/// All filtering/ordering methods consume `self` and return a modified
/// queryset, making the API chainable.
pub struct QuerySet<M: Model> {
    model: PhantomData<M>,
    query: Query,
    /// Whether this queryset should return no results.
    is_none: bool,
}

impl<M: Model> Clone for QuerySet<M> {
    fn clone(&self) -> Self {
        Self {
            model: PhantomData,
            query: self.query.clone(),
            is_none: self.is_none,
        }
    }
}

impl<M: Model> std::fmt::Debug for QuerySet<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySet")
            .field("query", &self.query)
            .field("is_none", &self.is_none)
            .finish()
    }
}

impl<M: Model> QuerySet<M> {
    /// Creates a new queryset for the model.
    fn new() -> Self {
        Self {
            model: PhantomData,
            query: Query::new(M::table_name()),
            is_none: false,
        }
    }

    /// Returns a reference to the underlying query AST.
    pub const fn query(&self) -> &Query {
        &self.query
    }

    // ── Filtering methods (lazy) ─────────────────────────────────────

    /// Adds a filter condition.
    #[must_use]
    pub fn filter(mut self, q: Q) -> Self {
        self.query.add_where(WhereNode::from_q(&q));
        self
    }

    /// Adds an exclusion condition (NOT).
    #[must_use]
    pub fn exclude(mut self, q: Q) -> Self {
        self.query
            .add_where(WhereNode::Not(Box::new(WhereNode::from_q(&q))));
        self
    }

    /// Replaces the ordering.
    #[must_use]
    pub fn order_by(mut self, fields: Vec<OrderBy>) -> Self {
        self.query.order_by = fields;
        self
    }

    /// Appends one ordering term after the existing ones.
    #[must_use]
    pub fn then_order_by(mut self, order: OrderBy) -> Self {
        self.query.order_by.push(order);
        self
    }

    /// Applies a scope's output: filters narrow, orderings append.
    #[must_use]
    pub fn apply(mut self, fragment: QueryFragment) -> Self {
        fragment.apply_to(&mut self.query);
        self
    }

    /// Reverses the current ordering.
    #[must_use]
    pub fn reverse(mut self) -> Self {
        for order in &mut self.query.order_by {
            order.descending = !order.descending;
        }
        self
    }

    /// Selects specific columns.
    #[must_use]
    pub fn values(mut self, fields: Vec<&str>) -> Self {
        self.query.select = fields
            .into_iter()
            .map(|f| SelectColumn::Column(f.to_string()))
            .collect();
        self
    }

    /// Adds DISTINCT to the query.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.query.distinct = true;
        self
    }

    /// Returns all objects (identity operation for chaining).
    #[must_use]
    pub fn all(self) -> Self {
        self
    }

    /// Returns an empty queryset.
    #[must_use]
    pub fn none(mut self) -> Self {
        self.is_none = true;
        self
    }

    /// Sets the LIMIT.
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.query.limit = Some(n);
        self
    }

    /// Sets the OFFSET.
    #[must_use]
    pub fn offset(mut self, n: usize) -> Self {
        self.query.offset = Some(n);
        self
    }

    // ── SQL generation (for inspection/debugging) ────────────────────

    /// Compiles the queryset to SQL for the given backend.
    pub fn to_sql(&self, backend: DatabaseBackendType) -> (String, Vec<Value>) {
        if self.is_none {
            return (
                format!("SELECT * FROM \"{}\" WHERE 1=0", self.query.table),
                vec![],
            );
        }
        SqlCompiler::new(backend).compile_select(&self.query)
    }

    /// Compiles a COUNT query. Ordering and paging are dropped.
    pub fn count_sql(&self, backend: DatabaseBackendType) -> (String, Vec<Value>) {
        if self.is_none {
            return (
                format!("SELECT COUNT(*) FROM \"{}\" WHERE 1=0", self.query.table),
                vec![],
            );
        }
        let mut count_query = self.query.clone();
        count_query.select = vec![SelectColumn::CountAll];
        count_query.order_by.clear();
        count_query.limit = None;
        count_query.offset = None;
        SqlCompiler::new(backend).compile_select(&count_query)
    }

    // ── Async execution methods ───────────────────────────────────────

    /// Executes the query and returns all matching model instances.
    ///
    /// # Errors
    ///
    /// Returns any executor error, or the first row conversion error.
    pub async fn execute_query(&self, db: &dyn DbExecutor) -> AutoScopesResult<Vec<M>> {
        if self.is_none {
            return Ok(Vec::new());
        }

        let (sql, params) = self.to_sql(db.backend_type());
        let rows = db.query(&sql, &params).await?;
        rows.iter().map(M::from_row).collect()
    }

    /// Returns the count of matching records.
    ///
    /// # Errors
    ///
    /// Returns any executor error, or a conversion error if the count column
    /// is not an integer.
    pub async fn count_exec(&self, db: &dyn DbExecutor) -> AutoScopesResult<i64> {
        if self.is_none {
            return Ok(0);
        }

        let (sql, params) = self.count_sql(db.backend_type());
        let rows = db.query(&sql, &params).await?;
        if let Some(row) = rows.into_iter().next() {
            row.get_by_index::<i64>(0)
        } else {
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::ColumnDescriptor;
    use crate::model::ModelMeta;
    use crate::query::compiler::Row;
    use crate::query::lookups::Lookup;
    use autoscopes_core::AutoScopesError;
    use std::sync::LazyLock;
    use tokio::sync::Mutex as TokioMutex;

    #[derive(Debug)]
    struct Payment {
        id: Value,
        amount: f64,
    }

    impl Model for Payment {
        fn meta() -> &'static ModelMeta {
            static META: LazyLock<ModelMeta> = LazyLock::new(|| {
                ModelMeta::new("shop", "payment")
                    .column(ColumnDescriptor::integer("id").primary_key())
                    .column(ColumnDescriptor::float("amount"))
            });
            &META
        }

        fn pk(&self) -> Option<&Value> {
            Some(&self.id)
        }

        fn from_row(row: &Row) -> Result<Self, AutoScopesError> {
            Ok(Self {
                id: row.get::<Value>("id")?,
                amount: row.get::<f64>("amount")?,
            })
        }
    }

    struct MockDb {
        statements: TokioMutex<Vec<(String, Vec<Value>)>>,
        query_responses: TokioMutex<Vec<Vec<Row>>>,
    }

    impl MockDb {
        fn with_responses(responses: Vec<Vec<Row>>) -> Self {
            Self {
                statements: TokioMutex::new(Vec::new()),
                query_responses: TokioMutex::new(responses),
            }
        }
    }

    #[async_trait::async_trait]
    impl DbExecutor for MockDb {
        fn backend_type(&self) -> DatabaseBackendType {
            DatabaseBackendType::PostgreSQL
        }

        async fn query(&self, sql: &str, params: &[Value]) -> AutoScopesResult<Vec<Row>> {
            self.statements
                .lock()
                .await
                .push((sql.to_string(), params.to_vec()));
            let mut responses = self.query_responses.lock().await;
            if responses.is_empty() {
                Ok(vec![])
            } else {
                Ok(responses.remove(0))
            }
        }
    }

    fn pg() -> DatabaseBackendType {
        DatabaseBackendType::PostgreSQL
    }

    fn objects() -> Manager<Payment> {
        Manager::new()
    }

    #[test]
    fn test_manager_all() {
        let (sql, params) = objects().all().to_sql(pg());
        assert_eq!(sql, "SELECT * FROM \"shop_payment\"");
        assert!(params.is_empty());
    }

    #[test]
    fn test_filter_and_exclude() {
        let qs = objects()
            .filter(Q::filter("amount", Lookup::Gt(Value::from(300))))
            .exclude(Q::filter("id", Lookup::Exact(Value::from(3))));
        let (sql, params) = qs.to_sql(pg());
        assert_eq!(
            sql,
            "SELECT * FROM \"shop_payment\" WHERE (\"amount\" > $1 AND NOT (\"id\" = $2))"
        );
        assert_eq!(params, vec![Value::Int(300), Value::Int(3)]);
    }

    #[test]
    fn test_apply_fragments() {
        let qs = objects()
            .all()
            .apply(QueryFragment::Order(OrderBy::asc("amount")))
            .apply(QueryFragment::Filter(Q::filter(
                "amount",
                Lookup::Lt(Value::from(700)),
            )))
            .apply(QueryFragment::Order(OrderBy::desc("id")));
        let (sql, _) = qs.to_sql(pg());
        assert_eq!(
            sql,
            "SELECT * FROM \"shop_payment\" WHERE \"amount\" < $1 ORDER BY \"amount\" ASC, \"id\" DESC"
        );
    }

    #[test]
    fn test_order_by_replaces_then_order_by_appends() {
        let qs = objects()
            .all()
            .then_order_by(OrderBy::asc("amount"))
            .order_by(vec![OrderBy::desc("id")])
            .then_order_by(OrderBy::asc("amount"));
        assert_eq!(
            qs.query().order_by,
            vec![OrderBy::desc("id"), OrderBy::asc("amount")]
        );
        let reversed = qs.reverse();
        assert!(!reversed.query().order_by[0].descending);
    }

    #[test]
    fn test_none() {
        let (sql, _) = objects().none().to_sql(pg());
        assert!(sql.ends_with("WHERE 1=0"));
    }

    #[test]
    fn test_count_sql_drops_order_and_paging() {
        let qs = objects()
            .filter(Q::filter("amount", Lookup::Gt(Value::from(1))))
            .then_order_by(OrderBy::asc("amount"))
            .limit(5)
            .offset(10);
        let (sql, params) = qs.count_sql(pg());
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM \"shop_payment\" WHERE \"amount\" > $1"
        );
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_values_distinct() {
        let (sql, _) = objects().all().values(vec!["id"]).distinct().to_sql(pg());
        assert_eq!(sql, "SELECT DISTINCT \"id\" FROM \"shop_payment\"");
    }

    #[tokio::test]
    async fn test_count_exec() {
        let db = MockDb::with_responses(vec![vec![Row::new(
            vec!["count".to_string()],
            vec![Value::Int(42)],
        )]]);
        let count = objects().all().count_exec(&db).await.unwrap();
        assert_eq!(count, 42);
        let statements = db.statements.lock().await;
        assert_eq!(statements[0].0, "SELECT COUNT(*) FROM \"shop_payment\"");
    }

    #[tokio::test]
    async fn test_count_exec_none_skips_db() {
        let db = MockDb::with_responses(vec![]);
        assert_eq!(objects().none().count_exec(&db).await.unwrap(), 0);
        assert!(db.statements.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_execute_query_maps_rows() {
        let db = MockDb::with_responses(vec![vec![
            Row::new(
                vec!["id".to_string(), "amount".to_string()],
                vec![Value::Int(1), Value::Float(10.0)],
            ),
            Row::new(
                vec!["id".to_string(), "amount".to_string()],
                vec![Value::Int(2), Value::Int(20)],
            ),
        ]]);
        let payments = objects().all().execute_query(&db).await.unwrap();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[1].pk(), Some(&Value::Int(2)));
        assert!((payments[1].amount - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_queryset_methods_sorted_and_unique() {
        let mut sorted = QUERYSET_METHODS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted, QUERYSET_METHODS);
    }
}
