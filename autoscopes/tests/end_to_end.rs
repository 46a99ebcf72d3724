//! End-to-end tests through the meta-crate: describe a model, let scopes
//! generate on first use, count rows through an executor and compile the
//! resulting query.

use std::sync::LazyLock;

use autoscopes::prelude::*;
use autoscopes::scopes::SCOPES;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex as TokioMutex;

#[derive(Debug)]
struct Invoice {
    id: Value,
}

impl Model for Invoice {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("billing", "invoice")
                .column(ColumnDescriptor::integer("id").primary_key())
                .column(ColumnDescriptor::integer("total"))
                .column(ColumnDescriptor::boolean("paid"))
                .column(ColumnDescriptor::string("number"))
                .column(ColumnDescriptor::datetime("due_at"))
                .column(ColumnDescriptor::datetime("created_at"))
                .native_method("paid")
        });
        &META
    }

    fn pk(&self) -> Option<&Value> {
        Some(&self.id)
    }

    fn from_row(row: &Row) -> AutoScopesResult<Self> {
        Ok(Self {
            id: row.get::<Value>("id")?,
        })
    }
}

/// Answers every query with one row holding a fixed count.
struct CountingDb {
    count: i64,
    queries: TokioMutex<usize>,
}

#[async_trait::async_trait]
impl DbExecutor for CountingDb {
    fn backend_type(&self) -> DatabaseBackendType {
        DatabaseBackendType::PostgreSQL
    }

    async fn query(&self, _sql: &str, _params: &[Value]) -> AutoScopesResult<Vec<Row>> {
        *self.queries.lock().await += 1;
        Ok(vec![Row::new(
            vec!["count".to_string()],
            vec![Value::Int(self.count)],
        )])
    }
}

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_717_200_000, 0).unwrap()
}

#[test]
fn test_first_use_generates_scopes() {
    let objects = Manager::<Invoice>::new();
    let ctx = ScopeContext::new().at(now());
    let qs = objects
        .filter(Q::filter("total", Lookup::Gte(Value::Int(0))))
        .scope_with("due_at_in_past", &[], &ctx)
        .and_then(|qs| qs.scope_with("not_paid", &[], &ctx))
        .and_then(|qs| qs.scope_with("number_ends_with", &["-2024".into()], &ctx))
        .and_then(|qs| qs.scope_with("in_reverse_due_at_order", &[], &ctx))
        .unwrap()
        .limit(10);

    let (sql, params) = qs.to_sql(DatabaseBackendType::PostgreSQL);
    assert_eq!(
        sql,
        "SELECT * FROM \"billing_invoice\" WHERE (\"total\" >= $1 AND \"due_at\" < $2 \
         AND \"paid\" = $3 AND \"number\" LIKE $4) ORDER BY \"due_at\" DESC LIMIT 10"
    );
    assert_eq!(
        params,
        vec![
            Value::Int(0),
            Value::from(now()),
            Value::Bool(false),
            Value::from("%-2024"),
        ]
    );

    let label = Invoice::meta().label();
    assert!(SCOPES.contains(&label));
    assert_eq!(list_rejected(&label), vec!["paid"]);
    assert!(list_installed(&label).contains(&"not_paid".to_string()));
}

#[test]
fn test_rejected_name_is_unknown_scope() {
    let err = Manager::<Invoice>::new()
        .all()
        .scope("paid", &[])
        .unwrap_err();
    assert!(matches!(err, AutoScopesError::UnknownScope { ref scope, .. } if scope == "paid"));

    let err = Manager::<Invoice>::new()
        .all()
        .scope("total_between", &[1.into(), 2.into()])
        .unwrap_err();
    assert!(matches!(err, AutoScopesError::UnknownScope { .. }));
}

#[test]
fn test_generate_summary_is_stable() {
    let first = generate_model::<Invoice>();
    let second = generate_model::<Invoice>();
    assert!(second.installed.is_empty());
    assert_eq!(second.rejected, vec!["paid"]);
    assert_eq!(
        list_installed(&Invoice::meta().label()).len(),
        first.installed.len() + first.unchanged
    );
}

#[tokio::test]
async fn test_random_sample_with_counted_rows() {
    let db = CountingDb {
        count: 2,
        queries: TokioMutex::new(0),
    };
    let objects = Manager::<Invoice>::new();
    let ctx = ScopeContext::new()
        .with_seed(42)
        .with_row_count_from(&objects.all(), &db)
        .await
        .unwrap();
    assert_eq!(*db.queries.lock().await, 1);
    assert_eq!(ctx.row_count(), Some(2));

    let qs = objects
        .all()
        .scope_with("created_between", &[(now() - Duration::days(30)..=now()).into()], &ctx)
        .and_then(|qs| qs.scope_with("random", &[5.into()], &ctx))
        .unwrap();
    let (sql, params) = qs.to_sql(DatabaseBackendType::PostgreSQL);
    assert!(sql.starts_with(
        "SELECT * FROM \"billing_invoice\" WHERE (\"created_at\" BETWEEN $1 AND $2 AND \"id\" IN ("
    ));
    let ids = &params[2..];
    assert!(!ids.is_empty() && ids.len() <= 2);
    assert!(ids.iter().all(|v| matches!(v, Value::Int(0 | 1))));
}
