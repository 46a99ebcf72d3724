//! The template bank.
//!
//! A [`ScopeDefinition`] binds one [`TemplateKind`] to one column. Calling
//! [`ScopeDefinition::build`] checks the arguments and produces the
//! [`QueryFragment`] the scope stands for. Templates are pure apart from the
//! clock and RNG they read from the [`ScopeContext`].

use autoscopes_core::{AutoScopesError, AutoScopesResult};
use autoscopes_db::query::compiler::OrderBy;
use autoscopes_db::query::fragment::QueryFragment;
use autoscopes_db::query::lookups::{Lookup, Q};
use autoscopes_db::value::Value;

use crate::args::{ScopeArg, ScopeContext};
use crate::classifier::TemplateKind;
use crate::sampling::sample_ids;

/// A generated scope: a template kind bound to a column under a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeDefinition {
    /// The name the scope is installed under.
    pub name: String,
    /// The column the template reads.
    pub column: String,
    /// The template.
    pub kind: TemplateKind,
}

impl ScopeDefinition {
    /// Binds `kind` to `column`, deriving the scope name.
    pub fn new(kind: TemplateKind, column: impl Into<String>) -> Self {
        let column = column.into();
        Self {
            name: kind.scope_name(&column),
            column,
            kind,
        }
    }

    /// Describes the accepted arguments, for listings.
    pub const fn arguments(&self) -> &'static str {
        use TemplateKind as K;
        match self.kind {
            K::GreaterThan | K::LessThan | K::Equals => "amount",
            K::InRange | K::BetweenRange => "range | low, high",
            K::OlderThan | K::NewerThan | K::RecentWindow => "[timestamp]",
            K::AfterTime | K::AfterOrAt | K::BeforeTime | K::BeforeOrAt => "timestamp",
            K::Contains | K::StartsWith | K::EndsWith => "text",
            K::ExactMatch => "value",
            K::ExcludesSet => "id | record | ids",
            K::RandomSample => "count",
            K::OrderAsc | K::OrderDesc | K::InPast | K::InFuture | K::IsTrue | K::IsFalse => "",
        }
    }

    /// Builds the fragment for a call with `args`.
    ///
    /// # Errors
    ///
    /// Returns [`AutoScopesError::Arity`] when the argument count or shape is
    /// wrong, [`AutoScopesError::InvalidArgument`] for values the template
    /// cannot use, and [`AutoScopesError::MissingContext`] when `random` is
    /// called without a row count.
    pub fn build(&self, args: &[ScopeArg], ctx: &ScopeContext) -> AutoScopesResult<QueryFragment> {
        use TemplateKind as K;

        let fragment = match self.kind {
            K::GreaterThan | K::AfterTime => self.filter(Lookup::Gt(self.one_value(args)?)),
            K::LessThan | K::BeforeTime => self.filter(Lookup::Lt(self.one_value(args)?)),
            K::AfterOrAt => self.filter(Lookup::Gte(self.one_value(args)?)),
            K::BeforeOrAt => self.filter(Lookup::Lte(self.one_value(args)?)),
            K::Equals | K::ExactMatch => self.filter(Lookup::Exact(self.one_value(args)?)),
            K::InRange | K::BetweenRange => {
                let (low, high) = self.bounds(args)?;
                self.filter(Lookup::Range(low, high))
            }
            K::OrderAsc => {
                self.no_args(args)?;
                QueryFragment::Order(OrderBy::asc(&self.column))
            }
            K::OrderDesc => {
                self.no_args(args)?;
                QueryFragment::Order(OrderBy::desc(&self.column))
            }
            K::OlderThan => self.filter(Lookup::Lt(self.cutoff(args, ctx)?)),
            K::NewerThan | K::RecentWindow => self.filter(Lookup::Gt(self.cutoff(args, ctx)?)),
            K::InPast => {
                self.no_args(args)?;
                self.filter(Lookup::Lt(Value::from(ctx.now())))
            }
            K::InFuture => {
                self.no_args(args)?;
                self.filter(Lookup::Gt(Value::from(ctx.now())))
            }
            K::IsTrue => {
                self.no_args(args)?;
                self.filter(Lookup::Exact(Value::Bool(true)))
            }
            K::IsFalse => {
                self.no_args(args)?;
                self.filter(Lookup::Exact(Value::Bool(false)))
            }
            K::Contains => self.filter(Lookup::Contains(self.text(args)?)),
            K::StartsWith => self.filter(Lookup::StartsWith(self.text(args)?)),
            K::EndsWith => self.filter(Lookup::EndsWith(self.text(args)?)),
            K::ExcludesSet => self.excludes(args)?,
            K::RandomSample => self.random(args, ctx)?,
        };
        Ok(fragment)
    }

    fn filter(&self, lookup: Lookup) -> QueryFragment {
        QueryFragment::Filter(Q::filter(&self.column, lookup))
    }

    fn arity(&self, expected: &str, given: usize) -> AutoScopesError {
        AutoScopesError::arity(&self.name, expected, given)
    }

    fn no_args(&self, args: &[ScopeArg]) -> AutoScopesResult<()> {
        if args.is_empty() {
            Ok(())
        } else {
            Err(self.arity("no arguments", args.len()))
        }
    }

    fn one_value(&self, args: &[ScopeArg]) -> AutoScopesResult<Value> {
        match args {
            [ScopeArg::Value(v)] => Ok(v.clone()),
            [other] => Err(AutoScopesError::InvalidArgument(format!(
                "scope '{}' expects a value, got a {}",
                self.name,
                other.shape()
            ))),
            _ => Err(self.arity("one value", args.len())),
        }
    }

    /// Accepts exactly one range, or exactly two scalar bounds.
    fn bounds(&self, args: &[ScopeArg]) -> AutoScopesResult<(Value, Value)> {
        match args {
            [ScopeArg::Range(low, high)] | [ScopeArg::Value(low), ScopeArg::Value(high)] => {
                Ok((low.clone(), high.clone()))
            }
            _ => Err(self.arity("one range or two bounds", args.len())),
        }
    }

    /// An optional timestamp, defaulting to the context's recency cutoff.
    fn cutoff(&self, args: &[ScopeArg], ctx: &ScopeContext) -> AutoScopesResult<Value> {
        if args.is_empty() {
            return Ok(Value::from(ctx.recent_cutoff()?));
        }
        if args.len() > 1 {
            return Err(self.arity("at most one timestamp", args.len()));
        }
        self.one_value(args)
    }

    /// The substring for LIKE templates. Wildcards are passed through.
    fn text(&self, args: &[ScopeArg]) -> AutoScopesResult<String> {
        match self.one_value(args)? {
            Value::String(s) => Ok(s),
            v @ (Value::Null | Value::List(_)) => Err(AutoScopesError::InvalidArgument(format!(
                "scope '{}' expects text, got {}",
                self.name,
                v.type_name()
            ))),
            v => Ok(v.to_string()),
        }
    }

    fn excludes(&self, args: &[ScopeArg]) -> AutoScopesResult<QueryFragment> {
        let [arg] = args else {
            return Err(self.arity("one id, record or collection", args.len()));
        };

        let ids = match arg {
            ScopeArg::List(items) => items
                .iter()
                .map(|item| self.coerce_id(item))
                .collect::<AutoScopesResult<Vec<_>>>()?,
            ScopeArg::Value(Value::List(values)) => values
                .iter()
                .map(|v| self.coerce_value_id(v))
                .collect::<AutoScopesResult<Vec<_>>>()?,
            single => {
                let id = self.coerce_id(single)?;
                return Ok(QueryFragment::Filter(!Q::filter(
                    &self.column,
                    Lookup::Exact(Value::Int(id)),
                )));
            }
        };

        if ids.is_empty() {
            return Ok(QueryFragment::Filter(Q::always()));
        }
        let ids = ids.into_iter().map(Value::Int).collect();
        Ok(QueryFragment::Filter(!Q::filter(&self.column, Lookup::In(ids))))
    }

    fn coerce_id(&self, arg: &ScopeArg) -> AutoScopesResult<i64> {
        match arg {
            ScopeArg::Value(v) => self.coerce_value_id(v),
            ScopeArg::Record(Value::Null) => Err(AutoScopesError::InvalidArgument(format!(
                "scope '{}' cannot exclude an unsaved record",
                self.name
            ))),
            ScopeArg::Record(pk) => self.coerce_value_id(pk),
            other => Err(AutoScopesError::InvalidArgument(format!(
                "scope '{}' cannot use a {} as an id",
                self.name,
                other.shape()
            ))),
        }
    }

    fn coerce_value_id(&self, value: &Value) -> AutoScopesResult<i64> {
        match value {
            Value::Int(id) => Ok(*id),
            Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
                AutoScopesError::InvalidArgument(format!(
                    "scope '{}' got '{s}', which is not an integer id",
                    self.name
                ))
            }),
            other => Err(AutoScopesError::InvalidArgument(format!(
                "scope '{}' cannot use a {} as an id",
                self.name,
                other.type_name()
            ))),
        }
    }

    fn random(&self, args: &[ScopeArg], ctx: &ScopeContext) -> AutoScopesResult<QueryFragment> {
        let n = match self.one_value(args)? {
            Value::Int(n) if n > 0 => n.unsigned_abs(),
            other => {
                return Err(AutoScopesError::InvalidArgument(format!(
                    "scope '{}' needs a positive sample size, got {other}",
                    self.name
                )))
            }
        };
        let row_count = ctx.row_count().ok_or_else(|| {
            AutoScopesError::MissingContext(format!(
                "scope '{}' needs the table's row count",
                self.name
            ))
        })?;

        let factor = ctx.sample_attempt_factor();
        let ids = ctx.with_rng(|rng| sample_ids(n, row_count, factor, rng));
        Ok(self.filter(Lookup::In(ids.into_iter().map(Value::Int).collect())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn ctx() -> ScopeContext {
        ScopeContext::new().at(now()).with_seed(11)
    }

    fn build(kind: TemplateKind, column: &str, args: &[ScopeArg]) -> AutoScopesResult<QueryFragment> {
        ScopeDefinition::new(kind, column).build(args, &ctx())
    }

    fn filter_of(fragment: QueryFragment) -> Q {
        match fragment {
            QueryFragment::Filter(q) => q,
            QueryFragment::Order(o) => panic!("expected a filter, got {o:?}"),
        }
    }

    fn is_arity(result: AutoScopesResult<QueryFragment>) -> bool {
        matches!(result, Err(AutoScopesError::Arity { .. }))
    }

    #[test]
    fn test_comparisons() {
        let q = filter_of(build(TemplateKind::GreaterThan, "amount", &[300.into()]).unwrap());
        assert_eq!(q, Q::filter("amount", Lookup::Gt(Value::Int(300))));

        let q = filter_of(build(TemplateKind::LessThan, "amount", &[700.into()]).unwrap());
        assert_eq!(q, Q::filter("amount", Lookup::Lt(Value::Int(700))));

        let q = filter_of(build(TemplateKind::Equals, "age", &[42.into()]).unwrap());
        assert_eq!(q, Q::filter("age", Lookup::Exact(Value::Int(42))));

        assert!(is_arity(build(TemplateKind::GreaterThan, "amount", &[])));
        assert!(is_arity(build(TemplateKind::Equals, "age", &[1.into(), 2.into()])));
    }

    #[test]
    fn test_no_type_coercion() {
        let q = filter_of(build(TemplateKind::GreaterThan, "amount", &["12".into()]).unwrap());
        assert_eq!(q, Q::filter("amount", Lookup::Gt(Value::from("12"))));
    }

    #[test]
    fn test_range_shapes_match() {
        let range = build(TemplateKind::InRange, "amount", &[(300..=600).into()]).unwrap();
        let pair = build(TemplateKind::InRange, "amount", &[300.into(), 600.into()]).unwrap();
        assert_eq!(range, pair);
        assert_eq!(
            filter_of(range),
            Q::filter("amount", Lookup::Range(Value::Int(300), Value::Int(600)))
        );
    }

    #[test]
    fn test_range_arity() {
        for kind in [TemplateKind::InRange, TemplateKind::BetweenRange] {
            assert!(is_arity(build(kind, "created_at", &[])));
            assert!(is_arity(build(kind, "created_at", &[1.into()])));
            assert!(is_arity(build(kind, "created_at", &[1.into(), 2.into(), 3.into()])));
            assert!(is_arity(build(kind, "created_at", &[(1..=2).into(), 3.into()])));
        }
        let err = build(TemplateKind::InRange, "age", &[1.into()]).unwrap_err();
        assert!(err.to_string().starts_with("Wrong number of arguments"));
    }

    #[test]
    fn test_ordering() {
        let asc = build(TemplateKind::OrderAsc, "id", &[]).unwrap();
        assert_eq!(asc, QueryFragment::Order(OrderBy::asc("id")));
        let desc = build(TemplateKind::OrderDesc, "id", &[]).unwrap();
        assert_eq!(desc, QueryFragment::Order(OrderBy::desc("id")));
        assert!(is_arity(build(TemplateKind::OrderAsc, "id", &[1.into()])));
    }

    #[test]
    fn test_datetime_defaults() {
        let cutoff = Value::from(now() - Duration::days(7));
        let q = filter_of(build(TemplateKind::OlderThan, "paid_at", &[]).unwrap());
        assert_eq!(q, Q::filter("paid_at", Lookup::Lt(cutoff.clone())));
        let q = filter_of(build(TemplateKind::NewerThan, "paid_at", &[]).unwrap());
        assert_eq!(q, Q::filter("paid_at", Lookup::Gt(cutoff.clone())));
        let q = filter_of(build(TemplateKind::RecentWindow, "created_at", &[]).unwrap());
        assert_eq!(q, Q::filter("created_at", Lookup::Gt(cutoff)));

        let explicit = now() - Duration::days(30);
        let q = filter_of(build(TemplateKind::OlderThan, "paid_at", &[explicit.into()]).unwrap());
        assert_eq!(q, Q::filter("paid_at", Lookup::Lt(Value::from(explicit))));

        assert!(is_arity(build(TemplateKind::NewerThan, "paid_at", &[1.into(), 2.into()])));
    }

    #[test]
    fn test_custom_recent_window() {
        let ctx = ScopeContext::new().at(now()).with_recent_window(Duration::days(1));
        let def = ScopeDefinition::new(TemplateKind::RecentWindow, "updated_at");
        let q = filter_of(def.build(&[], &ctx).unwrap());
        assert_eq!(
            q,
            Q::filter("updated_at", Lookup::Gt(Value::from(now() - Duration::days(1))))
        );
    }

    #[test]
    fn test_window_beyond_clock_range() {
        let settings = autoscopes_core::Settings {
            recent_window_days: 1_000_000_000,
            ..autoscopes_core::Settings::default()
        };
        let ctx = ScopeContext::from_settings(&settings).at(now());
        let def = ScopeDefinition::new(TemplateKind::OlderThan, "paid_at");
        assert!(matches!(
            def.build(&[], &ctx),
            Err(AutoScopesError::ConfigurationError(_))
        ));
        let explicit = now() - Duration::days(30);
        assert!(def.build(&[explicit.into()], &ctx).is_ok());
    }

    #[test]
    fn test_past_and_future() {
        let q = filter_of(build(TemplateKind::InPast, "due_at", &[]).unwrap());
        assert_eq!(q, Q::filter("due_at", Lookup::Lt(Value::from(now()))));
        let q = filter_of(build(TemplateKind::InFuture, "due_at", &[]).unwrap());
        assert_eq!(q, Q::filter("due_at", Lookup::Gt(Value::from(now()))));
    }

    #[test]
    fn test_booleans() {
        let q = filter_of(build(TemplateKind::IsTrue, "active", &[]).unwrap());
        assert_eq!(q, Q::filter("active", Lookup::Exact(Value::Bool(true))));
        let q = filter_of(build(TemplateKind::IsFalse, "active", &[]).unwrap());
        assert_eq!(q, Q::filter("active", Lookup::Exact(Value::Bool(false))));
    }

    #[test]
    fn test_strings() {
        let q = filter_of(build(TemplateKind::Contains, "login", &["et%t".into()]).unwrap());
        assert_eq!(q, Q::filter("login", Lookup::Contains("et%t".into())));
        let q = filter_of(build(TemplateKind::StartsWith, "login", &[7.into()]).unwrap());
        assert_eq!(q, Q::filter("login", Lookup::StartsWith("7".into())));
        let q = filter_of(build(TemplateKind::ExactMatch, "login", &["betty".into()]).unwrap());
        assert_eq!(q, Q::filter("login", Lookup::Exact(Value::from("betty"))));
        assert!(matches!(
            build(TemplateKind::EndsWith, "login", &[Value::Null.into()]),
            Err(AutoScopesError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_timestamp_comparisons() {
        let t = now();
        let cases = [
            (TemplateKind::AfterTime, Lookup::Gt(Value::from(t))),
            (TemplateKind::AfterOrAt, Lookup::Gte(Value::from(t))),
            (TemplateKind::BeforeTime, Lookup::Lt(Value::from(t))),
            (TemplateKind::BeforeOrAt, Lookup::Lte(Value::from(t))),
        ];
        for (kind, lookup) in cases {
            let q = filter_of(build(kind, "updated_at", &[t.into()]).unwrap());
            assert_eq!(q, Q::filter("updated_at", lookup));
            assert!(is_arity(build(kind, "updated_at", &[])));
        }
    }

    #[test]
    fn test_excludes_mixed_ids() {
        let ids = ScopeArg::from(vec![ScopeArg::from(1), ScopeArg::from(2), ScopeArg::from(" 3 ")]);
        let q = filter_of(build(TemplateKind::ExcludesSet, "id", &[ids]).unwrap());
        assert_eq!(
            q,
            !Q::filter(
                "id",
                Lookup::In(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
            )
        );
    }

    #[test]
    fn test_excludes_value_list() {
        let ids = ScopeArg::Value(Value::List(vec![Value::Int(4), Value::from("5")]));
        let q = filter_of(build(TemplateKind::ExcludesSet, "pk", &[ids]).unwrap());
        assert_eq!(
            q,
            !Q::filter("pk", Lookup::In(vec![Value::Int(4), Value::Int(5)]))
        );
    }

    #[test]
    fn test_excludes_single_and_record() {
        let q = filter_of(build(TemplateKind::ExcludesSet, "id", &["9".into()]).unwrap());
        assert_eq!(q, !Q::filter("id", Lookup::Exact(Value::Int(9))));

        let q = filter_of(
            build(TemplateKind::ExcludesSet, "id", &[ScopeArg::Record(Value::Int(6))]).unwrap(),
        );
        assert_eq!(q, !Q::filter("id", Lookup::Exact(Value::Int(6))));
    }

    #[test]
    fn test_excludes_empty_collection() {
        let q = filter_of(
            build(TemplateKind::ExcludesSet, "id", &[ScopeArg::List(vec![])]).unwrap(),
        );
        assert_eq!(q, Q::always());
    }

    #[test]
    fn test_excludes_invalid() {
        let invalid = |arg: ScopeArg| {
            matches!(
                build(TemplateKind::ExcludesSet, "id", &[arg]),
                Err(AutoScopesError::InvalidArgument(_))
            )
        };
        assert!(invalid("abc".into()));
        assert!(invalid(ScopeArg::Record(Value::Null)));
        assert!(invalid(1.5.into()));
        assert!(invalid((1..=3).into()));
        assert!(invalid(ScopeArg::from(vec![ScopeArg::from(1), ScopeArg::from("x")])));
        assert!(is_arity(build(TemplateKind::ExcludesSet, "id", &[])));
    }

    #[test]
    fn test_random() {
        let ctx = ScopeContext::new().with_row_count(100).with_seed(5);
        let def = ScopeDefinition::new(TemplateKind::RandomSample, "id");
        let q = filter_of(def.build(&[3.into()], &ctx).unwrap());
        match q {
            Q::Filter {
                field,
                lookup: Lookup::In(ids),
            } => {
                assert_eq!(field, "id");
                assert!(!ids.is_empty() && ids.len() <= 3);
                assert!(ids.iter().all(|v| matches!(v, Value::Int(0..=2))));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_random_errors() {
        let def = ScopeDefinition::new(TemplateKind::RandomSample, "id");
        let no_count = ScopeContext::new();
        assert!(matches!(
            def.build(&[3.into()], &no_count),
            Err(AutoScopesError::MissingContext(_))
        ));
        let ctx = ScopeContext::new().with_row_count(10);
        assert!(matches!(
            def.build(&[0.into()], &ctx),
            Err(AutoScopesError::InvalidArgument(_))
        ));
        assert!(matches!(def.build(&[], &ctx), Err(AutoScopesError::Arity { .. })));
    }

    #[test]
    fn test_random_sample_larger_than_table() {
        let def = ScopeDefinition::new(TemplateKind::RandomSample, "id");
        for n in [i64::MAX, 200_000_000] {
            let ctx = ScopeContext::new().with_row_count(3).with_seed(2);
            match filter_of(def.build(&[n.into()], &ctx).unwrap()) {
                Q::Filter {
                    lookup: Lookup::In(mut ids),
                    ..
                } => {
                    ids.sort_by_key(|v| match v {
                        Value::Int(i) => *i,
                        _ => -1,
                    });
                    assert_eq!(ids, vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_random_empty_table() {
        let ctx = ScopeContext::new().with_row_count(0);
        let def = ScopeDefinition::new(TemplateKind::RandomSample, "id");
        let q = filter_of(def.build(&[4.into()], &ctx).unwrap());
        assert_eq!(q, Q::filter("id", Lookup::In(vec![])));
    }

    #[test]
    fn test_arguments_description() {
        assert_eq!(ScopeDefinition::new(TemplateKind::InRange, "a").arguments(), "range | low, high");
        assert_eq!(ScopeDefinition::new(TemplateKind::IsTrue, "a").arguments(), "");
    }
}
