//! The `sql` management command.
//!
//! Compiles a chain of scope calls on one model to a `SELECT` statement,
//! printing the SQL and its bound parameters.
//!
//! Scope arguments are written on the command line and parsed by
//! [`parse_scope_arg`]: `300..600` is a range, `1,2,"3"` a list, and
//! anything else a single value.

use std::fmt::Write as _;

use async_trait::async_trait;
use autoscopes_core::{AutoScopesError, AutoScopesResult, Settings};
use autoscopes_db::{DatabaseBackendType, ModelMeta, Query, SqlCompiler, Value};
use autoscopes_scopes::{ScopeArg, ScopeContext};
use chrono::{DateTime, Utc};

use super::{build_table, find_model, load_schema, schema_arg};
use crate::command::ManagementCommand;

/// Compiles scope calls to SQL.
pub struct SqlCommand;

/// One scope call: a scope name and its raw arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeCall {
    /// The scope name.
    pub name: String,
    /// Unparsed arguments.
    pub args: Vec<String>,
}

impl ScopeCall {
    /// Parses `name` or `name:arg1 arg2`. Arguments are separated by
    /// whitespace, so timestamps keep their colons.
    pub fn parse(call: &str) -> Self {
        match call.split_once(':') {
            Some((name, args)) => Self {
                name: name.trim().to_string(),
                args: args.split_whitespace().map(str::to_string).collect(),
            },
            None => Self {
                name: call.trim().to_string(),
                args: Vec::new(),
            },
        }
    }
}

/// Parses one command-line scalar.
///
/// Double-quoted text stays a string, so `"3"` is the string `3`.
pub fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();
    if let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        return Value::from(inner);
    }
    if raw.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if let Ok(b) = raw.parse::<bool>() {
        return Value::Bool(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::Float(f);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Value::from(dt.with_timezone(&Utc));
    }
    Value::from(raw)
}

/// Parses one command-line scope argument.
pub fn parse_scope_arg(raw: &str) -> ScopeArg {
    if let Some((low, high)) = raw.split_once("..") {
        return ScopeArg::Range(parse_value(low), parse_value(high));
    }
    if raw.contains(',') {
        return ScopeArg::List(
            raw.split(',')
                .filter(|part| !part.trim().is_empty())
                .map(|part| ScopeArg::Value(parse_value(part)))
                .collect(),
        );
    }
    ScopeArg::Value(parse_value(raw))
}

/// Applies `calls` in order to a `SELECT *` over the model's table and
/// compiles the result.
pub fn compile_calls(
    meta: &ModelMeta,
    calls: &[ScopeCall],
    settings: &Settings,
    ctx: &ScopeContext,
    backend: DatabaseBackendType,
) -> AutoScopesResult<(String, Vec<Value>)> {
    let (table, summary) = build_table(meta, settings);
    if let Some(error) = summary.error {
        tracing::warn!(model = %meta.label(), %error, "Scope generation was incomplete");
    }

    let mut query = Query::new(meta.table_name());
    for call in calls {
        let args: Vec<ScopeArg> = call
            .args
            .iter()
            .map(String::as_str)
            .map(parse_scope_arg)
            .collect();
        table.call(&call.name, &args, ctx)?.apply_to(&mut query);
    }
    Ok(SqlCompiler::new(backend).compile_select(&query))
}

/// Formats compiled SQL and its parameters for display.
pub fn format_statement(sql: &str, params: &[Value]) -> String {
    let mut out = format!("{sql};\n");
    for (i, param) in params.iter().enumerate() {
        let _ = writeln!(out, "-- ${}: {param} ({})", i + 1, param.type_name());
    }
    out
}

fn context_from(matches: &clap::ArgMatches, settings: &Settings) -> AutoScopesResult<ScopeContext> {
    let mut ctx = ScopeContext::from_settings(settings);
    if let Some(now) = matches.get_one::<String>("now") {
        let now = DateTime::parse_from_rfc3339(now).map_err(|e| {
            AutoScopesError::ConfigurationError(format!("Invalid --now timestamp '{now}': {e}"))
        })?;
        ctx = ctx.at(now.with_timezone(&Utc));
    }
    if let Some(count) = matches.get_one::<u64>("row-count") {
        ctx = ctx.with_row_count(*count);
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        ctx = ctx.with_seed(*seed);
    }
    Ok(ctx)
}

#[async_trait]
impl ManagementCommand for SqlCommand {
    fn name(&self) -> &'static str {
        "sql"
    }

    fn help(&self) -> &'static str {
        "Print the SQL for a chain of scope calls"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        schema_arg(cmd)
            .arg(
                clap::Arg::new("model")
                    .required(true)
                    .help("Model label or model name"),
            )
            .arg(
                clap::Arg::new("scope")
                    .required(true)
                    .num_args(1..)
                    .help("Scope calls, each as name or 'name:arg1 arg2'"),
            )
            .arg(
                clap::Arg::new("backend")
                    .long("backend")
                    .short('b')
                    .help("SQL dialect (postgresql, sqlite, mysql); defaults to the settings backend"),
            )
            .arg(
                clap::Arg::new("now")
                    .long("now")
                    .help("RFC 3339 timestamp used as the current time"),
            )
            .arg(
                clap::Arg::new("row-count")
                    .long("row-count")
                    .value_parser(clap::value_parser!(u64))
                    .help("Table row count for the random scope"),
            )
            .arg(
                clap::Arg::new("seed")
                    .long("seed")
                    .value_parser(clap::value_parser!(u64))
                    .help("Seed for the random scope"),
            )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), AutoScopesError> {
        let schema = load_schema(matches)?;
        let model = matches
            .get_one::<String>("model")
            .ok_or_else(|| AutoScopesError::ConfigurationError("No model given".to_string()))?;
        let meta = find_model(&schema, model)?;

        let calls: Vec<ScopeCall> = matches
            .get_many::<String>("scope")
            .into_iter()
            .flatten()
            .map(String::as_str)
            .map(ScopeCall::parse)
            .collect();

        let backend = DatabaseBackendType::from_name(
            matches
                .get_one::<String>("backend")
                .unwrap_or(&settings.backend),
        )?;
        let ctx = context_from(matches, settings)?;

        let (sql, params) = compile_calls(meta, &calls, settings, &ctx, backend)?;
        print!("{}", format_statement(&sql, &params));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoscopes_db::ColumnDescriptor;

    fn payment() -> ModelMeta {
        ModelMeta::new("shop", "payment")
            .column(ColumnDescriptor::integer("id").primary_key())
            .column(ColumnDescriptor::float("amount"))
            .column(ColumnDescriptor::string("login"))
            .native_method("login_is")
    }

    fn calls(raw: &[&str]) -> Vec<ScopeCall> {
        raw.iter().copied().map(ScopeCall::parse).collect()
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), Value::Int(42));
        assert_eq!(parse_value("4.5"), Value::Float(4.5));
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("NULL"), Value::Null);
        assert_eq!(parse_value("\"3\""), Value::from("3"));
        assert_eq!(parse_value("betty"), Value::from("betty"));
        assert_eq!(
            parse_value("2024-01-02T03:04:05Z"),
            Value::from(DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z").unwrap().with_timezone(&Utc))
        );
    }

    #[test]
    fn test_parse_scope_arg() {
        assert_eq!(
            parse_scope_arg("300..600"),
            ScopeArg::Range(Value::Int(300), Value::Int(600))
        );
        assert_eq!(
            parse_scope_arg("1,2,\"3\""),
            ScopeArg::List(vec![
                ScopeArg::Value(Value::Int(1)),
                ScopeArg::Value(Value::Int(2)),
                ScopeArg::Value(Value::from("3")),
            ])
        );
        assert_eq!(parse_scope_arg("7"), ScopeArg::Value(Value::Int(7)));
    }

    #[test]
    fn test_scope_call_parse() {
        let call = ScopeCall::parse("amount_in_range:1 2");
        assert_eq!(call.name, "amount_in_range");
        assert_eq!(call.args, vec!["1", "2"]);
        let call = ScopeCall::parse("created_after:2024-01-02T03:04:05Z");
        assert_eq!(call.args, vec!["2024-01-02T03:04:05Z"]);
        assert!(ScopeCall::parse("in_amount_order").args.is_empty());
    }

    #[test]
    fn test_compile_calls() {
        let (sql, params) = compile_calls(
            &payment(),
            &calls(&["amount_in_range:300..600", "id_excludes:1,2,\"3\"", "in_reverse_id_order"]),
            &Settings::default(),
            &ScopeContext::new(),
            DatabaseBackendType::PostgreSQL,
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM \"shop_payment\" WHERE (\"amount\" BETWEEN $1 AND $2 AND NOT (\"id\" IN ($3, $4, $5))) ORDER BY \"id\" DESC"
        );
        assert_eq!(
            params,
            vec![Value::Int(300), Value::Int(600), Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn test_compile_rejected_scope_fails() {
        let err = compile_calls(
            &payment(),
            &calls(&["login_is:betty"]),
            &Settings::default(),
            &ScopeContext::new(),
            DatabaseBackendType::SQLite,
        )
        .unwrap_err();
        assert!(matches!(err, AutoScopesError::UnknownScope { .. }));
    }

    #[test]
    fn test_format_statement() {
        let out = format_statement("SELECT 1 WHERE a = $1", &[Value::Int(3)]);
        assert_eq!(out, "SELECT 1 WHERE a = $1;\n-- $1: 3 (int)\n");
    }
}
