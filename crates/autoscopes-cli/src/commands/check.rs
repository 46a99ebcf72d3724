//! The `check` management command.
//!
//! Validates a schema file before it is used for scope generation.

use std::collections::HashSet;

use async_trait::async_trait;
use autoscopes_core::{AutoScopesError, Settings};
use autoscopes_db::{ColumnType, SchemaFile};

use super::{build_table, load_schema, schema_arg};
use crate::command::ManagementCommand;

/// Checks a schema file for problems.
pub struct CheckCommand;

/// The result of a single check.
#[derive(Debug, Clone)]
pub struct CheckMessage {
    /// The severity level of this check result.
    pub level: CheckLevel,
    /// A human-readable description of the issue.
    pub msg: String,
    /// An optional hint for how to resolve the issue.
    pub hint: Option<String>,
    /// A unique identifier for this check (e.g. "schema.E001").
    pub id: String,
}

impl CheckMessage {
    fn new(level: CheckLevel, id: &str, msg: String, hint: Option<&str>) -> Self {
        Self {
            level,
            msg,
            hint: hint.map(str::to_string),
            id: id.to_string(),
        }
    }
}

/// Severity levels for check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckLevel {
    /// Informational message.
    Info,
    /// A warning that may indicate a problem.
    Warning,
    /// An error that must be resolved.
    Error,
}

impl std::fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Runs every check against `schema`.
pub fn run_checks(schema: &SchemaFile, settings: &Settings) -> Vec<CheckMessage> {
    let mut messages = Vec::new();
    let mut labels = HashSet::new();

    for meta in &schema.models {
        let label = meta.label();

        if !labels.insert(label.clone()) {
            messages.push(CheckMessage::new(
                CheckLevel::Error,
                "schema.E001",
                format!("Model '{label}' is declared more than once"),
                None,
            ));
        }

        if meta.columns.is_empty() {
            messages.push(CheckMessage::new(
                CheckLevel::Warning,
                "schema.W001",
                format!("Model '{label}' has no columns"),
                Some("No scopes will be generated for it"),
            ));
            continue;
        }

        let mut seen = HashSet::new();
        for column in &meta.columns {
            if !seen.insert(column.name.as_str()) {
                messages.push(CheckMessage::new(
                    CheckLevel::Error,
                    "schema.E002",
                    format!("Column '{}' appears more than once on '{label}'", column.name),
                    None,
                ));
            }
            if let ColumnType::Other(name) = &column.column_type {
                messages.push(CheckMessage::new(
                    CheckLevel::Warning,
                    "schema.W002",
                    format!(
                        "Column '{label}.{}' has type '{name}', which gets no scopes",
                        column.name
                    ),
                    Some("Supported types are integer, float, datetime, boolean and string"),
                ));
            }
        }

        if meta.primary_key().is_none() {
            messages.push(CheckMessage::new(
                CheckLevel::Info,
                "scopes.I001",
                format!("Model '{label}' has no primary key"),
                Some("Mark a column with primary_key = true to get excludes and random scopes"),
            ));
        }

        let (_, summary) = build_table(meta, settings);
        if let Some(error) = summary.error {
            messages.push(CheckMessage::new(
                CheckLevel::Error,
                "scopes.E001",
                format!("Scope generation for '{label}' fails: {error}"),
                Some("Column names must be identifiers"),
            ));
        }
        if !summary.rejected.is_empty() {
            messages.push(CheckMessage::new(
                CheckLevel::Info,
                "scopes.I002",
                format!(
                    "Model '{label}' already defines {}; those scopes will be rejected",
                    summary.rejected.join(", ")
                ),
                None,
            ));
        }
    }

    messages
}

#[async_trait]
impl ManagementCommand for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn help(&self) -> &'static str {
        "Check a schema file for problems"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        schema_arg(cmd)
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), AutoScopesError> {
        let schema = load_schema(matches)?;
        let messages = run_checks(&schema, settings);

        if messages.is_empty() {
            tracing::info!("Schema check identified no issues");
            return Ok(());
        }

        let errors = messages.iter().filter(|m| m.level >= CheckLevel::Error).count();
        let warnings = messages.iter().filter(|m| m.level == CheckLevel::Warning).count();

        for msg in &messages {
            let hint_text = msg
                .hint
                .as_ref()
                .map_or(String::new(), |h| format!("\n\tHINT: {h}"));
            match msg.level {
                CheckLevel::Info => tracing::info!("{} ({}): {}{}", msg.level, msg.id, msg.msg, hint_text),
                _ => tracing::warn!("{} ({}): {}{}", msg.level, msg.id, msg.msg, hint_text),
            }
        }

        tracing::info!(
            "Schema check identified {} issue(s) ({} error(s), {} warning(s))",
            messages.len(),
            errors,
            warnings
        );

        if errors > 0 {
            return Err(AutoScopesError::ConfigurationError(format!(
                "Schema check found {errors} error(s)"
            )));
        }

        Ok(())
    }
}
