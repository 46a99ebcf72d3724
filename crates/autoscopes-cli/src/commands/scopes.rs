//! The `scopes` management command.
//!
//! Lists the scopes generation installs and rejects for each model in a
//! schema file.

use std::fmt::Write as _;

use async_trait::async_trait;
use autoscopes_core::{AutoScopesError, AutoScopesResult, Settings};
use autoscopes_db::{ModelMeta, SchemaFile};

use super::{build_table, find_model, load_schema, schema_arg};
use crate::command::ManagementCommand;

/// Lists generated scopes.
pub struct ScopesCommand;

/// Output format for the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    /// Aligned text, one scope per line.
    Text,
    /// A JSON array with one object per model.
    Json,
}

impl ListFormat {
    fn from_name(name: &str) -> AutoScopesResult<Self> {
        match name {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(AutoScopesError::ConfigurationError(format!(
                "Unknown format '{other}' (expected 'text' or 'json')"
            ))),
        }
    }
}

/// Renders the scope listing for `models`.
pub fn render_scopes(
    models: &[&ModelMeta],
    settings: &Settings,
    format: ListFormat,
) -> AutoScopesResult<String> {
    match format {
        ListFormat::Text => Ok(render_text(models, settings)),
        ListFormat::Json => render_json(models, settings),
    }
}

fn render_text(models: &[&ModelMeta], settings: &Settings) -> String {
    let mut out = String::new();
    for meta in models {
        let (table, summary) = build_table(meta, settings);
        let _ = writeln!(out, "{} ({})", meta.label(), meta.table_name());
        for def in table.definitions() {
            let _ = writeln!(
                out,
                "  {:<32} {:<14} {:<16} {}",
                def.name,
                def.kind.as_str(),
                def.column,
                def.arguments()
            );
        }
        for name in table.rejected() {
            let _ = writeln!(out, "  {name:<32} rejected");
        }
        if let Some(error) = &summary.error {
            let _ = writeln!(out, "  generation aborted: {error}");
        }
    }
    out
}

fn render_json(models: &[&ModelMeta], settings: &Settings) -> AutoScopesResult<String> {
    let listing: Vec<serde_json::Value> = models
        .iter()
        .map(|meta| {
            let (table, summary) = build_table(meta, settings);
            let installed: Vec<serde_json::Value> = table
                .definitions()
                .map(|def| {
                    serde_json::json!({
                        "name": def.name,
                        "kind": def.kind.as_str(),
                        "column": def.column,
                        "arguments": def.arguments(),
                    })
                })
                .collect();
            serde_json::json!({
                "model": meta.label(),
                "table": meta.table_name(),
                "installed": installed,
                "rejected": table.rejected(),
                "error": summary.error,
            })
        })
        .collect();

    serde_json::to_string_pretty(&listing)
        .map_err(|e| AutoScopesError::SerializationError(e.to_string()))
}

/// Picks the model named by `--model`, or every model in the schema.
fn selected_models<'a>(
    schema: &'a SchemaFile,
    matches: &clap::ArgMatches,
) -> AutoScopesResult<Vec<&'a ModelMeta>> {
    match matches.get_one::<String>("model") {
        Some(name) => Ok(vec![find_model(schema, name)?]),
        None => Ok(schema.models.iter().collect()),
    }
}

#[async_trait]
impl ManagementCommand for ScopesCommand {
    fn name(&self) -> &'static str {
        "scopes"
    }

    fn help(&self) -> &'static str {
        "List the scopes generated for a schema's models"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        schema_arg(cmd)
            .arg(
                clap::Arg::new("model")
                    .long("model")
                    .short('m')
                    .help("Only list this model (label or model name)"),
            )
            .arg(
                clap::Arg::new("format")
                    .long("format")
                    .default_value("text")
                    .value_parser(["text", "json"])
                    .help("Output format"),
            )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), AutoScopesError> {
        let schema = load_schema(matches)?;
        let models = selected_models(&schema, matches)?;
        let format = ListFormat::from_name(
            matches.get_one::<String>("format").map_or("text", String::as_str),
        )?;

        tracing::debug!(models = models.len(), "Listing scopes");
        print!("{}", render_scopes(&models, settings, format)?);
        Ok(())
    }
}
