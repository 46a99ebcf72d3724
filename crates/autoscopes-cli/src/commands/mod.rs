//! Built-in management commands.
//!
//! Every command reads a schema file (see
//! [`SchemaFile`](autoscopes_db::SchemaFile)) and generates scopes into a
//! private [`ScopeTable`] per model, so running a command never touches the
//! process-wide registry.

pub mod check;
pub mod scopes;
pub mod sql;

pub use check::CheckCommand;
pub use scopes::ScopesCommand;
pub use sql::SqlCommand;

use autoscopes_core::logging::generation_span;
use autoscopes_core::{AutoScopesError, AutoScopesResult, Settings};
use autoscopes_db::{load_schema_file, ModelMeta, SchemaFile};
use autoscopes_scopes::{generate_into, GenerationSummary, ScopeTable};

use crate::command::CommandRegistry;

/// Registers all built-in management commands into the given registry.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(ScopesCommand));
    registry.register(Box::new(SqlCommand));
    registry.register(Box::new(CheckCommand));
}

/// Adds the required positional `schema` argument.
fn schema_arg(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        clap::Arg::new("schema")
            .required(true)
            .value_name("SCHEMA")
            .help("Schema file describing the models (TOML, or JSON with a .json extension)"),
    )
}

/// Loads the schema file named by the `schema` argument.
fn load_schema(matches: &clap::ArgMatches) -> AutoScopesResult<SchemaFile> {
    let path = matches
        .get_one::<String>("schema")
        .ok_or_else(|| AutoScopesError::ConfigurationError("No schema file given".to_string()))?;
    load_schema_file(path)
}

/// Looks up a model by label or bare name.
fn find_model<'a>(schema: &'a SchemaFile, name: &str) -> AutoScopesResult<&'a ModelMeta> {
    schema
        .find(name)
        .ok_or_else(|| AutoScopesError::UnknownModel(name.to_string()))
}

/// Runs one generation pass for `meta` into a fresh table.
pub fn build_table(meta: &ModelMeta, settings: &Settings) -> (ScopeTable, GenerationSummary) {
    let span = generation_span(&meta.label());
    let _enter = span.enter();
    let mut table = ScopeTable::new(meta.label());
    let summary = generate_into(&mut table, meta, settings);
    (table, summary)
}
