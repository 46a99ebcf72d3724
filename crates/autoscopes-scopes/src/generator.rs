//! The scope generator.
//!
//! [`generate`] walks a model's columns, classifies each one, and offers every
//! resulting scope to the collision guard of the model's table in the global
//! registry. It never fails: an error on one column ends the pass for that
//! model, is logged, and is reported in the returned [`GenerationSummary`].

use autoscopes_core::logging::generation_span;
use autoscopes_core::{AutoScopesError, AutoScopesResult, Settings, SETTINGS};
use autoscopes_db::fields::ColumnDescriptor;
use autoscopes_db::model::{Model, ModelMeta};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::classifier::{classify, TemplateKind};
use crate::guard::{CollisionGuard, Installation, ScopeTable};
use crate::registry::SCOPES;
use crate::templates::ScopeDefinition;

static COLUMN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("column name pattern is valid"));

/// What one generation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// The model label.
    pub model: String,
    /// Names newly installed by this pass.
    pub installed: Vec<String>,
    /// Names rejected by this pass.
    pub rejected: Vec<String>,
    /// Definitions an earlier pass had already installed.
    pub unchanged: usize,
    /// Definitions dropped because another generated scope held the name.
    pub shadowed: Vec<String>,
    /// Columns whose type has no templates.
    pub skipped_columns: Vec<String>,
    /// Whether the pass stopped early.
    pub aborted: bool,
    /// The error that stopped the pass.
    pub error: Option<String>,
}

impl GenerationSummary {
    fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    fn record(&mut self, name: String, installation: Installation) {
        match installation {
            Installation::Installed => self.installed.push(name),
            Installation::Rejected => self.rejected.push(name),
            Installation::Unchanged => self.unchanged += 1,
            Installation::Shadowed => self.shadowed.push(name),
        }
    }
}

/// Generates scopes for `meta` into the global registry, using the global
/// settings.
pub fn generate(meta: &ModelMeta) -> GenerationSummary {
    generate_with(meta, SETTINGS.get_or_default())
}

/// Generates scopes for the model type `M`.
pub fn generate_model<M: Model>() -> GenerationSummary {
    generate(M::meta())
}

/// Generates scopes for `meta` into the global registry with explicit
/// settings.
///
/// The registry's write lock is held for the whole pass.
pub fn generate_with(meta: &ModelMeta, settings: &Settings) -> GenerationSummary {
    let label = meta.label();
    let span = generation_span(&label);
    let _enter = span.enter();
    SCOPES.with_table_mut(&label, |table| generate_into(table, meta, settings))
}

/// Generates scopes for `meta` into a caller-owned table.
pub fn generate_into(table: &mut ScopeTable, meta: &ModelMeta, settings: &Settings) -> GenerationSummary {
    let mut summary = GenerationSummary::new(meta.label());
    let guard = CollisionGuard::new(meta, &settings.reserved_methods);

    if let Err(e) = install_all(table, meta, settings, &guard, &mut summary) {
        tracing::error!(
            model = %summary.model,
            error = %e,
            "Auto scope generation failed; remaining columns skipped"
        );
        summary.aborted = true;
        summary.error = Some(e.to_string());
    }

    tracing::info!(
        model = %summary.model,
        installed = summary.installed.len(),
        rejected = summary.rejected.len(),
        unchanged = summary.unchanged,
        aborted = summary.aborted,
        "Scope generation finished"
    );
    summary
}

fn install_all(
    table: &mut ScopeTable,
    meta: &ModelMeta,
    settings: &Settings,
    guard: &CollisionGuard<'_>,
    summary: &mut GenerationSummary,
) -> AutoScopesResult<()> {
    for column in &meta.columns {
        validate_column(column)?;

        let mut kinds = classify(column);
        if !settings.timestamp_scopes {
            kinds.retain(|k| !k.is_timestamp());
        }
        if kinds.is_empty() {
            tracing::debug!(
                model = %summary.model,
                column = %column.name,
                column_type = %column.column_type,
                "No scope templates for column type"
            );
            summary.skipped_columns.push(column.name.clone());
            continue;
        }

        for kind in kinds {
            let definition = ScopeDefinition::new(kind, &column.name);
            let name = definition.name.clone();
            summary.record(name, table.install(definition, guard));
        }
    }

    if settings.random_scope {
        if let Some(pk) = meta.primary_key() {
            let definition = ScopeDefinition::new(TemplateKind::RandomSample, &pk.name);
            let name = definition.name.clone();
            summary.record(name, table.install(definition, guard));
        }
    }

    Ok(())
}

fn validate_column(column: &ColumnDescriptor) -> AutoScopesResult<()> {
    if COLUMN_NAME.is_match(&column.name) {
        Ok(())
    } else {
        Err(AutoScopesError::InvalidColumn(format!(
            "'{}' is not a valid column name",
            column.name
        )))
    }
}
