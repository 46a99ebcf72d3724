//! Collision guard and per-model scope tables.
//!
//! A [`ScopeTable`] maps scope names to [`ScopeDefinition`]s for one model and
//! records every installation attempt in an [`InstallationOutcome`]. The
//! [`CollisionGuard`] decides whether a name already resolves on the model.

use std::collections::HashMap;

use autoscopes_core::{AutoScopesError, AutoScopesResult};
use autoscopes_db::model::ModelMeta;
use autoscopes_db::query::fragment::QueryFragment;

use crate::args::{ScopeArg, ScopeContext};
use crate::templates::ScopeDefinition;

/// Names a model already answers to, besides its generated scopes.
#[derive(Debug, Clone, Copy)]
pub struct CollisionGuard<'a> {
    meta: &'a ModelMeta,
    reserved: &'a [String],
}

impl<'a> CollisionGuard<'a> {
    /// Guards `meta`'s built-in and native names plus `reserved`.
    pub const fn new(meta: &'a ModelMeta, reserved: &'a [String]) -> Self {
        Self { meta, reserved }
    }

    /// Returns `true` if `name` already resolves on the model.
    pub fn resolves(&self, name: &str) -> bool {
        self.meta.responds_to(name) || self.reserved.iter().any(|r| r == name)
    }
}

/// The two ordered, de-duplicated lists of installation results.
///
/// A generated definition that loses to an already-installed scope of the
/// same name ([`Installation::Shadowed`]) is in neither list. The name stays
/// installed, and the two lists never share a name. Generation counts these
/// in `GenerationSummary::shadowed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallationOutcome {
    installed: Vec<String>,
    rejected: Vec<String>,
}

impl InstallationOutcome {
    /// Names installed, in installation order.
    pub fn installed(&self) -> &[String] {
        &self.installed
    }

    /// Names rejected because they collided, in rejection order.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    fn record_installed(&mut self, name: &str) {
        self.rejected.retain(|r| r != name);
        if !self.installed.iter().any(|n| n == name) {
            self.installed.push(name.to_string());
        }
    }

    fn record_rejected(&mut self, name: &str) {
        if !self.rejected.iter().any(|n| n == name) {
            self.rejected.push(name.to_string());
        }
    }
}

/// What happened to one installation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Installation {
    /// The scope is now callable.
    Installed,
    /// The same definition was already installed.
    Unchanged,
    /// The name resolves to a built-in, native or reserved method.
    Rejected,
    /// A different generated scope already holds the name; it was kept.
    Shadowed,
}

/// The generated scopes of one model.
#[derive(Debug, Clone, Default)]
pub struct ScopeTable {
    label: String,
    scopes: HashMap<String, ScopeDefinition>,
    outcome: InstallationOutcome,
}

impl ScopeTable {
    /// Creates an empty table for the model `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            scopes: HashMap::new(),
            outcome: InstallationOutcome::default(),
        }
    }

    /// The model label this table belongs to.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Installs `definition` unless its name collides.
    pub fn install(&mut self, definition: ScopeDefinition, guard: &CollisionGuard<'_>) -> Installation {
        let name = definition.name.clone();

        if let Some(existing) = self.scopes.get(&name) {
            if *existing == definition {
                tracing::trace!(model = %self.label, scope = %name, "Scope already installed");
                return Installation::Unchanged;
            }
            tracing::warn!(
                model = %self.label,
                scope = %name,
                kept = %existing.kind,
                dropped = %definition.kind,
                "Can't add scope: another generated scope already uses the name"
            );
            return Installation::Shadowed;
        }

        if guard.resolves(&name) {
            tracing::warn!(
                model = %self.label,
                scope = %name,
                "Can't add scope: it would overwrite an existing method"
            );
            self.outcome.record_rejected(&name);
            return Installation::Rejected;
        }

        tracing::debug!(
            model = %self.label,
            scope = %name,
            column = %definition.column,
            kind = %definition.kind,
            "Installed scope"
        );
        self.outcome.record_installed(&name);
        self.scopes.insert(name, definition);
        Installation::Installed
    }

    /// Returns the definition installed under `name`.
    pub fn get(&self, name: &str) -> Option<&ScopeDefinition> {
        self.scopes.get(name)
    }

    /// Returns `true` if `name` is an installed scope.
    pub fn contains(&self, name: &str) -> bool {
        self.scopes.contains_key(name)
    }

    /// Calls the scope `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AutoScopesError::UnknownScope`] if `name` is not installed
    /// (rejected names included), or whatever the template reports.
    pub fn call(&self, name: &str, args: &[ScopeArg], ctx: &ScopeContext) -> AutoScopesResult<QueryFragment> {
        let definition = self.get(name).ok_or_else(|| AutoScopesError::UnknownScope {
            model: self.label.clone(),
            scope: name.to_string(),
        })?;
        definition.build(args, ctx)
    }

    /// Installed scope names, in installation order.
    pub fn installed(&self) -> &[String] {
        self.outcome.installed()
    }

    /// Rejected scope names, in rejection order.
    pub fn rejected(&self) -> &[String] {
        self.outcome.rejected()
    }

    /// Both lists.
    pub const fn outcome(&self) -> &InstallationOutcome {
        &self.outcome
    }

    /// Installed definitions, in installation order.
    pub fn definitions(&self) -> impl Iterator<Item = &ScopeDefinition> {
        self.outcome
            .installed
            .iter()
            .filter_map(|name| self.scopes.get(name))
    }

    /// Number of installed scopes.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns `true` if nothing is installed.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
