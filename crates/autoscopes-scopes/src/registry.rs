//! Process-wide scope registry.
//!
//! The global [`SCOPES`] registry holds one [`ScopeTable`] per model label
//! (`app_label.model_name`). Tables are created by the first generation pass
//! for a model and live for the rest of the process.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use autoscopes_core::{AutoScopesError, AutoScopesResult};
use autoscopes_db::query::fragment::QueryFragment;
use once_cell::sync::Lazy;

use crate::args::{ScopeArg, ScopeContext};
use crate::guard::ScopeTable;
use crate::templates::ScopeDefinition;

/// A registry of scope tables keyed by model label.
#[derive(Debug, Default)]
pub struct ScopeRegistry {
    tables: RwLock<HashMap<String, ScopeTable>>,
}

impl ScopeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a table half-written: each
    // install is a single insertion.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ScopeTable>> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ScopeTable>> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on the table for `label`, creating it if needed, while
    /// holding the write lock.
    pub fn with_table_mut<R>(&self, label: &str, f: impl FnOnce(&mut ScopeTable) -> R) -> R {
        let mut tables = self.write();
        let table = tables
            .entry(label.to_string())
            .or_insert_with(|| ScopeTable::new(label));
        f(table)
    }

    /// Returns `true` if a generation pass has run for `label`.
    pub fn contains(&self, label: &str) -> bool {
        self.read().contains_key(label)
    }

    /// Returns a snapshot of the table for `label`.
    pub fn table(&self, label: &str) -> Option<ScopeTable> {
        self.read().get(label).cloned()
    }

    /// Installed scope names for `label`; empty if never generated.
    pub fn list_installed(&self, label: &str) -> Vec<String> {
        self.read()
            .get(label)
            .map(|t| t.installed().to_vec())
            .unwrap_or_default()
    }

    /// Rejected scope names for `label`; empty if never generated.
    pub fn list_rejected(&self, label: &str) -> Vec<String> {
        self.read()
            .get(label)
            .map(|t| t.rejected().to_vec())
            .unwrap_or_default()
    }

    /// Looks up one definition.
    ///
    /// # Errors
    ///
    /// Returns [`AutoScopesError::UnknownModel`] or
    /// [`AutoScopesError::UnknownScope`].
    pub fn definition(&self, label: &str, name: &str) -> AutoScopesResult<ScopeDefinition> {
        let tables = self.read();
        let table = tables
            .get(label)
            .ok_or_else(|| AutoScopesError::UnknownModel(label.to_string()))?;
        table
            .get(name)
            .cloned()
            .ok_or_else(|| AutoScopesError::UnknownScope {
                model: label.to_string(),
                scope: name.to_string(),
            })
    }

    /// Calls scope `name` on model `label`.
    ///
    /// The read lock is released before the template runs.
    ///
    /// # Errors
    ///
    /// Returns a lookup error from [`definition`](Self::definition) or the
    /// template's own error.
    pub fn call(
        &self,
        label: &str,
        name: &str,
        args: &[ScopeArg],
        ctx: &ScopeContext,
    ) -> AutoScopesResult<QueryFragment> {
        self.definition(label, name)?.build(args, ctx)
    }
}

/// The global scope registry.
pub static SCOPES: Lazy<ScopeRegistry> = Lazy::new(ScopeRegistry::new);

/// Installed scope names for `label` in the global registry.
pub fn list_installed(label: &str) -> Vec<String> {
    SCOPES.list_installed(label)
}

/// Rejected scope names for `label` in the global registry.
pub fn list_rejected(label: &str) -> Vec<String> {
    SCOPES.list_rejected(label)
}

/// Calls scope `name` on model `label` in the global registry.
///
/// # Errors
///
/// See [`ScopeRegistry::call`].
pub fn call_scope(
    label: &str,
    name: &str,
    args: &[ScopeArg],
    ctx: &ScopeContext,
) -> AutoScopesResult<QueryFragment> {
    SCOPES.call(label, name, args, ctx)
}
