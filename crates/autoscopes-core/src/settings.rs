//! Settings for scope generation.
//!
//! This module provides the [`Settings`] struct, which tunes the generator and
//! the scope templates, and [`LazySettings`], a globally-accessible,
//! lazily-initialized settings instance.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::AutoScopesError;

/// Largest accepted `recent_window_days` (about a century).
pub const MAX_RECENT_WINDOW_DAYS: i64 = 36_500;

/// The complete set of autoscopes settings.
///
/// # Examples
///
/// ```
/// use autoscopes_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.recent_window_days, 7);
/// assert_eq!(settings.sample_attempt_factor, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level or `EnvFilter` directive (e.g. "info", "autoscopes=debug").
    pub log_level: String,

    // ── Templates ────────────────────────────────────────────────────

    /// Default look-back window, in days, for `*_older_than`, `*_newer_than`,
    /// `recent` and `recently_updated` when called without a timestamp.
    pub recent_window_days: i64,
    /// Draw budget multiplier for the `random` scope: at most
    /// `sample_attempt_factor * n` identifiers are drawn.
    pub sample_attempt_factor: usize,

    // ── Generator ────────────────────────────────────────────────────

    /// Whether the model-level `random` scope is offered.
    pub random_scope: bool,
    /// Whether `created_at` / `updated_at` columns get their extra scopes.
    pub timestamp_scopes: bool,
    /// Names treated as already defined on every model.
    pub reserved_methods: Vec<String>,

    // ── SQL ──────────────────────────────────────────────────────────

    /// Default SQL dialect for compiled output ("postgresql", "sqlite", "mysql").
    pub backend: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            recent_window_days: 7,
            sample_attempt_factor: 2,
            random_scope: true,
            timestamp_scopes: true,
            reserved_methods: Vec::new(),
            backend: "postgresql".to_string(),
        }
    }
}

impl Settings {
    /// Checks values serde cannot reject on type alone.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `recent_window_days` is negative or
    /// above [`MAX_RECENT_WINDOW_DAYS`].
    pub fn validate(&self) -> Result<(), AutoScopesError> {
        if !(0..=MAX_RECENT_WINDOW_DAYS).contains(&self.recent_window_days) {
            return Err(AutoScopesError::ConfigurationError(format!(
                "recent_window_days must be between 0 and {MAX_RECENT_WINDOW_DAYS}, got {}",
                self.recent_window_days
            )));
        }
        Ok(())
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup. Library code
/// reads through [`get_or_default`](LazySettings::get_or_default) so that an
/// unconfigured process still generates scopes with the defaults.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called at most once.
    ///
    /// # Panics
    ///
    /// Panics if settings have already been configured.
    pub fn configure(&self, settings: Settings) {
        self.inner
            .set(settings)
            .expect("Settings have already been configured");
    }

    /// Returns the configured settings, or the defaults if `configure` was
    /// never called.
    pub fn get_or_default(&self) -> &Settings {
        self.inner.get_or_init(Settings::default)
    }

    /// Returns the configured settings, if any.
    pub fn get(&self) -> Option<&Settings> {
        self.inner.get()
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();
