//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `AUTOSCOPES_DEBUG` | `debug` |
//! | `AUTOSCOPES_LOG_LEVEL` | `log_level` |
//! | `AUTOSCOPES_RECENT_WINDOW_DAYS` | `recent_window_days` |
//! | `AUTOSCOPES_SAMPLE_ATTEMPT_FACTOR` | `sample_attempt_factor` |
//! | `AUTOSCOPES_RANDOM_SCOPE` | `random_scope` |
//! | `AUTOSCOPES_TIMESTAMP_SCOPES` | `timestamp_scopes` |
//! | `AUTOSCOPES_RESERVED_METHODS` | `reserved_methods` (comma-separated) |
//! | `AUTOSCOPES_BACKEND` | `backend` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use autoscopes_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("autoscopes.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::AutoScopesError;
use crate::settings::{Settings, MAX_RECENT_WINDOW_DAYS};

/// Loads settings from a TOML string.
///
/// Fields not present in the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, AutoScopesError> {
    // TOML -> JSON, then a deep merge over the serialized defaults, so that
    // missing keys keep their default values.
    let toml_value: toml::Value = toml::from_str(toml_str).map_err(|e| {
        AutoScopesError::ConfigurationError(format!("Failed to parse TOML: {e}"))
    })?;

    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, AutoScopesError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        AutoScopesError::ConfigurationError(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, AutoScopesError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, AutoScopesError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str).map_err(|e| {
        AutoScopesError::ConfigurationError(format!("Failed to parse JSON: {e}"))
    })?;

    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, AutoScopesError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        AutoScopesError::ConfigurationError(format!(
            "Failed to read JSON file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_json_str(&content)
}

/// Loads settings from a file, picking the format from its extension
/// (`.json` for JSON, anything else for TOML), then applies environment
/// overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Settings, AutoScopesError> {
    let path = path.as_ref();
    let mut settings = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => from_json_file(path)?,
        _ => from_toml_file(path)?,
    };
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies environment variable overrides to a settings struct.
///
/// Unparseable or out-of-range numeric values are ignored and the current
/// value kept.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |key| std::env::var(key).ok());
}

fn apply_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("AUTOSCOPES_DEBUG") {
        settings.debug = parse_flag(&val);
    }

    if let Some(val) = var("AUTOSCOPES_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = var("AUTOSCOPES_RECENT_WINDOW_DAYS") {
        if let Ok(days) = val.trim().parse::<i64>() {
            if (0..=MAX_RECENT_WINDOW_DAYS).contains(&days) {
                settings.recent_window_days = days;
            }
        }
    }

    if let Some(val) = var("AUTOSCOPES_SAMPLE_ATTEMPT_FACTOR") {
        if let Ok(factor) = val.trim().parse::<usize>() {
            settings.sample_attempt_factor = factor;
        }
    }

    if let Some(val) = var("AUTOSCOPES_RANDOM_SCOPE") {
        settings.random_scope = parse_flag(&val);
    }

    if let Some(val) = var("AUTOSCOPES_TIMESTAMP_SCOPES") {
        settings.timestamp_scopes = parse_flag(&val);
    }

    if let Some(val) = var("AUTOSCOPES_RESERVED_METHODS") {
        settings.reserved_methods = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(val) = var("AUTOSCOPES_BACKEND") {
        settings.backend = val;
    }
}

fn parse_flag(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

// ============================================================
// Helpers
// ============================================================

fn merge_over_defaults(
    value: serde_json::Value,
    format: &str,
) -> Result<Settings, AutoScopesError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        AutoScopesError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    let settings: Settings = serde_json::from_value(merged).map_err(|e| {
        AutoScopesError::ConfigurationError(format!(
            "Failed to deserialize settings from {format}: {e}"
        ))
    })?;
    settings.validate()?;
    Ok(settings)
}

/// Converts a TOML value to a `serde_json::Value`.
pub fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
