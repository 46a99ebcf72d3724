//! Core error types for autoscopes.
//!
//! [`AutoScopesError`] covers the call-time failures of generated scopes
//! (argument shape, coercion, unknown names), the generation-time failures the
//! generator catches at its per-model boundary, and the ambient ORM,
//! configuration and IO errors.

use thiserror::Error;

/// The primary error type for autoscopes.
///
/// Scope call errors surface directly to whoever invoked the scope. The
/// generator never returns one of these: failures during generation are
/// logged and end the pass for that model early.
#[derive(Error, Debug)]
pub enum AutoScopesError {
    // ── Scope calls ──────────────────────────────────────────────────

    /// A scope was called with the wrong number or shape of arguments.
    #[error("Wrong number of arguments for scope '{scope}' (expected {expected}, given {given})")]
    Arity {
        /// The scope name that was called.
        scope: String,
        /// Human-readable description of the accepted argument shapes.
        expected: String,
        /// How many arguments were supplied.
        given: usize,
    },

    /// A scope argument could not be coerced to what the template needs.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested scope is not installed on the model.
    #[error("Scope '{scope}' is not installed on model '{model}'")]
    UnknownScope {
        /// The model label (`app_label.model_name`).
        model: String,
        /// The scope name that was looked up.
        scope: String,
    },

    /// No scopes have been generated for the model.
    #[error("No scopes generated for model '{0}'")]
    UnknownModel(String),

    /// A template needed call context that was not provided.
    #[error("Missing scope context: {0}")]
    MissingContext(String),

    // ── Generation ───────────────────────────────────────────────────

    /// A column descriptor cannot be turned into scope names.
    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    // ── ORM ──────────────────────────────────────────────────────────

    /// A generic database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AutoScopesError {
    /// Builds an [`Arity`](Self::Arity) error.
    pub fn arity(scope: impl Into<String>, expected: impl Into<String>, given: usize) -> Self {
        Self::Arity {
            scope: scope.into(),
            expected: expected.into(),
            given,
        }
    }
}

/// A convenience type alias for `Result<T, AutoScopesError>`.
pub type AutoScopesResult<T> = Result<T, AutoScopesError>;
