//! # autoscopes-scopes
//!
//! Column-driven scope generation. Given a model's column descriptors, the
//! generator installs a library of named query scopes (comparisons, ranges,
//! orderings, text matches, timestamp windows, exclusions and random samples)
//! into a per-model [`ScopeTable`](guard::ScopeTable), refusing any name the
//! model already answers to.
//!
//! ## Module Overview
//!
//! - [`classifier`] - Column type to [`TemplateKind`](classifier::TemplateKind) mapping and scope naming
//! - [`templates`] - The template bank ([`ScopeDefinition`](templates::ScopeDefinition))
//! - [`args`] - [`ScopeArg`](args::ScopeArg) and the call-time [`ScopeContext`](args::ScopeContext)
//! - [`sampling`] - Id sampling for `random`
//! - [`guard`] - The collision guard and [`ScopeTable`](guard::ScopeTable)
//! - [`registry`] - The process-wide [`SCOPES`](registry::SCOPES) registry
//! - [`generator`] - [`generate`](generator::generate) and its summary
//! - [`ext`] - The [`ScopedQuerySet`](ext::ScopedQuerySet) extension trait

// These clippy lints are intentionally allowed:
// - doc_markdown: backtick requirements for documentation items are too strict
// - missing_const_for_fn: builder methods stay non-const while their fields may gain drop glue
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]

pub mod args;
pub mod classifier;
pub mod ext;
pub mod generator;
pub mod guard;
pub mod registry;
pub mod sampling;
pub mod templates;

// Re-export the most commonly used types at the crate root.
pub use args::{ScopeArg, ScopeContext};
pub use classifier::{classify, TemplateKind};
pub use ext::ScopedQuerySet;
pub use generator::{generate, generate_into, generate_model, generate_with, GenerationSummary};
pub use guard::{CollisionGuard, Installation, InstallationOutcome, ScopeTable};
pub use registry::{call_scope, list_installed, list_rejected, ScopeRegistry, SCOPES};
pub use templates::ScopeDefinition;
