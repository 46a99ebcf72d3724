//! # autoscopes-cli
//!
//! Management commands for autoscopes, built on a small command framework.
//!
//! - **`scopes`** - List the scopes installed and rejected for each model of a
//!   schema file, as text or JSON
//! - **`sql`** - Compile a chain of scope calls to SQL for a chosen backend
//! - **`check`** - Validate a schema file before generation
//!
//! ## Quick Start
//!
//! ```rust
//! use autoscopes_cli::command::CommandRegistry;
//! use autoscopes_cli::commands::register_builtin_commands;
//!
//! let mut registry = CommandRegistry::new();
//! register_builtin_commands(&mut registry);
//!
//! assert_eq!(registry.list_commands(), vec!["check", "scopes", "sql"]);
//! ```

// These clippy lints are intentionally allowed:
// - doc_markdown: backtick requirements for documentation items are too strict
// - missing_const_for_fn: some functions may gain runtime logic later
// - unused_async: command handlers maintain consistent async signatures
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::unused_async)]

pub mod command;
pub mod commands;

pub use command::{load_settings, CommandRegistry, ManagementCommand};
