//! # autoscopes-core
//!
//! Core types shared by every autoscopes crate: the error enum, the settings
//! that tune scope generation, the settings loader, and tracing setup.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Generator settings and global configuration
//! - [`settings_loader`] - TOML/JSON settings files and environment overrides
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{AutoScopesError, AutoScopesResult};
pub use settings::{Settings, SETTINGS};
