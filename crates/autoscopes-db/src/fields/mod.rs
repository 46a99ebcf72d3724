//! Column descriptors for the ORM.
//!
//! This module provides the [`ColumnDescriptor`] struct and [`ColumnType`] enum
//! that describe the columns of a model's table. Scope generation reads them
//! and nothing else about a model's storage.

pub mod types;

pub use types::{ColumnDescriptor, ColumnType};
