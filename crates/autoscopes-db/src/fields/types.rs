//! Column type definitions.
//!
//! [`ColumnType`] is the declared type of a column as reported by a schema,
//! and [`ColumnDescriptor`] bundles it with the column name and primary-key
//! flag.

use std::fmt;

/// The declared type of a column.
///
/// Only the five kinds scopes are generated for are named. Anything else a
/// schema reports (`text`, `decimal`, `json`, ...) is kept verbatim in
/// [`Other`](ColumnType::Other).
///
/// Serialized as its lowercase name, so schema files can write
/// `type = "integer"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
    /// Integer column.
    Integer,
    /// Floating-point column.
    Float,
    /// Date and time column.
    DateTime,
    /// Boolean column.
    Boolean,
    /// Variable-length string column.
    String,
    /// Any other declared type.
    Other(String),
}

impl ColumnType {
    /// Returns the lowercase name of this type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::DateTime => "datetime",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Other(name) => name,
        }
    }

    /// Returns `true` for types that sort meaningfully (everything named
    /// except booleans).
    pub const fn is_orderable(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Float | Self::DateTime | Self::String
        )
    }
}

impl From<&str> for ColumnType {
    fn from(name: &str) -> Self {
        match name {
            "integer" => Self::Integer,
            "float" => Self::Float,
            "datetime" => Self::DateTime,
            "boolean" => Self::Boolean,
            "string" => Self::String,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ColumnType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<ColumnType> for String {
    fn from(ty: ColumnType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema metadata for one table column.
///
/// # Examples
///
/// ```
/// use autoscopes_db::fields::{ColumnDescriptor, ColumnType};
///
/// let id = ColumnDescriptor::new("id", ColumnType::Integer).primary_key();
/// assert!(id.primary_key);
/// assert_eq!(id.name, "id");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColumnDescriptor {
    /// The column name.
    pub name: String,
    /// The declared type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether this column is (part of) the primary key.
    #[serde(default)]
    pub primary_key: bool,
}

impl ColumnDescriptor {
    /// Creates a non-key column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
        }
    }

    /// Marks this column as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Shorthand for an integer column.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    /// Shorthand for a float column.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Float)
    }

    /// Shorthand for a datetime column.
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::DateTime)
    }

    /// Shorthand for a boolean column.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Boolean)
    }

    /// Shorthand for a string column.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::String)
    }
}
