//! Model trait and schema metadata for the ORM.
//!
//! [`ModelMeta`] is the explicit schema of one model: its table and its
//! column descriptors, plus the names the model already answers to. Rust
//! types expose theirs through the [`Model`] trait; schemas can also be loaded
//! from TOML or JSON files with [`SchemaFile`].

use std::path::Path;

use autoscopes_core::{AutoScopesError, AutoScopesResult};

use crate::fields::ColumnDescriptor;
use crate::query::queryset::QUERYSET_METHODS;
use crate::value::Value;

/// A database row abstraction used for constructing model instances.
pub use crate::query::compiler::Row;

/// The core trait for all ORM models.
///
/// # Examples
///
/// ```
/// use autoscopes_db::model::{Model, ModelMeta};
/// use autoscopes_db::fields::ColumnDescriptor;
/// use autoscopes_db::value::Value;
/// use autoscopes_db::query::compiler::Row;
/// use autoscopes_core::AutoScopesResult;
///
/// struct Payment {
///     id: Value,
///     amount: i64,
/// }
///
/// impl Model for Payment {
///     fn meta() -> &'static ModelMeta {
///         use std::sync::LazyLock;
///         static META: LazyLock<ModelMeta> = LazyLock::new(|| {
///             ModelMeta::new("shop", "payment")
///                 .column(ColumnDescriptor::integer("id").primary_key())
///                 .column(ColumnDescriptor::integer("amount"))
///         });
///         &META
///     }
///
///     fn pk(&self) -> Option<&Value> { Some(&self.id) }
///
///     fn from_row(row: &Row) -> AutoScopesResult<Self> {
///         Ok(Payment {
///             id: row.get::<Value>("id")?,
///             amount: row.get::<i64>("amount")?,
///         })
///     }
/// }
///
/// assert_eq!(Payment::table_name(), "shop_payment");
/// assert_eq!(Payment::pk_field_name(), "id");
/// ```
pub trait Model: Send + Sync + 'static {
    /// Returns the static schema for this model type.
    fn meta() -> &'static ModelMeta;

    /// Returns the database table name.
    fn table_name() -> &'static str {
        Self::meta().table_name()
    }

    /// Returns the primary key value, or `None` if unsaved.
    fn pk(&self) -> Option<&Value>;

    /// Returns the name of the primary key column (e.g., "id").
    fn pk_field_name() -> &'static str {
        Self::meta()
            .primary_key()
            .map_or("id", |column| column.name.as_str())
    }

    /// Constructs a model instance from a database row.
    fn from_row(row: &Row) -> AutoScopesResult<Self>
    where
        Self: Sized;
}

/// The explicit schema of a model.
///
/// `db_table` defaults to `<app_label>_<model_name>`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModelMeta {
    /// The application label (e.g., "shop", "blog").
    pub app_label: String,
    /// The model name in lowercase (e.g., "payment").
    pub model_name: String,
    /// The database table name.
    #[serde(default)]
    pub db_table: String,
    /// Column descriptors, in table order.
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    /// Names the model already defines besides the built-in `QuerySet` methods.
    #[serde(default)]
    pub native_methods: Vec<String>,
}

impl ModelMeta {
    /// Creates an empty schema for `app_label.model_name`.
    pub fn new(app_label: impl Into<String>, model_name: impl Into<String>) -> Self {
        let mut meta = Self {
            app_label: app_label.into(),
            model_name: model_name.into(),
            db_table: String::new(),
            columns: Vec::new(),
            native_methods: Vec::new(),
        };
        meta.normalize();
        meta
    }

    /// Sets the database table name.
    #[must_use]
    pub fn table(mut self, db_table: impl Into<String>) -> Self {
        self.db_table = db_table.into();
        self
    }

    /// Appends a column descriptor.
    #[must_use]
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Declares a name the model already defines.
    #[must_use]
    pub fn native_method(mut self, name: impl Into<String>) -> Self {
        self.native_methods.push(name.into());
        self
    }

    /// Returns the registry label, `app_label.model_name`.
    pub fn label(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name)
    }

    /// Returns the database table name.
    pub fn table_name(&self) -> &str {
        &self.db_table
    }

    /// Fills in `db_table` if it was left empty.
    fn normalize(&mut self) {
        if self.db_table.is_empty() {
            self.db_table = format!("{}_{}", self.app_label, self.model_name);
        }
    }

    /// Returns the column with the given name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns all column names in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Returns the first primary-key column.
    pub fn primary_key(&self) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Returns `true` if `name` already resolves on the model: a built-in
    /// `QuerySet` method or one of `native_methods`.
    pub fn responds_to(&self, name: &str) -> bool {
        QUERYSET_METHODS.contains(&name) || self.native_methods.iter().any(|m| m == name)
    }
}

/// A schema file listing several models.
///
/// ```toml
/// [[models]]
/// app_label = "shop"
/// model_name = "payment"
/// native_methods = ["refund"]
///
/// [[models.columns]]
/// name = "id"
/// type = "integer"
/// primary_key = true
///
/// [[models.columns]]
/// name = "amount"
/// type = "float"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SchemaFile {
    /// The models described by the file.
    #[serde(default)]
    pub models: Vec<ModelMeta>,
}

impl SchemaFile {
    /// Parses a TOML schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the TOML is malformed.
    pub fn from_toml_str(toml_str: &str) -> AutoScopesResult<Self> {
        let mut schema: Self = toml::from_str(toml_str).map_err(|e| {
            AutoScopesError::ConfigurationError(format!("Failed to parse schema TOML: {e}"))
        })?;
        schema.normalize();
        Ok(schema)
    }

    /// Parses a JSON schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the JSON is malformed.
    pub fn from_json_str(json_str: &str) -> AutoScopesResult<Self> {
        let mut schema: Self = serde_json::from_str(json_str).map_err(|e| {
            AutoScopesError::ConfigurationError(format!("Failed to parse schema JSON: {e}"))
        })?;
        schema.normalize();
        Ok(schema)
    }

    /// Returns the model with the given label (`app_label.model_name`) or
    /// bare model name.
    pub fn find(&self, name: &str) -> Option<&ModelMeta> {
        self.models
            .iter()
            .find(|m| m.label() == name)
            .or_else(|| self.models.iter().find(|m| m.model_name == name))
    }

    fn normalize(&mut self) {
        for model in &mut self.models {
            model.normalize();
        }
    }
}

/// Loads a schema file, picking the format from its extension (`.json` for
/// JSON, anything else for TOML).
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_schema_file(path: impl AsRef<Path>) -> AutoScopesResult<SchemaFile> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => SchemaFile::from_json_str(&content),
        _ => SchemaFile::from_toml_str(&content),
    }
}
