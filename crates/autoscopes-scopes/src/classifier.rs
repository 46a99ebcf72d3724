//! Column classification.
//!
//! [`classify`] maps a column descriptor to the ordered list of
//! [`TemplateKind`]s that apply to it, and [`TemplateKind::scope_name`] derives
//! the name each generated scope is installed under.

use std::fmt;

use autoscopes_db::fields::{ColumnDescriptor, ColumnType};

/// One entry of the template bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// `col > amount`.
    GreaterThan,
    /// `col < amount`.
    LessThan,
    /// `col BETWEEN low AND high`.
    InRange,
    /// `col = amount` (integers only).
    Equals,
    /// `ORDER BY col ASC`.
    OrderAsc,
    /// `ORDER BY col DESC`.
    OrderDesc,
    /// `col < t`, `t` defaulting to the recency cutoff.
    OlderThan,
    /// `col > t`, `t` defaulting to the recency cutoff.
    NewerThan,
    /// `col < now`.
    InPast,
    /// `col > now`.
    InFuture,
    /// `col = true`.
    IsTrue,
    /// `col = false`.
    IsFalse,
    /// `col LIKE '%s%'`.
    Contains,
    /// `col LIKE 's%'`.
    StartsWith,
    /// `col LIKE '%s'`.
    EndsWith,
    /// `col = value`.
    ExactMatch,
    /// `col > t` on a timestamp column.
    AfterTime,
    /// `col >= t` on a timestamp column.
    AfterOrAt,
    /// `col < t` on a timestamp column.
    BeforeTime,
    /// `col <= t` on a timestamp column.
    BeforeOrAt,
    /// `col > t`, `t` defaulting to the recency cutoff.
    RecentWindow,
    /// `col BETWEEN low AND high` on a timestamp column.
    BetweenRange,
    /// `NOT (col IN (ids))` on a primary key.
    ExcludesSet,
    /// `col IN (sampled ids)` on the first primary key.
    RandomSample,
}

impl TemplateKind {
    /// Returns the snake_case name of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::InRange => "in_range",
            Self::Equals => "equals",
            Self::OrderAsc => "order_asc",
            Self::OrderDesc => "order_desc",
            Self::OlderThan => "older_than",
            Self::NewerThan => "newer_than",
            Self::InPast => "in_past",
            Self::InFuture => "in_future",
            Self::IsTrue => "is_true",
            Self::IsFalse => "is_false",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::ExactMatch => "exact_match",
            Self::AfterTime => "after_time",
            Self::AfterOrAt => "after_or_at",
            Self::BeforeTime => "before_time",
            Self::BeforeOrAt => "before_or_at",
            Self::RecentWindow => "recent_window",
            Self::BetweenRange => "between_range",
            Self::ExcludesSet => "excludes_set",
            Self::RandomSample => "random_sample",
        }
    }

    /// Returns `true` for the kinds offered to `created_at` / `updated_at`.
    pub const fn is_timestamp(self) -> bool {
        matches!(
            self,
            Self::AfterTime
                | Self::AfterOrAt
                | Self::BeforeTime
                | Self::BeforeOrAt
                | Self::RecentWindow
                | Self::BetweenRange
        )
    }

    /// Returns the name a scope of this kind is installed under for `column`.
    ///
    /// Timestamp kinds use the column's prefix (`created` / `updated`); on any
    /// other column they fall back to the column name itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use autoscopes_scopes::classifier::TemplateKind;
    ///
    /// assert_eq!(TemplateKind::InRange.scope_name("amount"), "amount_in_range");
    /// assert_eq!(TemplateKind::OrderDesc.scope_name("id"), "in_reverse_id_order");
    /// assert_eq!(TemplateKind::IsFalse.scope_name("active"), "not_active");
    /// assert_eq!(TemplateKind::BeforeOrAt.scope_name("created_at"), "created_before_or_at");
    /// assert_eq!(TemplateKind::RecentWindow.scope_name("updated_at"), "recently_updated");
    /// ```
    pub fn scope_name(self, column: &str) -> String {
        let prefix = timestamp_prefix(column).unwrap_or(column);
        match self {
            Self::OrderAsc => format!("in_{column}_order"),
            Self::OrderDesc => format!("in_reverse_{column}_order"),
            Self::IsTrue => column.to_string(),
            Self::IsFalse => format!("not_{column}"),
            Self::ExactMatch => format!("{column}_is"),
            Self::AfterTime => format!("{prefix}_after"),
            Self::AfterOrAt => format!("{prefix}_after_or_at"),
            Self::BeforeTime => format!("{prefix}_before"),
            Self::BeforeOrAt => format!("{prefix}_before_or_at"),
            Self::BetweenRange => format!("{prefix}_between"),
            Self::RecentWindow => match timestamp_prefix(column) {
                Some("created") => "recent".to_string(),
                Some(other) => format!("recently_{other}"),
                None => format!("recent_{column}"),
            },
            Self::ExcludesSet => format!("{column}_excludes"),
            Self::RandomSample => "random".to_string(),
            Self::GreaterThan
            | Self::LessThan
            | Self::InRange
            | Self::Equals
            | Self::OlderThan
            | Self::NewerThan
            | Self::InPast
            | Self::InFuture
            | Self::Contains
            | Self::StartsWith
            | Self::EndsWith => format!("{column}_{}", self.as_str()),
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `created` or `updated` for the two magic timestamp columns.
pub fn timestamp_prefix(column: &str) -> Option<&'static str> {
    match column {
        "created_at" => Some("created"),
        "updated_at" => Some("updated"),
        _ => None,
    }
}

/// Returns the template kinds that apply to `column`, in installation order.
///
/// Type templates come first, then the magic-timestamp templates, then the
/// primary-key template. Unknown types contribute nothing.
pub fn classify(column: &ColumnDescriptor) -> Vec<TemplateKind> {
    use TemplateKind as K;

    let mut kinds: Vec<TemplateKind> = match column.column_type {
        ColumnType::Integer => vec![K::GreaterThan, K::LessThan, K::InRange, K::Equals],
        ColumnType::Float => vec![K::GreaterThan, K::LessThan, K::InRange],
        ColumnType::DateTime => vec![K::OlderThan, K::NewerThan, K::InPast, K::InFuture],
        ColumnType::Boolean => vec![K::IsTrue, K::IsFalse],
        ColumnType::String => vec![K::Contains, K::StartsWith, K::EndsWith, K::ExactMatch],
        ColumnType::Other(_) => Vec::new(),
    };

    if column.column_type.is_orderable() {
        kinds.extend([K::OrderAsc, K::OrderDesc]);
    }

    if timestamp_prefix(&column.name).is_some() {
        kinds.extend([
            K::AfterTime,
            K::AfterOrAt,
            K::BeforeTime,
            K::BeforeOrAt,
            K::RecentWindow,
            K::BetweenRange,
        ]);
    }

    if column.primary_key {
        kinds.push(K::ExcludesSet);
    }

    kinds
}
