//! Scope call arguments and call-time context.
//!
//! A scope is called with a slice of [`ScopeArg`]s and a [`ScopeContext`].
//! The context carries everything a template reads besides its arguments:
//! the clock, the recency window, the table's row count and the sampling RNG.

use std::ops::RangeInclusive;
use std::sync::{Mutex, PoisonError};

use autoscopes_core::{AutoScopesError, AutoScopesResult, Settings, SETTINGS};
use autoscopes_db::executor::DbExecutor;
use autoscopes_db::model::Model;
use autoscopes_db::query::queryset::QuerySet;
use autoscopes_db::value::Value;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// One argument to a scope call.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeArg {
    /// A plain scalar value.
    Value(Value),
    /// An inclusive range, for `*_in_range` and `*_between`.
    Range(Value, Value),
    /// A record, given by its primary key. `Null` means unsaved.
    Record(Value),
    /// A collection of arguments, for `*_excludes`.
    List(Vec<ScopeArg>),
}

impl ScopeArg {
    /// Wraps a model instance by its primary key.
    pub fn record<M: Model>(record: &M) -> Self {
        Self::Record(record.pk().cloned().unwrap_or(Value::Null))
    }

    /// A short description of the argument's shape, used in error messages.
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Value(v) => v.type_name(),
            Self::Range(..) => "range",
            Self::Record(_) => "record",
            Self::List(_) => "list",
        }
    }
}

impl From<Value> for ScopeArg {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

macro_rules! scalar_arg {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ScopeArg {
                fn from(v: $ty) -> Self {
                    Self::Value(Value::from(v))
                }
            }
        )*
    };
}

scalar_arg!(bool, i32, i64, u32, f64, String, &str, DateTime<Utc>);

impl<T: Into<Value>> From<RangeInclusive<T>> for ScopeArg {
    fn from(range: RangeInclusive<T>) -> Self {
        let (low, high) = range.into_inner();
        Self::Range(low.into(), high.into())
    }
}

impl<T: Into<ScopeArg>> From<Vec<T>> for ScopeArg {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Call-time context for scopes.
///
/// `now` is fixed when the context is built, so every scope applied with the
/// same context sees the same clock.
#[derive(Debug)]
pub struct ScopeContext {
    now: DateTime<Utc>,
    recent_window: Option<Duration>,
    row_count: Option<u64>,
    sample_attempt_factor: usize,
    rng: Mutex<StdRng>,
}

impl ScopeContext {
    /// Builds a context from the global settings (or their defaults).
    pub fn new() -> Self {
        Self::from_settings(SETTINGS.get_or_default())
    }

    /// Builds a context from explicit settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            now: Utc::now(),
            recent_window: Duration::try_days(settings.recent_window_days),
            row_count: None,
            sample_attempt_factor: settings.sample_attempt_factor,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Pins the clock.
    #[must_use]
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Overrides the default window for `*_older_than`, `*_newer_than`,
    /// `recent` and `recently_updated`.
    #[must_use]
    pub fn with_recent_window(mut self, window: Duration) -> Self {
        self.recent_window = Some(window);
        self
    }

    /// Sets the table's row count, needed by `random`.
    #[must_use]
    pub fn with_row_count(mut self, count: u64) -> Self {
        self.row_count = Some(count);
        self
    }

    /// Makes sampling deterministic.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Sets how many draws per requested id `random` may make.
    #[must_use]
    pub fn with_attempt_factor(mut self, factor: usize) -> Self {
        self.sample_attempt_factor = factor;
        self
    }

    /// Fills in the row count by running `qs`'s `COUNT(*)` through `db`.
    ///
    /// # Errors
    ///
    /// Returns the executor's error, or a database error for a negative count.
    pub async fn with_row_count_from<M: Model>(
        self,
        qs: &QuerySet<M>,
        db: &dyn DbExecutor,
    ) -> AutoScopesResult<Self> {
        let count = qs.count_exec(db).await?;
        let count = u64::try_from(count).map_err(|_| {
            AutoScopesError::DatabaseError(format!("COUNT(*) returned {count}"))
        })?;
        Ok(self.with_row_count(count))
    }

    /// The call-time clock.
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// `now` minus the recency window.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a negative window, or one that
    /// reaches past the earliest representable timestamp.
    pub fn recent_cutoff(&self) -> AutoScopesResult<DateTime<Utc>> {
        self.recent_window
            .filter(|window| *window >= Duration::zero())
            .and_then(|window| self.now.checked_sub_signed(window))
            .ok_or_else(|| {
                AutoScopesError::ConfigurationError(format!(
                    "Recency window {:?} cannot be applied to {}",
                    self.recent_window, self.now
                ))
            })
    }

    /// The table's row count, if known.
    pub const fn row_count(&self) -> Option<u64> {
        self.row_count
    }

    /// Draws per requested id for `random`.
    pub const fn sample_attempt_factor(&self) -> usize {
        self.sample_attempt_factor
    }

    /// Runs `f` with exclusive access to the sampling RNG.
    pub fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

impl Default for ScopeContext {
    fn default() -> Self {
        Self::new()
    }
}
