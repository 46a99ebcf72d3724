//! Query building: lookups, the query AST and compiler, scope fragments,
//! and the lazy [`QuerySet`](queryset::QuerySet).

pub mod compiler;
pub mod fragment;
pub mod lookups;
pub mod queryset;

pub use compiler::{
    DatabaseBackendType, FromValue, OrderBy, Query, Row, SelectColumn, SqlCompiler, WhereNode,
};
pub use fragment::QueryFragment;
pub use lookups::{Lookup, Q};
pub use queryset::{Manager, QuerySet, QUERYSET_METHODS};
