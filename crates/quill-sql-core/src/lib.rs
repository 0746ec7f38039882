//! # quill-sql-core
//!
//! Composable SQL expression trees with dialect-aware rendering.
//!
//! Queries are assembled as in-memory trees through a fluent API and rendered
//! deterministically into SQL text plus an ordered bind-parameter list:
//!
//! ```rust
//! use quill_sql_core::{col, RenderContext, Select, ToSql};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let query = Select::new()
//!     .project(vec![col("id"), col("name").alias("n")?])?
//!     .from("users")
//!     .where_clause(col("active").eq(true));
//!
//! let mut ctx = RenderContext::new();
//! let sql = query.to_sql(&mut ctx)?;
//! assert_eq!(sql, "SELECT id, name AS n FROM users WHERE active = ?");
//! assert_eq!(ctx.parameters().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! A [`SubQuery`] embeds as a FROM source or scalar expression and exports
//! its aliased projections for lookup by name, so the outer query can
//! reference them before anything renders:
//!
//! ```rust
//! use quill_sql_core::{fun, Expr, RenderContext, Select, SubQuery, ToSql};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let totals = SubQuery::new()
//!     .project(vec![fun("COUNT", vec![Expr::wildcard()]).alias("cnt")?])?
//!     .from("orders")
//!     .alias("o")?;
//! let cnt = totals.col("cnt").cloned().expect("projected above");
//!
//! let query = Select::new().project(vec![cnt])?.from(totals);
//! let mut ctx = RenderContext::new();
//! assert_eq!(
//!     query.to_sql(&mut ctx)?,
//!     "SELECT cnt FROM (SELECT COUNT(*) AS cnt FROM orders) AS o"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Bound values always render as dialect placeholders and are never
//! interpolated into the SQL text. Raw fragments (and table names) pass
//! through verbatim and remain the caller's responsibility. Trees are
//! reusable templates: render as often as needed, one fresh
//! [`RenderContext`] per render, and mutate freely between renders.

pub mod dialect;
pub mod error;
pub mod expr;
pub mod render;
pub mod select;
pub mod subquery;
pub mod value;

pub use dialect::{Dialect, GenericDialect, PostgresDialect};
pub use error::{SyntaxError, UsageError};
pub use expr::{col, fun, lit, BinaryOp, Expr, ExprKind};
pub use render::{RenderContext, ToSql};
pub use select::{FromSource, Select};
pub use subquery::SubQuery;
pub use value::{SqlValue, ToSqlValue};
