//! The SELECT query node.

use tracing::debug;

use crate::error::{non_blank, SyntaxError, UsageError};
use crate::expr::Expr;
use crate::render::{RenderContext, ToSql};
use crate::subquery::SubQuery;

/// A FROM-clause source, stored unrendered until `to_sql`.
#[derive(Debug, Clone, PartialEq)]
pub enum FromSource {
    /// A table name, rendered verbatim.
    Table(String),
    /// A raw SQL fragment, rendered verbatim. Its contents are the caller's
    /// responsibility.
    Raw(String),
    /// A nested SELECT, wrapped in parentheses when rendered.
    Select(Box<Select>),
    /// An embedded subquery whose projection index is visible to the
    /// enclosing query.
    Subquery(Box<SubQuery>),
}

impl FromSource {
    /// Creates an explicitly-labeled raw FROM fragment.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    fn render(&self, ctx: &mut RenderContext) -> Result<String, SyntaxError> {
        match self {
            Self::Table(name) | Self::Raw(name) => Ok(name.clone()),
            Self::Select(select) => {
                ctx.enter(select.get_alias());
                let inner = select.to_sql(ctx);
                ctx.exit();
                let inner = inner?;
                Ok(match select.get_alias() {
                    Some(alias) => format!("({inner}) AS {alias}"),
                    None => format!("({inner})"),
                })
            }
            Self::Subquery(sub) => ctx.masked(|ctx| sub.to_sql(ctx)),
        }
    }
}

impl From<&str> for FromSource {
    fn from(table: &str) -> Self {
        Self::Table(String::from(table))
    }
}

impl From<String> for FromSource {
    fn from(table: String) -> Self {
        Self::Table(table)
    }
}

impl From<Select> for FromSource {
    fn from(select: Select) -> Self {
        Self::Select(Box::new(select))
    }
}

impl From<SubQuery> for FromSource {
    fn from(sub: SubQuery) -> Self {
        Self::Subquery(Box::new(sub))
    }
}

/// A SELECT statement under construction.
///
/// The tree is a reusable template: it may be rendered any number of times,
/// each render with a fresh context, and mutated between renders. Nothing is
/// consumed or sealed by rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    projections: Vec<Expr>,
    star: bool,
    from: Option<FromSource>,
    predicate: Option<Expr>,
    alias: Option<String>,
}

impl Select {
    /// Creates an empty SELECT.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends projections in call order; call order is render order.
    ///
    /// The projection list is append-only. There is no remove.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::EmptyProjectionList`] when called with no
    /// expressions.
    pub fn project(mut self, projections: Vec<Expr>) -> Result<Self, UsageError> {
        if projections.is_empty() {
            return Err(UsageError::EmptyProjectionList);
        }
        self.projections.extend(projections);
        Ok(self)
    }

    /// Selects all columns (`*`), rendered ahead of any explicit projections.
    #[must_use]
    pub fn all(mut self) -> Self {
        self.star = true;
        self
    }

    /// Sets the FROM source.
    ///
    /// The source is stored as-is and rendered only at `to_sql` time, so an
    /// embedded SELECT may still be mutated until the outer query renders.
    #[must_use]
    pub fn from(mut self, source: impl Into<FromSource>) -> Self {
        self.from = Some(source.into());
        self
    }

    /// Sets or replaces the WHERE predicate.
    #[must_use]
    pub fn where_clause(mut self, predicate: Expr) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Sets the alias used when this SELECT is embedded elsewhere.
    ///
    /// Top-level rendering ignores it.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::BlankAlias`] for an empty or whitespace-only
    /// alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Result<Self, UsageError> {
        self.alias = Some(non_blank(alias.into())?);
        Ok(self)
    }

    /// Returns the projections in render order.
    #[must_use]
    pub fn projections(&self) -> &[Expr] {
        &self.projections
    }

    fn render_clauses(&self, ctx: &mut RenderContext) -> Result<String, SyntaxError> {
        let mut fragments = Vec::with_capacity(self.projections.len() + 1);
        if self.star {
            fragments.push(String::from("*"));
        }
        for projection in &self.projections {
            fragments.push(render_projection(projection, ctx)?);
        }

        let mut sql = format!("SELECT {}", fragments.join(", "));

        match &self.from {
            Some(source) => {
                sql.push_str(" FROM ");
                sql.push_str(&source.render(ctx)?);
            }
            None => {
                if ctx.dialect().requires_from() {
                    return Err(SyntaxError::MissingFrom {
                        dialect: String::from(ctx.dialect().name()),
                        scope: ctx.scope_path(),
                    });
                }
            }
        }

        if let Some(predicate) = &self.predicate {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate.to_sql(ctx)?);
        }

        debug!(sql = %sql, depth = ctx.depth(), "rendered SELECT");
        Ok(sql)
    }
}

impl ToSql for Select {
    fn to_sql(&self, ctx: &mut RenderContext) -> Result<String, SyntaxError> {
        if self.projections.is_empty() && !self.star {
            return Err(SyntaxError::NoProjections {
                scope: ctx.scope_path(),
            });
        }

        // A FROM subquery's projection index is visible to this SELECT's
        // projections and predicate, but never to the subquery's own text.
        let scoped = if let Some(FromSource::Subquery(sub)) = &self.from {
            ctx.push_scope(sub.scope_entries());
            true
        } else {
            false
        };

        let rendered = self.render_clauses(ctx);

        if scoped {
            ctx.pop_scope();
        }
        rendered
    }

    fn get_alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

/// Renders one projection fragment, suffixing `AS alias` when aliased.
///
/// A projection resolved through an enclosing scope already renders as its
/// exporting alias, so no suffix is added there.
fn render_projection(projection: &Expr, ctx: &mut RenderContext) -> Result<String, SyntaxError> {
    let exported = ctx.resolve_alias(projection).is_some();
    let sql = projection.to_sql(ctx)?;
    match projection.get_alias() {
        Some(alias) if !exported => Ok(format!("{sql} AS {alias}")),
        _ => Ok(sql),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::expr::{col, fun, lit, Expr};
    use crate::value::SqlValue;

    struct StrictDialect;

    impl Dialect for StrictDialect {
        fn name(&self) -> &'static str {
            "strict"
        }

        fn requires_from(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_simple_select() {
        let query = Select::new()
            .project(vec![col("id"), col("name").alias("n").unwrap()])
            .unwrap()
            .from("users");
        let mut ctx = RenderContext::new();
        assert_eq!(
            query.to_sql(&mut ctx).unwrap(),
            "SELECT id, name AS n FROM users"
        );
        assert!(ctx.parameters().is_empty());
    }

    #[test]
    fn test_select_all() {
        let query = Select::new().all().from("users");
        let mut ctx = RenderContext::new();
        assert_eq!(query.to_sql(&mut ctx).unwrap(), "SELECT * FROM users");
    }

    #[test]
    fn test_all_renders_ahead_of_projections() {
        let query = Select::new()
            .project(vec![col("id")])
            .unwrap()
            .all()
            .from("users");
        let mut ctx = RenderContext::new();
        assert_eq!(query.to_sql(&mut ctx).unwrap(), "SELECT *, id FROM users");
    }

    #[test]
    fn test_where_clause_parameterizes() {
        let query = Select::new()
            .project(vec![col("id")])
            .unwrap()
            .from("users")
            .where_clause(col("active").eq(true).and(col("age").gt_eq(18)));
        let mut ctx = RenderContext::new();
        assert_eq!(
            query.to_sql(&mut ctx).unwrap(),
            "SELECT id FROM users WHERE active = ? AND age >= ?"
        );
        assert_eq!(
            ctx.parameters(),
            &[SqlValue::Bool(true), SqlValue::Int(18)]
        );
    }

    #[test]
    fn test_projection_order_is_call_order() {
        let query = Select::new()
            .project(vec![col("a")])
            .unwrap()
            .project(vec![col("b").alias("bb").unwrap(), col("c")])
            .unwrap()
            .from("t");
        let mut ctx = RenderContext::new();
        assert_eq!(
            query.to_sql(&mut ctx).unwrap(),
            "SELECT a, b AS bb, c FROM t"
        );
    }

    #[test]
    fn test_empty_projection_list_is_a_usage_error() {
        assert_eq!(
            Select::new().project(vec![]).unwrap_err(),
            UsageError::EmptyProjectionList
        );
    }

    #[test]
    fn test_no_projections_fails_at_render() {
        let query = Select::new().from("users");
        let mut ctx = RenderContext::new();
        assert_eq!(
            query.to_sql(&mut ctx).unwrap_err(),
            SyntaxError::NoProjections {
                scope: String::from("query"),
            }
        );
    }

    #[test]
    fn test_from_is_optional_in_the_generic_dialect() {
        let query = Select::new().project(vec![lit(1)]).unwrap();
        let mut ctx = RenderContext::new();
        assert_eq!(query.to_sql(&mut ctx).unwrap(), "SELECT ?");
        assert_eq!(ctx.parameters(), &[SqlValue::Int(1)]);
    }

    #[test]
    fn test_missing_from_fails_in_a_strict_dialect() {
        let query = Select::new().project(vec![lit(1)]).unwrap();
        let mut ctx = RenderContext::with_dialect(StrictDialect);
        assert_eq!(
            query.to_sql(&mut ctx).unwrap_err(),
            SyntaxError::MissingFrom {
                dialect: String::from("strict"),
                scope: String::from("query"),
            }
        );
    }

    #[test]
    fn test_raw_from_fragment_passes_through() {
        let query = Select::new()
            .project(vec![col("n")])
            .unwrap()
            .from(FromSource::raw("generate_series(1, 10) AS n"));
        let mut ctx = RenderContext::new();
        assert_eq!(
            query.to_sql(&mut ctx).unwrap(),
            "SELECT n FROM generate_series(1, 10) AS n"
        );
    }

    #[test]
    fn test_nested_select_from_source() {
        let inner = Select::new()
            .project(vec![col("id")])
            .unwrap()
            .from("users")
            .alias("u")
            .unwrap();
        let query = Select::new().project(vec![col("id")]).unwrap().from(inner);
        let mut ctx = RenderContext::new();
        assert_eq!(
            query.to_sql(&mut ctx).unwrap(),
            "SELECT id FROM (SELECT id FROM users) AS u"
        );
    }

    #[test]
    fn test_unaliased_nested_select_gets_no_suffix() {
        let inner = Select::new().project(vec![col("id")]).unwrap().from("users");
        let query = Select::new().project(vec![col("id")]).unwrap().from(inner);
        let mut ctx = RenderContext::new();
        assert_eq!(
            query.to_sql(&mut ctx).unwrap(),
            "SELECT id FROM (SELECT id FROM users)"
        );
    }

    #[test]
    fn test_error_inside_nested_select_names_its_scope() {
        let inner = Select::new().from("users").alias("u").unwrap();
        let query = Select::new().project(vec![col("id")]).unwrap().from(inner);
        let mut ctx = RenderContext::new();
        assert_eq!(
            query.to_sql(&mut ctx).unwrap_err(),
            SyntaxError::NoProjections {
                scope: String::from("query/u"),
            }
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let query = Select::new()
            .project(vec![col("id"), fun("LOWER", vec![col("name")]).alias("n").unwrap()])
            .unwrap()
            .from("users")
            .where_clause(col("active").eq(true));

        let mut first = RenderContext::new();
        let mut second = RenderContext::new();
        let a = query.to_sql(&mut first).unwrap();
        let b = query.to_sql(&mut second).unwrap();
        assert_eq!(a, b);
        assert_eq!(first.parameters(), second.parameters());
    }

    #[test]
    fn test_tree_is_mutable_between_renders() {
        let query = Select::new().project(vec![col("id")]).unwrap().from("users");
        let mut ctx = RenderContext::new();
        assert_eq!(query.to_sql(&mut ctx).unwrap(), "SELECT id FROM users");

        let query = query.project(vec![col("name")]).unwrap();
        let mut ctx = RenderContext::new();
        assert_eq!(query.to_sql(&mut ctx).unwrap(), "SELECT id, name FROM users");
    }

    #[test]
    fn test_scalar_subquery_in_projection() {
        let totals = Select::new()
            .project(vec![fun("COUNT", vec![Expr::wildcard()])])
            .unwrap()
            .from("orders");
        let query = Select::new()
            .project(vec![col("id"), Expr::from(totals).alias("order_count").unwrap()])
            .unwrap()
            .from("users");
        let mut ctx = RenderContext::new();
        assert_eq!(
            query.to_sql(&mut ctx).unwrap(),
            "SELECT id, (SELECT COUNT(*) FROM orders) AS order_count FROM users"
        );
    }

    #[test]
    fn test_scalar_subquery_in_predicate() {
        let max_age = Select::new()
            .project(vec![fun("MAX", vec![col("age")])])
            .unwrap()
            .from("users");
        let query = Select::new()
            .project(vec![col("id")])
            .unwrap()
            .from("users")
            .where_clause(col("age").eq(Expr::from(max_age)));
        let mut ctx = RenderContext::new();
        assert_eq!(
            query.to_sql(&mut ctx).unwrap(),
            "SELECT id FROM users WHERE age = (SELECT MAX(age) FROM users)"
        );
    }
}
