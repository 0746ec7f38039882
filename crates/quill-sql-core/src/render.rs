//! Rendering state threaded through every `to_sql` call.

use tracing::trace;

use crate::dialect::{Dialect, GenericDialect};
use crate::error::SyntaxError;
use crate::expr::Expr;
use crate::value::SqlValue;

/// The rendering contract implemented by every node of a query tree.
pub trait ToSql {
    /// Renders the node to SQL text, appending any bound parameters to `ctx`.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] when the node, as currently built, cannot
    /// produce valid SQL.
    fn to_sql(&self, ctx: &mut RenderContext) -> Result<String, SyntaxError>;

    /// Returns the node's alias, if one was set.
    fn get_alias(&self) -> Option<&str>;
}

/// One alias scope: the projection index of an embedded subquery, visible to
/// the enclosing SELECT's projections and predicate.
#[derive(Debug, Clone)]
struct ScopeFrame {
    entries: Vec<(String, Expr)>,
}

/// Per-render state: ordered bind parameters, dialect formatting, the descent
/// path of embedded selects, and the alias-scope stack.
///
/// A fresh context must be used for every top-level render. Contexts are
/// never shared across renders and hold no global state; rendering twice with
/// two fresh contexts yields identical output.
pub struct RenderContext {
    dialect: Box<dyn Dialect>,
    params: Vec<SqlValue>,
    path: Vec<String>,
    scopes: Vec<ScopeFrame>,
}

impl RenderContext {
    /// Creates a context using the generic ANSI dialect.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dialect(GenericDialect::new())
    }

    /// Creates a context using the given dialect.
    #[must_use]
    pub fn with_dialect(dialect: impl Dialect + 'static) -> Self {
        Self {
            dialect: Box::new(dialect),
            params: vec![],
            path: vec![],
            scopes: vec![],
        }
    }

    /// Records a bound value and returns its placeholder token.
    ///
    /// Values are kept in the exact order their placeholders are emitted, so
    /// the list lines up with the finished SQL text.
    pub fn add_parameter(&mut self, value: SqlValue) -> String {
        self.params.push(value);
        let token = self.dialect.placeholder(self.params.len());
        trace!(index = self.params.len(), token = %token, "bound parameter");
        token
    }

    /// Returns the parameters accumulated so far, in placeholder order.
    #[must_use]
    pub fn parameters(&self) -> &[SqlValue] {
        &self.params
    }

    /// Consumes the context and returns the ordered parameter list.
    #[must_use]
    pub fn into_parameters(self) -> Vec<SqlValue> {
        self.params
    }

    /// Returns the active dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Returns how many embedded selects deep the current render is.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Returns the descent path used to locate errors, e.g. `query/o`.
    #[must_use]
    pub fn scope_path(&self) -> String {
        if self.path.is_empty() {
            String::from("query")
        } else {
            format!("query/{}", self.path.join("/"))
        }
    }

    pub(crate) fn enter(&mut self, label: Option<&str>) {
        self.path.push(String::from(label.unwrap_or("<subquery>")));
    }

    pub(crate) fn exit(&mut self) {
        self.path.pop();
    }

    pub(crate) fn push_scope(&mut self, entries: Vec<(String, Expr)>) {
        self.scopes.push(ScopeFrame { entries });
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Runs `f` with the innermost scope frame masked.
    ///
    /// An embedded subquery's own index must not apply while its own text
    /// renders; outer frames stay visible for correlated references.
    pub(crate) fn masked<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let frame = self.scopes.pop();
        let out = f(self);
        if let Some(frame) = frame {
            self.scopes.push(frame);
        }
        out
    }

    /// Looks an expression up in the alias-scope stack, innermost first, and
    /// returns the alias it is exported under.
    pub(crate) fn resolve_alias(&self, expr: &Expr) -> Option<&str> {
        self.scopes.iter().rev().find_map(|frame| {
            frame
                .entries
                .iter()
                .find(|(_, indexed)| indexed == expr)
                .map(|(alias, _)| alias.as_str())
        })
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::PostgresDialect;
    use crate::expr::col;

    #[test]
    fn test_parameters_accumulate_in_order() {
        let mut ctx = RenderContext::new();
        assert_eq!(ctx.add_parameter(SqlValue::Int(1)), "?");
        assert_eq!(ctx.add_parameter(SqlValue::Text(String::from("a"))), "?");
        assert_eq!(
            ctx.into_parameters(),
            vec![SqlValue::Int(1), SqlValue::Text(String::from("a"))]
        );
    }

    #[test]
    fn test_postgres_placeholders_number_from_one() {
        let mut ctx = RenderContext::with_dialect(PostgresDialect::new());
        assert_eq!(ctx.add_parameter(SqlValue::Bool(true)), "$1");
        assert_eq!(ctx.add_parameter(SqlValue::Null), "$2");
    }

    #[test]
    fn test_scope_path_tracks_descent() {
        let mut ctx = RenderContext::new();
        assert_eq!(ctx.scope_path(), "query");
        assert_eq!(ctx.depth(), 0);
        ctx.enter(Some("o"));
        ctx.enter(None);
        assert_eq!(ctx.scope_path(), "query/o/<subquery>");
        assert_eq!(ctx.depth(), 2);
        ctx.exit();
        assert_eq!(ctx.scope_path(), "query/o");
    }

    #[test]
    fn test_resolve_alias_prefers_innermost_frame() {
        let mut ctx = RenderContext::new();
        ctx.push_scope(vec![(String::from("outer"), col("a"))]);
        ctx.push_scope(vec![(String::from("inner"), col("a"))]);
        assert_eq!(ctx.resolve_alias(&col("a")), Some("inner"));
        assert_eq!(ctx.resolve_alias(&col("b")), None);
        ctx.pop_scope();
        assert_eq!(ctx.resolve_alias(&col("a")), Some("outer"));
    }

    #[test]
    fn test_masked_hides_only_the_top_frame() {
        let mut ctx = RenderContext::new();
        ctx.push_scope(vec![(String::from("outer"), col("a"))]);
        ctx.push_scope(vec![(String::from("inner"), col("b"))]);
        ctx.masked(|ctx| {
            assert_eq!(ctx.resolve_alias(&col("b")), None);
            assert_eq!(ctx.resolve_alias(&col("a")), Some("outer"));
        });
        assert_eq!(ctx.resolve_alias(&col("b")), Some("inner"));
    }
}
