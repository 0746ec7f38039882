//! Subqueries: SELECTs embeddable as FROM sources or scalar expressions.

use std::collections::HashMap;

use crate::error::{SyntaxError, UsageError};
use crate::expr::Expr;
use crate::render::{RenderContext, ToSql};
use crate::select::{FromSource, Select};

/// A SELECT that can be embedded in an outer query, carrying an index from
/// projection alias to the expression that produced it.
///
/// Sibling expressions in the outer query reference exported columns through
/// [`SubQuery::col`] before anything renders, so a mistyped alias surfaces as
/// an absent lookup rather than as broken SQL. The index is per-instance
/// state and lives exactly as long as the node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubQuery {
    select: Select,
    projection_index: HashMap<String, Expr>,
}

impl SubQuery {
    /// Creates an empty subquery.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends projections and records each aliased one in the index.
    ///
    /// Un-aliased projections render but are not addressable by name. When
    /// two projections share an alias, both render and the later one wins
    /// the index entry.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::EmptyProjectionList`] when called with no
    /// expressions.
    pub fn project(mut self, projections: Vec<Expr>) -> Result<Self, UsageError> {
        for projection in &projections {
            if let Some(alias) = projection.get_alias() {
                self.projection_index
                    .insert(String::from(alias), projection.clone());
            }
        }
        self.select = self.select.project(projections)?;
        Ok(self)
    }

    /// Selects all columns (`*`).
    #[must_use]
    pub fn all(mut self) -> Self {
        self.select = self.select.all();
        self
    }

    /// Sets the FROM source of the inner SELECT.
    #[must_use]
    pub fn from(mut self, source: impl Into<FromSource>) -> Self {
        self.select = self.select.from(source);
        self
    }

    /// Sets or replaces the WHERE predicate of the inner SELECT.
    #[must_use]
    pub fn where_clause(mut self, predicate: Expr) -> Self {
        self.select = self.select.where_clause(predicate);
        self
    }

    /// Sets the alias the subquery is embedded under.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::BlankAlias`] for an empty or whitespace-only
    /// alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Result<Self, UsageError> {
        self.select = self.select.alias(alias)?;
        Ok(self)
    }

    /// Looks up the expression projected under `name`.
    ///
    /// Absence means the alias was never used; it is not an error.
    #[must_use]
    pub fn get_projection(&self, name: &str) -> Option<&Expr> {
        self.projection_index.get(name)
    }

    /// Synonym for [`SubQuery::get_projection`].
    #[must_use]
    pub fn col(&self, name: &str) -> Option<&Expr> {
        self.projection_index.get(name)
    }

    /// Returns the inner SELECT.
    #[must_use]
    pub fn select(&self) -> &Select {
        &self.select
    }

    pub(crate) fn scope_entries(&self) -> Vec<(String, Expr)> {
        self.projection_index
            .iter()
            .map(|(alias, expr)| (alias.clone(), expr.clone()))
            .collect()
    }
}

impl ToSql for SubQuery {
    /// Renders the inner SELECT in exactly one paren pair and, when aliased,
    /// appends ` AS alias`; otherwise nothing follows the closing paren.
    fn to_sql(&self, ctx: &mut RenderContext) -> Result<String, SyntaxError> {
        ctx.enter(self.get_alias());
        let inner = self.select.to_sql(ctx);
        ctx.exit();
        let inner = inner?;
        Ok(match self.get_alias() {
            Some(alias) => format!("({inner}) AS {alias}"),
            None => format!("({inner})"),
        })
    }

    fn get_alias(&self) -> Option<&str> {
        self.select.get_alias()
    }
}

impl From<SubQuery> for Expr {
    /// Embeds the subquery as a scalar expression; the projection index does
    /// not travel, since scalar position has no columns to export.
    fn from(sub: SubQuery) -> Self {
        Self::from(sub.select)
    }
}
