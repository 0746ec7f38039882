//! Expression nodes and the fluent combinators that compose them.
//!
//! Every node a query can contain lives in the closed [`ExprKind`] sum type,
//! so rendering matches kinds exhaustively. An [`Expr`] pairs a kind with an
//! optional alias; the alias matters in projection position and for subquery
//! projection indexes, and is ignored inside predicates.

use crate::error::{non_blank, SyntaxError, UsageError};
use crate::render::{RenderContext, ToSql};
use crate::select::Select;
use crate::value::{SqlValue, ToSqlValue};

/// Creates an unqualified column reference.
#[must_use]
pub fn col(name: impl Into<String>) -> Expr {
    Expr::new(ExprKind::Column {
        table: None,
        name: name.into(),
    })
}

/// Creates a bound literal.
///
/// The value renders as a dialect placeholder, never as inline text.
#[must_use]
pub fn lit(value: impl ToSqlValue) -> Expr {
    Expr::new(ExprKind::Literal(value.to_sql_value()))
}

/// Creates a function call over the given arguments.
#[must_use]
pub fn fun(name: impl Into<String>, args: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Function {
        name: name.into(),
        distinct: false,
        args,
    })
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
}

impl BinaryOp {
    /// Returns the SQL token for the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
        }
    }
}

/// The closed set of expression node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A column reference, optionally table-qualified.
    Column {
        /// Table qualifier.
        table: Option<String>,
        /// Column name.
        name: String,
    },
    /// A bound literal value.
    Literal(SqlValue),
    /// A function call.
    Function {
        /// Function name, rendered as given.
        name: String,
        /// Whether `DISTINCT` precedes the arguments.
        distinct: bool,
        /// Argument expressions, in call order.
        args: Vec<Expr>,
    },
    /// A binary expression.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Logical negation.
    Not(Box<Expr>),
    /// IS NULL / IS NOT NULL.
    IsNull {
        /// The tested expression.
        expr: Box<Expr>,
        /// Whether this is IS NOT NULL.
        negated: bool,
    },
    /// IN / NOT IN over a list.
    In {
        /// The tested expression.
        expr: Box<Expr>,
        /// List members.
        list: Vec<Expr>,
        /// Whether this is NOT IN.
        negated: bool,
    },
    /// BETWEEN / NOT BETWEEN.
    Between {
        /// The tested expression.
        expr: Box<Expr>,
        /// Lower bound.
        low: Box<Expr>,
        /// Upper bound.
        high: Box<Expr>,
        /// Whether this is NOT BETWEEN.
        negated: bool,
    },
    /// A parenthesized expression.
    Paren(Box<Expr>),
    /// A raw SQL fragment, rendered verbatim.
    Raw(String),
    /// The `*` wildcard, optionally table-qualified.
    Wildcard {
        /// Table qualifier.
        table: Option<String>,
    },
    /// An embedded scalar subquery.
    Subquery(Box<Select>),
}

/// A renderable expression node with an optional alias.
///
/// Expressions are plain owned trees: a parent exclusively owns its children
/// and nodes live as long as the tree they sit in. Equality is structural.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    kind: ExprKind,
    alias: Option<String>,
}

impl Expr {
    pub(crate) fn new(kind: ExprKind) -> Self {
        Self { kind, alias: None }
    }

    /// Creates a table-qualified column reference.
    #[must_use]
    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(ExprKind::Column {
            table: Some(table.into()),
            name: name.into(),
        })
    }

    /// Creates a raw SQL fragment.
    ///
    /// The fragment passes through verbatim; its contents are the caller's
    /// responsibility.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(ExprKind::Raw(sql.into()))
    }

    /// Creates the `*` wildcard.
    #[must_use]
    pub fn wildcard() -> Self {
        Self::new(ExprKind::Wildcard { table: None })
    }

    /// Creates a table-qualified wildcard (`t.*`).
    #[must_use]
    pub fn qualified_wildcard(table: impl Into<String>) -> Self {
        Self::new(ExprKind::Wildcard {
            table: Some(table.into()),
        })
    }

    /// Marks a function call as `DISTINCT` over its arguments.
    ///
    /// No effect on other node kinds.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        if let ExprKind::Function { distinct, .. } = &mut self.kind {
            *distinct = true;
        }
        self
    }

    /// Sets the alias used when the expression appears in projection
    /// position. Re-setting replaces the previous alias.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::BlankAlias`] for an empty or whitespace-only
    /// alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Result<Self, UsageError> {
        self.alias = Some(non_blank(alias.into())?);
        Ok(self)
    }

    /// Returns the node kind.
    #[must_use]
    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    fn binary(self, op: BinaryOp, right: Expr) -> Self {
        Self::new(ExprKind::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        })
    }

    /// Creates an equality comparison.
    #[must_use]
    pub fn eq(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Eq, right.into())
    }

    /// Creates an inequality comparison.
    #[must_use]
    pub fn not_eq(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::NotEq, right.into())
    }

    /// Creates a less-than comparison.
    #[must_use]
    pub fn lt(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Lt, right.into())
    }

    /// Creates a less-than-or-equal comparison.
    #[must_use]
    pub fn lt_eq(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::LtEq, right.into())
    }

    /// Creates a greater-than comparison.
    #[must_use]
    pub fn gt(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Gt, right.into())
    }

    /// Creates a greater-than-or-equal comparison.
    #[must_use]
    pub fn gt_eq(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::GtEq, right.into())
    }

    /// Combines two predicates with AND.
    #[must_use]
    pub fn and(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::And, right.into())
    }

    /// Combines two predicates with OR.
    #[must_use]
    pub fn or(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Or, right.into())
    }

    /// Creates a LIKE comparison.
    #[must_use]
    pub fn like(self, pattern: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Like, pattern.into())
    }

    /// Creates a NOT LIKE comparison.
    #[must_use]
    pub fn not_like(self, pattern: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::NotLike, pattern.into())
    }

    /// Creates an IS NULL test.
    #[must_use]
    pub fn is_null(self) -> Self {
        Self::new(ExprKind::IsNull {
            expr: Box::new(self),
            negated: false,
        })
    }

    /// Creates an IS NOT NULL test.
    #[must_use]
    pub fn is_not_null(self) -> Self {
        Self::new(ExprKind::IsNull {
            expr: Box::new(self),
            negated: true,
        })
    }

    /// Creates an IN test over a list of values.
    #[must_use]
    pub fn in_list<T: Into<Expr>>(self, values: Vec<T>) -> Self {
        Self::new(ExprKind::In {
            expr: Box::new(self),
            list: values.into_iter().map(Into::into).collect(),
            negated: false,
        })
    }

    /// Creates a NOT IN test over a list of values.
    #[must_use]
    pub fn not_in_list<T: Into<Expr>>(self, values: Vec<T>) -> Self {
        Self::new(ExprKind::In {
            expr: Box::new(self),
            list: values.into_iter().map(Into::into).collect(),
            negated: true,
        })
    }

    /// Creates a BETWEEN test.
    #[must_use]
    pub fn between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Self {
        Self::new(ExprKind::Between {
            expr: Box::new(self),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            negated: false,
        })
    }

    /// Creates a NOT BETWEEN test.
    #[must_use]
    pub fn not_between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Self {
        Self::new(ExprKind::Between {
            expr: Box::new(self),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            negated: true,
        })
    }

    /// Wraps the expression in parentheses.
    #[must_use]
    pub fn paren(self) -> Self {
        Self::new(ExprKind::Paren(Box::new(self)))
    }

    /// Negates the expression with NOT.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::new(ExprKind::Not(Box::new(self)))
    }
}

impl ToSql for Expr {
    fn to_sql(&self, ctx: &mut RenderContext) -> Result<String, SyntaxError> {
        // An expression exported by an in-scope subquery renders as the alias
        // it is exported under, not as its definition.
        let exported = ctx.resolve_alias(self).map(String::from);
        if let Some(name) = exported {
            return Ok(name);
        }
        match &self.kind {
            ExprKind::Column { table, name } => Ok(match table {
                Some(table) => format!(
                    "{}.{}",
                    ctx.dialect().quote_identifier(table),
                    ctx.dialect().quote_identifier(name)
                ),
                None => ctx.dialect().quote_identifier(name),
            }),
            ExprKind::Literal(value) => Ok(ctx.add_parameter(value.clone())),
            ExprKind::Function {
                name,
                distinct,
                args,
            } => {
                if args.is_empty() {
                    return Err(SyntaxError::EmptyFunctionCall {
                        function: name.clone(),
                        scope: ctx.scope_path(),
                    });
                }
                let mut rendered = Vec::with_capacity(args.len());
                for arg in args {
                    rendered.push(arg.to_sql(ctx)?);
                }
                let keyword = if *distinct { "DISTINCT " } else { "" };
                Ok(format!("{name}({keyword}{})", rendered.join(", ")))
            }
            ExprKind::Binary { left, op, right } => {
                let left = left.to_sql(ctx)?;
                let right = right.to_sql(ctx)?;
                Ok(format!("{left} {} {right}", op.as_str()))
            }
            ExprKind::Not(operand) => Ok(format!("NOT {}", operand.to_sql(ctx)?)),
            ExprKind::IsNull { expr, negated } => {
                let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
                Ok(format!("{} {keyword}", expr.to_sql(ctx)?))
            }
            ExprKind::In {
                expr,
                list,
                negated,
            } => {
                let keyword = if *negated { "NOT IN" } else { "IN" };
                let target = expr.to_sql(ctx)?;
                let mut rendered = Vec::with_capacity(list.len());
                for item in list {
                    rendered.push(item.to_sql(ctx)?);
                }
                Ok(format!("{target} {keyword} ({})", rendered.join(", ")))
            }
            ExprKind::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let keyword = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                let target = expr.to_sql(ctx)?;
                let low = low.to_sql(ctx)?;
                let high = high.to_sql(ctx)?;
                Ok(format!("{target} {keyword} {low} AND {high}"))
            }
            ExprKind::Paren(inner) => Ok(format!("({})", inner.to_sql(ctx)?)),
            ExprKind::Raw(sql) => Ok(sql.clone()),
            ExprKind::Wildcard { table } => Ok(match table {
                Some(table) => format!("{}.*", ctx.dialect().quote_identifier(table)),
                None => String::from("*"),
            }),
            ExprKind::Subquery(select) => {
                ctx.enter(select.get_alias());
                let sql = select.to_sql(ctx);
                ctx.exit();
                Ok(format!("({})", sql?))
            }
        }
    }

    fn get_alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

impl From<SqlValue> for Expr {
    fn from(value: SqlValue) -> Self {
        lit(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        lit(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        lit(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        lit(value)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        lit(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        lit(value)
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        lit(value)
    }
}

impl From<Select> for Expr {
    /// Embeds a SELECT as a scalar subquery; its alias carries over as the
    /// projection alias.
    fn from(select: Select) -> Self {
        let alias = select.get_alias().map(String::from);
        Self {
            kind: ExprKind::Subquery(Box::new(select)),
            alias,
        }
    }
}
