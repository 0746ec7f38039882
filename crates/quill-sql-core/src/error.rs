//! Error types for query building and rendering.

/// Errors raised by a fluent-API call that violated its contract.
///
/// These are programming errors: they are reported at the violating call and
/// are not retryable without changing the calling code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    /// An alias was empty or contained only whitespace.
    #[error("alias must not be empty or blank")]
    BlankAlias,

    /// `project` was called with an empty expression list.
    #[error("projection list must contain at least one expression")]
    EmptyProjectionList,
}

/// Errors raised when a tree cannot be rendered into valid SQL.
///
/// Each variant carries the render-scope path of the offending node, so a
/// failure deep inside a nested query can be traced to the exact fragment.
/// No partial SQL is ever returned alongside one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    /// A SELECT had neither explicit projections nor a wildcard.
    #[error("SELECT has no projections at {scope}")]
    NoProjections {
        /// Render-scope path of the offending SELECT.
        scope: String,
    },

    /// The dialect requires a FROM clause and none was set.
    #[error("dialect '{dialect}' requires a FROM clause at {scope}")]
    MissingFrom {
        /// Name of the dialect that rejected the statement.
        dialect: String,
        /// Render-scope path of the offending SELECT.
        scope: String,
    },

    /// A function call had no arguments.
    #[error("function '{function}' requires at least one argument at {scope}")]
    EmptyFunctionCall {
        /// Name of the function.
        function: String,
        /// Render-scope path of the offending call.
        scope: String,
    },
}

/// Validates an alias at the call that sets it.
pub(crate) fn non_blank(alias: String) -> Result<String, UsageError> {
    if alias.trim().is_empty() {
        Err(UsageError::BlankAlias)
    } else {
        Ok(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank_rejects_whitespace() {
        assert_eq!(non_blank(String::from("  ")), Err(UsageError::BlankAlias));
        assert_eq!(non_blank(String::new()), Err(UsageError::BlankAlias));
        assert_eq!(non_blank(String::from("n")), Ok(String::from("n")));
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = SyntaxError::MissingFrom {
            dialect: String::from("strict"),
            scope: String::from("query/o"),
        };
        assert_eq!(
            err.to_string(),
            "dialect 'strict' requires a FROM clause at query/o"
        );
    }
}
