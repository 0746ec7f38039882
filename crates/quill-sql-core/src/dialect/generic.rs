//! Generic SQL dialect.

use super::Dialect;

/// A generic dialect using ANSI SQL defaults: `?` placeholders, double-quoted
/// identifiers, FROM optional.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDialect;

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }
}
