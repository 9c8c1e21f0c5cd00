// crates/db/src/schema.rs
use std::fmt;
use std::str::FromStr;

use crate::DbError;

/// Schema used when none is configured.
pub const DEFAULT_SCHEMA: &str = "up_gestaointeligente";

/// Postgres limit on identifier length, in bytes.
const MAX_IDENTIFIER_LEN: usize = 63;

/// A validated Postgres schema name.
///
/// Only ASCII letters, digits and `_` are accepted, and the name may not start
/// with a digit. That keeps the name safe to quote into SQL text, which is the
/// only way to parameterize a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaName(String);

impl SchemaName {
    pub fn parse(name: &str) -> Result<Self, DbError> {
        let valid = !name.is_empty()
            && name.len() <= MAX_IDENTIFIER_LEN
            && !name.starts_with(|c: char| c.is_ascii_digit())
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(Self(name.to_string()))
        } else {
            Err(DbError::InvalidSchema(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Quoted, schema-qualified relation name.
    pub fn qualify(&self, table: &str) -> String {
        format!("\"{}\".\"{}\"", self.0, table)
    }
}

impl Default for SchemaName {
    fn default() -> Self {
        Self(DEFAULT_SCHEMA.to_string())
    }
}

impl FromStr for SchemaName {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
