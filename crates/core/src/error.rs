// crates/core/src/error.rs
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a [`LiveStore`](crate::store::LiveStore) implementation.
///
/// The store owns its own driver errors; at this boundary only the failing
/// relation and a rendered cause are kept, plus the SQLSTATE when the backend
/// reported one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("query on {relation} failed: {message}")]
    Query {
        relation: &'static str,
        message: String,
        code: Option<String>,
    },

    #[error("data store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn query(relation: &'static str, message: impl Into<String>) -> Self {
        Self::Query {
            relation,
            message: message.into(),
            code: None,
        }
    }

    /// Relation the failing query targeted, if known.
    pub fn relation(&self) -> Option<&'static str> {
        match self {
            Self::Query { relation, .. } => Some(relation),
            Self::Unavailable(_) => None,
        }
    }
}

/// Errors produced while aggregating live sessions.
#[derive(Debug, Error)]
pub enum LiveError {
    #[error("failed to load active time records: {0}")]
    ActiveRecords(#[source] StoreError),

    #[error("failed to load {lookup}: {source}")]
    Lookup {
        lookup: Lookup,
        #[source]
        source: StoreError,
    },

    #[error("live session aggregation exceeded its {}ms deadline", .0.as_millis())]
    DeadlineExceeded(Duration),
}

impl LiveError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::DeadlineExceeded(_))
    }
}

/// The reference lookups issued after the active-record query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    EstimationRules,
    Members,
    Users,
    Clients,
    Products,
    Tasks,
}

impl Lookup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EstimationRules => "estimation rules",
            Self::Members => "members",
            Self::Users => "users",
            Self::Clients => "clients",
            Self::Products => "products",
            Self::Tasks => "tasks",
        }
    }
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_names_relation() {
        let err = StoreError::query("registro_tempo", "connection reset");
        assert_eq!(
            err.to_string(),
            "query on registro_tempo failed: connection reset"
        );
        assert_eq!(err.relation(), Some("registro_tempo"));
    }

    #[test]
    fn test_lookup_error_message_carries_cause() {
        let err = LiveError::Lookup {
            lookup: Lookup::Clients,
            source: StoreError::query("cp_cliente", "boom"),
        };
        assert_eq!(
            err.to_string(),
            "failed to load clients: query on cp_cliente failed: boom"
        );
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_deadline_message() {
        let err = LiveError::DeadlineExceeded(Duration::from_millis(250));
        assert_eq!(
            err.to_string(),
            "live session aggregation exceeded its 250ms deadline"
        );
        assert!(err.is_timeout());
    }
}
