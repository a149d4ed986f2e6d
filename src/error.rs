//! Error types shared across the ledger, dispatcher and configuration layers.

use thiserror::Error;

/// Failure talking to the ledger row store.
///
/// These never reach a caller as-is: the dispatcher logs them and collapses
/// them into a zero balance or a fixed failure message.
#[derive(Debug, Error)]
pub(crate) enum StorageError {
    /// The HTTP request to the store could not be completed.
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned {status} for {table}: {body}")]
    Status {
        /// Table the request targeted.
        table: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the store.
        body: String,
    },

    /// A row came back without an `amount` value.
    #[error("row in {table} has no amount")]
    MissingAmount {
        /// Table holding the offending row.
        table: &'static str,
    },

    /// The store refused a value it could not cast to the column type.
    #[error("{table} rejected {column} value {value}")]
    Rejected {
        /// Table the insert targeted.
        table: &'static str,
        /// Column holding the bad value.
        column: &'static str,
        /// The value as sent.
        value: String,
    },

    /// The store is unavailable (used by the in-memory store when closed).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure dispatching a tool call, mapped to a caller-facing status.
#[derive(Debug, Error)]
pub(crate) enum DispatchError {
    /// No tool with this name exists in the catalog.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The bearer token did not match the configured secret.
    #[error("Invalid bearer token")]
    Unauthorized,

    /// Anything else; the detail is logged, never shown to the caller.
    #[error("Internal server error")]
    Internal,
}

/// Invalid start-up configuration.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// A setting required by the selected store was not provided.
    #[error("{0} is required when using the supabase store")]
    MissingStoreSetting(&'static str),

    /// The bearer secret was empty, which would let an empty header through.
    #[error("bearer token must not be empty")]
    EmptySecret,

    /// The HTTP client for the store could not be built.
    #[error("failed to build store client: {0}")]
    Client(#[from] reqwest::Error),
}

#[cfg(test)]
#[allow(
    clippy::missing_docs_in_private_items,
    reason = "test code does not need docs"
)]
mod tests {
    use super::{ConfigError, DispatchError, StorageError};

    #[test]
    fn unknown_tool_names_the_tool_verbatim() {
        let err = DispatchError::UnknownTool("nonexistent_tool".to_owned());
        assert_eq!(err.to_string(), "Unknown tool: nonexistent_tool");
    }

    #[test]
    fn unauthorized_message_is_fixed() {
        assert_eq!(DispatchError::Unauthorized.to_string(), "Invalid bearer token");
    }

    #[test]
    fn internal_error_hides_detail() {
        assert_eq!(DispatchError::Internal.to_string(), "Internal server error");
    }

    #[test]
    fn storage_status_includes_table_and_body() {
        let err = StorageError::Status {
            table: "purchases",
            status: 503,
            body: "down".to_owned(),
        };
        assert_eq!(err.to_string(), "store returned 503 for purchases: down");
    }

    #[test]
    fn rejected_value_names_column() {
        let err = StorageError::Rejected {
            table: "purchases",
            column: "amount",
            value: "\"ten\"".to_owned(),
        };
        assert_eq!(err.to_string(), "purchases rejected amount value \"ten\"");
    }

    #[test]
    fn missing_store_setting_names_variable() {
        let err = ConfigError::MissingStoreSetting("SUPABASE_URL");
        assert!(err.to_string().starts_with("SUPABASE_URL is required"));
    }
}
