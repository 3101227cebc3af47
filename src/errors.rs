//! IBSTORE-prefixed error types with structured error codes.

use thiserror::Error;

/// Shared `Result` alias for the crate.
pub type Result<T> = std::result::Result<T, IbStoreError>;

/// Top-level error type for the InfiniBand port history & event engine.
#[derive(Debug, Error)]
pub enum IbStoreError {
    /// Schema creation or migration failed at startup (§4.2).
    #[error("[IBSTORE-1001] schema initialization failed: {details}")]
    SchemaInit {
        /// Underlying failure description.
        details: String,
    },

    /// A metadata cell held a value that could not be parsed back into its expected type.
    #[error("[IBSTORE-1002] corrupt metadata cell {key}: {details}")]
    CorruptMetadata {
        /// Metadata key whose value was unreadable.
        key: String,
        /// Underlying failure description.
        details: String,
    },

    /// A SQL statement failed outside of a transaction rollback path.
    #[error("[IBSTORE-2001] SQL failure in {context}: {details}")]
    Sql {
        /// Name of the operation that issued the failing statement.
        context: &'static str,
        /// Underlying failure description.
        details: String,
    },

    /// A transaction was rolled back after a statement inside it failed.
    #[error("[IBSTORE-2002] row rollback in {context}: {details}")]
    Transaction {
        /// Name of the operation whose transaction rolled back.
        context: &'static str,
        /// Underlying failure description.
        details: String,
    },

    /// Caller-supplied input failed validation before reaching the database.
    #[error("[IBSTORE-3001] validation failure: {details}")]
    Validation {
        /// Description of what failed validation.
        details: String,
    },

    /// A per-call deadline (§5) elapsed before the database call completed.
    #[error("[IBSTORE-3002] deadline exceeded after {elapsed_ms} ms in {context}")]
    Timeout {
        /// Name of the operation that timed out.
        context: &'static str,
        /// Configured deadline that elapsed, in milliseconds.
        elapsed_ms: u64,
    },

    /// The root cancellation scope fired while a database call was in flight.
    #[error("[IBSTORE-3003] operation cancelled in {context}")]
    Cancelled {
        /// Name of the operation that was cancelled.
        context: &'static str,
    },
}

impl IbStoreError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SchemaInit { .. } => "IBSTORE-1001",
            Self::CorruptMetadata { .. } => "IBSTORE-1002",
            Self::Sql { .. } => "IBSTORE-2001",
            Self::Transaction { .. } => "IBSTORE-2002",
            Self::Validation { .. } => "IBSTORE-3001",
            Self::Timeout { .. } => "IBSTORE-3002",
            Self::Cancelled { .. } => "IBSTORE-3003",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Sql { .. } | Self::Transaction { .. } | Self::Timeout { .. })
    }

    /// Whether this error reflects a shutdown/cancellation rather than a real failure.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub(crate) fn sql(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Sql {
            context,
            details: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for IbStoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql {
            context: "rusqlite",
            details: value.to_string(),
        }
    }
}
