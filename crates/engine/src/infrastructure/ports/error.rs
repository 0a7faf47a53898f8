//! Error types for port operations.

/// Repository operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Record not found - includes entity type and key for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Store operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    /// Create a NotFound error with entity type and ID context.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// The service could not be reached at all.
    #[error("LLM service unavailable: {0}")]
    Unavailable(String),
}

impl LlmError {
    /// Whether trying the same request again might succeed.
    ///
    /// Auth failures and rejected requests are permanent; network trouble and
    /// garbled responses are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(msg) => !["400", "401", "403", "404", "Invalid"]
                .iter()
                .any(|marker| msg.contains(marker)),
            Self::InvalidResponse(_) | Self::Unavailable(_) => true,
        }
    }
}

/// Failure to record token usage. Never fatal to the action that caused it.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("Failed to record usage for {scope}: {source}")]
    Store {
        scope: String,
        #[source]
        source: RepoError,
    },
}
