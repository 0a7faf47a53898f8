//! Errors surfaced by player-facing use cases.

use questline_domain::{BestiaryError, DiceParseError, DomainError};

use crate::infrastructure::ports::{LlmError, RepoError};
use crate::use_cases::cost_guard::LimitReason;

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    /// The session cannot accept this action (e.g. it has ended).
    #[error("Game state error: {0}")]
    GameState(String),
    #[error("Invalid action: {0}")]
    InvalidAction(String),
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(#[from] DiceParseError),
    /// Bestiary miss with no fallback stats to build from.
    #[error(transparent)]
    UnknownEnemyType(#[from] BestiaryError),
    #[error("Narrator budget exceeded: {reason}")]
    BudgetExceeded { reason: LimitReason },
    #[error("Narrator unavailable: {message}")]
    NarratorUnavailable { retryable: bool, message: String },
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl ActionError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the caller may reasonably submit the same action again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NarratorUnavailable { retryable, .. } => *retryable,
            Self::Repo(RepoError::Database { .. }) => true,
            _ => false,
        }
    }
}

impl From<LlmError> for ActionError {
    fn from(error: LlmError) -> Self {
        Self::NarratorUnavailable {
            retryable: error.is_retryable(),
            message: error.to_string(),
        }
    }
}

impl From<DomainError> for ActionError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation(msg) => Self::InvalidAction(msg),
            other => Self::GameState(other.to_string()),
        }
    }
}
