//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Persistence (in-memory today, any partition/sort-key store tomorrow)
//! - The narrator (could swap Ollama -> any OpenAI-compatible service)
//! - Clock/Random (for testing)

mod error;
mod external;
mod store;
mod testing;

// =============================================================================
// Persistence Port
// =============================================================================
pub use store::{KeyValueStore, StoredRecord};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    ChatMessage, FinishReason, LlmPort, LlmRequest, LlmResponse, MessageRole, TokenUsage,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::MockLlmPort;
#[cfg(test)]
pub use store::MockKeyValueStore;
#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::{LlmError, RepoError, UsageError};
