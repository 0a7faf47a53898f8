//! Use cases - User story orchestration.
//!
//! Each module covers one thing a player can do, or one rule the engine
//! enforces around the narrator.

pub mod action;
pub mod commerce;
pub mod cost_guard;
pub mod dice;
pub mod narration;
pub mod session;

// Re-export main types
pub use action::{ActionError, ActionResponse, EnemyView, ProcessAction};
pub use cost_guard::{CostGuard, DailyUsage, LimitCheck, LimitReason, UsageLimits};
pub use dice::RollDice;
pub use session::{GetSessionView, NewCharacter, SessionStarted, SessionView, StartSession};
