//! Domain entities - Core business objects with identity

mod character;
mod enemy;
mod session;

pub use character::{CharacterClass, CharacterState, InventoryItem};
pub use enemy::{CombatEnemy, CombatState};
pub use session::{EndReason, GameSession, SessionPhase, SessionStatus};
