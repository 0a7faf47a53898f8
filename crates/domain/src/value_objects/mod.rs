//! Value objects - Immutable objects defined by their attributes

mod ability;
pub mod dice;
mod history;
mod item_type;
mod state_changes;

pub use ability::{ability_modifier, AbilityScores};
pub use dice::{AttackRoll, DiceFormula, DiceParseError, DiceRollResult};
pub use history::{HistoryEntry, HistoryRole, MessageHistory};
pub use item_type::ItemType;
pub use state_changes::{CommerceBuy, FlagValue, StateChanges};
