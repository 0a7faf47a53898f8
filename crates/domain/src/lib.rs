extern crate self as questline_domain;

pub mod entities;
pub mod error;
pub mod game_systems;
pub mod ids;
pub mod value_objects;

pub use entities::{
    CharacterClass, CharacterState, CombatEnemy, CombatState, EndReason, GameSession,
    InventoryItem, SessionPhase, SessionStatus,
};

pub use error::DomainError;

pub use game_systems::{
    bestiary::{BestiaryError, EnemyTemplate},
    catalog::{ItemTemplate, ResolvedItem},
    combat::{AttackResult, CombatRoundOutcome, CombatRoundResult, Combatant},
    economy::{EconomyError, TradeKind, Transaction},
};

pub use ids::{CharacterId, EnemyId, SessionId};

pub use value_objects::{
    ability_modifier, AbilityScores, AttackRoll, CommerceBuy, DiceFormula, DiceParseError,
    DiceRollResult, FlagValue, HistoryEntry, HistoryRole, ItemType, MessageHistory, StateChanges,
};
