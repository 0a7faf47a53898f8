//! GameSession aggregate - one play-through of one character
//!
//! # State Transitions
//!
//! ```text
//! NoCombat -> InCombat   (enemies declared)
//! InCombat -> NoCombat   (all enemies dead)
//! NoCombat -> Ended      (player HP reaches 0)
//! InCombat -> Ended      (player HP reaches 0)
//! ```
//!
//! `Ended` is terminal.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{CombatEnemy, CombatState};
use crate::error::DomainError;
use crate::value_objects::{FlagValue, HistoryEntry, MessageHistory};
use questline_domain::{CharacterId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    CharacterDeath,
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CharacterDeath => write!(f, "character_death"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Ended { reason: EndReason },
}

/// Derived view of where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NoCombat,
    InCombat,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    id: SessionId,
    user_id: String,
    character_id: CharacterId,
    status: SessionStatus,
    combat: CombatState,
    enemies: Vec<CombatEnemy>,
    location: String,
    #[serde(default)]
    world_state: BTreeMap<String, FlagValue>,
    #[serde(default)]
    history: MessageHistory,
    /// Outcome of the last trade, surfaced to the narrator on the next turn
    #[serde(default)]
    economy_note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GameSession {
    pub fn new(
        user_id: impl Into<String>,
        character_id: CharacterId,
        location: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            user_id: user_id.into(),
            character_id,
            status: SessionStatus::Active,
            combat: CombatState::default(),
            enemies: Vec::new(),
            location: location.into(),
            world_state: BTreeMap::new(),
            history: MessageHistory::new(),
            economy_note: None,
            created_at: now,
            updated_at: now,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[inline]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[inline]
    pub fn character_id(&self) -> CharacterId {
        self.character_id
    }

    #[inline]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[inline]
    pub fn combat(&self) -> CombatState {
        self.combat
    }

    #[inline]
    pub fn enemies(&self) -> &[CombatEnemy] {
        &self.enemies
    }

    #[inline]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[inline]
    pub fn world_state(&self) -> &BTreeMap<String, FlagValue> {
        &self.world_state
    }

    #[inline]
    pub fn history(&self) -> &MessageHistory {
        &self.history
    }

    #[inline]
    pub fn economy_note(&self) -> Option<&str> {
        self.economy_note.as_deref()
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.status, SessionStatus::Ended { .. })
    }

    pub fn phase(&self) -> SessionPhase {
        match (self.status, self.combat.active) {
            (SessionStatus::Ended { .. }, _) => SessionPhase::Ended,
            (SessionStatus::Active, true) => SessionPhase::InCombat,
            (SessionStatus::Active, false) => SessionPhase::NoCombat,
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// `NoCombat -> InCombat`.
    pub fn begin_combat(
        &mut self,
        combat: CombatState,
        enemies: Vec<CombatEnemy>,
    ) -> Result<(), DomainError> {
        match self.phase() {
            SessionPhase::NoCombat if !enemies.is_empty() => {
                self.combat = CombatState {
                    active: true,
                    ..combat
                };
                self.enemies = enemies;
                Ok(())
            }
            SessionPhase::NoCombat => Err(DomainError::invalid_state_transition(
                "cannot begin combat without enemies",
            )),
            phase => Err(DomainError::invalid_state_transition(format!(
                "cannot begin combat while {:?}",
                phase
            ))),
        }
    }

    /// Store the state after a round that did not end the fight.
    pub fn continue_combat(&mut self, combat: CombatState, enemies: Vec<CombatEnemy>) {
        self.combat = combat;
        self.enemies = enemies;
    }

    /// `InCombat -> NoCombat`. Clears the enemy list and resets combat state.
    pub fn end_combat(&mut self) {
        self.combat = CombatState::default();
        self.enemies.clear();
    }

    /// Terminal transition. Any fight in progress is dropped.
    pub fn end(&mut self, reason: EndReason) {
        self.end_combat();
        self.status = SessionStatus::Ended { reason };
    }

    // =========================================================================
    // Narrative state
    // =========================================================================

    pub fn set_location(&mut self, location: impl Into<String>) {
        let location = location.into();
        if !location.trim().is_empty() {
            self.location = location.trim().to_string();
        }
    }

    pub fn merge_world_state(&mut self, flags: &BTreeMap<String, FlagValue>) {
        for (key, value) in flags {
            self.world_state.insert(key.clone(), value.clone());
        }
    }

    pub fn record_exchange(&mut self, action: &str, narrative: &str, limit: usize) {
        self.history.push(HistoryEntry::player(action), limit);
        self.history.push(HistoryEntry::narrator(narrative), limit);
    }

    pub fn set_economy_note(&mut self, note: Option<String>) {
        self.economy_note = note;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::DiceFormula;
    use crate::EnemyId;

    fn session() -> GameSession {
        GameSession::new("user-1", CharacterId::new(), "The Crossroads Inn", Utc::now())
    }

    fn goblin() -> CombatEnemy {
        CombatEnemy {
            id: EnemyId::new(),
            name: "Goblin".to_string(),
            hp: 4,
            max_hp: 4,
            armor_class: 12,
            attack_bonus: 3,
            damage: DiceFormula::new(1, 6, 0).unwrap(),
            xp_reward: 10,
        }
    }

    #[test]
    fn new_session_is_active_without_combat() {
        let s = session();
        assert_eq!(s.phase(), SessionPhase::NoCombat);
        assert!(!s.is_ended());
        assert!(s.enemies().is_empty());
    }

    #[test]
    fn combat_lifecycle_transitions() {
        let mut s = session();
        s.begin_combat(CombatState::start(4, 2), vec![goblin()]).unwrap();
        assert_eq!(s.phase(), SessionPhase::InCombat);
        assert_eq!(s.enemies().len(), 1);

        assert!(s.begin_combat(CombatState::start(1, 1), vec![goblin()]).is_err());

        s.end_combat();
        assert_eq!(s.phase(), SessionPhase::NoCombat);
        assert!(s.enemies().is_empty());
        assert_eq!(s.combat(), CombatState::default());
    }

    #[test]
    fn begin_combat_requires_enemies() {
        let mut s = session();
        assert!(s.begin_combat(CombatState::start(1, 1), vec![]).is_err());
    }

    #[test]
    fn ended_is_terminal() {
        let mut s = session();
        s.begin_combat(CombatState::start(4, 2), vec![goblin()]).unwrap();
        s.end(EndReason::CharacterDeath);
        assert_eq!(s.phase(), SessionPhase::Ended);
        assert!(!s.combat().active);
        assert!(s.enemies().is_empty());
        s.end_combat();
        assert_eq!(s.phase(), SessionPhase::Ended);
        assert!(s.begin_combat(CombatState::start(4, 2), vec![goblin()]).is_err());
    }

    #[test]
    fn status_serializes_with_reason() {
        let json = serde_json::to_value(SessionStatus::Ended {
            reason: EndReason::CharacterDeath,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "ended", "reason": "character_death"})
        );
    }

    #[test]
    fn blank_location_is_ignored() {
        let mut s = session();
        s.set_location("   ");
        assert_eq!(s.location(), "The Crossroads Inn");
        s.set_location(" Old Mill ");
        assert_eq!(s.location(), "Old Mill");
    }
}
