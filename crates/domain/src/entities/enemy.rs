//! Combat participants on the enemy side, and the per-fight combat state.

use serde::{Deserialize, Serialize};

use crate::value_objects::DiceFormula;
use questline_domain::EnemyId;

/// A spawned enemy.
///
/// Plain data: the combat resolver hands back updated copies each round and
/// the session replaces its list wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEnemy {
    pub id: EnemyId,
    /// Display name, numbered when the same type appears more than once ("Goblin 2")
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub armor_class: i32,
    pub attack_bonus: i32,
    pub damage: DiceFormula,
    pub xp_reward: u32,
}

impl CombatEnemy {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

/// Combat bookkeeping that survives between rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    pub active: bool,
    pub round: u32,
    pub player_initiative: i32,
    pub enemy_initiative: i32,
}

impl CombatState {
    /// Fresh combat with both initiative rolls, before round 1.
    pub fn start(player_initiative: i32, enemy_initiative: i32) -> Self {
        Self {
            active: true,
            round: 0,
            player_initiative,
            enemy_initiative,
        }
    }

    /// Ties go to the player.
    pub fn player_acts_first(&self) -> bool {
        self.player_initiative >= self.enemy_initiative
    }

    /// Copy advanced to the next round.
    pub fn next_round(&self) -> Self {
        Self {
            round: self.round + 1,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initiative_ties_favor_the_player() {
        assert!(CombatState::start(3, 3).player_acts_first());
        assert!(CombatState::start(5, 2).player_acts_first());
        assert!(!CombatState::start(2, 6).player_acts_first());
    }

    #[test]
    fn next_round_only_advances_the_counter() {
        let state = CombatState::start(4, 1);
        let next = state.next_round().next_round();
        assert_eq!(next.round, 2);
        assert!(next.active);
        assert_eq!(next.player_initiative, 4);
    }

    #[test]
    fn default_state_is_inactive() {
        assert!(!CombatState::default().active);
    }
}
