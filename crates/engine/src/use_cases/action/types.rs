//! What a resolved action hands back to the caller.

use serde::Serialize;

use questline_domain::{
    AttackResult, CharacterState, CombatEnemy, CombatRoundResult, EnemyId, StateChanges,
};

use crate::use_cases::commerce::TransactionOutcome;
use crate::use_cases::narration::DiceRollEntry;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse {
    pub narrative: String,
    /// Deltas as applied to the character, not as proposed by the narrator
    pub state_changes: StateChanges,
    pub dice_rolls: Vec<DiceRollEntry>,
    pub combat_active: bool,
    pub enemies: Vec<EnemyView>,
    pub character: CharacterState,
    pub character_dead: bool,
    pub session_ended: bool,
    pub transactions: Vec<TransactionOutcome>,
    /// Full mechanical detail when this action was a combat round
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combat_round: Option<CombatRoundResult>,
}

/// An enemy as the player sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnemyView {
    pub id: EnemyId,
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub armor_class: i32,
    /// The enemy the player's next attack will hit
    pub targeted: bool,
}

impl EnemyView {
    /// Views in list order; the first living enemy is the target.
    pub fn list(enemies: &[CombatEnemy]) -> Vec<Self> {
        let target = enemies.iter().position(|e| e.is_alive());
        enemies
            .iter()
            .enumerate()
            .map(|(i, e)| Self {
                id: e.id,
                name: e.name.clone(),
                hp: e.hp,
                max_hp: e.max_hp,
                armor_class: e.armor_class,
                targeted: Some(i) == target,
            })
            .collect()
    }
}

impl DiceRollEntry {
    /// Attack roll line, plus a damage line when the attack hit.
    pub fn from_attack(attack: &AttackResult) -> Vec<Self> {
        let mut entries = vec![Self {
            label: attack.describe(),
            notation: format!("1d20{:+}", attack.attack_bonus),
            rolls: vec![attack.natural_roll],
            total: attack.attack_total,
        }];
        if attack.hit {
            entries.push(Self {
                label: format!("{} damage", attack.attacker.name()),
                notation: attack.damage_dice.to_string(),
                rolls: attack.damage_rolls.clone(),
                total: attack.damage,
            });
        }
        entries
    }

    pub fn initiative(label: impl Into<String>, roll: i32) -> Self {
        Self {
            label: label.into(),
            notation: "1d6".to_string(),
            rolls: vec![roll],
            total: roll,
        }
    }
}
