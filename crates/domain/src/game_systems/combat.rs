//! Combat resolution.
//!
//! Rules:
//!
//! - attack roll is 1d20 + bonus against the defender's AC
//! - natural 1 always misses, natural 20 always hits
//! - damage is floored at 1 on a hit; defender HP is floored at 0
//! - the player hits with STR and weapon dice 1d6; player AC is 10 + DEX
//!
//! Nothing is mutated in place. Each function takes the participants and
//! hands back updated copies for the caller to store.

use serde::{Deserialize, Serialize};

use crate::entities::{CharacterState, CombatEnemy, CombatState};
use crate::value_objects::dice::{roll_attack, AttackRoll};
use crate::value_objects::DiceFormula;
use questline_domain::EnemyId;

/// Weapon dice for player attacks before the STR modifier.
pub const DEFAULT_WEAPON_DAMAGE: DiceFormula = DiceFormula {
    dice_count: 1,
    die_size: 6,
    modifier: 0,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "side", rename_all = "snake_case")]
pub enum Combatant {
    Player { name: String },
    Enemy { id: EnemyId, name: String },
}

impl Combatant {
    pub fn name(&self) -> &str {
        match self {
            Self::Player { name } | Self::Enemy { name, .. } => name,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, Self::Player { .. })
    }

    fn player(character: &CharacterState) -> Self {
        Self::Player {
            name: character.name().to_string(),
        }
    }

    fn enemy(enemy: &CombatEnemy) -> Self {
        Self::Enemy {
            id: enemy.id,
            name: enemy.name.clone(),
        }
    }
}

/// One resolved attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackResult {
    pub attacker: Combatant,
    pub defender: Combatant,
    pub natural_roll: i32,
    pub attack_bonus: i32,
    pub attack_total: i32,
    pub target_ac: i32,
    pub hit: bool,
    pub critical: bool,
    pub fumble: bool,
    /// Damage formula including any ability bonus
    pub damage_dice: DiceFormula,
    pub damage: i32,
    pub damage_rolls: Vec<i32>,
    pub defender_hp_before: i32,
    pub defender_hp_after: i32,
    pub defender_dead: bool,
}

impl AttackResult {
    /// Dice log line, e.g. "Brenna attacks Goblin: 15 + 3 = 18 vs AC 12, hit for 5 [3]".
    pub fn describe(&self) -> String {
        let roll = format!(
            "{} attacks {}: {} {} {} = {} vs AC {}",
            self.attacker.name(),
            self.defender.name(),
            self.natural_roll,
            if self.attack_bonus < 0 { "-" } else { "+" },
            self.attack_bonus.abs(),
            self.attack_total,
            self.target_ac
        );
        let outcome = match (self.hit, self.critical, self.fumble) {
            (false, _, true) => "fumble, miss".to_string(),
            (false, _, false) => "miss".to_string(),
            (true, critical, _) => {
                let rolls: Vec<String> = self.damage_rolls.iter().map(|r| r.to_string()).collect();
                format!(
                    "{}hit for {} [{}]",
                    if critical { "critical " } else { "" },
                    self.damage,
                    rolls.join(", ")
                )
            }
        };
        let death = if self.defender_dead {
            format!(", {} falls", self.defender.name())
        } else {
            String::new()
        };
        format!("{}, {}{}", roll, outcome, death)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRoundResult {
    pub round: u32,
    pub attacks: Vec<AttackResult>,
    pub player_hp: i32,
    pub player_dead: bool,
    pub enemies_remaining: usize,
    pub combat_ended: bool,
    pub xp_gained: u32,
}

/// Round result plus the updated participants.
///
/// `enemies` holds only the survivors.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatRoundOutcome {
    pub result: CombatRoundResult,
    pub character: CharacterState,
    pub enemies: Vec<CombatEnemy>,
}

struct Strike {
    attack: AttackRoll,
    damage: DiceFormula,
    target_ac: i32,
    defender_hp: i32,
}

/// Returns (hit, damage, damage dice, defender HP after).
fn strike<R>(s: Strike, rng: &mut R) -> (bool, i32, Vec<i32>, i32)
where
    R: FnMut(i32, i32) -> i32,
{
    let hit = if s.attack.is_fumble() {
        false
    } else if s.attack.is_critical() {
        true
    } else {
        s.attack.total >= s.target_ac
    };

    if !hit {
        return (false, 0, Vec::new(), s.defender_hp);
    }

    let rolled = s.damage.roll_with(rng);
    let damage = rolled.total.max(1);
    let hp_after = s.defender_hp.saturating_sub(damage).max(0);
    (true, damage, rolled.individual_rolls, hp_after)
}

/// Player attacks one enemy: 1d20 + STR vs enemy AC, 1d6 + STR damage.
pub fn resolve_player_attack<R>(
    character: &CharacterState,
    target: &CombatEnemy,
    rng: &mut R,
) -> AttackResult
where
    R: FnMut(i32, i32) -> i32,
{
    let bonus = character.abilities().str_mod();
    let damage_dice = DEFAULT_WEAPON_DAMAGE.with_bonus(bonus);
    let attack = roll_attack(bonus, rng);
    let (hit, damage, damage_rolls, hp_after) = strike(
        Strike {
            attack,
            damage: damage_dice,
            target_ac: target.armor_class,
            defender_hp: target.hp,
        },
        rng,
    );

    AttackResult {
        attacker: Combatant::player(character),
        defender: Combatant::enemy(target),
        natural_roll: attack.natural,
        attack_bonus: attack.bonus,
        attack_total: attack.total,
        target_ac: target.armor_class,
        hit,
        critical: attack.is_critical(),
        fumble: attack.is_fumble(),
        damage_dice,
        damage,
        damage_rolls,
        defender_hp_before: target.hp,
        defender_hp_after: hp_after,
        defender_dead: hp_after <= 0,
    }
}

/// Enemy attacks the player: 1d20 + attack bonus vs 10 + DEX, enemy damage dice.
pub fn resolve_enemy_attack<R>(
    enemy: &CombatEnemy,
    character: &CharacterState,
    rng: &mut R,
) -> AttackResult
where
    R: FnMut(i32, i32) -> i32,
{
    let attack = roll_attack(enemy.attack_bonus, rng);
    let target_ac = character.armor_class();
    let (hit, damage, damage_rolls, hp_after) = strike(
        Strike {
            attack,
            damage: enemy.damage,
            target_ac,
            defender_hp: character.hp(),
        },
        rng,
    );

    AttackResult {
        attacker: Combatant::enemy(enemy),
        defender: Combatant::player(character),
        natural_roll: attack.natural,
        attack_bonus: attack.bonus,
        attack_total: attack.total,
        target_ac,
        hit,
        critical: attack.is_critical(),
        fumble: attack.is_fumble(),
        damage_dice: enemy.damage,
        damage,
        damage_rolls,
        defender_hp_before: character.hp(),
        defender_hp_after: hp_after,
        defender_dead: hp_after <= 0,
    }
}

/// Resolve one full round.
///
/// `combat.round` is reported as-is; the caller advances it before calling.
/// The player targets the first living enemy. Enemies act in list order and
/// stop as soon as the player drops.
pub fn resolve_combat_round<R>(
    character: CharacterState,
    combat: &CombatState,
    enemies: Vec<CombatEnemy>,
    rng: &mut R,
) -> CombatRoundOutcome
where
    R: FnMut(i32, i32) -> i32,
{
    let mut round = RoundState {
        character,
        enemies,
        attacks: Vec::new(),
        xp_gained: 0,
    };

    if combat.player_acts_first() {
        round.player_turn(rng);
        round.enemy_turns(rng);
    } else {
        round.enemy_turns(rng);
        round.player_turn(rng);
    }

    round.finish(combat.round)
}

struct RoundState {
    character: CharacterState,
    enemies: Vec<CombatEnemy>,
    attacks: Vec<AttackResult>,
    xp_gained: u32,
}

impl RoundState {
    fn player_turn<R>(&mut self, rng: &mut R)
    where
        R: FnMut(i32, i32) -> i32,
    {
        if self.character.is_dead() {
            return;
        }
        let Some(target) = self.enemies.iter_mut().find(|e| e.is_alive()) else {
            return;
        };
        let result = resolve_player_attack(&self.character, target, rng);
        target.hp = result.defender_hp_after;
        if result.defender_dead {
            self.xp_gained = self.xp_gained.saturating_add(target.xp_reward);
        }
        self.attacks.push(result);
    }

    fn enemy_turns<R>(&mut self, rng: &mut R)
    where
        R: FnMut(i32, i32) -> i32,
    {
        for enemy in self.enemies.iter().filter(|e| e.is_alive()) {
            if self.character.is_dead() {
                break;
            }
            let result = resolve_enemy_attack(enemy, &self.character, rng);
            self.character.set_hp(result.defender_hp_after);
            self.attacks.push(result);
        }
    }

    fn finish(self, round: u32) -> CombatRoundOutcome {
        let survivors: Vec<CombatEnemy> =
            self.enemies.into_iter().filter(|e| e.is_alive()).collect();
        let player_dead = self.character.is_dead();
        let result = CombatRoundResult {
            round,
            attacks: self.attacks,
            player_hp: self.character.hp(),
            player_dead,
            enemies_remaining: survivors.len(),
            combat_ended: player_dead || survivors.is_empty(),
            xp_gained: self.xp_gained,
        };
        CombatRoundOutcome {
            result,
            character: self.character,
            enemies: survivors,
        }
    }
}
