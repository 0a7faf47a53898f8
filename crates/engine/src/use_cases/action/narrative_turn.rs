//! Free-form actions: the narrator responds, the engine decides what sticks.

use std::collections::HashMap;

use questline_domain::game_systems::bestiary::{self, normalize_type};
use questline_domain::value_objects::dice::roll_initiative;
use questline_domain::{
    BestiaryError, CharacterState, CombatEnemy, CombatState, DiceFormula, EnemyId, GameSession,
};

use super::{ActionError, ProcessAction, TurnOutcome};
use crate::use_cases::commerce::apply_narrator_changes;
use crate::use_cases::narration::prompt::{build_context, narrator_system_prompt};
use crate::use_cases::narration::{parse_response, DiceRollEntry, EnemyDeclaration};

const FALLBACK_AC: i32 = 10;
const FALLBACK_ATTACK_BONUS: i32 = 2;
const FALLBACK_DAMAGE: DiceFormula = DiceFormula {
    dice_count: 1,
    die_size: 4,
    modifier: 0,
};
const MIN_FALLBACK_XP: u32 = 10;

const MAX_FALLBACK_HP: i32 = 1000;
const MAX_FALLBACK_XP: u32 = 100_000;
const FALLBACK_AC_RANGE: (i32, i32) = (0, 30);
const FALLBACK_ATTACK_BONUS_RANGE: (i32, i32) = (-10, 20);

impl ProcessAction {
    pub(super) async fn narrative_turn(
        &self,
        session: &mut GameSession,
        mut character: CharacterState,
        action: &str,
    ) -> Result<TurnOutcome, ActionError> {
        let context = build_context(&character, session, self.history_limit);
        let reply = self
            .narrate(session.id(), &narrator_system_prompt(), context, action)
            .await?;
        let parsed = parse_response(&reply.text);
        let mut dice_rolls = parsed.dice_rolls;

        if !parsed.enemies.is_empty() && !session.combat().active {
            let mut rng = |min, max| self.random.gen_range(min, max);
            let enemies = spawn_declared(&parsed.enemies, &mut rng);
            if enemies.is_empty() {
                tracing::warn!(
                    session_id = %session.id(),
                    declared = parsed.enemies.len(),
                    "No declared enemy could be spawned, staying out of combat"
                );
            } else {
                let player_initiative = roll_initiative(&mut rng);
                let enemy_initiative = roll_initiative(&mut rng);
                dice_rolls.push(DiceRollEntry::initiative(
                    format!("{} initiative", character.name()),
                    player_initiative,
                ));
                dice_rolls.push(DiceRollEntry::initiative("Enemy initiative", enemy_initiative));
                tracing::info!(
                    session_id = %session.id(),
                    enemies = ?enemies.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
                    player_initiative,
                    enemy_initiative,
                    "Combat started"
                );
                session.begin_combat(
                    CombatState::start(player_initiative, enemy_initiative),
                    enemies,
                )?;
            }
        }

        let authority = apply_narrator_changes(&mut character, &parsed.state_changes, action);
        if let Some(location) = &authority.applied.location {
            session.set_location(location.as_str());
        }
        session.merge_world_state(&authority.applied.world_state);
        session.set_economy_note(authority.economy_note());

        Ok(TurnOutcome {
            character,
            narrative: parsed.narrative,
            state_changes: authority.applied,
            dice_rolls,
            transactions: authority.transactions,
            combat_round: None,
        })
    }
}

/// Turn narrator enemy declarations into combatants.
///
/// Known types spawn from the bestiary and ignore narrator stats. Unknown
/// types need at least an HP value; the rest falls back to AC 10, +2 to hit,
/// 1d4 damage and `max(10, hp * 2)` XP. Declarations sharing a type are
/// numbered in order of appearance.
fn spawn_declared<R>(declarations: &[EnemyDeclaration], rng: &mut R) -> Vec<CombatEnemy>
where
    R: FnMut(i32, i32) -> i32,
{
    let keyed: Vec<(String, &EnemyDeclaration)> = declarations
        .iter()
        .map(|d| {
            let key = bestiary::lookup_declared(&d.name)
                .map(|t| t.key.to_string())
                .unwrap_or_else(|| normalize_type(&d.name));
            (key, d)
        })
        .collect();

    let mut totals: HashMap<&str, usize> = HashMap::new();
    let mut group_names: HashMap<&str, &str> = HashMap::new();
    for (key, declaration) in &keyed {
        *totals.entry(key.as_str()).or_default() += 1;
        group_names
            .entry(key.as_str())
            .or_insert_with(|| declaration.name.trim());
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut enemies = Vec::new();
    for (key, declaration) in &keyed {
        let index = if totals.get(key.as_str()).copied().unwrap_or(0) > 1 {
            let n = seen.entry(key.as_str()).or_default();
            *n += 1;
            Some(*n)
        } else {
            None
        };

        let group_name = group_names
            .get(key.as_str())
            .copied()
            .unwrap_or_else(|| declaration.name.trim());
        match spawn_one(declaration, group_name, index, rng) {
            Ok(enemy) => enemies.push(enemy),
            Err(e) => tracing::warn!(error = %e, "Skipping declared enemy"),
        }
    }
    enemies
}

fn spawn_one<R>(
    declaration: &EnemyDeclaration,
    group_name: &str,
    index: Option<usize>,
    rng: &mut R,
) -> Result<CombatEnemy, BestiaryError>
where
    R: FnMut(i32, i32) -> i32,
{
    if let Some(template) = bestiary::lookup_declared(&declaration.name) {
        return Ok(template.spawn(index, rng));
    }

    let name = declaration.name.trim();
    let hp = declaration
        .hp
        .ok_or_else(|| BestiaryError::UnknownEnemyType(name.to_string()))?
        .clamp(1, MAX_FALLBACK_HP);

    let damage = match declaration.damage.as_deref() {
        None => FALLBACK_DAMAGE,
        Some(raw) => DiceFormula::parse(raw).unwrap_or_else(|e| {
            tracing::warn!(
                enemy = name,
                damage = raw,
                error = %e,
                "Bad enemy damage dice, using 1d4"
            );
            FALLBACK_DAMAGE
        }),
    };

    let (min_ac, max_ac) = FALLBACK_AC_RANGE;
    let (min_bonus, max_bonus) = FALLBACK_ATTACK_BONUS_RANGE;
    let hp_xp = u32::try_from(hp).unwrap_or(0).saturating_mul(2);
    Ok(CombatEnemy {
        id: EnemyId::new(),
        name: match index {
            Some(i) => format!("{} {}", group_name, i),
            None => name.to_string(),
        },
        hp,
        max_hp: hp,
        armor_class: declaration.ac.unwrap_or(FALLBACK_AC).clamp(min_ac, max_ac),
        attack_bonus: declaration
            .attack_bonus
            .unwrap_or(FALLBACK_ATTACK_BONUS)
            .clamp(min_bonus, max_bonus),
        damage,
        xp_reward: declaration
            .xp
            .unwrap_or(hp_xp.max(MIN_FALLBACK_XP))
            .min(MAX_FALLBACK_XP),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use questline_domain::game_systems::combat::resolve_enemy_attack;

    fn low(min: i32, _max: i32) -> i32 {
        min
    }

    fn high(_min: i32, max: i32) -> i32 {
        max
    }

    fn declared(name: &str, hp: Option<i32>) -> EnemyDeclaration {
        EnemyDeclaration {
            hp,
            ..EnemyDeclaration::named(name)
        }
    }

    #[test]
    fn known_types_spawn_from_the_bestiary() {
        let enemies = spawn_declared(&[declared("Goblin", Some(99))], &mut low);

        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].name, "Goblin");
        assert_eq!(enemies[0].armor_class, 12);
        assert_eq!(enemies[0].xp_reward, 10);
        assert!(enemies[0].hp < 99);
    }

    #[test]
    fn duplicates_are_numbered_and_singles_are_not() {
        let enemies = spawn_declared(
            &[
                declared("goblin", None),
                declared("orc", None),
                declared("Goblin 2", None),
            ],
            &mut low,
        );

        let names: Vec<&str> = enemies.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Goblin 1", "Orc", "Goblin 2"]);
    }

    #[test]
    fn unknown_type_uses_narrator_stats_with_fallbacks() {
        let enemies = spawn_declared(&[declared("Cave Troll Shaman", Some(12))], &mut low);

        let shaman = &enemies[0];
        assert_eq!(shaman.name, "Cave Troll Shaman");
        assert_eq!(shaman.hp, 12);
        assert_eq!(shaman.armor_class, 10);
        assert_eq!(shaman.attack_bonus, 2);
        assert_eq!(shaman.damage.to_string(), "1d4");
        assert_eq!(shaman.xp_reward, 24);
    }

    #[test]
    fn fallback_xp_has_a_floor() {
        let enemies = spawn_declared(&[declared("Angry Goose", Some(2))], &mut low);
        assert_eq!(enemies[0].xp_reward, 10);
    }

    #[test]
    fn explicit_narrator_stats_are_used_for_unknown_types() {
        let declaration = EnemyDeclaration {
            name: "Bog Witch".to_string(),
            hp: Some(15),
            ac: Some(14),
            attack_bonus: Some(5),
            damage: Some("2d6+1".to_string()),
            xp: Some(120),
        };

        let enemies = spawn_declared(&[declaration], &mut low);

        assert_eq!(enemies[0].armor_class, 14);
        assert_eq!(enemies[0].attack_bonus, 5);
        assert_eq!(enemies[0].damage.to_string(), "2d6+1");
        assert_eq!(enemies[0].xp_reward, 120);
    }

    #[test]
    fn invalid_damage_falls_back_to_d4() {
        let declaration = EnemyDeclaration {
            damage: Some("a lot".to_string()),
            ..declared("Mud Golem", Some(20))
        };

        let enemies = spawn_declared(&[declaration], &mut low);

        assert_eq!(enemies[0].damage.to_string(), "1d4");
    }

    #[test]
    fn unknown_type_without_hp_is_skipped() {
        let enemies = spawn_declared(
            &[declared("Shadow of Doubt", None), declared("wolf", None)],
            &mut low,
        );

        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].name, "Wolf");
    }

    #[test]
    fn fallback_duplicates_are_numbered_too() {
        let enemies = spawn_declared(
            &[declared("Cultist", Some(5)), declared("cultist", Some(5))],
            &mut low,
        );

        let names: Vec<&str> = enemies.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Cultist 1", "Cultist 2"]);
    }

    #[test]
    fn extreme_narrator_stats_are_clamped_and_safe_to_fight() {
        let declaration = EnemyDeclaration {
            name: "Void Tyrant".to_string(),
            hp: Some(i32::MAX),
            ac: Some(i32::MIN),
            attack_bonus: Some(i32::MAX),
            damage: Some("1d4+2147483647".to_string()),
            xp: Some(u32::MAX),
        };

        let enemies = spawn_declared(&[declaration], &mut low);
        let tyrant = &enemies[0];
        assert_eq!(tyrant.hp, 1000);
        assert_eq!(tyrant.armor_class, 0);
        assert_eq!(tyrant.attack_bonus, 20);
        assert_eq!(tyrant.damage.to_string(), "1d4");
        assert_eq!(tyrant.xp_reward, 100_000);

        let character = crate::test_fixtures::fighter(12);
        let attack = resolve_enemy_attack(tyrant, &character, &mut high);
        assert!(attack.hit);
        assert_eq!(attack.attack_total, 40);
        assert_eq!(attack.defender_hp_after, 8);
    }
}
