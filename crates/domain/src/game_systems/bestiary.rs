//! Static enemy templates.
//!
//! Lookups are keyed by a normalized type name: lower-cased, trimmed, with
//! underscores, hyphens and repeated whitespace collapsed to single spaces.

use std::collections::HashMap;

use thiserror::Error;

use crate::entities::CombatEnemy;
use crate::value_objects::DiceFormula;
use questline_domain::EnemyId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BestiaryError {
    #[error("Unknown enemy type: {0}")]
    UnknownEnemyType(String),
}

/// Stat line every spawn of a type is rolled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub hit_dice: DiceFormula,
    pub armor_class: i32,
    pub attack_bonus: i32,
    pub damage: DiceFormula,
    pub xp_reward: u32,
}

const fn dice(dice_count: u32, die_size: u32, modifier: i32) -> DiceFormula {
    DiceFormula {
        dice_count,
        die_size,
        modifier,
    }
}

static TEMPLATES: [EnemyTemplate; 10] = [
    EnemyTemplate {
        key: "goblin",
        name: "Goblin",
        hit_dice: dice(2, 4, 0),
        armor_class: 12,
        attack_bonus: 3,
        damage: dice(1, 6, 0),
        xp_reward: 10,
    },
    EnemyTemplate {
        key: "orc",
        name: "Orc",
        hit_dice: dice(2, 8, 2),
        armor_class: 13,
        attack_bonus: 4,
        damage: dice(1, 8, 1),
        xp_reward: 25,
    },
    EnemyTemplate {
        key: "wolf",
        name: "Wolf",
        hit_dice: dice(2, 6, 0),
        armor_class: 12,
        attack_bonus: 3,
        damage: dice(1, 6, 1),
        xp_reward: 15,
    },
    EnemyTemplate {
        key: "skeleton",
        name: "Skeleton",
        hit_dice: dice(2, 6, 2),
        armor_class: 13,
        attack_bonus: 3,
        damage: dice(1, 6, 0),
        xp_reward: 15,
    },
    EnemyTemplate {
        key: "bandit",
        name: "Bandit",
        hit_dice: dice(2, 6, 1),
        armor_class: 12,
        attack_bonus: 3,
        damage: dice(1, 6, 0),
        xp_reward: 15,
    },
    EnemyTemplate {
        key: "giant rat",
        name: "Giant Rat",
        hit_dice: dice(1, 4, 1),
        armor_class: 10,
        attack_bonus: 2,
        damage: dice(1, 4, 0),
        xp_reward: 5,
    },
    EnemyTemplate {
        key: "giant spider",
        name: "Giant Spider",
        hit_dice: dice(3, 8, 0),
        armor_class: 13,
        attack_bonus: 4,
        damage: dice(1, 8, 0),
        xp_reward: 40,
    },
    EnemyTemplate {
        key: "zombie",
        name: "Zombie",
        hit_dice: dice(3, 8, 0),
        armor_class: 8,
        attack_bonus: 2,
        damage: dice(1, 6, 1),
        xp_reward: 20,
    },
    EnemyTemplate {
        key: "kobold",
        name: "Kobold",
        hit_dice: dice(2, 4, -1),
        armor_class: 11,
        attack_bonus: 2,
        damage: dice(1, 4, 0),
        xp_reward: 8,
    },
    EnemyTemplate {
        key: "troll",
        name: "Troll",
        hit_dice: dice(5, 10, 10),
        armor_class: 15,
        attack_bonus: 6,
        damage: dice(2, 6, 3),
        xp_reward: 100,
    },
];

impl EnemyTemplate {
    /// Roll a fresh enemy from this template. HP is floored at 1.
    ///
    /// With an index the display name becomes "Goblin 2".
    pub fn spawn<R>(&self, index: Option<usize>, rng: &mut R) -> CombatEnemy
    where
        R: FnMut(i32, i32) -> i32,
    {
        let hp = self.hit_dice.roll_with(rng).total.max(1);
        let name = match index {
            Some(i) => format!("{} {}", self.name, i),
            None => self.name.to_string(),
        };
        CombatEnemy {
            id: EnemyId::new(),
            name,
            hp,
            max_hp: hp,
            armor_class: self.armor_class,
            attack_bonus: self.attack_bonus,
            damage: self.damage,
            xp_reward: self.xp_reward,
        }
    }
}

/// Normalize a type name for lookup.
pub fn normalize_type(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn all_templates() -> &'static [EnemyTemplate] {
    &TEMPLATES
}

pub fn template(enemy_type: &str) -> Option<&'static EnemyTemplate> {
    let key = normalize_type(enemy_type);
    TEMPLATES.iter().find(|t| t.key == key)
}

/// Match a narrator-declared name, ignoring a trailing number ("Goblin 2").
pub fn lookup_declared(name: &str) -> Option<&'static EnemyTemplate> {
    template(name).or_else(|| {
        let key = normalize_type(name);
        let (head, tail) = key.rsplit_once(' ')?;
        if tail.bytes().all(|b| b.is_ascii_digit()) {
            template(head)
        } else {
            None
        }
    })
}

pub fn spawn_enemy<R>(
    enemy_type: &str,
    index: Option<usize>,
    rng: &mut R,
) -> Result<CombatEnemy, BestiaryError>
where
    R: FnMut(i32, i32) -> i32,
{
    template(enemy_type)
        .map(|t| t.spawn(index, rng))
        .ok_or_else(|| BestiaryError::UnknownEnemyType(enemy_type.trim().to_string()))
}

/// Spawn a group. Types that appear more than once are numbered from 1 in
/// order of appearance; singletons keep the bare name.
pub fn spawn_enemies<R, S>(types: &[S], rng: &mut R) -> Result<Vec<CombatEnemy>, BestiaryError>
where
    R: FnMut(i32, i32) -> i32,
    S: AsRef<str>,
{
    let resolved = types
        .iter()
        .map(|t| {
            template(t.as_ref())
                .ok_or_else(|| BestiaryError::UnknownEnemyType(t.as_ref().trim().to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut totals: HashMap<&'static str, usize> = HashMap::new();
    for t in &resolved {
        *totals.entry(t.key).or_default() += 1;
    }

    let mut seen: HashMap<&'static str, usize> = HashMap::new();
    Ok(resolved
        .into_iter()
        .map(|t| {
            let index = if totals[t.key] > 1 {
                let n = seen.entry(t.key).or_default();
                *n += 1;
                Some(*n)
            } else {
                None
            };
            t.spawn(index, rng)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(value: i32) -> impl FnMut(i32, i32) -> i32 {
        move |_, _| value
    }

    #[test]
    fn goblin_template_matches_reference_stats() {
        let goblin = template("goblin").unwrap();
        assert_eq!(goblin.hit_dice.to_string(), "2d4");
        assert_eq!(goblin.armor_class, 12);
        assert_eq!(goblin.attack_bonus, 3);
        assert_eq!(goblin.damage.to_string(), "1d6");
        assert_eq!(goblin.xp_reward, 10);
    }

    #[test]
    fn lookup_is_normalized() {
        assert!(template("  GOBLIN ").is_some());
        assert_eq!(template("giant_rat").unwrap().name, "Giant Rat");
        assert_eq!(template("Giant-Spider").unwrap().name, "Giant Spider");
        assert!(template("dragon").is_none());
    }

    #[test]
    fn declared_names_strip_trailing_numbers() {
        assert_eq!(lookup_declared("Goblin 2").unwrap().key, "goblin");
        assert_eq!(lookup_declared("Giant Rat 3").unwrap().key, "giant rat");
        assert!(lookup_declared("Goblin King").is_none());
    }

    #[test]
    fn spawn_rolls_hit_dice_and_names_by_index() {
        let enemy = spawn_enemy("goblin", Some(2), &mut fixed(2)).unwrap();
        assert_eq!(enemy.name, "Goblin 2");
        assert_eq!(enemy.hp, 4);
        assert_eq!(enemy.max_hp, 4);
        assert_eq!(enemy.xp_reward, 10);
    }

    #[test]
    fn weakest_spawn_still_has_hp() {
        let kobold = spawn_enemy("kobold", None, &mut fixed(0)).unwrap();
        assert_eq!(kobold.hp, 1);
    }

    #[test]
    fn unknown_type_is_an_error() {
        assert_eq!(
            spawn_enemy("beholder", None, &mut fixed(3)),
            Err(BestiaryError::UnknownEnemyType("beholder".to_string()))
        );
    }

    #[test]
    fn spawn_enemies_numbers_only_duplicates() {
        let enemies = spawn_enemies(&["goblin", "goblin", "orc"], &mut fixed(3)).unwrap();
        let names: Vec<&str> = enemies.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Goblin 1", "Goblin 2", "Orc"]);
        assert_ne!(enemies[0].id, enemies[1].id);
    }

    #[test]
    fn spawn_enemies_fails_on_any_unknown_type() {
        assert!(spawn_enemies(&["goblin", "lich"], &mut fixed(3)).is_err());
    }
}
