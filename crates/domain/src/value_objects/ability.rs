//! Ability scores and the modifier table used by combat.

use serde::{Deserialize, Serialize};

/// Modifier for an ability score.
///
/// The table is deliberately coarser than the 5e formula:
///
/// | score | modifier |
/// |-------|----------|
/// | ≤ 3   | -3 |
/// | 4–5   | -2 |
/// | 6–8   | -1 |
/// | 9–12  | 0  |
/// | 13–15 | +1 |
/// | 16–17 | +2 |
/// | ≥ 18  | +3 |
pub fn ability_modifier(score: i32) -> i32 {
    match score {
        i32::MIN..=3 => -3,
        4..=5 => -2,
        6..=8 => -1,
        9..=12 => 0,
        13..=15 => 1,
        16..=17 => 2,
        _ => 3,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl AbilityScores {
    pub fn new(
        strength: i32,
        dexterity: i32,
        constitution: i32,
        intelligence: i32,
        wisdom: i32,
        charisma: i32,
    ) -> Self {
        Self {
            strength,
            dexterity,
            constitution,
            intelligence,
            wisdom,
            charisma,
        }
    }

    pub fn str_mod(&self) -> i32 {
        ability_modifier(self.strength)
    }

    pub fn dex_mod(&self) -> i32 {
        ability_modifier(self.dexterity)
    }

    /// One-line summary for narrator context, e.g. "STR 14 (+1), DEX 12 (+0), ..."
    pub fn summary(&self) -> String {
        let fmt = |label: &str, score: i32| {
            format!("{} {} ({:+})", label, score, ability_modifier(score))
        };
        [
            fmt("STR", self.strength),
            fmt("DEX", self.dexterity),
            fmt("CON", self.constitution),
            fmt("INT", self.intelligence),
            fmt("WIS", self.wisdom),
            fmt("CHA", self.charisma),
        ]
        .join(", ")
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_table_matches_every_score_from_3_to_18() {
        let expected = [
            (3, -3),
            (4, -2),
            (5, -2),
            (6, -1),
            (7, -1),
            (8, -1),
            (9, 0),
            (10, 0),
            (11, 0),
            (12, 0),
            (13, 1),
            (14, 1),
            (15, 1),
            (16, 2),
            (17, 2),
            (18, 3),
        ];
        for (score, modifier) in expected {
            assert_eq!(ability_modifier(score), modifier, "score {}", score);
        }
    }

    #[test]
    fn modifier_saturates_outside_the_table() {
        assert_eq!(ability_modifier(0), -3);
        assert_eq!(ability_modifier(-5), -3);
        assert_eq!(ability_modifier(20), 3);
    }

    #[test]
    fn summary_lists_scores_with_signed_modifiers() {
        let scores = AbilityScores::new(16, 8, 10, 10, 10, 18);
        assert_eq!(
            scores.summary(),
            "STR 16 (+2), DEX 8 (-1), CON 10 (+0), INT 10 (+0), WIS 10 (+0), CHA 18 (+3)"
        );
    }
}
