//! Character aggregate - the player's mechanical state
//!
//! # Invariants
//!
//! - `0 <= hp <= max_hp`, enforced by every HP mutator
//! - `max_hp >= 1`
//! - `gold` is unsigned; spending more than is held is refused
//! - inventory lines always have `quantity >= 1`

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{AbilityScores, ItemType};
use questline_domain::CharacterId;

/// Character class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    Fighter,
    Rogue,
    Wizard,
    Cleric,
    Ranger,
}

impl std::fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fighter => write!(f, "Fighter"),
            Self::Rogue => write!(f, "Rogue"),
            Self::Wizard => write!(f, "Wizard"),
            Self::Cleric => write!(f, "Cleric"),
            Self::Ranger => write!(f, "Ranger"),
        }
    }
}

impl std::str::FromStr for CharacterClass {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fighter" => Ok(Self::Fighter),
            "rogue" => Ok(Self::Rogue),
            "wizard" => Ok(Self::Wizard),
            "cleric" => Ok(Self::Cleric),
            "ranger" => Ok(Self::Ranger),
            other => Err(DomainError::parse(format!("Unknown character class: {}", other))),
        }
    }
}

/// One inventory line: an item id plus denormalized display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub item_id: String,
    pub name: String,
    pub item_type: ItemType,
    pub quantity: u32,
    /// Catalog value in gold at the time the line was created
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterState {
    id: CharacterId,
    name: String,
    class: CharacterClass,
    level: u32,
    hp: i32,
    max_hp: i32,
    gold: u32,
    xp: u32,
    abilities: AbilityScores,
    inventory: Vec<InventoryItem>,
}

impl CharacterState {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// Create a level 1 character at full HP with no gold or items.
    pub fn new(
        name: impl Into<String>,
        class: CharacterClass,
        abilities: AbilityScores,
        max_hp: i32,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Character name cannot be empty"));
        }
        if max_hp < 1 {
            return Err(DomainError::validation("max_hp must be at least 1"));
        }
        Ok(Self {
            id: CharacterId::new(),
            name,
            class,
            level: 1,
            hp: max_hp,
            max_hp,
            gold: 0,
            xp: 0,
            abilities,
            inventory: Vec::new(),
        })
    }

    pub fn with_gold(mut self, gold: u32) -> Self {
        self.gold = gold;
        self
    }

    /// Set current HP (clamped into `[0, max_hp]`).
    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp.clamp(0, self.max_hp);
        self
    }

    pub fn with_item(mut self, item: InventoryItem) -> Self {
        self.add_item(item);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> CharacterId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn class(&self) -> CharacterClass {
        self.class
    }

    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[inline]
    pub fn hp(&self) -> i32 {
        self.hp
    }

    #[inline]
    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    #[inline]
    pub fn gold(&self) -> u32 {
        self.gold
    }

    #[inline]
    pub fn xp(&self) -> u32 {
        self.xp
    }

    #[inline]
    pub fn abilities(&self) -> &AbilityScores {
        &self.abilities
    }

    #[inline]
    pub fn inventory(&self) -> &[InventoryItem] {
        &self.inventory
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    /// 10 + DEX modifier. Worn armor is not applied.
    pub fn armor_class(&self) -> i32 {
        10 + self.abilities.dex_mod()
    }

    pub fn find_item(&self, item_id: &str) -> Option<&InventoryItem> {
        self.inventory.iter().find(|line| line.item_id == item_id)
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    /// Apply an HP change, clamped into `[0, max_hp]`. Returns the delta actually applied.
    pub fn apply_hp_delta(&mut self, delta: i32) -> i32 {
        let before = self.hp;
        self.hp = before.saturating_add(delta).clamp(0, self.max_hp);
        self.hp - before
    }

    /// Set HP directly (clamped). Used when combat reports the post-round value.
    pub fn set_hp(&mut self, hp: i32) {
        self.hp = hp.clamp(0, self.max_hp);
    }

    /// Add (or remove) XP, never going below zero. Returns the delta actually applied.
    pub fn apply_xp_delta(&mut self, delta: i32) -> i32 {
        let before = self.xp as i64;
        let after = (before + delta as i64).clamp(0, u32::MAX as i64);
        self.xp = after as u32;
        (after - before) as i32
    }

    pub fn credit_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Spend gold. Returns false and leaves gold untouched when funds are short.
    pub fn try_debit_gold(&mut self, amount: u32) -> bool {
        match self.gold.checked_sub(amount) {
            Some(remaining) => {
                self.gold = remaining;
                true
            }
            None => false,
        }
    }

    /// Add items, stacking onto an existing line with the same id.
    pub fn add_item(&mut self, item: InventoryItem) {
        if item.quantity == 0 {
            return;
        }
        match self
            .inventory
            .iter_mut()
            .find(|line| line.item_id == item.item_id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => self.inventory.push(item),
        }
    }

    /// Remove one unit of an item. The line disappears when its quantity hits zero.
    ///
    /// Returns a snapshot of the line as it was before removal.
    pub fn remove_one(&mut self, item_id: &str) -> Option<InventoryItem> {
        let index = self
            .inventory
            .iter()
            .position(|line| line.item_id == item_id)?;
        let snapshot = self.inventory[index].clone();
        if snapshot.quantity <= 1 {
            self.inventory.remove(index);
        } else {
            self.inventory[index].quantity -= 1;
        }
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter() -> CharacterState {
        CharacterState::new(
            "Brenna",
            CharacterClass::Fighter,
            AbilityScores::new(16, 12, 14, 8, 10, 10),
            12,
        )
        .unwrap()
    }

    fn torch(quantity: u32) -> InventoryItem {
        InventoryItem {
            item_id: "torch".to_string(),
            name: "Torch".to_string(),
            item_type: ItemType::Tool,
            quantity,
            value: 1,
        }
    }

    #[test]
    fn new_character_starts_at_full_hp() {
        let pc = fighter();
        assert_eq!(pc.hp(), 12);
        assert_eq!(pc.max_hp(), 12);
        assert_eq!(pc.level(), 1);
        assert_eq!(pc.gold(), 0);
    }

    #[test]
    fn new_rejects_empty_name_and_zero_hp() {
        let abilities = AbilityScores::default();
        assert!(CharacterState::new("  ", CharacterClass::Rogue, abilities, 8).is_err());
        assert!(CharacterState::new("Vex", CharacterClass::Rogue, abilities, 0).is_err());
    }

    #[test]
    fn hp_delta_is_clamped_to_bounds() {
        let mut pc = fighter();
        assert_eq!(pc.apply_hp_delta(-5), -5);
        assert_eq!(pc.hp(), 7);
        assert_eq!(pc.apply_hp_delta(100), 5);
        assert_eq!(pc.hp(), 12);
        assert_eq!(pc.apply_hp_delta(-100), -12);
        assert_eq!(pc.hp(), 0);
        assert!(pc.is_dead());
    }

    #[test]
    fn xp_never_goes_negative() {
        let mut pc = fighter();
        pc.apply_xp_delta(30);
        assert_eq!(pc.apply_xp_delta(-50), -30);
        assert_eq!(pc.xp(), 0);
    }

    #[test]
    fn debit_refuses_overdraft() {
        let mut pc = fighter().with_gold(5);
        assert!(!pc.try_debit_gold(6));
        assert_eq!(pc.gold(), 5);
        assert!(pc.try_debit_gold(5));
        assert_eq!(pc.gold(), 0);
    }

    #[test]
    fn add_item_stacks_and_remove_one_drops_empty_lines() {
        let mut pc = fighter().with_item(torch(1));
        pc.add_item(torch(2));
        assert_eq!(pc.inventory().len(), 1);
        assert_eq!(pc.find_item("torch").unwrap().quantity, 3);

        pc.remove_one("torch");
        pc.remove_one("torch");
        assert_eq!(pc.find_item("torch").unwrap().quantity, 1);
        let last = pc.remove_one("torch").unwrap();
        assert_eq!(last.quantity, 1);
        assert!(pc.inventory().is_empty());
        assert!(pc.remove_one("torch").is_none());
    }

    #[test]
    fn armor_class_uses_dex_modifier() {
        let pc = CharacterState::new(
            "Vex",
            CharacterClass::Rogue,
            AbilityScores::new(10, 17, 10, 10, 10, 10),
            8,
        )
        .unwrap();
        assert_eq!(pc.armor_class(), 12);
    }

    #[test]
    fn class_parses_case_insensitively() {
        assert_eq!("Wizard".parse::<CharacterClass>().unwrap(), CharacterClass::Wizard);
        assert!("bard".parse::<CharacterClass>().is_err());
    }
}
