//! Static item catalog and free-text item resolution.
//!
//! Resolution order for a name the player or narrator typed:
//!
//! 1. exact catalog id after normalization
//! 2. alias table
//! 3. substring match against catalog display names (queries of 3+ chars)
//! 4. a dynamic quest item, if the name is descriptive enough
//!
//! Normalization case-folds, trims and maps spaces and hyphens to underscores.

use crate::entities::InventoryItem;
use crate::value_objects::ItemType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub item_type: ItemType,
    /// Price in gold when bought
    pub value: u32,
}

const fn item(
    id: &'static str,
    name: &'static str,
    item_type: ItemType,
    value: u32,
) -> ItemTemplate {
    ItemTemplate {
        id,
        name,
        item_type,
        value,
    }
}

static CATALOG: [ItemTemplate; 15] = [
    item("healing_potion", "Healing Potion", ItemType::Consumable, 50),
    item("dagger", "Dagger", ItemType::Weapon, 2),
    item("short_sword", "Short Sword", ItemType::Weapon, 10),
    item("longsword", "Longsword", ItemType::Weapon, 15),
    item("shortbow", "Shortbow", ItemType::Weapon, 25),
    item("leather_armor", "Leather Armor", ItemType::Armor, 10),
    item("chain_mail", "Chain Mail", ItemType::Armor, 75),
    item("shield", "Shield", ItemType::Armor, 10),
    item("torch", "Torch", ItemType::Tool, 1),
    item("rope", "Rope", ItemType::Tool, 1),
    item("rations", "Rations", ItemType::Consumable, 1),
    item("lantern", "Lantern", ItemType::Tool, 5),
    item("lockpicks", "Lockpicks", ItemType::Tool, 25),
    item("antidote", "Antidote", ItemType::Consumable, 25),
    item("arrows", "Arrows", ItemType::Misc, 1),
];

static ALIASES: [(&str, &str); 13] = [
    ("potion", "healing_potion"),
    ("health_potion", "healing_potion"),
    ("sword", "longsword"),
    ("bow", "shortbow"),
    ("armor", "leather_armor"),
    ("leather", "leather_armor"),
    ("chainmail", "chain_mail"),
    ("food", "rations"),
    ("ration", "rations"),
    ("thieves_tools", "lockpicks"),
    ("lockpick", "lockpicks"),
    ("arrow", "arrows"),
    ("knife", "dagger"),
];

/// Words too vague to become a quest item.
const GENERIC_NAMES: [&str; 14] = [
    "item", "items", "thing", "things", "stuff", "gold", "coin", "coins", "money", "loot",
    "treasure", "something", "object", "it",
];

const MIN_MATCH_LEN: usize = 3;

/// The outcome of resolving a free-text item name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedItem {
    Catalog(&'static ItemTemplate),
    /// Uncatalogued quest item: no stats, no value
    Dynamic { id: String, name: String },
}

impl ResolvedItem {
    pub fn item_id(&self) -> &str {
        match self {
            Self::Catalog(t) => t.id,
            Self::Dynamic { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Catalog(t) => t.name,
            Self::Dynamic { name, .. } => name,
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Catalog(t) => t.item_type,
            Self::Dynamic { .. } => ItemType::Quest,
        }
    }

    pub fn value(&self) -> u32 {
        match self {
            Self::Catalog(t) => t.value,
            Self::Dynamic { .. } => 0,
        }
    }

    pub fn to_inventory_item(&self, quantity: u32) -> InventoryItem {
        InventoryItem {
            item_id: self.item_id().to_string(),
            name: self.name().to_string(),
            item_type: self.item_type(),
            quantity,
            value: self.value(),
        }
    }
}

pub fn normalize_item_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

pub fn by_id(id: &str) -> Option<&'static ItemTemplate> {
    CATALOG.iter().find(|t| t.id == id)
}

/// Steps 1-3: catalog entries only.
pub fn find_catalog_item(query: &str) -> Option<&'static ItemTemplate> {
    let key = normalize_item_name(query);
    if key.is_empty() {
        return None;
    }

    if let Some(t) = by_id(&key) {
        return Some(t);
    }

    if let Some((_, target)) = ALIASES.iter().find(|(alias, _)| *alias == key) {
        return by_id(target);
    }

    if key.chars().count() < MIN_MATCH_LEN {
        return None;
    }
    CATALOG.iter().find(|t| {
        let name = normalize_item_name(t.name);
        name.contains(&key) || key.contains(&name)
    })
}

/// Full resolution including dynamic quest items.
pub fn resolve_item(query: &str) -> Option<ResolvedItem> {
    if let Some(t) = find_catalog_item(query) {
        return Some(ResolvedItem::Catalog(t));
    }

    let key = normalize_item_name(query);
    let descriptive = key.chars().count() >= MIN_MATCH_LEN
        && key.chars().any(|c| c.is_alphabetic())
        && !GENERIC_NAMES.contains(&key.as_str());
    if !descriptive {
        return None;
    }

    Some(ResolvedItem::Dynamic {
        id: key,
        name: display_name(query),
    })
}

/// "strange  amulet" -> "Strange Amulet"
fn display_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_folds_case_and_separators() {
        assert_eq!(normalize_item_name("  Healing Potion "), "healing_potion");
        assert_eq!(normalize_item_name("chain-mail"), "chain_mail");
    }

    #[test]
    fn resolves_by_id_then_alias_then_substring() {
        assert_eq!(find_catalog_item("Healing Potion").unwrap().id, "healing_potion");
        assert_eq!(find_catalog_item("potion").unwrap().id, "healing_potion");
        assert_eq!(find_catalog_item("thieves tools").unwrap().id, "lockpicks");
        assert_eq!(find_catalog_item("a sturdy rope").unwrap().id, "rope");
        assert_eq!(find_catalog_item("lant").unwrap().id, "lantern");
    }

    #[test]
    fn short_queries_do_not_substring_match() {
        assert!(find_catalog_item("to").is_none());
    }

    #[test]
    fn descriptive_unknown_names_become_quest_items() {
        let resolved = resolve_item("strange amulet").unwrap();
        assert_eq!(resolved.item_id(), "strange_amulet");
        assert_eq!(resolved.name(), "Strange Amulet");
        assert_eq!(resolved.item_type(), ItemType::Quest);
        assert_eq!(resolved.value(), 0);
    }

    #[test]
    fn generic_or_tiny_names_do_not_resolve() {
        assert!(resolve_item("gold").is_none());
        assert!(resolve_item("stuff").is_none());
        assert!(resolve_item("ab").is_none());
        assert!(resolve_item("123").is_none());
    }

    #[test]
    fn catalog_items_convert_to_inventory_lines() {
        let line = resolve_item("torch").unwrap().to_inventory_item(2);
        assert_eq!(line.item_id, "torch");
        assert_eq!(line.value, 1);
        assert_eq!(line.quantity, 2);
        assert_eq!(line.item_type, ItemType::Tool);
    }
}
