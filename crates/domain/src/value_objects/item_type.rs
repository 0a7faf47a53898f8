use serde::{Deserialize, Serialize};

/// Kind of item, used for catalog entries and inventory lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Weapon,
    Armor,
    Consumable,
    Tool,
    /// Narrative items created on the fly; no mechanical stats.
    Quest,
    Misc,
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Weapon => write!(f, "weapon"),
            Self::Armor => write!(f, "armor"),
            Self::Consumable => write!(f, "consumable"),
            Self::Tool => write!(f, "tool"),
            Self::Quest => write!(f, "quest"),
            Self::Misc => write!(f, "misc"),
        }
    }
}
