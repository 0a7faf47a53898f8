//! Narrator-declared state deltas.
//!
//! The narrator proposes a `StateChanges` payload alongside its prose. Only
//! `hp_delta` and the two commerce fields are taken at face value; the gold
//! and inventory channels are stripped by the economy authority before
//! anything is persisted.

use std::collections::BTreeMap;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// A world-state flag value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl std::fmt::Display for FlagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
        }
    }
}

/// A purchase requested through the privileged commerce channel.
///
/// `price` is what the narrator quoted; the catalog price always wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommerceBuy {
    pub item: String,
    #[serde(default)]
    pub price: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateChanges {
    pub hp_delta: i32,
    pub gold_delta: i32,
    pub xp_delta: i32,
    pub location: Option<String>,
    pub inventory_add: Vec<String>,
    pub inventory_remove: Vec<String>,
    #[serde(deserialize_with = "flags_skipping_unreadable")]
    pub world_state: BTreeMap<String, FlagValue>,
    pub commerce_sell: Option<String>,
    pub commerce_buy: Option<CommerceBuy>,
}

/// Objects, arrays and nulls are not flags; those entries are dropped so the
/// rest of the section still decodes.
fn flags_skipping_unreadable<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, FlagValue>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Flag(FlagValue),
        Other(IgnoredAny),
    }

    let entries = BTreeMap::<String, Entry>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .filter_map(|(key, entry)| match entry {
            Entry::Flag(value) => Some((key, value)),
            Entry::Other(_) => None,
        })
        .collect())
}

impl StateChanges {
    /// True when nothing would change.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// True when the narrator tried to move gold or items directly.
    pub fn has_blocked_mutations(&self) -> bool {
        self.gold_delta != 0 || !self.inventory_add.is_empty() || !self.inventory_remove.is_empty()
    }

    /// Copy with the untrusted gold and inventory channels neutralized.
    pub fn without_untrusted(&self) -> Self {
        Self {
            gold_delta: 0,
            inventory_add: Vec::new(),
            inventory_remove: Vec::new(),
            ..self.clone()
        }
    }

    /// Whether a commerce field was supplied.
    pub fn has_commerce(&self) -> bool {
        self.commerce_sell.is_some() || self.commerce_buy.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_default_to_neutral() {
        let changes: StateChanges = serde_json::from_str(r#"{"hp_delta": -3}"#).unwrap();
        assert_eq!(changes.hp_delta, -3);
        assert_eq!(changes.gold_delta, 0);
        assert!(changes.inventory_add.is_empty());
        assert!(changes.world_state.is_empty());
        assert!(changes.commerce_buy.is_none());
    }

    #[test]
    fn world_state_accepts_mixed_flag_types() {
        let changes: StateChanges = serde_json::from_str(
            r#"{"world_state": {"gate_open": true, "bribes": 2, "mood": "tense"}}"#,
        )
        .unwrap();
        assert_eq!(changes.world_state["gate_open"], FlagValue::Bool(true));
        assert_eq!(changes.world_state["bribes"], FlagValue::Int(2));
        assert_eq!(
            changes.world_state["mood"],
            FlagValue::Text("tense".to_string())
        );
    }

    #[test]
    fn nested_flags_are_skipped_without_losing_the_section() {
        let changes: StateChanges = serde_json::from_str(
            r#"{"hp_delta": -4, "world_state": {
                "gate_open": true,
                "ledger": {"page": 3},
                "suspects": ["miller"],
                "omen": null,
                "mood": "tense"
            }}"#,
        )
        .unwrap();
        assert_eq!(changes.hp_delta, -4);
        assert_eq!(changes.world_state.len(), 2);
        assert_eq!(changes.world_state["gate_open"], FlagValue::Bool(true));
        assert_eq!(
            changes.world_state["mood"],
            FlagValue::Text("tense".to_string())
        );
    }

    #[test]
    fn without_untrusted_keeps_trusted_fields() {
        let changes = StateChanges {
            hp_delta: -2,
            gold_delta: 500,
            inventory_add: vec!["crown".to_string()],
            inventory_remove: vec!["dagger".to_string()],
            commerce_sell: Some("dagger".to_string()),
            ..Default::default()
        };
        assert!(changes.has_blocked_mutations());

        let clean = changes.without_untrusted();
        assert_eq!(clean.hp_delta, -2);
        assert_eq!(clean.gold_delta, 0);
        assert!(clean.inventory_add.is_empty());
        assert!(clean.inventory_remove.is_empty());
        assert_eq!(clean.commerce_sell.as_deref(), Some("dagger"));
        assert!(!clean.has_blocked_mutations());
    }

    #[test]
    fn commerce_buy_price_is_optional() {
        let changes: StateChanges =
            serde_json::from_str(r#"{"commerce_buy": {"item": "torch"}}"#).unwrap();
        assert_eq!(
            changes.commerce_buy,
            Some(CommerceBuy {
                item: "torch".to_string(),
                price: None
            })
        );
    }
}
