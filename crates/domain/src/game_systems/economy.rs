//! Buy and sell rules.
//!
//! Gold only moves through these functions. Prices always come from the
//! catalog: buying costs the catalog value, selling pays half of the value
//! recorded on the inventory line, never less than 1 gold.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::CharacterState;
use crate::game_systems::catalog::{find_catalog_item, normalize_item_name, ResolvedItem};

/// A trade that could not go through. Returned to the player, not raised.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum EconomyError {
    #[error("Not enough gold for {item}: costs {price}, you have {gold}")]
    InsufficientFunds { item: String, price: u32, gold: u32 },
    #[error("No such item for sale: {item}")]
    UnknownItem { item: String },
    #[error("You don't have {item}")]
    NotOwned { item: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeKind {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// A completed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TradeKind,
    pub item_id: String,
    pub item_name: String,
    pub price: u32,
    pub gold_after: u32,
}

impl Transaction {
    /// Signed gold movement from the character's point of view.
    pub fn gold_delta(&self) -> i64 {
        match self.kind {
            TradeKind::Buy => -i64::from(self.price),
            TradeKind::Sell => i64::from(self.price),
        }
    }
}

pub fn sell_price(value: u32) -> u32 {
    (value / 2).max(1)
}

pub fn trade(
    character: &mut CharacterState,
    kind: TradeKind,
    item: &str,
) -> Result<Transaction, EconomyError> {
    match kind {
        TradeKind::Buy => buy_item(character, item),
        TradeKind::Sell => sell_item(character, item),
    }
}

/// Sell one unit of an owned item.
pub fn sell_item(character: &mut CharacterState, item: &str) -> Result<Transaction, EconomyError> {
    let item_id = find_owned(character, item).ok_or_else(|| EconomyError::NotOwned {
        item: item.trim().to_string(),
    })?;
    let line = character
        .remove_one(&item_id)
        .ok_or_else(|| EconomyError::NotOwned {
            item: item.trim().to_string(),
        })?;

    let price = sell_price(line.value);
    character.credit_gold(price);
    Ok(Transaction {
        kind: TradeKind::Sell,
        item_id: line.item_id,
        item_name: line.name,
        price,
        gold_after: character.gold(),
    })
}

/// Buy one unit of a catalog item at its catalog value.
pub fn buy_item(character: &mut CharacterState, item: &str) -> Result<Transaction, EconomyError> {
    let template = find_catalog_item(item).ok_or_else(|| EconomyError::UnknownItem {
        item: item.trim().to_string(),
    })?;

    let price = template.value;
    if !character.try_debit_gold(price) {
        return Err(EconomyError::InsufficientFunds {
            item: template.name.to_string(),
            price,
            gold: character.gold(),
        });
    }
    character.add_item(ResolvedItem::Catalog(template).to_inventory_item(1));

    Ok(Transaction {
        kind: TradeKind::Buy,
        item_id: template.id.to_string(),
        item_name: template.name.to_string(),
        price,
        gold_after: character.gold(),
    })
}

/// Find which inventory line a free-text name refers to.
fn find_owned(character: &CharacterState, item: &str) -> Option<String> {
    let key = normalize_item_name(item);
    if key.is_empty() {
        return None;
    }

    if let Some(template) = find_catalog_item(item) {
        if character.find_item(template.id).is_some() {
            return Some(template.id.to_string());
        }
    }

    let inventory = character.inventory();
    inventory
        .iter()
        .find(|line| line.item_id == key || normalize_item_name(&line.name) == key)
        .or_else(|| {
            (key.chars().count() >= 3)
                .then(|| {
                    inventory
                        .iter()
                        .find(|line| {
                            let name = normalize_item_name(&line.name);
                            name.contains(&key) || key.contains(&name)
                        })
                })
                .flatten()
        })
        .map(|line| line.item_id.clone())
}
