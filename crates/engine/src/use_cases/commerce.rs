//! Commerce authority: the only path from narrator output to character state.
//!
//! The narrator's `gold_delta`, `inventory_add` and `inventory_remove` are
//! discarded. Trades happen through `commerce_sell` / `commerce_buy`, or,
//! when the narrator ignored those fields, through reconciliation: if the
//! player's own words read as a buy or sell and the narrator emitted the
//! matching blocked inventory change, those item names are traded at
//! catalog prices. Reconciliation is keyword-based and can misread
//! ambiguous phrasing, so it never runs when a commerce field is present.

use regex_lite::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use questline_domain::game_systems::economy;
use questline_domain::{CharacterState, EconomyError, StateChanges, TradeKind, Transaction};

static SELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(sell|sells|selling|sold|trade in|trading in|pawn|pawns|pawning)\b")
        .expect("valid regex")
});
static BUY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(buy|buys|buying|bought|purchase|purchases|purchasing|pay for|paying for)\b")
        .expect("valid regex")
});

/// What the player's action text says about trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeIntent {
    Buy,
    Sell,
    None,
}

/// Classify action text by keyword. Text that mentions both directions is
/// treated as no intent.
pub fn detect_intent(action: &str) -> TradeIntent {
    match (SELL_RE.is_match(action), BUY_RE.is_match(action)) {
        (true, false) => TradeIntent::Sell,
        (false, true) => TradeIntent::Buy,
        _ => TradeIntent::None,
    }
}

/// Result of one attempted trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransactionOutcome {
    Completed(Transaction),
    Rejected {
        kind: TradeKind,
        item: String,
        error: EconomyError,
    },
}

impl TransactionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// One-line summary fed back to the narrator on the next action.
    pub fn summary(&self) -> String {
        match self {
            Self::Completed(tx) => match tx.kind {
                TradeKind::Buy => format!(
                    "Bought {} for {} gold ({} gold left).",
                    tx.item_name, tx.price, tx.gold_after
                ),
                TradeKind::Sell => format!(
                    "Sold {} for {} gold ({} gold now).",
                    tx.item_name, tx.price, tx.gold_after
                ),
            },
            Self::Rejected { kind, item, error } => {
                format!("Could not {} {}: {}.", kind, item, error)
            }
        }
    }
}

/// What actually happened to the character.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorityOutcome {
    /// Deltas as applied, with gold and inventory reflecting completed trades only
    pub applied: StateChanges,
    pub transactions: Vec<TransactionOutcome>,
}

impl AuthorityOutcome {
    /// Economy note for the next narrator context, if any trade was attempted.
    pub fn economy_note(&self) -> Option<String> {
        if self.transactions.is_empty() {
            return None;
        }
        let lines: Vec<String> = self.transactions.iter().map(|t| t.summary()).collect();
        Some(lines.join(" "))
    }
}

/// Apply narrator-proposed changes to `character`.
///
/// HP is clamped to `[0, max_hp]` and XP floored at zero. Location and
/// world-state flags are passed through in `applied` for the session to merge.
pub fn apply_narrator_changes(
    character: &mut CharacterState,
    proposed: &StateChanges,
    action: &str,
) -> AuthorityOutcome {
    if proposed.has_blocked_mutations() {
        tracing::info!(
            character_id = %character.id(),
            gold_delta = proposed.gold_delta,
            inventory_add = ?proposed.inventory_add,
            inventory_remove = ?proposed.inventory_remove,
            "Discarding narrator gold/inventory changes"
        );
    }
    let trusted = proposed.without_untrusted();

    let hp_delta = character.apply_hp_delta(trusted.hp_delta);
    let xp_delta = character.apply_xp_delta(trusted.xp_delta);

    let requests = trade_requests(proposed, action);
    let transactions: Vec<TransactionOutcome> = requests
        .into_iter()
        .map(|(kind, item)| execute(character, kind, item))
        .collect();

    if let Some(buy) = &proposed.commerce_buy {
        if let Some(quoted) = buy.price {
            let charged = transactions.iter().find_map(|t| match t {
                TransactionOutcome::Completed(tx) if tx.kind == TradeKind::Buy => Some(tx.price),
                _ => None,
            });
            if let Some(charged) = charged.filter(|&c| i64::from(c) != quoted) {
                tracing::info!(
                    item = %buy.item,
                    quoted,
                    charged,
                    "Narrator quote ignored, catalog price charged"
                );
            }
        }
    }

    let mut applied = StateChanges {
        hp_delta,
        xp_delta,
        ..trusted
    };
    let mut gold_delta: i64 = 0;
    for outcome in &transactions {
        if let TransactionOutcome::Completed(tx) = outcome {
            gold_delta += tx.gold_delta();
            match tx.kind {
                TradeKind::Buy => applied.inventory_add.push(tx.item_id.clone()),
                TradeKind::Sell => applied.inventory_remove.push(tx.item_id.clone()),
            }
        }
    }
    applied.gold_delta = i32::try_from(gold_delta).unwrap_or(if gold_delta < 0 {
        i32::MIN
    } else {
        i32::MAX
    });

    AuthorityOutcome {
        applied,
        transactions,
    }
}

fn trade_requests(proposed: &StateChanges, action: &str) -> Vec<(TradeKind, String)> {
    if proposed.has_commerce() {
        let mut requests = Vec::new();
        if let Some(item) = &proposed.commerce_sell {
            requests.push((TradeKind::Sell, item.clone()));
        }
        if let Some(buy) = &proposed.commerce_buy {
            requests.push((TradeKind::Buy, buy.item.clone()));
        }
        return requests;
    }

    let (kind, hinted) = match detect_intent(action) {
        TradeIntent::Sell => (TradeKind::Sell, &proposed.inventory_remove),
        TradeIntent::Buy => (TradeKind::Buy, &proposed.inventory_add),
        TradeIntent::None => return Vec::new(),
    };
    if !hinted.is_empty() {
        tracing::warn!(
            kind = %kind,
            items = ?hinted,
            "Reconciling trade from blocked narrator inventory change"
        );
    }
    hinted.iter().map(|item| (kind, item.clone())).collect()
}

fn execute(character: &mut CharacterState, kind: TradeKind, item: String) -> TransactionOutcome {
    match economy::trade(character, kind, &item) {
        Ok(tx) => {
            tracing::info!(
                character_id = %character.id(),
                kind = %tx.kind,
                item = %tx.item_id,
                price = tx.price,
                gold_after = tx.gold_after,
                "Trade completed"
            );
            TransactionOutcome::Completed(tx)
        }
        Err(error) => {
            tracing::info!(
                character_id = %character.id(),
                kind = %kind,
                item = %item,
                error = %error,
                "Trade rejected"
            );
            TransactionOutcome::Rejected { kind, item, error }
        }
    }
}
