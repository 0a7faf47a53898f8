//! Narrator response parser.
//!
//! The narrator answers with prose, optionally followed by one fenced JSON
//! block:
//!
//! ````text
//! The goblin lunges from behind the barrel!
//!
//! ```json
//! {"state_changes": {"hp_delta": 0}, "enemies": [{"name": "goblin"}], "combat_active": true}
//! ```
//! ````
//!
//! Parsing never fails. A missing or broken block yields the prose alone with
//! every structured field at its default, and each JSON section is decoded on
//! its own so one bad section does not discard the others.
//!
//! See `prompt.rs` for the format the narrator is asked to produce.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

use questline_domain::StateChanges;

/// Structured content pulled out of a narrator reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedNarration {
    pub narrative: String,
    pub state_changes: StateChanges,
    pub dice_rolls: Vec<DiceRollEntry>,
    pub enemies: Vec<EnemyDeclaration>,
    pub combat_active: bool,
}

/// One line of the dice log shown to the player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceRollEntry {
    #[serde(alias = "purpose", alias = "type")]
    pub label: String,
    #[serde(alias = "dice", alias = "roll")]
    pub notation: String,
    pub rolls: Vec<i32>,
    #[serde(alias = "result")]
    pub total: i32,
}

/// An enemy the narrator introduced, with whatever stats it supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnemyDeclaration {
    #[serde(alias = "type")]
    pub name: String,
    pub hp: Option<i32>,
    #[serde(alias = "armor_class")]
    pub ac: Option<i32>,
    pub attack_bonus: Option<i32>,
    pub damage: Option<String>,
    #[serde(alias = "xp_reward")]
    pub xp: Option<u32>,
}

impl EnemyDeclaration {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

static FENCED_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[ \t]*(?:json|JSON)?(.*?)```").expect("valid regex"));

// A fence the model opened but never closed, usually a reply cut off at the token limit
static OPEN_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[ \t]*(?:json|JSON)?(.*)$").expect("valid regex"));

// Regex to remove model-specific special tokens (e.g., from gpt-oss, llama, etc.)
static SPECIAL_TOKENS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\|[^|>]+\|>|\[/?INST\]|<</?SYS>>").expect("valid regex"));

// Pattern: <|channel|>analysis<|message|>...<|end|>
//          <|start|>assistant<|channel|>final<|message|>ACTUAL CONTENT
static FINAL_CONTENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\|channel\|>final<\|message\|>(.*)$").expect("valid regex"));

/// Remove model-specific special tokens that may leak through from LLM output.
///
/// gpt-oss style replies keep only the content after the final channel marker.
pub fn strip_special_tokens(raw: &str) -> String {
    if let Some(content) = FINAL_CONTENT_RE.captures(raw).and_then(|caps| caps.get(1)) {
        return SPECIAL_TOKENS_RE
            .replace_all(content.as_str().trim(), "")
            .to_string();
    }
    SPECIAL_TOKENS_RE.replace_all(raw, "").to_string()
}

/// Parse a full narrator reply.
pub fn parse_response(raw: &str) -> ParsedNarration {
    let cleaned = strip_special_tokens(raw);
    let (narrative, block) = split_block(&cleaned);

    let mut parsed = ParsedNarration {
        narrative,
        ..Default::default()
    };
    let Some(block) = block else {
        return parsed;
    };

    let root = match serde_json::from_str::<Value>(block) {
        Ok(Value::Object(root)) => root,
        Ok(other) => {
            tracing::warn!(json = %other, "Narrator JSON block is not an object, ignoring it");
            return parsed;
        }
        Err(e) => {
            tracing::warn!(json = block, error = %e, "Failed to parse narrator JSON block");
            return parsed;
        }
    };

    if let Some(value) = root.get("state_changes") {
        match serde_json::from_value::<StateChanges>(value.clone()) {
            Ok(changes) => parsed.state_changes = changes,
            Err(e) => tracing::warn!(error = %e, "Failed to parse state_changes section"),
        }
    }

    if let Some(Value::Array(rolls)) = root.get("dice_rolls") {
        parsed.dice_rolls = rolls
            .iter()
            .filter_map(|roll| match serde_json::from_value(roll.clone()) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(roll = %roll, error = %e, "Skipping unreadable dice roll");
                    None
                }
            })
            .collect();
    }

    if let Some(Value::Array(enemies)) = root.get("enemies") {
        parsed.enemies = enemies.iter().filter_map(parse_enemy).collect();
    }

    parsed.combat_active = root
        .get("combat_active")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    parsed
}

/// Prose only. Used where the engine already decided every mechanical fact.
pub fn parse_narrative(raw: &str) -> String {
    let cleaned = strip_special_tokens(raw);
    split_block(&cleaned).0
}

/// Split prose from the JSON block. The prose is everything before the fence,
/// so a reply that opens with its block has no narrative.
fn split_block(text: &str) -> (String, Option<&str>) {
    if let Some(caps) = FENCED_BLOCK_RE.captures(text) {
        if let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) {
            return (
                text[..whole.start()].trim().to_string(),
                Some(inner.as_str().trim()),
            );
        }
    }
    if let Some(caps) = OPEN_FENCE_RE.captures(text) {
        if let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) {
            return (
                text[..whole.start()].trim().to_string(),
                Some(inner.as_str().trim()),
            );
        }
    }
    (text.trim().to_string(), None)
}

fn parse_enemy(value: &Value) -> Option<EnemyDeclaration> {
    let declaration = match value {
        Value::String(name) => EnemyDeclaration::named(name.as_str()),
        Value::Object(_) => match serde_json::from_value::<EnemyDeclaration>(value.clone()) {
            Ok(declaration) => declaration,
            Err(e) => {
                tracing::warn!(enemy = %value, error = %e, "Skipping unreadable enemy declaration");
                return None;
            }
        },
        _ => return None,
    };
    if declaration.name.trim().is_empty() {
        tracing::warn!(enemy = %value, "Skipping enemy declaration without a name");
        return None;
    }
    Some(declaration)
}
