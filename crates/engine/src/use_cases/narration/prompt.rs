//! Narrator prompts and per-action context.
//!
//! The system prompt fixes the reply format parsed by `response_parser.rs`.
//! Context is rebuilt from persisted state on every action; the narrator has
//! no memory beyond the history window sent here.

use questline_domain::game_systems::bestiary;
use questline_domain::{
    CharacterState, CombatEnemy, CombatRoundResult, GameSession, HistoryRole,
};

use crate::infrastructure::ports::ChatMessage;

const NARRATOR_ROLE: &str = "You are the narrator of a text role-playing game. \
Describe the world and its people vividly in the second person, in at most three short paragraphs. \
The game engine owns the rules: it rolls every die, tracks hit points, gold, items and experience, \
and you never decide those outcomes yourself.";

const REPLY_FORMAT: &str = r#"After your prose you may add ONE fenced JSON block:

```json
{
  "state_changes": {
    "hp_delta": 0,
    "xp_delta": 0,
    "location": null,
    "world_state": {},
    "commerce_sell": null,
    "commerce_buy": null
  },
  "dice_rolls": [],
  "enemies": [],
  "combat_active": false
}
```

Rules for the block:
- Omit any field that does not change.
- "hp_delta" is damage or healing from the story (traps, rest, potions), never from combat.
- When the player sells an item, set "commerce_sell" to the item name.
- When the player buys an item, set "commerce_buy" to {"item": "<name>", "price": <coins>}.
- Never change gold or inventory any other way; the engine prices every trade.
- When a fight starts, list each foe in "enemies" as
  {"name": "<type>", "hp": <n>, "ac": <n>, "attack_bonus": <n>, "damage": "<NdS+M>", "xp": <n>}
  and set "combat_active" to true. Do not resolve the fight."#;

const COMBAT_ROLE: &str = "You are the narrator of a text role-playing game. \
The engine has already resolved this combat round. Describe exactly the outcome you are given, \
in one or two vivid paragraphs. Never change who hit, how much damage was dealt, or who fell, \
and do not add a JSON block.";

/// System prompt for free-form actions.
pub fn narrator_system_prompt() -> String {
    let known: Vec<&str> = bestiary::all_templates().iter().map(|t| t.key).collect();
    format!(
        "{}\n\n{}\n\nKnown enemy types (prefer these names): {}.",
        NARRATOR_ROLE,
        REPLY_FORMAT,
        known.join(", ")
    )
}

/// System prompt for narrating an already-resolved combat round.
pub fn combat_system_prompt() -> String {
    COMBAT_ROLE.to_string()
}

/// Current game state as a leading system message, followed by the most
/// recent `history_window` exchanges.
pub fn build_context(
    character: &CharacterState,
    session: &GameSession,
    history_window: usize,
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(state_summary(character, session))];
    messages.extend(session.history().recent(history_window).map(|entry| match entry.role {
        HistoryRole::Player => ChatMessage::user(entry.content.clone()),
        HistoryRole::Narrator => ChatMessage::assistant(entry.content.clone()),
    }));
    messages
}

fn state_summary(character: &CharacterState, session: &GameSession) -> String {
    let mut lines = vec![
        format!(
            "Character: {}, level {} {}. HP {}/{}. AC {}. Gold {}. XP {}.",
            character.name(),
            character.level(),
            character.class(),
            character.hp(),
            character.max_hp(),
            character.armor_class(),
            character.gold(),
            character.xp()
        ),
        format!("Abilities: {}.", character.abilities().summary()),
        format!("Location: {}.", session.location()),
    ];

    if character.inventory().is_empty() {
        lines.push("Inventory: empty.".to_string());
    } else {
        let items: Vec<String> = character
            .inventory()
            .iter()
            .map(|item| match item.quantity {
                1 => item.name.clone(),
                n => format!("{} x{}", item.name, n),
            })
            .collect();
        lines.push(format!("Inventory: {}.", items.join(", ")));
    }

    if !session.world_state().is_empty() {
        let flags: Vec<String> = session
            .world_state()
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        lines.push(format!("World: {}.", flags.join(", ")));
    }

    if let Some(note) = session.economy_note() {
        lines.push(format!("Last trade: {}", note));
    }

    lines.join("\n")
}

/// The decided outcome of a round, phrased as the narrator's instruction.
pub fn combat_outcome_prompt(
    action: &str,
    result: &CombatRoundResult,
    character: &CharacterState,
    survivors: &[CombatEnemy],
) -> String {
    let mut lines = vec![
        format!("The player declared: \"{}\"", action.trim()),
        format!("Round {} resolved as follows:", result.round),
    ];
    lines.extend(result.attacks.iter().map(|attack| format!("- {}", attack.describe())));

    if result.player_dead {
        lines.push(format!("{} has fallen. The adventure ends here.", character.name()));
    } else {
        lines.push(format!(
            "{} has {}/{} HP.",
            character.name(),
            character.hp(),
            character.max_hp()
        ));
    }

    if result.combat_ended && !result.player_dead {
        lines.push("No enemies remain. The fight is over.".to_string());
    } else if !survivors.is_empty() {
        let standing: Vec<String> = survivors
            .iter()
            .map(|e| format!("{} ({}/{} HP)", e.name, e.hp, e.max_hp))
            .collect();
        lines.push(format!("Still standing: {}.", standing.join(", ")));
    }

    if result.xp_gained > 0 {
        lines.push(format!("{} XP earned.", result.xp_gained));
    }

    lines.push("Narrate this outcome exactly.".to_string());
    lines.join("\n")
}
