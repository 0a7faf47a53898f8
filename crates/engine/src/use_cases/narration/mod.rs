//! Talking to the narrator: prompts out, parsed replies back.

pub mod prompt;
pub mod response_parser;

pub use response_parser::{
    parse_narrative, parse_response, DiceRollEntry, EnemyDeclaration, ParsedNarration,
};
