//! Create a character and open a session for it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use questline_domain::game_systems::catalog;
use questline_domain::{AbilityScores, CharacterClass, CharacterState, GameSession, SessionId};

use crate::infrastructure::ports::ClockPort;
use crate::repositories::{CharacterRepository, SessionRepository};
use crate::use_cases::action::ActionError;

pub const DEFAULT_LOCATION: &str = "The Crossroads Inn";

/// Player-supplied character sheet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCharacter {
    pub name: String,
    pub class: CharacterClass,
    pub abilities: AbilityScores,
    pub max_hp: i32,
    #[serde(default)]
    pub gold: u32,
    /// Free-text item names, resolved against the catalog
    #[serde(default)]
    pub starting_items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStarted {
    pub session_id: SessionId,
    pub character: CharacterState,
    pub location: String,
    /// Starting item names that did not resolve to anything
    pub skipped_items: Vec<String>,
}

pub struct StartSession {
    characters: Arc<CharacterRepository>,
    sessions: Arc<SessionRepository>,
    clock: Arc<dyn ClockPort>,
}

impl StartSession {
    pub fn new(
        characters: Arc<CharacterRepository>,
        sessions: Arc<SessionRepository>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            characters,
            sessions,
            clock,
        }
    }

    pub async fn execute(
        &self,
        user_id: &str,
        sheet: NewCharacter,
        location: Option<&str>,
    ) -> Result<SessionStarted, ActionError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ActionError::InvalidAction("user id is empty".to_string()));
        }

        let mut character =
            CharacterState::new(sheet.name, sheet.class, sheet.abilities, sheet.max_hp)?
                .with_gold(sheet.gold);

        let mut skipped_items = Vec::new();
        for raw in &sheet.starting_items {
            match catalog::resolve_item(raw) {
                Some(item) => character.add_item(item.to_inventory_item(1)),
                None => {
                    tracing::warn!(item = %raw, "Starting item did not resolve, skipping");
                    skipped_items.push(raw.clone());
                }
            }
        }

        let location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LOCATION);
        let session = GameSession::new(user_id, character.id(), location, self.clock.now());

        self.characters.save(user_id, &character).await?;
        self.sessions.save(&session).await?;

        tracing::info!(
            session_id = %session.id(),
            character_id = %character.id(),
            class = %character.class(),
            items = character.inventory().len(),
            "Session started"
        );

        Ok(SessionStarted {
            session_id: session.id(),
            character,
            location: location.to_string(),
            skipped_items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::TestHarness;

    fn sheet(items: &[&str]) -> NewCharacter {
        NewCharacter {
            name: "Mira".to_string(),
            class: CharacterClass::Rogue,
            abilities: AbilityScores::new(10, 16, 12, 11, 13, 14),
            max_hp: 9,
            gold: 25,
            starting_items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn starts_a_session_and_persists_both_aggregates() {
        let harness = TestHarness::new(vec![]);

        let started = harness
            .app
            .use_cases
            .start_session
            .execute("user-1", sheet(&[]), Some("Old Mill"))
            .await
            .unwrap();

        assert_eq!(started.location, "Old Mill");
        assert_eq!(started.character.gold(), 25);
        assert_eq!(started.character.hp(), 9);

        let session = harness
            .app
            .repositories
            .sessions
            .get("user-1", started.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.character_id(), started.character.id());
        assert_eq!(session.location(), "Old Mill");
        assert!(harness
            .app
            .repositories
            .characters
            .get("user-1", started.character.id())
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn starting_items_resolve_through_the_catalog() {
        let harness = TestHarness::new(vec![]);

        let started = harness
            .app
            .use_cases
            .start_session
            .execute("user-1", sheet(&["torch", "Silver Locket of Aunt Hesper", "x"]), None)
            .await
            .unwrap();

        assert_eq!(started.character.inventory().len(), 2);
        assert!(started.character.find_item("torch").is_some());
        assert_eq!(started.skipped_items, vec!["x".to_string()]);
        assert_eq!(started.location, DEFAULT_LOCATION);
    }

    #[tokio::test]
    async fn invalid_sheet_is_rejected_and_nothing_is_saved() {
        let harness = TestHarness::new(vec![]);
        let mut bad = sheet(&[]);
        bad.name = "   ".to_string();

        let err = harness
            .app
            .use_cases
            .start_session
            .execute("user-1", bad, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::InvalidAction(_)));
        assert!(harness.store.is_empty());
    }

    #[tokio::test]
    async fn empty_user_is_rejected() {
        let harness = TestHarness::new(vec![]);

        let err = harness
            .app
            .use_cases
            .start_session
            .execute(" ", sheet(&[]), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::InvalidAction(_)));
    }
}
