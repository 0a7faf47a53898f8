//! Read-only snapshot of a session for display.

use std::sync::Arc;

use serde::Serialize;

use questline_domain::{CharacterState, HistoryEntry, SessionId, SessionPhase, SessionStatus};

use crate::repositories::{CharacterRepository, SessionRepository};
use crate::use_cases::action::{ActionError, EnemyView};
use crate::use_cases::cost_guard::{CostGuard, DailyUsage};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub phase: SessionPhase,
    pub status: SessionStatus,
    pub location: String,
    pub character: CharacterState,
    pub enemies: Vec<EnemyView>,
    pub round: u32,
    pub history: Vec<HistoryEntry>,
    pub economy_note: Option<String>,
    pub usage_today: DailyUsage,
}

pub struct GetSessionView {
    characters: Arc<CharacterRepository>,
    sessions: Arc<SessionRepository>,
    cost_guard: Arc<CostGuard>,
}

impl GetSessionView {
    pub fn new(
        characters: Arc<CharacterRepository>,
        sessions: Arc<SessionRepository>,
        cost_guard: Arc<CostGuard>,
    ) -> Self {
        Self {
            characters,
            sessions,
            cost_guard,
        }
    }

    pub async fn execute(
        &self,
        session_id: SessionId,
        user_id: &str,
    ) -> Result<SessionView, ActionError> {
        let session = self
            .sessions
            .get(user_id, session_id)
            .await?
            .ok_or_else(|| ActionError::not_found("Session", session_id))?;
        let character = self
            .characters
            .get(user_id, session.character_id())
            .await?
            .ok_or_else(|| ActionError::not_found("Character", session.character_id()))?;

        let usage_today = match self.cost_guard.session_usage(session_id).await {
            Ok(usage) => usage,
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "Could not read session usage"
                );
                DailyUsage::default()
            }
        };

        Ok(SessionView {
            session_id,
            phase: session.phase(),
            status: session.status(),
            location: session.location().to_string(),
            character,
            enemies: EnemyView::list(session.enemies()),
            round: session.combat().round,
            history: session.history().iter().cloned().collect(),
            economy_note: session.economy_note().map(str::to_string),
            usage_today,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{fighter, TestHarness};

    #[tokio::test]
    async fn view_reflects_the_stored_session() {
        let harness = TestHarness::new(vec![Ok("You step into the rain.".to_string())]);
        let session_id = harness.seed(fighter(12)).await;
        harness
            .app
            .use_cases
            .process_action
            .execute(session_id, TestHarness::USER, "I walk outside")
            .await
            .unwrap();

        let view = harness
            .app
            .use_cases
            .session_view
            .execute(session_id, TestHarness::USER)
            .await
            .unwrap();

        assert_eq!(view.phase, SessionPhase::NoCombat);
        assert_eq!(view.status, SessionStatus::Active);
        assert_eq!(view.history.len(), 2);
        assert!(view.enemies.is_empty());
        assert_eq!(view.usage_today.request_count, 1);
        assert!(view.usage_today.total_tokens() > 0);
    }

    #[tokio::test]
    async fn other_users_cannot_view_the_session() {
        let harness = TestHarness::new(vec![]);
        let session_id = harness.seed(fighter(12)).await;

        let err = harness
            .app
            .use_cases
            .session_view
            .execute(session_id, "someone-else")
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::NotFound { entity: "Session", .. }));
    }
}
