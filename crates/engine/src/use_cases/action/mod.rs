//! Process player action use case.
//!
//! One call resolves one action end to end:
//!
//! 1. load the session and its character
//! 2. resolve a combat round, or let the narrator respond to a free-form action
//! 3. end the session if the character died
//! 4. append the exchange to the session history
//! 5. save the character, then the session
//!
//! The two saves are independent writes. Concurrent actions on one session
//! are not guarded against; callers are expected to submit one at a time.

mod combat_turn;
mod error;
mod narrative_turn;
mod types;

use std::sync::Arc;

use questline_domain::{CharacterState, CombatRoundResult, EndReason, SessionId, StateChanges};

pub use error::ActionError;
pub use types::{ActionResponse, EnemyView};

use crate::infrastructure::ports::{ChatMessage, ClockPort, RandomPort};
use crate::repositories::{CharacterRepository, Narrator, NarratorReply, SessionRepository};
use crate::use_cases::commerce::TransactionOutcome;
use crate::use_cases::cost_guard::CostGuard;
use crate::use_cases::narration::DiceRollEntry;

/// What one branch produced, before it is persisted.
struct TurnOutcome {
    character: CharacterState,
    narrative: String,
    state_changes: StateChanges,
    dice_rolls: Vec<DiceRollEntry>,
    transactions: Vec<TransactionOutcome>,
    combat_round: Option<CombatRoundResult>,
}

pub struct ProcessAction {
    characters: Arc<CharacterRepository>,
    sessions: Arc<SessionRepository>,
    narrator: Arc<Narrator>,
    cost_guard: Arc<CostGuard>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
    history_limit: usize,
}

impl ProcessAction {
    pub fn new(
        characters: Arc<CharacterRepository>,
        sessions: Arc<SessionRepository>,
        narrator: Arc<Narrator>,
        cost_guard: Arc<CostGuard>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        history_limit: usize,
    ) -> Self {
        Self {
            characters,
            sessions,
            narrator,
            cost_guard,
            clock,
            random,
            history_limit,
        }
    }

    pub async fn execute(
        &self,
        session_id: SessionId,
        user_id: &str,
        action_text: &str,
    ) -> Result<ActionResponse, ActionError> {
        let action = action_text.trim();
        if action.is_empty() {
            return Err(ActionError::InvalidAction("action text is empty".to_string()));
        }

        let mut session = self
            .sessions
            .get(user_id, session_id)
            .await?
            .ok_or_else(|| ActionError::not_found("Session", session_id))?;
        if session.is_ended() {
            return Err(ActionError::GameState(format!(
                "session {} has ended",
                session_id
            )));
        }
        let character = self
            .characters
            .get(user_id, session.character_id())
            .await?
            .ok_or_else(|| ActionError::not_found("Character", session.character_id()))?;

        let turn = if session.combat().active {
            self.combat_turn(&mut session, character, action).await?
        } else {
            self.narrative_turn(&mut session, character, action).await?
        };

        let character_dead = turn.character.is_dead();
        if character_dead {
            session.end(EndReason::CharacterDeath);
            tracing::info!(
                session_id = %session_id,
                character_id = %turn.character.id(),
                "Character died, session ended"
            );
        }

        session.record_exchange(action, &turn.narrative, self.history_limit);
        session.touch(self.clock.now());

        self.characters.save(user_id, &turn.character).await?;
        self.sessions.save(&session).await?;

        tracing::debug!(
            session_id = %session_id,
            hp = turn.character.hp(),
            gold = turn.character.gold(),
            combat_active = session.combat().active,
            "Action processed"
        );

        Ok(ActionResponse {
            narrative: turn.narrative,
            state_changes: turn.state_changes,
            dice_rolls: turn.dice_rolls,
            combat_active: session.combat().active,
            enemies: EnemyView::list(session.enemies()),
            character: turn.character,
            character_dead,
            session_ended: session.is_ended(),
            transactions: turn.transactions,
            combat_round: turn.combat_round,
        })
    }

    /// Budget check, narrator call, usage bookkeeping.
    async fn narrate(
        &self,
        session_id: SessionId,
        system_prompt: &str,
        context: Vec<ChatMessage>,
        text: &str,
    ) -> Result<NarratorReply, ActionError> {
        let check = self.cost_guard.check_limits(session_id).await;
        if let Some(reason) = check.reason {
            return Err(ActionError::BudgetExceeded { reason });
        }

        let reply = self.narrator.send(system_prompt, context, text).await?;

        if let Err(e) = self.cost_guard.increment_usage(session_id, reply.usage).await {
            tracing::warn!(session_id = %session_id, error = %e, "Failed to record narrator usage");
        }
        Ok(reply)
    }
}
