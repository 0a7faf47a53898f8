//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    ports::{ClockPort, KeyValueStore, LlmPort, RandomPort},
    settings::EngineConfig,
};
use crate::repositories::{CharacterRepository, Narrator, SessionRepository};
use crate::use_cases::{
    CostGuard, GetSessionView, ProcessAction, RollDice, StartSession, UsageLimits,
};

/// Main application state.
///
/// Holds all repository modules and use cases.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
}

/// Container for all repository modules.
pub struct Repositories {
    pub characters: Arc<CharacterRepository>,
    pub sessions: Arc<SessionRepository>,
    pub narrator: Arc<Narrator>,
}

/// Container for all use cases.
pub struct UseCases {
    pub process_action: Arc<ProcessAction>,
    pub start_session: Arc<StartSession>,
    pub session_view: Arc<GetSessionView>,
    pub roll_dice: Arc<RollDice>,
    pub cost_guard: Arc<CostGuard>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        llm: Arc<dyn LlmPort>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        config: &EngineConfig,
    ) -> Self {
        let characters = Arc::new(CharacterRepository::new(store.clone()));
        let sessions = Arc::new(SessionRepository::new(store.clone()));
        let narrator = Arc::new(Narrator::new(
            llm,
            config.narrator_max_tokens,
            config.narrator_temperature,
        ));
        let cost_guard = Arc::new(CostGuard::new(
            store,
            clock.clone(),
            UsageLimits::from_config(config),
        ));

        let process_action = Arc::new(ProcessAction::new(
            characters.clone(),
            sessions.clone(),
            narrator.clone(),
            cost_guard.clone(),
            clock.clone(),
            random.clone(),
            config.history_limit,
        ));
        let start_session = Arc::new(StartSession::new(
            characters.clone(),
            sessions.clone(),
            clock,
        ));
        let session_view = Arc::new(GetSessionView::new(
            characters.clone(),
            sessions.clone(),
            cost_guard.clone(),
        ));
        let roll_dice = Arc::new(RollDice::new(random));

        tracing::debug!(
            history_limit = config.history_limit,
            global_daily_tokens = config.global_daily_token_limit,
            session_daily_tokens = config.session_daily_token_limit,
            "Engine composed"
        );

        Self {
            repositories: Repositories {
                characters,
                sessions,
                narrator,
            },
            use_cases: UseCases {
                process_action,
                start_session,
                session_view,
                roll_dice,
                cost_guard,
            },
        }
    }
}
