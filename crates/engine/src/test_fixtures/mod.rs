//! Test fixtures and common test helpers.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::{fighter, TestHarness};
//!
//! #[tokio::test]
//! async fn test_walk_outside() {
//!     let harness = TestHarness::new(vec![Ok("It is raining.".into())]);
//!     let session_id = harness.seed(fighter(12)).await;
//!     // ... drive harness.app.use_cases
//! }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use questline_domain::{AbilityScores, CharacterClass, CharacterState, GameSession, SessionId};

use crate::app::App;
use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::memory_store::InMemoryStore;
use crate::infrastructure::ports::{
    FinishReason, LlmError, LlmPort, LlmRequest, LlmResponse, RandomPort, TokenUsage,
};
use crate::infrastructure::settings::EngineConfig;

// =============================================================================
// Scripted Ports
// =============================================================================

/// Random source that replays queued values, then falls back to `min`.
///
/// Values are clamped into the requested range.
#[derive(Default)]
pub struct ScriptedRandom {
    values: Mutex<VecDeque<i32>>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
        }
    }

    pub fn push(&self, values: impl IntoIterator<Item = i32>) {
        self.values.lock().unwrap().extend(values);
    }

    pub fn remaining(&self) -> usize {
        self.values.lock().unwrap().len()
    }
}

impl RandomPort for ScriptedRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        match self.values.lock().unwrap().pop_front() {
            Some(v) => v.clamp(min, max.max(min)),
            None => min,
        }
    }
}

/// Usage reported for every scripted reply.
pub const SCRIPTED_USAGE: TokenUsage = TokenUsage {
    prompt_tokens: 120,
    completion_tokens: 60,
    total_tokens: 180,
};

/// Narrator that replays queued replies and records every request.
///
/// An exhausted script answers with `LlmError::Unavailable`.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, reply: Result<String, LlmError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmPort for ScriptedLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Unavailable("script exhausted".to_string())));
        reply.map(|content| LlmResponse {
            content,
            finish_reason: FinishReason::Stop,
            usage: Some(SCRIPTED_USAGE),
        })
    }
}

// =============================================================================
// Characters
// =============================================================================

/// Fixed instant all harness clocks report.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 18, 30, 0).unwrap()
}

/// Level 1 fighter, STR 16 (+2), 12 max HP, 50 gold.
pub fn fighter(hp: i32) -> CharacterState {
    CharacterState::new(
        "Brannoc",
        CharacterClass::Fighter,
        AbilityScores::new(16, 12, 14, 10, 10, 8),
        12,
    )
    .unwrap()
    .with_hp(hp)
    .with_gold(50)
}

// =============================================================================
// Harness
// =============================================================================

/// A fully wired `App` over the in-memory store, a fixed clock and scripted
/// narrator and dice.
pub struct TestHarness {
    pub app: App,
    pub store: Arc<InMemoryStore>,
    pub llm: Arc<ScriptedLlm>,
    pub random: Arc<ScriptedRandom>,
    pub config: EngineConfig,
}

impl TestHarness {
    pub const USER: &'static str = "user-1";

    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self::with_config(replies, EngineConfig::default())
    }

    pub fn with_config(replies: Vec<Result<String, LlmError>>, config: EngineConfig) -> Self {
        let clock = Arc::new(FixedClock(test_now()));
        let store = Arc::new(InMemoryStore::new(clock.clone()));
        let llm = Arc::new(ScriptedLlm::new(replies));
        let random = Arc::new(ScriptedRandom::default());
        let app = App::new(store.clone(), llm.clone(), clock, random.clone(), &config);
        Self {
            app,
            store,
            llm,
            random,
            config,
        }
    }

    /// Persist `character` with a fresh session at the inn.
    pub async fn seed(&self, character: CharacterState) -> SessionId {
        self.seed_session(character, |_| {}).await
    }

    /// Persist `character` with a session shaped by `prepare` first.
    pub async fn seed_session<F>(&self, character: CharacterState, prepare: F) -> SessionId
    where
        F: FnOnce(&mut GameSession),
    {
        let mut session =
            GameSession::new(Self::USER, character.id(), "The Crossroads Inn", test_now());
        prepare(&mut session);
        self.app
            .repositories
            .characters
            .save(Self::USER, &character)
            .await
            .unwrap();
        self.app.repositories.sessions.save(&session).await.unwrap();
        session.id()
    }

    pub async fn session(&self, session_id: SessionId) -> GameSession {
        self.app
            .repositories
            .sessions
            .get(Self::USER, session_id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn character(&self, session_id: SessionId) -> CharacterState {
        let session = self.session(session_id).await;
        self.app
            .repositories
            .characters
            .get(Self::USER, session.character_id())
            .await
            .unwrap()
            .unwrap()
    }
}
