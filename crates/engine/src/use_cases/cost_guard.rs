//! Daily token budget for narrator calls.
//!
//! Two counters per UTC day: one shared by every session and one per session.
//! Each counter record carries its own expiry so old days age out of the store.
//!
//! | scope | pk | sk |
//! |---|---|---|
//! | global | `USAGE#GLOBAL` | `DAY#<yyyy-mm-dd>` |
//! | session | `USAGE#SESSION#<session_id>` | `DAY#<yyyy-mm-dd>` |

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use questline_domain::SessionId;

use crate::infrastructure::ports::{
    ClockPort, KeyValueStore, RepoError, StoredRecord, TokenUsage, UsageError,
};
use crate::infrastructure::settings::EngineConfig;

const GLOBAL_PARTITION: &str = "USAGE#GLOBAL";
const INPUT_TOKENS: &str = "input_tokens";
const OUTPUT_TOKENS: &str = "output_tokens";
const REQUEST_COUNT: &str = "request_count";

/// Usage share of a ceiling at which an advisory is logged.
const ADVISORY_PERCENT: u64 = 80;

/// Why a narrator call was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitReason {
    GlobalLimit,
    SessionLimit,
}

impl LimitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GlobalLimit => "global_limit",
            Self::SessionLimit => "session_limit",
        }
    }
}

impl std::fmt::Display for LimitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One day's counters for one scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub request_count: u64,
}

impl DailyUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    fn from_record(record: &StoredRecord) -> Self {
        let read = |field: &str| u64::try_from(record.counter(field)).unwrap_or(0);
        Self {
            input_tokens: read(INPUT_TOKENS),
            output_tokens: read(OUTPUT_TOKENS),
            request_count: read(REQUEST_COUNT),
        }
    }
}

/// Outcome of a pre-call budget check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitCheck {
    pub reason: Option<LimitReason>,
    pub global: DailyUsage,
    pub session: DailyUsage,
}

impl LimitCheck {
    pub fn allowed(&self) -> bool {
        self.reason.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageLimits {
    pub global_daily_tokens: u64,
    pub session_daily_tokens: u64,
    pub global_ttl: Duration,
    pub session_ttl: Duration,
}

impl UsageLimits {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            global_daily_tokens: config.global_daily_token_limit,
            session_daily_tokens: config.session_daily_token_limit,
            global_ttl: Duration::days(config.global_usage_ttl_days),
            session_ttl: Duration::days(config.session_usage_ttl_days),
        }
    }
}

impl Default for UsageLimits {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

pub struct CostGuard {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn ClockPort>,
    limits: UsageLimits,
}

impl CostGuard {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn ClockPort>,
        limits: UsageLimits,
    ) -> Self {
        Self {
            store,
            clock,
            limits,
        }
    }

    pub fn limits(&self) -> &UsageLimits {
        &self.limits
    }

    /// Decide whether the next narrator call for `session_id` may go out.
    ///
    /// The global ceiling is checked first. Counters that cannot be read
    /// count as zero.
    pub async fn check_limits(&self, session_id: SessionId) -> LimitCheck {
        let day = day_key(self.clock.now());
        let global = self.read_or_zero(GLOBAL_PARTITION, &day).await;
        let session = self
            .read_or_zero(&session_partition(session_id), &day)
            .await;

        let reason = if global.total_tokens() >= self.limits.global_daily_tokens {
            Some(LimitReason::GlobalLimit)
        } else if session.total_tokens() >= self.limits.session_daily_tokens {
            Some(LimitReason::SessionLimit)
        } else {
            None
        };

        match reason {
            Some(reason) => tracing::warn!(
                session_id = %session_id,
                reason = %reason,
                global_tokens = global.total_tokens(),
                session_tokens = session.total_tokens(),
                "Narrator budget exhausted"
            ),
            None => {
                if near_limit(global.total_tokens(), self.limits.global_daily_tokens) {
                    tracing::warn!(
                        tokens = global.total_tokens(),
                        limit = self.limits.global_daily_tokens,
                        "Global narrator usage above {}% of daily limit",
                        ADVISORY_PERCENT
                    );
                }
                if near_limit(session.total_tokens(), self.limits.session_daily_tokens) {
                    tracing::warn!(
                        session_id = %session_id,
                        tokens = session.total_tokens(),
                        limit = self.limits.session_daily_tokens,
                        "Session narrator usage above {}% of daily limit",
                        ADVISORY_PERCENT
                    );
                }
            }
        }

        LimitCheck {
            reason,
            global,
            session,
        }
    }

    /// Add one call's tokens to both scopes.
    ///
    /// Both scopes are attempted; the first failure is returned.
    pub async fn increment_usage(
        &self,
        session_id: SessionId,
        usage: TokenUsage,
    ) -> Result<(), UsageError> {
        let now = self.clock.now();
        let day = day_key(now);
        let deltas = BTreeMap::from([
            (INPUT_TOKENS.to_string(), i64::from(usage.prompt_tokens)),
            (OUTPUT_TOKENS.to_string(), i64::from(usage.completion_tokens)),
            (REQUEST_COUNT.to_string(), 1),
        ]);

        let global = self
            .store
            .add_counters(
                GLOBAL_PARTITION,
                &day,
                deltas.clone(),
                Some(now + self.limits.global_ttl),
            )
            .await
            .map(|_| ())
            .map_err(|source| UsageError::Store {
                scope: "global".to_string(),
                source,
            });

        let session = self
            .store
            .add_counters(
                &session_partition(session_id),
                &day,
                deltas,
                Some(now + self.limits.session_ttl),
            )
            .await
            .map(|_| ())
            .map_err(|source| UsageError::Store {
                scope: format!("session {}", session_id),
                source,
            });

        global.and(session)
    }

    /// Today's counters for one session.
    pub async fn session_usage(&self, session_id: SessionId) -> Result<DailyUsage, RepoError> {
        let day = day_key(self.clock.now());
        self.read(&session_partition(session_id), &day).await
    }

    async fn read(&self, pk: &str, sk: &str) -> Result<DailyUsage, RepoError> {
        Ok(self
            .store
            .get(pk, sk)
            .await?
            .map(|record| DailyUsage::from_record(&record))
            .unwrap_or_default())
    }

    async fn read_or_zero(&self, pk: &str, sk: &str) -> DailyUsage {
        match self.read(pk, sk).await {
            Ok(usage) => usage,
            Err(e) => {
                tracing::warn!(pk, sk, error = %e, "Usage counter unreadable, treating as zero");
                DailyUsage::default()
            }
        }
    }
}

fn session_partition(session_id: SessionId) -> String {
    format!("USAGE#SESSION#{}", session_id)
}

fn day_key(now: DateTime<Utc>) -> String {
    format!("DAY#{}", now.format("%Y-%m-%d"))
}

fn near_limit(tokens: u64, limit: u64) -> bool {
    tokens.saturating_mul(100) >= limit.saturating_mul(ADVISORY_PERCENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_store::InMemoryStore;
    use crate::infrastructure::ports::{MockClockPort, MockKeyValueStore};
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    fn clock_at(now: DateTime<Utc>) -> Arc<MockClockPort> {
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(move || now);
        Arc::new(clock)
    }

    fn limits(global: u64, session: u64) -> UsageLimits {
        UsageLimits {
            global_daily_tokens: global,
            session_daily_tokens: session,
            global_ttl: Duration::days(90),
            session_ttl: Duration::days(7),
        }
    }

    fn usage(prompt: u32, completion: u32) -> TokenUsage {
        TokenUsage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt + completion,
        }
    }

    fn guard(now: DateTime<Utc>, limits: UsageLimits) -> (CostGuard, Arc<InMemoryStore>) {
        let clock = clock_at(now);
        let store = Arc::new(InMemoryStore::new(clock.clone()));
        (CostGuard::new(store.clone(), clock, limits), store)
    }

    #[tokio::test]
    async fn fresh_day_is_allowed() {
        let (guard, _) = guard(at(14, 9), limits(1000, 100));

        let check = guard.check_limits(SessionId::new()).await;

        assert!(check.allowed());
        assert_eq!(check.global, DailyUsage::default());
    }

    #[tokio::test]
    async fn session_ceiling_blocks_only_that_session() {
        let (guard, _) = guard(at(14, 9), limits(1000, 100));
        let busy = SessionId::new();
        guard.increment_usage(busy, usage(80, 20)).await.unwrap();

        let check = guard.check_limits(busy).await;
        assert_eq!(check.reason, Some(LimitReason::SessionLimit));
        assert_eq!(check.session.total_tokens(), 100);

        assert!(guard.check_limits(SessionId::new()).await.allowed());
    }

    #[tokio::test]
    async fn global_ceiling_wins_when_both_are_exceeded() {
        let (guard, _) = guard(at(14, 9), limits(150, 100));
        let session = SessionId::new();
        guard.increment_usage(session, usage(100, 60)).await.unwrap();

        let check = guard.check_limits(session).await;

        assert!(!check.allowed());
        assert_eq!(check.reason, Some(LimitReason::GlobalLimit));
        assert_eq!(check.reason.map(|r| r.as_str()), Some("global_limit"));
    }

    #[tokio::test]
    async fn global_usage_accumulates_across_sessions() {
        let (guard, _) = guard(at(14, 9), limits(100, 1000));
        guard.increment_usage(SessionId::new(), usage(30, 20)).await.unwrap();
        guard.increment_usage(SessionId::new(), usage(30, 20)).await.unwrap();

        let check = guard.check_limits(SessionId::new()).await;

        assert_eq!(check.global.request_count, 2);
        assert_eq!(check.reason, Some(LimitReason::GlobalLimit));
    }

    #[tokio::test]
    async fn counters_roll_over_at_utc_midnight() {
        let session = SessionId::new();
        let clock_store = {
            let (guard, store) = guard(at(14, 23), limits(1000, 100));
            guard.increment_usage(session, usage(90, 10)).await.unwrap();
            store
        };
        assert_eq!(clock_store.len(), 2);

        let (next_day, _) = guard(at(15, 0), limits(1000, 100));
        assert!(next_day.check_limits(session).await.allowed());
    }

    #[tokio::test]
    async fn counter_records_carry_scope_ttls() {
        let now = at(14, 9);
        let (guard, store) = guard(now, limits(1000, 100));
        let session = SessionId::new();
        guard.increment_usage(session, usage(5, 5)).await.unwrap();

        let global = store.get(GLOBAL_PARTITION, "DAY#2026-10-14").await.unwrap().unwrap();
        let scoped = store
            .get(&session_partition(session), "DAY#2026-10-14")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(global.expires_at, Some(now + Duration::days(90)));
        assert_eq!(scoped.expires_at, Some(now + Duration::days(7)));
        assert_eq!(scoped.counter("input_tokens"), 5);
        assert_eq!(scoped.counter("request_count"), 1);
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_usage_error() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_add_counters()
            .returning(|_, _, _, _| Err(RepoError::database("add_counters", "throttled")));
        let guard = CostGuard::new(Arc::new(store), clock_at(at(14, 9)), limits(10, 10));

        let result = guard.increment_usage(SessionId::new(), usage(1, 1)).await;

        match result {
            Err(UsageError::Store { scope, .. }) => assert_eq!(scope, "global"),
            other => panic!("expected usage error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreadable_counters_do_not_block_play() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .returning(|_, _| Err(RepoError::database("get", "timeout")));
        let guard = CostGuard::new(Arc::new(store), clock_at(at(14, 9)), limits(10, 10));

        assert!(guard.check_limits(SessionId::new()).await.allowed());
    }

    #[test]
    fn advisory_threshold_is_eighty_percent() {
        assert!(!near_limit(79, 100));
        assert!(near_limit(80, 100));
        assert!(near_limit(95, 100));
    }
}
