//! Key-value persistence port.
//!
//! Records live under a partition key and a sort key, e.g.
//! (`USER#alice`, `SESS#<uuid>`) or (`USAGE#GLOBAL`, `DAY#2026-10-14`).
//! A record past its `expires_at` reads as absent.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepoError;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub data: serde_json::Value,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Integer field of an object record, 0 when missing.
    pub fn counter(&self, field: &str) -> i64 {
        self.data.get(field).and_then(|v| v.as_i64()).unwrap_or(0)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, pk: &str, sk: &str) -> Result<Option<StoredRecord>, RepoError>;

    /// Insert or replace. Stamps `updated_at`.
    async fn put(
        &self,
        pk: &str,
        sk: &str,
        data: serde_json::Value,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepoError>;

    /// Merge top-level fields into an existing object record.
    ///
    /// Fails with `NotFound` when the record is absent or expired.
    async fn update(
        &self,
        pk: &str,
        sk: &str,
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> Result<StoredRecord, RepoError>;

    /// Live records in a partition whose sort key starts with `sk_prefix`,
    /// ordered by sort key.
    async fn query_by_prefix(
        &self,
        pk: &str,
        sk_prefix: &str,
    ) -> Result<Vec<(String, StoredRecord)>, RepoError>;

    /// Atomically add to integer fields, creating the record when absent.
    ///
    /// `expires_at` is set when the record is created and left alone afterwards.
    async fn add_counters(
        &self,
        pk: &str,
        sk: &str,
        deltas: BTreeMap<String, i64>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<StoredRecord, RepoError>;
}
