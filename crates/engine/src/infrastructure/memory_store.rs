//! In-memory key-value store for development and testing
//!
//! Partitions are DashMap shards; records inside a partition are kept in a
//! BTreeMap so prefix queries come back in sort-key order. Nothing is
//! persisted across restarts.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::infrastructure::ports::{ClockPort, KeyValueStore, RepoError, StoredRecord};

pub struct InMemoryStore {
    partitions: DashMap<String, BTreeMap<String, StoredRecord>>,
    clock: Arc<dyn ClockPort>,
}

impl InMemoryStore {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            partitions: DashMap::new(),
            clock,
        }
    }

    /// Number of live records across all partitions.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.partitions
            .iter()
            .map(|p| p.values().filter(|r| !r.is_expired(now)).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, pk: &str, sk: &str) -> Result<Option<StoredRecord>, RepoError> {
        let now = self.clock.now();
        Ok(self
            .partitions
            .get(pk)
            .and_then(|partition| partition.get(sk).cloned())
            .filter(|record| !record.is_expired(now)))
    }

    async fn put(
        &self,
        pk: &str,
        sk: &str,
        data: serde_json::Value,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepoError> {
        let record = StoredRecord {
            data,
            updated_at: self.clock.now(),
            expires_at,
        };
        self.partitions
            .entry(pk.to_string())
            .or_default()
            .insert(sk.to_string(), record);
        Ok(())
    }

    async fn update(
        &self,
        pk: &str,
        sk: &str,
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> Result<StoredRecord, RepoError> {
        let now = self.clock.now();
        let key = format!("{}/{}", pk, sk);
        let mut partition = self
            .partitions
            .get_mut(pk)
            .ok_or_else(|| RepoError::not_found("Record", &key))?;
        let record = partition
            .get_mut(sk)
            .filter(|record| !record.is_expired(now))
            .ok_or_else(|| RepoError::not_found("Record", &key))?;

        let object = record.data.as_object_mut().ok_or_else(|| {
            RepoError::database("update", format!("record {} is not an object", key))
        })?;
        for (field, value) in fields {
            object.insert(field, value);
        }
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn query_by_prefix(
        &self,
        pk: &str,
        sk_prefix: &str,
    ) -> Result<Vec<(String, StoredRecord)>, RepoError> {
        let now = self.clock.now();
        let Some(partition) = self.partitions.get(pk) else {
            return Ok(Vec::new());
        };
        Ok(partition
            .range(sk_prefix.to_string()..)
            .take_while(|(sk, _)| sk.starts_with(sk_prefix))
            .filter(|(_, record)| !record.is_expired(now))
            .map(|(sk, record)| (sk.clone(), record.clone()))
            .collect())
    }

    async fn add_counters(
        &self,
        pk: &str,
        sk: &str,
        deltas: BTreeMap<String, i64>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<StoredRecord, RepoError> {
        let now = self.clock.now();
        // The partition entry guard is held for the whole read-modify-write.
        let mut partition = self.partitions.entry(pk.to_string()).or_default();

        let fresh = || StoredRecord {
            data: serde_json::Value::Object(serde_json::Map::new()),
            updated_at: now,
            expires_at,
        };
        let record = partition.entry(sk.to_string()).or_insert_with(fresh);
        if record.is_expired(now) {
            *record = fresh();
        }

        let object = record.data.as_object_mut().ok_or_else(|| {
            RepoError::database("add_counters", format!("record {}/{} is not an object", pk, sk))
        })?;
        for (field, delta) in deltas {
            let current = object.get(&field).and_then(|v| v.as_i64()).unwrap_or(0);
            object.insert(field, serde_json::Value::from(current.saturating_add(delta)));
        }
        record.updated_at = now;
        Ok(record.clone())
    }
}
