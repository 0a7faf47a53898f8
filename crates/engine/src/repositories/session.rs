//! Game session persistence wrapper.

use std::sync::Arc;

use questline_domain::{GameSession, SessionId};

use super::{user_partition, SESSION_PREFIX};
use crate::infrastructure::ports::{KeyValueStore, RepoError};

/// Session storage for use cases.
pub struct SessionRepository {
    store: Arc<dyn KeyValueStore>,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get(
        &self,
        user_id: &str,
        id: SessionId,
    ) -> Result<Option<GameSession>, RepoError> {
        let Some(record) = self
            .store
            .get(&user_partition(user_id), &sort_key(id))
            .await?
        else {
            return Ok(None);
        };
        serde_json::from_value(record.data)
            .map(Some)
            .map_err(RepoError::serialization)
    }

    /// Upsert under the session's own user partition.
    pub async fn save(&self, session: &GameSession) -> Result<(), RepoError> {
        let data = serde_json::to_value(session).map_err(RepoError::serialization)?;
        self.store
            .put(
                &user_partition(session.user_id()),
                &sort_key(session.id()),
                data,
                None,
            )
            .await
    }
}

fn sort_key(id: SessionId) -> String {
    format!("{}{}", SESSION_PREFIX, id)
}
