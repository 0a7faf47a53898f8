//! Character persistence wrapper.

use std::sync::Arc;

use questline_domain::{CharacterId, CharacterState};

use super::{user_partition, CHARACTER_PREFIX};
use crate::infrastructure::ports::{KeyValueStore, RepoError};

/// Character storage for use cases.
pub struct CharacterRepository {
    store: Arc<dyn KeyValueStore>,
}

impl CharacterRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get(
        &self,
        user_id: &str,
        id: CharacterId,
    ) -> Result<Option<CharacterState>, RepoError> {
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

    pub async fn save(
        &self,
        user_id: &str,
        character: &CharacterState,
    ) -> Result<(), RepoError> {
        let data = serde_json::to_value(character).map_err(RepoError::serialization)?;
        self.store
            .put(&user_partition(user_id), &sort_key(character.id()), data, None)
            .await
    }
}

fn sort_key(id: CharacterId) -> String {
    format!("{}{}", CHARACTER_PREFIX, id)
}
