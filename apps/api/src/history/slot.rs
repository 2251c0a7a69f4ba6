//! Durable key-value slot holding the whole history list as one JSON array.

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::Mutex;

use crate::history::HistoryError;
use crate::models::history::HistoryEntry;

/// Storage for the serialized history list, most recent first.
#[async_trait]
pub trait HistorySlot: Send + Sync {
    async fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError>;
    async fn store(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError>;
}

/// Redis-backed slot. Survives process restarts.
pub struct RedisSlot {
    client: redis::Client,
    key: String,
}

impl RedisSlot {
    pub fn new(client: redis::Client, key: impl Into<String>) -> Self {
        Self {
            client,
            key: key.into(),
        }
    }
}

#[async_trait]
impl HistorySlot for RedisSlot {
    async fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(&self.key).await?;
        decode(raw)
    }

    async fn store(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let payload = serde_json::to_string(entries)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(&self.key, payload).await?;
        Ok(())
    }
}

/// Process-local slot. Holds the same serialized form as `RedisSlot`.
#[derive(Default)]
pub struct MemorySlot {
    raw: Mutex<Option<String>>,
}

#[async_trait]
impl HistorySlot for MemorySlot {
    async fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        decode(self.raw.lock().await.clone())
    }

    async fn store(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let payload = serde_json::to_string(entries)?;
        *self.raw.lock().await = Some(payload);
        Ok(())
    }
}

fn decode(raw: Option<String>) -> Result<Vec<HistoryEntry>, HistoryError> {
    match raw {
        Some(json) if !json.trim().is_empty() => Ok(serde_json::from_str(&json)?),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_empty_slot() {
        assert!(decode(None).unwrap().is_empty());
        assert!(decode(Some(String::new())).unwrap().is_empty());
    }

    #[test]
    fn test_decode_corrupt_slot_is_error() {
        assert!(matches!(
            decode(Some("{not json".to_string())),
            Err(HistoryError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_slot_round_trip() {
        let slot = MemorySlot::default();
        assert!(slot.load().await.unwrap().is_empty());
        slot.store(&[]).await.unwrap();
        assert!(slot.load().await.unwrap().is_empty());
    }
}
