//! Per-visitor session data kept in Redis

use std::sync::Arc;

use async_trait::async_trait;
use redis::Client;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const VISITS_FIELD: &str = "num_visits";

/// Key-value store backing browser sessions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Atomically add one to a session field, refreshing the session TTL; returns the new value
    async fn increment(&self, key: &str, field: &str, ttl_seconds: u64) -> AppResult<i64>;

    async fn ping(&self) -> AppResult<()>;
}

/// Redis hash per session (`session:<id>`)
#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
}

impl RedisSessionStore {
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let store = Self { client };
        store.ping().await?;
        Ok(store)
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn increment(&self, key: &str, field: &str, ttl_seconds: u64) -> AppResult<i64> {
        let mut conn = self.connection().await?;

        let (value, _): (i64, i64) = redis::pipe()
            .atomic()
            .hincr(key, field, 1)
            .expire(key, ttl_seconds as i64)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to update session in Redis: {}", e)))?;

        Ok(value)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;
        Ok(())
    }
}

/// Session operations used by the views
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    ttl_seconds: u64,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>, ttl_seconds: u64) -> Self {
        Self { store, ttl_seconds }
    }

    /// Count a landing-page visit; the first visit of a session returns 1
    pub async fn record_visit(&self, session_id: Uuid) -> AppResult<i64> {
        let key = session_key(session_id);
        self.store.increment(&key, VISITS_FIELD, self.ttl_seconds).await
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}

fn session_key(session_id: Uuid) -> String {
    format!("session:{}", session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock store that keeps counters per (key, field) like a Redis hash
    fn counting_store() -> MockSessionStore {
        let counters: Arc<Mutex<HashMap<(String, String), i64>>> = Arc::default();
        let mut store = MockSessionStore::new();
        store.expect_increment().returning(move |key, field, _| {
            let mut counters = counters.lock().unwrap();
            let value = counters.entry((key.to_string(), field.to_string())).or_insert(0);
            *value += 1;
            Ok(*value)
        });
        store
    }

    #[tokio::test]
    async fn visits_start_at_one_and_step_by_one() {
        let service = SessionService::new(Arc::new(counting_store()), 60);
        let session = Uuid::new_v4();

        for expected in 1..=5 {
            assert_eq!(service.record_visit(session).await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn sessions_are_counted_independently() {
        let service = SessionService::new(Arc::new(counting_store()), 60);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        service.record_visit(a).await.unwrap();
        service.record_visit(a).await.unwrap();
        assert_eq!(service.record_visit(b).await.unwrap(), 1);
        assert_eq!(service.record_visit(a).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn uses_session_hash_and_ttl() {
        let session = Uuid::new_v4();
        let expected_key = format!("session:{}", session);

        let mut store = MockSessionStore::new();
        store
            .expect_increment()
            .withf(move |key, field, ttl| key == expected_key && field == "num_visits" && *ttl == 3600)
            .times(1)
            .returning(|_, _, _| Ok(1));

        let service = SessionService::new(Arc::new(store), 3600);
        assert_eq!(service.record_visit(session).await.unwrap(), 1);
    }
}
