//! Redis service for session-scoped counters

use redis::{AsyncCommands, Client};

use crate::error::{AppError, AppResult};

/// Session counters expire after thirty days of inactivity
const SESSION_TTL_SECONDS: i64 = 30 * 24 * 3600;

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    /// Create a new Redis service
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client })
    }

    /// Increment and return the visit counter of one session
    pub async fn incr_session_visits(&self, session_id: &str) -> AppResult<i64> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))?;

        let key = format!("session:{}:visits", session_id);
        let visits: i64 = conn
            .incr(&key, 1)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to increment visit counter: {}", e)))?;

        conn.expire::<_, ()>(&key, SESSION_TTL_SECONDS)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to refresh session TTL: {}", e)))?;

        Ok(visits)
    }
}
