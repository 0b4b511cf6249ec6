use redis::{AsyncCommands, Client, Script};

use crate::{db::redis::CacheKey, error::AppResult};

/// Deletes the key only if it still holds the submitted code
const CONSUME_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

/// Storage for password reset codes
///
/// One live code per email. Issuing a new code replaces the old one.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ResetCodeStore: Send + Sync {
    async fn issue(&self, email: &str, code: &str, ttl_secs: u64) -> AppResult<()>;

    /// Whether `code` is the live code for the email; leaves it in place
    async fn matches(&self, email: &str, code: &str) -> AppResult<bool>;

    /// Removes the code if it matches and has not expired
    async fn consume(&self, email: &str, code: &str) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct RedisResetCodeStore {
    redis_client: Client,
}

impl RedisResetCodeStore {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }
}

#[async_trait::async_trait]
impl ResetCodeStore for RedisResetCodeStore {
    async fn issue(&self, email: &str, code: &str, ttl_secs: u64) -> AppResult<()> {
        let key = CacheKey::ResetCode(email.to_string());
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key.to_string(), code, ttl_secs).await?;
        Ok(())
    }

    async fn matches(&self, email: &str, code: &str) -> AppResult<bool> {
        let key = CacheKey::ResetCode(email.to_string());
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let stored: Option<String> = conn.get(key.to_string()).await?;
        Ok(stored.as_deref() == Some(code))
    }

    async fn consume(&self, email: &str, code: &str) -> AppResult<bool> {
        let key = CacheKey::ResetCode(email.to_string());
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let deleted: i64 = Script::new(CONSUME_SCRIPT)
            .key(key.to_string())
            .arg(code)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted > 0)
    }
}
