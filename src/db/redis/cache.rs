use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    MovieDetails(u64),
    ResetCode(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::MovieDetails(id) => write!(f, "movie:{}", id),
            CacheKey::ResetCode(email) => write!(f, "reset:{}", email.trim().to_lowercase()),
        }
    }
}

/// Creates a Redis client
///
/// The client does not connect until first use.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Queued cache write
struct PendingWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// Read-through cache for catalog lookups
///
/// Reads go straight to Redis; writes are handed to a background task so a
/// slow or unavailable Redis never delays a response.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    writer: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Asks the writer to flush queued writes and waits until it has stopped
    pub async fn shutdown(self) {
        // Fails only if the writer already exited
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");

        if let Err(e) = self.writer.await {
            tracing::error!(error = %e, "Cache writer task failed");
        }
    }
}

impl Cache {
    /// Creates the cache and spawns its writer task
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        let writer = tokio::spawn(async move {
            Self::run_writer(client, write_rx, shutdown_rx).await;
        });

        (
            Self {
                redis_client,
                write_tx,
            },
            CacheWriterHandle {
                shutdown_tx,
                writer,
            },
        )
    }

    async fn run_writer(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::debug!("Cache writer started");

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => {
                    let key = write.key.clone();
                    if let Err(e) = Self::write(&client, write).await {
                        tracing::warn!(error = %e, key = %key, "Cache write failed");
                    }
                }
                Some(()) = shutdown_rx.recv() => {
                    // Stop accepting, then drain what is already queued
                    write_rx.close();
                    let mut flushed = 0usize;
                    while let Some(write) = write_rx.recv().await {
                        if let Err(e) = Self::write(&client, write).await {
                            tracing::warn!(error = %e, "Cache write failed during shutdown");
                        } else {
                            flushed += 1;
                        }
                    }
                    tracing::info!(flushed, "Cache writer stopped");
                    break;
                }
                else => break,
            }
        }
    }

    async fn write(client: &Client, write: PendingWrite) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(write.key, write.value, write.ttl).await?;
        Ok(())
    }

    /// Returns the cached value for `key`, or `None` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        cached
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })
            })
            .transpose()
    }

    /// Queues a write without waiting for Redis
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let value = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            value,
            ttl,
        };

        if self.write_tx.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer is gone; dropping write");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display_movie_details() {
        let key = CacheKey::MovieDetails(27205);
        assert_eq!(key.to_string(), "movie:27205");
    }

    #[test]
    fn test_cache_key_display_reset_code_normalizes_email() {
        let key = CacheKey::ResetCode(" Neo@Example.COM ".to_string());
        assert_eq!(key.to_string(), "reset:neo@example.com");
    }

    #[tokio::test]
    async fn test_set_in_background_after_shutdown_does_not_panic() {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, handle) = Cache::new(client);

        handle.shutdown().await;

        cache.set_in_background(&CacheKey::MovieDetails(1), &"value", 60);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_writer_to_drain() {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, handle) = Cache::new(client);

        for id in 0..3 {
            cache.set_in_background(&CacheKey::MovieDetails(id), &"value", 60);
        }
        handle.shutdown().await;

        // The writer has exited, so its receiver is gone
        assert!(cache.write_tx.is_closed());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_set_in_background_writes_to_cache() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = create_redis_client(&redis_url).unwrap();
        let (cache, handle) = Cache::new(client.clone());

        let key = CacheKey::MovieDetails(999_999_001);
        let value = vec!["Leonardo DiCaprio".to_string()];

        cache.set_in_background(&key, &value, 60);
        // Returns only after the queued write has been flushed
        handle.shutdown().await;

        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key.to_string()).await.unwrap();
    }
}
