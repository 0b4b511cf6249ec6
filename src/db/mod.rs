pub mod history;
pub mod postgres;
pub mod redis;
pub mod users;

pub use history::{HistoryRepository, PgHistoryRepository};
pub use postgres::create_pool;
pub use self::redis::create_redis_client;
pub use self::redis::Cache;
pub use self::redis::CacheKey;
pub use self::redis::{RedisResetCodeStore, ResetCodeStore};
pub use users::{PgUserRepository, UserRepository};
