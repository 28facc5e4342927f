use std::future::Future;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{DEFAULT_KEY_PREFIX, RevocationStore, marker_key, ttl_secs};

pub struct RedisRevocationStore {
    conn: ConnectionManager,
    prefix: String,
    timeout: Duration,
}

impl RedisRevocationStore {
    pub async fn connect(url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        Self::connect_with_prefix(url, timeout, DEFAULT_KEY_PREFIX).await
    }

    pub async fn connect_with_prefix(
        url: impl AsRef<str>,
        timeout: Duration,
        prefix: impl Into<String>,
    ) -> Result<Self> {
        let client = redis::Client::open(url.as_ref())
            .map_err(|err| anyhow!("failed to open redis client: {err}"))?;
        let conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| anyhow!("timed out connecting to redis"))?
            .map_err(|err| anyhow!("failed to get redis connection: {err}"))?;

        Ok(Self {
            conn,
            prefix: prefix.into(),
            timeout,
        })
    }

    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| anyhow!("redis {op} timed out after {:?}", self.timeout))?
            .map_err(|err| anyhow!("redis {op} failed: {err}"))
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn write_with_ttl(&self, key: &str, ttl: Duration) -> Result<()> {
        let ttl_secs = ttl_secs(ttl)?;
        let mut conn = self.conn.clone();
        let key = marker_key(&self.prefix, key);

        self.bounded("SET EX", conn.set_ex::<_, _, ()>(key, "", ttl_secs))
            .await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let key = marker_key(&self.prefix, key);

        self.bounded("EXISTS", conn.exists::<_, bool>(key)).await
    }
}
