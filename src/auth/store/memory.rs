//! 进程内撤销存储
//!
//! 仅用于开发环境和测试：标记不会在多个实例之间共享。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use super::{RevocationStore, ttl_secs};
use crate::clock::{Clock, SystemClock};
use crate::error::InfraResult;

pub struct MemoryRevocationStore {
    markers: RwLock<HashMap<String, DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            markers: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of markers that have not yet expired.
    pub async fn len(&self) -> usize {
        let now = self.clock.now();
        let markers = self.markers.read().await;
        markers.values().filter(|expiry| **expiry > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryRevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn write_with_ttl(&self, key: &str, ttl: Duration) -> InfraResult<()> {
        let ttl_secs = i64::try_from(ttl_secs(ttl)?)?;
        let now = self.clock.now();
        let expiry = TimeDelta::try_seconds(ttl_secs)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| anyhow!("marker ttl of {ttl_secs}s is out of range"))?;

        let mut markers = self.markers.write().await;
        markers.retain(|_, expiry| *expiry > now);
        markers.insert(key.to_string(), expiry);
        Ok(())
    }

    async fn exists(&self, key: &str) -> InfraResult<bool> {
        let now = self.clock.now();
        let markers = self.markers.read().await;
        Ok(markers.get(key).is_some_and(|expiry| *expiry > now))
    }
}
