//! etcd 撤销存储后端
//!
//! TTL 通过 lease 实现：先申请 lease，再把标记挂到 lease 上写入。

use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use etcd_client::{Client, ConnectOptions, PutOptions};
use tracing::debug;

use super::{DEFAULT_KEY_PREFIX, RevocationStore, marker_key, ttl_secs};
use crate::error::InfraResult;

pub struct EtcdRevocationStore {
    // etcd_client::Client is a cheap handle over shared channels
    client: Client,
    prefix: String,
}

impl EtcdRevocationStore {
    /// 连接 etcd，`timeout` 同时作用于建连和每次请求
    pub async fn connect(endpoints: &[String], timeout: Duration) -> InfraResult<Self> {
        Self::connect_with_prefix(endpoints, timeout, DEFAULT_KEY_PREFIX).await
    }

    pub async fn connect_with_prefix(
        endpoints: &[String],
        timeout: Duration,
        prefix: impl Into<String>,
    ) -> InfraResult<Self> {
        if endpoints.is_empty() {
            return Err(anyhow!("etcd endpoints not configured"));
        }

        let options = ConnectOptions::new()
            .with_connect_timeout(timeout)
            .with_timeout(timeout);
        let client = Client::connect(endpoints, Some(options))
            .await
            .map_err(|err| anyhow!("failed to connect to etcd {endpoints:?}: {err}"))?;

        Ok(Self {
            client,
            prefix: prefix.into(),
        })
    }
}

#[async_trait]
impl RevocationStore for EtcdRevocationStore {
    async fn write_with_ttl(&self, key: &str, ttl: Duration) -> InfraResult<()> {
        let ttl_secs = i64::try_from(ttl_secs(ttl)?).context("ttl out of range for etcd lease")?;
        let mut client = self.client.clone();

        let lease = client
            .lease_grant(ttl_secs, None)
            .await
            .map_err(|err| anyhow!("failed to grant etcd lease: {err}"))?;
        debug!(lease_id = lease.id(), granted_ttl = lease.ttl(), "etcd lease granted");

        client
            .put(
                marker_key(&self.prefix, key),
                "",
                Some(PutOptions::new().with_lease(lease.id())),
            )
            .await
            .map_err(|err| anyhow!("failed to write etcd key: {err}"))?;

        Ok(())
    }

    async fn exists(&self, key: &str) -> InfraResult<bool> {
        let mut client = self.client.clone();
        let resp = client
            .get(marker_key(&self.prefix, key), None)
            .await
            .map_err(|err| anyhow!("failed to read etcd key: {err}"))?;

        // a missing key is an empty result, not an error
        Ok(!resp.kvs().is_empty())
    }
}
