use std::time::Duration;

use async_trait::async_trait;

use crate::error::InfraResult;

#[cfg(feature = "etcd")]
pub mod etcd;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "etcd")]
pub use etcd::EtcdRevocationStore;
pub use memory::MemoryRevocationStore;
#[cfg(feature = "redis")]
pub use redis::RedisRevocationStore;

/// 撤销标记的默认键前缀
pub const DEFAULT_KEY_PREFIX: &str = "/revoked-tokens/";

/// 撤销存储接口
///
/// 标记只写一次，由存储自身按 TTL 过期删除，不提供显式删除。
/// 键不存在（或已过期）返回 `false`，不是错误；任何连接失败都返回 `Err`。
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// 写入撤销标记，`ttl` 到期后由存储自动删除
    async fn write_with_ttl(&self, key: &str, ttl: Duration) -> InfraResult<()>;

    /// 检查撤销标记是否存在
    async fn exists(&self, key: &str) -> InfraResult<bool>;
}

/// Builds the store key for a revoked token.
pub fn marker_key(prefix: &str, token: &str) -> String {
    format!("{prefix}{token}")
}

/// Whole seconds of `ttl`; zero is refused so a marker can never be written
/// without an expiry.
pub(crate) fn ttl_secs(ttl: Duration) -> InfraResult<u64> {
    match ttl.as_secs() {
        0 => anyhow::bail!("refusing to write revocation marker with zero ttl"),
        secs => Ok(secs),
    }
}
