//! 令牌服务错误处理模块
//!
//! 业务层使用 [`TokenError`]，基础设施层（存储适配器）使用 `anyhow`，
//! 通过 [`InfraResultExt`] 在边界处转换。

pub mod code;

pub use code::ErrorCode;

use thiserror::Error;

/// 令牌生命周期中可能出现的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// 身份服务拒绝了凭据，或身份服务本身不可用（对调用方不作区分）
    #[error("authentication failed")]
    AuthenticationFailed,

    /// 签名校验失败：被篡改、密钥不同或算法不匹配
    #[error("invalid token signature")]
    InvalidSignature,

    /// 根本不是一个可解析的令牌
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token expired")]
    Expired,

    #[error("token revoked")]
    Revoked,

    /// 撤销存储不可达
    #[error("revocation store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl TokenError {
    pub fn store_unavailable(reason: impl Into<String>) -> Self {
        TokenError::StoreUnavailable(reason.into())
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        TokenError::Internal(reason.into())
    }

    /// 获取错误代码
    pub fn code(&self) -> ErrorCode {
        match self {
            TokenError::AuthenticationFailed => ErrorCode::AuthenticationFailed,
            TokenError::InvalidSignature => ErrorCode::TokenInvalid,
            TokenError::Malformed(_) => ErrorCode::TokenMalformed,
            TokenError::Expired => ErrorCode::TokenExpired,
            TokenError::Revoked => ErrorCode::TokenRevoked,
            TokenError::StoreUnavailable(_) => ErrorCode::ServiceUnavailable,
            TokenError::Configuration(_) => ErrorCode::ConfigurationError,
            TokenError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// 是否应当以 401 + Bearer challenge 的形式呈现给调用方
    pub fn is_authentication(&self) -> bool {
        self.code().is_authentication()
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, TokenError>;

/// 基础设施层默认使用的结果类型
pub type InfraResult<T> = anyhow::Result<T>;

/// `InfraResult` 的辅助扩展，用于快速转换为业务错误类型
pub trait InfraResultExt<T> {
    /// 存储层的任何失败都视为存储不可用
    fn or_store_unavailable(self) -> Result<T>;
}

impl<T> InfraResultExt<T> for InfraResult<T> {
    fn or_store_unavailable(self) -> Result<T> {
        // `{:#}` keeps the whole anyhow context chain on one line
        self.map_err(|err| TokenError::StoreUnavailable(format!("{err:#}")))
    }
}
