//! 错误代码定义
//!
//! 错误代码按类别分组，每个类别占用1000个代码范围：
//! - 2000-2999: 认证相关错误
//! - 6000-6999: 系统相关错误

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 错误代码枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ErrorCode {
    // ============================================================
    // 认证相关错误 (2000-2999)
    // ============================================================
    AuthenticationFailed = 2000,
    TokenInvalid = 2005,
    TokenExpired = 2006,
    TokenRevoked = 2007,
    TokenMalformed = 2008,

    // ============================================================
    // 系统相关错误 (6000-6999)
    // ============================================================
    InternalError = 6000,
    ServiceUnavailable = 6001,
    ConfigurationError = 6003,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    /// 获取错误代码的数字值
    #[inline]
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ErrorCode::TokenInvalid => "TOKEN_INVALID",
            ErrorCode::TokenExpired => "TOKEN_EXPIRED",
            ErrorCode::TokenRevoked => "TOKEN_REVOKED",
            ErrorCode::TokenMalformed => "TOKEN_MALFORMED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }

    /// 是否属于认证类错误（2000-2999）
    pub fn is_authentication(&self) -> bool {
        (2000..3000).contains(&self.as_u32())
    }

    /// 映射到传输层 HTTP 状态码
    ///
    /// All authentication-class codes collapse to 401 so callers cannot
    /// tell a bad secret from an expired or revoked token.
    pub fn http_status(&self) -> StatusCode {
        if self.is_authentication() {
            return StatusCode::UNAUTHORIZED;
        }
        match self {
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_codes_share_one_status() {
        for code in [
            ErrorCode::AuthenticationFailed,
            ErrorCode::TokenInvalid,
            ErrorCode::TokenExpired,
            ErrorCode::TokenRevoked,
            ErrorCode::TokenMalformed,
        ] {
            assert_eq!(code.http_status(), StatusCode::UNAUTHORIZED, "{code}");
        }
    }

    #[test]
    fn system_codes_map_to_server_errors() {
        assert_eq!(
            ErrorCode::ServiceUnavailable.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ErrorCode::ConfigurationError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
