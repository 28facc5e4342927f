//! 服务配置
//!
//! 进程启动时按环境（`TOKEN_SERVICE_ENV`）加载 `config/<env>.toml`，
//! 之后以 `&Config` 传给日志初始化和服务启动，不再修改。

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::identity::DEFAULT_IDENTITY_PATH;
use crate::auth::service::DEFAULT_REVOCATION_MARGIN_SECS;
use crate::auth::store::DEFAULT_KEY_PREFIX;
use crate::error::{Result, TokenError};

pub const ENV_VAR: &str = "TOKEN_SERVICE_ENV";
pub const CONFIG_PATH_VAR: &str = "TOKEN_SERVICE_CONFIG";
pub const SECRET_VAR: &str = "TOKEN_SERVICE_SECRET";
pub const LISTEN_VAR: &str = "TOKEN_SERVICE_LISTEN";
pub const STORE_ENDPOINTS_VAR: &str = "TOKEN_SERVICE_STORE_ENDPOINTS";
pub const USERS_URL_VAR: &str = "TOKEN_SERVICE_USERS_URL";

/// Secret shipped in the dev/test config files. Refused in `prod`.
pub const DEV_SECRET: &str = "dev-only-signing-secret";

/// 运行环境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Dev,
    Test,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Test => "test",
            Environment::Prod => "prod",
        }
    }

    pub fn config_path(&self) -> PathBuf {
        PathBuf::from(format!("config/{}.toml", self.as_str()))
    }
}

impl FromStr for Environment {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "test" | "testing" => Ok(Environment::Test),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(TokenError::Configuration(format!("unknown environment '{other}'"))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub store: StoreConfig,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.address, self.port)
            .parse()
            .map_err(|err| TokenError::Configuration(format!("invalid listen address: {err}")))
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub secret: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default = "default_revocation_margin_secs")]
    pub revocation_margin_secs: u64,
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn revocation_margin(&self) -> Duration {
        Duration::from_secs(self.revocation_margin_secs)
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("revocation_margin_secs", &self.revocation_margin_secs)
            .finish()
    }
}

/// 令牌有效期上限（30 天）
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 3600;

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_revocation_margin_secs() -> u64 {
    DEFAULT_REVOCATION_MARGIN_SECS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Etcd,
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,
    #[serde(default)]
    pub endpoints: Vec<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Etcd
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_store_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentityConfig {
    pub base_url: String,
    #[serde(default = "default_identity_path")]
    pub path: String,
    #[serde(default = "default_identity_timeout_ms")]
    pub timeout_ms: u64,
}

impl IdentityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_identity_path() -> String {
    DEFAULT_IDENTITY_PATH.to_string()
}

fn default_identity_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            TokenError::Configuration(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| TokenError::Configuration(err.to_string()))
    }

    /// Resolves the environment, loads its file, applies variable overrides
    /// and validates the result.
    pub fn from_env() -> Result<(Environment, Self)> {
        let lookup = |name: &str| std::env::var(name).ok();

        let env = match lookup(ENV_VAR) {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };
        let path = lookup(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| env.config_path());

        let mut config = Self::load_from_file(&path)?;
        config.apply_overrides(lookup)?;
        config.validate(env)?;
        Ok((env, config))
    }

    /// Applies single-value overrides from `lookup` (normally the process
    /// environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(SECRET_VAR) {
            self.auth.secret = secret;
        }
        if let Some(listen) = lookup(LISTEN_VAR) {
            let addr: SocketAddr = listen.parse().map_err(|err| {
                TokenError::Configuration(format!("invalid {LISTEN_VAR} '{listen}': {err}"))
            })?;
            self.server.address = addr.ip().to_string();
            self.server.port = addr.port();
        }
        if let Some(endpoints) = lookup(STORE_ENDPOINTS_VAR) {
            self.store.endpoints = endpoints
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(url) = lookup(USERS_URL_VAR) {
            self.identity.base_url = url;
        }
        Ok(())
    }

    pub fn validate(&self, env: Environment) -> Result<()> {
        if self.auth.secret.is_empty() {
            return Err(TokenError::Configuration("auth.secret must not be empty".into()));
        }
        if env == Environment::Prod && self.auth.secret == DEV_SECRET {
            return Err(TokenError::Configuration(
                "refusing the development signing secret in prod".into(),
            ));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(TokenError::Configuration("auth.token_ttl_secs must be positive".into()));
        }
        if self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(TokenError::Configuration(format!(
                "auth.token_ttl_secs must not exceed {MAX_TOKEN_TTL_SECS}"
            )));
        }
        if self.store.backend != StoreBackend::Memory && self.store.endpoints.is_empty() {
            return Err(TokenError::Configuration(format!(
                "store.endpoints required for the {:?} backend",
                self.store.backend
            )));
        }
        if self.identity.base_url.is_empty() {
            return Err(TokenError::Configuration("identity.base_url must not be empty".into()));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
        [service]
        name = "token-service"
        version = "0.2.0"

        [server]
        address = "127.0.0.1"
        port = 5000

        [auth]
        secret = "dev-only-signing-secret"

        [store]
        backend = "etcd"
        endpoints = ["http://127.0.0.1:2379"]

        [identity]
        base_url = "http://127.0.0.1:5001"
    "#;

    #[test]
    fn defaults_are_filled_in() {
        let config = Config::from_toml(SAMPLE).expect("parse");
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.auth.revocation_margin_secs, 5);
        assert_eq!(config.store.key_prefix, "/revoked-tokens/");
        assert_eq!(config.store.timeout(), Duration::from_secs(2));
        assert_eq!(config.identity.path, "/api/users/me");
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.validate(Environment::Dev).is_ok());
    }

    #[test]
    fn prod_refuses_dev_secret() {
        let config = Config::from_toml(SAMPLE).expect("parse");
        assert!(matches!(
            config.validate(Environment::Prod),
            Err(TokenError::Configuration(_))
        ));
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = Config::from_toml(SAMPLE).expect("parse");
        let vars: HashMap<&str, &str> = HashMap::from([
            (SECRET_VAR, "from-env"),
            (LISTEN_VAR, "0.0.0.0:8080"),
            (STORE_ENDPOINTS_VAR, "http://a:2379, http://b:2379"),
        ]);
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .expect("overrides");

        assert_eq!(config.auth.secret, "from-env");
        assert_eq!(config.server.address, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.endpoints, vec!["http://a:2379", "http://b:2379"]);
        assert!(config.validate(Environment::Prod).is_ok());
    }

    #[test]
    fn networked_backend_needs_endpoints() {
        let mut config = Config::from_toml(SAMPLE).expect("parse");
        config.store.endpoints.clear();
        assert!(config.validate(Environment::Dev).is_err());

        config.store.backend = StoreBackend::Memory;
        assert!(config.validate(Environment::Dev).is_ok());
    }

    #[test]
    fn token_ttl_is_bounded() {
        let mut config = Config::from_toml(SAMPLE).expect("parse");

        config.auth.token_ttl_secs = 0;
        assert!(config.validate(Environment::Dev).is_err());

        config.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS;
        assert!(config.validate(Environment::Dev).is_ok());

        config.auth.token_ttl_secs = 10_000_000_000_000;
        assert!(config.validate(Environment::Dev).is_err());
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let config = Config::from_toml(SAMPLE).expect("parse");
        assert!(!format!("{config:?}").contains(DEV_SECRET));
    }

    #[test]
    fn environment_names_parse() {
        assert_eq!("PROD".parse::<Environment>().ok(), Some(Environment::Prod));
        assert_eq!("testing".parse::<Environment>().ok(), Some(Environment::Test));
        assert!("staging".parse::<Environment>().is_err());
    }
}
