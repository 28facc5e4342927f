//! 测试公共设施：可记录写入的撤销存储、内存身份服务、固定时钟

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use token_service::auth::AuthenticationProvider;
use token_service::error::InfraResult;
use token_service::{
    CredentialService, ManualClock, MemoryRevocationStore, RevocationStore, SubjectId, TokenCodec,
    TokenError, TokenVerifier,
};

pub const SECRET: &str = "integration-test-secret";
pub const START_SECS: i64 = 1_700_000_000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Revocation store spy: records every call and can simulate an outage.
pub struct RecordingStore {
    inner: MemoryRevocationStore,
    writes: Mutex<Vec<(String, Duration)>>,
    reads: Mutex<Vec<String>>,
    unavailable: AtomicBool,
}

impl RecordingStore {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            inner: MemoryRevocationStore::with_clock(clock),
            writes: Mutex::new(Vec::new()),
            reads: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn writes(&self) -> Vec<(String, Duration)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> InfraResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl RevocationStore for RecordingStore {
    async fn write_with_ttl(&self, key: &str, ttl: Duration) -> InfraResult<()> {
        self.check_available()?;
        self.writes.lock().unwrap().push((key.to_string(), ttl));
        self.inner.write_with_ttl(key, ttl).await
    }

    async fn exists(&self, key: &str) -> InfraResult<bool> {
        self.check_available()?;
        self.reads.lock().unwrap().push(key.to_string());
        self.inner.exists(key).await
    }
}

/// In-memory identity service.
#[derive(Default)]
pub struct FakeIdentity {
    users: HashMap<(String, String), SubjectId>,
    calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn with_user(mut self, nickname: &str, secret: &str, id: impl Into<SubjectId>) -> Self {
        self.users
            .insert((nickname.to_string(), secret.to_string()), id.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthenticationProvider for FakeIdentity {
    async fn verify(&self, nickname: &str, secret: &str) -> token_service::Result<SubjectId> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.users
            .get(&(nickname.to_string(), secret.to_string()))
            .cloned()
            .ok_or(TokenError::AuthenticationFailed)
    }
}

pub struct Fixture {
    pub clock: Arc<ManualClock>,
    pub store: Arc<RecordingStore>,
    pub identity: Arc<FakeIdentity>,
    pub codec: Arc<TokenCodec>,
    pub credentials: Arc<CredentialService>,
    pub verifier: Arc<TokenVerifier>,
}

/// Service wired with a fixed clock, the store spy and `foo:bar` -> 123.
pub fn fixture() -> Fixture {
    fixture_with_identity(FakeIdentity::default().with_user("foo", "bar", 123))
}

pub fn fixture_with_identity(identity: FakeIdentity) -> Fixture {
    let identity = Arc::new(identity);
    fixture_with_provider(identity.clone(), identity)
}

pub fn fixture_with_provider(
    provider: Arc<dyn AuthenticationProvider>,
    identity: Arc<FakeIdentity>,
) -> Fixture {
    let clock = Arc::new(ManualClock::at_secs(START_SECS));
    let store = Arc::new(RecordingStore::new(clock.clone()));
    let codec = Arc::new(TokenCodec::with_clock(SECRET, DEFAULT_TTL, clock.clone()));
    let credentials = Arc::new(CredentialService::new(provider, codec.clone(), store.clone()));
    let verifier = Arc::new(TokenVerifier::new(codec.clone(), store.clone()));

    Fixture {
        clock,
        store,
        identity,
        codec,
        credentials,
        verifier,
    }
}
