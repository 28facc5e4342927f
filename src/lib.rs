//! Flare Token Service
//!
//! Issues short-lived signed bearer tokens after delegating password checks
//! to the identity service, records early revocations in a TTL-capable store,
//! and provides the verification contract resource servers apply.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod server;
pub mod telemetry;

// Re-exports
pub use auth::{
    AuthenticationProvider, CredentialService, HttpAuthenticationProvider, IssuedToken,
    MemoryRevocationStore, RevocationStore, RevokeOutcome, SubjectId, TokenClaims, TokenCodec,
    TokenVerifier, VerifiedToken,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, Environment};
pub use error::{ErrorCode, Result, TokenError};
