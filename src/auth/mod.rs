pub mod identity;
pub mod service;
pub mod store;
pub mod token;
pub mod verifier;

pub use identity::{AuthenticationProvider, HttpAuthenticationProvider};
pub use service::{CredentialService, IssuedToken, RevokeOutcome};
pub use store::{MemoryRevocationStore, RevocationStore};
pub use token::{SubjectId, TokenClaims, TokenCodec};
pub use verifier::{TokenVerifier, VerifiedToken};
