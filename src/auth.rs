//! Authorization check for triggering a sync.
//!
//! Callers present a bearer token. Tokens are configured as SHA-256 hashes
//! in `[[auth.tokens]]`, each tied to a principal and a role; only the
//! `admin` role may run the pipeline.

use sha2::{Digest, Sha256};

use crate::config::{AuthConfig, TokenEntry};

/// Role allowed to run a sync
pub const ADMIN_ROLE: &str = "admin";

/// Credentials presented by a caller.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Raw `Authorization` header value, e.g. `Bearer abc123`
    pub authorization: Option<String>,
}

impl Credentials {
    /// Credentials from a bare token.
    pub fn bearer(token: &str) -> Self {
        Self {
            authorization: Some(format!("Bearer {}", token)),
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub role: String,
}

/// Reasons a caller is turned away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing or invalid authorization header")]
    MissingHeader,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Insufficient privileges")]
    InsufficientPrivileges,
}

/// Decides whether a caller may run the pipeline.
pub trait AuthVerifier: Send + Sync {
    fn verify(&self, credentials: &Credentials) -> Result<Principal, AuthError>;
}

/// Lower-case hex SHA-256 of a token, as stored in config.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Extract the token from a `Bearer <token>` header value.
fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Verifier backed by the configured token list.
#[derive(Debug, Clone, Default)]
pub struct TokenVerifier {
    tokens: Vec<TokenEntry>,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            tokens: config.tokens.clone(),
        }
    }
}

impl AuthVerifier for TokenVerifier {
    fn verify(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        let token = credentials
            .authorization
            .as_deref()
            .and_then(bearer_token)
            .ok_or(AuthError::MissingHeader)?;

        let hash = hash_token(token);
        let entry = self
            .tokens
            .iter()
            .find(|entry| entry.token_sha256.eq_ignore_ascii_case(&hash))
            .ok_or(AuthError::InvalidToken)?;

        if entry.role != ADMIN_ROLE {
            return Err(AuthError::InsufficientPrivileges);
        }

        Ok(Principal {
            name: entry.principal.clone(),
            role: entry.role.clone(),
        })
    }
}
