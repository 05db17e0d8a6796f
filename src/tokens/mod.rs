//! Token lifecycle: issuance, counted consumption, revocation and expiry sweep.
//!
//! A token moves through `Active(n)` → `Active(n - 1)` on every successful
//! validation. The validation that reaches zero succeeds and removes the token
//! in the same step; every later attempt sees an unknown token.

mod claims;
mod registry;

pub use claims::{Claims, TokenSigner};
pub use registry::TokenRegistry;

use crate::error::ApiError;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::{fmt::Write, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{task::JoinHandle, time::interval};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_MAX_USES: u32 = 5;
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token")]
    SignatureInvalid,
    #[error("token expired")]
    Expired,
    #[error("token expired or exhausted")]
    UnknownOrAlreadyExpired,
    #[error("signing secret not configured")]
    MissingSecret,
    #[error("error generating token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::SignatureInvalid | TokenError::Expired => {
                Self::Unauthorized(err.to_string())
            }
            TokenError::UnknownOrAlreadyExpired => Self::TokenExhausted,
            TokenError::MissingSecret | TokenError::Signing(_) => Self::Internal(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub subject: String,
    pub remaining_uses: u32,
    pub expires_at: i64,
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumption {
    pub subject: String,
    pub uses_left: u32,
}

impl Consumption {
    /// The token was evicted by this very call.
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.uses_left == 0
    }
}

#[derive(Debug)]
pub struct TokenManager {
    signer: Option<TokenSigner>,
    registry: TokenRegistry,
    max_uses: u32,
    ttl_seconds: i64,
}

impl TokenManager {
    /// A manager without a secret still answers, but every issue or validate
    /// call fails with `TokenError::MissingSecret`.
    #[must_use]
    pub fn new(secret: Option<&SecretString>) -> Self {
        let signer = secret
            .filter(|secret| !secret.expose_secret().is_empty())
            .map(TokenSigner::new);

        Self {
            signer,
            registry: TokenRegistry::new(),
            max_uses: DEFAULT_MAX_USES,
            ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_max_uses(mut self, uses: u32) -> Self {
        self.max_uses = uses.max(1);
        self
    }

    #[must_use]
    pub fn with_ttl_seconds(mut self, seconds: i64) -> Self {
        self.ttl_seconds = seconds.max(1);
        self
    }

    #[must_use]
    pub fn max_uses(&self) -> u32 {
        self.max_uses
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    #[must_use]
    pub fn live_tokens(&self) -> usize {
        self.registry.len()
    }

    /// Sign a token for `subject` and register it with the full use budget.
    ///
    /// # Errors
    /// Returns `TokenError::MissingSecret` without a signing secret, or
    /// `TokenError::Signing` if encoding fails.
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        let signer = self.signer.as_ref().ok_or(TokenError::MissingSecret)?;

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_seconds),
        };
        let token = signer.sign(&claims)?;

        self.registry
            .insert(token.clone(), self.max_uses, claims.exp);

        debug!(
            subject,
            token = %fingerprint(&token),
            uses = self.max_uses,
            "token issued"
        );

        Ok(IssuedToken {
            token,
            subject: claims.sub,
            remaining_uses: self.max_uses,
            expires_at: claims.exp,
        })
    }

    /// Verify `token` and spend one of its uses.
    ///
    /// Signature and expiry are checked before the registry is consulted.
    ///
    /// # Errors
    /// - `TokenError::MissingSecret` without a signing secret
    /// - `TokenError::SignatureInvalid` / `TokenError::Expired` on verification failure
    /// - `TokenError::UnknownOrAlreadyExpired` if the token is not live anymore
    pub fn validate_and_consume(&self, token: &str) -> Result<Consumption, TokenError> {
        let signer = self.signer.as_ref().ok_or(TokenError::MissingSecret)?;
        let claims = signer.verify(token)?;

        let uses_left = self
            .registry
            .consume(token)
            .ok_or(TokenError::UnknownOrAlreadyExpired)?;

        debug!(
            subject = %claims.sub,
            token = %fingerprint(token),
            uses_left,
            "token consumed"
        );

        Ok(Consumption {
            subject: claims.sub,
            uses_left,
        })
    }

    /// Forget `token`. Safe to call for unknown tokens.
    pub fn revoke(&self, token: &str) {
        if self.registry.remove(token) {
            debug!(token = %fingerprint(token), "token revoked");
        }
    }

    /// Drop every token whose absolute expiry has passed.
    pub fn sweep_expired(&self) -> usize {
        self.registry.sweep_expired(Utc::now().timestamp())
    }
}

/// Run `sweep_expired` on a fixed period until the task is aborted.
pub fn spawn_sweeper(manager: Arc<TokenManager>, period: Duration) -> JoinHandle<()> {
    let mut ticker = interval(period);

    tokio::spawn(async move {
        loop {
            ticker.tick().await;

            let removed = manager.sweep_expired();
            if removed > 0 {
                info!(removed, "expired tokens swept");
            }
        }
    })
}

/// Short, non reversible label for a token, safe for logs.
#[must_use]
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().take(6).fold(String::new(), |mut acc, byte| {
        let _ = write!(acc, "{byte:02x}");
        acc
    })
}
