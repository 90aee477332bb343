//! Process-wide access token cache.
//!
//! One `TokenCache` is built per process and shared (behind an `Arc`) by every
//! scenario. A single async mutex covers the whole check-refresh-return
//! sequence, so at most one refresh is in flight and callers queued behind it
//! see the refreshed token rather than starting their own refresh.

use crate::config::RefreshCredentials;
use crate::error::{Result, SuiteError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Seconds shaved off every `expires_in` so tokens are renewed before the
/// provider invalidates them.
pub const EXPIRY_MARGIN_SECS: i64 = 300;

/// A cached access token. Replaced as a whole on every refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Build a token issued at `now` with the provider's `expires_in` seconds,
    /// minus the safety margin. No clamping: `expires_in <= 300` yields a
    /// token that is already due for refresh. Lifetimes that do not fit in
    /// a timestamp are rejected as a failed refresh.
    pub fn issued(value: String, expires_in: i64, now: DateTime<Utc>) -> Result<Self> {
        let expires_at = expires_in
            .checked_sub(EXPIRY_MARGIN_SECS)
            .and_then(Duration::try_seconds)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| {
                SuiteError::TokenRefreshFailed(format!("expires_in out of range: {}", expires_in))
            })?;
        Ok(Self { value, expires_at })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Successful token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: i64,
}

/// Source of fresh access tokens. Implemented over HTTP by
/// `api::accounts::AccountsApi`.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    async fn refresh(&self, credentials: &RefreshCredentials) -> Result<IssuedToken>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct TokenCache {
    endpoint: Arc<dyn TokenEndpoint>,
    credentials: RefreshCredentials,
    clock: Arc<dyn Clock>,
    token: Mutex<Option<Token>>,
}

impl TokenCache {
    pub fn new(endpoint: Arc<dyn TokenEndpoint>, credentials: RefreshCredentials) -> Self {
        Self::with_clock(endpoint, credentials, Arc::new(SystemClock))
    }

    pub fn with_clock(
        endpoint: Arc<dyn TokenEndpoint>,
        credentials: RefreshCredentials,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            endpoint,
            credentials,
            clock,
            token: Mutex::new(None),
        }
    }

    /// Return a valid access token, refreshing it first if none was fetched
    /// yet or the cached one is past its (margin-adjusted) expiry.
    ///
    /// The lock is held across the refresh call. On failure the cached token
    /// is left as it was and the error is returned to the caller.
    pub async fn get_token(&self) -> Result<String> {
        let mut lock = self.token.lock().await;
        let now = self.clock.now();
        if let Some(t) = lock.as_ref().filter(|t| !t.is_expired_at(now)) {
            debug!("token is valid until {}", t.expires_at);
            return Ok(t.value.clone());
        }

        info!("renewing access token");
        let issued = match self.endpoint.refresh(&self.credentials).await {
            Ok(issued) => issued,
            Err(e) => {
                warn!("token refresh failed, keeping previous token: {}", e);
                return Err(match e {
                    e @ SuiteError::TokenRefreshFailed(_) => e,
                    other => SuiteError::TokenRefreshFailed(other.to_string()),
                });
            }
        };
        if issued.access_token.is_empty() {
            return Err(SuiteError::TokenRefreshFailed(
                "empty access_token in refresh response".into(),
            ));
        }

        // Expiry is computed from the time the response arrived, not from
        // when the caller started waiting for the lock.
        let token = Token::issued(issued.access_token, issued.expires_in, self.clock.now())
            .map_err(|e| {
                warn!("rejecting refresh response, keeping previous token: {}", e);
                e
            })?;
        let value = token.value.clone();
        *lock = Some(token);
        Ok(value)
    }

    /// Consistent copy of the cached value and expiry.
    pub async fn snapshot(&self) -> Option<Token> {
        self.token.lock().await.clone()
    }
}
