//! Session token cache for the listings service
//!
//! Tokens are cached per username and reused until they reach the configured
//! lifetime. Refreshes are serialized by one process-wide lock so at most one
//! authentication request is in flight. A 400 from the token endpoint clears the
//! whole cache and starts a cool-down during which no new token is requested.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha1::{Digest, Sha1};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::errors::{ListingsError, ListingsResult};
use crate::models::Credentials;
use crate::models::schedules_direct::{TokenRequest, TokenResponse};
use crate::utils::http_client::{ApiRequest, HttpExchange, run_cancellable};
use crate::utils::time::Clock;
use crate::utils::url::UrlUtils;

const NO_FAILURE: i64 = i64::MIN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub value: String,
    pub issued_at: DateTime<Utc>,
}

pub struct TokenStore {
    exchange: Arc<dyn HttpExchange>,
    clock: Arc<dyn Clock>,
    tokens: DashMap<String, CachedToken>,
    /// Milliseconds since the epoch of the last credential rejection
    last_auth_failure: AtomicI64,
    refresh_lock: Mutex<()>,
    token_lifetime: chrono::Duration,
    auth_cooldown: chrono::Duration,
}

impl TokenStore {
    pub fn new(exchange: Arc<dyn HttpExchange>, clock: Arc<dyn Clock>, config: &ServiceConfig) -> Self {
        Self::with_windows(exchange, clock, config.token_lifetime, config.auth_cooldown)
    }

    pub fn with_windows(
        exchange: Arc<dyn HttpExchange>,
        clock: Arc<dyn Clock>,
        token_lifetime: Duration,
        auth_cooldown: Duration,
    ) -> Self {
        Self {
            exchange,
            clock,
            tokens: DashMap::new(),
            last_auth_failure: AtomicI64::new(NO_FAILURE),
            refresh_lock: Mutex::new(()),
            token_lifetime: to_chrono(token_lifetime),
            auth_cooldown: to_chrono(auth_cooldown),
        }
    }

    /// Return a usable token for `credentials`, refreshing it if needed
    ///
    /// `Ok(None)` means no token is available: the credentials are incomplete or
    /// the store is cooling down after a rejection. Neither case touches the network.
    pub async fn acquire(
        &self,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> ListingsResult<Option<String>> {
        if !credentials.is_complete() {
            debug!("Listings credentials incomplete, no token available");
            return Ok(None);
        }

        let username = credentials.username.as_str();
        if let Some(token) = self.fresh_token(username) {
            return Ok(Some(token));
        }
        if self.in_cooldown() {
            warn!("Listings authentication cooling down after rejected credentials");
            return Ok(None);
        }

        let _guard = run_cancellable(cancel, async {
            Ok::<_, ListingsError>(self.refresh_lock.lock().await)
        })
        .await?;

        // Another caller may have refreshed or been rejected while we waited
        if let Some(token) = self.fresh_token(username) {
            return Ok(Some(token));
        }
        if self.in_cooldown() {
            return Ok(None);
        }

        match self.authenticate(credentials, cancel).await {
            Ok(token) => {
                info!(
                    "Authenticated with listings service as '{}', token {}",
                    username,
                    UrlUtils::mask_token(&token)
                );
                self.tokens.insert(
                    username.to_string(),
                    CachedToken {
                        value: token.clone(),
                        issued_at: self.clock.now(),
                    },
                );
                Ok(Some(token))
            }
            Err(e) if e.is_auth_rejection() => {
                self.tokens.clear();
                self.last_auth_failure
                    .store(self.clock.now().timestamp_millis(), Ordering::SeqCst);
                warn!(
                    "Listings service rejected credentials for '{}', pausing authentication for {}s",
                    username,
                    self.auth_cooldown.num_seconds()
                );
                Err(ListingsError::authentication(format!(
                    "Invalid credentials for '{username}': {e}"
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Drop every cached token
    pub fn clear(&self) {
        self.tokens.clear();
    }

    /// Cached token for `username` if it is still within its lifetime
    pub fn current(&self, username: &str) -> Option<String> {
        self.fresh_token(username)
    }

    pub fn cached(&self, username: &str) -> Option<CachedToken> {
        self.tokens.get(username).map(|entry| entry.value().clone())
    }

    /// Whether new authentication attempts are currently suppressed
    pub fn in_cooldown(&self) -> bool {
        let last = self.last_auth_failure.load(Ordering::SeqCst);
        if last == NO_FAILURE {
            return false;
        }
        let elapsed = self.clock.now().timestamp_millis().saturating_sub(last);
        elapsed < self.auth_cooldown.num_milliseconds()
    }

    fn fresh_token(&self, username: &str) -> Option<String> {
        let entry = self.tokens.get(username)?;
        let age = self.clock.now() - entry.issued_at;
        (age < self.token_lifetime).then(|| entry.value.clone())
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> ListingsResult<String> {
        let request = ApiRequest::post_json(
            "token",
            &TokenRequest {
                username: credentials.username.clone(),
                password: hash_password(&credentials.password),
            },
        )?;

        let response = run_cancellable(cancel, self.exchange.execute(request)).await?;
        if !response.is_success() {
            return Err(response.to_error());
        }

        let body: TokenResponse = response.json("token")?;
        match (body.message.as_deref(), body.token) {
            (Some("OK"), Some(token)) if !token.is_empty() => Ok(token),
            (message, _) => Err(ListingsError::authentication(format!(
                "Could not authenticate with listings service: {}",
                message.unwrap_or("no message")
            ))),
        }
    }
}

/// Lowercase hex SHA-1 of the clear-text password, as the token endpoint expects
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha1::digest(password.as_bytes()))
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
