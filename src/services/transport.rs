//! Authenticated request sending with a single token-refresh retry

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::errors::ListingsResult;
use crate::models::Credentials;
use crate::services::token_store::TokenStore;
use crate::utils::http_client::{ApiRequest, ApiResponse, HttpExchange, run_cancellable};

pub struct Transport {
    exchange: Arc<dyn HttpExchange>,
    tokens: Arc<TokenStore>,
}

impl Transport {
    pub fn new(exchange: Arc<dyn HttpExchange>, tokens: Arc<TokenStore>) -> Self {
        Self { exchange, tokens }
    }

    /// Send `request`, returning the response only when it is 2xx
    ///
    /// An authenticated request carries the store's current token for `credentials`
    /// when one is cached, so a refresh made by an earlier request is picked up.
    /// A client error (< 500) with `retry_allowed` set is treated as a stale token:
    /// the cache is cleared, a fresh token is attached and the request goes out once
    /// more with retries disabled. Server errors are never retried.
    pub async fn send(
        &self,
        request: ApiRequest,
        retry_allowed: bool,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> ListingsResult<ApiResponse> {
        let mut request = request;
        let mut retry_allowed = retry_allowed;

        if request.token.is_some() {
            if let Some(current) = self.tokens.current(&credentials.username) {
                request.token = Some(current);
            }
        }

        // Bounded at two attempts: the retry is always sent with retry_allowed cleared
        loop {
            let response = run_cancellable(cancel, self.exchange.execute(request.clone())).await?;
            if response.is_success() {
                return Ok(response);
            }

            if !retry_allowed || response.status >= 500 {
                warn!("Listings request {} failed with HTTP {}", request.path, response.status);
                return Err(response.to_error());
            }

            warn!(
                "Listings request {} returned HTTP {}, refreshing token and retrying once",
                request.path, response.status
            );
            self.tokens.clear();
            match self.tokens.acquire(credentials, cancel).await? {
                Some(token) => request.token = Some(token),
                None => return Err(response.to_error()),
            }
            retry_allowed = false;
        }
    }
}
