use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::errors::{ListingsError, ListingsResult};
use crate::utils::url::UrlUtils;

/// Header carrying the raw session token
pub const TOKEN_HEADER: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMethod {
    Get,
    Post,
    Put,
}

impl From<ApiMethod> for Method {
    fn from(method: ApiMethod) -> Self {
        match method {
            ApiMethod::Get => Method::GET,
            ApiMethod::Post => Method::POST,
            ApiMethod::Put => Method::PUT,
        }
    }
}

/// One request against the listings service, relative to its base path
#[derive(Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: ApiMethod,
    pub path: String,
    pub body: Option<String>,
    pub token: Option<String>,
}

impl ApiRequest {
    pub fn get<P: Into<String>>(path: P) -> Self {
        Self {
            method: ApiMethod::Get,
            path: path.into(),
            body: None,
            token: None,
        }
    }

    pub fn put<P: Into<String>>(path: P) -> Self {
        Self {
            method: ApiMethod::Put,
            ..Self::get(path)
        }
    }

    /// POST with a JSON-encoded body
    pub fn post_json<P, T>(path: P, body: &T) -> ListingsResult<Self>
    where
        P: Into<String>,
        T: Serialize + ?Sized,
    {
        let path = path.into();
        let body = serde_json::to_string(body).map_err(|e| ListingsError::parse(&path, e))?;
        Ok(Self {
            method: ApiMethod::Post,
            body: Some(body),
            ..Self::get(path)
        })
    }

    pub fn with_token<T: Into<String>>(mut self, token: T) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("body_len", &self.body.as_ref().map(String::len))
            .field("token", &self.token.as_deref().map(UrlUtils::mask_token))
            .finish()
    }
}

/// Status and UTF-8 body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new<B: Into<String>>(status: u16, body: B) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body, naming `context` in the error
    pub fn json<T: DeserializeOwned>(&self, context: &str) -> ListingsResult<T> {
        serde_json::from_str(&self.body).map_err(|e| ListingsError::parse(context, e))
    }

    /// Transport error describing this (non-success) response
    pub fn to_error(&self) -> ListingsError {
        let reason = StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown");
        ListingsError::transport(self.status, format!("Request failed: {reason}"))
    }
}

/// A single HTTP round trip to the listings service
///
/// Never retries and never interprets the status; the caller owns both.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpExchange: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> ListingsResult<ApiResponse>;
}

/// reqwest-backed exchange; timeouts come from the client configuration
pub struct ReqwestExchange {
    client: Client,
    base_url: String,
}

impl ReqwestExchange {
    pub fn new(config: &ServiceConfig) -> ListingsResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl HttpExchange for ReqwestExchange {
    async fn execute(&self, request: ApiRequest) -> ListingsResult<ApiResponse> {
        let url = UrlUtils::endpoint(&self.base_url, &request.path);
        debug!("{:?} {}", request.method, url);

        let mut builder = self.client.request(request.method.into(), &url);
        if let Some(token) = &request.token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        if let Some(body) = request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json; charset=utf-8")
                .body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!("{} -> {} ({} bytes)", url, status, body.len());
        Ok(ApiResponse { status, body })
    }
}

/// Race `future` against `cancel`, reporting [`ListingsError::Cancelled`] if it fires first
pub async fn run_cancellable<F, T>(cancel: &CancellationToken, future: F) -> ListingsResult<T>
where
    F: Future<Output = ListingsResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ListingsError::Cancelled),
        result = future => result,
    }
}
