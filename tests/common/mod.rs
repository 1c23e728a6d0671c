//! Scripted listings service for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use listings_sync::config::ServiceConfig;
use listings_sync::errors::ListingsResult;
use listings_sync::models::{Credentials, ListingsProviderInfo};
use listings_sync::sources::ListingsEngine;
use listings_sync::utils::{ApiMethod, ApiRequest, ApiResponse, HttpExchange, LocalZone, ManualClock};

pub const BASE_URL: &str = "https://json.example.org/20141201";
pub const TOKEN_OK: &str = r#"{"code": 0, "message": "OK", "serverID": "test", "token": "tok-1234567890"}"#;

struct Route {
    method: ApiMethod,
    path: String,
    responses: VecDeque<ApiResponse>,
}

/// Fake exchange answering from per-route response queues
///
/// The last queued response of a route is repeated once the others are used up.
/// Unknown routes answer 404.
#[derive(Default)]
pub struct ScriptedExchange {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
    token_delay: Mutex<Duration>,
    tokens_in_flight: AtomicUsize,
    max_tokens_in_flight: AtomicUsize,
}

impl ScriptedExchange {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: ApiMethod, path: &str, status: u16, body: &str) -> &Self {
        let mut routes = self.routes.lock().unwrap();
        let response = ApiResponse::new(status, body);
        match routes.iter_mut().find(|r| r.method == method && r.path == path) {
            Some(route) => route.responses.push_back(response),
            None => routes.push(Route {
                method,
                path: path.to_string(),
                responses: VecDeque::from([response]),
            }),
        }
        self
    }

    pub fn with_token_delay(&self, delay: Duration) -> &Self {
        *self.token_delay.lock().unwrap() = delay;
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    pub fn max_tokens_in_flight(&self) -> usize {
        self.max_tokens_in_flight.load(Ordering::SeqCst)
    }

    fn respond(&self, request: &ApiRequest) -> ApiResponse {
        let mut routes = self.routes.lock().unwrap();
        let Some(route) = routes
            .iter_mut()
            .find(|r| r.method == request.method && r.path == request.path)
        else {
            return ApiResponse::new(404, "");
        };

        if route.responses.len() > 1 {
            route.responses.pop_front().unwrap()
        } else {
            route.responses.front().cloned().unwrap()
        }
    }
}

#[async_trait]
impl HttpExchange for ScriptedExchange {
    async fn execute(&self, request: ApiRequest) -> ListingsResult<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if request.path == "token" {
            let in_flight = self.tokens_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_tokens_in_flight.fetch_max(in_flight, Ordering::SeqCst);
            let delay = *self.token_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.tokens_in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        Ok(self.respond(&request))
    }
}

pub fn service_config() -> ServiceConfig {
    ServiceConfig {
        base_url: BASE_URL.to_string(),
        ..ServiceConfig::default()
    }
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()))
}

pub fn engine(exchange: Arc<ScriptedExchange>, clock: Arc<ManualClock>) -> ListingsEngine {
    ListingsEngine::with_parts(exchange, clock, &service_config(), LocalZone::Fixed(
        chrono::FixedOffset::east_opt(0).unwrap(),
    ))
}

pub fn provider_info() -> ListingsProviderInfo {
    ListingsProviderInfo {
        credentials: Credentials::new("viewer", "secret"),
        listings_id: "USA-NY67791-X".to_string(),
    }
}
