//! Utility modules shared across the listings engine

pub mod http_client;
pub mod time;
pub mod url;

// Re-export commonly used types for convenience
pub use http_client::{ApiMethod, ApiRequest, ApiResponse, HttpExchange, ReqwestExchange};
pub use time::{Clock, LocalZone, ManualClock, SystemClock};
