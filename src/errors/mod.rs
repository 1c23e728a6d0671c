//! Centralized error handling for listings synchronization
//!
//! # Error Categories
//!
//! - **Configuration**: missing username, password or listings id; surfaced immediately
//! - **Authentication**: rejected credentials; triggers the token cache clear and cool-down
//! - **Transport**: non-success status or network failure after the single retry
//! - **Parse**: malformed JSON from the listings service
//! - **Service invariant**: the service contradicted itself within one batch
//!
//! Artwork lookups are best-effort and never produce an error for the caller.
//!
//! # Usage
//!
//! ```rust
//! use listings_sync::errors::{ListingsError, ListingsResult};
//!
//! fn require_listings_id(id: &str) -> ListingsResult<&str> {
//!     if id.is_empty() {
//!         return Err(ListingsError::configuration("Listings Id required"));
//!     }
//!     Ok(id)
//! }
//!
//! assert!(require_listings_id("").is_err());
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using ListingsError
pub type ListingsResult<T> = Result<T, ListingsError>;
