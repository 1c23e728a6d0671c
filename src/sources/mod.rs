//! Listings providers
//!
//! [`traits::ListingsProvider`] is the seam the surrounding application
//! consumes; [`schedules_direct::ListingsEngine`] is the Schedules Direct
//! implementation of it.

pub mod schedules_direct;
pub mod traits;

pub use schedules_direct::ListingsEngine;
pub use traits::ListingsProvider;
