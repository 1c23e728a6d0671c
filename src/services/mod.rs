//! Service layer for listings synchronization
//!
//! Leaf-first: the token store and transport own all network state, the
//! fetchers turn requests into wire payloads, and the selector, merger and
//! mapper are pure transformations over those payloads.
//!
//! # Usage
//!
//! ```rust
//! use listings_sync::services::image_selector::{select, PORTRAIT_ASPECT};
//! use listings_sync::models::schedules_direct::ImageCandidate;
//!
//! let candidates = vec![
//!     ImageCandidate::new("2", "3", true, "poster.jpg"),
//!     ImageCandidate::new("16", "9", true, "banner.jpg"),
//! ];
//! let best = select(&candidates, PORTRAIT_ASPECT).unwrap();
//! assert_eq!(best.uri.as_deref(), Some("poster.jpg"));
//! ```

pub mod channel_mapper;
pub mod image_fetcher;
pub mod image_selector;
pub mod program_merger;
pub mod schedule_fetcher;
pub mod token_store;
pub mod transport;

pub use channel_mapper::map_channels;
pub use image_fetcher::{ArtworkIndex, ImageFetcher};
pub use image_selector::{ProgramImages, select, select_program_images};
pub use program_merger::{merge_program, merge_programs};
pub use schedule_fetcher::{ScheduleBatch, ScheduleFetcher, schedule_request_dates};
pub use token_store::TokenStore;
pub use transport::Transport;
