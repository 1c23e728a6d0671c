//! Listings provider trait definitions
//!
//! The surrounding application talks to a guide provider only through
//! [`ListingsProvider`]; configuration is supplied on every call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::errors::ListingsResult;
use crate::models::{ChannelRecord, LineupSummary, ListingsProviderInfo, ProgramRecord};

/// A remote electronic program guide
#[async_trait]
pub trait ListingsProvider: Send + Sync {
    /// Display name of the provider
    fn name(&self) -> &'static str;

    /// Stable type identifier used in stored configuration
    fn provider_type(&self) -> &'static str;

    /// Programs airing on `channel_id` between `start` and `end`
    ///
    /// Missing credentials produce an empty list rather than an error.
    async fn get_programs(
        &self,
        info: &ListingsProviderInfo,
        channel_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> ListingsResult<Vec<ProgramRecord>>;

    /// Channels of the configured lineup
    async fn get_channels(
        &self,
        info: &ListingsProviderInfo,
        cancel: &CancellationToken,
    ) -> ListingsResult<Vec<ChannelRecord>>;

    /// Lineups offered for a country and postal code
    async fn get_lineups(
        &self,
        info: &ListingsProviderInfo,
        country: &str,
        postal_code: &str,
        cancel: &CancellationToken,
    ) -> ListingsResult<Vec<LineupSummary>>;

    /// Check the configured credentials and, when asked, that the lineup is on the account
    async fn validate(
        &self,
        info: &ListingsProviderInfo,
        validate_login: bool,
        validate_listings: bool,
        cancel: &CancellationToken,
    ) -> ListingsResult<()>;
}
