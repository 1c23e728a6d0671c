//! Schedules Direct listings provider
//!
//! [`ListingsEngine`] wires the token store, transport, fetchers and merger
//! together behind [`ListingsProvider`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{Config, ServiceConfig};
use crate::errors::{ListingsError, ListingsResult};
use crate::models::schedules_direct::{AccountLineups, Headend, LineupChannels, LineupDescriptor};
use crate::models::{ChannelRecord, LineupSummary, ListingsProviderInfo, ProgramRecord};
use crate::services::{
    ImageFetcher, ScheduleFetcher, TokenStore, Transport, map_channels, merge_programs,
    schedule_request_dates,
};
use crate::sources::traits::ListingsProvider;
use crate::utils::http_client::{ApiRequest, HttpExchange, ReqwestExchange};
use crate::utils::time::{Clock, LocalZone, SystemClock};

pub const PROVIDER_NAME: &str = "Schedules Direct";
pub const PROVIDER_TYPE: &str = "SchedulesDirect";

const CHANNEL_ID_SUFFIX: &str = ".json.schedulesdirect.org";
const LINEUP_PATH_MARKER: &str = "/lineups/";

/// Strip the provider host suffix (any case) and leading `I` markers from a channel id
pub fn normalize_channel_id(channel_id: &str) -> String {
    let lower = channel_id.to_ascii_lowercase();
    let mut normalized = String::with_capacity(channel_id.len());
    let mut copied = 0;
    for (idx, _) in lower.match_indices(CHANNEL_ID_SUFFIX) {
        normalized.push_str(&channel_id[copied..idx]);
        copied = idx + CHANNEL_ID_SUFFIX.len();
    }
    normalized.push_str(&channel_id[copied..]);

    normalized.trim_start_matches('I').to_string()
}

fn lineup_summary(lineup: &LineupDescriptor) -> LineupSummary {
    let id = lineup
        .uri
        .rsplit_once(LINEUP_PATH_MARKER)
        .map(|(_, id)| id)
        .filter(|id| !id.is_empty())
        .unwrap_or(&lineup.lineup);
    let name = lineup
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(&lineup.lineup);

    LineupSummary {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn require_listings_id(info: &ListingsProviderInfo) -> ListingsResult<&str> {
    let listings_id = info.listings_id.trim();
    if listings_id.is_empty() {
        return Err(ListingsError::configuration("Listings id required"));
    }
    Ok(listings_id)
}

pub struct ListingsEngine {
    tokens: Arc<TokenStore>,
    transport: Arc<Transport>,
    schedules: ScheduleFetcher,
    images: ImageFetcher,
    image_base: String,
    zone: LocalZone,
}

impl ListingsEngine {
    /// Engine talking to the configured service over HTTPS
    pub fn new(config: &Config) -> ListingsResult<Self> {
        let exchange: Arc<dyn HttpExchange> = Arc::new(ReqwestExchange::new(&config.service)?);
        Ok(Self::with_parts(
            exchange,
            Arc::new(SystemClock),
            &config.service,
            config.local_zone()?,
        ))
    }

    pub fn with_parts(
        exchange: Arc<dyn HttpExchange>,
        clock: Arc<dyn Clock>,
        service: &ServiceConfig,
        zone: LocalZone,
    ) -> Self {
        let tokens = Arc::new(TokenStore::new(exchange.clone(), clock, service));
        let transport = Arc::new(Transport::new(exchange, tokens.clone()));

        Self {
            schedules: ScheduleFetcher::new(transport.clone()),
            images: ImageFetcher::new(transport.clone()),
            tokens,
            transport,
            image_base: service.base_url.clone(),
            zone,
        }
    }

    /// Whether the configured lineup is already attached to the account
    pub async fn has_lineup(
        &self,
        info: &ListingsProviderInfo,
        cancel: &CancellationToken,
    ) -> ListingsResult<bool> {
        let listings_id = require_listings_id(info)?;
        let token = self
            .tokens
            .acquire(&info.credentials, cancel)
            .await?
            .ok_or_else(|| ListingsError::authentication("token required"))?;

        info!("Checking lineups on account for {}", listings_id);
        let request = ApiRequest::get("lineups").with_token(token);
        let response = match self.transport.send(request, false, &info.credentials, cancel).await {
            Ok(response) => response,
            // The service answers 400 when the account has no lineups at all
            Err(e) if e.status() == Some(400) => return Ok(false),
            Err(e) => return Err(e),
        };

        let account: AccountLineups = response.json("lineups")?;
        Ok(account
            .lineups
            .iter()
            .any(|l| l.lineup.eq_ignore_ascii_case(listings_id)))
    }

    /// Attach the configured lineup to the account
    pub async fn add_lineup(
        &self,
        info: &ListingsProviderInfo,
        cancel: &CancellationToken,
    ) -> ListingsResult<()> {
        let token = self
            .tokens
            .acquire(&info.credentials, cancel)
            .await?
            .ok_or_else(|| ListingsError::authentication("Authentication required"))?;
        let listings_id = require_listings_id(info)?;

        info!("Adding lineup {} to account", listings_id);
        let path = format!("lineups/{}", urlencoding::encode(listings_id));
        let request = ApiRequest::put(path).with_token(token);
        self.transport
            .send(request, false, &info.credentials, cancel)
            .await?;
        Ok(())
    }

    async fn fetch_headends(
        &self,
        info: &ListingsProviderInfo,
        token: String,
        country: &str,
        postal_code: &str,
        cancel: &CancellationToken,
    ) -> ListingsResult<Vec<LineupSummary>> {
        let path = format!(
            "headends?country={}&postalcode={}",
            urlencoding::encode(country),
            urlencoding::encode(postal_code)
        );
        let request = ApiRequest::get(path).with_token(token);
        let response = self
            .transport
            .send(request, false, &info.credentials, cancel)
            .await?;
        let headends: Vec<Headend> = response.json("headends")?;

        Ok(headends
            .iter()
            .flat_map(|h| h.lineups.iter())
            .map(lineup_summary)
            .collect())
    }
}

#[async_trait]
impl ListingsProvider for ListingsEngine {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn provider_type(&self) -> &'static str {
        PROVIDER_TYPE
    }

    async fn get_programs(
        &self,
        info: &ListingsProviderInfo,
        channel_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> ListingsResult<Vec<ProgramRecord>> {
        if channel_id.trim().is_empty() {
            return Err(ListingsError::configuration("Channel id required"));
        }
        if end < start {
            return Err(ListingsError::configuration(format!(
                "Listings window ends ({end}) before it starts ({start})"
            )));
        }
        let station_id = normalize_channel_id(channel_id);
        let credentials = &info.credentials;

        let Some(token) = self.tokens.acquire(credentials, cancel).await? else {
            warn!("Listings token unavailable, returning empty program list");
            return Ok(Vec::new());
        };

        let dates = schedule_request_dates(start, end, &self.zone);
        info!("Fetching schedule for station {} over {:?}", station_id, dates);

        let batch = self
            .schedules
            .fetch(&station_id, dates, Some(&token), credentials, cancel)
            .await?;
        if batch.is_empty() {
            debug!("No airings for station {}", station_id);
            return Ok(Vec::new());
        }

        let artwork = self
            .images
            .fetch(&batch.artwork_program_ids(), &token, credentials, cancel)
            .await?;

        merge_programs(
            &station_id,
            &batch.days,
            &batch.details,
            &artwork,
            &self.image_base,
        )
    }

    async fn get_channels(
        &self,
        info: &ListingsProviderInfo,
        cancel: &CancellationToken,
    ) -> ListingsResult<Vec<ChannelRecord>> {
        let listings_id = require_listings_id(info)?;
        let token = self
            .tokens
            .acquire(&info.credentials, cancel)
            .await?
            .ok_or_else(|| ListingsError::authentication("token required"))?;

        let path = format!("lineups/{}", urlencoding::encode(listings_id));
        let request = ApiRequest::get(path).with_token(token);
        let response = self
            .transport
            .send(request, true, &info.credentials, cancel)
            .await?;
        let lineup: LineupChannels = response.json("lineups")?;

        info!("Found {} channels on lineup {}", lineup.map.len(), listings_id);
        Ok(map_channels(&lineup))
    }

    async fn get_lineups(
        &self,
        info: &ListingsProviderInfo,
        country: &str,
        postal_code: &str,
        cancel: &CancellationToken,
    ) -> ListingsResult<Vec<LineupSummary>> {
        let Some(token) = self.tokens.acquire(&info.credentials, cancel).await? else {
            return Ok(Vec::new());
        };

        match self
            .fetch_headends(info, token, country, postal_code, cancel)
            .await
        {
            Ok(lineups) => {
                if lineups.is_empty() {
                    info!("No lineups available for {} {}", country, postal_code);
                }
                Ok(lineups)
            }
            Err(ListingsError::Cancelled) => Err(ListingsError::Cancelled),
            Err(e) => {
                error!("Error getting headends: {}", e);
                Ok(Vec::new())
            }
        }
    }

    async fn validate(
        &self,
        info: &ListingsProviderInfo,
        validate_login: bool,
        validate_listings: bool,
        cancel: &CancellationToken,
    ) -> ListingsResult<()> {
        if validate_login {
            if info.credentials.username.trim().is_empty() {
                return Err(ListingsError::configuration("Username is required"));
            }
            if info.credentials.password.is_empty() {
                return Err(ListingsError::configuration("Password is required"));
            }
        }

        if validate_listings {
            require_listings_id(info)?;
            if !self.has_lineup(info, cancel).await? {
                self.add_lineup(info, cancel).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("20454", "20454")]
    #[case("I20454.json.schedulesdirect.org", "20454")]
    #[case("I20454.JSON.SchedulesDirect.ORG", "20454")]
    #[case("II10021", "10021")]
    #[case("10021I", "10021I")]
    fn test_normalize_channel_id(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_channel_id(raw), expected);
    }

    #[test]
    fn test_lineup_summary_uses_uri_segment_and_name_fallback() {
        let lineup: LineupDescriptor = serde_json::from_str(
            r#"{"lineup": "USA-NY67791-X", "name": "", "uri": "/20141201/lineups/USA-NY67791-X"}"#,
        )
        .unwrap();
        assert_eq!(
            lineup_summary(&lineup),
            LineupSummary {
                id: "USA-NY67791-X".to_string(),
                name: "USA-NY67791-X".to_string(),
            }
        );

        let named: LineupDescriptor = serde_json::from_str(
            r#"{"lineup": "USA-OTA-10001", "name": "Antenna", "uri": "/20141201/lineups/USA-OTA-10001"}"#,
        )
        .unwrap();
        assert_eq!(lineup_summary(&named).name, "Antenna");
    }

    #[test]
    fn test_require_listings_id() {
        let mut info = ListingsProviderInfo::default();
        assert!(matches!(
            require_listings_id(&info),
            Err(ListingsError::Configuration { .. })
        ));
        info.listings_id = " USA-OTA-10001 ".to_string();
        assert_eq!(require_listings_id(&info).unwrap(), "USA-OTA-10001");
    }
}
