//! Schedule and program-detail retrieval for one channel

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::ListingsResult;
use crate::models::Credentials;
use crate::models::schedules_direct::{DaySchedule, ProgramDetails, ScheduleEntry, ScheduleRequest};
use crate::services::transport::Transport;
use crate::utils::http_client::ApiRequest;
use crate::utils::time::LocalZone;

/// Schedules and details returned for one channel and date window
#[derive(Debug, Clone, Default)]
pub struct ScheduleBatch {
    pub days: Vec<DaySchedule>,
    pub details: Vec<ProgramDetails>,
}

impl ScheduleBatch {
    /// Airings in service order
    pub fn entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.days.iter().flat_map(|day| day.programs.iter())
    }

    /// Ids of programs whose details advertise artwork
    pub fn artwork_program_ids(&self) -> Vec<String> {
        self.details
            .iter()
            .filter(|d| d.has_image_artwork)
            .map(|d| d.program_id.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(|day| day.programs.is_empty())
    }
}

/// Calendar dates (`yyyy-MM-dd`) to request for `[start, end]`
///
/// Both ends are read as UTC and as local dates and the wider of the two spans
/// is used, so a window crossing midnight in either zone is not truncated.
pub fn schedule_request_dates(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    zone: &LocalZone,
) -> Vec<String> {
    let first = start.date_naive().min(zone.local_date(start));
    let last = end.date_naive().max(zone.local_date(end));

    first
        .iter_days()
        .take_while(|day| *day <= last)
        .map(|day| day.format("%Y-%m-%d").to_string())
        .collect()
}

/// Distinct program ids referenced by `days`, in first-seen order
pub fn distinct_program_ids(days: &[DaySchedule]) -> Vec<String> {
    let mut seen = HashSet::new();
    days.iter()
        .flat_map(|day| day.programs.iter())
        .filter(|entry| seen.insert(entry.program_id.as_str()))
        .map(|entry| entry.program_id.clone())
        .collect()
}

pub struct ScheduleFetcher {
    transport: Arc<Transport>,
}

impl ScheduleFetcher {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Fetch the schedule for `station_id` over `dates`, then the details of every program in it
    ///
    /// Without a token or without dates the batch is empty: missing credentials are a normal state.
    pub async fn fetch(
        &self,
        station_id: &str,
        dates: Vec<String>,
        token: Option<&str>,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> ListingsResult<ScheduleBatch> {
        let Some(token) = token else {
            return Ok(ScheduleBatch::default());
        };
        if dates.is_empty() {
            debug!("No dates requested for station {}", station_id);
            return Ok(ScheduleBatch::default());
        }

        let body = [ScheduleRequest {
            station_id: station_id.to_string(),
            date: dates,
        }];
        let request = ApiRequest::post_json("schedules", &body)?.with_token(token);
        let response = self.transport.send(request, true, credentials, cancel).await?;
        let days: Vec<DaySchedule> = response.json("schedules")?;

        let program_ids = distinct_program_ids(&days);
        debug!(
            "Found {} airings ({} distinct programs) on station {}",
            days.iter().map(|d| d.programs.len()).sum::<usize>(),
            program_ids.len(),
            station_id
        );

        if program_ids.is_empty() {
            return Ok(ScheduleBatch {
                days,
                details: Vec::new(),
            });
        }

        let request = ApiRequest::post_json("programs", &program_ids)?.with_token(token);
        let response = self.transport.send(request, true, credentials, cancel).await?;
        let details: Vec<ProgramDetails> = response.json("programs")?;

        Ok(ScheduleBatch { days, details })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::token_store::TokenStore;
    use crate::utils::http_client::{HttpExchange, MockHttpExchange};
    use crate::utils::time::ManualClock;
    use chrono::{FixedOffset, TimeZone};
    use rstest::rstest;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn fixed(hours: i32) -> LocalZone {
        LocalZone::Fixed(FixedOffset::east_opt(hours * 3600).unwrap())
    }

    #[test]
    fn test_dates_cover_utc_and_local_interpretations() {
        let dates = schedule_request_dates(utc(2024, 1, 1, 23), utc(2024, 1, 2, 2), &fixed(5));
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02"]);
    }

    #[rstest]
    #[case(fixed(0), vec!["2024-03-10"])]
    #[case(fixed(-8), vec!["2024-03-09", "2024-03-10"])]
    #[case(fixed(14), vec!["2024-03-10", "2024-03-11"])]
    fn test_dates_by_zone(#[case] zone: LocalZone, #[case] expected: Vec<&str>) {
        let dates = schedule_request_dates(utc(2024, 3, 10, 4), utc(2024, 3, 10, 12), &zone);
        assert_eq!(dates, expected);
    }

    #[test]
    fn test_dates_span_month_boundary() {
        let dates = schedule_request_dates(utc(2024, 2, 28, 12), utc(2024, 3, 1, 12), &fixed(0));
        assert_eq!(dates, vec!["2024-02-28", "2024-02-29", "2024-03-01"]);
    }

    #[test]
    fn test_inverted_window_has_no_dates() {
        let dates = schedule_request_dates(utc(2024, 3, 12, 4), utc(2024, 3, 10, 4), &fixed(0));
        assert!(dates.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_without_dates_skips_network() {
        let mut mock = MockHttpExchange::new();
        mock.expect_execute().never();
        let exchange: Arc<dyn HttpExchange> = Arc::new(mock);
        let tokens = Arc::new(TokenStore::with_windows(
            exchange.clone(),
            Arc::new(ManualClock::new(Utc::now())),
            std::time::Duration::from_secs(20 * 3600),
            std::time::Duration::from_secs(60),
        ));
        let fetcher = ScheduleFetcher::new(Arc::new(Transport::new(exchange, tokens)));

        let batch = fetcher
            .fetch(
                "20454",
                Vec::new(),
                Some("t"),
                &Credentials::new("viewer", "secret"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_distinct_program_ids_keep_first_seen_order() {
        let days: Vec<DaySchedule> = serde_json::from_str(
            r#"[
                {"stationID": "1", "programs": [
                    {"programID": "EP1", "airDateTime": "2024-01-01T00:00:00Z"},
                    {"programID": "SH2", "airDateTime": "2024-01-01T01:00:00Z"}
                ]},
                {"stationID": "1", "programs": [
                    {"programID": "EP1", "airDateTime": "2024-01-02T00:00:00Z"},
                    {"programID": "MV3", "airDateTime": "2024-01-02T01:00:00Z"}
                ]}
            ]"#,
        )
        .unwrap();

        assert_eq!(distinct_program_ids(&days), vec!["EP1", "SH2", "MV3"]);

        let batch = ScheduleBatch {
            days,
            details: Vec::new(),
        };
        assert_eq!(batch.entries().count(), 4);
        assert!(!batch.is_empty());
    }
}
