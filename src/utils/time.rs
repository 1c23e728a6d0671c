//! Time utilities: injectable clocks, local-zone handling and .NET tick conversion

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use crate::errors::{ListingsError, ListingsResult};

/// Ticks (100 ns units since 0001-01-01T00:00:00) at the Unix epoch
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Source of the current time
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Zone used to interpret instants as local calendar dates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum LocalZone {
    /// Host time zone
    #[default]
    System,
    Named(Tz),
    Fixed(FixedOffset),
}

impl LocalZone {
    /// Parse an IANA zone name such as `America/New_York`
    pub fn named(name: &str) -> ListingsResult<Self> {
        name.trim()
            .parse::<Tz>()
            .map(Self::Named)
            .map_err(|e| ListingsError::configuration(format!("Unknown timezone '{name}': {e}")))
    }

    /// Calendar date of `instant` in this zone
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::System => instant.with_timezone(&Local).date_naive(),
            Self::Named(tz) => instant.with_timezone(tz).date_naive(),
            Self::Fixed(offset) => instant.with_timezone(offset).date_naive(),
        }
    }
}

/// Convert an instant to .NET `DateTime.Ticks`
pub fn dotnet_ticks(instant: DateTime<Utc>) -> i64 {
    UNIX_EPOCH_TICKS
        + instant.timestamp() * TICKS_PER_SECOND
        + i64::from(instant.timestamp_subsec_nanos() / 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_dotnet_ticks() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(dotnet_ticks(instant), 638_396_640_000_000_000);

        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(dotnet_ticks(epoch), UNIX_EPOCH_TICKS);
    }

    #[test]
    fn test_manual_clock_moves_only_on_demand() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(90));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_local_date_per_zone() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap();

        let plus_five = LocalZone::Fixed(FixedOffset::east_opt(5 * 3600).unwrap());
        assert_eq!(
            plus_five.local_date(instant),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );

        let new_york = LocalZone::named("America/New_York").unwrap();
        assert_eq!(
            new_york.local_date(instant),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );

        assert!(LocalZone::named("Nowhere/Special").is_err());
    }
}
