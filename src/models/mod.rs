use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub mod schedules_direct;

/// Account credentials for the listings service
///
/// Identifies a token cache entry. A blank username or empty password disables sync
/// for the account.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Whether both halves are present
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &format!("{}chars", self.password.len()))
            .finish()
    }
}

/// Per-call provider configuration supplied by the surrounding application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingsProviderInfo {
    pub credentials: Credentials,
    /// Lineup id attached to the account (e.g. `USA-NY67791-X`)
    pub listings_id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramAudio {
    Mono,
    #[default]
    Stereo,
    DolbyDigital,
    Atmos,
}

/// One airing of a program on one channel, with its detail and artwork merged in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramRecord {
    /// Per-airing identity: `{program id}T{start ticks}C{channel id}`
    pub id: String,
    pub channel_id: String,
    pub name: String,
    pub episode_title: Option<String>,
    pub overview: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub audio: ProgramAudio,
    pub official_rating: Option<String>,
    pub genres: Vec<String>,
    pub original_air_date: Option<NaiveDate>,
    pub production_year: Option<i32>,

    pub is_series: bool,
    pub show_id: String,
    pub series_id: Option<String>,
    pub series_provider_ids: HashMap<String, String>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,

    pub is_repeat: bool,
    pub is_movie: bool,
    pub is_sports: bool,
    pub is_kids: bool,
    pub is_news: bool,
    pub is_live: bool,
    pub is_premiere: bool,
    pub is_hd: bool,
    pub is_3d: bool,

    pub image_url: Option<String>,
    pub thumb_image_url: Option<String>,
    pub backdrop_image_url: Option<String>,

    /// Content hash of the schedule entry
    pub etag: Option<String>,
}

/// Channel within a lineup, joined with its station metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: String,
    pub number: String,
    pub name: String,
    pub call_sign: Option<String>,
    pub image_url: Option<String>,
}

/// Lineup offered for a country / postal code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupSummary {
    pub id: String,
    pub name: String,
}
