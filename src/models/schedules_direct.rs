//! Wire shapes of the listings service JSON API
//!
//! Field names follow the service; everything not needed for a decision is
//! optional so that a partially populated payload still decodes.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// `POST /token` body; the password is the lowercase hex SHA-1 of the clear text
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// `POST /schedules` body element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRequest {
    #[serde(rename = "stationID")]
    pub station_id: String,
    pub date: Vec<String>,
}

/// Schedule for one station on one day
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaySchedule {
    #[serde(rename = "stationID", default)]
    pub station_id: String,
    #[serde(default)]
    pub programs: Vec<ScheduleEntry>,
}

/// One airing on one channel
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    #[serde(rename = "programID")]
    pub program_id: String,
    pub air_date_time: DateTime<Utc>,
    /// Seconds
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub audio_properties: Option<Vec<String>>,
    #[serde(default)]
    pub video_properties: Option<Vec<String>>,
    #[serde(rename = "new", default)]
    pub is_new: Option<bool>,
    #[serde(default)]
    pub live_tape_delay: Option<String>,
    #[serde(default)]
    pub premiere: bool,
    #[serde(default)]
    pub is_premiere_or_finale: Option<String>,
}

/// Detail record shared by every airing of a program id
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDetails {
    #[serde(rename = "programID")]
    pub program_id: String,
    #[serde(default)]
    pub titles: Vec<ProgramTitle>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub episode_title150: Option<String>,
    #[serde(default)]
    pub descriptions: Option<ProgramDescriptions>,
    #[serde(default)]
    pub content_rating: Vec<ContentRating>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub original_air_date: Option<String>,
    #[serde(default)]
    pub movie: Option<MovieInfo>,
    #[serde(default)]
    pub metadata: Vec<ProgramMetadata>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub has_image_artwork: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramTitle {
    #[serde(default)]
    pub title120: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramDescriptions {
    #[serde(default)]
    pub description100: Vec<Description>,
    #[serde(default)]
    pub description1000: Vec<Description>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentRating {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
}

/// One metadata block; only the Gracenote numbering is consumed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramMetadata {
    #[serde(rename = "Gracenote", default)]
    pub gracenote: Option<GracenoteNumbering>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GracenoteNumbering {
    #[serde(default)]
    pub season: i32,
    #[serde(default)]
    pub episode: i32,
}

/// Artwork list for one 10-character program root
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShowImages {
    #[serde(rename = "programID")]
    pub program_id: String,
    /// Error payloads come back as an object instead of a list; they decode as empty
    #[serde(default, deserialize_with = "candidate_list")]
    pub data: Vec<ImageCandidate>,
}

/// One artwork candidate; dimensions arrive as strings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImageCandidate {
    #[serde(default, deserialize_with = "lenient_string")]
    pub width: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub height: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl ImageCandidate {
    pub fn new(width: &str, height: &str, text: bool, uri: &str) -> Self {
        Self {
            width: Some(width.to_string()),
            height: Some(height.to_string()),
            uri: Some(uri.to_string()),
            text: Some(if text { "yes" } else { "no" }.to_string()),
            ..Self::default()
        }
    }

    /// `Some(true)` for "yes", `Some(false)` for "no", `None` when unknown
    pub fn has_text(&self) -> Option<bool> {
        match self.text.as_deref() {
            Some(t) if t.eq_ignore_ascii_case("yes") => Some(true),
            Some(t) if t.eq_ignore_ascii_case("no") => Some(false),
            _ => None,
        }
    }

    pub fn width_px(&self) -> i64 {
        parse_dimension(self.width.as_deref())
    }

    pub fn height_px(&self) -> i64 {
        parse_dimension(self.height.as_deref())
    }

    /// Width over height, or 0 when either side is missing or not a number
    pub fn aspect_ratio(&self) -> f64 {
        let (width, height) = (self.width_px(), self.height_px());
        if width == 0 || height == 0 {
            return 0.0;
        }
        width as f64 / height as f64
    }
}

fn parse_dimension(value: Option<&str>) -> i64 {
    value
        .map(str::trim)
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0)
}

/// `GET /headends` element
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Headend {
    #[serde(default)]
    pub lineups: Vec<LineupDescriptor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineupDescriptor {
    #[serde(default)]
    pub lineup: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uri: String,
}

/// `GET /lineups` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountLineups {
    #[serde(default)]
    pub lineups: Vec<LineupDescriptor>,
}

/// `GET /lineups/{id}` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineupChannels {
    #[serde(default)]
    pub map: Vec<ChannelMapEntry>,
    #[serde(default)]
    pub stations: Vec<Station>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMapEntry {
    #[serde(rename = "stationID")]
    pub station_id: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub logical_channel_number: Option<String>,
    #[serde(default)]
    pub atsc_major: Option<i32>,
    #[serde(default)]
    pub atsc_minor: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Station {
    #[serde(rename = "stationID")]
    pub station_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub callsign: Option<String>,
    #[serde(default)]
    pub logo: Option<StationLogo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationLogo {
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
}

/// Accept a string, a number or null
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Decode a candidate list, treating non-list payloads and undecodable entries as absent
fn candidate_list<'de, D>(deserializer: D) -> Result<Vec<ImageCandidate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::Array(items)) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}
