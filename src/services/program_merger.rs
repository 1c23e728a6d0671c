//! Merge of schedule entries, program details and selected artwork into program records

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use tracing::warn;

use crate::errors::{ListingsError, ListingsResult};
use crate::models::schedules_direct::{DaySchedule, Description, ProgramDetails, ScheduleEntry};
use crate::models::{ProgramAudio, ProgramRecord};
use crate::services::image_fetcher::ArtworkIndex;
use crate::services::image_selector::{ProgramImages, select_program_images};
use crate::utils::time::dotnet_ticks;

const ROOT_LEN: usize = 10;
const GENERIC_PREFIX: &str = "SH";
const UNIDENTIFIED_SUFFIX: &str = "0000";
const SERIES_PROVIDER: &str = "Zap2It";
const PLACEHOLDER_RATINGS: [&str; 4] = ["N/A", "Approved", "Not Rated", "Passed"];

/// First 10 characters of a program id; shorter ids are their own root
pub fn program_id_root(program_id: &str) -> &str {
    program_id.get(..ROOT_LEN).unwrap_or(program_id)
}

/// Per-airing identity: `{program id}T{start ticks}C{channel id}`
pub fn identity_key(entry: &ScheduleEntry, channel_id: &str) -> String {
    format!(
        "{}T{}C{}",
        entry.program_id,
        dotnet_ticks(entry.air_date_time),
        channel_id
    )
}

pub fn classify_audio(properties: Option<&[String]>) -> ProgramAudio {
    let Some(properties) = properties else {
        return ProgramAudio::Stereo;
    };
    let has = |tag: &str| properties.iter().any(|p| p.eq_ignore_ascii_case(tag));

    if has("atmos") {
        ProgramAudio::Atmos
    } else if has("dd 5.1") || has("dd") {
        ProgramAudio::DolbyDigital
    } else if has("stereo") {
        ProgramAudio::Stereo
    } else {
        ProgramAudio::Mono
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn ends_with_ignore_case(value: &str, suffix: &str) -> bool {
    value.len() >= suffix.len()
        && value
            .get(value.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

pub fn is_series(program_id: &str, details: &ProgramDetails) -> bool {
    let episode = details
        .entity_type
        .as_deref()
        .is_some_and(|t| t.eq_ignore_ascii_case("episode"));
    episode || (starts_with_ignore_case(program_id, GENERIC_PREFIX) && program_id.len() >= 14)
}

/// Series grouping key
///
/// Generic, unidentified episodes (`SH........0000`) cannot be grouped and use
/// the per-airing identity instead.
pub fn show_id(program_id: &str, identity: &str) -> String {
    if starts_with_ignore_case(program_id, GENERIC_PREFIX)
        && ends_with_ignore_case(program_id, UNIDENTIFIED_SUFFIX)
    {
        identity.to_string()
    } else {
        program_id_root(program_id).to_string()
    }
}

pub fn normalize_rating(code: &str) -> Option<String> {
    let rating = code.replace("TV", "TV-").replace("--", "-");
    let rating = rating.trim();
    if rating.is_empty()
        || PLACEHOLDER_RATINGS
            .iter()
            .any(|p| p.eq_ignore_ascii_case(rating))
    {
        return None;
    }
    Some(rating.to_string())
}

fn first_description(list: &[Description]) -> Option<String> {
    list.first()
        .and_then(|d| d.description.clone())
        .filter(|d| !d.trim().is_empty())
}

/// Long-form description, else the short one
fn overview(details: &ProgramDetails) -> Option<String> {
    let descriptions = details.descriptions.as_ref()?;
    first_description(&descriptions.description1000)
        .or_else(|| first_description(&descriptions.description100))
}

fn has_tag(tags: Option<&[String]>, tag: &str) -> bool {
    tags.is_some_and(|tags| tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
}

fn entity_is(details: &ProgramDetails, kind: &str) -> bool {
    details
        .entity_type
        .as_deref()
        .is_some_and(|t| t.eq_ignore_ascii_case(kind))
}

fn parse_air_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| value.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

/// End of an airing; a negative or out-of-range duration collapses to the start
pub fn airing_end(entry: &ScheduleEntry) -> DateTime<Utc> {
    (entry.duration >= 0)
        .then(|| Duration::try_seconds(entry.duration))
        .flatten()
        .and_then(|length| entry.air_date_time.checked_add_signed(length))
        .unwrap_or_else(|| {
            warn!(
                "Airing of {} has unusable duration {}s, treating it as zero length",
                entry.program_id, entry.duration
            );
            entry.air_date_time
        })
}

/// Build one record from an airing, its details and its selected images
pub fn merge_program(
    channel_id: &str,
    entry: &ScheduleEntry,
    details: &ProgramDetails,
    images: Option<&ProgramImages>,
) -> ProgramRecord {
    let id = identity_key(entry, channel_id);
    let program_id = entry.program_id.as_str();
    let series = is_series(program_id, details);
    let genres: Vec<String> = details
        .genres
        .iter()
        .flatten()
        .filter(|g| !g.trim().is_empty())
        .cloned()
        .collect();

    let mut record = ProgramRecord {
        channel_id: channel_id.to_string(),
        name: details
            .titles
            .first()
            .and_then(|t| t.title120.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        episode_title: details.episode_title150.clone(),
        overview: overview(details),
        start_date: entry.air_date_time,
        end_date: airing_end(entry),
        audio: classify_audio(entry.audio_properties.as_deref()),
        official_rating: details
            .content_rating
            .first()
            .and_then(|r| normalize_rating(&r.code)),
        is_series: series,
        show_id: show_id(program_id, &id),
        is_repeat: entry.is_new.is_none(),
        is_movie: entity_is(details, "movie"),
        is_sports: entity_is(details, "sports"),
        is_kids: details
            .audience
            .as_deref()
            .is_some_and(|a| a.eq_ignore_ascii_case("children"))
            || genres.iter().any(|g| g.eq_ignore_ascii_case("children")),
        is_news: genres.iter().any(|g| g.eq_ignore_ascii_case("news")),
        is_live: entry
            .live_tape_delay
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case("live")),
        is_premiere: entry.premiere
            || entry
                .is_premiere_or_finale
                .as_deref()
                .is_some_and(|p| p.to_ascii_lowercase().contains("premiere")),
        is_hd: has_tag(entry.video_properties.as_deref(), "hdtv"),
        is_3d: has_tag(entry.video_properties.as_deref(), "3d"),
        etag: entry.md5.clone(),
        genres,
        id,
        ..ProgramRecord::default()
    };

    if series {
        let series_id = program_id_root(program_id).to_string();
        record
            .series_provider_ids
            .insert(SERIES_PROVIDER.to_string(), series_id.clone());
        record.series_id = Some(series_id);

        if let Some(numbering) = details.metadata.iter().find_map(|m| m.gracenote) {
            record.season_number = Some(numbering.season);
            record.episode_number = (numbering.episode > 0).then_some(numbering.episode);
        }
    }

    record.original_air_date = parse_air_date(details.original_air_date.as_deref());
    record.production_year = record.original_air_date.map(|d| d.year());
    if let Some(year) = details
        .movie
        .as_ref()
        .and_then(|m| m.year.as_deref())
        .and_then(|y| y.trim().parse::<i32>().ok())
    {
        record.production_year = Some(year);
    }

    if let Some(images) = images {
        record.image_url = images.primary.clone();
        record.thumb_image_url = images.thumb.clone();
        record.backdrop_image_url = images.backdrop.clone();
    }

    record
}

/// Merge every airing in `days`, keeping the service order
///
/// An airing whose program id is missing from `details` is a service contract
/// breach and fails the whole batch.
pub fn merge_programs(
    channel_id: &str,
    days: &[DaySchedule],
    details: &[ProgramDetails],
    artwork: &ArtworkIndex,
    image_base: &str,
) -> ListingsResult<Vec<ProgramRecord>> {
    let details_by_id: HashMap<&str, &ProgramDetails> = details
        .iter()
        .map(|d| (d.program_id.as_str(), d))
        .collect();
    let images_by_root: HashMap<&str, ProgramImages> = artwork
        .iter()
        .map(|(root, candidates)| (root.as_str(), select_program_images(candidates, image_base)))
        .collect();

    days.iter()
        .flat_map(|day| day.programs.iter())
        .map(|entry| {
            let details = details_by_id.get(entry.program_id.as_str()).ok_or_else(|| {
                ListingsError::service_invariant(format!(
                    "schedule references program {} without details",
                    entry.program_id
                ))
            })?;
            let images = images_by_root.get(program_id_root(&entry.program_id));
            Ok(merge_program(channel_id, entry, details, images))
        })
        .collect()
}
