//! Lineup map entries joined with station metadata

use tracing::info;

use crate::models::ChannelRecord;
use crate::models::schedules_direct::{ChannelMapEntry, LineupChannels, Station};

/// Logical number, then the channel field, then `major.minor`; leading zeros stripped
pub fn channel_number(entry: &ChannelMapEntry) -> String {
    let explicit = entry
        .logical_channel_number
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .or_else(|| entry.channel.as_deref().filter(|n| !n.trim().is_empty()));

    let number = match explicit {
        Some(number) => number.to_string(),
        None => format!(
            "{}.{}",
            entry.atsc_major.unwrap_or_default(),
            entry.atsc_minor.unwrap_or_default()
        ),
    };

    number.trim_start_matches('0').to_string()
}

fn channel_record(entry: &ChannelMapEntry, station: Option<&Station>) -> ChannelRecord {
    let number = channel_number(entry);
    let Some(station) = station else {
        return ChannelRecord {
            id: entry.station_id.clone(),
            name: number.clone(),
            number,
            call_sign: None,
            image_url: None,
        };
    };

    ChannelRecord {
        id: station.station_id.clone(),
        name: station
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| number.clone()),
        number,
        call_sign: station.callsign.clone(),
        image_url: station.logo.as_ref().and_then(|logo| logo.url.clone()),
    }
}

/// One channel record per map entry, in map order
pub fn map_channels(lineup: &LineupChannels) -> Vec<ChannelRecord> {
    info!("Mapping {} lineup entries to stations", lineup.map.len());

    lineup
        .map
        .iter()
        .map(|entry| {
            let station = lineup
                .stations
                .iter()
                .find(|s| s.station_id.eq_ignore_ascii_case(&entry.station_id));
            channel_record(entry, station)
        })
        .collect()
}
