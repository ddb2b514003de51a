//! The typed, immutable result of a parse: [`Playlist`] and the records it
//! owns. Nothing in this module parses anything; it is pure data plus the
//! derived query [`Playlist::is_date_in_daterange`].

use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub uri: String,
    pub is_master: bool,
    pub version: u64,
    pub targetduration: Option<u64>,
    pub media_sequence: u64,
    pub discontinuity_sequence: u64,
    pub is_endlist: bool,
    pub playlist_type: Option<PlaylistType>,
    pub iframes_only: bool,
    pub allow_cache: Option<bool>,
    pub start: Option<Start>,
    pub media: Vec<Media>,
    pub playlists: Vec<VariantPlaylist>,
    pub segments: Vec<Segment>,
    pub keys: Vec<Key>,
    pub dateranges: Vec<DateRange>,
}

impl Playlist {
    /// Whether `date` falls in `dr`'s half-open interval
    /// `[start_date, start_date + duration)` (or `end_date`, or unbounded).
    /// `None` if either `date` or `dr.start_date` is missing.
    ///
    /// `DURATION` takes precedence over `END-DATE` when both are present
    /// (spec.md §4.4's ordering & tie-break rule for `DateRange`).
    pub fn is_date_in_daterange(
        date: DateTime<FixedOffset>,
        dr: &DateRange,
    ) -> Option<bool> {
        let start = dr.start_date?;

        let end = if let Some(duration) = dr.duration {
            start + chrono::Duration::milliseconds((duration * 1000.0) as i64)
        } else if let Some(end_date) = dr.end_date {
            end_date
        } else {
            return Some(date >= start);
        };

        Some(start <= date && date < end)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistType {
    Vod,
    Event,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Start {
    pub time_offset: f64,
    pub precise: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub uri: Option<String>,
    pub media_type: MediaType,
    pub group_id: String,
    pub language: Option<String>,
    pub name: String,
    pub default: bool,
    pub autoselect: bool,
    pub forced: bool,
    pub characteristics: Option<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Audio,
    Video,
    Subtitles,
    ClosedCaptions,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VariantPlaylist {
    pub uri: String,
    pub stream_info: StreamInfo,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub bandwidth: u64,
    pub program_id: Option<String>,
    pub codecs: Vec<String>,
    pub resolution: Resolution,
    pub audio: Option<String>,
    pub video: Option<String>,
    pub subtitles: Option<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolution {
    pub width: u64,
    pub height: u64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub uri: String,
    pub num: u64,
    pub duration: f64,
    pub title: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
    pub key: Option<Key>,
    pub discontinuity: bool,
    pub byterange: Option<ByteRange>,
    pub map: Option<Map>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub method: EncryptionMethod,
    pub uri: Option<String>,
    pub iv: Option<Vec<u8>>,
    pub key_format: Option<String>,
    pub key_format_versions: Option<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptionMethod {
    None,
    Aes128,
    SampleAes,
    /// Any other `METHOD` token, preserved verbatim.
    Other(String),
}

impl EncryptionMethod {
    pub(crate) fn parse(value: &str) -> Self {
        match value {
            "NONE" => EncryptionMethod::None,
            "AES-128" => EncryptionMethod::Aes128,
            "SAMPLE-AES" => EncryptionMethod::SampleAes,
            other => EncryptionMethod::Other(other.to_string()),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    pub uri: String,
    pub byterange: Option<ByteRange>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub length: u64,
    pub offset: Option<u64>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ExtInf {
    pub duration: f64,
    pub title: Option<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DateRange {
    pub id: Option<String>,
    pub classname: Option<String>,
    pub start_date: Option<DateTime<FixedOffset>>,
    pub end_date: Option<DateTime<FixedOffset>>,
    pub duration: Option<f64>,
    pub planned_duration: Option<f64>,
    pub end_on_next: bool,
    pub x: BTreeMap<String, String>,
}

#[cfg(test)]
mod test {
    use super::*;

    fn dt(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn daterange_missing_start_or_date_is_unknown() {
        let dr = DateRange {
            id: None,
            classname: None,
            start_date: None,
            end_date: None,
            duration: None,
            planned_duration: None,
            end_on_next: false,
            x: BTreeMap::new(),
        };
        assert_eq!(
            Playlist::is_date_in_daterange(dt("2000-01-01T00:00:00Z"), &dr),
            None
        );
    }

    #[test]
    fn daterange_duration_wins_over_end_date() {
        let dr = DateRange {
            id: Some("x".into()),
            classname: None,
            start_date: Some(dt("2000-01-01T00:00:00Z")),
            end_date: Some(dt("2000-01-01T01:00:00Z")),
            duration: Some(15.0),
            planned_duration: None,
            end_on_next: false,
            x: BTreeMap::new(),
        };
        assert_eq!(
            Playlist::is_date_in_daterange(dt("2000-01-01T00:00:20Z"), &dr),
            Some(false)
        );
    }

    #[test]
    fn daterange_open_ended_is_unbounded() {
        let dr = DateRange {
            id: Some("x".into()),
            classname: None,
            start_date: Some(dt("2000-01-01T00:00:00Z")),
            end_date: None,
            duration: None,
            planned_duration: None,
            end_on_next: false,
            x: BTreeMap::new(),
        };
        assert_eq!(
            Playlist::is_date_in_daterange(dt("2099-01-01T00:00:00Z"), &dr),
            Some(true)
        );
        assert_eq!(
            Playlist::is_date_in_daterange(dt("1999-01-01T00:00:00Z"), &dr),
            Some(false)
        );
    }
}
