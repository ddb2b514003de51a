//! The line-driven state machine (spec.md §4.4): splits the document into
//! lines, classifies each, dispatches tags through the [`crate::registry`],
//! and commits the "pending segment decorator" state on each URI line.

use crate::attributes::{parse_attributes, AttributeList};
use crate::diagnostics::{self, MALFORMED_BYTERANGE_CONTINUATION};
use crate::error::MalformedPlaylistError;
use crate::lexical;
use crate::model::{
    ByteRange, DateRange, EncryptionMethod, ExtInf, Key, Map, Media, MediaType, Playlist,
    PlaylistType, Resolution, Segment, Start, StreamInfo, VariantPlaylist,
};
use crate::registry::{self, HandlerEntry, ParserClass};
use crate::uri;
use chrono::{DateTime, Duration, FixedOffset};
use std::collections::BTreeMap;

pub type Handler = fn(&mut ParserState, &str);

/// Splits one line into `(tag name, raw attribute/arg string)`.
///
/// `(None, None)` for an empty line or one not starting with `#`.
/// Whitespace surrounding the argument portion is trimmed (`"#TAG:
/// ATTRIBUTES  "` → `("TAG", "ATTRIBUTES")`); a bare tag with no `:` yields
/// `("TAG", "")`.
pub fn split_tag(line: &str) -> (Option<&str>, Option<&str>) {
    if line.is_empty() || !line.starts_with('#') {
        return (None, None);
    }
    let body = &line[1..];
    match body.split_once(':') {
        Some((name, rest)) => (Some(name), Some(rest.trim())),
        None => (Some(body), Some("")),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PendingByterangeOffset {
    Explicit(u64),
    Continued,
}

struct PendingByterange {
    length: u64,
    offset: PendingByterangeOffset,
}

/// Mutable in-progress parser state. Handlers (registered in
/// [`crate::registry`]) mutate this through `&mut self`; nothing here is
/// ever shared across parse calls.
pub struct ParserState {
    base_uri: String,

    version: u64,
    targetduration: Option<u64>,
    media_sequence: u64,
    media_sequence_locked: bool,
    discontinuity_sequence: u64,
    is_endlist: bool,
    playlist_type: Option<PlaylistType>,
    iframes_only: bool,
    allow_cache: Option<bool>,
    start: Option<Start>,

    media: Vec<Media>,
    playlists: Vec<VariantPlaylist>,
    segments: Vec<Segment>,
    keys: Vec<Key>,
    dateranges: Vec<DateRange>,

    saw_stream_inf: bool,
    saw_extinf: bool,

    pending_stream_info: Option<StreamInfo>,
    pending_extinf: Option<ExtInf>,
    pending_discontinuity: bool,
    pending_byterange: Option<PendingByterange>,
    last_byterange: Option<(String, u64)>,

    active_key: Option<Key>,
    active_map: Option<Map>,

    date_anchor: Option<DateTime<FixedOffset>>,
    date_accum_ms: i64,
}

impl ParserState {
    fn new(base_uri: &str) -> Self {
        ParserState {
            base_uri: base_uri.to_string(),
            // RFC 8216 §4.3.1.2: a playlist without #EXT-X-VERSION is version 1.
            version: 1,
            targetduration: None,
            media_sequence: 0,
            media_sequence_locked: false,
            discontinuity_sequence: 0,
            is_endlist: false,
            playlist_type: None,
            iframes_only: false,
            allow_cache: None,
            start: None,
            media: Vec::new(),
            playlists: Vec::new(),
            segments: Vec::new(),
            keys: Vec::new(),
            dateranges: Vec::new(),
            saw_stream_inf: false,
            saw_extinf: false,
            pending_stream_info: None,
            pending_extinf: None,
            pending_discontinuity: false,
            pending_byterange: None,
            last_byterange: None,
            active_key: None,
            active_map: None,
            date_anchor: None,
            date_accum_ms: 0,
        }
    }

    fn resolve(&self, reference: &str) -> String {
        uri::resolve(&self.base_uri, reference)
    }

    /// Commits the pending-decorator state against a URI line (spec.md
    /// §4.4 step 4).
    fn commit_uri_line(&mut self, raw_uri: &str) {
        let resolved = self.resolve(raw_uri);

        if let Some(stream_info) = self.pending_stream_info.take() {
            self.playlists.push(VariantPlaylist {
                uri: resolved,
                stream_info,
            });
            return;
        }

        let Some(extinf) = self.pending_extinf.take() else {
            log::debug!(target: "hls_m3u8::parser", "stray URI line without a preceding EXTINF");
            self.pending_discontinuity = false;
            self.pending_byterange = None;
            return;
        };

        self.media_sequence_locked = true;

        let byterange = self.pending_byterange.take().map(|pending| {
            let offset = match pending.offset {
                PendingByterangeOffset::Explicit(offset) => offset,
                PendingByterangeOffset::Continued => match &self.last_byterange {
                    Some((prev_uri, prev_end)) if *prev_uri == resolved => *prev_end,
                    _ => {
                        diagnostics::warn(MALFORMED_BYTERANGE_CONTINUATION);
                        0
                    }
                },
            };
            self.last_byterange = Some((resolved.clone(), offset + pending.length));
            ByteRange {
                length: pending.length,
                offset: Some(offset),
            }
        });

        let date = self.date_anchor.map(|anchor| anchor + Duration::milliseconds(self.date_accum_ms));
        if date.is_some() {
            self.date_accum_ms += (extinf.duration * 1000.0) as i64;
        }

        let num = self.media_sequence + self.segments.len() as u64;
        self.segments.push(Segment {
            uri: resolved,
            num,
            duration: extinf.duration,
            title: extinf.title,
            date,
            key: self.active_key.clone(),
            discontinuity: std::mem::take(&mut self.pending_discontinuity),
            byterange,
            map: self.active_map.clone(),
        });
    }

    fn finish(self) -> Playlist {
        let is_master = self.saw_stream_inf;
        if self.saw_stream_inf && self.saw_extinf {
            log::warn!(
                target: "hls_m3u8::parser",
                "playlist contains both #EXT-X-STREAM-INF and #EXTINF; treating as master"
            );
        }

        Playlist {
            uri: self.base_uri,
            is_master,
            version: self.version,
            targetduration: self.targetduration,
            media_sequence: self.media_sequence,
            discontinuity_sequence: self.discontinuity_sequence,
            is_endlist: self.is_endlist,
            playlist_type: self.playlist_type,
            iframes_only: self.iframes_only,
            allow_cache: self.allow_cache,
            start: self.start,
            media: self.media,
            playlists: self.playlists,
            segments: self.segments,
            keys: self.keys,
            dateranges: self.dateranges,
        }
    }
}

fn parse_bare_integer(raw: &str) -> Option<u64> {
    lexical::parse_integer(Some(raw.trim()))
}

fn h_noop(_state: &mut ParserState, _raw: &str) {}

fn h_ext_x_version(state: &mut ParserState, raw: &str) {
    if let Some(n) = parse_bare_integer(raw) {
        state.version = n;
    }
}

fn h_ext_x_targetduration(state: &mut ParserState, raw: &str) {
    state.targetduration = parse_bare_integer(raw);
}

fn h_ext_x_media_sequence(state: &mut ParserState, raw: &str) {
    if let Some(n) = parse_bare_integer(raw) {
        if state.media_sequence_locked {
            log::debug!(
                target: "hls_m3u8::parser",
                "#EXT-X-MEDIA-SEQUENCE appeared after segments were already emitted; applying from current index"
            );
        }
        state.media_sequence = n;
    }
}

fn h_ext_x_discontinuity_sequence(state: &mut ParserState, raw: &str) {
    if let Some(n) = parse_bare_integer(raw) {
        state.discontinuity_sequence = n;
    }
}

fn h_ext_x_endlist(state: &mut ParserState, _raw: &str) {
    state.is_endlist = true;
}

fn h_ext_x_playlist_type(state: &mut ParserState, raw: &str) {
    state.playlist_type = match raw.trim() {
        "VOD" => Some(PlaylistType::Vod),
        "EVENT" => Some(PlaylistType::Event),
        _ => None,
    };
}

fn h_ext_x_iframes_only(state: &mut ParserState, _raw: &str) {
    state.iframes_only = true;
}

fn h_ext_x_allow_cache(state: &mut ParserState, raw: &str) {
    state.allow_cache = Some(lexical::parse_bool(raw.trim()));
}

fn h_ext_x_start(state: &mut ParserState, raw: &str) {
    let attrs = parse_attributes(raw);
    let time_offset = lexical::parse_timedelta(attrs.get("TIME-OFFSET")).unwrap_or(0.0);
    let precise = attrs.get("PRECISE").map(lexical::parse_bool).unwrap_or(false);
    state.start = Some(Start {
        time_offset,
        precise,
    });
}

fn h_extinf(state: &mut ParserState, raw: &str) {
    state.saw_extinf = true;
    let (duration, title) = lexical::parse_extinf(raw);
    state.pending_extinf = Some(ExtInf { duration, title });
}

fn h_ext_x_byterange(state: &mut ParserState, raw: &str) {
    match lexical::parse_byterange(raw) {
        Some((length, Some(offset))) => {
            state.pending_byterange = Some(PendingByterange {
                length,
                offset: PendingByterangeOffset::Explicit(offset),
            });
        }
        Some((length, None)) => {
            state.pending_byterange = Some(PendingByterange {
                length,
                offset: PendingByterangeOffset::Continued,
            });
        }
        None => {
            state.pending_byterange = None;
        }
    }
}

fn h_ext_x_discontinuity(state: &mut ParserState, _raw: &str) {
    state.pending_discontinuity = true;
}

fn h_ext_x_key(state: &mut ParserState, raw: &str) {
    let attrs = parse_attributes(raw);
    let method = EncryptionMethod::parse(attrs.get("METHOD").unwrap_or("NONE"));
    let key = Key {
        uri: attrs.get("URI").map(|u| state.resolve(u)),
        iv: lexical::parse_hex(attrs.get("IV")),
        key_format: attrs.get("KEYFORMAT").map(str::to_string),
        key_format_versions: attrs.get("KEYFORMATVERSIONS").map(str::to_string),
        method: method.clone(),
    };
    state.keys.push(key.clone());
    state.active_key = if method == EncryptionMethod::None {
        None
    } else {
        Some(key)
    };
}

fn h_ext_x_map(state: &mut ParserState, raw: &str) {
    let attrs = parse_attributes(raw);
    let Some(uri) = attrs.get("URI") else {
        return;
    };
    state.active_map = Some(Map {
        uri: state.resolve(uri),
        byterange: attrs.get("BYTERANGE").and_then(lexical::parse_byterange).map(
            |(length, offset)| ByteRange { length, offset },
        ),
    });
}

fn h_ext_x_program_date_time(state: &mut ParserState, raw: &str) {
    if let Some(dt) = lexical::parse_iso8601(Some(raw.trim())) {
        state.date_anchor = Some(dt);
        state.date_accum_ms = 0;
    }
}

fn h_ext_x_daterange(state: &mut ParserState, raw: &str) {
    let attrs = parse_attributes(raw);
    let mut x = BTreeMap::new();
    for (key, value) in attrs.iter() {
        if key.strip_prefix("X-").is_some() {
            x.insert(key.to_string(), value.to_string());
        }
    }
    state.dateranges.push(DateRange {
        id: attrs.get("ID").map(str::to_string),
        classname: attrs.get("CLASS").map(str::to_string),
        start_date: lexical::parse_iso8601(attrs.get("START-DATE")),
        end_date: lexical::parse_iso8601(attrs.get("END-DATE")),
        duration: lexical::parse_timedelta(attrs.get("DURATION")),
        planned_duration: lexical::parse_timedelta(attrs.get("PLANNED-DURATION")),
        end_on_next: attrs.get("END-ON-NEXT").map(lexical::parse_bool).unwrap_or(false),
        x,
    });
}

fn media_type(raw: &str) -> MediaType {
    match raw {
        "VIDEO" => MediaType::Video,
        "SUBTITLES" => MediaType::Subtitles,
        "CLOSED-CAPTIONS" => MediaType::ClosedCaptions,
        _ => MediaType::Audio,
    }
}

fn h_ext_x_media(state: &mut ParserState, raw: &str) {
    let attrs = parse_attributes(raw);
    state.media.push(Media {
        uri: attrs.get("URI").map(|u| state.resolve(u)),
        media_type: media_type(attrs.get("TYPE").unwrap_or("")),
        group_id: attrs.get("GROUP-ID").unwrap_or("").to_string(),
        language: attrs.get("LANGUAGE").map(str::to_string),
        name: attrs.get("NAME").unwrap_or("").to_string(),
        default: attrs.get("DEFAULT").map(lexical::parse_bool).unwrap_or(false),
        autoselect: attrs.get("AUTOSELECT").map(lexical::parse_bool).unwrap_or(false),
        forced: attrs.get("FORCED").map(lexical::parse_bool).unwrap_or(false),
        characteristics: attrs.get("CHARACTERISTICS").map(str::to_string),
    });
}

fn stream_info_from_attrs(attrs: &AttributeList) -> StreamInfo {
    StreamInfo {
        bandwidth: lexical::parse_integer(attrs.get("BANDWIDTH")).unwrap_or(0),
        program_id: attrs.get("PROGRAM-ID").map(str::to_string),
        codecs: attrs
            .get("CODECS")
            .map(|c| c.split(',').map(str::to_string).collect())
            .unwrap_or_default(),
        resolution: attrs
            .get("RESOLUTION")
            .map(lexical::parse_resolution)
            .map(|(width, height)| Resolution { width, height })
            .unwrap_or_default(),
        audio: attrs.get("AUDIO").map(str::to_string),
        video: attrs.get("VIDEO").map(str::to_string),
        subtitles: attrs.get("SUBTITLES").map(str::to_string),
    }
}

fn h_ext_x_stream_inf(state: &mut ParserState, raw: &str) {
    state.saw_stream_inf = true;
    let attrs = parse_attributes(raw);
    state.pending_stream_info = Some(stream_info_from_attrs(&attrs));
}

fn h_ext_x_i_frame_stream_inf(state: &mut ParserState, raw: &str) {
    state.saw_stream_inf = true;
    let attrs = parse_attributes(raw);
    let Some(uri) = attrs.get("URI") else {
        return;
    };
    state.playlists.push(VariantPlaylist {
        uri: state.resolve(uri),
        stream_info: stream_info_from_attrs(&attrs),
    });
}

/// This crate's coverage of spec.md §4.4's tag table. Every [`ParserClass`]
/// gets this layer first; its own `declared_handlers` may override any
/// entry.
pub(crate) static BASE_HANDLERS: &[HandlerEntry] = &[
    HandlerEntry { names: &["EXTM3U"], handler: h_noop },
    HandlerEntry { names: &["EXT-X-VERSION"], handler: h_ext_x_version },
    HandlerEntry { names: &["EXT-X-TARGETDURATION"], handler: h_ext_x_targetduration },
    HandlerEntry { names: &["EXT-X-MEDIA-SEQUENCE"], handler: h_ext_x_media_sequence },
    HandlerEntry {
        names: &["EXT-X-DISCONTINUITY-SEQUENCE"],
        handler: h_ext_x_discontinuity_sequence,
    },
    HandlerEntry { names: &["EXT-X-ENDLIST"], handler: h_ext_x_endlist },
    HandlerEntry { names: &["EXT-X-PLAYLIST-TYPE"], handler: h_ext_x_playlist_type },
    HandlerEntry { names: &["EXT-X-I-FRAMES-ONLY"], handler: h_ext_x_iframes_only },
    HandlerEntry { names: &["EXT-X-ALLOW-CACHE"], handler: h_ext_x_allow_cache },
    HandlerEntry { names: &["EXT-X-START"], handler: h_ext_x_start },
    HandlerEntry { names: &["EXTINF"], handler: h_extinf },
    HandlerEntry { names: &["EXT-X-BYTERANGE"], handler: h_ext_x_byterange },
    HandlerEntry { names: &["EXT-X-DISCONTINUITY"], handler: h_ext_x_discontinuity },
    HandlerEntry { names: &["EXT-X-KEY"], handler: h_ext_x_key },
    HandlerEntry { names: &["EXT-X-MAP"], handler: h_ext_x_map },
    HandlerEntry {
        names: &["EXT-X-PROGRAM-DATE-TIME"],
        handler: h_ext_x_program_date_time,
    },
    HandlerEntry { names: &["EXT-X-DATERANGE"], handler: h_ext_x_daterange },
    HandlerEntry { names: &["EXT-X-MEDIA"], handler: h_ext_x_media },
    HandlerEntry { names: &["EXT-X-STREAM-INF"], handler: h_ext_x_stream_inf },
    HandlerEntry {
        names: &["EXT-X-I-FRAME-STREAM-INF"],
        handler: h_ext_x_i_frame_stream_inf,
    },
];

/// Drives `content` to completion using `C`'s registry, resolving URIs
/// against `base_uri`.
pub fn drive<C: ParserClass>(
    content: &str,
    base_uri: &str,
) -> Result<Playlist, MalformedPlaylistError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines().map(str::trim_end_matches('\r')).map(str::trim);

    let Some(first) = lines.by_ref().find(|line| !line.is_empty()) else {
        return Err(MalformedPlaylistError);
    };
    if first != "#EXTM3U" {
        return Err(MalformedPlaylistError);
    }

    let mut state = ParserState::new(base_uri);
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if line.starts_with("#EXT") {
            if let (Some(name), Some(args)) = split_tag(line) {
                registry::dispatch::<C>(&mut state, name, args);
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        state.commit_uri_line(line);
    }

    Ok(state.finish())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn split_tag_values() {
        assert_eq!(split_tag(""), (None, None));
        assert_eq!(split_tag("not a tag"), (None, None));
        assert_eq!(split_tag("#EXTM3U"), (Some("EXTM3U"), Some("")));
        assert_eq!(
            split_tag("#EXT-X-VERSION:3"),
            (Some("EXT-X-VERSION"), Some("3"))
        );
        assert_eq!(
            split_tag("#EXT-X-VERSION:    3   "),
            (Some("EXT-X-VERSION"), Some("3"))
        );
    }

    #[test]
    fn missing_preamble_is_malformed() {
        let result = drive::<crate::registry::DefaultParserClass>("#EXT-X-VERSION:3\n", "http://example.com/");
        assert_eq!(result, Err(MalformedPlaylistError));
    }

    #[test]
    fn bandwidth_defaults_to_zero() {
        let content = "#EXTM3U\n#EXT-X-STREAM-INF:VIDEO=\"720p60\"\nvariant.m3u8\n";
        let playlist = drive::<crate::registry::DefaultParserClass>(content, "http://example.com/").unwrap();
        assert_eq!(playlist.playlists.len(), 1);
        assert_eq!(playlist.playlists[0].stream_info.bandwidth, 0);
        assert_eq!(
            playlist.playlists[0].stream_info.video.as_deref(),
            Some("720p60")
        );
    }
}
