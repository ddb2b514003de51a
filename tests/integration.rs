use chrono::DateTime;
use hls_m3u8::{
    parse, parse_with, EncryptionMethod, HandlerEntry, MalformedPlaylistError, ParserClass,
    ParserState,
};

const MASTER: &str = include_str!("fixtures/master.m3u8");
const DATERANGE: &str = include_str!("fixtures/daterange.m3u8");

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn master_playlist_scenario() {
    let playlist = parse(MASTER, "https://example.com/master.m3u8").unwrap();

    assert!(playlist.is_master);
    assert_eq!(playlist.media.len(), 8);
    assert_eq!(playlist.playlists.len(), 8);

    let audio_count = playlist
        .media
        .iter()
        .filter(|m| m.media_type == hls_m3u8::MediaType::Audio)
        .count();
    let subtitle_count = playlist
        .media
        .iter()
        .filter(|m| m.media_type == hls_m3u8::MediaType::Subtitles)
        .count();
    assert_eq!(audio_count, 4);
    assert_eq!(subtitle_count, 4);

    for variant in &playlist.playlists {
        assert!(variant.uri.starts_with("https://example.com/video/"));
    }

    assert_eq!(
        playlist.playlists[0].stream_info.codecs,
        vec!["avc1.4d401f", "mp4a.40.2"]
    );
    assert_eq!(playlist.playlists[0].stream_info.resolution.width, 640);
    assert_eq!(playlist.playlists[0].stream_info.resolution.height, 360);

    // last variant omits BANDWIDTH and carries VIDEO="720p60" as a plain string
    let last = playlist.playlists.last().unwrap();
    assert_eq!(last.stream_info.bandwidth, 0);
    assert_eq!(last.stream_info.video.as_deref(), Some("720p60"));
}

#[test]
fn daterange_suite() {
    let playlist = parse(DATERANGE, "https://example.com/media.m3u8").unwrap();
    assert_eq!(playlist.dateranges.len(), 7);

    let start = DateTime::parse_from_rfc3339("2000-01-01T00:00:00.000Z").unwrap();
    let plus_60 = start + chrono::Duration::seconds(60);

    let by_id = |id: &str| {
        playlist
            .dateranges
            .iter()
            .find(|dr| dr.id.as_deref() == Some(id))
            .unwrap()
    };

    // at date == start, every range anchored at start contains it.
    for id in ["ad-1", "ad-2", "ad-3", "ad-4", "ad-7"] {
        assert_eq!(
            hls_m3u8::Playlist::is_date_in_daterange(start, by_id(id)),
            Some(true),
            "{id} should contain its own start"
        );
    }

    // short (15s) and duration-wins-over-end-date (10s) ranges have ended by +60s.
    assert_eq!(
        hls_m3u8::Playlist::is_date_in_daterange(plus_60, by_id("ad-1")),
        Some(false)
    );
    assert_eq!(
        hls_m3u8::Playlist::is_date_in_daterange(plus_60, by_id("ad-7")),
        Some(false)
    );

    // the 90s-duration range, the END-DATE range, and the open-ended range
    // are all still open at +60s.
    assert_eq!(
        hls_m3u8::Playlist::is_date_in_daterange(plus_60, by_id("ad-2")),
        Some(true)
    );
    assert_eq!(
        hls_m3u8::Playlist::is_date_in_daterange(plus_60, by_id("ad-3")),
        Some(true)
    );
    assert_eq!(
        hls_m3u8::Playlist::is_date_in_daterange(plus_60, by_id("ad-4")),
        Some(true)
    );

    // a range that starts later than `date` does not contain it.
    assert_eq!(
        hls_m3u8::Playlist::is_date_in_daterange(start, by_id("ad-5")),
        Some(false)
    );

    // a range with no start_date is unknown, not false.
    let client_only = by_id("ad-6");
    assert!(client_only.start_date.is_none());
    assert_eq!(client_only.x.get("X-CUSTOM-ATTR").map(String::as_str), Some("hello"));
    assert_eq!(
        hls_m3u8::Playlist::is_date_in_daterange(start, client_only),
        None
    );
}

#[test]
fn program_date_time_scenario() {
    let playlist = parse(DATERANGE, "https://example.com/media.m3u8").unwrap();
    assert_eq!(playlist.segments.len(), 4);

    let start = playlist.segments[0].date.unwrap();
    let offsets: Vec<i64> = playlist
        .segments
        .iter()
        .map(|s| (s.date.unwrap() - start).num_milliseconds())
        .collect();
    assert_eq!(offsets, vec![0, 15_000, 30_500, 60_000]);

    for (i, segment) in playlist.segments.iter().enumerate() {
        assert_eq!(segment.num, playlist.media_sequence + i as u64);
    }
}

#[test]
fn malformed_preamble_fails() {
    let content = "#EXT-X-VERSION:3\nsegment.ts\n";
    assert_eq!(
        parse(content, "https://example.com/"),
        Err(MalformedPlaylistError)
    );
}

#[test]
fn malformed_attribute_list_is_warned_and_dropped() {
    init_logging();
    let content = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH = 100\nvariant.m3u8\n";
    let playlist = parse(content, "https://example.com/").unwrap();
    assert_eq!(playlist.playlists[0].stream_info.bandwidth, 0);
}

/// A site-specific extension adding a handler for an unknown tag, per
/// spec.md's tag-registry-override scenario.
struct OverridingParserClass;

fn h_foo_bar(_state: &mut ParserState, _raw: &str) {}

impl ParserClass for OverridingParserClass {
    fn declared_handlers() -> &'static [HandlerEntry] {
        static HANDLERS: &[HandlerEntry] = &[HandlerEntry {
            names: &["FOO-BAR"],
            handler: h_foo_bar,
        }];
        HANDLERS
    }
}

#[test]
fn registry_override_scenario() {
    // Two instances of the same overriding class share one registry, and the
    // base class's registry is unaffected by the override.
    let base = hls_m3u8::registry::<hls_m3u8::DefaultParserClass>();
    let overridden_a = hls_m3u8::registry::<OverridingParserClass>();
    let overridden_b = hls_m3u8::registry::<OverridingParserClass>();

    assert!(std::sync::Arc::ptr_eq(&overridden_a, &overridden_b));
    assert!(!std::sync::Arc::ptr_eq(&base, &overridden_a));

    let playlist = parse_with::<OverridingParserClass>(
        "#EXTM3U\n#EXT-X-ENDLIST\n",
        "https://example.com/",
    )
    .unwrap();
    assert!(playlist.is_endlist);
}

#[test]
fn encryption_key_method_none_clears_active_key() {
    let content = "\
#EXTM3U
#EXT-X-KEY:METHOD=AES-128,URI=\"key1\"
#EXTINF:10.0,
seg0.ts
#EXT-X-KEY:METHOD=NONE
#EXTINF:10.0,
seg1.ts
#EXT-X-ENDLIST
";
    let playlist = parse(content, "https://example.com/").unwrap();
    assert!(playlist.segments[0].key.is_some());
    assert_eq!(
        playlist.segments[0].key.as_ref().unwrap().method,
        EncryptionMethod::Aes128
    );
    assert!(playlist.segments[1].key.is_none());
    assert_eq!(playlist.keys.len(), 2);
}
