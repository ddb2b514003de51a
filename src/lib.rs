//! Parser for HLS (HTTP Live Streaming) M3U8 master and media playlists.
//!
//! ```
//! # fn main() -> Result<(), hls_m3u8::MalformedPlaylistError> {
//! let content = "#EXTM3U\n#EXTINF:10.0,\nsegment0.ts\n#EXT-X-ENDLIST\n";
//! let playlist = hls_m3u8::parse(content, "https://example.com/media.m3u8")?;
//! assert_eq!(playlist.segments.len(), 1);
//! # Ok(())
//! # }
//! ```

mod attributes;
mod diagnostics;
mod driver;
mod error;
mod lexical;
mod model;
mod registry;
mod uri;

pub use attributes::{parse_attributes, AttributeList};
pub use error::{MalformedPlaylistError, Result};
pub use lexical::{
    parse_bool, parse_byterange, parse_extinf, parse_hex, parse_integer, parse_iso8601,
    parse_resolution, parse_timedelta,
};
pub use model::{
    ByteRange, DateRange, EncryptionMethod, ExtInf, Key, Map, Media, MediaType, Playlist,
    PlaylistType, Resolution, Segment, Start, StreamInfo, VariantPlaylist,
};
pub use driver::{split_tag, Handler, ParserState};
pub use registry::{registry, DefaultParserClass, HandlerEntry, ParserClass};

/// Parses `content` into a [`Playlist`], resolving relative URIs against
/// `base_uri`. Uses [`DefaultParserClass`]'s registry, i.e. only the tags
/// spec.md §4.4 describes; call [`parse_with`] to use a site-specific
/// [`ParserClass`].
///
/// Fails only when the document's first non-blank line isn't `#EXTM3U`;
/// every other kind of malformedness is recovered from and reported through
/// the `log` crate instead.
pub fn parse(content: &str, base_uri: &str) -> Result<Playlist> {
    parse_with::<DefaultParserClass>(content, base_uri)
}

/// Like [`parse`], but dispatches tags through `C`'s registry instead of
/// the default one, letting a site-specific [`ParserClass`] add or override
/// tag handlers.
pub fn parse_with<C: ParserClass>(content: &str, base_uri: &str) -> Result<Playlist> {
    driver::drive::<C>(content, base_uri)
}
