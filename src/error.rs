use std::fmt;

/// The playlist is missing its required `#EXTM3U` header.
///
/// This is the only failure mode `parse` can return; every other kind of
/// malformedness is recovered from and reported through the `log` crate
/// instead (see [`crate::diagnostics`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedPlaylistError;

impl fmt::Display for MalformedPlaylistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "playlist is missing the #EXTM3U header")
    }
}

impl std::error::Error for MalformedPlaylistError {}

pub type Result<T> = std::result::Result<T, MalformedPlaylistError>;
