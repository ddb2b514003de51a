//! Structured warnings for recoverable malformedness.
//!
//! Nothing here ever aborts a parse; every function is a thin wrapper
//! around `log::warn!` with one of the fixed message strings from spec.

pub(crate) const DISCARDED_ATTRIBUTES_LIST: &str = "Discarded invalid attributes list";
pub(crate) const DISCARDED_HEX: &str = "Discarded invalid hexadecimal-sequence attribute value";
pub(crate) const DISCARDED_ISO8601: &str = "Discarded invalid ISO8601 attribute value";
pub(crate) const MALFORMED_BYTERANGE_CONTINUATION: &str = "Malformed byterange continuation";

pub(crate) fn warn(message: &str) {
    log::warn!(target: "hls_m3u8::parser", "{message}");
}
