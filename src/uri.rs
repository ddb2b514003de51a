//! RFC 3986 reference resolution (spec.md §9, "URI resolution").

use url::Url;

/// Resolves `reference` against `base`. Falls back to `reference` verbatim
/// when either fails to parse (an empty or non-absolute `base`, most
/// commonly) rather than erroring, per spec.md §9.
pub fn resolve(base: &str, reference: &str) -> String {
    let Ok(base) = Url::parse(base) else {
        return reference.to_string();
    };
    match base.join(reference) {
        Ok(resolved) => resolved.into(),
        Err(_) => reference.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resolves_relative_reference() {
        assert_eq!(
            resolve("http://example.com/a/b.m3u8", "c.m3u8"),
            "http://example.com/a/c.m3u8"
        );
    }

    #[test]
    fn keeps_absolute_reference_as_is() {
        assert_eq!(
            resolve("http://example.com/a/b.m3u8", "http://other.com/c.m3u8"),
            "http://other.com/c.m3u8"
        );
    }

    #[test]
    fn falls_back_to_verbatim_on_unresolvable_base() {
        assert_eq!(resolve("", "segment.ts"), "segment.ts");
        assert_eq!(resolve("not a uri", "segment.ts"), "segment.ts");
    }
}
