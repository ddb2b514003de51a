//! Per-parser-class tag dispatch (spec.md §4.3).
//!
//! A concrete parser class declares its handlers as a static slice via
//! [`ParserClass::declared_handlers`]. [`registry`] builds the
//! `{tag name → handler}` map for a class the first time it's asked for and
//! caches it, one cache per distinct `C: ParserClass`, since a `static`
//! inside a generic function is monomorphized per type parameter. That gives
//! every class its own independently-built, independently-cached map with no
//! unsafe code and no reflection: overriding a tag in a subclass can never
//! touch the base class's cached map, because the base class's `registry::<Base>()`
//! and the subclass's `registry::<Sub>()` are two distinct functions (and two
//! distinct `OnceLock`s) after monomorphization.

use crate::driver::{Handler, ParserState};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// One declared tag handler: the literal tag name(s) it answers to and the
/// function invoked with the tag's raw (post-colon) attribute string.
pub struct HandlerEntry {
    pub names: &'static [&'static str],
    pub handler: Handler,
}

/// A parser class: a type that can answer for a fixed, static set of tag
/// names. `BASE_HANDLERS` (this crate's built-in coverage, spec.md §4.4's
/// table) is always folded in first; `declared_handlers` layers on top and
/// may override any of it.
pub trait ParserClass: 'static {
    fn declared_handlers() -> &'static [HandlerEntry];
}

/// The default, unextended parser class: spec.md §4.4's tag table and
/// nothing else.
pub struct DefaultParserClass;

impl ParserClass for DefaultParserClass {
    fn declared_handlers() -> &'static [HandlerEntry] {
        &[]
    }
}

/// Returns the shared, lazily-built `{tag name → handler}` map for `C`.
/// Two calls with the same `C` return the identical `Arc` (pointer-equal);
/// two different `C`s never share a map, even if their declared handlers
/// are byte-for-byte identical.
pub fn registry<C: ParserClass>() -> Arc<HashMap<&'static str, Handler>> {
    // Monomorphization gives each distinct `C` its own copy of this static,
    // so each parser class gets an independently-cached map for free.
    static CELL: OnceLock<Arc<HashMap<&'static str, Handler>>> = OnceLock::new();
    CELL.get_or_init(|| {
        let mut map = HashMap::new();
        for entry in crate::driver::BASE_HANDLERS {
            for name in entry.names {
                map.insert(*name, entry.handler);
            }
        }
        for entry in C::declared_handlers() {
            for name in entry.names {
                map.insert(*name, entry.handler);
            }
        }
        Arc::new(map)
    })
    .clone()
}

pub(crate) fn dispatch<C: ParserClass>(
    state: &mut ParserState,
    name: &str,
    attrs: &str,
) -> bool {
    match registry::<C>().get(name) {
        Some(handler) => {
            handler(state, attrs);
            true
        }
        None => false,
    }
}
