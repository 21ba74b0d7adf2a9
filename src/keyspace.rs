//! Keyspace Module
//!
//! Document id scheme used to namespace caches inside one shared store, and
//! the index definition that lets a namespace be found again.
//!
//! Ids have the form `cache:<name>:<key>`, or `cache::<key>` for a blank
//! cache name.

use crate::store::View;

/// First token of every document id written by a cache.
pub const CACHE_PREFIX: &str = "cache";

/// Separator between prefix, cache name and key.
pub const DELIMITER: char = ':';

/// Design document holding the namespace view.
pub const CACHE_DESIGN_DOCUMENT: &str = "cache";

/// View emitting one row per cache document, keyed by cache name.
pub const CACHE_VIEW: &str = "names";

/// Returns true if `name` is empty or whitespace only.
pub fn is_blank(name: &str) -> bool {
    name.trim().is_empty()
}

/// Builds the document id for `key` inside the cache called `name`.
///
/// A blank name maps to the shared `cache::<key>` space.
pub fn document_id(name: &str, key: &str) -> String {
    let name = if is_blank(name) { "" } else { name };
    format!("{CACHE_PREFIX}{DELIMITER}{name}{DELIMITER}{key}")
}

/// Cache name encoded in a document id, as the namespace view emits it.
///
/// Mirrors the map function: the id must have more than two tokens and
/// start with [`CACHE_PREFIX`]. The name of a blank-namespace id is `""`.
pub fn cache_name_of(id: &str) -> Option<&str> {
    let mut tokens = id.split(DELIMITER);
    let prefix = tokens.next()?;
    let name = tokens.next()?;
    tokens.next()?;

    (prefix == CACHE_PREFIX).then_some(name)
}

/// Source of the map function registered for [`CACHE_VIEW`].
pub fn namespace_map_function() -> String {
    format!(
        "function (doc, meta) {{var tokens = meta.id.split('{DELIMITER}'); \
         if(tokens.length > 2 && tokens[0] == '{CACHE_PREFIX}') emit(tokens[1]);}}"
    )
}

/// The namespace view definition.
pub fn namespace_view() -> View {
    View::new(CACHE_VIEW, namespace_map_function())
}
