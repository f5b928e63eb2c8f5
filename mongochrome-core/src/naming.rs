//! Collection name normalization.

/// Normalize a collection name before it is used as a cache or store key.
///
/// Lower-cases the name, strips all whitespace, and pluralizes it by
/// appending `s` unless it already ends with one. A blank name normalizes
/// to `"s"`; `Connection::open_collection` rejects blank names before they
/// get here.
pub fn normalize_collection_name(name: &str) -> String {
    let mut normalized: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    if !normalized.ends_with('s') {
        normalized.push('s');
    }
    normalized
}
