//! Namespaced item and tag name handling.

/// Reserved ingredient name meaning "no further decomposition".
///
/// Naturally occurring recipes declare this placeholder as their only
/// ingredient; the normalizer drops it instead of emitting an entry.
pub const SELF_PLACEHOLDER: &str = "self";

/// Strips a `namespace:` prefix from a raw item or tag name.
///
/// Game data prefixes names with their source namespace, e.g.
/// `minecraft:oak_log`. Only the first prefix is stripped.
#[must_use]
pub fn strip_namespace(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, rest)) => rest,
        None => name,
    }
}

/// Checks if a raw name refers to a tag rather than an item.
///
/// Tag references carry a leading `#`, e.g. `#minecraft:planks`.
#[must_use]
pub fn is_tag_ref(name: &str) -> bool {
    name.contains('#')
}

/// Canonical form of a raw name: namespace stripped, tag marker removed.
#[must_use]
pub fn canonical_name(name: &str) -> &str {
    strip_namespace(name).trim_start_matches('#')
}
